pub use self::{condition::*, dataset::*, instance::*, parameters::*};

pub(crate) mod condition;
pub(crate) mod dataset;
pub(crate) mod instance;
pub(crate) mod parameters;
