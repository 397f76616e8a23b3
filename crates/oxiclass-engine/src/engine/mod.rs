//! Learning machinery: the rule population, the operators that act on it,
//! and the offline environment the learner steps through.

pub use self::{
    classifier::*, environment::*, expert_knowledge::*, population::*, prediction::*, seed::*,
};

mod classifier;
mod environment;
mod expert_knowledge;
mod population;
mod prediction;
mod seed;
