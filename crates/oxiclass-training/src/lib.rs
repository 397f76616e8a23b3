//! The learning loop that turns a dataset into a trained rule population.
//!
//! This crate drives the engine crate through complete training runs:
//!
//! 1. **Controller** ([`controller`]) - [`controller::LearningRun`] owns the
//!    population, the environment cursor, and the run RNG, and steps through
//!    the match / predict / reinforce / discover / delete cycle once per
//!    iteration. Progress surfaces through windowed tracking records and
//!    full checkpoint evaluations.
//!
//! 2. **Attribute tracking** ([`attribute_tracking`]) - Per-instance running
//!    scores of which attributes earn their keep, fed back into crossover
//!    and mutation as a specification bias.
//!
//! 3. **Rule compaction** ([`compaction`]) - Six post-training strategies
//!    that shrink a trained population while holding its training accuracy.
//!
//! 4. **Phase timer** ([`timer`]) - Wall-clock accounting per learning
//!    phase, reported in tracking records and run summaries.
//!
//! # Run Anatomy
//!
//! ```text
//! LearningRun::new(dataset, params, seed, ..)
//!     ↓ per iteration
//! match set → prediction vote → correct set → reinforcement
//!     ↓
//! subsumption → attribute tracking → rule discovery → deletion
//!     ↓ at tracking boundaries
//! TrackingRecord (windowed accuracy, generality, elapsed time)
//!     ↓ at checkpoints
//! CheckpointReport (population summary + train/test accuracy)
//!     ↓ at the final checkpoint
//! rule compaction + CompactionReport
//! ```
//!
//! Identical seeds and inputs reproduce identical runs: every stochastic
//! decision draws from the single run-owned RNG.

pub mod attribute_tracking;
pub mod compaction;
pub mod controller;
pub mod timer;
