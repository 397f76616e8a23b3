//! Read-only evaluation passes over a trained rule population.
//!
//! This crate measures how well a population classifies a fixed set of
//! instances, and summarizes the population's own composition:
//!
//! 1. **Class accuracy** ([`class_accuracy`]) - Per-class confusion cells
//!    accumulated instance by instance.
//!
//! 2. **Accuracy evaluation** ([`accuracy`]) - Walks a dataset with
//!    evaluation match sets and prediction votes, producing standard,
//!    balanced, and coverage-adjusted accuracy figures.
//!
//! 3. **Population summary** ([`summary`]) - Numerosity-weighted generality,
//!    experienced-rule fraction, and per-attribute specification pressure.
//!
//! Evaluations never create, delete, or retrain rules; the population's
//! transient match set is used and cleared, nothing else is touched.

pub mod accuracy;
pub mod class_accuracy;
pub mod summary;
