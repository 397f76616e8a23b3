//! Statistical analysis utilities for the Oxiclass project.
//!
//! This crate provides descriptive statistics used when reporting the state
//! of a rule population: fitness, accuracy, and generality distributions are
//! summarized at every learning checkpoint and in the final run summary.
//!
//! # Examples
//!
//! ```
//! use oxiclass_stats::descriptive::DescriptiveStats;
//!
//! let values = [1.0, 2.0, 3.0, 4.0, 5.0];
//! let stats = DescriptiveStats::new(values).unwrap();
//! assert_eq!(stats.mean, 3.0);
//! ```

pub mod descriptive;
