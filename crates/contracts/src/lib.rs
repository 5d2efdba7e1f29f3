//! # Contracts
//!
//! Frozen interface contracts shared by the remote-write crates.
//! All business crates depend on this crate, reverse dependencies are prohibited.
//!
//! ## Sample Model
//! - A `Sample` is one observation: metric identity, value, timestamp (ms)
//! - Metric identity is a name plus a `LabelSet`
//! - The pseudo-label `__name__` addresses the metric name during relabeling

mod client;
mod config;
mod error;
mod relabel;
mod sample;

pub use client::*;
pub use config::*;
pub use error::*;
pub use relabel::*;
pub use sample::*;
