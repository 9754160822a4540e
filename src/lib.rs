//! Personal habit tracker: a list of daily tasks, per-day completion records and a month heatmap
//! colored by how much of each day got done. State lives in a local key-value store and is
//! mirrored, best effort, to a remote tree store.
//!

pub mod aggregation;
pub mod calendar;
pub mod cli;
pub mod identity;
pub mod storage;
pub mod sync;
pub mod tracker;
pub mod utils;
