//! Duplicate detection module.
//!
//! This module provides:
//! - Key functions for the size and content passes ([`keys`])
//! - The per-pass grouping state and result types ([`groups`])
//! - The two-phase driver ([`finder`])

pub mod finder;
pub mod groups;
pub mod keys;

pub use finder::{
    DuplicateFinder, FinderConfig, FinderError, LinkPolicy, Phase, ScanSummary,
};
pub use groups::{Candidate, ClusterState, DuplicateGroup, DuplicateReport, Group};
pub use keys::{ContentKey, KeyFunction, SizeKey};
