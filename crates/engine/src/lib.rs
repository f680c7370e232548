//! Duty-roster scheduling engine.
//!
//! The pipeline for one generation run: a [`RuleSet`] snapshot of the six
//! scheduling rules, an [`AvailabilityMatrix`] over every (candidate, week,
//! slot) triple, and a greedy [`allocate`] pass that fills the
//! hardest-to-fill instances first. [`RosterService`] wraps the pipeline
//! with the roster lifecycle: draft editing, publishing, audited overrides
//! and scope-drift detection.
//!
//! [`RuleSet`]: dutyroster_core::RuleSet

mod allocator;
mod conflict;
mod error;
mod matrix;
mod service;

pub use allocator::{allocate, Assignment, AllocationOutcome};
pub use conflict::{course_conflicts, unavailable_conflicts};
pub use error::{EngineError, Result};
pub use matrix::{AvailabilityMatrix, MatrixCell};
pub use service::{
    CandidateAvailability, CandidateValidation, DraftItemPatch, GenerateOutcome, RosterService,
    RosterView,
};
