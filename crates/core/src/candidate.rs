//! The duty-candidate pool.

use serde::{Deserialize, Serialize};

use crate::id::{DepartmentId, UserId};

/// A member of the duty-required pool for one semester.
///
/// Only members whose timetable has been submitted are eligible for
/// assignment; the rest still count toward the submission-rate precondition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    /// Member identity
    pub user_id: UserId,

    /// Display name; also the deterministic tie-break key in the allocator
    pub name: String,

    /// Department affiliation, used by the diversity preferences
    pub department_id: DepartmentId,

    /// Whether the member's course timetable has been submitted
    pub submitted: bool,
}

impl Candidate {
    /// Whether this member may enter the availability matrix.
    pub fn eligible(&self) -> bool {
        self.submitted
    }
}
