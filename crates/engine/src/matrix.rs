//! Availability matrix: per-(candidate, week, slot) eligibility with
//! human-readable conflict reasons.
//!
//! The matrix is a dense, precomputed structure rather than an incremental
//! one: candidate and slot counts are small (tens), and the allocator reads
//! every cell several times while ordering and filling slots.

use std::collections::HashMap;

use dutyroster_core::{
    Candidate, CourseEntry, RuleCode, RuleSet, Semester, TimeSlot, TimeSlotId, UnavailableEntry,
    UserId, WeekNumber,
};

use crate::conflict::{course_conflicts, unavailable_conflicts};

/// One cell: whether the candidate may take the slot in that week, and why
/// not if they may not.
#[derive(Debug, Clone, Default)]
pub struct MatrixCell {
    /// Conflict reasons, in rule order (R1 before R2). Empty means available.
    pub conflicts: Vec<String>,
}

impl MatrixCell {
    /// Whether the candidate is free of hard conflicts here.
    pub fn available(&self) -> bool {
        self.conflicts.is_empty()
    }
}

/// Dense availability matrix over (candidate, week, slot).
#[derive(Debug, Default)]
pub struct AvailabilityMatrix {
    cells: HashMap<(UserId, WeekNumber, TimeSlotId), MatrixCell>,
}

impl AvailabilityMatrix {
    /// Build the matrix for one scheduling run.
    ///
    /// `candidates` must already be filtered to the eligible pool; busy-time
    /// records are grouped per user internally.
    pub fn build(
        semester: &Semester,
        candidates: &[Candidate],
        slots: &[TimeSlot],
        courses: &[CourseEntry],
        unavailable: &[UnavailableEntry],
        rules: RuleSet,
    ) -> Self {
        let mut courses_by_user: HashMap<UserId, Vec<&CourseEntry>> = HashMap::new();
        for course in courses {
            courses_by_user.entry(course.user_id).or_default().push(course);
        }
        let mut unavailable_by_user: HashMap<UserId, Vec<&UnavailableEntry>> = HashMap::new();
        for entry in unavailable {
            unavailable_by_user.entry(entry.user_id).or_default().push(entry);
        }

        let mut cells = HashMap::new();
        for candidate in candidates {
            let user_courses: Vec<CourseEntry> = courses_by_user
                .get(&candidate.user_id)
                .map(|refs| refs.iter().map(|&c| c.clone()).collect())
                .unwrap_or_default();
            let user_unavailable: Vec<UnavailableEntry> = unavailable_by_user
                .get(&candidate.user_id)
                .map(|refs| refs.iter().map(|&u| u.clone()).collect())
                .unwrap_or_default();

            for week in WeekNumber::ALL {
                let parity = semester.parity_of(week);
                for slot in slots {
                    let mut cell = MatrixCell::default();
                    if rules.enabled(RuleCode::R1) {
                        cell.conflicts
                            .extend(course_conflicts(&user_courses, slot, parity));
                    }
                    if rules.enabled(RuleCode::R2) {
                        cell.conflicts
                            .extend(unavailable_conflicts(&user_unavailable, slot, parity));
                    }
                    cells.insert((candidate.user_id, week, slot.id), cell);
                }
            }
        }

        Self { cells }
    }

    /// Look up one cell. Absent cells (unknown candidate or slot) read as
    /// unavailable.
    pub fn cell(&self, user: UserId, week: WeekNumber, slot: TimeSlotId) -> Option<&MatrixCell> {
        self.cells.get(&(user, week, slot))
    }

    /// Whether the candidate is available for the slot in that week.
    pub fn available(&self, user: UserId, week: WeekNumber, slot: TimeSlotId) -> bool {
        self.cell(user, week, slot).is_some_and(MatrixCell::available)
    }

    /// Number of available candidates for one (week, slot) instance.
    pub fn available_count(
        &self,
        candidates: &[Candidate],
        week: WeekNumber,
        slot: TimeSlotId,
    ) -> usize {
        candidates
            .iter()
            .filter(|c| self.available(c.user_id, week, slot))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime, Weekday};
    use dutyroster_core::{DepartmentId, SemesterId, WeekParity, WeekPattern};

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn semester() -> Semester {
        Semester {
            id: SemesterId::new(),
            name: "2025 Fall".to_string(),
            start_date: NaiveDate::from_ymd_opt(2025, 9, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2026, 1, 18).unwrap(),
            first_week_parity: WeekParity::Odd,
        }
    }

    fn candidate(name: &str) -> Candidate {
        Candidate {
            user_id: UserId::new(),
            name: name.to_string(),
            department_id: DepartmentId::new(),
            submitted: true,
        }
    }

    fn slot(day: Weekday, start: NaiveTime, end: NaiveTime) -> TimeSlot {
        TimeSlot {
            id: TimeSlotId::new(),
            name: "shift".to_string(),
            semester_id: None,
            day_of_week: day,
            start,
            end,
            active: true,
        }
    }

    fn course_for(user: &Candidate, weeks: WeekPattern) -> CourseEntry {
        CourseEntry {
            user_id: user.user_id,
            semester_id: SemesterId::new(),
            course_name: "Linear Algebra".to_string(),
            day_of_week: Weekday::Mon,
            start: t(8, 0),
            end: t(9, 50),
            weeks,
        }
    }

    #[test]
    fn conflict_free_candidate_is_available_everywhere() {
        let sem = semester();
        let alice = candidate("alice");
        let slots = vec![slot(Weekday::Mon, t(8, 10), t(10, 5))];
        let matrix =
            AvailabilityMatrix::build(&sem, &[alice.clone()], &slots, &[], &[], RuleSet::all_enabled());

        for week in WeekNumber::ALL {
            assert!(matrix.available(alice.user_id, week, slots[0].id));
        }
    }

    #[test]
    fn all_weeks_course_blocks_both_weeks() {
        let sem = semester();
        let alice = candidate("alice");
        let slots = vec![slot(Weekday::Mon, t(8, 10), t(10, 5))];
        let courses = vec![course_for(&alice, WeekPattern::All)];
        let matrix = AvailabilityMatrix::build(
            &sem,
            &[alice.clone()],
            &slots,
            &courses,
            &[],
            RuleSet::all_enabled(),
        );

        for week in WeekNumber::ALL {
            let cell = matrix.cell(alice.user_id, week, slots[0].id).unwrap();
            assert!(!cell.available());
            assert_eq!(cell.conflicts, vec!["course conflict: Linear Algebra"]);
        }
    }

    #[test]
    fn odd_week_course_blocks_only_the_odd_parity_week() {
        // First week parity is odd, so template week 1 is odd, week 2 even.
        let sem = semester();
        let alice = candidate("alice");
        let slots = vec![slot(Weekday::Mon, t(8, 10), t(10, 5))];
        let courses = vec![course_for(&alice, WeekPattern::Odd)];
        let matrix = AvailabilityMatrix::build(
            &sem,
            &[alice.clone()],
            &slots,
            &courses,
            &[],
            RuleSet::all_enabled(),
        );

        assert!(!matrix.available(alice.user_id, WeekNumber::One, slots[0].id));
        assert!(matrix.available(alice.user_id, WeekNumber::Two, slots[0].id));
    }

    #[test]
    fn disabling_r1_ignores_course_conflicts() {
        let sem = semester();
        let alice = candidate("alice");
        let slots = vec![slot(Weekday::Mon, t(8, 10), t(10, 5))];
        let courses = vec![course_for(&alice, WeekPattern::All)];
        let rules = RuleSet::from_toggles(&[dutyroster_core::RuleToggle {
            code: RuleCode::R1,
            enabled: false,
        }]);
        let matrix =
            AvailabilityMatrix::build(&sem, &[alice.clone()], &slots, &courses, &[], rules);

        assert!(matrix.available(alice.user_id, WeekNumber::One, slots[0].id));
    }

    #[test]
    fn unknown_cell_reads_unavailable() {
        let matrix = AvailabilityMatrix::default();
        assert!(!matrix.available(UserId::new(), WeekNumber::One, TimeSlotId::new()));
    }

    #[test]
    fn available_count_counts_per_instance() {
        let sem = semester();
        let alice = candidate("alice");
        let bob = candidate("bob");
        let slots = vec![slot(Weekday::Mon, t(8, 10), t(10, 5))];
        let courses = vec![course_for(&alice, WeekPattern::All)];
        let pool = vec![alice, bob];
        let matrix =
            AvailabilityMatrix::build(&sem, &pool, &slots, &courses, &[], RuleSet::all_enabled());

        assert_eq!(matrix.available_count(&pool, WeekNumber::One, slots[0].id), 1);
        assert_eq!(matrix.available_count(&pool, WeekNumber::Two, slots[0].id), 1);
    }
}
