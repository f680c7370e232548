//! Greedy slot allocator.
//!
//! Fills one member into each (week, slot) instance, hardest-to-fill first.
//! Load balance dominates the score; the department-diversity preferences
//! (R3/R4/R5) only break near-ties among otherwise-valid candidates. R6 is
//! enforced structurally: a member already holding a shift on the same
//! calendar day is never considered, whatever the stored toggle says.

use std::collections::{HashMap, HashSet};

use chrono::Weekday;
use dutyroster_core::{
    Candidate, DepartmentId, RuleCode, RuleSet, TimeSlot, TimeSlotId, UserId, WeekNumber,
};

use crate::matrix::AvailabilityMatrix;

/// Per-assignment score weights. Lower totals win.
const LOAD_WEIGHT: u32 = 100;
const SAME_DAY_DEPT_PENALTY: u32 = 50;
const SLOT_PAIR_DEPT_PENALTY: u32 = 30;
const EARLY_REPEAT_PENALTY: u32 = 20;

/// One filled (week, slot) cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    /// Template week of the shift
    pub week: WeekNumber,
    /// Slot template being filled
    pub time_slot_id: TimeSlotId,
    /// Chosen member
    pub member_id: UserId,
}

/// Result of one allocation run.
#[derive(Debug, Clone, Default)]
pub struct AllocationOutcome {
    /// Filled cells, in processing order
    pub assignments: Vec<Assignment>,
    /// Slot instances considered (slots x weeks)
    pub total_slots: usize,
    /// One line per unfillable instance; never a run failure
    pub warnings: Vec<String>,
}

/// Allocate every (week, slot) instance.
///
/// Deterministic for identical inputs: instances are ordered by ascending
/// available-candidate count with a fixed positional tie-break, and candidate
/// ties resolve by name then ID.
pub fn allocate(
    candidates: &[Candidate],
    slots: &[TimeSlot],
    matrix: &AvailabilityMatrix,
    rules: RuleSet,
) -> AllocationOutcome {
    let slot_by_id: HashMap<TimeSlotId, &TimeSlot> = slots.iter().map(|s| (s.id, s)).collect();

    // Difficulty ordering: decide the most constrained instances first so
    // flexible candidates are not consumed by easy slots.
    let mut instances: Vec<(WeekNumber, &TimeSlot, usize)> = Vec::with_capacity(slots.len() * 2);
    for slot in slots {
        for week in WeekNumber::ALL {
            let count = matrix.available_count(candidates, week, slot.id);
            instances.push((week, slot, count));
        }
    }
    instances.sort_by_key(|(week, slot, count)| {
        (*count, *week, slot.day_of_week.number_from_monday(), slot.start, slot.id)
    });

    let mut outcome = AllocationOutcome {
        total_slots: instances.len(),
        ..Default::default()
    };

    // Running state for load balance and the diversity rules.
    let mut load: HashMap<UserId, u32> = HashMap::new();
    let mut member_day: HashSet<(UserId, WeekNumber, Weekday)> = HashSet::new();
    let mut dept_day: HashSet<(WeekNumber, Weekday, DepartmentId)> = HashSet::new();
    let mut slot_dept: HashMap<(WeekNumber, TimeSlotId), DepartmentId> = HashMap::new();

    for (week, slot, _) in instances {
        let day = slot.day_of_week;

        let mut scored: Vec<(u32, &Candidate)> = Vec::new();
        for candidate in candidates {
            if !matrix.available(candidate.user_id, week, slot.id) {
                continue;
            }
            // R6: one shift per person per calendar day.
            if member_day.contains(&(candidate.user_id, week, day)) {
                continue;
            }

            let mut score = load.get(&candidate.user_id).copied().unwrap_or(0) * LOAD_WEIGHT;

            if rules.enabled(RuleCode::R3)
                && dept_day.contains(&(week, day, candidate.department_id))
            {
                score += SAME_DAY_DEPT_PENALTY;
            }

            if rules.enabled(RuleCode::R4)
                && slot_dept.get(&(week.other(), slot.id)) == Some(&candidate.department_id)
            {
                score += SLOT_PAIR_DEPT_PENALTY;
            }

            if rules.enabled(RuleCode::R5) && slot.is_early() {
                let repeats_early = slot_dept.iter().any(|(&(w, sid), &dept)| {
                    w == week.other()
                        && dept == candidate.department_id
                        && slot_by_id
                            .get(&sid)
                            .is_some_and(|s| s.day_of_week == day && s.is_early())
                });
                if repeats_early {
                    score += EARLY_REPEAT_PENALTY;
                }
            }

            scored.push((score, candidate));
        }

        if scored.is_empty() {
            outcome.warnings.push(format!(
                "slot {} (week {}, {} {}-{}) has no available candidate",
                slot.name,
                week.as_u8(),
                day,
                slot.start.format("%H:%M"),
                slot.end.format("%H:%M"),
            ));
            continue;
        }

        scored.sort_by(|(sa, ca), (sb, cb)| {
            sa.cmp(sb)
                .then_with(|| ca.name.cmp(&cb.name))
                .then_with(|| ca.user_id.cmp(&cb.user_id))
        });
        let chosen = scored[0].1;

        outcome.assignments.push(Assignment {
            week,
            time_slot_id: slot.id,
            member_id: chosen.user_id,
        });

        *load.entry(chosen.user_id).or_insert(0) += 1;
        member_day.insert((chosen.user_id, week, day));
        dept_day.insert((week, day, chosen.department_id));
        slot_dept.insert((week, slot.id), chosen.department_id);
    }

    outcome
}
