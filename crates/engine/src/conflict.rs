//! Hard-constraint conflict checks shared by the matrix builder and the
//! candidate validator.

use dutyroster_core::{CourseEntry, TimeSlot, UnavailableEntry, WeekParity};

/// Course-timetable conflicts (R1) for one member against one slot in a week
/// of the given parity.
pub fn course_conflicts(
    courses: &[CourseEntry],
    slot: &TimeSlot,
    parity: WeekParity,
) -> Vec<String> {
    courses
        .iter()
        .filter(|c| c.weeks.matches(parity) && slot.overlaps(c.day_of_week, c.start, c.end))
        .map(|c| format!("course conflict: {}", c.course_name))
        .collect()
}

/// Declared-unavailable-time conflicts (R2) for one member against one slot
/// in a week of the given parity.
///
/// One-off entries are matched like weekly ones: template scheduling does
/// not resolve concrete dates.
pub fn unavailable_conflicts(
    entries: &[UnavailableEntry],
    slot: &TimeSlot,
    parity: WeekParity,
) -> Vec<String> {
    entries
        .iter()
        .filter(|u| u.weeks.matches(parity) && slot.overlaps(u.day_of_week, u.start, u.end))
        .map(|u| match &u.reason {
            Some(reason) => format!("unavailable: {reason}"),
            None => "unavailable time".to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveTime, Weekday};
    use dutyroster_core::{RepeatKind, SemesterId, TimeSlotId, UserId, WeekPattern};

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn slot() -> TimeSlot {
        TimeSlot {
            id: TimeSlotId::new(),
            name: "ts-1".to_string(),
            semester_id: None,
            day_of_week: Weekday::Mon,
            start: t(8, 10),
            end: t(10, 5),
            active: true,
        }
    }

    fn course(day: Weekday, start: NaiveTime, end: NaiveTime, weeks: WeekPattern) -> CourseEntry {
        CourseEntry {
            user_id: UserId::new(),
            semester_id: SemesterId::new(),
            course_name: "Algorithms".to_string(),
            day_of_week: day,
            start,
            end,
            weeks,
        }
    }

    #[test]
    fn overlapping_course_conflicts() {
        let courses = vec![course(Weekday::Mon, t(8, 0), t(9, 50), WeekPattern::All)];
        let reasons = course_conflicts(&courses, &slot(), WeekParity::Odd);
        assert_eq!(reasons, vec!["course conflict: Algorithms"]);
    }

    #[test]
    fn parity_mismatch_clears_conflict() {
        let courses = vec![course(Weekday::Mon, t(8, 0), t(9, 50), WeekPattern::Even)];
        assert!(course_conflicts(&courses, &slot(), WeekParity::Odd).is_empty());
        assert!(!course_conflicts(&courses, &slot(), WeekParity::Even).is_empty());
    }

    #[test]
    fn different_day_never_conflicts() {
        let courses = vec![course(Weekday::Tue, t(8, 0), t(9, 50), WeekPattern::All)];
        assert!(course_conflicts(&courses, &slot(), WeekParity::Odd).is_empty());
    }

    #[test]
    fn unavailable_reason_is_surfaced() {
        let entries = vec![
            UnavailableEntry {
                user_id: UserId::new(),
                semester_id: SemesterId::new(),
                day_of_week: Weekday::Mon,
                start: t(9, 0),
                end: t(11, 0),
                weeks: WeekPattern::All,
                reason: Some("student council".to_string()),
                repeat: RepeatKind::Weekly,
            },
            UnavailableEntry {
                user_id: UserId::new(),
                semester_id: SemesterId::new(),
                day_of_week: Weekday::Mon,
                start: t(8, 0),
                end: t(9, 0),
                weeks: WeekPattern::All,
                reason: None,
                repeat: RepeatKind::Once,
            },
        ];
        let reasons = unavailable_conflicts(&entries, &slot(), WeekParity::Odd);
        assert_eq!(reasons, vec!["unavailable: student council", "unavailable time"]);
    }
}
