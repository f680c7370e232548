//! Two-cycle week arithmetic.
//!
//! Rosters run on a "week 1 / week 2" template. Each semester declares which
//! calendar parity week 1 corresponds to, which lets busy-time records tagged
//! odd/even/all be matched against a concrete template week.

use serde::{Deserialize, Serialize};

/// Calendar parity of a teaching week.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeekParity {
    /// Odd calendar weeks.
    Odd,
    /// Even calendar weeks.
    Even,
}

impl WeekParity {
    /// The opposite parity.
    pub fn flipped(self) -> Self {
        match self {
            Self::Odd => Self::Even,
            Self::Even => Self::Odd,
        }
    }
}

/// Template week within the two-week roster cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeekNumber {
    /// The first week of the cycle.
    One,
    /// The second week of the cycle.
    Two,
}

impl WeekNumber {
    /// Both template weeks, in order.
    pub const ALL: [WeekNumber; 2] = [WeekNumber::One, WeekNumber::Two];

    /// The other week of the cycle.
    pub fn other(self) -> Self {
        match self {
            Self::One => Self::Two,
            Self::Two => Self::One,
        }
    }

    /// Numeric form for display (1 or 2).
    pub fn as_u8(self) -> u8 {
        match self {
            Self::One => 1,
            Self::Two => 2,
        }
    }
}

/// Week tag carried by busy-time records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeekPattern {
    /// Applies every week.
    All,
    /// Odd calendar weeks only.
    Odd,
    /// Even calendar weeks only.
    Even,
}

impl WeekPattern {
    /// Whether a record with this tag applies in a week of the given parity.
    ///
    /// `All` matches anything; a concrete tag must equal the week's parity.
    pub fn matches(self, parity: WeekParity) -> bool {
        match self {
            Self::All => true,
            Self::Odd => parity == WeekParity::Odd,
            Self::Even => parity == WeekParity::Even,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parity_flips() {
        assert_eq!(WeekParity::Odd.flipped(), WeekParity::Even);
        assert_eq!(WeekParity::Even.flipped(), WeekParity::Odd);
    }

    #[test]
    fn pattern_matching() {
        assert!(WeekPattern::All.matches(WeekParity::Odd));
        assert!(WeekPattern::All.matches(WeekParity::Even));
        assert!(WeekPattern::Odd.matches(WeekParity::Odd));
        assert!(!WeekPattern::Odd.matches(WeekParity::Even));
        assert!(!WeekPattern::Even.matches(WeekParity::Odd));
    }

    #[test]
    fn week_other() {
        assert_eq!(WeekNumber::One.other(), WeekNumber::Two);
        assert_eq!(WeekNumber::Two.other(), WeekNumber::One);
    }
}
