//! Scheduling rule codes and the per-run rule snapshot.
//!
//! The rule inventory is closed: adding or removing a rule is a source
//! change, not a data migration. Toggle state lives with the storage
//! collaborator; a [`RuleSet`] freezes it for the duration of one run.

use serde::{Deserialize, Serialize};

/// The six scheduling rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RuleCode {
    /// Course-timetable conflict (hard).
    R1,
    /// Declared-unavailable-time conflict (hard).
    R2,
    /// Avoid assigning one department twice on the same calendar day (soft).
    R3,
    /// Avoid one department holding the same slot in both template weeks (soft).
    R4,
    /// Avoid one department repeating an early slot across the two parities (soft).
    R5,
    /// Never assign the same person twice on one calendar day (hard).
    ///
    /// R6 is a hygiene invariant: the allocator and validator enforce it
    /// structurally no matter what the stored toggle says, and it cannot be
    /// switched off through the configuration surface.
    R6,
}

impl RuleCode {
    /// Every rule, in code order.
    pub const ALL: [RuleCode; 6] = [
        RuleCode::R1,
        RuleCode::R2,
        RuleCode::R3,
        RuleCode::R4,
        RuleCode::R5,
        RuleCode::R6,
    ];

    /// Short display label.
    pub fn label(self) -> &'static str {
        match self {
            Self::R1 => "course conflict",
            Self::R2 => "unavailable time",
            Self::R3 => "department per day",
            Self::R4 => "department per slot pair",
            Self::R5 => "early-shift rotation",
            Self::R6 => "one shift per person per day",
        }
    }

    /// Longer description for configuration UIs.
    pub fn describe(self) -> &'static str {
        match self {
            Self::R1 => "skip members whose course timetable overlaps the slot",
            Self::R2 => "skip members with a declared unavailable window over the slot",
            Self::R3 => "prefer not to place one department twice on a calendar day",
            Self::R4 => "prefer not to give one department the same slot in both weeks",
            Self::R5 => "prefer rotating early shifts across departments between parities",
            Self::R6 => "a member never holds two shifts on the same calendar day",
        }
    }

    /// Hard rules invalidate an assignment outright; soft rules only bias
    /// scoring.
    pub fn hard(self) -> bool {
        matches!(self, Self::R1 | Self::R2 | Self::R6)
    }

    /// Whether the toggle may be changed through the configuration surface.
    pub fn configurable(self) -> bool {
        !matches!(self, Self::R6)
    }
}

impl std::fmt::Display for RuleCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let code = match self {
            Self::R1 => "R1",
            Self::R2 => "R2",
            Self::R3 => "R3",
            Self::R4 => "R4",
            Self::R5 => "R5",
            Self::R6 => "R6",
        };
        f.write_str(code)
    }
}

impl std::str::FromStr for RuleCode {
    type Err = UnknownRuleCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "R1" => Ok(Self::R1),
            "R2" => Ok(Self::R2),
            "R3" => Ok(Self::R3),
            "R4" => Ok(Self::R4),
            "R5" => Ok(Self::R5),
            "R6" => Ok(Self::R6),
            _ => Err(UnknownRuleCode(s.to_string())),
        }
    }
}

/// Parse error for rule codes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown rule code: {0}")]
pub struct UnknownRuleCode(pub String);

/// Stored toggle state for one rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleToggle {
    /// Which rule
    pub code: RuleCode,

    /// Whether the rule participates in scheduling
    pub enabled: bool,
}

impl RuleToggle {
    /// The default inventory: every rule enabled.
    pub fn defaults() -> Vec<RuleToggle> {
        RuleCode::ALL
            .into_iter()
            .map(|code| RuleToggle { code, enabled: true })
            .collect()
    }
}

/// Immutable per-run snapshot of rule state.
///
/// Built once at the start of a scheduling run and passed by value into
/// every downstream component; no ambient or global rule state exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuleSet {
    enabled: [bool; 6],
}

impl RuleSet {
    /// Snapshot from stored toggles. Codes without a stored row default to
    /// enabled.
    pub fn from_toggles(toggles: &[RuleToggle]) -> Self {
        let mut enabled = [true; 6];
        for toggle in toggles {
            enabled[toggle.code as usize] = toggle.enabled;
        }
        Self { enabled }
    }

    /// Snapshot with every rule enabled.
    pub fn all_enabled() -> Self {
        Self { enabled: [true; 6] }
    }

    /// Whether a rule is in force for this run.
    ///
    /// R6 always reports enabled: it is enforced structurally regardless of
    /// the stored toggle.
    pub fn enabled(&self, code: RuleCode) -> bool {
        match code {
            RuleCode::R6 => true,
            other => self.enabled[other as usize],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_every_code() {
        let toggles = RuleToggle::defaults();
        assert_eq!(toggles.len(), RuleCode::ALL.len());
        let set = RuleSet::from_toggles(&toggles);
        for code in RuleCode::ALL {
            assert!(set.enabled(code));
        }
    }

    #[test]
    fn toggles_disable_soft_rules() {
        let toggles = vec![
            RuleToggle { code: RuleCode::R3, enabled: false },
            RuleToggle { code: RuleCode::R5, enabled: false },
        ];
        let set = RuleSet::from_toggles(&toggles);
        assert!(!set.enabled(RuleCode::R3));
        assert!(set.enabled(RuleCode::R4));
        assert!(!set.enabled(RuleCode::R5));
    }

    #[test]
    fn r6_ignores_its_toggle() {
        let toggles = vec![RuleToggle { code: RuleCode::R6, enabled: false }];
        let set = RuleSet::from_toggles(&toggles);
        assert!(set.enabled(RuleCode::R6));
    }

    #[test]
    fn hardness_and_configurability() {
        assert!(RuleCode::R1.hard());
        assert!(RuleCode::R2.hard());
        assert!(!RuleCode::R3.hard());
        assert!(RuleCode::R6.hard());
        assert!(RuleCode::R1.configurable());
        assert!(!RuleCode::R6.configurable());
    }
}
