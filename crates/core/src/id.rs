//! Unique identifiers for roster entities.

use serde::{Deserialize, Serialize};
use ulid::Ulid;

macro_rules! define_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(Ulid);

        impl $name {
            /// Generate a new random identifier.
            pub fn new() -> Self {
                Self(Ulid::new())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                self.0.fmt(f)
            }
        }

        impl std::str::FromStr for $name {
            type Err = ulid::DecodeError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(s.parse()?))
            }
        }
    };
}

define_id! {
    /// Unique identifier for a Semester
    SemesterId
}

define_id! {
    /// Unique identifier for a TimeSlot template
    TimeSlotId
}

define_id! {
    /// Unique identifier for a User (member, candidate, operator)
    UserId
}

define_id! {
    /// Unique identifier for a Department
    DepartmentId
}

define_id! {
    /// Unique identifier for a duty Location
    LocationId
}

define_id! {
    /// Unique identifier for a Roster
    RosterId
}

define_id! {
    /// Unique identifier for a RosterItem
    RosterItemId
}

define_id! {
    /// Unique identifier for a ChangeLogEntry
    ChangeLogId
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_through_string() {
        let id = RosterId::new();
        let parsed: RosterId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn ids_are_distinct() {
        assert_ne!(UserId::new(), UserId::new());
    }
}
