//! Strongly typed identifiers and enumerations shared by the services,
//! repositories and HTTP layer.
//!
//! Entity ids are UUIDs. Each table gets its own newtype so a `MealId` can never
//! be passed where a `WorkoutId` is expected.

pub mod kinds;
pub mod patch;

pub use kinds::{Gender, Goal, MealType, ParseKindError, Role, WorkoutType};
pub use patch::Patch;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            #[must_use]
            pub const fn value(&self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s).map(Self)
            }
        }
    };
}

uuid_id!(
    /// Identifier of a registered account.
    UserId
);
uuid_id!(
    /// Identifier of a per-date daily log.
    DailyLogId
);
uuid_id!(MealId);
uuid_id!(WorkoutId);
uuid_id!(ProgressId);

/// Inclusive date range where either bound may be missing.
///
/// A missing bound means the range is open on that side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DateRange {
    pub start: Option<chrono::NaiveDate>,
    pub end: Option<chrono::NaiveDate>,
}

impl DateRange {
    #[must_use]
    pub const fn new(start: Option<chrono::NaiveDate>, end: Option<chrono::NaiveDate>) -> Self {
        Self { start, end }
    }

    #[must_use]
    pub const fn between(start: chrono::NaiveDate, end: chrono::NaiveDate) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
        }
    }

    #[must_use]
    pub const fn unbounded() -> Self {
        Self {
            start: None,
            end: None,
        }
    }

    /// Lower timestamp bound (inclusive): midnight at the start date.
    #[must_use]
    pub fn start_timestamp(&self) -> Option<chrono::NaiveDateTime> {
        self.start.and_then(|d| d.and_hms_opt(0, 0, 0))
    }

    /// Upper timestamp bound (exclusive): midnight of the day after the end date.
    #[must_use]
    pub fn end_timestamp_exclusive(&self) -> Option<chrono::NaiveDateTime> {
        self.end
            .and_then(|d| d.succ_opt())
            .and_then(|d| d.and_hms_opt(0, 0, 0))
    }

    #[must_use]
    pub fn contains(&self, date: chrono::NaiveDate) -> bool {
        self.start.is_none_or(|s| date >= s) && self.end.is_none_or(|e| date <= e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_id_roundtrip_through_string() {
        let id = MealId::new();
        let parsed: MealId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
        assert!("not-a-uuid".parse::<MealId>().is_err());
    }

    #[test]
    fn test_id_serializes_as_plain_uuid() {
        let raw = Uuid::new_v4();
        let id = UserId::from(raw);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{raw}\""));
    }

    #[test]
    fn test_date_range_bounds() {
        let start = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 3, 31).unwrap();
        let range = DateRange::between(start, end);

        assert_eq!(
            range.end_timestamp_exclusive().unwrap(),
            NaiveDate::from_ymd_opt(2024, 4, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap()
        );
        assert!(range.contains(end));
        assert!(!range.contains(end.succ_opt().unwrap()));

        let open = DateRange::new(Some(start), None);
        assert!(open.contains(NaiveDate::from_ymd_opt(2100, 1, 1).unwrap()));
        assert!(open.end_timestamp_exclusive().is_none());
        assert!(DateRange::unbounded().contains(start));
    }
}
