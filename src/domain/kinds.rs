//! Closed vocabularies stored as upper-case strings in the database.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid {kind} value: {value}")]
pub struct ParseKindError {
    pub kind: &'static str,
    pub value: String,
}

macro_rules! string_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $kind:literal {
            $($variant:ident => $text:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $text)]
                $variant,
            )+
        }

        impl $name {
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            #[must_use]
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = ParseKindError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let trimmed = s.trim();
                Self::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str().eq_ignore_ascii_case(trimmed))
                    .ok_or_else(|| ParseKindError {
                        kind: $kind,
                        value: s.to_string(),
                    })
            }
        }
    };
}

string_enum!(
    /// Authorization role. Every account holds at least one.
    Role, "role" {
        User => "ROLE_USER",
        Admin => "ROLE_ADMIN",
    }
);

string_enum!(Gender, "gender" {
    Male => "M",
    Female => "F",
});

string_enum!(
    /// Body-weight objective used by the seeder and shown on the profile.
    Goal, "goal" {
        Lose => "LOSE",
        Maintain => "MAINTAIN",
        Gain => "GAIN",
    }
);

string_enum!(MealType, "meal type" {
    Breakfast => "BREAKFAST",
    Lunch => "LUNCH",
    Dinner => "DINNER",
    Snack => "SNACK",
});

string_enum!(WorkoutType, "workout type" {
    Cardio => "CARDIO",
    Strength => "STRENGTH",
    Yoga => "YOGA",
    Other => "OTHER",
});

impl Role {
    /// Accepts the short form used by the admin endpoints (`ADMIN`, `user`).
    pub fn parse_lenient(s: &str) -> Result<Self, ParseKindError> {
        let trimmed = s.trim();
        if trimmed
            .get(..5)
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case("ROLE_"))
        {
            return trimmed.parse();
        }
        format!("ROLE_{trimmed}").parse()
    }
}

impl WorkoutType {
    /// Metabolic equivalent used for the calorie-burn estimate.
    #[must_use]
    pub const fn met(&self) -> f64 {
        match self {
            Self::Cardio => 8.0,
            Self::Strength => 6.0,
            Self::Yoga => 3.0,
            Self::Other => 4.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("cardio".parse::<WorkoutType>().unwrap(), WorkoutType::Cardio);
        assert_eq!(" LOSE ".parse::<Goal>().unwrap(), Goal::Lose);
        assert_eq!("f".parse::<Gender>().unwrap(), Gender::Female);
        assert!("BRUNCH".parse::<MealType>().is_err());
    }

    #[test]
    fn test_role_lenient_parse() {
        assert_eq!(Role::parse_lenient("admin").unwrap(), Role::Admin);
        assert_eq!(Role::parse_lenient("ROLE_USER").unwrap(), Role::User);
        assert!(Role::parse_lenient("owner").is_err());
    }

    #[test]
    fn test_serde_uses_wire_names() {
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"ROLE_ADMIN\"");
        let meal: MealType = serde_json::from_str("\"SNACK\"").unwrap();
        assert_eq!(meal, MealType::Snack);
    }

    #[test]
    fn test_met_table() {
        assert!((WorkoutType::Cardio.met() - 8.0).abs() < f64::EPSILON);
        assert!((WorkoutType::Yoga.met() - 3.0).abs() < f64::EPSILON);
        assert!((WorkoutType::Other.met() - 4.0).abs() < f64::EPSILON);
    }
}
