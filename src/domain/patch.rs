use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// One field of a partial update.
///
/// `Absent` means the field was not sent, `Null` means it was sent as an
/// explicit `null`. Declare fields with `#[serde(default)]` so a missing key
/// becomes `Absent`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Patch<T> {
    #[default]
    Absent,
    Null,
    Value(T),
}

impl<T> Patch<T> {
    #[must_use]
    pub const fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    pub fn into_value(self) -> Option<T> {
        match self {
            Self::Value(v) => Some(v),
            _ => None,
        }
    }

    /// Overwrite `target` only when a value was supplied; `Null` is ignored.
    pub fn apply_to(self, target: &mut T) {
        if let Self::Value(v) = self {
            *target = v;
        }
    }

    /// Same as [`Patch::apply_to`] for nullable columns.
    pub fn apply_to_option(self, target: &mut Option<T>) {
        if let Self::Value(v) = self {
            *target = Some(v);
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Patch<U> {
        match self {
            Self::Absent => Patch::Absent,
            Self::Null => Patch::Null,
            Self::Value(v) => Patch::Value(f(v)),
        }
    }
}

impl<T> From<Option<T>> for Patch<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Self::Value)
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Patch<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<T>::deserialize(deserializer).map(Into::into)
    }
}

impl<T: Serialize> Serialize for Patch<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Self::Value(v) => serializer.serialize_some(v),
            _ => serializer.serialize_none(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Update {
        #[serde(default)]
        duration: Patch<i32>,
        #[serde(default)]
        notes: Patch<String>,
    }

    #[test]
    fn test_missing_null_and_value_are_distinct() {
        let update: Update = serde_json::from_str(r#"{"notes": null}"#).unwrap();
        assert!(update.duration.is_absent());
        assert_eq!(update.notes, Patch::Null);

        let update: Update = serde_json::from_str(r#"{"duration": 45}"#).unwrap();
        assert_eq!(update.duration, Patch::Value(45));
        assert!(update.notes.is_absent());
    }

    #[test]
    fn test_apply_conventions() {
        let mut notes = Some("keep".to_string());
        Patch::<String>::Null.apply_to_option(&mut notes);
        assert_eq!(notes.as_deref(), Some("keep"));

        let mut duration = 30;
        Patch::Absent.apply_to(&mut duration);
        assert_eq!(duration, 30);
        Patch::Value(45).apply_to(&mut duration);
        assert_eq!(duration, 45);
    }
}
