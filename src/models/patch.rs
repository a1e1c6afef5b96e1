//! Tri-state field for partial updates
//!
//! A plain `Option<T>` cannot tell "field omitted" from "field sent as null".
//! Update schemas use [`Patch`] on nullable columns so that an omitted field
//! leaves the stored value alone while an explicit `null` clears it.
//!
//! Fields must be annotated with `#[serde(default)]` so that a missing key
//! deserializes to [`Patch::Unset`].

use serde::{Deserialize, Deserializer, Serialize, Serializer};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Patch<T> {
    /// Field absent from the payload: keep the stored value
    #[default]
    Unset,
    /// Field present as `null`: clear the stored value
    Null,
    /// Field present with a value: replace the stored value
    Set(T),
}

impl<T> Patch<T> {
    pub fn is_unset(&self) -> bool {
        matches!(self, Patch::Unset)
    }

    /// The new value if one was supplied
    pub fn as_set(&self) -> Option<&T> {
        match self {
            Patch::Set(v) => Some(v),
            _ => None,
        }
    }

    /// Write the patch into a nullable target.
    pub fn apply_to(self, target: &mut Option<T>) {
        match self {
            Patch::Unset => {}
            Patch::Null => *target = None,
            Patch::Set(v) => *target = Some(v),
        }
    }
}

impl<T> From<Option<T>> for Patch<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => Patch::Set(v),
            None => Patch::Null,
        }
    }
}

impl<'de, T> Deserialize<'de> for Patch<T>
where
    T: Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        // Only reached when the key is present; absence is handled by #[serde(default)]
        Option::<T>::deserialize(deserializer).map(Into::into)
    }
}

impl<T> Serialize for Patch<T>
where
    T: Serialize,
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Patch::Set(v) => serializer.serialize_some(v),
            Patch::Unset | Patch::Null => serializer.serialize_none(),
        }
    }
}
