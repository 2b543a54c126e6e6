//! `__type__`-tagged nested objects.

use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::ops::{Deref, DerefMut};

pub const DISCRIMINATOR: &str = "__type__";

/// A schema type with a fixed discriminator value.
pub trait Discriminated {
    const TAG: &'static str;
}

/// Wraps a nested object so that it always carries its `__type__` on the wire.
///
/// On input the tag may be missing (it is restored) but must not name another type.
/// A `null` decodes to `T::default()`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tagged<T>(pub T);

impl<T> Tagged<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> Deref for Tagged<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T> DerefMut for Tagged<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.0
    }
}

impl<T> From<T> for Tagged<T> {
    fn from(inner: T) -> Self {
        Tagged(inner)
    }
}

impl<T: Serialize + Discriminated> Serialize for Tagged<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut value = serde_json::to_value(&self.0).map_err(serde::ser::Error::custom)?;
        match value.as_object_mut() {
            Some(map) => {
                map.insert(DISCRIMINATOR.to_string(), Value::String(T::TAG.to_string()));
            }
            None => {
                return Err(serde::ser::Error::custom(format!(
                    "{} must serialize to an object",
                    T::TAG
                )))
            }
        }
        value.serialize(serializer)
    }
}

impl<'de, T: DeserializeOwned + Discriminated + Default> Deserialize<'de> for Tagged<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut value = Value::deserialize(deserializer)?;
        if value.is_null() {
            return Ok(Tagged(T::default()));
        }
        let map = value
            .as_object_mut()
            .ok_or_else(|| D::Error::custom(format!("{} must be an object", T::TAG)))?;
        match map.remove(DISCRIMINATOR) {
            None | Some(Value::Null) => {}
            Some(Value::String(tag)) if tag == T::TAG => {}
            Some(other) => {
                return Err(D::Error::custom(format!(
                    "expected {} '{}', found {}",
                    DISCRIMINATOR,
                    T::TAG,
                    other
                )))
            }
        }
        serde_json::from_value(value).map(Tagged).map_err(D::Error::custom)
    }
}

/// Deserialize `null` as `T::default()`; the backend writes `None` fields as `null`.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(default)]
    struct Probe {
        name: String,
    }

    impl Discriminated for Probe {
        const TAG: &'static str = "Probe";
    }

    #[test]
    fn writes_tag() {
        let value = serde_json::to_value(Tagged(Probe { name: "a".into() })).unwrap();
        assert_eq!(value, json!({"__type__": "Probe", "name": "a"}));
    }

    #[test]
    fn restores_missing_tag_and_rejects_foreign_tag() {
        let probe: Tagged<Probe> = serde_json::from_value(json!({"name": "b"})).unwrap();
        assert_eq!(probe.name, "b");

        let err = serde_json::from_value::<Tagged<Probe>>(json!({"__type__": "Other"}));
        assert!(err.is_err());
    }

    #[test]
    fn null_is_default() {
        let probe: Tagged<Probe> = serde_json::from_value(Value::Null).unwrap();
        assert_eq!(probe.0, Probe::default());
    }
}
