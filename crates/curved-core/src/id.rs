//! Property identifiers.
//!
//! Property models hand out ids by name (`"emission"`, `"particle.size"`).
//! Names are interned once in a process-wide table so ids are plain `u32`
//! handles after that.

use lasso::{Spur, ThreadedRodeo};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::borrow::Cow;
use std::fmt;
use std::sync::LazyLock;

static NAMES: LazyLock<ThreadedRodeo> = LazyLock::new(ThreadedRodeo::default);

/// Name of a property in the external property model.
///
/// Two ids are equal exactly when they were interned from the same name.
/// Formats as `#name`; serialises as the bare name.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PropertyId(Spur);

impl PropertyId {
    /// Id for `name`. Interning the same name twice returns the same id.
    pub fn intern(name: &str) -> Self {
        PropertyId(NAMES.get_or_intern(name))
    }

    pub fn as_str(&self) -> &str {
        NAMES.resolve(&self.0)
    }
}

impl From<&str> for PropertyId {
    fn from(name: &str) -> Self {
        PropertyId::intern(name)
    }
}

impl fmt::Display for PropertyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.as_str())
    }
}

impl fmt::Debug for PropertyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl Serialize for PropertyId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for PropertyId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = Cow::<'de, str>::deserialize(deserializer)?;
        Ok(PropertyId::intern(&name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_name_same_id() {
        let a = PropertyId::intern("emitter.spawn_rate");
        let b: PropertyId = "emitter.spawn_rate".into();
        assert_eq!(a, b);
        assert_ne!(a, PropertyId::intern("emitter.spawn_delay"));
        assert_eq!(a.as_str(), "emitter.spawn_rate");
    }

    #[test]
    fn formats_with_hash_sigil() {
        let id = PropertyId::intern("particle.alpha");
        assert_eq!(id.to_string(), "#particle.alpha");
        assert_eq!(format!("{id:?}"), "#particle.alpha");
    }

    #[test]
    fn serializes_as_plain_string() {
        let id = PropertyId::intern("particle.size");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"particle.size\"");
        let back: PropertyId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);

        // escaped names cannot be borrowed from the input
        let escaped: PropertyId = serde_json::from_str("\"a\\u002eb\"").unwrap();
        assert_eq!(escaped.as_str(), "a.b");
    }
}
