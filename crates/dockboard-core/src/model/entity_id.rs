// ── Entity identifiers ──
//
// Every addressable state-bearing object on the host is named
// `<domain>.<object_id>`. Parsing happens once at the registry boundary.

use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Domain-qualified entity id, e.g. `binary_sensor.postgres_data`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EntityId(String);

impl EntityId {
    /// Build an id from its two halves.
    pub fn new(domain: &str, object_id: &str) -> Result<Self, CoreError> {
        format!("{domain}.{object_id}").parse()
    }

    /// The part before the dot (`switch`, `sensor`, ...).
    pub fn domain(&self) -> &str {
        self.0.split_once('.').map_or("", |(domain, _)| domain)
    }

    /// The part after the dot.
    pub fn object_id(&self) -> &str {
        self.0.split_once('.').map_or("", |(_, object_id)| object_id)
    }

    pub fn has_domain(&self, domain: &str) -> bool {
        self.domain() == domain
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn is_valid(value: &str) -> bool {
    let Some((domain, object_id)) = value.split_once('.') else {
        return false;
    };
    !domain.is_empty()
        && !object_id.is_empty()
        && !object_id.contains('.')
        && !value.chars().any(char::is_whitespace)
}

impl FromStr for EntityId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if is_valid(s) {
            Ok(Self(s.to_owned()))
        } else {
            Err(CoreError::InvalidEntityId { value: s.to_owned() })
        }
    }
}

impl TryFrom<String> for EntityId {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if is_valid(&value) {
            Ok(Self(value))
        } else {
            Err(CoreError::InvalidEntityId { value })
        }
    }
}

impl From<EntityId> for String {
    fn from(id: EntityId) -> Self {
        id.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for EntityId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// Lets snapshot maps be queried with plain `&str` keys.
impl Borrow<str> for EntityId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn splits_domain_and_object_id() {
        let id: EntityId = "binary_sensor.postgres_data".parse().unwrap();
        assert_eq!(id.domain(), "binary_sensor");
        assert_eq!(id.object_id(), "postgres_data");
        assert!(id.has_domain("binary_sensor"));
        assert!(!id.has_domain("sensor"));
    }

    #[test]
    fn rejects_malformed_ids() {
        for bad in ["sensor", ".x", "sensor.", "a.b.c", "sensor.has space", ""] {
            assert!(bad.parse::<EntityId>().is_err(), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn serde_round_trip_validates() {
        let id: EntityId = serde_json::from_str("\"switch.web\"").unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"switch.web\"");
        assert!(serde_json::from_str::<EntityId>("\"switchweb\"").is_err());
    }

    #[test]
    fn new_joins_halves() {
        let id = EntityId::new("sensor", "docker_integration_containers_c1").unwrap();
        assert_eq!(id.as_str(), "sensor.docker_integration_containers_c1");
    }
}
