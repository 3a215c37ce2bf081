//! Serde helpers for 0/1 flags
//!
//! The grill reports switches as integers while automations tend to send
//! booleans. Both forms deserialize to `bool`; flags serialize back as 0/1.

use serde::{Deserialize, Deserializer, Serializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum RawFlag {
    Bool(bool),
    Int(i64),
    Float(f64),
}

impl From<RawFlag> for bool {
    fn from(raw: RawFlag) -> bool {
        match raw {
            RawFlag::Bool(b) => b,
            RawFlag::Int(i) => i != 0,
            RawFlag::Float(f) => f != 0.0,
        }
    }
}

/// Deserialize a required flag
pub fn deserialize<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    RawFlag::deserialize(deserializer).map(bool::from)
}

/// Serialize a flag as 0/1
pub fn serialize<S>(value: &bool, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_u8(u8::from(*value))
}

/// Helpers for `Option<bool>` fields
pub mod option {
    use super::RawFlag;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<RawFlag>::deserialize(deserializer).map(|raw| raw.map(bool::from))
    }

    pub fn serialize<S>(value: &Option<bool>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(b) => serializer.serialize_u8(u8::from(*b)),
            None => serializer.serialize_none(),
        }
    }
}
