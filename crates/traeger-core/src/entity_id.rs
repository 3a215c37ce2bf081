//! Entity ID type and the ids synthesized for a grill's sibling entities

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error type for invalid entity IDs
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EntityIdError {
    #[error("entity_id must contain exactly one '.' separator")]
    InvalidFormat,

    #[error("domain cannot be empty")]
    EmptyDomain,

    #[error("object_id cannot be empty")]
    EmptyObjectId,

    #[error("domain contains invalid characters (must be lowercase alphanumeric with underscores)")]
    InvalidDomainChars,

    #[error("object_id contains invalid characters (must be lowercase alphanumeric with underscores, cannot start/end with underscore)")]
    InvalidObjectIdChars,
}

/// A Home Assistant entity ID (e.g., "climate.0123456789ab_climate")
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EntityId {
    domain: String,
    object_id: String,
}

impl EntityId {
    /// Create a new EntityId from domain and object_id parts
    pub fn new(
        domain: impl Into<String>,
        object_id: impl Into<String>,
    ) -> Result<Self, EntityIdError> {
        let domain = domain.into();
        let object_id = object_id.into();

        if domain.is_empty() {
            return Err(EntityIdError::EmptyDomain);
        }
        if object_id.is_empty() {
            return Err(EntityIdError::EmptyObjectId);
        }
        if domain.contains("__") || !is_valid_object_id(&domain) {
            return Err(EntityIdError::InvalidDomainChars);
        }
        if !is_valid_object_id(&object_id) {
            return Err(EntityIdError::InvalidObjectIdChars);
        }

        Ok(Self { domain, object_id })
    }

    /// Build `<domain>.<slug(grill_id)>_<suffix>`
    pub fn for_grill(domain: &str, grill_id: &str, suffix: &str) -> Result<Self, EntityIdError> {
        let slug = slugify(grill_id);
        if slug.is_empty() {
            return Err(EntityIdError::EmptyObjectId);
        }
        Self::new(domain, format!("{}_{}", slug, suffix))
    }

    /// Compare against a raw `domain.object_id` string
    pub fn matches(&self, raw: &str) -> bool {
        raw.split_once('.')
            .is_some_and(|(domain, object_id)| domain == self.domain && object_id == self.object_id)
    }
}

/// Matches HA's `(?!_)[\da-z_]+(?<!_)`
fn is_valid_object_id(s: &str) -> bool {
    if s.starts_with('_') || s.ends_with('_') {
        return false;
    }
    s.chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

/// Lowercase a device id and replace anything outside `[a-z0-9]` with `_`
pub fn slugify(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
        } else if !out.ends_with('_') {
            out.push('_');
        }
    }
    out.trim_matches('_').to_string()
}

/// Strip every non-alphanumeric character from a friendly name and lowercase it
///
/// "Backyard Pro 780!" becomes "backyardpro780", the prefix the climate
/// platform uses for probe entities.
pub fn normalize_friendly_name(name: &str) -> String {
    name.chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

impl FromStr for EntityId {
    type Err = EntityIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split('.').collect();
        if parts.len() != 2 {
            return Err(EntityIdError::InvalidFormat);
        }
        Self::new(parts[0], parts[1])
    }
}

impl TryFrom<String> for EntityId {
    type Error = EntityIdError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<EntityId> for String {
    fn from(id: EntityId) -> String {
        id.to_string()
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.domain, self.object_id)
    }
}

/// Entities of the integration's other platforms that the cook cycle drives
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrillTargets {
    /// `climate.<grill>_climate`
    pub climate: EntityId,
    /// `switch.<grill>_smoke`
    pub smoke: EntityId,
    /// `switch.<grill>_keepwarm`
    pub keepwarm: EntityId,
    /// `number.<grill>_cook_timer`
    pub cook_timer: EntityId,
    /// `climate.<normalized name>_probe_p0`, absent when the name normalizes to nothing
    pub probe_climate: Option<EntityId>,
}

impl GrillTargets {
    pub fn new(grill_id: &str, friendly_name: Option<&str>) -> Result<Self, EntityIdError> {
        let probe_climate = friendly_name
            .map(normalize_friendly_name)
            .filter(|name| !name.is_empty())
            .map(|name| EntityId::new("climate", format!("{}_probe_p0", name)))
            .transpose()?;

        Ok(Self {
            climate: EntityId::for_grill("climate", grill_id, "climate")?,
            smoke: EntityId::for_grill("switch", grill_id, "smoke")?,
            keepwarm: EntityId::for_grill("switch", grill_id, "keepwarm")?,
            cook_timer: EntityId::for_grill("number", grill_id, "cook_timer")?,
            probe_climate,
        })
    }
}
