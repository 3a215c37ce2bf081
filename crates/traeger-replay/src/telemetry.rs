//! Recorded telemetry files
//!
//! A recording is YAML (or JSON) with the grill description followed by a
//! list of frames. Each frame may carry a status snapshot, accessory updates
//! and ids of accessories that disappeared.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use traeger_core::{Accessory, GrillDetails, GrillFeatures, GrillLimits, GrillSnapshot};

#[derive(Debug, Deserialize)]
pub struct Recording {
    pub grill: GrillDetails,

    #[serde(default)]
    pub limits: Option<GrillLimits>,

    #[serde(default)]
    pub features: Option<GrillFeatures>,

    #[serde(default)]
    pub frames: Vec<Frame>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Frame {
    #[serde(default)]
    pub status: Option<GrillSnapshot>,

    #[serde(default)]
    pub accessories: Vec<Accessory>,

    /// Accessory uuids to drop
    #[serde(default)]
    pub removed: Vec<String>,
}

impl Recording {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("invalid recording {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }
}
