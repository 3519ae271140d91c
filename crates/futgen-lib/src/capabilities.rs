//! Device capability documents.
//!
//! A capability document is a JSON tree describing one device model: radio
//! bands, channel lists, maximum channel width, interface names by role and
//! the regulatory domain. [`CapabilityStore::get`] addresses it with
//! dot-separated key paths such as `interfaces.home_ap.5gl`.

use std::path::Path;

use serde_json::Value;

use crate::error::{FutgenError, Result};
use crate::wifi::RadioBand;

/// Regulatory domain assumed when a device does not declare one.
pub const DEFAULT_REGULATORY_DOMAIN: &str = "US";

/// Read-only key-path lookup over one device's capability document.
#[derive(Debug, Clone)]
pub struct CapabilityStore {
    model: String,
    root: Value,
}

impl CapabilityStore {
    pub fn new(model: impl Into<String>, root: Value) -> Self {
        CapabilityStore {
            model: model.into(),
            root,
        }
    }

    /// Parse a capability document from a JSON string.
    pub fn from_json(model: impl Into<String>, json: &str) -> Result<Self> {
        let root: Value = serde_json::from_str(json).map_err(|e| FutgenError::Json(e.to_string()))?;
        if !root.is_object() {
            return Err(FutgenError::Capability(
                "capability document must be a JSON object".into(),
            ));
        }
        Ok(Self::new(model, root))
    }

    /// Load `<dir>/<model>.json`, falling back to the lowercase model name.
    pub fn load(dir: &Path, model: &str) -> Result<Self> {
        let candidates = [
            dir.join(format!("{model}.json")),
            dir.join(format!("{}.json", model.to_lowercase())),
        ];
        let Some(path) = candidates.iter().find(|p| p.is_file()) else {
            return Err(FutgenError::Capability(format!(
                "no capability document for model {model} in {}",
                dir.display()
            )));
        };
        log::debug!("loading capabilities for {model} from {}", path.display());
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(model, &contents)
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Resolve a dot-separated path. Absent keys and JSON `null` give `None`.
    pub fn get(&self, path: &str) -> Option<&Value> {
        let mut node = &self.root;
        for key in path.split('.').filter(|k| !k.is_empty()) {
            node = match node {
                Value::Object(map) => map.get(key)?,
                Value::Array(items) => items.get(key.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        (!node.is_null()).then_some(node)
    }

    pub fn get_str(&self, path: &str) -> Option<&str> {
        self.get(path).and_then(Value::as_str)
    }

    /// Supported channels for a band, or `None` when the band is unsupported.
    pub fn radio_channels(&self, band: RadioBand) -> Option<Vec<u32>> {
        let list = self
            .get(&format!("interfaces.radio_channels.{band}"))?
            .as_array()?;
        Some(
            list.iter()
                .filter_map(|v| v.as_u64().and_then(|n| u32::try_from(n).ok()))
                .collect(),
        )
    }

    /// Bands whose channel list is present, in canonical band order.
    pub fn supported_bands(&self) -> Vec<RadioBand> {
        RadioBand::ALL
            .into_iter()
            .filter(|b| self.radio_channels(*b).is_some())
            .collect()
    }

    /// Maximum channel width in MHz. Accepts a number or a numeric string.
    pub fn max_channel_width(&self, band: RadioBand) -> Option<u32> {
        match self.get(&format!("interfaces.max_channel_width.{band}"))? {
            Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
            Value::String(s) => s.trim().trim_start_matches("HT").parse().ok(),
            _ => None,
        }
    }

    /// Physical radio interface name for a band.
    pub fn phy_radio_name(&self, band: RadioBand) -> Option<&str> {
        self.get_str(&format!("interfaces.phy_radio_name.{band}"))
            .filter(|s| !s.is_empty())
    }

    pub fn regulatory_domain(&self) -> &str {
        self.get_str("regulatory_domain")
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_REGULATORY_DOMAIN)
    }

    pub fn wifi_vendor(&self) -> Option<&str> {
        self.get_str("wifi_vendor").filter(|s| !s.is_empty())
    }

    /// Whether any radio reports the `11ax` hardware mode.
    pub fn supports_11ax(&self) -> bool {
        match self.get("interfaces.radio_hw_mode") {
            Some(Value::Object(modes)) => modes.values().any(|m| m.as_str() == Some("11ax")),
            Some(Value::String(mode)) => mode == "11ax",
            _ => false,
        }
    }
}
