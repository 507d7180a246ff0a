//! Binder and host configuration.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::props::Displayable;

fn default_style_unit() -> String {
    "px".to_string()
}

/// Settings shared by every component built from one factory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Suffix appended to bare numbers written into style properties.
    #[serde(default = "default_style_unit")]
    pub style_unit: String,

    /// Placeholder text shown while a text atom is pending, used when the
    /// component does not pass its own.
    pub pending_text: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            style_unit: default_style_unit(),
            pending_text: None,
        }
    }
}

impl Config {
    /// Parse a configuration from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::Config(e.to_string()))
    }

    /// Format a number for a style property.
    pub(crate) fn style_length(&self, value: f64) -> String {
        format!("{}{}", Displayable::Number(value), self.style_unit)
    }

    /// Format any value for a style property. Only bare numbers get a unit.
    pub(crate) fn style_value(&self, value: &Displayable) -> String {
        match value {
            Displayable::Number(n) => self.style_length(*n),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_pixels() {
        let config = Config::default();
        assert_eq!(config.style_unit, "px");
        assert_eq!(config.pending_text, None);
        assert_eq!(config.style_length(12.0), "12px");
        assert_eq!(config.style_length(1.5), "1.5px");
        assert_eq!(config.style_value(&Displayable::from("auto")), "auto");
        assert_eq!(config.style_value(&Displayable::from(0)), "0px");
    }

    #[test]
    fn loads_partial_json() {
        let config = Config::from_json(r#"{ "pending_text": "Loading..." }"#).unwrap();
        assert_eq!(config.style_unit, "px");
        assert_eq!(config.pending_text.as_deref(), Some("Loading..."));

        let config = Config::from_json(r#"{ "style_unit": "rem" }"#).unwrap();
        assert_eq!(config.style_length(2.0), "2rem");
    }

    #[test]
    fn rejects_malformed_json() {
        let err = Config::from_json("{ style_unit: ").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
