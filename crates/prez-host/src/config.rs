//! Session configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{SessionError, SessionResult};
use crate::surface::Viewport;

/// How a session finds its way around the guest and the page.
///
/// Every field has a default, so a config file only names what it changes:
///
/// ```json
/// { "viewport": { "width": 800, "height": 600 }, "fuel_per_call": 1000000 }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BridgeConfig {
    /// Exported linear memory the imports read and write.
    pub memory_export: String,
    /// Called once by [`Session::run_entry`](crate::Session::run_entry).
    pub entry_export: String,
    /// Called once per tick after `host.start_loop`.
    pub frame_export: String,
    pub viewport: Viewport,
    /// Directory image sources are resolved against.
    pub asset_root: PathBuf,
    /// Instruction budget per guest call; `None` disables metering.
    pub fuel_per_call: Option<u64>,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            memory_export: "memory".to_string(),
            entry_export: "_start".to_string(),
            frame_export: "frame".to_string(),
            viewport: Viewport::default(),
            asset_root: PathBuf::from("."),
            fuel_per_call: None,
        }
    }
}

impl BridgeConfig {
    pub fn from_json_str(json: &str) -> SessionResult<Self> {
        serde_json::from_str(json).map_err(|e| SessionError::Config(e.to_string()))
    }

    pub fn from_path(path: impl AsRef<Path>) -> SessionResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        serde_json::from_str(&text)
            .map_err(|e| SessionError::Config(format!("{}: {e}", path.display())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_gives_defaults() {
        assert_eq!(
            BridgeConfig::from_json_str("{}").unwrap(),
            BridgeConfig::default()
        );
    }

    #[test]
    fn partial_config_overrides_named_fields() {
        let config = BridgeConfig::from_json_str(
            r#"{ "viewport": { "width": 800, "height": 600 }, "fuel_per_call": 5000 }"#,
        )
        .unwrap();
        assert_eq!(
            config.viewport,
            Viewport {
                width: 800,
                height: 600,
            }
        );
        assert_eq!(config.fuel_per_call, Some(5000));
        assert_eq!(config.entry_export, "_start");
    }

    #[test]
    fn unknown_fields_are_rejected() {
        assert!(matches!(
            BridgeConfig::from_json_str(r#"{ "memroy_export": "mem" }"#),
            Err(SessionError::Config(_))
        ));
    }

    #[test]
    fn missing_file_is_io_error() {
        assert!(matches!(
            BridgeConfig::from_path("/definitely/not/here.json"),
            Err(SessionError::Io(_))
        ));
    }
}
