//! Settings file
//!
//! Every field is optional; command-line flags override what the file sets.
//!
//! ```toml
//! seed = 7
//!
//! [upload]
//! tick_ms = 200
//! max_increment = 15.0
//!
//! [analyzing]
//! total_ms = 5000
//! grace_ms = 500
//! policy = "time_boxed"
//!
//! [serve]
//! port = 3001
//! open_browser = true
//! ```

use crate::analyzing::SequencerConfig;
use crate::error::Result;
use crate::upload::UploadConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServeSettings {
    pub port: u16,
    pub open_browser: bool,
}

impl Default for ServeSettings {
    fn default() -> Self {
        Self {
            port: 3001,
            open_browser: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Seed for every simulated random draw; unset means fresh entropy.
    pub seed: Option<u64>,
    pub upload: UploadConfig,
    pub analyzing: SequencerConfig,
    pub serve: ServeSettings,
}

impl Settings {
    /// Parse and validate; a file that would stall the simulation is refused.
    pub fn from_toml(text: &str) -> Result<Self> {
        let settings: Self = toml::from_str(text)?;
        settings.upload.validate()?;
        settings.analyzing.validate()?;
        Ok(settings)
    }

    /// Read `path` if given, defaults otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                let text = std::fs::read_to_string(path)?;
                log::debug!("Loaded settings from {}", path.display());
                Self::from_toml(&text)
            }
            None => Ok(Self::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzing::NavigationPolicy;

    #[test]
    fn test_empty_file_is_default() {
        assert_eq!(Settings::from_toml("").unwrap(), Settings::default());
    }

    #[test]
    fn test_partial_sections() {
        let s = Settings::from_toml(
            "seed = 9\n[upload]\ntick_ms = 50\n[analyzing]\npolicy = \"await_steps\"\n",
        )
        .unwrap();
        assert_eq!(s.seed, Some(9));
        assert_eq!(s.upload.tick_ms, 50);
        assert_eq!(s.upload.max_increment, 15.0);
        assert_eq!(s.analyzing.policy, NavigationPolicy::AwaitSteps);
        assert_eq!(s.analyzing.total_ms, 5000);
        assert_eq!(s.serve.port, 3001);
    }

    #[test]
    fn test_bad_toml_is_config_error() {
        let err = Settings::from_toml("seed = \"x\"").unwrap_err();
        assert!(err.to_string().starts_with("config:"));
    }

    #[test]
    fn test_zero_upload_increment_is_refused() {
        let err = Settings::from_toml("[upload]\nmax_increment = 0.0\n").unwrap_err();
        assert!(matches!(err, crate::error::FlowError::InvalidConfig(_)));
    }

    #[test]
    fn test_too_short_analysis_is_refused() {
        let err = Settings::from_toml("[analyzing]\ntotal_ms = 50\n").unwrap_err();
        assert!(matches!(err, crate::error::FlowError::InvalidConfig(_)));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("detecta.toml");
        std::fs::write(&path, "[serve]\nport = 8080\n").unwrap();
        let s = Settings::load(Some(&path)).unwrap();
        assert_eq!(s.serve.port, 8080);
        assert!(s.serve.open_browser);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = Settings::load(Some(Path::new("/definitely/not/here.toml"))).unwrap_err();
        assert!(matches!(err, crate::error::FlowError::Io(_)));
    }
}
