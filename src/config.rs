use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Full configuration of the vignette.
///
/// Every section falls back to the stock scene when omitted, so an empty TOML
/// file is a valid configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub scene: SceneSize,
    pub assets: AssetPaths,
    pub chisel: ChiselConfig,
    pub timing: Timing,
    pub colors: Colors,
}

/// Window (or viewport) dimensions in pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneSize {
    pub width: u32,
    pub height: u32,
    pub title: String,
}

impl Default for SceneSize {
    fn default() -> Self {
        SceneSize {
            width: 850,
            height: 450,
            title: "Hammer and chisel".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetPaths {
    pub background: PathBuf,
    pub top_layer: PathBuf,
    pub chisel: PathBuf,
    pub popup: PathBuf,
    /// JSON file with the popup texts; the embedded set is used when absent.
    pub popup_texts: Option<PathBuf>,
}

impl Default for AssetPaths {
    fn default() -> Self {
        AssetPaths {
            background: PathBuf::from("assets/img/interaction_hammer_chisel_bg.jpg"),
            top_layer: PathBuf::from("assets/img/interaction_hammer_chisel_top_layer.png"),
            chisel: PathBuf::from("assets/img/interaction_hammer_chisel_chisel.png"),
            popup: PathBuf::from("assets/img/popup.png"),
            popup_texts: None,
        }
    }
}

/// Chisel sprite placement and motion, in world units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChiselConfig {
    pub start_x: f64,
    pub target_x: f64,
    pub y: f64,
    pub z: f64,
    pub scale: f64,
    pub total_steps: u32,
    /// Distance covered per frame while a step is in progress.
    pub step_size: f64,
}

impl Default for ChiselConfig {
    fn default() -> Self {
        ChiselConfig {
            start_x: -33.0,
            target_x: -9.15,
            y: -8.0,
            z: -5.0,
            scale: 0.16,
            total_steps: 5,
            step_size: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timing {
    pub warning_flash_ms: u64,
    pub activation_delay_ms: u64,
    pub popup_delay_ms: u64,
    pub frame_interval_ms: u64,
}

impl Default for Timing {
    fn default() -> Self {
        Timing {
            warning_flash_ms: 500,
            activation_delay_ms: 300,
            popup_delay_ms: 1000,
            frame_interval_ms: 16,
        }
    }
}

impl Timing {
    pub fn warning_flash(&self) -> Duration {
        Duration::from_millis(self.warning_flash_ms)
    }

    pub fn activation_delay(&self) -> Duration {
        Duration::from_millis(self.activation_delay_ms)
    }

    pub fn popup_delay(&self) -> Duration {
        Duration::from_millis(self.popup_delay_ms)
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Colors {
    pub line: [u8; 3],
    pub warning: [u8; 3],
}

impl Default for Colors {
    fn default() -> Self {
        Colors {
            line: [255, 255, 255],
            warning: [230, 40, 40],
        }
    }
}

impl SceneConfig {
    /// Loads a configuration from a TOML file. The result is not validated.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Rejects configurations the controller cannot run.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.scene.width == 0 || self.scene.height == 0 {
            return Err(ConfigError::EmptyScene {
                width: self.scene.width,
                height: self.scene.height,
            });
        }
        if self.chisel.total_steps == 0 {
            return Err(ConfigError::ZeroSteps);
        }

        let chisel = &self.chisel;
        for (field, value) in [
            ("chisel.start_x", chisel.start_x),
            ("chisel.target_x", chisel.target_x),
            ("chisel.y", chisel.y),
            ("chisel.z", chisel.z),
            ("chisel.scale", chisel.scale),
            ("chisel.step_size", chisel.step_size),
        ] {
            if !value.is_finite() {
                return Err(ConfigError::NonFinite { field, value });
            }
        }
        if chisel.step_size <= 0.0 {
            return Err(ConfigError::NonPositiveStep(chisel.step_size));
        }
        if self.timing.frame_interval_ms == 0 {
            return Err(ConfigError::ZeroFrameInterval);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = SceneConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.chisel.total_steps, 5);
        assert_eq!(config.timing.popup_delay(), Duration::from_millis(1000));
    }

    #[test]
    fn empty_toml_yields_defaults() {
        let config: SceneConfig = toml::from_str("").unwrap();
        assert_eq!(config, SceneConfig::default());
    }

    #[test]
    fn partial_toml_overrides_only_named_fields() {
        let config: SceneConfig = toml::from_str(
            r#"
            [chisel]
            total_steps = 8
            step_size = 0.6

            [timing]
            popup_delay_ms = 250
            "#,
        )
        .unwrap();
        assert_eq!(config.chisel.total_steps, 8);
        assert_eq!(config.chisel.step_size, 0.6);
        assert_eq!(config.chisel.start_x, -33.0);
        assert_eq!(config.timing.popup_delay_ms, 250);
        assert_eq!(config.timing.warning_flash_ms, 500);
    }

    #[test]
    fn zero_steps_rejected() {
        let mut config = SceneConfig::default();
        config.chisel.total_steps = 0;
        assert!(matches!(config.validate(), Err(ConfigError::ZeroSteps)));
    }

    #[test]
    fn non_finite_rejected() {
        let mut config = SceneConfig::default();
        config.chisel.target_x = f64::NAN;
        match config.validate() {
            Err(ConfigError::NonFinite { field, .. }) => assert_eq!(field, "chisel.target_x"),
            other => panic!("unexpected result: {other:?}"),
        }

        let mut config = SceneConfig::default();
        config.chisel.step_size = f64::INFINITY;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NonFinite { .. })
        ));
    }

    #[test]
    fn non_positive_step_rejected() {
        let mut config = SceneConfig::default();
        config.chisel.step_size = 0.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NonPositiveStep(_))
        ));
    }

    #[test]
    fn empty_scene_rejected() {
        let mut config = SceneConfig::default();
        config.scene.height = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::EmptyScene { .. })
        ));
    }

    #[test]
    fn load_reports_missing_file() {
        let err = SceneConfig::load(Path::new("/nonexistent/chisel.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn load_reads_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scene.toml");
        std::fs::write(&path, "[scene]\nwidth = 640\nheight = 360\n").unwrap();

        let config = SceneConfig::load(&path).unwrap();
        assert_eq!(config.scene.width, 640);
        assert_eq!(config.scene.height, 360);
    }

    #[test]
    fn load_reports_bad_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scene.toml");
        std::fs::write(&path, "[chisel]\ntotal_steps = \"five\"\n").unwrap();

        let err = SceneConfig::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
