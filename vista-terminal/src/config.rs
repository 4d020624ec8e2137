/// Demo configuration loaded from TOML
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// A value outside its allowed range
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Top-level demo settings. Every section and field is optional in the file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    pub camera: CameraConfig,
    pub controls: ControlsConfig,
    pub render: RenderConfig,

    /// STL file added to the scene as "model"
    pub model: Option<PathBuf>,
}

/// Initial camera pose and projection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub eye: [f32; 3],
    pub back: [f32; 3],
    pub near: f64,
    pub far: f64,
    /// Degrees
    pub vertical_fov: f64,
    pub min_fov: f64,
    pub max_fov: f64,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            eye: [0.0, 0.0, 12.0],
            back: [0.0, 0.0, 1.0],
            near: 0.01,
            far: 40.0,
            vertical_fov: 50.0,
            min_fov: 1.0,
            max_fov: 120.0,
        }
    }
}

/// Step sizes applied per key press or mouse cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlsConfig {
    pub move_delta: f32,
    pub degree_delta: f32,
    pub scale_up: f32,
    pub scale_down: f32,
    /// Degrees of field of view per scroll step
    pub fov_step: f64,
    /// Degrees of camera rotation per cell of mouse drag
    pub mouse_degrees: f32,
}

impl Default for ControlsConfig {
    fn default() -> Self {
        Self {
            move_delta: 0.25,
            degree_delta: 5.0,
            scale_up: 1.1,
            scale_down: 0.9,
            fov_step: 2.0,
            mouse_degrees: 2.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub target_fps: u32,
    /// Height of a terminal cell divided by its width
    pub cell_aspect: f64,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            target_fps: 30,
            cell_aspect: 2.0,
        }
    }
}

impl DemoConfig {
    /// Load and validate a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let camera = &self.camera;
        if camera.near <= 0.0 {
            return Err(ConfigError::Invalid(format!("near plane must be positive, got {}", camera.near)));
        }
        if camera.far <= camera.near {
            return Err(ConfigError::Invalid(format!(
                "far plane {} must lie beyond near plane {}",
                camera.far, camera.near
            )));
        }
        if camera.min_fov <= 0.0 || camera.min_fov > camera.max_fov || camera.max_fov >= 180.0 {
            return Err(ConfigError::Invalid(format!(
                "field of view range [{}, {}] must lie within (0, 180)",
                camera.min_fov, camera.max_fov
            )));
        }

        let controls = &self.controls;
        let deltas = [
            ("move_delta", controls.move_delta as f64),
            ("degree_delta", controls.degree_delta as f64),
            ("scale_up", controls.scale_up as f64),
            ("scale_down", controls.scale_down as f64),
            ("fov_step", controls.fov_step),
            ("mouse_degrees", controls.mouse_degrees as f64),
        ];
        if let Some((name, value)) = deltas.iter().find(|(_, value)| *value <= 0.0) {
            return Err(ConfigError::Invalid(format!("{} must be positive, got {}", name, value)));
        }

        if self.render.target_fps == 0 || self.render.cell_aspect <= 0.0 {
            return Err(ConfigError::Invalid(
                "target_fps and cell_aspect must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Width over height of a `columns` x `rows` terminal, in screen units
    pub fn aspect_ratio(&self, columns: u16, rows: u16) -> f64 {
        columns as f64 / (rows.max(1) as f64 * self.render.cell_aspect)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = DemoConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.camera.eye, [0.0, 0.0, 12.0]);
        assert_eq!(config.model, None);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = DemoConfig::from_toml_str(
            r#"
            model = "bear.stl"

            [camera]
            vertical_fov = 70.0

            [controls]
            move_delta = 0.5
            "#,
        )
        .unwrap();
        assert_eq!(config.camera.vertical_fov, 70.0);
        assert_eq!(config.camera.far, 40.0);
        assert_eq!(config.controls.move_delta, 0.5);
        assert_eq!(config.controls.degree_delta, 5.0);
        assert_eq!(config.render.target_fps, 30);
        assert_eq!(config.model, Some(PathBuf::from("bear.stl")));
    }

    #[test]
    fn test_rejects_bad_planes() {
        let err = DemoConfig::from_toml_str("[camera]\nnear = 0.0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
        let err = DemoConfig::from_toml_str("[camera]\nnear = 5.0\nfar = 2.0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_rejects_inverted_fov_range() {
        let err = DemoConfig::from_toml_str("[camera]\nmin_fov = 90.0\nmax_fov = 30.0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_rejects_non_positive_delta() {
        let err = DemoConfig::from_toml_str("[controls]\ndegree_delta = -1.0").unwrap_err();
        assert!(err.to_string().contains("degree_delta"));
    }

    #[test]
    fn test_parse_and_io_errors() {
        assert!(matches!(
            DemoConfig::from_toml_str("[camera\n"),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            DemoConfig::load("/nonexistent/vista.toml"),
            Err(ConfigError::Io(_))
        ));
    }

    #[test]
    fn test_aspect_ratio_accounts_for_cells() {
        let config = DemoConfig::default();
        assert_eq!(config.aspect_ratio(80, 20), 2.0);
    }
}
