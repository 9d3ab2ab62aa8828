//! Preview configuration.
//!
//! Read from a JSON file; every key is optional and falls back to its default.

use crate::error::{PreviewError, PreviewResult};
use crate::transcode::Dimensions;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Grammar scope of the Processing sketch language.
pub const PROCESSING_GRAMMAR: &str = "source.processing";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewConfig {
    /// Re-render on every settled edit instead of only on save/reload.
    #[serde(default = "default_true")]
    pub live_update: bool,

    /// Pane layout hint for the host; not used by the render path.
    #[serde(default = "default_true")]
    pub open_preview_in_split_pane: bool,

    /// Grammar scopes eligible for preview.
    #[serde(default = "default_grammars")]
    pub grammars: Vec<String>,

    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,

    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    #[serde(default)]
    pub command: CommandConfig,
}

/// External program that runs a staged sketch.
///
/// `{sketch}`, `{width}` and `{height}` inside an argument are replaced before
/// launch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandConfig {
    #[serde(default = "default_program")]
    pub program: String,
    #[serde(default = "default_args")]
    pub args: Vec<String>,
}

fn default_true() -> bool { true }
fn default_grammars() -> Vec<String> { vec![PROCESSING_GRAMMAR.to_string()] }
fn default_width() -> u32 { 800 }
fn default_height() -> u32 { 600 }
fn default_poll_interval_ms() -> u64 { 250 }
fn default_program() -> String { "processing-java".to_string() }
fn default_args() -> Vec<String> {
    vec!["--sketch={sketch}".to_string(), "--run".to_string()]
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            live_update: true,
            open_preview_in_split_pane: true,
            grammars: default_grammars(),
            width: default_width(),
            height: default_height(),
            poll_interval_ms: default_poll_interval_ms(),
            command: CommandConfig::default(),
        }
    }
}

impl Default for CommandConfig {
    fn default() -> Self {
        Self {
            program: default_program(),
            args: default_args(),
        }
    }
}

impl PreviewConfig {
    /// Load from `path`, or return defaults when the file does not exist.
    pub fn load_from(path: &Path) -> PreviewResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path).map_err(|e| PreviewError::io(path, e))?;
        let config: Self = serde_json::from_str(&contents)
            .map_err(|e| PreviewError::config(format!("{}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json(contents: &str) -> PreviewResult<Self> {
        let config: Self =
            serde_json::from_str(contents).map_err(|e| PreviewError::config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> PreviewResult<()> {
        self.dimensions()?;
        if self.command.program.trim().is_empty() {
            return Err(PreviewError::config("command.program must not be empty"));
        }
        Ok(())
    }

    /// Surface size configured for the preview.
    pub fn dimensions(&self) -> PreviewResult<Dimensions> {
        Dimensions::new(self.width, self.height).ok_or_else(|| {
            PreviewError::config(format!(
                "width and height must be positive, got {}x{}",
                self.width, self.height
            ))
        })
    }

    pub fn accepts_grammar(&self, scope: &str) -> bool {
        self.grammars.iter().any(|g| g == scope)
    }

    /// Grammar scope a file is previewed under, derived from its extension.
    pub fn grammar_for_path(path: &Path) -> Option<String> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "pde" => Some(PROCESSING_GRAMMAR.to_string()),
            other => Some(format!("source.{other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PreviewConfig::default();
        assert!(config.live_update);
        assert!(config.open_preview_in_split_pane);
        assert_eq!(config.grammars, vec!["source.processing"]);
        assert_eq!(config.dimensions().unwrap(), Dimensions::default());
        assert_eq!(config.command.program, "processing-java");
    }

    #[test]
    fn test_empty_object_is_default() {
        assert_eq!(PreviewConfig::from_json("{}").unwrap(), PreviewConfig::default());
    }

    #[test]
    fn test_camel_case_keys() {
        let config = PreviewConfig::from_json(
            r#"{"liveUpdate": false, "openPreviewInSplitPane": false, "grammars": ["source.pde", "source.java"], "pollIntervalMs": 50}"#,
        )
        .unwrap();
        assert!(!config.live_update);
        assert!(!config.open_preview_in_split_pane);
        assert!(config.accepts_grammar("source.java"));
        assert!(!config.accepts_grammar("source.processing"));
        assert_eq!(config.poll_interval_ms, 50);
    }

    #[test]
    fn test_partial_command() {
        let config = PreviewConfig::from_json(r#"{"command": {"program": "runner"}}"#).unwrap();
        assert_eq!(config.command.program, "runner");
        assert_eq!(config.command.args, vec!["--sketch={sketch}", "--run"]);
    }

    #[test]
    fn test_zero_width_rejected() {
        let result = PreviewConfig::from_json(r#"{"width": 0}"#);
        assert!(matches!(result, Err(PreviewError::Config(_))));
    }

    #[test]
    fn test_malformed_json_rejected() {
        assert!(PreviewConfig::from_json("{liveUpdate: yes}").is_err());
    }

    #[test]
    fn test_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = PreviewConfig::load_from(&dir.path().join("nope.json")).unwrap();
        assert_eq!(config, PreviewConfig::default());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("preview.json");
        fs::write(&path, r#"{"width": 1024, "height": 768}"#).unwrap();
        let config = PreviewConfig::load_from(&path).unwrap();
        assert_eq!(config.dimensions().unwrap(), Dimensions::new(1024, 768).unwrap());
    }

    #[test]
    fn test_grammar_for_path() {
        assert_eq!(
            PreviewConfig::grammar_for_path(Path::new("sketch/sketch.pde")).as_deref(),
            Some("source.processing")
        );
        assert_eq!(
            PreviewConfig::grammar_for_path(Path::new("Main.JAVA")).as_deref(),
            Some("source.java")
        );
        assert_eq!(PreviewConfig::grammar_for_path(Path::new("Makefile")), None);
    }
}
