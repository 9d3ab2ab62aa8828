//! Preview targets, their `processing-preview://` URIs and persisted view state.

use crate::error::{PreviewError, PreviewResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use url::Url;

pub const URI_SCHEME: &str = "processing-preview";
const EDITOR_HOST: &str = "editor";
const STATE_DESERIALIZER: &str = "ProcessingPreviewView";

/// What a preview renders: a file on disk or an open editor buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreviewTarget {
    File(PathBuf),
    Editor(String),
}

impl PreviewTarget {
    /// Parse a `processing-preview://` URI, or treat anything else as a
    /// filesystem path.
    pub fn parse(input: &str) -> PreviewResult<Self> {
        if !input.starts_with(&format!("{URI_SCHEME}:")) {
            return Ok(PreviewTarget::File(PathBuf::from(input)));
        }

        let url = Url::parse(input)
            .map_err(|e| PreviewError::validation(format!("invalid preview URI '{input}': {e}")))?;
        let path = urlencoding::decode(url.path())
            .map_err(|e| PreviewError::validation(format!("invalid preview URI '{input}': {e}")))?;

        match url.host_str() {
            Some(EDITOR_HOST) => {
                let id = path.trim_start_matches('/');
                if id.is_empty() {
                    return Err(PreviewError::validation(format!(
                        "preview URI '{input}' names no editor"
                    )));
                }
                Ok(PreviewTarget::Editor(id.to_string()))
            }
            None | Some("") if !path.is_empty() => {
                Ok(PreviewTarget::File(PathBuf::from(path.into_owned())))
            }
            _ => Err(PreviewError::validation(format!(
                "preview URI '{input}' must name an editor or an absolute path"
            ))),
        }
    }

    /// Format the inverse of [`PreviewTarget::parse`]. Path segments are
    /// percent-encoded so `#`, `?` and `%` survive the round trip.
    pub fn uri(&self) -> String {
        match self {
            PreviewTarget::File(path) => {
                let path = path.to_string_lossy();
                let segments: Vec<_> = path.split('/').map(urlencoding::encode).collect();
                format!("{URI_SCHEME}://{}", segments.join("/"))
            }
            PreviewTarget::Editor(id) => {
                format!("{URI_SCHEME}://{EDITOR_HOST}/{}", urlencoding::encode(id))
            }
        }
    }
}

impl fmt::Display for PreviewTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.uri())
    }
}

/// View state a host persists across restarts to reopen a preview.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewState {
    pub deserializer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub editor_id: Option<String>,
}

impl PreviewState {
    pub fn new(file_path: Option<PathBuf>, editor_id: Option<String>) -> Self {
        Self {
            deserializer: STATE_DESERIALIZER.to_string(),
            file_path,
            editor_id,
        }
    }

    /// The target to reopen. An editor id wins over a path, since buffer
    /// previews also record the buffer's file.
    pub fn target(&self) -> PreviewResult<PreviewTarget> {
        if self.deserializer != STATE_DESERIALIZER {
            return Err(PreviewError::validation(format!(
                "unknown view state deserializer '{}'",
                self.deserializer
            )));
        }
        match (&self.editor_id, &self.file_path) {
            (Some(id), _) => Ok(PreviewTarget::Editor(id.clone())),
            (None, Some(path)) => Ok(PreviewTarget::File(path.clone())),
            (None, None) => Err(PreviewError::validation(
                "view state names neither a file nor an editor",
            )),
        }
    }
}
