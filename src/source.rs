//! Where sketch text comes from at render time.

use crate::error::{PreviewError, PreviewResult};
use crate::target::{PreviewState, PreviewTarget};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// An open editor buffer, owned by the host and mirrored here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorBuffer {
    pub id: String,
    pub title: String,
    pub path: Option<PathBuf>,
    text: String,
}

impl EditorBuffer {
    pub fn new(id: impl Into<String>, title: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            path: None,
            text: text.into(),
        }
    }

    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SketchSource {
    File(PathBuf),
    Buffer(EditorBuffer),
}

impl SketchSource {
    /// Current sketch text. `None` when there is nothing to render: the file
    /// is missing or the text is empty.
    pub fn read(&self) -> PreviewResult<Option<String>> {
        let text = match self {
            SketchSource::File(path) => match fs::read_to_string(path) {
                Ok(text) => text,
                Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
                Err(e) => return Err(PreviewError::io(path, e)),
            },
            SketchSource::Buffer(buffer) => buffer.text.clone(),
        };
        Ok((!text.is_empty()).then_some(text))
    }

    pub fn path(&self) -> Option<&Path> {
        match self {
            SketchSource::File(path) => Some(path),
            SketchSource::Buffer(buffer) => buffer.path.as_deref(),
        }
    }

    pub fn title(&self) -> String {
        let title = match self {
            SketchSource::File(path) => path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| "Processing".to_string()),
            SketchSource::Buffer(buffer) if !buffer.title.is_empty() => buffer.title.clone(),
            SketchSource::Buffer(_) => "Processing".to_string(),
        };
        format!("{title} Preview")
    }

    pub fn target(&self) -> PreviewTarget {
        match self {
            SketchSource::File(path) => PreviewTarget::File(path.clone()),
            SketchSource::Buffer(buffer) => PreviewTarget::Editor(buffer.id.clone()),
        }
    }

    pub fn state(&self) -> PreviewState {
        let editor_id = match self {
            SketchSource::File(_) => None,
            SketchSource::Buffer(buffer) => Some(buffer.id.clone()),
        };
        PreviewState::new(self.path().map(Path::to_path_buf), editor_id)
    }
}
