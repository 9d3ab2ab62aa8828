// Compile and execute boundary for transcoded sketches
//
// The sketch engine itself is external. These traits are the seam the
// session drives; the process-backed implementations hand a staged sketch
// folder to a configured command such as `processing-java`.

use crate::config::CommandConfig;
use crate::error::{PreviewError, PreviewResult};
use crate::transcode::Dimensions;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};

/// Turns rewritten sketch source into something a runtime can launch.
pub trait SketchCompiler {
    type Output;

    fn compile(&self, source: &str) -> PreviewResult<Self::Output>;
}

/// A running sketch bound to a surface.
pub trait SketchHandle {
    /// Terminate the sketch. Exiting an already-finished sketch is not an
    /// error.
    fn exit(&mut self) -> PreviewResult<()>;

    /// Report a failure if the sketch has stopped on its own unsuccessfully.
    fn poll(&mut self) -> PreviewResult<()>;
}

/// Binds compiled sketches to a drawing surface.
pub trait SketchRuntime {
    type Program;
    type Handle: SketchHandle;

    /// Size of the surface the next sketch will draw into.
    fn dimensions(&self) -> Dimensions;

    fn launch(&mut self, program: Self::Program) -> PreviewResult<Self::Handle>;
}

/// A sketch folder on disk: `<dir>/<name>.pde` inside `<root>/<name>/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedSketch {
    pub dir: PathBuf,
    pub main_file: PathBuf,
}

/// Writes rewritten source into a sketch folder under a staging root.
#[derive(Debug, Clone)]
pub struct StagingCompiler {
    root: PathBuf,
    name: String,
}

impl StagingCompiler {
    pub fn new(root: impl Into<PathBuf>, name: &str) -> Self {
        Self {
            root: root.into(),
            name: sketch_name(name),
        }
    }

    /// Stage under the file stem of `sketch`, so error messages from the
    /// runner still name the user's sketch.
    pub fn for_sketch(root: impl Into<PathBuf>, sketch: &Path) -> Self {
        let stem = sketch
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self::new(root, &stem)
    }
}

impl SketchCompiler for StagingCompiler {
    type Output = StagedSketch;

    fn compile(&self, source: &str) -> PreviewResult<StagedSketch> {
        if source.trim().is_empty() {
            return Err(PreviewError::compile("sketch source is empty"));
        }

        let dir = self.root.join(&self.name);
        fs::create_dir_all(&dir).map_err(|e| PreviewError::io(&dir, e))?;

        let main_file = dir.join(format!("{}.pde", self.name));
        fs::write(&main_file, source).map_err(|e| PreviewError::io(&main_file, e))?;

        tracing::debug!(path = %main_file.display(), bytes = source.len(), "staged sketch");
        Ok(StagedSketch { dir, main_file })
    }
}

/// Sketch folder names must be identifiers: letters, digits and `_`, not
/// starting with a digit.
fn sketch_name(raw: &str) -> String {
    let mut name: String = raw
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    if name.is_empty() {
        name.push_str("sketch");
    } else if name.starts_with(|c: char| c.is_ascii_digit()) {
        name.insert(0, '_');
    }
    name
}

/// Launches staged sketches with an external command.
#[derive(Debug, Clone)]
pub struct CommandRuntime {
    command: CommandConfig,
    dimensions: Dimensions,
}

impl CommandRuntime {
    pub fn new(command: CommandConfig, dimensions: Dimensions) -> Self {
        Self {
            command,
            dimensions,
        }
    }

    fn expand_args(&self, sketch: &StagedSketch) -> Vec<String> {
        let dir = sketch.dir.display().to_string();
        self.command
            .args
            .iter()
            .map(|arg| {
                arg.replace("{sketch}", &dir)
                    .replace("{width}", &self.dimensions.width.to_string())
                    .replace("{height}", &self.dimensions.height.to_string())
            })
            .collect()
    }
}

impl SketchRuntime for CommandRuntime {
    type Program = StagedSketch;
    type Handle = ProcessHandle;

    fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    fn launch(&mut self, program: StagedSketch) -> PreviewResult<ProcessHandle> {
        let args = self.expand_args(&program);
        let mut command = Command::new(&self.command.program);
        command.args(&args).stdin(Stdio::null());
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            // Runners such as processing-java fork the sketch JVM; a group of
            // its own lets exit() stop them together.
            command.process_group(0);
        }
        let child = command
            .spawn()
            .map_err(|e| {
                PreviewError::runtime(format!("failed to start '{}': {e}", self.command.program))
            })?;

        tracing::info!(pid = child.id(), program = %self.command.program, "sketch launched");
        Ok(ProcessHandle {
            child,
            finished: false,
        })
    }
}

/// A sketch running in a child process.
#[derive(Debug)]
pub struct ProcessHandle {
    child: Child,
    finished: bool,
}

impl SketchHandle for ProcessHandle {
    fn exit(&mut self) -> PreviewResult<()> {
        if self.finished {
            return Ok(());
        }
        let pid = self.child.id();
        self.kill()
            .map_err(|e| PreviewError::runtime(format!("failed to stop sketch {pid}: {e}")))?;
        self.child
            .wait()
            .map_err(|e| PreviewError::runtime(format!("failed to reap sketch {pid}: {e}")))?;
        self.finished = true;
        tracing::debug!(pid, "sketch exited");
        Ok(())
    }

    fn poll(&mut self) -> PreviewResult<()> {
        if self.finished {
            return Ok(());
        }
        let status = self
            .child
            .try_wait()
            .map_err(|e| PreviewError::runtime(format!("failed to query sketch: {e}")))?;
        match status {
            Some(status) => {
                self.finished = true;
                if status.success() {
                    Ok(())
                } else {
                    Err(PreviewError::runtime(format!("sketch exited with {status}")))
                }
            }
            None => Ok(()),
        }
    }
}

impl ProcessHandle {
    /// Kill the child and everything in its process group. The child is not
    /// reaped yet, so its id still names the group.
    fn kill(&mut self) -> io::Result<()> {
        #[cfg(unix)]
        {
            if let Ok(pid) = libc::pid_t::try_from(self.child.id()) {
                // SAFETY: kill(2) only signals; a negative pid targets the group.
                if unsafe { libc::kill(-pid, libc::SIGKILL) } == 0 {
                    return Ok(());
                }
            }
        }
        match self.child.try_wait()? {
            Some(_) => Ok(()),
            None => self.child.kill(),
        }
    }
}

impl Drop for ProcessHandle {
    fn drop(&mut self) {
        if let Err(err) = self.exit() {
            tracing::warn!(error = %err, "sketch left running");
        }
    }
}
