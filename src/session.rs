//! Preview session controller.
//!
//! A session owns at most one live sketch for its surface. Each render cycle
//! reads the source, transcodes it for the surface size, compiles it, then
//! terminates the previous sketch before launching the new one.

use crate::config::PreviewConfig;
use crate::error::PreviewResult;
use crate::runtime::{SketchCompiler, SketchHandle, SketchRuntime};
use crate::source::SketchSource;
use crate::target::{PreviewState, PreviewTarget};
use crate::transcode::transcode;
use tracing::{debug, info, warn};

/// Host notifications that may trigger a re-render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviewEvent {
    FileChanged,
    BufferSaved,
    BufferReloaded,
    BufferStoppedChanging,
    PathChanged,
}

impl PreviewEvent {
    /// Whether this event re-renders under the given live-update setting.
    ///
    /// With live update on, settled edits render and saves are redundant;
    /// with it off, only saves and reloads render. File changes always do.
    pub fn triggers_render(self, live_update: bool) -> bool {
        match self {
            PreviewEvent::FileChanged => true,
            PreviewEvent::BufferSaved | PreviewEvent::BufferReloaded => !live_update,
            PreviewEvent::BufferStoppedChanging => live_update,
            PreviewEvent::PathChanged => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderOutcome {
    /// A new sketch is live.
    Rendered,
    /// The source was missing or empty; the previous sketch, if any, is
    /// left running.
    NoSource,
}

pub struct PreviewSession<C, R>
where
    C: SketchCompiler,
    R: SketchRuntime<Program = C::Output>,
{
    source: SketchSource,
    config: PreviewConfig,
    compiler: C,
    runtime: R,
    live: Option<R::Handle>,
}

impl<C, R> PreviewSession<C, R>
where
    C: SketchCompiler,
    R: SketchRuntime<Program = C::Output>,
{
    pub fn new(source: SketchSource, config: PreviewConfig, compiler: C, runtime: R) -> Self {
        Self {
            source,
            config,
            compiler,
            runtime,
            live: None,
        }
    }

    pub fn source(&self) -> &SketchSource {
        &self.source
    }

    /// Mutable access for hosts that mirror buffer edits into the session.
    pub fn source_mut(&mut self) -> &mut SketchSource {
        &mut self.source
    }

    pub fn config(&self) -> &PreviewConfig {
        &self.config
    }

    pub fn runtime(&self) -> &R {
        &self.runtime
    }

    pub fn is_live(&self) -> bool {
        self.live.is_some()
    }

    pub fn title(&self) -> String {
        self.source.title()
    }

    pub fn target(&self) -> PreviewTarget {
        self.source.target()
    }

    pub fn state(&self) -> PreviewState {
        self.source.state()
    }

    /// Run one transcode, compile and rebind cycle.
    ///
    /// A compile failure is returned and the previous sketch keeps running.
    /// A launch failure is returned after the previous sketch has already
    /// been terminated, leaving nothing live.
    #[tracing::instrument(skip(self), fields(target = %self.source.target()))]
    pub fn render(&mut self) -> PreviewResult<RenderOutcome> {
        let Some(text) = self.source.read()? else {
            debug!("no sketch source, skipping render");
            return Ok(RenderOutcome::NoSource);
        };

        let dimensions = self.runtime.dimensions();
        let rewritten = transcode(&text, dimensions);
        let program = self.compiler.compile(&rewritten)?;

        self.exit_live()?;
        let handle = self.runtime.launch(program)?;
        self.live = Some(handle);

        info!(%dimensions, "sketch rendered");
        Ok(RenderOutcome::Rendered)
    }

    /// React to a host event. Returns `None` when the event does not render
    /// under the current live-update setting.
    pub fn handle(&mut self, event: PreviewEvent) -> PreviewResult<Option<RenderOutcome>> {
        if event == PreviewEvent::PathChanged {
            info!(title = %self.title(), "preview title changed");
            return Ok(None);
        }
        if !event.triggers_render(self.config.live_update) {
            debug!(?event, live_update = self.config.live_update, "render not triggered");
            return Ok(None);
        }
        self.render().map(Some)
    }

    /// Surface a failure of the live sketch. A sketch that has failed is no
    /// longer considered live.
    pub fn check(&mut self) -> PreviewResult<()> {
        let Some(handle) = self.live.as_mut() else {
            return Ok(());
        };
        if let Err(err) = handle.poll() {
            self.live = None;
            return Err(err);
        }
        Ok(())
    }

    /// Terminate the live sketch, if any.
    pub fn close(&mut self) -> PreviewResult<()> {
        self.exit_live()
    }

    /// A sketch that refuses to exit stays bound, so a later close can
    /// retry it.
    fn exit_live(&mut self) -> PreviewResult<()> {
        if let Some(handle) = self.live.as_mut() {
            handle.exit()?;
        }
        self.live = None;
        Ok(())
    }
}

impl<C, R> Drop for PreviewSession<C, R>
where
    C: SketchCompiler,
    R: SketchRuntime<Program = C::Output>,
{
    fn drop(&mut self) {
        if let Err(err) = self.close() {
            warn!(error = %err, "failed to stop sketch on close");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PreviewError;
    use crate::source::EditorBuffer;
    use crate::transcode::Dimensions;
    use std::cell::RefCell;
    use std::rc::Rc;

    type Log = Rc<RefCell<Vec<String>>>;

    struct EchoCompiler {
        log: Log,
    }

    impl SketchCompiler for EchoCompiler {
        type Output = String;

        fn compile(&self, source: &str) -> PreviewResult<String> {
            if source.contains("syntax error") {
                return Err(PreviewError::compile("unexpected token"));
            }
            self.log.borrow_mut().push(format!("compile {source}"));
            Ok(source.to_string())
        }
    }

    struct RecordingRuntime {
        log: Log,
        launched: usize,
    }

    struct RecordingHandle {
        log: Log,
        id: usize,
        crashed: bool,
        stubborn: bool,
    }

    impl SketchHandle for RecordingHandle {
        fn exit(&mut self) -> PreviewResult<()> {
            if self.stubborn {
                return Err(PreviewError::runtime("sketch ignored kill"));
            }
            self.log.borrow_mut().push(format!("exit {}", self.id));
            Ok(())
        }

        fn poll(&mut self) -> PreviewResult<()> {
            if self.crashed {
                Err(PreviewError::runtime("boom"))
            } else {
                Ok(())
            }
        }
    }

    impl SketchRuntime for RecordingRuntime {
        type Program = String;
        type Handle = RecordingHandle;

        fn dimensions(&self) -> Dimensions {
            Dimensions::new(640, 480).unwrap()
        }

        fn launch(&mut self, program: String) -> PreviewResult<RecordingHandle> {
            self.launched += 1;
            self.log.borrow_mut().push(format!("launch {}", self.launched));
            Ok(RecordingHandle {
                log: self.log.clone(),
                id: self.launched,
                crashed: program.contains("crash"),
                stubborn: program.contains("stubborn"),
            })
        }
    }

    fn new_session(
        text: &str,
        live_update: bool,
    ) -> (PreviewSession<EchoCompiler, RecordingRuntime>, Log) {
        let log: Log = Rc::default();
        let config = PreviewConfig {
            live_update,
            ..PreviewConfig::default()
        };
        let session = PreviewSession::new(
            SketchSource::Buffer(EditorBuffer::new("1", "orbit.pde", text)),
            config,
            EchoCompiler { log: log.clone() },
            RecordingRuntime {
                log: log.clone(),
                launched: 0,
            },
        );
        (session, log)
    }

    #[test]
    fn test_render_transcodes_with_surface_size() {
        let (mut session, log) = new_session("fullScreen(SPAN);pixelDensity(2);", true);
        assert_eq!(session.render().unwrap(), RenderOutcome::Rendered);
        assert!(session.is_live());
        assert_eq!(
            *log.borrow(),
            vec!["compile size(640, 480);;".to_string(), "launch 1".to_string()]
        );
    }

    #[test]
    fn test_rerender_exits_previous_before_launch() {
        let (mut session, log) = new_session("fullScreen();", true);
        session.render().unwrap();
        session.render().unwrap();
        let log = log.borrow();
        assert_eq!(&log[2..], ["compile size(640, 480);", "exit 1", "launch 2"]);
    }

    #[test]
    fn test_compile_failure_keeps_previous_sketch() {
        let (mut session, log) = new_session("fullScreen();", true);
        session.render().unwrap();
        if let SketchSource::Buffer(buffer) = session.source_mut() {
            buffer.set_text("syntax error");
        }
        let result = session.render();
        assert!(matches!(result, Err(PreviewError::Compile(_))));
        assert!(session.is_live());
        assert!(!log.borrow().iter().any(|entry| entry == "exit 1"));
    }

    #[test]
    fn test_empty_source_does_not_render() {
        let (mut session, log) = new_session("", true);
        assert_eq!(session.render().unwrap(), RenderOutcome::NoSource);
        assert!(!session.is_live());
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_live_update_gate() {
        let (mut session, _) = new_session("fullScreen();", true);
        assert_eq!(session.handle(PreviewEvent::BufferSaved).unwrap(), None);
        assert_eq!(session.handle(PreviewEvent::BufferReloaded).unwrap(), None);
        assert_eq!(
            session.handle(PreviewEvent::BufferStoppedChanging).unwrap(),
            Some(RenderOutcome::Rendered)
        );

        let (mut session, _) = new_session("fullScreen();", false);
        assert_eq!(session.handle(PreviewEvent::BufferStoppedChanging).unwrap(), None);
        assert_eq!(
            session.handle(PreviewEvent::BufferSaved).unwrap(),
            Some(RenderOutcome::Rendered)
        );
        assert_eq!(
            session.handle(PreviewEvent::BufferReloaded).unwrap(),
            Some(RenderOutcome::Rendered)
        );
    }

    #[test]
    fn test_file_change_always_renders() {
        for live_update in [true, false] {
            assert!(PreviewEvent::FileChanged.triggers_render(live_update));
            assert!(!PreviewEvent::PathChanged.triggers_render(live_update));
        }
    }

    #[test]
    fn test_path_change_does_not_render() {
        let (mut session, log) = new_session("fullScreen();", true);
        assert_eq!(session.handle(PreviewEvent::PathChanged).unwrap(), None);
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_check_surfaces_runtime_failure() {
        let (mut session, _) = new_session("crash();", true);
        session.render().unwrap();
        assert!(matches!(session.check(), Err(PreviewError::Runtime(_))));
        assert!(!session.is_live());
        assert!(session.check().is_ok());
    }

    #[test]
    fn test_close_and_drop_exit_live_sketch() {
        let (mut session, log) = new_session("fullScreen();", true);
        session.render().unwrap();
        session.close().unwrap();
        assert!(!session.is_live());
        assert_eq!(log.borrow().last().map(String::as_str), Some("exit 1"));

        let (mut session, log) = new_session("fullScreen();", true);
        session.render().unwrap();
        drop(session);
        assert_eq!(log.borrow().last().map(String::as_str), Some("exit 1"));
    }

    #[test]
    fn test_failed_exit_keeps_sketch_bound() {
        let (mut session, log) = new_session("stubborn();", true);
        session.render().unwrap();

        let result = session.render();
        assert!(matches!(result, Err(PreviewError::Runtime(_))));
        assert!(session.is_live());
        assert!(!log.borrow().iter().any(|entry| entry == "launch 2"));

        assert!(session.close().is_err());
        assert!(session.is_live());
    }

    #[test]
    fn test_title_and_state() {
        let (session, _) = new_session("", true);
        assert_eq!(session.title(), "orbit.pde Preview");
        assert_eq!(session.target(), PreviewTarget::Editor("1".to_string()));
        assert_eq!(session.state().editor_id.as_deref(), Some("1"));
    }
}
