// Library exports for processing-preview

pub mod config;
pub mod error;
pub mod runtime;
pub mod session;
pub mod source;
pub mod target;
pub mod transcode;
pub mod watch;

pub use config::PreviewConfig;
pub use error::{PreviewError, PreviewResult};
pub use session::{PreviewEvent, PreviewSession, RenderOutcome};
pub use source::{EditorBuffer, SketchSource};
pub use target::{PreviewState, PreviewTarget};
pub use transcode::{transcode, transcode_full_screen, transcode_pixel_density, Dimensions};
