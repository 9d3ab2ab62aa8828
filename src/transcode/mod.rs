// Sketch source transcoder
//
// Rewrites the environment-declaration calls a windowed preview cannot run
// as-is into portable equivalents. Everything here is pure text in, text out.

pub mod args;
pub mod fullscreen;
pub mod lexer;
pub mod pixel_density;
pub mod scan;

pub use args::{classify, renderer_argument, ArgumentKind, FULL_SPAN_TOKEN};
pub use fullscreen::transcode_full_screen;
pub use pixel_density::transcode_pixel_density;
pub use scan::{find_calls, rewrite_calls, split_arguments, CallMatch};

use std::fmt;

/// Size of the surface a sketch is rendered into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    /// Both sides must be positive.
    pub fn new(width: u32, height: u32) -> Option<Self> {
        (width > 0 && height > 0).then_some(Self { width, height })
    }
}

impl Default for Dimensions {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
        }
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Full rewrite applied once per render cycle: pixel-density stripping, then
/// fullscreen sizing.
pub fn transcode(source: &str, dimensions: Dimensions) -> String {
    let stripped = transcode_pixel_density(source);
    transcode_full_screen(&stripped, dimensions)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SKETCH: &str = "void setup() {\n  fullScreen(P2D);\n  pixelDensity(displayDensity());\n}\n\nvoid draw() {\n  ellipse(mouseX, mouseY, 20, 20);\n}\n";

    #[test]
    fn test_dimensions_reject_zero() {
        assert!(Dimensions::new(0, 600).is_none());
        assert!(Dimensions::new(800, 0).is_none());
        assert_eq!(Dimensions::new(1, 1), Some(Dimensions { width: 1, height: 1 }));
    }

    #[test]
    fn test_dimensions_display() {
        assert_eq!(Dimensions::default().to_string(), "800x600");
    }

    #[test]
    fn test_full_pipeline() {
        let out = transcode(SKETCH, Dimensions::new(1280, 720).unwrap());
        assert_eq!(
            out,
            "void setup() {\n  size(1280, 720, P2D);\n  ;\n}\n\nvoid draw() {\n  ellipse(mouseX, mouseY, 20, 20);\n}\n"
        );
    }

    #[test]
    fn test_steps_commute() {
        let dims = Dimensions::default();
        let forward = transcode_full_screen(&transcode_pixel_density(SKETCH), dims);
        let reverse = transcode_pixel_density(&transcode_full_screen(SKETCH, dims));
        assert_eq!(forward, reverse);
    }

    #[test]
    fn test_deterministic() {
        let dims = Dimensions::default();
        assert_eq!(transcode(SKETCH, dims), transcode(SKETCH, dims));
    }

    #[test]
    fn test_identity_without_recognized_calls() {
        let src = "void setup() { size(100, 100); }";
        assert_eq!(transcode(src, Dimensions::default()), src);
    }
}
