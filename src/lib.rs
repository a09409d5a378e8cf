// Procedurally rendered animatronic eyes for chained RGB LED matrix panels.
//
// The `eyes` module tree holds the rendering/animation core; `display`,
// `clock`, `gamepad` and `sensors` are the hardware-facing edges.

pub mod clock;
pub mod color;
pub mod display;
pub mod eyes;
pub mod gamepad;
pub mod sensors;

// Per-eye panel dimensions
pub const SCREEN_WIDTH: u32 = 64;
pub const SCREEN_HEIGHT: u32 = 64;

pub use clock::{Clock, ManualClock, SystemClock};
pub use display::{Display, DisplayError, FrameDisplay, MatrixDisplay};
pub use eyes::catalog::{catalog, LookCycler};
pub use eyes::controller::EyeController;
pub use eyes::definition::EyeDefinition;
