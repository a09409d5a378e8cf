// The eye rendering and animation core.

pub mod catalog;
pub mod controller;
pub mod definition;
pub mod renderer;
pub mod state;
pub mod tables;

pub use catalog::{catalog, LookCycler};
pub use controller::{EyeController, DEFAULT_GAZE_DURATION_MS, DEFAULT_PUPIL_DURATION_MS};
pub use definition::EyeDefinition;
pub use state::{BlinkState, Eye, EyeBlink, OverallState};
