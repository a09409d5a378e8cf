// Mutable animation state: one `OverallState` per controller, one `Eye` per
// display. Both live for the life of the controller and are only touched
// from the render-frame call path.

use std::sync::Arc;

use crate::display::Display;
use crate::eyes::definition::EyeDefinition;

/// Octave count for the fractal pupil-noise generator.
pub const IRIS_LEVELS: usize = 7;

/// State shared by every eye on the controller: the gaze target, pupil size
/// and blink schedule are one set of values, not per-eye.
pub struct OverallState {
    /// Whether the eyes are currently in motion
    pub in_motion: bool,
    pub eye_old_x: f32,
    pub eye_old_y: f32,
    pub eye_new_x: f32,
    pub eye_new_y: f32,
    pub move_start_time_ms: u32,
    /// While moving, the duration of the move. Once a move completes this
    /// same field is reused as the hold duration until the next move begins;
    /// `move_start_time_ms` likewise becomes the hold start. Deliberate
    /// double duty, inherited timing behavior depends on it.
    pub move_duration_ms: u32,
    pub last_saccade_stop_ms: u32,
    pub saccade_interval_ms: u32,
    pub time_to_next_blink_ms: u32,
    pub time_of_last_blink_ms: u32,

    // Pupil sizing
    pub iris_frame: u16,
    /// 0 (smallest) to 1 (largest)
    pub pupil_amount: f32,
    pub resizing: bool,
    pub resize_start: f32,
    pub resize_target: f32,
    pub resize_start_time_ms: u32,
    pub resize_duration_ms: u32,
    pub iris_prev: [f32; IRIS_LEVELS],
    pub iris_next: [f32; IRIS_LEVELS],

    pub fixate: i32,
}

impl Default for OverallState {
    fn default() -> Self {
        Self {
            in_motion: false,
            eye_old_x: 0.0,
            eye_old_y: 0.0,
            eye_new_x: 0.0,
            eye_new_y: 0.0,
            move_start_time_ms: 0,
            move_duration_ms: 0,
            last_saccade_stop_ms: 0,
            saccade_interval_ms: 0,
            time_to_next_blink_ms: 0,
            time_of_last_blink_ms: 0,
            iris_frame: 0,
            pupil_amount: 0.5,
            resizing: false,
            resize_start: 0.0,
            resize_target: 0.0,
            resize_start_time_ms: 0,
            resize_duration_ms: 0,
            iris_prev: [0.0; IRIS_LEVELS],
            iris_next: [0.0; IRIS_LEVELS],
            fixate: 7,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlinkState {
    NotBlinking,
    BlinkClosing,
    BlinkOpening,
}

/// A simple state machine controls eye blinks/winks.
#[derive(Clone, Copy, Debug)]
pub struct EyeBlink {
    pub state: BlinkState,
    /// Duration of the current blink state
    pub duration_ms: u32,
    /// Time of the last state change
    pub start_time_ms: u32,
    /// The most recent amount of blink [0..1] that was applied.
    /// 0 = not blinking, 1 = fully closed.
    pub blink_factor: f32,
}

impl Default for EyeBlink {
    fn default() -> Self {
        Self {
            state: BlinkState::NotBlinking,
            duration_ms: 0,
            start_time_ms: 0,
            blink_factor: 0.0,
        }
    }
}

/// One-per-display structure holding the current state of an eye.
pub struct Eye {
    pub display: Box<dyn Display>,
    pub definition: Arc<EyeDefinition>,
    /// The direction this eye is looking, in map space; `map_radius` in both
    /// axes means straight ahead.
    pub x: f32,
    pub y: f32,
    pub current_iris_angle: u16,
    pub current_sclera_angle: u16,
    pub blink: EyeBlink,
    // The previous frame's eyelid 'tracking' factors, kept for dampening and
    // for computing the dirty span.
    pub upper_lid_factor: f32,
    pub lower_lid_factor: f32,
    /// Repaint every row on the next frame (set after a definition switch)
    pub draw_all: bool,
}
