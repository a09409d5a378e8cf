// Orchestrates one or more eyes sharing a single gaze/blink/pupil policy.
// One `render_frame` call advances and redraws exactly one eye, round-robin.

use std::f32::consts::FRAC_PI_2;
use std::sync::Arc;

use rand::Rng;
use tracing::warn;

use crate::clock::Clock;
use crate::display::Display;
use crate::eyes::definition::EyeDefinition;
use crate::eyes::renderer;
use crate::eyes::state::{BlinkState, Eye, EyeBlink, OverallState, IRIS_LEVELS};
use crate::SCREEN_WIDTH;

/// Default easing time for externally driven gaze moves.
pub const DEFAULT_GAZE_DURATION_MS: u32 = 120;
/// Default easing time for externally driven pupil resizes.
pub const DEFAULT_PUPIL_DURATION_MS: u32 = 100;

/// Project a map-space gaze value onto the screen.
fn map_to_screen(value: f32, map_radius: f32, eye_radius: f32) -> f32 {
    (value / map_radius).sin() * FRAC_PI_2 * eye_radius
}

/// If the coordinate doesn't fit in the unit circle, scale it onto the rim.
fn constrain_eye_coord(x: f32, y: f32) -> (f32, f32) {
    let d2 = x * x + y * y;
    if d2 > 1.0 {
        let d = d2.sqrt();
        (x / d, y / d)
    } else {
        (x, y)
    }
}

/// A uniform draw in (-r, r), tolerating a degenerate radius.
fn random_spread<R: Rng>(rng: &mut R, r: f32) -> f32 {
    if r > 0.0 {
        rng.random_range(-r..r)
    } else {
        0.0
    }
}

/// Manages the overall behaviour (movement, blinking, pupil size) of one or
/// more eyes.
pub struct EyeController<C: Clock, R: Rng> {
    eyes: Vec<Eye>,
    eye_index: usize,
    state: OverallState,
    /// Whether the eyes are moving autonomously
    auto_move: bool,
    /// Whether the eyes are blinking autonomously
    auto_blink: bool,
    /// Whether the pupils are resizing autonomously
    auto_pupils: bool,
    /// When auto_move is enabled, the maximum amount of time the eyes gaze
    /// at a particular place before moving again.
    max_gaze_ms: u32,
    /// The amount of fixation to apply
    nufix: i32,
    clock: C,
    rng: R,
}

impl<C: Clock, R: Rng> EyeController<C, R> {
    pub fn new(
        rig: Vec<(Box<dyn Display>, Arc<EyeDefinition>)>,
        auto_move: bool,
        auto_blink: bool,
        auto_pupils: bool,
        clock: C,
        rng: R,
    ) -> Self {
        debug_assert!(!rig.is_empty());
        let mut state = OverallState::default();
        let eyes: Vec<Eye> = rig
            .into_iter()
            .map(|(display, definition)| {
                definition.debug_validate();
                // Start looking straight ahead
                let middle = definition.polar.map_radius as f32;
                state.eye_old_x = middle;
                state.eye_old_y = middle;
                state.eye_new_x = middle;
                state.eye_new_y = middle;
                Eye {
                    display,
                    x: middle,
                    y: middle,
                    current_iris_angle: definition.iris.start_angle,
                    current_sclera_angle: definition.sclera.start_angle,
                    definition,
                    blink: EyeBlink::default(),
                    upper_lid_factor: 0.0,
                    lower_lid_factor: 0.0,
                    draw_all: true,
                }
            })
            .collect();
        Self {
            eyes,
            eye_index: 0,
            state,
            auto_move,
            auto_blink,
            auto_pupils,
            max_gaze_ms: 3000,
            nufix: 7,
            clock,
            rng,
        }
    }

    pub fn num_eyes(&self) -> usize {
        self.eyes.len()
    }

    /// Enables or disables the automatic random eye movement.
    pub fn set_auto_move(&mut self, enabled: bool) {
        self.auto_move = enabled;
    }

    pub fn auto_move_enabled(&self) -> bool {
        self.auto_move
    }

    /// Enables or disables automatic random eye blinking.
    pub fn set_auto_blink(&mut self, enabled: bool) {
        self.auto_blink = enabled;
    }

    pub fn auto_blink_enabled(&self) -> bool {
        self.auto_blink
    }

    /// Enables or disables automatic random pupil resizing.
    pub fn set_auto_pupils(&mut self, enabled: bool) {
        self.auto_pupils = enabled;
    }

    pub fn auto_pupils_enabled(&self) -> bool {
        self.auto_pupils
    }

    /// Sets the maximum amount of time the eyes will remain still when
    /// auto_move is enabled.
    pub fn set_max_gaze_ms(&mut self, max_gaze_ms: u32) {
        self.max_gaze_ms = max_gaze_ms;
    }

    /// Starts the blink process on every eye not already blinking, and
    /// cancels the autonomous next-blink timer.
    pub fn blink(&mut self) {
        let duration = self.rng.random_range(50..100);
        self.start_blink(duration);
        self.state.time_to_next_blink_ms = 0;
    }

    /// Starts winking the eye at the given index. If the index is out of
    /// range, or the eye is already winking or blinking, nothing happens.
    pub fn wink(&mut self, index: usize) {
        if index < self.eyes.len() {
            let duration = self.rng.random_range(50..100);
            let now = self.clock.now_ms();
            Self::start_wink(&mut self.eyes[index], now, duration);
        }
    }

    /// Sets the target gaze position. The eye(s) ease to it over
    /// `duration_ms`. The coordinate should fall inside the unit circle; if
    /// it falls outside, the closest point on the circle's rim is used.
    /// X runs -1.0 (hard left) to 1.0 (hard right), Y runs -1.0 (fully up)
    /// to 1.0 (fully down).
    pub fn set_target_position(&mut self, x: f32, y: f32, duration_ms: u32) {
        let (x, y) = constrain_eye_coord(x, y);
        let middle = self.eyes[self.eye_index].definition.polar.map_radius as f32;
        let r = (middle * 2.0 - SCREEN_WIDTH as f32 * FRAC_PI_2) * 0.75;
        self.state.eye_new_x = middle - x * r;
        self.state.eye_new_y = middle - y * r;
        self.state.in_motion = true;
        self.state.move_duration_ms = duration_ms;
        self.state.move_start_time_ms = self.clock.now_ms();
    }

    /// Instantly moves the eye(s) to a position, with the same coordinate
    /// conventions and unit-circle clamping as [`Self::set_target_position`].
    pub fn set_position(&mut self, x: f32, y: f32) {
        let (x, y) = constrain_eye_coord(x, y);
        let middle = self.eyes[self.eye_index].definition.polar.map_radius as f32;
        let r = (middle * 2.0 - SCREEN_WIDTH as f32 * FRAC_PI_2) * 0.75;
        self.state.eye_old_x = middle - x * r;
        self.state.eye_old_y = middle - y * r;
    }

    /// Sets the target pupil size; the pupils ease to it over `duration_ms`.
    /// The ratio is clamped to [0, 1] (0 = smallest permissible size).
    pub fn set_target_pupil(&mut self, ratio: f32, duration_ms: u32) {
        self.state.resizing = true;
        self.state.resize_start = self.state.pupil_amount;
        self.state.resize_target = ratio.clamp(0.0, 1.0);
        self.state.resize_duration_ms = duration_ms;
        self.state.resize_start_time_ms = self.clock.now_ms();
    }

    /// Instantly resizes the pupils. In real eyes both pupils react even if
    /// only one eye is stimulated, hence no per-eye variant. The ratio is
    /// clamped to [0, 1].
    pub fn set_pupil(&mut self, ratio: f32) {
        self.state.pupil_amount = ratio.clamp(0.0, 1.0);
    }

    /// Swaps the definition of every eye. `definitions` must hold exactly
    /// one entry per eye. Each eye fully repaints on its next turn.
    pub fn update_definitions(&mut self, definitions: &[Arc<EyeDefinition>]) {
        debug_assert_eq!(definitions.len(), self.eyes.len());
        for (eye, definition) in self.eyes.iter_mut().zip(definitions) {
            Self::update_definition(eye, Arc::clone(definition));
        }
    }

    /// Renders a single frame of animation, advancing one eye. Returns false
    /// without touching any state if that eye's display is still busy with a
    /// previous asynchronous update.
    pub fn render_frame(&mut self) -> bool {
        if !self.eyes[self.eye_index].display.is_available() {
            return false;
        }

        // Apply any automated eye/eyelid/pupil movements
        self.apply_auto_move();
        self.apply_auto_blink();
        self.apply_auto_pupils();

        // Apply any time-based changes
        let blink_factor = self.update_blink_state();
        self.apply_fixation();
        self.apply_spin();

        let (upper_q, lower_q) = self.compute_eyelids(&self.eyes[self.eye_index]);

        // Eye 0's display is mirrored on the X axis; temporarily flip its
        // gaze X so both eyes travel the same direction.
        let map_diameter = self.eyes[self.eye_index].definition.polar.map_radius as f32 * 2.0;
        if self.eye_index == 0 {
            self.eyes[0].x = map_diameter - self.eyes[0].x;
        }
        let pupil_amount = self.state.pupil_amount;
        renderer::render_eye(
            &mut self.eyes[self.eye_index],
            pupil_amount,
            upper_q,
            lower_q,
            blink_factor,
        );
        if self.eye_index == 0 {
            self.eyes[0].x = map_diameter - self.eyes[0].x;
        }

        if let Err(err) = self.eyes[self.eye_index].display.update() {
            warn!(eye = self.eye_index, %err, "frame commit failed");
        }

        // Advance to the next eye for the next frame
        self.eye_index = (self.eye_index + 1) % self.eyes.len();

        true
    }

    fn update_definition(eye: &mut Eye, definition: Arc<EyeDefinition>) {
        definition.debug_validate();
        eye.current_iris_angle = definition.iris.start_angle;
        eye.current_sclera_angle = definition.sclera.start_angle;
        eye.definition = definition;
        // Repaint the entire eye (including eyelids) on the first frame, to
        // clean up after the previous look
        eye.draw_all = true;
    }

    fn start_wink(eye: &mut Eye, now_ms: u32, duration_ms: u32) {
        if eye.blink.state == BlinkState::NotBlinking {
            eye.blink.state = BlinkState::BlinkClosing;
            eye.blink.start_time_ms = now_ms;
            eye.blink.duration_ms = duration_ms;
        }
    }

    /// Closes all eyes that are not already mid-blink.
    fn start_blink(&mut self, duration_ms: u32) {
        let now = self.clock.now_ms();
        for eye in &mut self.eyes {
            Self::start_wink(eye, now, duration_ms);
        }
    }

    /// When auto_move is enabled, periodically starts motion to a new random
    /// point at a random speed, then holds there for a random period.
    /// Externally driven moves reuse the same fields with in_motion forced,
    /// so the interpolation below serves both.
    fn apply_auto_move(&mut self) {
        if !self.auto_move && !self.state.in_motion {
            let eye = &mut self.eyes[self.eye_index];
            eye.x = self.state.eye_old_x;
            eye.y = self.state.eye_old_y;
            return;
        }

        let t = self.clock.now_ms();
        let dt = t.wrapping_sub(self.state.move_start_time_ms);

        if self.state.in_motion {
            if dt >= self.state.move_duration_ms {
                // Time's up, the destination is reached
                self.state.in_motion = false;
                // The "move" duration now becomes a hold duration, normally
                // 35ms to 1 sec but never beyond the gaze limit
                let limit = self.max_gaze_ms.min(1000).max(36);
                self.state.move_duration_ms = self.rng.random_range(35..limit);
                if self.state.saccade_interval_ms == 0 {
                    // Cleared when a "big" saccade finishes
                    self.state.last_saccade_stop_ms = t;
                    let upper = self.max_gaze_ms.max(self.state.move_duration_ms + 1);
                    self.state.saccade_interval_ms =
                        self.rng.random_range(self.state.move_duration_ms..upper);
                }
                // Similarly, the "move" start time becomes the hold start
                self.state.move_start_time_ms = t;
                self.state.eye_old_x = self.state.eye_new_x;
                self.state.eye_old_y = self.state.eye_new_y;
                let eye = &mut self.eyes[self.eye_index];
                eye.x = self.state.eye_old_x;
                eye.y = self.state.eye_old_y;
            } else {
                // Mid-move: interpolate with a smoothstep ease
                let e = dt as f32 / self.state.move_duration_ms as f32;
                let e = e * e * (3.0 - 2.0 * e);
                let eye = &mut self.eyes[self.eye_index];
                eye.x = self.state.eye_old_x + (self.state.eye_new_x - self.state.eye_old_x) * e;
                eye.y = self.state.eye_old_y + (self.state.eye_new_y - self.state.eye_old_y) * e;
            }
        } else {
            // Eye is currently stopped
            let eye = &mut self.eyes[self.eye_index];
            eye.x = self.state.eye_old_x;
            eye.y = self.state.eye_old_y;
            let (eye_x, eye_y) = (eye.x, eye.y);
            let map_radius = eye.definition.polar.map_radius as f32;
            if dt > self.state.move_duration_ms {
                // Time to begin a new move
                if t.wrapping_sub(self.state.last_saccade_stop_ms) > self.state.saccade_interval_ms
                {
                    // A 'big' saccade. r is the radius in X and Y the eye can
                    // travel from (0,0) in the center.
                    let r = (map_radius * 2.0 - SCREEN_WIDTH as f32 * FRAC_PI_2) * 0.75;
                    self.state.eye_new_x = random_spread(&mut self.rng, r);
                    let move_dist =
                        (r * r - self.state.eye_new_x * self.state.eye_new_x).sqrt();
                    self.state.eye_new_y = random_spread(&mut self.rng, move_dist);
                    self.state.move_duration_ms = self.rng.random_range(83..166);
                    self.state.saccade_interval_ms = 0; // Recompute when this one stops
                } else {
                    // Microsaccade: a small jitter around the current
                    // position. No clipping; a small stray gets pulled back
                    // in bounds by the next full saccade.
                    let r = (map_radius * 2.0 - SCREEN_WIDTH as f32 * FRAC_PI_2) * 0.07;
                    let dx = random_spread(&mut self.rng, r);
                    self.state.eye_new_x = eye_x - map_radius + dx;
                    let h = (r * r - dx * dx).sqrt();
                    self.state.eye_new_y = eye_y - map_radius + random_spread(&mut self.rng, h);
                    self.state.move_duration_ms = self.rng.random_range(7..25);
                }
                // Translate the new point into map space
                self.state.eye_new_x += map_radius;
                self.state.eye_new_y += map_radius;
                self.state.move_start_time_ms = t;
                self.state.in_motion = true; // Start the move on the next frame
            }
        }
    }

    /// When auto_blink is enabled, periodically starts the eyes blinking.
    fn apply_auto_blink(&mut self) {
        if !self.auto_blink {
            return;
        }
        let t = self.clock.now_ms();
        if t.wrapping_sub(self.state.time_of_last_blink_ms) >= self.state.time_to_next_blink_ms {
            self.state.time_of_last_blink_ms = t;
            // Autonomous blinks close a little more slowly than forced ones
            let duration = self.rng.random_range(75..150);
            self.start_blink(duration);
            self.state.time_to_next_blink_ms = duration * 3 + self.rng.random_range(0..4000);
        }
    }

    /// When auto_pupils is disabled, eases any resize triggered by
    /// [`Self::set_target_pupil`]. When enabled, drives the pupil size from
    /// 7 octaves of fractal subdivision noise for smooth, non-repeating
    /// motion with a handful of integer ops per frame.
    fn apply_auto_pupils(&mut self) {
        if !self.auto_pupils && !self.state.resizing {
            return;
        }

        if self.state.resizing {
            let t = self.clock.now_ms();
            let dt = t.wrapping_sub(self.state.resize_start_time_ms);
            if dt < self.state.resize_duration_ms {
                let fraction = dt as f32 / self.state.resize_duration_ms as f32;
                self.state.pupil_amount = self.state.resize_start
                    + fraction * (self.state.resize_target - self.state.resize_start);
            } else {
                self.state.resizing = false;
                self.state.pupil_amount = self.state.resize_target;
            }
            return;
        }

        let mut sum = 0.5f32;
        for i in 0..IRIS_LEVELS {
            let iexp = 1u32 << (i + 1); // 2,4,8,16,...
            let imask = iexp - 1; // 1,3,7,15,...
            let ibits = self.state.iris_frame as u32 & imask;
            let n = if ibits != 0 {
                let weight = ibits as f32 / iexp as f32; // 0.0 to <1.0
                self.state.iris_prev[i] * (1.0 - weight) + self.state.iris_next[i] * weight
            } else {
                // This octave rolls over: promote its sample and draw a new one
                let n = self.state.iris_next[i];
                self.state.iris_prev[i] = self.state.iris_next[i];
                self.state.iris_next[i] =
                    -0.5 + self.rng.random_range(0..1000u32) as f32 / 999.0;
                n
            };
            let weight_exp = 1u32 << (IRIS_LEVELS - i); // ...,8,4,2
            sum += n / weight_exp as f32;
        }
        self.set_pupil(sum);

        self.state.iris_frame += 1;
        if self.state.iris_frame >= 1 << IRIS_LEVELS {
            self.state.iris_frame = 0;
        }
    }

    /// Advances the current eye's blink machine and returns the blink amount
    /// for this frame: 0 = not blinking, 1 = fully closed.
    fn update_blink_state(&mut self) -> f32 {
        let t = self.clock.now_ms();
        let blink = &mut self.eyes[self.eye_index].blink;
        let mut blink_factor = 0.0;
        if blink.state != BlinkState::NotBlinking {
            if t.wrapping_sub(blink.start_time_ms) >= blink.duration_ms {
                // Advance to the next blink state
                match blink.state {
                    BlinkState::BlinkClosing => {
                        blink.state = BlinkState::BlinkOpening;
                        // Open the eyelids at half the speed they closed at
                        blink.duration_ms *= 2;
                        blink.start_time_ms = t;
                        blink_factor = 1.0;
                    }
                    BlinkState::BlinkOpening => {
                        blink.state = BlinkState::NotBlinking;
                    }
                    BlinkState::NotBlinking => {}
                }
            } else {
                blink_factor =
                    t.wrapping_sub(blink.start_time_ms) as f32 / blink.duration_ms as f32;
                if blink.state == BlinkState::BlinkOpening {
                    blink_factor = 1.0 - blink_factor;
                }
            }
        }
        blink_factor
    }

    /// How open each eyelid wants to be this frame, before blink and
    /// dampening are applied.
    fn compute_eyelids(&self, eye: &Eye) -> (f32, f32) {
        let def = &eye.definition;
        if !def.tracking {
            // Eyelids fully open unless a blink moves them
            return (1.0, 1.0);
        }

        // Eyelids naturally "track" the pupils: find the pupil position on
        // screen and open the lids around it.
        let map_radius = def.polar.map_radius as f32;
        let eye_radius = def.radius as f32;
        let mut ix =
            map_to_screen(map_radius - eye.x, map_radius, eye_radius) as i32 + SCREEN_WIDTH as i32 / 2;
        let mut iy =
            map_to_screen(map_radius - eye.y, map_radius, eye_radius) as i32 + SCREEN_WIDTH as i32 / 2;
        iy -= (def.iris.radius as f32 * def.squint) as i32;
        if self.eye_index & 1 == 1 {
            // Flip for the right eye
            ix = SCREEN_WIDTH as i32 - 1 - ix;
        }
        let ix = ix.clamp(0, SCREEN_WIDTH as i32 - 1) as u32;

        let upper_open = def.eyelids.upper_open(ix) as i32;
        let upper_q = if iy <= upper_open {
            1.0
        } else {
            let upper_closed = def.eyelids.upper_closed(ix) as i32;
            if iy >= upper_closed {
                0.0
            } else {
                (upper_closed - iy) as f32 / (upper_closed - upper_open) as f32
            }
        };
        (upper_q, 1.0 - upper_q)
    }

    /// Nudges alternating eyes together so they are slightly crossed, giving
    /// the impression of focusing in the near distance. Does nothing for a
    /// single eye.
    fn apply_fixation(&mut self) {
        if self.eyes.len() == 1 {
            return;
        }
        self.state.fixate = (self.state.fixate * 15 + self.nufix) / 16;
        let fixate = self.state.fixate as f32;
        let eye = &mut self.eyes[self.eye_index];
        if self.eye_index & 1 == 1 {
            eye.x -= fixate;
        } else {
            eye.x += fixate;
        }
    }

    /// Applies iris/sclera rotation for the current point in time.
    fn apply_spin(&mut self) {
        let minutes = self.clock.now_ms() as f32 / 60000.0;
        let eye = &mut self.eyes[self.eye_index];
        let def = Arc::clone(&eye.definition);

        if def.iris.i_spin != 0 {
            // Fixed amount per frame: eyes may drift out of sync, but
            // "wagon wheel" tricks work
            eye.current_iris_angle = eye.current_iris_angle.wrapping_add(def.iris.i_spin);
        } else {
            // Time-based: eyes stay in sync, no wagon-wheel effects
            let angle = def.iris.start_angle as f32 + def.iris.spin * minutes * -1024.0;
            eye.current_iris_angle = angle.round() as i64 as u16;
        }

        if def.sclera.i_spin != 0 {
            eye.current_sclera_angle = eye.current_sclera_angle.wrapping_add(def.sclera.i_spin);
        } else {
            let angle = def.sclera.start_angle as f32 + def.sclera.spin * minutes * -1024.0;
            eye.current_sclera_angle = angle.round() as i64 as u16;
        }
    }
}
