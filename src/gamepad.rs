// Gamepad input handler: left stick steers the gaze, buttons drive blinks,
// winks and look cycling. Stick control only shows once auto-move is
// toggled off (North button), since autonomous motion overwrites the gaze
// every frame.

use gilrs::{Axis, Button, Event, EventType, Gilrs};
use rand::Rng;
use tracing::{info, warn};

use crate::clock::Clock;
use crate::eyes::catalog::LookCycler;
use crate::eyes::controller::EyeController;

const STICK_DEADZONE: f32 = 0.08;

pub struct GamepadInput {
    gilrs: Gilrs,
    stick_x: f32,
    stick_y: f32,
}

impl GamepadInput {
    /// Returns `None` when the gamepad subsystem can't start; the rig runs
    /// fine without one.
    pub fn new() -> Option<Self> {
        let gilrs = match Gilrs::new() {
            Ok(gilrs) => gilrs,
            Err(err) => {
                warn!(%err, "gamepad support unavailable");
                return None;
            }
        };
        let mut found = false;
        for (id, gamepad) in gilrs.gamepads() {
            info!(?id, name = gamepad.name(), "gamepad connected");
            found = true;
        }
        if !found {
            info!("no gamepad detected; controls disabled until one pairs");
        }
        Some(Self {
            gilrs,
            stick_x: 0.0,
            stick_y: 0.0,
        })
    }

    pub fn poll<C: Clock, R: Rng>(
        &mut self,
        controller: &mut EyeController<C, R>,
        looks: &mut LookCycler,
    ) {
        while let Some(Event { event, .. }) = self.gilrs.next_event() {
            match event {
                EventType::AxisChanged(axis, value, _) => {
                    let value = if value.abs() < STICK_DEADZONE { 0.0 } else { value };
                    match axis {
                        Axis::LeftStickX => self.stick_x = value,
                        // Stick up is positive; gaze up is negative
                        Axis::LeftStickY => self.stick_y = -value,
                        _ => continue,
                    }
                    controller.set_position(self.stick_x, self.stick_y);
                }
                EventType::ButtonPressed(button, _) => match button {
                    Button::South => {
                        controller.blink();
                    }
                    Button::LeftTrigger | Button::LeftTrigger2 => {
                        controller.wink(0);
                    }
                    Button::RightTrigger | Button::RightTrigger2 => {
                        controller.wink(1);
                    }
                    Button::North => {
                        let enabled = !controller.auto_move_enabled();
                        controller.set_auto_move(enabled);
                        info!(enabled, "auto-move");
                    }
                    Button::West => {
                        let enabled = !controller.auto_pupils_enabled();
                        controller.set_auto_pupils(enabled);
                        info!(enabled, "auto-pupils");
                    }
                    Button::Start => {
                        let enabled = !controller.auto_blink_enabled();
                        controller.set_auto_blink(enabled);
                        info!(enabled, "auto-blink");
                    }
                    Button::DPadRight => {
                        let look = looks.next()[0].name;
                        controller.update_definitions(looks.current());
                        info!(look, "next look");
                    }
                    Button::DPadLeft => {
                        let look = looks.previous()[0].name;
                        controller.update_definitions(looks.current());
                        info!(look, "previous look");
                    }
                    _ => {}
                },
                _ => {}
            }
        }
    }
}
