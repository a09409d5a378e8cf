// Face-tracking adapter: while a person is confidently in view the eyes
// follow them; once they leave, autonomous gaze takes back over.

use rand::Rng;
use tracing::{debug, info};

use crate::clock::Clock;
use crate::eyes::controller::{EyeController, DEFAULT_GAZE_DURATION_MS};

/// One detected face, in the sensor's 0-255 viewport coordinates.
#[derive(Clone, Copy, Debug)]
pub struct Face {
    /// How certain the sensor is this is a face, 0-255
    pub box_confidence: u8,
    pub box_left: u8,
    pub box_top: u8,
    pub box_right: u8,
    pub box_bottom: u8,
    /// Whether the person is facing the camera
    pub is_facing: bool,
}

impl Face {
    fn area(&self) -> u32 {
        let w = self.box_right.saturating_sub(self.box_left) as u32;
        let h = self.box_bottom.saturating_sub(self.box_top) as u32;
        w * h
    }
}

/// The detection transport. A real implementation polls the person-sensor
/// board over I2C; `None` means the read failed.
pub trait FaceSource {
    fn read(&mut self) -> Option<Vec<Face>>;
}

const SAMPLE_TIME_MS: u32 = 200;
const DETECTION_TIMEOUT_MS: u32 = 2_000;
const MIN_BOX_CONFIDENCE: u8 = 128;

/// Drives the controller's gaze from a [`FaceSource`]. While a face is
/// tracked, autonomous movement is suspended and the gaze eases toward the
/// largest confident face; after `DETECTION_TIMEOUT_MS` with no face it is
/// handed back.
pub struct PersonTracker<S: FaceSource> {
    source: S,
    last_sample_ms: u32,
    last_detection_ms: u32,
    tracking: bool,
}

impl<S: FaceSource> PersonTracker<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            last_sample_ms: 0,
            last_detection_ms: 0,
            tracking: false,
        }
    }

    pub fn tracking(&self) -> bool {
        self.tracking
    }

    pub fn poll<C: Clock, R: Rng>(&mut self, now_ms: u32, controller: &mut EyeController<C, R>) {
        if now_ms.wrapping_sub(self.last_sample_ms) < SAMPLE_TIME_MS {
            return;
        }
        self.last_sample_ms = now_ms;

        let best = self.source.read().and_then(|faces| {
            faces
                .into_iter()
                .filter(|f| f.box_confidence >= MIN_BOX_CONFIDENCE)
                .max_by_key(Face::area)
        });

        match best {
            Some(face) => {
                self.last_detection_ms = now_ms;
                if !self.tracking {
                    self.tracking = true;
                    controller.set_auto_move(false);
                    info!("face acquired, following");
                }
                let cx = (face.box_left as f32 + face.box_right as f32) / 2.0 / 255.0;
                let cy = (face.box_top as f32 + face.box_bottom as f32) / 2.0 / 255.0;
                // The sensor viewport is mirrored relative to the eyes' world
                let x = -(cx * 2.0 - 1.0);
                let y = cy * 2.0 - 1.0;
                debug!(x, y, facing = face.is_facing, "gaze target");
                controller.set_target_position(x, y, DEFAULT_GAZE_DURATION_MS);
            }
            None => {
                if self.tracking
                    && now_ms.wrapping_sub(self.last_detection_ms) > DETECTION_TIMEOUT_MS
                {
                    self.tracking = false;
                    controller.set_auto_move(true);
                    info!("face lost, resuming autonomous gaze");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::display::{Display, FrameDisplay};
    use crate::eyes::catalog;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    struct ScriptedSource(Vec<Option<Vec<Face>>>);

    impl FaceSource for ScriptedSource {
        fn read(&mut self) -> Option<Vec<Face>> {
            if self.0.is_empty() {
                None
            } else {
                self.0.remove(0)
            }
        }
    }

    fn face(confidence: u8, left: u8, right: u8) -> Face {
        Face {
            box_confidence: confidence,
            box_left: left,
            box_top: 100,
            box_right: right,
            box_bottom: 160,
            is_facing: true,
        }
    }

    fn controller() -> EyeController<ManualClock, StdRng> {
        let look = catalog::hazel();
        EyeController::new(
            vec![
                (
                    Box::new(FrameDisplay::new()) as Box<dyn Display>,
                    look[0].clone(),
                ),
                (
                    Box::new(FrameDisplay::new()) as Box<dyn Display>,
                    look[1].clone(),
                ),
            ],
            true,
            true,
            true,
            ManualClock::new(),
            StdRng::seed_from_u64(7),
        )
    }

    #[test]
    fn suspends_and_resumes_autonomous_motion() {
        let mut controller = controller();
        let mut tracker = PersonTracker::new(ScriptedSource(vec![
            Some(vec![face(200, 80, 120)]),
            Some(vec![]),
            Some(vec![]),
            Some(vec![]),
            Some(vec![]),
            Some(vec![]),
            Some(vec![]),
            Some(vec![]),
            Some(vec![]),
            Some(vec![]),
            Some(vec![]),
            Some(vec![]),
        ]));

        tracker.poll(200, &mut controller);
        assert!(tracker.tracking());
        assert!(!controller.auto_move_enabled());

        // Still within the timeout: keep following
        tracker.poll(400, &mut controller);
        assert!(tracker.tracking());
        assert!(!controller.auto_move_enabled());

        // Past the timeout: hand the gaze back
        tracker.poll(2_700, &mut controller);
        assert!(!tracker.tracking());
        assert!(controller.auto_move_enabled());
    }

    #[test]
    fn low_confidence_faces_are_ignored() {
        let mut controller = controller();
        let mut tracker =
            PersonTracker::new(ScriptedSource(vec![Some(vec![face(40, 80, 120)])]));
        tracker.poll(200, &mut controller);
        assert!(!tracker.tracking());
        assert!(controller.auto_move_enabled());
    }

    #[test]
    fn sample_period_limits_reads() {
        let mut controller = controller();
        let mut tracker =
            PersonTracker::new(ScriptedSource(vec![Some(vec![face(200, 80, 120)])]));
        tracker.poll(50, &mut controller); // too soon after t=0
        assert!(!tracker.tracking());
        tracker.poll(250, &mut controller);
        assert!(tracker.tracking());
    }
}
