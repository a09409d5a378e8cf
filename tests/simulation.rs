// Long-run scenarios driven entirely through the public API, with scripted
// time and a seeded RNG.

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;

use pi_eyes::clock::ManualClock;
use pi_eyes::display::{Display, FrameDisplay, FrameHandle};
use pi_eyes::eyes::catalog;
use pi_eyes::eyes::controller::EyeController;
use pi_eyes::EyeDefinition;
use pi_eyes::{SCREEN_HEIGHT, SCREEN_WIDTH};

fn two_eye_rig(
    look: [Arc<EyeDefinition>; 2],
    seed: u64,
) -> (
    EyeController<ManualClock, StdRng>,
    ManualClock,
    Vec<FrameHandle>,
) {
    let clock = ManualClock::new();
    let mut handles = Vec::new();
    let rig = look
        .iter()
        .map(|def| {
            let display = FrameDisplay::new();
            handles.push(display.handle());
            (Box::new(display) as Box<dyn Display>, def.clone())
        })
        .collect();
    let controller = EyeController::new(
        rig,
        true,
        true,
        true,
        clock.clone(),
        StdRng::seed_from_u64(seed),
    );
    (controller, clock, handles)
}

#[test]
fn ten_thousand_ticks_across_every_look() {
    let (mut controller, clock, handles) = two_eye_rig(catalog::hazel(), 1);
    controller.set_max_gaze_ms(3000);

    let looks = catalog::catalog();
    let mut look_index = 0;
    for tick in 0..10_000u32 {
        // Swap looks every so often, like the production scheduler does
        if tick % 500 == 499 {
            look_index = (look_index + 1) % looks.len();
            let look = &looks[look_index];
            controller.update_definitions(&[look[0].clone(), look[1].clone()]);
        }
        clock.advance(8);
        assert!(controller.render_frame());
    }

    // Round-robin: over an even number of successful renders, both eyes
    // rendered the same number of times
    assert_eq!(handles[0].commits(), 5_000);
    assert_eq!(handles[1].commits(), 5_000);

    // Both panels fully painted
    for handle in &handles {
        assert_eq!(
            handle.touched_count(),
            (SCREEN_WIDTH * SCREEN_HEIGHT) as usize
        );
    }
}

#[test]
fn backpressure_skips_frames_without_losing_round_robin_order() {
    let (mut controller, clock, handles) = two_eye_rig(catalog::demon(), 2);

    clock.advance(8);
    assert!(controller.render_frame()); // eye 0
    assert!(controller.render_frame()); // eye 1

    // Eye 0's display goes busy: its turn is dropped, not queued
    handles[0].set_ready(false);
    for _ in 0..5 {
        clock.advance(8);
        assert!(!controller.render_frame());
    }
    assert_eq!(handles[0].commits(), 1);
    assert_eq!(handles[1].commits(), 1);

    // When it comes back, the order resumes where it left off
    handles[0].set_ready(true);
    clock.advance(8);
    assert!(controller.render_frame()); // eye 0
    assert!(controller.render_frame()); // eye 1
    assert_eq!(handles[0].commits(), 2);
    assert_eq!(handles[1].commits(), 2);
}

#[test]
fn definition_swap_repaints_every_row_of_every_column() {
    let (mut controller, clock, handles) = two_eye_rig(catalog::hazel(), 3);

    // Let the lids settle so partial redraws are genuinely partial
    for _ in 0..20 {
        clock.advance(8);
        controller.render_frame();
    }
    handles[0].clear_touched();
    clock.advance(8);
    controller.render_frame(); // eye 0, partial
    assert!(handles[0].touched_count() < (SCREEN_WIDTH * SCREEN_HEIGHT) as usize);

    let hypno = catalog::hypno();
    controller.update_definitions(&[hypno[0].clone(), hypno[1].clone()]);

    handles[1].clear_touched();
    clock.advance(8);
    controller.render_frame(); // eye 1, full repaint after the swap
    assert_eq!(
        handles[1].touched_count(),
        (SCREEN_WIDTH * SCREEN_HEIGHT) as usize
    );
}

#[test]
fn driven_gaze_and_pupil_stay_stable_for_hours_of_ticks() {
    let (mut controller, clock, _) = two_eye_rig(catalog::cat(), 4);
    controller.set_auto_move(false);

    // Sweep the gaze around the rim of the unit disk and the pupil across
    // its range; nothing may panic or wedge
    for step in 0..2_000u32 {
        let theta = step as f32 * 0.01;
        controller.set_target_position(1.5 * theta.cos(), 1.5 * theta.sin(), 40);
        controller.set_target_pupil((theta.sin() + 1.0) / 2.0, 40);
        for _ in 0..4 {
            clock.advance(8);
            assert!(controller.render_frame());
        }
    }
}
