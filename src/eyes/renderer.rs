// The per-frame pixel loop. Everything here is integer math over the
// precomputed tables; the only float work happens once per frame before the
// loops start.

use std::sync::Arc;

use crate::eyes::state::Eye;
use crate::{SCREEN_HEIGHT, SCREEN_WIDTH};

/// Resolve a full-map coordinate against the one-quadrant polar tables.
/// Returns (angle 0-1023, distance).
///
/// Only quadrant 1 (bottom right) is stored. The others reuse it:
/// quadrant 2 rotates the angle 270 degrees clockwise (+768) and mirrors the
/// distance on X, quadrant 3 rotates 180 (+512) and mirrors on X and Y,
/// quadrant 4 rotates 90 (+256) and mirrors on Y. Angle additions wrap
/// modulo 1024 at the point of use.
#[inline]
pub(crate) fn polar_lookup(
    angle_map: &[u8],
    dist_map: &[u8],
    map_radius: i32,
    mut mx: i32,
    mut my: i32,
) -> (u32, i32) {
    if my >= map_radius {
        my -= map_radius;
        if mx >= map_radius {
            // Quadrant 1 (bottom right): use the lookups directly
            mx -= map_radius;
            let moff = (my * map_radius + mx) as usize;
            (angle_map[moff] as u32, dist_map[moff] as i32)
        } else {
            // Quadrant 2 (bottom left)
            mx = map_radius - mx - 1;
            (
                (angle_map[(mx * map_radius + my) as usize] as u32 + 768) & 1023,
                dist_map[(my * map_radius + mx) as usize] as i32,
            )
        }
    } else if mx < map_radius {
        // Quadrant 3 (top left)
        mx = map_radius - mx - 1;
        my = map_radius - my - 1;
        let moff = (my * map_radius + mx) as usize;
        ((angle_map[moff] as u32 + 512) & 1023, dist_map[moff] as i32)
    } else {
        // Quadrant 4 (top right)
        mx -= map_radius;
        my = map_radius - my - 1;
        (
            (angle_map[(mx * map_radius + my) as usize] as u32 + 256) & 1023,
            dist_map[(my * map_radius + mx) as usize] as i32,
        )
    }
}

/// Draws an entire eye to its display.
///
/// `upper_factor`/`lower_factor` are how open the eyelids are (0 = closed,
/// 1 = open, pre-dampening), `blink_factor` how far a blink has progressed
/// (0 = not blinking, 1 = fully closed).
pub fn render_eye(
    eye: &mut Eye,
    pupil_amount: f32,
    mut upper_factor: f32,
    mut lower_factor: f32,
    blink_factor: f32,
) {
    let def = Arc::clone(&eye.definition);

    let displacement_map_size = (SCREEN_WIDTH / 2) as i32;
    let map_radius = def.polar.map_radius as i32;
    let map_diameter = map_radius * 2;

    let x_position_over_map = eye.x as i32 - (SCREEN_WIDTH / 2) as i32;
    let y_position_over_map = eye.y as i32 - (SCREEN_HEIGHT / 2) as i32;

    let sclera = &def.sclera;
    let iris = &def.iris;

    let pupil_range = def.pupil.max - def.pupil.min;
    let iris_value = 1.0 - (def.pupil.min + pupil_range * pupil_amount);
    let iris_texture_height = iris.texture.as_ref().map_or(1, |t| t.height) as i32;
    // Scaled up by 32768 for sub-pixel precision while keeping integer maths
    // in the inner loop. 126 is the largest value the distance map produces.
    let i_pupil_factor = (32768.0 / 126.0 * (iris_texture_height - 1) as f32 / iris_value) as i32;
    // Scaled by 126 and offset by 128 to land directly in the 128-254 iris
    // band of the distance map; saves a little math per pixel.
    let iris_size = (126.0 * iris_value) as i32 + 128;

    // Dampen the eyelid movement a bit
    upper_factor = eye.upper_lid_factor * 0.7 + upper_factor * 0.3;
    lower_factor = eye.lower_lid_factor * 0.7 + lower_factor * 0.3;

    // How open the eyelids are this frame and were last frame
    let upper_f = upper_factor * (1.0 - blink_factor);
    let lower_f = lower_factor * (1.0 - blink_factor);
    let prev_upper_f = eye.upper_lid_factor * (1.0 - eye.blink.blink_factor);
    let prev_lower_f = eye.lower_lid_factor * (1.0 - eye.blink.blink_factor);

    // Store for the next iteration
    eye.upper_lid_factor = upper_factor;
    eye.lower_lid_factor = lower_factor;
    eye.blink.blink_factor = blink_factor;

    let current_iris_angle = eye.current_iris_angle as u32;
    let current_sclera_angle = eye.current_sclera_angle as u32;
    let draw_all = eye.draw_all;

    // Hoist lookups out of the inner loops
    let angle_map = &def.polar.angle;
    let dist_map = &def.polar.distance;
    let displacement = &def.displacement;
    let eyelids = &def.eyelids;
    let eyelid_color = eyelids.color;
    let pupil_color = def.pupil.color;
    let back_color = def.back_color;

    let display = eye.display.as_mut();

    for screen_x in 0..SCREEN_WIDTH {
        // The extent of this column that needs repainting: everything the
        // eyelids cover now or covered last frame, plus whatever is between.
        let current_upper = eyelids.upper_lid(screen_x, upper_f);
        let current_lower = eyelids.lower_lid(screen_x, lower_f);
        let (mut min_y, mut max_y) = if draw_all {
            (0, SCREEN_HEIGHT)
        } else {
            let previous_upper = eyelids.upper_lid(screen_x, prev_upper_f);
            let previous_lower = eyelids.lower_lid(screen_x, prev_lower_f);
            (
                current_upper.min(previous_upper),
                current_lower.max(previous_lower),
            )
        };

        // The eye sphere is symmetrical over X and Y, so one quarter-screen
        // displacement table serves the whole screen with the axes swapped
        // and the signs flipped per half.
        let (column, xmul): (i32, i32) = if screen_x < SCREEN_WIDTH / 2 {
            (displacement_map_size - 1 - screen_x as i32, -1)
        } else {
            (screen_x as i32 - displacement_map_size, 1)
        };

        // Repaint any eyelid band inside the span with fast fills
        if current_upper > min_y {
            display.draw_fast_vline(screen_x, min_y, current_upper - min_y, eyelid_color);
            min_y = current_upper;
        }
        if current_lower < max_y {
            display.draw_fast_vline(screen_x, current_lower, max_y - current_lower, eyelid_color);
            max_y = current_lower;
        }

        let xx = x_position_over_map + screen_x as i32;
        for screen_y in min_y..max_y {
            let (doff, dy) = if (screen_y as i32) < displacement_map_size {
                let doff = displacement_map_size - screen_y as i32 - 1;
                (
                    doff,
                    -(displacement[(column * displacement_map_size + doff) as usize] as i32),
                )
            } else {
                let doff = screen_y as i32 - displacement_map_size;
                (
                    doff,
                    displacement[(column * displacement_map_size + doff) as usize] as i32,
                )
            };
            let dx = displacement[(doff * displacement_map_size + column) as usize] as i32;

            let p = if dx < 255 {
                // Inside the eyeball (sclera/iris/pupil) area
                let mx = xx + dx * xmul;
                let my = y_position_over_map + screen_y as i32 + dy;
                if mx >= 0 && mx < map_diameter && my >= 0 && my < map_diameter {
                    let (angle, distance) = polar_lookup(angle_map, dist_map, map_radius, mx, my);
                    if distance < 128 {
                        // Sclera
                        if let Some(texture) = &sclera.texture {
                            let a = ((angle + current_sclera_angle) & 1023) ^ sclera.mirror as u32;
                            let tx = (a & 1023) * texture.width / 1024;
                            let ty = distance as u32 * texture.height / 128;
                            texture.get(tx, ty)
                        } else {
                            sclera.color
                        }
                    } else if distance < 255 {
                        // Either the iris or the pupil
                        if distance >= iris_size {
                            pupil_color
                        } else if let Some(texture) = &iris.texture {
                            let a = ((angle + current_iris_angle) & 1023) ^ iris.mirror as u32;
                            let tx = (a & 1023) * texture.width / 1024;
                            let ty = ((distance - 128) * i_pupil_factor / 32768) as u32;
                            texture.get(tx, ty.min(texture.height - 1))
                        } else {
                            iris.color
                        }
                    } else {
                        // Back of eye
                        back_color
                    }
                } else {
                    // Outside the polar map
                    back_color
                }
            } else {
                // Outside the eye area, i.e. on an eyelid
                eyelid_color
            };
            display.draw_pixel(screen_x, screen_y, p);
        }
    }

    eye.draw_all = false;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::rgb565;
    use crate::display::{FrameDisplay, FrameHandle};
    use crate::eyes::definition::{
        EyeDefinition, EyelidParams, Image, IrisParams, PolarParams, PupilParams, ScleraParams,
    };
    use crate::eyes::state::EyeBlink;
    use crate::eyes::tables;

    const MAP_RADIUS: u32 = 64;
    const EYE_RADIUS: u32 = 32;

    const PUPIL: u16 = rgb565(10, 10, 10);
    const IRIS: u16 = rgb565(60, 120, 180);
    const SCLERA: u16 = rgb565(230, 230, 220);
    const LID: u16 = rgb565(90, 60, 40);

    fn flat_definition(sclera_texture: Option<Image>) -> Arc<EyeDefinition> {
        let (angle, distance) = tables::generate_polar_maps(MAP_RADIUS, EYE_RADIUS, 16, 0);
        let (upper, lower) = tables::generate_open_eyelids(EYE_RADIUS);
        Arc::new(EyeDefinition {
            name: "test",
            radius: EYE_RADIUS,
            back_color: rgb565(20, 20, 20),
            tracking: false,
            squint: 0.0,
            displacement: tables::generate_displacement(MAP_RADIUS, EYE_RADIUS),
            pupil: PupilParams {
                color: PUPIL,
                slit_radius: 0,
                min: 0.25,
                max: 0.75,
            },
            iris: IrisParams {
                radius: 16,
                color: IRIS,
                ..Default::default()
            },
            sclera: ScleraParams {
                texture: sclera_texture,
                color: SCLERA,
                ..Default::default()
            },
            eyelids: EyelidParams {
                upper,
                lower,
                color: LID,
            },
            polar: PolarParams {
                map_radius: MAP_RADIUS,
                angle,
                distance,
            },
        })
    }

    fn centered_eye(definition: Arc<EyeDefinition>) -> (Eye, FrameHandle) {
        let display = FrameDisplay::new();
        let handle = display.handle();
        let eye = Eye {
            display: Box::new(display),
            definition,
            x: MAP_RADIUS as f32,
            y: MAP_RADIUS as f32,
            current_iris_angle: 0,
            current_sclera_angle: 0,
            blink: EyeBlink::default(),
            upper_lid_factor: 0.0,
            lower_lid_factor: 0.0,
            draw_all: true,
        };
        (eye, handle)
    }

    #[test]
    fn center_pixel_is_pupil() {
        let (mut eye, handle) = centered_eye(flat_definition(None));
        render_eye(&mut eye, 0.0, 1.0, 1.0, 0.0);
        let mid = SCREEN_WIDTH / 2;
        assert_eq!(handle.pixel(mid, mid), PUPIL);
        assert!(!eye.draw_all);
    }

    #[test]
    fn pupil_grows_with_pupil_amount() {
        let (mut eye, handle) = centered_eye(flat_definition(None));
        render_eye(&mut eye, 0.0, 1.0, 1.0, 0.0);
        let small = handle.count_color(PUPIL);
        let (mut eye, handle) = centered_eye(flat_definition(None));
        render_eye(&mut eye, 1.0, 1.0, 1.0, 0.0);
        let large = handle.count_color(PUPIL);
        assert!(
            large > small,
            "pupil should dilate: {small} pixels at 0.0, {large} at 1.0"
        );
    }

    #[test]
    fn corners_take_eyelid_color() {
        let (mut eye, handle) = centered_eye(flat_definition(None));
        render_eye(&mut eye, 0.5, 1.0, 1.0, 0.0);
        // Outside the eye circle entirely
        assert_eq!(handle.pixel(0, 0), LID);
        assert_eq!(handle.pixel(SCREEN_WIDTH - 1, SCREEN_HEIGHT - 1), LID);
    }

    #[test]
    fn sclera_texture_is_sampled() {
        let texture = Image {
            data: vec![0x1111, 0x2222, 0x3333, 0x4444],
            width: 4,
            height: 1,
        };
        let (mut eye, handle) = centered_eye(flat_definition(Some(texture)));
        render_eye(&mut eye, 0.5, 1.0, 1.0, 0.0);
        let mut seen = 0;
        for color in [0x1111, 0x2222, 0x3333, 0x4444] {
            if handle.count_color(color) > 0 {
                seen += 1;
            }
        }
        assert!(seen >= 2, "expected several texture sectors, saw {seen}");
        assert_eq!(handle.count_color(SCLERA), 0);
    }

    #[test]
    fn partial_redraw_touches_fewer_pixels_than_full() {
        let (mut eye, handle) = centered_eye(flat_definition(None));
        render_eye(&mut eye, 0.5, 1.0, 1.0, 0.0);
        let full = handle.touched_count();
        assert_eq!(full, (SCREEN_WIDTH * SCREEN_HEIGHT) as usize);

        // Lid factors have settled; the next frame's dirty span is only the
        // area inside the (static) lid bounds.
        handle.clear_touched();
        render_eye(&mut eye, 0.5, 1.0, 1.0, 0.0);
        assert!(handle.touched_count() < full);
    }
}
