// Lookup-table generation for eye definitions. The tables are computed once
// at startup; the definitions that hold them neither know nor care how they
// were produced.

use std::f32::consts::{FRAC_PI_2, PI};

use tracing::warn;

use crate::{SCREEN_HEIGHT, SCREEN_WIDTH};

/// Scale a measurement in screen pixels to polar map pixels.
fn screen_to_map(map_radius: f32, eye_radius: f32, value: f32) -> f32 {
    value.atan2((eye_radius * eye_radius - value * value).sqrt()) / FRAC_PI_2 * map_radius
}

/// Generates one quadrant of the polar coordinate maps, `map_radius` square.
/// Returns the (angle, distance) tables.
///
/// Angle entries are 0-255 across the quadrant; the renderer adds the
/// quadrant rotation. Distance entries are 0-127 from the outer sclera edge
/// inward, 128-254 inside the iris, 255 outside the eye.
///
/// `slit_pupil_radius` of zero gives a round pupil; larger values (up to
/// `iris_radius`) give a taller/thinner cat-slit pupil, built by finding for
/// each point the widest vertical-slit-to-iris-edge circle that contains it.
pub fn generate_polar_maps(
    map_radius: u32,
    eye_radius: u32,
    iris_radius: u32,
    slit_pupil_radius: u32,
) -> (Vec<u8>, Vec<u8>) {
    let size = (map_radius * map_radius) as usize;
    let mut angle_map = vec![0u8; size];
    let mut dist_map = vec![0u8; size];

    let map_radius_f = map_radius as f32;
    let map_radius2 = map_radius_f * map_radius_f;

    // Iris size, in polar map pixels
    let i_rad = screen_to_map(map_radius_f, eye_radius as f32, iris_radius as f32);
    let iris_radius2 = i_rad * i_rad;

    for y in 0..map_radius {
        let dy = y as f32 + 0.5;
        let dy2 = dy * dy;
        for x in 0..map_radius {
            let idx = (y * map_radius + x) as usize;
            let dx = x as f32 + 0.5;
            let d2 = dx * dx + dy2;
            if d2 > map_radius2 {
                // Outside the bounds of the eye, mark it as such
                angle_map[idx] = 0;
                dist_map[idx] = 255;
                continue;
            }

            // Clockwise, 0 at the top, 0-255 covering this quadrant
            let angle = (FRAC_PI_2 - dy.atan2(dx)) * (512.0 / PI);
            angle_map[idx] = angle as u8;

            if d2 > iris_radius2 {
                // Sclera. 0 = outer edge, 127 = iris boundary.
                let d = d2.sqrt();
                dist_map[idx] = ((map_radius_f - d) / (map_radius_f - i_rad) * 127.0) as u8;
            } else if slit_pupil_radius == 0 {
                let d = d2.sqrt();
                dist_map[idx] = ((i_rad - d) / i_rad * 127.0) as u8 + 128;
            } else {
                let xp = x as f32 + 0.5;
                // Neighbours to the left and above always hold a value at
                // least as large as this point's, so their result is a valid
                // starting point for the scan.
                let seed = if x == 0 && y == 0 {
                    254
                } else if x == 0 {
                    dist_map[((y - 1) * map_radius) as usize]
                } else {
                    dist_map[idx - 1]
                };
                let start = 255 - seed as i32;
                for i in start..128 {
                    let ratio = i as f32 / 127.0; // 0 (open) to 1 (slit)
                    // A vertical point between the slit edge and the iris
                    // edge, and a horizontal point between the center and
                    // the right iris edge, at the ratio under test
                    let y1 = slit_pupil_radius as f32 + (i_rad - slit_pupil_radius as f32) * ratio;
                    let x2 = i_rad * ratio;
                    // X of the center of the circle through (0, y1) and
                    // (x2, 0) whose center sits on the X axis
                    let xc = (x2 * x2 - y1 * y1) / (2.0 * x2);
                    let r_dx = x2 - xc;
                    let r2 = r_dx * r_dx;
                    let p_dx = xp - xc;
                    let p_d2 = p_dx * p_dx + dy2;
                    if p_d2 <= r2 {
                        dist_map[idx] = (255 - i) as u8;
                        break;
                    }
                }
                if dist_map[idx] < 128 {
                    warn!(
                        x,
                        y,
                        value = dist_map[idx],
                        "iris distance out of [128, 255) band"
                    );
                }
            }
        }
    }

    (angle_map, dist_map)
}

/// Generates the quarter-screen displacement map: for each pixel of one
/// quadrant, the offset (in map pixels) from the screen position to the
/// spherical eyeball surface, or 255 outside the eye. Pixel centers sit at
/// +0.5 so the screen center falls between pixels and mirroring is exact.
pub fn generate_displacement(map_radius: u32, eye_radius: u32) -> Vec<u8> {
    let size = (SCREEN_WIDTH / 2) as usize;
    let mut map = vec![0u8; size * size];
    let eye_radius2 = (eye_radius * eye_radius) as f32;

    for y in 0..size {
        let dy = y as f32 + 0.5;
        let dy2 = dy * dy;
        for x in 0..size {
            let dx = x as f32 + 0.5;
            let d2 = dx * dx + dy2;
            map[y * size + x] = if d2 <= eye_radius2 {
                let d = d2.sqrt();
                let h = (eye_radius2 - d2).sqrt();
                let a = d.atan2(h);
                let pa = a / FRAC_PI_2 * map_radius as f32;
                (dx / d * pa - x as f32) as u8
            } else {
                255
            };
        }
    }

    map
}

/// Eyelid tables for a lidless look: both the open and closed bounds follow
/// the circular edge of the eye, so the lids never show except while
/// blinking across the eyeball itself. Returns (upper, lower).
pub fn generate_open_eyelids(eye_radius: u32) -> (Vec<u8>, Vec<u8>) {
    let w = SCREEN_WIDTH as usize;
    let mut upper = vec![0u8; w * 2];
    let mut lower = vec![0u8; w * 2];
    let r2 = (eye_radius * eye_radius) as f32;
    let mid_x = SCREEN_WIDTH as f32 / 2.0 - 0.5;
    let mid_y = SCREEN_HEIGHT as f32 / 2.0 - 0.5;

    for x in 0..w {
        let x_off = x as f32 - mid_x;
        let chord = (r2 - x_off * x_off).max(0.0).sqrt();
        let top = ((mid_y - chord).trunc() as i32 - 1).max(0) as u8;
        upper[x * 2] = top;
        upper[x * 2 + 1] = top;
        let bottom = ((mid_y + chord).trunc() as u32 + 1).min(SCREEN_HEIGHT) as u8;
        lower[x * 2] = bottom;
        lower[x * 2 + 1] = bottom;
    }

    (upper, lower)
}

/// Eyelid tables for a tracking look: open bounds hug the top/bottom arcs of
/// the eye, closed bounds meet a little below the centerline. Returns
/// (upper, lower).
pub fn generate_tracking_eyelids(eye_radius: u32) -> (Vec<u8>, Vec<u8>) {
    let w = SCREEN_WIDTH as usize;
    let mut upper = vec![0u8; w * 2];
    let mut lower = vec![0u8; w * 2];
    let r2 = (eye_radius * eye_radius) as f32;
    let mid_x = SCREEN_WIDTH as f32 / 2.0 - 0.5;
    let mid_y = SCREEN_HEIGHT as f32 / 2.0 - 0.5;

    for x in 0..w {
        let x_off = x as f32 - mid_x;
        let chord = (r2 - x_off * x_off).max(0.0).sqrt();
        let meet = ((mid_y + chord * 0.2).trunc() as u32 + 1).min(SCREEN_HEIGHT) as u8;

        upper[x * 2] = ((mid_y - chord).trunc() as i32 - 1).max(0) as u8;
        upper[x * 2 + 1] = meet;
        lower[x * 2] = meet;
        lower[x * 2 + 1] = ((mid_y + chord).trunc() as u32 + 1).min(SCREEN_HEIGHT) as u8;
    }

    (upper, lower)
}
