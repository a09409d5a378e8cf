// The compiled-in catalog of eye looks. Each look is a left/right pair of
// definitions; symmetric looks share one definition for both sides.

use std::sync::Arc;

use crate::color::rgb565;
use crate::eyes::definition::{
    EyeDefinition, EyelidParams, Image, IrisParams, PolarParams, PupilParams, ScleraParams,
};
use crate::eyes::tables;

const MAP_RADIUS: u32 = 64;
const EYE_RADIUS: u32 = 32;

/// A warm human-ish eye with tracking eyelids.
pub fn hazel() -> [Arc<EyeDefinition>; 2] {
    let iris_radius = 16;
    let (angle, distance) = tables::generate_polar_maps(MAP_RADIUS, EYE_RADIUS, iris_radius, 0);
    let (upper, lower) = tables::generate_tracking_eyelids(EYE_RADIUS);
    let eye = Arc::new(EyeDefinition {
        name: "hazel",
        radius: EYE_RADIUS,
        back_color: rgb565(16, 8, 4),
        tracking: true,
        squint: 0.3,
        displacement: tables::generate_displacement(MAP_RADIUS, EYE_RADIUS),
        pupil: PupilParams {
            color: rgb565(8, 4, 2),
            slit_radius: 0,
            min: 0.25,
            max: 0.75,
        },
        iris: IrisParams {
            radius: iris_radius,
            color: rgb565(139, 90, 43),
            ..Default::default()
        },
        sclera: ScleraParams {
            color: rgb565(233, 229, 220),
            ..Default::default()
        },
        eyelids: EyelidParams {
            upper,
            lower,
            color: rgb565(74, 52, 36),
        },
        polar: PolarParams {
            map_radius: MAP_RADIUS,
            angle,
            distance,
        },
    });
    [eye.clone(), eye]
}

/// A green cat eye with a slit pupil.
pub fn cat() -> [Arc<EyeDefinition>; 2] {
    let iris_radius = 18;
    let (angle, distance) = tables::generate_polar_maps(MAP_RADIUS, EYE_RADIUS, iris_radius, 12);
    let (upper, lower) = tables::generate_tracking_eyelids(EYE_RADIUS);
    let eye = Arc::new(EyeDefinition {
        name: "cat",
        radius: EYE_RADIUS,
        back_color: rgb565(8, 12, 4),
        tracking: true,
        squint: 0.5,
        displacement: tables::generate_displacement(MAP_RADIUS, EYE_RADIUS),
        pupil: PupilParams {
            color: rgb565(4, 8, 4),
            slit_radius: 12,
            min: 0.15,
            max: 0.7,
        },
        iris: IrisParams {
            radius: iris_radius,
            color: rgb565(178, 200, 60),
            ..Default::default()
        },
        sclera: ScleraParams {
            color: rgb565(120, 144, 48),
            ..Default::default()
        },
        eyelids: EyelidParams {
            upper,
            lower,
            color: rgb565(40, 40, 32),
        },
        polar: PolarParams {
            map_radius: MAP_RADIUS,
            angle,
            distance,
        },
    });
    [eye.clone(), eye]
}

/// A red spinning eye; the right side mirrors the spin so the pair rotates
/// outward symmetrically.
pub fn demon() -> [Arc<EyeDefinition>; 2] {
    let iris_radius = 20;
    let (angle, distance) = tables::generate_polar_maps(MAP_RADIUS, EYE_RADIUS, iris_radius, 0);
    let (upper, lower) = tables::generate_tracking_eyelids(EYE_RADIUS);
    let build = |name, mirror| {
        Arc::new(EyeDefinition {
            name,
            radius: EYE_RADIUS,
            back_color: rgb565(0, 0, 0),
            tracking: false,
            squint: 0.0,
            displacement: tables::generate_displacement(MAP_RADIUS, EYE_RADIUS),
            pupil: PupilParams {
                color: rgb565(8, 0, 0),
                slit_radius: 0,
                min: 0.3,
                max: 0.6,
            },
            iris: IrisParams {
                radius: iris_radius,
                color: rgb565(200, 40, 20),
                spin: 3.0,
                mirror,
                ..Default::default()
            },
            sclera: ScleraParams {
                color: rgb565(70, 10, 10),
                spin: 3.0,
                mirror,
                ..Default::default()
            },
            eyelids: EyelidParams {
                upper: upper.clone(),
                lower: lower.clone(),
                color: rgb565(32, 4, 4),
            },
            polar: PolarParams {
                map_radius: MAP_RADIUS,
                angle: angle.clone(),
                distance: distance.clone(),
            },
        })
    };
    [build("demon.left", 0), build("demon.right", 1023)]
}

const HYPNO_RED: u16 = rgb565(200, 30, 30);
const HYPNO_WHITE: u16 = rgb565(240, 240, 240);

// 16x4, each row shifted one cell for a swirl once the integer spin kicks in
#[rustfmt::skip]
const HYPNO_TEXTURE: [u16; 64] = {
    const R: u16 = HYPNO_RED;
    const W: u16 = HYPNO_WHITE;
    [
        R, R, W, W, R, R, W, W, R, R, W, W, R, R, W, W,
        R, W, W, R, R, W, W, R, R, W, W, R, R, W, W, R,
        W, W, R, R, W, W, R, R, W, W, R, R, W, W, R, R,
        W, R, R, W, W, R, R, W, W, R, R, W, W, R, R, W,
    ]
};

/// An unblinking hypno-wheel: a striped iris texture driven by a fixed
/// per-frame integer spin.
pub fn hypno() -> [Arc<EyeDefinition>; 2] {
    let iris_radius = 24;
    let (angle, distance) = tables::generate_polar_maps(MAP_RADIUS, EYE_RADIUS, iris_radius, 0);
    let (upper, lower) = tables::generate_open_eyelids(EYE_RADIUS);
    let eye = Arc::new(EyeDefinition {
        name: "hypno",
        radius: EYE_RADIUS,
        back_color: rgb565(12, 12, 12),
        tracking: false,
        squint: 0.0,
        displacement: tables::generate_displacement(MAP_RADIUS, EYE_RADIUS),
        pupil: PupilParams {
            color: rgb565(16, 4, 4),
            slit_radius: 0,
            min: 0.1,
            max: 0.3,
        },
        iris: IrisParams {
            radius: iris_radius,
            texture: Some(Image {
                data: HYPNO_TEXTURE.to_vec(),
                width: 16,
                height: 4,
            }),
            i_spin: 6,
            ..Default::default()
        },
        sclera: ScleraParams {
            color: rgb565(240, 240, 240),
            ..Default::default()
        },
        eyelids: EyelidParams {
            upper,
            lower,
            color: rgb565(0, 0, 0),
        },
        polar: PolarParams {
            map_radius: MAP_RADIUS,
            angle,
            distance,
        },
    });
    [eye.clone(), eye]
}

/// Every look we ship, in display order.
pub fn catalog() -> Vec<[Arc<EyeDefinition>; 2]> {
    vec![hazel(), cat(), demon(), hypno()]
}

/// Steps through the catalog, for the periodic look switcher and the
/// gamepad's look buttons.
pub struct LookCycler {
    looks: Vec<[Arc<EyeDefinition>; 2]>,
    index: usize,
}

impl LookCycler {
    pub fn new(looks: Vec<[Arc<EyeDefinition>; 2]>) -> Self {
        debug_assert!(!looks.is_empty());
        Self { looks, index: 0 }
    }

    pub fn current(&self) -> &[Arc<EyeDefinition>; 2] {
        &self.looks[self.index]
    }

    pub fn next(&mut self) -> &[Arc<EyeDefinition>; 2] {
        self.index = (self.index + 1) % self.looks.len();
        self.current()
    }

    pub fn previous(&mut self) -> &[Arc<EyeDefinition>; 2] {
        self.index = (self.index + self.looks.len() - 1) % self.looks.len();
        self.current()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SCREEN_WIDTH;

    #[test]
    fn every_look_satisfies_the_data_contract() {
        for look in catalog() {
            for def in &look {
                assert!(def.iris.radius <= def.polar.map_radius, "{}", def.name);
                assert_eq!(
                    def.polar.angle.len(),
                    (def.polar.map_radius * def.polar.map_radius) as usize
                );
                assert_eq!(def.polar.angle.len(), def.polar.distance.len());
                assert_eq!(def.eyelids.upper.len(), (SCREEN_WIDTH * 2) as usize);
                assert_eq!(def.eyelids.lower.len(), (SCREEN_WIDTH * 2) as usize);
                assert_eq!(
                    def.displacement.len(),
                    ((SCREEN_WIDTH / 2) * (SCREEN_WIDTH / 2)) as usize
                );
                if let Some(texture) = &def.iris.texture {
                    assert_eq!(texture.data.len(), (texture.width * texture.height) as usize);
                }
            }
        }
    }

    #[test]
    fn cycler_wraps_both_directions() {
        let mut cycler = LookCycler::new(catalog());
        let first = cycler.current()[0].name;
        let count = catalog().len();
        for _ in 0..count {
            cycler.next();
        }
        assert_eq!(cycler.current()[0].name, first);
        cycler.previous();
        assert_eq!(cycler.current()[0].name, "hypno");
    }
}
