// The immutable data model for one eye "look". Definitions are built once at
// startup (see `tables` and `catalog`) and shared by reference; nothing here
// is mutated while rendering.

/// A 16-bit 565 RGB texture.
#[derive(Clone, Debug)]
pub struct Image {
    pub data: Vec<u16>,
    pub width: u32,
    pub height: u32,
}

impl Image {
    #[inline]
    pub fn get(&self, x: u32, y: u32) -> u16 {
        self.data[(y * self.width + x) as usize]
    }
}

#[derive(Clone, Debug)]
pub struct PupilParams {
    /// 16-bit 565 RGB
    pub color: u16,
    /// Slit radius, in pixels. Zero for a round pupil.
    pub slit_radius: u32,
    /// The minimum size of the pupil, as a ratio of the iris size
    pub min: f32,
    /// The maximum size of the pupil, as a ratio of the iris size
    pub max: f32,
}

impl Default for PupilParams {
    fn default() -> Self {
        Self {
            color: 0,
            slit_radius: 0,
            min: 0.2,
            max: 0.8,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct IrisParams {
    /// Iris radius, in pixels
    pub radius: u32,
    /// The iris texture image. Optional.
    pub texture: Option<Image>,
    /// The iris color, used if no texture is set. 16-bit 565 RGB.
    pub color: u16,
    /// Initial rotation, 0-1023 CCW
    pub start_angle: u16,
    /// How quickly to rotate the iris image, in RPM. Zero disables animation.
    pub spin: f32,
    /// Per-frame fixed integer spin, instead of time-based. If set, this
    /// overrides `spin`.
    pub i_spin: u16,
    /// Controls mirroring of the iris image. 0 = normal, 1023 = flip X.
    pub mirror: u16,
}

#[derive(Clone, Debug, Default)]
pub struct ScleraParams {
    /// The sclera texture image. Optional.
    pub texture: Option<Image>,
    /// The sclera color, used if no texture is set. 16-bit 565 RGB.
    pub color: u16,
    /// Initial rotation, 0-1023 CCW
    pub start_angle: u16,
    /// How quickly to rotate the sclera image, in RPM. Zero disables animation.
    pub spin: f32,
    /// Per-frame fixed integer spin, instead of time-based. If set, this
    /// overrides `spin`.
    pub i_spin: u16,
    /// Controls mirroring of the sclera image. 0 = normal, 1023 = flip X.
    pub mirror: u16,
}

/// Per-column eyelid bounds. For each screen column the `upper` and `lower`
/// arrays hold two bytes: the Y the lid edge rests at when fully open, and
/// the Y it reaches when fully closed.
#[derive(Clone, Debug)]
pub struct EyelidParams {
    pub upper: Vec<u8>,
    pub lower: Vec<u8>,
    /// The color of the eyelid. 16-bit 565 RGB.
    pub color: u16,
}

impl EyelidParams {
    #[inline]
    pub fn upper_open(&self, x: u32) -> u32 {
        self.upper[(x * 2) as usize] as u32
    }

    #[inline]
    pub fn upper_closed(&self, x: u32) -> u32 {
        self.upper[(x * 2 + 1) as usize] as u32
    }

    #[inline]
    pub fn lower_open(&self, x: u32) -> u32 {
        self.lower[(x * 2 + 1) as usize] as u32
    }

    #[inline]
    pub fn lower_closed(&self, x: u32) -> u32 {
        self.lower[(x * 2) as usize] as u32
    }

    /// The Y coordinate of the upper eyelid edge at column `x` when the lid
    /// is `proportion` open (0 = fully closed, 1 = fully open).
    #[inline]
    pub fn upper_lid(&self, x: u32, proportion: f32) -> u32 {
        let start = self.upper_open(x) as f32;
        let end = self.upper_closed(x) as f32;
        (end - proportion * (end - start)) as u32
    }

    /// The Y coordinate of the lower eyelid edge at column `x` when the lid
    /// is `proportion` open (0 = fully closed, 1 = fully open).
    #[inline]
    pub fn lower_lid(&self, x: u32, proportion: f32) -> u32 {
        let start = self.lower_closed(x) as f32;
        let end = self.lower_open(x) as f32;
        (start + proportion * (end - start)) as u32
    }
}

/// One quadrant of the polar eyeball-surface mapping. The other three
/// quadrants are derived at lookup time by mirroring/rotating this one.
/// Angle entries cover 0-255 within the quadrant (the quadrant rotation adds
/// 256/512/768); distance entries are 0-127 for the sclera band, 128-254 for
/// the iris band, and 255 outside the eye.
#[derive(Clone, Debug)]
pub struct PolarParams {
    /// Map radius, in pixels. The full map is a square of twice this size.
    pub map_radius: u32,
    pub angle: Vec<u8>,
    pub distance: Vec<u8>,
}

#[derive(Clone, Debug)]
pub struct EyeDefinition {
    /// The name of the look, useful for logging
    pub name: &'static str,
    /// Eye radius, in pixels
    pub radius: u32,
    /// Back-of-eye color. 16-bit 565 RGB.
    pub back_color: u16,
    /// Whether the eyelids 'track' the pupils or not
    pub tracking: bool,
    /// How far the eyelids sit down over the iris while tracking
    pub squint: f32,
    /// Quarter-screen displacement map; see `tables::generate_displacement`.
    pub displacement: Vec<u8>,
    pub pupil: PupilParams,
    pub iris: IrisParams,
    pub sclera: ScleraParams,
    pub eyelids: EyelidParams,
    pub polar: PolarParams,
}

impl EyeDefinition {
    /// Author-contract checks, debug builds only. A malformed definition
    /// produces garbage pixels, never a crash.
    pub(crate) fn debug_validate(&self) {
        debug_assert!(self.iris.radius <= self.polar.map_radius);
        debug_assert_eq!(
            self.polar.angle.len(),
            (self.polar.map_radius * self.polar.map_radius) as usize
        );
        debug_assert_eq!(self.polar.angle.len(), self.polar.distance.len());
        if let Some(texture) = &self.iris.texture {
            debug_assert!(texture.width > 0 && texture.height > 0);
        }
        if let Some(texture) = &self.sclera.texture {
            debug_assert!(texture.width > 0 && texture.height > 0);
        }
    }
}
