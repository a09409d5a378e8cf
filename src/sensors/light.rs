// Ambient light sensing for pupil response.

use std::fs;
use std::path::PathBuf;

/// A raw ambient-light reading, bigger = brighter. `None` when no reading is
/// available (sensor absent or read failed).
pub trait LightSource {
    fn read_raw(&mut self) -> Option<u32>;
}

/// Reads an illuminance channel from the Linux IIO sysfs tree, e.g.
/// `/sys/bus/iio/devices/iio:device0/in_illuminance_raw`.
pub struct IioLightSource {
    path: PathBuf,
}

impl IioLightSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl LightSource for IioLightSource {
    fn read_raw(&mut self) -> Option<u32> {
        fs::read_to_string(&self.path)
            .ok()
            .and_then(|s| s.trim().parse().ok())
    }
}

// Only read the sensor every 0.1s
const READ_FREQUENCY_MS: u32 = 100;

/// Produces a damped, gamma-curved [0, 1] brightness signal from a raw light
/// source. The caller maps the signal onto the controller (typically
/// `set_pupil(1.0 - value)`, so bright light constricts the pupil).
pub struct LightSensor<S: LightSource> {
    source: S,
    min_reading: u32,
    max_reading: u32,
    curve: f32,
    previous_value: f32,
    last_read_time_ms: u32,
}

impl<S: LightSource> LightSensor<S> {
    pub fn new(source: S, min_reading: u32, max_reading: u32, curve: f32) -> Self {
        debug_assert!(min_reading < max_reading);
        Self {
            source,
            min_reading,
            max_reading,
            curve,
            previous_value: 0.0,
            last_read_time_ms: 0,
        }
    }

    /// Samples at most every 100 ms and hands the processed value to
    /// `processor`. Between samples (or on a failed read) the processor is
    /// not called.
    pub fn read_damped(&mut self, now_ms: u32, processor: impl FnOnce(f32)) {
        if now_ms.wrapping_sub(self.last_read_time_ms) <= READ_FREQUENCY_MS {
            return;
        }
        let Some(raw) = self.source.read_raw() else {
            return;
        };
        self.last_read_time_ms = now_ms;
        let clamped = raw.clamp(self.min_reading, self.max_reading);
        let mut value =
            (clamped - self.min_reading) as f32 / (self.max_reading - self.min_reading) as f32;
        value = value.powf(self.curve);
        // Apply some smoothing
        value = value * 0.9 + self.previous_value * 0.1;
        self.previous_value = value;
        processor(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedSource(Option<u32>);

    impl LightSource for FixedSource {
        fn read_raw(&mut self) -> Option<u32> {
            self.0
        }
    }

    #[test]
    fn respects_the_sample_period() {
        let mut sensor = LightSensor::new(FixedSource(Some(500)), 0, 1000, 1.0);
        let mut calls = 0;
        sensor.read_damped(150, |_| calls += 1);
        sensor.read_damped(200, |_| calls += 1);
        sensor.read_damped(251, |_| calls += 1);
        assert_eq!(calls, 2);
    }

    #[test]
    fn output_is_damped_and_in_range() {
        let mut sensor = LightSensor::new(FixedSource(Some(5000)), 100, 1100, 2.0);
        let mut seen = Vec::new();
        let mut t = 0;
        for _ in 0..5 {
            t += 150;
            sensor.read_damped(t, |v| seen.push(v));
        }
        // Saturated input converges toward 1.0 from below
        assert_eq!(seen.len(), 5);
        assert!((seen[0] - 0.9).abs() < 1e-6);
        for window in seen.windows(2) {
            assert!(window[1] > window[0]);
        }
        for v in seen {
            assert!((0.0..=1.0).contains(&v));
        }
    }

    #[test]
    fn failed_reads_are_skipped() {
        let mut sensor = LightSensor::new(FixedSource(None), 0, 1000, 1.0);
        let mut calls = 0;
        sensor.read_damped(150, |_| calls += 1);
        assert_eq!(calls, 0);
    }
}
