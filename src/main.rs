use std::path::Path;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use rand::rngs::SmallRng;
use rand::SeedableRng;
use rpi_led_matrix::{LedMatrix, LedMatrixOptions};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use pi_eyes::clock::{Clock, SystemClock};
use pi_eyes::display::{Display, MatrixDisplay};
use pi_eyes::eyes::catalog::{catalog, LookCycler};
use pi_eyes::eyes::controller::EyeController;
use pi_eyes::gamepad::GamepadInput;
use pi_eyes::sensors::light::{IioLightSource, LightSensor};
use pi_eyes::SCREEN_WIDTH;

// How long each look stays up before the scheduler cycles to the next
const EYE_DURATION_MS: u32 = 4_000;

// Two eyes round-robin, so each eye updates at half this rate
const FRAME_INTERVAL: Duration = Duration::from_millis(8);

const LIGHT_SENSOR_PATH: &str = "/sys/bus/iio/devices/iio:device0/in_illuminance_raw";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // Two 64x64 panels chained side by side, one per eye
    let mut options = LedMatrixOptions::new();
    options.set_rows(64);
    options.set_cols(64);
    options.set_chain_length(2);
    options.set_hardware_mapping("adafruit-hat");
    let matrix = LedMatrix::new(Some(options), None)?;
    let canvas = Arc::new(Mutex::new(matrix.canvas()));
    info!("matrix initialized");

    let mut looks = LookCycler::new(catalog());
    let defs = looks.current().clone();
    info!(look = defs[0].name, "starting look");

    // The left eye's window is mirrored; the renderer compensates by
    // flipping that eye's gaze X while drawing.
    let left = MatrixDisplay::new(Arc::clone(&canvas), 0, true);
    let right = MatrixDisplay::new(Arc::clone(&canvas), SCREEN_WIDTH as i32, false);

    let mut light = if Path::new(LIGHT_SENSOR_PATH).exists() {
        info!(path = LIGHT_SENSOR_PATH, "light sensor found");
        Some(LightSensor::new(
            IioLightSource::new(LIGHT_SENSOR_PATH),
            0,
            4095,
            2.2,
        ))
    } else {
        None
    };

    let mut controller = EyeController::new(
        vec![
            (Box::new(left) as Box<dyn Display>, defs[0].clone()),
            (Box::new(right) as Box<dyn Display>, defs[1].clone()),
        ],
        true,
        true,
        // With a light sensor present the pupils respond to it instead
        light.is_none(),
        SystemClock::new(),
        SmallRng::from_os_rng(),
    );

    let mut gamepad = GamepadInput::new();

    let loop_clock = SystemClock::new();
    let mut last_switch_ms = 0u32;

    info!("starting animation loop");
    loop {
        if let Some(gamepad) = gamepad.as_mut() {
            gamepad.poll(&mut controller, &mut looks);
        }

        let now = loop_clock.now_ms();
        if let Some(light) = light.as_mut() {
            // Bright light constricts the pupil
            light.read_damped(now, |value| controller.set_pupil(1.0 - value));
        }

        // Cycle through the looks periodically
        if now.wrapping_sub(last_switch_ms) >= EYE_DURATION_MS {
            last_switch_ms = now;
            let defs = looks.next();
            controller.update_definitions(defs);
            info!(look = defs[0].name, "switched look");
        }

        if !controller.render_frame() {
            debug!("display busy, frame dropped");
        }
        thread::sleep(FRAME_INTERVAL);
    }
}
