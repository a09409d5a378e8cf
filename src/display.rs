// Display backends. The rendering core only ever sees the `Display` trait;
// the concrete panel wiring lives here.

use std::sync::{Arc, Mutex};

use rpi_led_matrix::LedCanvas;
use thiserror::Error;

use crate::color;
use crate::{SCREEN_HEIGHT, SCREEN_WIDTH};

#[derive(Debug, Error)]
pub enum DisplayError {
    #[error("display commit failed: {0}")]
    CommitFailed(&'static str),
}

/// A 64x64 pixel sink for one eye. Colors are 16-bit RGB565 (panel drivers
/// that talk SPI byte-swap to big-endian on the wire).
///
/// `update` commits the frame; it may be asynchronous, in which case
/// `is_available` reports false until the commit lands. The render loop polls
/// `is_available` and skips the eye's tick instead of blocking.
pub trait Display {
    fn draw_pixel(&mut self, x: u32, y: u32, color565: u16);

    fn draw_fast_vline(&mut self, x: u32, y: u32, height: u32, color565: u16);

    fn update(&mut self) -> Result<(), DisplayError>;

    /// Whether the display can be drawn to right now.
    fn is_available(&self) -> bool;
}

/// One eye's window into the shared LED matrix canvas.
///
/// The panels are chained side by side, so each window is an X offset into
/// one wide canvas. The left eye's window is mirrored: the original rig
/// hardware-mirrors display 0 so the renderer needs only a single L-to-R
/// inner loop, and we reproduce that at the window level.
pub struct MatrixDisplay {
    canvas: Arc<Mutex<LedCanvas>>,
    x_offset: i32,
    mirror: bool,
}

impl MatrixDisplay {
    pub fn new(canvas: Arc<Mutex<LedCanvas>>, x_offset: i32, mirror: bool) -> Self {
        Self {
            canvas,
            x_offset,
            mirror,
        }
    }

    fn map_x(&self, x: u32) -> i32 {
        let x = if self.mirror { SCREEN_WIDTH - 1 - x } else { x };
        self.x_offset + x as i32
    }
}

impl Display for MatrixDisplay {
    fn draw_pixel(&mut self, x: u32, y: u32, color565: u16) {
        let color = color::to_led_color(color565);
        self.canvas
            .lock()
            .unwrap()
            .set(self.map_x(x), y as i32, &color);
    }

    fn draw_fast_vline(&mut self, x: u32, y: u32, height: u32, color565: u16) {
        let color = color::to_led_color(color565);
        let px = self.map_x(x);
        let mut canvas = self.canvas.lock().unwrap();
        for row in y..y + height {
            canvas.set(px, row as i32, &color);
        }
    }

    fn update(&mut self) -> Result<(), DisplayError> {
        // The matrix refreshes continuously from its canvas; writes above are
        // already live.
        Ok(())
    }

    fn is_available(&self) -> bool {
        true
    }
}

struct Frame {
    pixels: Vec<u16>,
    touched: Vec<bool>,
    ready: bool,
    fail_commits: bool,
    commits: u32,
}

/// An in-memory RGB565 framebuffer, for tests and headless runs. The
/// `FrameHandle` returned by [`FrameDisplay::handle`] stays valid after the
/// display has been moved into a controller, so the produced frame (and the
/// backpressure/commit behavior) can be inspected and scripted from outside.
pub struct FrameDisplay {
    frame: Arc<Mutex<Frame>>,
}

#[derive(Clone)]
pub struct FrameHandle {
    frame: Arc<Mutex<Frame>>,
}

impl FrameDisplay {
    pub fn new() -> Self {
        let len = (SCREEN_WIDTH * SCREEN_HEIGHT) as usize;
        Self {
            frame: Arc::new(Mutex::new(Frame {
                pixels: vec![0; len],
                touched: vec![false; len],
                ready: true,
                fail_commits: false,
                commits: 0,
            })),
        }
    }

    pub fn handle(&self) -> FrameHandle {
        FrameHandle {
            frame: Arc::clone(&self.frame),
        }
    }
}

impl Default for FrameDisplay {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for FrameDisplay {
    fn draw_pixel(&mut self, x: u32, y: u32, color565: u16) {
        let mut frame = self.frame.lock().unwrap();
        let idx = (y * SCREEN_WIDTH + x) as usize;
        frame.pixels[idx] = color565;
        frame.touched[idx] = true;
    }

    fn draw_fast_vline(&mut self, x: u32, y: u32, height: u32, color565: u16) {
        let mut frame = self.frame.lock().unwrap();
        for row in y..y + height {
            let idx = (row * SCREEN_WIDTH + x) as usize;
            frame.pixels[idx] = color565;
            frame.touched[idx] = true;
        }
    }

    fn update(&mut self) -> Result<(), DisplayError> {
        let mut frame = self.frame.lock().unwrap();
        frame.commits += 1;
        if frame.fail_commits {
            return Err(DisplayError::CommitFailed("injected failure"));
        }
        Ok(())
    }

    fn is_available(&self) -> bool {
        self.frame.lock().unwrap().ready
    }
}

impl FrameHandle {
    pub fn pixel(&self, x: u32, y: u32) -> u16 {
        self.frame.lock().unwrap().pixels[(y * SCREEN_WIDTH + x) as usize]
    }

    pub fn touched(&self, x: u32, y: u32) -> bool {
        self.frame.lock().unwrap().touched[(y * SCREEN_WIDTH + x) as usize]
    }

    pub fn touched_count(&self) -> usize {
        self.frame.lock().unwrap().touched.iter().filter(|&&t| t).count()
    }

    pub fn clear_touched(&self) {
        self.frame.lock().unwrap().touched.fill(false);
    }

    pub fn commits(&self) -> u32 {
        self.frame.lock().unwrap().commits
    }

    pub fn set_ready(&self, ready: bool) {
        self.frame.lock().unwrap().ready = ready;
    }

    pub fn set_fail_commits(&self, fail: bool) {
        self.frame.lock().unwrap().fail_commits = fail;
    }

    /// Count how many pixels currently show the given color.
    pub fn count_color(&self, color565: u16) -> usize {
        self.frame
            .lock()
            .unwrap()
            .pixels
            .iter()
            .filter(|&&p| p == color565)
            .count()
    }
}
