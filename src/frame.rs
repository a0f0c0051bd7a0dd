/// Timing of the frame being processed, supplied by the host loop.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrameTime {
    /// Seconds since an arbitrary, monotonic origin.
    pub now: f64,
    /// Frame-rate-scaled delta (1.0 at the target rate).
    pub dt: f32,
}

impl FrameTime {
    /// Explicit timing, mainly for tests and fixed-step hosts.
    pub fn new(now: f64, dt: f32) -> Self {
        FrameTime { now, dt }
    }

    /// Current macroquad time, with `dt` scaled so one frame at
    /// `target_fps` equals 1.0. Requires a live macroquad context.
    pub fn from_macroquad(target_fps: f32) -> Self {
        FrameTime {
            now: macroquad::time::get_time(),
            dt: macroquad::time::get_frame_time() * target_fps,
        }
    }
}
