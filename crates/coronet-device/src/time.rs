use std::time::Instant;

/// Upper bound applied to per-frame delta time. A frame that took longer
/// (debugger stop, host suspended the process) lands as one clamped step
/// instead of a single giant one.
pub const MAX_DT_SEC: f32 = 0.25;

/// Per-frame timing snapshot handed to the game.
#[derive(Debug, Clone, Copy)]
pub struct FrameTime {
    /// Delta time (sec) of the current frame, clamped to [`MAX_DT_SEC`].
    pub dt_sec: f32,

    /// Absolute time (sec) since the device booted, unclamped.
    pub t_sec: f64,

    /// Index of the current frame, starting at 0.
    pub frame_index: u64,
}

/// Monotonic frame clock. `tick` measures the gap since the previous tick;
/// the frame index advances separately so it counts completed frames.
pub(crate) struct FrameClock {
    last: Instant,
    time: FrameTime,
}

impl FrameClock {
    pub(crate) fn new() -> Self {
        Self {
            last: Instant::now(),
            time: FrameTime {
                dt_sec: 0.0,
                t_sec: 0.0,
                frame_index: 0,
            },
        }
    }

    pub(crate) fn tick(&mut self) -> FrameTime {
        let now = Instant::now();
        let raw = now.duration_since(self.last);
        self.last = now;

        self.time.dt_sec = raw.as_secs_f32().min(MAX_DT_SEC);
        self.time.t_sec += raw.as_secs_f64();
        self.time
    }

    pub(crate) fn advance_frame(&mut self) {
        self.time.frame_index += 1;
    }

    #[inline]
    pub(crate) fn time(&self) -> FrameTime {
        self.time
    }
}
