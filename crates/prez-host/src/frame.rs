//! Frame Driver bookkeeping.
//!
//! The guest opts in with `host.start_loop`; from then on every session tick
//! calls its frame export once.  There is no way to stop the loop.

#[derive(Debug, Default)]
pub struct FrameDriver {
    running: bool,
    frames: u64,
}

impl FrameDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self) {
        if self.running {
            tracing::debug!(target: "prez::session", "frame loop already running");
        }
        self.running = true;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Frames delivered so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn record_frame(&mut self) {
        self.frames += 1;
    }
}
