//! Session countdown

/// Countdown clock driving the session and the difficulty time base
#[derive(Debug, Clone)]
pub struct SessionTimer {
    duration: f32,
    elapsed: f32,
    running: bool,
}

impl SessionTimer {
    pub fn new(duration: f32) -> Self {
        Self {
            duration,
            elapsed: 0.0,
            running: false,
        }
    }

    /// Restart from zero
    pub fn start(&mut self) {
        self.elapsed = 0.0;
        self.running = true;
    }

    /// Freeze at the current time
    pub fn stop(&mut self) {
        self.running = false;
    }

    /// Advance by `dt`. Returns true exactly once, on the tick time runs out.
    pub fn update(&mut self, dt: f32) -> bool {
        if !self.running {
            return false;
        }
        self.elapsed = (self.elapsed + dt).min(self.duration);
        if self.elapsed >= self.duration {
            self.running = false;
            return true;
        }
        false
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_expired(&self) -> bool {
        self.elapsed >= self.duration
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn remaining(&self) -> f32 {
        (self.duration - self.elapsed).max(0.0)
    }

    pub fn duration(&self) -> f32 {
        self.duration
    }
}
