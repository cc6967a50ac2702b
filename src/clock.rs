use crate::protocol::ClientCommand;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlaybackState {
    Paused,
    /// `anchor_ms` is the wall-clock reading of the previous tick, absent
    /// until the first tick after `play`.
    Playing { anchor_ms: Option<i64> },
}

#[derive(Debug, Clone)]
pub struct PlaybackClock {
    current_ms: f64,
    speed_scale: f64,
    state: PlaybackState,
}

impl PlaybackClock {
    pub fn new(initial_ms: i64) -> Self {
        Self {
            current_ms: initial_ms as f64,
            speed_scale: 1.0,
            state: PlaybackState::Paused,
        }
    }

    pub fn current_time_ms(&self) -> i64 {
        self.current_ms.round() as i64
    }

    pub fn speed_scale(&self) -> f64 {
        self.speed_scale
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        matches!(self.state, PlaybackState::Playing { .. })
    }

    /// Starts playback. The next tick only sets the anchor, so time spent
    /// paused is never added. Already playing: no change.
    pub fn play(&mut self) {
        if !self.is_playing() {
            self.state = PlaybackState::Playing { anchor_ms: None };
        }
    }

    pub fn pause(&mut self) {
        self.state = PlaybackState::Paused;
    }

    pub fn toggle(&mut self) {
        if self.is_playing() {
            self.pause();
        } else {
            self.play();
        }
    }

    pub fn seek(&mut self, target_ms: i64) {
        self.current_ms = target_ms as f64;
    }

    /// Multiplier for elapsed wall-clock time. Zero freezes playback and
    /// negative values run it backwards.
    pub fn set_speed_scale(&mut self, scale: f64) {
        self.speed_scale = scale;
    }

    /// Advances by `(now - anchor) * speed_scale` while playing and returns
    /// the resulting time. Paused ticks change nothing.
    pub fn tick(&mut self, now_wall_ms: i64) -> i64 {
        if let PlaybackState::Playing { anchor_ms } = self.state {
            if let Some(anchor) = anchor_ms {
                self.current_ms += (now_wall_ms - anchor) as f64 * self.speed_scale;
            }
            self.state = PlaybackState::Playing {
                anchor_ms: Some(now_wall_ms),
            };
        }
        self.current_time_ms()
    }

    pub fn apply(&mut self, command: ClientCommand) {
        match command {
            ClientCommand::Play => self.play(),
            ClientCommand::Pause => self.pause(),
            ClientCommand::Seek(ms) => self.seek(ms),
            ClientCommand::SetSpeedScale(scale) => self.set_speed_scale(scale),
            ClientCommand::Toggle => self.toggle(),
        }
    }
}
