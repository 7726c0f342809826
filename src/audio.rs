//! Audio capability used by scenes.
//!
//! Playback is fire-and-forget: nothing returned here is consumed by the shell.
//! Decoding is out of scope, so the crate only ships [`LogAudio`].

/// Short one-shot sounds played by the board scene.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SoundEffect {
    Check,
    Capture,
    Move,
    Castle,
    Promote,
}

impl SoundEffect {
    pub const ALL: [SoundEffect; 5] = [
        SoundEffect::Check,
        SoundEffect::Capture,
        SoundEffect::Move,
        SoundEffect::Castle,
        SoundEffect::Promote,
    ];

    pub fn name(self) -> &'static str {
        match self {
            SoundEffect::Check => "check",
            SoundEffect::Capture => "capture",
            SoundEffect::Move => "move",
            SoundEffect::Castle => "castle",
            SoundEffect::Promote => "promote",
        }
    }

    /// Look up an effect by name. Unknown names yield `None` and are not played.
    pub fn from_name(name: &str) -> Option<SoundEffect> {
        Self::ALL.into_iter().find(|effect| effect.name() == name)
    }
}

/// Clamp a volume to `0.0..=1.0`; NaN becomes silence.
pub fn clamp_volume(volume: f32) -> f32 {
    if volume.is_nan() {
        0.0
    } else {
        volume.clamp(0.0, 1.0)
    }
}

pub trait AudioSink {
    fn play_effect(&mut self, effect: SoundEffect);

    /// Start the menu loop from the beginning, restarting it if already playing.
    fn play_loop(&mut self);

    fn stop(&mut self);

    /// Set the volume for the loop and future effects. Implementations clamp.
    fn set_volume(&mut self, volume: f32);

    fn volume(&self) -> f32;
}

/// Sink that only reports what it would play through `tracing`.
#[derive(Debug)]
pub struct LogAudio {
    volume: f32,
    looping: bool,
}

impl Default for LogAudio {
    fn default() -> Self {
        Self {
            volume: 1.0,
            looping: false,
        }
    }
}

impl LogAudio {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_looping(&self) -> bool {
        self.looping
    }
}

impl AudioSink for LogAudio {
    fn play_effect(&mut self, effect: SoundEffect) {
        tracing::debug!(effect = effect.name(), volume = self.volume, "play effect");
    }

    fn play_loop(&mut self) {
        self.stop();
        self.looping = true;
        tracing::debug!(volume = self.volume, "menu loop started");
    }

    fn stop(&mut self) {
        if self.looping {
            tracing::debug!("menu loop stopped");
        }
        self.looping = false;
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = clamp_volume(volume);
    }

    fn volume(&self) -> f32 {
        self.volume
    }
}
