//! Shell configuration.

use std::time::Duration;

use crate::scene::{Easing, SceneId};

/// Default total duration of a veiled transition (half fade-in, half fade-out).
pub const DEFAULT_TRANSITION_DURATION: Duration = Duration::from_millis(400);

/// What to do when an animated transition is requested while another is still running.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OverlapPolicy {
    /// Start another independent veil sequence. Sequences are not coordinated,
    /// so veils may overlap and visibility swaps may interleave.
    #[default]
    Allow,
    /// Refuse the new request with [`ShellError::TransitionInFlight`](crate::ShellError::TransitionInFlight).
    Reject,
}

/// A source/target pair that always switches instantly, ignoring the requested duration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DirectSwap {
    pub from: SceneId,
    pub to: SceneId,
}

/// Settings consumed by the [`TransitionOrchestrator`](crate::scene::TransitionOrchestrator).
#[derive(Clone, Debug)]
pub struct TransitionSettings {
    /// Curve applied to both veil fades.
    pub easing: Easing,
    /// Behavior for overlapping animated requests.
    pub overlap: OverlapPolicy,
    /// The one pair that skips the veil entirely.
    pub direct_swap: Option<DirectSwap>,
}

impl Default for TransitionSettings {
    fn default() -> Self {
        Self {
            easing: Easing::Linear,
            overlap: OverlapPolicy::Allow,
            direct_swap: Some(DirectSwap {
                from: SceneId::GAME,
                to: SceneId::MAIN_MENU,
            }),
        }
    }
}

/// Configuration for the desktop shell.
pub struct ShellConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    /// Scenes preloaded at startup, in creation order.
    pub scenes: Vec<SceneId>,
    /// Duration used by callers that want "the usual" fade.
    pub transition_duration: Duration,
    pub transitions: TransitionSettings,
    /// `tracing-subscriber` filter used when `RUST_LOG` is unset.
    pub log_filter: String,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            title: "Chess".to_string(),
            width: 1000,
            height: 800,
            scenes: vec![SceneId::MAIN_MENU, SceneId::LANGUAGE, SceneId::GAME],
            transition_duration: DEFAULT_TRANSITION_DURATION,
            transitions: TransitionSettings::default(),
            log_filter: "chess_shell=info".to_string(),
        }
    }
}

impl ShellConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Replace the preloaded scene set.
    pub fn scenes(mut self, scenes: impl IntoIterator<Item = SceneId>) -> Self {
        self.scenes = scenes.into_iter().collect();
        self
    }

    pub fn transition_duration(mut self, duration: Duration) -> Self {
        self.transition_duration = duration;
        self
    }

    pub fn easing(mut self, easing: Easing) -> Self {
        self.transitions.easing = easing;
        self
    }

    pub fn overlap(mut self, overlap: OverlapPolicy) -> Self {
        self.transitions.overlap = overlap;
        self
    }

    /// Set (or clear with `None`) the pair that always switches instantly.
    pub fn direct_swap(mut self, pair: Option<(SceneId, SceneId)>) -> Self {
        self.transitions.direct_swap = pair.map(|(from, to)| DirectSwap { from, to });
        self
    }

    pub fn log_filter(mut self, filter: impl Into<String>) -> Self {
        self.log_filter = filter.into();
        self
    }
}
