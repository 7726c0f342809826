//! Easing, the veil fade primitive, and the veil phase state machine.

use std::time::Duration;

/// Curve applied to a veil's opacity between its start and end value.
///
/// Both halves of a veiled transition use the same curve, so `EaseIn` starts
/// the darkening and the clearing slowly alike.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Easing {
    /// Opacity changes at a constant rate.
    #[default]
    Linear,
    /// Quadratic: little change early in the fade.
    EaseIn,
    /// Quadratic: most of the change happens early.
    EaseOut,
    /// Quadratic on both ends, fastest at the half-way point.
    EaseInOut,
}

impl Easing {
    /// Map fade progress in `0.0..=1.0` to eased progress. Out-of-range input is clamped.
    pub fn apply(&self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::EaseIn => t * t,
            Easing::EaseOut => 1.0 - (1.0 - t) * (1.0 - t),
            Easing::EaseInOut => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
                }
            }
        }
    }
}

/// One opacity animation from `from` to `to` over `duration`, started at `start`.
#[derive(Clone, Copy, Debug)]
pub struct Fade {
    pub from: f32,
    pub to: f32,
    pub start: Duration,
    pub duration: Duration,
    pub easing: Easing,
}

impl Fade {
    pub fn new(from: f32, to: f32, start: Duration, duration: Duration, easing: Easing) -> Self {
        Self {
            from,
            to,
            start,
            duration,
            easing,
        }
    }

    /// Time at which the fade reaches `to`.
    pub fn end(&self) -> Duration {
        self.start.saturating_add(self.duration)
    }

    /// Opacity at clock time `now`. Holds `from` before the start and `to` after the end.
    pub fn sample(&self, now: Duration) -> f32 {
        let elapsed = now.saturating_sub(self.start);
        let raw = if self.duration.is_zero() {
            1.0
        } else {
            (elapsed.as_secs_f32() / self.duration.as_secs_f32()).clamp(0.0, 1.0)
        };
        let t = self.easing.apply(raw);
        self.from + (self.to - self.from) * t
    }
}

/// Phase of one veiled transition.
///
/// `Idle → FadeIn → Opaque → FadeOut → Closed`. The only way forward is
/// [`VeilPhase::next`], so phases cannot be skipped or revisited.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum VeilPhase {
    /// Request accepted, veil not yet created.
    Idle,
    /// Veil shown, opacity rising 0 → 1.
    FadeIn,
    /// Veil fully opaque: midpoint callback and scene swap happen here.
    Opaque,
    /// Opacity falling 1 → 0.
    FadeOut,
    /// Veil destroyed.
    Closed,
}

/// Events that drive a [`VeilPhase`] forward.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum VeilEvent {
    /// Veil created and shown.
    Begin,
    /// Fade-in animation finished.
    FadeInComplete,
    /// Midpoint callback and visibility swap done.
    SwapComplete,
    /// Fade-out animation finished.
    FadeOutComplete,
}

impl VeilPhase {
    /// Transition table. Returns `None` for an event that is not valid in this phase.
    pub fn next(self, event: VeilEvent) -> Option<VeilPhase> {
        use VeilEvent::*;
        use VeilPhase::*;

        match (self, event) {
            (Idle, Begin) => Some(FadeIn),
            (FadeIn, FadeInComplete) => Some(Opaque),
            (Opaque, SwapComplete) => Some(FadeOut),
            (FadeOut, FadeOutComplete) => Some(Closed),
            _ => None,
        }
    }

    /// Whether an opacity animation is running in this phase.
    pub fn is_animating(self) -> bool {
        matches!(self, VeilPhase::FadeIn | VeilPhase::FadeOut)
    }
}

/// Length of each half of a veiled transition.
///
/// The total is split evenly between fade-in and fade-out, with a floor of one
/// millisecond so a zero duration still runs every phase in order.
pub fn half_duration(total: Duration) -> Duration {
    const MIN_HALF: Duration = Duration::from_millis(1);
    (total / 2).max(MIN_HALF)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phases_advance_in_order() {
        let mut phase = VeilPhase::Idle;
        let events = [
            VeilEvent::Begin,
            VeilEvent::FadeInComplete,
            VeilEvent::SwapComplete,
            VeilEvent::FadeOutComplete,
        ];
        let mut seen = vec![phase];
        for event in events {
            phase = phase.next(event).unwrap();
            seen.push(phase);
        }
        assert_eq!(
            seen,
            vec![
                VeilPhase::Idle,
                VeilPhase::FadeIn,
                VeilPhase::Opaque,
                VeilPhase::FadeOut,
                VeilPhase::Closed,
            ]
        );
    }

    #[test]
    fn out_of_order_events_are_rejected() {
        assert_eq!(VeilPhase::Idle.next(VeilEvent::FadeOutComplete), None);
        assert_eq!(VeilPhase::FadeIn.next(VeilEvent::SwapComplete), None);
        assert_eq!(VeilPhase::Closed.next(VeilEvent::Begin), None);
    }

    #[test]
    fn half_duration_has_a_floor() {
        assert_eq!(half_duration(Duration::ZERO), Duration::from_millis(1));
        assert_eq!(half_duration(Duration::from_millis(1)), Duration::from_millis(1));
        assert_eq!(half_duration(Duration::from_millis(400)), Duration::from_millis(200));
        assert_eq!(half_duration(Duration::from_millis(401)), Duration::from_micros(200_500));
    }

    #[test]
    fn half_duration_keeps_long_durations_intact() {
        let week = Duration::from_secs(7 * 24 * 3600);
        assert_eq!(half_duration(week), Duration::from_secs(7 * 12 * 3600));
        assert_eq!(half_duration(Duration::MAX), Duration::MAX / 2);
    }

    #[test]
    fn fade_samples_endpoints_and_midpoint() {
        let fade = Fade::new(
            0.0,
            1.0,
            Duration::from_millis(100),
            Duration::from_millis(200),
            Easing::Linear,
        );
        assert_eq!(fade.sample(Duration::ZERO), 0.0);
        assert!((fade.sample(Duration::from_millis(200)) - 0.5).abs() < 1e-6);
        assert_eq!(fade.sample(Duration::from_millis(300)), 1.0);
        assert_eq!(fade.sample(Duration::from_secs(10)), 1.0);
        assert_eq!(fade.end(), Duration::from_millis(300));
    }

    #[test]
    fn fade_out_runs_backwards() {
        let fade = Fade::new(1.0, 0.0, Duration::ZERO, Duration::from_millis(10), Easing::EaseInOut);
        assert_eq!(fade.sample(Duration::ZERO), 1.0);
        assert_eq!(fade.sample(Duration::from_millis(10)), 0.0);
    }

    #[test]
    fn easing_endpoints() {
        for easing in [Easing::Linear, Easing::EaseIn, Easing::EaseOut, Easing::EaseInOut] {
            assert_eq!(easing.apply(0.0), 0.0);
            assert_eq!(easing.apply(1.0), 1.0);
        }
    }

    #[test]
    fn ease_in_starts_both_fades_slowly() {
        let ms = Duration::from_millis;
        let darken = Fade::new(0.0, 1.0, Duration::ZERO, ms(200), Easing::EaseIn);
        let clear = Fade::new(1.0, 0.0, Duration::ZERO, ms(200), Easing::EaseIn);

        assert!(darken.sample(ms(50)) < 0.1);
        assert!(clear.sample(ms(50)) > 0.9);
        assert!((darken.sample(ms(100)) - 0.25).abs() < 1e-6);
    }
}
