//! The transition orchestrator: picks how a scene switch happens and runs it.
//!
//! Every [`ShowRequest`] takes exactly one of three paths:
//!
//! 1. **Direct swap**: the configured source/target pair (game → menu by
//!    default) switches instantly whatever duration was asked for.
//! 2. **Immediate**: no source, or the source is not visible: nothing to mask.
//! 3. **Animated**: a veil is created over the source and driven through
//!    `FadeIn → Opaque → FadeOut → Closed` by the [`Scheduler`].
//!
//! On every path the midpoint callback runs exactly once, before the target
//! becomes visible. Once an animated sequence has started, failures inside it
//! (callback errors or panics, surface errors) are logged and discarded so the
//! sequence always reaches `Closed` and the target is always shown.

use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};
use std::time::Duration;

use crate::config::{OverlapPolicy, TransitionSettings};
use crate::error::ShellError;

use super::registry::{SceneRegistry, SurfaceHost};
use super::scene::SceneId;
use super::scheduler::{Clock, Scheduler, Task, TransitionId};
use super::transition::{Fade, VeilEvent, VeilPhase, half_duration};
use super::veil::{Veil, VeilSpec};

/// Side effect run while the screen is fully masked (e.g. applying a new language).
pub type MidpointFn = Box<dyn FnOnce() -> anyhow::Result<()>>;

/// A request to make `target` the visible scene.
///
/// # Example
///
/// ```ignore
/// let request = ShowRequest::new(SceneId::MAIN_MENU)
///     .from(SceneId::LANGUAGE)
///     .duration(Duration::from_millis(400))
///     .on_midpoint(move || {
///         notifier.set_language(Language::Russian);
///         Ok(())
///     });
/// ```
pub struct ShowRequest {
    target: SceneId,
    source: Option<SceneId>,
    duration: Duration,
    on_midpoint: Option<MidpointFn>,
}

impl ShowRequest {
    pub fn new(target: SceneId) -> Self {
        Self {
            target,
            source: None,
            duration: Duration::ZERO,
            on_midpoint: None,
        }
    }

    /// The scene currently on screen, which the veil will cover.
    pub fn from(mut self, source: SceneId) -> Self {
        self.source = Some(source);
        self
    }

    /// Total transition time, split evenly between fade-in and fade-out.
    pub fn duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// Total transition time in milliseconds. Negative values count as zero.
    pub fn duration_ms(self, millis: i64) -> Self {
        self.duration(Duration::from_millis(millis.max(0) as u64))
    }

    pub fn on_midpoint<F>(mut self, callback: F) -> Self
    where
        F: FnOnce() -> anyhow::Result<()> + 'static,
    {
        self.on_midpoint = Some(Box::new(callback));
        self
    }

    pub fn target(&self) -> &SceneId {
        &self.target
    }

    pub fn source(&self) -> Option<&SceneId> {
        self.source.as_ref()
    }

    pub fn requested_duration(&self) -> Duration {
        self.duration
    }
}

impl std::fmt::Debug for ShowRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShowRequest")
            .field("target", &self.target)
            .field("source", &self.source)
            .field("duration", &self.duration)
            .field("on_midpoint", &self.on_midpoint.is_some())
            .finish()
    }
}

/// Which strategy [`TransitionOrchestrator::show`] took.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShowPath {
    /// The configured instant pair.
    Direct,
    /// No visible source; switched without a veil.
    Immediate,
    /// Veil sequence started; it finishes on later ticks.
    Animated(TransitionId),
    /// A veil was needed but the host could not create one; switched instantly.
    Degraded,
}

/// State of one animated transition.
struct VeilSequence {
    source: SceneId,
    target: SceneId,
    half: Duration,
    phase: VeilPhase,
    fade: Fade,
    veil: Veil,
    on_midpoint: Option<MidpointFn>,
}

impl VeilSequence {
    fn advance(&mut self, id: TransitionId, event: VeilEvent) -> bool {
        match self.phase.next(event) {
            Some(next) => {
                tracing::debug!(transition = %id, from = ?self.phase, to = ?next, "veil phase");
                self.phase = next;
                true
            }
            None => {
                tracing::warn!(transition = %id, phase = ?self.phase, ?event, "ignoring out-of-order veil event");
                false
            }
        }
    }
}

/// Sequences scene switches, with or without a veil.
///
/// The orchestrator borrows the [`SceneRegistry`] per call rather than owning
/// it, so the application root decides who else may touch the scenes. Call
/// [`tick`](Self::tick) from the UI thread whenever [`next_deadline`](Self::next_deadline)
/// passes (and every frame while [`is_animating`](Self::is_animating)).
pub struct TransitionOrchestrator {
    settings: TransitionSettings,
    clock: Box<dyn Clock>,
    scheduler: Scheduler,
    sequences: BTreeMap<TransitionId, VeilSequence>,
    next_id: u64,
}

impl TransitionOrchestrator {
    pub fn new(settings: TransitionSettings, clock: impl Clock + 'static) -> Self {
        Self {
            settings,
            clock: Box::new(clock),
            scheduler: Scheduler::new(),
            sequences: BTreeMap::new(),
            next_id: 0,
        }
    }

    pub fn settings(&self) -> &TransitionSettings {
        &self.settings
    }

    pub fn now(&self) -> Duration {
        self.clock.now()
    }

    /// Show `request.target`, choosing the direct, immediate, or animated path.
    ///
    /// Returns an error only for caller mistakes: a target or source that is not
    /// registered, the anchor as target, or an overlapping animated request under
    /// [`OverlapPolicy::Reject`]. Nothing is changed when an error is returned.
    pub fn show(
        &mut self,
        host: &mut dyn SurfaceHost,
        registry: &mut SceneRegistry,
        request: ShowRequest,
    ) -> Result<ShowPath, ShellError> {
        let ShowRequest {
            target,
            source,
            duration,
            on_midpoint,
        } = request;

        if target == SceneId::ANCHOR {
            tracing::error!("transition requested to the shell anchor");
            return Err(ShellError::AnchorNotShowable);
        }
        if !registry.contains(&target) {
            tracing::error!(%target, "transition requested to an unregistered scene");
            return Err(ShellError::UnknownScene(target));
        }
        if let Some(source) = &source {
            if !registry.contains(source) {
                tracing::error!(%source, "transition requested from an unregistered scene");
                return Err(ShellError::UnknownScene(source.clone()));
            }
        }

        let source = match source {
            Some(source) if self.is_direct_swap(&source, &target) => {
                tracing::debug!(%source, %target, "direct swap");
                swap_now(registry, Some(&source), &target, on_midpoint);
                return Ok(ShowPath::Direct);
            }
            Some(source) if registry.is_visible(&source) => source,
            _ => {
                tracing::debug!(%target, "immediate show");
                swap_now(registry, None, &target, on_midpoint);
                return Ok(ShowPath::Immediate);
            }
        };

        if self.settings.overlap == OverlapPolicy::Reject && !self.sequences.is_empty() {
            tracing::error!(%source, %target, "transition rejected: another is in flight");
            return Err(ShellError::TransitionInFlight);
        }

        let bounds = match registry.get(&source) {
            Some(scene) => scene.veil_bounds(),
            None => return Err(ShellError::UnknownScene(source)),
        };
        let spec = VeilSpec {
            owner: source.clone(),
            bounds,
        };
        let surface = match host.create_veil(&spec) {
            Ok(surface) => surface,
            Err(err) => {
                tracing::warn!(%source, %target, %err, "veil unavailable, switching without it");
                swap_now(registry, Some(&source), &target, on_midpoint);
                return Ok(ShowPath::Degraded);
            }
        };

        let id = TransitionId(self.next_id);
        self.next_id += 1;

        let now = self.clock.now();
        let half = half_duration(duration);
        let mut veil = Veil::new(spec, surface);
        veil.show();

        let mut sequence = VeilSequence {
            source,
            target,
            half,
            phase: VeilPhase::Idle,
            fade: Fade::new(0.0, 1.0, now, half, self.settings.easing),
            veil,
            on_midpoint,
        };
        sequence.advance(id, VeilEvent::Begin);
        tracing::debug!(
            transition = %id,
            source = %sequence.source,
            target = %sequence.target,
            ?half,
            "veiled transition started"
        );

        self.scheduler.schedule_at(
            sequence.fade.end(),
            Task {
                transition: id,
                event: VeilEvent::FadeInComplete,
            },
        );
        self.sequences.insert(id, sequence);

        Ok(ShowPath::Animated(id))
    }

    /// Fire every completion that is due and update veil opacities.
    ///
    /// Returns the number of completions handled.
    pub fn tick(&mut self, registry: &mut SceneRegistry) -> usize {
        let now = self.clock.now();
        let mut handled = 0;

        while let Some(task) = self.scheduler.pop_due(now) {
            self.complete(task, registry, now);
            handled += 1;
        }

        for sequence in self.sequences.values_mut() {
            if sequence.phase.is_animating() {
                let opacity = sequence.fade.sample(now);
                sequence.veil.set_opacity(opacity);
            }
        }

        handled
    }

    fn complete(&mut self, task: Task, registry: &mut SceneRegistry, now: Duration) {
        let id = task.transition;
        let Some(sequence) = self.sequences.get_mut(&id) else {
            tracing::warn!(transition = %id, "completion for unknown transition");
            return;
        };
        if !sequence.advance(id, task.event) {
            return;
        }

        match task.event {
            VeilEvent::FadeInComplete => {
                sequence.veil.set_opacity(1.0);

                run_midpoint(sequence.on_midpoint.take());
                if let Some(scene) = registry.get_mut(&sequence.source) {
                    if let Err(err) = scene.conceal() {
                        tracing::warn!(scene = %sequence.source, %err, "failed to hide source scene");
                    }
                }
                if let Some(scene) = registry.get_mut(&sequence.target) {
                    if let Err(err) = scene.present() {
                        tracing::warn!(scene = %sequence.target, %err, "failed to show target scene");
                    }
                }

                sequence.advance(id, VeilEvent::SwapComplete);
                sequence.fade = Fade::new(1.0, 0.0, now, sequence.half, self.settings.easing);
                self.scheduler.schedule_at(
                    sequence.fade.end(),
                    Task {
                        transition: id,
                        event: VeilEvent::FadeOutComplete,
                    },
                );
            }
            VeilEvent::FadeOutComplete => {
                sequence.veil.set_opacity(0.0);
                sequence.veil.close();
                tracing::debug!(transition = %id, "veiled transition finished");
                self.sequences.remove(&id);
            }
            VeilEvent::Begin | VeilEvent::SwapComplete => {}
        }
    }

    fn is_direct_swap(&self, source: &SceneId, target: &SceneId) -> bool {
        self.settings
            .direct_swap
            .as_ref()
            .is_some_and(|pair| &pair.from == source && &pair.to == target)
    }

    /// Earliest pending completion, on this orchestrator's clock.
    pub fn next_deadline(&self) -> Option<Duration> {
        self.scheduler.next_deadline()
    }

    /// Whether any veil is mid-fade and needs per-frame opacity updates.
    pub fn is_animating(&self) -> bool {
        self.sequences.values().any(|s| s.phase.is_animating())
    }

    /// Number of animated transitions that have not reached `Closed`.
    pub fn in_flight(&self) -> usize {
        self.sequences.len()
    }

    /// Number of veils that exist right now.
    pub fn live_veils(&self) -> usize {
        self.sequences
            .values()
            .filter(|s| !s.veil.is_closed())
            .count()
    }

    /// Phase of an in-flight transition; `None` once it has closed.
    pub fn phase(&self, id: TransitionId) -> Option<VeilPhase> {
        self.sequences.get(&id).map(|s| s.phase)
    }

    pub fn veil(&self, id: TransitionId) -> Option<&Veil> {
        self.sequences.get(&id).map(|s| &s.veil)
    }
}

/// Switch without a veil: midpoint, hide the source if visible, show or activate the target.
fn swap_now(
    registry: &mut SceneRegistry,
    source: Option<&SceneId>,
    target: &SceneId,
    on_midpoint: Option<MidpointFn>,
) {
    run_midpoint(on_midpoint);

    if let Some(source) = source {
        if let Some(scene) = registry.get_mut(source) {
            if let Err(err) = scene.conceal() {
                tracing::warn!(scene = %source, %err, "failed to hide source scene");
            }
        }
    }
    if let Some(scene) = registry.get_mut(target) {
        if let Err(err) = scene.present() {
            tracing::warn!(scene = %target, %err, "failed to show target scene");
        }
    }
}

/// Run the midpoint callback, discarding both errors and panics.
fn run_midpoint(callback: Option<MidpointFn>) {
    let Some(callback) = callback else {
        return;
    };
    match panic::catch_unwind(AssertUnwindSafe(callback)) {
        Ok(Ok(())) => {}
        Ok(Err(err)) => tracing::warn!(error = %err, "midpoint callback failed"),
        Err(_) => tracing::warn!("midpoint callback panicked"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bounds::Bounds;
    use crate::config::DirectSwap;
    use crate::headless::{HeadlessHost, HostEvent, Journal};
    use crate::scene::ManualClock;
    use proptest::prelude::*;
    use std::cell::Cell;
    use std::rc::Rc;

    const SCENES: [SceneId; 3] = [SceneId::MAIN_MENU, SceneId::LANGUAGE, SceneId::GAME];

    struct Rig {
        host: HeadlessHost,
        registry: SceneRegistry,
        clock: ManualClock,
        orchestrator: TransitionOrchestrator,
        journal: Journal,
    }

    impl Rig {
        fn new() -> Self {
            Self::with_settings(TransitionSettings::default())
        }

        fn with_settings(settings: TransitionSettings) -> Self {
            let mut host = HeadlessHost::new();
            let registry = SceneRegistry::init(&mut host, SCENES).unwrap();
            let clock = ManualClock::new();
            let orchestrator = TransitionOrchestrator::new(settings, clock.clone());
            let journal = host.journal();
            journal.clear();
            Self {
                host,
                registry,
                clock,
                orchestrator,
                journal,
            }
        }

        fn show(&mut self, request: ShowRequest) -> Result<ShowPath, ShellError> {
            self.orchestrator
                .show(&mut self.host, &mut self.registry, request)
        }

        fn advance_ms(&mut self, ms: u64) -> usize {
            self.clock.advance(Duration::from_millis(ms));
            self.orchestrator.tick(&mut self.registry)
        }

        fn run_to_idle(&mut self) {
            while let Some(deadline) = self.orchestrator.next_deadline() {
                if deadline > self.clock.now() {
                    self.clock.set(deadline);
                }
                self.orchestrator.tick(&mut self.registry);
            }
        }

        fn visible(&self, id: &SceneId) -> bool {
            self.registry.is_visible(id)
        }

        /// Make `id` the only visible scene without going through the orchestrator.
        fn start_on(&mut self, id: SceneId) {
            self.registry.get_mut(&id).unwrap().show().unwrap();
            self.journal.clear();
        }

        fn marker(&self, name: &'static str) -> impl FnOnce() -> anyhow::Result<()> + 'static {
            let journal = self.journal.clone();
            move || {
                journal.record(HostEvent::Marker(name));
                Ok(())
            }
        }

        fn index_of(&self, event: &HostEvent) -> usize {
            self.journal
                .position(|e| e == event)
                .unwrap_or_else(|| panic!("{event:?} not in journal"))
        }
    }

    #[test]
    fn immediate_when_no_source() {
        let mut rig = Rig::new();
        let midpoint = rig.marker("midpoint");

        let path = rig
            .show(ShowRequest::new(SceneId::MAIN_MENU).on_midpoint(midpoint))
            .unwrap();

        assert_eq!(path, ShowPath::Immediate);
        assert!(rig.visible(&SceneId::MAIN_MENU));
        assert_eq!(rig.journal.count(|e| *e == HostEvent::Marker("midpoint")), 1);
        assert!(
            rig.index_of(&HostEvent::Marker("midpoint"))
                < rig.index_of(&HostEvent::SceneShown(SceneId::MAIN_MENU))
        );
        assert_eq!(rig.host.veils_created(), 0);
    }

    #[test]
    fn immediate_when_source_is_hidden() {
        let mut rig = Rig::new();
        let path = rig
            .show(
                ShowRequest::new(SceneId::GAME)
                    .from(SceneId::LANGUAGE)
                    .duration_ms(400),
            )
            .unwrap();

        assert_eq!(path, ShowPath::Immediate);
        assert!(rig.visible(&SceneId::GAME));
        assert_eq!(rig.host.veils_created(), 0);
    }

    #[test]
    fn showing_a_visible_target_activates_it() {
        let mut rig = Rig::new();
        rig.start_on(SceneId::MAIN_MENU);

        rig.show(ShowRequest::new(SceneId::MAIN_MENU)).unwrap();

        assert_eq!(
            rig.journal.events(),
            vec![HostEvent::SceneActivated(SceneId::MAIN_MENU)]
        );
    }

    #[test]
    fn direct_swap_ignores_duration() {
        let mut rig = Rig::new();
        rig.start_on(SceneId::GAME);
        let midpoint = rig.marker("midpoint");

        let path = rig
            .show(
                ShowRequest::new(SceneId::MAIN_MENU)
                    .from(SceneId::GAME)
                    .duration(Duration::from_secs(5))
                    .on_midpoint(midpoint),
            )
            .unwrap();

        assert_eq!(path, ShowPath::Direct);
        assert!(!rig.visible(&SceneId::GAME));
        assert!(rig.visible(&SceneId::MAIN_MENU));
        assert_eq!(rig.host.veils_created(), 0);
        assert_eq!(rig.orchestrator.next_deadline(), None);
        assert_eq!(
            rig.journal.events(),
            vec![
                HostEvent::Marker("midpoint"),
                HostEvent::SceneHidden(SceneId::GAME),
                HostEvent::SceneShown(SceneId::MAIN_MENU),
            ]
        );
    }

    #[test]
    fn direct_swap_applies_only_to_the_configured_pair() {
        let mut rig = Rig::new();
        rig.start_on(SceneId::MAIN_MENU);

        let path = rig
            .show(
                ShowRequest::new(SceneId::GAME)
                    .from(SceneId::MAIN_MENU)
                    .duration_ms(400),
            )
            .unwrap();

        assert!(matches!(path, ShowPath::Animated(_)));
    }

    #[test]
    fn direct_swap_can_be_reconfigured() {
        let mut rig = Rig::with_settings(TransitionSettings {
            direct_swap: Some(DirectSwap {
                from: SceneId::LANGUAGE,
                to: SceneId::MAIN_MENU,
            }),
            ..Default::default()
        });
        rig.start_on(SceneId::LANGUAGE);

        let path = rig
            .show(
                ShowRequest::new(SceneId::MAIN_MENU)
                    .from(SceneId::LANGUAGE)
                    .duration_ms(400),
            )
            .unwrap();

        assert_eq!(path, ShowPath::Direct);
    }

    #[test]
    fn animated_sequence_is_ordered() {
        let mut rig = Rig::new();
        rig.start_on(SceneId::LANGUAGE);
        let midpoint = rig.marker("midpoint");

        let path = rig
            .show(
                ShowRequest::new(SceneId::MAIN_MENU)
                    .from(SceneId::LANGUAGE)
                    .duration_ms(400)
                    .on_midpoint(midpoint),
            )
            .unwrap();
        let ShowPath::Animated(id) = path else {
            panic!("expected animated path, got {path:?}");
        };

        assert_eq!(rig.orchestrator.phase(id), Some(VeilPhase::FadeIn));
        assert_eq!(rig.orchestrator.live_veils(), 1);
        assert!(rig.visible(&SceneId::LANGUAGE));
        assert!(!rig.visible(&SceneId::MAIN_MENU));

        rig.advance_ms(100);
        let half_way = rig.orchestrator.veil(id).unwrap().opacity();
        assert!((half_way - 0.5).abs() < 1e-6);
        assert!(rig.visible(&SceneId::LANGUAGE));

        assert_eq!(rig.advance_ms(100), 1);
        assert_eq!(rig.orchestrator.phase(id), Some(VeilPhase::FadeOut));
        assert!(!rig.visible(&SceneId::LANGUAGE));
        assert!(rig.visible(&SceneId::MAIN_MENU));

        rig.advance_ms(200);
        assert_eq!(rig.orchestrator.phase(id), None);
        assert_eq!(rig.orchestrator.live_veils(), 0);
        assert_eq!(rig.host.live_veils(), 0);

        let opaque = rig.index_of(&HostEvent::VeilOpacity(0, 1.0));
        let midpoint = rig.index_of(&HostEvent::Marker("midpoint"));
        let hidden = rig.index_of(&HostEvent::SceneHidden(SceneId::LANGUAGE));
        let shown = rig.index_of(&HostEvent::SceneShown(SceneId::MAIN_MENU));
        let closed = rig.index_of(&HostEvent::VeilClosed(0));
        let last_clear = rig
            .journal
            .events()
            .iter()
            .rposition(|e| *e == HostEvent::VeilOpacity(0, 0.0))
            .unwrap();

        assert!(opaque < midpoint);
        assert!(midpoint < hidden);
        assert!(hidden < shown);
        assert!(shown < last_clear);
        assert!(last_clear < closed);
    }

    #[test]
    fn veil_covers_source_bounds() {
        let mut rig = Rig::new();
        rig.start_on(SceneId::LANGUAGE);
        let live = Bounds::new(40.0, 30.0, 1024.0, 768.0);
        rig.host.scene(&SceneId::LANGUAGE).unwrap().set_bounds(live);

        rig.show(
            ShowRequest::new(SceneId::MAIN_MENU)
                .from(SceneId::LANGUAGE)
                .duration_ms(400),
        )
        .unwrap();

        assert_eq!(
            rig.journal.events()[0],
            HostEvent::VeilCreated {
                veil: 0,
                owner: SceneId::LANGUAGE,
                bounds: live,
            }
        );
    }

    #[test]
    fn veil_falls_back_to_restored_bounds() {
        let mut rig = Rig::new();
        rig.start_on(SceneId::LANGUAGE);
        let restored = Bounds::new(100.0, 100.0, 800.0, 600.0);
        let language = rig.host.scene(&SceneId::LANGUAGE).unwrap();
        language.set_bounds(Bounds::ZERO);
        language.set_restored_bounds(restored);

        rig.show(
            ShowRequest::new(SceneId::MAIN_MENU)
                .from(SceneId::LANGUAGE)
                .duration_ms(400),
        )
        .unwrap();

        assert!(matches!(
            &rig.journal.events()[0],
            HostEvent::VeilCreated { bounds, .. } if *bounds == restored
        ));
    }

    #[test]
    fn zero_duration_still_runs_every_phase() {
        let mut rig = Rig::new();
        rig.start_on(SceneId::MAIN_MENU);

        let ShowPath::Animated(id) = rig
            .show(ShowRequest::new(SceneId::GAME).from(SceneId::MAIN_MENU))
            .unwrap()
        else {
            panic!("zero duration must still animate");
        };

        assert_eq!(rig.advance_ms(0), 0);
        assert_eq!(rig.orchestrator.phase(id), Some(VeilPhase::FadeIn));

        assert_eq!(rig.advance_ms(1), 1);
        assert_eq!(rig.orchestrator.phase(id), Some(VeilPhase::FadeOut));
        assert!(rig.visible(&SceneId::GAME));

        assert_eq!(rig.advance_ms(1), 1);
        assert_eq!(rig.orchestrator.phase(id), None);
        assert_eq!(rig.host.live_veils(), 0);
    }

    #[test]
    fn negative_duration_counts_as_zero() {
        let request = ShowRequest::new(SceneId::GAME).duration_ms(-250);
        assert_eq!(request.requested_duration(), Duration::ZERO);
    }

    #[test]
    fn failing_midpoint_does_not_stop_the_sequence() {
        let mut rig = Rig::new();
        rig.start_on(SceneId::LANGUAGE);

        rig.show(
            ShowRequest::new(SceneId::MAIN_MENU)
                .from(SceneId::LANGUAGE)
                .duration_ms(400)
                .on_midpoint(|| anyhow::bail!("language table missing")),
        )
        .unwrap();
        rig.run_to_idle();

        assert!(rig.visible(&SceneId::MAIN_MENU));
        assert!(!rig.visible(&SceneId::LANGUAGE));
        assert_eq!(rig.orchestrator.live_veils(), 0);
        assert_eq!(rig.host.live_veils(), 0);
    }

    #[test]
    fn panicking_midpoint_does_not_stop_the_sequence() {
        let mut rig = Rig::new();
        rig.start_on(SceneId::LANGUAGE);

        rig.show(
            ShowRequest::new(SceneId::MAIN_MENU)
                .from(SceneId::LANGUAGE)
                .duration_ms(400)
                .on_midpoint(|| panic!("boom")),
        )
        .unwrap();
        rig.run_to_idle();

        assert!(rig.visible(&SceneId::MAIN_MENU));
        assert!(!rig.visible(&SceneId::LANGUAGE));
        assert_eq!(rig.host.live_veils(), 0);
    }

    #[test]
    fn failing_midpoint_on_immediate_path_still_shows_target() {
        let mut rig = Rig::new();
        let path = rig
            .show(ShowRequest::new(SceneId::MAIN_MENU).on_midpoint(|| anyhow::bail!("nope")))
            .unwrap();
        assert_eq!(path, ShowPath::Immediate);
        assert!(rig.visible(&SceneId::MAIN_MENU));
    }

    #[test]
    fn surface_failures_are_discarded() {
        let mut rig = Rig::new();
        rig.start_on(SceneId::LANGUAGE);
        rig.host.scene(&SceneId::LANGUAGE).unwrap().fail_hide(true);
        rig.host.fail_veil_close(true);

        rig.show(
            ShowRequest::new(SceneId::MAIN_MENU)
                .from(SceneId::LANGUAGE)
                .duration_ms(100),
        )
        .unwrap();
        rig.run_to_idle();

        assert!(rig.visible(&SceneId::MAIN_MENU));
        assert_eq!(rig.orchestrator.in_flight(), 0);
        assert_eq!(rig.orchestrator.live_veils(), 0);
    }

    #[test]
    fn failing_target_show_still_closes_the_veil() {
        let mut rig = Rig::new();
        rig.start_on(SceneId::LANGUAGE);
        rig.host.scene(&SceneId::MAIN_MENU).unwrap().fail_show(true);

        rig.show(
            ShowRequest::new(SceneId::MAIN_MENU)
                .from(SceneId::LANGUAGE)
                .duration_ms(100),
        )
        .unwrap();
        rig.run_to_idle();

        assert_eq!(rig.orchestrator.in_flight(), 0);
        assert_eq!(rig.host.live_veils(), 0);
    }

    #[test]
    fn panicking_visibility_hook_still_closes_the_veil() {
        let mut rig = Rig::with_settings(TransitionSettings {
            overlap: OverlapPolicy::Reject,
            ..Default::default()
        });
        rig.start_on(SceneId::LANGUAGE);
        rig.registry
            .scene_builder(&SceneId::MAIN_MENU)
            .unwrap()
            .on_shown(|| panic!("menu music missing"));

        let ShowPath::Animated(id) = rig
            .show(
                ShowRequest::new(SceneId::MAIN_MENU)
                    .from(SceneId::LANGUAGE)
                    .duration_ms(400),
            )
            .unwrap()
        else {
            panic!("visible source must animate");
        };

        assert_eq!(rig.advance_ms(200), 1);
        assert_eq!(rig.orchestrator.phase(id), Some(VeilPhase::FadeOut));
        assert!(rig.visible(&SceneId::MAIN_MENU));
        assert!(rig.orchestrator.next_deadline().is_some());

        rig.run_to_idle();
        assert_eq!(rig.orchestrator.in_flight(), 0);
        assert_eq!(rig.host.live_veils(), 0);

        let path = rig
            .show(
                ShowRequest::new(SceneId::LANGUAGE)
                    .from(SceneId::MAIN_MENU)
                    .duration_ms(400),
            )
            .unwrap();
        assert!(matches!(path, ShowPath::Animated(_)));
    }

    #[test]
    fn failing_activate_on_immediate_path_is_discarded() {
        let mut rig = Rig::new();
        rig.start_on(SceneId::MAIN_MENU);
        rig.host.scene(&SceneId::MAIN_MENU).unwrap().fail_activate(true);
        let midpoint = rig.marker("midpoint");

        let path = rig
            .show(ShowRequest::new(SceneId::MAIN_MENU).on_midpoint(midpoint))
            .unwrap();

        assert_eq!(path, ShowPath::Immediate);
        assert!(rig.visible(&SceneId::MAIN_MENU));
        assert_eq!(rig.journal.count(|e| *e == HostEvent::Marker("midpoint")), 1);
        assert_eq!(
            rig.journal
                .count(|e| *e == HostEvent::SceneActivated(SceneId::MAIN_MENU)),
            0
        );
    }

    #[test]
    fn failing_activate_on_animated_path_still_closes_the_veil() {
        let mut rig = Rig::new();
        rig.start_on(SceneId::MAIN_MENU);
        rig.start_on(SceneId::LANGUAGE);
        rig.host.scene(&SceneId::MAIN_MENU).unwrap().fail_activate(true);

        let ShowPath::Animated(id) = rig
            .show(
                ShowRequest::new(SceneId::MAIN_MENU)
                    .from(SceneId::LANGUAGE)
                    .duration_ms(0),
            )
            .unwrap()
        else {
            panic!("visible source must animate");
        };

        rig.advance_ms(1);
        rig.advance_ms(1);

        assert_eq!(rig.orchestrator.phase(id), None);
        assert_eq!(rig.orchestrator.in_flight(), 0);
        assert_eq!(rig.host.live_veils(), 0);
        assert!(rig.visible(&SceneId::MAIN_MENU));
        assert!(!rig.visible(&SceneId::LANGUAGE));
    }

    #[test]
    fn missing_veil_degrades_to_instant_switch() {
        let mut rig = Rig::new();
        rig.start_on(SceneId::LANGUAGE);
        rig.host.fail_veil_creation(true);
        let calls = Rc::new(Cell::new(0));
        let counter = calls.clone();

        let path = rig
            .show(
                ShowRequest::new(SceneId::MAIN_MENU)
                    .from(SceneId::LANGUAGE)
                    .duration_ms(400)
                    .on_midpoint(move || {
                        counter.set(counter.get() + 1);
                        Ok(())
                    }),
            )
            .unwrap();

        assert_eq!(path, ShowPath::Degraded);
        assert_eq!(calls.get(), 1);
        assert!(!rig.visible(&SceneId::LANGUAGE));
        assert!(rig.visible(&SceneId::MAIN_MENU));
        assert_eq!(rig.orchestrator.in_flight(), 0);
    }

    #[test]
    fn contract_violations_fail_without_side_effects() {
        let mut rig = Rig::new();
        let called = Rc::new(Cell::new(false));

        let flag = called.clone();
        let err = rig
            .show(ShowRequest::new(SceneId::new("Credits")).on_midpoint(move || {
                flag.set(true);
                Ok(())
            }))
            .unwrap_err();
        assert!(matches!(err, ShellError::UnknownScene(id) if id.as_str() == "Credits"));

        let err = rig.show(ShowRequest::new(SceneId::ANCHOR)).unwrap_err();
        assert!(matches!(err, ShellError::AnchorNotShowable));

        let err = rig
            .show(ShowRequest::new(SceneId::GAME).from(SceneId::new("Nowhere")))
            .unwrap_err();
        assert!(matches!(err, ShellError::UnknownScene(_)));

        assert!(!called.get());
        assert!(rig.journal.events().is_empty());
    }

    #[test]
    fn overlapping_requests_run_uncoordinated_by_default() {
        let mut rig = Rig::new();
        rig.start_on(SceneId::LANGUAGE);
        rig.registry.get_mut(&SceneId::GAME).unwrap().show().unwrap();

        rig.show(
            ShowRequest::new(SceneId::MAIN_MENU)
                .from(SceneId::LANGUAGE)
                .duration_ms(400),
        )
        .unwrap();
        rig.advance_ms(50);
        rig.show(
            ShowRequest::new(SceneId::MAIN_MENU)
                .from(SceneId::GAME)
                .duration_ms(0),
        )
        .unwrap();

        // game -> menu is the direct pair, so only one veil.
        assert_eq!(rig.orchestrator.live_veils(), 1);

        rig.show(
            ShowRequest::new(SceneId::GAME)
                .from(SceneId::LANGUAGE)
                .duration_ms(400),
        )
        .unwrap();
        assert_eq!(rig.orchestrator.live_veils(), 2);
        assert_eq!(rig.host.live_veils(), 2);

        rig.run_to_idle();
        assert_eq!(rig.orchestrator.live_veils(), 0);
        assert_eq!(rig.host.live_veils(), 0);
    }

    #[test]
    fn reject_policy_refuses_overlap() {
        let mut rig = Rig::with_settings(TransitionSettings {
            overlap: OverlapPolicy::Reject,
            ..Default::default()
        });
        rig.start_on(SceneId::LANGUAGE);

        rig.show(
            ShowRequest::new(SceneId::MAIN_MENU)
                .from(SceneId::LANGUAGE)
                .duration_ms(400),
        )
        .unwrap();
        let err = rig
            .show(
                ShowRequest::new(SceneId::GAME)
                    .from(SceneId::LANGUAGE)
                    .duration_ms(400),
            )
            .unwrap_err();
        assert!(matches!(err, ShellError::TransitionInFlight));

        rig.run_to_idle();
        let path = rig
            .show(
                ShowRequest::new(SceneId::GAME)
                    .from(SceneId::MAIN_MENU)
                    .duration_ms(400),
            )
            .unwrap();
        assert!(matches!(path, ShowPath::Animated(_)));
    }

    #[test]
    fn sequential_transitions_leave_no_veils() {
        let mut rig = Rig::new();
        rig.start_on(SceneId::MAIN_MENU);

        let mut current = SceneId::MAIN_MENU;
        for _ in 0..10 {
            let next = if current == SceneId::MAIN_MENU {
                SceneId::LANGUAGE
            } else {
                SceneId::MAIN_MENU
            };
            rig.show(
                ShowRequest::new(next.clone())
                    .from(current.clone())
                    .duration_ms(300),
            )
            .unwrap();
            rig.run_to_idle();
            current = next;
        }

        assert_eq!(rig.host.veils_created(), 10);
        assert_eq!(rig.host.live_veils(), 0);
        assert_eq!(rig.orchestrator.live_veils(), 0);
        assert!(rig.visible(&SceneId::MAIN_MENU));
        assert!(!rig.visible(&SceneId::LANGUAGE));
    }

    fn scene_strategy() -> impl Strategy<Value = SceneId> {
        prop::sample::select(SCENES.to_vec())
    }

    proptest! {
        #[test]
        fn every_request_runs_its_midpoint_once_and_leaks_nothing(
            steps in prop::collection::vec(
                (scene_strategy(), prop::option::of(scene_strategy()), 0u64..500, 0u64..300),
                1..20,
            )
        ) {
            let mut rig = Rig::new();
            let calls = Rc::new(Cell::new(0u32));
            let mut accepted = 0u32;

            for (target, source, duration, wait) in steps {
                let counter = calls.clone();
                let mut request = ShowRequest::new(target)
                    .duration(Duration::from_millis(duration))
                    .on_midpoint(move || {
                        counter.set(counter.get() + 1);
                        Ok(())
                    });
                if let Some(source) = source {
                    request = request.from(source);
                }
                rig.show(request).unwrap();
                accepted += 1;
                rig.advance_ms(wait);
            }
            rig.run_to_idle();

            prop_assert_eq!(calls.get(), accepted);
            prop_assert_eq!(rig.orchestrator.live_veils(), 0);
            prop_assert_eq!(rig.host.live_veils(), 0);
            prop_assert_eq!(rig.orchestrator.in_flight(), 0);
        }
    }
}
