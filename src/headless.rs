//! In-memory window backend.
//!
//! [`HeadlessHost`] creates scenes and veils that only exist as state, and
//! writes every visible effect to a shared [`Journal`]. It runs the whole
//! shell without a display and lets tests inject platform failures.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use crate::bounds::Bounds;
use crate::error::SurfaceError;
use crate::scene::{SceneId, SceneSpec, SceneSurface, SurfaceHost, VeilSpec, VeilSurface};

/// One observable effect on a headless surface.
#[derive(Clone, Debug, PartialEq)]
pub enum HostEvent {
    SceneCreated(SceneId),
    SceneShown(SceneId),
    SceneHidden(SceneId),
    SceneActivated(SceneId),
    VeilCreated {
        veil: u32,
        owner: SceneId,
        bounds: Bounds,
    },
    VeilShown(u32),
    VeilOpacity(u32, f32),
    VeilClosed(u32),
    /// Free-form entry, e.g. from a midpoint callback.
    Marker(&'static str),
}

/// Shared, append-only event log. Clones write to the same log.
#[derive(Clone, Debug, Default)]
pub struct Journal(Rc<RefCell<Vec<HostEvent>>>);

impl Journal {
    pub fn record(&self, event: HostEvent) {
        self.0.borrow_mut().push(event);
    }

    pub fn events(&self) -> Vec<HostEvent> {
        self.0.borrow().clone()
    }

    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }

    pub fn position(&self, mut predicate: impl FnMut(&HostEvent) -> bool) -> Option<usize> {
        self.0.borrow().iter().position(|e| predicate(e))
    }

    pub fn count(&self, mut predicate: impl FnMut(&HostEvent) -> bool) -> usize {
        self.0.borrow().iter().filter(|e| predicate(e)).count()
    }
}

#[derive(Debug)]
struct SceneState {
    spec: SceneSpec,
    visible: Cell<bool>,
    bounds: Cell<Bounds>,
    restored: Cell<Bounds>,
    fail_show: Cell<bool>,
    fail_hide: Cell<bool>,
    fail_activate: Cell<bool>,
}

/// Handle to a headless scene. The registry holds one clone, tests may hold others.
#[derive(Clone, Debug)]
pub struct HeadlessScene {
    state: Rc<SceneState>,
    journal: Journal,
}

impl HeadlessScene {
    pub fn spec(&self) -> &SceneSpec {
        &self.state.spec
    }

    pub fn set_bounds(&self, bounds: Bounds) {
        self.state.bounds.set(bounds);
    }

    pub fn set_restored_bounds(&self, bounds: Bounds) {
        self.state.restored.set(bounds);
    }

    pub fn fail_show(&self, fail: bool) {
        self.state.fail_show.set(fail);
    }

    pub fn fail_hide(&self, fail: bool) {
        self.state.fail_hide.set(fail);
    }

    pub fn fail_activate(&self, fail: bool) {
        self.state.fail_activate.set(fail);
    }

    fn injected(&self, flag: &Cell<bool>, what: &str) -> Result<(), SurfaceError> {
        if flag.get() {
            Err(SurfaceError::Platform(format!(
                "injected {what} failure on {}",
                self.state.spec.id
            )))
        } else {
            Ok(())
        }
    }
}

impl SceneSurface for HeadlessScene {
    fn show(&mut self) -> Result<(), SurfaceError> {
        self.injected(&self.state.fail_show, "show")?;
        self.state.visible.set(true);
        self.journal
            .record(HostEvent::SceneShown(self.state.spec.id.clone()));
        Ok(())
    }

    fn hide(&mut self) -> Result<(), SurfaceError> {
        self.injected(&self.state.fail_hide, "hide")?;
        self.state.visible.set(false);
        self.journal
            .record(HostEvent::SceneHidden(self.state.spec.id.clone()));
        Ok(())
    }

    fn activate(&mut self) -> Result<(), SurfaceError> {
        self.injected(&self.state.fail_activate, "activate")?;
        self.journal
            .record(HostEvent::SceneActivated(self.state.spec.id.clone()));
        Ok(())
    }

    fn is_visible(&self) -> bool {
        self.state.visible.get()
    }

    fn bounds(&self) -> Bounds {
        self.state.bounds.get()
    }

    fn restored_bounds(&self) -> Bounds {
        self.state.restored.get()
    }
}

struct HeadlessVeil {
    index: u32,
    journal: Journal,
    live: Rc<Cell<usize>>,
    fail_close: bool,
}

impl VeilSurface for HeadlessVeil {
    fn show(&mut self) -> Result<(), SurfaceError> {
        self.journal.record(HostEvent::VeilShown(self.index));
        Ok(())
    }

    fn set_opacity(&mut self, opacity: f32) -> Result<(), SurfaceError> {
        self.journal
            .record(HostEvent::VeilOpacity(self.index, opacity));
        Ok(())
    }

    fn close(&mut self) -> Result<(), SurfaceError> {
        self.live.set(self.live.get().saturating_sub(1));
        self.journal.record(HostEvent::VeilClosed(self.index));
        if self.fail_close {
            Err(SurfaceError::Platform("injected veil close failure".into()))
        } else {
            Ok(())
        }
    }
}

/// [`SurfaceHost`] that keeps everything in memory.
pub struct HeadlessHost {
    journal: Journal,
    scenes: HashMap<SceneId, HeadlessScene>,
    default_bounds: Bounds,
    veils_created: u32,
    live_veils: Rc<Cell<usize>>,
    fail_veil_creation: bool,
    fail_veil_close: bool,
}

impl Default for HeadlessHost {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessHost {
    pub fn new() -> Self {
        Self::with_bounds(Bounds::new(0.0, 0.0, 1000.0, 800.0))
    }

    /// Content scenes start with `bounds` as both live and restored rectangle.
    pub fn with_bounds(bounds: Bounds) -> Self {
        Self {
            journal: Journal::default(),
            scenes: HashMap::new(),
            default_bounds: bounds,
            veils_created: 0,
            live_veils: Rc::new(Cell::new(0)),
            fail_veil_creation: false,
            fail_veil_close: false,
        }
    }

    pub fn journal(&self) -> Journal {
        self.journal.clone()
    }

    pub fn scene(&self, id: &SceneId) -> Option<HeadlessScene> {
        self.scenes.get(id).cloned()
    }

    pub fn veils_created(&self) -> usize {
        self.veils_created as usize
    }

    /// Veils created and not yet closed.
    pub fn live_veils(&self) -> usize {
        self.live_veils.get()
    }

    pub fn fail_veil_creation(&mut self, fail: bool) {
        self.fail_veil_creation = fail;
    }

    pub fn fail_veil_close(&mut self, fail: bool) {
        self.fail_veil_close = fail;
    }
}

impl SurfaceHost for HeadlessHost {
    fn create_scene(&mut self, spec: &SceneSpec) -> Result<Box<dyn SceneSurface>, SurfaceError> {
        // The anchor is parked: shown, but with no area on screen.
        let bounds = if spec.is_anchor() {
            Bounds::ZERO
        } else {
            self.default_bounds
        };
        let scene = HeadlessScene {
            state: Rc::new(SceneState {
                spec: spec.clone(),
                visible: Cell::new(false),
                bounds: Cell::new(bounds),
                restored: Cell::new(bounds),
                fail_show: Cell::new(false),
                fail_hide: Cell::new(false),
                fail_activate: Cell::new(false),
            }),
            journal: self.journal.clone(),
        };
        self.scenes.insert(spec.id.clone(), scene.clone());
        self.journal.record(HostEvent::SceneCreated(spec.id.clone()));
        Ok(Box::new(scene))
    }

    fn create_veil(&mut self, spec: &VeilSpec) -> Result<Box<dyn VeilSurface>, SurfaceError> {
        if self.fail_veil_creation {
            return Err(SurfaceError::Platform("injected veil creation failure".into()));
        }
        let index = self.veils_created;
        self.veils_created += 1;
        self.live_veils.set(self.live_veils.get() + 1);
        self.journal.record(HostEvent::VeilCreated {
            veil: index,
            owner: spec.owner.clone(),
            bounds: spec.bounds,
        });
        Ok(Box::new(HeadlessVeil {
            index,
            journal: self.journal.clone(),
            live: self.live_veils.clone(),
            fail_close: self.fail_veil_close,
        }))
    }
}
