//! Scene identifiers, the scene surface contract, and the preloaded scene wrapper.

use std::borrow::Cow;
use std::panic::{self, AssertUnwindSafe};

use crate::bounds::Bounds;
use crate::error::SurfaceError;

/// Stable logical name of a scene.
///
/// Scene IDs identify the preloaded scenes inside a [`SceneRegistry`](super::SceneRegistry)
/// and are what callers pass to [`ShowRequest`](super::ShowRequest).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SceneId(Cow<'static, str>);

impl SceneId {
    /// The invisible scene that owns the task-switcher entry.
    pub const ANCHOR: SceneId = SceneId(Cow::Borrowed("Shell"));
    pub const MAIN_MENU: SceneId = SceneId(Cow::Borrowed("MainMenu"));
    pub const LANGUAGE: SceneId = SceneId(Cow::Borrowed("Language"));
    pub const GAME: SceneId = SceneId(Cow::Borrowed("Game"));

    /// Create a new scene ID from a string.
    pub fn new(name: impl Into<String>) -> Self {
        Self(Cow::Owned(name.into()))
    }

    /// Get the scene ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SceneId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for SceneId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for SceneId {
    fn from(s: String) -> Self {
        Self(Cow::Owned(s))
    }
}

/// What the shell needs from a full-screen surface.
///
/// Implemented by the window backends ([`WindowScene`](crate::desktop::WindowScene),
/// [`HeadlessScene`](crate::headless::HeadlessScene)). Every mutating call may
/// fail with a transient [`SurfaceError`].
pub trait SceneSurface {
    fn show(&mut self) -> Result<(), SurfaceError>;

    fn hide(&mut self) -> Result<(), SurfaceError>;

    /// Bring an already visible surface to the front and give it focus.
    fn activate(&mut self) -> Result<(), SurfaceError>;

    fn is_visible(&self) -> bool;

    /// Current on-screen rectangle. May be degenerate (minimized, never laid out).
    fn bounds(&self) -> Bounds;

    /// Last rectangle the surface had while in its normal (restored) state.
    fn restored_bounds(&self) -> Bounds;

    /// Repaint the surface contents. Backends without content ignore this.
    fn redraw(&mut self) {}

    /// React to a size change reported by the platform.
    fn resized(&mut self, _width: u32, _height: u32) {}
}

/// A preloaded scene: identity, owner, surface, and visibility hooks.
///
/// Scenes are created once by the [`SceneRegistry`](super::SceneRegistry) and never
/// destroyed. Visibility only changes through [`show`](Self::show),
/// [`hide`](Self::hide), and [`activate`](Self::activate).
pub struct Scene {
    /// Unique identifier for this scene.
    pub id: SceneId,

    /// The scene that owns this one (the anchor), fixed at creation.
    owner: Option<SceneId>,

    surface: Box<dyn SceneSurface>,

    /// Optional callback after this scene became visible.
    pub(crate) on_shown: Option<Box<dyn FnMut()>>,

    /// Optional callback after this scene was hidden.
    pub(crate) on_hidden: Option<Box<dyn FnMut()>>,
}

impl Scene {
    pub(crate) fn new(id: SceneId, owner: Option<SceneId>, surface: Box<dyn SceneSurface>) -> Self {
        Self {
            id,
            owner,
            surface,
            on_shown: None,
            on_hidden: None,
        }
    }

    pub fn owner(&self) -> Option<&SceneId> {
        self.owner.as_ref()
    }

    pub fn is_visible(&self) -> bool {
        self.surface.is_visible()
    }

    /// Show the surface, then run the `on_shown` hook. A panicking hook is logged and discarded.
    pub fn show(&mut self) -> Result<(), SurfaceError> {
        self.surface.show()?;
        run_hook(&self.id, "on_shown", self.on_shown.as_mut());
        Ok(())
    }

    /// Hide the surface, then run the `on_hidden` hook. A panicking hook is logged and discarded.
    pub fn hide(&mut self) -> Result<(), SurfaceError> {
        self.surface.hide()?;
        run_hook(&self.id, "on_hidden", self.on_hidden.as_mut());
        Ok(())
    }

    pub fn activate(&mut self) -> Result<(), SurfaceError> {
        self.surface.activate()
    }

    /// Show the scene, or activate it if it is already visible. Never both.
    pub fn present(&mut self) -> Result<(), SurfaceError> {
        if self.is_visible() {
            self.activate()
        } else {
            self.show()
        }
    }

    /// Hide the scene only if it is currently visible.
    pub fn conceal(&mut self) -> Result<(), SurfaceError> {
        if self.is_visible() { self.hide() } else { Ok(()) }
    }

    /// Where a veil covering this scene should go: the live rectangle, or the
    /// last restored one when the live rectangle is degenerate.
    pub fn veil_bounds(&self) -> Bounds {
        self.surface.bounds().or_fallback(self.surface.restored_bounds())
    }

    pub fn surface_mut(&mut self) -> &mut dyn SceneSurface {
        self.surface.as_mut()
    }
}

fn run_hook(scene: &SceneId, name: &str, hook: Option<&mut Box<dyn FnMut()>>) {
    let Some(hook) = hook else {
        return;
    };
    if panic::catch_unwind(AssertUnwindSafe(|| hook())).is_err() {
        tracing::warn!(%scene, hook = name, "visibility hook panicked");
    }
}

impl std::fmt::Debug for Scene {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scene")
            .field("id", &self.id)
            .field("owner", &self.owner)
            .field("visible", &self.is_visible())
            .finish()
    }
}
