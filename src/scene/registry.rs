//! The scene registry and the shell anchor.
//!
//! The registry builds every scene once at startup and keeps it for the life
//! of the process. It holds no transition logic; the
//! [`TransitionOrchestrator`](super::TransitionOrchestrator) borrows it for each
//! request.

use std::collections::HashMap;

use crate::error::{ShellError, SurfaceError};

use super::scene::{Scene, SceneId, SceneSurface};
use super::veil::{VeilSpec, VeilSurface};

/// Parameters for creating a scene surface.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SceneSpec {
    pub id: SceneId,
    /// `None` only for the anchor.
    pub owner: Option<SceneId>,
    /// Only the anchor appears in the task switcher.
    pub in_task_switcher: bool,
}

impl SceneSpec {
    fn anchor() -> Self {
        Self {
            id: SceneId::ANCHOR,
            owner: None,
            in_task_switcher: true,
        }
    }

    fn owned_by_anchor(id: SceneId) -> Self {
        Self {
            id,
            owner: Some(SceneId::ANCHOR),
            in_task_switcher: false,
        }
    }

    /// The anchor must be shown somewhere the user cannot see it
    /// (zero-size or off screen) so the platform keeps its task-switcher entry.
    pub fn is_anchor(&self) -> bool {
        self.owner.is_none()
    }
}

/// Factory for the surfaces a window backend provides.
pub trait SurfaceHost {
    fn create_scene(&mut self, spec: &SceneSpec) -> Result<Box<dyn SceneSurface>, SurfaceError>;

    fn create_veil(&mut self, spec: &VeilSpec) -> Result<Box<dyn VeilSurface>, SurfaceError>;
}

/// One long-lived instance per logical scene, all owned by the shell anchor.
pub struct SceneRegistry {
    anchor: Scene,
    scenes: HashMap<SceneId, Scene>,
    /// Creation order, for stable iteration.
    order: Vec<SceneId>,
}

impl SceneRegistry {
    /// Create and show the anchor, then create every scene owned by it.
    ///
    /// Must be called exactly once at startup. No content scene is shown here;
    /// the caller picks the first visible scene through the orchestrator.
    pub fn init(
        host: &mut dyn SurfaceHost,
        ids: impl IntoIterator<Item = SceneId>,
    ) -> Result<Self, ShellError> {
        let anchor_spec = SceneSpec::anchor();
        let mut anchor = Scene::new(SceneId::ANCHOR, None, host.create_scene(&anchor_spec)?);
        anchor.show()?;

        let mut scenes = HashMap::new();
        let mut order = Vec::new();
        for id in ids {
            if id == SceneId::ANCHOR || scenes.contains_key(&id) {
                return Err(ShellError::DuplicateScene(id));
            }
            let spec = SceneSpec::owned_by_anchor(id.clone());
            let surface = host.create_scene(&spec)?;
            scenes.insert(id.clone(), Scene::new(id.clone(), spec.owner, surface));
            order.push(id);
        }

        tracing::debug!(scenes = ?order, "scene registry initialized");

        Ok(Self {
            anchor,
            scenes,
            order,
        })
    }

    pub fn anchor(&self) -> &Scene {
        &self.anchor
    }

    pub fn contains(&self, id: &SceneId) -> bool {
        self.scenes.contains_key(id)
    }

    pub fn get(&self, id: &SceneId) -> Option<&Scene> {
        self.scenes.get(id)
    }

    pub fn get_mut(&mut self, id: &SceneId) -> Option<&mut Scene> {
        self.scenes.get_mut(id)
    }

    /// Scene ids in creation order.
    pub fn ids(&self) -> impl Iterator<Item = &SceneId> {
        self.order.iter()
    }

    /// Scenes in creation order.
    pub fn iter(&self) -> impl Iterator<Item = &Scene> {
        self.order.iter().filter_map(|id| self.scenes.get(id))
    }

    /// Currently visible content scenes, in creation order.
    pub fn visible(&self) -> Vec<&SceneId> {
        self.iter()
            .filter(|scene| scene.is_visible())
            .map(|scene| &scene.id)
            .collect()
    }

    pub fn is_visible(&self, id: &SceneId) -> bool {
        self.get(id).is_some_and(Scene::is_visible)
    }

    /// Configure visibility hooks for a registered scene.
    pub fn scene_builder(&mut self, id: &SceneId) -> Option<SceneBuilder<'_>> {
        self.scenes.get_mut(id).map(|scene| SceneBuilder { scene })
    }
}

impl std::fmt::Debug for SceneRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SceneRegistry")
            .field("anchor", &self.anchor)
            .field("scenes", &self.iter().collect::<Vec<_>>())
            .finish()
    }
}

/// Builder for configuring scene visibility hooks.
///
/// # Example
///
/// ```ignore
/// registry
///     .scene_builder(&SceneId::MAIN_MENU)
///     .unwrap()
///     .on_shown(move || audio.play_loop())
///     .on_hidden(|| tracing::debug!("menu hidden"));
/// ```
pub struct SceneBuilder<'a> {
    scene: &'a mut Scene,
}

impl SceneBuilder<'_> {
    /// Set a callback to run every time the scene becomes visible.
    pub fn on_shown<F: FnMut() + 'static>(self, callback: F) -> Self {
        self.scene.on_shown = Some(Box::new(callback));
        self
    }

    /// Set a callback to run every time the scene is hidden.
    pub fn on_hidden<F: FnMut() + 'static>(self, callback: F) -> Self {
        self.scene.on_hidden = Some(Box::new(callback));
        self
    }
}
