//! winit windows behind the scene and veil surface traits.

use std::cell::Cell;
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::Arc;

use winit::dpi::{LogicalSize, PhysicalPosition, PhysicalSize};
use winit::event_loop::ActiveEventLoop;
use winit::window::{Window, WindowAttributes, WindowId, WindowLevel};

use crate::bounds::Bounds;
use crate::config::ShellConfig;
use crate::error::SurfaceError;
use crate::scene::{SceneId, SceneSpec, SceneSurface, SurfaceHost, VeilSpec, VeilSurface};

use super::gpu::{GpuShared, WindowSurface, veil_color};

/// Far enough off screen that no monitor layout shows it.
const OFFSCREEN: PhysicalPosition<i32> = PhysicalPosition::new(-32000, -32000);

/// Maps scene ids to their windows and back.
#[derive(Default)]
pub struct WindowIndex {
    by_scene: HashMap<SceneId, Arc<Window>>,
    by_window: HashMap<WindowId, SceneId>,
}

impl WindowIndex {
    pub fn window(&self, scene: &SceneId) -> Option<&Arc<Window>> {
        self.by_scene.get(scene)
    }

    pub fn scene(&self, window: WindowId) -> Option<&SceneId> {
        self.by_window.get(&window)
    }

    fn insert(&mut self, scene: SceneId, window: Arc<Window>) {
        self.by_window.insert(window.id(), scene.clone());
        self.by_scene.insert(scene, window);
    }
}

/// Creates scene and veil windows on the active event loop.
pub struct WinitHost<'a> {
    event_loop: &'a ActiveEventLoop,
    gpu: &'a Rc<GpuShared>,
    windows: &'a mut WindowIndex,
    config: &'a ShellConfig,
}

impl<'a> WinitHost<'a> {
    pub fn new(
        event_loop: &'a ActiveEventLoop,
        gpu: &'a Rc<GpuShared>,
        windows: &'a mut WindowIndex,
        config: &'a ShellConfig,
    ) -> Self {
        Self {
            event_loop,
            gpu,
            windows,
            config,
        }
    }

    fn owner_window(&self, owner: Option<&SceneId>) -> Option<Arc<Window>> {
        owner.and_then(|id| self.windows.window(id)).cloned()
    }
}

impl SurfaceHost for WinitHost<'_> {
    fn create_scene(&mut self, spec: &SceneSpec) -> Result<Box<dyn SceneSurface>, SurfaceError> {
        let base = WindowAttributes::default()
            .with_title(&self.config.title)
            .with_visible(false);

        let attrs = if spec.is_anchor() {
            // One pixel, undecorated, off screen: present for the task switcher, invisible to the user.
            base.with_decorations(false)
                .with_resizable(false)
                .with_active(false)
                .with_inner_size(PhysicalSize::new(1, 1))
                .with_position(OFFSCREEN)
        } else {
            base.with_inner_size(LogicalSize::new(self.config.width, self.config.height))
        };
        let owner = self.owner_window(spec.owner.as_ref());
        let attrs = owned_by(attrs, owner.as_deref(), spec.in_task_switcher);

        let window = Arc::new(self.event_loop.create_window(attrs)?);
        self.windows.insert(spec.id.clone(), window.clone());

        let surface = if spec.is_anchor() {
            None
        } else {
            Some(WindowSurface::new(self.gpu, window.clone(), false)?)
        };

        tracing::debug!(scene = %spec.id, window = ?window.id(), "scene window created");

        Ok(Box::new(WindowScene {
            color: scene_color(&spec.id),
            id: spec.id.clone(),
            window,
            surface,
            gpu: Rc::clone(self.gpu),
            visible: false,
            restored: Cell::new(Bounds::ZERO),
        }))
    }

    fn create_veil(&mut self, spec: &VeilSpec) -> Result<Box<dyn VeilSurface>, SurfaceError> {
        let attrs = WindowAttributes::default()
            .with_title("")
            .with_visible(false)
            .with_decorations(false)
            .with_transparent(true)
            .with_resizable(false)
            .with_active(false)
            .with_window_level(WindowLevel::AlwaysOnTop)
            .with_position(PhysicalPosition::new(
                spec.bounds.origin.x.round() as i32,
                spec.bounds.origin.y.round() as i32,
            ))
            .with_inner_size(PhysicalSize::new(
                spec.bounds.width().round().max(1.0) as u32,
                spec.bounds.height().round().max(1.0) as u32,
            ));
        let owner = self.owner_window(Some(&spec.owner));
        let attrs = owned_by(attrs, owner.as_deref(), false);

        let window = Arc::new(self.event_loop.create_window(attrs)?);
        let surface = WindowSurface::new(self.gpu, window.clone(), true)?;

        Ok(Box::new(WindowVeil {
            window,
            surface: Some(surface),
            gpu: Rc::clone(self.gpu),
            opacity: 0.0,
        }))
    }
}

/// Parent `attrs` to `owner` and keep the window out of the taskbar.
#[cfg(windows)]
fn owned_by(
    attrs: WindowAttributes,
    owner: Option<&Window>,
    in_task_switcher: bool,
) -> WindowAttributes {
    use winit::platform::windows::WindowAttributesExtWindows;
    use winit::raw_window_handle::{HasWindowHandle, RawWindowHandle};

    let mut attrs = attrs.with_skip_taskbar(!in_task_switcher);
    if let Some(handle) = owner.and_then(|w| w.window_handle().ok()) {
        if let RawWindowHandle::Win32(win32) = handle.as_raw() {
            attrs = attrs.with_owner_window(win32.hwnd.get());
        }
    }
    attrs
}

/// Owner windows are a Win32 concept; elsewhere every window stands alone.
#[cfg(not(windows))]
fn owned_by(
    attrs: WindowAttributes,
    _owner: Option<&Window>,
    _in_task_switcher: bool,
) -> WindowAttributes {
    attrs
}

/// Background colour for a scene window.
pub fn scene_color(id: &SceneId) -> wgpu::Color {
    match id.as_str() {
        "MainMenu" => wgpu::Color { r: 0.08, g: 0.18, b: 0.12, a: 1.0 },
        "Language" => wgpu::Color { r: 0.07, g: 0.10, b: 0.22, a: 1.0 },
        "Game" => wgpu::Color { r: 0.43, g: 0.30, b: 0.18, a: 1.0 },
        _ => wgpu::Color { r: 0.15, g: 0.15, b: 0.15, a: 1.0 },
    }
}

/// A scene backed by a top-level window.
pub struct WindowScene {
    id: SceneId,
    window: Arc<Window>,
    /// `None` for the anchor, which never draws.
    surface: Option<WindowSurface>,
    gpu: Rc<GpuShared>,
    color: wgpu::Color,
    visible: bool,
    restored: Cell<Bounds>,
}

impl WindowScene {
    pub fn window(&self) -> &Arc<Window> {
        &self.window
    }

    /// Outer rectangle on screen; zero while minimized or when the platform has no position.
    fn live_bounds(&self) -> Bounds {
        if self.window.is_minimized() == Some(true) {
            return Bounds::ZERO;
        }
        let Ok(position) = self.window.outer_position() else {
            return Bounds::ZERO;
        };
        let size = self.window.outer_size();
        Bounds::new(
            position.x as f32,
            position.y as f32,
            size.width as f32,
            size.height as f32,
        )
    }

    /// Remember `live` as the restored rectangle if the window is in its normal state.
    fn refresh_restored_bounds(&self, live: Bounds) {
        if let Some(bounds) = restorable(live, self.window.is_maximized()) {
            self.restored.set(bounds);
        }
    }
}

/// Bounds worth keeping as the restored rectangle: not maximized and not degenerate.
fn restorable(live: Bounds, maximized: bool) -> Option<Bounds> {
    (!maximized && !live.is_degenerate()).then_some(live)
}

impl SceneSurface for WindowScene {
    fn show(&mut self) -> Result<(), SurfaceError> {
        self.window.set_visible(true);
        self.visible = true;
        if self.surface.is_some() {
            self.window.focus_window();
            self.window.request_redraw();
        }
        Ok(())
    }

    fn hide(&mut self) -> Result<(), SurfaceError> {
        self.window.set_visible(false);
        self.visible = false;
        Ok(())
    }

    fn activate(&mut self) -> Result<(), SurfaceError> {
        if self.window.is_minimized() == Some(true) {
            self.window.set_minimized(false);
        }
        self.window.focus_window();
        Ok(())
    }

    fn is_visible(&self) -> bool {
        self.window.is_visible().unwrap_or(self.visible)
    }

    fn bounds(&self) -> Bounds {
        let live = self.live_bounds();
        self.refresh_restored_bounds(live);
        live
    }

    fn restored_bounds(&self) -> Bounds {
        self.restored.get()
    }

    fn redraw(&mut self) {
        if let Some(surface) = &self.surface {
            if let Err(err) = surface.clear(&self.gpu, self.color) {
                tracing::warn!(scene = %self.id, %err, "failed to draw scene");
            }
        }
    }

    fn resized(&mut self, width: u32, height: u32) {
        if let Some(surface) = &mut self.surface {
            surface.resize(&self.gpu, width, height);
        }
        if width > 0 && height > 0 {
            self.refresh_restored_bounds(self.live_bounds());
        }
        self.window.request_redraw();
    }
}

/// A borderless, transparent, topmost window painted black at the veil's opacity.
pub struct WindowVeil {
    window: Arc<Window>,
    surface: Option<WindowSurface>,
    gpu: Rc<GpuShared>,
    opacity: f32,
}

impl WindowVeil {
    fn paint(&self) -> Result<(), SurfaceError> {
        match &self.surface {
            Some(surface) => surface.clear(&self.gpu, veil_color(self.opacity)),
            None => Err(SurfaceError::Closed),
        }
    }
}

impl VeilSurface for WindowVeil {
    fn show(&mut self) -> Result<(), SurfaceError> {
        if self.surface.is_none() {
            return Err(SurfaceError::Closed);
        }
        self.window.set_visible(true);
        self.paint()
    }

    fn set_opacity(&mut self, opacity: f32) -> Result<(), SurfaceError> {
        self.opacity = opacity;
        self.paint()
    }

    fn close(&mut self) -> Result<(), SurfaceError> {
        self.window.set_visible(false);
        // The surface must go before the window it was created from.
        self.surface.take().map(|_| ()).ok_or(SurfaceError::Closed)
    }
}
