use std::rc::Rc;
use std::sync::Arc;
use std::time::{Duration, Instant};

use winit::application::ApplicationHandler;
use winit::event::{ElementState, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

use crate::config::ShellConfig;
use crate::error::ShellError;
use crate::scene::{
    SceneId, SceneRegistry, ShowPath, ShowRequest, SystemClock, TransitionOrchestrator,
};

use super::gpu::GpuShared;
use super::window::{WindowIndex, WinitHost};

/// Redraw interval while a veil is fading.
const FRAME: Duration = Duration::from_millis(16);

/// Handle to the running shell, passed to setup and to every key handler call.
pub struct Shell<'a> {
    event_loop: &'a ActiveEventLoop,
    config: &'a ShellConfig,
    gpu: &'a Rc<GpuShared>,
    windows: &'a mut WindowIndex,
    registry: &'a mut SceneRegistry,
    orchestrator: &'a mut TransitionOrchestrator,
}

impl Shell<'_> {
    /// Hand a request to the transition orchestrator.
    pub fn show(&mut self, request: ShowRequest) -> Result<ShowPath, ShellError> {
        let mut host = WinitHost::new(self.event_loop, self.gpu, self.windows, self.config);
        self.orchestrator.show(&mut host, self.registry, request)
    }

    pub fn registry(&self) -> &SceneRegistry {
        &*self.registry
    }

    /// Mutable access, mainly for [`SceneRegistry::scene_builder`].
    pub fn registry_mut(&mut self) -> &mut SceneRegistry {
        &mut *self.registry
    }

    /// The first visible scene, if any.
    pub fn front(&self) -> Option<&SceneId> {
        self.registry.visible().into_iter().next()
    }

    /// The configured "usual" fade duration.
    pub fn transition_duration(&self) -> Duration {
        self.config.transition_duration
    }

    pub fn is_animating(&self) -> bool {
        self.orchestrator.is_animating()
    }

    /// The window backing a scene, e.g. to change its title.
    pub fn window(&self, scene: &SceneId) -> Option<Arc<Window>> {
        self.windows.window(scene).cloned()
    }

    pub fn exit(&self) {
        self.event_loop.exit();
    }
}

/// Run the shell with the default configuration.
///
/// `setup` runs once every scene window exists and returns the key handler.
///
/// # Example
/// ```ignore
/// chess_shell::run(|shell| {
///     shell.show(ShowRequest::new(SceneId::MAIN_MENU)).ok();
///
///     move |shell: &mut Shell, key: KeyCode| {
///         if key == KeyCode::KeyQ {
///             shell.exit();
///         }
///     }
/// })?;
/// ```
pub fn run<S, F>(setup: S) -> Result<(), ShellError>
where
    S: FnOnce(&mut Shell) -> F + 'static,
    F: FnMut(&mut Shell, KeyCode) + 'static,
{
    run_with_config(ShellConfig::default(), setup)
}

/// Run the shell with custom configuration.
pub fn run_with_config<S, F>(config: ShellConfig, setup: S) -> Result<(), ShellError>
where
    S: FnOnce(&mut Shell) -> F + 'static,
    F: FnMut(&mut Shell, KeyCode) + 'static,
{
    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Wait);

    let mut app = ShellApp::Pending {
        config,
        setup: Box::new(move |shell: &mut Shell<'_>| -> KeyHandler { Box::new(setup(shell)) }),
    };
    event_loop.run_app(&mut app)?;

    match app {
        ShellApp::Failed(Some(err)) => Err(err),
        _ => Ok(()),
    }
}

type KeyHandler = Box<dyn FnMut(&mut Shell<'_>, KeyCode)>;
type SetupFn = Box<dyn FnOnce(&mut Shell<'_>) -> KeyHandler>;

struct Running {
    config: ShellConfig,
    gpu: Rc<GpuShared>,
    windows: WindowIndex,
    registry: SceneRegistry,
    orchestrator: TransitionOrchestrator,
    clock: SystemClock,
    on_key: KeyHandler,
}

impl Running {
    fn start(
        event_loop: &ActiveEventLoop,
        config: ShellConfig,
        setup: SetupFn,
    ) -> Result<Self, ShellError> {
        let gpu = Rc::new(GpuShared::new()?);
        let mut windows = WindowIndex::default();
        let mut registry = {
            let mut host = WinitHost::new(event_loop, &gpu, &mut windows, &config);
            SceneRegistry::init(&mut host, config.scenes.iter().cloned())?
        };

        let clock = SystemClock::new();
        let mut orchestrator = TransitionOrchestrator::new(config.transitions.clone(), clock);

        let on_key = {
            let mut shell = Shell {
                event_loop,
                config: &config,
                gpu: &gpu,
                windows: &mut windows,
                registry: &mut registry,
                orchestrator: &mut orchestrator,
            };
            setup(&mut shell)
        };

        tracing::info!(scenes = config.scenes.len(), "shell started");

        Ok(Self {
            config,
            gpu,
            windows,
            registry,
            orchestrator,
            clock,
            on_key,
        })
    }

    fn key(&mut self, event_loop: &ActiveEventLoop, key: KeyCode) {
        let mut shell = Shell {
            event_loop,
            config: &self.config,
            gpu: &self.gpu,
            windows: &mut self.windows,
            registry: &mut self.registry,
            orchestrator: &mut self.orchestrator,
        };
        (self.on_key)(&mut shell, key);
    }
}

enum ShellApp {
    Pending {
        config: ShellConfig,
        setup: SetupFn,
    },
    Running(Box<Running>),
    Failed(Option<ShellError>),
}

impl ApplicationHandler for ShellApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if !matches!(self, ShellApp::Pending { .. }) {
            return;
        }
        let ShellApp::Pending { config, setup } = std::mem::replace(self, ShellApp::Failed(None))
        else {
            return;
        };

        match Running::start(event_loop, config, setup) {
            Ok(running) => *self = ShellApp::Running(Box::new(running)),
            Err(err) => {
                tracing::error!(%err, "failed to start shell");
                *self = ShellApp::Failed(Some(err));
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, id: WindowId, event: WindowEvent) {
        let ShellApp::Running(app) = self else {
            return;
        };
        // Veil windows are not indexed; the orchestrator paints them directly.
        let Some(scene) = app.windows.scene(id).cloned() else {
            return;
        };

        match event {
            WindowEvent::CloseRequested => {
                tracing::info!(%scene, "window closed, exiting");
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                if let Some(scene) = app.registry.get_mut(&scene) {
                    scene.surface_mut().resized(size.width, size.height);
                }
            }
            WindowEvent::RedrawRequested => {
                if let Some(scene) = app.registry.get_mut(&scene) {
                    scene.surface_mut().redraw();
                }
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if event.state == ElementState::Pressed && !event.repeat {
                    if let PhysicalKey::Code(code) = event.physical_key {
                        app.key(event_loop, code);
                    }
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        let ShellApp::Running(app) = self else {
            return;
        };

        app.orchestrator.tick(&mut app.registry);

        let deadline = app
            .orchestrator
            .next_deadline()
            .map(|at| app.clock.instant_at(at));
        let frame = app
            .orchestrator
            .is_animating()
            .then(|| Instant::now() + FRAME);

        let flow = match (frame, deadline) {
            (Some(frame), Some(deadline)) => ControlFlow::WaitUntil(frame.min(deadline)),
            (Some(at), None) | (None, Some(at)) => ControlFlow::WaitUntil(at),
            (None, None) => ControlFlow::Wait,
        };
        event_loop.set_control_flow(flow);
    }
}
