//! Scene management for the shell.
//!
//! This module owns the preloaded scenes and the logic that switches between
//! them, optionally behind a black veil so the user never sees a raw window swap.
//!
//! # Overview
//!
//! - [`SceneRegistry`] creates every scene once at startup, all owned by an
//!   invisible shell anchor that keeps the task-switcher entry stable.
//! - [`TransitionOrchestrator`] turns a [`ShowRequest`] into a direct swap, an
//!   immediate show, or a veiled fade, and drives the fade from [`tick`](TransitionOrchestrator::tick).
//! - Window backends plug in through [`SurfaceHost`], [`SceneSurface`], and [`VeilSurface`].
//!
//! # Example
//!
//! ```ignore
//! use chess_shell::scene::*;
//!
//! let mut registry = SceneRegistry::init(&mut host, [SceneId::MAIN_MENU, SceneId::GAME])?;
//! let mut orchestrator = TransitionOrchestrator::new(Default::default(), SystemClock::new());
//!
//! orchestrator.show(&mut host, &mut registry, ShowRequest::new(SceneId::MAIN_MENU))?;
//!
//! // Later, from the menu:
//! orchestrator.show(
//!     &mut host,
//!     &mut registry,
//!     ShowRequest::new(SceneId::GAME)
//!         .from(SceneId::MAIN_MENU)
//!         .duration(Duration::from_millis(400)),
//! )?;
//!
//! // Every frame / when the next deadline passes:
//! orchestrator.tick(&mut registry);
//! ```

mod orchestrator;
mod registry;
#[allow(clippy::module_inception)]
pub mod scene;
mod scheduler;
mod transition;
mod veil;

pub use orchestrator::{MidpointFn, ShowPath, ShowRequest, TransitionOrchestrator};
pub use registry::{SceneBuilder, SceneRegistry, SceneSpec, SurfaceHost};
pub use scene::{Scene, SceneId, SceneSurface};
pub use scheduler::{Clock, ManualClock, Scheduler, SystemClock, Task, TransitionId};
pub use transition::{Easing, Fade, VeilEvent, VeilPhase, half_duration};
pub use veil::{Veil, VeilSpec, VeilSurface};
