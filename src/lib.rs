//! # Chess Shell
//!
//! **The desktop shell around a chess game: preloaded scenes, switched behind a black veil.**
//!
//! Every scene (menu, language picker, board) is a window created once at
//! startup and owned by an invisible anchor, so the platform shows a single
//! task-switcher entry. Switching scenes either swaps visibility directly or
//! fades a black overlay in, swaps at full opacity, and fades it back out.
//!
//! ## Quick Start
//!
//! ```no_run
//! use chess_shell::scene::{SceneId, ShowRequest};
//! use chess_shell::{KeyCode, Shell, run};
//!
//! fn main() -> Result<(), chess_shell::ShellError> {
//!     run(|shell| {
//!         shell.show(ShowRequest::new(SceneId::MAIN_MENU)).ok();
//!
//!         move |shell: &mut Shell, key: KeyCode| {
//!             if key == KeyCode::Enter {
//!                 let fade = shell.transition_duration();
//!                 shell
//!                     .show(ShowRequest::new(SceneId::GAME).from(SceneId::MAIN_MENU).duration(fade))
//!                     .ok();
//!             }
//!         }
//!     })
//! }
//! ```
//!
//! ## Layout
//!
//! - [`scene`]: the registry, the transition orchestrator, and the surface traits.
//! - [`desktop`]: the winit/wgpu backend.
//! - [`headless`]: an in-memory backend that records every surface call.
//! - [`locale`], [`audio`], [`rules`]: the capabilities scenes use around transitions.

pub mod audio;
mod bounds;
mod config;
pub mod desktop;
mod error;
pub mod headless;
pub mod locale;
pub mod rules;
pub mod scene;

pub use audio::{AudioSink, LogAudio, SoundEffect, clamp_volume};
pub use bounds::Bounds;
pub use config::{
    DEFAULT_TRANSITION_DURATION, DirectSwap, OverlapPolicy, ShellConfig, TransitionSettings,
};
pub use desktop::{Shell, run, run_with_config};
pub use error::{ShellError, SurfaceError};
pub use locale::{Language, LanguageNotifier, Subscription, scene_title};
pub use rules::{RuleEngine, game_over_request, move_effect};

// Re-export winit's key codes so handlers don't need a direct winit dependency.
pub use winit::keyboard::KeyCode;
