//! Desktop backend: one winit window per scene, a shared wgpu device, and
//! transparent topmost windows for veils.
//!
//! The anchor is a one-pixel undecorated window parked off screen. On Windows
//! every scene window is owned by it and kept out of the taskbar, so the shell
//! shows a single task-switcher entry however many scenes exist. Veils are
//! owned by the window they cover.

mod app;
mod gpu;
mod window;

pub use app::{Shell, run, run_with_config};
pub use gpu::{GpuShared, WindowSurface, veil_color};
pub use window::{WindowIndex, WindowScene, WindowVeil, WinitHost, scene_color};
