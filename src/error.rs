//! Error types for the shell.
//!
//! [`ShellError`] covers caller mistakes and startup failures; it is what
//! public operations return. [`SurfaceError`] is the transient kind raised by a
//! window backend while showing, hiding, or animating. Inside a running veil
//! sequence surface errors are logged and discarded, never propagated.

use thiserror::Error;

use crate::scene::SceneId;

/// Errors returned by shell operations.
#[derive(Debug, Error)]
pub enum ShellError {
    /// A request named a scene that was never registered.
    #[error("scene '{0}' is not registered")]
    UnknownScene(SceneId),

    /// Two scenes were registered under the same id.
    #[error("scene '{0}' is registered more than once")]
    DuplicateScene(SceneId),

    /// The shell anchor only exists to hold the task-switcher entry.
    #[error("the shell anchor cannot be the target of a transition")]
    AnchorNotShowable,

    /// An animated transition is still running and the overlap policy rejects another.
    #[error("a transition is already in flight")]
    TransitionInFlight,

    /// A surface could not be created during startup.
    #[error("surface error: {0}")]
    Surface(#[from] SurfaceError),

    /// The windowing event loop failed.
    #[error("event loop error: {0}")]
    EventLoop(String),

    /// GPU initialization failed.
    #[error("GPU error: {0}")]
    Gpu(String),
}

/// Failures raised by a scene or veil surface.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SurfaceError {
    /// The underlying platform call failed.
    #[error("platform error: {0}")]
    Platform(String),

    /// The surface was already closed.
    #[error("surface is closed")]
    Closed,
}

impl From<winit::error::OsError> for SurfaceError {
    fn from(err: winit::error::OsError) -> Self {
        Self::Platform(err.to_string())
    }
}

impl From<wgpu::CreateSurfaceError> for SurfaceError {
    fn from(err: wgpu::CreateSurfaceError) -> Self {
        Self::Platform(err.to_string())
    }
}

impl From<winit::error::EventLoopError> for ShellError {
    fn from(err: winit::error::EventLoopError) -> Self {
        Self::EventLoop(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_scene_names_the_scene() {
        let err = ShellError::UnknownScene(SceneId::new("Credits"));
        assert!(err.to_string().contains("Credits"));
    }

    #[test]
    fn surface_error_converts_into_shell_error() {
        let err: ShellError = SurfaceError::Platform("no display".into()).into();
        assert!(matches!(err, ShellError::Surface(SurfaceError::Platform(_))));
        assert!(err.to_string().contains("no display"));
    }
}
