//! The veil: a black overlay that hides a scene swap behind an opacity fade.

use crate::bounds::Bounds;
use crate::error::SurfaceError;

use super::scene::SceneId;

/// What the orchestrator needs from an overlay surface.
///
/// A host creates veils borderless, topmost, excluded from the task switcher,
/// and fully transparent (opacity 0) until told otherwise.
pub trait VeilSurface {
    fn show(&mut self) -> Result<(), SurfaceError>;

    /// Set the overlay opacity, already clamped to `0.0..=1.0`.
    fn set_opacity(&mut self, opacity: f32) -> Result<(), SurfaceError>;

    /// Destroy the overlay. Called at most once.
    fn close(&mut self) -> Result<(), SurfaceError>;
}

/// Parameters for creating a veil surface.
#[derive(Clone, Debug, PartialEq)]
pub struct VeilSpec {
    /// The source scene the veil is parented to.
    pub owner: SceneId,
    /// Rectangle to cover, copied from the owner when the transition starts.
    pub bounds: Bounds,
}

/// A live veil owned by one in-flight transition.
pub struct Veil {
    spec: VeilSpec,
    opacity: f32,
    closed: bool,
    surface: Box<dyn VeilSurface>,
}

impl Veil {
    pub(crate) fn new(spec: VeilSpec, surface: Box<dyn VeilSurface>) -> Self {
        Self {
            spec,
            opacity: 0.0,
            closed: false,
            surface,
        }
    }

    pub fn owner(&self) -> &SceneId {
        &self.spec.owner
    }

    pub fn bounds(&self) -> Bounds {
        self.spec.bounds
    }

    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Show the veil at opacity 0. Failure leaves the sequence running.
    pub(crate) fn show(&mut self) {
        if let Err(err) = self.surface.set_opacity(0.0).and_then(|_| self.surface.show()) {
            tracing::warn!(owner = %self.spec.owner, %err, "failed to show veil");
        }
    }

    pub(crate) fn set_opacity(&mut self, opacity: f32) {
        let opacity = opacity.clamp(0.0, 1.0);
        self.opacity = opacity;
        if self.closed {
            return;
        }
        if let Err(err) = self.surface.set_opacity(opacity) {
            tracing::warn!(owner = %self.spec.owner, %err, "failed to update veil opacity");
        }
    }

    /// Destroy the surface. Errors are discarded; repeated calls do nothing.
    pub(crate) fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        if let Err(err) = self.surface.close() {
            tracing::warn!(owner = %self.spec.owner, %err, "failed to close veil");
        }
    }
}

impl Drop for Veil {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for Veil {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Veil")
            .field("owner", &self.spec.owner)
            .field("bounds", &self.spec.bounds)
            .field("opacity", &self.opacity)
            .field("closed", &self.closed)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Default)]
    struct Recorder {
        opacities: Vec<f32>,
        closes: u32,
        fail_close: bool,
    }

    struct RecordingVeil(Rc<RefCell<Recorder>>);

    impl VeilSurface for RecordingVeil {
        fn show(&mut self) -> Result<(), SurfaceError> {
            Ok(())
        }
        fn set_opacity(&mut self, opacity: f32) -> Result<(), SurfaceError> {
            self.0.borrow_mut().opacities.push(opacity);
            Ok(())
        }
        fn close(&mut self) -> Result<(), SurfaceError> {
            let mut rec = self.0.borrow_mut();
            rec.closes += 1;
            if rec.fail_close {
                Err(SurfaceError::Platform("gone".into()))
            } else {
                Ok(())
            }
        }
    }

    fn veil(rec: &Rc<RefCell<Recorder>>) -> Veil {
        Veil::new(
            VeilSpec {
                owner: SceneId::LANGUAGE,
                bounds: Bounds::new(0.0, 0.0, 800.0, 600.0),
            },
            Box::new(RecordingVeil(rec.clone())),
        )
    }

    #[test]
    fn opacity_is_clamped() {
        let rec = Rc::new(RefCell::new(Recorder::default()));
        let mut veil = veil(&rec);
        veil.set_opacity(1.7);
        veil.set_opacity(-0.2);
        assert_eq!(rec.borrow().opacities, vec![1.0, 0.0]);
    }

    #[test]
    fn close_is_idempotent_and_runs_on_drop() {
        let rec = Rc::new(RefCell::new(Recorder::default()));
        let mut v = veil(&rec);
        v.close();
        v.close();
        drop(v);
        assert_eq!(rec.borrow().closes, 1);

        let rec = Rc::new(RefCell::new(Recorder::default()));
        drop(veil(&rec));
        assert_eq!(rec.borrow().closes, 1);
    }

    #[test]
    fn close_failure_still_marks_closed() {
        let rec = Rc::new(RefCell::new(Recorder {
            fail_close: true,
            ..Default::default()
        }));
        let mut v = veil(&rec);
        v.close();
        assert!(v.is_closed());
    }
}
