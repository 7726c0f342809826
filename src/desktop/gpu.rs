//! Shared GPU device and per-window surfaces.
//!
//! Every scene window and every veil gets its own [`WindowSurface`], but they
//! all draw with the one device and queue held in [`GpuShared`]. Nothing here
//! draws more than a clear colour: scene content belongs to the scenes, and a
//! veil is black with alpha equal to its opacity.

use std::sync::Arc;
use winit::window::Window;

use crate::error::{ShellError, SurfaceError};

/// wgpu objects shared by all windows.
pub struct GpuShared {
    /// The wgpu instance, used to create one surface per window.
    pub instance: wgpu::Instance,
    /// The adapter every surface is configured against.
    pub adapter: wgpu::Adapter,
    /// The logical GPU device for creating resources.
    pub device: wgpu::Device,
    /// The command queue for submitting work to the GPU.
    pub queue: wgpu::Queue,
}

impl GpuShared {
    /// Create the instance, pick an adapter, and open the device.
    ///
    /// Unlike a single-window setup, no surface exists yet, so the adapter is
    /// requested without a compatible surface; each window later checks its
    /// own capabilities against it.
    pub fn new() -> Result<Self, ShellError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::LowPower,
            compatible_surface: None,
            force_fallback_adapter: false,
        }))
        .map_err(|err| ShellError::Gpu(format!("no suitable GPU adapter: {err}")))?;

        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("Chess Shell Device"),
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
            memory_hints: Default::default(),
            trace: Default::default(),
            experimental_features: Default::default(),
        }))
        .map_err(|err| ShellError::Gpu(format!("failed to create device: {err}")))?;

        Ok(Self {
            instance,
            adapter,
            device,
            queue,
        })
    }
}

/// A configured surface for one window.
pub struct WindowSurface {
    surface: wgpu::Surface<'static>,
    config: wgpu::SurfaceConfiguration,
}

impl WindowSurface {
    /// Create and configure a surface for `window`.
    ///
    /// `translucent` asks for an alpha mode that lets the clear colour's alpha
    /// reach the compositor. Falls back to whatever the platform offers.
    pub fn new(
        gpu: &GpuShared,
        window: Arc<Window>,
        translucent: bool,
    ) -> Result<Self, SurfaceError> {
        let size = window.inner_size();
        let surface = gpu.instance.create_surface(window)?;

        let caps = surface.get_capabilities(&gpu.adapter);
        let format = caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| caps.formats.first())
            .copied()
            .ok_or_else(|| SurfaceError::Platform("surface has no supported formats".into()))?;

        let alpha_mode = if translucent {
            [
                wgpu::CompositeAlphaMode::PreMultiplied,
                wgpu::CompositeAlphaMode::PostMultiplied,
            ]
            .into_iter()
            .find(|mode| caps.alpha_modes.contains(mode))
        } else {
            None
        }
        .or_else(|| caps.alpha_modes.first().copied())
        .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&gpu.device, &config);

        Ok(Self { surface, config })
    }

    /// Resize the surface. Zero-sized dimensions (minimized windows) are ignored.
    pub fn resize(&mut self, gpu: &GpuShared, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.config.width = width;
            self.config.height = height;
            self.surface.configure(&gpu.device, &self.config);
        }
    }

    /// Fill the whole surface with `color` and present it.
    pub fn clear(&self, gpu: &GpuShared, color: wgpu::Color) -> Result<(), SurfaceError> {
        let output = self
            .surface
            .get_current_texture()
            .map_err(|err| SurfaceError::Platform(err.to_string()))?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Clear Encoder"),
            });

        {
            let _pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Clear Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(color),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
        }

        gpu.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        Ok(())
    }
}

/// Black at the given opacity, premultiplied.
pub fn veil_color(opacity: f32) -> wgpu::Color {
    wgpu::Color {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        a: f64::from(opacity.clamp(0.0, 1.0)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn veil_color_is_black_with_clamped_alpha() {
        let c = veil_color(0.5);
        assert_eq!((c.r, c.g, c.b), (0.0, 0.0, 0.0));
        assert_eq!(c.a, 0.5);
        assert_eq!(veil_color(3.0).a, 1.0);
    }
}
