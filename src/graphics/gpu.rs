use std::sync::Arc;
use tracing::instrument;
use wgpu::{CommandEncoderDescriptor, SurfaceError};
use winit::window::Window;
use crate::framework::{RenderError, Renderer, RendererOptions};
use crate::graphics::{flatten_scene, FrameTargets, GraphicsError, GraphicsState, G3D};
use crate::graphics::scene::{NodeId, Scene};

/**
 * [`Renderer`] that draws into a window's surface with [`G3D`].
 */
pub struct GpuRenderer {
    g3d: G3D,
    state: GraphicsState,
    pixel_ratio: f64,
    size: (u32, u32),
}

impl GpuRenderer {

    pub fn new(window: Arc<Window>, options: RendererOptions) -> Result<Self, GraphicsError> {
        let pixel_ratio = window.scale_factor();
        let state = GraphicsState::new(window, options.sample_count())?;
        let mut g3d = G3D::new(state.device.clone(), state.queue.clone(), state.target_info());
        g3d.set_shadow_map_enabled(options.shadow_map);
        let size = logical_size(state.surface_size(), pixel_ratio);
        Ok(Self {
            g3d,
            state,
            pixel_ratio,
            size,
        })
    }

    pub fn state(&self) -> &GraphicsState {
        &self.state
    }

    fn resize_surface(&mut self) {
        let (width, height) = self.drawing_buffer_size();
        self.state.resize(width, height);
    }
}

/// Physical surface size in logical pixels, never zero.
fn logical_size((width, height): (u32, u32), pixel_ratio: f64) -> (u32, u32) {
    let ratio = if pixel_ratio > 0.0 { pixel_ratio } else { 1.0 };
    let scale = |value: u32| ((value as f64 / ratio).round() as u32).max(1);
    (scale(width), scale(height))
}

impl Renderer for GpuRenderer {

    fn set_pixel_ratio(&mut self, ratio: f64) {
        self.pixel_ratio = ratio;
        self.resize_surface();
    }

    fn pixel_ratio(&self) -> f64 {
        self.pixel_ratio
    }

    fn set_size(&mut self, width: u32, height: u32) {
        self.size = (width, height);
        self.resize_surface();
    }

    fn size(&self) -> (u32, u32) {
        self.size
    }

    fn set_shadow_map_enabled(&mut self, enabled: bool) {
        self.g3d.set_shadow_map_enabled(enabled);
    }

    #[instrument(skip_all)]
    fn render(&mut self, scene: &Scene, camera: NodeId) -> Result<(), RenderError> {
        let flat = flatten_scene(scene, camera)?;
        let surface_tex = match self.state.surface().get_current_texture() {
            Ok(surface_tex) => surface_tex,
            Err(SurfaceError::Lost | SurfaceError::Outdated) => {
                log::debug!("Surface lost, reconfiguring");
                self.state.reconfigure();
                return Ok(());
            },
            Err(SurfaceError::Timeout) => {
                log::warn!("Timed out waiting for surface texture");
                return Ok(());
            },
            Err(source) => return Err(RenderError::Surface { source }),
        };

        // Encodes rendering commands
        let view = surface_tex.texture.create_view(&Default::default());
        let mut encoder = self.state.device.create_command_encoder(&CommandEncoderDescriptor::default());
        let targets = match self.state.msaa_view() {
            Some(msaa_view) => FrameTargets {
                color: msaa_view,
                resolve: Some(&view),
                depth: self.state.depth_view(),
            },
            None => FrameTargets {
                color: &view,
                resolve: None,
                depth: self.state.depth_view(),
            },
        };
        self.g3d.render(&flat, targets, &mut encoder)?;

        // Submits encoded commands
        self.state.queue.submit([encoder.finish()]);
        surface_tex.present();
        Ok(())
    }
}
