use derive_more::*;
use serde::{Deserialize, Serialize};
use crate::graphics::{ShaderDefError, flatten_scene, GeometryError};
use crate::graphics::scene::{NodeId, Scene};

/// Drawing surface that renders a scene through one of its cameras.
pub trait Renderer {
    /// Ratio of physical pixels to logical pixels.
    fn set_pixel_ratio(&mut self, ratio: f64);
    fn pixel_ratio(&self) -> f64;
    /// Sets the logical size. The drawing buffer is this size times the pixel ratio.
    fn set_size(&mut self, width: u32, height: u32);
    fn size(&self) -> (u32, u32);
    fn set_shadow_map_enabled(&mut self, enabled: bool);
    fn render(&mut self, scene: &Scene, camera: NodeId) -> Result<(), RenderError>;

    /// Size of the drawing buffer in physical pixels.
    fn drawing_buffer_size(&self) -> (u32, u32) {
        let (width, height) = self.size();
        let ratio = self.pixel_ratio();
        let scale = |value: u32| ((value as f64 * ratio).round() as u32).max(1);
        (scale(width), scale(height))
    }
}

impl<R: Renderer + ?Sized> Renderer for Box<R> {
    fn set_pixel_ratio(&mut self, ratio: f64) { (**self).set_pixel_ratio(ratio) }
    fn pixel_ratio(&self) -> f64 { (**self).pixel_ratio() }
    fn set_size(&mut self, width: u32, height: u32) { (**self).set_size(width, height) }
    fn size(&self) -> (u32, u32) { (**self).size() }
    fn set_shadow_map_enabled(&mut self, enabled: bool) { (**self).set_shadow_map_enabled(enabled) }
    fn render(&mut self, scene: &Scene, camera: NodeId) -> Result<(), RenderError> { (**self).render(scene, camera) }
    fn drawing_buffer_size(&self) -> (u32, u32) { (**self).drawing_buffer_size() }
}

/// Options fixed when a renderer is created.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererOptions {
    pub antialias: bool,
    pub shadow_map: bool,
}

impl Default for RendererOptions {
    fn default() -> Self {
        Self {
            antialias: true,
            shadow_map: false,
        }
    }
}

impl RendererOptions {
    pub fn with_shadow_map(mut self, shadow_map: bool) -> Self {
        self.shadow_map = shadow_map;
        self
    }

    pub fn sample_count(&self) -> u32 {
        if self.antialias { 4 } else { 1 }
    }
}

#[derive(Error, Display, Debug)]
pub enum RenderError {
    #[display(fmt="camera node does not exist")]
    MissingCamera,
    #[display(fmt="node is not a camera")]
    NotACamera,
    #[display(fmt="invalid geometry: {source}")]
    Geometry { source: GeometryError },
    #[display(fmt="invalid shader: {source}")]
    Shader { source: ShaderDefError },
    #[display(fmt="surface error: {source}")]
    Surface { source: wgpu::SurfaceError },
}

impl From<GeometryError> for RenderError {
    fn from(source: GeometryError) -> Self {
        Self::Geometry { source }
    }
}

impl From<ShaderDefError> for RenderError {
    fn from(source: ShaderDefError) -> Self {
        Self::Shader { source }
    }
}

/// Counts of what the last frame contained.
#[derive(Copy, Clone, Eq, PartialEq, Default, Debug)]
pub struct FrameStats {
    pub meshes: usize,
    pub lines: usize,
    pub directional_lights: usize,
    pub spot_lights: usize,
    pub shadow_casters: usize,
}

/**
 * Renderer without a GPU. Flattens the scene like [`crate::graphics::GpuRenderer`]
 * and records what would have been drawn.
 */
#[derive(Debug)]
pub struct HeadlessRenderer {
    pixel_ratio: f64,
    size: (u32, u32),
    shadow_map_enabled: bool,
    frames: u64,
    last_camera: Option<NodeId>,
    last_frame: Option<FrameStats>,
}

impl Default for HeadlessRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessRenderer {

    pub fn new() -> Self {
        Self {
            pixel_ratio: 1.0,
            size: (300, 150),
            shadow_map_enabled: false,
            frames: 0,
            last_camera: None,
            last_frame: None,
        }
    }

    /// Number of frames drawn.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn last_camera(&self) -> Option<NodeId> {
        self.last_camera
    }

    pub fn last_frame(&self) -> Option<FrameStats> {
        self.last_frame
    }

    pub fn shadow_map_enabled(&self) -> bool {
        self.shadow_map_enabled
    }
}

impl Renderer for HeadlessRenderer {
    fn set_pixel_ratio(&mut self, ratio: f64) {
        self.pixel_ratio = ratio;
    }

    fn pixel_ratio(&self) -> f64 {
        self.pixel_ratio
    }

    fn set_size(&mut self, width: u32, height: u32) {
        self.size = (width, height);
    }

    fn size(&self) -> (u32, u32) {
        self.size
    }

    fn set_shadow_map_enabled(&mut self, enabled: bool) {
        self.shadow_map_enabled = enabled;
    }

    fn render(&mut self, scene: &Scene, camera: NodeId) -> Result<(), RenderError> {
        let flat = flatten_scene(scene, camera)?;
        for mesh in &flat.meshes {
            mesh.mesh.geometry.validate()?;
        }
        let shadow_casters = if self.shadow_map_enabled && flat.shadow_caster().is_some() {
            flat.shadow_casting_meshes().count()
        }
        else {
            0
        };
        let stats = FrameStats {
            meshes: flat.meshes.len(),
            lines: flat.lines.len(),
            directional_lights: flat.directional_lights.len(),
            spot_lights: flat.spot_lights.len(),
            shadow_casters,
        };
        log::trace!("Headless frame {}: {stats:?}", self.frames);
        self.frames += 1;
        self.last_camera = Some(camera);
        self.last_frame = Some(stats);
        Ok(())
    }
}


#[cfg(test)]
mod test {
    use std::sync::Arc;
    use crate::framework::{HeadlessRenderer, Renderer, RenderError};
    use crate::graphics::Color;
    use crate::graphics::g3d::*;
    use crate::graphics::scene::Scene;

    #[test]
    fn drawing_buffer_follows_pixel_ratio() {
        let mut renderer = HeadlessRenderer::new();
        renderer.set_pixel_ratio(2.0);
        renderer.set_size(800, 600);
        assert_eq!((800, 600), renderer.size());
        assert_eq!((1600, 1200), renderer.drawing_buffer_size());
    }

    #[test]
    fn counts_shadow_casters_only_when_enabled() {
        let mut scene = Scene::new();
        let geometry = Arc::new(MeshData::from(SphereGeometry::default()));
        let material = Material::from(StandardMaterial::default()).into_shared();
        scene.add(Object3D::mesh(geometry, material).with_shadows(true, true)).unwrap();
        scene.add(Object3D::light(DirectionalLight::new(Color::WHITE, 0.5)).with_shadows(true, false)).unwrap();
        let camera = scene.spawn(Object3D::camera(PerspectiveCamera::default()));

        let mut renderer = HeadlessRenderer::new();
        renderer.render(&scene, camera).unwrap();
        assert_eq!(0, renderer.last_frame().unwrap().shadow_casters);
        renderer.set_shadow_map_enabled(true);
        renderer.render(&scene, camera).unwrap();
        let stats = renderer.last_frame().unwrap();
        assert_eq!(1, stats.shadow_casters);
        assert_eq!(1, stats.meshes);
        assert_eq!(1, stats.directional_lights);
        assert_eq!(2, renderer.frames());
        assert_eq!(Some(camera), renderer.last_camera());
    }

    #[test]
    fn rejects_invalid_geometry() {
        let mut scene = Scene::new();
        let mut geometry = MeshData::from(PlaneGeometry::default());
        geometry.set_index([0, 1, 99]);
        let material = Material::from(PhongMaterial::default()).into_shared();
        scene.add(Object3D::mesh(Arc::new(geometry), material)).unwrap();
        let camera = scene.spawn(Object3D::camera(PerspectiveCamera::default()));
        let mut renderer = HeadlessRenderer::new();
        assert!(matches!(renderer.render(&scene, camera), Err(RenderError::Geometry { .. })));
        assert_eq!(0, renderer.frames());
    }
}
