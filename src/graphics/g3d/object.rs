use std::sync::Arc;
use crate::math::Transform;
use crate::graphics::g3d::{Helper, Light, LineData, LineMaterial, Material, MeshData, PerspectiveCamera};

/**
 * A node of the scene: a local transform plus an optional payload.
 */
#[derive(Clone, Debug)]
pub struct Object3D {
    pub name: String,
    pub transform: Transform,
    pub visible: bool,
    pub cast_shadow: bool,
    pub receive_shadow: bool,
    pub kind: ObjectKind,
}

#[derive(Clone, Debug)]
pub enum ObjectKind {
    /// Pivot or container without anything to draw.
    Group,
    Mesh(Mesh),
    Lines(Lines),
    Light(Light),
    Camera(PerspectiveCamera),
    Helper(Helper),
}

/// Geometry and material pair. Both may be shared with other meshes.
#[derive(Clone, Debug)]
pub struct Mesh {
    pub geometry: Arc<MeshData>,
    pub material: Arc<Material>,
}

#[derive(Clone, Debug)]
pub struct Lines {
    pub geometry: Arc<LineData>,
    pub material: LineMaterial,
}

impl Object3D {

    pub fn new(kind: ObjectKind) -> Self {
        Self {
            name: String::new(),
            transform: Transform::IDENTITY,
            visible: true,
            cast_shadow: false,
            receive_shadow: false,
            kind,
        }
    }

    pub fn group() -> Self {
        Self::new(ObjectKind::Group)
    }

    pub fn mesh(geometry: Arc<MeshData>, material: Arc<Material>) -> Self {
        Self::new(ObjectKind::Mesh(Mesh { geometry, material }))
    }

    pub fn lines(geometry: Arc<LineData>, material: LineMaterial) -> Self {
        Self::new(ObjectKind::Lines(Lines { geometry, material }))
    }

    pub fn light(light: impl Into<Light>) -> Self {
        Self::new(ObjectKind::Light(light.into()))
    }

    pub fn camera(camera: PerspectiveCamera) -> Self {
        Self::new(ObjectKind::Camera(camera))
    }

    pub fn helper(helper: Helper) -> Self {
        Self::new(ObjectKind::Helper(helper))
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_shadows(mut self, cast_shadow: bool, receive_shadow: bool) -> Self {
        self.cast_shadow = cast_shadow;
        self.receive_shadow = receive_shadow;
        self
    }

    pub fn as_camera(&self) -> Option<&PerspectiveCamera> {
        match &self.kind {
            ObjectKind::Camera(camera) => Some(camera),
            _ => None,
        }
    }

    pub fn as_camera_mut(&mut self) -> Option<&mut PerspectiveCamera> {
        match &mut self.kind {
            ObjectKind::Camera(camera) => Some(camera),
            _ => None,
        }
    }

    pub fn as_light(&self) -> Option<&Light> {
        match &self.kind {
            ObjectKind::Light(light) => Some(light),
            _ => None,
        }
    }

    pub fn as_light_mut(&mut self) -> Option<&mut Light> {
        match &mut self.kind {
            ObjectKind::Light(light) => Some(light),
            _ => None,
        }
    }

    pub fn as_mesh(&self) -> Option<&Mesh> {
        match &self.kind {
            ObjectKind::Mesh(mesh) => Some(mesh),
            _ => None,
        }
    }

    pub fn as_helper(&self) -> Option<&Helper> {
        match &self.kind {
            ObjectKind::Helper(helper) => Some(helper),
            _ => None,
        }
    }
}
