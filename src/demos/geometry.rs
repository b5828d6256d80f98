use std::f32::consts::{FRAC_PI_2, PI};
use std::sync::Arc;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use crate::framework::{Demo, DemoError, SetupContext};
use crate::graphics::Color;
use crate::graphics::g3d::*;
use crate::graphics::scene::{NodeId, Scene};
use crate::math::Transform;

/// Primitive families with the parameters the geometry demo shows them with.
#[derive(Copy, Clone, Eq, PartialEq, Default, Debug, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GeometryKind {
    Box,
    Circle,
    Cone,
    Cylinder,
    Sphere,
    Ring,
    Plane,
    Torus,
    #[default]
    TorusKnot,
}

impl GeometryKind {
    pub fn mesh_data(self) -> MeshData {
        match self {
            Self::Box => BoxGeometry::new(1.0, 1.0, 1.0).with_segments(2, 2, 2).into(),
            Self::Circle => CircleGeometry::new(0.5, 16).with_theta(FRAC_PI_2, FRAC_PI_2).into(),
            Self::Cone => ConeGeometry::new(0.5, 1.6, 9)
                .with_height_segments(9)
                .with_open_ended(true)
                .with_theta(0.0, PI)
                .into(),
            Self::Cylinder => CylinderGeometry::new(0.9, 0.9, 0.5, 32)
                .with_height_segments(12)
                .with_open_ended(true)
                .with_theta(0.0, PI)
                .into(),
            Self::Sphere => SphereGeometry::new(0.8, 32, 12)
                .with_phi(0.0, PI)
                .with_theta(0.0, FRAC_PI_2)
                .into(),
            Self::Ring => RingGeometry::new(0.2, 1.0, 6)
                .with_phi_segments(2)
                .with_theta(0.0, PI)
                .into(),
            Self::Plane => PlaneGeometry::new(1.0, 2.0).with_segments(2, 4).into(),
            Self::Torus => TorusGeometry::new(0.9, 0.4, 24, 32).with_arc(PI).into(),
            Self::TorusKnot => TorusKnotGeometry::new(0.6, 0.1, 64, 32).with_pq(3, 4).into(),
        }
    }
}

/// A primitive drawn solid with its wireframe on top, grouped as one unit. Static.
#[derive(Debug, Default)]
pub struct GeometryDemo {
    kind: GeometryKind,
    group: Option<NodeId>,
}

impl GeometryDemo {

    pub fn new(kind: GeometryKind) -> Self {
        Self { kind, group: None }
    }

    pub fn group(&self) -> Option<NodeId> {
        self.group
    }
}

impl Demo for GeometryDemo {

    fn title(&self) -> &str {
        "02 Geometry"
    }

    fn setup_camera(&mut self, ctx: &mut SetupContext) -> Result<NodeId, DemoError> {
        let camera = PerspectiveCamera::new(75.0, ctx.aspect(), 0.1, 1000.0);
        Ok(ctx.scene.spawn(Object3D::camera(camera)
            .with_transform(Transform::default().with_xyz(0.0, 0.0, 4.0))
        ))
    }

    fn setup_lights(&mut self, ctx: &mut SetupContext) -> Result<(), DemoError> {
        ctx.scene.add(Object3D::light(DirectionalLight::new(Color::WHITE, 1.0))
            .with_transform(Transform::default().with_xyz(-1.0, 2.0, 4.0))
        )?;
        Ok(())
    }

    fn setup_model(&mut self, ctx: &mut SetupContext) -> Result<(), DemoError> {
        let geometry = self.kind.mesh_data();
        geometry.validate()?;
        let wireframe = WireframeGeometry::from_mesh(&geometry);
        log::debug!("{:?}: {} triangles, {} edges", self.kind, geometry.triangle_count(), wireframe.segment_count());
        let material = Material::from(PhongMaterial::new(Color::hex(0x515151))).into_shared();

        let group = ctx.scene.add(Object3D::group().with_name("geometry"))?;
        ctx.scene.add_child(group, Object3D::mesh(Arc::new(geometry), material))?;
        ctx.scene.add_child(group, Object3D::lines(Arc::new(wireframe), LineMaterial::new(Color::hex(0xffff00))))?;
        self.group = Some(group);
        Ok(())
    }

    fn update(&mut self, _scene: &mut Scene, _seconds: f32) -> Result<(), DemoError> {
        Ok(())
    }
}


#[cfg(test)]
mod test {
    use clap::ValueEnum;
    use crate::framework::{DemoApp, HeadlessRenderer, StaticHost};
    use crate::graphics::TextureLoader;
    use super::{GeometryDemo, GeometryKind};

    #[test]
    fn every_kind_builds_valid_geometry() {
        for kind in GeometryKind::value_variants() {
            let mesh = kind.mesh_data();
            mesh.validate().unwrap();
            assert!(mesh.triangle_count() > 0, "{kind:?}");
            assert!(mesh.normals.is_some() && mesh.uvs.is_some(), "{kind:?}");
        }
    }

    #[test]
    fn solid_and_wireframe_share_a_group() {
        let mut app = DemoApp::new(
            StaticHost::new(800, 600),
            HeadlessRenderer::new(),
            GeometryDemo::new(GeometryKind::Box),
            TextureLoader::new("."),
        );
        app.initialize().unwrap();
        let group = app.demo().group().unwrap();
        let children = app.scene().node(group).unwrap().children_ids();
        assert_eq!(2, children.len());
        app.on_frame(1000.0).unwrap();
        let stats = app.renderer().last_frame().unwrap();
        assert_eq!((1, 1), (stats.meshes, stats.lines));
    }

    #[test]
    fn parses_kebab_case() {
        assert_eq!(Ok(GeometryKind::TorusKnot), GeometryKind::from_str("torus-knot", false));
    }
}
