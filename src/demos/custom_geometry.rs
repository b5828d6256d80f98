use std::sync::Arc;
use crate::framework::{Demo, DemoError, SetupContext};
use crate::graphics::Color;
use crate::graphics::g3d::*;
use crate::graphics::scene::{NodeId, Scene};
use crate::math::Transform;

const POSITIONS: [f32; 12] = [-1.0, -1.0, 0.0, 1.0, -1.0, 0.0, -1.0, 1.0, 0.0, 1.0, 1.0, 0.0];
const NORMALS: [f32; 12] = [0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0];
const COLORS: [f32; 12] = [1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 0.0];
const UVS: [f32; 8] = [0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 1.0];
const INDICES: [u32; 6] = [0, 1, 2, 2, 1, 3];

/// Hand-written quad: four vertices, two triangles sharing an edge, normals drawn by a helper.
#[derive(Debug, Default)]
pub struct CustomGeometryDemo {
    quad: Option<NodeId>,
    helper: Option<NodeId>,
}

impl CustomGeometryDemo {

    /// The quad's geometry, built from raw attribute arrays.
    pub fn geometry() -> Result<MeshData, GeometryError> {
        MeshData::from_attributes(
            [
                (AttributeKind::Position, BufferAttribute::new(POSITIONS, 3)),
                (AttributeKind::Normal, BufferAttribute::new(NORMALS, 3)),
                (AttributeKind::Color, BufferAttribute::new(COLORS, 3)),
                (AttributeKind::Uv, BufferAttribute::new(UVS, 2)),
            ],
            INDICES,
        )
    }

    pub fn quad(&self) -> Option<NodeId> {
        self.quad
    }

    pub fn helper(&self) -> Option<NodeId> {
        self.helper
    }
}

impl Demo for CustomGeometryDemo {

    fn title(&self) -> &str {
        "05 Custom Geometry"
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
        let geometry = Self::geometry()?;
        let map = ctx.textures.load("images/glass/Glass_Window_002_normal.jpg");
        let material = Material::from(PhongMaterial::new(Color::WHITE).with_map(map)).into_shared();

        let quad = ctx.scene.add(Object3D::mesh(Arc::new(geometry), material).with_name("quad"))?;
        let helper = ctx.scene.add(Object3D::helper(Helper::vertex_normals(quad, 0.1, Color::hex(0xffff00))))?;
        self.quad = Some(quad);
        self.helper = Some(helper);
        Ok(())
    }

    fn update(&mut self, _scene: &mut Scene, _seconds: f32) -> Result<(), DemoError> {
        Ok(())
    }
}


#[cfg(test)]
mod test {
    use glam::Vec3;
    use crate::framework::{DemoApp, HeadlessRenderer, StaticHost};
    use crate::graphics::TextureLoader;
    use crate::graphics::g3d::MaterialFlags;
    use super::CustomGeometryDemo;

    #[test]
    fn two_triangles_cover_the_quad() {
        let geometry = CustomGeometryDemo::geometry().unwrap();
        assert_eq!(4, geometry.vertex_count());
        assert_eq!(2, geometry.triangle_count());
        assert_eq!(vec![[0, 1, 2], [2, 1, 3]], geometry.triangle_indices());

        let area: f32 = geometry.triangles()
            .map(|[a, b, c]| (b - a).cross(c - a).length() * 0.5)
            .sum();
        assert!((area - 4.0).abs() < 1e-6);

        // Both triangles wind counter-clockwise when seen from +Z.
        for [a, b, c] in geometry.triangles() {
            assert!((b - a).cross(c - a).dot(Vec3::Z) > 0.0);
        }
        assert_eq!(4, geometry.colors.as_ref().unwrap().len());
    }

    #[test]
    fn helper_draws_one_normal_per_vertex() {
        let mut app = DemoApp::new(StaticHost::new(800, 600), HeadlessRenderer::new(), CustomGeometryDemo::default(), TextureLoader::new("missing-assets"));
        app.initialize().unwrap();
        let demo = app.demo();
        let helper = app.scene().object(demo.helper().unwrap()).unwrap().as_helper().unwrap();
        assert_eq!(4, helper.lines().segment_count());
        for (start, end) in helper.lines().segments() {
            assert!((end - start).abs_diff_eq(Vec3::new(0.0, 0.0, 0.1), 1e-6));
        }

        // Colors are authored but the material does not use them.
        let mesh = app.scene().object(demo.quad().unwrap()).unwrap().as_mesh().unwrap();
        assert!(!mesh.material.flags().contains(MaterialFlags::VERTEX_COLORS));

        app.on_frame(16.0).unwrap();
        let stats = app.renderer().last_frame().unwrap();
        assert_eq!((1, 1), (stats.meshes, stats.lines));
    }
}
