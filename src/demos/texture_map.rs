use std::sync::Arc;
use crate::framework::{Demo, DemoError, SetupContext};
use crate::graphics::Color;
use crate::graphics::g3d::*;
use crate::graphics::scene::{NodeId, Scene};
use crate::math::Transform;

const GLASS: &str = "images/glass/Glass_Window_002";

/// One textured standard material shared by a box and a sphere.
/// The camera carries the directional light, so lighting follows the view.
#[derive(Debug, Default)]
pub struct TextureMapDemo {
    meshes: Vec<NodeId>,
}

impl TextureMapDemo {
    pub fn meshes(&self) -> &[NodeId] {
        &self.meshes
    }
}

impl Demo for TextureMapDemo {

    fn title(&self) -> &str {
        "04 Map"
    }

    fn setup_camera(&mut self, ctx: &mut SetupContext) -> Result<NodeId, DemoError> {
        let camera = PerspectiveCamera::new(75.0, ctx.aspect(), 0.1, 1000.0);
        Ok(ctx.scene.add(Object3D::camera(camera)
            .with_transform(Transform::default().with_xyz(0.0, 0.0, 4.0))
        )?)
    }

    fn setup_lights(&mut self, ctx: &mut SetupContext) -> Result<(), DemoError> {
        ctx.scene.add(Object3D::light(AmbientLight::new(Color::WHITE, 0.2)))?;
        let camera = ctx.camera()?;
        ctx.scene.add_child(camera, Object3D::light(DirectionalLight::new(Color::WHITE, 1.0))
            .with_transform(Transform::default().with_xyz(-1.0, 2.0, 4.0))
        )?;
        Ok(())
    }

    fn setup_model(&mut self, ctx: &mut SetupContext) -> Result<(), DemoError> {
        let textures = ctx.textures;
        let material = Material::from(StandardMaterial {
            map: Some(textures.load(format!("{GLASS}_basecolor.jpg"))),
            normal_map: Some(textures.load(format!("{GLASS}_normal.jpg"))),
            displacement_map: Some(textures.load(format!("{GLASS}_height.png"))),
            displacement_scale: 0.2,
            displacement_bias: -0.15,
            ao_map: Some(textures.load(format!("{GLASS}_ambientOcclusion.jpg"))),
            ao_map_intensity: 1.0,
            roughness_map: Some(textures.load(format!("{GLASS}_roughness.jpg"))),
            roughness: 0.5,
            metalness_map: Some(textures.load(format!("{GLASS}_metallic.jpg"))),
            metalness: 0.4,
            transparent: true,
            side: Side::Double,
            light_map: Some(textures.load("images/glass/light.jpeg")),
            light_map_intensity: 2.0,
            ..Default::default()
        }).into_shared();

        let cube = MeshData::from(BoxGeometry::new(1.0, 1.0, 1.0).with_segments(256, 256, 256)).with_uv2_from_uv();
        let sphere = MeshData::from(SphereGeometry::new(0.7, 512, 512)).with_uv2_from_uv();
        let cube = ctx.scene.add(Object3D::mesh(Arc::new(cube), material.clone())
            .with_name("box")
            .with_transform(Transform::default().with_xyz(-1.0, 0.0, 0.0))
        )?;
        let sphere = ctx.scene.add(Object3D::mesh(Arc::new(sphere), material)
            .with_name("sphere")
            .with_transform(Transform::default().with_xyz(1.0, 0.0, 0.0))
        )?;
        self.meshes = vec![cube, sphere];
        Ok(())
    }

    fn update(&mut self, _scene: &mut Scene, _seconds: f32) -> Result<(), DemoError> {
        Ok(())
    }
}


#[cfg(test)]
mod test {
    use std::sync::Arc;
    use crate::framework::{DemoApp, HeadlessRenderer, StaticHost};
    use crate::graphics::TextureLoader;
    use crate::graphics::g3d::Material;
    use super::TextureMapDemo;

    #[test]
    fn material_is_shared_and_uv2_is_present() {
        let mut app = DemoApp::new(StaticHost::new(800, 600), HeadlessRenderer::new(), TextureMapDemo::default(), TextureLoader::new("missing-assets"));
        app.initialize().unwrap();
        let meshes: Vec<_> = app.demo().meshes()
            .iter()
            .map(|id| app.scene().object(*id).unwrap().as_mesh().unwrap())
            .collect();
        assert_eq!(2, meshes.len());
        assert!(Arc::ptr_eq(&meshes[0].material, &meshes[1].material));
        for mesh in &meshes {
            assert_eq!(mesh.geometry.uvs, mesh.geometry.uv2);
        }
        let Material::Standard(standard) = meshes[0].material.as_ref() else {
            panic!("expected a standard material");
        };
        assert_eq!(7, meshes[0].material.textures().len());
        assert!(standard.transparent);

        // Textures load in the background, rendering does not wait on them.
        app.on_frame(16.0).unwrap();
        let stats = app.renderer().last_frame().unwrap();
        assert_eq!(2, stats.meshes);
        assert_eq!(1, stats.directional_lights);
    }
}
