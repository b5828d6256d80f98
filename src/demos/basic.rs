use std::sync::Arc;
use crate::framework::{Demo, DemoError, OrbitControls, SetupContext};
use crate::graphics::Color;
use crate::graphics::g3d::*;
use crate::graphics::scene::{NodeId, Scene};
use crate::math::Transform;

/// A single cube spinning about X and Y.
#[derive(Debug, Default)]
pub struct BasicDemo {
    cube: Option<NodeId>,
}

impl BasicDemo {
    pub fn cube(&self) -> Option<NodeId> {
        self.cube
    }
}

impl Demo for BasicDemo {

    fn title(&self) -> &str {
        "01 Basic"
    }

    fn setup_camera(&mut self, ctx: &mut SetupContext) -> Result<NodeId, DemoError> {
        let camera = PerspectiveCamera::new(75.0, ctx.aspect(), 0.1, 1000.0);
        Ok(ctx.scene.spawn(Object3D::camera(camera)
            .with_transform(Transform::default().with_xyz(0.0, 0.0, 2.0))
        ))
    }

    fn setup_lights(&mut self, ctx: &mut SetupContext) -> Result<(), DemoError> {
        ctx.scene.add(Object3D::light(DirectionalLight::new(Color::WHITE, 1.0))
            .with_transform(Transform::default().with_xyz(-1.0, 2.0, 4.0))
        )?;
        Ok(())
    }

    fn setup_model(&mut self, ctx: &mut SetupContext) -> Result<(), DemoError> {
        let geometry = Arc::new(MeshData::from(BoxGeometry::new(1.0, 1.0, 1.0)));
        let material = Material::from(PhongMaterial::new(Color::hex(0x044a88))).into_shared();
        self.cube = Some(ctx.scene.add(Object3D::mesh(geometry, material).with_name("cube"))?);
        Ok(())
    }

    fn setup_controls(&mut self, _ctx: &mut SetupContext) -> Result<Option<OrbitControls>, DemoError> {
        Ok(None)
    }

    fn update(&mut self, scene: &mut Scene, seconds: f32) -> Result<(), DemoError> {
        let cube = self.cube.ok_or(DemoError::MissingSubject { subject: "cube" })?;
        let rotation = &mut scene.object_mut(cube)?.transform.rotation;
        rotation.x = seconds;
        rotation.y = seconds;
        Ok(())
    }
}


#[cfg(test)]
mod test {
    use crate::framework::{Demo, DemoApp, DemoError, HeadlessRenderer, StaticHost};
    use crate::graphics::TextureLoader;
    use crate::graphics::scene::Scene;
    use super::BasicDemo;

    #[test]
    fn cube_rotation_follows_time() {
        let mut app = DemoApp::new(StaticHost::new(800, 600), HeadlessRenderer::new(), BasicDemo::default(), TextureLoader::new("."));
        app.initialize().unwrap();
        let camera = app.camera().unwrap();
        let aspect = app.scene().camera(camera).unwrap().aspect;
        assert!((aspect - 800.0 / 600.0).abs() < 1e-6);

        app.on_frame(1000.0).unwrap();
        let cube = app.demo().cube().unwrap();
        let rotation = app.scene().object(cube).unwrap().transform.rotation;
        assert_eq!(1.0, rotation.x);
        assert_eq!(1.0, rotation.y);
        assert_eq!(0.0, rotation.z);
        assert!(app.controls().is_none());
    }

    #[test]
    fn update_without_cube_fails() {
        let mut demo = BasicDemo::default();
        let mut scene = Scene::new();
        assert!(matches!(demo.update(&mut scene, 1.0), Err(DemoError::MissingSubject { subject: "cube" })));
    }
}
