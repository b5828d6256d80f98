use std::f32::consts::{FRAC_PI_2, PI};
use std::sync::Arc;
use crate::framework::{Demo, DemoError, SetupContext};
use crate::graphics::Color;
use crate::graphics::g3d::*;
use crate::graphics::scene::{NodeId, Scene};
use crate::math::Transform;

/// Degrees per second the small sphere travels around its pivot.
pub const ORBIT_RATE: f32 = 100.0;

/**
 * A light whose target follows a node orbiting on a pivot.
 * The helper, when present, is refreshed after every move.
 */
#[derive(Copy, Clone, Debug)]
pub struct TrackedTarget {
    pub light: NodeId,
    pub helper: Option<NodeId>,
    pub pivot: NodeId,
    pub subject: NodeId,
}

impl TrackedTarget {
    /// Turns the pivot to `seconds` and re-aims the light at the subject's new world position.
    pub fn update(&self, scene: &mut Scene, seconds: f32) -> Result<(), DemoError> {
        scene.object_mut(self.pivot)?.transform.rotation.y = (seconds * ORBIT_RATE).to_radians();
        let target = scene.world_position(self.subject)?;
        scene.object_mut(self.light)?
            .as_light_mut()
            .ok_or(DemoError::MissingSubject { subject: "light" })?
            .set_target(target);
        if let Some(helper) = self.helper {
            scene.update_helper(helper)?;
        }
        Ok(())
    }
}

/// Whether the stage's meshes take part in shadow mapping.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub(crate) enum Shadows {
    Off,
    On,
}

/**
 * Ground, eight tori on fixed pivots and an orbiting small sphere.
 * Returns the small sphere's pivot and the sphere itself.
 */
pub(crate) fn build_stage(scene: &mut Scene, shadows: Shadows) -> Result<(NodeId, NodeId), DemoError> {
    let on = shadows == Shadows::On;

    let ground = Material::from(StandardMaterial::new(Color::hex(0x2c3e50))
        .with_roughness(0.5)
        .with_metalness(0.5)
        .with_side(Side::Double)
    ).into_shared();
    scene.add(Object3D::mesh(Arc::new(PlaneGeometry::new(10.0, 10.0).into()), ground)
        .with_name("ground")
        .with_transform(Transform::default().with_euler(-FRAC_PI_2, 0.0, 0.0))
        .with_shadows(false, on)
    )?;

    let torus = Arc::new(MeshData::from(TorusGeometry::new(0.4, 0.1, 32, 32)));
    let torus_material = Material::from(StandardMaterial::new(Color::hex(0x9b59b6))
        .with_roughness(0.5)
        .with_metalness(0.9)
    ).into_shared();
    for i in 0..8 {
        let pivot = scene.add(Object3D::group()
            .with_transform(Transform::default().with_euler(0.0, (45.0 * i as f32).to_radians(), 0.0))
        )?;
        scene.add_child(pivot, Object3D::mesh(torus.clone(), torus_material.clone())
            .with_name("torus")
            .with_transform(Transform::default().with_xyz(3.0, 0.5, 0.0))
            .with_shadows(on, on)
        )?;
    }

    let small_sphere = Material::from(StandardMaterial::new(Color::hex(0xe74c3c))
        .with_roughness(0.2)
        .with_metalness(0.5)
    ).into_shared();
    let pivot = scene.add(Object3D::group().with_name("smallSpherePivot"))?;
    let subject = scene.add_child(pivot, Object3D::mesh(Arc::new(SphereGeometry::new(0.3, 32, 32).into()), small_sphere)
        .with_name("smallSphere")
        .with_transform(Transform::default().with_xyz(3.0, 0.5, 0.0))
        .with_shadows(on, on)
    )?;
    Ok((pivot, subject))
}

/// A spot light following a sphere that circles a half dome.
#[derive(Debug, Default)]
pub struct SpotlightDemo {
    light: Option<NodeId>,
    helper: Option<NodeId>,
    tracked: Option<TrackedTarget>,
}

impl SpotlightDemo {
    pub fn tracked(&self) -> Option<TrackedTarget> {
        self.tracked
    }
}

impl Demo for SpotlightDemo {

    fn title(&self) -> &str {
        "06 Light"
    }

    fn setup_camera(&mut self, ctx: &mut SetupContext) -> Result<NodeId, DemoError> {
        let camera = PerspectiveCamera::new(75.0, ctx.aspect(), 0.1, 1000.0);
        Ok(ctx.scene.spawn(Object3D::camera(camera)
            .with_transform(Transform::default().with_xyz(7.0, 7.0, 0.0))
        ))
    }

    fn setup_lights(&mut self, ctx: &mut SetupContext) -> Result<(), DemoError> {
        let spot = SpotLight::new(Color::WHITE, 2.0)
            .with_angle(40f32.to_radians())
            .with_penumbra(0.2);
        let light = ctx.scene.add(Object3D::light(spot)
            .with_name("spotLight")
            .with_transform(Transform::default().with_xyz(0.0, 5.0, 0.0))
        )?;
        self.helper = Some(ctx.scene.add(Object3D::helper(Helper::spot_light(light)))?);
        self.light = Some(light);
        Ok(())
    }

    fn setup_model(&mut self, ctx: &mut SetupContext) -> Result<(), DemoError> {
        let light = self.light.ok_or(DemoError::MissingSubject { subject: "light" })?;
        let (pivot, subject) = build_stage(ctx.scene, Shadows::Off)?;

        let dome = Material::from(StandardMaterial::new(Color::WHITE)
            .with_roughness(0.1)
            .with_metalness(0.2)
        ).into_shared();
        let geometry = SphereGeometry::new(1.5, 64, 64).with_phi(0.0, PI);
        ctx.scene.add(Object3D::mesh(Arc::new(geometry.into()), dome)
            .with_name("bigSphere")
            .with_transform(Transform::default().with_euler(-FRAC_PI_2, 0.0, 0.0))
        )?;

        self.tracked = Some(TrackedTarget { light, helper: self.helper, pivot, subject });
        Ok(())
    }

    fn update(&mut self, scene: &mut Scene, seconds: f32) -> Result<(), DemoError> {
        match self.tracked {
            Some(tracked) => tracked.update(scene, seconds),
            None => Ok(()),
        }
    }
}


#[cfg(test)]
mod test {
    use glam::Vec3;
    use crate::framework::{Demo, DemoApp, HeadlessRenderer, StaticHost};
    use crate::graphics::TextureLoader;
    use crate::graphics::scene::Scene;
    use super::SpotlightDemo;

    fn orbit_position(seconds: f32) -> Vec3 {
        let angle = (seconds * 100.0).to_radians();
        Vec3::new(3.0 * angle.cos(), 0.5, -3.0 * angle.sin())
    }

    #[test]
    fn target_follows_the_small_sphere() {
        let mut app = DemoApp::new(StaticHost::new(800, 600), HeadlessRenderer::new(), SpotlightDemo::default(), TextureLoader::new("."));
        app.initialize().unwrap();
        let tracked = app.demo().tracked().unwrap();

        for ms in [500.0, 1250.0, 4000.0] {
            app.on_frame(ms).unwrap();
            let seconds = (ms * 0.001) as f32;
            let light = app.scene().object(tracked.light).unwrap().as_light().unwrap();
            let target = light.target().unwrap();
            let expected = orbit_position(seconds);
            assert!(target.abs_diff_eq(expected, 1e-4), "{target} != {expected}");
            assert_eq!(target, app.scene().world_position(tracked.subject).unwrap());
        }
    }

    #[test]
    fn helper_is_refreshed_after_the_target_moves() {
        let mut app = DemoApp::new(StaticHost::new(800, 600), HeadlessRenderer::new(), SpotlightDemo::default(), TextureLoader::new("."));
        app.initialize().unwrap();
        let tracked = app.demo().tracked().unwrap();
        app.on_frame(2000.0).unwrap();

        let helper = app.scene().object(tracked.helper.unwrap()).unwrap().as_helper().unwrap();
        let (start, end) = helper.lines().segments().next().unwrap();
        let expected = (orbit_position(2.0) - Vec3::new(0.0, 5.0, 0.0)).normalize();
        assert!(start.abs_diff_eq(Vec3::new(0.0, 5.0, 0.0), 1e-5));
        assert!((end - start).normalize().abs_diff_eq(expected, 1e-4));
    }

    #[test]
    fn stage_contents() {
        let mut app = DemoApp::new(StaticHost::new(800, 600), HeadlessRenderer::new(), SpotlightDemo::default(), TextureLoader::new("."));
        app.initialize().unwrap();
        app.on_frame(0.0).unwrap();
        let stats = app.renderer().last_frame().unwrap();
        // Ground, dome, eight tori and the small sphere.
        assert_eq!(11, stats.meshes);
        assert_eq!(1, stats.spot_lights);
        assert_eq!(1, stats.lines);
        assert_eq!(0, stats.shadow_casters);
    }

    #[test]
    fn update_before_setup_is_a_no_op() {
        let mut demo = SpotlightDemo::default();
        demo.update(&mut Scene::new(), 1.0).unwrap();
    }
}
