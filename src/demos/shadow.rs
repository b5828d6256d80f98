use std::sync::Arc;
use crate::demos::spotlight::{build_stage, Shadows, TrackedTarget};
use crate::framework::{Demo, DemoError, RendererOptions, SetupContext};
use crate::graphics::Color;
use crate::graphics::g3d::*;
use crate::graphics::scene::{NodeId, Scene};
use crate::math::Transform;

/**
 * Shadow mapping from a directional light that tracks the orbiting sphere.
 * A second directional light at the same spot fills in without casting shadows.
 */
#[derive(Debug, Default)]
pub struct ShadowDemo {
    light: Option<NodeId>,
    helper: Option<NodeId>,
    tracked: Option<TrackedTarget>,
}

impl ShadowDemo {

    /// Shadow camera and map settings of the main light.
    pub fn shadow() -> DirectionalShadow {
        let defaults = DirectionalShadow::default();
        DirectionalShadow {
            top: defaults.right + 6.0,
            bottom: defaults.left - 6.0,
            map_size: 2048,
            radius: 2.0,
            ..defaults
        }
    }

    pub fn tracked(&self) -> Option<TrackedTarget> {
        self.tracked
    }
}

impl Demo for ShadowDemo {

    fn title(&self) -> &str {
        "07 Shadow"
    }

    fn renderer_options(&self) -> RendererOptions {
        RendererOptions::default().with_shadow_map(true)
    }

    fn setup_camera(&mut self, ctx: &mut SetupContext) -> Result<NodeId, DemoError> {
        let camera = PerspectiveCamera::new(75.0, ctx.aspect(), 0.1, 1000.0);
        Ok(ctx.scene.spawn(Object3D::camera(camera)
            .with_transform(Transform::default().with_xyz(7.0, 7.0, 0.0))
        ))
    }

    fn setup_lights(&mut self, ctx: &mut SetupContext) -> Result<(), DemoError> {
        let mut main = DirectionalLight::new(Color::WHITE, 0.5);
        main.shadow = Self::shadow();
        let light = ctx.scene.add(Object3D::light(main)
            .with_name("shadowLight")
            .with_transform(Transform::default().with_xyz(0.0, 5.0, 0.0))
            .with_shadows(true, false)
        )?;
        ctx.scene.add(Object3D::light(DirectionalLight::new(Color::WHITE, 0.5))
            .with_name("auxLight")
            .with_transform(Transform::default().with_xyz(0.0, 5.0, 0.0))
        )?;
        self.helper = Some(ctx.scene.add(Object3D::helper(Helper::directional_light(light, 1.0)))?);
        self.light = Some(light);
        Ok(())
    }

    fn setup_model(&mut self, ctx: &mut SetupContext) -> Result<(), DemoError> {
        let light = self.light.ok_or(DemoError::MissingSubject { subject: "light" })?;
        let (pivot, subject) = build_stage(ctx.scene, Shadows::On)?;

        let knot = Material::from(StandardMaterial::new(Color::WHITE)
            .with_roughness(0.1)
            .with_metalness(0.2)
        ).into_shared();
        let geometry = TorusKnotGeometry::new(1.0, 0.3, 128, 64).with_pq(2, 3);
        ctx.scene.add(Object3D::mesh(Arc::new(geometry.into()), knot)
            .with_name("torusKnot")
            .with_transform(Transform::default().with_xyz(0.0, 1.6, 0.0))
            .with_shadows(true, true)
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
    use crate::framework::{DemoApp, HeadlessRenderer, StaticHost};
    use crate::graphics::TextureLoader;
    use crate::graphics::g3d::Light;
    use super::ShadowDemo;

    fn app() -> DemoApp<StaticHost, HeadlessRenderer, ShadowDemo> {
        let mut app = DemoApp::new(StaticHost::new(800, 600), HeadlessRenderer::new(), ShadowDemo::default(), TextureLoader::new("."));
        app.initialize().unwrap();
        app
    }

    #[test]
    fn shadow_camera_bounds() {
        let shadow = ShadowDemo::shadow();
        assert_eq!((11.0, -11.0), (shadow.top, shadow.bottom));
        assert_eq!(2048, shadow.map_size);
        assert_eq!(2.0, shadow.radius);
    }

    #[test]
    fn casters_and_receivers() {
        let mut app = app();
        assert!(app.renderer().shadow_map_enabled());
        app.on_frame(0.0).unwrap();
        let stats = app.renderer().last_frame().unwrap();
        // Ground, knot, eight tori and the small sphere; all but the ground cast.
        assert_eq!(11, stats.meshes);
        assert_eq!(10, stats.shadow_casters);
        assert_eq!(2, stats.directional_lights);

        let ground = app.scene().find_by_name("ground").unwrap();
        let ground = app.scene().object(ground).unwrap();
        assert!(ground.receive_shadow && !ground.cast_shadow);
        let aux = app.scene().find_by_name("auxLight").unwrap();
        assert!(!app.scene().object(aux).unwrap().cast_shadow);
    }

    #[test]
    fn target_tracks_subject_after_each_step() {
        let mut app = app();
        let tracked = app.demo().tracked().unwrap();
        let mut previous = None;
        for ms in [0.0, 900.0, 1800.0] {
            app.on_frame(ms).unwrap();
            let Some(Light::Directional(light)) = app.scene().object(tracked.light).unwrap().as_light() else {
                panic!("expected a directional light");
            };
            let subject = app.scene().world_position(tracked.subject).unwrap();
            assert_eq!(subject, light.target);
            assert!((light.target.y - 0.5).abs() < 1e-5);
            assert_ne!(previous, Some(light.target));
            previous = Some(light.target);

            let helper = app.scene().object(tracked.helper.unwrap()).unwrap().as_helper().unwrap();
            let (start, end) = helper.lines().segments().last().unwrap();
            assert_eq!((Vec3::new(0.0, 5.0, 0.0), subject), (start, end));
        }
    }
}
