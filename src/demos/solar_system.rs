use std::f32::consts::TAU;
use std::sync::Arc;
use crate::framework::{Demo, DemoError, SetupContext};
use crate::graphics::Color;
use crate::graphics::g3d::*;
use crate::graphics::scene::{NodeId, Scene};
use crate::math::Transform;

/// Sun, earth and moon on nested pivots, each turning at its own rate.
#[derive(Debug, Default)]
pub struct SolarSystemDemo {
    pivots: Option<Pivots>,
}

/// Nested pivot nodes, outermost first.
#[derive(Copy, Clone, Debug)]
pub struct Pivots {
    pub solar_system: NodeId,
    pub earth_orbit: NodeId,
    pub moon_orbit: NodeId,
    pub moon: NodeId,
}

impl SolarSystemDemo {

    /// Radians per second of the solar system, earth orbit and moon orbit.
    pub const RATES: [f32; 3] = [0.5, 2.0, 5.0];

    pub fn pivots(&self) -> Option<Pivots> {
        self.pivots
    }
}

impl Demo for SolarSystemDemo {

    fn title(&self) -> &str {
        "03 Scene Graph"
    }

    fn setup_camera(&mut self, ctx: &mut SetupContext) -> Result<NodeId, DemoError> {
        let camera = PerspectiveCamera::new(75.0, ctx.aspect(), 0.1, 1000.0);
        Ok(ctx.scene.spawn(Object3D::camera(camera)
            .with_transform(Transform::default().with_xyz(0.0, 12.0, 20.0))
        ))
    }

    fn setup_lights(&mut self, ctx: &mut SetupContext) -> Result<(), DemoError> {
        ctx.scene.add(Object3D::light(DirectionalLight::new(Color::WHITE, 1.0))
            .with_transform(Transform::default().with_xyz(-1.0, 2.0, 4.0))
        )?;
        Ok(())
    }

    fn setup_model(&mut self, ctx: &mut SetupContext) -> Result<(), DemoError> {
        let scene = &mut *ctx.scene;
        let sphere = Arc::new(MeshData::from(SphereGeometry::new(1.0, 12, 12).with_phi(12.0, TAU)));
        let body = |color: Color, emissive: Color| Material::from(PhongMaterial::new(color)
            .with_emissive(emissive)
            .with_flat_shading(true)
        ).into_shared();

        let solar_system = scene.add(Object3D::group().with_name("solarSystem"))?;
        scene.add_child(solar_system, Object3D::mesh(sphere.clone(), body(Color::WHITE, Color::hex(0xffff00)))
            .with_name("sun")
            .with_transform(Transform::default().with_scale_xyz(3.0, 3.0, 3.0))
        )?;

        let earth_orbit = scene.add_child(solar_system, Object3D::group()
            .with_name("earthOrbit")
            .with_transform(Transform::default().with_xyz(10.0, 0.0, 0.0))
        )?;
        scene.add_child(earth_orbit, Object3D::mesh(sphere.clone(), body(Color::hex(0x2233ff), Color::hex(0x112244)))
            .with_name("earth")
        )?;

        let moon_orbit = scene.add_child(earth_orbit, Object3D::group()
            .with_name("moonOrbit")
            .with_transform(Transform::default().with_xyz(2.0, 0.0, 0.0))
        )?;
        let moon = scene.add_child(moon_orbit, Object3D::mesh(sphere, body(Color::hex(0x888888), Color::hex(0x222222)))
            .with_name("moon")
            .with_transform(Transform::default().with_scale_xyz(0.4, 0.4, 0.4))
        )?;

        self.pivots = Some(Pivots { solar_system, earth_orbit, moon_orbit, moon });
        Ok(())
    }

    fn update(&mut self, scene: &mut Scene, seconds: f32) -> Result<(), DemoError> {
        let Some(pivots) = self.pivots else {
            return Ok(());
        };
        let [system_rate, earth_rate, moon_rate] = Self::RATES;
        scene.object_mut(pivots.solar_system)?.transform.rotation.y = seconds * system_rate;
        scene.object_mut(pivots.earth_orbit)?.transform.rotation.y = seconds * earth_rate;
        scene.object_mut(pivots.moon_orbit)?.transform.rotation.y = seconds * moon_rate;
        Ok(())
    }
}
