use std::f32::consts::{PI, TAU};
use glam::{Vec2, Vec3};
use crate::framework::{Pointer, PointerButton, PointerEvent};
use crate::graphics::scene::{NodeId, Scene, SceneGraphError};

/**
 * Orbits a camera around a target point.
 * Left drag rotates, right drag pans and the wheel dollies.
 * Operates on the camera's local transform, so the camera is expected to have no moving ancestors.
 */
#[derive(Debug)]
pub struct OrbitControls {
    camera: NodeId,
    pub target: Vec3,
    pub rotate_speed: f32,
    pub pan_speed: f32,
    pub zoom_speed: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    pointer: Pointer,
}

impl OrbitControls {

    const MIN_POLAR: f32 = 1e-6;

    /// Takes control of a camera and immediately aims it at the origin.
    pub fn attach(scene: &mut Scene, camera: NodeId) -> Result<Self, SceneGraphError> {
        scene.camera(camera)?;
        let controls = Self {
            camera,
            target: Vec3::ZERO,
            rotate_speed: 1.0,
            pan_speed: 1.0,
            zoom_speed: 1.0,
            min_distance: 0.0,
            max_distance: f32::INFINITY,
            pointer: Pointer::default(),
        };
        controls.aim(scene)?;
        Ok(controls)
    }

    pub fn camera(&self) -> NodeId {
        self.camera
    }

    /// Applies a pointer event. Viewport height is in the same logical pixels as the event.
    pub fn handle(&mut self, event: PointerEvent, scene: &mut Scene, viewport_height: f32) -> Result<(), SceneGraphError> {
        let movement = self.pointer.apply(event);
        let height = viewport_height.max(1.0);
        let buttons = self.pointer.buttons();
        match event {
            PointerEvent::Moved { .. } if movement != Vec2::ZERO => {
                if buttons.is_pressed(PointerButton::Left) {
                    self.rotate(scene, movement * TAU / height * self.rotate_speed)?;
                }
                else if buttons.is_pressed(PointerButton::Right) || buttons.is_pressed(PointerButton::Middle) {
                    self.pan(scene, movement / height * self.pan_speed)?;
                }
            },
            PointerEvent::Wheel { delta } if delta != 0.0 => {
                let scale = 0.95_f32.powf(self.zoom_speed);
                self.dolly(scene, if delta > 0.0 { 1.0 / scale } else { scale })?;
            },
            _ => {},
        }
        self.pointer.sync_previous_state();
        Ok(())
    }

    /// Rotates around the target. `angles.x` turns about the vertical axis, `angles.y` tilts.
    pub fn rotate(&self, scene: &mut Scene, angles: Vec2) -> Result<(), SceneGraphError> {
        let position = scene.object(self.camera)?.transform.translation;
        let offset = position - self.target;
        let radius = offset.length();
        if radius == 0.0 {
            return Ok(());
        }
        let theta = offset.x.atan2(offset.z) - angles.x;
        let phi = ((offset.y / radius).clamp(-1.0, 1.0).acos() - angles.y)
            .clamp(Self::MIN_POLAR, PI - Self::MIN_POLAR);
        let offset = Vec3::new(
            radius * phi.sin() * theta.sin(),
            radius * phi.cos(),
            radius * phi.sin() * theta.cos(),
        );
        scene.object_mut(self.camera)?.transform.translation = self.target + offset;
        self.aim(scene)
    }

    /// Moves both camera and target parallel to the view plane. `amount` is a fraction of the viewport height.
    pub fn pan(&mut self, scene: &mut Scene, amount: Vec2) -> Result<(), SceneGraphError> {
        let fov = scene.camera(self.camera)?.fov;
        let transform = &mut scene.object_mut(self.camera)?.transform;
        let distance = (transform.translation - self.target).length() * (fov.to_radians() / 2.0).tan();
        let rotation = transform.quat();
        let right = rotation * Vec3::X;
        let up = rotation * Vec3::Y;
        let offset = -right * (2.0 * amount.x * distance) + up * (2.0 * amount.y * distance);
        transform.translation += offset;
        self.target += offset;
        Ok(())
    }

    /// Scales the distance to the target. Factors above 1 move away.
    pub fn dolly(&self, scene: &mut Scene, factor: f32) -> Result<(), SceneGraphError> {
        let transform = &mut scene.object_mut(self.camera)?.transform;
        let offset = transform.translation - self.target;
        let distance = (offset.length() * factor).clamp(self.min_distance, self.max_distance);
        transform.translation = self.target + offset.normalize_or_zero() * distance;
        Ok(())
    }

    fn aim(&self, scene: &mut Scene) -> Result<(), SceneGraphError> {
        scene.object_mut(self.camera)?.transform.look_at(self.target, Vec3::Y);
        Ok(())
    }
}


#[cfg(test)]
mod test {
    use glam::{Vec2, Vec3};
    use crate::framework::{PointerButton, PointerEvent};
    use crate::graphics::g3d::{Object3D, PerspectiveCamera};
    use crate::graphics::scene::Scene;
    use crate::math::Transform;
    use super::OrbitControls;

    fn setup() -> (Scene, OrbitControls) {
        let mut scene = Scene::new();
        let camera = scene.spawn(Object3D::camera(PerspectiveCamera::default())
            .with_transform(Transform::default().with_xyz(7.0, 7.0, 0.0))
        );
        let controls = OrbitControls::attach(&mut scene, camera).unwrap();
        (scene, controls)
    }

    fn forward(scene: &Scene, controls: &OrbitControls) -> Vec3 {
        scene.object(controls.camera()).unwrap().transform.quat() * Vec3::NEG_Z
    }

    #[test]
    fn attach_aims_at_origin() {
        let (scene, controls) = setup();
        let expected = (Vec3::ZERO - Vec3::new(7.0, 7.0, 0.0)).normalize();
        assert!(forward(&scene, &controls).abs_diff_eq(expected, 1e-5));
    }

    #[test]
    fn left_drag_keeps_distance() {
        let (mut scene, mut controls) = setup();
        let height = 600.0;
        controls.handle(PointerEvent::Moved { position: Vec2::new(100.0, 100.0) }, &mut scene, height).unwrap();
        controls.handle(PointerEvent::Pressed { button: PointerButton::Left }, &mut scene, height).unwrap();
        controls.handle(PointerEvent::Moved { position: Vec2::new(180.0, 120.0) }, &mut scene, height).unwrap();
        let position = scene.object(controls.camera()).unwrap().transform.translation;
        assert!((position.length() - Vec3::new(7.0, 7.0, 0.0).length()).abs() < 1e-4);
        assert!(!position.abs_diff_eq(Vec3::new(7.0, 7.0, 0.0), 1e-3));
        assert!(forward(&scene, &controls).abs_diff_eq(-position.normalize(), 1e-4));
    }

    #[test]
    fn moving_without_buttons_does_nothing() {
        let (mut scene, mut controls) = setup();
        controls.handle(PointerEvent::Moved { position: Vec2::new(0.0, 0.0) }, &mut scene, 600.0).unwrap();
        controls.handle(PointerEvent::Moved { position: Vec2::new(50.0, 50.0) }, &mut scene, 600.0).unwrap();
        let position = scene.object(controls.camera()).unwrap().transform.translation;
        assert_eq!(Vec3::new(7.0, 7.0, 0.0), position);
    }

    #[test]
    fn wheel_dollies() {
        let (mut scene, mut controls) = setup();
        let before = scene.object(controls.camera()).unwrap().transform.translation.length();
        controls.handle(PointerEvent::Wheel { delta: 1.0 }, &mut scene, 600.0).unwrap();
        let after = scene.object(controls.camera()).unwrap().transform.translation.length();
        assert!((after - before / 0.95).abs() < 1e-4);
    }

    #[test]
    fn right_drag_pans_target() {
        let (mut scene, mut controls) = setup();
        controls.handle(PointerEvent::Moved { position: Vec2::new(0.0, 0.0) }, &mut scene, 600.0).unwrap();
        controls.handle(PointerEvent::Pressed { button: PointerButton::Right }, &mut scene, 600.0).unwrap();
        controls.handle(PointerEvent::Moved { position: Vec2::new(60.0, 0.0) }, &mut scene, 600.0).unwrap();
        assert_ne!(Vec3::ZERO, controls.target);
        let position = scene.object(controls.camera()).unwrap().transform.translation;
        assert!((position - controls.target).abs_diff_eq(Vec3::new(7.0, 7.0, 0.0), 1e-4));
    }
}
