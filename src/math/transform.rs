use glam::{Affine3A, EulerRot, Mat4, Quat, Vec3};

/**
 * The local transformation of a scene object: translation, rotation and scale.
 * Rotation is stored as Euler angles in radians, applied in XYZ order.
 */
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Vec3,
    pub scale: Vec3,
}

impl Transform {

    pub const IDENTITY: Self = Self {
        translation: Vec3::ZERO,
        rotation: Vec3::ZERO,
        scale: Vec3::ONE,
    };

    pub fn with_translation(mut self, translation: Vec3) -> Self {
        self.translation = translation;
        self
    }

    pub fn with_xyz(mut self, x: f32, y: f32, z: f32) -> Self {
        self.translation = Vec3::new(x, y, z);
        self
    }

    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_scale_xyz(mut self, x: f32, y: f32, z: f32) -> Self {
        self.scale = Vec3::new(x, y, z);
        self
    }

    /// Euler angles in radians.
    pub fn with_euler(mut self, x: f32, y: f32, z: f32) -> Self {
        self.rotation = Vec3::new(x, y, z);
        self
    }

    /// Rotation as a quaternion.
    pub fn quat(&self) -> Quat {
        Quat::from_euler(EulerRot::XYZ, self.rotation.x, self.rotation.y, self.rotation.z)
    }

    /// Overwrites the Euler angles with the equivalent of a quaternion.
    pub fn set_quat(&mut self, rotation: Quat) {
        let (x, y, z) = rotation.to_euler(EulerRot::XYZ);
        self.rotation = Vec3::new(x, y, z);
    }

    /**
     * Rotates so that the local -Z axis points at the target.
     * Falls back to an alternate up vector when looking straight along `up`.
     */
    pub fn look_at(&mut self, target: Vec3, up: Vec3) {
        let forward = target - self.translation;
        if forward.length_squared() <= f32::EPSILON {
            return;
        }
        let up = if forward.normalize().cross(up).length_squared() < 1e-8 {
            Vec3::Z
        }
        else {
            up
        };
        let view = Mat4::look_at_rh(self.translation, target, up);
        let (_, rotation, _) = view.inverse().to_scale_rotation_translation();
        self.set_quat(rotation);
    }

    pub fn matrix(&self) -> Affine3A {
        Affine3A::from(*self)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl From<Transform> for Affine3A {
    fn from(transform: Transform) -> Self {
        Self::from_scale_rotation_translation(
            transform.scale,
            transform.quat(),
            transform.translation
        )
    }
}

impl From<Transform> for Mat4 {
    fn from(transform: Transform) -> Self {
        Self::from_scale_rotation_translation(
            transform.scale,
            transform.quat(),
            transform.translation
        )
    }
}


#[cfg(test)]
mod test {
    use glam::Vec3;
    use super::Transform;

    #[test]
    fn euler_rotation_about_y() {
        let transform = Transform::default().with_euler(0.0, std::f32::consts::FRAC_PI_2, 0.0);
        let rotated = transform.matrix().transform_point3(Vec3::X);
        assert!(rotated.abs_diff_eq(Vec3::NEG_Z, 1e-5), "{rotated}");
    }

    #[test]
    fn look_at_points_negative_z_at_target() {
        let mut transform = Transform::default().with_xyz(7.0, 7.0, 0.0);
        transform.look_at(Vec3::ZERO, Vec3::Y);
        let forward = transform.quat() * Vec3::NEG_Z;
        let expected = (Vec3::ZERO - Vec3::new(7.0, 7.0, 0.0)).normalize();
        assert!(forward.abs_diff_eq(expected, 1e-5), "{forward}");
    }

    #[test]
    fn look_at_straight_down() {
        let mut transform = Transform::default().with_xyz(0.0, 5.0, 0.0);
        transform.look_at(Vec3::ZERO, Vec3::Y);
        let forward = transform.quat() * Vec3::NEG_Z;
        assert!(forward.abs_diff_eq(Vec3::NEG_Y, 1e-5), "{forward}");
    }
}
