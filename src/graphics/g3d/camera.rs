use glam::Mat4;

/**
 * Perspective projection. FOV is vertical and in degrees.
 * The cached projection only changes through [`PerspectiveCamera::update_projection_matrix`].
 */
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct PerspectiveCamera {
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    projection: Mat4,
}

impl Default for PerspectiveCamera {
    fn default() -> Self {
        Self::new(50.0, 1.0, 0.1, 2000.0)
    }
}

impl PerspectiveCamera {

    pub fn new(fov: f32, aspect: f32, near: f32, far: f32) -> Self {
        let mut camera = Self { fov, aspect, near, far, projection: Mat4::IDENTITY };
        camera.update_projection_matrix();
        camera
    }

    pub fn update_projection_matrix(&mut self) {
        self.projection = Mat4::perspective_rh(self.fov.to_radians(), self.aspect, self.near, self.far);
    }

    pub fn projection(&self) -> Mat4 {
        self.projection
    }
}


#[cfg(test)]
mod test {
    use glam::{Mat4, Vec3};
    use super::PerspectiveCamera;

    #[test]
    fn projection_is_cached_until_updated() {
        let mut camera = PerspectiveCamera::new(75.0, 1.0, 0.1, 1000.0);
        let before = camera.projection();
        camera.aspect = 800.0 / 600.0;
        assert_eq!(before, camera.projection());
        camera.update_projection_matrix();
        let expected = Mat4::perspective_rh(75f32.to_radians(), 800.0 / 600.0, 0.1, 1000.0);
        assert_eq!(expected, camera.projection());
    }

    #[test]
    fn near_plane_maps_to_zero_depth() {
        let camera = PerspectiveCamera::new(75.0, 1.0, 0.1, 1000.0);
        let projected = camera.projection().project_point3(Vec3::new(0.0, 0.0, -0.1));
        assert!(projected.z.abs() < 1e-5, "{projected}");
    }
}
