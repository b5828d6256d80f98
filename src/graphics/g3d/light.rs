use glam::{Mat4, Vec3};
use crate::graphics::Color;

/// Light payload of a scene object. Positions come from the object's world transform.
#[derive(Clone, PartialEq, Debug)]
pub enum Light {
    Ambient(AmbientLight),
    Directional(DirectionalLight),
    Spot(SpotLight),
}

impl Light {
    pub fn color(&self) -> Color {
        match self {
            Light::Ambient(light) => light.color,
            Light::Directional(light) => light.color,
            Light::Spot(light) => light.color,
        }
    }

    pub fn intensity(&self) -> f32 {
        match self {
            Light::Ambient(light) => light.intensity,
            Light::Directional(light) => light.intensity,
            Light::Spot(light) => light.intensity,
        }
    }

    /// World-space aim point, for lights that have one.
    pub fn target(&self) -> Option<Vec3> {
        match self {
            Light::Ambient(_) => None,
            Light::Directional(light) => Some(light.target),
            Light::Spot(light) => Some(light.target),
        }
    }

    pub fn set_target(&mut self, target: Vec3) {
        match self {
            Light::Ambient(_) => {},
            Light::Directional(light) => light.target = target,
            Light::Spot(light) => light.target = target,
        }
    }
}

impl From<AmbientLight> for Light {
    fn from(light: AmbientLight) -> Self {
        Self::Ambient(light)
    }
}

impl From<DirectionalLight> for Light {
    fn from(light: DirectionalLight) -> Self {
        Self::Directional(light)
    }
}

impl From<SpotLight> for Light {
    fn from(light: SpotLight) -> Self {
        Self::Spot(light)
    }
}

/// Uniform light from every direction.
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct AmbientLight {
    pub color: Color,
    pub intensity: f32,
}

impl AmbientLight {
    pub fn new(color: Color, intensity: f32) -> Self {
        Self { color, intensity }
    }
}

/**
 * Parallel light shining from its position towards `target`.
 * Shadows are cast when the owning object has `cast_shadow` set.
 */
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct DirectionalLight {
    pub color: Color,
    pub intensity: f32,
    pub target: Vec3,
    pub shadow: DirectionalShadow,
}

impl DirectionalLight {
    pub fn new(color: Color, intensity: f32) -> Self {
        Self {
            color,
            intensity,
            target: Vec3::ZERO,
            shadow: DirectionalShadow::default(),
        }
    }

    /// Unit vector pointing from the light towards its target.
    pub fn direction(&self, position: Vec3) -> Vec3 {
        let direction = (self.target - position).normalize_or_zero();
        if direction == Vec3::ZERO { Vec3::NEG_Y } else { direction }
    }
}

/// Orthographic shadow camera and shadow map settings of a [`DirectionalLight`].
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct DirectionalShadow {
    pub left: f32,
    pub right: f32,
    pub top: f32,
    pub bottom: f32,
    pub near: f32,
    pub far: f32,
    /// Width and height of the square shadow map in texels.
    pub map_size: u32,
    /// Softness of the shadow edge, in shadow map texels.
    pub radius: f32,
    pub bias: f32,
}

impl Default for DirectionalShadow {
    fn default() -> Self {
        Self {
            left: -5.0,
            right: 5.0,
            top: 5.0,
            bottom: -5.0,
            near: 0.5,
            far: 500.0,
            map_size: 512,
            radius: 1.0,
            bias: 0.0,
        }
    }
}

impl DirectionalShadow {
    /**
     * Projection times view of the shadow camera placed at `position` looking at `target`.
     */
    pub fn view_projection(&self, position: Vec3, target: Vec3) -> Mat4 {
        let forward = (target - position).normalize_or_zero();
        let up = if forward.cross(Vec3::Y).length_squared() < 1e-8 { Vec3::Z } else { Vec3::Y };
        let view = Mat4::look_at_rh(position, target, up);
        let projection = Mat4::orthographic_rh(self.left, self.right, self.bottom, self.top, self.near, self.far);
        projection * view
    }
}

/**
 * Cone of light from its position towards `target`.
 * `angle` is the half-angle of the cone in radians, `penumbra` the fraction of it that fades out.
 */
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct SpotLight {
    pub color: Color,
    pub intensity: f32,
    /// Range of the light. Zero means unlimited.
    pub distance: f32,
    pub angle: f32,
    pub penumbra: f32,
    pub decay: f32,
    pub target: Vec3,
}

impl SpotLight {
    pub fn new(color: Color, intensity: f32) -> Self {
        Self {
            color,
            intensity,
            distance: 0.0,
            angle: std::f32::consts::FRAC_PI_3,
            penumbra: 0.0,
            decay: 2.0,
            target: Vec3::ZERO,
        }
    }

    pub fn with_angle(mut self, angle: f32) -> Self {
        self.angle = angle;
        self
    }

    pub fn with_penumbra(mut self, penumbra: f32) -> Self {
        self.penumbra = penumbra;
        self
    }

    /// Cosines of the outer cone edge and of the start of the penumbra.
    pub fn cone_cosines(&self) -> (f32, f32) {
        let cone_cos = self.angle.cos();
        let penumbra_cos = (self.angle * (1.0 - self.penumbra)).cos();
        (cone_cos, penumbra_cos)
    }
}


#[cfg(test)]
mod test {
    use glam::Vec3;
    use crate::graphics::Color;
    use super::{DirectionalShadow, SpotLight};

    #[test]
    fn shadow_camera_straight_down() {
        let shadow = DirectionalShadow { top: 11.0, bottom: -11.0, ..Default::default() };
        let view_projection = shadow.view_projection(Vec3::new(0.0, 5.0, 0.0), Vec3::ZERO);
        let origin = view_projection.project_point3(Vec3::ZERO);
        assert!(origin.x.abs() < 1e-5 && origin.y.abs() < 1e-5, "{origin}");
        assert!(origin.z > 0.0 && origin.z < 1.0);
        assert!(view_projection.is_finite());
    }

    #[test]
    fn penumbra_widens_inner_cone() {
        let light = SpotLight::new(Color::WHITE, 2.0)
            .with_angle(40f32.to_radians())
            .with_penumbra(0.2);
        let (cone, penumbra) = light.cone_cosines();
        assert!(penumbra > cone);
        assert!((penumbra - 32f32.to_radians().cos()).abs() < 1e-6);
    }
}
