use glam::{Mat4, Vec3};
use tracing::instrument;
use crate::framework::RenderError;
use crate::graphics::Color;
use crate::graphics::g3d::{DirectionalShadow, Light, LineData, Mesh, ObjectKind};
use crate::graphics::scene::{NodeId, Scene};

/// Creates a "flattened" version of the scene as seen from a camera.
/// All visible objects have their transforms propagated and are put into separate flat vecs.
#[instrument(skip_all)]
pub fn flatten_scene(scene: &Scene, camera_id: NodeId) -> Result<FlatScene<'_>, RenderError> {
    let camera_object = scene.get(camera_id).ok_or(RenderError::MissingCamera)?;
    let camera = camera_object.as_camera().ok_or(RenderError::NotACamera)?;
    let camera_world = scene
        .world_matrix(camera_id)
        .map_err(|_| RenderError::MissingCamera)?;
    let view = Mat4::from(camera_world.inverse());
    let mut flat = FlatScene {
        camera: FlatCamera {
            node: camera_id,
            view,
            projection: camera.projection(),
            position: camera_world.translation.into(),
        },
        background: scene.background,
        meshes: Vec::new(),
        lines: Vec::new(),
        ambient: Color::BLACK,
        directional_lights: Vec::new(),
        spot_lights: Vec::new(),
    };

    scene.traverse(|node, object, world| {
        let position = Vec3::from(world.translation);
        match &object.kind {
            ObjectKind::Mesh(mesh) => flat.meshes.push(FlatMesh {
                node,
                mesh,
                model: Mat4::from(world),
                cast_shadow: object.cast_shadow,
                receive_shadow: object.receive_shadow,
            }),
            ObjectKind::Lines(lines) => flat.lines.push(FlatLines {
                lines: &lines.geometry,
                model: Mat4::from(world),
                color: lines.material.color,
            }),
            ObjectKind::Helper(helper) => flat.lines.push(FlatLines {
                lines: helper.lines(),
                model: Mat4::IDENTITY,
                color: helper.color(),
            }),
            ObjectKind::Light(Light::Ambient(ambient)) => {
                let added = ambient.color.scaled(ambient.intensity);
                flat.ambient = Color::rgb(
                    flat.ambient.r + added.r,
                    flat.ambient.g + added.g,
                    flat.ambient.b + added.b,
                );
            },
            ObjectKind::Light(Light::Directional(directional)) => flat.directional_lights.push(FlatDirectionalLight {
                direction: directional.direction(position),
                position,
                target: directional.target,
                color: directional.color.scaled(directional.intensity),
                shadow: object.cast_shadow.then_some(directional.shadow),
            }),
            ObjectKind::Light(Light::Spot(spot)) => {
                let (cone_cos, penumbra_cos) = spot.cone_cosines();
                let direction = (spot.target - position).normalize_or_zero();
                flat.spot_lights.push(FlatSpotLight {
                    position,
                    direction: if direction == Vec3::ZERO { Vec3::NEG_Y } else { direction },
                    color: spot.color.scaled(spot.intensity),
                    distance: spot.distance,
                    decay: spot.decay,
                    cone_cos,
                    penumbra_cos,
                });
            },
            ObjectKind::Group | ObjectKind::Camera(_) => {},
        }
    });
    Ok(flat)
}

/// A scene flattened for one camera, with renderables separated by type.
pub struct FlatScene<'a> {
    pub camera: FlatCamera,
    pub background: Option<Color>,
    pub meshes: Vec<FlatMesh<'a>>,
    pub lines: Vec<FlatLines<'a>>,
    /// Sum of all ambient lights, intensity applied.
    pub ambient: Color,
    pub directional_lights: Vec<FlatDirectionalLight>,
    pub spot_lights: Vec<FlatSpotLight>,
}

impl<'a> FlatScene<'a> {
    /// First directional light that casts shadows, with its shadow settings.
    pub fn shadow_caster(&self) -> Option<(&FlatDirectionalLight, DirectionalShadow)> {
        self.directional_lights
            .iter()
            .find_map(|light| light.shadow.map(|shadow| (light, shadow)))
    }

    pub fn shadow_casting_meshes(&self) -> impl Iterator<Item = &FlatMesh<'a>> {
        self.meshes.iter().filter(|mesh| mesh.cast_shadow)
    }
}

/// Camera with its transform propagated.
#[derive(Copy, Clone, Debug)]
pub struct FlatCamera {
    pub node: NodeId,
    pub view: Mat4,
    pub projection: Mat4,
    pub position: Vec3,
}

impl FlatCamera {
    pub fn view_projection(&self) -> Mat4 {
        self.projection * self.view
    }
}

/// Mesh with its transform propagated.
pub struct FlatMesh<'a> {
    pub node: NodeId,
    pub mesh: &'a Mesh,
    pub model: Mat4,
    pub cast_shadow: bool,
    pub receive_shadow: bool,
}

/// Line segments with their transform propagated.
pub struct FlatLines<'a> {
    pub lines: &'a LineData,
    pub model: Mat4,
    pub color: Color,
}

#[derive(Copy, Clone, Debug)]
pub struct FlatDirectionalLight {
    pub position: Vec3,
    pub target: Vec3,
    pub direction: Vec3,
    pub color: Color,
    pub shadow: Option<DirectionalShadow>,
}

#[derive(Copy, Clone, Debug)]
pub struct FlatSpotLight {
    pub position: Vec3,
    pub direction: Vec3,
    pub color: Color,
    pub distance: f32,
    pub decay: f32,
    pub cone_cos: f32,
    pub penumbra_cos: f32,
}


#[cfg(test)]
mod test {
    use std::sync::Arc;
    use glam::Vec3;
    use crate::framework::RenderError;
    use crate::math::Transform;
    use crate::graphics::Color;
    use crate::graphics::g3d::*;
    use crate::graphics::scene::Scene;

    fn cube(scene: &mut Scene) {
        let geometry = Arc::new(MeshData::from(BoxGeometry::default()));
        let material = Material::from(PhongMaterial::new(Color::hex(0x44aa88))).into_shared();
        scene.add(Object3D::mesh(geometry, material).with_shadows(true, false)).unwrap();
    }

    #[test]
    fn requires_a_camera() {
        let mut scene = Scene::new();
        let group = scene.add(Object3D::group()).unwrap();
        assert!(matches!(flatten_scene(&scene, group), Err(RenderError::NotACamera)));
    }

    #[test]
    fn collects_renderables() {
        let mut scene = Scene::new();
        cube(&mut scene);
        scene.add(Object3D::light(AmbientLight::new(Color::WHITE, 0.2))).unwrap();
        scene.add(Object3D::light(DirectionalLight::new(Color::WHITE, 0.5))
            .with_transform(Transform::default().with_xyz(0.0, 5.0, 0.0))
            .with_shadows(true, false)
        ).unwrap();
        let camera = scene.spawn(Object3D::camera(PerspectiveCamera::new(75.0, 1.0, 0.1, 1000.0))
            .with_transform(Transform::default().with_xyz(0.0, 0.0, 2.0))
        );
        let flat = flatten_scene(&scene, camera).unwrap();
        assert_eq!(1, flat.meshes.len());
        assert_eq!(1, flat.shadow_casting_meshes().count());
        assert!((flat.ambient.r - 0.2).abs() < 1e-6);
        assert_eq!(1, flat.directional_lights.len());
        let (light, _) = flat.shadow_caster().unwrap();
        assert!(light.direction.abs_diff_eq(Vec3::NEG_Y, 1e-6));
        assert!(flat.camera.position.abs_diff_eq(Vec3::new(0.0, 0.0, 2.0), 1e-6));
        let origin = flat.camera.view.transform_point3(Vec3::ZERO);
        assert!(origin.abs_diff_eq(Vec3::new(0.0, 0.0, -2.0), 1e-6));
    }

    #[test]
    fn light_attached_to_camera_moves_with_it() {
        let mut scene = Scene::new();
        let camera = scene.add(Object3D::camera(PerspectiveCamera::default())
            .with_transform(Transform::default().with_xyz(0.0, 0.0, 4.0))
        ).unwrap();
        scene.add_child(camera, Object3D::light(DirectionalLight::new(Color::WHITE, 1.0))
            .with_transform(Transform::default().with_xyz(-1.0, 2.0, 4.0))
        ).unwrap();
        let flat = flatten_scene(&scene, camera).unwrap();
        assert!(flat.directional_lights[0].position.abs_diff_eq(Vec3::new(-1.0, 2.0, 8.0), 1e-6));
    }
}
