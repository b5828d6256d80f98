use std::f32::consts::TAU;
use glam::{Mat3, Quat, Vec3};
use crate::graphics::Color;
use crate::graphics::g3d::{Light, LineData};
use crate::graphics::scene::{NodeId, Scene, SceneGraphError};

/**
 * Debug visualization that mirrors another node's derived state.
 * Lines are cached in world space and only change through [`Scene::update_helper`].
 */
#[derive(Clone, Debug)]
pub struct Helper {
    pub kind: HelperKind,
    color: Option<Color>,
    lines: LineData,
    resolved_color: Color,
}

#[derive(Copy, Clone, PartialEq, Debug)]
pub enum HelperKind {
    /// Cone of a spot light, from its position towards its target.
    SpotLight { light: NodeId },
    /// Square around a directional light and a line to its target.
    DirectionalLight { light: NodeId, size: f32 },
    /// One segment per vertex of a mesh, along its world-space normal.
    VertexNormals { object: NodeId, size: f32 },
}

impl Helper {

    pub fn spot_light(light: NodeId) -> Self {
        Self::new(HelperKind::SpotLight { light }, None)
    }

    pub fn directional_light(light: NodeId, size: f32) -> Self {
        Self::new(HelperKind::DirectionalLight { light, size }, None)
    }

    pub fn vertex_normals(object: NodeId, size: f32, color: Color) -> Self {
        Self::new(HelperKind::VertexNormals { object, size }, Some(color))
    }

    fn new(kind: HelperKind, color: Option<Color>) -> Self {
        Self {
            kind,
            color,
            lines: LineData::new(),
            resolved_color: color.unwrap_or(Color::WHITE),
        }
    }

    /// Node being visualized.
    pub fn subject(&self) -> NodeId {
        match self.kind {
            HelperKind::SpotLight { light } => light,
            HelperKind::DirectionalLight { light, .. } => light,
            HelperKind::VertexNormals { object, .. } => object,
        }
    }

    /// World-space segments as of the last refresh.
    pub fn lines(&self) -> &LineData {
        &self.lines
    }

    /// Explicit color, or the light's color as of the last refresh.
    pub fn color(&self) -> Color {
        self.resolved_color
    }

    pub(crate) fn refresh(&mut self, scene: &Scene) -> Result<(), SceneGraphError> {
        let (lines, color) = match self.kind {
            HelperKind::SpotLight { light } => spot_light_lines(scene, light)?,
            HelperKind::DirectionalLight { light, size } => directional_light_lines(scene, light, size)?,
            HelperKind::VertexNormals { object, size } => (vertex_normal_lines(scene, object, size)?, Color::WHITE),
        };
        self.lines = lines;
        self.resolved_color = self.color.unwrap_or(color);
        Ok(())
    }
}

fn light_and_position(scene: &Scene, light_id: NodeId) -> Result<(&Light, Vec3), SceneGraphError> {
    let light = scene
        .object(light_id)?
        .as_light()
        .ok_or(SceneGraphError::WrongKind)?;
    Ok((light, scene.world_position(light_id)?))
}

/// Rotation taking +Z onto the direction from `from` to `to`.
fn aim(from: Vec3, to: Vec3) -> Quat {
    let direction = (to - from).normalize_or_zero();
    if direction == Vec3::ZERO {
        Quat::IDENTITY
    }
    else {
        Quat::from_rotation_arc(Vec3::Z, direction)
    }
}

fn spot_light_lines(scene: &Scene, light_id: NodeId) -> Result<(LineData, Color), SceneGraphError> {
    let (light, position) = light_and_position(scene, light_id)?;
    let Light::Spot(spot) = light else {
        return Err(SceneGraphError::WrongKind);
    };
    let length = if spot.distance > 0.0 { spot.distance } else { 1000.0 };
    let width = length * spot.angle.tan();
    let rotation = aim(position, spot.target);
    let to_world = |p: Vec3| position + rotation * (p * Vec3::new(width, width, length));

    let mut lines = LineData::new();
    let rim = [Vec3::new(0.0, 0.0, 1.0), Vec3::new(1.0, 0.0, 1.0), Vec3::new(-1.0, 0.0, 1.0), Vec3::new(0.0, 1.0, 1.0), Vec3::new(0.0, -1.0, 1.0)];
    for point in rim {
        lines.push_segment(to_world(Vec3::ZERO), to_world(point));
    }
    const SEGMENTS: u32 = 32;
    for i in 0..SEGMENTS {
        let p1 = i as f32 / SEGMENTS as f32 * TAU;
        let p2 = (i + 1) as f32 / SEGMENTS as f32 * TAU;
        lines.push_segment(
            to_world(Vec3::new(p1.cos(), p1.sin(), 1.0)),
            to_world(Vec3::new(p2.cos(), p2.sin(), 1.0)),
        );
    }
    Ok((lines, spot.color))
}

fn directional_light_lines(scene: &Scene, light_id: NodeId, size: f32) -> Result<(LineData, Color), SceneGraphError> {
    let (light, position) = light_and_position(scene, light_id)?;
    let Light::Directional(directional) = light else {
        return Err(SceneGraphError::WrongKind);
    };
    let rotation = aim(position, directional.target);
    let to_world = |p: Vec3| position + rotation * p;

    let mut lines = LineData::new();
    let corners = [
        Vec3::new(-size, size, 0.0),
        Vec3::new(size, size, 0.0),
        Vec3::new(size, -size, 0.0),
        Vec3::new(-size, -size, 0.0),
    ];
    for i in 0..corners.len() {
        lines.push_segment(to_world(corners[i]), to_world(corners[(i + 1) % corners.len()]));
    }
    lines.push_segment(position, directional.target);
    Ok((lines, directional.color))
}

fn vertex_normal_lines(scene: &Scene, object_id: NodeId, size: f32) -> Result<LineData, SceneGraphError> {
    let mesh = scene
        .object(object_id)?
        .as_mesh()
        .ok_or(SceneGraphError::WrongKind)?;
    let world = scene.world_matrix(object_id)?;
    let normal_matrix = Mat3::from(world.matrix3).inverse().transpose();
    let geometry = &mesh.geometry;
    let mut lines = LineData::new();
    let Some(normals) = &geometry.normals else {
        return Ok(lines);
    };
    for (position, normal) in geometry.positions.iter().zip(normals) {
        let start = world.transform_point3(*position);
        let direction = (normal_matrix * *normal).normalize_or_zero();
        lines.push_segment(start, start + direction * size);
    }
    Ok(lines)
}
