//! Procedural primitives.
//! Each shape is a plain parameter struct that converts into [`MeshData`] with positions,
//! normals, uvs and an index list.

use std::f32::consts::{PI, TAU};
use glam::{Vec2, Vec3};
use crate::graphics::g3d::MeshData;

/// Accumulates vertices while a shape is generated.
#[derive(Default)]
struct MeshBuilder {
    indices: Vec<u32>,
    positions: Vec<Vec3>,
    normals: Vec<Vec3>,
    uvs: Vec<Vec2>,
}

impl MeshBuilder {

    fn push(&mut self, position: Vec3, normal: Vec3, uv: Vec2) -> u32 {
        let index = self.positions.len() as u32;
        self.positions.push(position);
        self.normals.push(normal);
        self.uvs.push(uv);
        index
    }

    fn next_index(&self) -> u32 {
        self.positions.len() as u32
    }

    /// Two triangles of the quad a-b-c-d, split along b-d.
    fn quad(&mut self, a: u32, b: u32, c: u32, d: u32) {
        self.indices.extend([a, b, d, b, c, d]);
    }

    fn build(self) -> MeshData {
        MeshData {
            indices: self.indices,
            positions: self.positions,
            colors: None,
            normals: Some(self.normals),
            uvs: Some(self.uvs),
            uv2: None,
        }
    }
}

fn segments(value: u32, min: u32) -> u32 {
    value.max(min)
}


/**
 * Axis-aligned box centered at the origin, subdivided per axis.
 */
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct BoxGeometry {
    pub width: f32,
    pub height: f32,
    pub depth: f32,
    pub width_segments: u32,
    pub height_segments: u32,
    pub depth_segments: u32,
}

impl Default for BoxGeometry {
    fn default() -> Self {
        Self::new(1.0, 1.0, 1.0)
    }
}

impl BoxGeometry {
    pub fn new(width: f32, height: f32, depth: f32) -> Self {
        Self { width, height, depth, width_segments: 1, height_segments: 1, depth_segments: 1 }
    }

    pub fn with_segments(mut self, width: u32, height: u32, depth: u32) -> Self {
        self.width_segments = width;
        self.height_segments = height;
        self.depth_segments = depth;
        self
    }
}

impl From<BoxGeometry> for MeshData {
    fn from(shape: BoxGeometry) -> Self {
        let BoxGeometry { width, height, depth, .. } = shape;
        let ws = segments(shape.width_segments, 1);
        let hs = segments(shape.height_segments, 1);
        let ds = segments(shape.depth_segments, 1);
        let mut builder = MeshBuilder::default();
        box_face(&mut builder, [2, 1, 0], -1.0, -1.0, [depth, height, width], [ds, hs]);
        box_face(&mut builder, [2, 1, 0], 1.0, -1.0, [depth, height, -width], [ds, hs]);
        box_face(&mut builder, [0, 2, 1], 1.0, 1.0, [width, depth, height], [ws, ds]);
        box_face(&mut builder, [0, 2, 1], 1.0, -1.0, [width, depth, -height], [ws, ds]);
        box_face(&mut builder, [0, 1, 2], 1.0, -1.0, [width, height, depth], [ws, hs]);
        box_face(&mut builder, [0, 1, 2], -1.0, -1.0, [width, height, -depth], [ws, hs]);
        builder.build()
    }
}

/**
 * One face of a box. `axes` maps the face's (u, v, w) axes onto (x, y, z) indices,
 * `size` is (face width, face height, signed box extent along w).
 */
fn box_face(builder: &mut MeshBuilder, axes: [usize; 3], u_dir: f32, v_dir: f32, size: [f32; 3], grid: [u32; 2]) {
    let [u, v, w] = axes;
    let [face_width, face_height, extent] = size;
    let [grid_x, grid_y] = grid;
    let segment_width = face_width / grid_x as f32;
    let segment_height = face_height / grid_y as f32;
    let start = builder.next_index();
    for iy in 0..=grid_y {
        let y = iy as f32 * segment_height - face_height / 2.0;
        for ix in 0..=grid_x {
            let x = ix as f32 * segment_width - face_width / 2.0;
            let mut position = [0.0; 3];
            position[u] = x * u_dir;
            position[v] = y * v_dir;
            position[w] = extent / 2.0;
            let mut normal = [0.0; 3];
            normal[w] = if extent > 0.0 { 1.0 } else { -1.0 };
            let uv = Vec2::new(ix as f32 / grid_x as f32, 1.0 - iy as f32 / grid_y as f32);
            builder.push(Vec3::from(position), Vec3::from(normal), uv);
        }
    }
    let row = grid_x + 1;
    for iy in 0..grid_y {
        for ix in 0..grid_x {
            let a = start + ix + row * iy;
            let b = start + ix + row * (iy + 1);
            let c = start + ix + 1 + row * (iy + 1);
            let d = start + ix + 1 + row * iy;
            builder.quad(a, b, c, d);
        }
    }
}


/**
 * UV sphere. Partial spheres are made with the phi (around Y) and theta (from +Y) ranges.
 */
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct SphereGeometry {
    pub radius: f32,
    pub width_segments: u32,
    pub height_segments: u32,
    pub phi_start: f32,
    pub phi_length: f32,
    pub theta_start: f32,
    pub theta_length: f32,
}

impl Default for SphereGeometry {
    fn default() -> Self {
        Self::new(1.0, 32, 16)
    }
}

impl SphereGeometry {
    pub fn new(radius: f32, width_segments: u32, height_segments: u32) -> Self {
        Self {
            radius,
            width_segments,
            height_segments,
            phi_start: 0.0,
            phi_length: TAU,
            theta_start: 0.0,
            theta_length: PI,
        }
    }

    pub fn with_phi(mut self, start: f32, length: f32) -> Self {
        self.phi_start = start;
        self.phi_length = length;
        self
    }

    pub fn with_theta(mut self, start: f32, length: f32) -> Self {
        self.theta_start = start;
        self.theta_length = length;
        self
    }
}

impl From<SphereGeometry> for MeshData {
    fn from(shape: SphereGeometry) -> Self {
        let ws = segments(shape.width_segments, 3);
        let hs = segments(shape.height_segments, 2);
        let theta_end = (shape.theta_start + shape.theta_length).min(PI);
        let mut builder = MeshBuilder::default();
        let mut grid = Vec::with_capacity(hs as usize + 1);
        for iy in 0..=hs {
            let v = iy as f32 / hs as f32;
            let u_offset = if iy == 0 && shape.theta_start == 0.0 {
                0.5 / ws as f32
            }
            else if iy == hs && theta_end == PI {
                -0.5 / ws as f32
            }
            else {
                0.0
            };
            let theta = shape.theta_start + v * shape.theta_length;
            let mut row = Vec::with_capacity(ws as usize + 1);
            for ix in 0..=ws {
                let u = ix as f32 / ws as f32;
                let phi = shape.phi_start + u * shape.phi_length;
                let position = Vec3::new(
                    -shape.radius * phi.cos() * theta.sin(),
                    shape.radius * theta.cos(),
                    shape.radius * phi.sin() * theta.sin(),
                );
                let uv = Vec2::new(u + u_offset, 1.0 - v);
                row.push(builder.push(position, position.normalize_or_zero(), uv));
            }
            grid.push(row);
        }
        for iy in 0..hs as usize {
            for ix in 0..ws as usize {
                let a = grid[iy][ix + 1];
                let b = grid[iy][ix];
                let c = grid[iy + 1][ix];
                let d = grid[iy + 1][ix + 1];
                if iy != 0 || shape.theta_start > 0.0 {
                    builder.indices.extend([a, b, d]);
                }
                if iy != hs as usize - 1 || theta_end < PI {
                    builder.indices.extend([b, c, d]);
                }
            }
        }
        builder.build()
    }
}


/**
 * Rectangle in the XY plane facing +Z.
 */
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct PlaneGeometry {
    pub width: f32,
    pub height: f32,
    pub width_segments: u32,
    pub height_segments: u32,
}

impl Default for PlaneGeometry {
    fn default() -> Self {
        Self::new(1.0, 1.0)
    }
}

impl PlaneGeometry {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height, width_segments: 1, height_segments: 1 }
    }

    pub fn with_segments(mut self, width: u32, height: u32) -> Self {
        self.width_segments = width;
        self.height_segments = height;
        self
    }
}

impl From<PlaneGeometry> for MeshData {
    fn from(shape: PlaneGeometry) -> Self {
        let grid_x = segments(shape.width_segments, 1);
        let grid_y = segments(shape.height_segments, 1);
        let segment_width = shape.width / grid_x as f32;
        let segment_height = shape.height / grid_y as f32;
        let mut builder = MeshBuilder::default();
        for iy in 0..=grid_y {
            let y = iy as f32 * segment_height - shape.height / 2.0;
            for ix in 0..=grid_x {
                let x = ix as f32 * segment_width - shape.width / 2.0;
                let uv = Vec2::new(ix as f32 / grid_x as f32, 1.0 - iy as f32 / grid_y as f32);
                builder.push(Vec3::new(x, -y, 0.0), Vec3::Z, uv);
            }
        }
        let row = grid_x + 1;
        for iy in 0..grid_y {
            for ix in 0..grid_x {
                builder.quad(ix + row * iy, ix + row * (iy + 1), ix + 1 + row * (iy + 1), ix + 1 + row * iy);
            }
        }
        builder.build()
    }
}


/**
 * Disc or disc sector in the XY plane facing +Z.
 */
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct CircleGeometry {
    pub radius: f32,
    pub segments: u32,
    pub theta_start: f32,
    pub theta_length: f32,
}

impl Default for CircleGeometry {
    fn default() -> Self {
        Self::new(1.0, 32)
    }
}

impl CircleGeometry {
    pub fn new(radius: f32, segments: u32) -> Self {
        Self { radius, segments, theta_start: 0.0, theta_length: TAU }
    }

    pub fn with_theta(mut self, start: f32, length: f32) -> Self {
        self.theta_start = start;
        self.theta_length = length;
        self
    }
}

impl From<CircleGeometry> for MeshData {
    fn from(shape: CircleGeometry) -> Self {
        let count = segments(shape.segments, 3);
        let mut builder = MeshBuilder::default();
        builder.push(Vec3::ZERO, Vec3::Z, Vec2::splat(0.5));
        for s in 0..=count {
            let segment = shape.theta_start + s as f32 / count as f32 * shape.theta_length;
            let position = Vec3::new(shape.radius * segment.cos(), shape.radius * segment.sin(), 0.0);
            let uv = Vec2::new(segment.cos() + 1.0, segment.sin() + 1.0) / 2.0;
            builder.push(position, Vec3::Z, uv);
        }
        for i in 1..=count {
            builder.indices.extend([i, i + 1, 0]);
        }
        builder.build()
    }
}


/**
 * Cylinder or truncated cone along Y, centered at the origin.
 */
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct CylinderGeometry {
    pub radius_top: f32,
    pub radius_bottom: f32,
    pub height: f32,
    pub radial_segments: u32,
    pub height_segments: u32,
    pub open_ended: bool,
    pub theta_start: f32,
    pub theta_length: f32,
}

impl Default for CylinderGeometry {
    fn default() -> Self {
        Self::new(1.0, 1.0, 1.0, 32)
    }
}

impl CylinderGeometry {
    pub fn new(radius_top: f32, radius_bottom: f32, height: f32, radial_segments: u32) -> Self {
        Self {
            radius_top,
            radius_bottom,
            height,
            radial_segments,
            height_segments: 1,
            open_ended: false,
            theta_start: 0.0,
            theta_length: TAU,
        }
    }

    pub fn with_height_segments(mut self, height_segments: u32) -> Self {
        self.height_segments = height_segments;
        self
    }

    pub fn with_open_ended(mut self, open_ended: bool) -> Self {
        self.open_ended = open_ended;
        self
    }

    pub fn with_theta(mut self, start: f32, length: f32) -> Self {
        self.theta_start = start;
        self.theta_length = length;
        self
    }
}

impl From<CylinderGeometry> for MeshData {
    fn from(shape: CylinderGeometry) -> Self {
        let radial = segments(shape.radial_segments, 1);
        let rows = segments(shape.height_segments, 1);
        let half_height = shape.height / 2.0;
        let slope = (shape.radius_bottom - shape.radius_top) / shape.height;
        let mut builder = MeshBuilder::default();

        // Torso
        let mut grid = Vec::with_capacity(rows as usize + 1);
        for y in 0..=rows {
            let v = y as f32 / rows as f32;
            let radius = v * (shape.radius_bottom - shape.radius_top) + shape.radius_top;
            let mut row = Vec::with_capacity(radial as usize + 1);
            for x in 0..=radial {
                let u = x as f32 / radial as f32;
                let theta = u * shape.theta_length + shape.theta_start;
                let (sin, cos) = theta.sin_cos();
                let position = Vec3::new(radius * sin, -v * shape.height + half_height, radius * cos);
                let normal = Vec3::new(sin, slope, cos).normalize();
                row.push(builder.push(position, normal, Vec2::new(u, 1.0 - v)));
            }
            grid.push(row);
        }
        for x in 0..radial as usize {
            for y in 0..rows as usize {
                let a = grid[y][x];
                let b = grid[y + 1][x];
                let c = grid[y + 1][x + 1];
                let d = grid[y][x + 1];
                if shape.radius_top > 0.0 || y != 0 {
                    builder.indices.extend([a, b, d]);
                }
                if shape.radius_bottom > 0.0 || y != rows as usize - 1 {
                    builder.indices.extend([b, c, d]);
                }
            }
        }

        // Caps
        if !shape.open_ended {
            if shape.radius_top > 0.0 {
                cylinder_cap(&mut builder, &shape, radial, true);
            }
            if shape.radius_bottom > 0.0 {
                cylinder_cap(&mut builder, &shape, radial, false);
            }
        }
        builder.build()
    }
}

fn cylinder_cap(builder: &mut MeshBuilder, shape: &CylinderGeometry, radial: u32, top: bool) {
    let radius = if top { shape.radius_top } else { shape.radius_bottom };
    let sign = if top { 1.0 } else { -1.0 };
    let y = shape.height / 2.0 * sign;
    let normal = Vec3::new(0.0, sign, 0.0);
    let center_start = builder.next_index();
    for _ in 0..radial {
        builder.push(Vec3::new(0.0, y, 0.0), normal, Vec2::splat(0.5));
    }
    let rim_start = builder.next_index();
    for x in 0..=radial {
        let u = x as f32 / radial as f32;
        let theta = u * shape.theta_length + shape.theta_start;
        let (sin, cos) = theta.sin_cos();
        let uv = Vec2::new(cos * 0.5 + 0.5, sin * 0.5 * sign + 0.5);
        builder.push(Vec3::new(radius * sin, y, radius * cos), normal, uv);
    }
    for x in 0..radial {
        let center = center_start + x;
        let rim = rim_start + x;
        if top {
            builder.indices.extend([rim, rim + 1, center]);
        }
        else {
            builder.indices.extend([rim + 1, rim, center]);
        }
    }
}


/**
 * Cone along Y with its apex at the top.
 */
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct ConeGeometry {
    pub radius: f32,
    pub height: f32,
    pub radial_segments: u32,
    pub height_segments: u32,
    pub open_ended: bool,
    pub theta_start: f32,
    pub theta_length: f32,
}

impl Default for ConeGeometry {
    fn default() -> Self {
        Self::new(1.0, 1.0, 32)
    }
}

impl ConeGeometry {
    pub fn new(radius: f32, height: f32, radial_segments: u32) -> Self {
        Self {
            radius,
            height,
            radial_segments,
            height_segments: 1,
            open_ended: false,
            theta_start: 0.0,
            theta_length: TAU,
        }
    }

    pub fn with_height_segments(mut self, height_segments: u32) -> Self {
        self.height_segments = height_segments;
        self
    }

    pub fn with_open_ended(mut self, open_ended: bool) -> Self {
        self.open_ended = open_ended;
        self
    }

    pub fn with_theta(mut self, start: f32, length: f32) -> Self {
        self.theta_start = start;
        self.theta_length = length;
        self
    }
}

impl From<ConeGeometry> for CylinderGeometry {
    fn from(cone: ConeGeometry) -> Self {
        CylinderGeometry::new(0.0, cone.radius, cone.height, cone.radial_segments)
            .with_height_segments(cone.height_segments)
            .with_open_ended(cone.open_ended)
            .with_theta(cone.theta_start, cone.theta_length)
    }
}

impl From<ConeGeometry> for MeshData {
    fn from(cone: ConeGeometry) -> Self {
        CylinderGeometry::from(cone).into()
    }
}


/**
 * Flat annulus in the XY plane facing +Z.
 */
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct RingGeometry {
    pub inner_radius: f32,
    pub outer_radius: f32,
    pub theta_segments: u32,
    pub phi_segments: u32,
    pub theta_start: f32,
    pub theta_length: f32,
}

impl Default for RingGeometry {
    fn default() -> Self {
        Self::new(0.5, 1.0, 32)
    }
}

impl RingGeometry {
    pub fn new(inner_radius: f32, outer_radius: f32, theta_segments: u32) -> Self {
        Self {
            inner_radius,
            outer_radius,
            theta_segments,
            phi_segments: 1,
            theta_start: 0.0,
            theta_length: TAU,
        }
    }

    pub fn with_phi_segments(mut self, phi_segments: u32) -> Self {
        self.phi_segments = phi_segments;
        self
    }

    pub fn with_theta(mut self, start: f32, length: f32) -> Self {
        self.theta_start = start;
        self.theta_length = length;
        self
    }
}

impl From<RingGeometry> for MeshData {
    fn from(shape: RingGeometry) -> Self {
        let theta_segments = segments(shape.theta_segments, 3);
        let phi_segments = segments(shape.phi_segments, 1);
        let radius_step = (shape.outer_radius - shape.inner_radius) / phi_segments as f32;
        let mut builder = MeshBuilder::default();
        let mut radius = shape.inner_radius;
        for _ in 0..=phi_segments {
            for i in 0..=theta_segments {
                let segment = shape.theta_start + i as f32 / theta_segments as f32 * shape.theta_length;
                let position = Vec3::new(radius * segment.cos(), radius * segment.sin(), 0.0);
                let uv = Vec2::new(
                    (position.x / shape.outer_radius + 1.0) / 2.0,
                    (position.y / shape.outer_radius + 1.0) / 2.0,
                );
                builder.push(position, Vec3::Z, uv);
            }
            radius += radius_step;
        }
        for j in 0..phi_segments {
            let level = j * (theta_segments + 1);
            for i in 0..theta_segments {
                let segment = i + level;
                builder.quad(segment, segment + theta_segments + 1, segment + theta_segments + 2, segment + 1);
            }
        }
        builder.build()
    }
}


/**
 * Torus around the Z axis, optionally cut to an arc.
 */
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct TorusGeometry {
    pub radius: f32,
    pub tube: f32,
    pub radial_segments: u32,
    pub tubular_segments: u32,
    pub arc: f32,
}

impl Default for TorusGeometry {
    fn default() -> Self {
        Self::new(1.0, 0.4, 12, 48)
    }
}

impl TorusGeometry {
    pub fn new(radius: f32, tube: f32, radial_segments: u32, tubular_segments: u32) -> Self {
        Self { radius, tube, radial_segments, tubular_segments, arc: TAU }
    }

    pub fn with_arc(mut self, arc: f32) -> Self {
        self.arc = arc;
        self
    }
}

impl From<TorusGeometry> for MeshData {
    fn from(shape: TorusGeometry) -> Self {
        let radial = segments(shape.radial_segments, 1);
        let tubular = segments(shape.tubular_segments, 1);
        let mut builder = MeshBuilder::default();
        for j in 0..=radial {
            for i in 0..=tubular {
                let u = i as f32 / tubular as f32 * shape.arc;
                let v = j as f32 / radial as f32 * TAU;
                let ring = shape.radius + shape.tube * v.cos();
                let position = Vec3::new(ring * u.cos(), ring * u.sin(), shape.tube * v.sin());
                let center = Vec3::new(shape.radius * u.cos(), shape.radius * u.sin(), 0.0);
                let uv = Vec2::new(i as f32 / tubular as f32, j as f32 / radial as f32);
                builder.push(position, (position - center).normalize_or_zero(), uv);
            }
        }
        let row = tubular + 1;
        for j in 1..=radial {
            for i in 1..=tubular {
                builder.quad(row * j + i - 1, row * (j - 1) + i - 1, row * (j - 1) + i, row * j + i);
            }
        }
        builder.build()
    }
}


/**
 * Tube swept along a (p, q) torus knot.
 */
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct TorusKnotGeometry {
    pub radius: f32,
    pub tube: f32,
    pub tubular_segments: u32,
    pub radial_segments: u32,
    pub p: u32,
    pub q: u32,
}

impl Default for TorusKnotGeometry {
    fn default() -> Self {
        Self::new(1.0, 0.4, 64, 8)
    }
}

impl TorusKnotGeometry {
    pub fn new(radius: f32, tube: f32, tubular_segments: u32, radial_segments: u32) -> Self {
        Self { radius, tube, tubular_segments, radial_segments, p: 2, q: 3 }
    }

    pub fn with_pq(mut self, p: u32, q: u32) -> Self {
        self.p = p;
        self.q = q;
        self
    }

    /// Point on the knot's center line.
    pub fn curve_point(&self, u: f32) -> Vec3 {
        let p = self.p.max(1) as f32;
        let q = self.q as f32;
        let qu_over_p = q / p * u;
        let cs = qu_over_p.cos();
        Vec3::new(
            self.radius * (2.0 + cs) * 0.5 * u.cos(),
            self.radius * (2.0 + cs) * 0.5 * u.sin(),
            self.radius * qu_over_p.sin() * 0.5,
        )
    }
}

impl From<TorusKnotGeometry> for MeshData {
    fn from(shape: TorusKnotGeometry) -> Self {
        let tubular = segments(shape.tubular_segments, 1);
        let radial = segments(shape.radial_segments, 1);
        let p = shape.p.max(1) as f32;
        let mut builder = MeshBuilder::default();
        for i in 0..=tubular {
            let u = i as f32 / tubular as f32 * p * TAU;
            let p1 = shape.curve_point(u);
            let p2 = shape.curve_point(u + 0.01);

            // Frenet-like frame
            let tangent = p2 - p1;
            let binormal = tangent.cross(p2 + p1);
            let normal = binormal.cross(tangent).normalize_or_zero();
            let binormal = binormal.normalize_or_zero();

            for j in 0..=radial {
                let v = j as f32 / radial as f32 * TAU;
                let cx = -shape.tube * v.cos();
                let cy = shape.tube * v.sin();
                let position = p1 + cx * normal + cy * binormal;
                let uv = Vec2::new(i as f32 / tubular as f32, j as f32 / radial as f32);
                builder.push(position, (position - p1).normalize_or_zero(), uv);
            }
        }
        let row = radial + 1;
        for j in 1..=tubular {
            for i in 1..=radial {
                builder.quad(row * (j - 1) + i - 1, row * j + i - 1, row * j + i, row * (j - 1) + i);
            }
        }
        builder.build()
    }
}


#[cfg(test)]
mod test {
    use std::f32::consts::PI;
    use glam::Vec3;
    use crate::graphics::g3d::MeshData;
    use super::*;

    fn check(mesh: &MeshData, vertices: usize, triangles: usize) {
        assert_eq!(Ok(()), mesh.validate());
        assert_eq!(vertices, mesh.vertex_count(), "vertex count");
        assert_eq!(triangles, mesh.triangle_count(), "triangle count");
        for normal in mesh.normals.as_ref().unwrap() {
            assert!((normal.length() - 1.0).abs() < 1e-4, "{normal}");
        }
    }

    #[test]
    fn unit_box() {
        let mesh = MeshData::from(BoxGeometry::default());
        check(&mesh, 24, 12);
        for position in &mesh.positions {
            assert!(position.abs().abs_diff_eq(Vec3::splat(0.5), 1e-6), "{position}");
        }
    }

    #[test]
    fn segmented_box() {
        let mesh = MeshData::from(BoxGeometry::new(1.0, 1.0, 1.0).with_segments(2, 2, 2));
        check(&mesh, 6 * 9, 6 * 8);
    }

    #[test]
    fn box_faces_wind_outward() {
        let mesh = MeshData::from(BoxGeometry::new(2.0, 3.0, 4.0));
        for [a, b, c] in mesh.triangles() {
            let normal = (b - a).cross(c - a);
            let center = (a + b + c) / 3.0;
            assert!(normal.dot(center) > 0.0);
        }
    }

    #[test]
    fn sphere() {
        let mesh = MeshData::from(SphereGeometry::new(1.0, 12, 12));
        check(&mesh, 13 * 13, 12 * 10 * 2 + 12 * 2);
        for position in &mesh.positions {
            assert!((position.length() - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn half_sphere_keeps_pole_rows() {
        let mesh = MeshData::from(SphereGeometry::new(1.5, 64, 64).with_phi(0.0, PI));
        assert_eq!(65 * 65, mesh.vertex_count());
        for position in &mesh.positions {
            assert!(position.z >= -1e-5, "{position}");
        }
    }

    #[test]
    fn plane_faces_positive_z() {
        let mesh = MeshData::from(PlaneGeometry::new(10.0, 10.0));
        check(&mesh, 4, 2);
        let [a, b, c] = mesh.triangles().next().unwrap();
        assert!((b - a).cross(c - a).z > 0.0);
    }

    #[test]
    fn circle() {
        let mesh = MeshData::from(CircleGeometry::new(0.5, 16));
        check(&mesh, 1 + 17, 16);
    }

    #[test]
    fn cylinder() {
        let mesh = MeshData::from(CylinderGeometry::default());
        check(&mesh, 66 + 65 * 2, 64 + 32 * 2);
        let open = MeshData::from(CylinderGeometry::default().with_open_ended(true));
        check(&open, 66, 64);
    }

    #[test]
    fn cone_skips_degenerate_apex() {
        let mesh = MeshData::from(ConeGeometry::new(1.0, 1.0, 32));
        check(&mesh, 66 + 65, 32 + 32);
        let apex = mesh.positions.iter().map(|p| p.y).fold(f32::MIN, f32::max);
        assert!((apex - 0.5).abs() < 1e-6);
    }

    #[test]
    fn ring() {
        let mesh = MeshData::from(RingGeometry::new(0.2, 1.0, 6).with_phi_segments(2));
        check(&mesh, 3 * 7, 2 * 6 * 2);
        for position in &mesh.positions {
            let r = position.length();
            assert!(r > 0.2 - 1e-5 && r < 1.0 + 1e-5);
        }
    }

    #[test]
    fn torus() {
        let mesh = MeshData::from(TorusGeometry::default());
        check(&mesh, 13 * 49, 12 * 48 * 2);
        for position in &mesh.positions {
            let ring_distance = (position.truncate().length() - 1.0).hypot(position.z);
            assert!((ring_distance - 0.4).abs() < 1e-4);
        }
    }

    #[test]
    fn torus_knot() {
        let shape = TorusKnotGeometry::new(0.6, 0.1, 64, 32).with_pq(3, 4);
        let mesh = MeshData::from(shape);
        check(&mesh, 65 * 33, 64 * 32 * 2);
    }
}
