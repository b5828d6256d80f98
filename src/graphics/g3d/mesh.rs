use std::borrow::Cow;
use std::mem::size_of;
use bytemuck::bytes_of;
use wgpu::util::{DeviceExt, BufferInitDescriptor};
use wgpu::{VertexBufferLayout, VertexStepMode, VertexAttribute, VertexFormat, Buffer, Device, BufferUsages, IndexFormat};
use glam::{Vec3, Vec2};
use bitflags::bitflags;
use derive_more::*;
use crate::graphics::{Color, ShaderPreprocessor};

/**
 * Geometry of a mesh: an optional triangle index list and parallel vertex attribute arrays.
 * When `indices` is empty, every three consecutive vertices form a triangle.
 */
#[derive(Clone, Default, Debug, PartialEq)]
pub struct MeshData {
    pub indices:    Vec<u32>,
    pub positions:  Vec<Vec3>,
    pub colors:     Option<Vec<Color>>,
    pub normals:    Option<Vec<Vec3>>,
    pub uvs:        Option<Vec<Vec2>>,
    pub uv2:        Option<Vec<Vec2>>,
}

impl MeshData {
    const POSITION_LOCATION: u32    = 5;
    const COLOR_LOCATION: u32       = 6;
    const NORMAL_LOCATION: u32      = 7;
    const UV_LOCATION: u32          = 8;
    const UV2_LOCATION: u32         = 9;

    const POSITION_SIZE: usize      = size_of::<Vec3>();
    const COLOR_SIZE: usize         = size_of::<Color>();
    const NORMAL_SIZE: usize        = size_of::<Vec3>();
    const UV_SIZE: usize            = size_of::<Vec2>();

    pub fn new() -> Self {
        Self::default()
    }

    /**
     * Imports a flat attribute array, replacing the attribute of that kind.
     * Colors may have 3 or 4 components. Vertex counts are checked by [`MeshData::validate`].
     */
    pub fn set_attribute(&mut self, kind: AttributeKind, attribute: BufferAttribute) -> Result<&mut Self, GeometryError> {
        let name = kind.name();
        let expected = kind.item_size();
        let item_size = attribute.item_size;
        let size_ok = match kind {
            AttributeKind::Color => item_size == 3 || item_size == 4,
            _ => item_size == expected,
        };
        if !size_ok {
            return Err(GeometryError::InvalidItemSize { attribute: name, expected, actual: item_size });
        }
        if attribute.array.len() % item_size != 0 {
            return Err(GeometryError::RaggedArray { attribute: name, len: attribute.array.len(), item_size });
        }
        let items = attribute.array.chunks_exact(item_size);
        match kind {
            AttributeKind::Position => self.positions = items.map(Vec3::from_slice).collect(),
            AttributeKind::Normal => self.normals = Some(items.map(Vec3::from_slice).collect()),
            AttributeKind::Uv => self.uvs = Some(items.map(Vec2::from_slice).collect()),
            AttributeKind::Uv2 => self.uv2 = Some(items.map(Vec2::from_slice).collect()),
            AttributeKind::Color => self.colors = Some(items
                .map(|c| Color::new(c[0], c[1], c[2], c.get(3).copied().unwrap_or(1.0)))
                .collect()
            ),
        }
        Ok(self)
    }

    /// Builds validated geometry from raw attribute arrays and an optional index list.
    pub fn from_attributes(
        attributes: impl IntoIterator<Item = (AttributeKind, BufferAttribute)>,
        indices: impl Into<Vec<u32>>,
    ) -> Result<Self, GeometryError> {
        let mut mesh = Self::new();
        for (kind, attribute) in attributes {
            mesh.set_attribute(kind, attribute)?;
        }
        mesh.set_index(indices);
        mesh.validate()?;
        Ok(mesh)
    }

    pub fn set_index(&mut self, indices: impl Into<Vec<u32>>) -> &mut Self {
        self.indices = indices.into();
        self
    }

    /// Copies the first UV channel into the second.
    pub fn with_uv2_from_uv(mut self) -> Self {
        self.uv2 = self.uvs.clone();
        self
    }

    /**
     * Computes the [`MeshKey`].
     */
    pub fn key(&self) -> MeshKey {
        let mut key = MeshKey::NONE;
        if self.colors.is_some() {
            key |= MeshKey::COLOR;
        }
        if self.normals.is_some() {
            key |= MeshKey::NORMAL;
        }
        if self.uvs.is_some() {
            key |= MeshKey::UV;
        }
        if self.uv2.is_some() {
            key |= MeshKey::UV2;
        }
        key
    }

    /// Number of vertices stored.
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        if self.indices.is_empty() {
            self.positions.len() / 3
        }
        else {
            self.indices.len() / 3
        }
    }

    /**
     * Vertex index triples of every triangle.
     */
    pub fn triangle_indices(&self) -> Vec<[u32; 3]> {
        let indices = self.index_data();
        indices
            .chunks_exact(3)
            .map(|tri| [tri[0], tri[1], tri[2]])
            .collect()
    }

    /**
     * Positions of every triangle's corners.
     * Triangles referencing missing vertices are skipped.
     */
    pub fn triangles(&self) -> impl Iterator<Item = [Vec3; 3]> + '_ {
        self.triangle_indices()
            .into_iter()
            .filter_map(|[a, b, c]| Some([
                *self.positions.get(a as usize)?,
                *self.positions.get(b as usize)?,
                *self.positions.get(c as usize)?,
            ]))
    }

    /**
     * Checks that every attribute has one item per vertex and that the index list
     * only forms whole triangles over existing vertices.
     */
    pub fn validate(&self) -> Result<(), GeometryError> {
        let vertex_count = self.positions.len();
        let check = |attribute: &'static str, len: Option<usize>| match len {
            Some(len) if len != vertex_count => Err(GeometryError::LengthMismatch {
                attribute,
                expected: vertex_count,
                actual: len,
            }),
            _ => Ok(()),
        };
        check("color", self.colors.as_ref().map(Vec::len))?;
        check("normal", self.normals.as_ref().map(Vec::len))?;
        check("uv", self.uvs.as_ref().map(Vec::len))?;
        check("uv2", self.uv2.as_ref().map(Vec::len))?;
        let index_len = if self.indices.is_empty() { vertex_count } else { self.indices.len() };
        if index_len % 3 != 0 {
            return Err(GeometryError::IncompleteTriangle { len: index_len });
        }
        if let Some(&index) = self.indices.iter().find(|&&index| index as usize >= vertex_count) {
            return Err(GeometryError::IndexOutOfBounds { index, vertex_count });
        }
        Ok(())
    }

    /**
     * Replaces normals with area-weighted averages of adjacent face normals.
     */
    pub fn compute_vertex_normals(&mut self) {
        let mut normals = vec![Vec3::ZERO; self.positions.len()];
        for [a, b, c] in self.triangle_indices() {
            let (a, b, c) = (a as usize, b as usize, c as usize);
            if a.max(b).max(c) >= self.positions.len() {
                continue;
            }
            let (pa, pb, pc) = (self.positions[a], self.positions[b], self.positions[c]);
            let face = (pc - pb).cross(pa - pb);
            normals[a] += face;
            normals[b] += face;
            normals[c] += face;
        }
        for normal in &mut normals {
            *normal = normal.normalize_or_zero();
        }
        self.normals = Some(normals);
    }

    // Indices as stored, or a sequential list for non-indexed geometry.
    fn index_data(&self) -> Cow<'_, [u32]> {
        if self.indices.is_empty() {
            Cow::Owned((0..self.positions.len() as u32).collect())
        }
        else {
            Cow::Borrowed(&self.indices)
        }
    }

    /**
     * Interleaves vertex data into a single packed byte array.
     */
    fn vertex_bytes(&self) -> Vec<u8> {
        let mut vertex_data = Vec::with_capacity(self.vertex_count() * self.vertex_size());
        for i in 0..self.positions.len() {
            vertex_data.extend_from_slice(bytes_of(&self.positions[i]));
            if let Some(colors) = &self.colors {
                vertex_data.extend_from_slice(bytes_of(&colors[i]));
            }
            if let Some(normals) = &self.normals {
                vertex_data.extend_from_slice(bytes_of(&normals[i]));
            }
            if let Some(uvs) = &self.uvs {
                vertex_data.extend_from_slice(bytes_of(&uvs[i]));
            }
            if let Some(uv2) = &self.uv2 {
                vertex_data.extend_from_slice(bytes_of(&uv2[i]));
            }
        }
        vertex_data
    }

    /// Size of each vertex in bytes.
    fn vertex_size(&self) -> usize {
        let mut size = MeshData::POSITION_SIZE;
        if self.colors.is_some() {
            size += MeshData::COLOR_SIZE;
        }
        if self.normals.is_some() {
            size += MeshData::NORMAL_SIZE;
        }
        if self.uvs.is_some() {
            size += MeshData::UV_SIZE;
        }
        if self.uv2.is_some() {
            size += MeshData::UV_SIZE;
        }
        size
    }
}

/// Flat array of numbers with a fixed number of components per vertex.
#[derive(Clone, Debug, PartialEq)]
pub struct BufferAttribute {
    pub array: Vec<f32>,
    pub item_size: usize,
}

impl BufferAttribute {
    pub fn new(array: impl Into<Vec<f32>>, item_size: usize) -> Self {
        Self { array: array.into(), item_size }
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum AttributeKind {
    Position,
    Normal,
    Color,
    Uv,
    Uv2,
}

impl AttributeKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::Position => "position",
            Self::Normal => "normal",
            Self::Color => "color",
            Self::Uv => "uv",
            Self::Uv2 => "uv2",
        }
    }

    fn item_size(self) -> usize {
        match self {
            Self::Position | Self::Normal | Self::Color => 3,
            Self::Uv | Self::Uv2 => 2,
        }
    }
}

#[derive(Error, Display, Debug, Clone, Eq, PartialEq)]
pub enum GeometryError {
    #[display(fmt="Attribute '{attribute}' expects {expected} components per item, got {actual}")]
    InvalidItemSize { attribute: &'static str, expected: usize, actual: usize },
    #[display(fmt="Attribute '{attribute}' has {len} values, which is not a multiple of {item_size}")]
    RaggedArray { attribute: &'static str, len: usize, item_size: usize },
    #[display(fmt="Attribute '{attribute}' has {actual} items but there are {expected} vertices")]
    LengthMismatch { attribute: &'static str, expected: usize, actual: usize },
    #[display(fmt="Index {index} is out of bounds for {vertex_count} vertices")]
    IndexOutOfBounds { index: u32, vertex_count: usize },
    #[display(fmt="{len} indices do not form whole triangles")]
    IncompleteTriangle { len: usize },
}

bitflags! {
    /// Determines the "permutation" of a mesh.
    /// These are flags that determine which vertex attributes are available in a given mesh.
    /// Used for selecting pipelines from a cache.
    #[derive(Copy, Clone, Eq, PartialEq, Default, Debug, Hash)]
    pub struct MeshKey: u8 {
        const NONE      = 0b00000000;
        const COLOR     = 0b00000001;
        const NORMAL    = 0b00000010;
        const UV        = 0b00000100;
        const UV2       = 0b00001000;
    }
}

impl MeshKey {
    /**
     * Gets mesh data necessary to build a pipeline, and registers the matching shader defs.
     */
    pub fn layout(self, defs: &mut ShaderPreprocessor) -> MeshLayout {
        let mut layout = MeshLayout::default();
        let mut offset = 0;
        let mut push = |format: VertexFormat, location: u32, size: usize| {
            layout.attributes.push(VertexAttribute {
                format,
                offset,
                shader_location: location,
            });
            offset += size as u64;
        };
        push(VertexFormat::Float32x3, MeshData::POSITION_LOCATION, MeshData::POSITION_SIZE);
        if self.contains(Self::COLOR) {
            push(VertexFormat::Float32x4, MeshData::COLOR_LOCATION, MeshData::COLOR_SIZE);
            defs.add("COLOR");
        }
        if self.contains(Self::NORMAL) {
            push(VertexFormat::Float32x3, MeshData::NORMAL_LOCATION, MeshData::NORMAL_SIZE);
            defs.add("NORMAL");
        }
        if self.contains(Self::UV) {
            push(VertexFormat::Float32x2, MeshData::UV_LOCATION, MeshData::UV_SIZE);
            defs.add("UV");
        }
        if self.contains(Self::UV2) {
            push(VertexFormat::Float32x2, MeshData::UV2_LOCATION, MeshData::UV_SIZE);
            defs.add("UV2");
        }
        layout.array_stride = offset;
        layout
    }
}

/// Similar to a [`VertexBufferLayout`], but attributes are stored in a Vec rather than a slice.
/// Needed for generating layouts dynamically.
#[derive(Default, Debug)]
pub struct MeshLayout {
    array_stride: u64,
    attributes: Vec<VertexAttribute>,
}

impl MeshLayout {
    pub fn as_vertex_layout(&self) -> VertexBufferLayout<'_> {
        VertexBufferLayout {
            array_stride: self.array_stride,
            step_mode: VertexStepMode::Vertex,
            attributes: &self.attributes,
        }
    }
}

/// GPU representation of [`MeshData`].
pub struct GpuMesh {
    pub(crate) vertices: Buffer,
    pub(crate) indices: Buffer,
    pub(crate) index_format: IndexFormat,
    pub(crate) num_indices: u32,
    pub(crate) key: MeshKey,
}

impl GpuMesh {
    pub fn from_data(mesh: &MeshData, device: &Device) -> Result<Self, GeometryError> {
        mesh.validate()?;
        let indices = mesh.index_data();
        Ok(Self {
            vertices: device.create_buffer_init(&BufferInitDescriptor {
                label: Some("vertex_buffer"),
                contents: &mesh.vertex_bytes(),
                usage: BufferUsages::COPY_DST | BufferUsages::VERTEX,
            }),
            indices: device.create_buffer_init(&BufferInitDescriptor {
                label: Some("index_buffer"),
                contents: bytemuck::cast_slice(&indices),
                usage: BufferUsages::COPY_DST | BufferUsages::INDEX,
            }),
            index_format: IndexFormat::Uint32,
            num_indices: indices.len() as u32,
            key: mesh.key(),
        })
    }
}


#[cfg(test)]
mod test {
    use glam::Vec3;
    use crate::graphics::{Color, ShaderPreprocessor};
    use super::{MeshData, AttributeKind, BufferAttribute, GeometryError, MeshKey};

    fn quad() -> MeshData {
        let mut mesh = MeshData::new();
        mesh.set_attribute(AttributeKind::Position, BufferAttribute::new([
            -1.0, -1.0, 0.0,
             1.0, -1.0, 0.0,
            -1.0,  1.0, 0.0,
             1.0,  1.0, 0.0,
        ], 3)).unwrap();
        mesh.set_index([0, 1, 2, 2, 1, 3]);
        mesh
    }

    #[test]
    fn rejects_wrong_item_size() {
        let mut mesh = MeshData::new();
        let result = mesh.set_attribute(AttributeKind::Uv, BufferAttribute::new([0.0; 6], 3));
        assert_eq!(
            Err(GeometryError::InvalidItemSize { attribute: "uv", expected: 2, actual: 3 }),
            result.map(|_| ())
        );
    }

    #[test]
    fn rejects_ragged_array() {
        let mut mesh = MeshData::new();
        let result = mesh.set_attribute(AttributeKind::Position, BufferAttribute::new([0.0; 7], 3));
        assert!(matches!(result, Err(GeometryError::RaggedArray { len: 7, .. })));
    }

    #[test]
    fn rgb_colors_get_opaque_alpha() {
        let mut mesh = quad();
        mesh.set_attribute(AttributeKind::Color, BufferAttribute::new([
            1.0, 0.0, 0.0,
            0.0, 1.0, 0.0,
            0.0, 0.0, 1.0,
            1.0, 1.0, 0.0,
        ], 3)).unwrap();
        let colors = mesh.colors.as_ref().unwrap();
        assert_eq!(Color::RED, colors[0]);
        assert_eq!(Color::YELLOW, colors[3]);
        assert_eq!(Ok(()), mesh.validate());
    }

    #[test]
    fn validate_catches_mismatches() {
        let mut mesh = quad();
        mesh.normals = Some(vec![Vec3::Z; 3]);
        assert_eq!(
            Err(GeometryError::LengthMismatch { attribute: "normal", expected: 4, actual: 3 }),
            mesh.validate()
        );
        let mut mesh = quad();
        mesh.set_index([0, 1, 4]);
        assert_eq!(Err(GeometryError::IndexOutOfBounds { index: 4, vertex_count: 4 }), mesh.validate());
        mesh.set_index([0, 1]);
        assert_eq!(Err(GeometryError::IncompleteTriangle { len: 2 }), mesh.validate());
    }

    #[test]
    fn non_indexed_triangles() {
        let mut mesh = quad();
        mesh.set_index(Vec::new());
        mesh.positions.truncate(3);
        assert_eq!(1, mesh.triangle_count());
        assert_eq!(vec![[0, 1, 2]], mesh.triangle_indices());
    }

    #[test]
    fn computed_normals_face_viewer() {
        let mut mesh = quad();
        mesh.compute_vertex_normals();
        for normal in mesh.normals.unwrap() {
            assert!(normal.abs_diff_eq(Vec3::Z, 1e-6), "{normal}");
        }
    }

    #[test]
    fn layout_registers_defs() {
        let mesh = quad().with_uv2_from_uv();
        assert_eq!(MeshKey::NONE, mesh.key());
        let mut mesh = mesh;
        mesh.uvs = Some(vec![glam::Vec2::ZERO; 4]);
        let mesh = mesh.with_uv2_from_uv();
        assert_eq!(MeshKey::UV | MeshKey::UV2, mesh.key());
        let mut defs = ShaderPreprocessor::new();
        let layout = mesh.key().layout(&mut defs);
        assert!(defs.is_defined("UV"));
        assert!(defs.is_defined("UV2"));
        assert!(!defs.is_defined("NORMAL"));
        assert_eq!(12 + 8 + 8, layout.as_vertex_layout().array_stride);
    }
}
