use std::sync::Arc;
use bitflags::bitflags;
use bytemuck::{Pod, Zeroable};
use wgpu::util::{BufferInitDescriptor, DeviceExt};
use wgpu::*;
use crate::graphics::{Color, GpuTextures, ShaderPreprocessor, Texture, TextureStatus};

/// Which faces of a triangle get drawn.
#[derive(Copy, Clone, Eq, PartialEq, Default, Debug, Hash)]
pub enum Side {
    #[default]
    Front,
    Back,
    Double,
}

impl Side {
    pub fn cull_mode(self) -> Option<Face> {
        match self {
            Side::Front => Some(Face::Back),
            Side::Back => Some(Face::Front),
            Side::Double => None,
        }
    }
}

/**
 * Blinn-Phong shading with a specular highlight.
 */
#[derive(Clone, Debug, PartialEq)]
pub struct PhongMaterial {
    pub color: Color,
    pub emissive: Color,
    pub specular: Color,
    pub shininess: f32,
    pub flat_shading: bool,
    /// Multiplies the color by the geometry's color attribute.
    pub vertex_colors: bool,
    pub map: Option<Texture>,
    pub side: Side,
}

impl Default for PhongMaterial {
    fn default() -> Self {
        Self {
            color: Color::WHITE,
            emissive: Color::BLACK,
            specular: Color::hex(0x111111),
            shininess: 30.0,
            flat_shading: false,
            vertex_colors: false,
            map: None,
            side: Side::Front,
        }
    }
}

impl PhongMaterial {
    pub fn new(color: Color) -> Self {
        Self { color, ..Default::default() }
    }

    pub fn with_emissive(mut self, emissive: Color) -> Self {
        self.emissive = emissive;
        self
    }

    pub fn with_flat_shading(mut self, flat_shading: bool) -> Self {
        self.flat_shading = flat_shading;
        self
    }

    pub fn with_vertex_colors(mut self, vertex_colors: bool) -> Self {
        self.vertex_colors = vertex_colors;
        self
    }

    pub fn with_map(mut self, map: Texture) -> Self {
        self.map = Some(map);
        self
    }
}

/**
 * Metallic-roughness physically based shading.
 * The AO and light maps read the second UV channel.
 */
#[derive(Clone, Debug, PartialEq)]
pub struct StandardMaterial {
    pub color: Color,
    pub emissive: Color,
    pub roughness: f32,
    pub metalness: f32,
    pub vertex_colors: bool,
    pub map: Option<Texture>,
    pub normal_map: Option<Texture>,
    pub displacement_map: Option<Texture>,
    pub displacement_scale: f32,
    pub displacement_bias: f32,
    pub ao_map: Option<Texture>,
    pub ao_map_intensity: f32,
    pub roughness_map: Option<Texture>,
    pub metalness_map: Option<Texture>,
    pub alpha_map: Option<Texture>,
    pub light_map: Option<Texture>,
    pub light_map_intensity: f32,
    pub transparent: bool,
    pub opacity: f32,
    pub side: Side,
}

impl Default for StandardMaterial {
    fn default() -> Self {
        Self {
            color: Color::WHITE,
            emissive: Color::BLACK,
            roughness: 1.0,
            metalness: 0.0,
            vertex_colors: false,
            map: None,
            normal_map: None,
            displacement_map: None,
            displacement_scale: 1.0,
            displacement_bias: 0.0,
            ao_map: None,
            ao_map_intensity: 1.0,
            roughness_map: None,
            metalness_map: None,
            alpha_map: None,
            light_map: None,
            light_map_intensity: 1.0,
            transparent: false,
            opacity: 1.0,
            side: Side::Front,
        }
    }
}

impl StandardMaterial {
    pub fn new(color: Color) -> Self {
        Self { color, ..Default::default() }
    }

    pub fn with_roughness(mut self, roughness: f32) -> Self {
        self.roughness = roughness;
        self
    }

    pub fn with_metalness(mut self, metalness: f32) -> Self {
        self.metalness = metalness;
        self
    }

    pub fn with_side(mut self, side: Side) -> Self {
        self.side = side;
        self
    }
}

/// Surface material shared between meshes.
#[derive(Clone, Debug, PartialEq)]
pub enum Material {
    Phong(PhongMaterial),
    Standard(StandardMaterial),
}

impl From<PhongMaterial> for Material {
    fn from(material: PhongMaterial) -> Self {
        Self::Phong(material)
    }
}

impl From<StandardMaterial> for Material {
    fn from(material: StandardMaterial) -> Self {
        Self::Standard(material)
    }
}

impl Material {

    const UNIFORM_BINDING: u32 = 0;
    const SAMPLER_BINDING: u32 = 1;
    const MAP_BINDING: u32 = 2;
    const MAP_COUNT: usize = 6;

    pub fn into_shared(self) -> Arc<Material> {
        Arc::new(self)
    }

    pub fn side(&self) -> Side {
        match self {
            Self::Phong(phong) => phong.side,
            Self::Standard(standard) => standard.side,
        }
    }

    pub fn transparent(&self) -> bool {
        match self {
            Self::Phong(_) => false,
            Self::Standard(standard) => standard.transparent,
        }
    }

    pub fn vertex_colors(&self) -> bool {
        match self {
            Self::Phong(phong) => phong.vertex_colors,
            Self::Standard(standard) => standard.vertex_colors,
        }
    }

    pub fn color(&self) -> Color {
        match self {
            Self::Phong(phong) => phong.color,
            Self::Standard(standard) => standard.color,
        }
    }

    /**
     * Texture slots in binding order: base color, ambient occlusion, light,
     * displacement, roughness, metalness.
     */
    pub fn maps(&self) -> [Option<&Texture>; Self::MAP_COUNT] {
        match self {
            Self::Phong(phong) => [phong.map.as_ref(), None, None, None, None, None],
            Self::Standard(s) => [
                s.map.as_ref(),
                s.ao_map.as_ref(),
                s.light_map.as_ref(),
                s.displacement_map.as_ref(),
                s.roughness_map.as_ref(),
                s.metalness_map.as_ref(),
            ],
        }
    }

    /// Every texture the material references, including ones the renderer does not sample.
    pub fn textures(&self) -> Vec<&Texture> {
        let mut textures: Vec<&Texture> = self.maps().into_iter().flatten().collect();
        if let Self::Standard(s) = self {
            textures.extend(s.normal_map.as_ref());
            textures.extend(s.alpha_map.as_ref());
        }
        textures
    }

    /**
     * Flags for the current state of the material. Maps count only once their textures finished loading.
     */
    pub fn flags(&self) -> MaterialFlags {
        let mut flags = match self {
            Self::Phong(phong) if phong.flat_shading => MaterialFlags::PHONG | MaterialFlags::FLAT_SHADING,
            Self::Phong(_) => MaterialFlags::PHONG,
            Self::Standard(_) => MaterialFlags::NONE,
        };
        if self.vertex_colors() {
            flags |= MaterialFlags::VERTEX_COLORS;
        }
        for (map, flag) in self.maps().into_iter().zip(MaterialFlags::MAPS) {
            if map.map_or(false, |texture| texture.status() == TextureStatus::Loaded) {
                flags |= flag;
            }
        }
        flags
    }

    pub fn key(&self) -> MaterialKey {
        MaterialKey {
            flags: self.flags(),
            side: self.side(),
            transparent: self.transparent(),
        }
    }

    pub fn uniform(&self) -> MaterialUniform {
        match self {
            Self::Phong(phong) => MaterialUniform {
                color: phong.color.to_array(),
                emissive: phong.emissive.to_array(),
                specular: [phong.specular.r, phong.specular.g, phong.specular.b, phong.shininess],
                params: [1.0, 0.0, 1.0, 0.0],
                maps: [1.0, 1.0, 0.0, 0.0],
            },
            Self::Standard(s) => MaterialUniform {
                color: s.color.to_array(),
                emissive: s.emissive.to_array(),
                specular: [0.0; 4],
                params: [s.roughness, s.metalness, if s.transparent { s.opacity } else { 1.0 }, 0.0],
                maps: [s.ao_map_intensity, s.light_map_intensity, s.displacement_scale, s.displacement_bias],
            },
        }
    }

    pub(crate) fn bind_group_layout(device: &Device) -> BindGroupLayout {
        let mut entries = vec![
            BindGroupLayoutEntry {
                binding: Self::UNIFORM_BINDING,
                visibility: ShaderStages::VERTEX_FRAGMENT,
                ty: BindingType::Buffer {
                    ty: BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            },
            BindGroupLayoutEntry {
                binding: Self::SAMPLER_BINDING,
                visibility: ShaderStages::VERTEX_FRAGMENT,
                ty: BindingType::Sampler(SamplerBindingType::Filtering),
                count: None,
            },
        ];
        for i in 0..Self::MAP_COUNT {
            entries.push(BindGroupLayoutEntry {
                binding: Self::MAP_BINDING + i as u32,
                visibility: ShaderStages::VERTEX_FRAGMENT,
                ty: BindingType::Texture {
                    sample_type: TextureSampleType::Float { filterable: true },
                    view_dimension: TextureViewDimension::D2,
                    multisampled: false,
                },
                count: None,
            });
        }
        device.create_bind_group_layout(&BindGroupLayoutDescriptor {
            label: Some("material_layout"),
            entries: &entries,
        })
    }
}

/// Line color for wireframes and helpers.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct LineMaterial {
    pub color: Color,
}

impl LineMaterial {
    pub fn new(color: Color) -> Self {
        Self { color }
    }
}

impl Default for LineMaterial {
    fn default() -> Self {
        Self::new(Color::WHITE)
    }
}

#[repr(C)]
#[derive(Copy, Clone, PartialEq, Debug, Pod, Zeroable)]
pub struct MaterialUniform {
    pub color: [f32; 4],
    pub emissive: [f32; 4],
    /// Specular rgb and shininess.
    pub specular: [f32; 4],
    /// Roughness, metalness, opacity.
    pub params: [f32; 4],
    /// AO intensity, light map intensity, displacement scale, displacement bias.
    pub maps: [f32; 4],
}

/// Material data that has been "prepared" for use in the graphics engine.
pub struct GpuMaterial {
    pub key: MaterialKey,
    pub bind_group: BindGroup,
    _material: Arc<Material>,
}

impl GpuMaterial {

    pub fn new(
        material: &Arc<Material>,
        layout: &BindGroupLayout,
        textures: &mut GpuTextures,
        device: &Device,
        queue: &Queue,
    ) -> Self {
        let key = material.key();
        let uniform_buffer = device.create_buffer_init(&BufferInitDescriptor {
            label: Some("material_uniform"),
            contents: bytemuck::bytes_of(&material.uniform()),
            usage: BufferUsages::COPY_DST | BufferUsages::UNIFORM,
        });

        // Uploads loaded maps before borrowing their views.
        let maps = material.maps();
        for (i, map) in maps.iter().enumerate() {
            if let Some(texture) = map {
                textures.view(texture, i == 0, device, queue);
            }
        }
        let fallbacks = [
            textures.white(),
            textures.white(),
            textures.black(),
            textures.black(),
            textures.white(),
            textures.white(),
        ];
        let mut entries = vec![
            BindGroupEntry {
                binding: Material::UNIFORM_BINDING,
                resource: uniform_buffer.as_entire_binding(),
            },
            BindGroupEntry {
                binding: Material::SAMPLER_BINDING,
                resource: BindingResource::Sampler(&textures.sampler),
            },
        ];
        for (i, (map, fallback)) in maps.iter().zip(fallbacks).enumerate() {
            let view = map
                .and_then(|texture| textures.get(texture, i == 0))
                .unwrap_or(fallback);
            entries.push(BindGroupEntry {
                binding: Material::MAP_BINDING + i as u32,
                resource: BindingResource::TextureView(view),
            });
        }
        let bind_group = device.create_bind_group(&BindGroupDescriptor {
            label: Some("material_bind_group"),
            layout,
            entries: &entries,
        });
        Self { key, bind_group, _material: material.clone() }
    }

    /// True when the material's textures changed readiness since preparation.
    pub fn is_stale(&self, material: &Material) -> bool {
        self.key != material.key()
    }
}

/// Info about material used in pipeline selection.
#[derive(Copy, Clone, Eq, PartialEq, Default, Debug, Hash)]
pub struct MaterialKey {
    pub flags: MaterialFlags,
    pub side: Side,
    pub transparent: bool,
}

impl MaterialKey {
    pub fn write_shader_defs(&self, defs: &mut ShaderPreprocessor) {
        let names = [
            (MaterialFlags::PHONG, "PHONG"),
            (MaterialFlags::FLAT_SHADING, "FLAT_SHADING"),
            (MaterialFlags::MAP, "MAP"),
            (MaterialFlags::AO_MAP, "AO_MAP"),
            (MaterialFlags::LIGHT_MAP, "LIGHT_MAP"),
            (MaterialFlags::DISPLACEMENT_MAP, "DISPLACEMENT_MAP"),
            (MaterialFlags::ROUGHNESS_MAP, "ROUGHNESS_MAP"),
            (MaterialFlags::METALNESS_MAP, "METALNESS_MAP"),
            (MaterialFlags::VERTEX_COLORS, "VERTEX_COLORS"),
        ];
        for (flag, name) in names {
            if self.flags.contains(flag) {
                defs.add(name);
            }
        }
        if self.side == Side::Double {
            defs.add("DOUBLE_SIDED");
        }
    }
}

bitflags! {
    /// Shading model and loaded texture maps of a material.
    /// Used for selecting pipelines from a cache.
    #[derive(Copy, Clone, Eq, PartialEq, Default, Debug, Hash)]
    pub struct MaterialFlags: u16 {
        const NONE              = 0;
        const PHONG             = 1 << 0;
        const FLAT_SHADING      = 1 << 1;
        const MAP               = 1 << 2;
        const AO_MAP            = 1 << 3;
        const LIGHT_MAP         = 1 << 4;
        const DISPLACEMENT_MAP  = 1 << 5;
        const ROUGHNESS_MAP     = 1 << 6;
        const METALNESS_MAP     = 1 << 7;
        const VERTEX_COLORS     = 1 << 8;
    }
}

impl MaterialFlags {
    /// Flags of [`Material::maps`], in the same order.
    pub const MAPS: [MaterialFlags; 6] = [
        Self::MAP,
        Self::AO_MAP,
        Self::LIGHT_MAP,
        Self::DISPLACEMENT_MAP,
        Self::ROUGHNESS_MAP,
        Self::METALNESS_MAP,
    ];
}


#[cfg(test)]
mod test {
    use crate::graphics::{Color, Texture, TextureImage, TextureLoader, ShaderPreprocessor};
    use super::{Material, MaterialFlags, PhongMaterial, StandardMaterial, Side};

    #[test]
    fn maps_count_once_loaded() {
        let loaded = Texture::from_image("white.png", TextureImage::solid([255; 4]));
        let missing = TextureLoader::new(std::env::temp_dir()).load("scene_demos_no_such_map.jpg");
        let material = Material::from(StandardMaterial {
            map: Some(loaded.clone()),
            ao_map: Some(missing),
            light_map: Some(loaded),
            ..Default::default()
        });
        let flags = material.flags();
        assert!(flags.contains(MaterialFlags::MAP | MaterialFlags::LIGHT_MAP));
        assert!(!flags.contains(MaterialFlags::AO_MAP));
        assert!(!flags.contains(MaterialFlags::PHONG));
        assert_eq!(3, material.textures().len());
    }

    #[test]
    fn phong_defs() {
        let material = Material::from(PhongMaterial::new(Color::hex(0xffff00)).with_flat_shading(true));
        let mut defs = ShaderPreprocessor::new();
        material.key().write_shader_defs(&mut defs);
        assert!(defs.is_defined("PHONG"));
        assert!(defs.is_defined("FLAT_SHADING"));
        assert!(!defs.is_defined("MAP"));
    }

    #[test]
    fn opacity_only_when_transparent() {
        let opaque = StandardMaterial { opacity: 0.5, ..Default::default() };
        assert_eq!(1.0, Material::from(opaque.clone()).uniform().params[2]);
        let transparent = StandardMaterial { transparent: true, ..opaque };
        assert_eq!(0.5, Material::from(transparent).uniform().params[2]);
    }

    #[test]
    fn double_side_disables_culling() {
        assert_eq!(None, Side::Double.cull_mode());
        let material = StandardMaterial::default().with_side(Side::Double);
        assert_eq!(Side::Double, Material::from(material).side());
    }
}
