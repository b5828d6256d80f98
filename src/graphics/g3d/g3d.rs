use std::mem::size_of;
use std::sync::Arc;
use bytemuck::{Pod, Zeroable};
use fxhash::FxHashMap;
use tracing::instrument;
use wgpu::*;
use wgpu::util::{BufferInitDescriptor, DeviceExt};
use crate::framework::RenderError;
use crate::graphics::{reserve_buffer, GpuTextures, ShaderPreprocessor};
use crate::graphics::g3d::{FlatScene, GpuMaterial, GpuMesh, Material, MaterialKey, MeshData, MeshKey, Side};

const INSTANCE_SLOT: u32 = 0;
const VERTEX_SLOT: u32 = 1;
const FRAME_INDEX: u32 = 0;
const MATERIAL_INDEX: u32 = 1;
const MAX_LIGHTS: usize = 4;

const INSTANCE_LAYOUT: VertexBufferLayout<'static> = VertexBufferLayout {
    array_stride: size_of::<InstanceData>() as u64,
    step_mode: VertexStepMode::Instance,
    attributes: &[
        VertexAttribute { format: VertexFormat::Float32x4, offset: 0*4*4, shader_location: 0 },
        VertexAttribute { format: VertexFormat::Float32x4, offset: 1*4*4, shader_location: 1 },
        VertexAttribute { format: VertexFormat::Float32x4, offset: 2*4*4, shader_location: 2 },
        VertexAttribute { format: VertexFormat::Float32x4, offset: 3*4*4, shader_location: 3 },
        VertexAttribute { format: VertexFormat::Float32x4, offset: 4*4*4, shader_location: 4 },
    ],
};

const LINE_LAYOUT: VertexBufferLayout<'static> = VertexBufferLayout {
    array_stride: size_of::<LineVertex>() as u64,
    step_mode: VertexStepMode::Vertex,
    attributes: &[
        VertexAttribute { format: VertexFormat::Float32x3, offset: 0, shader_location: 0 },
        VertexAttribute { format: VertexFormat::Float32x4, offset: 3*4, shader_location: 1 },
    ],
};

/// Formats and sample count of the targets G3D renders into.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct TargetInfo {
    pub color_format: TextureFormat,
    pub depth_format: TextureFormat,
    pub sample_count: u32,
}

/// Views to render a frame into.
pub struct FrameTargets<'a> {
    pub color: &'a TextureView,
    pub resolve: Option<&'a TextureView>,
    pub depth: &'a TextureView,
}

/**
 * A 3D graphics engine that draws a [`FlatScene`].
 * GPU meshes and materials are cached per shared geometry and material.
 */
pub struct G3D {
    device: Arc<Device>,
    queue: Arc<Queue>,
    target: TargetInfo,
    frame_layout: BindGroupLayout,
    material_layout: BindGroupLayout,
    pipeline_layout: PipelineLayout,
    shadow_pipeline_layout: PipelineLayout,
    pipelines: FxHashMap<PipelineKey, RenderPipeline>,
    shadow_pipelines: FxHashMap<MeshKey, RenderPipeline>,
    line_pipeline: RenderPipeline,
    meshes: FxHashMap<usize, CachedMesh>,
    materials: FxHashMap<usize, GpuMaterial>,
    textures: GpuTextures,
    frame_uniform: Buffer,
    shadow_uniform: Buffer,
    instances: Buffer,
    line_vertices: Buffer,
    shadow_map: ShadowMap,
    shadow_sampler: Sampler,
    frame_bind_group: BindGroup,
    shadow_bind_group: BindGroup,
    shadow_map_enabled: bool,
}

struct CachedMesh {
    gpu: GpuMesh,
    _data: Arc<MeshData>,
}

struct ShadowMap {
    size: u32,
    view: TextureView,
}

impl ShadowMap {
    const FORMAT: TextureFormat = TextureFormat::Depth32Float;

    fn new(size: u32, device: &Device) -> Self {
        let size = size.max(1);
        let texture = device.create_texture(&TextureDescriptor {
            label: Some("shadow_map"),
            size: Extent3d { width: size, height: size, depth_or_array_layers: 1 },
            mip_level_count: 1,
            sample_count: 1,
            dimension: TextureDimension::D2,
            format: Self::FORMAT,
            usage: TextureUsages::RENDER_ATTACHMENT | TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        Self { size, view: texture.create_view(&TextureViewDescriptor::default()) }
    }
}

impl G3D {

    pub fn new(device: Arc<Device>, queue: Arc<Queue>, target: TargetInfo) -> Self {
        let frame_layout = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
            label: Some("frame_layout"),
            entries: &[
                BindGroupLayoutEntry {
                    binding: 0,
                    visibility: ShaderStages::VERTEX_FRAGMENT,
                    ty: BindingType::Buffer {
                        ty: BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                BindGroupLayoutEntry {
                    binding: 1,
                    visibility: ShaderStages::FRAGMENT,
                    ty: BindingType::Texture {
                        sample_type: TextureSampleType::Depth,
                        view_dimension: TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                BindGroupLayoutEntry {
                    binding: 2,
                    visibility: ShaderStages::FRAGMENT,
                    ty: BindingType::Sampler(SamplerBindingType::Comparison),
                    count: None,
                },
            ],
        });
        let shadow_layout = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
            label: Some("shadow_layout"),
            entries: &[BindGroupLayoutEntry {
                binding: 0,
                visibility: ShaderStages::VERTEX,
                ty: BindingType::Buffer {
                    ty: BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });
        let material_layout = Material::bind_group_layout(&device);
        let pipeline_layout = device.create_pipeline_layout(&PipelineLayoutDescriptor {
            label: Some("g3d_layout"),
            bind_group_layouts: &[&frame_layout, &material_layout],
            push_constant_ranges: &[],
        });
        let shadow_pipeline_layout = device.create_pipeline_layout(&PipelineLayoutDescriptor {
            label: Some("shadow_layout"),
            bind_group_layouts: &[&shadow_layout],
            push_constant_ranges: &[],
        });
        let line_layout = device.create_pipeline_layout(&PipelineLayoutDescriptor {
            label: Some("line_layout"),
            bind_group_layouts: &[&frame_layout],
            push_constant_ranges: &[],
        });
        let line_pipeline = create_line_pipeline(&line_layout, target, &device);

        let frame_uniform = device.create_buffer(&BufferDescriptor {
            label: Some("frame_uniform"),
            size: size_of::<FrameUniform>() as u64,
            usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let shadow_uniform = device.create_buffer(&BufferDescriptor {
            label: Some("shadow_uniform"),
            size: size_of::<[[f32; 4]; 4]>() as u64,
            usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let shadow_sampler = device.create_sampler(&SamplerDescriptor {
            label: Some("shadow_sampler"),
            address_mode_u: AddressMode::ClampToEdge,
            address_mode_v: AddressMode::ClampToEdge,
            mag_filter: FilterMode::Linear,
            min_filter: FilterMode::Linear,
            compare: Some(CompareFunction::LessEqual),
            ..Default::default()
        });
        let shadow_map = ShadowMap::new(1, &device);
        let frame_bind_group = create_frame_bind_group(&frame_layout, &frame_uniform, &shadow_map, &shadow_sampler, &device);
        let shadow_bind_group = device.create_bind_group(&BindGroupDescriptor {
            label: Some("shadow_bind_group"),
            layout: &shadow_layout,
            entries: &[BindGroupEntry { binding: 0, resource: shadow_uniform.as_entire_binding() }],
        });
        let textures = GpuTextures::new(&device, &queue);
        let instances = create_vertex_buffer("instance_buffer", &device);
        let line_vertices = create_vertex_buffer("line_buffer", &device);
        Self {
            device,
            queue,
            target,
            frame_layout,
            material_layout,
            pipeline_layout,
            shadow_pipeline_layout,
            pipelines: FxHashMap::default(),
            shadow_pipelines: FxHashMap::default(),
            line_pipeline,
            meshes: FxHashMap::default(),
            materials: FxHashMap::default(),
            textures,
            frame_uniform,
            shadow_uniform,
            instances,
            line_vertices,
            shadow_map,
            shadow_sampler,
            frame_bind_group,
            shadow_bind_group,
            shadow_map_enabled: false,
        }
    }

    pub fn set_shadow_map_enabled(&mut self, enabled: bool) {
        self.shadow_map_enabled = enabled;
    }

    /// Encodes the shadow pass (when enabled) and the main pass for a flattened scene.
    #[instrument(skip_all)]
    pub fn render(&mut self, flat: &FlatScene, targets: FrameTargets, encoder: &mut CommandEncoder) -> Result<(), RenderError> {
        let batches = self.prepare(flat)?;
        let shadow_caster = flat.shadow_caster().filter(|_| self.shadow_map_enabled);

        // Uniforms
        let mut frame = FrameUniform::zeroed();
        frame.view_proj = flat.camera.view_projection().to_cols_array_2d();
        frame.camera_position = flat.camera.position.extend(1.0).to_array();
        frame.ambient = flat.ambient.to_array();
        for (slot, light) in frame.directional.iter_mut().zip(&flat.directional_lights) {
            let casts = shadow_caster.map_or(false, |(caster, _)| std::ptr::eq(caster, light));
            slot.direction = light.direction.extend(if casts { 1.0 } else { 0.0 }).to_array();
            slot.color = light.color.to_array();
        }
        for (slot, light) in frame.spot.iter_mut().zip(&flat.spot_lights) {
            slot.position = light.position.extend(1.0).to_array();
            slot.direction = light.direction.extend(0.0).to_array();
            slot.color = light.color.to_array();
            slot.params = [light.distance, light.decay, light.cone_cos, light.penumbra_cos];
        }
        frame.counts = [
            flat.directional_lights.len().min(MAX_LIGHTS) as u32,
            flat.spot_lights.len().min(MAX_LIGHTS) as u32,
            shadow_caster.is_some() as u32,
            0,
        ];
        if let Some((light, shadow)) = shadow_caster {
            if self.shadow_map.size != shadow.map_size.max(1) {
                self.shadow_map = ShadowMap::new(shadow.map_size, &self.device);
                self.frame_bind_group = create_frame_bind_group(
                    &self.frame_layout,
                    &self.frame_uniform,
                    &self.shadow_map,
                    &self.shadow_sampler,
                    &self.device,
                );
            }
            let shadow_view_proj = shadow.view_projection(light.position, light.target);
            frame.shadow_view_proj = shadow_view_proj.to_cols_array_2d();
            frame.shadow_params = [shadow.bias, shadow.radius, 1.0 / self.shadow_map.size as f32, 0.0];
            self.queue.write_buffer(&self.shadow_uniform, 0, bytemuck::bytes_of(&shadow_view_proj.to_cols_array_2d()));
        }
        self.queue.write_buffer(&self.frame_uniform, 0, bytemuck::bytes_of(&frame));

        // Instances
        let instance_data: Vec<InstanceData> = batches
            .iter()
            .flat_map(|batch| batch.instances.iter().copied())
            .collect();
        let instance_bytes: &[u8] = bytemuck::cast_slice(&instance_data);
        reserve_buffer(&mut self.instances, instance_bytes.len() as u64, &self.device);
        self.queue.write_buffer(&self.instances, 0, instance_bytes);

        // Lines
        let line_data: Vec<LineVertex> = flat.lines
            .iter()
            .flat_map(|lines| {
                let color = lines.color.to_array();
                let per_vertex = lines.lines.colors.as_ref();
                lines.lines.positions.iter().enumerate().map(move |(i, position)| LineVertex {
                    position: lines.model.transform_point3(*position).to_array(),
                    color: per_vertex.and_then(|colors| colors.get(i)).map_or(color, |c| c.to_array()),
                })
            })
            .collect();
        let line_bytes: &[u8] = bytemuck::cast_slice(&line_data);
        reserve_buffer(&mut self.line_vertices, line_bytes.len() as u64, &self.device);
        self.queue.write_buffer(&self.line_vertices, 0, line_bytes);

        if shadow_caster.is_some() {
            self.encode_shadow_pass(&batches, encoder);
        }
        self.encode_main_pass(flat, &batches, line_data.len() as u32, targets, encoder);
        Ok(())
    }

    /// Uploads meshes, materials and pipelines, and groups instances by mesh and material.
    fn prepare(&mut self, flat: &FlatScene) -> Result<Vec<Batch>, RenderError> {
        let mut batches: Vec<Batch> = Vec::new();
        let mut batch_index: FxHashMap<(usize, usize), usize> = FxHashMap::default();
        for flat_mesh in &flat.meshes {
            let mesh = flat_mesh.mesh;
            let mesh_id = Arc::as_ptr(&mesh.geometry) as usize;
            let material_id = Arc::as_ptr(&mesh.material) as usize;

            if !self.meshes.contains_key(&mesh_id) {
                let gpu = GpuMesh::from_data(&mesh.geometry, &self.device)?;
                self.meshes.insert(mesh_id, CachedMesh { gpu, _data: mesh.geometry.clone() });
            }
            let stale = self.materials
                .get(&material_id)
                .map_or(true, |gpu| gpu.is_stale(&mesh.material));
            if stale {
                let gpu = GpuMaterial::new(&mesh.material, &self.material_layout, &mut self.textures, &self.device, &self.queue);
                self.materials.insert(material_id, gpu);
            }
            let (Some(cached), Some(material)) = (self.meshes.get(&mesh_id), self.materials.get(&material_id)) else {
                continue;
            };
            let key = PipelineKey(cached.gpu.key, material.key);
            if !self.pipelines.contains_key(&key) {
                let pipeline = create_mesh_pipeline(key, &self.pipeline_layout, self.target, &self.device)?;
                self.pipelines.insert(key, pipeline);
            }
            if !self.shadow_pipelines.contains_key(&key.0) {
                let pipeline = create_shadow_pipeline(key.0, &self.shadow_pipeline_layout, &self.device)?;
                self.shadow_pipelines.insert(key.0, pipeline);
            }

            let index = *batch_index.entry((mesh_id, material_id)).or_insert_with(|| {
                batches.push(Batch {
                    mesh_id,
                    material_id,
                    key,
                    transparent: material.key.transparent,
                    instances: Vec::new(),
                    shadow_instances: Vec::new(),
                });
                batches.len() - 1
            });
            let instance = InstanceData {
                model: flat_mesh.model.to_cols_array_2d(),
                params: [if flat_mesh.receive_shadow { 1.0 } else { 0.0 }, 0.0, 0.0, 0.0],
            };
            let batch = &mut batches[index];
            if flat_mesh.cast_shadow {
                batch.shadow_instances.push(batch.instances.len() as u32);
            }
            batch.instances.push(instance);
        }

        // Opaque first, then transparent, otherwise in scene order.
        batches.sort_by_key(|batch| batch.transparent);
        Ok(batches)
    }

    fn encode_shadow_pass(&self, batches: &[Batch], encoder: &mut CommandEncoder) {
        let mut pass = encoder.begin_render_pass(&RenderPassDescriptor {
            label: Some("shadow_pass"),
            color_attachments: &[],
            depth_stencil_attachment: Some(RenderPassDepthStencilAttachment {
                view: &self.shadow_map.view,
                depth_ops: Some(Operations {
                    load: LoadOp::Clear(1.0),
                    store: StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });
        pass.set_bind_group(0, &self.shadow_bind_group, &[]);
        let instance_size = size_of::<InstanceData>() as u64;
        let mut offset = 0;
        for batch in batches {
            let base = offset;
            offset += batch.instances.len() as u64 * instance_size;
            let (Some(cached), Some(pipeline)) = (self.meshes.get(&batch.mesh_id), self.shadow_pipelines.get(&batch.key.0)) else {
                continue;
            };
            if batch.shadow_instances.is_empty() {
                continue;
            }
            let mesh = &cached.gpu;
            pass.set_pipeline(pipeline);
            pass.set_vertex_buffer(INSTANCE_SLOT, self.instances.slice(base..offset));
            pass.set_vertex_buffer(VERTEX_SLOT, mesh.vertices.slice(..));
            pass.set_index_buffer(mesh.indices.slice(..), mesh.index_format);
            for &instance in &batch.shadow_instances {
                pass.draw_indexed(0..mesh.num_indices, 0, instance..instance + 1);
            }
        }
    }

    fn encode_main_pass(
        &self,
        flat: &FlatScene,
        batches: &[Batch],
        line_vertex_count: u32,
        targets: FrameTargets,
        encoder: &mut CommandEncoder,
    ) {
        let clear = flat.background.unwrap_or(crate::graphics::Color::BLACK);
        let mut pass = encoder.begin_render_pass(&RenderPassDescriptor {
            label: Some("g3d_pass"),
            color_attachments: &[Some(RenderPassColorAttachment {
                view: targets.color,
                resolve_target: targets.resolve,
                ops: Operations {
                    load: LoadOp::Clear(wgpu::Color {
                        r: clear.r as f64,
                        g: clear.g as f64,
                        b: clear.b as f64,
                        a: clear.a as f64,
                    }),
                    store: StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(RenderPassDepthStencilAttachment {
                view: targets.depth,
                depth_ops: Some(Operations {
                    load: LoadOp::Clear(1.0),
                    store: StoreOp::Discard,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });
        pass.set_bind_group(FRAME_INDEX, &self.frame_bind_group, &[]);

        // Meshes
        let instance_size = size_of::<InstanceData>() as u64;
        let mut offset = 0;
        for batch in batches {
            let range = offset..offset + batch.instances.len() as u64 * instance_size;
            offset = range.end;
            let (Some(cached), Some(material), Some(pipeline)) = (
                self.meshes.get(&batch.mesh_id),
                self.materials.get(&batch.material_id),
                self.pipelines.get(&batch.key),
            ) else {
                continue;
            };
            let mesh = &cached.gpu;
            pass.set_pipeline(pipeline);
            pass.set_bind_group(MATERIAL_INDEX, &material.bind_group, &[]);
            pass.set_vertex_buffer(INSTANCE_SLOT, self.instances.slice(range));
            pass.set_vertex_buffer(VERTEX_SLOT, mesh.vertices.slice(..));
            pass.set_index_buffer(mesh.indices.slice(..), mesh.index_format);
            pass.draw_indexed(0..mesh.num_indices, 0, 0..batch.instances.len() as u32);
        }

        // Lines
        if line_vertex_count > 0 {
            pass.set_pipeline(&self.line_pipeline);
            pass.set_vertex_buffer(0, self.line_vertices.slice(..));
            pass.draw(0..line_vertex_count, 0..1);
        }
    }
}

/// Instances of one mesh and material pair.
struct Batch {
    mesh_id: usize,
    material_id: usize,
    key: PipelineKey,
    transparent: bool,
    instances: Vec<InstanceData>,
    /// Indices into `instances` of shadow casters.
    shadow_instances: Vec<u32>,
}

/// Used to select a pipeline from a cache.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash)]
struct PipelineKey(MeshKey, MaterialKey);

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct InstanceData {
    model: [[f32; 4]; 4],
    /// Receives shadows.
    params: [f32; 4],
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct LineVertex {
    position: [f32; 3],
    color: [f32; 4],
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct DirectionalUniform {
    /// Direction the light travels, w is 1 for the shadow caster.
    direction: [f32; 4],
    color: [f32; 4],
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct SpotUniform {
    position: [f32; 4],
    direction: [f32; 4],
    color: [f32; 4],
    /// Distance, decay, cone cosine, penumbra cosine.
    params: [f32; 4],
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct FrameUniform {
    view_proj: [[f32; 4]; 4],
    shadow_view_proj: [[f32; 4]; 4],
    camera_position: [f32; 4],
    ambient: [f32; 4],
    /// Directional lights, spot lights, shadow enabled.
    counts: [u32; 4],
    /// Bias, radius, texel size.
    shadow_params: [f32; 4],
    directional: [DirectionalUniform; MAX_LIGHTS],
    spot: [SpotUniform; MAX_LIGHTS],
}

fn create_vertex_buffer(label: &'static str, device: &Device) -> Buffer {
    device.create_buffer_init(&BufferInitDescriptor {
        label: Some(label),
        contents: &[0; 16],
        usage: BufferUsages::VERTEX | BufferUsages::COPY_DST,
    })
}

fn create_frame_bind_group(
    layout: &BindGroupLayout,
    uniform: &Buffer,
    shadow_map: &ShadowMap,
    sampler: &Sampler,
    device: &Device,
) -> BindGroup {
    device.create_bind_group(&BindGroupDescriptor {
        label: Some("frame_bind_group"),
        layout,
        entries: &[
            BindGroupEntry { binding: 0, resource: uniform.as_entire_binding() },
            BindGroupEntry { binding: 1, resource: BindingResource::TextureView(&shadow_map.view) },
            BindGroupEntry { binding: 2, resource: BindingResource::Sampler(sampler) },
        ],
    })
}

fn depth_state(format: TextureFormat, write: bool) -> DepthStencilState {
    DepthStencilState {
        format,
        depth_write_enabled: write,
        depth_compare: CompareFunction::LessEqual,
        stencil: StencilState::default(),
        bias: DepthBiasState::default(),
    }
}

fn multisample(target: TargetInfo) -> MultisampleState {
    MultisampleState {
        count: target.sample_count,
        ..Default::default()
    }
}

/// Creates a pipeline compatible with the material and mesh supplied.
fn create_mesh_pipeline(
    key: PipelineKey,
    layout: &PipelineLayout,
    target: TargetInfo,
    device: &Device,
) -> Result<RenderPipeline, RenderError> {
    let PipelineKey(mesh_key, material_key) = key;

    // Extracts layout info and shader defs
    let mut shader_defs = ShaderPreprocessor::new();
    let mesh_layout = mesh_key.layout(&mut shader_defs);
    material_key.write_shader_defs(&mut shader_defs);
    let shader_code = shader_defs.preprocess(include_str!("mesh.wgsl"))?;
    let module = device.create_shader_module(ShaderModuleDescriptor {
        label: Some("g3d_module"),
        source: ShaderSource::Wgsl(shader_code.into()),
    });
    let blend = if material_key.transparent { BlendState::ALPHA_BLENDING } else { BlendState::REPLACE };
    let cull_mode = material_key.side.cull_mode();
    log::debug!("Creating pipeline for {mesh_key:?} / {material_key:?}");

    Ok(device.create_render_pipeline(&RenderPipelineDescriptor {
        label: Some("g3d_pipeline"),
        layout: Some(layout),
        vertex: VertexState {
            module: &module,
            entry_point: "vertex_main",
            buffers: &[INSTANCE_LAYOUT, mesh_layout.as_vertex_layout()],
        },
        fragment: Some(FragmentState {
            module: &module,
            entry_point: "fragment_main",
            targets: &[Some(ColorTargetState {
                format: target.color_format,
                blend: Some(blend),
                write_mask: ColorWrites::ALL,
            })],
        }),
        primitive: PrimitiveState {
            topology: PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: FrontFace::Ccw,
            cull_mode,
            unclipped_depth: false,
            polygon_mode: PolygonMode::Fill,
            conservative: false,
        },
        depth_stencil: Some(depth_state(target.depth_format, true)),
        multisample: multisample(target),
        multiview: None,
    }))
}

/// Depth-only pipeline that renders shadow casters from the light's point of view.
fn create_shadow_pipeline(mesh_key: MeshKey, layout: &PipelineLayout, device: &Device) -> Result<RenderPipeline, RenderError> {
    let mut shader_defs = ShaderPreprocessor::new();
    let mesh_layout = mesh_key.layout(&mut shader_defs);
    let shader_code = shader_defs.preprocess(include_str!("shadow.wgsl"))?;
    let module = device.create_shader_module(ShaderModuleDescriptor {
        label: Some("shadow_module"),
        source: ShaderSource::Wgsl(shader_code.into()),
    });
    Ok(device.create_render_pipeline(&RenderPipelineDescriptor {
        label: Some("shadow_pipeline"),
        layout: Some(layout),
        vertex: VertexState {
            module: &module,
            entry_point: "vertex_main",
            buffers: &[INSTANCE_LAYOUT, mesh_layout.as_vertex_layout()],
        },
        fragment: None,
        primitive: PrimitiveState {
            topology: PrimitiveTopology::TriangleList,
            cull_mode: Side::Double.cull_mode(),
            ..Default::default()
        },
        depth_stencil: Some(DepthStencilState {
            bias: DepthBiasState {
                constant: 2,
                slope_scale: 2.0,
                clamp: 0.0,
            },
            ..depth_state(ShadowMap::FORMAT, true)
        }),
        multisample: MultisampleState::default(),
        multiview: None,
    }))
}

fn create_line_pipeline(layout: &PipelineLayout, target: TargetInfo, device: &Device) -> RenderPipeline {
    let module = device.create_shader_module(ShaderModuleDescriptor {
        label: Some("line_module"),
        source: ShaderSource::Wgsl(include_str!("line.wgsl").into()),
    });
    device.create_render_pipeline(&RenderPipelineDescriptor {
        label: Some("line_pipeline"),
        layout: Some(layout),
        vertex: VertexState {
            module: &module,
            entry_point: "vertex_main",
            buffers: &[LINE_LAYOUT],
        },
        fragment: Some(FragmentState {
            module: &module,
            entry_point: "fragment_main",
            targets: &[Some(ColorTargetState {
                format: target.color_format,
                blend: Some(BlendState::ALPHA_BLENDING),
                write_mask: ColorWrites::ALL,
            })],
        }),
        primitive: PrimitiveState {
            topology: PrimitiveTopology::LineList,
            ..Default::default()
        },
        depth_stencil: Some(depth_state(target.depth_format, true)),
        multisample: multisample(target),
        multiview: None,
    })
}

const _: () = assert!(size_of::<FrameUniform>() % 16 == 0);

impl std::fmt::Debug for G3D {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("G3D")
            .field("target", &self.target)
            .field("pipelines", &self.pipelines.len())
            .field("meshes", &self.meshes.len())
            .field("materials", &self.materials.len())
            .finish()
    }
}
