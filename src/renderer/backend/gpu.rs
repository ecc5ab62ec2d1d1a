//! wgpu backend.
//!
//! Every effect is a full-screen triangle drawn with one of the WGSL programs
//! under `renderer/shaders`. All programs share a single bind group layout:
//!
//! | Binding | Resource                                    |
//! |---------|---------------------------------------------|
//! | 0       | input surface (`texture_2d<f32>`)           |
//! | 1       | linear clamp sampler                        |
//! | 2       | [`EffectBlock`] uniform                     |
//! | 3       | auxiliary texture (normal map or 1×1 dummy) |
//!
//! Scene content has two more programs with layouts of their own: the cube map
//! background (`texture_cube`, sampler, matrix block) and the depth-tested mesh
//! (matrix and color block, one vertex buffer of positions).
//!
//! # Performance
//!
//! - Pipelines are compiled lazily and cached by `(program, format, samples)`
//! - Uniform buffers come from a pool that is rewound every frame
//! - Auxiliary textures are uploaded once per shared [`TextureRef`]

use std::borrow::Cow;
use std::sync::Arc;

use glam::{Mat4, Vec3, Vec4};
use rustc_hash::FxHashMap;
use wgpu::util::DeviceExt;

use super::{PassTarget, RenderBackend};
use crate::assets::{MeshData, TextureData};
use crate::renderer::context::GpuContext;
use crate::renderer::effects::{EffectKind, EffectParams};
use crate::renderer::surface::{ColorSpace, SurfaceDescriptor};
use crate::renderer::uniforms::TextureRef;

const PRELUDE: &str = include_str!("../shaders/fullscreen.wgsl");

/// Uniform block shared by all programs.
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct EffectBlock {
    pub params: [[f32; 4]; 4],
    /// width, height, 1 / width, 1 / height of the target.
    pub target_size: [f32; 4],
}

impl EffectBlock {
    fn new(params: [[f32; 4]; 4], (width, height): (u32, u32)) -> Self {
        let (w, h) = (width.max(1) as f32, height.max(1) as f32);
        Self {
            params,
            target_size: [w, h, 1.0 / w, 1.0 / h],
        }
    }
}

/// Uniform block of the mesh program.
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MeshBlock {
    pub view_projection: [[f32; 4]; 4],
    pub color: [f32; 4],
}

/// Size of one pooled uniform buffer; fits every block above.
const UNIFORM_SLOT_SIZE: u64 = 256;

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

const MESH_ATTRIBUTES: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x3];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Program {
    Effect(EffectKind),
    Overlay,
    Background,
    Mesh,
}

impl Program {
    fn source(self) -> Cow<'static, str> {
        match self {
            Self::Background => Cow::Borrowed(include_str!("../shaders/background.wgsl")),
            Self::Mesh => Cow::Borrowed(include_str!("../shaders/mesh.wgsl")),
            Self::Effect(_) | Self::Overlay => Cow::Owned(format!("{PRELUDE}\n{}", self.body())),
        }
    }

    fn body(self) -> &'static str {
        match self {
            Self::Overlay => include_str!("../shaders/overlay.wgsl"),
            Self::Background | Self::Mesh => "",
            Self::Effect(kind) => match kind {
                EffectKind::Copy => include_str!("../shaders/copy.wgsl"),
                EffectKind::DotScreen => include_str!("../shaders/dot_screen.wgsl"),
                EffectKind::Glitch => include_str!("../shaders/glitch.wgsl"),
                EffectKind::RgbShift => include_str!("../shaders/rgb_shift.wgsl"),
                EffectKind::UnrealBloom => include_str!("../shaders/unreal_bloom.wgsl"),
                EffectKind::Tint => include_str!("../shaders/tint.wgsl"),
                EffectKind::Displacement => include_str!("../shaders/displacement.wgsl"),
                EffectKind::Bloom => include_str!("../shaders/bloom.wgsl"),
                EffectKind::Film => include_str!("../shaders/film.wgsl"),
                EffectKind::Fxaa => include_str!("../shaders/fxaa.wgsl"),
            },
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Overlay => "Overlay",
            Self::Background => "Background",
            Self::Mesh => "Mesh",
            Self::Effect(kind) => kind.label(),
        }
    }

    fn blend(self) -> wgpu::BlendState {
        match self {
            Self::Overlay => wgpu::BlendState::ALPHA_BLENDING,
            Self::Effect(_) | Self::Background | Self::Mesh => wgpu::BlendState::REPLACE,
        }
    }
}

/// Mesh uploaded into vertex and index buffers.
pub struct GpuMesh {
    vertices: wgpu::Buffer,
    indices: wgpu::Buffer,
    index_count: u32,
}

impl std::fmt::Debug for GpuMesh {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GpuMesh")
            .field("index_count", &self.index_count)
            .finish_non_exhaustive()
    }
}

/// Pipeline cache key: (program, target format, sample count).
type PipelineKey = (Program, wgpu::TextureFormat, u32);

// ============================================================================
// GpuSurface
// ============================================================================

/// Intermediate surface backed by wgpu textures.
///
/// `view` is always single-sampled and is what the next pass samples. For
/// multisampled descriptors, drawing goes to `msaa_view` and is resolved into
/// `view` at the end of each render pass.
pub struct GpuSurface {
    desc: SurfaceDescriptor,
    view: wgpu::TextureView,
    msaa_view: Option<wgpu::TextureView>,
}

impl GpuSurface {
    #[inline]
    #[must_use]
    pub fn descriptor(&self) -> &SurfaceDescriptor {
        &self.desc
    }

    fn attachments(&self) -> (&wgpu::TextureView, Option<&wgpu::TextureView>) {
        match &self.msaa_view {
            Some(msaa) => (msaa, Some(&self.view)),
            None => (&self.view, None),
        }
    }
}

impl std::fmt::Debug for GpuSurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GpuSurface")
            .field("desc", &self.desc)
            .finish_non_exhaustive()
    }
}

struct Frame {
    output: wgpu::SurfaceTexture,
    view: wgpu::TextureView,
    encoder: wgpu::CommandEncoder,
}

// ============================================================================
// GpuBackend
// ============================================================================

/// Backend presenting to a window surface through wgpu.
pub struct GpuBackend {
    ctx: GpuContext,

    layout: wgpu::BindGroupLayout,
    pipeline_layout: wgpu::PipelineLayout,
    background_layout: wgpu::BindGroupLayout,
    background_pipeline_layout: wgpu::PipelineLayout,
    mesh_layout: wgpu::BindGroupLayout,
    mesh_pipeline_layout: wgpu::PipelineLayout,
    sampler: wgpu::Sampler,

    modules: FxHashMap<Program, wgpu::ShaderModule>,
    pipelines: FxHashMap<PipelineKey, wgpu::RenderPipeline>,

    uniform_pool: Vec<wgpu::Buffer>,
    uniform_cursor: usize,

    /// Uploaded auxiliary textures keyed by `Arc` address. The `Arc` is kept
    /// so the address cannot be reused while the entry exists.
    aux_textures: FxHashMap<usize, (TextureRef, wgpu::TextureView)>,
    dummy_view: wgpu::TextureView,

    /// Depth buffer of the mesh program, keyed by (width, height, samples).
    depth: Option<((u32, u32, u32), wgpu::TextureView)>,

    frame: Option<Frame>,
}

impl GpuBackend {
    #[must_use]
    pub fn new(ctx: GpuContext) -> Self {
        let device = &ctx.device;

        let texture_entry = |binding| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Texture {
                sample_type: wgpu::TextureSampleType::Float { filterable: true },
                view_dimension: wgpu::TextureViewDimension::D2,
                multisampled: false,
            },
            count: None,
        };

        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Effect BindGroup Layout"),
            entries: &[
                texture_entry(0),
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                texture_entry(3),
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Effect Pipeline Layout"),
            bind_group_layouts: &[Some(&layout)],
            immediate_size: 0,
        });

        let background_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Background BindGroup Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::Cube,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        });
        let background_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Background Pipeline Layout"),
            bind_group_layouts: &[Some(&background_layout)],
            immediate_size: 0,
        });

        let mesh_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Mesh BindGroup Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });
        let mesh_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Mesh Pipeline Layout"),
            bind_group_layouts: &[Some(&mesh_layout)],
            immediate_size: 0,
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Effect Sampler"),
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            ..Default::default()
        });

        let dummy = TextureData::solid("Dummy Aux", [128, 128, 255, 255]);
        let dummy_view = upload_texture(&ctx, &dummy);

        Self {
            ctx,
            layout,
            pipeline_layout,
            background_layout,
            background_pipeline_layout,
            mesh_layout,
            mesh_pipeline_layout,
            sampler,
            modules: FxHashMap::default(),
            pipelines: FxHashMap::default(),
            uniform_pool: Vec::new(),
            uniform_cursor: 0,
            aux_textures: FxHashMap::default(),
            dummy_view,
            depth: None,
            frame: None,
        }
    }

    #[inline]
    #[must_use]
    pub fn context(&self) -> &GpuContext {
        &self.ctx
    }

    fn ensure_pipeline(&mut self, key: PipelineKey) {
        if self.pipelines.contains_key(&key) {
            return;
        }
        let (program, format, samples) = key;
        log::debug!(
            "Compiling {} pipeline for format {format:?}, {samples} sample(s)",
            program.label()
        );

        let device = &self.ctx.device;
        let module = self.modules.entry(program).or_insert_with(|| {
            device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(program.label()),
                source: wgpu::ShaderSource::Wgsl(program.source()),
            })
        });

        let layout = match program {
            Program::Effect(_) | Program::Overlay => &self.pipeline_layout,
            Program::Background => &self.background_pipeline_layout,
            Program::Mesh => &self.mesh_pipeline_layout,
        };
        let mesh_buffers = [wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vec3>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &MESH_ATTRIBUTES,
        }];
        let (buffers, depth_stencil) = match program {
            Program::Mesh => (
                &mesh_buffers[..],
                Some(wgpu::DepthStencilState {
                    format: DEPTH_FORMAT,
                    depth_write_enabled: Some(true),
                    depth_compare: Some(wgpu::CompareFunction::Less),
                    stencil: wgpu::StencilState::default(),
                    bias: wgpu::DepthBiasState::default(),
                }),
            ),
            _ => (&[] as &[wgpu::VertexBufferLayout<'_>], None),
        };

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(program.label()),
            layout: Some(layout),
            vertex: wgpu::VertexState {
                module,
                entry_point: Some("vs_main"),
                buffers,
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(program.blend()),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState::default(),
            depth_stencil,
            multisample: wgpu::MultisampleState {
                count: samples,
                ..Default::default()
            },
            multiview_mask: None,
            cache: None,
        });

        self.pipelines.insert(key, pipeline);
    }

    fn next_uniform_buffer<T: bytemuck::Pod>(&mut self, block: &T) -> wgpu::Buffer {
        if self.uniform_cursor == self.uniform_pool.len() {
            self.uniform_pool
                .push(self.ctx.device.create_buffer(&wgpu::BufferDescriptor {
                    label: Some("Pass Uniforms"),
                    size: UNIFORM_SLOT_SIZE,
                    usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                    mapped_at_creation: false,
                }));
        }
        let buffer = self.uniform_pool[self.uniform_cursor].clone();
        self.uniform_cursor += 1;
        self.ctx
            .queue
            .write_buffer(&buffer, 0, bytemuck::bytes_of(block));
        buffer
    }

    fn aux_view(&mut self, texture: Option<&TextureRef>) -> wgpu::TextureView {
        let Some(texture) = texture else {
            return self.dummy_view.clone();
        };
        let key = Arc::as_ptr(texture) as usize;
        if let Some((_, view)) = self.aux_textures.get(&key) {
            return view.clone();
        }
        log::debug!(
            "Uploading auxiliary texture '{}' ({}x{})",
            texture.label,
            texture.width,
            texture.height
        );
        let view = upload_texture(&self.ctx, texture);
        self.aux_textures
            .insert(key, (Arc::clone(texture), view.clone()));
        view
    }

    fn target_format(&self, target: &PassTarget<'_, GpuSurface>) -> (wgpu::TextureFormat, u32, (u32, u32)) {
        match target {
            PassTarget::Surface(s) => (s.desc.format, s.desc.sample_count, s.desc.size()),
            PassTarget::Screen => (self.ctx.color_format(), 1, self.ctx.size()),
        }
    }

    /// Depth buffer matching the target, recreated when its size or sample
    /// count changes.
    fn depth_view(&mut self, (width, height): (u32, u32), samples: u32) -> wgpu::TextureView {
        let key = (width, height, samples);
        if let Some((cached, view)) = &self.depth
            && *cached == key
        {
            return view.clone();
        }
        let view = self
            .ctx
            .device
            .create_texture(&wgpu::TextureDescriptor {
                label: Some("Mesh Depth"),
                size: wgpu::Extent3d {
                    width: width.max(1),
                    height: height.max(1),
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: samples,
                dimension: wgpu::TextureDimension::D2,
                format: DEPTH_FORMAT,
                usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
                view_formats: &[],
            })
            .create_view(&wgpu::TextureViewDescriptor::default());
        self.depth = Some((key, view.clone()));
        view
    }

    /// Records one full-screen draw into the current frame.
    fn draw(
        &mut self,
        program: Program,
        block_params: [[f32; 4]; 4],
        input: Option<&wgpu::TextureView>,
        aux: Option<&TextureRef>,
        target: PassTarget<'_, GpuSurface>,
        load: wgpu::LoadOp<wgpu::Color>,
    ) {
        if self.frame.is_none() {
            log::warn!("Draw outside of a frame ignored");
            return;
        }

        let (format, samples, size) = self.target_format(&target);
        let key = (program, format, samples);
        self.ensure_pipeline(key);

        let buffer = self.next_uniform_buffer(&EffectBlock::new(block_params, size));
        let aux_view = self.aux_view(aux);
        let input_view = input.unwrap_or(&self.dummy_view);

        let bind_group = self.ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Effect BindGroup"),
            layout: &self.layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(input_view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::TextureView(&aux_view),
                },
            ],
        });

        let Some(pipeline) = self.pipelines.get(&key) else {
            return;
        };
        let Some(frame) = self.frame.as_mut() else {
            return;
        };

        let (view, resolve_target) = match &target {
            PassTarget::Surface(s) => s.attachments(),
            PassTarget::Screen => (&frame.view, None),
        };

        let mut pass = frame.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(program.label()),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target,
                ops: wgpu::Operations {
                    load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            ..Default::default()
        });

        pass.set_pipeline(pipeline);
        pass.set_bind_group(0, &bind_group, &[]);
        pass.draw(0..3, 0..1);
    }
}

fn upload_texture(ctx: &GpuContext, texture: &TextureData) -> wgpu::TextureView {
    let size = wgpu::Extent3d {
        width: texture.width,
        height: texture.height,
        depth_or_array_layers: 1,
    };
    let format = match texture.color_space {
        ColorSpace::Srgb => wgpu::TextureFormat::Rgba8UnormSrgb,
        ColorSpace::Linear => wgpu::TextureFormat::Rgba8Unorm,
    };
    let gpu_texture = ctx.device.create_texture(&wgpu::TextureDescriptor {
        label: Some(&texture.label),
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });
    ctx.queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture: &gpu_texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        &texture.data,
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(4 * texture.width),
            rows_per_image: Some(texture.height),
        },
        size,
    );
    gpu_texture.create_view(&wgpu::TextureViewDescriptor::default())
}

fn upload_cube(ctx: &GpuContext, faces: &[TextureData; 6]) -> wgpu::TextureView {
    let (width, height) = (faces[0].width, faces[0].height);
    let format = match faces[0].color_space {
        ColorSpace::Srgb => wgpu::TextureFormat::Rgba8UnormSrgb,
        ColorSpace::Linear => wgpu::TextureFormat::Rgba8Unorm,
    };
    let texture = ctx.device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Environment Cube"),
        size: wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 6,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });

    for (layer, face) in (0u32..).zip(faces) {
        if (face.width, face.height) != (width, height) {
            log::warn!("Cube face '{}' has a different size, left blank", face.label);
            continue;
        }
        ctx.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d {
                    x: 0,
                    y: 0,
                    z: layer,
                },
                aspect: wgpu::TextureAspect::All,
            },
            &face.data,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * width),
                rows_per_image: Some(height),
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );
    }

    texture.create_view(&wgpu::TextureViewDescriptor {
        label: Some("Environment Cube View"),
        dimension: Some(wgpu::TextureViewDimension::Cube),
        ..Default::default()
    })
}

fn to_wgpu_color(color: Vec4) -> wgpu::Color {
    wgpu::Color {
        r: f64::from(color.x),
        g: f64::from(color.y),
        b: f64::from(color.z),
        a: f64::from(color.w),
    }
}

impl RenderBackend for GpuBackend {
    type Surface = GpuSurface;
    type CubeMap = wgpu::TextureView;
    type Mesh = GpuMesh;

    fn create_surface(&mut self, desc: &SurfaceDescriptor) -> GpuSurface {
        let size = wgpu::Extent3d {
            width: desc.width,
            height: desc.height,
            depth_or_array_layers: 1,
        };
        let make = |label: &str, samples: u32, usage: wgpu::TextureUsages| {
            self.ctx
                .device
                .create_texture(&wgpu::TextureDescriptor {
                    label: Some(label),
                    size,
                    mip_level_count: 1,
                    sample_count: samples,
                    dimension: wgpu::TextureDimension::D2,
                    format: desc.format,
                    usage,
                    view_formats: &[],
                })
                .create_view(&wgpu::TextureViewDescriptor::default())
        };

        let view = make(
            "Pass Surface",
            1,
            wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
        );
        let msaa_view = desc.is_multisampled().then(|| {
            make(
                "Pass Surface MSAA",
                desc.sample_count,
                wgpu::TextureUsages::RENDER_ATTACHMENT,
            )
        });

        log::debug!(
            "Created {}x{} pass surface ({} sample(s))",
            desc.width,
            desc.height,
            desc.sample_count
        );

        GpuSurface {
            desc: *desc,
            view,
            msaa_view,
        }
    }

    fn resize_output(&mut self, width: u32, height: u32) {
        self.ctx.resize(width, height);
    }

    fn output_size(&self) -> (u32, u32) {
        self.ctx.size()
    }

    fn begin_frame(&mut self) -> bool {
        let output = match self.ctx.surface.get_current_texture() {
            wgpu::CurrentSurfaceTexture::Success(output)
            | wgpu::CurrentSurfaceTexture::Suboptimal(output) => output,
            wgpu::CurrentSurfaceTexture::Lost => {
                self.ctx.reconfigure();
                return false;
            }
            e => {
                log::error!("Render error: {:?}", e);
                return false;
            }
        };

        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let encoder = self
            .ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Post Process Encoder"),
            });

        self.uniform_cursor = 0;
        self.frame = Some(Frame {
            output,
            view,
            encoder,
        });
        true
    }

    fn end_frame(&mut self) {
        let Some(frame) = self.frame.take() else {
            return;
        };
        self.ctx.queue.submit(std::iter::once(frame.encoder.finish()));
        frame.output.present();
    }

    fn clear(&mut self, color: Vec4, target: PassTarget<'_, GpuSurface>) {
        let Some(frame) = self.frame.as_mut() else {
            return;
        };
        let (view, resolve_target) = match &target {
            PassTarget::Surface(s) => s.attachments(),
            PassTarget::Screen => (&frame.view, None),
        };
        let _pass = frame.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Clear"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(to_wgpu_color(color)),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            ..Default::default()
        });
    }

    fn apply_effect(
        &mut self,
        effect: &EffectParams,
        input: &GpuSurface,
        target: PassTarget<'_, GpuSurface>,
    ) {
        self.draw(
            Program::Effect(effect.kind()),
            effect.pack(),
            Some(&input.view),
            effect.aux_texture(),
            target,
            wgpu::LoadOp::DontCare(wgpu::LoadOpDontCare::default()),
        );
    }

    fn composite_overlay(&mut self, color: Vec4, target: PassTarget<'_, GpuSurface>) {
        let mut params = [[0.0; 4]; 4];
        params[0] = color.to_array();
        self.draw(Program::Overlay, params, None, None, target, wgpu::LoadOp::Load);
    }

    fn upload_cube_map(&mut self, faces: &[TextureData; 6]) -> wgpu::TextureView {
        log::debug!(
            "Uploading cube map ({}x{} per face)",
            faces[0].width,
            faces[0].height
        );
        upload_cube(&self.ctx, faces)
    }

    fn upload_mesh(&mut self, mesh: &MeshData) -> GpuMesh {
        let device = &self.ctx.device;
        let vertices = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Mesh Vertices"),
            contents: bytemuck::cast_slice(&mesh.positions),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let indices = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Mesh Indices"),
            contents: bytemuck::cast_slice(&mesh.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        log::debug!(
            "Uploaded mesh with {} triangles",
            mesh.triangle_count()
        );
        GpuMesh {
            vertices,
            indices,
            index_count: (mesh.triangle_count() * 3) as u32,
        }
    }

    fn draw_background(
        &mut self,
        cube: &wgpu::TextureView,
        inverse_view_projection: Mat4,
        target: PassTarget<'_, GpuSurface>,
    ) {
        if self.frame.is_none() {
            return;
        }
        let (format, samples, size) = self.target_format(&target);
        let key = (Program::Background, format, samples);
        self.ensure_pipeline(key);

        let buffer = self.next_uniform_buffer(&EffectBlock::new(
            inverse_view_projection.to_cols_array_2d(),
            size,
        ));
        let bind_group = self.ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Background BindGroup"),
            layout: &self.background_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(cube),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: buffer.as_entire_binding(),
                },
            ],
        });

        let (Some(pipeline), Some(frame)) = (self.pipelines.get(&key), self.frame.as_mut()) else {
            return;
        };
        let (view, resolve_target) = match &target {
            PassTarget::Surface(s) => s.attachments(),
            PassTarget::Screen => (&frame.view, None),
        };
        let mut pass = frame.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Background"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::DontCare(wgpu::LoadOpDontCare::default()),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            ..Default::default()
        });
        pass.set_pipeline(pipeline);
        pass.set_bind_group(0, &bind_group, &[]);
        pass.draw(0..3, 0..1);
    }

    fn draw_mesh(
        &mut self,
        mesh: &GpuMesh,
        view_projection: Mat4,
        color: Vec4,
        target: PassTarget<'_, GpuSurface>,
    ) {
        if self.frame.is_none() || mesh.index_count == 0 {
            return;
        }
        let (format, samples, size) = self.target_format(&target);
        let key = (Program::Mesh, format, samples);
        self.ensure_pipeline(key);

        let buffer = self.next_uniform_buffer(&MeshBlock {
            view_projection: view_projection.to_cols_array_2d(),
            color: color.to_array(),
        });
        let bind_group = self.ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Mesh BindGroup"),
            layout: &self.mesh_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
        });
        let depth = self.depth_view(size, samples);

        let (Some(pipeline), Some(frame)) = (self.pipelines.get(&key), self.frame.as_mut()) else {
            return;
        };
        let (view, resolve_target) = match &target {
            PassTarget::Surface(s) => s.attachments(),
            PassTarget::Screen => (&frame.view, None),
        };
        let mut pass = frame.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Mesh"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &depth,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Discard,
                }),
                stencil_ops: None,
            }),
            ..Default::default()
        });
        pass.set_pipeline(pipeline);
        pass.set_bind_group(0, &bind_group, &[]);
        pass.set_vertex_buffer(0, mesh.vertices.slice(..));
        pass.set_index_buffer(mesh.indices.slice(..), wgpu::IndexFormat::Uint32);
        pass.draw_indexed(0..mesh.index_count, 0, 0..1);
    }
}
