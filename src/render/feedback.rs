//! Single-slot last-frame feedback.
//!
//! Holds at most one copy of the previously rendered frame and draws it back
//! into the current one. Modes that want trails must composite the stale
//! frame *before* issuing their own drawing for the tick and capture *after*;
//! composing the other way round collapses the feedback loop into a flat
//! color. Multi-depth trails built by compositing the single slot several
//! times with decreasing opacity are a caller-side convention, not something
//! this type guarantees.

use log::debug;
use naga::front::wgsl;
use naga::valid::{Capabilities, ValidationFlags, Validator};

const COMPOSITE_SHADER: &str = include_str!("composite.wgsl");

/// Destination rect (target pixels, top-left origin), opacity, and an
/// optional horizontal mirror.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CompositeParams {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub opacity: f32,
    pub flip_horizontal: bool,
}

impl CompositeParams {
    /// Full-target composite at the given opacity.
    pub fn full(target_size: [u32; 2], opacity: f32) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: target_size[0] as f32,
            height: target_size[1] as f32,
            opacity,
            flip_horizontal: false,
        }
    }
}

#[derive(Clone, Copy, Debug, bytemuck::Pod, bytemuck::Zeroable)]
#[repr(C)]
struct CompositeUniforms {
    rect: [f32; 4],
    params: [f32; 4],
}

struct SlotTexture {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    size: wgpu::Extent3d,
    format: wgpu::TextureFormat,
}

pub struct FeedbackCompositor {
    slot: Option<SlotTexture>,
    pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    texture_bind_group_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
}

impl FeedbackCompositor {
    /// `target_format` is the format of the surface the slot will be drawn
    /// back into (not necessarily the slot's own format).
    pub fn new(
        device: &wgpu::Device,
        target_format: wgpu::TextureFormat,
    ) -> Result<Self, String> {
        validate_shader(COMPOSITE_SHADER)
            .map_err(|err| format!("composite shader invalid: {}", err))?;

        let shader =
            device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some("strata-composite"),
                source: wgpu::ShaderSource::Wgsl(COMPOSITE_SHADER.into()),
            });

        let uniform_bind_group_layout = device.create_bind_group_layout(
            &wgpu::BindGroupLayoutDescriptor {
                label: Some("strata-composite-uniform-layout"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX
                        | wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: wgpu::BufferSize::new(
                            std::mem::size_of::<CompositeUniforms>() as u64,
                        ),
                    },
                    count: None,
                }],
            },
        );

        let texture_bind_group_layout = device.create_bind_group_layout(
            &wgpu::BindGroupLayoutDescriptor {
                label: Some("strata-composite-texture-layout"),
                entries: &[
                    wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Sampler(
                            wgpu::SamplerBindingType::Filtering,
                        ),
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 1,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Texture {
                            sample_type: wgpu::TextureSampleType::Float {
                                filterable: true,
                            },
                            view_dimension: wgpu::TextureViewDimension::D2,
                            multisampled: false,
                        },
                        count: None,
                    },
                ],
            },
        );

        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("strata-composite-uniforms"),
            size: std::mem::size_of::<CompositeUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let uniform_bind_group =
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("strata-composite-uniform-bind-group"),
                layout: &uniform_bind_group_layout,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniform_buffer.as_entire_binding(),
                }],
            });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("strata-composite-sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("strata-composite-pipeline-layout"),
                bind_group_layouts: &[
                    &uniform_bind_group_layout,
                    &texture_bind_group_layout,
                ],
                push_constant_ranges: &[],
            });

        let pipeline =
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("strata-composite-pipeline"),
                layout: Some(&layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: Some("vs_main"),
                    compilation_options:
                        wgpu::PipelineCompilationOptions::default(),
                    buffers: &[],
                },
                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: Some("fs_main"),
                    compilation_options:
                        wgpu::PipelineCompilationOptions::default(),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: target_format,
                        blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleStrip,
                    strip_index_format: None,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode: None,
                    unclipped_depth: false,
                    polygon_mode: wgpu::PolygonMode::Fill,
                    conservative: false,
                },
                depth_stencil: None,
                multisample: wgpu::MultisampleState {
                    count: 1,
                    mask: !0,
                    alpha_to_coverage_enabled: false,
                },
                multiview: None,
                cache: None,
            });

        Ok(Self {
            slot: None,
            pipeline,
            uniform_buffer,
            uniform_bind_group,
            texture_bind_group_layout,
            sampler,
        })
    }

    pub fn has_frame(&self) -> bool {
        self.slot.is_some()
    }

    pub fn clear(&mut self) {
        self.slot = None;
    }

    /// Snapshots the just-rendered output into the slot, replacing whatever
    /// was held before (the previous texture is released on replacement).
    /// The source must carry `COPY_SRC` usage. Call this after all drawing
    /// for the tick, inside the same encoder.
    pub fn capture_current_frame(
        &mut self,
        device: &wgpu::Device,
        encoder: &mut wgpu::CommandEncoder,
        source: &wgpu::Texture,
    ) {
        let size = source.size();
        let format = source.format();

        let fits = self
            .slot
            .as_ref()
            .is_some_and(|slot| slot.size == size && slot.format == format);

        if !fits {
            debug!(
                "feedback slot (re)created: {}x{} {:?}",
                size.width, size.height, format
            );

            let texture = device.create_texture(&wgpu::TextureDescriptor {
                label: Some("strata-feedback-slot"),
                size,
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format,
                usage: wgpu::TextureUsages::TEXTURE_BINDING
                    | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            });

            let view =
                texture.create_view(&wgpu::TextureViewDescriptor::default());

            self.slot = Some(SlotTexture {
                texture,
                view,
                size,
                format,
            });
        }

        let slot = self.slot.as_ref().unwrap();
        encoder.copy_texture_to_texture(
            wgpu::TexelCopyTextureInfo {
                texture: source,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyTextureInfo {
                texture: &slot.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            size,
        );
    }

    /// Draws the held frame into the target region. A no-op while the slot
    /// is empty (nothing has been captured yet, or `clear` was called).
    /// Issue this before any new drawing for the tick.
    pub fn composite_last_frame(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        target_view: &wgpu::TextureView,
        target_size: [u32; 2],
        params: CompositeParams,
    ) {
        let Some(slot) = self.slot.as_ref() else {
            return;
        };

        let uniforms = CompositeUniforms {
            rect: [params.x, params.y, params.width, params.height],
            params: [
                params.opacity.clamp(0.0, 1.0),
                if params.flip_horizontal { 1.0 } else { 0.0 },
                (target_size[0].max(1)) as f32,
                (target_size[1].max(1)) as f32,
            ],
        };
        queue.write_buffer(
            &self.uniform_buffer,
            0,
            bytemuck::bytes_of(&uniforms),
        );

        let texture_bind_group =
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("strata-composite-texture-bind-group"),
                layout: &self.texture_bind_group_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: wgpu::BindingResource::Sampler(&self.sampler),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::TextureView(
                            &slot.view,
                        ),
                    },
                ],
            });

        let mut render_pass =
            encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("strata-composite"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target_view,
                    resolve_target: None,
                    depth_slice: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

        render_pass.set_pipeline(&self.pipeline);
        render_pass.set_bind_group(0, &self.uniform_bind_group, &[]);
        render_pass.set_bind_group(1, &texture_bind_group, &[]);
        render_pass.draw(0..4, 0..1);
    }
}

fn validate_shader(source: &str) -> Result<(), String> {
    let module = wgsl::parse_str(source).map_err(|err| err.to_string())?;

    let mut validator =
        Validator::new(ValidationFlags::all(), Capabilities::all());

    validator
        .validate(&module)
        .map_err(|err| err.to_string())
        .map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_composite_shader_validates() {
        validate_shader(COMPOSITE_SHADER).unwrap();
    }

    #[test]
    fn full_target_params_cover_the_surface() {
        let params = CompositeParams::full([640, 480], 0.85);
        assert_eq!(params.x, 0.0);
        assert_eq!(params.width, 640.0);
        assert_eq!(params.height, 480.0);
        assert_eq!(params.opacity, 0.85);
        assert!(!params.flip_horizontal);
    }
}
