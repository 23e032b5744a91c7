//! Records imgui draw data into Vulkano command buffers.

mod shader;
mod texture;

pub use texture::Texture;

use texture::{TextureRegistry, FONT_TEXTURE_ID};

use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use imgui::{internal::RawWrapper, BackendFlags, DrawCmd, DrawCmdParams, DrawVert, TextureId, Textures};
use vulkano::{
    buffer::{BufferUsage, CpuBufferPool},
    command_buffer::{
        allocator::{StandardCommandBufferAllocator, StandardCommandBufferAllocatorCreateInfo},
        AutoCommandBufferBuilder, CommandBufferUsage, PrimaryAutoCommandBuffer,
        PrimaryCommandBufferAbstract, RenderPassBeginInfo, SubpassContents,
    },
    descriptor_set::allocator::StandardDescriptorSetAllocator,
    device::{Device, Queue},
    format::Format,
    image::{view::ImageView, ImageDimensions, ImageViewAbstract, ImmutableImage, MipmapsCount},
    memory::allocator::{MemoryUsage, StandardMemoryAllocator},
    pipeline::{
        graphics::{
            color_blend::ColorBlendState,
            input_assembly::{InputAssemblyState, PrimitiveTopology},
            vertex_input::BuffersDefinition,
            viewport::{Scissor, Viewport, ViewportState},
        },
        GraphicsPipeline, Pipeline, PipelineBindPoint,
    },
    render_pass::{Framebuffer, FramebufferCreateInfo, RenderPass, Subpass},
    sampler::{Sampler, SamplerCreateInfo},
    sync::GpuFuture,
};

use crate::error::{BackendContext, RenderError};

#[derive(Default, Debug, Copy, Clone, Zeroable, Pod)]
#[repr(C)]
struct Vertex {
    pos: [f32; 2],
    uv: [f32; 2],
    /// RGBA8 packed in memory order, unpacked by the vertex shader.
    col: u32,
}

vulkano::impl_vertex!(Vertex, pos, uv, col);

impl From<DrawVert> for Vertex {
    fn from(v: DrawVert) -> Vertex {
        Vertex {
            pos: v.pos,
            uv: v.uv,
            col: u32::from_ne_bytes(v.col),
        }
    }
}

pub struct Allocators {
    pub descriptor_sets: Arc<StandardDescriptorSetAllocator>,
    pub memory: Arc<StandardMemoryAllocator>,
    pub command_buffers: Arc<StandardCommandBufferAllocator>,
}

impl Allocators {
    pub fn new(device: &Arc<Device>) -> Self {
        Allocators {
            descriptor_sets: Arc::new(StandardDescriptorSetAllocator::new(Arc::clone(device))),
            memory: Arc::new(StandardMemoryAllocator::new_default(Arc::clone(device))),
            command_buffers: Arc::new(StandardCommandBufferAllocator::new(
                Arc::clone(device),
                StandardCommandBufferAllocatorCreateInfo::default(),
            )),
        }
    }
}

pub struct Renderer {
    render_pass: Arc<RenderPass>,
    pipeline: Arc<GraphicsPipeline>,
    textures: TextureRegistry,
    vertex_pool: CpuBufferPool<Vertex>,
    index_pool: CpuBufferPool<u16>,
    allocators: Allocators,
}

impl Renderer {
    /// Builds the graphics pipeline and uploads the imgui font atlas.
    ///
    /// `format` is the format of the images the UI will be drawn into. `gamma` is applied to
    /// the output color; pass `None` for linear output. When `allocators` is `None` a fresh
    /// set is created for `device`.
    pub fn init(
        ctx: &mut imgui::Context,
        device: Arc<Device>,
        queue: Arc<Queue>,
        format: Format,
        gamma: Option<f32>,
        allocators: Option<Allocators>,
    ) -> Result<Renderer, RenderError> {
        let allocators = allocators.unwrap_or_else(|| Allocators::new(&device));

        let vs = shader::vs::load(Arc::clone(&device)).backend("loading the vertex shader")?;
        let fs = shader::fs::load(Arc::clone(&device)).backend("loading the fragment shader")?;
        let vs_main = vs.entry_point("main").ok_or(RenderError::Pipeline("vertex entry point"))?;
        let fs_main = fs.entry_point("main").ok_or(RenderError::Pipeline("fragment entry point"))?;

        let render_pass = vulkano::single_pass_renderpass!(
            Arc::clone(&device),
            attachments: {
                color: {
                    load: Load,
                    store: Store,
                    format: format,
                    samples: 1,
                }
            },
            pass: {
                color: [color],
                depth_stencil: {}
            }
        )
        .backend("creating the render pass")?;
        let subpass =
            Subpass::from(Arc::clone(&render_pass), 0).ok_or(RenderError::Pipeline("subpass 0"))?;

        let pipeline = GraphicsPipeline::start()
            .vertex_input_state(BuffersDefinition::new().vertex::<Vertex>())
            .vertex_shader(vs_main, ())
            .input_assembly_state(InputAssemblyState::new().topology(PrimitiveTopology::TriangleList))
            .viewport_state(ViewportState::viewport_dynamic_scissor_dynamic(1))
            .fragment_shader(
                fs_main,
                shader::fs::SpecializationConstants {
                    OUT_GAMMA: gamma.unwrap_or(1.0),
                },
            )
            .color_blend_state(ColorBlendState::new(subpass.num_color_attachments()).blend_alpha())
            .render_pass(subpass)
            .build(Arc::clone(&device))
            .backend("building the graphics pipeline")?;

        let font = Self::upload_font_texture(&mut ctx.fonts(), &device, queue, &allocators)?;

        ctx.set_renderer_name(Some(format!(
            "imgui-frameless {}",
            env!("CARGO_PKG_VERSION")
        )));
        ctx.io_mut()
            .backend_flags
            .insert(BackendFlags::RENDERER_HAS_VTX_OFFSET);

        let vertex_pool = CpuBufferPool::new(
            Arc::clone(&allocators.memory),
            BufferUsage {
                vertex_buffer: true,
                transfer_dst: true,
                ..BufferUsage::empty()
            },
            MemoryUsage::Upload,
        );
        let index_pool = CpuBufferPool::new(
            Arc::clone(&allocators.memory),
            BufferUsage {
                index_buffer: true,
                transfer_dst: true,
                ..BufferUsage::empty()
            },
            MemoryUsage::Upload,
        );

        Ok(Renderer {
            render_pass,
            pipeline,
            textures: TextureRegistry::new(font),
            vertex_pool,
            index_pool,
            allocators,
        })
    }

    /// Appends a render pass drawing `draw_data` into `target` to `builder`.
    /// A frame with no visible area records nothing.
    pub fn draw_commands<I>(
        &mut self,
        builder: &mut AutoCommandBufferBuilder<PrimaryAutoCommandBuffer>,
        target: Arc<I>,
        draw_data: &imgui::DrawData,
    ) -> Result<(), RenderError>
    where
        I: ImageViewAbstract + Send + Sync + 'static,
    {
        let fb_width = draw_data.display_size[0] * draw_data.framebuffer_scale[0];
        let fb_height = draw_data.display_size[1] * draw_data.framebuffer_scale[1];
        if !(fb_width > 0.0 && fb_height > 0.0) {
            return Ok(());
        }

        let dims = match target.image().dimensions() {
            ImageDimensions::Dim2d { width, height, .. } => [width, height],
            d => return Err(RenderError::BadImageDimensions(d)),
        };

        let pc = projection(draw_data.display_pos, draw_data.display_size);
        let clip_off = draw_data.display_pos;
        let clip_scale = draw_data.framebuffer_scale;
        let layout = Arc::clone(
            self.pipeline
                .layout()
                .set_layouts()
                .first()
                .ok_or(RenderError::Pipeline("descriptor set layout 0"))?,
        );

        // one framebuffer per frame; swapchain images change under us on resize
        let framebuffer = Framebuffer::new(
            Arc::clone(&self.render_pass),
            FramebufferCreateInfo {
                attachments: vec![target as Arc<dyn ImageViewAbstract>],
                ..Default::default()
            },
        )
        .backend("creating the framebuffer")?;

        let mut info = RenderPassBeginInfo::framebuffer(framebuffer);
        info.clear_values = vec![None];

        builder
            .begin_render_pass(info, SubpassContents::Inline)
            .backend("beginning the UI render pass")?
            .bind_pipeline_graphics(Arc::clone(&self.pipeline))
            .set_viewport(
                0,
                std::iter::once(Viewport {
                    origin: [0.0, 0.0],
                    dimensions: [dims[0] as f32, dims[1] as f32],
                    depth_range: 0.0..1.0,
                }),
            );

        for draw_list in draw_data.draw_lists() {
            let vertex_buffer = self
                .vertex_pool
                .from_iter(draw_list.vtx_buffer().iter().map(|&v| Vertex::from(v)))
                .backend("uploading vertices")?;
            let index_buffer = self
                .index_pool
                .from_iter(draw_list.idx_buffer().iter().copied())
                .backend("uploading indices")?;

            for cmd in draw_list.commands() {
                match cmd {
                    DrawCmd::Elements {
                        count,
                        cmd_params:
                            DrawCmdParams {
                                clip_rect,
                                texture_id,
                                vtx_offset,
                                idx_offset,
                                ..
                            },
                    } => {
                        let clip = [
                            (clip_rect[0] - clip_off[0]) * clip_scale[0],
                            (clip_rect[1] - clip_off[1]) * clip_scale[1],
                            (clip_rect[2] - clip_off[0]) * clip_scale[0],
                            (clip_rect[3] - clip_off[1]) * clip_scale[1],
                        ];
                        if clip[0] >= fb_width || clip[1] >= fb_height || clip[2] < 0.0 || clip[3] < 0.0 {
                            continue;
                        }

                        let set = self.textures.descriptor_set(
                            texture_id,
                            &layout,
                            &self.allocators.descriptor_sets,
                        )?;

                        builder
                            .bind_descriptor_sets(
                                PipelineBindPoint::Graphics,
                                Arc::clone(self.pipeline.layout()),
                                0,
                                set,
                            )
                            .set_scissor(0, std::iter::once(scissor(clip)))
                            .bind_vertex_buffers(0, Arc::clone(&vertex_buffer))
                            .bind_index_buffer(Arc::clone(&index_buffer))
                            .push_constants(Arc::clone(self.pipeline.layout()), 0, pc)
                            .draw_indexed(count as u32, 1, idx_offset as u32, vtx_offset as i32, 0)
                            .backend("recording a UI draw")?;
                    }
                    DrawCmd::ResetRenderState => {
                        builder.bind_pipeline_graphics(Arc::clone(&self.pipeline));
                    }
                    DrawCmd::RawCallback { callback, raw_cmd } => unsafe {
                        callback(draw_list.raw(), raw_cmd)
                    },
                }
            }
        }

        builder
            .end_render_pass()
            .backend("ending the UI render pass")?;
        Ok(())
    }

    /// Rebuilds and uploads the font atlas, e.g. after adding fonts.
    pub fn reload_font_texture(
        &mut self,
        ctx: &mut imgui::Context,
        device: Arc<Device>,
        queue: Arc<Queue>,
    ) -> Result<(), RenderError> {
        let font = Self::upload_font_texture(&mut ctx.fonts(), &device, queue, &self.allocators)?;
        self.textures.replace_font(font);
        Ok(())
    }

    pub fn textures_mut(&mut self) -> &mut Textures<Texture> {
        self.textures.textures_mut()
    }

    pub fn textures(&self) -> &Textures<Texture> {
        self.textures.textures()
    }

    pub fn allocators(&self) -> &Allocators {
        &self.allocators
    }

    fn upload_font_texture(
        fonts: &mut imgui::FontAtlas,
        device: &Arc<Device>,
        queue: Arc<Queue>,
        allocators: &Allocators,
    ) -> Result<Texture, RenderError> {
        let atlas = fonts.build_rgba32_texture();

        let mut builder = AutoCommandBufferBuilder::primary(
            &*allocators.command_buffers,
            queue.queue_family_index(),
            CommandBufferUsage::OneTimeSubmit,
        )
        .backend("creating the font upload command buffer")?;

        let image = ImmutableImage::from_iter(
            &*allocators.memory,
            atlas.data.iter().copied(),
            ImageDimensions::Dim2d {
                width: atlas.width,
                height: atlas.height,
                array_layers: 1,
            },
            MipmapsCount::One,
            Format::R8G8B8A8_SRGB,
            &mut builder,
        )
        .backend("creating the font atlas image")?;

        builder
            .build()
            .backend("building the font upload command buffer")?
            .execute(queue)
            .backend("submitting the font upload")?
            .then_signal_fence_and_flush()
            .backend("flushing the font upload")?
            .wait(None)
            .backend("waiting for the font upload")?;

        let sampler = Sampler::new(Arc::clone(device), SamplerCreateInfo::simple_repeat_linear())
            .backend("creating the font sampler")?;
        let view = ImageView::new_default(image).backend("creating the font atlas view")?;

        fonts.tex_id = TextureId::from(FONT_TEXTURE_ID);
        Ok((view, sampler))
    }
}

/// Orthographic projection mapping the imgui display rectangle to clip space.
fn projection(pos: [f32; 2], size: [f32; 2]) -> shader::vs::ty::VertPC {
    let (left, top) = (pos[0], pos[1]);
    let (right, bottom) = (pos[0] + size[0], pos[1] + size[1]);
    shader::vs::ty::VertPC {
        matrix: [
            [2.0 / (right - left), 0.0, 0.0, 0.0],
            [0.0, 2.0 / (bottom - top), 0.0, 0.0],
            [0.0, 0.0, -1.0, 0.0],
            [
                (right + left) / (left - right),
                (top + bottom) / (top - bottom),
                0.0,
                1.0,
            ],
        ],
    }
}

/// Scissor covering `clip`, clamped to the framebuffer's top-left corner. The extent is
/// measured from the clamped origin so the far edges stay where the clip rect puts them.
fn scissor(clip: [f32; 4]) -> Scissor {
    let origin = [clip[0].max(0.0).floor(), clip[1].max(0.0).floor()];
    Scissor {
        origin: [origin[0] as u32, origin[1] as u32],
        dimensions: [
            (clip[2].ceil() - origin[0]).max(0.0) as u32,
            (clip[3].ceil() - origin[1]).max(0.0) as u32,
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertex_keeps_color_bytes() {
        let v = Vertex::from(DrawVert {
            pos: [1.0, 2.0],
            uv: [0.25, 0.5],
            col: [0x11, 0x22, 0x33, 0x44],
        });
        assert_eq!(v.pos, [1.0, 2.0]);
        assert_eq!(v.uv, [0.25, 0.5]);
        assert_eq!(bytemuck::bytes_of(&v.col), &[0x11, 0x22, 0x33, 0x44]);
    }

    #[test]
    fn projection_maps_corners_to_clip_space() {
        let m = projection([0.0, 0.0], [900.0, 400.0]).matrix;
        let apply = |x: f32, y: f32| {
            [
                m[0][0] * x + m[3][0],
                m[1][1] * y + m[3][1],
            ]
        };
        let close = |a: [f32; 2], b: [f32; 2]| (a[0] - b[0]).abs() < 1e-5 && (a[1] - b[1]).abs() < 1e-5;
        assert!(close(apply(0.0, 0.0), [-1.0, -1.0]));
        assert!(close(apply(900.0, 400.0), [1.0, 1.0]));
        assert!(close(apply(450.0, 200.0), [0.0, 0.0]));
    }

    #[test]
    fn scissor_clamps_negative_origins() {
        let s = scissor([-10.0, 5.5, 100.0, 20.0]);
        assert_eq!(s.origin, [0, 5]);
        // the right and bottom edges stay at the clip rect's edges
        assert_eq!(s.dimensions, [100, 15]);

        let s = scissor([-30.0, -8.0, 40.5, 12.2]);
        assert_eq!(s.origin, [0, 0]);
        assert_eq!(s.dimensions, [41, 13]);
    }

    #[test]
    fn scissor_of_offscreen_clip_is_empty() {
        let s = scissor([-50.0, -50.0, -10.0, -10.0]);
        assert_eq!(s.origin, [0, 0]);
        assert_eq!(s.dimensions, [0, 0]);
    }

    #[test]
    fn scissor_keeps_onscreen_clips() {
        let s = scissor([10.0, 20.0, 110.0, 60.0]);
        assert_eq!(s.origin, [10, 20]);
        assert_eq!(s.dimensions, [100, 40]);
    }
}
