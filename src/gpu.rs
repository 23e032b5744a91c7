//! Vulkan instance, device and swapchain for a single UI window.

use std::sync::Arc;

use imgui::DrawData;
use vulkano::{
    command_buffer::{AutoCommandBufferBuilder, ClearColorImageInfo, CommandBufferUsage},
    device::{
        physical::{PhysicalDevice, PhysicalDeviceType},
        Device, DeviceCreateInfo, DeviceExtensions, Queue, QueueCreateInfo,
    },
    format::Format,
    image::{view::ImageView, ImageUsage, SwapchainImage},
    instance::{Instance, InstanceCreateInfo},
    swapchain::{
        self, AcquireError, ColorSpace, Surface, Swapchain, SwapchainCreateInfo,
        SwapchainCreationError, SwapchainPresentInfo,
    },
    sync::{self, FlushError, GpuFuture},
    VulkanLibrary,
};
use vulkano_win::VkSurfaceBuild;
use winit::{
    event_loop::EventLoop,
    window::{Window, WindowBuilder},
};

use crate::config::FrameConfig;
use crate::error::{BackendContext, BackendError, FrameError};
use crate::render::Renderer;

pub(crate) struct Gpu {
    pub(crate) device: Arc<Device>,
    pub(crate) queue: Arc<Queue>,
    pub(crate) format: Format,
    window: Arc<Window>,
    swapchain: Arc<Swapchain>,
    images: Vec<Arc<SwapchainImage>>,
    previous_frame_end: Option<Box<dyn GpuFuture>>,
    recreate_swapchain: bool,
}

impl Gpu {
    /// Opens the borderless window described by `config` and sets up presentation to it.
    pub fn new(event_loop: &EventLoop<()>, config: &FrameConfig) -> Result<Gpu, FrameError> {
        let library = VulkanLibrary::new().backend("loading the Vulkan library")?;
        let required_extensions = vulkano_win::required_extensions(&library);
        let instance = Instance::new(
            library,
            InstanceCreateInfo {
                enabled_extensions: required_extensions,
                ..Default::default()
            },
        )
        .backend("creating the Vulkan instance")?;

        let surface = construct_window_frame(config)
            .build_vk_surface(event_loop, Arc::clone(&instance))
            .backend("creating the window")?;
        let window = surface
            .object()
            .cloned()
            .and_then(|object| object.downcast::<Window>().ok())
            .ok_or(FrameError::Unsupported("a winit window"))?;
        log::info!(
            "opened \"{}\" at {}x{}",
            config.title,
            config.size.x,
            config.size.y
        );

        let device_extensions = DeviceExtensions {
            khr_swapchain: true,
            ..DeviceExtensions::empty()
        };
        let (physical, queue_family_index) = instance
            .enumerate_physical_devices()
            .backend("enumerating physical devices")?
            .filter(|p| p.supported_extensions().contains(&device_extensions))
            .filter_map(|p| {
                let family = present_queue_family(&p, &surface)?;
                Some((p, family))
            })
            .min_by_key(|(p, _)| device_rank(p.properties().device_type))
            .ok_or(FrameError::NoSuitableDevice)?;
        log::info!(
            "rendering on {} ({:?})",
            physical.properties().device_name,
            physical.properties().device_type
        );

        let (device, mut queues) = Device::new(
            Arc::clone(&physical),
            DeviceCreateInfo {
                enabled_extensions: device_extensions,
                queue_create_infos: vec![QueueCreateInfo {
                    queue_family_index,
                    ..Default::default()
                }],
                ..Default::default()
            },
        )
        .backend("creating the logical device")?;
        let queue = queues.next().ok_or(FrameError::NoSuitableDevice)?;

        let caps = physical
            .surface_capabilities(&surface, Default::default())
            .backend("querying surface capabilities")?;
        let format = physical
            .surface_formats(&surface, Default::default())
            .backend("querying surface formats")?
            .first()
            .map(|(format, _)| *format)
            .ok_or(FrameError::Unsupported("any image format"))?;
        let composite_alpha = caps
            .supported_composite_alpha
            .iter()
            .next()
            .ok_or(FrameError::Unsupported("any composite alpha mode"))?;

        let (swapchain, images) = Swapchain::new(
            Arc::clone(&device),
            Arc::clone(&surface),
            SwapchainCreateInfo {
                min_image_count: caps.min_image_count,
                image_format: Some(format),
                image_extent: window.inner_size().into(),
                image_usage: ImageUsage {
                    transfer_dst: true,
                    color_attachment: true,
                    ..ImageUsage::empty()
                },
                composite_alpha,
                image_color_space: ColorSpace::SrgbNonLinear,
                ..Default::default()
            },
        )
        .backend("creating the swapchain")?;

        let previous_frame_end = Some(sync::now(Arc::clone(&device)).boxed());

        Ok(Gpu {
            device,
            queue,
            format,
            window,
            swapchain,
            images,
            previous_frame_end,
            recreate_swapchain: false,
        })
    }

    pub fn window(&self) -> &Arc<Window> {
        &self.window
    }

    /// Rebuild the swapchain before the next frame.
    pub fn invalidate_swapchain(&mut self) {
        self.recreate_swapchain = true;
    }

    /// Clears the next swapchain image, draws `draw_data` over it and presents.
    /// Frames that cannot be presented right now (minimized, out of date) are dropped.
    pub fn draw_frame(&mut self, renderer: &mut Renderer, draw_data: &DrawData) -> Result<(), FrameError> {
        if let Some(previous) = self.previous_frame_end.as_mut() {
            previous.cleanup_finished();
        }

        if self.recreate_swapchain && !self.recreate()? {
            return Ok(());
        }

        let (image_index, suboptimal, acquire_future) =
            match swapchain::acquire_next_image(Arc::clone(&self.swapchain), None) {
                Err(AcquireError::OutOfDate) => {
                    self.recreate_swapchain = true;
                    return Ok(());
                }
                result => result.backend("acquiring a swapchain image")?,
            };
        if suboptimal {
            self.recreate_swapchain = true;
        }

        let allocator = Arc::clone(&renderer.allocators().command_buffers);
        let mut builder = AutoCommandBufferBuilder::primary(
            &*allocator,
            self.queue.queue_family_index(),
            CommandBufferUsage::OneTimeSubmit,
        )
        .backend("creating the frame command buffer")?;

        let image = Arc::clone(&self.images[image_index as usize]);
        builder
            .clear_color_image(ClearColorImageInfo::image(image.clone()))
            .backend("clearing the swapchain image")?;
        let target = ImageView::new_default(image).backend("creating the swapchain image view")?;
        renderer.draw_commands(&mut builder, target, draw_data)?;
        let commands = builder.build().backend("building the frame command buffer")?;

        let future = self
            .previous_frame_end
            .take()
            .unwrap_or_else(|| sync::now(Arc::clone(&self.device)).boxed())
            .join(acquire_future)
            .then_execute(Arc::clone(&self.queue), commands)
            .backend("submitting the frame")?
            .then_signal_fence()
            .then_swapchain_present(
                Arc::clone(&self.queue),
                SwapchainPresentInfo::swapchain_image_index(Arc::clone(&self.swapchain), image_index),
            );

        match future.flush() {
            Ok(()) => self.previous_frame_end = Some(future.boxed()),
            Err(FlushError::OutOfDate) => {
                self.recreate_swapchain = true;
                self.previous_frame_end = Some(sync::now(Arc::clone(&self.device)).boxed());
            }
            Err(e) => {
                log::warn!("failed to flush the frame: {}", e);
                self.previous_frame_end = Some(sync::now(Arc::clone(&self.device)).boxed());
            }
        }
        Ok(())
    }

    /// Returns `false` when the window currently has no presentable extent.
    fn recreate(&mut self) -> Result<bool, FrameError> {
        let image_extent: [u32; 2] = self.window.inner_size().into();
        match self.swapchain.recreate(SwapchainCreateInfo {
            image_extent,
            ..self.swapchain.create_info()
        }) {
            Ok((swapchain, images)) => {
                log::debug!("swapchain recreated at {}x{}", image_extent[0], image_extent[1]);
                self.swapchain = swapchain;
                self.images = images;
                self.recreate_swapchain = false;
                Ok(true)
            }
            Err(SwapchainCreationError::ImageExtentNotSupported { .. }) => Ok(false),
            Err(e) => Err(BackendError::new("recreating the swapchain", e).into()),
        }
    }
}

/// The window builder for a UI-only frame: fixed size, no decorations.
pub fn construct_window_frame(config: &FrameConfig) -> WindowBuilder {
    WindowBuilder::new()
        .with_title(config.title.clone())
        .with_inner_size(winit::dpi::PhysicalSize::from(config.size))
        .with_decorations(false)
        .with_resizable(false)
}

fn present_queue_family(physical: &PhysicalDevice, surface: &Surface) -> Option<u32> {
    physical
        .queue_family_properties()
        .iter()
        .enumerate()
        .position(|(i, q)| {
            q.queue_flags.graphics && physical.surface_support(i as u32, surface).unwrap_or(false)
        })
        .map(|i| i as u32)
}

fn device_rank(device_type: PhysicalDeviceType) -> u8 {
    match device_type {
        PhysicalDeviceType::DiscreteGpu => 0,
        PhysicalDeviceType::IntegratedGpu => 1,
        PhysicalDeviceType::VirtualGpu => 2,
        PhysicalDeviceType::Cpu => 3,
        _ => 4,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefers_dedicated_hardware() {
        let mut types = vec![
            PhysicalDeviceType::Cpu,
            PhysicalDeviceType::IntegratedGpu,
            PhysicalDeviceType::DiscreteGpu,
            PhysicalDeviceType::VirtualGpu,
        ];
        types.sort_by_key(|t| device_rank(*t));
        assert_eq!(
            types,
            vec![
                PhysicalDeviceType::DiscreteGpu,
                PhysicalDeviceType::IntegratedGpu,
                PhysicalDeviceType::VirtualGpu,
                PhysicalDeviceType::Cpu,
            ]
        );
    }
}
