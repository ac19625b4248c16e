//! The single-dispatch compute renderer: device context, buffers,
//! bindings, pipeline and the submit/wait/readback cycle.

pub mod buffer;
pub mod descriptors;
pub mod device;
pub mod dispatch;
pub mod pipeline;

pub use device::DeviceContext;

use crate::error::Result;
use ash::vk;
use buffer::DeviceBuffer;
use descriptors::DescriptorBindings;
use log::debug;
use pipeline::KernelPipeline;
use shared::{Pixel, RenderConfig, SeedParams};

/// Owns every device resource the render needs. Resources are created in
/// dependency order in [`Renderer::new`] and destroyed in reverse order
/// in `Drop`; `context` is declared last so it outlives the teardown of
/// everything allocated from it.
pub struct Renderer {
    config: RenderConfig,
    pixel_buffer: DeviceBuffer,
    seed_buffer: DeviceBuffer,
    bindings: DescriptorBindings,
    pipeline: KernelPipeline,
    context: DeviceContext,
}

impl Renderer {
    pub fn new(context: DeviceContext, config: RenderConfig) -> Result<Self> {
        let device = context.device();
        let memory_properties = context.memory_properties();

        // Both buffers are host-visible and host-coherent: the seed is
        // written directly by the host, the pixels are mapped for the
        // readback after the completion wait.
        let host_coherent = vk::MemoryPropertyFlags::HOST_VISIBLE
            | vk::MemoryPropertyFlags::HOST_COHERENT;

        let pixel_buffer = DeviceBuffer::new(
            device,
            memory_properties,
            config.pixel_buffer_size(),
            vk::BufferUsageFlags::STORAGE_BUFFER,
            host_coherent,
        )?;
        let seed_buffer = DeviceBuffer::new(
            device,
            memory_properties,
            std::mem::size_of::<SeedParams>() as vk::DeviceSize,
            vk::BufferUsageFlags::UNIFORM_BUFFER,
            host_coherent,
        )?;

        let bindings = DescriptorBindings::new(device, &pixel_buffer, &seed_buffer)?;
        let pipeline = KernelPipeline::new(device, bindings.layout())?;

        Ok(Self {
            config,
            pixel_buffer,
            seed_buffer,
            bindings,
            pipeline,
            context,
        })
    }

    pub fn config(&self) -> RenderConfig {
        self.config
    }

    /// Runs one dispatch: uploads the seed, records and submits the
    /// command buffer, blocks until the device is done, then reads the
    /// pixel buffer back.
    pub fn render(&self, seed: u32) -> Result<Vec<Pixel>> {
        // The seed write needs no barrier: it lands before the submission,
        // and the submission boundary orders host writes against the
        // dispatch.
        self.seed_buffer
            .write_pod(self.context.device(), &SeedParams { seed })?;

        let group_counts = self.config.workgroup_counts();
        debug!(
            "dispatching {}x{} workgroups of {}x{}",
            group_counts[0], group_counts[1], self.config.workgroup_size, self.config.workgroup_size
        );
        dispatch::submit_and_wait(
            &self.context,
            self.pipeline.raw(),
            self.pipeline.layout(),
            self.bindings.set(),
            group_counts,
        )?;

        // submit_and_wait has returned, so the GPU is done writing.
        self.pixel_buffer
            .read_vec::<Pixel>(self.context.device(), self.config.pixel_count())
    }
}

impl Drop for Renderer {
    fn drop(&mut self) {
        let device = self.context.device();
        self.pipeline.destroy(device);
        self.bindings.destroy(device);
        self.seed_buffer.destroy(device);
        self.pixel_buffer.destroy(device);
        // self.context drops afterwards and tears down pool, device,
        // instance.
    }
}
