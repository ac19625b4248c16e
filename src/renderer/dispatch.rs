//! One-shot command buffer recording, submission and completion wait.

use crate::error::Result;
use crate::renderer::device::DeviceContext;
use ash::vk;

/// Records a single compute dispatch into a fresh one-shot command
/// buffer, submits it and blocks until the queue drains. Only after this
/// returns may the output buffer be read.
pub fn submit_and_wait(
    context: &DeviceContext,
    pipeline: vk::Pipeline,
    pipeline_layout: vk::PipelineLayout,
    descriptor_set: vk::DescriptorSet,
    group_counts: [u32; 3],
) -> Result<()> {
    let device = context.device();
    unsafe {
        let command_buffer = device.allocate_command_buffers(
            &vk::CommandBufferAllocateInfo::default()
                .command_pool(context.command_pool())
                .level(vk::CommandBufferLevel::PRIMARY)
                .command_buffer_count(1),
        )?[0];

        device.begin_command_buffer(
            command_buffer,
            &vk::CommandBufferBeginInfo::default()
                .flags(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT),
        )?;

        device.cmd_bind_pipeline(
            command_buffer,
            vk::PipelineBindPoint::COMPUTE,
            pipeline,
        );
        device.cmd_bind_descriptor_sets(
            command_buffer,
            vk::PipelineBindPoint::COMPUTE,
            pipeline_layout,
            0,
            &[descriptor_set],
            &[],
        );
        device.cmd_dispatch(
            command_buffer,
            group_counts[0],
            group_counts[1],
            group_counts[2],
        );

        device.end_command_buffer(command_buffer)?;

        device.queue_submit(
            context.queue(),
            &[vk::SubmitInfo::default().command_buffers(&[command_buffer])],
            vk::Fence::null(),
        )?;
        device.queue_wait_idle(context.queue())?;

        device.free_command_buffers(context.command_pool(), &[command_buffer]);
    }
    Ok(())
}
