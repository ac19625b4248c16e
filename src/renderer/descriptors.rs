//! Descriptor set layout, pool and the one set binding the kernel's
//! resources.

use crate::error::Result;
use crate::renderer::buffer::DeviceBuffer;
use ash::{vk, Device};

/// Binding slots, fixed by the `#[spirv(...)]` attributes on the kernel
/// entry point.
pub const PIXEL_BUFFER_BINDING: u32 = 0;
pub const SEED_BUFFER_BINDING: u32 = 1;

/// The contract between host buffers and the kernel's inputs: a layout
/// with two compute-stage bindings, a pool sized for exactly one set of
/// each type, and the one set, populated once and never updated again.
pub struct DescriptorBindings {
    layout: vk::DescriptorSetLayout,
    pool: vk::DescriptorPool,
    set: vk::DescriptorSet,
}

impl DescriptorBindings {
    pub fn new(
        device: &Device,
        pixel_buffer: &DeviceBuffer,
        seed_buffer: &DeviceBuffer,
    ) -> Result<Self> {
        unsafe {
            let layout = device.create_descriptor_set_layout(
                &vk::DescriptorSetLayoutCreateInfo::default().bindings(&[
                    vk::DescriptorSetLayoutBinding::default()
                        .binding(PIXEL_BUFFER_BINDING)
                        .descriptor_type(vk::DescriptorType::STORAGE_BUFFER)
                        .descriptor_count(1)
                        .stage_flags(vk::ShaderStageFlags::COMPUTE),
                    vk::DescriptorSetLayoutBinding::default()
                        .binding(SEED_BUFFER_BINDING)
                        .descriptor_type(vk::DescriptorType::UNIFORM_BUFFER)
                        .descriptor_count(1)
                        .stage_flags(vk::ShaderStageFlags::COMPUTE),
                ]),
                None,
            )?;

            let pool = device.create_descriptor_pool(
                &vk::DescriptorPoolCreateInfo::default().max_sets(1).pool_sizes(&[
                    vk::DescriptorPoolSize::default()
                        .ty(vk::DescriptorType::STORAGE_BUFFER)
                        .descriptor_count(1),
                    vk::DescriptorPoolSize::default()
                        .ty(vk::DescriptorType::UNIFORM_BUFFER)
                        .descriptor_count(1),
                ]),
                None,
            )?;

            let set = device.allocate_descriptor_sets(
                &vk::DescriptorSetAllocateInfo::default()
                    .descriptor_pool(pool)
                    .set_layouts(&[layout]),
            )?[0];

            device.update_descriptor_sets(
                &[
                    vk::WriteDescriptorSet::default()
                        .dst_set(set)
                        .dst_binding(PIXEL_BUFFER_BINDING)
                        .descriptor_type(vk::DescriptorType::STORAGE_BUFFER)
                        .buffer_info(&[vk::DescriptorBufferInfo::default()
                            .buffer(pixel_buffer.raw())
                            .offset(0)
                            .range(pixel_buffer.size())]),
                    vk::WriteDescriptorSet::default()
                        .dst_set(set)
                        .dst_binding(SEED_BUFFER_BINDING)
                        .descriptor_type(vk::DescriptorType::UNIFORM_BUFFER)
                        .buffer_info(&[vk::DescriptorBufferInfo::default()
                            .buffer(seed_buffer.raw())
                            .offset(0)
                            .range(seed_buffer.size())]),
                ],
                &[],
            );

            Ok(Self { layout, pool, set })
        }
    }

    pub fn layout(&self) -> vk::DescriptorSetLayout {
        self.layout
    }

    pub fn set(&self) -> vk::DescriptorSet {
        self.set
    }

    pub fn destroy(&self, device: &Device) {
        unsafe {
            // Destroying the pool frees the set allocated from it.
            device.destroy_descriptor_pool(self.pool, None);
            device.destroy_descriptor_set_layout(self.layout, None);
        }
    }
}
