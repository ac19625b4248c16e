//! Compute pipeline built from the embedded SPIR-V kernel.

use crate::error::{RenderError, Result};
use ash::{vk, Device};
use std::ffi::CString;

pub struct KernelPipeline {
    shader_module: vk::ShaderModule,
    layout: vk::PipelineLayout,
    pipeline: vk::Pipeline,
}

impl KernelPipeline {
    pub fn new(device: &Device, set_layout: vk::DescriptorSetLayout) -> Result<Self> {
        unsafe {
            let code =
                ash::util::read_spv(&mut std::io::Cursor::new(crate::MANDELBROT_SPIRV))?;
            let shader_module = device.create_shader_module(
                &vk::ShaderModuleCreateInfo::default().code(&code),
                None,
            )?;

            let layout = device.create_pipeline_layout(
                &vk::PipelineLayoutCreateInfo::default().set_layouts(&[set_layout]),
                None,
            )?;

            let entry_name = CString::new(crate::MANDELBROT_ENTRY)
                .map_err(|e| RenderError::Other(e.to_string()))?;

            let pipeline = device
                .create_compute_pipelines(
                    vk::PipelineCache::null(),
                    &[vk::ComputePipelineCreateInfo::default()
                        .stage(
                            vk::PipelineShaderStageCreateInfo::default()
                                .stage(vk::ShaderStageFlags::COMPUTE)
                                .module(shader_module)
                                .name(&entry_name),
                        )
                        .layout(layout)],
                    None,
                )
                .map_err(|(_, err)| err)?[0];

            Ok(Self {
                shader_module,
                layout,
                pipeline,
            })
        }
    }

    pub fn raw(&self) -> vk::Pipeline {
        self.pipeline
    }

    pub fn layout(&self) -> vk::PipelineLayout {
        self.layout
    }

    /// Destroys pipeline before layout before shader module; the device
    /// must still be alive.
    pub fn destroy(&self, device: &Device) {
        unsafe {
            device.destroy_pipeline(self.pipeline, None);
            device.destroy_pipeline_layout(self.layout, None);
            device.destroy_shader_module(self.shader_module, None);
        }
    }
}
