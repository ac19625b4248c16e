//! Device context: instance, physical device, logical device, compute queue.

use crate::error::{RenderError, Result};
use ash::{vk, Device, Entry, Instance};
use log::{debug, warn};
use std::ffi::{c_char, c_void, CStr, CString};

/// Validation layers are a debug-build concern only.
const VALIDATION_ENABLED: bool = cfg!(debug_assertions);
const VALIDATION_LAYER: &[u8] = b"VK_LAYER_KHRONOS_validation";

struct DebugMessenger {
    loader: ash::ext::debug_utils::Instance,
    messenger: vk::DebugUtilsMessengerEXT,
}

/// Owns the connection to one compute-capable GPU: instance, logical
/// device, queue and command pool. Everything else in the renderer
/// borrows from here and must be destroyed before this drops.
pub struct DeviceContext {
    _entry: Entry,
    instance: Instance,
    debug: Option<DebugMessenger>,
    #[allow(dead_code)]
    physical_device: vk::PhysicalDevice,
    device: Device,
    queue_family_index: u32,
    queue: vk::Queue,
    command_pool: vk::CommandPool,
    memory_properties: vk::PhysicalDeviceMemoryProperties,
    device_name: String,
}

impl DeviceContext {
    /// Connects to the first physical device exposing a compute queue
    /// family. Any API failure here is fatal; there is no retry.
    pub fn new() -> Result<Self> {
        unsafe {
            // Load Vulkan entry point
            let entry = Entry::load()?;

            let app_name = CString::new("gpu-mandelbrot")
                .map_err(|e| RenderError::Other(e.to_string()))?;
            let app_info = vk::ApplicationInfo::default()
                .application_name(&app_name)
                .application_version(vk::make_api_version(0, 1, 0, 0))
                .api_version(vk::API_VERSION_1_2);

            let mut layer_names: Vec<*const c_char> = vec![];
            let mut extension_names: Vec<*const c_char> = vec![];
            let mut debug_requested = false;

            // Keep the layer name alive for the duration of instance creation
            let _validation_layer_name = if VALIDATION_ENABLED {
                let available_layers = entry.enumerate_instance_layer_properties()?;
                let has_validation = available_layers.iter().any(|layer| {
                    let name = CStr::from_ptr(layer.layer_name.as_ptr());
                    name.to_bytes() == VALIDATION_LAYER
                });

                if has_validation {
                    let name = CString::new(VALIDATION_LAYER)
                        .map_err(|e| RenderError::Other(e.to_string()))?;
                    layer_names.push(name.as_ptr());
                    extension_names.push(ash::ext::debug_utils::NAME.as_ptr());
                    debug_requested = true;
                    debug!("validation layer enabled");
                    Some(name)
                } else {
                    warn!("validation layer requested but not installed, continuing without it");
                    None
                }
            } else {
                None
            };

            let instance = entry.create_instance(
                &vk::InstanceCreateInfo::default()
                    .application_info(&app_info)
                    .enabled_layer_names(&layer_names)
                    .enabled_extension_names(&extension_names),
                None,
            )?;

            let debug = if debug_requested {
                let loader = ash::ext::debug_utils::Instance::new(&entry, &instance);
                let messenger = loader.create_debug_utils_messenger(
                    &vk::DebugUtilsMessengerCreateInfoEXT::default()
                        .message_severity(
                            vk::DebugUtilsMessageSeverityFlagsEXT::WARNING
                                | vk::DebugUtilsMessageSeverityFlagsEXT::ERROR,
                        )
                        .message_type(
                            vk::DebugUtilsMessageTypeFlagsEXT::GENERAL
                                | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION
                                | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE,
                        )
                        .pfn_user_callback(Some(debug_utils_callback)),
                    None,
                )?;
                Some(DebugMessenger { loader, messenger })
            } else {
                None
            };

            // Pick the first physical device exposing a compute-capable
            // queue family
            let physical_devices = instance.enumerate_physical_devices()?;
            if physical_devices.is_empty() {
                return Err(RenderError::NoVulkanDevice(0));
            }
            let (physical_device, queue_family_index) = physical_devices
                .iter()
                .copied()
                .find_map(|candidate| {
                    instance
                        .get_physical_device_queue_family_properties(candidate)
                        .iter()
                        .enumerate()
                        .find(|(_, props)| {
                            props.queue_flags.contains(vk::QueueFlags::COMPUTE)
                        })
                        .map(|(idx, _)| (candidate, idx as u32))
                })
                .ok_or(RenderError::NoComputeQueue)?;

            let properties = instance.get_physical_device_properties(physical_device);
            let device_name = CStr::from_ptr(properties.device_name.as_ptr())
                .to_string_lossy()
                .to_string();

            let memory_properties =
                instance.get_physical_device_memory_properties(physical_device);

            // Create logical device. The SPIR-V we ship targets Vulkan 1.2
            // and declares the VulkanMemoryModel capability, which requires
            // the matching device feature.
            let queue_priorities = [1.0];
            let queue_info = vk::DeviceQueueCreateInfo::default()
                .queue_family_index(queue_family_index)
                .queue_priorities(&queue_priorities);

            let mut vulkan_1_2_features =
                vk::PhysicalDeviceVulkan12Features::default().vulkan_memory_model(true);

            let device = instance.create_device(
                physical_device,
                &vk::DeviceCreateInfo::default()
                    .queue_create_infos(std::slice::from_ref(&queue_info))
                    .push_next(&mut vulkan_1_2_features),
                None,
            )?;

            let queue = device.get_device_queue(queue_family_index, 0);

            let command_pool = device.create_command_pool(
                &vk::CommandPoolCreateInfo::default()
                    .flags(vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER)
                    .queue_family_index(queue_family_index),
                None,
            )?;

            Ok(Self {
                _entry: entry,
                instance,
                debug,
                physical_device,
                device,
                queue_family_index,
                queue,
                command_pool,
                memory_properties,
                device_name,
            })
        }
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    pub fn queue(&self) -> vk::Queue {
        self.queue
    }

    pub fn queue_family_index(&self) -> u32 {
        self.queue_family_index
    }

    pub fn command_pool(&self) -> vk::CommandPool {
        self.command_pool
    }

    pub fn memory_properties(&self) -> &vk::PhysicalDeviceMemoryProperties {
        &self.memory_properties
    }

    pub fn device_name(&self) -> &str {
        &self.device_name
    }
}

impl Drop for DeviceContext {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_command_pool(self.command_pool, None);
            self.device.destroy_device(None);
            if let Some(debug) = &self.debug {
                debug
                    .loader
                    .destroy_debug_utils_messenger(debug.messenger, None);
            }
            self.instance.destroy_instance(None);
        }
    }
}

unsafe extern "system" fn debug_utils_callback(
    severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    _types: vk::DebugUtilsMessageTypeFlagsEXT,
    data: *const vk::DebugUtilsMessengerCallbackDataEXT<'_>,
    _user_data: *mut c_void,
) -> vk::Bool32 {
    let message = if data.is_null() || (*data).p_message.is_null() {
        std::borrow::Cow::Borrowed("<no message>")
    } else {
        CStr::from_ptr((*data).p_message).to_string_lossy()
    };
    if severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::ERROR) {
        log::error!("[vulkan] {message}");
    } else {
        log::warn!("[vulkan] {message}");
    }
    vk::FALSE
}
