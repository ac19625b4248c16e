//! Device buffer allocation and host-visible memory access.

use crate::error::{RenderError, Result};
use ash::{vk, Device};
use bytemuck::Pod;

/// A `vk::Buffer` and its backing `vk::DeviceMemory`, owned as a unit.
/// The pair is allocated together in [`DeviceBuffer::new`] and released
/// together in [`DeviceBuffer::destroy`]; nothing else touches either
/// handle, which keeps the two from ever dangling independently.
pub struct DeviceBuffer {
    raw: vk::Buffer,
    memory: vk::DeviceMemory,
    size: vk::DeviceSize,
}

impl DeviceBuffer {
    /// Creates a buffer, finds a memory type matching both the hardware's
    /// requirements and the requested property flags, allocates and binds.
    pub fn new(
        device: &Device,
        memory_properties: &vk::PhysicalDeviceMemoryProperties,
        size: vk::DeviceSize,
        usage: vk::BufferUsageFlags,
        properties: vk::MemoryPropertyFlags,
    ) -> Result<Self> {
        unsafe {
            let raw = device.create_buffer(
                &vk::BufferCreateInfo::default()
                    .size(size)
                    .usage(usage)
                    .sharing_mode(vk::SharingMode::EXCLUSIVE),
                None,
            )?;

            let requirements = device.get_buffer_memory_requirements(raw);

            let memory_type_index = match find_memory_type(
                memory_properties,
                requirements.memory_type_bits,
                properties,
            ) {
                Ok(index) => index,
                Err(err) => {
                    device.destroy_buffer(raw, None);
                    return Err(err);
                }
            };

            let memory = match device.allocate_memory(
                &vk::MemoryAllocateInfo::default()
                    .allocation_size(requirements.size)
                    .memory_type_index(memory_type_index),
                None,
            ) {
                Ok(memory) => memory,
                Err(err) => {
                    device.destroy_buffer(raw, None);
                    return Err(err.into());
                }
            };

            if let Err(err) = device.bind_buffer_memory(raw, memory, 0) {
                device.free_memory(memory, None);
                device.destroy_buffer(raw, None);
                return Err(err.into());
            }

            Ok(Self { raw, memory, size })
        }
    }

    pub fn raw(&self) -> vk::Buffer {
        self.raw
    }

    pub fn size(&self) -> vk::DeviceSize {
        self.size
    }

    /// Writes one Pod value through a host-visible mapping
    /// (map, copy, unmap). The caller is responsible for ordering this
    /// against GPU access; here that is the command-buffer submission
    /// boundary.
    pub fn write_pod<T: Pod>(&self, device: &Device, value: &T) -> Result<()> {
        let byte_len = std::mem::size_of::<T>();
        debug_assert!(byte_len as vk::DeviceSize <= self.size);
        unsafe {
            let data = device.map_memory(
                self.memory,
                0,
                byte_len as vk::DeviceSize,
                vk::MemoryMapFlags::empty(),
            )?;
            std::ptr::copy_nonoverlapping(
                bytemuck::bytes_of(value).as_ptr(),
                data as *mut u8,
                byte_len,
            );
            device.unmap_memory(self.memory);
        }
        Ok(())
    }

    /// Reads `len` Pod values back out of a host-visible mapping. Must
    /// only be called after the dispatch writing this buffer completed.
    pub fn read_vec<T: Pod>(&self, device: &Device, len: usize) -> Result<Vec<T>> {
        let byte_len = len
            .checked_mul(std::mem::size_of::<T>())
            .ok_or(RenderError::BufferSizeOverflow(len, std::mem::size_of::<T>()))?;
        debug_assert!(byte_len as vk::DeviceSize <= self.size);
        let mut out = vec![T::zeroed(); len];
        unsafe {
            let data = device.map_memory(
                self.memory,
                0,
                byte_len as vk::DeviceSize,
                vk::MemoryMapFlags::empty(),
            )?;
            std::ptr::copy_nonoverlapping(
                data as *const u8,
                out.as_mut_ptr() as *mut u8,
                byte_len,
            );
            device.unmap_memory(self.memory);
        }
        Ok(out)
    }

    /// Releases the buffer and its memory together.
    pub fn destroy(&self, device: &Device) {
        unsafe {
            device.destroy_buffer(self.raw, None);
            device.free_memory(self.memory, None);
        }
    }
}

/// First index, in hardware-reported order, whose bit is set in
/// `type_bits` and whose property flags are a superset of `required`.
pub fn find_memory_type(
    memory_properties: &vk::PhysicalDeviceMemoryProperties,
    type_bits: u32,
    required: vk::MemoryPropertyFlags,
) -> Result<u32> {
    (0..memory_properties.memory_type_count)
        .find(|&i| {
            (type_bits & (1 << i)) != 0
                && memory_properties.memory_types[i as usize]
                    .property_flags
                    .contains(required)
        })
        .ok_or(RenderError::NoSuitableMemoryType {
            type_bits,
            required,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn synthetic_properties(
        flags_per_type: &[vk::MemoryPropertyFlags],
    ) -> vk::PhysicalDeviceMemoryProperties {
        let mut props = vk::PhysicalDeviceMemoryProperties {
            memory_type_count: flags_per_type.len() as u32,
            ..Default::default()
        };
        for (i, &flags) in flags_per_type.iter().enumerate() {
            props.memory_types[i].property_flags = flags;
        }
        props
    }

    const HOST: vk::MemoryPropertyFlags = vk::MemoryPropertyFlags::HOST_VISIBLE;
    const DEVICE: vk::MemoryPropertyFlags = vk::MemoryPropertyFlags::DEVICE_LOCAL;

    fn host_coherent() -> vk::MemoryPropertyFlags {
        vk::MemoryPropertyFlags::HOST_VISIBLE | vk::MemoryPropertyFlags::HOST_COHERENT
    }

    #[test]
    fn picks_lowest_qualifying_index() {
        let props = synthetic_properties(&[DEVICE, host_coherent(), host_coherent()]);
        let index = find_memory_type(&props, 0b111, host_coherent()).unwrap();
        assert_eq!(index, 1);
    }

    #[test]
    fn respects_the_type_bitmask() {
        // Type 1 has the right flags but its bit is cleared in the mask.
        let props = synthetic_properties(&[DEVICE, host_coherent(), host_coherent()]);
        let index = find_memory_type(&props, 0b101, host_coherent()).unwrap();
        assert_eq!(index, 2);
    }

    #[test]
    fn requires_a_superset_of_flags() {
        // HOST_VISIBLE alone does not satisfy HOST_VISIBLE|HOST_COHERENT,
        // but extra flags on top of the request are fine.
        let props =
            synthetic_properties(&[HOST, host_coherent() | DEVICE]);
        let index = find_memory_type(&props, 0b11, host_coherent()).unwrap();
        assert_eq!(index, 1);
    }

    #[test]
    fn fails_when_nothing_qualifies() {
        let props = synthetic_properties(&[DEVICE, DEVICE]);
        let err = find_memory_type(&props, 0b11, host_coherent()).unwrap_err();
        assert!(matches!(
            err,
            RenderError::NoSuitableMemoryType { type_bits: 0b11, .. }
        ));
        assert!(err.is_fatal());
    }

    #[test]
    fn ignores_types_beyond_the_reported_count() {
        // Bit 3 is set in the mask but only two types are reported.
        let props = synthetic_properties(&[DEVICE, DEVICE]);
        assert!(find_memory_type(&props, 0b1000, host_coherent()).is_err());
    }
}
