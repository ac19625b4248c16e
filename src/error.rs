//! Error types for the renderer.
//!
//! Two tiers: environment/API-level failures (a Vulkan call returning a
//! non-success code, no usable device) are classified fatal and make the
//! top-level harness abort; everything else is reported and becomes a
//! failing exit status.

use ash::vk;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Vulkan API error: {0}")]
    Vk(#[from] vk::Result),

    #[error("failed to load the Vulkan library: {0}")]
    Loading(#[from] ash::LoadingError),

    #[error("no Vulkan physical device found among {0} devices")]
    NoVulkanDevice(usize),

    #[error("failed to find compute queue family")]
    NoComputeQueue,

    #[error("no memory type satisfies mask {type_bits:#034b} with flags {required:?}")]
    NoSuitableMemoryType {
        type_bits: u32,
        required: vk::MemoryPropertyFlags,
    },

    #[error("buffer size overflow: {0} elements x {1} bytes per element")]
    BufferSizeOverflow(usize, usize),

    #[error("image encoding error: {0}")]
    Image(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl RenderError {
    /// True for unrecoverable environment or programming errors; the
    /// process should abort rather than unwind through teardown.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            RenderError::Vk(_)
                | RenderError::Loading(_)
                | RenderError::NoVulkanDevice(_)
                | RenderError::NoComputeQueue
                | RenderError::NoSuitableMemoryType { .. }
        )
    }
}

/// Convenience type alias for Results with [`RenderError`]
pub type Result<T> = std::result::Result<T, RenderError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_errors_are_fatal() {
        assert!(RenderError::Vk(vk::Result::ERROR_OUT_OF_DEVICE_MEMORY).is_fatal());
        assert!(RenderError::NoVulkanDevice(0).is_fatal());
        assert!(RenderError::NoComputeQueue.is_fatal());
        assert!(RenderError::NoSuitableMemoryType {
            type_bits: 0b1,
            required: vk::MemoryPropertyFlags::HOST_VISIBLE,
        }
        .is_fatal());
    }

    #[test]
    fn host_side_errors_are_recoverable() {
        let io = RenderError::Io(std::io::Error::other("disk full"));
        assert!(!io.is_fatal());
        assert!(!RenderError::Other("bad config".into()).is_fatal());
        assert!(!RenderError::BufferSizeOverflow(usize::MAX, 16).is_fatal());
    }
}
