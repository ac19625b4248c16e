//! Per-run seed generation.

use std::time::{SystemTime, UNIX_EPOCH};

/// Low 32 bits of the nanosecond clock. Wraps roughly every 4.3 seconds,
/// so any two runs separated by a measurable interval get distinct seeds.
pub fn generate_seed() -> u32 {
    // A pre-epoch clock yields seed 0.
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos() as u32
}
