// Type aliases used across models
pub type ConsumerId = u32;
pub type Kw = u32;

/// Lowest and highest priority a consumer can hold
pub const MIN_PRIORITY: u8 = 1;
pub const MAX_PRIORITY: u8 = 5;

// Module declarations
mod consumer;
mod pool;
mod registry;

// Re-exports
pub use consumer::Consumer;
pub use pool::{CapacityMode, CapacityPool};
pub use registry::ConsumerRegistry;
