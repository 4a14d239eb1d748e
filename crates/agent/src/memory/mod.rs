mod coordinator;
mod long_term;
mod short_term;

pub use coordinator::{MemoryCoordinator, MemoryFetch};
pub use long_term::LongTermMemory;
pub use short_term::ShortTermMemory;
