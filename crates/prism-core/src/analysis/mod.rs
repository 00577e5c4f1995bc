//! Concurrent multi-plan analysis layer.

pub mod coordinator;
pub mod palette;
pub mod plan;
pub mod pool;
pub mod task;
mod worker;
