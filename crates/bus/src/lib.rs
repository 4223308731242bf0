//! logship Bus - subscription interface for the partitioned message bus
//!
//! Both consumers (live tail and index sink) talk to the bus through the same
//! narrow interface:
//!
//! - `BusConnector` - creates a subscription under a consumer group
//! - `BusSubscription` - `run` blocks until `close`, `close` is idempotent
//! - `BatchHandler` - invoked with each batch; an error stops the subscription
//!
//! `MemoryBus` is an in-process implementation with per-group committed
//! offsets, used by tests and the replay tool.

mod error;
mod memory;
mod subscription;

pub use error::{BusError, HandlerError, Result};
pub use memory::MemoryBus;
pub use subscription::{
    BatchHandler, BusConnector, BusSubscription, ConsumerOptions, SubscriptionConfig,
    TopicSelector,
};
