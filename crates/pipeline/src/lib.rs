//! logship Pipeline - service wiring
//!
//! Connects the bus, the live-tail router and the index sink behind one
//! explicit process context.
//!
//! # Architecture
//!
//! ```text
//!                     ┌──→ LiveTailRouter (one per follow request) ──→ ReplyStream
//! Bus ──BusConnector──┤
//!                     └──→ IndexSinkPipeline (one per process) ──→ SearchBackend
//! ```
//!
//! # Example
//!
//! ```ignore
//! use logship_pipeline::{LogService, ServiceContext};
//!
//! let ctx = ServiceContext::from_config(config, connector)?;
//! let service = LogService::new(Arc::new(ctx));
//!
//! // Index sink, typically spawned once at startup
//! tokio::spawn({
//!     let service = service.clone();
//!     async move { service.run_indexer(cancel).await }
//! });
//!
//! // One call per follow request
//! service.follow(request, stream, client_cancel).await?;
//! ```

mod context;
mod error;
mod service;

pub use context::ServiceContext;
pub use error::{Result, ServiceError};
pub use service::LogService;
