//! Concurrency-safe bridge to the crocon edition conversion engine.
//!
//! The engine is a native library whose execution context may only be used
//! from the OS thread that created it, one call at a time. This crate makes it
//! callable from any number of threads:
//! - [`Converter`]: The public gateway, one `convert` per data kind
//! - [`Executor`]: The dedicated worker thread that owns the engine
//! - [`EngineHandle`]: Create-once, tear-down-once lifecycle of the context
//! - [`ResultCache`]: Memoized replies keyed by the exact encoded request
//! - [`envelope`]: The base-64 wrapped tag-tree wire format
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                      Converter                          │
//! │  (Shared by all caller threads)                         │
//! │  - Envelope encode / decode                             │
//! │  - ResultCache lookup and store                         │
//! └─────────────────────────────────────────────────────────┘
//!                            │ job + reply channel
//!                            ▼
//! ┌─────────────────────────────────────────────────────────┐
//! │                       Executor                          │
//! │  (One OS thread, FIFO queue)                            │
//! │  - One job in flight at a time                          │
//! └─────────────────────────────────────────────────────────┘
//!                            │
//!                            ▼
//! ┌─────────────────────────────────────────────────────────┐
//! │               EngineHandle<NativeSession>               │
//! │  (Created and torn down on the executor thread)         │
//! │  - Native isolate                                       │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! The native binding lives in `crocon-native`; anything implementing
//! [`NativeRuntime`] can stand in for it.

pub mod cache;
pub mod converter;
pub mod engine;
pub mod envelope;
pub mod executor;
pub mod types;

pub use cache::{CacheKey, CacheStats, ResultCache};
pub use converter::Converter;
pub use engine::{EngineHandle, NativeRuntime, NativeSession};
pub use envelope::{RequestEnvelope, ResponseEnvelope};
pub use executor::Executor;
pub use types::{
    BiomeQuery, BiomeRequest, BiomeResponse, Block, BlockEntity, BlockEntityRequest,
    BlockRequest, ConversionRequest, DataKind, Edition, Entity, EntityRequest, Item, ItemRequest,
    ParseEditionError, Payload, Request,
};

pub use crocon_common::{ConverterConfig, ConverterError};
