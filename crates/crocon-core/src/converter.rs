//! Public conversion API.
//!
//! A [`Converter`] owns one executor (and through it one native execution
//! context) plus one reply cache. It is `Send + Sync`; share it behind an
//! `Arc` and call it from as many threads as needed.

use std::sync::Arc;
use std::thread;

use tokio::runtime::{Handle, RuntimeFlavor};
use tokio::sync::oneshot;
use tracing::{debug, instrument};

use crocon_common::{ConverterConfig, ConverterError};

use crate::cache::{CacheKey, CacheStats, ResultCache};
use crate::engine::NativeRuntime;
use crate::envelope::{decode_response, encode_request};
use crate::executor::{Executor, JobReply};
use crate::types::{
    BiomeRequest, BiomeResponse, Block, BlockEntity, BlockEntityRequest, BlockRequest, Entity,
    EntityRequest, Item, ItemRequest, Payload, Request,
};

/// Concurrency-safe gateway to the conversion engine.
#[derive(Debug)]
pub struct Converter {
    executor: Executor,
    cache: ResultCache,
}

impl Converter {
    /// Start the engine with the default configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConverterError::Initialization`] if the execution context
    /// cannot be created.
    pub fn open<R: NativeRuntime>(runtime: R) -> Result<Self, ConverterError> {
        Self::with_config(runtime, &ConverterConfig::default())
    }

    /// Start the engine with an explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConverterError::Initialization`] if the execution context
    /// cannot be created.
    pub fn with_config<R: NativeRuntime>(
        runtime: R,
        config: &ConverterConfig,
    ) -> Result<Self, ConverterError> {
        let executor = Executor::spawn(runtime, &config.executor)?;
        Ok(Self {
            executor,
            cache: ResultCache::new(&config.cache),
        })
    }

    /// Convert `request`, blocking the calling thread until the engine replies.
    ///
    /// Safe to call from a thread that drives a tokio runtime, though
    /// [`Converter::convert_async`] is the better fit there: a multi-thread
    /// worker is moved out of the scheduler for the wait, and a current-thread
    /// runtime is stalled until the reply arrives.
    ///
    /// # Errors
    ///
    /// Any [`ConverterError`]. [`ConverterError::Closed`] is returned
    /// immediately once the converter has been closed.
    #[instrument(skip_all, fields(kind = %P::KIND))]
    pub fn convert<P: Payload>(&self, request: &Request<P>) -> Result<P::Output, ConverterError> {
        let key = self.prepare(request)?;
        if let Some(reply) = self.cache.get(&key) {
            debug!("Cache hit");
            return decode_response::<P>(&reply);
        }
        debug!("Cache miss");

        let reply_rx = self.executor.submit(P::KIND, Arc::clone(key.request()))?;
        let reply = wait_for_reply(reply_rx)?;
        self.finish::<P>(key, reply)
    }

    /// Convert `request` without blocking the calling thread.
    ///
    /// Dropping the future abandons the reply; the native call itself still
    /// runs to completion, and its reply is not cached.
    ///
    /// # Errors
    ///
    /// Same as [`Converter::convert`].
    #[instrument(skip_all, fields(kind = %P::KIND))]
    pub async fn convert_async<P: Payload>(
        &self,
        request: &Request<P>,
    ) -> Result<P::Output, ConverterError> {
        let key = self.prepare(request)?;
        if let Some(reply) = self.cache.get(&key) {
            debug!("Cache hit");
            return decode_response::<P>(&reply);
        }
        debug!("Cache miss");

        let reply_rx = self.executor.submit(P::KIND, Arc::clone(key.request()))?;
        let reply = reply_rx.await.map_err(|_| ConverterError::Closed)??;
        self.finish::<P>(key, reply)
    }

    pub fn convert_block(&self, request: &BlockRequest) -> Result<Block, ConverterError> {
        self.convert(request)
    }

    pub fn convert_item(&self, request: &ItemRequest) -> Result<Item, ConverterError> {
        self.convert(request)
    }

    pub fn convert_entity(&self, request: &EntityRequest) -> Result<Entity, ConverterError> {
        self.convert(request)
    }

    pub fn convert_biome(&self, request: &BiomeRequest) -> Result<BiomeResponse, ConverterError> {
        self.convert(request)
    }

    pub fn convert_block_entity(
        &self,
        request: &BlockEntityRequest,
    ) -> Result<BlockEntity, ConverterError> {
        self.convert(request)
    }

    /// Stop the executor and tear down the native context.
    ///
    /// Blocks until teardown has finished. Idempotent.
    pub fn close(&self) {
        self.executor.shutdown();
    }

    pub fn is_closed(&self) -> bool {
        self.executor.is_closed()
    }

    pub fn cache(&self) -> &ResultCache {
        &self.cache
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    fn prepare<P: Payload>(&self, request: &Request<P>) -> Result<CacheKey, ConverterError> {
        if self.is_closed() {
            return Err(ConverterError::Closed);
        }
        let text = encode_request(&request.header, request.data.to_compound())?;
        Ok(CacheKey::new(P::KIND, text))
    }

    fn finish<P: Payload>(&self, key: CacheKey, reply: String) -> Result<P::Output, ConverterError> {
        let reply: Arc<str> = Arc::from(reply);
        self.cache.put(key, Arc::clone(&reply));
        decode_response::<P>(&reply)
    }
}

/// Block on a job reply from any thread.
///
/// `blocking_recv` panics on a thread inside a runtime context, so runtime
/// threads either leave the scheduler first or hand the wait to a helper
/// thread.
fn wait_for_reply(reply_rx: oneshot::Receiver<JobReply>) -> JobReply {
    let recv = move || {
        reply_rx
            .blocking_recv()
            .map_err(|_| ConverterError::Closed)?
    };

    match Handle::try_current() {
        Err(_) => recv(),
        Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
            tokio::task::block_in_place(recv)
        }
        Ok(_) => thread::scope(|scope| scope.spawn(recv).join())
            .unwrap_or(Err(ConverterError::Closed)),
    }
}
