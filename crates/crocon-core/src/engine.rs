//! Native engine seams and execution-context lifecycle.
//!
//! The engine is reached through two traits:
//! - [`NativeRuntime`]: A factory, moved onto the executor thread, that creates
//!   the execution context
//! - [`NativeSession`]: The execution context itself, which only ever lives on
//!   the thread that created it
//!
//! [`EngineHandle`] wraps a session and guarantees it is torn down exactly once.

use tracing::{info, warn};

use crocon_common::ConverterError;

use crate::types::DataKind;

/// Creates the native execution context.
///
/// `create_session` is called exactly once, on the executor thread. The
/// session it returns never leaves that thread, so it need not be `Send`.
pub trait NativeRuntime: Send + 'static {
    type Session: NativeSession;

    /// Create the execution context (the isolate).
    ///
    /// # Errors
    ///
    /// Returns [`ConverterError::Initialization`] if the context cannot be created.
    fn create_session(self) -> Result<Self::Session, ConverterError>;
}

/// A live native execution context.
pub trait NativeSession {
    /// Invoke the entry point for `kind` with an encoded request envelope.
    ///
    /// Implementations must release any native reply buffer before returning,
    /// whether or not the reply could be read.
    ///
    /// # Errors
    ///
    /// Returns [`ConverterError::NativeCallFailure`] when the engine produced no
    /// reply at all.
    fn call(&mut self, kind: DataKind, request: &str) -> Result<String, ConverterError>;

    /// Destroy the execution context.
    fn tear_down(self);
}

/// Owner of a native execution context.
///
/// Dropping an open handle tears the context down as a backstop; callers are
/// expected to call [`EngineHandle::close`] explicitly.
pub struct EngineHandle<S: NativeSession> {
    session: Option<S>,
    calls: u64,
}

impl<S: NativeSession> EngineHandle<S> {
    /// Create the execution context.
    ///
    /// # Errors
    ///
    /// Returns [`ConverterError::Initialization`] if the runtime cannot create
    /// a session.
    pub fn open<R>(runtime: R) -> Result<Self, ConverterError>
    where
        R: NativeRuntime<Session = S>,
    {
        let session = runtime.create_session()?;
        info!("Native execution context created");

        Ok(Self {
            session: Some(session),
            calls: 0,
        })
    }

    /// Invoke the entry point for `kind`.
    ///
    /// # Errors
    ///
    /// Returns [`ConverterError::Closed`] after [`EngineHandle::close`].
    pub fn invoke(&mut self, kind: DataKind, request: &str) -> Result<String, ConverterError> {
        let session = self.session.as_mut().ok_or(ConverterError::Closed)?;
        self.calls += 1;
        session.call(kind, request)
    }

    /// Tear down the execution context. Idempotent.
    pub fn close(&mut self) {
        if let Some(session) = self.session.take() {
            session.tear_down();
            info!(calls = self.calls, "Native execution context torn down");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.session.is_none()
    }

    /// Number of native invocations made through this handle.
    pub fn calls(&self) -> u64 {
        self.calls
    }
}

impl<S: NativeSession> Drop for EngineHandle<S> {
    fn drop(&mut self) {
        if self.session.is_some() {
            warn!("Engine handle dropped while open, tearing down");
            self.close();
        }
    }
}

impl<S: NativeSession> std::fmt::Debug for EngineHandle<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineHandle")
            .field("closed", &self.is_closed())
            .field("calls", &self.calls)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;

    struct CountingRuntime {
        fail: bool,
    }

    struct CountingSession {
        teardowns: Rc<Cell<u32>>,
    }

    thread_local! {
        static TEARDOWNS: Rc<Cell<u32>> = Rc::new(Cell::new(0));
    }

    impl NativeRuntime for CountingRuntime {
        type Session = CountingSession;

        fn create_session(self) -> Result<CountingSession, ConverterError> {
            if self.fail {
                return Err(ConverterError::initialization("out of memory"));
            }
            Ok(CountingSession {
                teardowns: TEARDOWNS.with(Rc::clone),
            })
        }
    }

    impl NativeSession for CountingSession {
        fn call(&mut self, kind: DataKind, request: &str) -> Result<String, ConverterError> {
            Ok(format!("{}:{request}", kind.symbol()))
        }

        fn tear_down(self) {
            self.teardowns.set(self.teardowns.get() + 1);
        }
    }

    fn teardowns() -> u32 {
        TEARDOWNS.with(|t| t.get())
    }

    #[test]
    fn test_open_and_invoke() {
        let mut handle = EngineHandle::open(CountingRuntime { fail: false }).unwrap();

        let reply = handle.invoke(DataKind::Biome, "abc").unwrap();
        assert_eq!(reply, "convert_biome:abc");
        assert_eq!(handle.calls(), 1);
        handle.close();
    }

    #[test]
    fn test_open_failure() {
        let err = EngineHandle::open(CountingRuntime { fail: true }).unwrap_err();
        assert!(matches!(err, ConverterError::Initialization { .. }));
    }

    #[test]
    fn test_close_is_idempotent() {
        let before = teardowns();
        let mut handle = EngineHandle::open(CountingRuntime { fail: false }).unwrap();

        handle.close();
        handle.close();
        drop(handle);

        assert_eq!(teardowns() - before, 1);
    }

    #[test]
    fn test_invoke_after_close() {
        let mut handle = EngineHandle::open(CountingRuntime { fail: false }).unwrap();
        handle.close();

        let err = handle.invoke(DataKind::Block, "abc").unwrap_err();
        assert!(err.is_closed());
        assert_eq!(handle.calls(), 0);
    }

    #[test]
    fn test_drop_tears_down() {
        let before = teardowns();
        let handle = EngineHandle::open(CountingRuntime { fail: false }).unwrap();
        drop(handle);

        assert_eq!(teardowns() - before, 1);
    }
}
