//! Safe wrappers around the isolate and its conversion calls.
//!
//! # Safety
//!
//! Every call into the table passes the isolate thread returned by
//! `graal_create_isolate` and is made from the OS thread that created it;
//! [`CroconSession`] holds a raw pointer and is therefore neither `Send` nor
//! `Sync`. Each non-null reply is released with `free_result` exactly once,
//! by [`NativeResult`]'s destructor.

#![allow(unsafe_code)]

use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr::{self, NonNull};

use tracing::{debug, trace, warn};

use crocon_common::ConverterError;
use crocon_core::{DataKind, NativeRuntime, NativeSession};

use crate::ffi::{CroconSymbols, FreeResultFn, GraalIsolateThread};

/// Creates a libcrocon isolate on the executor thread.
#[derive(Debug, Clone, Copy)]
pub struct CroconRuntime {
    symbols: CroconSymbols,
}

impl CroconRuntime {
    pub fn new(symbols: CroconSymbols) -> Self {
        Self { symbols }
    }

    /// Runtime bound to the linked libcrocon.
    #[cfg(feature = "link")]
    pub fn linked() -> Self {
        Self::new(CroconSymbols::linked())
    }
}

impl NativeRuntime for CroconRuntime {
    type Session = CroconSession;

    fn create_session(self) -> Result<CroconSession, ConverterError> {
        let mut isolate = ptr::null_mut();
        let mut thread = ptr::null_mut();

        // SAFETY: null params selects the default isolate configuration. Both
        // out-pointers reference live locals for the duration of the call.
        let code = unsafe {
            (self.symbols.create_isolate)(ptr::null_mut(), &mut isolate, &mut thread)
        };
        if code != 0 {
            return Err(ConverterError::initialization(format!(
                "graal_create_isolate returned {code}"
            )));
        }

        let thread = NonNull::new(thread).ok_or_else(|| {
            ConverterError::initialization("graal_create_isolate returned a null isolate thread")
        })?;
        debug!(isolate = ?isolate, "Graal isolate created");

        Ok(CroconSession {
            symbols: self.symbols,
            thread,
        })
    }
}

/// A live isolate, attached to the thread that created it.
pub struct CroconSession {
    symbols: CroconSymbols,
    thread: NonNull<GraalIsolateThread>,
}

impl NativeSession for CroconSession {
    fn call(&mut self, kind: DataKind, request: &str) -> Result<String, ConverterError> {
        let input = CString::new(request)
            .map_err(|e| {
                ConverterError::encoding(format!(
                    "Request contains a NUL byte at {}",
                    e.nul_position()
                ))
            })?
            .into_raw();

        let convert = self.symbols.convert_fn(kind);
        // SAFETY: the isolate thread is live and belongs to this OS thread.
        // `input` is a NUL-terminated buffer we own; the engine does not keep
        // it past the call.
        let raw = unsafe { convert(self.thread.as_ptr(), input) };

        // SAFETY: `input` came from `CString::into_raw` above and is reclaimed once.
        drop(unsafe { CString::from_raw(input) });

        let result = NativeResult::new(self.thread, self.symbols.free_result, raw).ok_or(
            ConverterError::NativeCallFailure {
                operation: kind.symbol(),
            },
        )?;
        trace!(
            kind = %kind,
            reply_len = result.as_c_str().to_bytes().len(),
            "Native call returned"
        );

        result.read()
    }

    fn tear_down(self) {
        // SAFETY: called once, on the creating thread, after the last call.
        let code = unsafe { (self.symbols.tear_down_isolate)(self.thread.as_ptr()) };
        if code == 0 {
            debug!("Graal isolate torn down");
        } else {
            warn!(code, "graal_tear_down_isolate reported failure");
        }
    }
}

impl std::fmt::Debug for CroconSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CroconSession")
            .field("thread", &self.thread)
            .finish_non_exhaustive()
    }
}

/// A reply buffer owned by the engine, released on drop.
struct NativeResult {
    thread: NonNull<GraalIsolateThread>,
    free: FreeResultFn,
    ptr: NonNull<c_char>,
}

impl NativeResult {
    fn new(
        thread: NonNull<GraalIsolateThread>,
        free: FreeResultFn,
        raw: *mut c_char,
    ) -> Option<Self> {
        NonNull::new(raw).map(|ptr| Self { thread, free, ptr })
    }

    fn as_c_str(&self) -> &CStr {
        // SAFETY: the engine returns NUL-terminated strings, valid until freed.
        unsafe { CStr::from_ptr(self.ptr.as_ptr()) }
    }

    fn read(&self) -> Result<String, ConverterError> {
        self.as_c_str()
            .to_str()
            .map(str::to_owned)
            .map_err(|e| ConverterError::decoding(format!("Reply is not valid UTF-8: {e}")))
    }
}

impl Drop for NativeResult {
    fn drop(&mut self) {
        // SAFETY: `ptr` was returned by a convert function on this isolate
        // thread and has not been freed; drop runs once.
        unsafe { (self.free)(self.thread.as_ptr(), self.ptr.as_ptr()) };
    }
}
