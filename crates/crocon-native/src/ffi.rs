//! Raw C surface of libcrocon.
//!
//! libcrocon is a GraalVM native image. It exposes the standard isolate
//! management entry points plus one conversion function per data kind:
//!
//! ```c
//! int   graal_create_isolate(graal_create_isolate_params_t*, graal_isolate_t**, graal_isolatethread_t**);
//! int   graal_tear_down_isolate(graal_isolatethread_t*);
//! char* convert_block(graal_isolatethread_t*, char*);
//! void  free_result(graal_isolatethread_t*, char*);
//! ```
//!
//! The functions are gathered into [`CroconSymbols`] so the marshalling in
//! [`crate::session`] can run against any implementation of the table.

#![allow(unsafe_code)]

use std::os::raw::{c_char, c_int};

use crocon_core::DataKind;

/// Opaque `graal_isolate_t`.
#[repr(C)]
pub struct GraalIsolate {
    _private: [u8; 0],
}

/// Opaque `graal_isolatethread_t`.
#[repr(C)]
pub struct GraalIsolateThread {
    _private: [u8; 0],
}

/// Opaque `graal_create_isolate_params_t`. Always passed as null.
#[repr(C)]
pub struct GraalCreateIsolateParams {
    _private: [u8; 0],
}

pub type CreateIsolateFn = unsafe extern "C" fn(
    *mut GraalCreateIsolateParams,
    *mut *mut GraalIsolate,
    *mut *mut GraalIsolateThread,
) -> c_int;

pub type TearDownIsolateFn = unsafe extern "C" fn(*mut GraalIsolateThread) -> c_int;

/// Returns a newly allocated reply, or null on catastrophic failure.
pub type ConvertFn = unsafe extern "C" fn(*mut GraalIsolateThread, *mut c_char) -> *mut c_char;

pub type FreeResultFn = unsafe extern "C" fn(*mut GraalIsolateThread, *mut c_char);

/// Function table for one engine library.
#[derive(Clone, Copy)]
pub struct CroconSymbols {
    pub create_isolate: CreateIsolateFn,
    pub tear_down_isolate: TearDownIsolateFn,
    pub convert_block: ConvertFn,
    pub convert_item: ConvertFn,
    pub convert_entity: ConvertFn,
    pub convert_biome: ConvertFn,
    pub convert_block_entity: ConvertFn,
    pub free_result: FreeResultFn,
}

impl CroconSymbols {
    /// The conversion entry point for `kind`.
    pub fn convert_fn(&self, kind: DataKind) -> ConvertFn {
        match kind {
            DataKind::Block => self.convert_block,
            DataKind::Item => self.convert_item,
            DataKind::Entity => self.convert_entity,
            DataKind::Biome => self.convert_biome,
            DataKind::BlockEntity => self.convert_block_entity,
        }
    }
}

#[cfg(feature = "link")]
impl CroconSymbols {
    /// The table bound to the linked libcrocon.
    pub fn linked() -> Self {
        Self {
            create_isolate: linked::graal_create_isolate,
            tear_down_isolate: linked::graal_tear_down_isolate,
            convert_block: linked::convert_block,
            convert_item: linked::convert_item,
            convert_entity: linked::convert_entity,
            convert_biome: linked::convert_biome,
            convert_block_entity: linked::convert_block_entity,
            free_result: linked::free_result,
        }
    }
}

impl std::fmt::Debug for CroconSymbols {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CroconSymbols").finish_non_exhaustive()
    }
}

#[cfg(feature = "link")]
mod linked {
    use std::os::raw::{c_char, c_int};

    use super::{GraalCreateIsolateParams, GraalIsolate, GraalIsolateThread};

    #[link(name = "crocon")]
    unsafe extern "C" {
        pub fn graal_create_isolate(
            params: *mut GraalCreateIsolateParams,
            isolate: *mut *mut GraalIsolate,
            thread: *mut *mut GraalIsolateThread,
        ) -> c_int;
        pub fn graal_tear_down_isolate(thread: *mut GraalIsolateThread) -> c_int;
        pub fn convert_block(thread: *mut GraalIsolateThread, input: *mut c_char) -> *mut c_char;
        pub fn convert_item(thread: *mut GraalIsolateThread, input: *mut c_char) -> *mut c_char;
        pub fn convert_entity(thread: *mut GraalIsolateThread, input: *mut c_char) -> *mut c_char;
        pub fn convert_biome(thread: *mut GraalIsolateThread, input: *mut c_char) -> *mut c_char;
        pub fn convert_block_entity(
            thread: *mut GraalIsolateThread,
            input: *mut c_char,
        ) -> *mut c_char;
        pub fn free_result(thread: *mut GraalIsolateThread, result: *mut c_char);
    }
}
