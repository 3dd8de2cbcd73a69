//! In-process stand-in for libcrocon.
//!
//! The fake functions share global counters, so every test using them holds
//! the guard returned by [`reset`] for its whole body.

#![allow(unsafe_code)]

use std::ffi::{CStr, CString};
use std::os::raw::{c_char, c_int};
use std::ptr::{self, NonNull};
use std::sync::atomic::{AtomicI32, AtomicU8, AtomicUsize, Ordering};

use parking_lot::{Mutex, MutexGuard};

use crocon_core::{DataKind, RequestEnvelope, ResponseEnvelope};

use crate::ffi::{CroconSymbols, GraalCreateIsolateParams, GraalIsolate, GraalIsolateThread};

static SERIAL: Mutex<()> = Mutex::new(());

static MODE: AtomicU8 = AtomicU8::new(0);
static CREATE_CODE: AtomicI32 = AtomicI32::new(0);
static LAST_KIND: AtomicU8 = AtomicU8::new(NO_KIND);
static ALLOCATED: AtomicUsize = AtomicUsize::new(0);
static FREED: AtomicUsize = AtomicUsize::new(0);
static TEARDOWNS: AtomicUsize = AtomicUsize::new(0);

const NO_KIND: u8 = u8::MAX;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum FakeMode {
    /// Reply with the request's data.
    Echo = 0,
    /// Return a null pointer.
    Null = 1,
    /// Return bytes that are not UTF-8.
    InvalidUtf8 = 2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Counters {
    pub allocated: usize,
    pub freed: usize,
    pub teardowns: usize,
}

/// Serialize the calling test and reset all fake state.
pub fn reset(mode: FakeMode) -> MutexGuard<'static, ()> {
    let guard = SERIAL.lock();
    MODE.store(mode as u8, Ordering::SeqCst);
    CREATE_CODE.store(0, Ordering::SeqCst);
    LAST_KIND.store(NO_KIND, Ordering::SeqCst);
    ALLOCATED.store(0, Ordering::SeqCst);
    FREED.store(0, Ordering::SeqCst);
    TEARDOWNS.store(0, Ordering::SeqCst);
    guard
}

pub fn set_create_code(code: c_int) {
    CREATE_CODE.store(code, Ordering::SeqCst);
}

pub fn counters() -> Counters {
    Counters {
        allocated: ALLOCATED.load(Ordering::SeqCst),
        freed: FREED.load(Ordering::SeqCst),
        teardowns: TEARDOWNS.load(Ordering::SeqCst),
    }
}

pub fn last_kind() -> Option<DataKind> {
    DataKind::ALL
        .get(usize::from(LAST_KIND.load(Ordering::SeqCst)))
        .copied()
}

pub fn symbols() -> CroconSymbols {
    CroconSymbols {
        create_isolate: fake_create_isolate,
        tear_down_isolate: fake_tear_down_isolate,
        convert_block: fake_convert_block,
        convert_item: fake_convert_item,
        convert_entity: fake_convert_entity,
        convert_biome: fake_convert_biome,
        convert_block_entity: fake_convert_block_entity,
        free_result: fake_free_result,
    }
}

unsafe extern "C" fn fake_create_isolate(
    _params: *mut GraalCreateIsolateParams,
    isolate: *mut *mut GraalIsolate,
    thread: *mut *mut GraalIsolateThread,
) -> c_int {
    let code = CREATE_CODE.load(Ordering::SeqCst);
    if code == 0 {
        // SAFETY: both out-pointers are valid for writes per the calling contract.
        unsafe {
            *isolate = NonNull::dangling().as_ptr();
            *thread = NonNull::dangling().as_ptr();
        }
    }
    code
}

unsafe extern "C" fn fake_tear_down_isolate(_thread: *mut GraalIsolateThread) -> c_int {
    TEARDOWNS.fetch_add(1, Ordering::SeqCst);
    0
}

unsafe extern "C" fn fake_free_result(_thread: *mut GraalIsolateThread, result: *mut c_char) {
    FREED.fetch_add(1, Ordering::SeqCst);
    // SAFETY: every non-null reply is produced by `CString::into_raw` in `convert`.
    drop(unsafe { CString::from_raw(result) });
}

macro_rules! fake_convert {
    ($name:ident, $kind:expr) => {
        unsafe extern "C" fn $name(
            _thread: *mut GraalIsolateThread,
            input: *mut c_char,
        ) -> *mut c_char {
            // SAFETY: the caller passes a valid NUL-terminated request.
            let input = unsafe { CStr::from_ptr(input) };
            convert($kind, input)
        }
    };
}

fake_convert!(fake_convert_block, DataKind::Block);
fake_convert!(fake_convert_item, DataKind::Item);
fake_convert!(fake_convert_entity, DataKind::Entity);
fake_convert!(fake_convert_biome, DataKind::Biome);
fake_convert!(fake_convert_block_entity, DataKind::BlockEntity);

fn convert(kind: DataKind, input: &CStr) -> *mut c_char {
    let index = DataKind::ALL.iter().position(|k| *k == kind).unwrap_or(0);
    LAST_KIND.store(u8::try_from(index).unwrap_or(NO_KIND), Ordering::SeqCst);

    let reply = match MODE.load(Ordering::SeqCst) {
        1 => return ptr::null_mut(),
        2 => CString::new(vec![0xff, 0xfe, 0xfd]),
        _ => {
            let request = input
                .to_str()
                .ok()
                .and_then(|text| RequestEnvelope::decode(text).ok());
            let Some(request) = request else {
                return ptr::null_mut();
            };
            let Ok(text) = ResponseEnvelope::success(request.data).encode() else {
                return ptr::null_mut();
            };
            CString::new(text)
        }
    };

    match reply {
        Ok(reply) => {
            ALLOCATED.fetch_add(1, Ordering::SeqCst);
            reply.into_raw()
        }
        Err(_) => ptr::null_mut(),
    }
}
