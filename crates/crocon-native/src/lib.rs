//! libcrocon bindings for crocon-core.
//!
//! - [`ffi`]: The raw C surface, gathered into a [`CroconSymbols`] table
//! - [`CroconRuntime`]: A [`crocon_core::NativeRuntime`] that creates a Graal
//!   isolate through that table
//!
//! With the `link` feature the table is bound to libcrocon at link time; set
//! `CROCON_LIB_DIR` to the directory containing the library.

pub mod ffi;
pub mod session;

#[cfg(test)]
mod testing;

pub use ffi::CroconSymbols;
pub use session::{CroconRuntime, CroconSession};

/// Open a converter backed by the linked libcrocon.
///
/// # Errors
///
/// Returns [`crocon_common::ConverterError::Initialization`] if the isolate
/// cannot be created.
#[cfg(feature = "link")]
pub fn open(
    config: &crocon_common::ConverterConfig,
) -> Result<crocon_core::Converter, crocon_common::ConverterError> {
    crocon_core::Converter::with_config(CroconRuntime::linked(), config)
}
