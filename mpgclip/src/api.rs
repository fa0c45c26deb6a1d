// SPDX-FileCopyrightText: 2025 Contributors to the mpgclip project.
// SPDX-License-Identifier: Apache-2.0

//! Loading of the libmpg123 shared library.

use std::{
    ffi::{CStr, OsStr},
    os::raw::{c_int, c_long},
    sync::Arc,
};

use mpgclip_sys::LibMpg123;

use crate::{AudioEncoding, Error, InitError, Result, mpg123::encoding_from_bits};

/// Shared handle to a loaded libmpg123.
pub type Mpg123ApiHandle = Arc<Mpg123Api>;

/// A loaded and initialized libmpg123.
pub struct Mpg123Api {
    lib: LibMpg123,
}

/// Loads libmpg123 from `path` and initializes it.
///
/// # Errors
///
/// - [`Error::LibLoading`] if the library or one of its symbols is missing
/// - [`Error::Init`] if `mpg123_init` fails
pub fn load_api<P: AsRef<OsStr>>(path: P) -> Result<Mpg123ApiHandle> {
    let lib = unsafe { LibMpg123::new(path.as_ref())? };
    let api = Mpg123Api { lib };
    let status = unsafe { api.lib.init() };
    if status != mpgclip_sys::MPG123_OK {
        return Err(Error::Init(InitError {
            code: status,
            message: api.plain_strerror(status),
        }));
    }
    tracing::debug!("Loaded libmpg123 from {:?}", path.as_ref());
    Ok(Arc::new(api))
}

impl Mpg123Api {
    pub(crate) fn lib(&self) -> &LibMpg123 {
        &self.lib
    }

    /// Describes a libmpg123 status code.
    pub fn plain_strerror(&self, code: c_int) -> String {
        let message = unsafe { self.lib.plain_strerror(code) };
        if message.is_null() {
            return format!("mpg123 error {code}");
        }
        unsafe { CStr::from_ptr(message) }
            .to_string_lossy()
            .into_owned()
    }

    /// Sample rates this libmpg123 build can decode to.
    pub fn supported_rates(&self) -> Vec<u32> {
        let mut list: *const c_long = std::ptr::null();
        let mut count = 0usize;
        unsafe { self.lib.rates(&mut list, &mut count) };
        if list.is_null() {
            return Vec::new();
        }
        unsafe { std::slice::from_raw_parts(list, count) }
            .iter()
            .filter_map(|&rate| u32::try_from(rate).ok())
            .collect()
    }

    /// Output encodings this libmpg123 build supports, skipping those
    /// without an [`AudioEncoding`] counterpart.
    pub fn supported_encodings(&self) -> Vec<AudioEncoding> {
        let mut list: *const c_int = std::ptr::null();
        let mut count = 0usize;
        unsafe { self.lib.encodings(&mut list, &mut count) };
        if list.is_null() {
            return Vec::new();
        }
        unsafe { std::slice::from_raw_parts(list, count) }
            .iter()
            .filter_map(|&bits| encoding_from_bits(bits))
            .collect()
    }
}
