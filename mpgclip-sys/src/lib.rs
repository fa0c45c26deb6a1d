// SPDX-FileCopyrightText: 2025 Contributors to the mpgclip project.
// SPDX-License-Identifier: Apache-2.0

//! # mpgclip-sys: Raw declarations for the libmpg123 C library
//!
//! This crate provides low-level, unsafe Rust declarations for the subset of
//! libmpg123 used by the `mpgclip` decoder core. The library is not linked at
//! build time; it is opened at runtime with `libloading` and its symbols are
//! collected into a [`LibMpg123`] function table.
//!
//! ## Overview
//!
//! `mpgclip-sys` exposes:
//! - The opaque handle type ([`mpg123_handle`])
//! - Return codes (`MPG123_OK`, `MPG123_NEED_MORE`, ...)
//! - Parameter ids and flag bits for `mpg123_param`
//! - Output encoding bits for `mpg123_format`
//!
//! ## Usage
//!
//! **Most users should NOT use this crate directly.** Use the safe `mpgclip`
//! crate instead, which provides RAII handle management, typed errors and the
//! clip-aware decode loop.
//!
//! ## Safety
//!
//! All functions in the table are `unsafe` and require the caller to uphold
//! libmpg123's invariants:
//! - `mpg123_init` must run before any handle is created
//! - A handle must not be used from several threads at once
//! - Buffers returned by `mpg123_decode_frame` are only valid until the next
//!   call on the same handle
//!
//! The declarations target the default 64-bit `off_t` ABI, where the exported
//! `mpg123_decode_frame` symbol takes a 64-bit offset.

#![allow(non_camel_case_types)]
#![allow(clippy::missing_safety_doc)]

use std::ffi::OsStr;
use std::os::raw::{c_char, c_double, c_int, c_long, c_uchar};

/// Opaque decoder handle.
#[repr(C)]
pub struct mpg123_handle {
    _private: [u8; 0],
}

/// Frame offset type used by `mpg123_decode_frame`.
pub type off_t = i64;

pub const MPG123_DONE: c_int = -12;
pub const MPG123_NEW_FORMAT: c_int = -11;
pub const MPG123_NEED_MORE: c_int = -10;
pub const MPG123_ERR: c_int = -1;
pub const MPG123_OK: c_int = 0;
pub const MPG123_BAD_OUTFORMAT: c_int = 1;
pub const MPG123_BAD_CHANNEL: c_int = 2;
pub const MPG123_BAD_RATE: c_int = 3;
pub const MPG123_BAD_PARAM: c_int = 5;
pub const MPG123_OUT_OF_MEM: c_int = 7;
pub const MPG123_NOT_INITIALIZED: c_int = 8;
pub const MPG123_BAD_HANDLE: c_int = 10;

// mpg123_parms
pub const MPG123_ADD_FLAGS: c_int = 2;
pub const MPG123_REMOVE_FLAGS: c_int = 13;
pub const MPG123_RESYNC_LIMIT: c_int = 14;

// mpg123_param_flags
pub const MPG123_QUIET: c_long = 0x20;
pub const MPG123_GAPLESS: c_long = 0x40;
pub const MPG123_SEEKBUFFER: c_long = 0x100;
pub const MPG123_AUTO_RESAMPLE: c_long = 0x8000;

// mpg123_enc_enum
pub const MPG123_ENC_16: c_int = 0x040;
pub const MPG123_ENC_24: c_int = 0x4000;
pub const MPG123_ENC_32: c_int = 0x100;
pub const MPG123_ENC_SIGNED: c_int = 0x080;
pub const MPG123_ENC_FLOAT: c_int = 0xe00;
pub const MPG123_ENC_SIGNED_16: c_int = MPG123_ENC_16 | MPG123_ENC_SIGNED | 0x10;
pub const MPG123_ENC_UNSIGNED_16: c_int = MPG123_ENC_16 | 0x20;
pub const MPG123_ENC_SIGNED_24: c_int = MPG123_ENC_24 | MPG123_ENC_SIGNED | 0x1000;
pub const MPG123_ENC_UNSIGNED_24: c_int = MPG123_ENC_24 | 0x2000;
pub const MPG123_ENC_SIGNED_32: c_int = MPG123_ENC_32 | MPG123_ENC_SIGNED | 0x1000;
pub const MPG123_ENC_UNSIGNED_32: c_int = MPG123_ENC_32 | 0x2000;
pub const MPG123_ENC_FLOAT_32: c_int = 0x200;

/// Function table for a dynamically loaded libmpg123.
///
/// Every symbol is resolved up front; loading fails if one is missing.
pub struct LibMpg123 {
    __library: libloading::Library,
    pub mpg123_init: unsafe extern "C" fn() -> c_int,
    pub mpg123_new:
        unsafe extern "C" fn(decoder: *const c_char, error: *mut c_int) -> *mut mpg123_handle,
    pub mpg123_delete: unsafe extern "C" fn(mh: *mut mpg123_handle),
    pub mpg123_param: unsafe extern "C" fn(
        mh: *mut mpg123_handle,
        kind: c_int,
        value: c_long,
        fvalue: c_double,
    ) -> c_int,
    pub mpg123_format_none: unsafe extern "C" fn(mh: *mut mpg123_handle) -> c_int,
    pub mpg123_format: unsafe extern "C" fn(
        mh: *mut mpg123_handle,
        rate: c_long,
        channels: c_int,
        encodings: c_int,
    ) -> c_int,
    pub mpg123_getformat: unsafe extern "C" fn(
        mh: *mut mpg123_handle,
        rate: *mut c_long,
        channels: *mut c_int,
        encoding: *mut c_int,
    ) -> c_int,
    pub mpg123_open_feed: unsafe extern "C" fn(mh: *mut mpg123_handle) -> c_int,
    pub mpg123_close: unsafe extern "C" fn(mh: *mut mpg123_handle) -> c_int,
    pub mpg123_feed:
        unsafe extern "C" fn(mh: *mut mpg123_handle, data: *const c_uchar, size: usize) -> c_int,
    pub mpg123_decode_frame: unsafe extern "C" fn(
        mh: *mut mpg123_handle,
        num: *mut off_t,
        audio: *mut *mut c_uchar,
        bytes: *mut usize,
    ) -> c_int,
    pub mpg123_plain_strerror: unsafe extern "C" fn(errcode: c_int) -> *const c_char,
    pub mpg123_strerror: unsafe extern "C" fn(mh: *mut mpg123_handle) -> *const c_char,
    pub mpg123_errcode: unsafe extern "C" fn(mh: *mut mpg123_handle) -> c_int,
    pub mpg123_rates: unsafe extern "C" fn(list: *mut *const c_long, number: *mut usize),
    pub mpg123_encodings: unsafe extern "C" fn(list: *mut *const c_int, number: *mut usize),
}

impl LibMpg123 {
    /// Opens the shared library at `path` and resolves all symbols.
    pub unsafe fn new<P: AsRef<OsStr>>(path: P) -> Result<Self, libloading::Error> {
        let library = unsafe { libloading::Library::new(path)? };
        unsafe { Self::from_library(library) }
    }

    /// Resolves all symbols from an already opened library.
    pub unsafe fn from_library<L>(library: L) -> Result<Self, libloading::Error>
    where
        L: Into<libloading::Library>,
    {
        let __library = library.into();
        unsafe {
            let mpg123_init = __library.get(b"mpg123_init\0").map(|sym| *sym)?;
            let mpg123_new = __library.get(b"mpg123_new\0").map(|sym| *sym)?;
            let mpg123_delete = __library.get(b"mpg123_delete\0").map(|sym| *sym)?;
            let mpg123_param = __library.get(b"mpg123_param\0").map(|sym| *sym)?;
            let mpg123_format_none = __library.get(b"mpg123_format_none\0").map(|sym| *sym)?;
            let mpg123_format = __library.get(b"mpg123_format\0").map(|sym| *sym)?;
            let mpg123_getformat = __library.get(b"mpg123_getformat\0").map(|sym| *sym)?;
            let mpg123_open_feed = __library.get(b"mpg123_open_feed\0").map(|sym| *sym)?;
            let mpg123_close = __library.get(b"mpg123_close\0").map(|sym| *sym)?;
            let mpg123_feed = __library.get(b"mpg123_feed\0").map(|sym| *sym)?;
            let mpg123_decode_frame = __library.get(b"mpg123_decode_frame\0").map(|sym| *sym)?;
            let mpg123_plain_strerror =
                __library.get(b"mpg123_plain_strerror\0").map(|sym| *sym)?;
            let mpg123_strerror = __library.get(b"mpg123_strerror\0").map(|sym| *sym)?;
            let mpg123_errcode = __library.get(b"mpg123_errcode\0").map(|sym| *sym)?;
            let mpg123_rates = __library.get(b"mpg123_rates\0").map(|sym| *sym)?;
            let mpg123_encodings = __library.get(b"mpg123_encodings\0").map(|sym| *sym)?;
            Ok(Self {
                __library,
                mpg123_init,
                mpg123_new,
                mpg123_delete,
                mpg123_param,
                mpg123_format_none,
                mpg123_format,
                mpg123_getformat,
                mpg123_open_feed,
                mpg123_close,
                mpg123_feed,
                mpg123_decode_frame,
                mpg123_plain_strerror,
                mpg123_strerror,
                mpg123_errcode,
                mpg123_rates,
                mpg123_encodings,
            })
        }
    }

    pub unsafe fn init(&self) -> c_int {
        unsafe { (self.mpg123_init)() }
    }

    pub unsafe fn new_handle(&self, decoder: *const c_char, error: *mut c_int) -> *mut mpg123_handle {
        unsafe { (self.mpg123_new)(decoder, error) }
    }

    pub unsafe fn delete(&self, mh: *mut mpg123_handle) {
        unsafe { (self.mpg123_delete)(mh) }
    }

    pub unsafe fn param(
        &self,
        mh: *mut mpg123_handle,
        kind: c_int,
        value: c_long,
        fvalue: c_double,
    ) -> c_int {
        unsafe { (self.mpg123_param)(mh, kind, value, fvalue) }
    }

    pub unsafe fn format_none(&self, mh: *mut mpg123_handle) -> c_int {
        unsafe { (self.mpg123_format_none)(mh) }
    }

    pub unsafe fn format(
        &self,
        mh: *mut mpg123_handle,
        rate: c_long,
        channels: c_int,
        encodings: c_int,
    ) -> c_int {
        unsafe { (self.mpg123_format)(mh, rate, channels, encodings) }
    }

    pub unsafe fn getformat(
        &self,
        mh: *mut mpg123_handle,
        rate: *mut c_long,
        channels: *mut c_int,
        encoding: *mut c_int,
    ) -> c_int {
        unsafe { (self.mpg123_getformat)(mh, rate, channels, encoding) }
    }

    pub unsafe fn open_feed(&self, mh: *mut mpg123_handle) -> c_int {
        unsafe { (self.mpg123_open_feed)(mh) }
    }

    pub unsafe fn close(&self, mh: *mut mpg123_handle) -> c_int {
        unsafe { (self.mpg123_close)(mh) }
    }

    pub unsafe fn feed(&self, mh: *mut mpg123_handle, data: *const c_uchar, size: usize) -> c_int {
        unsafe { (self.mpg123_feed)(mh, data, size) }
    }

    pub unsafe fn decode_frame(
        &self,
        mh: *mut mpg123_handle,
        num: *mut off_t,
        audio: *mut *mut c_uchar,
        bytes: *mut usize,
    ) -> c_int {
        unsafe { (self.mpg123_decode_frame)(mh, num, audio, bytes) }
    }

    pub unsafe fn plain_strerror(&self, errcode: c_int) -> *const c_char {
        unsafe { (self.mpg123_plain_strerror)(errcode) }
    }

    pub unsafe fn strerror(&self, mh: *mut mpg123_handle) -> *const c_char {
        unsafe { (self.mpg123_strerror)(mh) }
    }

    pub unsafe fn errcode(&self, mh: *mut mpg123_handle) -> c_int {
        unsafe { (self.mpg123_errcode)(mh) }
    }

    pub unsafe fn rates(&self, list: *mut *const c_long, number: *mut usize) {
        unsafe { (self.mpg123_rates)(list, number) }
    }

    pub unsafe fn encodings(&self, list: *mut *const c_int, number: *mut usize) {
        unsafe { (self.mpg123_encodings)(list, number) }
    }
}
