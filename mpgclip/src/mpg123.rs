// SPDX-FileCopyrightText: 2025 Contributors to the mpgclip project.
// SPDX-License-Identifier: Apache-2.0

//! [`DecoderBackend`] on top of libmpg123 in feed mode.

use std::{
    ffi::CStr,
    os::raw::{c_int, c_long, c_uchar},
};

use mpgclip_sys as sys;

use crate::{
    AudioEncoding, AudioFormatSpec, ConfigError, DecodeFault, DecodeOutcome, DecoderBackend,
    Error, InitError, Mpg123ApiHandle, Result, config::Mpg123Settings,
};

pub(crate) fn encoding_bits(encoding: AudioEncoding) -> c_int {
    match encoding {
        AudioEncoding::S16 => sys::MPG123_ENC_SIGNED_16,
        AudioEncoding::U16 => sys::MPG123_ENC_UNSIGNED_16,
        AudioEncoding::S24 => sys::MPG123_ENC_SIGNED_24,
        AudioEncoding::U24 => sys::MPG123_ENC_UNSIGNED_24,
        AudioEncoding::S32 => sys::MPG123_ENC_SIGNED_32,
        AudioEncoding::U32 => sys::MPG123_ENC_UNSIGNED_32,
        AudioEncoding::F32 => sys::MPG123_ENC_FLOAT_32,
    }
}

pub(crate) fn encoding_from_bits(bits: c_int) -> Option<AudioEncoding> {
    AudioEncoding::ALL
        .into_iter()
        .find(|&encoding| encoding_bits(encoding) == bits)
}

/// A libmpg123 handle opened in feed mode.
///
/// The handle's accepted output format set starts out empty; a format must
/// be negotiated before the first frame decodes.
pub struct Mpg123Decoder {
    api: Mpg123ApiHandle,
    handle: *mut sys::mpg123_handle,
    /// A failed feed, reported by the next decode call.
    pending_fault: Option<DecodeFault>,
}

// Safety: the handle is only touched through `&mut self` (or `&self` for
// read-only queries), so it is never used from two threads at once.
unsafe impl Send for Mpg123Decoder {}

impl Mpg123Decoder {
    /// Creates a handle, applies `settings` and opens the feed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Init`] if any libmpg123 call fails.
    pub fn new(api: Mpg123ApiHandle, settings: &Mpg123Settings) -> Result<Self> {
        let mut error: c_int = sys::MPG123_OK;
        let handle = unsafe { api.lib().new_handle(std::ptr::null(), &mut error) };
        if handle.is_null() {
            return Err(Error::Init(InitError {
                code: error,
                message: api.plain_strerror(error),
            }));
        }

        let decoder = Self {
            api,
            handle,
            pending_fault: None,
        };
        decoder.setup(settings)?;
        Ok(decoder)
    }

    fn setup(&self, settings: &Mpg123Settings) -> core::result::Result<(), InitError> {
        let lib = self.api.lib();
        // Start with nothing accepted; negotiation adds exactly one format.
        self.check_init(unsafe { lib.format_none(self.handle) })?;

        self.set_flag(sys::MPG123_GAPLESS, settings.gapless)?;
        self.set_flag(sys::MPG123_SEEKBUFFER, settings.seek_buffer)?;
        self.set_flag(sys::MPG123_QUIET, settings.quiet)?;
        self.set_flag(sys::MPG123_AUTO_RESAMPLE, settings.auto_resample)?;
        self.check_init(unsafe {
            lib.param(
                self.handle,
                sys::MPG123_RESYNC_LIMIT,
                settings.resync_limit as c_long,
                0.0,
            )
        })?;

        self.check_init(unsafe { lib.open_feed(self.handle) })?;
        tracing::debug!("Opened mpg123 feed with {:?}", settings);
        Ok(())
    }

    fn set_flag(&self, flag: c_long, enabled: bool) -> core::result::Result<(), InitError> {
        let kind = if enabled {
            sys::MPG123_ADD_FLAGS
        } else {
            sys::MPG123_REMOVE_FLAGS
        };
        self.check_init(unsafe { self.api.lib().param(self.handle, kind, flag, 0.0) })
    }

    fn check_init(&self, status: c_int) -> core::result::Result<(), InitError> {
        if status == sys::MPG123_OK {
            Ok(())
        } else {
            Err(InitError {
                code: status,
                message: self.describe(status),
            })
        }
    }

    /// Text for `status`, preferring the handle's own message for generic
    /// errors.
    fn describe(&self, status: c_int) -> String {
        if status != sys::MPG123_ERR {
            return self.api.plain_strerror(status);
        }
        let message = unsafe { self.api.lib().strerror(self.handle) };
        if message.is_null() {
            return self.api.plain_strerror(status);
        }
        unsafe { CStr::from_ptr(message) }
            .to_string_lossy()
            .into_owned()
    }

    /// Resolves `MPG123_ERR` to the handle's specific error code.
    fn error_code(&self, status: c_int) -> c_int {
        if status == sys::MPG123_ERR {
            unsafe { self.api.lib().errcode(self.handle) }
        } else {
            status
        }
    }
}

impl DecoderBackend for Mpg123Decoder {
    fn configure(
        &mut self,
        rate: u32,
        channels: u32,
        encoding: AudioEncoding,
    ) -> core::result::Result<(), ConfigError> {
        let lib = self.api.lib();
        let mut status = unsafe { lib.format_none(self.handle) };
        if status == sys::MPG123_OK {
            status = unsafe {
                lib.format(
                    self.handle,
                    rate as c_long,
                    channels as c_int,
                    encoding_bits(encoding),
                )
            };
        }
        if status == sys::MPG123_OK {
            return Ok(());
        }
        Err(ConfigError {
            rate,
            channels,
            encoding,
            code: self.error_code(status),
            message: self.describe(status),
        })
    }

    fn feed(&mut self, data: &[u8]) {
        if data.is_empty() {
            return;
        }
        let status = unsafe {
            self.api
                .lib()
                .feed(self.handle, data.as_ptr() as *const c_uchar, data.len())
        };
        if status != sys::MPG123_OK {
            let fault = DecodeFault::Other {
                code: self.error_code(status),
                message: self.describe(status),
            };
            tracing::warn!("Feeding {} byte(s) failed: {:?}", data.len(), fault);
            self.pending_fault = Some(fault);
        }
    }

    fn decode_one(&mut self) -> DecodeOutcome<'_> {
        if let Some(fault) = self.pending_fault.take() {
            return DecodeOutcome::Err(fault);
        }

        let mut offset: sys::off_t = 0;
        let mut audio: *mut c_uchar = std::ptr::null_mut();
        let mut bytes = 0usize;
        let status = unsafe {
            self.api
                .lib()
                .decode_frame(self.handle, &mut offset, &mut audio, &mut bytes)
        };

        // Valid until the next call on this handle, which needs `&mut self`.
        let chunk: &[u8] = if audio.is_null() || bytes == 0 {
            &[]
        } else {
            unsafe { std::slice::from_raw_parts(audio, bytes) }
        };

        match status {
            sys::MPG123_NEW_FORMAT => DecodeOutcome::NewFormat(chunk),
            sys::MPG123_NEED_MORE => DecodeOutcome::NeedMore(chunk),
            sys::MPG123_OK => DecodeOutcome::Ok(chunk),
            sys::MPG123_DONE => DecodeOutcome::Done(chunk),
            sys::MPG123_BAD_OUTFORMAT => DecodeOutcome::Err(DecodeFault::BadOutputFormat),
            other => {
                let code = self.error_code(other);
                if code == sys::MPG123_BAD_OUTFORMAT {
                    return DecodeOutcome::Err(DecodeFault::BadOutputFormat);
                }
                DecodeOutcome::Err(DecodeFault::Other {
                    code,
                    message: self.describe(other),
                })
            }
        }
    }

    fn reopen_feed(&mut self) -> core::result::Result<(), InitError> {
        self.pending_fault = None;
        let lib = self.api.lib();
        let status = unsafe { lib.close(self.handle) };
        if status != sys::MPG123_OK {
            tracing::debug!("Closing mpg123 feed returned {}", self.describe(status));
        }
        self.check_init(unsafe { lib.open_feed(self.handle) })
    }

    fn current_format(&self) -> Option<AudioFormatSpec> {
        let mut rate: c_long = 0;
        let mut channels: c_int = 0;
        let mut encoding: c_int = 0;
        let status = unsafe {
            self.api
                .lib()
                .getformat(self.handle, &mut rate, &mut channels, &mut encoding)
        };
        if status != sys::MPG123_OK {
            return None;
        }
        Some(AudioFormatSpec::new(
            u32::try_from(rate).ok()?,
            u32::try_from(channels).ok()?,
            encoding_from_bits(encoding)?,
        ))
    }

    fn supported_encodings(&self) -> Vec<AudioEncoding> {
        self.api.supported_encodings()
    }
}

impl Drop for Mpg123Decoder {
    /// Closes the feed and deletes the handle.
    fn drop(&mut self) {
        if self.handle.is_null() {
            return;
        }
        let lib = self.api.lib();
        let status = unsafe { lib.close(self.handle) };
        if status != sys::MPG123_OK {
            tracing::error!("Failed to close mpg123 handle: {}", self.describe(status));
        }
        unsafe { lib.delete(self.handle) };
        self.handle = std::ptr::null_mut();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encoding_bits_round_trip_for_every_encoding() {
        for encoding in AudioEncoding::ALL {
            assert_eq!(encoding_from_bits(encoding_bits(encoding)), Some(encoding));
        }
    }

    #[test]
    fn unknown_bits_have_no_encoding() {
        // 8 bit unsigned and 64 bit float
        assert_eq!(encoding_from_bits(0x01), None);
        assert_eq!(encoding_from_bits(0x400), None);
    }
}
