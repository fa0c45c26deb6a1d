// SPDX-FileCopyrightText: 2025 Contributors to the mpgclip project.
// SPDX-License-Identifier: Apache-2.0

//! The contract between the decode core and the decompression library.
//!
//! [`crate::Mpg123Decoder`] implements it on top of libmpg123; tests drive
//! the core with scripted fakes.

use crate::{AudioEncoding, AudioFormatSpec, ConfigError, DecodeError, InitError};

/// Result of one [`DecoderBackend::decode_one`] call.
///
/// Chunks borrow the backend's output buffer and may be empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeOutcome<'a> {
    /// The decoder switched to a new output format. The chunk, if any,
    /// still belongs to the previous format.
    NewFormat(&'a [u8]),
    /// All fed input is consumed.
    NeedMore(&'a [u8]),
    /// A chunk was decoded and more may follow.
    Ok(&'a [u8]),
    /// The stream has ended.
    Done(&'a [u8]),
    Err(DecodeFault),
}

/// Failure reported by a backend's decode call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeFault {
    /// The configured output format does not fit the stream.
    BadOutputFormat,
    Other { code: i32, message: String },
}

impl From<DecodeFault> for DecodeError {
    fn from(fault: DecodeFault) -> Self {
        match fault {
            DecodeFault::BadOutputFormat => DecodeError::BadOutputFormat,
            DecodeFault::Other { code, message } => DecodeError::Generic { code, message },
        }
    }
}

/// A feed-mode audio decoder.
///
/// Input is pushed with [`Self::feed`] and output pulled with
/// [`Self::decode_one`]; the two are not in lockstep, as the decoder buffers
/// internally.
pub trait DecoderBackend {
    /// Replaces the accepted output format set with the single tuple
    /// `(rate, channels, encoding)`.
    fn configure(
        &mut self,
        rate: u32,
        channels: u32,
        encoding: AudioEncoding,
    ) -> Result<(), ConfigError>;

    /// Hands encoded bytes to the decoder.
    fn feed(&mut self, data: &[u8]);

    /// Decodes at most one chunk.
    fn decode_one(&mut self) -> DecodeOutcome<'_>;

    /// Drops all buffered input and decoder state.
    fn reopen_feed(&mut self) -> Result<(), InitError>;

    /// The format the decoder currently produces, if it knows one.
    fn current_format(&self) -> Option<AudioFormatSpec> {
        None
    }

    /// Encodings this decoder build can produce.
    fn supported_encodings(&self) -> Vec<AudioEncoding> {
        AudioEncoding::ALL.to_vec()
    }
}

impl<B: DecoderBackend + ?Sized> DecoderBackend for Box<B> {
    fn configure(
        &mut self,
        rate: u32,
        channels: u32,
        encoding: AudioEncoding,
    ) -> Result<(), ConfigError> {
        (**self).configure(rate, channels, encoding)
    }

    fn feed(&mut self, data: &[u8]) {
        (**self).feed(data)
    }

    fn decode_one(&mut self) -> DecodeOutcome<'_> {
        (**self).decode_one()
    }

    fn reopen_feed(&mut self) -> Result<(), InitError> {
        (**self).reopen_feed()
    }

    fn current_format(&self) -> Option<AudioFormatSpec> {
        (**self).current_format()
    }

    fn supported_encodings(&self) -> Vec<AudioEncoding> {
        (**self).supported_encodings()
    }
}
