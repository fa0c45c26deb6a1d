// SPDX-FileCopyrightText: 2025 Contributors to the mpgclip project.
// SPDX-License-Identifier: Apache-2.0

//! Error types for decoder sessions.
//!
//! Failures are split by how far they reach: a rejected format probe
//! ([`ConfigError`]) or a failed negotiation ([`NegotiationError`]) only
//! affects the current request, a [`DecodeError`] only affects the current
//! unit, and an [`InitError`] ends the session.

use crate::{AudioEncoding, decoder::Outcome};

/// Convenience result type using [`Error`] as the error variant.
pub type Result<T> = core::result::Result<T, Error>;

/// The decoder backend refused a `(rate, channels, encoding)` tuple.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Decoder rejected {rate} Hz, {channels} channel(s), {encoding}: {message} (code {code})")]
pub struct ConfigError {
    pub rate: u32,
    pub channels: u32,
    pub encoding: AudioEncoding,
    /// Backend specific status code.
    pub code: i32,
    pub message: String,
}

/// Output format negotiation failed.
///
/// Recoverable: the caller may retry with another candidate set.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NegotiationError {
    /// None of the candidate encodings was accepted by the decoder, or the
    /// downstream candidate set carried no usable format at all.
    #[error("No acceptable output format for {rate} Hz, {channels} channel(s)")]
    NoAcceptableFormat {
        rate: u32,
        channels: u32,
        /// Every probe the decoder refused, in probing order.
        rejected: Vec<ConfigError>,
    },
}

/// A per-unit decode failure. The session continues.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// The negotiated output format conflicts with the stream content.
    /// Renegotiate before feeding the next unit.
    #[error("Decoder cannot produce the requested output format")]
    BadOutputFormat,

    /// Any other decoder failure.
    #[error("Decoding failed: {message} (code {code})")]
    Generic { code: i32, message: String },
}

/// Opening or reopening the decoder failed. The session is unusable.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Decoder initialization failed: {message} (code {code})")]
pub struct InitError {
    pub code: i32,
    pub message: String,
}

/// Errors returned by decoder sessions and their setup helpers.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Negotiation failed: {0}")]
    Negotiation(#[from] NegotiationError),

    /// A decode error, together with whatever the same call produced
    /// before the decoder failed.
    #[error("{error}")]
    Decode {
        #[source]
        error: DecodeError,
        partial: Box<Outcome>,
    },

    #[error(transparent)]
    Init(#[from] InitError),

    /// A previous fatal error left the session unusable.
    #[error("Decoder session failed earlier and must be restarted")]
    SessionFailed,

    #[error("Invalid settings: {0}")]
    Settings(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to load or interact with the decoder's dynamic library.
    #[error("Loading library: {0}")]
    LibLoading(#[from] libloading::Error),

    #[error("Other error: {0}")]
    Other(String),
}

impl Error {
    /// Returns `true` if the session that produced this error cannot be used
    /// any more.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::Init(_) | Error::SessionFailed)
    }

    /// Outputs produced before a decode error, if any.
    pub fn partial_outcome(&self) -> Option<&Outcome> {
        match self {
            Error::Decode { partial, .. } => Some(partial),
            _ => None,
        }
    }

    /// The per-unit decode error, if this is one.
    pub fn decode_error(&self) -> Option<&DecodeError> {
        match self {
            Error::Decode { error, .. } => Some(error),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_init_failures_are_fatal() {
        let init = Error::from(InitError {
            code: 7,
            message: "out of memory".into(),
        });
        assert!(init.is_fatal());
        assert!(Error::SessionFailed.is_fatal());

        let decode = Error::Decode {
            error: DecodeError::BadOutputFormat,
            partial: Box::default(),
        };
        assert!(!decode.is_fatal());
        assert_eq!(decode.decode_error(), Some(&DecodeError::BadOutputFormat));

        let negotiation = Error::from(NegotiationError::NoAcceptableFormat {
            rate: 44100,
            channels: 2,
            rejected: vec![],
        });
        assert!(!negotiation.is_fatal());
        assert!(negotiation.partial_outcome().is_none());
    }

    #[test]
    fn messages_carry_backend_details() {
        let err = ConfigError {
            rate: 48000,
            channels: 6,
            encoding: AudioEncoding::S16,
            code: 2,
            message: "bad channel count".into(),
        };
        assert_eq!(
            err.to_string(),
            "Decoder rejected 48000 Hz, 6 channel(s), S16: bad channel count (code 2)"
        );
    }
}
