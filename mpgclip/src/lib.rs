// SPDX-FileCopyrightText: 2025 Contributors to the mpgclip project.
// SPDX-License-Identifier: Apache-2.0

//! # mpgclip - clip-aware MPEG audio decoding
//!
//! A decode core that sits between a caller pushing encoded MPEG audio units
//! and a feed-mode decoder library (libmpg123) that buffers internally.
//!
//! ## Overview
//!
//! The decoder consumes input and produces output out of step: it may take
//! several units before the first decoded chunk appears, and one large unit
//! may yield several chunks. This crate keeps two things correct across that
//! gap:
//!
//! - **Clipping**: each unit may carry a [`ClipEntry`] (bytes of encoder
//!   priming or padding to drop). Entries wait in a [`ClipInfoQueue`] and are
//!   claimed one per decoded chunk, oldest first.
//! - **Output format**: a format negotiated with [`FormatNegotiator`] is only
//!   staged. It becomes active when the decoder itself reports that it
//!   switched formats, so chunks still in flight keep their old format.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   feed / decode_one / reopen_feed   ┌────────────────┐
//! │ ClipDecoder │ ──────────────────────────────────► │ DecoderBackend │
//! └──────┬──────┘                                     └───────┬────────┘
//!        ├─► ClipInfoQueue                                    │
//!        └─► FormatNegotiator (staged → active)       Mpg123Decoder (libmpg123)
//! ```
//!
//! ## Examples
//!
//! ```no_run
//! use mpgclip::{AudioEncoding, ClipDecoder, ClipEntry, Mpg123Decoder, UnitOutput, load_api};
//! use mpgclip::config::DecoderSettings;
//!
//! # fn main() -> Result<(), mpgclip::Error> {
//! let settings = DecoderSettings::default();
//! let api = load_api(&settings.mpg123.library_path)?;
//! let backend = Mpg123Decoder::new(api, &settings.mpg123)?;
//! let mut decoder = ClipDecoder::with_settings(backend, &settings);
//!
//! decoder.set_format_request(44100, 2, &[AudioEncoding::F32, AudioEncoding::S16])?;
//!
//! let frame: &[u8] = &[/* one MPEG frame */];
//! let outcome = decoder.handle_unit(Some(frame), Some(ClipEntry::new(2304, 0)), false)?;
//! for output in &outcome.outputs {
//!     match output {
//!         UnitOutput::FormatChanged(format) => println!("now producing {format}"),
//!         UnitOutput::Finished(pcm) => println!("{} byte(s) of audio", pcm.len()),
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Thread Safety
//!
//! - [`Mpg123ApiHandle`] is `Send + Sync` and can be shared across sessions
//! - [`Mpg123Decoder`] and [`ClipDecoder`] are `Send` but not `Sync`; calls
//!   into one session must be serialized by the caller

mod api;
mod backend;
mod clip;
mod decoder;
mod error;
mod format;
mod mpg123;

pub mod config;

pub use api::{Mpg123Api, Mpg123ApiHandle, load_api};
pub use backend::{DecodeFault, DecodeOutcome, DecoderBackend};
pub use clip::{ClipEntry, ClipInfoQueue};
pub use decoder::{ClipDecoder, DecodeState, DecoderStats, Outcome, UnitOutput};
pub use error::{ConfigError, DecodeError, Error, InitError, NegotiationError, Result};
pub use format::{AudioEncoding, AudioFormatSpec, FormatNegotiator, parse_encoding_names};
pub use mpg123::Mpg123Decoder;
