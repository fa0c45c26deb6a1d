// SPDX-FileCopyrightText: 2025 Contributors to the mpgclip project.
// SPDX-License-Identifier: Apache-2.0

//! Clip-aware decode sessions.
//!
//! A [`ClipDecoder`] owns a [`DecoderBackend`] together with the
//! [`ClipInfoQueue`] and the staged/active output formats. These three are
//! reset together, so the queue always describes exactly the units fed since
//! the last reset.
//!
//! ## Decode loop
//!
//! ```text
//!  Idle ──handle_unit──► Feeding ──► Draining ──NeedMore/Done/Err──► Idle
//!                                      │  ▲
//!                                      └──┘ Ok/NewFormat
//! ```
//!
//! Each decoded, non-empty chunk claims the oldest queue entry and is trimmed
//! by it. A staged format only becomes active when the backend reports
//! [`DecodeOutcome::NewFormat`], never when it is requested, because the
//! decoder may still be emitting chunks of the previous format.
//!
//! Sessions are single-threaded; calls must not overlap.

use tracing::{debug, error, trace, warn};

use crate::{
    AudioEncoding, AudioFormatSpec, ClipEntry, ClipInfoQueue, DecodeError, DecodeOutcome,
    DecoderBackend, Error, FormatNegotiator, NegotiationError, Result, config::DecoderSettings,
};

/// One result of a [`ClipDecoder::handle_unit`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitOutput {
    /// One unit finished. The payload is empty when the unit was fully
    /// clipped or decode-only; it still counts for pacing.
    Finished(Vec<u8>),
    /// The output format changed. Later `Finished` payloads use it.
    FormatChanged(AudioFormatSpec),
}

/// Everything a single [`ClipDecoder::handle_unit`] call produced, in order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Outcome {
    pub outputs: Vec<UnitOutput>,
    /// The decoder reached the end of the stream.
    pub eos: bool,
}

impl Outcome {
    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty() && !self.eos
    }

    /// Number of finished units, clipped ones included.
    pub fn finished_units(&self) -> usize {
        self.outputs
            .iter()
            .filter(|output| matches!(output, UnitOutput::Finished(_)))
            .count()
    }

    /// Payloads of finished units, in order.
    pub fn payloads(&self) -> impl Iterator<Item = &[u8]> {
        self.outputs.iter().filter_map(|output| match output {
            UnitOutput::Finished(payload) => Some(payload.as_slice()),
            UnitOutput::FormatChanged(_) => None,
        })
    }

    /// Formats committed during the call, in order.
    pub fn format_changes(&self) -> impl Iterator<Item = &AudioFormatSpec> {
        self.outputs.iter().filter_map(|output| match output {
            UnitOutput::FormatChanged(format) => Some(format),
            UnitOutput::Finished(_) => None,
        })
    }
}

/// Where a session is in its decode loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeState {
    Idle,
    Feeding,
    Draining,
    /// Reopening the decoder failed; the session is unusable.
    Failed,
}

/// Counters kept per session. Flushes do not reset them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecoderStats {
    pub units_fed: u64,
    pub decode_only_units: u64,
    pub chunks_decoded: u64,
    pub fully_clipped_chunks: u64,
    pub bytes_out: u64,
    pub format_commits: u64,
    pub decode_errors: u64,
}

/// A decoder session: backend, clip queue and format state.
pub struct ClipDecoder<B: DecoderBackend> {
    backend: B,
    clip_queue: ClipInfoQueue,
    negotiator: FormatNegotiator,
    active_format: Option<AudioFormatSpec>,
    staged_format: Option<AudioFormatSpec>,
    state: DecodeState,
    stats: DecoderStats,
}

impl<B: DecoderBackend> ClipDecoder<B> {
    /// Starts a session on an already opened backend, with default settings.
    pub fn new(backend: B) -> Self {
        Self::with_settings(backend, &DecoderSettings::default())
    }

    pub fn with_settings(backend: B, settings: &DecoderSettings) -> Self {
        Self {
            backend,
            clip_queue: ClipInfoQueue::with_capacity(settings.clip_queue_capacity),
            negotiator: FormatNegotiator::new(settings.default_encoding),
            active_format: None,
            staged_format: None,
            state: DecodeState::Idle,
            stats: DecoderStats::default(),
        }
    }

    /// The format currently governing output.
    pub fn active_format(&self) -> Option<AudioFormatSpec> {
        self.active_format
    }

    /// The negotiated format waiting for the decoder to switch over.
    pub fn staged_format(&self) -> Option<AudioFormatSpec> {
        self.staged_format
    }

    pub fn has_staged(&self) -> bool {
        self.staged_format.is_some()
    }

    pub fn clip_queue_len(&self) -> usize {
        self.clip_queue.len()
    }

    pub fn state(&self) -> DecodeState {
        self.state
    }

    pub fn stats(&self) -> DecoderStats {
        self.stats
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Negotiates an output format for a stream with `rate` and `channels`
    /// and stages it.
    ///
    /// The staged format replaces any earlier one that was not committed yet.
    /// It becomes active once the decoder reports a format change. On failure
    /// the previously staged format, if any, is kept.
    pub fn set_format_request(
        &mut self,
        rate: u32,
        channels: u32,
        candidates: &[AudioEncoding],
    ) -> core::result::Result<AudioFormatSpec, NegotiationError> {
        let format = self
            .negotiator
            .negotiate(&mut self.backend, rate, channels, candidates)?;
        self.stage(format);
        Ok(format)
    }

    /// Like [`Self::set_format_request`], with downstream formats given by
    /// name. `None` means nothing is connected downstream.
    pub fn set_format_request_from_names<S: AsRef<str>>(
        &mut self,
        rate: u32,
        channels: u32,
        names: Option<&[S]>,
    ) -> core::result::Result<AudioFormatSpec, NegotiationError> {
        let format = self
            .negotiator
            .negotiate_names(&mut self.backend, rate, channels, names)?;
        self.stage(format);
        Ok(format)
    }

    fn stage(&mut self, format: AudioFormatSpec) {
        if let Some(previous) = self.staged_format.replace(format) {
            debug!("Staged format {} replaces uncommitted {}", format, previous);
        } else {
            debug!("Staged format {}", format);
        }
    }

    /// Feeds one encoded unit and drains every chunk the decoder can produce.
    ///
    /// `unit == None` drains without new input. A `decode_only` unit is not
    /// decoded at all and finishes immediately with an empty payload.
    ///
    /// A decode error aborts the current unit only; outputs produced before
    /// it are available through [`Error::partial_outcome`].
    pub fn handle_unit(
        &mut self,
        unit: Option<&[u8]>,
        clip: Option<ClipEntry>,
        decode_only: bool,
    ) -> Result<Outcome> {
        if self.state == DecodeState::Failed {
            return Err(Error::SessionFailed);
        }

        let mut outcome = Outcome::default();

        match unit {
            Some(_) if decode_only => {
                trace!("Dropping decode-only unit");
                self.stats.decode_only_units += 1;
                outcome.outputs.push(UnitOutput::Finished(Vec::new()));
                return Ok(outcome);
            }
            Some(data) => {
                self.state = DecodeState::Feeding;
                self.backend.feed(data);
                self.stats.units_fed += 1;
                trace!("Fed {} byte(s)", data.len());
            }
            None => trace!("Draining decoder"),
        }
        self.clip_queue.push(clip.unwrap_or_default());

        self.state = DecodeState::Draining;
        loop {
            let new_format = match self.backend.decode_one() {
                DecodeOutcome::NewFormat(chunk) => {
                    emit_chunk(
                        &mut self.clip_queue,
                        &mut self.stats,
                        chunk,
                        &mut outcome.outputs,
                    );
                    true
                }
                DecodeOutcome::Ok(chunk) => {
                    emit_chunk(
                        &mut self.clip_queue,
                        &mut self.stats,
                        chunk,
                        &mut outcome.outputs,
                    );
                    false
                }
                DecodeOutcome::NeedMore(chunk) => {
                    emit_chunk(
                        &mut self.clip_queue,
                        &mut self.stats,
                        chunk,
                        &mut outcome.outputs,
                    );
                    break;
                }
                DecodeOutcome::Done(chunk) => {
                    emit_chunk(
                        &mut self.clip_queue,
                        &mut self.stats,
                        chunk,
                        &mut outcome.outputs,
                    );
                    debug!("Decoder is done, end of stream");
                    outcome.eos = true;
                    break;
                }
                DecodeOutcome::Err(fault) => {
                    self.state = DecodeState::Idle;
                    self.stats.decode_errors += 1;
                    let error = DecodeError::from(fault);
                    error!("Decoding unit failed: {}", error);
                    return Err(Error::Decode {
                        error,
                        partial: Box::new(outcome),
                    });
                }
            };

            // The chunk above still belonged to the previous format.
            if new_format {
                self.commit_staged_format(&mut outcome);
            }
        }

        self.state = DecodeState::Idle;
        Ok(outcome)
    }

    fn commit_staged_format(&mut self, outcome: &mut Outcome) {
        let Some(format) = self.staged_format.take() else {
            debug!("Decoder reported a new format, none staged");
            return;
        };
        if let Some(reported) = self.backend.current_format()
            && reported != format
        {
            warn!(
                "Decoder reports {} but committing negotiated {}",
                reported, format
            );
        }
        debug!("Committing output format {}", format);
        self.active_format = Some(format);
        self.stats.format_commits += 1;
        outcome.outputs.push(UnitOutput::FormatChanged(format));
    }

    /// Resets the decoder's input state and the clip queue together.
    ///
    /// A hard flush also discards the staged format. The active format is
    /// never touched. If the decoder cannot be reopened the session is
    /// marked failed and every later call returns [`Error::SessionFailed`].
    pub fn flush(&mut self, hard: bool) -> Result<()> {
        if self.state == DecodeState::Failed {
            return Err(Error::SessionFailed);
        }

        debug!("Flushing (hard: {})", hard);
        let reopened = self.backend.reopen_feed();
        self.clip_queue.clear();
        if hard && let Some(dropped) = self.staged_format.take() {
            debug!("Hard flush discards staged format {}", dropped);
        }

        match reopened {
            Ok(()) => {
                self.state = DecodeState::Idle;
                Ok(())
            }
            Err(err) => {
                error!("Failed to reopen decoder: {}", err);
                self.state = DecodeState::Failed;
                Err(Error::Init(err))
            }
        }
    }

    /// Ends the session and hands back the backend.
    pub fn stop(mut self) -> B {
        debug!(
            "Stopping session, {} clip entr(ies) pending, stats {:?}",
            self.clip_queue.len(),
            self.stats
        );
        self.clip_queue.clear();
        self.staged_format = None;
        self.backend
    }
}

/// Trims a decoded chunk with the oldest clip entry and records the result.
///
/// Empty chunks claim nothing and produce nothing.
fn emit_chunk(
    clip_queue: &mut ClipInfoQueue,
    stats: &mut DecoderStats,
    chunk: &[u8],
    outputs: &mut Vec<UnitOutput>,
) {
    if chunk.is_empty() {
        return;
    }

    stats.chunks_decoded += 1;
    let clip = clip_queue.pop_oldest();
    match clip.apply(chunk) {
        Some(payload) => {
            stats.bytes_out += payload.len() as u64;
            outputs.push(UnitOutput::Finished(payload.to_vec()));
        }
        None => {
            trace!(
                "Chunk of {} byte(s) fully clipped by {:?}",
                chunk.len(),
                clip
            );
            stats.fully_clipped_chunks += 1;
            outputs.push(UnitOutput::Finished(Vec::new()));
        }
    }
}
