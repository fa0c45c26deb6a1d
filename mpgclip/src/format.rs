// SPDX-FileCopyrightText: 2025 Contributors to the mpgclip project.
// SPDX-License-Identifier: Apache-2.0

//! Output sample formats and their negotiation.
//!
//! The stream's rate and channel count always come from upstream and are
//! used verbatim; only the sample encoding is negotiated. The decoder's own
//! resampler and channel mixer are never relied on.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{ConfigError, DecoderBackend, NegotiationError};

/// Interleaved PCM sample encodings, native endianness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AudioEncoding {
    S16,
    U16,
    /// 24 bit samples packed in 3 bytes.
    S24,
    /// 24 bit samples packed in 3 bytes.
    U24,
    S32,
    U32,
    F32,
}

impl AudioEncoding {
    pub const ALL: [AudioEncoding; 7] = [
        AudioEncoding::S16,
        AudioEncoding::U16,
        AudioEncoding::S24,
        AudioEncoding::U24,
        AudioEncoding::S32,
        AudioEncoding::U32,
        AudioEncoding::F32,
    ];

    pub fn bytes_per_sample(self) -> usize {
        match self {
            AudioEncoding::S16 | AudioEncoding::U16 => 2,
            AudioEncoding::S24 | AudioEncoding::U24 => 3,
            AudioEncoding::S32 | AudioEncoding::U32 | AudioEncoding::F32 => 4,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            AudioEncoding::S16 => "S16",
            AudioEncoding::U16 => "U16",
            AudioEncoding::S24 => "S24",
            AudioEncoding::U24 => "U24",
            AudioEncoding::S32 => "S32",
            AudioEncoding::U32 => "U32",
            AudioEncoding::F32 => "F32",
        }
    }

    /// Parses a raw audio format name such as `S16LE`, `F32` or `u24be`.
    ///
    /// Names with an explicit endianness suffix only match when it is the
    /// host's, since decoded samples are always native-endian.
    pub fn from_name(name: &str) -> Option<Self> {
        let upper = name.trim().to_ascii_uppercase();
        let native = if cfg!(target_endian = "little") {
            "LE"
        } else {
            "BE"
        };
        let base = match upper.strip_suffix("LE").or_else(|| upper.strip_suffix("BE")) {
            Some(base) if upper.ends_with(native) => base,
            Some(_) => return None,
            None => upper.as_str(),
        };
        Self::ALL.into_iter().find(|encoding| encoding.name() == base)
    }
}

impl fmt::Display for AudioEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Parses downstream format names, skipping the ones that are unknown or
/// not native-endian. Order and first occurrence are preserved.
pub fn parse_encoding_names<S: AsRef<str>>(names: &[S]) -> Vec<AudioEncoding> {
    let mut encodings = Vec::with_capacity(names.len());
    for name in names {
        match AudioEncoding::from_name(name.as_ref()) {
            Some(encoding) if !encodings.contains(&encoding) => encodings.push(encoding),
            Some(_) => {}
            None => tracing::debug!("Ignoring unusable output format {:?}", name.as_ref()),
        }
    }
    encodings
}

/// A fully specified output sample layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AudioFormatSpec {
    pub sample_rate: u32,
    pub channels: u32,
    pub encoding: AudioEncoding,
}

impl AudioFormatSpec {
    pub fn new(sample_rate: u32, channels: u32, encoding: AudioEncoding) -> Self {
        Self {
            sample_rate,
            channels,
            encoding,
        }
    }

    /// Size in bytes of one interleaved frame (one sample per channel).
    pub fn bytes_per_frame(&self) -> usize {
        self.encoding.bytes_per_sample() * self.channels as usize
    }
}

impl fmt::Display for AudioFormatSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} Hz, {} channel(s), {}",
            self.sample_rate, self.channels, self.encoding
        )
    }
}

/// Picks the output format for a stream.
///
/// Stateless apart from its fallback encoding: the same inputs and the same
/// decoder behavior always give the same answer.
#[derive(Debug, Clone)]
pub struct FormatNegotiator {
    default_encoding: AudioEncoding,
}

impl Default for FormatNegotiator {
    fn default() -> Self {
        Self::new(AudioEncoding::S16)
    }
}

impl FormatNegotiator {
    pub fn new(default_encoding: AudioEncoding) -> Self {
        Self { default_encoding }
    }

    pub fn default_encoding(&self) -> AudioEncoding {
        self.default_encoding
    }

    /// Returns the first candidate the decoder accepts for `rate` and
    /// `channels`, probing in the given order.
    ///
    /// Probing redefines the decoder's accepted format set, so this must not
    /// run while output in a previous format is still pending.
    ///
    /// With no candidates at all (nothing downstream yet) the default
    /// encoding is used regardless of whether the decoder accepts it.
    pub fn negotiate<B: DecoderBackend + ?Sized>(
        &self,
        backend: &mut B,
        rate: u32,
        channels: u32,
        candidates: &[AudioEncoding],
    ) -> Result<AudioFormatSpec, NegotiationError> {
        if candidates.is_empty() {
            let format = AudioFormatSpec::new(rate, channels, self.default_encoding);
            if let Err(err) = backend.configure(rate, channels, self.default_encoding) {
                tracing::warn!("No downstream formats, default {} not accepted: {}", format, err);
            } else {
                tracing::debug!("No downstream formats, using default {}", format);
            }
            return Ok(format);
        }

        let mut rejected: Vec<ConfigError> = Vec::new();
        for (index, &encoding) in candidates.iter().enumerate() {
            if candidates[..index].contains(&encoding) {
                continue;
            }
            match backend.configure(rate, channels, encoding) {
                Ok(()) => {
                    let format = AudioFormatSpec::new(rate, channels, encoding);
                    tracing::debug!("Negotiated output format {}", format);
                    return Ok(format);
                }
                Err(err) => {
                    tracing::trace!("Candidate rejected: {}", err);
                    rejected.push(err);
                }
            }
        }

        tracing::warn!(
            "None of {} candidate encoding(s) accepted for {} Hz, {} channel(s)",
            candidates.len(),
            rate,
            channels
        );
        Err(NegotiationError::NoAcceptableFormat {
            rate,
            channels,
            rejected,
        })
    }

    /// Like [`Self::negotiate`], with downstream formats given by name.
    ///
    /// `None` means nothing is connected downstream and selects the default.
    /// A name list without a single usable format fails without probing.
    pub fn negotiate_names<B: DecoderBackend + ?Sized, S: AsRef<str>>(
        &self,
        backend: &mut B,
        rate: u32,
        channels: u32,
        names: Option<&[S]>,
    ) -> Result<AudioFormatSpec, NegotiationError> {
        let Some(names) = names else {
            return self.negotiate(backend, rate, channels, &[]);
        };
        let candidates = parse_encoding_names(names);
        if candidates.is_empty() {
            tracing::warn!("Downstream offered {} format(s), none usable", names.len());
            return Err(NegotiationError::NoAcceptableFormat {
                rate,
                channels,
                rejected: Vec::new(),
            });
        }
        self.negotiate(backend, rate, channels, &candidates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DecodeOutcome, InitError};

    /// Accepts a fixed set of encodings and records every probe.
    struct ProbeBackend {
        accepted: Vec<AudioEncoding>,
        probes: Vec<(u32, u32, AudioEncoding)>,
    }

    impl ProbeBackend {
        fn accepting(accepted: &[AudioEncoding]) -> Self {
            Self {
                accepted: accepted.to_vec(),
                probes: Vec::new(),
            }
        }
    }

    impl DecoderBackend for ProbeBackend {
        fn configure(
            &mut self,
            rate: u32,
            channels: u32,
            encoding: AudioEncoding,
        ) -> Result<(), ConfigError> {
            self.probes.push((rate, channels, encoding));
            if self.accepted.contains(&encoding) {
                Ok(())
            } else {
                Err(ConfigError {
                    rate,
                    channels,
                    encoding,
                    code: 1,
                    message: "unsupported".into(),
                })
            }
        }

        fn feed(&mut self, _data: &[u8]) {}

        fn decode_one(&mut self) -> DecodeOutcome<'_> {
            DecodeOutcome::NeedMore(&[])
        }

        fn reopen_feed(&mut self) -> Result<(), InitError> {
            Ok(())
        }
    }

    #[test]
    fn picks_first_accepted_candidate_in_downstream_order() {
        let mut backend = ProbeBackend::accepting(&[AudioEncoding::S16, AudioEncoding::F32]);
        let negotiator = FormatNegotiator::default();
        let format = negotiator
            .negotiate(
                &mut backend,
                32000,
                1,
                &[AudioEncoding::S24, AudioEncoding::F32, AudioEncoding::S16],
            )
            .unwrap();
        assert_eq!(format, AudioFormatSpec::new(32000, 1, AudioEncoding::F32));
        assert_eq!(
            backend.probes,
            vec![(32000, 1, AudioEncoding::S24), (32000, 1, AudioEncoding::F32)]
        );
    }

    #[test]
    fn same_inputs_give_same_result() {
        let mut backend = ProbeBackend::accepting(&[AudioEncoding::U16, AudioEncoding::S32]);
        let negotiator = FormatNegotiator::default();
        let candidates = [AudioEncoding::F32, AudioEncoding::S32, AudioEncoding::U16];
        let first = negotiator
            .negotiate(&mut backend, 44100, 2, &candidates)
            .unwrap();
        for _ in 0..5 {
            assert_eq!(
                negotiator
                    .negotiate(&mut backend, 44100, 2, &candidates)
                    .unwrap(),
                first
            );
        }
        assert_eq!(first.encoding, AudioEncoding::S32);
    }

    #[test]
    fn empty_candidates_fall_back_to_default_even_if_rejected() {
        let mut backend = ProbeBackend::accepting(&[]);
        let format = FormatNegotiator::default()
            .negotiate(&mut backend, 22050, 2, &[])
            .unwrap();
        assert_eq!(format, AudioFormatSpec::new(22050, 2, AudioEncoding::S16));

        let format = FormatNegotiator::new(AudioEncoding::F32)
            .negotiate(&mut backend, 22050, 2, &[])
            .unwrap();
        assert_eq!(format.encoding, AudioEncoding::F32);
    }

    #[test]
    fn no_accepted_candidate_reports_every_rejection() {
        let mut backend = ProbeBackend::accepting(&[AudioEncoding::S16]);
        let err = FormatNegotiator::default()
            .negotiate(
                &mut backend,
                48000,
                2,
                &[AudioEncoding::F32, AudioEncoding::U24, AudioEncoding::F32],
            )
            .unwrap_err();
        let NegotiationError::NoAcceptableFormat {
            rate,
            channels,
            rejected,
        } = err;
        assert_eq!((rate, channels), (48000, 2));
        let encodings: Vec<_> = rejected.iter().map(|r| r.encoding).collect();
        assert_eq!(encodings, vec![AudioEncoding::F32, AudioEncoding::U24]);
    }

    #[test]
    fn rate_and_channels_are_passed_verbatim() {
        let mut backend = ProbeBackend::accepting(&AudioEncoding::ALL);
        let format = FormatNegotiator::default()
            .negotiate(&mut backend, 11025, 1, &[AudioEncoding::U32])
            .unwrap();
        assert_eq!(format.sample_rate, 11025);
        assert_eq!(format.channels, 1);
        assert_eq!(backend.probes, vec![(11025, 1, AudioEncoding::U32)]);
    }

    #[test]
    fn names_without_usable_format_fail_without_probing() {
        let mut backend = ProbeBackend::accepting(&AudioEncoding::ALL);
        let negotiator = FormatNegotiator::default();
        let foreign = if cfg!(target_endian = "little") {
            "S16BE"
        } else {
            "S16LE"
        };
        let err = negotiator
            .negotiate_names(&mut backend, 44100, 2, Some(&["S8", foreign][..]))
            .unwrap_err();
        assert!(matches!(err, NegotiationError::NoAcceptableFormat { .. }));
        assert!(backend.probes.is_empty());

        let empty: &[&str] = &[];
        assert!(
            negotiator
                .negotiate_names(&mut backend, 44100, 2, Some(empty))
                .is_err()
        );

        let format = negotiator
            .negotiate_names::<_, &str>(&mut backend, 44100, 2, None)
            .unwrap();
        assert_eq!(format.encoding, AudioEncoding::S16);
    }

    #[test]
    fn parses_native_endian_names() {
        let native = if cfg!(target_endian = "little") {
            ["S16LE", "f32le", "U24LE"]
        } else {
            ["S16BE", "f32be", "U24BE"]
        };
        assert_eq!(
            parse_encoding_names(&native),
            vec![AudioEncoding::S16, AudioEncoding::F32, AudioEncoding::U24]
        );
        assert_eq!(
            parse_encoding_names(&["S32", "S32", "bogus", "U16"]),
            vec![AudioEncoding::S32, AudioEncoding::U16]
        );
        assert_eq!(AudioEncoding::from_name(" s24 "), Some(AudioEncoding::S24));
    }

    #[test]
    fn frame_size_follows_encoding_and_channels() {
        assert_eq!(
            AudioFormatSpec::new(44100, 2, AudioEncoding::S16).bytes_per_frame(),
            4
        );
        assert_eq!(
            AudioFormatSpec::new(44100, 2, AudioEncoding::U24).bytes_per_frame(),
            6
        );
        assert_eq!(
            AudioFormatSpec::new(8000, 1, AudioEncoding::F32).bytes_per_frame(),
            4
        );
    }
}
