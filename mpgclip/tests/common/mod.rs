// SPDX-FileCopyrightText: 2025 Contributors to the mpgclip project.
// SPDX-License-Identifier: Apache-2.0

//! Helpers shared by the integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;

use mpgclip::{
    AudioEncoding, AudioFormatSpec, ConfigError, DecodeFault, DecodeOutcome, DecoderBackend,
    InitError,
};

/// Ensures logging is initialized only once across all tests.
static LOG_ONCE: std::sync::Once = std::sync::Once::new();

/// Initializes logging (respects `RUST_LOG`, INFO by default).
pub fn setup_logging() {
    LOG_ONCE.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::builder()
                    .with_default_directive(tracing::level_filters::LevelFilter::INFO.into())
                    .from_env_lossy(),
            )
            .with_test_writer()
            .try_init();
    });
}

/// One scripted answer of [`ScriptedBackend::decode_one`].
#[derive(Debug, Clone)]
pub enum Step {
    NewFormat(Vec<u8>),
    NeedMore(Vec<u8>),
    Ok(Vec<u8>),
    Done(Vec<u8>),
    Err(DecodeFault),
}

/// A chunk of `len` bytes counting up from zero (wrapping).
pub fn chunk(len: usize) -> Vec<u8> {
    (0..len).map(|i| i as u8).collect()
}

/// Deterministic fake decoder.
///
/// `decode_one` replays the script step by step and answers
/// `NeedMore` with no data once the script is exhausted.
#[derive(Default)]
pub struct ScriptedBackend {
    script: VecDeque<Step>,
    current: Vec<u8>,
    accepted: Vec<AudioEncoding>,
    reported_format: Option<AudioFormatSpec>,
    fail_reopen: bool,
    pub fed: Vec<Vec<u8>>,
    pub probes: Vec<(u32, u32, AudioEncoding)>,
    pub reopen_count: usize,
    pub decode_calls: usize,
}

impl ScriptedBackend {
    /// A backend accepting every encoding.
    pub fn new() -> Self {
        Self::accepting(&AudioEncoding::ALL)
    }

    pub fn accepting(accepted: &[AudioEncoding]) -> Self {
        Self {
            accepted: accepted.to_vec(),
            ..Default::default()
        }
    }

    pub fn script<I: IntoIterator<Item = Step>>(&mut self, steps: I) -> &mut Self {
        self.script.extend(steps);
        self
    }

    pub fn remaining_steps(&self) -> usize {
        self.script.len()
    }

    pub fn report_format(&mut self, format: Option<AudioFormatSpec>) {
        self.reported_format = format;
    }

    pub fn fail_next_reopen(&mut self) {
        self.fail_reopen = true;
    }
}

impl DecoderBackend for ScriptedBackend {
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
                message: "encoding not built in".into(),
            })
        }
    }

    fn feed(&mut self, data: &[u8]) {
        self.fed.push(data.to_vec());
    }

    fn decode_one(&mut self) -> DecodeOutcome<'_> {
        self.decode_calls += 1;
        match self.script.pop_front().unwrap_or(Step::NeedMore(Vec::new())) {
            Step::Err(fault) => DecodeOutcome::Err(fault),
            Step::NewFormat(data) => {
                self.current = data;
                DecodeOutcome::NewFormat(&self.current)
            }
            Step::NeedMore(data) => {
                self.current = data;
                DecodeOutcome::NeedMore(&self.current)
            }
            Step::Ok(data) => {
                self.current = data;
                DecodeOutcome::Ok(&self.current)
            }
            Step::Done(data) => {
                self.current = data;
                DecodeOutcome::Done(&self.current)
            }
        }
    }

    fn reopen_feed(&mut self) -> Result<(), InitError> {
        self.reopen_count += 1;
        if std::mem::take(&mut self.fail_reopen) {
            return Err(InitError {
                code: 7,
                message: "out of memory".into(),
            });
        }
        Ok(())
    }

    fn current_format(&self) -> Option<AudioFormatSpec> {
        self.reported_format
    }
}
