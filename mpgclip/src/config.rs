// SPDX-FileCopyrightText: 2025 Contributors to the mpgclip project.
// SPDX-License-Identifier: Apache-2.0

//! Session and decoder library settings.
//!
//! Settings deserialize from JSON; every field is optional and falls back to
//! the defaults documented below.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{AudioEncoding, Result};

/// File name of the libmpg123 shared library looked up by default.
pub const DEFAULT_LIBRARY_NAME: &str = "libmpg123.so.0";

/// Environment variable overriding [`DEFAULT_LIBRARY_NAME`].
pub const LIBRARY_PATH_ENV: &str = "MPGCLIP_MPG123_LIBRARY";

/// Initial clip queue allocation. Not a limit.
pub const DEFAULT_CLIP_QUEUE_CAPACITY: usize = 16;

/// Returns the path of the libmpg123 shared library to load.
///
/// Uses `MPGCLIP_MPG123_LIBRARY` if set, otherwise the bare library name so
/// the system loader's search path applies.
///
/// # Examples
///
/// ```no_run
/// use mpgclip::config::get_mpg123_so_path;
/// use mpgclip::load_api;
///
/// # fn main() -> Result<(), mpgclip::Error> {
/// let api = load_api(get_mpg123_so_path())?;
/// # Ok(())
/// # }
/// ```
pub fn get_mpg123_so_path() -> PathBuf {
    std::env::var_os(LIBRARY_PATH_ENV)
        .filter(|path| !path.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_LIBRARY_NAME))
}

/// Settings for one decoder session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DecoderSettings {
    /// Initial capacity of the clip queue.
    pub clip_queue_capacity: usize,

    /// Encoding used when nothing downstream constrains the output.
    pub default_encoding: AudioEncoding,

    pub mpg123: Mpg123Settings,
}

impl Default for DecoderSettings {
    fn default() -> Self {
        Self {
            clip_queue_capacity: DEFAULT_CLIP_QUEUE_CAPACITY,
            default_encoding: AudioEncoding::S16,
            mpg123: Mpg123Settings::default(),
        }
    }
}

impl DecoderSettings {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = std::fs::read_to_string(path.as_ref())?;
        let settings = Self::from_json_str(&json)?;
        tracing::debug!(
            "Loaded decoder settings from \"{}\"",
            path.as_ref().display()
        );
        Ok(settings)
    }
}

/// libmpg123 handle options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Mpg123Settings {
    pub library_path: PathBuf,

    /// Bytes to search for the next frame after a sync loss; -1 searches up
    /// to the end of the stream (web radio streams need this).
    pub resync_limit: i64,

    /// libmpg123's own gapless trimming. Off, since clip entries do the
    /// trimming and the built-in variant misbehaves around seeks.
    pub gapless: bool,

    /// Small read-ahead buffer for better frame sync.
    pub seek_buffer: bool,

    /// Keep libmpg123 from printing to stdout/stderr.
    pub quiet: bool,

    /// Let libmpg123 resample to an accepted rate. Off: rate and channel
    /// count always come from the stream.
    pub auto_resample: bool,
}

impl Default for Mpg123Settings {
    fn default() -> Self {
        Self {
            library_path: get_mpg123_so_path(),
            resync_limit: -1,
            gapless: false,
            seek_buffer: true,
            quiet: true,
            auto_resample: false,
        }
    }
}
