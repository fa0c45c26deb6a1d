// SPDX-FileCopyrightText: 2025 Contributors to the mpgclip project.
// SPDX-License-Identifier: Apache-2.0

//! Clip bookkeeping for decoded chunks.
//!
//! Every unit fed to the decoder leaves one [`ClipEntry`] in a
//! [`ClipInfoQueue`]. The decoder may delay its output by several units, so
//! entries are not matched to the unit that produced a chunk but to the
//! oldest unclaimed entry: one entry per decoded chunk, in FIFO order.

use std::collections::VecDeque;

use crate::AudioFormatSpec;

/// Bytes to trim from the start and the end of one decoded chunk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ClipEntry {
    pub clip_start: u64,
    pub clip_end: u64,
}

impl ClipEntry {
    /// An entry that trims nothing.
    pub const NONE: ClipEntry = ClipEntry {
        clip_start: 0,
        clip_end: 0,
    };

    pub fn new(clip_start: u64, clip_end: u64) -> Self {
        Self {
            clip_start,
            clip_end,
        }
    }

    /// Builds an entry from sample (frame) counts, using the byte size of one
    /// interleaved frame in `format`.
    pub fn from_samples(clip_start: u64, clip_end: u64, format: &AudioFormatSpec) -> Self {
        let bpf = format.bytes_per_frame() as u64;
        Self {
            clip_start: clip_start.saturating_mul(bpf),
            clip_end: clip_end.saturating_mul(bpf),
        }
    }

    pub fn is_none(&self) -> bool {
        self.clip_start == 0 && self.clip_end == 0
    }

    /// Applies the clip to `chunk`.
    ///
    /// Returns `None` when the clip covers the whole chunk, otherwise the
    /// range `[clip_start, len - clip_end)`.
    pub fn apply<'a>(&self, chunk: &'a [u8]) -> Option<&'a [u8]> {
        let len = chunk.len() as u64;
        if self.clip_start.saturating_add(self.clip_end) >= len {
            return None;
        }
        let start = self.clip_start as usize;
        let end = (len - self.clip_end) as usize;
        Some(&chunk[start..end])
    }
}

impl From<(u64, u64)> for ClipEntry {
    fn from((clip_start, clip_end): (u64, u64)) -> Self {
        Self::new(clip_start, clip_end)
    }
}

/// FIFO of pending clip entries.
///
/// Unbounded; the capacity passed to [`ClipInfoQueue::with_capacity`] is an
/// allocation hint only.
#[derive(Debug, Default)]
pub struct ClipInfoQueue {
    entries: VecDeque<ClipEntry>,
}

impl ClipInfoQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, entry: ClipEntry) {
        self.entries.push_back(entry);
    }

    /// Removes and returns the oldest entry.
    ///
    /// An empty queue yields [`ClipEntry::NONE`] and stays empty.
    pub fn pop_oldest(&mut self) -> ClipEntry {
        match self.entries.pop_front() {
            Some(entry) => entry,
            None => {
                tracing::warn!("Clip info queue is empty, decoded chunk is left unclipped");
                ClipEntry::NONE
            }
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
