// SPDX-FileCopyrightText: 2025 Contributors to the mpgclip project.
// SPDX-License-Identifier: Apache-2.0

//! Common utilities shared across examples.

/// Initializes tracing subscriber for examples.
///
/// Logs to stderr so decoded audio can go to stdout. INFO by default,
/// `RUST_LOG` overrides it.
pub fn setup_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(tracing::level_filters::LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Sample rate and channel count from the first MPEG audio frame header in
/// `data`, if one is found.
pub fn probe_stream(data: &[u8]) -> Option<(u32, u32)> {
    const RATES: [[u32; 3]; 3] = [
        [44100, 48000, 32000], // MPEG-1
        [22050, 24000, 16000], // MPEG-2
        [11025, 12000, 8000],  // MPEG-2.5
    ];

    data.windows(4).find_map(|header| {
        if header[0] != 0xff || header[1] & 0xe0 != 0xe0 {
            return None;
        }
        let version = match (header[1] >> 3) & 0x03 {
            0b11 => 0,
            0b10 => 1,
            0b00 => 2,
            _ => return None,
        };
        let layer = (header[1] >> 1) & 0x03;
        let bitrate = header[2] >> 4;
        let rate_index = ((header[2] >> 2) & 0x03) as usize;
        if layer == 0 || bitrate == 0x0f || rate_index == 3 {
            return None;
        }
        let channels = if header[3] >> 6 == 0b11 { 1 } else { 2 };
        Some((RATES[version][rate_index], channels))
    })
}
