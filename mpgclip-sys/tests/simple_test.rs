// SPDX-FileCopyrightText: 2025 Contributors to the mpgclip project.
// SPDX-License-Identifier: Apache-2.0

//! Smoke tests for the hand-written libmpg123 declarations.

use mpgclip_sys::*;

/// The composite encoding values must match the ones published in mpg123.h.
#[test]
fn encoding_bits_match_header_values() {
    assert_eq!(MPG123_ENC_SIGNED_16, 0x0d0);
    assert_eq!(MPG123_ENC_UNSIGNED_16, 0x060);
    assert_eq!(MPG123_ENC_SIGNED_24, 0x5080);
    assert_eq!(MPG123_ENC_UNSIGNED_24, 0x6000);
    assert_eq!(MPG123_ENC_SIGNED_32, 0x1180);
    assert_eq!(MPG123_ENC_UNSIGNED_32, 0x2100);
    assert_eq!(MPG123_ENC_FLOAT_32 & MPG123_ENC_FLOAT, MPG123_ENC_FLOAT_32);
}

/// Decode loop status codes are negative, real errors are positive.
#[test]
fn status_codes_are_partitioned() {
    for code in [MPG123_DONE, MPG123_NEW_FORMAT, MPG123_NEED_MORE, MPG123_ERR] {
        assert!(code < MPG123_OK);
    }
    for code in [MPG123_BAD_OUTFORMAT, MPG123_BAD_CHANNEL, MPG123_BAD_RATE] {
        assert!(code > MPG123_OK);
    }
}

#[test]
fn loading_a_missing_library_fails() {
    let result = unsafe { LibMpg123::new("libmpg123-does-not-exist.so") };
    assert!(result.is_err());
}
