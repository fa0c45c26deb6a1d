// SPDX-FileCopyrightText: 2025 Contributors to the mpgclip project.
// SPDX-License-Identifier: Apache-2.0

//! Decodes an MPEG audio file to raw PCM.
//!
//! The file is fed in fixed-size blocks, as a network source would deliver
//! it, and every decoded chunk is written out as soon as it appears.
//!
//! ```text
//! cargo run --example decode_file -- song.mp3 --encoding F32 --encoding S16 -o song.pcm
//! ```

mod common;

use std::{
    fs::File,
    io::{BufWriter, Read, Write},
    path::PathBuf,
};

use clap::Parser;
use mpgclip::{
    ClipDecoder, ClipEntry, Error, Mpg123Decoder, UnitOutput, config::DecoderSettings, load_api,
};
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(version, about = "Decode an MPEG audio file to raw PCM")]
struct Args {
    /// The MPEG audio file to decode.
    input: PathBuf,

    /// Where to write the decoded audio. Discarded if not given.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Decoder settings as JSON.
    #[arg(short, long)]
    settings: Option<PathBuf>,

    /// Accepted output encodings, most preferred first (S16, F32, S24LE, ...).
    #[arg(short, long = "encoding")]
    encodings: Vec<String>,

    /// Stream sample rate. Read from the first frame header if not given.
    #[arg(long)]
    rate: Option<u32>,

    /// Stream channel count. Read from the first frame header if not given.
    #[arg(long)]
    channels: Option<u32>,

    /// Bytes handed to the decoder per unit.
    #[arg(long, default_value_t = 4096)]
    block_size: usize,

    /// Encoder delay in samples, clipped from the start of the first chunk.
    #[arg(long, default_value_t = 0)]
    skip_samples: u64,

    /// Give up after this many decode errors in a row.
    #[arg(long, default_value_t = 10)]
    max_errors: u32,
}

fn main() -> Result<(), Error> {
    common::setup_logging();
    let args = Args::parse();

    let settings = match &args.settings {
        Some(path) => DecoderSettings::from_json_file(path)?,
        None => DecoderSettings::default(),
    };

    let mut input = Vec::new();
    File::open(&args.input)?.read_to_end(&mut input)?;

    let probed = common::probe_stream(&input);
    let (rate, channels) = match (args.rate, args.channels, probed) {
        (Some(rate), Some(channels), _) => (rate, channels),
        (rate, channels, Some((probed_rate, probed_channels))) => (
            rate.unwrap_or(probed_rate),
            channels.unwrap_or(probed_channels),
        ),
        _ => {
            return Err(Error::Other(format!(
                "No MPEG frame header in \"{}\", pass --rate and --channels",
                args.input.display()
            )));
        }
    };

    let api = load_api(&settings.mpg123.library_path)?;
    let backend = Mpg123Decoder::new(api, &settings.mpg123)?;
    let mut decoder = ClipDecoder::with_settings(backend, &settings);

    let names = (!args.encodings.is_empty()).then_some(args.encodings.as_slice());
    let format = decoder.set_format_request_from_names(rate, channels, names)?;
    info!("Decoding \"{}\" to {}", args.input.display(), format);

    let mut output: Option<Box<dyn Write>> = match &args.output {
        Some(path) => Some(Box::new(BufWriter::new(File::create(path)?))),
        None => None,
    };

    let mut consecutive_errors = 0;
    let mut first = true;
    let blocks = input
        .chunks(args.block_size.max(1))
        .map(Some)
        .chain(std::iter::once(None));

    for block in blocks {
        let clip = first.then(|| ClipEntry::from_samples(args.skip_samples, 0, &format));
        first = false;

        let outcome = match decoder.handle_unit(block, clip, false) {
            Ok(outcome) => {
                consecutive_errors = 0;
                outcome
            }
            Err(err) if !err.is_fatal() => {
                consecutive_errors += 1;
                warn!("Decode error {} of {}: {}", consecutive_errors, args.max_errors, err);
                if consecutive_errors >= args.max_errors {
                    error!("Too many decode errors in a row, giving up");
                    return Err(err);
                }
                err.partial_outcome().cloned().unwrap_or_default()
            }
            Err(err) => return Err(err),
        };

        for unit in &outcome.outputs {
            match unit {
                UnitOutput::FormatChanged(format) => info!("Output format is now {}", format),
                UnitOutput::Finished(pcm) => {
                    if let Some(out) = output.as_mut() {
                        out.write_all(pcm)?;
                    }
                }
            }
        }
        if outcome.eos {
            break;
        }
    }

    if let Some(mut out) = output {
        out.flush()?;
    }

    let stats = decoder.stats();
    info!(
        "Done: {} unit(s) fed, {} chunk(s) decoded ({} fully clipped), {} byte(s) out, {} error(s)",
        stats.units_fed,
        stats.chunks_decoded,
        stats.fully_clipped_chunks,
        stats.bytes_out,
        stats.decode_errors
    );
    decoder.stop();
    Ok(())
}
