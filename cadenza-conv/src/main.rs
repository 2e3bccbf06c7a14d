// Cadenza
// Copyright (c) 2026 The Project Cadenza Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

#![warn(rust_2018_idioms)]
#![forbid(unsafe_code)]

use std::fs::File;
use std::io::{BufWriter, Read};
use std::path::Path;

use cadenza_codec_fadpcm::{FadpcmDecoder, CODEC_TYPE_FADPCM, FRAME_LEN, SAMPLES_PER_FRAME};
use cadenza_core::audio::{Channels, SignalSpec};
use cadenza_core::codecs::{CodecParameters, CodecRegistry, DecoderOptions};
use cadenza_core::errors::{unsupported_error, Result};
use cadenza_core::formats::Packet;
use cadenza_format_wav::WavWriter;

use clap::{Arg, ArgMatches};
use log::{error, info, warn};

/// The number of frame-groups (one frame per channel) fed to the decoder per packet.
const GROUPS_PER_PACKET: usize = 64;

fn main() {
    pretty_env_logger::init();

    let args = clap::Command::new("Cadenza Conv")
        .version("1.0")
        .about("Rebuild FADPCM sample data into wav files with Cadenza")
        .arg(
            Arg::new("channels")
                .long("channels")
                .short('c')
                .value_name("COUNT")
                .default_value("1")
                .help("The number of audio channels"),
        )
        .arg(
            Arg::new("rate")
                .long("rate")
                .short('r')
                .value_name("HZ")
                .default_value("44100")
                .help("The sample rate in Hz"),
        )
        .arg(Arg::new("INPUT").help("The input file path").required(true).index(1))
        .arg(Arg::new("OUTPUT").help("The output file path").required(true).index(2))
        .get_matches();

    // For any error, return an exit code -1. Otherwise return the exit code provided.
    let code = match run(&args) {
        Ok(code) => code,
        Err(err) => {
            error!("{}", err.to_string().to_lowercase());
            -1
        }
    };

    std::process::exit(code)
}

fn run(args: &ArgMatches) -> Result<i32> {
    let num_channels = match args.value_of("channels").unwrap().parse::<usize>() {
        Ok(count) if count > 0 => count,
        _ => return unsupported_error("conv: channel count must be a positive integer"),
    };

    let rate = match args.value_of("rate").unwrap().parse::<u32>() {
        Ok(rate) if rate > 0 => rate,
        _ => return unsupported_error("conv: sample rate must be a positive integer"),
    };

    let channels = match Channels::from_count(num_channels) {
        Some(channels) => channels,
        _ => return unsupported_error("conv: unsupported channel count"),
    };

    let input_path = Path::new(args.value_of("INPUT").unwrap());
    let output_path = Path::new(args.value_of("OUTPUT").unwrap());

    let mut data = Vec::new();
    File::open(input_path)?.read_to_end(&mut data)?;

    let total_frames = data.len() / FRAME_LEN;

    if data.len() % FRAME_LEN != 0 {
        // The decoder rejects partial frames, so drop the slack before packetizing.
        warn!(
            "conv: ignoring {} trailing bytes that do not form a whole frame",
            data.len() - total_frames * FRAME_LEN
        );
    }

    info!(
        "conv: {} frames, {} channels, {} Hz",
        total_frames, num_channels, rate
    );

    let mut params = CodecParameters::new();
    params
        .for_codec(CODEC_TYPE_FADPCM)
        .with_sample_rate(rate)
        .with_channels(channels)
        .with_n_frames((total_frames * SAMPLES_PER_FRAME / num_channels) as u64);

    let mut registry = CodecRegistry::new();
    registry.register_all::<FadpcmDecoder>();

    let mut decoder = registry.make(&params, &DecoderOptions::default())?;

    let spec = SignalSpec::new(rate, channels);
    let mut writer = WavWriter::new(BufWriter::new(File::create(output_path)?), spec)?;

    // Feed the decoder whole frame-groups per packet. Channel assignment round-robins from the
    // first frame of each packet, so packets must not split a frame-group.
    let packet_len = GROUPS_PER_PACKET * num_channels * FRAME_LEN;
    let data = &data[..total_frames * FRAME_LEN];

    let mut ts = 0u64;
    let mut n_samples = 0u64;

    for chunk in data.chunks(packet_len) {
        let dur = (chunk.len() / (num_channels * FRAME_LEN) * SAMPLES_PER_FRAME) as u64;
        let packet = Packet::new_from_slice(0, ts, dur, chunk);

        let buf = decoder.decode(&packet)?;

        writer.write_samples(buf.samples())?;

        ts += dur;
        n_samples += buf.len() as u64;
    }

    writer.finish()?;

    info!(
        "conv: wrote {} samples ({:.1}s) to {}",
        n_samples,
        n_samples as f64 / (num_channels as f64 * f64::from(rate)),
        output_path.display()
    );

    Ok(0)
}
