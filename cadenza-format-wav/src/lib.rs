// Cadenza
// Copyright (c) 2026 The Project Cadenza Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! A writer for the RIFF WAVE (wav) format, packaging decoded interleaved 16-bit PCM samples
//! into a playable container.

#![warn(rust_2018_idioms)]
#![forbid(unsafe_code)]
// The following lints are allowed in all Cadenza crates. Please see the root Cargo.toml for their
// justification.
#![allow(clippy::identity_op)]
#![allow(clippy::manual_range_contains)]

use std::io::{Seek, SeekFrom, Write};

use cadenza_core::audio::SignalSpec;
use cadenza_core::errors::Result;

/// The RIFF stream marker.
const RIFF_STREAM_MARKER: [u8; 4] = *b"RIFF";
/// The RIFF form for wave streams.
const WAVE_RIFF_FORM: [u8; 4] = *b"WAVE";
/// The format chunk identifier.
const FMT_CHUNK_ID: [u8; 4] = *b"fmt ";
/// The data chunk identifier.
const DATA_CHUNK_ID: [u8; 4] = *b"data";

/// The WAVE format tag for uncompressed PCM.
const WAVE_FORMAT_PCM: u16 = 0x0001;

/// The total length of the RIFF, wave form, fmt chunk, and data chunk headers.
const HEADER_LEN: u32 = 44;

const BITS_PER_SAMPLE: u16 = 16;

/// Writes a complete wav file containing the given interleaved 16-bit samples.
pub fn write_wav<W: Write>(writer: &mut W, samples: &[i16], spec: &SignalSpec) -> Result<()> {
    write_header(writer, spec, (samples.len() * 2) as u32)?;

    for &sample in samples {
        writer.write_all(&sample.to_le_bytes())?;
    }

    Ok(())
}

fn write_header<W: Write>(writer: &mut W, spec: &SignalSpec, data_len: u32) -> Result<()> {
    let num_channels = spec.channels.count() as u16;
    let block_align = num_channels * (BITS_PER_SAMPLE / 8);
    let byte_rate = spec.rate * u32::from(block_align);

    writer.write_all(&RIFF_STREAM_MARKER)?;
    writer.write_all(&(HEADER_LEN - 8 + data_len).to_le_bytes())?;
    writer.write_all(&WAVE_RIFF_FORM)?;

    writer.write_all(&FMT_CHUNK_ID)?;
    writer.write_all(&16u32.to_le_bytes())?;
    writer.write_all(&WAVE_FORMAT_PCM.to_le_bytes())?;
    writer.write_all(&num_channels.to_le_bytes())?;
    writer.write_all(&spec.rate.to_le_bytes())?;
    writer.write_all(&byte_rate.to_le_bytes())?;
    writer.write_all(&block_align.to_le_bytes())?;
    writer.write_all(&BITS_PER_SAMPLE.to_le_bytes())?;

    writer.write_all(&DATA_CHUNK_ID)?;
    writer.write_all(&data_len.to_le_bytes())?;

    Ok(())
}

/// A streaming wav writer.
///
/// The header is written up-front with placeholder sizes, samples are appended with
/// [`write_samples`](WavWriter::write_samples), and [`finish`](WavWriter::finish) seeks back and
/// patches the final sizes in.
pub struct WavWriter<W: Write + Seek> {
    inner: W,
    spec: SignalSpec,
    n_samples: u64,
}

impl<W: Write + Seek> WavWriter<W> {
    /// Instantiate a new `WavWriter` and write the placeholder header.
    pub fn new(mut inner: W, spec: SignalSpec) -> Result<WavWriter<W>> {
        write_header(&mut inner, &spec, 0)?;
        Ok(WavWriter { inner, spec, n_samples: 0 })
    }

    /// Appends a block of interleaved samples to the data chunk.
    pub fn write_samples(&mut self, samples: &[i16]) -> Result<()> {
        for &sample in samples {
            self.inner.write_all(&sample.to_le_bytes())?;
        }
        self.n_samples += samples.len() as u64;
        Ok(())
    }

    /// Patches the header with the final chunk sizes and returns the underlying writer.
    pub fn finish(mut self) -> Result<W> {
        let data_len = (self.n_samples * 2) as u32;

        self.inner.seek(SeekFrom::Start(0))?;
        write_header(&mut self.inner, &self.spec, data_len)?;
        self.inner.seek(SeekFrom::End(0))?;

        Ok(self.inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadenza_core::audio::Channels;
    use std::io::Cursor;

    fn stereo_spec() -> SignalSpec {
        SignalSpec::new(44_100, Channels::FRONT_LEFT | Channels::FRONT_RIGHT)
    }

    #[test]
    fn verify_wav_header_layout() {
        let samples = [0i16; 512];
        let mut buf = Vec::new();
        write_wav(&mut buf, &samples, &stereo_spec()).unwrap();

        assert_eq!(&buf[0..4], b"RIFF");
        assert_eq!(u32::from_le_bytes(buf[4..8].try_into().unwrap()), 36 + 1024);
        assert_eq!(&buf[8..12], b"WAVE");

        assert_eq!(&buf[12..16], b"fmt ");
        assert_eq!(u32::from_le_bytes(buf[16..20].try_into().unwrap()), 16);
        // PCM format tag, 2 channels.
        assert_eq!(u16::from_le_bytes(buf[20..22].try_into().unwrap()), 1);
        assert_eq!(u16::from_le_bytes(buf[22..24].try_into().unwrap()), 2);
        assert_eq!(u32::from_le_bytes(buf[24..28].try_into().unwrap()), 44_100);
        // Byte rate = rate * channels * 2, block align = channels * 2, 16 bits per sample.
        assert_eq!(u32::from_le_bytes(buf[28..32].try_into().unwrap()), 176_400);
        assert_eq!(u16::from_le_bytes(buf[32..34].try_into().unwrap()), 4);
        assert_eq!(u16::from_le_bytes(buf[34..36].try_into().unwrap()), 16);

        assert_eq!(&buf[36..40], b"data");
        assert_eq!(u32::from_le_bytes(buf[40..44].try_into().unwrap()), 1024);
        assert_eq!(buf.len(), 44 + 1024);
    }

    #[test]
    fn verify_sample_bytes_are_little_endian() {
        let samples = [0x0102i16, -2];
        let mut buf = Vec::new();
        write_wav(&mut buf, &samples, &stereo_spec()).unwrap();

        assert_eq!(&buf[44..48], &[0x02, 0x01, 0xfe, 0xff]);
    }

    #[test]
    fn verify_streaming_writer_patches_header() {
        let mut writer = WavWriter::new(Cursor::new(Vec::new()), stereo_spec()).unwrap();
        writer.write_samples(&[1, 2, 3, 4]).unwrap();
        writer.write_samples(&[5, 6]).unwrap();
        let buf = writer.finish().unwrap().into_inner();

        let mut expected = Vec::new();
        write_wav(&mut expected, &[1, 2, 3, 4, 5, 6], &stereo_spec()).unwrap();

        assert_eq!(buf, expected);
    }
}
