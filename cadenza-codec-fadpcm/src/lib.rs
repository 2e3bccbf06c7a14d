// Cadenza
// Copyright (c) 2026 The Project Cadenza Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! A decoder for FADPCM, the 4-bit adaptive predictive codec used by FMOD sound banks.
//!
//! FADPCM streams are a bare sequence of fixed-size 0x8C-byte frames with no container framing.
//! Frames are assigned to channels round-robin, and each frame carries its own predictor
//! selectors and history seeds, so any whole number of frames can be decoded independently.

#![warn(rust_2018_idioms)]
#![forbid(unsafe_code)]
// The following lints are allowed in all Cadenza crates. Please see the root Cargo.toml for their
// justification.
#![allow(clippy::identity_op)]
#![allow(clippy::manual_range_contains)]

use cadenza_core::support_codec;

use cadenza_core::audio::{SampleBuffer, SignalSpec};
use cadenza_core::codecs::{decl_codec_type, CodecDescriptor, CodecParameters, CodecType};
use cadenza_core::codecs::{Decoder, DecoderOptions, FinalizeResult};
use cadenza_core::errors::{decode_error, unsupported_error, Result};
use cadenza_core::formats::Packet;
use cadenza_core::io::BufReader;

mod frame;

use frame::ChannelState;

pub use frame::{FRAME_LEN, SAMPLES_PER_FRAME};

/// The `CodecType` for FADPCM.
pub const CODEC_TYPE_FADPCM: CodecType = decl_codec_type(b"fadpc");

/// Decodes a whole FADPCM stream into a freshly allocated interleaved sample buffer.
///
/// The output holds `SAMPLES_PER_FRAME` samples per input frame, interleaved `[time][channel]`.
/// The length of `data` must be an exact multiple of [`FRAME_LEN`] and `num_channels` must be
/// greater than zero.
pub fn decode(data: &[u8], num_channels: usize) -> Result<Vec<i16>> {
    let mut output = vec![0i16; (data.len() / FRAME_LEN) * SAMPLES_PER_FRAME];
    decode_into(data, num_channels, &mut output)?;
    Ok(output)
}

/// Decodes a whole FADPCM stream into a caller-provided interleaved sample buffer.
///
/// Sample positions beyond the end of `output` are dropped silently, so a buffer shorter than
/// `total_frames * SAMPLES_PER_FRAME` receives a prefix of the decoded signal. Positions the
/// stream never reaches are left untouched.
pub fn decode_into(data: &[u8], num_channels: usize, output: &mut [i16]) -> Result<()> {
    if num_channels == 0 {
        return unsupported_error("fadpcm: channel count must be greater than zero");
    }
    if data.len() % FRAME_LEN != 0 {
        return decode_error("fadpcm: stream length is not a multiple of the frame length");
    }

    let mut channels = vec![ChannelState::default(); num_channels];
    let mut reader = BufReader::new(data);

    frame::decode_frames(&mut reader, data.len() / FRAME_LEN, &mut channels, output)
}

/// FMOD FADPCM decoder.
pub struct FadpcmDecoder {
    params: CodecParameters,
    state: Vec<ChannelState>,
    buf: SampleBuffer,
}

impl FadpcmDecoder {
    fn decode_inner(&mut self, packet: &Packet) -> Result<()> {
        let data = packet.buf();

        if data.len() % FRAME_LEN != 0 {
            return decode_error("fadpcm: packet length is not a multiple of the frame length");
        }

        let total_frames = data.len() / FRAME_LEN;

        self.buf.clear();
        self.buf.render_reserved(total_frames * SAMPLES_PER_FRAME);

        let mut reader = packet.as_buf_reader();

        frame::decode_frames(&mut reader, total_frames, &mut self.state, self.buf.samples_mut())
    }
}

impl Decoder for FadpcmDecoder {
    fn try_new(params: &CodecParameters, _options: &DecoderOptions) -> Result<Self> {
        if params.codec != CODEC_TYPE_FADPCM {
            return unsupported_error("fadpcm: invalid codec type");
        }

        let rate = match params.sample_rate {
            Some(rate) => rate,
            _ => return unsupported_error("fadpcm: sample rate is required"),
        };

        let channels = match params.channels {
            Some(channels) if channels.count() > 0 => channels,
            _ => return unsupported_error("fadpcm: channels are required"),
        };

        let spec = SignalSpec::new(rate, channels);

        Ok(FadpcmDecoder {
            params: params.clone(),
            state: vec![ChannelState::default(); channels.count()],
            buf: SampleBuffer::new(0, spec),
        })
    }

    fn supported_codecs() -> &'static [CodecDescriptor] {
        &[support_codec!(CODEC_TYPE_FADPCM, "fadpcm", "FMOD FADPCM")]
    }

    fn reset(&mut self) {
        // Every frame re-seeds its channel's history, so only the scratch state needs clearing.
        for state in self.state.iter_mut() {
            *state = Default::default();
        }
    }

    fn codec_params(&self) -> &CodecParameters {
        &self.params
    }

    fn decode(&mut self, packet: &Packet) -> Result<&SampleBuffer> {
        if let Err(e) = self.decode_inner(packet) {
            self.buf.clear();
            Err(e)
        }
        else {
            Ok(&self.buf)
        }
    }

    fn finalize(&mut self) -> FinalizeResult {
        Default::default()
    }

    fn last_decoded(&self) -> &SampleBuffer {
        &self.buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadenza_core::audio::Channels;
    use cadenza_core::errors::Error;

    /// Builds one compressed frame with uniform selector and payload nibbles.
    fn build_frame(coef_sel: u8, shift_sel: u8, hist1: i16, hist2: i16, nibble: u8) -> Vec<u8> {
        let mut frame = vec![0u8; FRAME_LEN];

        let coefs = 0x1111_1111u32 * u32::from(coef_sel & 0x0f);
        let shifts = 0x1111_1111u32 * u32::from(shift_sel & 0x0f);

        frame[0x00..0x04].copy_from_slice(&coefs.to_le_bytes());
        frame[0x04..0x08].copy_from_slice(&shifts.to_le_bytes());
        frame[0x08..0x0a].copy_from_slice(&hist1.to_le_bytes());
        frame[0x0a..0x0c].copy_from_slice(&hist2.to_le_bytes());

        let byte = (nibble & 0x0f) | (nibble << 4);
        frame[0x0c..].fill(byte);

        frame
    }

    #[test]
    fn verify_zero_stream_decodes_to_silence() {
        // One frame per channel, pass-through predictor, zero payload and seeds.
        let mut data = build_frame(0, 0, 0, 0, 0);
        data.extend(build_frame(0, 0, 0, 0, 0));

        let output = decode(&data, 2).unwrap();

        assert_eq!(output.len(), 2 * SAMPLES_PER_FRAME);
        assert!(output.iter().all(|&s| s == 0));
    }

    #[test]
    fn verify_decode_is_deterministic() {
        let data: Vec<u8> = (0..4 * FRAME_LEN).map(|i| (i * 31 + 7) as u8).collect();

        assert_eq!(decode(&data, 2).unwrap(), decode(&data, 2).unwrap());
    }

    #[test]
    fn verify_nibbles_decode_in_stream_order() {
        // With selector 0 and shift 0, each output sample is exactly the sign-extended nibble.
        // The low nibble of each payload byte must decode before the high nibble.
        let mut data = build_frame(0, 0, 0, 0, 0);
        data[0x0c] = 0x21;
        data[0x0d] = 0x43;
        data[0x0e] = 0xf8;

        let output = decode(&data, 1).unwrap();

        assert_eq!(&output[..6], &[1, 2, 3, 4, -8, -1]);
        assert!(output[6..].iter().all(|&s| s == 0));
    }

    #[test]
    fn verify_frame_seeds_reset_history() {
        // Frame 0 leaves a non-trivial running history behind. Frame 1, on the same (only)
        // channel, must decode purely from its own seeds.
        let mut data = build_frame(2, 9, 1234, -1234, 0x5);
        data.extend(build_frame(1, 0, 64, 0, 0));

        let output = decode(&data, 1).unwrap();

        // First samples of frame 1: (64 * 60) >> 6 = 60, then (60 * 60) >> 6 = 56.
        assert_eq!(output[SAMPLES_PER_FRAME], 60);
        assert_eq!(output[SAMPLES_PER_FRAME + 1], 56);
    }

    #[test]
    fn verify_coef_selector_aliases_mod_7() {
        // Raw selector 7 aliases onto entry 0, and raw selector 8 onto entry 1.
        let zero = decode(&build_frame(0, 3, 100, 200, 0x6), 1).unwrap();
        let seven = decode(&build_frame(7, 3, 100, 200, 0x6), 1).unwrap();
        assert_eq!(zero, seven);

        let one = decode(&build_frame(1, 3, 100, 200, 0x6), 1).unwrap();
        let eight = decode(&build_frame(8, 3, 100, 200, 0x6), 1).unwrap();
        assert_eq!(one, eight);

        // Entries 0 and 1 differ, so the aliasing is observable.
        assert_ne!(zero, one);
    }

    #[test]
    fn verify_saturation_clamps_to_bounds() {
        let output = decode(&build_frame(2, 0, 32767, -32768, 0), 1).unwrap();
        assert_eq!(output[0], 32767);

        let output = decode(&build_frame(2, 0, -32768, 32767, 0), 1).unwrap();
        assert_eq!(output[0], -32768);
    }

    #[test]
    fn verify_stereo_interleaving() {
        // Channel 0 decodes every nibble to -1 while channel 1 stays silent.
        let mut data = build_frame(0, 0, 0, 0, 0xf);
        data.extend(build_frame(0, 0, 0, 0, 0));

        let output = decode(&data, 2).unwrap();

        assert_eq!(output.len(), 2 * SAMPLES_PER_FRAME);
        for (index, &sample) in output.iter().enumerate() {
            if index % 2 == 0 {
                assert_eq!(sample, -1, "channel 0 sample at index {}", index);
            }
            else {
                assert_eq!(sample, 0, "channel 1 sample at index {}", index);
            }
        }
    }

    #[test]
    fn verify_undersized_output_truncates_silently() {
        let mut data = build_frame(3, 4, 900, -900, 0xa);
        data.extend(build_frame(4, 5, -700, 700, 0x3));
        data.extend(build_frame(2, 6, 500, -500, 0xc));

        let full = decode(&data, 2).unwrap();
        assert_eq!(full.len(), 3 * SAMPLES_PER_FRAME);

        // An undersized output receives an exact prefix and no error.
        let mut short = vec![0i16; 100];
        decode_into(&data, 2, &mut short).unwrap();
        assert_eq!(&short[..], &full[..100]);
    }

    #[test]
    fn verify_trailing_frame_group_is_partial() {
        // With 3 frames and 2 channels, frame 2 starts a new frame-group whose channel-1 slots
        // never arrive. The group's in-range channel-0 slots must still be written.
        let mut data = build_frame(0, 0, 0, 0, 0xf);
        data.extend(build_frame(0, 0, 0, 0, 0xf));
        data.extend(build_frame(0, 0, 0, 0, 0xf));

        let output = decode(&data, 2).unwrap();
        let group = 2 * SAMPLES_PER_FRAME;

        // Frame 2 writes channel 0 of the second group until the buffer runs out.
        for (index, &sample) in output[group..].iter().enumerate() {
            if index % 2 == 0 {
                assert_eq!(sample, -1);
            }
            else {
                assert_eq!(sample, 0);
            }
        }
    }

    #[test]
    fn verify_preconditions_fail_fast() {
        let data = vec![0u8; FRAME_LEN + 1];
        assert!(matches!(decode(&data, 1), Err(Error::DecodeError(_))));

        let data = vec![0u8; FRAME_LEN];
        assert!(matches!(decode(&data, 0), Err(Error::Unsupported(_))));
    }

    #[test]
    fn verify_decoder_trait_flow() {
        let mut params = CodecParameters::new();
        params
            .for_codec(CODEC_TYPE_FADPCM)
            .with_sample_rate(44_100)
            .with_channels(Channels::from_count(2).unwrap());

        let mut decoder = FadpcmDecoder::try_new(&params, &Default::default()).unwrap();

        let mut data = build_frame(1, 2, 10, 20, 0x4);
        data.extend(build_frame(1, 2, 30, 40, 0x4));
        let packet = Packet::new_from_slice(0, 0, SAMPLES_PER_FRAME as u64, &data);

        let buf = decoder.decode(&packet).unwrap();
        assert_eq!(buf.len(), 2 * SAMPLES_PER_FRAME);
        assert_eq!(buf.samples(), &decode(&data, 2).unwrap()[..]);

        // A malformed packet must clear the previously decoded audio.
        let bad = Packet::new_from_slice(0, 0, 0, &data[..FRAME_LEN - 1]);
        assert!(decoder.decode(&bad).is_err());
        assert!(decoder.last_decoded().is_empty());
    }

    #[test]
    fn verify_try_new_requires_parameters() {
        let mut params = CodecParameters::new();
        params.for_codec(CODEC_TYPE_FADPCM).with_sample_rate(48_000);
        assert!(FadpcmDecoder::try_new(&params, &Default::default()).is_err());

        let mut params = CodecParameters::new();
        params.with_sample_rate(48_000).with_channels(Channels::FRONT_LEFT);
        assert!(FadpcmDecoder::try_new(&params, &Default::default()).is_err());
    }
}
