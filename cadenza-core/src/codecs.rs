// Cadenza
// Copyright (c) 2026 The Project Cadenza Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `codecs` module provides the traits and support structures necessary to implement audio
//! codec decoders.

use std::collections::HashMap;
use std::fmt;

use log::info;

use crate::audio::{Channels, SampleBuffer};
use crate::errors::{unsupported_error, Result};
use crate::formats::Packet;

/// A `CodecType` is a unique identifier used to identify a specific codec.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct CodecType(u32);

/// Declares a new `CodecType` given a character code. A character code is an ASCII string
/// containing a maximum of 5 alphanumeric characters. Any other character is dropped, and any
/// extra characters are truncated.
pub const fn decl_codec_type(cc: &[u8]) -> CodecType {
    /// Map alphanumeric ASCII characters into a 6-bit code.
    const fn map_ascii_to_bits(cc: u8) -> u32 {
        // The mapping is defined as:
        //  b'0'..=b'9' maps to  1..=10
        //  b'a'..=b'z' maps to 11..=36
        //  b'A'..=b'Z' maps to 37..=62
        if cc.is_ascii_digit() {
            1 + (cc - b'0') as u32
        }
        else if cc.is_ascii_lowercase() {
            11 + (cc - b'a') as u32
        }
        else if cc.is_ascii_uppercase() {
            37 + (cc - b'A') as u32
        }
        else {
            0
        }
    }

    // The upper-bit indicates the user codec namespace.
    let mut id = 0x8000_0000;

    let mut i = 0;
    let mut j = 0;

    while i < cc.len() && j < 5 {
        // Pack the ASCII characters into the allocated 30 bits (6 bits per character) in MSb
        // order.
        if cc[i].is_ascii_alphanumeric() {
            id |= map_ascii_to_bits(cc[i]) << (24 - (6 * j));
            j += 1;
        }
        i += 1;
    }

    CodecType(id)
}

impl fmt::Display for CodecType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// Null codec.
pub const CODEC_TYPE_NULL: CodecType = CodecType(0x0);

/// `CodecParameters` describes the properties of a codec bitstream.
#[derive(Clone, Debug)]
pub struct CodecParameters {
    /// The codec type.
    pub codec: CodecType,

    /// The sample rate of the audio in Hz.
    pub sample_rate: Option<u32>,

    /// A bit mask of all channels in the stream.
    pub channels: Option<Channels>,

    /// The total number of frames, if known ahead of decoding.
    pub n_frames: Option<u64>,
}

impl CodecParameters {
    pub fn new() -> CodecParameters {
        CodecParameters { codec: CODEC_TYPE_NULL, sample_rate: None, channels: None, n_frames: None }
    }

    /// Provide the `CodecType`.
    pub fn for_codec(&mut self, codec: CodecType) -> &mut Self {
        self.codec = codec;
        self
    }

    /// Provide the sample rate in Hz.
    pub fn with_sample_rate(&mut self, sample_rate: u32) -> &mut Self {
        self.sample_rate = Some(sample_rate);
        self
    }

    /// Provide the channel map.
    pub fn with_channels(&mut self, channels: Channels) -> &mut Self {
        self.channels = Some(channels);
        self
    }

    /// Provide the total number of frames.
    pub fn with_n_frames(&mut self, n_frames: u64) -> &mut Self {
        self.n_frames = Some(n_frames);
        self
    }
}

impl Default for CodecParameters {
    fn default() -> Self {
        Self::new()
    }
}

/// `DecoderOptions` is a common set of options that all decoders use.
#[derive(Copy, Clone, Debug, Default)]
pub struct DecoderOptions {
    /// The decoded audio should be verified if possible during the decode process.
    pub verify: bool,
}

/// `FinalizeResult` contains optional information that can only be found, calculated, or
/// determined after decoding is complete.
#[derive(Copy, Clone, Debug, Default)]
pub struct FinalizeResult {
    /// If verification is enabled and supported by the decoder, provides the verification result
    /// if available.
    pub verify_ok: Option<bool>,
}

/// A `Decoder` implements a codec's decode algorithm. It consumes `Packet`s and produces
/// interleaved sample buffers.
pub trait Decoder: Send + Sync {
    /// Attempts to instantiate a `Decoder` using the provided `CodecParameters`.
    fn try_new(params: &CodecParameters, options: &DecoderOptions) -> Result<Self>
    where
        Self: Sized;

    /// Gets a list of codec descriptors for the codecs supported by this Decoder.
    fn supported_codecs() -> &'static [CodecDescriptor]
    where
        Self: Sized;

    /// Reset the `Decoder`.
    ///
    /// A decoder must be reset when the next packet is discontinuous with respect to the last
    /// decoded packet.
    fn reset(&mut self);

    /// Gets a reference to an updated set of `CodecParameters` based on the parameters the
    /// `Decoder` was instantiated with.
    fn codec_params(&self) -> &CodecParameters;

    /// Decodes a `Packet` of audio data and returns the decoded interleaved samples.
    ///
    /// If a `DecodeError` or `IoError` is returned, the packet is undecodeable and should be
    /// discarded. Decoding may be continued with the next packet.
    ///
    /// Implementors of decoders *must* `clear` the internal buffer if an error occurs.
    fn decode(&mut self, packet: &Packet) -> Result<&SampleBuffer>;

    /// Optionally, obtain post-decode information such as the verification status.
    fn finalize(&mut self) -> FinalizeResult;

    /// Allows read access to the internal sample buffer.
    ///
    /// After a successful call to `decode`, this will contain the audio content of the last
    /// decoded `Packet`. If the last call to `decode` resulted in an error, then implementors
    /// *must* ensure the returned buffer has zero length.
    fn last_decoded(&self) -> &SampleBuffer;
}

/// A `CodecDescriptor` stores a description of a single logical codec. Common information such as
/// the `CodecType`, a short name, and a long name are provided. The `CodecDescriptor` also
/// provides an instantiation function. When the instantiation function is called, a `Decoder` for
/// the codec is returned.
#[derive(Copy, Clone)]
pub struct CodecDescriptor {
    /// The `CodecType` identifier.
    pub codec: CodecType,
    /// A short ASCII-only string identifying the codec.
    pub short_name: &'static str,
    /// A longer, more descriptive, string identifying the codec.
    pub long_name: &'static str,
    // An instantiation function for the codec.
    pub inst_func: fn(&CodecParameters, &DecoderOptions) -> Result<Box<dyn Decoder>>,
}

/// Convenience macro for declaring a `CodecDescriptor`.
#[macro_export]
macro_rules! support_codec {
    ($type:expr, $short_name:expr, $long_name:expr) => {
        CodecDescriptor {
            codec: $type,
            short_name: $short_name,
            long_name: $long_name,
            inst_func: |params, opt| Ok(Box::new(Self::try_new(params, opt)?)),
        }
    };
}

/// A `CodecRegistry` allows the registration of codecs, and provides a method to instantiate a
/// `Decoder` given a `CodecParameters` object.
#[derive(Default)]
pub struct CodecRegistry {
    codecs: HashMap<CodecType, CodecDescriptor>,
}

impl CodecRegistry {
    /// Instantiate a new `CodecRegistry`.
    pub fn new() -> Self {
        CodecRegistry { codecs: HashMap::new() }
    }

    /// Gets the `CodecDescriptor` for a registered codec.
    pub fn get_codec(&self, codec: CodecType) -> Option<&CodecDescriptor> {
        self.codecs.get(&codec)
    }

    /// Registers all codecs supported by `Decoder`. If a supported codec was previously
    /// registered by another `Decoder` it will be replaced within the registry.
    pub fn register_all<D: Decoder>(&mut self) {
        for descriptor in D::supported_codecs() {
            self.register(descriptor);
        }
    }

    /// Register a single codec. If the codec was previously registered it will be replaced within
    /// the registry.
    pub fn register(&mut self, descriptor: &CodecDescriptor) {
        if self.codecs.insert(descriptor.codec, *descriptor).is_some() {
            info!("replacing registered codec {}", descriptor.codec);
        }
    }

    /// Searches the registry for a `Decoder` that supports the codec. If one is found, it will be
    /// instantiated with the provided `CodecParameters` and returned. If a `Decoder` could not be
    /// found, or the `CodecParameters` are either insufficient or invalid for the `Decoder`, an
    /// error will be returned.
    pub fn make(
        &self,
        params: &CodecParameters,
        options: &DecoderOptions,
    ) -> Result<Box<dyn Decoder>> {
        if let Some(descriptor) = self.codecs.get(&params.codec) {
            Ok((descriptor.inst_func)(params, options)?)
        }
        else {
            unsupported_error("core (codec): no decoder for codec")
        }
    }
}
