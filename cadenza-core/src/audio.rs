// Cadenza
// Copyright (c) 2026 The Project Cadenza Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `audio` module provides primitives for working with multi-channel 16-bit audio.

use std::fmt;

use bitflags::bitflags;

bitflags! {
    /// `Channels` is a bit mask of all channels contained in a signal.
    #[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
    pub struct Channels: u32 {
        /// Front-left (left) or the Mono channel.
        const FRONT_LEFT         = 0x0000_0001;
        /// Front-right (right) channel.
        const FRONT_RIGHT        = 0x0000_0002;
        /// Front-centre (centre) channel.
        const FRONT_CENTRE       = 0x0000_0004;
        /// Low frequency channel 1.
        const LFE1               = 0x0000_0008;
        /// Rear-left (surround rear left) channel.
        const REAR_LEFT          = 0x0000_0010;
        /// Rear-right (surround rear right) channel.
        const REAR_RIGHT         = 0x0000_0020;
        /// Side left (surround left) channel.
        const SIDE_LEFT          = 0x0000_0040;
        /// Side right (surround right) channel.
        const SIDE_RIGHT         = 0x0000_0080;
    }
}

impl Channels {
    /// Gets the number of channels.
    pub fn count(self) -> usize {
        self.bits().count_ones() as usize
    }

    /// Gets a channel mask for the given channel count using the positional channel order
    /// declared above. Returns `None` if the count is 0 or exceeds the number of positions.
    pub fn from_count(count: usize) -> Option<Channels> {
        if count == 0 || count > 8 {
            return None;
        }
        Channels::from_bits((1u32 << count) - 1)
    }
}

impl fmt::Display for Channels {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#032b}", self.bits())
    }
}

/// `SignalSpec` describes the characteristics of a Signal.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SignalSpec {
    /// The signal sampling rate in hertz (Hz).
    pub rate: u32,
    /// The channel assignments of the signal. The order of the channels in the mask is the order
    /// the channel samples are interleaved in.
    pub channels: Channels,
}

impl SignalSpec {
    pub fn new(rate: u32, channels: Channels) -> Self {
        SignalSpec { rate, channels }
    }
}

/// A `SampleBuffer`, as the name implies, is a buffer for storing interleaved 16-bit signal
/// samples in the `[time][channel]` layout.
///
/// Unlike a planar audio buffer, the length of a `SampleBuffer` is counted in individual samples,
/// not frames, so a trailing slot need not span every channel.
pub struct SampleBuffer {
    buf: Vec<i16>,
    spec: SignalSpec,
}

impl SampleBuffer {
    /// Instantiate a new `SampleBuffer` with a capacity of `capacity` interleaved samples.
    pub fn new(capacity: usize, spec: SignalSpec) -> SampleBuffer {
        SampleBuffer { buf: Vec::with_capacity(capacity), spec }
    }

    /// Gets the signal specification of the stored samples.
    pub fn spec(&self) -> &SignalSpec {
        &self.spec
    }

    /// Gets the number of written samples.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Returns `true` if the buffer contains no written samples.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Gets the number of whole frames (one sample per channel) written.
    pub fn frames(&self) -> usize {
        self.buf.len() / self.spec.channels.count()
    }

    /// Clears all written samples.
    pub fn clear(&mut self) {
        self.buf.clear();
    }

    /// Renders `n_samples` samples of silence, growing the written region of the buffer.
    pub fn render_reserved(&mut self, n_samples: usize) {
        self.buf.resize(self.buf.len() + n_samples, 0);
    }

    /// Gets an immutable slice of all written samples.
    pub fn samples(&self) -> &[i16] {
        &self.buf
    }

    /// Gets a mutable slice of all written samples.
    pub fn samples_mut(&mut self) -> &mut [i16] {
        &mut self.buf
    }
}
