use crate::constants::{
    ARGB_CHANNEL_THRESHOLD, ARGB_COLOR_CAPACITY, ARGB_REPORT_ID_HIGH, ARGB_REPORT_ID_LOW, BYTES_PER_LED,
};
use crate::error::ProtocolError;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

/// Direct LED color push for addressable RGB channels.
///
/// Carries no checksum; integrity is left to the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
pub struct ArgbFrame {
    pub report_id: u8,
    // The device expects the channel twice.
    pub channel_1: u8,
    pub channel_2: u8,
    pub pad: u8,
    pub last_idx: u8,
    pub color_data: [u8; ARGB_COLOR_CAPACITY],
}

impl ArgbFrame {
    /// Build a frame for `led_count` LEDs on `channel` from packed RGB triples.
    ///
    /// The size check runs before anything is copied out of `colors`.
    pub fn build(channel: u8, led_count: u8, colors: &[u8]) -> Result<Self, ProtocolError> {
        let payload_len = led_count as usize * BYTES_PER_LED;
        if payload_len > ARGB_COLOR_CAPACITY {
            return Err(ProtocolError::PayloadTooLarge {
                requested: payload_len,
                capacity: ARGB_COLOR_CAPACITY,
            });
        }
        if led_count == 0 {
            return Err(ProtocolError::EmptyPayload);
        }
        if colors.len() < payload_len {
            return Err(ProtocolError::LengthMismatch {
                expected: payload_len,
                actual: colors.len(),
            });
        }

        let mut color_data = [0u8; ARGB_COLOR_CAPACITY];
        color_data[..payload_len].copy_from_slice(&colors[..payload_len]);

        Ok(Self {
            report_id: Self::report_id_for(channel),
            channel_1: channel,
            channel_2: channel,
            pad: 0,
            last_idx: led_count - 1,
            color_data,
        })
    }

    pub fn report_id_for(channel: u8) -> u8 {
        if channel < ARGB_CHANNEL_THRESHOLD {
            ARGB_REPORT_ID_LOW
        } else {
            ARGB_REPORT_ID_HIGH
        }
    }

    pub fn led_count(&self) -> usize {
        self.last_idx as usize + 1
    }

    /// The packed colors actually addressed by this frame.
    pub fn colors(&self) -> &[u8] {
        let len = (self.led_count() * BYTES_PER_LED).min(ARGB_COLOR_CAPACITY);
        &self.color_data[..len]
    }
}
