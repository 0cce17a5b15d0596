//! The fixed 90-byte report exchanged over the control channel.
//!
//! Wire layout (all offsets 0-based):
//!
//! | Offset | Field             | Size |
//! |--------|-------------------|------|
//! | 0      | status            | 1    |
//! | 1      | transaction_id    | 1    |
//! | 2      | remaining_packets | 1    |
//! | 3      | protocol_type     | 1    |
//! | 4      | data_size         | 1    |
//! | 5      | command_class     | 1    |
//! | 6      | command_id        | 1    |
//! | 7      | arguments         | 80   |
//! | 87     | padding           | 1    |
//! | 88     | checksum          | 1    |
//! | 89     | reserved          | 1    |
//!
//! The report is never reinterpreted in place; [`Report::to_bytes`] and
//! [`Report::from_bytes`] copy every field through its documented offset.

use crate::checksum::compute_checksum;
use crate::constants::{ARGUMENTS_LEN, REPORT_LEN};
use crate::error::ProtocolError;
use bytes::{Buf, BufMut};
use modular_bitfield::prelude::*;
use num_enum::{FromPrimitive, IntoPrimitive};
use std::fmt;
use strum_macros::Display;

/// Device-reported outcome of the previous command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, IntoPrimitive, FromPrimitive)]
#[repr(u8)]
pub enum Status {
    #[strum(to_string = "new command")]
    New = 0x00,
    #[strum(to_string = "busy")]
    Busy = 0x01,
    #[strum(to_string = "successful")]
    Successful = 0x02,
    #[strum(to_string = "failure")]
    Failure = 0x03,
    #[strum(to_string = "no response / timeout")]
    NoResponse = 0x04,
    #[strum(to_string = "not supported")]
    NotSupported = 0x05,

    #[num_enum(catch_all)]
    #[strum(to_string = "unknown")]
    Unknown(u8),
}

/// Bit view of the transaction id byte.
#[bitfield(bytes = 1)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransactionId {
    pub device: B3,
    pub id: B5,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Report {
    pub status: u8,
    pub transaction_id: u8,
    pub remaining_packets: u8,
    pub protocol_type: u8,
    pub data_size: u8,
    pub command_class: u8,
    pub command_id: u8,
    pub arguments: [u8; ARGUMENTS_LEN],
    pub padding: u8,
    pub checksum: u8,
    pub reserved: u8,
}

impl Report {
    /// Build a request for `command_class`/`command_id` declaring `data_size` argument bytes.
    ///
    /// Status, transaction id, remaining packets and protocol type stay zero; callers
    /// assign a transaction id before sending when correlation matters.
    pub fn new(command_class: u8, command_id: u8, data_size: u8) -> Self {
        Self {
            command_class,
            command_id,
            data_size,
            ..Self::empty()
        }
    }

    /// An all-zero report, used as a receive shell.
    pub const fn empty() -> Self {
        Self {
            status: 0,
            transaction_id: 0,
            remaining_packets: 0,
            protocol_type: 0,
            data_size: 0,
            command_class: 0,
            command_id: 0,
            arguments: [0; ARGUMENTS_LEN],
            padding: 0,
            checksum: 0,
            reserved: 0,
        }
    }

    /// Copy `args` into the argument block and set `data_size` to match.
    ///
    /// Bytes beyond the argument capacity are dropped.
    pub fn with_arguments(mut self, args: &[u8]) -> Self {
        let len = args.len().min(ARGUMENTS_LEN);
        self.arguments = [0; ARGUMENTS_LEN];
        self.arguments[..len].copy_from_slice(&args[..len]);
        self.data_size = len as u8;
        self
    }

    pub fn with_transaction_id(mut self, transaction_id: u8) -> Self {
        self.transaction_id = transaction_id;
        self
    }

    /// The meaningful prefix of `arguments`, bounded by the argument capacity.
    pub fn arguments(&self) -> &[u8] {
        let len = (self.data_size as usize).min(ARGUMENTS_LEN);
        &self.arguments[..len]
    }

    pub fn status(&self) -> Status {
        Status::from_primitive(self.status)
    }

    pub fn transaction(&self) -> TransactionId {
        TransactionId::from_bytes([self.transaction_id])
    }

    pub fn set_transaction(&mut self, transaction: TransactionId) {
        self.transaction_id = transaction.into_bytes()[0];
    }

    /// Whether the declared payload size fits the argument block.
    pub fn data_size_valid(&self) -> bool {
        self.data_size as usize <= ARGUMENTS_LEN
    }

    /// Recompute and store the checksum. Call after any payload change.
    pub fn stamp_checksum(&mut self) {
        self.checksum = compute_checksum(self);
    }

    pub fn with_checksum(mut self) -> Self {
        self.stamp_checksum();
        self
    }

    pub fn checksum_valid(&self) -> bool {
        self.checksum == compute_checksum(self)
    }

    /// Serialize into the 90-byte wire form.
    pub fn to_bytes(&self) -> [u8; REPORT_LEN] {
        let mut out = [0u8; REPORT_LEN];
        let mut buf = &mut out[..];
        buf.put_u8(self.status);
        buf.put_u8(self.transaction_id);
        buf.put_u8(self.remaining_packets);
        buf.put_u8(self.protocol_type);
        buf.put_u8(self.data_size);
        buf.put_u8(self.command_class);
        buf.put_u8(self.command_id);
        buf.put_slice(&self.arguments);
        buf.put_u8(self.padding);
        buf.put_u8(self.checksum);
        buf.put_u8(self.reserved);
        out
    }

    /// Deserialize from the 90-byte wire form.
    pub fn from_bytes(bytes: &[u8; REPORT_LEN]) -> Self {
        let mut buf = &bytes[..];
        let status = buf.get_u8();
        let transaction_id = buf.get_u8();
        let remaining_packets = buf.get_u8();
        let protocol_type = buf.get_u8();
        let data_size = buf.get_u8();
        let command_class = buf.get_u8();
        let command_id = buf.get_u8();
        let mut arguments = [0u8; ARGUMENTS_LEN];
        buf.copy_to_slice(&mut arguments);
        Self {
            status,
            transaction_id,
            remaining_packets,
            protocol_type,
            data_size,
            command_class,
            command_id,
            arguments,
            padding: buf.get_u8(),
            checksum: buf.get_u8(),
            reserved: buf.get_u8(),
        }
    }
}

impl Default for Report {
    fn default() -> Self {
        Self::empty()
    }
}

impl TryFrom<&[u8]> for Report {
    type Error = ProtocolError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        let raw: &[u8; REPORT_LEN] = bytes.try_into().map_err(|_| ProtocolError::LengthMismatch {
            expected: REPORT_LEN,
            actual: bytes.len(),
        })?;
        Ok(Self::from_bytes(raw))
    }
}

impl From<Report> for [u8; REPORT_LEN] {
    fn from(report: Report) -> Self {
        report.to_bytes()
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "status: {:02x} ({}) transaction_id: {:02x} remaining_packets: {:02x} protocol_type: {:02x} \
             data_size: {:02x} command_class: {:02x} command_id: {:02x} params: {}",
            self.status,
            self.status(),
            self.transaction_id,
            self.remaining_packets,
            self.protocol_type,
            self.data_size,
            self.command_class,
            self.command_id,
            hex::encode(&self.arguments[..16]),
        )
    }
}
