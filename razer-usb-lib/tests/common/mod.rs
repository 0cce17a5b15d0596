//! Common test utilities and a scripted in-memory transport

#![allow(dead_code)]

use razer_usb_lib::{ControlRequest, ProtocolError, SettleDelay, Transport};
use std::collections::VecDeque;
use std::time::Duration;

#[allow(unused_imports)]
pub use hex;
#[allow(unused_imports)]
pub use nusb::transfer::TransferError;
#[allow(unused_imports)]
pub use razer_usb_lib::constants::*;
#[allow(unused_imports)]
pub use razer_usb_lib::{DeviceConfig, Exchange, OversizePolicy, Outcome, RazerDevice, Report};

/// Decode a hex fixture into raw transfer bytes.
pub fn hex_to_bytes(hex_data: &str) -> Vec<u8> {
    hex::decode(hex_data).expect("Failed to decode hex")
}

/// SET_REPORT payload for class 0x02 id 0x01, two argument bytes 01 02, transaction id 0x1F.
pub const CHECKSUMMED_REQUEST_HEX: &str = "001f0000020201\
0102\
00000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000\
0200";

/// Everything the engine asked the transport to do, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    ControlOut { request: ControlRequest, data: Vec<u8> },
    ControlIn { request: ControlRequest, len: usize },
    BulkOut { endpoint: u8, data: Vec<u8>, timeout: Duration },
    BulkIn { endpoint: u8, len: usize, timeout: Duration },
    Sleep(SettleDelay),
}

/// What a scripted read hands back.
pub enum Reply {
    /// Copy these bytes and report their length.
    Data(Vec<u8>),
    /// Copy these bytes but claim `len` were transferred.
    Claim(Vec<u8>, usize),
    Fail(TransferError),
}

/// Outcome of a scripted write.
pub enum WriteReply {
    /// Accept the full buffer.
    All,
    Short(usize),
    Fail(TransferError),
}

#[derive(Default)]
pub struct FakeTransport {
    pub calls: Vec<Call>,
    pub reads: VecDeque<Reply>,
    pub writes: VecDeque<WriteReply>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(mut self, reply: Reply) -> Self {
        self.reads.push_back(reply);
        self
    }

    pub fn write_reply(mut self, reply: WriteReply) -> Self {
        self.writes.push_back(reply);
        self
    }

    pub fn control_writes(&self) -> Vec<&Vec<u8>> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                Call::ControlOut { data, .. } => Some(data),
                _ => None,
            })
            .collect()
    }

    fn write(&mut self, len: usize) -> Result<usize, ProtocolError> {
        match self.writes.pop_front().unwrap_or(WriteReply::All) {
            WriteReply::All => Ok(len),
            WriteReply::Short(n) => Ok(n),
            WriteReply::Fail(e) => Err(e.into()),
        }
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, ProtocolError> {
        match self.reads.pop_front() {
            Some(Reply::Data(data)) => {
                let n = data.len().min(buf.len());
                buf[..n].copy_from_slice(&data[..n]);
                Ok(n)
            }
            Some(Reply::Claim(data, len)) => {
                let n = data.len().min(buf.len());
                buf[..n].copy_from_slice(&data[..n]);
                Ok(len)
            }
            Some(Reply::Fail(e)) => Err(e.into()),
            None => Err(TransferError::Stall.into()),
        }
    }
}

impl Transport for FakeTransport {
    fn control_out(&mut self, request: ControlRequest, data: &[u8]) -> Result<usize, ProtocolError> {
        self.calls.push(Call::ControlOut {
            request,
            data: data.to_vec(),
        });
        self.write(data.len())
    }

    fn control_in(&mut self, request: ControlRequest, buf: &mut [u8]) -> Result<usize, ProtocolError> {
        self.calls.push(Call::ControlIn { request, len: buf.len() });
        self.read(buf)
    }

    fn bulk_out(&mut self, endpoint: u8, data: &[u8], timeout: Duration) -> Result<usize, ProtocolError> {
        self.calls.push(Call::BulkOut {
            endpoint,
            data: data.to_vec(),
            timeout,
        });
        self.write(data.len())
    }

    fn bulk_in(&mut self, endpoint: u8, buf: &mut [u8], timeout: Duration) -> Result<usize, ProtocolError> {
        self.calls.push(Call::BulkIn {
            endpoint,
            len: buf.len(),
            timeout,
        });
        self.read(buf)
    }

    fn sleep(&mut self, delay: SettleDelay) {
        self.calls.push(Call::Sleep(delay));
    }
}

pub fn device(transport: FakeTransport) -> RazerDevice<FakeTransport> {
    RazerDevice::new(transport, DeviceConfig::default())
}

/// A well-formed response echoing `request` with `status` set.
pub fn response_for(request: &Report, status: u8, args: &[u8]) -> Vec<u8> {
    let mut response = Report::new(request.command_class, request.command_id, 0).with_arguments(args);
    response.status = status;
    response.transaction_id = request.transaction_id;
    response.stamp_checksum();
    response.to_bytes().to_vec()
}
