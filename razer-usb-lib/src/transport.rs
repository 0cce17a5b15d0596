//! Transfer primitives and the framing rules layered on top of them.
//!
//! A [`Transport`] performs exactly one USB transfer per call and knows nothing
//! about reports. The free functions in this module own the transfer buffers,
//! enforce the length contracts and honor the settle delay after writes.

use crate::constants::{
    BULK_ENDPOINT_IN, BULK_ENDPOINT_OUT, BULK_TIMEOUT, HID_REQ_GET_REPORT, HID_REQ_SET_REPORT, REPORT_LEN,
    REPORT_VALUE,
};
use crate::error::ProtocolError;
use crate::report::Report;
use std::time::Duration;
use tracing::{debug, warn};

/// Delay after a write that gives the device time to process it.
///
/// Must elapse before any dependent read is issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SettleDelay {
    pub min: Duration,
    pub max: Duration,
}

impl SettleDelay {
    pub const NONE: Self = Self {
        min: Duration::ZERO,
        max: Duration::ZERO,
    };

    pub const fn from_micros(min: u64, max: u64) -> Self {
        Self {
            min: Duration::from_micros(min),
            max: Duration::from_micros(max),
        }
    }

    /// True only when neither bound asks for a wait.
    pub fn is_none(&self) -> bool {
        self.min.is_zero() && self.max.is_zero()
    }
}

/// Setup stage of a class/interface control transfer. Direction is implied by
/// the [`Transport`] method it is passed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlRequest {
    pub request: u8,
    pub value: u16,
    pub index: u16,
    pub timeout: Duration,
}

impl ControlRequest {
    pub fn set_report(value: u16, index: u16, timeout: Duration) -> Self {
        Self {
            request: HID_REQ_SET_REPORT,
            value,
            index,
            timeout,
        }
    }

    pub fn get_report(index: u16, timeout: Duration) -> Self {
        Self {
            request: HID_REQ_GET_REPORT,
            value: REPORT_VALUE,
            index,
            timeout,
        }
    }
}

/// A handle capable of control and bulk transfers plus a blocking sleep.
///
/// Each method blocks until the transfer completes or times out and returns
/// the number of bytes actually transferred. Implementations never retry.
pub trait Transport {
    /// Host-to-device class/interface control transfer.
    fn control_out(&mut self, request: ControlRequest, data: &[u8]) -> Result<usize, ProtocolError>;

    /// Device-to-host class/interface control transfer into `buf`.
    fn control_in(&mut self, request: ControlRequest, buf: &mut [u8]) -> Result<usize, ProtocolError>;

    fn bulk_out(&mut self, endpoint: u8, data: &[u8], timeout: Duration) -> Result<usize, ProtocolError>;

    fn bulk_in(&mut self, endpoint: u8, buf: &mut [u8], timeout: Duration) -> Result<usize, ProtocolError>;

    /// Block for somewhere between `delay.min` and `delay.max`.
    fn sleep(&mut self, delay: SettleDelay);
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn control_out(&mut self, request: ControlRequest, data: &[u8]) -> Result<usize, ProtocolError> {
        (**self).control_out(request, data)
    }

    fn control_in(&mut self, request: ControlRequest, buf: &mut [u8]) -> Result<usize, ProtocolError> {
        (**self).control_in(request, buf)
    }

    fn bulk_out(&mut self, endpoint: u8, data: &[u8], timeout: Duration) -> Result<usize, ProtocolError> {
        (**self).bulk_out(endpoint, data, timeout)
    }

    fn bulk_in(&mut self, endpoint: u8, buf: &mut [u8], timeout: Duration) -> Result<usize, ProtocolError> {
        (**self).bulk_in(endpoint, buf, timeout)
    }

    fn sleep(&mut self, delay: SettleDelay) {
        (**self).sleep(delay)
    }
}

/// A report read back from the device together with any anomaly seen while reading it.
#[derive(Debug)]
pub struct ReportRead {
    pub report: Report,
    /// `LengthMismatch` or `Io` from the read. Does not abort an exchange.
    pub anomaly: Option<ProtocolError>,
}

/// Copy `data` into a buffer owned by the transfer.
pub(crate) fn transfer_buffer(data: &[u8]) -> Result<Vec<u8>, ProtocolError> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(data.len())
        .map_err(|_| ProtocolError::AllocationFailure { size: data.len() })?;
    buf.extend_from_slice(data);
    Ok(buf)
}

pub(crate) fn receive_buffer(len: usize) -> Result<Vec<u8>, ProtocolError> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(len)
        .map_err(|_| ProtocolError::AllocationFailure { size: len })?;
    buf.resize(len, 0);
    Ok(buf)
}

/// Succeed only when the whole buffer went out.
pub(crate) fn expect_transferred(result: Result<usize, ProtocolError>, expected: usize) -> Result<(), ProtocolError> {
    match result {
        Ok(actual) if actual == expected => Ok(()),
        Ok(actual) => {
            warn!(expected, actual, "Device data transfer failed");
            Err(ProtocolError::LengthMismatch { expected, actual })
        }
        Err(e) => {
            warn!(error = %e, "Device data transfer failed");
            Err(e)
        }
    }
}

/// Issue a SET_REPORT with an arbitrary `request.value`/`request.index`, then settle.
///
/// The settle delay is honored even when the transfer fails.
pub fn write_control<T: Transport + ?Sized>(
    transport: &mut T,
    request: ControlRequest,
    data: &[u8],
    settle: SettleDelay,
) -> Result<(), ProtocolError> {
    let buf = transfer_buffer(data)?;
    debug!(
        value = request.value,
        index = request.index,
        bytes = hex::encode(&buf),
        "USB control write"
    );
    let result = transport.control_out(request, &buf);
    if !settle.is_none() {
        transport.sleep(settle);
    }
    expect_transferred(result, buf.len())
}

/// Send a report-sized buffer with SET_REPORT (value 0x300) to `report_index`.
pub fn control_write<T: Transport + ?Sized>(
    transport: &mut T,
    data: &[u8],
    report_index: u16,
    timeout: Duration,
    settle: SettleDelay,
) -> Result<(), ProtocolError> {
    write_control(
        transport,
        ControlRequest::set_report(REPORT_VALUE, report_index, timeout),
        data,
        settle,
    )
}

/// Fetch a 90-byte report with GET_REPORT from `response_index`.
///
/// Only a failed buffer allocation is returned as `Err`; a short, long or failed
/// transfer is reported through [`ReportRead::anomaly`] alongside whatever was received.
pub fn control_read<T: Transport + ?Sized>(
    transport: &mut T,
    response_index: u16,
    timeout: Duration,
) -> Result<ReportRead, ProtocolError> {
    let mut buf = receive_buffer(REPORT_LEN)?;
    let anomaly = match transport.control_in(ControlRequest::get_report(response_index, timeout), &mut buf) {
        Ok(len) if len == REPORT_LEN => None,
        Ok(len) => {
            warn!(len, "Invalid USB response. USB Report length: {}", len);
            Some(ProtocolError::LengthMismatch {
                expected: REPORT_LEN,
                actual: len,
            })
        }
        Err(e) => {
            warn!(error = %e, "USB response read failed");
            Some(e)
        }
    };
    debug!(index = response_index, bytes = hex::encode(&buf), "USB control read");

    let report = Report::try_from(buf.as_slice())?;
    Ok(ReportRead { report, anomaly })
}

/// Write raw bytes to the bulk OUT endpoint. Returns the transferred length.
pub fn bulk_write<T: Transport + ?Sized>(transport: &mut T, data: &[u8]) -> Result<usize, ProtocolError> {
    let buf = transfer_buffer(data)?;
    debug!(endpoint = BULK_ENDPOINT_OUT, bytes = hex::encode(&buf), "USB bulk write");
    transport
        .bulk_out(BULK_ENDPOINT_OUT, &buf, BULK_TIMEOUT)
        .inspect_err(|e| warn!(error = %e, "Bulk OUT transfer failed"))
}

/// Read raw bytes from the bulk IN endpoint into `buf`. Returns the transferred length.
pub fn bulk_read<T: Transport + ?Sized>(transport: &mut T, buf: &mut [u8]) -> Result<usize, ProtocolError> {
    let len = transport
        .bulk_in(BULK_ENDPOINT_IN, buf, BULK_TIMEOUT)
        .inspect_err(|e| warn!(error = %e, "Bulk IN transfer failed"))?;
    debug!(
        endpoint = BULK_ENDPOINT_IN,
        bytes = hex::encode(&buf[..len.min(buf.len())]),
        "USB bulk read"
    );
    Ok(len)
}
