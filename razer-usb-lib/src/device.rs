use crate::argb::ArgbFrame;
use crate::checksum::compute_checksum;
use crate::config::{DeviceConfig, OversizePolicy};
use crate::constants::{ARGB_FRAME_LEN, ARGB_REPORT_INDEX, ARGUMENTS_LEN, FALLBACK_TRANSACTION_ID, REPORT_VALUE};
use crate::error::ProtocolError;
use crate::report::Report;
use crate::transport::{
    self, ControlRequest, SettleDelay, Transport, control_read, control_write, expect_transferred, transfer_buffer,
    write_control,
};
use crate::usb::NusbTransport;
use tracing::{debug, warn};
use zerocopy::IntoBytes;

/// Classification of a completed request/response exchange.
#[derive(Debug)]
pub enum Outcome {
    Ok,
    /// The response did not arrive as a full 90-byte report. Carries the cause.
    Invalid(ProtocolError),
    /// The response declared `value` argument bytes; `data_size` was clamped to `capacity`.
    OversizedField { value: u8, capacity: usize },
}

/// The result of [`RazerDevice::exchange`].
///
/// The response is kept even when the exchange is not `Outcome::Ok`, so callers can
/// tell "device didn't answer" from "device answered with a malformed frame".
#[derive(Debug)]
pub struct Exchange {
    pub response: Report,
    pub outcome: Outcome,
    /// Failure of the request write. The response read is attempted regardless.
    pub write_error: Option<ProtocolError>,
}

impl Exchange {
    pub fn is_ok(&self) -> bool {
        self.write_error.is_none() && matches!(self.outcome, Outcome::Ok)
    }

    /// Collapse into the response, failing on any write error or validation outcome.
    pub fn into_result(self) -> Result<Report, ProtocolError> {
        if let Some(e) = self.write_error {
            return Err(e);
        }
        match self.outcome {
            Outcome::Ok => Ok(self.response),
            Outcome::Invalid(e) => Err(e),
            Outcome::OversizedField { value, capacity } => Err(ProtocolError::OversizedField { value, capacity }),
        }
    }
}

/// Protocol engine bound to one open device handle.
///
/// Methods take `&mut self`; one transaction is in flight at a time.
pub struct RazerDevice<T> {
    transport: T,
    config: DeviceConfig,
}

impl RazerDevice<NusbTransport> {
    /// Open the device `vid`/`pid`, claiming `interface_number`.
    pub fn open(vid: u16, pid: u16, interface_number: u8, config: DeviceConfig) -> Result<Self, ProtocolError> {
        Ok(Self::new(NusbTransport::open(vid, pid, interface_number)?, config))
    }
}

impl<T: Transport> RazerDevice<T> {
    pub fn new(transport: T, config: DeviceConfig) -> Self {
        Self { transport, config }
    }

    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut DeviceConfig {
        &mut self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn into_transport(self) -> T {
        self.transport
    }

    /// Send `request` and read the device's response using the configured indices and delay.
    pub fn exchange(&mut self, request: Report) -> Result<Exchange, ProtocolError> {
        let DeviceConfig {
            report_index,
            response_index,
            settle,
            ..
        } = self.config;
        self.exchange_with(report_index, request, response_index, settle)
    }

    /// Send `request` to `report_index`, wait `settle`, then read the response from `response_index`.
    ///
    /// Returns `Err` only for allocation failure, or for an oversized response under
    /// [`OversizePolicy::Reject`]. Every other anomaly is reported in the [`Exchange`].
    pub fn exchange_with(
        &mut self,
        report_index: u16,
        mut request: Report,
        response_index: u16,
        settle: SettleDelay,
    ) -> Result<Exchange, ProtocolError> {
        if request.transaction_id == 0x00 {
            warn!("Transaction id 0x00 is reserved, sending 0x{:02x}", FALLBACK_TRANSACTION_ID);
            request.transaction_id = FALLBACK_TRANSACTION_ID;
        }
        if self.config.stamp_checksum {
            request.stamp_checksum();
        }

        let timeout = self.config.control_timeout;
        let write_error = match control_write(&mut self.transport, &request.to_bytes(), report_index, timeout, settle) {
            Ok(()) => None,
            Err(e @ ProtocolError::AllocationFailure { .. }) => return Err(e),
            Err(e) => Some(e),
        };

        let read = control_read(&mut self.transport, response_index, timeout)?;
        let mut response = read.report;

        let outcome = if !response.data_size_valid() {
            let value = response.data_size;
            warn!(
                "Field data_size {} in response is bigger than arguments ({})",
                value, ARGUMENTS_LEN
            );
            match self.config.oversize_policy {
                OversizePolicy::Reject => {
                    return Err(ProtocolError::OversizedField {
                        value,
                        capacity: ARGUMENTS_LEN,
                    });
                }
                OversizePolicy::Clamp => {
                    response.data_size = ARGUMENTS_LEN as u8;
                    Outcome::OversizedField {
                        value,
                        capacity: ARGUMENTS_LEN,
                    }
                }
            }
        } else if let Some(anomaly) = read.anomaly {
            Outcome::Invalid(anomaly)
        } else {
            Outcome::Ok
        };

        if matches!(outcome, Outcome::Ok) && !response.checksum_valid() {
            debug!(
                received = response.checksum,
                computed = compute_checksum(&response),
                "Response checksum does not match its payload, trusting it"
            );
        }
        debug!(request = %request, response = %response, "Exchange complete");

        Ok(Exchange {
            response,
            outcome,
            write_error,
        })
    }

    /// Send `report` without reading a response.
    pub fn send(&mut self, mut report: Report) -> Result<(), ProtocolError> {
        if report.transaction_id == 0x00 {
            report.transaction_id = FALLBACK_TRANSACTION_ID;
        }
        if self.config.stamp_checksum {
            report.stamp_checksum();
        }
        control_write(
            &mut self.transport,
            &report.to_bytes(),
            self.config.report_index,
            self.config.control_timeout,
            self.config.settle,
        )
    }

    /// Send the first `size` bytes of `data` with a caller-chosen `value` and `index`.
    ///
    /// For device families that predate the 90-byte report layout.
    pub fn send_legacy(
        &mut self,
        data: &[u8],
        value: u16,
        index: u16,
        size: usize,
        settle: SettleDelay,
    ) -> Result<(), ProtocolError> {
        let payload = data.get(..size).ok_or(ProtocolError::LengthMismatch {
            expected: size,
            actual: data.len(),
        })?;
        write_control(
            &mut self.transport,
            ControlRequest::set_report(value, index, self.config.control_timeout),
            payload,
            settle,
        )
    }

    /// Push `led_count` packed RGB triples to an addressable channel.
    ///
    /// Succeeds only if the whole serialized frame was transferred.
    pub fn send_argb(&mut self, channel: u8, led_count: u8, colors: &[u8]) -> Result<(), ProtocolError> {
        let frame = ArgbFrame::build(channel, led_count, colors)?;
        let buf = transfer_buffer(frame.as_bytes())?;
        debug!(
            channel,
            led_count,
            report_id = frame.report_id,
            "Sending ARGB frame"
        );
        let request = ControlRequest::set_report(REPORT_VALUE, ARGB_REPORT_INDEX, self.config.control_timeout);
        let result = self.transport.control_out(request, &buf);
        expect_transferred(result, ARGB_FRAME_LEN)
    }

    /// Write raw bytes to the bulk OUT endpoint.
    pub fn bulk_write(&mut self, data: &[u8]) -> Result<usize, ProtocolError> {
        transport::bulk_write(&mut self.transport, data)
    }

    /// Read raw bytes from the bulk IN endpoint.
    pub fn bulk_read(&mut self, buf: &mut [u8]) -> Result<usize, ProtocolError> {
        transport::bulk_read(&mut self.transport, buf)
    }
}
