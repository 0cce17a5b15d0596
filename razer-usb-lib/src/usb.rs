use crate::error::ProtocolError;
use crate::transport::{ControlRequest, SettleDelay, Transport};
use nusb::Interface;
use nusb::transfer::{Control, ControlType, Recipient, RequestBuffer};
use std::time::Duration;
use tokio::runtime::Runtime;
use tokio::time::timeout;
use tracing::info;

/// [`Transport`] over a claimed `nusb` interface.
///
/// Control transfers use the blocking `nusb` calls. Bulk transfers are driven on
/// a private current-thread runtime so they can be bounded by a timeout.
pub struct NusbTransport {
    interface: Interface,
    runtime: Runtime,
}

impl NusbTransport {
    /// Open the first device matching `vid`/`pid` and claim `interface_number`.
    pub fn open(vid: u16, pid: u16, interface_number: u8) -> Result<Self, ProtocolError> {
        info!("Searching for USB device {:04x}:{:04x}...", vid, pid);
        let device_info = nusb::list_devices()?
            .find(|d| d.vendor_id() == vid && d.product_id() == pid)
            .ok_or(ProtocolError::DeviceNotFound { vid, pid })?;

        info!(
            "Found device on bus {} addr {}",
            device_info.bus_number(),
            device_info.device_address()
        );

        let device = device_info.open()?;
        let interface = device.detach_and_claim_interface(interface_number)?;
        info!(interface = interface_number, "Interface claimed successfully.");

        Self::from_interface(interface)
    }

    /// Wrap an interface that was already claimed by the caller.
    pub fn from_interface(interface: Interface) -> Result<Self, ProtocolError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .map_err(ProtocolError::Runtime)?;
        Ok(Self { interface, runtime })
    }

    fn control(request: ControlRequest) -> Control {
        Control {
            control_type: ControlType::Class,
            recipient: Recipient::Interface,
            request: request.request,
            value: request.value,
            index: request.index,
        }
    }
}

impl Transport for NusbTransport {
    fn control_out(&mut self, request: ControlRequest, data: &[u8]) -> Result<usize, ProtocolError> {
        let len = self
            .interface
            .control_out_blocking(Self::control(request), data, request.timeout)?;
        Ok(len)
    }

    fn control_in(&mut self, request: ControlRequest, buf: &mut [u8]) -> Result<usize, ProtocolError> {
        let len = self
            .interface
            .control_in_blocking(Self::control(request), buf, request.timeout)?;
        Ok(len)
    }

    fn bulk_out(&mut self, endpoint: u8, data: &[u8], timeout_duration: Duration) -> Result<usize, ProtocolError> {
        let transfer_future = self.interface.bulk_out(endpoint, data.to_vec());
        let completion = self.runtime.block_on(timeout(timeout_duration, transfer_future))?;
        let sent = completion.into_result()?;
        Ok(sent.actual_length())
    }

    fn bulk_in(&mut self, endpoint: u8, buf: &mut [u8], timeout_duration: Duration) -> Result<usize, ProtocolError> {
        let transfer_future = self.interface.bulk_in(endpoint, RequestBuffer::new(buf.len()));
        let completion = self.runtime.block_on(timeout(timeout_duration, transfer_future))?;
        let data = completion.into_result()?;
        let len = data.len().min(buf.len());
        buf[..len].copy_from_slice(&data[..len]);
        Ok(len)
    }

    fn sleep(&mut self, delay: SettleDelay) {
        // Lower bound, unless only an upper bound was given.
        let wait = if delay.min.is_zero() { delay.max } else { delay.min };
        std::thread::sleep(wait);
    }
}
