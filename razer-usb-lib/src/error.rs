use nusb::transfer::TransferError;
use thiserror::Error;

/// The primary error type for the `razer-usb` library.
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("Failed to allocate a {size} byte transfer buffer")]
    AllocationFailure { size: usize },

    #[error("USB transfer error: {0}")]
    Io(#[from] TransferError),

    #[error("Timeout during USB operation: {0}")]
    Timeout(#[from] tokio::time::error::Elapsed),

    #[error("Length mismatch: expected {expected} bytes, transferred {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("Field data_size {value} in response is bigger than arguments ({capacity})")]
    OversizedField { value: u8, capacity: usize },

    #[error("ARGB payload of {requested} bytes exceeds color capacity of {capacity}")]
    PayloadTooLarge { requested: usize, capacity: usize },

    #[error("ARGB frame needs at least one LED")]
    EmptyPayload,

    #[error("USB device {vid:04x}:{pid:04x} not found. Is it connected?")]
    DeviceNotFound { vid: u16, pid: u16 },

    #[error("USB error: {0}")]
    Usb(#[from] nusb::Error),

    #[error("Failed to start transfer runtime: {0}")]
    Runtime(std::io::Error),
}

impl ProtocolError {
    /// True for failures that describe the shape of the data rather than the link.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            ProtocolError::LengthMismatch { .. }
                | ProtocolError::OversizedField { .. }
                | ProtocolError::PayloadTooLarge { .. }
                | ProtocolError::EmptyPayload
        )
    }
}
