pub mod argb;
pub mod checksum;
pub mod config;
pub mod constants;
pub mod device;
pub mod error;
pub mod report;
pub mod transport;
pub mod usb;


pub use argb::ArgbFrame;
pub use checksum::compute_checksum;
pub use config::{DeviceConfig, OversizePolicy};
pub use device::{Exchange, Outcome, RazerDevice};
pub use error::ProtocolError;
pub use report::{Report, Status, TransactionId};
pub use transport::{ControlRequest, ReportRead, SettleDelay, Transport};
pub use usb::NusbTransport;
