use anyhow::{Context, Result};
use clap::Args;
use razer_usb_lib::constants::RAZER_VID;
use razer_usb_lib::{DeviceConfig, NusbTransport, OversizePolicy, RazerDevice, SettleDelay};
use std::num::ParseIntError;
use std::ops::Deref;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

/// Parse `0x1f`, `1f` or `0X1F` as hexadecimal.
pub fn parse_hex_u16(s: &str) -> Result<u16, ParseIntError> {
    let digits = s.trim_start_matches("0x").trim_start_matches("0X");
    u16::from_str_radix(digits, 16)
}

pub fn parse_hex_u8(s: &str) -> Result<u8, ParseIntError> {
    let digits = s.trim_start_matches("0x").trim_start_matches("0X");
    u8::from_str_radix(digits, 16)
}

/// Bytes given on the command line as hex, with optional spaces or colons.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HexBytes(pub Vec<u8>);

impl FromStr for HexBytes {
    type Err = hex::FromHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let cleaned: String = s.chars().filter(|c| !c.is_whitespace() && *c != ':').collect();
        hex::decode(cleaned).map(HexBytes)
    }
}

impl Deref for HexBytes {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.0
    }
}

/// Which device to open and how to talk to it.
#[derive(Args, Debug, Clone)]
pub struct DeviceArgs {
    /// USB vendor id (hex).
    #[arg(long, value_parser = parse_hex_u16, default_value = "1532")]
    pub vid: u16,
    /// USB product id (hex).
    #[arg(long, value_parser = parse_hex_u16)]
    pub pid: u16,
    /// Interface number to claim.
    #[arg(long, default_value_t = 0)]
    pub interface: u8,
    /// wIndex for request writes (hex).
    #[arg(long, value_parser = parse_hex_u16, default_value = "02")]
    pub report_index: u16,
    /// wIndex for response reads (hex). Defaults to the report index.
    #[arg(long, value_parser = parse_hex_u16)]
    pub response_index: Option<u16>,
    /// Minimum settle delay after a write, in microseconds.
    #[arg(long, default_value_t = 600)]
    pub settle_min_us: u64,
    /// Maximum settle delay after a write, in microseconds.
    #[arg(long, default_value_t = 800)]
    pub settle_max_us: u64,
    /// Control transfer timeout in milliseconds.
    #[arg(long, default_value_t = 5000)]
    pub timeout_ms: u64,
    /// Discard responses whose data_size overflows the arguments instead of clamping.
    #[arg(long)]
    pub reject_oversize: bool,
    /// Send requests with the checksum byte as given.
    #[arg(long)]
    pub no_checksum: bool,
}

impl DeviceArgs {
    pub fn config(&self) -> DeviceConfig {
        DeviceConfig {
            report_index: self.report_index,
            response_index: self.response_index.unwrap_or(self.report_index),
            settle: SettleDelay::from_micros(self.settle_min_us, self.settle_max_us.max(self.settle_min_us)),
            oversize_policy: if self.reject_oversize {
                OversizePolicy::Reject
            } else {
                OversizePolicy::Clamp
            },
            stamp_checksum: !self.no_checksum,
            control_timeout: Duration::from_millis(self.timeout_ms),
        }
    }

    pub fn open(&self) -> Result<RazerDevice<NusbTransport>> {
        if self.vid != RAZER_VID {
            info!("Vendor id {:04x} is not Razer's, continuing anyway", self.vid);
        }
        RazerDevice::open(self.vid, self.pid, self.interface, self.config())
            .with_context(|| format!("Failed to open {:04x}:{:04x}", self.vid, self.pid))
    }
}
