use crate::constants::CONTROL_TIMEOUT;
use crate::transport::SettleDelay;
use std::time::Duration;

/// What to do with a response whose `data_size` exceeds the argument capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OversizePolicy {
    /// Clamp `data_size` to the capacity and report `Outcome::OversizedField`.
    #[default]
    Clamp,
    /// Discard the response and return `ProtocolError::OversizedField`.
    Reject,
}

/// Per-device parameters for the standard report path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceConfig {
    /// wIndex for request writes. Usually 0x02; some mice use 0x00.
    pub report_index: u16,
    /// wIndex for response reads.
    pub response_index: u16,
    pub settle: SettleDelay,
    pub oversize_policy: OversizePolicy,
    /// Recompute the checksum of every request before it is sent.
    pub stamp_checksum: bool,
    pub control_timeout: Duration,
}

impl DeviceConfig {
    pub fn with_index(mut self, index: u16) -> Self {
        self.report_index = index;
        self.response_index = index;
        self
    }

    pub fn with_settle(mut self, settle: SettleDelay) -> Self {
        self.settle = settle;
        self
    }

    pub fn with_oversize_policy(mut self, policy: OversizePolicy) -> Self {
        self.oversize_policy = policy;
        self
    }
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            report_index: 0x02,
            response_index: 0x02,
            settle: SettleDelay::from_micros(600, 800),
            oversize_policy: OversizePolicy::default(),
            stamp_checksum: true,
            control_timeout: CONTROL_TIMEOUT,
        }
    }
}
