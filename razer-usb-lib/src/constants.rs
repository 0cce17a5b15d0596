// Protocol constants for the Razer report protocol

use std::time::Duration;

/// Size of a standard report on the wire (90 bytes)
pub const REPORT_LEN: usize = 90;

/// Capacity of the report `arguments` field
pub const ARGUMENTS_LEN: usize = 80;

/// Offset of the first argument byte
pub const ARGUMENTS_OFFSET: usize = 7;

/// Offset of the checksum byte
pub const CHECKSUM_OFFSET: usize = 88;

/// First byte covered by the checksum (skips status and transaction id)
pub const CHECKSUM_START: usize = 2;

/// HID class request: SET_REPORT
pub const HID_REQ_SET_REPORT: u8 = 0x09;

/// HID class request: GET_REPORT
pub const HID_REQ_GET_REPORT: u8 = 0x01;

/// wValue used for every report transfer (feature report, id 0)
pub const REPORT_VALUE: u16 = 0x300;

/// wIndex used for ARGB streaming frames
pub const ARGB_REPORT_INDEX: u16 = 0x01;

/// Channels below this threshold use `ARGB_REPORT_ID_LOW`
pub const ARGB_CHANNEL_THRESHOLD: u8 = 5;

/// ARGB report id for channels 0..5
pub const ARGB_REPORT_ID_LOW: u8 = 0x04;

/// ARGB report id for channels 5 and above
pub const ARGB_REPORT_ID_HIGH: u8 = 0x84;

/// Capacity of the ARGB `color_data` field (105 RGB triples)
pub const ARGB_COLOR_CAPACITY: usize = 315;

/// Size of an ARGB frame on the wire
pub const ARGB_FRAME_LEN: usize = 5 + ARGB_COLOR_CAPACITY;

/// Bytes per LED in ARGB color data
pub const BYTES_PER_LED: usize = 3;

/// Bulk OUT endpoint used by the alternate transport path
pub const BULK_ENDPOINT_OUT: u8 = 0x06;

/// Bulk IN endpoint used by the alternate transport path
pub const BULK_ENDPOINT_IN: u8 = 0x86;

/// Timeout for bulk transfers
pub const BULK_TIMEOUT: Duration = Duration::from_millis(1000);

/// Default timeout for control transfers
pub const CONTROL_TIMEOUT: Duration = Duration::from_millis(5000);

/// Transaction id substituted for 0x00, which devices treat as invalid
pub const FALLBACK_TRANSACTION_ID: u8 = 0xFF;

/// Razer USB vendor id
pub const RAZER_VID: u16 = 0x1532;
