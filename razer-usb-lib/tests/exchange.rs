//! Request/response exchange against a scripted transport

mod common;

use common::*;
use razer_usb_lib::{ProtocolError, SettleDelay, compute_checksum};
use std::time::Duration;

fn serial_request() -> Report {
    // Get serial: class 0x00, id 0x82, 0x16 argument bytes
    Report::new(0x00, 0x82, 0x16).with_transaction_id(0x1F)
}

#[test]
fn test_exchange_ok() {
    let request = serial_request();
    let reply = response_for(&request, 0x02, b"PM1234567890");
    let mut dev = device(FakeTransport::new().reply(Reply::Data(reply)));

    let exchange = dev.exchange(request).unwrap();
    assert!(exchange.is_ok(), "{:?}", exchange);
    assert!(matches!(exchange.outcome, Outcome::Ok));
    assert_eq!(exchange.response.status().to_string(), "successful");
    assert_eq!(exchange.response.arguments(), b"PM1234567890");

    let report = exchange.into_result().unwrap();
    assert_eq!(report.transaction_id, 0x1F);
}

#[test]
fn test_exchange_call_sequence() {
    let request = serial_request();
    let reply = response_for(&request, 0x02, &[]);
    let mut dev = device(FakeTransport::new().reply(Reply::Data(reply)));
    dev.exchange_with(0x03, request, 0x01, SettleDelay::from_micros(900, 1000))
        .unwrap();

    let calls = &dev.transport().calls;
    assert_eq!(calls.len(), 3);
    match &calls[0] {
        Call::ControlOut { request, data } => {
            assert_eq!(request.request, HID_REQ_SET_REPORT);
            assert_eq!(request.value, 0x300);
            assert_eq!(request.index, 0x03);
            assert_eq!(request.timeout, CONTROL_TIMEOUT);
            assert_eq!(data.len(), REPORT_LEN);
        }
        other => panic!("Expected control write first, got {:?}", other),
    }
    assert_eq!(calls[1], Call::Sleep(SettleDelay::from_micros(900, 1000)));
    match &calls[2] {
        Call::ControlIn { request, len } => {
            assert_eq!(request.request, HID_REQ_GET_REPORT);
            assert_eq!(request.value, 0x300);
            assert_eq!(request.index, 0x01);
            assert_eq!(*len, REPORT_LEN);
        }
        other => panic!("Expected control read last, got {:?}", other),
    }
}

#[test]
fn test_minimum_settle_delay_is_honored_without_maximum() {
    let request = serial_request();
    let reply = response_for(&request, 0x02, &[]);
    let settle = SettleDelay {
        min: Duration::from_micros(600),
        max: Duration::ZERO,
    };
    assert!(!settle.is_none());
    let mut dev = device(FakeTransport::new().reply(Reply::Data(reply)));
    dev.exchange_with(0x02, request, 0x02, settle).unwrap();

    let calls = &dev.transport().calls;
    assert_eq!(calls.len(), 3);
    assert!(matches!(calls[0], Call::ControlOut { .. }));
    assert_eq!(calls[1], Call::Sleep(settle));
    assert!(matches!(calls[2], Call::ControlIn { .. }));
}

#[test]
fn test_exchange_uses_configured_indices() {
    let request = serial_request();
    let reply = response_for(&request, 0x02, &[]);
    let transport = FakeTransport::new().reply(Reply::Data(reply));
    let config = DeviceConfig::default().with_index(0x00).with_settle(SettleDelay::NONE);
    let mut dev = RazerDevice::new(transport, config);
    dev.exchange(request).unwrap();

    let calls = &dev.transport().calls;
    // No settle delay configured, so no sleep between write and read.
    assert_eq!(calls.len(), 2);
    assert!(matches!(&calls[0], Call::ControlOut { request, .. } if request.index == 0x00));
    assert!(matches!(&calls[1], Call::ControlIn { request, .. } if request.index == 0x00));
}

#[test]
fn test_zero_transaction_id_is_never_sent() {
    let request = Report::new(0x03, 0x00, 0x03);
    assert_eq!(request.transaction_id, 0x00);
    let mut dev = device(FakeTransport::new().reply(Reply::Data(vec![0; REPORT_LEN])));
    dev.exchange(request).unwrap();

    let writes = dev.transport().control_writes();
    assert_eq!(writes[0][1], 0xFF);
}

#[test]
fn test_request_is_checksummed_on_the_wire() {
    let mut request = Report::new(0x02, 0x01, 0x02).with_transaction_id(0x1F);
    request.arguments[0] = 0x01;
    request.arguments[1] = 0x02;
    let mut dev = device(FakeTransport::new().reply(Reply::Data(vec![0; REPORT_LEN])));
    dev.exchange(request).unwrap();

    let wire = dev.transport().control_writes()[0].clone();
    assert_eq!(wire[1], 0x1F);
    assert_eq!(wire[4], 0x02);
    let xor = wire[2..88].iter().fold(0u8, |acc, b| acc ^ b);
    assert_eq!(wire[88], xor);
    assert_eq!(wire[88], compute_checksum(&request));
    assert_eq!(wire, hex_to_bytes(CHECKSUMMED_REQUEST_HEX));
}

#[test]
fn test_checksum_stamping_can_be_disabled() {
    let request = serial_request();
    let mut dev = device(FakeTransport::new().reply(Reply::Data(vec![0; REPORT_LEN])));
    dev.config_mut().stamp_checksum = false;
    dev.exchange(request).unwrap();

    assert_eq!(dev.transport().control_writes()[0][88], 0x00);
}

#[test]
fn test_short_response_is_invalid() {
    let request = serial_request();
    let reply = response_for(&request, 0x02, &[0x01]);
    let mut dev = device(FakeTransport::new().reply(Reply::Data(reply[..89].to_vec())));

    let exchange = dev.exchange(request).unwrap();
    match &exchange.outcome {
        Outcome::Invalid(ProtocolError::LengthMismatch { expected, actual }) => {
            assert_eq!(*expected, 90);
            assert_eq!(*actual, 89);
        }
        other => panic!("Expected Invalid(LengthMismatch), got {:?}", other),
    }
    assert!(exchange.write_error.is_none());
    // The partial payload is still available.
    assert_eq!(exchange.response.arguments(), &[0x01]);
    assert!(matches!(
        exchange.into_result(),
        Err(ProtocolError::LengthMismatch { .. })
    ));
}

#[test]
fn test_failed_read_is_invalid_not_fatal() {
    let mut dev = device(FakeTransport::new().reply(Reply::Fail(TransferError::Disconnected)));

    let exchange = dev.exchange(serial_request()).unwrap();
    assert!(matches!(
        exchange.outcome,
        Outcome::Invalid(ProtocolError::Io(TransferError::Disconnected))
    ));
    assert_eq!(exchange.response, Report::empty());
}

#[test]
fn test_write_failure_still_reads_response() {
    let request = serial_request();
    let reply = response_for(&request, 0x01, &[]);
    let transport = FakeTransport::new()
        .write_reply(WriteReply::Fail(TransferError::Stall))
        .reply(Reply::Data(reply));
    let mut dev = device(transport);

    let exchange = dev.exchange(request).unwrap();
    assert!(matches!(
        exchange.write_error,
        Some(ProtocolError::Io(TransferError::Stall))
    ));
    assert!(matches!(exchange.outcome, Outcome::Ok));
    assert_eq!(exchange.response.status, 0x01);
    assert!(!exchange.is_ok());

    let calls = &dev.transport().calls;
    assert!(matches!(calls[1], Call::Sleep(_)));
    assert!(matches!(calls[2], Call::ControlIn { .. }));
}

#[test]
fn test_short_write_is_length_mismatch() {
    let transport = FakeTransport::new()
        .write_reply(WriteReply::Short(64))
        .reply(Reply::Data(vec![0; REPORT_LEN]));
    let mut dev = device(transport);

    let exchange = dev.exchange(serial_request()).unwrap();
    assert!(matches!(
        exchange.write_error,
        Some(ProtocolError::LengthMismatch {
            expected: 90,
            actual: 64
        })
    ));
}

#[test]
fn test_oversized_data_size_is_clamped() {
    let request = serial_request();
    let mut reply = response_for(&request, 0x02, &[]);
    reply[4] = 200;
    let mut dev = device(FakeTransport::new().reply(Reply::Data(reply)));

    let exchange = dev.exchange(request).unwrap();
    match exchange.outcome {
        Outcome::OversizedField { value, capacity } => {
            assert_eq!(value, 200);
            assert_eq!(capacity, 80);
        }
        ref other => panic!("Expected OversizedField, got {:?}", other),
    }
    assert_eq!(exchange.response.data_size, 80);
    assert!(matches!(
        exchange.into_result(),
        Err(ProtocolError::OversizedField { value: 200, capacity: 80 })
    ));
}

#[test]
fn test_oversize_takes_precedence_over_short_read() {
    let mut reply = vec![0u8; 89];
    reply[4] = 0xFF;
    let mut dev = device(FakeTransport::new().reply(Reply::Data(reply)));

    let exchange = dev.exchange(serial_request()).unwrap();
    assert!(matches!(
        exchange.outcome,
        Outcome::OversizedField { value: 0xFF, .. }
    ));
}

#[test]
fn test_oversized_data_size_rejected_by_policy() {
    let mut reply = vec![0u8; REPORT_LEN];
    reply[4] = 81;
    let config = DeviceConfig::default().with_oversize_policy(OversizePolicy::Reject);
    let mut dev = RazerDevice::new(FakeTransport::new().reply(Reply::Data(reply)), config);

    match dev.exchange(serial_request()) {
        Err(ProtocolError::OversizedField { value, capacity }) => {
            assert_eq!(value, 81);
            assert_eq!(capacity, 80);
        }
        other => panic!("Expected OversizedField error, got {:?}", other),
    }
}

#[test]
fn test_data_size_at_capacity_is_accepted() {
    let mut reply = vec![0u8; REPORT_LEN];
    reply[4] = 80;
    let mut dev = device(FakeTransport::new().reply(Reply::Data(reply)));

    let exchange = dev.exchange(serial_request()).unwrap();
    assert!(matches!(exchange.outcome, Outcome::Ok));
    assert_eq!(exchange.response.arguments().len(), 80);
}

#[test]
fn test_loopback_round_trip() {
    let request = Report::new(0x0F, 0x02, 0)
        .with_arguments(&[0x01, 0x05, 0x03, 0x00, 0xFF, 0x00])
        .with_transaction_id(0x3F)
        .with_checksum();
    let mut dev = device(FakeTransport::new().reply(Reply::Data(request.to_bytes().to_vec())));

    let exchange = dev.exchange(request).unwrap();
    assert_eq!(exchange.response, request);
    assert!(exchange.response.checksum_valid());
}

#[test]
fn test_send_writes_without_reading() {
    let mut dev = device(FakeTransport::new());
    dev.send(Report::new(0x03, 0x03, 0x03).with_arguments(&[0x01, 0x05, 0xFF]))
        .unwrap();

    let calls = &dev.transport().calls;
    assert_eq!(calls.len(), 2);
    assert!(matches!(calls[1], Call::Sleep(_)));
    let wire = dev.transport().control_writes()[0].clone();
    assert_eq!(wire[1], 0xFF);
    assert_eq!(&wire[7..10], &[0x01, 0x05, 0xFF]);
}
