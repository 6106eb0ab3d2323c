//! Integration tests for knx-ip-node
//!
//! Everything runs against `MockTransport` and `MemoryStorage`, so no
//! network or flash is needed:
//!
//! ```bash
//! cargo test --test integration_test
//! ```

use std::cell::RefCell;
use std::rc::Rc;

use knx_ip_node::config::CONFIG_SPACE;
use knx_ip_node::net::MockTransport;
use knx_ip_node::persistence::{MemoryStorage, KEY_MAGIC, NAMESPACE};
use knx_ip_node::protocol::constants::MAX_FRAME_SIZE;
use knx_ip_node::settings::DeviceSettings;
use knx_ip_node::{
    ga, CommandType, DeliveryMode, GroupAddress, IndividualAddress, KnxDevice, KnxError, OptionEntry,
    PollOutcome, Telegram, TelegramBuilder,
};

const SENSOR: IndividualAddress = IndividualAddress::pack(1, 1, 20);

/// Encode one routing indication as another device on the bus would.
fn bus_frame(destination: GroupAddress, command: CommandType, payload: &[u8]) -> Vec<u8> {
    let mut buf = [0u8; MAX_FRAME_SIZE];
    let len = TelegramBuilder::new(SENSOR, destination)
        .command(command)
        .payload(payload)
        .build_into(&mut buf)
        .unwrap();
    buf[..len].to_vec()
}

type CallLog = Rc<RefCell<Vec<&'static str>>>;

/// Device with callbacks A and B both bound to 10/6/5, A first.
fn device_with_duplicate_bindings(delivery: DeliveryMode) -> (KnxDevice<MockTransport>, CallLog) {
    let settings = DeviceSettings {
        delivery,
        ..DeviceSettings::default()
    };
    let mut device = KnxDevice::with_settings(MockTransport::new(), &settings);
    let log = CallLog::default();

    for tag in ["A", "B"] {
        let sink = Rc::clone(&log);
        let id = device
            .register_callback(tag, move |_| sink.borrow_mut().push(tag), None)
            .unwrap();
        device.bind(id, ga!(10 / 6 / 5)).unwrap();
    }

    (device, log)
}

// =============================================================================
// Wire format
// =============================================================================

#[test]
fn test_round_trip_every_command_and_length() {
    for command in CommandType::ALL {
        for len in 1..=64usize {
            let mut payload: Vec<u8> = (0..len as u8).map(|i| i.wrapping_mul(37)).collect();
            // top bits of byte 0 belong to the command
            payload[0] = 0x2A;
            let frame = bus_frame(ga!(3 / 4 / 5), command, &payload);
            assert_eq!(frame.len(), 17 + len);

            let telegram = Telegram::parse(&frame).unwrap();
            assert_eq!(telegram.command, command, "{command:?} len {len}");
            assert_eq!(telegram.source, SENSOR);
            assert_eq!(telegram.destination, ga!(3 / 4 / 5));
            assert_eq!(telegram.payload.as_slice(), payload.as_slice());
        }
    }
}

#[test]
fn test_sixty_five_byte_payload_refused() {
    let mut buf = [0u8; MAX_FRAME_SIZE];
    let err = TelegramBuilder::new(SENSOR, ga!(1 / 1 / 1))
        .payload(&[0u8; 65])
        .build_into(&mut buf)
        .unwrap_err();
    assert!(matches!(err, KnxError::Protocol(e) if e.is_payload_too_large()));
}

#[test]
fn test_device_output_is_parseable() {
    let mut device = KnxDevice::new(MockTransport::new());
    device.set_physical_address(IndividualAddress::pack(1, 1, 3));
    device.write(ga!(1 / 0 / 7), &knx_ip_node::KnxValue::Text("hello")).unwrap();

    let frame = device.transport().last_sent().unwrap();
    let telegram = Telegram::parse(frame).unwrap();
    assert_eq!(telegram.source, IndividualAddress::pack(1, 1, 3));
    assert_eq!(telegram.as_text().unwrap(), "hello");
}

// =============================================================================
// Dispatch
// =============================================================================

#[test]
fn test_single_delivery_first_binding_wins() {
    let (mut device, log) = device_with_duplicate_bindings(DeliveryMode::Single);
    device
        .transport_mut()
        .push_inbound(bus_frame(ga!(10 / 6 / 5), CommandType::Write, &[0x01]));

    assert_eq!(device.poll().unwrap(), PollOutcome::Dispatched(1));
    assert_eq!(*log.borrow(), ["A"]);
}

#[test]
fn test_multiple_delivery_in_binding_order() {
    let (mut device, log) = device_with_duplicate_bindings(DeliveryMode::Multiple);
    device
        .transport_mut()
        .push_inbound(bus_frame(ga!(10 / 6 / 5), CommandType::Write, &[0x01]));

    assert_eq!(device.poll().unwrap(), PollOutcome::Dispatched(2));
    assert_eq!(*log.borrow(), ["A", "B"]);
}

#[test]
fn test_rejection_is_not_fatal() {
    let (mut device, log) = device_with_duplicate_bindings(DeliveryMode::Single);

    let mut wrong_service = bus_frame(ga!(10 / 6 / 5), CommandType::Write, &[0x01]);
    wrong_service[2..4].copy_from_slice(&[0x04, 0x20]);
    device.transport_mut().push_inbound(wrong_service);
    device
        .transport_mut()
        .push_inbound(bus_frame(ga!(10 / 6 / 5), CommandType::Write, &[0x01]));

    assert_eq!(device.poll().unwrap(), PollOutcome::Rejected);
    assert_eq!(device.poll().unwrap(), PollOutcome::Dispatched(1));
    assert_eq!(device.poll().unwrap(), PollOutcome::Idle);

    assert_eq!(*log.borrow(), ["A"]);
    let diag = device.diagnostics();
    assert_eq!((diag.received, diag.rejected, diag.dispatched), (2, 1, 1));
}

#[test]
fn test_conditional_callback_skipped_in_multiple_mode() {
    let settings = DeviceSettings {
        delivery: DeliveryMode::Multiple,
        ..DeviceSettings::default()
    };
    let mut device = KnxDevice::with_settings(MockTransport::new(), &settings);
    let log = CallLog::default();

    let sink = Rc::clone(&log);
    let off = device
        .register_callback("off", move |_| sink.borrow_mut().push("off"), Some(Box::new(|| false)))
        .unwrap();
    let sink = Rc::clone(&log);
    let on = device
        .register_callback("on", move |_| sink.borrow_mut().push("on"), None)
        .unwrap();
    device.bind(off, ga!(2 / 2 / 2)).unwrap();
    device.bind(on, ga!(2 / 2 / 2)).unwrap();

    device
        .transport_mut()
        .push_inbound(bus_frame(ga!(2 / 2 / 2), CommandType::Write, &[0x00]));
    device.poll_all().unwrap();

    assert_eq!(*log.borrow(), ["on"]);
    assert!(!device.registry().is_callback_enabled(off));
}

// =============================================================================
// Capacity ceilings
// =============================================================================

#[test]
fn test_capacity_ceilings_leave_state_intact() {
    let mut device = KnxDevice::new(MockTransport::new());

    for i in 0..20 {
        device.register_bool(&format!("flag{i}"), i % 2 == 0, None).unwrap();
    }
    let arena_before = *device.config().as_bytes();
    assert!(device.register_int("one too many", 1, None).is_err());
    assert_eq!(device.config().len(), 20);
    assert_eq!(device.config().as_bytes(), &arena_before);

    let mut ids = Vec::new();
    for i in 0..10u16 {
        let id = device.register_callback("cb", |_| {}, None).unwrap();
        device.bind(id, GroupAddress::from(0x0100 + i)).unwrap();
        ids.push(id);
    }
    let bindings_before = device.registry().bindings().to_vec();

    let err = device.register_callback("eleventh", |_| {}, None).unwrap_err();
    assert!(matches!(err, KnxError::Registry(e) if e.is_too_many_callbacks()));
    let err = device.bind(ids[0], ga!(9 / 7 / 9)).unwrap_err();
    assert!(matches!(err, KnxError::Registry(e) if e.is_too_many_bindings()));

    assert_eq!(device.registry().callback_count(), 10);
    assert_eq!(device.registry().bindings(), bindings_before.as_slice());
}

#[test]
fn test_arena_space_ceiling() {
    let mut device = KnxDevice::new(MockTransport::new());
    // 1 + 254 bytes each
    device.register_string("a", 254, "", None).unwrap();
    device.register_string("b", 254, "", None).unwrap();
    assert_eq!(device.config().used_bytes(), 510);

    let err = device.register_int("c", 0, None).unwrap_err();
    assert!(matches!(err, KnxError::Config(e) if e.is_out_of_space()));
    let id = device.register_bool("d", true, None).unwrap();
    assert_eq!(device.config().used_bytes(), CONFIG_SPACE);
    assert!(device.config().get_bool(id));
}

// =============================================================================
// Persistence
// =============================================================================

static MODES: [OptionEntry; 2] = [OptionEntry::new("eco", 1), OptionEntry::new("comfort", 2)];

fn configured_device() -> KnxDevice<MockTransport> {
    let mut device = KnxDevice::new(MockTransport::new());
    let cb = device.register_callback("thermostat", |_| {}, None).unwrap();
    device.register_string("room", 20, "living", None).unwrap();
    device.register_int("setpoint", 21, None).unwrap();
    device.register_options("mode", &MODES, 1, None).unwrap();
    device.register_group_address("feedback", None).unwrap();
    device.bind(cb, ga!(10 / 6 / 5)).unwrap();
    device
}

#[test]
fn test_corrupted_magic_leaves_arena_unchanged() {
    let mut storage = MemoryStorage::new();

    let mut saved = configured_device();
    let room = saved.config().find("room").unwrap();
    saved.config_mut().set_string(room, "attic").unwrap();
    saved.save(&mut storage).unwrap();

    storage.insert(NAMESPACE, KEY_MAGIC, &0x0123_4567_89AB_CDEFu64.to_be_bytes());

    let mut fresh = configured_device();
    let before = *fresh.config().as_bytes();
    let bindings_before = fresh.registry().bindings().to_vec();

    assert!(!fresh.load(&mut storage).unwrap());
    assert_eq!(fresh.config().as_bytes(), &before);
    assert_eq!(fresh.registry().bindings(), bindings_before.as_slice());
    assert_eq!(fresh.config().get_string(room), "living");
}

#[test]
fn test_persistence_round_trip() {
    let mut storage = MemoryStorage::new();

    let mut saved = configured_device();
    let setpoint = saved.config().find("setpoint").unwrap();
    let mode = saved.config().find("mode").unwrap();
    let feedback = saved.config().find("feedback").unwrap();
    saved.config_mut().set_int(setpoint, -5).unwrap();
    saved.config_mut().set_option(mode, 2).unwrap();
    saved.config_mut().set_group_address(feedback, ga!(10 / 6 / 6)).unwrap();
    saved.set_physical_address(IndividualAddress::pack(1, 1, 77));
    saved.save(&mut storage).unwrap();

    let mut restored = configured_device();
    assert!(restored.load(&mut storage).unwrap());
    assert_eq!(restored.config().get_int(setpoint), -5);
    assert_eq!(restored.config().get_option(mode), 2);
    assert_eq!(restored.config().get_group_address(feedback), ga!(10 / 6 / 6));
    assert_eq!(restored.physical_address(), IndividualAddress::pack(1, 1, 77));
    assert_eq!(restored.config().as_bytes(), saved.config().as_bytes());

    restored.config_mut().restore_defaults();
    assert_eq!(restored.config().get_int(setpoint), 21);
}
