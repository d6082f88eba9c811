//! End-to-end exercises of the Nova Pro Wireless driver through the public
//! API, against a scripted transport standing in for the hardware.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use arctis_usb::commands::Command;
use arctis_usb::device::{self, nova_pro_wireless::PID_ARCTIS_NOVA_PRO_WIRELESS};
use arctis_usb::endpoint::{Direction, EndpointAddress};
use arctis_usb::error::{DeviceError, ResolutionError, SettingError};
use arctis_usb::session::{Session, SessionState};
use arctis_usb::settings::{DeviceSetting, SettingValue};
use arctis_usb::transport::Transport;

/// Everything the fake hardware observed, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Event {
    Claim(u8),
    Write(u8, Vec<u8>),
}

#[derive(Default)]
struct Inner {
    events: Mutex<Vec<Event>>,
    reads: Mutex<VecDeque<Result<Vec<u8>, rusb::Error>>>,
    resolvable: bool,
}

#[derive(Clone)]
struct FakeHeadset(Arc<Inner>);

impl FakeHeadset {
    fn new() -> Self {
        Self(Arc::new(Inner {
            resolvable: true,
            ..Inner::default()
        }))
    }

    fn unresolvable() -> Self {
        Self(Arc::new(Inner::default()))
    }

    fn ack_all_queries(&self) -> &Self {
        let mut reads = self.0.reads.lock().unwrap();
        // One acknowledgement per expects-response entry in the bring-up
        // table.
        for _ in 0..15 {
            reads.push_back(Ok(vec![0x06, 0x20, 0x00]));
        }
        self
    }

    fn drop_device(&self) {
        self.0
            .reads
            .lock()
            .unwrap()
            .push_back(Err(rusb::Error::NoDevice));
    }

    fn events(&self) -> Vec<Event> {
        self.0.events.lock().unwrap().clone()
    }

    fn writes(&self) -> Vec<Vec<u8>> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                Event::Write(_, frame) => Some(frame),
                Event::Claim(_) => None,
            })
            .collect()
    }
}

impl Transport for FakeHeadset {
    fn claim(&mut self, interface: u8) -> Result<(), DeviceError> {
        self.0.events.lock().unwrap().push(Event::Claim(interface));
        Ok(())
    }

    fn resolve(&self, endpoint: &EndpointAddress) -> Result<u8, ResolutionError> {
        if !self.0.resolvable {
            return Err(ResolutionError::MissingEndpoint {
                interface: endpoint.interface,
                endpoint: endpoint.endpoint,
                direction: endpoint.direction,
            });
        }
        Ok(match endpoint.direction {
            Direction::In => 0x80 | endpoint.interface,
            Direction::Out => endpoint.interface,
        })
    }

    fn read(&self, _address: u8, buf: &mut [u8], _timeout: Duration) -> Result<usize, rusb::Error> {
        match self.0.reads.lock().unwrap().pop_front() {
            Some(Ok(data)) => {
                buf[..data.len()].copy_from_slice(&data);
                Ok(data.len())
            }
            Some(Err(error)) => Err(error),
            None => Err(rusb::Error::Timeout),
        }
    }

    fn write(&self, address: u8, data: &[u8], _timeout: Duration) -> Result<usize, rusb::Error> {
        self.0
            .events
            .lock()
            .unwrap()
            .push(Event::Write(address, data.to_vec()));
        Ok(data.len())
    }
}

fn ready_session(headset: &FakeHeadset) -> Result<Session<FakeHeadset>> {
    let driver = device::for_product_id(PID_ARCTIS_NOVA_PRO_WIRELESS).expect("supported model");
    let mut session = Session::new(driver, headset.clone());
    session.initialize()?;
    Ok(session)
}

#[test]
fn initialization_replays_the_capture_in_order() -> Result<()> {
    let headset = FakeHeadset::new();
    headset.ack_all_queries();
    ready_session(&headset)?;

    let events = headset.events();
    assert_eq!(events[0], Event::Claim(7), "claim precedes the first write");

    let driver = device::for_product_id(PID_ARCTIS_NOVA_PRO_WIRELESS).unwrap();
    let expected: Vec<Vec<u8>> = driver
        .initialization_sequence()
        .iter()
        .map(|command| command.padded(driver.frame_size()))
        .collect();

    let writes = headset.writes();
    assert_eq!(writes, expected);

    // Spot-check the literal wire bytes: every frame is 91 bytes, zero
    // padded, starting from the first capture entry.
    assert!(writes.iter().all(|frame| frame.len() == 91));
    assert_eq!(&writes[0][..2], [0x06, 0x20]);
    assert!(writes[0][2..].iter().all(|&byte| byte == 0));
    assert_eq!(&writes[13][..5], [0x06, 0x33, 0x14, 0x14, 0x14]);
    Ok(())
}

#[test]
fn mismatched_firmware_fails_before_any_write() {
    let headset = FakeHeadset::unresolvable();
    let driver = device::for_product_id(PID_ARCTIS_NOVA_PRO_WIRELESS).unwrap();
    let mut session = Session::new(driver, headset.clone());

    let error = session.initialize().unwrap_err();
    assert!(matches!(
        error,
        DeviceError::Resolution(ResolutionError::MissingEndpoint { interface: 7, .. })
    ));
    assert_eq!(session.state(), SessionState::NotInitialized);
    assert!(headset.events().is_empty());
}

#[test]
fn aborted_initialization_stops_mid_sequence() {
    let headset = FakeHeadset::new();
    // Three acknowledgements, then the device goes away.
    {
        let mut reads = headset.0.reads.lock().unwrap();
        for _ in 0..3 {
            reads.push_back(Ok(vec![0x06, 0x20, 0x00]));
        }
        reads.push_back(Err(rusb::Error::NoDevice));
    }

    let driver = device::for_product_id(PID_ARCTIS_NOVA_PRO_WIRELESS).unwrap();
    let mut session = Session::new(driver, headset.clone());
    let error = session.initialize().unwrap_err();

    assert!(matches!(error, DeviceError::UsbError(rusb::Error::NoDevice)));
    // The fourth query's acknowledgement failed, so exactly four commands
    // made it onto the wire.
    assert_eq!(headset.writes().len(), 4);
}

#[test]
fn mix_and_status_reports_flow_through_the_driver() -> Result<()> {
    let headset = FakeHeadset::new();
    headset.ack_all_queries();
    let mut session = ready_session(&headset)?;

    let monitor = EndpointAddress::input(7, 0);
    let driver = session.driver_mut();

    let state = driver.handle_input(&[0x07, 0x45, 50, 75], &monitor).unwrap();
    assert_eq!(state.game_mix, 0.5);
    assert_eq!(state.chat_mix, 0.75);
    assert_eq!(state.game_volume, 1.0);
    assert_eq!(state.chat_volume, 1.0);
    assert!(state.device_status.is_none());

    let report = [
        0x06, 0xb0, 0x00, 0x01, 0x01, 0x01, 64, 64, 30, 0x00, 0x02, 50, 5, 0x01, 0x04, 0x02,
    ];
    let state = driver.handle_input(&report, &monitor).unwrap();
    let status = state.device_status.expect("snapshot attached");
    assert_eq!(status.headset_battery_charge.value, 8.0);
    assert_eq!(status.auto_off_time_minutes.value, 30);
    // The dial fractions from the earlier report still stand.
    assert_eq!(state.game_mix, 0.5);
    assert_eq!(state.chat_mix, 0.75);

    // A violating report leaves everything as it was.
    let mut bad = report;
    bad[12] = 7;
    assert!(driver.handle_input(&bad, &monitor).is_err());
    let state = driver.handle_input(&[0x00], &monitor).unwrap();
    assert_eq!(state.game_mix, 0.5);
    Ok(())
}

#[tokio::test]
async fn settings_round_trip_to_the_wire() -> Result<()> {
    let headset = FakeHeadset::new();
    headset.ack_all_queries();
    let mut session = ready_session(&headset)?;

    let sections = session.driver().configurable_settings(None);
    assert_eq!(sections.len(), 4);
    let keys: Vec<_> = sections
        .iter()
        .flat_map(|section| section.settings.iter().map(DeviceSetting::key))
        .collect();
    assert_eq!(
        keys,
        [
            "mic_volume",
            "mic_side_tone",
            "mic_gain",
            "anc_level",
            "pm_shutdown",
            "wireless_mode",
        ]
    );

    let command = session
        .driver_mut()
        .apply_setting("pm_shutdown", SettingValue::Slider(0x03))?;
    assert_eq!(command.bytes(), [0x06, 0xc1, 0x03]);

    // The mutation command goes out like any other frame; the queued
    // command is drained before the device drop tears the session down.
    let before = headset.writes().len();
    headset.drop_device();

    let (command_tx, command_rx) = tokio::sync::mpsc::channel::<Command>(1);
    let (state_tx, _states) = tokio::sync::mpsc::channel(1);
    command_tx.send(command).await.unwrap();

    let result = session.run(command_rx, state_tx).await;
    assert!(matches!(
        result,
        Err(DeviceError::UsbError(rusb::Error::NoDevice))
    ));

    let writes = headset.writes();
    assert_eq!(writes.len(), before + 1);
    assert_eq!(&writes[before][..3], [0x06, 0xc1, 0x03]);
    assert_eq!(writes[before].len(), 91);
    Ok(())
}

#[test]
fn anc_mutation_stays_unmapped() -> Result<()> {
    let headset = FakeHeadset::new();
    headset.ack_all_queries();
    let mut session = ready_session(&headset)?;

    assert_eq!(
        session
            .driver_mut()
            .apply_setting("anc_level", SettingValue::Slider(1)),
        Err(SettingError::Unmapped("anc_level"))
    );
    Ok(())
}
