use std::time::Duration;

use arctis_types::{ChatMixState, DeviceStatus};
use log::debug;

use crate::commands::Command;
use crate::endpoint::{Direction, EndpointAddress};
use crate::error::{DeviceError, ProtocolViolation, ResolutionError, SettingError};
use crate::settings::{SettingValue, SettingsSection};
use crate::transport::Transport;

const INIT_WRITE_TIMEOUT: Duration = Duration::from_secs(1);
const INIT_READ_TIMEOUT: Duration = Duration::from_secs(1);

/// The capability set every supported headset model implements.
///
/// One instance exists per connected device and owns that device's session
/// state (the chat-mix fractions, the last decoded status snapshot). All
/// mutation of that state happens through `handle_input` and
/// `apply_setting`; concurrent callers must serialise on the instance.
pub trait DeviceManager: Send {
    /// USB product id, matched together with [`VID_STEELSERIES`].
    ///
    /// [`VID_STEELSERIES`]: crate::device::VID_STEELSERIES
    fn product_id(&self) -> u16;

    /// Human-readable model name, used in log output.
    fn name(&self) -> &'static str;

    /// Input endpoints the caller must run read loops on.
    fn endpoints_to_monitor(&self) -> Vec<EndpointAddress>;

    /// Where and what to send to solicit a full status report on demand.
    /// The report itself arrives on a monitored endpoint.
    fn status_request(&self) -> (EndpointAddress, Command);

    /// Fixed transport frame size; every outbound command is zero-padded to
    /// this length before transmission.
    fn frame_size(&self) -> usize;

    /// The ordered one-time bring-up command table.
    fn initialization_sequence(&self) -> Vec<Command>;

    /// Run the bring-up sequence over `transport`, exactly once per session.
    ///
    /// Endpoints are resolved before anything is written, so a mismatched
    /// device fails with a [`ResolutionError`] without touching the wire.
    /// The command interface is then claimed exclusively, and the sequence
    /// is sent strictly in order with no batching; the device is a single
    /// stateful session and earlier exchanges bias later ones. For
    /// `expects_response` commands the acknowledgement is read and
    /// discarded before the next write. Any failure aborts the whole
    /// sequence; there is no partial-init retry.
    fn initialize(&mut self, transport: &mut dyn Transport) -> Result<(), DeviceError> {
        let (command_endpoint, _) = self.status_request();

        let out_address = transport.resolve(&command_endpoint)?;
        let ack_endpoint = self
            .endpoints_to_monitor()
            .into_iter()
            .find(|endpoint| {
                endpoint.interface == command_endpoint.interface
                    && endpoint.direction == Direction::In
            })
            .ok_or(ResolutionError::MissingEndpoint {
                interface: command_endpoint.interface,
                endpoint: 0,
                direction: Direction::In,
            })?;
        let ack_address = transport.resolve(&ack_endpoint)?;

        transport.claim(command_endpoint.interface)?;

        let frame_size = self.frame_size();
        let mut ack = vec![0u8; frame_size];
        for command in self.initialization_sequence() {
            let frame = command.padded(frame_size);
            let sent = transport.write(out_address, &frame, INIT_WRITE_TIMEOUT)?;
            if sent < frame.len() {
                return Err(DeviceError::ShortWrite {
                    expected: frame.len(),
                    sent,
                });
            }

            if command.expects_response() {
                // Response payloads are undocumented; they are read to keep
                // the device's command session in lockstep, then discarded.
                let received = transport.read(ack_address, &mut ack, INIT_READ_TIMEOUT)?;
                debug!(
                    "{}: discarding {} byte acknowledgement for {:02x?}",
                    self.name(),
                    received,
                    command.bytes()
                );
            }
        }

        Ok(())
    }

    /// Classify and decode one raw input report, returning the refreshed
    /// chat-mix state.
    ///
    /// Protocol violations are non-fatal: the report is dropped, prior mix
    /// state and status snapshot stay untouched. Unrecognized reports are
    /// debug-logged and answered with the unchanged state.
    fn handle_input(
        &mut self,
        data: &[u8],
        endpoint: &EndpointAddress,
    ) -> Result<ChatMixState, ProtocolViolation>;

    /// Build the settings catalog, grouped into sections.
    ///
    /// Catalogs are built fresh per request and are pure reads: the same
    /// `status` always yields the same catalog. Defaults are seeded from
    /// `status` where the status report carries the field, falling back to
    /// the driver's last decoded snapshot.
    fn configurable_settings(&self, status: Option<&DeviceStatus>) -> Vec<SettingsSection>;

    /// Translate a requested setting change into its protocol command.
    ///
    /// The returned command still has to be transmitted by the caller (or
    /// the session's command channel). The cached status snapshot is patched
    /// optimistically for fields the status report carries, so catalogs
    /// reflect intent before the hardware confirms it.
    fn apply_setting(&mut self, key: &str, value: SettingValue)
        -> Result<Command, SettingError>;
}
