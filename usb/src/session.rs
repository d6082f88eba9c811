use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use arctis_types::ChatMixState;
use log::{debug, info, warn};
use tokio::sync::mpsc::{self, Receiver, Sender};
use tokio::task;

use crate::commands::Command;
use crate::device::DeviceManager;
use crate::endpoint::EndpointAddress;
use crate::error::DeviceError;
use crate::transport::Transport;

const WRITE_TIMEOUT: Duration = Duration::from_secs(1);

/// Monitor reads wake up on this tick to observe the stop flag; an expired
/// tick is not a fault, unlike a timeout during initialization.
const READ_TICK: Duration = Duration::from_secs(1);

/// Lifecycle of a device session.
///
/// `Ready` is only ever left by tearing the whole session down; a failed
/// bring-up drops back to `NotInitialized` so the caller can re-run the
/// entire sequence from scratch. The protocol defines no partial-init
/// recovery.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SessionState {
    NotInitialized,
    Initializing,
    Ready,
}

/// One claimed device: a driver plus the transport it talks through.
///
/// `initialize` must complete before `run` spawns any read loop; reports are
/// dispatched from a single task, so the driver's mix state has exactly one
/// writer.
pub struct Session<T: Transport> {
    driver: Box<dyn DeviceManager>,
    transport: T,
    state: SessionState,
}

impl<T: Transport + 'static> Session<T> {
    pub fn new(driver: Box<dyn DeviceManager>, transport: T) -> Self {
        Self {
            driver,
            transport,
            state: SessionState::NotInitialized,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn driver(&self) -> &dyn DeviceManager {
        self.driver.as_ref()
    }

    /// Driver access for settings reads and mutations. Callers running
    /// their own loops serialise on the session itself.
    pub fn driver_mut(&mut self) -> &mut dyn DeviceManager {
        self.driver.as_mut()
    }

    /// Run the one-time bring-up sequence. Must complete (or fail) before
    /// any read loop goes live.
    pub fn initialize(&mut self) -> Result<(), DeviceError> {
        if self.state != SessionState::NotInitialized {
            return Err(DeviceError::AlreadyInitialized);
        }

        self.state = SessionState::Initializing;
        match self.driver.initialize(&mut self.transport) {
            Ok(()) => {
                info!("{}: initialized", self.driver.name());
                self.state = SessionState::Ready;
                Ok(())
            }
            Err(error) => {
                self.state = SessionState::NotInitialized;
                Err(error)
            }
        }
    }

    /// Ask the device for a full status snapshot. The report arrives on the
    /// monitored endpoint like any other; nothing is read here.
    pub fn request_status(&self) -> Result<(), DeviceError> {
        if self.state != SessionState::Ready {
            return Err(DeviceError::NotReady);
        }

        let (endpoint, command) = self.driver.status_request();
        let address = self.transport.resolve(&endpoint)?;
        write_frame(&self.transport, address, &command, self.driver.frame_size())
    }

    /// Spawn one blocking read loop per monitored endpoint and dispatch
    /// until a fatal transport error or until every consumer hangs up.
    ///
    /// Reports on the same endpoint are handled in arrival order; across
    /// endpoints there is no ordering guarantee. Commands arriving on
    /// `commands` (settings mutations, status requests) are written padded
    /// to the device's frame size. On return the transport is dropped,
    /// which releases the interface claim whichever path triggered the
    /// teardown.
    pub async fn run(
        self,
        mut commands: Receiver<Command>,
        states: Sender<ChatMixState>,
    ) -> Result<(), DeviceError> {
        if self.state != SessionState::Ready {
            return Err(DeviceError::NotReady);
        }

        let mut driver = self.driver;
        let frame_size = driver.frame_size();

        let (command_endpoint, _) = driver.status_request();
        let command_address = self.transport.resolve(&command_endpoint)?;

        // Resolve every monitored endpoint before spawning anything.
        let mut monitored = Vec::new();
        for endpoint in driver.endpoints_to_monitor() {
            let address = self.transport.resolve(&endpoint)?;
            monitored.push((endpoint, address));
        }

        let transport = Arc::new(self.transport);
        let stopping = Arc::new(AtomicBool::new(false));
        let (report_tx, mut reports) = mpsc::channel::<(EndpointAddress, Vec<u8>)>(32);
        let (error_tx, mut errors) = mpsc::channel::<DeviceError>(1);

        let mut readers = Vec::with_capacity(monitored.len());
        for (endpoint, address) in monitored {
            let transport = transport.clone();
            let stopping = stopping.clone();
            let report_tx = report_tx.clone();
            let error_tx = error_tx.clone();

            readers.push(task::spawn_blocking(move || {
                let mut buf = vec![0u8; frame_size];
                while !stopping.load(Ordering::Relaxed) {
                    match transport.read(address, &mut buf, READ_TICK) {
                        Ok(len) => {
                            if report_tx.blocking_send((endpoint, buf[..len].to_vec())).is_err() {
                                // Dispatcher is gone, session is over.
                                break;
                            }
                        }
                        Err(rusb::Error::Timeout) => continue,
                        Err(error) => {
                            stopping.store(true, Ordering::Relaxed);
                            let _ = error_tx.blocking_send(DeviceError::UsbError(error));
                            break;
                        }
                    }
                }
            }));
        }
        drop(report_tx);
        drop(error_tx);

        let result = loop {
            // Biased so queued reports drain, in arrival order, before a
            // reader's terminal error tears the session down.
            tokio::select! {
                biased;
                Some((endpoint, data)) = reports.recv() => {
                    match driver.handle_input(&data, &endpoint) {
                        Ok(state) => {
                            if states.send(state).await.is_err() {
                                debug!("State consumer hung up, stopping session");
                                break Ok(());
                            }
                        }
                        // Non-fatal by design: the report is dropped and
                        // prior state stands.
                        Err(violation) => warn!("{}: dropped report: {}", driver.name(), violation),
                    }
                }
                Some(command) = commands.recv() => {
                    if let Err(error) =
                        write_frame(transport.as_ref(), command_address, &command, frame_size)
                    {
                        break Err(error);
                    }
                }
                Some(error) = errors.recv() => break Err(error),
                else => break Ok(()),
            }
        };

        stopping.store(true, Ordering::Relaxed);
        for reader in readers {
            let _ = reader.await;
        }

        result
    }
}

fn write_frame<T: Transport + ?Sized>(
    transport: &T,
    address: u8,
    command: &Command,
    frame_size: usize,
) -> Result<(), DeviceError> {
    let frame = command.padded(frame_size);
    let sent = transport.write(address, &frame, WRITE_TIMEOUT)?;
    if sent < frame.len() {
        return Err(DeviceError::ShortWrite {
            expected: frame.len(),
            sent,
        });
    }
    Ok(())
}
