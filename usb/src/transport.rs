use std::time::Duration;

use log::debug;
use rusb::{DeviceHandle, UsbContext};

use crate::endpoint::{Direction, EndpointAddress};
use crate::error::{DeviceError, ResolutionError};

/// The opaque USB boundary the protocol layer operates through.
///
/// This crate never opens a physical device itself; callers hand it a
/// transport built around an already-open handle. Reads and writes take a
/// *resolved* endpoint address, obtained from [`Transport::resolve`].
pub trait Transport: Send + Sync {
    /// Detach any conflicting kernel driver and claim exclusive access to
    /// `interface`. Claims are released when the transport is dropped.
    fn claim(&mut self, interface: u8) -> Result<(), DeviceError>;

    /// Look up the concrete endpoint address for `endpoint` on the live
    /// device's descriptor table.
    fn resolve(&self, endpoint: &EndpointAddress) -> Result<u8, ResolutionError>;

    /// Interrupt read. A zero timeout blocks until the device produces data
    /// or disconnects.
    fn read(&self, address: u8, buf: &mut [u8], timeout: Duration) -> Result<usize, rusb::Error>;

    /// Interrupt write.
    fn write(&self, address: u8, data: &[u8], timeout: Duration) -> Result<usize, rusb::Error>;
}

/// `rusb`-backed transport over an open device handle.
pub struct UsbTransport<T: UsbContext> {
    handle: DeviceHandle<T>,
    claimed: Vec<u8>,
}

impl<T: UsbContext> UsbTransport<T> {
    pub fn new(handle: DeviceHandle<T>) -> Self {
        Self {
            handle,
            claimed: Vec::new(),
        }
    }
}

impl<T: UsbContext> Transport for UsbTransport<T> {
    fn claim(&mut self, interface: u8) -> Result<(), DeviceError> {
        // Not supported on every platform; claiming decides, this only
        // spares a manual detach where the kernel can do it for us.
        if let Err(error) = self.handle.set_auto_detach_kernel_driver(true) {
            debug!("Kernel driver auto-detach unavailable: {}", error);
        }

        self.handle
            .claim_interface(interface)
            .map_err(|source| DeviceError::ClaimFailed { interface, source })?;
        self.claimed.push(interface);
        Ok(())
    }

    fn resolve(&self, endpoint: &EndpointAddress) -> Result<u8, ResolutionError> {
        let device = self.handle.device();
        let config = device
            .active_config_descriptor()
            .map_err(ResolutionError::Descriptors)?;

        let interface = config
            .interfaces()
            .find(|interface| interface.number() == endpoint.interface)
            .and_then(|interface| interface.descriptors().next())
            .ok_or(ResolutionError::MissingInterface {
                interface: endpoint.interface,
            })?;

        let direction = match endpoint.direction {
            Direction::In => rusb::Direction::In,
            Direction::Out => rusb::Direction::Out,
        };

        interface
            .endpoint_descriptors()
            .filter(|descriptor| descriptor.direction() == direction)
            .nth(endpoint.endpoint as usize)
            .map(|descriptor| descriptor.address())
            .ok_or(ResolutionError::MissingEndpoint {
                interface: endpoint.interface,
                endpoint: endpoint.endpoint,
                direction: endpoint.direction,
            })
    }

    fn read(&self, address: u8, buf: &mut [u8], timeout: Duration) -> Result<usize, rusb::Error> {
        self.handle.read_interrupt(address, buf, timeout)
    }

    fn write(&self, address: u8, data: &[u8], timeout: Duration) -> Result<usize, rusb::Error> {
        self.handle.write_interrupt(address, data, timeout)
    }
}

impl<T: UsbContext> Drop for UsbTransport<T> {
    fn drop(&mut self) {
        for interface in self.claimed.drain(..) {
            if let Err(error) = self.handle.release_interface(interface) {
                debug!("Unable to release interface {}: {}", interface, error);
            }
        }
    }
}
