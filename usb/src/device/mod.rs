// Driver registry. Each supported model implements `DeviceManager`;
// discovery selects one by vendor/product id, so supporting a new model
// means adding a row here rather than touching dispatch logic.

pub mod base;
pub mod nova_pro_wireless;

pub use base::DeviceManager;

use nova_pro_wireless::{NovaProWireless, PID_ARCTIS_NOVA_PRO_WIRELESS};

/// SteelSeries USB vendor id.
pub const VID_STEELSERIES: u16 = 0x1038;

/// Build the driver for a product id, if the model is supported.
pub fn for_product_id(product_id: u16) -> Option<Box<dyn DeviceManager>> {
    match product_id {
        PID_ARCTIS_NOVA_PRO_WIRELESS => Some(Box::new(NovaProWireless::new())),
        _ => None,
    }
}

/// Bus location of a supported headset, as found during enumeration.
#[derive(Debug, Clone)]
pub struct ArctisDevice {
    pub bus_number: u8,
    pub address: u8,
    pub product_id: u16,
}

/// Enumerate supported SteelSeries devices currently on the bus. Opening
/// and claiming them stays with the caller.
pub fn find_devices() -> Vec<ArctisDevice> {
    let mut found = Vec::new();

    if let Ok(devices) = rusb::devices() {
        for device in devices.iter() {
            if let Ok(descriptor) = device.device_descriptor() {
                if descriptor.vendor_id() == VID_STEELSERIES
                    && for_product_id(descriptor.product_id()).is_some()
                {
                    found.push(ArctisDevice {
                        bus_number: device.bus_number(),
                        address: device.address(),
                        product_id: descriptor.product_id(),
                    });
                }
            }
        }
    }

    found
}
