#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use strum::Display;

#[derive(Copy, Clone, Debug, Display, PartialEq, Eq)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum OnOff {
    Off,
    On,
}

/// Bluetooth auto-mute behaviour while a call is active. The middle setting
/// ducks playback by 12dB instead of muting it outright.
#[derive(Copy, Clone, Debug, Display, PartialEq, Eq)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum BluetoothAutoMute {
    Off,
    #[strum(serialize = "-12dB")]
    Minus12Db,
    On,
}

#[derive(Copy, Clone, Debug, Display, PartialEq, Eq)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum BluetoothConnection {
    Off,
    Connected,
    Disconnected,
}

#[derive(Copy, Clone, Debug, Display, PartialEq, Eq)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum MicStatus {
    Unmuted,
    Muted,
}

#[derive(Copy, Clone, Debug, Display, PartialEq, Eq)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum NoiseCancelling {
    Off,
    Transparent,
    On,
}

/// 2.4GHz link mode: lower latency against longer reach.
#[derive(Copy, Clone, Debug, Display, PartialEq, Eq)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum WirelessMode {
    Speed,
    Range,
}

#[derive(Copy, Clone, Debug, Display, PartialEq, Eq)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum PairingState {
    NotPaired,
    PairedOffline,
    Connected,
}

#[derive(Copy, Clone, Debug, Display, PartialEq, Eq)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum PowerState {
    Offline,
    CableCharging,
    Online,
}

/// A decoded status field, keeping the wire byte alongside its
/// interpretation for diagnostics.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StatusValue<T> {
    pub raw: u8,
    pub value: T,
}

impl<T> StatusValue<T> {
    pub fn new(raw: u8, value: T) -> Self {
        Self { raw, value }
    }
}

/// Full decoded headset state, produced atomically from a single status
/// report. Fields are declared in wire order; never partially updated.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DeviceStatus {
    pub bluetooth_powerup_state: StatusValue<OnOff>,
    pub bluetooth_auto_mute: StatusValue<BluetoothAutoMute>,
    pub bluetooth_power_status: StatusValue<OnOff>,
    pub bluetooth_connection: StatusValue<BluetoothConnection>,
    pub headset_battery_charge: StatusValue<f64>,
    pub charge_slot_battery_charge: StatusValue<f64>,
    pub transparent_noise_cancelling_level: StatusValue<u8>,
    pub mic_status: StatusValue<MicStatus>,
    pub noise_cancelling: StatusValue<NoiseCancelling>,
    pub mic_led_brightness: StatusValue<f64>,
    pub auto_off_time_minutes: StatusValue<u16>,
    pub wireless_mode: StatusValue<WirelessMode>,
    pub wireless_pairing: StatusValue<PairingState>,
    pub headset_power_status: StatusValue<PowerState>,
}

/// One row of [`DeviceStatus::fields`]: field name, wire byte and rendered
/// interpretation, for presentation layers that treat the status as an
/// ordered name/value listing.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StatusField {
    pub name: &'static str,
    pub raw: u8,
    pub display: String,
}

impl DeviceStatus {
    /// The status as an ordered field listing, in wire order.
    pub fn fields(&self) -> Vec<StatusField> {
        fn field<T: std::fmt::Display>(name: &'static str, value: &StatusValue<T>) -> StatusField {
            StatusField {
                name,
                raw: value.raw,
                display: value.value.to_string(),
            }
        }

        vec![
            field("bluetooth_powerup_state", &self.bluetooth_powerup_state),
            field("bluetooth_auto_mute", &self.bluetooth_auto_mute),
            field("bluetooth_power_status", &self.bluetooth_power_status),
            field("bluetooth_connection", &self.bluetooth_connection),
            field("headset_battery_charge", &self.headset_battery_charge),
            field("charge_slot_battery_charge", &self.charge_slot_battery_charge),
            field(
                "transparent_noise_cancelling_level",
                &self.transparent_noise_cancelling_level,
            ),
            field("mic_status", &self.mic_status),
            field("noise_cancelling", &self.noise_cancelling),
            field("mic_led_brightness", &self.mic_led_brightness),
            field("auto_off_time_minutes", &self.auto_off_time_minutes),
            field("wireless_mode", &self.wireless_mode),
            field("wireless_pairing", &self.wireless_pairing),
            field("headset_power_status", &self.headset_power_status),
        ]
    }
}

/// The live chat/game mix as of the last input report.
///
/// Mix fractions are last-seen-wins and persist between reports; volumes are
/// full scale unless the device says otherwise. `device_status` is only
/// attached on reports that carried a full status snapshot.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ChatMixState {
    pub game_volume: f64,
    pub chat_volume: f64,
    pub game_mix: f64,
    pub chat_mix: f64,
    pub device_status: Option<DeviceStatus>,
}

impl Default for ChatMixState {
    fn default() -> Self {
        Self {
            game_volume: 1.0,
            chat_volume: 1.0,
            game_mix: 1.0,
            chat_mix: 1.0,
            device_status: None,
        }
    }
}
