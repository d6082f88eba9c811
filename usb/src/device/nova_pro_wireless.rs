//! SteelSeries Arctis Nova Pro Wireless, driven through its GameDAC Gen2
//! base station. Packets and sequencing were captured from the official
//! software via Wireshark; the status layout is cross-checked against
//! HeadsetControl's tables.

use arctis_types::{
    BluetoothAutoMute, BluetoothConnection, ChatMixState, DeviceStatus, MicStatus,
    NoiseCancelling, OnOff, PairingState, PowerState, StatusValue, WirelessMode,
};
use log::debug;

use crate::commands::Command;
use crate::device::base::DeviceManager;
use crate::endpoint::EndpointAddress;
use crate::error::{ProtocolViolation, SettingError};
use crate::settings::{
    DeviceSetting, SettingValue, SettingsSection, SliderSetting, ToggleSetting,
};

pub const PID_ARCTIS_NOVA_PRO_WIRELESS: u16 = 0x12e0;

/// The GameDAC's command and volume interface.
const CONTROL_INTERFACE: u8 = 7;

/// Commands are zero-padded to this frame size before transmission.
const FRAME_SIZE: usize = 91;

/// Inactivity shutdown codes to minutes. Codes above 6 do not exist; the
/// decoder treats them as a protocol violation rather than defaulting.
const INACTIVE_TIME_MINUTES: [u16; 7] = [0, 1, 5, 10, 15, 30, 60];

pub struct NovaProWireless {
    // Dial fractions survive between reports; None until the first mix
    // update arrives, rendered as full mix.
    game_mix: Option<f64>,
    chat_mix: Option<f64>,
    status: Option<DeviceStatus>,
}

impl NovaProWireless {
    pub fn new() -> Self {
        Self {
            game_mix: None,
            chat_mix: None,
            status: None,
        }
    }

    // Mutation commands, opcodes as captured during bring-up.

    /// Mic volume, 0x01 (mute) to 0x10.
    pub fn set_mic_volume(volume: u8) -> Command {
        Command::new([0x06, 0x37, volume], false)
    }

    /// Sidetone level: 0 (off), 1 (low), 2 (medium), 3 (high).
    pub fn set_sidetone(level: u8) -> Command {
        Command::new([0x06, 0x39, level], false)
    }

    /// Mic gain, low or high.
    pub fn set_mic_gain(high: bool) -> Command {
        Command::new([0x06, 0x27, if high { 0x02 } else { 0x01 }], false)
    }

    /// Inactivity shutdown, codes per [`INACTIVE_TIME_MINUTES`].
    pub fn set_inactive_time(code: u8) -> Command {
        Command::new([0x06, 0xc1, code], false)
    }

    /// 2.4G link mode.
    pub fn set_wireless_mode(mode: WirelessMode) -> Command {
        let byte = match mode {
            WirelessMode::Speed => 0x00,
            WirelessMode::Range => 0x01,
        };
        Command::new([0x06, 0xc3, byte], false)
    }

    fn mix_fraction(offset: usize, value: u8) -> Result<f64, ProtocolViolation> {
        if value > 100 {
            return Err(ProtocolViolation::MixValue { offset, value });
        }
        Ok(f64::from(value) / 100.0)
    }

    /// Decode one full 16-byte status snapshot.
    ///
    /// Offsets 13..=15 deliberately read their neighbours: pairing falls
    /// back to offset 13 == 0x04 for the paired-offline case, and power
    /// discriminates cable charging by re-reading offset 14. That is
    /// confirmed wire behaviour, not a decoding bug.
    fn decode_status(data: &[u8]) -> Result<DeviceStatus, ProtocolViolation> {
        let auto_off_code = data[12];
        let minutes = INACTIVE_TIME_MINUTES
            .get(auto_off_code as usize)
            .copied()
            .ok_or(ProtocolViolation::InactivityCode(auto_off_code))?;

        Ok(DeviceStatus {
            bluetooth_powerup_state: StatusValue::new(
                data[2],
                if data[2] == 0x00 { OnOff::Off } else { OnOff::On },
            ),
            bluetooth_auto_mute: StatusValue::new(
                data[3],
                match data[3] {
                    0x00 => BluetoothAutoMute::Off,
                    0x01 => BluetoothAutoMute::Minus12Db,
                    _ => BluetoothAutoMute::On,
                },
            ),
            // 0x01 means powered off here; the firmware inverts this flag.
            bluetooth_power_status: StatusValue::new(
                data[4],
                if data[4] == 0x01 { OnOff::Off } else { OnOff::On },
            ),
            bluetooth_connection: StatusValue::new(
                data[5],
                match data[5] {
                    0x00 => BluetoothConnection::Off,
                    0x01 => BluetoothConnection::Connected,
                    _ => BluetoothConnection::Disconnected,
                },
            ),
            headset_battery_charge: StatusValue::new(data[6], round2(f64::from(data[6]) / 8.0)),
            charge_slot_battery_charge: StatusValue::new(data[7], round2(f64::from(data[7]) / 8.0)),
            transparent_noise_cancelling_level: StatusValue::new(
                data[8],
                (f64::from(data[8]) / 10.0).round() as u8,
            ),
            mic_status: StatusValue::new(
                data[9],
                if data[9] == 0x00 {
                    MicStatus::Unmuted
                } else {
                    MicStatus::Muted
                },
            ),
            noise_cancelling: StatusValue::new(
                data[10],
                match data[10] {
                    0x00 => NoiseCancelling::Off,
                    0x01 => NoiseCancelling::Transparent,
                    _ => NoiseCancelling::On,
                },
            ),
            mic_led_brightness: StatusValue::new(data[11], f64::from(data[11]) / 10.0),
            auto_off_time_minutes: StatusValue::new(auto_off_code, minutes),
            wireless_mode: StatusValue::new(
                data[13],
                if data[13] == 0x00 {
                    WirelessMode::Speed
                } else {
                    WirelessMode::Range
                },
            ),
            wireless_pairing: StatusValue::new(
                data[14],
                if data[14] == 0x01 {
                    PairingState::NotPaired
                } else if data[13] == 0x04 {
                    PairingState::PairedOffline
                } else {
                    PairingState::Connected
                },
            ),
            headset_power_status: StatusValue::new(
                data[15],
                if data[15] == 0x01 {
                    PowerState::Offline
                } else if data[14] == 0x02 {
                    PowerState::CableCharging
                } else {
                    PowerState::Online
                },
            ),
        })
    }

    fn chat_mix_state(&self, device_status: Option<DeviceStatus>) -> ChatMixState {
        ChatMixState {
            // Playback volume is handled on the DAC itself.
            game_volume: 1.0,
            chat_volume: 1.0,
            game_mix: self.game_mix.unwrap_or(1.0),
            chat_mix: self.chat_mix.unwrap_or(1.0),
            device_status,
        }
    }
}

impl Default for NovaProWireless {
    fn default() -> Self {
        Self::new()
    }
}

impl DeviceManager for NovaProWireless {
    fn product_id(&self) -> u16 {
        PID_ARCTIS_NOVA_PRO_WIRELESS
    }

    fn name(&self) -> &'static str {
        "Arctis Nova Pro Wireless"
    }

    fn endpoints_to_monitor(&self) -> Vec<EndpointAddress> {
        vec![EndpointAddress::input(CONTROL_INTERFACE, 0)]
    }

    fn status_request(&self) -> (EndpointAddress, Command) {
        (
            EndpointAddress::output(CONTROL_INTERFACE, 0),
            Command::new([0x06, 0xb0], true),
        )
    }

    fn frame_size(&self) -> usize {
        FRAME_SIZE
    }

    fn initialization_sequence(&self) -> Vec<Command> {
        // Replayed exactly as captured from the official software bringing
        // up the GameDAC mixer; several entries remain opaque.
        vec![
            // Series of queries / responses
            Command::new([0x06, 0x20], true),
            Command::new([0x06, 0x20], true),
            Command::new([0x06, 0x10], true),
            Command::new([0x06, 0x10], true),
            Command::new([0x06, 0x10], true),
            Command::new([0x06, 0x3b], false), // Correction?
            Command::new([0x06, 0x8d, 0x01], true),
            Command::new([0x06, 0x20], true),
            Command::new([0x06, 0x20], true),
            Command::new([0x06, 0x20], true),
            Command::new([0x06, 0x80], true),
            Command::new([0x06, 0x3b], false), // Correction?
            // Burst of commands (device init?)
            Command::new([0x06, 0x8d, 0x01], false),
            Command::new([0x06, 0x33, 0x14, 0x14, 0x14], false), // Equalizer with 3 bands
            Command::new([0x06, 0xc3, 0x00], false), // 2.4G mode (0x00: speed, 0x01: range)
            Command::new([0x06, 0x2e, 0x00], false), // Equalizer preset 0
            Command::new([0x06, 0xc1, 0x05], false), // Inactive time, code 5 = 30 minutes
            Command::new([0x06, 0x85, 0x0a], false),
            Command::new([0x06, 0x37, 0x0a], false), // Mic volume
            Command::new([0x06, 0xb2], false),
            Command::new([0x06, 0x47, 0x64, 0x00, 0x64], false),
            Command::new([0x06, 0x83, 0x01], false),
            Command::new([0x06, 0x89, 0x00], false),
            Command::new([0x06, 0x27, 0x02], false), // Gain (0x01: low, 0x02: high)
            Command::new([0x06, 0xb3, 0x00], false),
            Command::new([0x06, 0x39, 0x00], false), // Sidetone off (0..=3)
            Command::new([0x06, 0xbf, 0x0a], false), // Lights at 10 of 10
            Command::new([0x06, 0x43, 0x01], false),
            Command::new([0x06, 0x69, 0x00], false),
            Command::new([0x06, 0x3b, 0x00], false),
            Command::new([0x06, 0x8d, 0x01], false),
            Command::new([0x06, 0x49, 0x01], false),
            Command::new([0x06, 0xb7, 0x00], false),
            // Another series of queries (confirmation?)
            Command::new([0x06, 0xb7, 0x00], true),
            Command::new([0x06, 0xb7, 0x00], true),
            Command::new([0x06, 0xb0, 0x00], true), // Full status readback
            Command::new([0x06, 0x20, 0x00], true),
            Command::new([0x06, 0xb7, 0x00], true),
        ]
    }

    fn handle_input(
        &mut self,
        data: &[u8],
        endpoint: &EndpointAddress,
    ) -> Result<ChatMixState, ProtocolViolation> {
        if *endpoint != EndpointAddress::input(CONTROL_INTERFACE, 0) {
            debug!(
                "{}: report from unmonitored endpoint {}: [{}]",
                self.name(),
                endpoint,
                hex_frame(data)
            );
            return Ok(self.chat_mix_state(None));
        }

        if data.len() >= 2 && data[0] == 0x07 && data[1] == 0x25 {
            // Volume telemetry from the DAC dial; data[2] ranges from -56
            // (0%) to 0 (100%). Playback volume is handled on-device.
        } else if data.len() >= 4 && data[0] == 0x07 && data[1] == 0x45 {
            debug!("{}: received volume control data", self.name());
            let game_mix = Self::mix_fraction(2, data[2])?;
            let chat_mix = Self::mix_fraction(3, data[3])?;
            self.game_mix = Some(game_mix);
            self.chat_mix = Some(chat_mix);
        } else if data.len() >= 16 && data[0] == 0x06 && data[1] == 0xb0 {
            let status = Self::decode_status(data)?;
            self.status = Some(status.clone());
            return Ok(self.chat_mix_state(Some(status)));
        } else {
            debug!("{}: unrecognized report: [{}]", self.name(), hex_frame(data));
        }

        Ok(self.chat_mix_state(None))
    }

    fn configurable_settings(&self, status: Option<&DeviceStatus>) -> Vec<SettingsSection> {
        let status = status.or(self.status.as_ref());

        let anc_level = status.map_or(0x00, |s| s.transparent_noise_cancelling_level.value.min(0x03));
        let shutdown_code = status.map_or(0x04, |s| s.auto_off_time_minutes.raw);
        let range_mode = status.is_some_and(|s| s.wireless_mode.value == WirelessMode::Range);

        vec![
            SettingsSection {
                name: "microphone",
                settings: vec![
                    DeviceSetting::Slider(SliderSetting {
                        key: "mic_volume",
                        min_label_key: "mic_volume_muted",
                        max_label_key: "mic_volume_max",
                        min: 0x01,
                        max: 0x10,
                        step: 1,
                        current: 0x10,
                    }),
                    DeviceSetting::Slider(SliderSetting {
                        key: "mic_side_tone",
                        min_label_key: "mic_side_tone_none",
                        max_label_key: "mic_side_tone_high",
                        min: 0x00,
                        max: 0x03,
                        step: 1,
                        current: 0x00,
                    }),
                    DeviceSetting::Toggle(ToggleSetting {
                        key: "mic_gain",
                        off_label_key: "mic_gain_low",
                        on_label_key: "mic_gain_high",
                        current: true,
                    }),
                ],
            },
            SettingsSection {
                name: "anc",
                settings: vec![DeviceSetting::Slider(SliderSetting {
                    key: "anc_level",
                    min_label_key: "anc_level_low",
                    max_label_key: "anc_level_high",
                    min: 0x00,
                    max: 0x03,
                    step: 1,
                    current: anc_level,
                })],
            },
            SettingsSection {
                name: "power_management",
                settings: vec![DeviceSetting::Slider(SliderSetting {
                    key: "pm_shutdown",
                    min_label_key: "pm_shutdown_disabled",
                    max_label_key: "pm_shutdown_60_minutes",
                    min: 0x00,
                    max: 0x06,
                    step: 1,
                    current: shutdown_code,
                })],
            },
            SettingsSection {
                name: "wireless",
                settings: vec![DeviceSetting::Toggle(ToggleSetting {
                    key: "wireless_mode",
                    off_label_key: "wireless_mode_speed",
                    on_label_key: "wireless_mode_range",
                    current: range_mode,
                })],
            },
        ]
    }

    fn apply_setting(
        &mut self,
        key: &str,
        value: SettingValue,
    ) -> Result<Command, SettingError> {
        match key {
            "mic_volume" => Ok(Self::set_mic_volume(value.slider("mic_volume", 0x01, 0x10)?)),
            "mic_side_tone" => Ok(Self::set_sidetone(value.slider("mic_side_tone", 0x00, 0x03)?)),
            "mic_gain" => Ok(Self::set_mic_gain(value.toggle("mic_gain")?)),
            "anc_level" => {
                value.slider("anc_level", 0x00, 0x03)?;
                // The set command for this one has not shown up in any
                // capture yet; needs verification against real hardware.
                Err(SettingError::Unmapped("anc_level"))
            }
            "pm_shutdown" => {
                let code = value.slider("pm_shutdown", 0x00, 0x06)?;
                if let Some(status) = &mut self.status {
                    status.auto_off_time_minutes =
                        StatusValue::new(code, INACTIVE_TIME_MINUTES[code as usize]);
                }
                Ok(Self::set_inactive_time(code))
            }
            "wireless_mode" => {
                let range = value.toggle("wireless_mode")?;
                let mode = if range {
                    WirelessMode::Range
                } else {
                    WirelessMode::Speed
                };
                if let Some(status) = &mut self.status {
                    status.wireless_mode = StatusValue::new(u8::from(range), mode);
                }
                Ok(Self::set_wireless_mode(mode))
            }
            _ => Err(SettingError::UnknownKey(key.to_string())),
        }
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn hex_frame(data: &[u8]) -> String {
    data.iter()
        .map(|byte| format!("{byte:02x}"))
        .collect::<Vec<_>>()
        .join(":")
}
