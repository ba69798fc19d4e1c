//! Typed structures for the command results returned by TP-Link devices.
//!
//! These describe the object found at `response[system][command]`, i.e.
//! what [`Client::execute`](crate::Client::execute) returns. Fields that not
//! every firmware reports are `Option`s or default to zero.

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::Error;

/// Result of `system/get_sysinfo`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SysInfo {
    /// Device alias/name set by the user.
    #[serde(default)]
    pub alias: String,

    /// Device model (e.g., "HS110(EU)", "LB130(US)", "KL130(EU)").
    #[serde(default)]
    pub model: String,

    /// MAC address. Bulbs report `mic_mac` instead.
    #[serde(default)]
    pub mac: String,

    /// Alternative MAC address field used by bulbs.
    #[serde(default)]
    pub mic_mac: String,

    /// Unique device ID.
    #[serde(default, rename = "deviceId")]
    pub device_id: String,

    /// Hardware ID.
    #[serde(default, rename = "hwId")]
    pub hw_id: String,

    /// Hardware version, e.g. "1.0" or "2.0".
    #[serde(default)]
    pub hw_ver: String,

    /// Software/firmware version.
    #[serde(default)]
    pub sw_ver: String,

    /// Device type, e.g. "IOT.SMARTPLUGSWITCH" or "IOT.SMARTBULB".
    #[serde(default, rename = "type", alias = "mic_type")]
    pub device_type: String,

    /// Feature string; plugs with an energy meter report "TIM:ENE".
    #[serde(default)]
    pub feature: String,

    /// Current relay state of a plug (1 = on, 0 = off).
    #[serde(default)]
    pub relay_state: u8,

    /// Whether the LED indicator is off (1 = off, 0 = on).
    #[serde(default)]
    pub led_off: u8,

    /// Seconds since the relay was turned on (0 if off).
    #[serde(default)]
    pub on_time: u64,

    /// WiFi signal strength in dBm.
    #[serde(default)]
    pub rssi: i32,

    /// Bulb supports HSV color.
    #[serde(default, deserialize_with = "flag")]
    pub is_color: bool,

    /// Bulb supports dimming.
    #[serde(default, deserialize_with = "flag")]
    pub is_dimmable: bool,

    /// Bulb supports variable color temperature.
    #[serde(default, deserialize_with = "flag")]
    pub is_variable_color_temp: bool,

    /// Light state embedded in bulb sysinfo.
    #[serde(default)]
    pub light_state: Option<LightState>,
}

impl SysInfo {
    /// Returns the MAC address, preferring `mac` over `mic_mac`.
    pub fn mac_address(&self) -> &str {
        if self.mac.is_empty() {
            &self.mic_mac
        } else {
            &self.mac
        }
    }

    /// Returns true if the relay is on.
    pub fn is_on(&self) -> bool {
        self.relay_state == 1
    }

    /// Returns true if the LED is off.
    pub fn is_led_off(&self) -> bool {
        self.led_off == 1
    }

    /// Returns true if the device has an energy meter.
    pub fn has_emeter(&self) -> bool {
        self.feature.split(':').any(|f| f == "ENE")
    }
}

/// Capability flags arrive as 0/1 from most firmware and as booleans from some.
fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Int(i64),
    }

    Ok(match Flag::deserialize(deserializer)? {
        Flag::Bool(b) => b,
        Flag::Int(i) => i != 0,
    })
}

/// Color and brightness settings of a bulb.
///
/// `saturation` and `color_temp` are missing on bulbs without color or
/// tunable white.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct LightSettings {
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(default)]
    pub hue: Option<u16>,
    #[serde(default)]
    pub saturation: Option<u16>,
    #[serde(default)]
    pub color_temp: Option<u32>,
    #[serde(default)]
    pub brightness: Option<u16>,
}

/// Result of `smartlife.iot.smartbulb.lightingservice/get_light_state`.
///
/// ```json
/// {"on_off":0,"dft_on_state":{"mode":"normal","hue":270,"saturation":100,"color_temp":5750,"brightness":100},"err_code":0}
/// ```
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LightState {
    /// 1 = on, 0 = off.
    #[serde(default)]
    pub on_off: u8,

    /// Live settings; only meaningful while the bulb is on.
    #[serde(flatten)]
    pub settings: LightSettings,

    /// Settings the bulb resumes with when switched on.
    #[serde(default)]
    pub dft_on_state: Option<LightSettings>,
}

impl LightState {
    /// Returns true if the bulb reports itself on.
    pub fn is_on(&self) -> bool {
        self.on_off == 1
    }

    /// Settings that describe the bulb's color: the live ones when on, the
    /// default on-state when off.
    pub fn effective(&self) -> &LightSettings {
        match (&self.dft_on_state, self.is_on()) {
            (Some(dft), false) => dft,
            _ => &self.settings,
        }
    }
}

/// Result of `emeter/get_realtime`.
///
/// Hardware version 1 reports `voltage`, `current`, `power` (V, A, W) and
/// `total` (kWh); later versions report `voltage_mv`, `current_ma`,
/// `power_mw` and `total_wh`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct EnergyReading {
    #[serde(default)]
    pub voltage_mv: Option<f64>,
    #[serde(default)]
    pub voltage: Option<f64>,
    #[serde(default)]
    pub current_ma: Option<f64>,
    #[serde(default)]
    pub current: Option<f64>,
    #[serde(default)]
    pub power_mw: Option<f64>,
    #[serde(default)]
    pub power: Option<f64>,
    #[serde(default)]
    pub total_wh: Option<f64>,
    /// Total energy in kWh.
    #[serde(default)]
    pub total: Option<f64>,
}

/// Field layout of an energy meter reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmeterLayout {
    /// V, A, W and kWh (hardware version 1.x).
    Units,
    /// mV, mA, mW and Wh (hardware version 2.x and later).
    Milli,
}

impl EmeterLayout {
    /// Selects the layout from the sysinfo `hw_ver` string.
    pub fn for_hardware(hw_ver: &str) -> Self {
        if hw_ver.trim().starts_with("1.") || hw_ver.trim() == "1" {
            EmeterLayout::Units
        } else {
            EmeterLayout::Milli
        }
    }
}

/// Instantaneous power reading normalized to V, A, W and Wh.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PowerData {
    /// Volts.
    pub voltage: f64,
    /// Amperes.
    pub current: f64,
    /// Watts.
    pub power: f64,
    /// Cumulative energy in watt-hours.
    pub total: f64,
}

impl PowerData {
    /// Normalizes `reading` using the layout the hardware version implies.
    ///
    /// If the preferred field is missing the other layout's field is used,
    /// since firmware updates have moved some devices between layouts.
    pub fn from_reading(reading: &EnergyReading, hw_ver: &str) -> Result<Self, Error> {
        let units = [
            reading.voltage,
            reading.current,
            reading.power,
            reading.total.map(|kwh| kwh * 1000.0),
        ];
        let milli = [
            reading.voltage_mv.map(|mv| mv / 1000.0),
            reading.current_ma.map(|ma| ma / 1000.0),
            reading.power_mw.map(|mw| mw / 1000.0),
            reading.total_wh,
        ];

        let (preferred, fallback) = match EmeterLayout::for_hardware(hw_ver) {
            EmeterLayout::Units => (units, milli),
            EmeterLayout::Milli => (milli, units),
        };

        let field = |i: usize, name: &str| {
            preferred[i]
                .or(fallback[i])
                .ok_or_else(|| Error::Protocol(format!("realtime reading has no {}", name)))
        };

        Ok(Self {
            voltage: field(0, "voltage")?,
            current: field(1, "current")?,
            power: field(2, "power")?,
            total: field(3, "total energy")?,
        })
    }
}

/// Result of `emeter/get_vgain_igain`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct GainData {
    /// Voltage calibration gain.
    pub vgain: u32,
    /// Current calibration gain.
    pub igain: u32,
}

/// One day record of `emeter/get_daystat`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DayStat {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    /// Older firmware: energy in Wh.
    #[serde(default)]
    pub energy: Option<f64>,
    /// Newer firmware: energy in Wh.
    #[serde(default)]
    pub energy_wh: Option<f64>,
}

impl DayStat {
    /// Energy used on this day in watt-hours.
    pub fn energy_wh(&self) -> Option<f64> {
        self.energy_wh.or(self.energy)
    }
}

/// Result of `emeter/get_daystat`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DayStatList {
    #[serde(default)]
    pub day_list: Vec<DayStat>,
}

/// One month record of `emeter/get_monthstat`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MonthStat {
    #[serde(default)]
    pub year: Option<i32>,
    pub month: u32,
    #[serde(default)]
    pub energy: Option<f64>,
    #[serde(default)]
    pub energy_wh: Option<f64>,
}

impl MonthStat {
    /// Energy used in this month in watt-hours.
    pub fn energy_wh(&self) -> Option<f64> {
        self.energy_wh.or(self.energy)
    }
}

/// Result of `emeter/get_monthstat`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct MonthStatList {
    #[serde(default)]
    pub month_list: Vec<MonthStat>,
}
