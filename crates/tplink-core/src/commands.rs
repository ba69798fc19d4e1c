//! System and command names understood by TP-Link devices, and the
//! [`Command`] type that turns them into a request envelope.
//!
//! Every request is a single `{"<system>":{"<command>":<params>}}` object,
//! where `<params>` is `null` for a plain query, a one-field object, or a
//! full parameter object.
//!
//! # Example
//!
//! ```
//! use serde_json::json;
//! use tplink_core::commands::{self, Command};
//!
//! let query = Command::query(commands::SYSTEM, commands::GET_SYSINFO);
//! assert_eq!(query.envelope(), json!({"system": {"get_sysinfo": null}}));
//!
//! let relay = Command::with_param(commands::SYSTEM, commands::SET_RELAY_STATE, "state", 1);
//! assert_eq!(relay.envelope(), json!({"system": {"set_relay_state": {"state": 1}}}));
//! ```

use serde_json::{Map, Value};

/// Device-wide system service.
pub const SYSTEM: &str = "system";

/// Energy meter service (metered plugs only).
pub const EMETER: &str = "emeter";

/// Lighting service for smart bulbs.
pub const LIGHTING_SERVICE: &str = "smartlife.iot.smartbulb.lightingservice";

/// Get system information (model, versions, relay state, capability flags).
pub const GET_SYSINFO: &str = "get_sysinfo";

/// Switch the relay of a plug (`state`: 1 on, 0 off).
pub const SET_RELAY_STATE: &str = "set_relay_state";

/// Switch the LED indicator (`off`: 1 off, 0 on).
pub const SET_LED_OFF: &str = "set_led_off";

/// Rename the device (`alias`).
pub const SET_DEV_ALIAS: &str = "set_dev_alias";

/// Reboot the device after `delay` seconds.
pub const REBOOT: &str = "reboot";

/// Get the current light state of a bulb.
pub const GET_LIGHT_STATE: &str = "get_light_state";

/// Change the light state of a bulb.
pub const TRANSITION_LIGHT_STATE: &str = "transition_light_state";

/// Get real-time energy meter readings.
pub const GET_REALTIME: &str = "get_realtime";

/// Get voltage and current calibration gains.
pub const GET_VGAIN_IGAIN: &str = "get_vgain_igain";

/// Get per-day energy usage for a month (`month`, `year`).
pub const GET_DAYSTAT: &str = "get_daystat";

/// Get per-month energy usage for a year (`year`).
pub const GET_MONTHSTAT: &str = "get_monthstat";

/// Erase all energy meter statistics.
///
/// **Warning:** This permanently deletes energy usage history.
pub const ERASE_EMETER_STAT: &str = "erase_emeter_stat";

/// One system/command pair and its parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    system: String,
    command: String,
    params: Value,
}

impl Command {
    /// A bare query: the command's value is `null`.
    pub fn query(system: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            command: command.into(),
            params: Value::Null,
        }
    }

    /// A command carrying one named parameter.
    pub fn with_param(
        system: impl Into<String>,
        command: impl Into<String>,
        name: impl Into<String>,
        value: impl Into<Value>,
    ) -> Self {
        let mut params = Map::new();
        params.insert(name.into(), value.into());
        Self {
            system: system.into(),
            command: command.into(),
            params: Value::Object(params),
        }
    }

    /// A command whose parameter object is used verbatim.
    pub fn with_params(
        system: impl Into<String>,
        command: impl Into<String>,
        params: impl Into<Value>,
    ) -> Self {
        Self {
            system: system.into(),
            command: command.into(),
            params: params.into(),
        }
    }

    /// The target system, e.g. `system` or `emeter`.
    pub fn system(&self) -> &str {
        &self.system
    }

    /// The command name within the system.
    pub fn command(&self) -> &str {
        &self.command
    }

    /// Command parameters; `null` for a bare query.
    pub fn params(&self) -> &Value {
        &self.params
    }

    /// Builds the request envelope `{system: {command: params}}`.
    pub fn envelope(&self) -> Value {
        let mut inner = Map::new();
        inner.insert(self.command.clone(), self.params.clone());
        let mut outer = Map::new();
        outer.insert(self.system.clone(), Value::Object(inner));
        Value::Object(outer)
    }
}
