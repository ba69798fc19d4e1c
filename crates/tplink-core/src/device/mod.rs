//! Device model: a cached system-info snapshot plus typed operations.
//!
//! [`Device`] is the generic base every device type wraps. It owns the
//! [`Client`], the last successful `get_sysinfo` result and the capability
//! set derived from it. The specialized types only expose the operations
//! that make sense for them:
//!
//! - [`Plug`]: relay and LED
//! - [`MeterPlug`]: a plug with realtime power and usage statistics
//! - [`Bulb`]: power, brightness, color temperature and HSV, each gated on
//!   the capability flags the bulb reports
//!
//! Nothing here locks: callers sharing one device object across tasks must
//! serialize access themselves.

pub mod bulb;
pub mod meter;
pub mod plug;

pub use bulb::{Bulb, Hsv};
pub use meter::MeterPlug;
pub use plug::Plug;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::{
    client::Client,
    commands::{self, Command},
    error::Error,
    response::SysInfo,
    transport::DeviceConfig,
};

/// An optional hardware feature a device may report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// HSV color (`is_color`).
    Color,
    /// Brightness control (`is_dimmable`).
    Dimming,
    /// Tunable white (`is_variable_color_temp`).
    ColorTemperature,
    /// Energy meter (`ENE` in `feature`).
    EnergyMeter,
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Capability::Color => write!(f, "color changes"),
            Capability::Dimming => write!(f, "dimming"),
            Capability::ColorTemperature => write!(f, "color temperature changes"),
            Capability::EnergyMeter => write!(f, "energy metering"),
        }
    }
}

/// Capability flags taken from one sysinfo snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Capabilities {
    /// The bulb accepts hue and saturation.
    pub color: bool,
    /// The bulb accepts a brightness level.
    pub dimmable: bool,
    /// The bulb accepts a color temperature in Kelvin.
    pub variable_color_temp: bool,
    /// The plug carries an energy meter.
    pub energy_meter: bool,
}

impl Capabilities {
    /// Reads the capability flags out of a sysinfo snapshot.
    pub fn from_sysinfo(info: &SysInfo) -> Self {
        Self {
            color: info.is_color,
            dimmable: info.is_dimmable,
            variable_color_temp: info.is_variable_color_temp,
            energy_meter: info.has_emeter(),
        }
    }

    /// Returns true if `capability` is present.
    pub fn supports(&self, capability: Capability) -> bool {
        match capability {
            Capability::Color => self.color,
            Capability::Dimming => self.dimmable,
            Capability::ColorTemperature => self.variable_color_temp,
            Capability::EnergyMeter => self.energy_meter,
        }
    }

    /// Fails with [`Error::Unsupported`] unless `capability` is present.
    pub fn require(&self, capability: Capability) -> Result<(), Error> {
        if self.supports(capability) {
            Ok(())
        } else {
            Err(Error::Unsupported(capability))
        }
    }
}

/// The generic device: endpoint, executor and cached sysinfo.
///
/// Before the first [`refresh`](Device::refresh) no snapshot exists and the
/// device reports no capabilities.
#[derive(Debug)]
pub struct Device {
    client: Client,
    sysinfo: Option<SysInfo>,
    capabilities: Capabilities,
}

impl Device {
    /// Creates a device for `config` without contacting it.
    pub fn new(config: &DeviceConfig) -> Self {
        Self::with_client(Client::new(config))
    }

    /// Creates a device that talks through an existing client.
    pub fn with_client(client: Client) -> Self {
        Self {
            client,
            sysinfo: None,
            capabilities: Capabilities::default(),
        }
    }

    /// Creates a device and loads its first snapshot.
    pub async fn connect(config: &DeviceConfig) -> Result<Self, Error> {
        let mut device = Self::new(config);
        device.refresh().await?;
        Ok(device)
    }

    /// Queries `system/get_sysinfo` and replaces the cached snapshot.
    pub async fn refresh(&mut self) -> Result<&SysInfo, Error> {
        let info: SysInfo = self
            .client
            .execute_as(&Command::query(commands::SYSTEM, commands::GET_SYSINFO))
            .await?;
        debug!(host = self.client.host(), model = %info.model, "refreshed sysinfo");

        self.capabilities = Capabilities::from_sysinfo(&info);
        Ok(self.sysinfo.insert(info))
    }

    /// The generic escape hatch: runs any command and returns its result.
    pub async fn execute(&self, command: &Command) -> Result<Value, Error> {
        self.client.execute(command).await
    }

    /// The command executor for this device.
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// The last sysinfo snapshot, if any.
    pub fn sysinfo(&self) -> Option<&SysInfo> {
        self.sysinfo.as_ref()
    }

    /// Applies an acknowledged state change to the cached snapshot.
    pub(crate) fn update_sysinfo(&mut self, update: impl FnOnce(&mut SysInfo)) {
        if let Some(info) = self.sysinfo.as_mut() {
            update(info);
        }
    }

    /// Capabilities from the last snapshot; all false before the first refresh.
    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    /// Fails with [`Error::Unsupported`] unless the last snapshot reported
    /// `capability`.
    pub fn require(&self, capability: Capability) -> Result<(), Error> {
        self.capabilities.require(capability)
    }

    /// Device name, or an empty string before the first refresh.
    pub fn alias(&self) -> &str {
        self.sysinfo.as_ref().map_or("", |s| s.alias.as_str())
    }

    /// Model string such as `HS110(EU)`.
    pub fn model(&self) -> &str {
        self.sysinfo.as_ref().map_or("", |s| s.model.as_str())
    }

    /// Hardware revision such as `1.0`.
    pub fn hardware_version(&self) -> &str {
        self.sysinfo.as_ref().map_or("", |s| s.hw_ver.as_str())
    }

    /// MAC address as reported by the device.
    pub fn mac(&self) -> &str {
        self.sysinfo.as_ref().map_or("", SysInfo::mac_address)
    }

    /// Renames the device.
    pub async fn set_alias(&mut self, alias: &str) -> Result<(), Error> {
        self.execute(&Command::with_param(
            commands::SYSTEM,
            commands::SET_DEV_ALIAS,
            "alias",
            alias,
        ))
        .await?;

        self.update_sysinfo(|info| info.alias = alias.to_owned());
        Ok(())
    }

    /// Reboots the device after `delay` seconds.
    pub async fn reboot(&self, delay: u32) -> Result<(), Error> {
        self.execute(&Command::with_param(
            commands::SYSTEM,
            commands::REBOOT,
            "delay",
            delay,
        ))
        .await?;
        Ok(())
    }
}

/// Behaviour shared by every device type.
#[async_trait]
pub trait SmartDevice: Send + Sync {
    /// The generic device this type wraps.
    fn device(&self) -> &Device;

    /// Reloads the cached state of this device type.
    async fn refresh(&mut self) -> Result<(), Error>;

    fn alias(&self) -> &str {
        self.device().alias()
    }

    fn model(&self) -> &str {
        self.device().model()
    }

    fn capabilities(&self) -> Capabilities {
        self.device().capabilities()
    }

    async fn execute(&self, command: &Command) -> Result<Value, Error> {
        self.device().execute(command).await
    }
}

#[async_trait]
impl SmartDevice for Device {
    fn device(&self) -> &Device {
        self
    }

    async fn refresh(&mut self) -> Result<(), Error> {
        Device::refresh(self).await?;
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use serde_json::json;

    use super::*;
    use crate::transport::mock::MockTransport;

    pub(crate) fn sysinfo_response(info: Value) -> Value {
        json!({"system": {"get_sysinfo": info}})
    }

    #[tokio::test]
    async fn test_refresh_caches_snapshot() {
        let mock = MockTransport::new();
        mock.respond(sysinfo_response(json!({
            "alias": "Kitchen",
            "model": "HS110(EU)",
            "hw_ver": "2.0",
            "mac": "AA:BB:CC:DD:EE:FF",
            "feature": "TIM:ENE",
            "err_code": 0
        })));

        let mut device = Device::with_client(Client::with_transport(mock.clone()));
        assert!(device.sysinfo().is_none());
        assert_eq!(device.capabilities(), Capabilities::default());

        device.refresh().await.unwrap();

        assert_eq!(device.alias(), "Kitchen");
        assert_eq!(device.model(), "HS110(EU)");
        assert_eq!(device.hardware_version(), "2.0");
        assert!(device.capabilities().energy_meter);
        assert!(device.require(Capability::Color).is_err());
    }

    #[tokio::test]
    async fn test_set_alias_updates_cache_after_ack() {
        let mock = MockTransport::new();
        mock.respond(sysinfo_response(json!({"alias": "Old", "err_code": 0})));
        mock.respond(json!({"system": {"set_dev_alias": {"err_code": -3, "err_msg": "invalid argument"}}}));
        mock.respond(json!({"system": {"set_dev_alias": {"err_code": 0}}}));

        let mut device = Device::with_client(Client::with_transport(mock.clone()));
        device.refresh().await.unwrap();

        assert!(device.set_alias("New").await.is_err());
        assert_eq!(device.alias(), "Old");

        device.set_alias("New").await.unwrap();
        assert_eq!(device.alias(), "New");
        assert_eq!(
            mock.requests()[2],
            json!({"system": {"set_dev_alias": {"alias": "New"}}})
        );
    }

    #[tokio::test]
    async fn test_generic_execute_through_trait() {
        let mock = MockTransport::new();
        mock.respond(json!({"time": {"get_time": {"year": 2023, "err_code": 0}}}));

        let device = Device::with_client(Client::with_transport(mock));
        let result = SmartDevice::execute(&device, &Command::query("time", "get_time"))
            .await
            .unwrap();
        assert_eq!(result["year"], 2023);
    }

    #[test]
    fn test_capability_require() {
        let caps = Capabilities {
            dimmable: true,
            ..Default::default()
        };
        assert!(caps.require(Capability::Dimming).is_ok());
        assert!(matches!(
            caps.require(Capability::Color),
            Err(Error::Unsupported(Capability::Color))
        ));
    }
}
