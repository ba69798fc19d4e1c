//! Switchable smart plug.

use async_trait::async_trait;

use crate::{
    client::Client,
    commands::{self, Command},
    device::{Device, SmartDevice},
    error::Error,
    transport::DeviceConfig,
};

/// A smart plug with a relay and an LED indicator.
///
/// # Example
///
/// ```no_run
/// use tplink_core::{DeviceConfig, device::Plug};
///
/// #[tokio::main]
/// async fn main() -> Result<(), tplink_core::Error> {
///     let mut plug = Plug::connect(&DeviceConfig::new("192.168.1.100")).await?;
///     plug.set_relay_state(!plug.is_on()).await?;
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct Plug {
    device: Device,
    relay_on: bool,
    led_on: bool,
    on_time: u64,
}

impl Plug {
    /// Creates a plug for `config` without contacting it.
    pub fn new(config: &DeviceConfig) -> Self {
        Self::with_client(Client::new(config))
    }

    /// Creates a plug that talks through an existing client.
    pub fn with_client(client: Client) -> Self {
        Self {
            device: Device::with_client(client),
            relay_on: false,
            led_on: false,
            on_time: 0,
        }
    }

    /// Creates a plug and loads its state.
    pub async fn connect(config: &DeviceConfig) -> Result<Self, Error> {
        let mut plug = Self::new(config);
        plug.refresh().await?;
        Ok(plug)
    }

    /// Re-reads relay and LED state from sysinfo.
    pub async fn refresh(&mut self) -> Result<(), Error> {
        let info = self.device.refresh().await?;
        self.relay_on = info.is_on();
        self.led_on = !info.is_led_off();
        self.on_time = info.on_time;
        Ok(())
    }

    /// The underlying generic device.
    pub fn device(&self) -> &Device {
        &self.device
    }

    /// Mutable access to the underlying device, e.g. for `set_alias`.
    pub fn device_mut(&mut self) -> &mut Device {
        &mut self.device
    }

    /// Last acknowledged relay state.
    pub fn is_on(&self) -> bool {
        self.relay_on
    }

    /// Last acknowledged LED state.
    pub fn is_led_on(&self) -> bool {
        self.led_on
    }

    /// Seconds the relay had been on at the last refresh.
    pub fn on_time(&self) -> u64 {
        self.on_time
    }

    /// Switches the relay. The cached state changes only once the device
    /// acknowledged the command.
    pub async fn set_relay_state(&mut self, on: bool) -> Result<(), Error> {
        self.device
            .execute(&Command::with_param(
                commands::SYSTEM,
                commands::SET_RELAY_STATE,
                "state",
                u8::from(on),
            ))
            .await?;

        self.relay_on = on;
        if !on {
            self.on_time = 0;
        }
        self.device.update_sysinfo(|info| {
            info.relay_state = u8::from(on);
            if !on {
                info.on_time = 0;
            }
        });
        Ok(())
    }

    /// Switches the LED indicator.
    pub async fn set_led_on(&mut self, on: bool) -> Result<(), Error> {
        self.device
            .execute(&Command::with_param(
                commands::SYSTEM,
                commands::SET_LED_OFF,
                "off",
                u8::from(!on),
            ))
            .await?;

        self.led_on = on;
        self.device.update_sysinfo(|info| info.led_off = u8::from(!on));
        Ok(())
    }
}

#[async_trait]
impl SmartDevice for Plug {
    fn device(&self) -> &Device {
        &self.device
    }

    async fn refresh(&mut self) -> Result<(), Error> {
        Plug::refresh(self).await
    }
}
