//! Smart bulb with optional dimming, tunable white and color.
//!
//! Hue is on the protocol's 0-100 scale and saturation is a percentage.
//! The HSV `value` is held on a 0-255 scale and converted to a brightness
//! percentage on the wire.

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::{
    client::Client,
    commands::{self, Command},
    device::{Capability, Device, SmartDevice},
    error::Error,
    response::{LightSettings, LightState},
    transport::DeviceConfig,
};

/// Largest accepted hue.
pub const MAX_HUE: u16 = 100;
/// Largest accepted saturation.
pub const MAX_SATURATION: u16 = 100;
/// Largest HSV value.
pub const MAX_VALUE: u16 = 255;

/// A bulb color.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Hsv {
    /// Hue, 0-100.
    pub hue: u16,
    /// Saturation in percent.
    pub saturation: u16,
    /// Value, 0-255.
    pub value: u16,
}

impl Hsv {
    /// Validates hue (0-100), saturation (0-100) and value (0-255).
    pub fn new(hue: i32, saturation: i32, value: i32) -> Result<Self, Error> {
        Ok(Self {
            hue: in_range("hue", hue, MAX_HUE)?,
            saturation: in_range("saturation", saturation, MAX_SATURATION)?,
            value: in_range("value", value, MAX_VALUE)?,
        })
    }

    /// `value` as a brightness percentage.
    pub fn brightness_percent(&self) -> u16 {
        u16::try_from(u32::from(self.value) * 100 / u32::from(MAX_VALUE)).unwrap_or(100)
    }
}

fn in_range(name: &str, value: i32, max: u16) -> Result<u16, Error> {
    u16::try_from(value)
        .ok()
        .filter(|v| *v <= max)
        .ok_or_else(|| {
            Error::InvalidArgument(format!("{} cannot be < 0 or > {}, got {}", name, max, value))
        })
}

/// Models whose light state reports HSV value directly on a 0-100 scale.
fn reports_direct_value(model: &str) -> bool {
    let prefix = model.get(..2).unwrap_or_default();
    prefix.eq_ignore_ascii_case("kl") || prefix.eq_ignore_ascii_case("lb")
}

/// Converts the reported `brightness` into the 0-255 HSV value scale.
fn value_from_brightness(model: &str, brightness: u16) -> u16 {
    let value = if reports_direct_value(model) {
        if brightness <= 100 {
            brightness
        } else {
            brightness.saturating_mul(100) / MAX_VALUE
        }
    } else {
        (u32::from(brightness) * u32::from(MAX_VALUE) / 100).min(u32::from(MAX_VALUE)) as u16
    };
    value.min(MAX_VALUE)
}

/// Cached light state of a bulb.
#[derive(Debug, Clone, Default)]
struct BulbState {
    powered_on: bool,
    mode: Option<String>,
    hsv: Hsv,
    color_temp: u32,
    brightness: u16,
}

/// A smart bulb.
///
/// Getters and setters for optional features fail with
/// [`Error::Unsupported`] when the bulb's last sysinfo snapshot does not
/// report the feature. Nothing is sent to the device in that case, and the
/// same holds for arguments outside the accepted ranges.
///
/// # Example
///
/// ```no_run
/// use tplink_core::{DeviceConfig, SmartDevice, device::Bulb};
///
/// #[tokio::main]
/// async fn main() -> Result<(), tplink_core::Error> {
///     let mut bulb = Bulb::connect(&DeviceConfig::new("192.168.1.101")).await?;
///     bulb.set_powered_on(true).await?;
///     if bulb.capabilities().color {
///         bulb.set_hsv(60, 100, 255).await?;
///     }
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct Bulb {
    device: Device,
    state: BulbState,
}

impl Bulb {
    /// Creates a bulb for `config` without contacting it.
    pub fn new(config: &DeviceConfig) -> Self {
        Self::with_client(Client::new(config))
    }

    /// Creates a bulb that talks through an existing client.
    pub fn with_client(client: Client) -> Self {
        Self {
            device: Device::with_client(client),
            state: BulbState::default(),
        }
    }

    /// Creates a bulb and loads its capabilities and light state.
    pub async fn connect(config: &DeviceConfig) -> Result<Self, Error> {
        let mut bulb = Self::new(config);
        bulb.refresh().await?;
        Ok(bulb)
    }

    /// Queries sysinfo for capabilities, then the light state.
    ///
    /// While the bulb is off its live color fields are meaningless, so the
    /// default on-state is cached instead.
    pub async fn refresh(&mut self) -> Result<(), Error> {
        self.device.refresh().await?;

        let light: LightState = self
            .device
            .client()
            .execute_as(&Command::query(
                commands::LIGHTING_SERVICE,
                commands::GET_LIGHT_STATE,
            ))
            .await?;

        self.state = self.state_from(&light);
        Ok(())
    }

    fn state_from(&self, light: &LightState) -> BulbState {
        let LightSettings {
            mode,
            hue,
            saturation,
            color_temp,
            brightness,
        } = light.effective().clone();
        let brightness = brightness.unwrap_or(0);

        BulbState {
            powered_on: light.is_on(),
            mode,
            hsv: Hsv {
                hue: hue.unwrap_or(0),
                saturation: saturation.unwrap_or(0),
                value: value_from_brightness(self.device.model(), brightness),
            },
            color_temp: color_temp.unwrap_or(0),
            brightness: if brightness <= 100 {
                brightness
            } else {
                brightness.saturating_mul(100) / MAX_VALUE
            },
        }
    }

    /// The underlying generic device.
    pub fn device(&self) -> &Device {
        &self.device
    }

    /// Mutable access to the underlying device, e.g. for `set_alias`.
    pub fn device_mut(&mut self) -> &mut Device {
        &mut self.device
    }

    /// Whether the bulb accepts hue and saturation.
    pub fn is_color(&self) -> bool {
        self.device.capabilities().color
    }

    /// Whether the bulb accepts a brightness level.
    pub fn is_dimmable(&self) -> bool {
        self.device.capabilities().dimmable
    }

    /// Whether the bulb accepts a color temperature.
    pub fn is_variable_color_temperature(&self) -> bool {
        self.device.capabilities().variable_color_temp
    }

    /// Last acknowledged power state.
    pub fn is_powered_on(&self) -> bool {
        self.state.powered_on
    }

    /// Light mode reported by the bulb, e.g. "normal" or "circadian".
    pub fn light_mode(&self) -> Option<&str> {
        self.state.mode.as_deref()
    }

    /// Cached color. Requires color support.
    pub fn hsv(&self) -> Result<Hsv, Error> {
        self.device.require(Capability::Color)?;
        Ok(self.state.hsv)
    }

    /// Cached color temperature in Kelvin. Requires tunable white.
    pub fn color_temperature(&self) -> Result<u32, Error> {
        self.device.require(Capability::ColorTemperature)?;
        Ok(self.state.color_temp)
    }

    /// Cached brightness in percent. Requires dimming.
    pub fn brightness(&self) -> Result<u16, Error> {
        self.device.require(Capability::Dimming)?;
        Ok(self.state.brightness)
    }

    /// Sets brightness in percent.
    ///
    /// Negative values are rejected; values above 100 are passed through and
    /// left to the bulb to clamp. Brightness and HSV value share one field on
    /// the bulb, so the cached [`hsv`](Bulb::hsv) value follows.
    pub async fn set_brightness(&mut self, percent: i32) -> Result<(), Error> {
        self.device.require(Capability::Dimming)?;
        let percent = u16::try_from(percent).map_err(|_| {
            Error::InvalidArgument(format!("brightness cannot be < 0, got {}", percent))
        })?;

        self.transition(json!({"brightness": percent})).await?;
        let brightness = percent.min(100);
        self.state.brightness = brightness;
        self.state.hsv.value = value_from_brightness(self.device.model(), brightness);
        Ok(())
    }

    /// Sets the color temperature in Kelvin.
    pub async fn set_color_temperature(&mut self, kelvin: u32) -> Result<(), Error> {
        self.device.require(Capability::ColorTemperature)?;

        self.transition(json!({"color_temp": kelvin})).await?;
        self.state.color_temp = kelvin;
        Ok(())
    }

    /// Sets the color. `value` (0-255) is sent as a brightness percentage and
    /// `color_temp` is zeroed, as color and white modes exclude each other.
    pub async fn set_hsv(&mut self, hue: i32, saturation: i32, value: i32) -> Result<(), Error> {
        self.device.require(Capability::Color)?;
        let hsv = Hsv::new(hue, saturation, value)?;

        self.transition(json!({
            "hue": hsv.hue,
            "saturation": hsv.saturation,
            "brightness": hsv.brightness_percent(),
            "color_temp": 0,
        }))
        .await?;

        self.state.hsv = hsv;
        self.state.brightness = hsv.brightness_percent();
        self.state.color_temp = 0;
        Ok(())
    }

    /// Switches the bulb on or off. Every bulb supports this.
    pub async fn set_powered_on(&mut self, on: bool) -> Result<(), Error> {
        self.transition(json!({"on_off": u8::from(on)})).await?;
        self.state.powered_on = on;
        Ok(())
    }

    async fn transition(&self, params: Value) -> Result<Value, Error> {
        self.device
            .execute(&Command::with_params(
                commands::LIGHTING_SERVICE,
                commands::TRANSITION_LIGHT_STATE,
                params,
            ))
            .await
    }
}

#[async_trait]
impl SmartDevice for Bulb {
    fn device(&self) -> &Device {
        &self.device
    }

    async fn refresh(&mut self) -> Result<(), Error> {
        Bulb::refresh(self).await
    }
}
