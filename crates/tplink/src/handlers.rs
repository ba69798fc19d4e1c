use serde_json::{Value, json};
use tplink_core::{
    Command, DeviceConfig, Error,
    device::{Bulb, Device, MeterPlug, Plug},
};
use tracing::debug;

use crate::cli::{BulbCommand, DeviceCommand};

/// Runs one device command and returns the JSON to print.
pub async fn handle_device(config: &DeviceConfig, command: DeviceCommand) -> Result<Value, Error> {
    match command {
        DeviceCommand::Info => {
            let mut device = Device::new(config);
            let info = device.refresh().await?;
            serde_json::to_value(info).map_err(|e| Error::ParseError(e.to_string()))
        }
        DeviceCommand::On | DeviceCommand::Off => {
            let on = matches!(command, DeviceCommand::On);
            let mut plug = Plug::new(config);
            plug.set_relay_state(on).await?;
            Ok(json!({"relay_state": u8::from(plug.is_on())}))
        }
        DeviceCommand::Ledon | DeviceCommand::Ledoff => {
            let on = matches!(command, DeviceCommand::Ledon);
            let mut plug = Plug::new(config);
            plug.set_led_on(on).await?;
            Ok(json!({"led_on": plug.is_led_on()}))
        }
        DeviceCommand::Alias { name } => {
            let mut device = Device::new(config);
            device.set_alias(&name).await?;
            Ok(json!({"alias": name}))
        }
        DeviceCommand::Reboot { delay } => {
            Device::new(config).reboot(delay).await?;
            Ok(json!({"reboot_in": delay}))
        }
        DeviceCommand::Energy => {
            let meter = MeterPlug::connect(config).await?;
            Ok(json!({
                "power": meter.current_power_usage(),
                "vgain": meter.vgain(),
                "igain": meter.igain(),
            }))
        }
        DeviceCommand::DayStats { month, year } => {
            let usage = MeterPlug::new(config).month_statistics(month, year).await?;
            let days: serde_json::Map<String, Value> = usage
                .into_iter()
                .map(|(date, wh)| (date.to_string(), json!(wh)))
                .collect();
            Ok(Value::Object(days))
        }
        DeviceCommand::MonthStats { year } => {
            let usage = MeterPlug::new(config).year_statistics(year).await?;
            let months: serde_json::Map<String, Value> = usage
                .into_iter()
                .map(|(month, wh)| (month.to_string(), json!(wh)))
                .collect();
            Ok(Value::Object(months))
        }
        DeviceCommand::EnergyReset => {
            MeterPlug::new(config).erase_statistics().await?;
            Ok(json!({"erased": true}))
        }
        DeviceCommand::Bulb(command) => handle_bulb(config, command).await,
        DeviceCommand::Raw {
            system,
            command,
            params,
        } => {
            let command = match params {
                Some(params) => {
                    let params: Value = serde_json::from_str(&params).map_err(|e| {
                        Error::InvalidArgument(format!("params are not JSON: {}", e))
                    })?;
                    Command::with_params(system, command, params)
                }
                None => Command::query(system, command),
            };
            debug!("Command: {}", command.envelope());
            Device::new(config).execute(&command).await
        }
    }
}

async fn handle_bulb(config: &DeviceConfig, command: BulbCommand) -> Result<Value, Error> {
    // Setters are gated on capabilities, so the bulb is always refreshed first.
    let mut bulb = Bulb::connect(config).await?;

    match command {
        BulbCommand::State => {}
        BulbCommand::On => bulb.set_powered_on(true).await?,
        BulbCommand::Off => bulb.set_powered_on(false).await?,
        BulbCommand::Brightness { percent } => bulb.set_brightness(percent).await?,
        BulbCommand::Temperature { kelvin } => bulb.set_color_temperature(kelvin).await?,
        BulbCommand::Hsv {
            hue,
            saturation,
            value,
        } => bulb.set_hsv(hue, saturation, value).await?,
    }

    Ok(bulb_state(&bulb))
}

fn bulb_state(bulb: &Bulb) -> Value {
    json!({
        "alias": bulb.device().alias(),
        "model": bulb.device().model(),
        "on": bulb.is_powered_on(),
        "mode": bulb.light_mode(),
        "hsv": bulb.hsv().ok().map(|hsv| json!({
            "hue": hsv.hue,
            "saturation": hsv.saturation,
            "value": hsv.value,
        })),
        "color_temp": bulb.color_temperature().ok(),
        "brightness": bulb.brightness().ok(),
    })
}
