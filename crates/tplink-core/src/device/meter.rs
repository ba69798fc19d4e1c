//! Smart plug with an energy meter (HS110, KP115 and similar).

use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

use crate::{
    client::Client,
    commands::{self, Command},
    device::{Capability, Device, Plug, SmartDevice},
    error::Error,
    response::{DayStatList, EnergyReading, GainData, MonthStatList, PowerData},
    stats::{self, DailyUsage, MonthlyUsage},
    transport::DeviceConfig,
};

/// A plug that also reports power readings and usage statistics.
///
/// # Example
///
/// ```no_run
/// use tplink_core::{DeviceConfig, device::MeterPlug};
///
/// #[tokio::main]
/// async fn main() -> Result<(), tplink_core::Error> {
///     let meter = MeterPlug::connect(&DeviceConfig::new("192.168.1.100")).await?;
///     if let Some(power) = meter.current_power_usage() {
///         println!("{:.1} W", power.power);
///     }
///     for (day, wh) in meter.month_statistics(6, 2023).await? {
///         println!("{day}: {wh} Wh");
///     }
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct MeterPlug {
    plug: Plug,
    power: Option<PowerData>,
    gain: Option<GainData>,
}

impl MeterPlug {
    /// Creates a metered plug for `config` without contacting it.
    pub fn new(config: &DeviceConfig) -> Self {
        Self::with_client(Client::new(config))
    }

    /// Creates a metered plug that talks through an existing client.
    pub fn with_client(client: Client) -> Self {
        Self {
            plug: Plug::with_client(client),
            power: None,
            gain: None,
        }
    }

    /// Creates a metered plug and loads relay state, power and gains.
    pub async fn connect(config: &DeviceConfig) -> Result<Self, Error> {
        let mut meter = Self::new(config);
        meter.refresh().await?;
        Ok(meter)
    }

    /// Refreshes sysinfo first, since the hardware version decides how the
    /// realtime reading is scaled, then power and calibration gains.
    ///
    /// Fails with [`Error::Unsupported`] before any emeter request when the
    /// fresh sysinfo reports no energy meter.
    pub async fn refresh(&mut self) -> Result<(), Error> {
        self.plug.refresh().await?;
        self.device().require(Capability::EnergyMeter)?;
        self.refresh_power().await?;

        let gain: GainData = self
            .device()
            .client()
            .execute_as(&Command::query(commands::EMETER, commands::GET_VGAIN_IGAIN))
            .await?;
        self.gain = Some(gain);
        Ok(())
    }

    /// Reads realtime power without touching relay state.
    pub async fn refresh_power(&mut self) -> Result<PowerData, Error> {
        self.require_meter()?;
        let reading: EnergyReading = self
            .device()
            .client()
            .execute_as(&Command::query(commands::EMETER, commands::GET_REALTIME))
            .await?;
        let power = PowerData::from_reading(&reading, self.device().hardware_version())?;
        debug!(watts = power.power, "refreshed realtime power");

        self.power = Some(power);
        Ok(power)
    }

    /// Checks the energy meter capability. Passes before the first refresh.
    fn require_meter(&self) -> Result<(), Error> {
        match self.device().sysinfo() {
            Some(_) => self.device().require(Capability::EnergyMeter),
            None => Ok(()),
        }
    }

    /// The plug this meter is built on.
    pub fn plug(&self) -> &Plug {
        &self.plug
    }

    /// Mutable access to the plug, e.g. for LED control.
    pub fn plug_mut(&mut self) -> &mut Plug {
        &mut self.plug
    }

    /// The underlying generic device.
    pub fn device(&self) -> &Device {
        self.plug.device()
    }

    /// Last acknowledged relay state.
    pub fn is_on(&self) -> bool {
        self.plug.is_on()
    }

    /// Switches the relay; see [`Plug::set_relay_state`].
    pub async fn set_relay_state(&mut self, on: bool) -> Result<(), Error> {
        self.plug.set_relay_state(on).await
    }

    /// Power reading from the last refresh.
    pub fn current_power_usage(&self) -> Option<PowerData> {
        self.power
    }

    /// Voltage calibration gain from the last refresh.
    pub fn vgain(&self) -> Option<u32> {
        self.gain.map(|g| g.vgain)
    }

    /// Current calibration gain from the last refresh.
    pub fn igain(&self) -> Option<u32> {
        self.gain.map(|g| g.igain)
    }

    /// Erases all accumulated energy statistics on the device.
    ///
    /// Failures are returned to the caller and never retried.
    pub async fn erase_statistics(&self) -> Result<(), Error> {
        self.require_meter()?;
        self.device()
            .execute(&Command::query(commands::EMETER, commands::ERASE_EMETER_STAT))
            .await?;
        Ok(())
    }

    /// Daily energy usage in Wh for `month` (1-12) of `year`.
    ///
    /// Map keys are built from each record's own year, month and day.
    pub async fn month_statistics(&self, month: u32, year: i32) -> Result<DailyUsage, Error> {
        self.require_meter()?;
        let list: DayStatList = self
            .device()
            .client()
            .execute_as(&Command::with_params(
                commands::EMETER,
                commands::GET_DAYSTAT,
                json!({"month": month, "year": year}),
            ))
            .await?;
        stats::daily_usage(&list.day_list)
    }

    /// Monthly energy usage in Wh for `year`, keyed by month number.
    pub async fn year_statistics(&self, year: i32) -> Result<MonthlyUsage, Error> {
        self.require_meter()?;
        let list: MonthStatList = self
            .device()
            .client()
            .execute_as(&Command::with_param(
                commands::EMETER,
                commands::GET_MONTHSTAT,
                "year",
                year,
            ))
            .await?;
        stats::monthly_usage(&list.month_list)
    }
}

#[async_trait]
impl SmartDevice for MeterPlug {
    fn device(&self) -> &Device {
        self.plug.device()
    }

    async fn refresh(&mut self) -> Result<(), Error> {
        MeterPlug::refresh(self).await
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use serde_json::json;

    use super::*;
    use crate::{device::tests::sysinfo_response, transport::mock::MockTransport};

    fn meter() -> (MeterPlug, MockTransport) {
        let mock = MockTransport::new();
        (
            MeterPlug::with_client(Client::with_transport(mock.clone())),
            mock,
        )
    }

    #[tokio::test]
    async fn test_refresh_loads_power_and_gain() {
        let (mut meter, mock) = meter();
        mock.respond(sysinfo_response(json!({
            "model": "HS110(EU)", "hw_ver": "1.0", "feature": "TIM:ENE", "relay_state": 1, "err_code": 0
        })))
        .respond(json!({"emeter": {"get_realtime": {
            "voltage": 230.1, "current": 0.1, "power": 23.0, "total": 0.5, "err_code": 0
        }}}))
        .respond(json!({"emeter": {"get_vgain_igain": {"vgain": 13462, "igain": 16835, "err_code": 0}}}));

        meter.refresh().await.unwrap();

        assert!(meter.is_on());
        let power = meter.current_power_usage().unwrap();
        assert_eq!(power.voltage, 230.1);
        assert_eq!(power.total, 500.0);
        assert_eq!(meter.vgain(), Some(13462));
        assert_eq!(meter.igain(), Some(16835));
        assert_eq!(mock.requests().len(), 3);
    }

    #[tokio::test]
    async fn test_refresh_without_meter_is_unsupported() {
        let (mut meter, mock) = meter();
        mock.respond(sysinfo_response(json!({
            "model": "HS100(EU)", "hw_ver": "2.0", "feature": "TIM", "relay_state": 1, "err_code": 0
        })))
        .respond(json!({"emeter": {"get_realtime": {"err_code": -1, "err_msg": "module not support"}}}));

        let err = meter.refresh().await.unwrap_err();

        assert!(matches!(err, Error::Unsupported(Capability::EnergyMeter)));
        assert_eq!(mock.requests().len(), 1);
        assert!(meter.is_on());
        assert!(meter.current_power_usage().is_none());
    }

    #[tokio::test]
    async fn test_statistics_gated_once_snapshot_exists() {
        let (mut meter, mock) = meter();
        mock.respond(sysinfo_response(json!({"feature": "TIM", "err_code": 0})));
        meter.plug_mut().refresh().await.unwrap();
        mock.clear_requests();

        for err in [
            meter.refresh_power().await.unwrap_err(),
            meter.erase_statistics().await.unwrap_err(),
            meter.month_statistics(6, 2023).await.map(|_| ()).unwrap_err(),
            meter.year_statistics(2023).await.map(|_| ()).unwrap_err(),
        ] {
            assert!(matches!(err, Error::Unsupported(Capability::EnergyMeter)));
        }
        assert!(mock.requests().is_empty());
    }

    #[tokio::test]
    async fn test_month_statistics_uses_record_dates() {
        let (meter, mock) = meter();
        mock.respond(json!({"emeter": {"get_daystat": {
            "day_list": [
                {"year": 2023, "month": 6, "day": 1, "energy": 120},
                {"year": 2023, "month": 6, "day": 2, "energy": 90}
            ],
            "err_code": 0
        }}}));

        // The arguments deliberately disagree with the records.
        let usage = meter.month_statistics(7, 2024).await.unwrap();

        assert_eq!(usage.len(), 2);
        assert_eq!(usage[&NaiveDate::from_ymd_opt(2023, 6, 1).unwrap()], 120.0);
        assert_eq!(usage[&NaiveDate::from_ymd_opt(2023, 6, 2).unwrap()], 90.0);
        assert_eq!(
            mock.requests()[0],
            json!({"emeter": {"get_daystat": {"month": 7, "year": 2024}}})
        );
    }

    #[tokio::test]
    async fn test_year_statistics() {
        let (meter, mock) = meter();
        mock.respond(json!({"emeter": {"get_monthstat": {
            "month_list": [
                {"year": 2023, "month": 1, "energy_wh": 4100},
                {"year": 2023, "month": 2, "energy_wh": 3800}
            ],
            "err_code": 0
        }}}));

        let usage = meter.year_statistics(2023).await.unwrap();

        assert_eq!(usage.get(&1), Some(&4100.0));
        assert_eq!(usage.get(&2), Some(&3800.0));
        assert_eq!(
            mock.requests()[0],
            json!({"emeter": {"get_monthstat": {"year": 2023}}})
        );
    }

    #[tokio::test]
    async fn test_duplicate_day_is_protocol_error() {
        let (meter, mock) = meter();
        mock.respond(json!({"emeter": {"get_daystat": {"day_list": [
            {"year": 2023, "month": 6, "day": 1, "energy": 1},
            {"year": 2023, "month": 6, "day": 1, "energy": 2}
        ]}}}));

        let err = meter.month_statistics(6, 2023).await.unwrap_err();
        assert!(err.is_protocol());
    }

    #[tokio::test]
    async fn test_erase_statistics_reports_failure() {
        let (meter, mock) = meter();
        mock.respond(json!({"emeter": {"erase_emeter_stat": {"err_code": -1, "err_msg": "failed"}}}));
        mock.respond(json!({"emeter": {"erase_emeter_stat": {"err_code": 0}}}));

        assert!(matches!(
            meter.erase_statistics().await,
            Err(Error::DeviceError { code: -1, .. })
        ));
        meter.erase_statistics().await.unwrap();

        assert_eq!(
            mock.requests()[1],
            json!({"emeter": {"erase_emeter_stat": null}})
        );
    }

    #[tokio::test]
    async fn test_refresh_power_independently() {
        let (mut meter, mock) = meter();
        mock.respond(json!({"emeter": {"get_realtime": {
            "voltage_mv": 231000, "current_ma": 100, "power_mw": 23100, "total_wh": 77, "err_code": 0
        }}}));

        let power = meter.refresh_power().await.unwrap();

        assert_eq!(power.voltage, 231.0);
        assert_eq!(meter.current_power_usage(), Some(power));
        assert!(!meter.is_on());
    }
}
