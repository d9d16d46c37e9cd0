// src/session/mod.rs

pub mod driver;

pub use driver::{DriverFactory, ImuDriver};

use crate::common::{
    channel::Channel,
    error::{InitError, ReadError},
    hal_traits::{MuxBus, MuxTimer},
    types::{Axis, SensorConfiguration, SensorReading},
};
use crate::mux::ChannelSelector;
use log::{debug, info, warn};

/// One sensor bound to one multiplexer channel.
///
/// Calibration and configuration live inside the driver and are applied
/// exactly once, in [`init`](Self::init). A session is only ever handed out
/// fully initialized.
#[derive(Debug)]
pub struct DeviceSession<D>
where
    D: ImuDriver,
{
    channel: Channel,
    driver: D,
    configuration: SensorConfiguration,
}

impl<D> DeviceSession<D>
where
    D: ImuDriver,
{
    /// Selects `channel`, constructs the driver at the shared device address,
    /// then calibrates and configures it.
    pub fn init<B, T, F>(
        selector: &mut ChannelSelector<B, T>,
        factory: &mut F,
        channel: Channel,
        configuration: SensorConfiguration,
    ) -> Result<Self, InitError<B::Error, D::Error>>
    where
        B: MuxBus,
        T: MuxTimer,
        F: DriverFactory<Driver = D>,
    {
        debug!("channel {}: initializing session", channel);
        selector.select(channel)?;

        let mut driver = factory
            .construct(configuration.address, &configuration)
            .map_err(InitError::DriverConstructFailed)?;
        debug!("channel {}: driver constructed at {:#04x}", channel, configuration.address);

        driver.calibrate().map_err(InitError::CalibrationFailed)?;
        debug!("channel {}: calibrated", channel);

        driver.configure().map_err(InitError::ConfigurationFailed)?;
        info!("channel {}: session ready", channel);

        Ok(DeviceSession {
            channel,
            driver,
            configuration,
        })
    }

    /// Selects this session's channel (always, never trusting an earlier
    /// select) and reads accelerometer, gyroscope, magnetometer in order.
    ///
    /// All-or-nothing: the first failing axis aborts the read.
    pub fn read<B, T>(
        &mut self,
        selector: &mut ChannelSelector<B, T>,
    ) -> Result<SensorReading, ReadError<B::Error, D::Error>>
    where
        B: MuxBus,
        T: MuxTimer,
    {
        selector.select(self.channel)?;

        let channel = self.channel;
        let driver = &mut self.driver;
        let axis_failed = |axis: Axis| {
            move |error: D::Error| {
                warn!("channel {}: {} read failed: {:?}", channel, axis, error);
                ReadError::<B::Error, D::Error>::AxisReadFailure { axis, error }
            }
        };

        let accel = driver
            .read_accelerometer()
            .map_err(axis_failed(Axis::Accelerometer))?;
        let gyro = driver
            .read_gyroscope()
            .map_err(axis_failed(Axis::Gyroscope))?;
        let mag = driver
            .read_magnetometer()
            .map_err(axis_failed(Axis::Magnetometer))?;

        Ok(SensorReading {
            channel,
            accel,
            gyro,
            mag,
            timestamp_us: selector.now_us(),
        })
    }

    pub fn channel(&self) -> Channel {
        self.channel
    }

    pub fn configuration(&self) -> &SensorConfiguration {
        &self.configuration
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::error::ChannelError;
    use crate::common::types::AxisVector;
    use crate::testing::{Call, Event, Harness};

    fn ch(index: u8) -> Channel {
        Channel::new(index).unwrap()
    }

    #[test]
    fn test_init_runs_steps_in_order_on_selected_channel() {
        let harness = Harness::new();
        let mut selector = harness.selector();
        let mut factory = harness.factory();

        let session =
            DeviceSession::init(&mut selector, &mut factory, ch(3), SensorConfiguration::default())
                .unwrap();

        assert_eq!(session.channel(), ch(3));
        assert_eq!(session.configuration().address, 0x69);
        assert_eq!(
            harness.events(),
            vec![
                Event::MuxWrite { address: 0x70, value: 0x08 },
                Event::Delay { us: 50_000 },
                Event::Driver { active: 0x08, call: Call::Construct { address: 0x69 } },
                Event::Driver { active: 0x08, call: Call::Calibrate },
                Event::Driver { active: 0x08, call: Call::Configure },
            ]
        );
    }

    #[test]
    fn test_init_select_failure_skips_driver() {
        let harness = Harness::new();
        let mut selector = harness.selector();
        let mut factory = harness.factory();
        harness.fail_next_mux_writes(1);

        let result =
            DeviceSession::init(&mut selector, &mut factory, ch(2), SensorConfiguration::default());
        assert!(matches!(result, Err(InitError::SelectFailed(ChannelError::BusFailure(_)))));
        assert!(harness.driver_calls().is_empty());
    }

    #[test]
    fn test_init_maps_each_step_failure() {
        for (call, expect) in [
            (Call::Construct { address: 0x69 }, "construct"),
            (Call::Calibrate, "calibrate"),
            (Call::Configure, "configure"),
        ] {
            let harness = Harness::new();
            let mut selector = harness.selector();
            let mut factory = harness.factory();
            harness.fail_driver(ch(1), call, 1);

            let result = DeviceSession::init(
                &mut selector,
                &mut factory,
                ch(1),
                SensorConfiguration::default(),
            );
            let matched = match (&result, expect) {
                (Err(InitError::DriverConstructFailed(_)), "construct") => true,
                (Err(InitError::CalibrationFailed(_)), "calibrate") => true,
                (Err(InitError::ConfigurationFailed(_)), "configure") => true,
                _ => false,
            };
            assert!(matched, "step {} mapped to {:?}", expect, result);
        }
    }

    #[test]
    fn test_calibration_failure_stops_before_configure() {
        let harness = Harness::new();
        let mut selector = harness.selector();
        let mut factory = harness.factory();
        harness.fail_driver(ch(4), Call::Calibrate, 1);

        let _ = DeviceSession::init(&mut selector, &mut factory, ch(4), SensorConfiguration::default());
        assert!(!harness.driver_calls().contains(&Call::Configure));
    }

    #[test]
    fn test_read_reselects_and_reads_axes_in_order() {
        let harness = Harness::new();
        let mut selector = harness.selector();
        let mut factory = harness.factory();
        let mut session =
            DeviceSession::init(&mut selector, &mut factory, ch(5), SensorConfiguration::default())
                .unwrap();

        // Someone else moved the multiplexer; the session must not care
        selector.select(ch(0)).unwrap();
        harness.clear_events();

        let reading = session.read(&mut selector).unwrap();
        assert_eq!(reading.channel, ch(5));
        assert_eq!(reading.accel, AxisVector::new(1.0, 2.0, 3.0));
        assert_eq!(reading.gyro, AxisVector::new(4.0, 5.0, 6.0));
        assert_eq!(reading.mag, AxisVector::new(7.0, 8.0, 9.0));
        assert_eq!(reading.timestamp_us, harness.now_us());

        assert_eq!(
            harness.events(),
            vec![
                Event::MuxWrite { address: 0x70, value: 0x20 },
                Event::Delay { us: 50_000 },
                Event::Driver { active: 0x20, call: Call::Read(Axis::Accelerometer) },
                Event::Driver { active: 0x20, call: Call::Read(Axis::Gyroscope) },
                Event::Driver { active: 0x20, call: Call::Read(Axis::Magnetometer) },
            ]
        );
    }

    #[test]
    fn test_read_selects_even_when_already_active() {
        let harness = Harness::new();
        let mut selector = harness.selector();
        let mut factory = harness.factory();
        let mut session =
            DeviceSession::init(&mut selector, &mut factory, ch(2), SensorConfiguration::default())
                .unwrap();

        session.read(&mut selector).unwrap();
        session.read(&mut selector).unwrap();
        // init + two reads, one select each
        assert_eq!(harness.mux_writes(), vec![0x04, 0x04, 0x04]);
    }

    #[test]
    fn test_read_select_failure_skips_driver() {
        let harness = Harness::new();
        let mut selector = harness.selector();
        let mut factory = harness.factory();
        let mut session =
            DeviceSession::init(&mut selector, &mut factory, ch(2), SensorConfiguration::default())
                .unwrap();
        harness.clear_events();
        harness.fail_next_mux_writes(1);

        let result = session.read(&mut selector);
        assert!(matches!(result, Err(ReadError::SelectFailed(ChannelError::BusFailure(_)))));
        assert!(harness.driver_calls().is_empty());
    }

    #[test]
    fn test_axis_failure_is_all_or_nothing() {
        let harness = Harness::new();
        let mut selector = harness.selector();
        let mut factory = harness.factory();
        let mut session =
            DeviceSession::init(&mut selector, &mut factory, ch(6), SensorConfiguration::default())
                .unwrap();
        harness.clear_events();
        harness.fail_driver(ch(6), Call::Read(Axis::Gyroscope), 1);

        let result = session.read(&mut selector);
        assert!(matches!(
            result,
            Err(ReadError::AxisReadFailure { axis: Axis::Gyroscope, .. })
        ));
        // Magnetometer never attempted
        assert_eq!(
            harness.driver_calls(),
            vec![Call::Read(Axis::Accelerometer), Call::Read(Axis::Gyroscope)]
        );

        // Transient: the next cycle reads normally
        assert!(session.read(&mut selector).is_ok());
    }

    #[test]
    fn test_calibration_never_reruns_after_init() {
        let harness = Harness::new();
        let mut selector = harness.selector();
        let mut factory = harness.factory();
        let mut session =
            DeviceSession::init(&mut selector, &mut factory, ch(7), SensorConfiguration::default())
                .unwrap();
        for _ in 0..5 {
            session.read(&mut selector).unwrap();
        }
        let calls = harness.driver_calls();
        assert_eq!(calls.iter().filter(|c| **c == Call::Calibrate).count(), 1);
        assert_eq!(calls.iter().filter(|c| **c == Call::Configure).count(), 1);
        assert_eq!(session.driver().id(), 0);
    }
}
