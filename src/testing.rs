// src/testing.rs
//
// Shared mocks for unit tests. Bus writes, delays and driver calls all land in
// one event log so ordering across the multiplexer and the devices can be
// asserted directly.

use crate::common::{
    channel::Channel,
    hal_traits::{MuxBus, MuxTimer},
    types::{Axis, AxisVector, SensorConfiguration},
};
use crate::mux::ChannelSelector;
use crate::session::{DriverFactory, ImuDriver};
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Call {
    Construct { address: u8 },
    Calibrate,
    Configure,
    Read(Axis),
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Event {
    MuxWrite { address: u8, value: u8 },
    Delay { us: u64 },
    /// `active` is the multiplexer control byte at the time of the call.
    Driver { active: u8, call: Call },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockBusError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockDriverError(pub Call);

struct PlannedFailure {
    mask: u8,
    call: Call,
    remaining: usize,
}

#[derive(Default)]
struct State {
    events: Vec<Event>,
    active: u8,
    now_us: u64,
    mux_failures: usize,
    driver_failures: Vec<PlannedFailure>,
    read_latency_us: u64,
    dropped_drivers: Vec<usize>,
}

impl State {
    fn driver_call(&mut self, call: Call) -> Result<(), MockDriverError> {
        let active = self.active;
        self.events.push(Event::Driver { active, call });
        let planned = self
            .driver_failures
            .iter_mut()
            .find(|f| f.mask == active && f.call == call && f.remaining > 0);
        match planned {
            Some(failure) => {
                failure.remaining -= 1;
                Err(MockDriverError(call))
            }
            None => Ok(()),
        }
    }
}

/// Owner of the shared state; hands out mocks wired to it.
#[derive(Clone, Default)]
pub struct Harness {
    state: Rc<RefCell<State>>,
}

impl Harness {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bus(&self) -> MockBus {
        MockBus { state: self.state.clone() }
    }

    pub fn timer(&self) -> MockTimer {
        MockTimer { state: self.state.clone() }
    }

    pub fn selector(&self) -> ChannelSelector<MockBus, MockTimer> {
        ChannelSelector::new(self.bus(), self.timer())
    }

    pub fn factory(&self) -> MockFactory {
        MockFactory { state: self.state.clone(), constructed: 0 }
    }

    pub fn events(&self) -> Vec<Event> {
        self.state.borrow().events.clone()
    }

    pub fn clear_events(&self) {
        self.state.borrow_mut().events.clear();
    }

    /// Control bytes that reached the multiplexer, in order.
    pub fn mux_writes(&self) -> Vec<u8> {
        self.state
            .borrow()
            .events
            .iter()
            .filter_map(|e| match e {
                Event::MuxWrite { value, .. } => Some(*value),
                _ => None,
            })
            .collect()
    }

    pub fn driver_calls(&self) -> Vec<Call> {
        self.state
            .borrow()
            .events
            .iter()
            .filter_map(|e| match e {
                Event::Driver { call, .. } => Some(*call),
                _ => None,
            })
            .collect()
    }

    pub fn active_mask(&self) -> u8 {
        self.state.borrow().active
    }

    pub fn now_us(&self) -> u64 {
        self.state.borrow().now_us
    }

    /// The next `count` multiplexer writes fail and leave no trace.
    pub fn fail_next_mux_writes(&self, count: usize) {
        self.state.borrow_mut().mux_failures = count;
    }

    /// Every axis read advances the clock by `us` without logging a delay.
    pub fn set_read_latency(&self, us: u64) {
        self.state.borrow_mut().read_latency_us = us;
    }

    /// Ids of drivers that have been dropped, in drop order.
    pub fn dropped_drivers(&self) -> Vec<usize> {
        self.state.borrow().dropped_drivers.clone()
    }

    /// `call` fails `times` times while `channel` is the active one.
    pub fn fail_driver(&self, channel: Channel, call: Call, times: usize) {
        self.state.borrow_mut().driver_failures.push(PlannedFailure {
            mask: channel.mask(),
            call,
            remaining: times,
        });
    }
}

pub struct MockBus {
    state: Rc<RefCell<State>>,
}

impl MuxBus for MockBus {
    type Error = MockBusError;

    fn write_byte(&mut self, address: u8, value: u8) -> Result<(), Self::Error> {
        let mut state = self.state.borrow_mut();
        if state.mux_failures > 0 {
            state.mux_failures -= 1;
            return Err(MockBusError);
        }
        state.active = value;
        state.events.push(Event::MuxWrite { address, value });
        Ok(())
    }
}

impl core::fmt::Debug for MockBus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("MockBus")
    }
}

/// Virtual clock: delays advance time instantly.
pub struct MockTimer {
    state: Rc<RefCell<State>>,
}

impl MockTimer {
    fn sleep(&mut self, us: u64) {
        let mut state = self.state.borrow_mut();
        state.now_us += us;
        state.events.push(Event::Delay { us });
    }
}

impl MuxTimer for MockTimer {
    fn delay_us(&mut self, us: u32) {
        self.sleep(us as u64);
    }

    fn delay_ms(&mut self, ms: u32) {
        self.sleep(ms as u64 * 1_000);
    }

    fn now_us(&self) -> u64 {
        self.state.borrow().now_us
    }
}

impl core::fmt::Debug for MockTimer {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("MockTimer")
    }
}

/// Returns (1,2,3) / (4,5,6) / (7,8,9) for accel / gyro / mag.
pub struct MockDriver {
    state: Rc<RefCell<State>>,
    id: usize,
}

impl MockDriver {
    /// Construction order, starting at zero.
    pub fn id(&self) -> usize {
        self.id
    }

    fn read(&mut self, axis: Axis, value: AxisVector) -> Result<AxisVector, MockDriverError> {
        let mut state = self.state.borrow_mut();
        state.now_us += state.read_latency_us;
        state.driver_call(Call::Read(axis))?;
        Ok(value)
    }
}

impl Drop for MockDriver {
    fn drop(&mut self) {
        if let Ok(mut state) = self.state.try_borrow_mut() {
            state.dropped_drivers.push(self.id);
        }
    }
}

impl core::fmt::Debug for MockDriver {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "MockDriver({})", self.id)
    }
}

impl ImuDriver for MockDriver {
    type Error = MockDriverError;

    fn calibrate(&mut self) -> Result<(), Self::Error> {
        self.state.borrow_mut().driver_call(Call::Calibrate)
    }

    fn configure(&mut self) -> Result<(), Self::Error> {
        self.state.borrow_mut().driver_call(Call::Configure)
    }

    fn read_accelerometer(&mut self) -> Result<AxisVector, Self::Error> {
        self.read(Axis::Accelerometer, AxisVector::new(1.0, 2.0, 3.0))
    }

    fn read_gyroscope(&mut self) -> Result<AxisVector, Self::Error> {
        self.read(Axis::Gyroscope, AxisVector::new(4.0, 5.0, 6.0))
    }

    fn read_magnetometer(&mut self) -> Result<AxisVector, Self::Error> {
        self.read(Axis::Magnetometer, AxisVector::new(7.0, 8.0, 9.0))
    }
}

pub struct MockFactory {
    state: Rc<RefCell<State>>,
    constructed: usize,
}

impl DriverFactory for MockFactory {
    type Driver = MockDriver;

    fn construct(
        &mut self,
        address: u8,
        _configuration: &SensorConfiguration,
    ) -> Result<MockDriver, MockDriverError> {
        self.state.borrow_mut().driver_call(Call::Construct { address })?;
        let id = self.constructed;
        self.constructed += 1;
        Ok(MockDriver { state: self.state.clone(), id })
    }
}
