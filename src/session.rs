//! Exclusive device session.
//!
//! [`Ctr700`] is the single point of truth for "is the device open": at most
//! one session exists per process, every native call is issued through it,
//! and it is the safe boundary between the driver's asynchronous interrupt
//! callback and observer notifications in this process.
//!
//! The native layer accepts one global callback entry point with no context
//! pointer, so dispatch state is held in a process-wide slot. A tri-state
//! lifecycle flag (`Open → Closing → Closed`) is shared between the session
//! and the callback trampoline; the trampoline reads it atomically and
//! becomes a no-op the moment teardown starts.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use once_cell::sync::OnceCell;

use crate::convert;
use crate::driver::NativeDriver;
use crate::error::{Error, Result};
use crate::types::{
    AnalogMode, CounterDirection, CounterMode, CounterTrigger, Diagnostics, DigitalInputEvent,
    DriverVersion, HardwareInfo, InterruptTrigger, PwmTimeBase, TemperatureSensor,
};

/// Supported major version of the native driver.
pub const DRIVER_VERSION_MAJOR: u8 = 2;
/// Minimum supported minor version of the native driver.
pub const DRIVER_VERSION_MINOR_MIN: u8 = 0;

/// Watchdog window in hardware mode, in milliseconds.
pub const WATCHDOG_TIMEOUT_MS: u32 = 1000;
/// Watchdog window in monitor-only mode, in milliseconds.
pub const WATCHDOG_MONITOR_TIMEOUT_MS: u32 = 900;

const LIFECYCLE_OPEN: u8 = 0;
const LIFECYCLE_CLOSING: u8 = 1;
const LIFECYCLE_CLOSED: u8 = 2;

/// Process-wide exclusivity guard; claimed by [`Ctr700::open`], released by
/// teardown.
static SESSION_ACTIVE: AtomicBool = AtomicBool::new(false);

/// Dispatch state of the live session, shared with the callback trampoline.
static DISPATCH: Mutex<Option<Arc<DispatchState>>> = Mutex::new(None);

type InputObserver = Arc<dyn Fn(DigitalInputEvent) + Send + Sync>;

struct DispatchState {
    lifecycle: AtomicU8,
    observers: Mutex<Vec<(u64, InputObserver)>>,
    next_observer_id: AtomicU64,
}

impl DispatchState {
    fn new() -> Self {
        DispatchState {
            lifecycle: AtomicU8::new(LIFECYCLE_OPEN),
            observers: Mutex::new(Vec::new()),
            next_observer_id: AtomicU64::new(0),
        }
    }
}

/// Handle returned by [`Ctr700::subscribe_digital_inputs`]; pass it back to
/// [`Ctr700::unsubscribe_digital_inputs`] to stop delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

/// Entry point handed to the native layer for every channel registration.
///
/// Runs on a driver-owned thread. Must never panic and must not touch any
/// session state once teardown has started, so everything it uses sits
/// behind the process-wide slot and the atomic lifecycle flag.
unsafe extern "C" fn input_trampoline(channel: u8, state: u8) {
    dispatch_input(channel, state != 0);
}

fn dispatch_input(channel: u8, state: bool) {
    let observers: Vec<InputObserver> = {
        let slot = match DISPATCH.lock() {
            Ok(slot) => slot,
            Err(_) => return,
        };
        let Some(dispatch) = slot.as_ref() else {
            return;
        };
        if dispatch.lifecycle.load(Ordering::Acquire) != LIFECYCLE_OPEN {
            return;
        }
        let list = match dispatch.observers.lock() {
            Ok(list) => list,
            Err(_) => return,
        };
        list.iter().map(|(_, observer)| Arc::clone(observer)).collect()
    };
    // Locks are released here; observers run unsynchronized with the owner
    // thread and may take as long as they like, stalling only the driver's
    // callback thread.
    let event = DigitalInputEvent { channel, state };
    for observer in &observers {
        observer(event);
    }
}

/// Exclusive session with the CTR-700 I/O driver.
///
/// Created by [`Ctr700::open`]; at most one instance is live per process.
/// All I/O and lifecycle operations are issued from the owning thread. The
/// session is closed explicitly with [`Ctr700::close`] or implicitly on
/// drop; afterwards every operation fails with [`Error::SessionClosed`].
pub struct Ctr700 {
    driver: Arc<dyn NativeDriver>,
    version: DriverVersion,
    hardware_info: OnceCell<HardwareInfo>,
    /// Channels with an active native interrupt registration. Mirrors the
    /// native layer exactly: entries are added/removed only after the
    /// corresponding native call succeeded.
    registered: HashSet<u8>,
    dispatch: Arc<DispatchState>,
}

impl Ctr700 {
    /// Opens the exclusive driver session.
    ///
    /// Fails with [`Error::AlreadyActive`] if another session is live in
    /// this process, with [`Error::UnsupportedVersion`] if the native driver
    /// does not match major version `2`, and with [`Error::Native`] if the
    /// native initialization fails. On failure the exclusivity guard is
    /// released again.
    pub fn open(driver: Arc<dyn NativeDriver>) -> Result<Self> {
        if SESSION_ACTIVE
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(Error::AlreadyActive);
        }

        match Self::open_unguarded(driver) {
            Ok(session) => Ok(session),
            Err(err) => {
                SESSION_ACTIVE.store(false, Ordering::Release);
                Err(err)
            }
        }
    }

    fn open_unguarded(driver: Arc<dyn NativeDriver>) -> Result<Self> {
        let version = driver.version().map_err(Error::Native)?;
        if version.major != DRIVER_VERSION_MAJOR || version.minor < DRIVER_VERSION_MINOR_MIN {
            return Err(Error::UnsupportedVersion {
                major: version.major,
                minor: version.minor,
            });
        }

        driver.initialize().map_err(Error::Native)?;

        let dispatch = Arc::new(DispatchState::new());
        *DISPATCH.lock().unwrap_or_else(PoisonError::into_inner) = Some(Arc::clone(&dispatch));

        log::info!("CTR-700 driver session opened (driver version {version})");
        Ok(Ctr700 {
            driver,
            version,
            hardware_info: OnceCell::new(),
            registered: HashSet::new(),
            dispatch,
        })
    }

    /// The version of the native I/O driver.
    pub fn version(&self) -> DriverVersion {
        self.version
    }

    /// Whether the session has been closed.
    pub fn is_closed(&self) -> bool {
        self.dispatch.lifecycle.load(Ordering::Acquire) != LIFECYCLE_OPEN
    }

    fn guard_open(&self) -> Result<()> {
        if self.is_closed() {
            Err(Error::SessionClosed)
        } else {
            Ok(())
        }
    }

    /// The hardware capability record.
    ///
    /// Fetched from the native driver on first call and cached; the returned
    /// values never change for the lifetime of the session.
    pub fn hardware_info(&self) -> Result<HardwareInfo> {
        self.guard_open()?;
        self.hardware_info
            .get_or_try_init(|| self.driver.hardware_info().map_err(Error::Native))
            .copied()
    }

    /// Milliseconds elapsed since the system started.
    pub fn tick_count(&self) -> Result<u32> {
        self.guard_open()?;
        self.driver.tick_count().map_err(Error::Native)
    }

    /// Turns the run LED on or off.
    pub fn set_run_led(&self, on: bool) -> Result<()> {
        self.guard_open()?;
        self.driver.set_run_led(on).map_err(Error::Native)
    }

    /// Turns the error LED on or off.
    pub fn set_error_led(&self, on: bool) -> Result<()> {
        self.guard_open()?;
        self.driver.set_error_led(on).map_err(Error::Native)
    }

    /// Whether the run switch is in the Run position.
    ///
    /// The native signal is `true` in the *stop* position; this is the
    /// single place where it is inverted to mean the affirmative condition.
    pub fn run_switch(&self) -> Result<bool> {
        self.guard_open()?;
        let stop = self.driver.run_switch().map_err(Error::Native)?;
        Ok(!stop)
    }

    /// Whether the config switch (DIP 4) is on.
    pub fn config_enabled(&self) -> Result<bool> {
        self.guard_open()?;
        self.driver.config_enabled().map_err(Error::Native)
    }

    /// Whether the power-fail signal is set (supply below ~18.2 V).
    pub fn power_fail(&self) -> Result<bool> {
        self.guard_open()?;
        self.driver.power_fail().map_err(Error::Native)
    }

    /// Diagnostic flags, normalized so `true` always means a fault.
    pub fn diagnostics(&self) -> Result<Diagnostics> {
        self.guard_open()?;
        let raw = self.driver.diag_info().map_err(Error::Native)?;
        Ok(Diagnostics {
            // The native power signal is high while the supply is present.
            digital_output_power_fail: !raw.digital_out_power,
            digital_output_fault: raw.digital_out_fault,
            digital_input_fault: raw.digital_in_fault,
            usb_over_current: raw.usb_over_current,
        })
    }

    /// Whether the EXT_FAIL signal on the backplane bus is set.
    pub fn ext_fail(&self) -> Result<bool> {
        self.guard_open()?;
        self.driver.ext_fail().map_err(Error::Native)
    }

    /// Drives the EXT_RESET signal on the backplane bus.
    pub fn set_ext_reset(&self, enable: bool) -> Result<()> {
        self.guard_open()?;
        self.driver.set_ext_reset(enable).map_err(Error::Native)
    }

    /// Enables the system watchdog.
    ///
    /// Once enabled, [`service_watchdog`](Self::service_watchdog) must be
    /// called within [`WATCHDOG_TIMEOUT_MS`] (or
    /// [`WATCHDOG_MONITOR_TIMEOUT_MS`] in monitor-only mode), otherwise
    /// servicing fails with a watchdog timeout code.
    pub fn enable_watchdog(&self, monitor_only: bool) -> Result<()> {
        self.guard_open()?;
        self.driver
            .enable_watchdog(monitor_only)
            .map_err(Error::Native)
    }

    /// Services the watchdog.
    pub fn service_watchdog(&self) -> Result<()> {
        self.guard_open()?;
        self.driver.service_watchdog().map_err(Error::Native)
    }

    /// Reads a digital input channel.
    pub fn digital_input(&self, channel: u8) -> Result<bool> {
        self.guard_open()?;
        self.driver.digital_input(channel).map_err(Error::Native)
    }

    /// Sets a digital output channel.
    pub fn set_digital_output(&self, channel: u8, on: bool) -> Result<()> {
        self.guard_open()?;
        self.driver
            .set_digital_output(channel, on)
            .map_err(Error::Native)
    }

    /// Sets a relay output channel.
    pub fn set_relay(&self, channel: u8, on: bool) -> Result<()> {
        self.guard_open()?;
        self.driver.set_relay(channel, on).map_err(Error::Native)
    }

    /// Enables or disables interrupt events for a digital input channel.
    ///
    /// With a trigger other than [`InterruptTrigger::None`] the channel is
    /// registered with the native layer; registering an already registered
    /// channel is a no-op and does *not* change the trigger — disable the
    /// channel first to re-register with a different edge. With
    /// [`InterruptTrigger::None`] the channel is unregistered; a channel
    /// that is not registered is left untouched and no native call is made.
    ///
    /// The local registration set is updated only after the native call
    /// succeeded, so a failure leaves no inconsistent state behind.
    pub fn set_digital_input_events(
        &mut self,
        channel: u8,
        trigger: InterruptTrigger,
    ) -> Result<()> {
        self.guard_open()?;
        if trigger == InterruptTrigger::None {
            if self.registered.contains(&channel) {
                self.driver
                    .unregister_input_callback(channel)
                    .map_err(Error::Native)?;
                self.registered.remove(&channel);
                log::debug!("input events disabled for channel {channel}");
            }
        } else if !self.registered.contains(&channel) {
            self.driver
                .register_input_callback(channel, input_trampoline, trigger)
                .map_err(Error::Native)?;
            self.registered.insert(channel);
            log::debug!("input events enabled for channel {channel} ({trigger:?})");
        }
        Ok(())
    }

    /// Adds an observer for digital input change events.
    ///
    /// Events are only produced for channels that were enabled with
    /// [`set_digital_input_events`](Self::set_digital_input_events);
    /// observers control who is notified, registration controls whether the
    /// native layer calls back at all. Observers run synchronously on the
    /// driver's callback thread and should hand work off quickly.
    pub fn subscribe_digital_inputs<F>(&self, observer: F) -> ObserverId
    where
        F: Fn(DigitalInputEvent) + Send + Sync + 'static,
    {
        let id = self.dispatch.next_observer_id.fetch_add(1, Ordering::Relaxed);
        self.dispatch
            .observers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, Arc::new(observer)));
        ObserverId(id)
    }

    /// Removes a previously added observer. Unknown ids are ignored.
    pub fn unsubscribe_digital_inputs(&self, id: ObserverId) {
        self.dispatch
            .observers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|(observer_id, _)| *observer_id != id.0);
    }

    /// Enables or disables a counter channel.
    pub fn enable_counter(&self, channel: u8, enable: bool) -> Result<()> {
        self.guard_open()?;
        self.driver
            .counter_enable(channel, enable)
            .map_err(Error::Native)
    }

    /// Configures mode, trigger and direction of a counter channel.
    pub fn set_counter_mode(
        &self,
        channel: u8,
        mode: CounterMode,
        trigger: CounterTrigger,
        direction: CounterDirection,
    ) -> Result<()> {
        self.guard_open()?;
        self.driver
            .counter_set_mode(channel, mode, trigger, direction)
            .map_err(Error::Native)
    }

    /// Sets the initial value of a counter channel.
    pub fn set_counter_preload(&self, channel: u8, preload: i32) -> Result<()> {
        self.guard_open()?;
        self.driver
            .counter_set_preload(channel, preload)
            .map_err(Error::Native)
    }

    /// Reads the current value of a counter channel.
    pub fn counter_value(&self, channel: u8) -> Result<i32> {
        self.guard_open()?;
        self.driver.counter_value(channel).map_err(Error::Native)
    }

    /// Sets the time base of a PWM output channel.
    pub fn set_pwm_time_base(&self, channel: u8, time_base: PwmTimeBase) -> Result<()> {
        self.guard_open()?;
        self.driver
            .pwm_set_time_base(channel, time_base)
            .map_err(Error::Native)
    }

    /// Sets period and pulse length ("on" time) of a PWM output channel.
    ///
    /// New parameters are applied when the channel is (re-)enabled with
    /// [`enable_pwm`](Self::enable_pwm). The period must not exceed
    /// [`convert::max_pwm_period`] for the configured time base.
    pub fn set_pwm_params(&self, channel: u8, period: u16, pulse_len: u16) -> Result<()> {
        self.guard_open()?;
        self.driver
            .pwm_set_param(channel, period, pulse_len)
            .map_err(Error::Native)
    }

    /// Starts or stops a PWM output channel.
    pub fn enable_pwm(&self, channel: u8, run: bool) -> Result<()> {
        self.guard_open()?;
        self.driver.pwm_enable(channel, run).map_err(Error::Native)
    }

    /// Reads the raw value of an analog input channel.
    pub fn analog_input(&self, channel: u8) -> Result<u16> {
        self.guard_open()?;
        self.driver.analog_value(channel).map_err(Error::Native)
    }

    /// Reads an analog input channel converted to volts or amperes
    /// according to `mode`.
    pub fn analog_input_scaled(&self, channel: u8, mode: AnalogMode) -> Result<f32> {
        let raw = self.analog_input(channel)?;
        Ok(match mode {
            AnalogMode::Voltage => convert::adc_to_volts(raw),
            AnalogMode::Current => convert::adc_to_amperes(raw),
        })
    }

    /// Sets the measurement mode of an analog input channel.
    pub fn set_analog_mode(&self, channel: u8, mode: AnalogMode) -> Result<()> {
        self.guard_open()?;
        self.driver
            .analog_set_mode(channel, mode)
            .map_err(Error::Native)
    }

    /// Reads a temperature sensor, raw fixed-point value.
    pub fn temperature_raw(&self, sensor: TemperatureSensor) -> Result<i32> {
        self.guard_open()?;
        self.driver
            .temperature_value(sensor)
            .map_err(Error::Native)
    }

    /// Reads a temperature sensor in degrees Celsius (0.5 °C resolution).
    pub fn temperature(&self, sensor: TemperatureSensor) -> Result<f32> {
        Ok(convert::temperature_celsius(self.temperature_raw(sensor)?))
    }

    /// Closes the session: unregisters all interrupt channels, shuts the
    /// native driver down and releases the process-wide exclusivity guard.
    ///
    /// Idempotent — closing an already closed session is a no-op. Native
    /// failures during teardown are logged and swallowed; teardown always
    /// completes so a new session can be opened afterwards.
    pub fn close(&mut self) {
        self.close_impl();
    }

    fn close_impl(&mut self) {
        // Exactly one caller wins the Open -> Closing transition; everyone
        // else (second close, drop after close) sees Closing/Closed and
        // returns. The trampoline stops dispatching at this store.
        if self
            .dispatch
            .lifecycle
            .compare_exchange(
                LIFECYCLE_OPEN,
                LIFECYCLE_CLOSING,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_err()
        {
            return;
        }

        for channel in std::mem::take(&mut self.registered) {
            if let Err(code) = self.driver.unregister_input_callback(channel) {
                log::warn!("failed to unregister input channel {channel} during teardown: {code}");
            }
        }

        if let Err(code) = self.driver.shutdown() {
            log::warn!("native driver shutdown failed: {code}");
        }

        *DISPATCH.lock().unwrap_or_else(PoisonError::into_inner) = None;
        self.dispatch
            .lifecycle
            .store(LIFECYCLE_CLOSED, Ordering::Release);
        SESSION_ACTIVE.store(false, Ordering::Release);
        log::info!("CTR-700 driver session closed");
    }
}

impl Drop for Ctr700 {
    fn drop(&mut self) {
        self.close_impl();
    }
}

impl std::fmt::Debug for Ctr700 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ctr700")
            .field("version", &self.version)
            .field("closed", &self.is_closed())
            .field("registered_channels", &self.registered.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::MockDriver;
    use crate::types::ResultCode;
    use serial_test::serial;
    use std::sync::atomic::AtomicUsize;

    fn open_mock() -> (Arc<MockDriver>, Ctr700) {
        let mock = Arc::new(MockDriver::new());
        let session = Ctr700::open(mock.clone()).unwrap();
        (mock, session)
    }

    #[test]
    #[serial]
    fn second_open_fails_while_active() {
        let (_mock, session) = open_mock();
        let err = Ctr700::open(Arc::new(MockDriver::new())).unwrap_err();
        assert_eq!(err, Error::AlreadyActive);
        drop(session);
        // After teardown a fresh session may be opened.
        let (_mock, _session) = open_mock();
    }

    #[test]
    #[serial]
    fn unsupported_version_is_rejected_and_releases_guard() {
        for (major, minor) in [(1, 4), (3, 0)] {
            let mock = Arc::new(MockDriver::new());
            mock.set_reported_version(major, minor);
            let err = Ctr700::open(mock.clone()).unwrap_err();
            assert_eq!(err, Error::UnsupportedVersion { major, minor });
            // The failed open must not leave the driver initialized.
            assert!(!mock.is_initialized());
        }
        // The guard was released each time.
        let (_mock, _session) = open_mock();
    }

    #[test]
    #[serial]
    fn newer_minor_versions_are_accepted() {
        let mock = Arc::new(MockDriver::new());
        mock.set_reported_version(2, 5);
        let session = Ctr700::open(mock).unwrap();
        assert_eq!(session.version().to_string(), "2.5");
    }

    #[test]
    #[serial]
    fn failed_initialize_surfaces_code_and_releases_guard() {
        let mock = Arc::new(MockDriver::new());
        mock.fail_next("initialize", ResultCode::DevAccessFailed);
        let err = Ctr700::open(mock).unwrap_err();
        assert_eq!(err, Error::Native(ResultCode::DevAccessFailed));
        let (_mock, _session) = open_mock();
    }

    #[test]
    #[serial]
    fn operations_after_close_fail_and_close_is_idempotent() {
        let (mock, mut session) = open_mock();
        session.close();
        session.close();
        assert_eq!(mock.call_count("shutdown"), 1);
        assert_eq!(session.digital_input(0), Err(Error::SessionClosed));
        assert_eq!(session.hardware_info(), Err(Error::SessionClosed));
        assert_eq!(session.set_run_led(true), Err(Error::SessionClosed));
        assert_eq!(session.service_watchdog(), Err(Error::SessionClosed));
        assert_eq!(
            session.set_digital_input_events(0, InterruptTrigger::RisingEdge),
            Err(Error::SessionClosed)
        );
    }

    #[test]
    #[serial]
    fn hardware_info_is_fetched_once() {
        let (mock, session) = open_mock();
        let first = session.hardware_info().unwrap();
        let second = session.hardware_info().unwrap();
        assert_eq!(first, second);
        assert_eq!(first.digital_inputs, 16);
        assert_eq!(mock.call_count("hardware_info"), 1);
    }

    #[test]
    #[serial]
    fn registering_twice_issues_one_native_call() {
        let (mock, mut session) = open_mock();
        session
            .set_digital_input_events(4, InterruptTrigger::RisingEdge)
            .unwrap();
        session
            .set_digital_input_events(4, InterruptTrigger::FallingEdge)
            .unwrap();
        assert_eq!(mock.call_count("register_input_callback"), 1);
        // The second call did not change the trigger either.
        assert_eq!(
            mock.registered_trigger(4),
            Some(InterruptTrigger::RisingEdge)
        );
    }

    #[test]
    #[serial]
    fn disabling_an_unregistered_channel_issues_no_native_call() {
        let (mock, mut session) = open_mock();
        session
            .set_digital_input_events(7, InterruptTrigger::None)
            .unwrap();
        assert_eq!(mock.call_count("unregister_input_callback"), 0);
    }

    #[test]
    #[serial]
    fn registration_failure_leaves_local_state_untouched() {
        let (mock, mut session) = open_mock();
        mock.fail_next("register_input_callback", ResultCode::InvalidChannel);
        let err = session
            .set_digital_input_events(3, InterruptTrigger::BothEdges)
            .unwrap_err();
        assert_eq!(err, Error::Native(ResultCode::InvalidChannel));
        // Not considered registered, so disabling is still a silent no-op.
        session
            .set_digital_input_events(3, InterruptTrigger::None)
            .unwrap();
        assert_eq!(mock.call_count("unregister_input_callback"), 0);
    }

    #[test]
    #[serial]
    fn teardown_unregisters_every_channel() {
        let (mock, mut session) = open_mock();
        for channel in [0, 5, 9] {
            session
                .set_digital_input_events(channel, InterruptTrigger::BothEdges)
                .unwrap();
        }
        assert_eq!(mock.registered_channels(), vec![0, 5, 9]);
        session.close();
        assert_eq!(mock.call_count("unregister_input_callback"), 3);
        assert_eq!(mock.call_count("shutdown"), 1);
        assert!(mock.registered_channels().is_empty());
        assert!(!mock.is_initialized());
    }

    #[test]
    #[serial]
    fn status_and_signal_operations_pass_through() {
        let (mock, session) = open_mock();
        mock.set_tick_count(123_456);
        assert_eq!(session.tick_count(), Ok(123_456));
        mock.set_config_enabled(true);
        assert_eq!(session.config_enabled(), Ok(true));
        assert_eq!(session.power_fail(), Ok(false));
        assert_eq!(session.ext_fail(), Ok(false));
        session.set_ext_reset(true).unwrap();
        assert!(mock.ext_reset());
        session.set_run_led(true).unwrap();
        session.set_error_led(true).unwrap();
        assert!(mock.run_led());
        assert!(mock.error_led());
    }

    #[test]
    #[serial]
    fn observers_receive_events_until_unsubscribed() {
        let (mock, mut session) = open_mock();
        session
            .set_digital_input_events(2, InterruptTrigger::BothEdges)
            .unwrap();

        let events: Arc<Mutex<Vec<DigitalInputEvent>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        let id = session.subscribe_digital_inputs(move |event| {
            sink.lock().unwrap().push(event);
        });

        assert!(mock.fire_input(2, true));
        assert!(mock.fire_input(2, false));
        assert_eq!(
            events.lock().unwrap().as_slice(),
            &[
                DigitalInputEvent {
                    channel: 2,
                    state: true
                },
                DigitalInputEvent {
                    channel: 2,
                    state: false
                }
            ]
        );

        session.unsubscribe_digital_inputs(id);
        mock.fire_input(2, true);
        assert_eq!(events.lock().unwrap().len(), 2);
    }

    #[test]
    #[serial]
    fn callback_after_close_is_a_safe_no_op() {
        let (mock, mut session) = open_mock();
        session
            .set_digital_input_events(1, InterruptTrigger::RisingEdge)
            .unwrap();

        let fired = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&fired);
        session.subscribe_digital_inputs(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        // Keep the raw entry point as the driver thread would, then close.
        let callback = mock.registered_callback(1).unwrap();
        session.close();
        unsafe { callback(1, 1) };
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[test]
    #[serial]
    fn run_switch_polarity_is_inverted_once() {
        let (mock, session) = open_mock();
        mock.set_run_switch_stop(true);
        assert_eq!(session.run_switch(), Ok(false));
        mock.set_run_switch_stop(false);
        assert_eq!(session.run_switch(), Ok(true));
    }

    #[test]
    #[serial]
    fn diagnostics_normalize_power_fail_polarity() {
        let (mock, session) = open_mock();
        // Healthy device: supply present, no faults.
        let diag = session.diagnostics().unwrap();
        assert!(!diag.digital_output_power_fail);

        mock.set_diagnostics(crate::driver::RawDiagnostics {
            digital_out_power: false,
            digital_out_fault: true,
            digital_in_fault: false,
            usb_over_current: false,
        });
        let diag = session.diagnostics().unwrap();
        assert!(diag.digital_output_power_fail);
        assert!(diag.digital_output_fault);
    }

    #[test]
    #[serial]
    fn temperature_uses_fixed_point_conversion() {
        let (mock, session) = open_mock();
        mock.set_temperature_raw(TemperatureSensor::Cpu, 215);
        assert_eq!(session.temperature(TemperatureSensor::Cpu), Ok(0.0215));
        mock.set_temperature_raw(TemperatureSensor::System, 425000);
        assert_eq!(session.temperature(TemperatureSensor::System), Ok(42.5));
    }

    #[test]
    #[serial]
    fn scaled_analog_reads_convert_per_mode() {
        let (mock, session) = open_mock();
        mock.set_analog_raw(0, 28151);
        let volts = session.analog_input_scaled(0, AnalogMode::Voltage).unwrap();
        assert!((volts - 10.0).abs() < 1e-5);
        mock.set_analog_raw(1, 24394);
        let amps = session.analog_input_scaled(1, AnalogMode::Current).unwrap();
        assert!((amps - 0.02).abs() < 1e-7);
    }

    #[test]
    #[serial]
    fn counter_and_pwm_operations_pass_through() {
        let (mock, session) = open_mock();
        session
            .set_counter_mode(
                0,
                CounterMode::Counter,
                CounterTrigger::RisingEdge,
                CounterDirection::Up,
            )
            .unwrap();
        session.set_counter_preload(0, -250).unwrap();
        session.enable_counter(0, true).unwrap();
        assert_eq!(session.counter_value(0), Ok(-250));

        session.set_pwm_time_base(1, PwmTimeBase::Ms1).unwrap();
        session.set_pwm_params(1, 1000, 250).unwrap();
        session.enable_pwm(1, true).unwrap();
        session.set_analog_mode(0, AnalogMode::Current).unwrap();
        assert_eq!(mock.call_count("pwm_set_param"), 1);
        assert_eq!(mock.call_count("analog_set_mode"), 1);

        // A/B decoder channels sit on the same counter unit.
        session
            .set_counter_mode(
                0,
                CounterMode::AbDecoder,
                CounterTrigger::BothEdges,
                CounterDirection::Down,
            )
            .unwrap();
        assert_eq!(mock.call_count("counter_set_mode"), 2);
    }

    #[test]
    #[serial]
    fn native_errors_carry_the_code_verbatim() {
        let (mock, session) = open_mock();
        mock.fail_next("service_watchdog", ResultCode::WatchdogTimeout);
        assert_eq!(
            session.service_watchdog(),
            Err(Error::Native(ResultCode::WatchdogTimeout))
        );
        // Recoverable per contract: re-enable and service again.
        session.enable_watchdog(false).unwrap();
        session.service_watchdog().unwrap();
    }
}
