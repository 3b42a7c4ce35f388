//! Mock driver backend for tests and host-side simulation.
//!
//! Behaves like the native library as far as the session layer can observe:
//! channel ranges are validated against the configured capability record,
//! interrupt callbacks are held per channel and can be fired on demand, and
//! any operation can be scripted to fail once with a chosen result code.
//! Every operation bumps a per-name call counter so tests can assert exactly
//! which native calls were issued.

use std::collections::HashMap;
use std::sync::Mutex;

use super::{NativeDriver, RawDiagnostics, RawInputCallback};
use crate::types::{
    AnalogMode, CounterDirection, CounterMode, CounterTrigger, DriverVersion, HardwareInfo,
    InterruptTrigger, PwmTimeBase, ResultCode, TemperatureSensor,
};

struct MockState {
    initialized: bool,
    version: DriverVersion,
    hardware_info: HardwareInfo,
    calls: HashMap<&'static str, usize>,
    fail_next: HashMap<&'static str, ResultCode>,
    callbacks: HashMap<u8, (RawInputCallback, InterruptTrigger)>,
    digital_inputs: HashMap<u8, bool>,
    digital_outputs: HashMap<u8, bool>,
    relays: HashMap<u8, bool>,
    counters: HashMap<u8, i32>,
    analog_raw: HashMap<u8, u16>,
    temperatures: HashMap<u8, i32>,
    run_led: bool,
    error_led: bool,
    ext_reset: bool,
    // Native polarity: true while the switch sits in the stop position.
    run_switch_stop: bool,
    config_enabled: bool,
    power_fail: bool,
    ext_fail: bool,
    diagnostics: RawDiagnostics,
    watchdog_enabled: bool,
    watchdog_monitor_only: bool,
    tick: u32,
}

impl Default for MockState {
    fn default() -> Self {
        MockState {
            initialized: false,
            version: DriverVersion { major: 2, minor: 0 },
            hardware_info: HardwareInfo {
                pcb_revision: 1,
                digital_inputs: 16,
                digital_outputs: 16,
                relays: 1,
                analog_inputs: 4,
                analog_outputs: 0,
                counters: 1,
                encoders: 0,
                pwm_outputs: 2,
                temperature_sensors: 2,
            },
            calls: HashMap::new(),
            fail_next: HashMap::new(),
            callbacks: HashMap::new(),
            digital_inputs: HashMap::new(),
            digital_outputs: HashMap::new(),
            relays: HashMap::new(),
            counters: HashMap::new(),
            analog_raw: HashMap::new(),
            temperatures: HashMap::new(),
            run_led: false,
            error_led: false,
            ext_reset: false,
            run_switch_stop: false,
            config_enabled: false,
            power_fail: false,
            ext_fail: false,
            diagnostics: RawDiagnostics {
                // Supply present on a healthy device.
                digital_out_power: true,
                ..RawDiagnostics::default()
            },
            watchdog_enabled: false,
            watchdog_monitor_only: false,
            tick: 0,
        }
    }
}

/// Watchdog mode observed by [`MockDriver::watchdog`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchdogMode {
    /// Real hardware mode, 1000 ms window.
    Hardware,
    /// Monitor-only mode, 900 ms window.
    MonitorOnly,
}

/// Scriptable in-memory implementation of [`NativeDriver`].
#[derive(Default)]
pub struct MockDriver {
    state: Mutex<MockState>,
}

impl MockDriver {
    /// Creates a mock with CTR-700 default capabilities and version 2.0.
    pub fn new() -> Self {
        MockDriver::default()
    }

    /// Number of times the named trait operation has been called.
    pub fn call_count(&self, operation: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .calls
            .get(operation)
            .copied()
            .unwrap_or(0)
    }

    /// Makes the next call to the named operation fail with `code`.
    pub fn fail_next(&self, operation: &'static str, code: ResultCode) {
        self.state.lock().unwrap().fail_next.insert(operation, code);
    }

    /// Overrides the version reported to the session.
    pub fn set_reported_version(&self, major: u8, minor: u8) {
        self.state.lock().unwrap().version = DriverVersion { major, minor };
    }

    /// Overrides the capability record reported to the session.
    pub fn set_hardware_info(&self, info: HardwareInfo) {
        self.state.lock().unwrap().hardware_info = info;
    }

    /// Whether `initialize` has been called without a matching `shutdown`.
    pub fn is_initialized(&self) -> bool {
        self.state.lock().unwrap().initialized
    }

    /// Sets the simulated state of a digital input channel.
    pub fn set_digital_input(&self, channel: u8, state: bool) {
        self.state
            .lock()
            .unwrap()
            .digital_inputs
            .insert(channel, state);
    }

    /// Sets the simulated run switch. `stop` uses the native polarity:
    /// `true` means the switch sits in the stop position.
    pub fn set_run_switch_stop(&self, stop: bool) {
        self.state.lock().unwrap().run_switch_stop = stop;
    }

    /// Sets the simulated config switch.
    pub fn set_config_enabled(&self, enabled: bool) {
        self.state.lock().unwrap().config_enabled = enabled;
    }

    /// Sets the simulated raw diagnostic flags.
    pub fn set_diagnostics(&self, diagnostics: RawDiagnostics) {
        self.state.lock().unwrap().diagnostics = diagnostics;
    }

    /// Sets the simulated raw reading of an analog channel.
    pub fn set_analog_raw(&self, channel: u8, raw: u16) {
        self.state.lock().unwrap().analog_raw.insert(channel, raw);
    }

    /// Sets the simulated raw reading of a temperature sensor.
    pub fn set_temperature_raw(&self, sensor: TemperatureSensor, raw: i32) {
        self.state
            .lock()
            .unwrap()
            .temperatures
            .insert(sensor.as_raw(), raw);
    }

    /// Sets the simulated millisecond tick counter.
    pub fn set_tick_count(&self, tick: u32) {
        self.state.lock().unwrap().tick = tick;
    }

    /// Last state written to a digital output channel, if any.
    pub fn digital_output(&self, channel: u8) -> Option<bool> {
        self.state.lock().unwrap().digital_outputs.get(&channel).copied()
    }

    /// Current state of the run LED.
    pub fn run_led(&self) -> bool {
        self.state.lock().unwrap().run_led
    }

    /// Current state of the error LED.
    pub fn error_led(&self) -> bool {
        self.state.lock().unwrap().error_led
    }

    /// Current state of the EXT_RESET signal.
    pub fn ext_reset(&self) -> bool {
        self.state.lock().unwrap().ext_reset
    }

    /// Whether the watchdog has been enabled, and in which mode.
    pub fn watchdog(&self) -> Option<WatchdogMode> {
        let state = self.state.lock().unwrap();
        state.watchdog_enabled.then(|| {
            if state.watchdog_monitor_only {
                WatchdogMode::MonitorOnly
            } else {
                WatchdogMode::Hardware
            }
        })
    }

    /// Last state written to a relay channel, if any.
    pub fn relay(&self, channel: u8) -> Option<bool> {
        self.state.lock().unwrap().relays.get(&channel).copied()
    }

    /// Channels that currently hold an interrupt registration, ascending.
    pub fn registered_channels(&self) -> Vec<u8> {
        let mut channels: Vec<u8> = self.state.lock().unwrap().callbacks.keys().copied().collect();
        channels.sort_unstable();
        channels
    }

    /// The trigger a channel was registered with, if registered.
    pub fn registered_trigger(&self, channel: u8) -> Option<InterruptTrigger> {
        self.state
            .lock()
            .unwrap()
            .callbacks
            .get(&channel)
            .map(|(_, trigger)| *trigger)
    }

    /// The raw callback pointer registered for a channel, if any.
    ///
    /// Lets a test hold on to the entry point and invoke it after the
    /// session dropped the registration, simulating an interrupt that was
    /// already in flight when the channel was torn down.
    pub fn registered_callback(&self, channel: u8) -> Option<RawInputCallback> {
        self.state
            .lock()
            .unwrap()
            .callbacks
            .get(&channel)
            .map(|(callback, _)| *callback)
    }

    /// Delivers an input change the way the hardware would: invokes the
    /// callback registered for `channel`, on the calling thread. Returns
    /// whether a callback was registered. Also updates the simulated input
    /// state so a subsequent read observes the new level.
    pub fn fire_input(&self, channel: u8, state: bool) -> bool {
        let callback = {
            let mut guard = self.state.lock().unwrap();
            guard.digital_inputs.insert(channel, state);
            guard.callbacks.get(&channel).map(|(callback, _)| *callback)
        };
        // The lock is released before dispatch; observers may call back
        // into the driver.
        match callback {
            Some(callback) => {
                unsafe { callback(channel, u8::from(state)) };
                true
            }
            None => false,
        }
    }

    fn op<T>(
        &self,
        name: &'static str,
        body: impl FnOnce(&mut MockState) -> Result<T, ResultCode>,
    ) -> Result<T, ResultCode> {
        let mut state = self.state.lock().unwrap();
        *state.calls.entry(name).or_insert(0) += 1;
        if let Some(code) = state.fail_next.remove(name) {
            return Err(code);
        }
        body(&mut state)
    }
}

fn ensure_initialized(state: &MockState) -> Result<(), ResultCode> {
    if state.initialized {
        Ok(())
    } else {
        Err(ResultCode::DevAccessFailed)
    }
}

fn check_channel(channel: u8, count: u16) -> Result<(), ResultCode> {
    if u16::from(channel) < count {
        Ok(())
    } else {
        Err(ResultCode::InvalidChannel)
    }
}

impl NativeDriver for MockDriver {
    fn version(&self) -> Result<DriverVersion, ResultCode> {
        self.op("version", |state| Ok(state.version))
    }

    fn initialize(&self) -> Result<(), ResultCode> {
        self.op("initialize", |state| {
            state.initialized = true;
            Ok(())
        })
    }

    fn shutdown(&self) -> Result<(), ResultCode> {
        self.op("shutdown", |state| {
            ensure_initialized(state)?;
            state.initialized = false;
            state.callbacks.clear();
            Ok(())
        })
    }

    fn tick_count(&self) -> Result<u32, ResultCode> {
        self.op("tick_count", |state| {
            ensure_initialized(state)?;
            Ok(state.tick)
        })
    }

    fn enable_watchdog(&self, monitor_only: bool) -> Result<(), ResultCode> {
        self.op("enable_watchdog", |state| {
            ensure_initialized(state)?;
            state.watchdog_enabled = true;
            state.watchdog_monitor_only = monitor_only;
            Ok(())
        })
    }

    fn service_watchdog(&self) -> Result<(), ResultCode> {
        self.op("service_watchdog", |state| {
            ensure_initialized(state)?;
            Ok(())
        })
    }

    fn hardware_info(&self) -> Result<HardwareInfo, ResultCode> {
        self.op("hardware_info", |state| {
            ensure_initialized(state)?;
            Ok(state.hardware_info)
        })
    }

    fn set_run_led(&self, on: bool) -> Result<(), ResultCode> {
        self.op("set_run_led", |state| {
            ensure_initialized(state)?;
            state.run_led = on;
            Ok(())
        })
    }

    fn set_error_led(&self, on: bool) -> Result<(), ResultCode> {
        self.op("set_error_led", |state| {
            ensure_initialized(state)?;
            state.error_led = on;
            Ok(())
        })
    }

    fn run_switch(&self) -> Result<bool, ResultCode> {
        self.op("run_switch", |state| {
            ensure_initialized(state)?;
            Ok(state.run_switch_stop)
        })
    }

    fn config_enabled(&self) -> Result<bool, ResultCode> {
        self.op("config_enabled", |state| {
            ensure_initialized(state)?;
            Ok(state.config_enabled)
        })
    }

    fn power_fail(&self) -> Result<bool, ResultCode> {
        self.op("power_fail", |state| {
            ensure_initialized(state)?;
            Ok(state.power_fail)
        })
    }

    fn diag_info(&self) -> Result<RawDiagnostics, ResultCode> {
        self.op("diag_info", |state| {
            ensure_initialized(state)?;
            Ok(state.diagnostics)
        })
    }

    fn ext_fail(&self) -> Result<bool, ResultCode> {
        self.op("ext_fail", |state| {
            ensure_initialized(state)?;
            Ok(state.ext_fail)
        })
    }

    fn set_ext_reset(&self, enable: bool) -> Result<(), ResultCode> {
        self.op("set_ext_reset", |state| {
            ensure_initialized(state)?;
            state.ext_reset = enable;
            Ok(())
        })
    }

    fn digital_input(&self, channel: u8) -> Result<bool, ResultCode> {
        self.op("digital_input", |state| {
            ensure_initialized(state)?;
            check_channel(channel, state.hardware_info.digital_inputs)?;
            Ok(state.digital_inputs.get(&channel).copied().unwrap_or(false))
        })
    }

    fn set_digital_output(&self, channel: u8, on: bool) -> Result<(), ResultCode> {
        self.op("set_digital_output", |state| {
            ensure_initialized(state)?;
            check_channel(channel, state.hardware_info.digital_outputs)?;
            state.digital_outputs.insert(channel, on);
            Ok(())
        })
    }

    fn set_relay(&self, channel: u8, on: bool) -> Result<(), ResultCode> {
        self.op("set_relay", |state| {
            ensure_initialized(state)?;
            check_channel(channel, state.hardware_info.relays)?;
            state.relays.insert(channel, on);
            Ok(())
        })
    }

    fn counter_enable(&self, channel: u8, _enable: bool) -> Result<(), ResultCode> {
        self.op("counter_enable", |state| {
            ensure_initialized(state)?;
            check_channel(channel, state.hardware_info.counters)
        })
    }

    fn counter_set_mode(
        &self,
        channel: u8,
        _mode: CounterMode,
        _trigger: CounterTrigger,
        _direction: CounterDirection,
    ) -> Result<(), ResultCode> {
        self.op("counter_set_mode", |state| {
            ensure_initialized(state)?;
            check_channel(channel, state.hardware_info.counters)
        })
    }

    fn counter_set_preload(&self, channel: u8, preload: i32) -> Result<(), ResultCode> {
        self.op("counter_set_preload", |state| {
            ensure_initialized(state)?;
            check_channel(channel, state.hardware_info.counters)?;
            state.counters.insert(channel, preload);
            Ok(())
        })
    }

    fn counter_value(&self, channel: u8) -> Result<i32, ResultCode> {
        self.op("counter_value", |state| {
            ensure_initialized(state)?;
            check_channel(channel, state.hardware_info.counters)?;
            Ok(state.counters.get(&channel).copied().unwrap_or(0))
        })
    }

    fn pwm_set_time_base(&self, channel: u8, _time_base: PwmTimeBase) -> Result<(), ResultCode> {
        self.op("pwm_set_time_base", |state| {
            ensure_initialized(state)?;
            check_channel(channel, state.hardware_info.pwm_outputs)
        })
    }

    fn pwm_set_param(&self, channel: u8, _period: u16, _pulse_len: u16) -> Result<(), ResultCode> {
        self.op("pwm_set_param", |state| {
            ensure_initialized(state)?;
            check_channel(channel, state.hardware_info.pwm_outputs)
        })
    }

    fn pwm_enable(&self, channel: u8, _run: bool) -> Result<(), ResultCode> {
        self.op("pwm_enable", |state| {
            ensure_initialized(state)?;
            check_channel(channel, state.hardware_info.pwm_outputs)
        })
    }

    fn analog_value(&self, channel: u8) -> Result<u16, ResultCode> {
        self.op("analog_value", |state| {
            ensure_initialized(state)?;
            check_channel(channel, state.hardware_info.analog_inputs)?;
            Ok(state.analog_raw.get(&channel).copied().unwrap_or(0))
        })
    }

    fn analog_set_mode(&self, channel: u8, _mode: AnalogMode) -> Result<(), ResultCode> {
        self.op("analog_set_mode", |state| {
            ensure_initialized(state)?;
            check_channel(channel, state.hardware_info.analog_inputs)
        })
    }

    fn temperature_value(&self, sensor: TemperatureSensor) -> Result<i32, ResultCode> {
        self.op("temperature_value", |state| {
            ensure_initialized(state)?;
            Ok(state.temperatures.get(&sensor.as_raw()).copied().unwrap_or(0))
        })
    }

    fn register_input_callback(
        &self,
        channel: u8,
        callback: RawInputCallback,
        trigger: InterruptTrigger,
    ) -> Result<(), ResultCode> {
        self.op("register_input_callback", |state| {
            ensure_initialized(state)?;
            check_channel(channel, state.hardware_info.digital_inputs)?;
            state.callbacks.insert(channel, (callback, trigger));
            Ok(())
        })
    }

    fn unregister_input_callback(&self, channel: u8) -> Result<(), ResultCode> {
        self.op("unregister_input_callback", |state| {
            ensure_initialized(state)?;
            state.callbacks.remove(&channel);
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    static FIRED: AtomicUsize = AtomicUsize::new(0);

    extern "C" fn count_fired(_channel: u8, _state: u8) {
        FIRED.fetch_add(1, Ordering::SeqCst);
    }

    #[test]
    fn counts_calls_per_operation() {
        let mock = MockDriver::new();
        mock.initialize().unwrap();
        mock.digital_input(0).unwrap();
        mock.digital_input(1).unwrap();
        assert_eq!(mock.call_count("digital_input"), 2);
        assert_eq!(mock.call_count("analog_value"), 0);
    }

    #[test]
    fn scripted_failure_applies_once() {
        let mock = MockDriver::new();
        mock.initialize().unwrap();
        mock.fail_next("digital_input", ResultCode::DevAccessFailed);
        assert_eq!(mock.digital_input(0), Err(ResultCode::DevAccessFailed));
        assert_eq!(mock.digital_input(0), Ok(false));
    }

    #[test]
    fn out_of_range_channel_is_rejected() {
        let mock = MockDriver::new();
        mock.initialize().unwrap();
        assert_eq!(mock.digital_input(16), Err(ResultCode::InvalidChannel));
        assert_eq!(mock.set_relay(1, true), Err(ResultCode::InvalidChannel));
    }

    #[test]
    fn operations_require_initialization() {
        let mock = MockDriver::new();
        assert_eq!(mock.digital_input(0), Err(ResultCode::DevAccessFailed));
        // Version is readable before initialize, like the native library.
        assert!(mock.version().is_ok());
    }

    #[test]
    fn fire_input_without_registration_is_inert() {
        let mock = MockDriver::new();
        mock.initialize().unwrap();
        assert!(!mock.fire_input(3, true));
        // The simulated level still changed.
        assert_eq!(mock.digital_input(3), Ok(true));
    }

    #[test]
    fn led_and_watchdog_state_is_observable() {
        let mock = MockDriver::new();
        mock.initialize().unwrap();
        assert_eq!(mock.watchdog(), None);
        mock.enable_watchdog(true).unwrap();
        assert_eq!(mock.watchdog(), Some(WatchdogMode::MonitorOnly));
        mock.set_run_led(true).unwrap();
        mock.set_error_led(false).unwrap();
        mock.set_ext_reset(true).unwrap();
        assert!(mock.run_led());
        assert!(!mock.error_led());
        assert!(mock.ext_reset());
    }

    #[test]
    fn fire_input_invokes_registered_callback() {
        let mock = MockDriver::new();
        mock.initialize().unwrap();
        mock.register_input_callback(2, count_fired, InterruptTrigger::BothEdges)
            .unwrap();
        let before = FIRED.load(Ordering::SeqCst);
        assert!(mock.fire_input(2, true));
        assert_eq!(FIRED.load(Ordering::SeqCst), before + 1);
        mock.unregister_input_callback(2).unwrap();
        assert!(!mock.fire_input(2, false));
    }
}
