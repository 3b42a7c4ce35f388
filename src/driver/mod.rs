//! Native driver abstraction.
//!
//! [`NativeDriver`] is the seam between the safe session layer and
//! `libctr700drv.so`. The session talks to `Arc<dyn NativeDriver>` only, so
//! production injects [`HardwareDriver`] while tests inject [`MockDriver`]
//! and script its behavior.
//!
//! Methods return the raw native polarity and units; normalization (the
//! run-switch inversion, diagnostic polarity, unit scaling) happens once, in
//! the session.

use crate::types::{
    AnalogMode, CounterDirection, CounterMode, CounterTrigger, DriverVersion, HardwareInfo,
    InterruptTrigger, PwmTimeBase, ResultCode, TemperatureSensor,
};

#[cfg(feature = "hardware")]
mod hardware;
mod mock;

#[cfg(feature = "hardware")]
pub use hardware::HardwareDriver;
pub use mock::{MockDriver, WatchdogMode};

/// Raw callback entry point registered with the native layer.
///
/// Invoked by the driver with `(channel, state)` on a thread the driver
/// owns; `state` is a native boolean.
pub type RawInputCallback = unsafe extern "C" fn(channel: u8, state: u8);

/// Diagnostic flags exactly as the native driver reports them.
///
/// `digital_out_power` carries inverted polarity on the wire (high while the
/// supply is present); consumers normalize it.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RawDiagnostics {
    /// Digital output power supply signal; `true` while the supply is
    /// present.
    pub digital_out_power: bool,
    /// Digital output driver fault flag.
    pub digital_out_fault: bool,
    /// Digital input fault flag.
    pub digital_in_fault: bool,
    /// USB over-current flag.
    pub usb_over_current: bool,
}

/// Operation set of the native I/O driver.
///
/// All methods take `&self` so the trait stays object-safe behind
/// `Arc<dyn NativeDriver>`; implementations use interior mutability. Every
/// call is fast, synchronous, and non-blocking by driver contract. Failures
/// are the raw [`ResultCode`]; the session translates them.
pub trait NativeDriver: Send + Sync {
    /// Reads the driver version.
    fn version(&self) -> Result<DriverVersion, ResultCode>;
    /// Initializes the driver. Must be balanced by [`shutdown`](Self::shutdown).
    fn initialize(&self) -> Result<(), ResultCode>;
    /// Shuts the driver down and releases hardware resources.
    fn shutdown(&self) -> Result<(), ResultCode>;

    /// Milliseconds elapsed since system start.
    fn tick_count(&self) -> Result<u32, ResultCode>;

    /// Enables the system watchdog, optionally in monitor-only mode.
    fn enable_watchdog(&self, monitor_only: bool) -> Result<(), ResultCode>;
    /// Services the watchdog; fails with [`ResultCode::WatchdogTimeout`]
    /// when serviced too late.
    fn service_watchdog(&self) -> Result<(), ResultCode>;

    /// Reads the hardware capability record.
    fn hardware_info(&self) -> Result<HardwareInfo, ResultCode>;

    /// Switches the run LED.
    fn set_run_led(&self, on: bool) -> Result<(), ResultCode>;
    /// Switches the error LED.
    fn set_error_led(&self, on: bool) -> Result<(), ResultCode>;
    /// Reads the run switch. Native polarity: `true` in the stop position.
    fn run_switch(&self) -> Result<bool, ResultCode>;
    /// Reads the config switch (DIP 4).
    fn config_enabled(&self) -> Result<bool, ResultCode>;
    /// Reads the power-fail signal (supply below ~18.2 V).
    fn power_fail(&self) -> Result<bool, ResultCode>;
    /// Reads the diagnostic flags, raw polarity.
    fn diag_info(&self) -> Result<RawDiagnostics, ResultCode>;
    /// Reads the EXT_FAIL signal of the backplane bus.
    fn ext_fail(&self) -> Result<bool, ResultCode>;
    /// Drives the EXT_RESET signal of the backplane bus.
    fn set_ext_reset(&self, enable: bool) -> Result<(), ResultCode>;

    /// Reads a digital input channel.
    fn digital_input(&self, channel: u8) -> Result<bool, ResultCode>;
    /// Sets a digital output channel.
    fn set_digital_output(&self, channel: u8, state: bool) -> Result<(), ResultCode>;
    /// Sets a relay output channel.
    fn set_relay(&self, channel: u8, state: bool) -> Result<(), ResultCode>;

    /// Enables or disables a counter channel.
    fn counter_enable(&self, channel: u8, enable: bool) -> Result<(), ResultCode>;
    /// Configures mode, trigger and direction of a counter channel.
    fn counter_set_mode(
        &self,
        channel: u8,
        mode: CounterMode,
        trigger: CounterTrigger,
        direction: CounterDirection,
    ) -> Result<(), ResultCode>;
    /// Sets the preload (initial) value of a counter channel.
    fn counter_set_preload(&self, channel: u8, preload: i32) -> Result<(), ResultCode>;
    /// Reads the current value of a counter channel.
    fn counter_value(&self, channel: u8) -> Result<i32, ResultCode>;

    /// Sets the time base of a PWM channel.
    fn pwm_set_time_base(&self, channel: u8, time_base: PwmTimeBase) -> Result<(), ResultCode>;
    /// Sets period and pulse length of a PWM channel; applied on the next
    /// enable.
    fn pwm_set_param(&self, channel: u8, period: u16, pulse_len: u16) -> Result<(), ResultCode>;
    /// Starts or stops a PWM channel.
    fn pwm_enable(&self, channel: u8, run: bool) -> Result<(), ResultCode>;

    /// Reads the raw value of an analog input channel.
    fn analog_value(&self, channel: u8) -> Result<u16, ResultCode>;
    /// Sets the measurement mode of an analog input channel.
    fn analog_set_mode(&self, channel: u8, mode: AnalogMode) -> Result<(), ResultCode>;

    /// Reads a temperature sensor; fixed-point, four decimal places.
    fn temperature_value(&self, sensor: TemperatureSensor) -> Result<i32, ResultCode>;

    /// Registers `callback` for input change interrupts on `channel`.
    ///
    /// The callback may fire on a driver-owned thread any time until
    /// [`unregister_input_callback`](Self::unregister_input_callback)
    /// returns for the same channel.
    fn register_input_callback(
        &self,
        channel: u8,
        callback: RawInputCallback,
        trigger: InterruptTrigger,
    ) -> Result<(), ResultCode>;
    /// Removes the interrupt registration for `channel`.
    fn unregister_input_callback(&self, channel: u8) -> Result<(), ResultCode>;
}
