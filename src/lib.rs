//! # CTR-700 Driver Layer
//!
//! Safe access to the SYSTEC sysWORXX CTR-700 industrial controller:
//! digital and analog I/O, relays, counters, PWM, temperature sensors,
//! status LEDs, the run/config switch and the system watchdog, backed by
//! the native I/O driver `libctr700drv.so`.
//!
//! The central type is [`Ctr700`], the exclusive device session. Only one
//! session exists per process; it owns the native driver connection, caches
//! the hardware capability record, and turns the driver's asynchronous
//! interrupt callback into safe per-channel change notifications.
//!
//! ## Crate structure
//!
//! - **`session`**: the [`Ctr700`] session — lifecycle, I/O operations,
//!   interrupt registration and observer dispatch.
//! - **`driver`**: the [`driver::NativeDriver`] seam between the session and
//!   the native library, with the real backend (`hardware` feature) and a
//!   scriptable [`driver::MockDriver`] for tests and simulation.
//! - **`types`**: result codes, channel mode enums, and the immutable
//!   records reported by the hardware.
//! - **`convert`**: unit conversions for raw analog and temperature
//!   readings.
//! - **`error`**: the [`Error`] taxonomy and [`Result`] alias.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use ctr700::{Ctr700, InterruptTrigger};
//! use ctr700::driver::MockDriver;
//!
//! # fn main() -> ctr700::Result<()> {
//! let mut device = Ctr700::open(Arc::new(MockDriver::new()))?;
//! let info = device.hardware_info()?;
//! println!("{} digital inputs", info.digital_inputs);
//!
//! device.subscribe_digital_inputs(|event| {
//!     println!("DI{} changed to {}", event.channel, event.state);
//! });
//! device.set_digital_input_events(0, InterruptTrigger::BothEdges)?;
//! # Ok(())
//! # }
//! ```

pub mod convert;
pub mod driver;
pub mod error;
pub mod session;
pub mod types;

pub use error::{Error, Result};
pub use session::{
    Ctr700, ObserverId, DRIVER_VERSION_MAJOR, DRIVER_VERSION_MINOR_MIN,
    WATCHDOG_MONITOR_TIMEOUT_MS, WATCHDOG_TIMEOUT_MS,
};
pub use types::{
    AnalogMode, CounterDirection, CounterMode, CounterTrigger, Diagnostics, DigitalInputEvent,
    DriverVersion, HardwareInfo, InterruptTrigger, PwmTimeBase, ResultCode, TemperatureSensor,
};
