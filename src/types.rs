//! Value types shared across the driver layer: native result codes, channel
//! mode enums, and the immutable records reported by the hardware.
//!
//! All enums carry their native wire value and provide `from_raw`/`as_raw`
//! conversions; unknown result codes are preserved verbatim so callers can
//! inspect exactly what the driver returned.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Non-success result code returned by a native driver call.
///
/// The native API reports errors as numeric codes in the `0xF2..=0xFF` range;
/// zero means success and is never represented here. Codes outside the
/// documented set (including the reserved `0xF3..=0xF6` block) are kept
/// verbatim in [`ResultCode::Other`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResultCode {
    /// A generic error occurred.
    Error,
    /// The functionality is not implemented by the library.
    NotImplemented,
    /// One of the given parameters is invalid (e.g. null or out of range).
    InvalidParameter,
    /// The provided channel number is invalid.
    InvalidChannel,
    /// The provided mode is invalid.
    InvalidMode,
    /// The provided time base is invalid.
    InvalidTimeBase,
    /// The provided delta parameter is invalid.
    InvalidDelta,
    /// The PTO parameter table is completely filled.
    PtoParamTabFull,
    /// Access to the device or peripheral has failed.
    DevAccessFailed,
    /// The watchdog did timeout.
    WatchdogTimeout,
    /// A code outside the documented set, preserved verbatim.
    Other(i32),
}

impl ResultCode {
    /// Translates a raw native return value, mapping success to `Ok(())`.
    pub fn check(raw: i32) -> Result<(), ResultCode> {
        match ResultCode::from_raw(raw) {
            None => Ok(()),
            Some(code) => Err(code),
        }
    }

    /// Converts a raw native return value; `None` for success (zero).
    pub fn from_raw(raw: i32) -> Option<ResultCode> {
        match raw {
            0x00 => None,
            0xFF => Some(ResultCode::Error),
            0xFE => Some(ResultCode::NotImplemented),
            0xFD => Some(ResultCode::InvalidParameter),
            0xFC => Some(ResultCode::InvalidChannel),
            0xFB => Some(ResultCode::InvalidMode),
            0xFA => Some(ResultCode::InvalidTimeBase),
            0xF9 => Some(ResultCode::InvalidDelta),
            0xF8 => Some(ResultCode::PtoParamTabFull),
            0xF7 => Some(ResultCode::DevAccessFailed),
            0xF2 => Some(ResultCode::WatchdogTimeout),
            other => Some(ResultCode::Other(other)),
        }
    }

    /// The raw numeric value as the native driver reported it.
    pub fn as_raw(self) -> i32 {
        match self {
            ResultCode::Error => 0xFF,
            ResultCode::NotImplemented => 0xFE,
            ResultCode::InvalidParameter => 0xFD,
            ResultCode::InvalidChannel => 0xFC,
            ResultCode::InvalidMode => 0xFB,
            ResultCode::InvalidTimeBase => 0xFA,
            ResultCode::InvalidDelta => 0xF9,
            ResultCode::PtoParamTabFull => 0xF8,
            ResultCode::DevAccessFailed => 0xF7,
            ResultCode::WatchdogTimeout => 0xF2,
            ResultCode::Other(raw) => raw,
        }
    }

    fn description(self) -> &'static str {
        match self {
            ResultCode::Error => "a generic error occurred",
            ResultCode::NotImplemented => "the functionality is not implemented by the library",
            ResultCode::InvalidParameter => "one of the given parameters is invalid",
            ResultCode::InvalidChannel => "the provided channel number is invalid",
            ResultCode::InvalidMode => "the provided mode is invalid",
            ResultCode::InvalidTimeBase => "the provided time base is invalid",
            ResultCode::InvalidDelta => "the provided delta parameter is invalid",
            ResultCode::PtoParamTabFull => "the PTO parameter table is completely filled",
            ResultCode::DevAccessFailed => "access to the device or peripheral has failed",
            ResultCode::WatchdogTimeout => "the watchdog did timeout",
            ResultCode::Other(_) => "unrecognized driver result code",
        }
    }
}

impl fmt::Display for ResultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code 0x{:02X})", self.description(), self.as_raw())
    }
}

/// Edge condition that raises a digital input interrupt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InterruptTrigger {
    /// No events are raised for the channel.
    None,
    /// The input value changes from low to high.
    RisingEdge,
    /// The input value changes from high to low.
    FallingEdge,
    /// Any change of the input value.
    BothEdges,
}

impl InterruptTrigger {
    /// Native wire value.
    pub fn as_raw(self) -> u32 {
        match self {
            InterruptTrigger::None => 0,
            InterruptTrigger::RisingEdge => 1,
            InterruptTrigger::FallingEdge => 2,
            InterruptTrigger::BothEdges => 3,
        }
    }
}

/// Operating mode of a counter channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CounterMode {
    /// Count edges on digital input 14; digital input 15 selects the
    /// counting direction.
    Counter,
    /// A/B decoder mode: digital input 14 is 'A', digital input 15 is 'B'.
    /// Swapping the inputs inverts the counting direction.
    AbDecoder,
}

impl CounterMode {
    /// Native wire value.
    pub fn as_raw(self) -> u8 {
        match self {
            CounterMode::Counter => 0,
            CounterMode::AbDecoder => 1,
        }
    }
}

/// Edge condition counted by a counter channel (counter mode only).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CounterTrigger {
    /// Rising edges are counted.
    RisingEdge,
    /// Falling edges are counted.
    FallingEdge,
    /// Rising and falling edges are counted.
    BothEdges,
}

impl CounterTrigger {
    /// Native wire value.
    pub fn as_raw(self) -> u8 {
        match self {
            CounterTrigger::RisingEdge => 0,
            CounterTrigger::FallingEdge => 1,
            CounterTrigger::BothEdges => 2,
        }
    }
}

/// Counting direction of a counter channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CounterDirection {
    /// The counter value is incremented.
    Up,
    /// The counter value is decremented.
    Down,
}

impl CounterDirection {
    /// Native wire value.
    pub fn as_raw(self) -> u8 {
        match self {
            CounterDirection::Up => 0,
            CounterDirection::Down => 1,
        }
    }
}

/// Time base (period unit) of a PWM output channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PwmTimeBase {
    /// 800 nanoseconds per period unit (1.25 MHz).
    Ns800,
    /// 1 millisecond per period unit (1 kHz).
    Ms1,
}

impl PwmTimeBase {
    /// Native wire value.
    pub fn as_raw(self) -> u8 {
        match self {
            PwmTimeBase::Ns800 => 1,
            PwmTimeBase::Ms1 => 2,
        }
    }
}

/// Measurement mode of an analog input channel.
///
/// The default per-channel configuration is determined by the operating
/// system (`/etc/systec/adc_modes` on the device).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnalogMode {
    /// The analog input measures voltage.
    Voltage,
    /// The analog input measures current.
    Current,
}

impl AnalogMode {
    /// Native wire value.
    pub fn as_raw(self) -> u8 {
        match self {
            AnalogMode::Voltage => 0,
            AnalogMode::Current => 1,
        }
    }
}

/// Temperature sensor selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TemperatureSensor {
    /// Internal sensor of the i.MX7 CPU.
    Cpu,
    /// Sensor on the system PCB.
    System,
}

impl TemperatureSensor {
    /// Native wire value.
    pub fn as_raw(self) -> u8 {
        match self {
            TemperatureSensor::Cpu => 0,
            TemperatureSensor::System => 1,
        }
    }
}

/// Version of the native I/O driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriverVersion {
    /// Major version; incompatible API changes.
    pub major: u8,
    /// Minor version; backwards-compatible additions.
    pub minor: u8,
}

impl fmt::Display for DriverVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Immutable capability snapshot reported by the hardware.
///
/// Fetched once per session and cached; the values never change while the
/// device is open.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HardwareInfo {
    /// PCB revision number.
    pub pcb_revision: u16,
    /// Number of digital input channels.
    pub digital_inputs: u16,
    /// Number of digital output channels.
    pub digital_outputs: u16,
    /// Number of relay output channels.
    pub relays: u16,
    /// Number of analog input channels.
    pub analog_inputs: u16,
    /// Number of analog output channels.
    pub analog_outputs: u16,
    /// Number of counter channels.
    pub counters: u16,
    /// Number of A/B decoder channels.
    pub encoders: u16,
    /// Number of PWM output channels.
    pub pwm_outputs: u16,
    /// Number of temperature sensors.
    pub temperature_sensors: u16,
}

/// Normalized diagnostic flags; `true` always means a fault condition.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostics {
    /// The power supply for digital outputs is missing or not properly
    /// connected.
    pub digital_output_power_fail: bool,
    /// Digital output driver fault (over-temperature or internal
    /// communication error of the driver IC).
    pub digital_output_fault: bool,
    /// Digital input fault (missing supply or internal communication error
    /// of the driver IC).
    pub digital_input_fault: bool,
    /// The USB interface current is too high.
    pub usb_over_current: bool,
}

/// Change notification for a digital input channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DigitalInputEvent {
    /// The digital input channel number.
    pub channel: u8,
    /// The new input state.
    pub state: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn result_code_roundtrip() {
        for raw in [0xFF, 0xFE, 0xFD, 0xFC, 0xFB, 0xFA, 0xF9, 0xF8, 0xF7, 0xF2] {
            let code = ResultCode::from_raw(raw).unwrap();
            assert_eq!(code.as_raw(), raw);
            assert!(!matches!(code, ResultCode::Other(_)));
        }
    }

    #[test]
    fn success_maps_to_ok() {
        assert_eq!(ResultCode::from_raw(0), None);
        assert!(ResultCode::check(0).is_ok());
        assert_eq!(ResultCode::check(0xFC), Err(ResultCode::InvalidChannel));
    }

    #[test]
    fn reserved_codes_are_preserved_verbatim() {
        // 0xF3..=0xF6 are reserved by the native API and must survive
        // translation untouched.
        for raw in [0xF3, 0xF4, 0xF5, 0xF6, 0x42] {
            assert_eq!(ResultCode::from_raw(raw), Some(ResultCode::Other(raw)));
            assert_eq!(ResultCode::Other(raw).as_raw(), raw);
        }
    }

    #[test]
    fn trigger_wire_values() {
        assert_eq!(InterruptTrigger::None.as_raw(), 0);
        assert_eq!(InterruptTrigger::RisingEdge.as_raw(), 1);
        assert_eq!(InterruptTrigger::FallingEdge.as_raw(), 2);
        assert_eq!(InterruptTrigger::BothEdges.as_raw(), 3);
    }

    #[test]
    fn pwm_time_base_wire_values() {
        // The native API starts at 1 here, unlike the other enums.
        assert_eq!(PwmTimeBase::Ns800.as_raw(), 1);
        assert_eq!(PwmTimeBase::Ms1.as_raw(), 2);
    }

    #[test]
    fn result_code_display_includes_raw_value() {
        let text = ResultCode::WatchdogTimeout.to_string();
        assert!(text.contains("0xF2"), "unexpected display: {text}");
    }
}
