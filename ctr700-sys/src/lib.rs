//! Raw FFI declarations for `libctr700drv.so`, the native I/O driver of the
//! SYSTEC sysWORXX CTR-700 controller.
//!
//! The declarations mirror `ctr700drv.h` one to one. Every entry point
//! returns a driver result code (`CTR700_SUCCESS` on success, one of the
//! `CTR700_ERROR_*` values otherwise). No safety layer lives here; the safe
//! wrapper is the `ctr700` crate.

#![allow(clippy::missing_safety_doc)]

/// Driver result code as returned by every API function.
pub type Ctr700Result = i32;

/// Function call succeeded.
pub const CTR700_SUCCESS: Ctr700Result = 0x00;
/// Generic error.
pub const CTR700_ERROR_GENERIC: Ctr700Result = 0xFF;
/// The functionality is not implemented by the library.
pub const CTR700_ERROR_NOT_IMPLEMENTED: Ctr700Result = 0xFE;
/// One of the given parameters is invalid (e.g. NULL or out of range).
pub const CTR700_ERROR_INVALID_PARAMETER: Ctr700Result = 0xFD;
/// The provided channel number is invalid.
pub const CTR700_ERROR_INVALID_CHANNEL: Ctr700Result = 0xFC;
/// The provided mode is invalid.
pub const CTR700_ERROR_INVALID_MODE: Ctr700Result = 0xFB;
/// The provided time base is invalid.
pub const CTR700_ERROR_INVALID_TIMEBASE: Ctr700Result = 0xFA;
/// The provided delta parameter is invalid.
pub const CTR700_ERROR_INVALID_DELTA: Ctr700Result = 0xF9;
/// The PTO parameter table is completely filled.
pub const CTR700_ERROR_PTO_PARAM_TAB_FULL: Ctr700Result = 0xF8;
/// Access to the device or peripheral has failed.
pub const CTR700_ERROR_DEV_ACCESS_FAILED: Ctr700Result = 0xF7;
/// The watchdog did timeout.
pub const CTR700_ERROR_WATCHDOG_TIMEOUT: Ctr700Result = 0xF2;

/// Boolean `false` in the driver ABI.
pub const CTR700_BOOL_FALSE: u8 = 0;
/// Boolean `true` in the driver ABI.
pub const CTR700_BOOL_TRUE: u8 = 1;

/// Interrupt handling disabled for the channel.
pub const CTR700_INTERRUPT_NONE: u32 = 0;
/// Interrupt on a low-to-high transition.
pub const CTR700_INTERRUPT_RISING_EDGE: u32 = 1;
/// Interrupt on a high-to-low transition.
pub const CTR700_INTERRUPT_FALLING_EDGE: u32 = 2;
/// Interrupt on any transition.
pub const CTR700_INTERRUPT_BOTH_EDGES: u32 = 3;

/// Callback type for asynchronous digital input notifications.
///
/// Invoked by the driver with the channel number and the new input state
/// (`CTR700_BOOL_*`), on a thread owned by the driver.
pub type Ctr700InterruptCallback = Option<unsafe extern "C" fn(channel: u8, state: u8)>;

/// Hardware information record filled by [`Ctr700DrvGetHardwareInfo`].
#[repr(C)]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Ctr700HwInfo {
    /// PCB revision number.
    pub pcb_revision: u16,
    /// Number of digital inputs.
    pub di_channels: u16,
    /// Number of digital outputs.
    pub do_channels: u16,
    /// Number of relay outputs.
    pub relay_channels: u16,
    /// Number of analog inputs.
    pub ai_channels: u16,
    /// Number of analog outputs.
    pub ao_channels: u16,
    /// Number of counter channels.
    pub cnt_channels: u16,
    /// Number of A/B decoder channels.
    pub enc_channels: u16,
    /// Number of PWM channels.
    pub pwm_channels: u16,
    /// Number of temperature channels.
    pub tmp_channels: u16,
}

/// Diagnostic information record filled by [`Ctr700DrvGetDiagInfo`].
///
/// All fields are driver booleans (`CTR700_BOOL_*`). Note that
/// `digi_out_power_fail` carries inverted polarity on the wire: the signal is
/// high while the output power supply is present.
#[repr(C)]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Ctr700DiagInfo {
    /// Digital output power supply signal (high = supply present).
    pub digi_out_power_fail: u8,
    /// Digital output driver diagnostic flag.
    pub digi_out_diag: u8,
    /// Digital input fault flag.
    pub digi_in_error: u8,
    /// USB over-current flag.
    pub usb_over_current: u8,
}

extern "C" {
    pub fn Ctr700DrvGetVersion(major: *mut u8, minor: *mut u8) -> Ctr700Result;
    pub fn Ctr700DrvInitialize() -> Ctr700Result;
    pub fn Ctr700DrvShutDown() -> Ctr700Result;
    pub fn Ctr700DrvGetTickCount(tick_count: *mut u32) -> Ctr700Result;
    pub fn Ctr700DrvEnableWatchdog(monitor_only: u8) -> Ctr700Result;
    pub fn Ctr700DrvServiceWatchdog() -> Ctr700Result;
    pub fn Ctr700DrvGetHardwareInfo(hw_info: *mut Ctr700HwInfo) -> Ctr700Result;
    pub fn Ctr700DrvSetRunLed(state: u8) -> Ctr700Result;
    pub fn Ctr700DrvSetErrLed(state: u8) -> Ctr700Result;
    pub fn Ctr700DrvGetRunSwitch(run_switch: *mut u8) -> Ctr700Result;
    pub fn Ctr700DrvGetConfigEnabled(config: *mut u8) -> Ctr700Result;
    pub fn Ctr700DrvGetPowerFail(fail: *mut u8) -> Ctr700Result;
    pub fn Ctr700DrvGetDiagInfo(diag_info: *mut Ctr700DiagInfo) -> Ctr700Result;
    pub fn Ctr700DrvGetExtFail(fail: *mut u8) -> Ctr700Result;
    pub fn Ctr700DrvSetExtReset(enable: u8) -> Ctr700Result;
    pub fn Ctr700DrvGetDigiIn(channel: u8, state: *mut u8) -> Ctr700Result;
    pub fn Ctr700DrvSetDigiOut(channel: u8, enable: u8) -> Ctr700Result;
    pub fn Ctr700DrvSetRelay(channel: u8, enable: u8) -> Ctr700Result;
    pub fn Ctr700DrvCntEnable(channel: u8, enable: u8) -> Ctr700Result;
    pub fn Ctr700DrvCntSetMode(channel: u8, mode: u8, trigger: u8, dir: u8) -> Ctr700Result;
    pub fn Ctr700DrvCntSetPreload(channel: u8, preload: i32) -> Ctr700Result;
    pub fn Ctr700DrvCntGetValue(channel: u8, value: *mut i32) -> Ctr700Result;
    pub fn Ctr700DrvPwmSetTimeBase(channel: u8, time_base: u8) -> Ctr700Result;
    pub fn Ctr700DrvPwmSetParam(channel: u8, period: u16, pulse_len: u16) -> Ctr700Result;
    pub fn Ctr700DrvPwmEnable(channel: u8, run: u8) -> Ctr700Result;
    pub fn Ctr700DrvAdcGetValue(channel: u8, adc_value: *mut u16) -> Ctr700Result;
    pub fn Ctr700DrvAdcSetMode(channel: u8, mode: u8) -> Ctr700Result;
    pub fn Ctr700DrvTmpGetValue(sensor: u8, value: *mut i32) -> Ctr700Result;
    pub fn Ctr700DrvRegisterInterruptCallback(
        channel: u8,
        callback: Ctr700InterruptCallback,
        trigger: u32,
    ) -> Ctr700Result;
    pub fn Ctr700DrvUnregisterInterruptCallback(channel: u8) -> Ctr700Result;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem::{align_of, size_of};

    #[test]
    fn hw_info_layout_matches_c() {
        assert_eq!(size_of::<Ctr700HwInfo>(), 20);
        assert_eq!(align_of::<Ctr700HwInfo>(), 2);
    }

    #[test]
    fn diag_info_layout_matches_c() {
        assert_eq!(size_of::<Ctr700DiagInfo>(), 4);
        assert_eq!(align_of::<Ctr700DiagInfo>(), 1);
    }
}
