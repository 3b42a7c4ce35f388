//! Real driver backend over the `ctr700-sys` FFI bindings.

use ctr700_sys as sys;

use super::{NativeDriver, RawDiagnostics, RawInputCallback};
use crate::types::{
    AnalogMode, CounterDirection, CounterMode, CounterTrigger, DriverVersion, HardwareInfo,
    InterruptTrigger, PwmTimeBase, ResultCode, TemperatureSensor,
};

fn native_bool(value: bool) -> u8 {
    if value {
        sys::CTR700_BOOL_TRUE
    } else {
        sys::CTR700_BOOL_FALSE
    }
}

fn from_native_bool(value: u8) -> bool {
    value != sys::CTR700_BOOL_FALSE
}

/// [`NativeDriver`] backed by `libctr700drv.so`.
///
/// Stateless by itself; all device state lives in the native library. The
/// session layer enforces that only one initialized instance is in use at a
/// time.
#[derive(Debug, Default)]
pub struct HardwareDriver;

impl HardwareDriver {
    /// Creates the hardware backend.
    pub fn new() -> Self {
        HardwareDriver
    }
}

impl NativeDriver for HardwareDriver {
    fn version(&self) -> Result<DriverVersion, ResultCode> {
        let mut major = 0u8;
        let mut minor = 0u8;
        ResultCode::check(unsafe { sys::Ctr700DrvGetVersion(&mut major, &mut minor) })?;
        Ok(DriverVersion { major, minor })
    }

    fn initialize(&self) -> Result<(), ResultCode> {
        ResultCode::check(unsafe { sys::Ctr700DrvInitialize() })
    }

    fn shutdown(&self) -> Result<(), ResultCode> {
        ResultCode::check(unsafe { sys::Ctr700DrvShutDown() })
    }

    fn tick_count(&self) -> Result<u32, ResultCode> {
        let mut ticks = 0u32;
        ResultCode::check(unsafe { sys::Ctr700DrvGetTickCount(&mut ticks) })?;
        Ok(ticks)
    }

    fn enable_watchdog(&self, monitor_only: bool) -> Result<(), ResultCode> {
        ResultCode::check(unsafe { sys::Ctr700DrvEnableWatchdog(native_bool(monitor_only)) })
    }

    fn service_watchdog(&self) -> Result<(), ResultCode> {
        ResultCode::check(unsafe { sys::Ctr700DrvServiceWatchdog() })
    }

    fn hardware_info(&self) -> Result<HardwareInfo, ResultCode> {
        let mut raw = sys::Ctr700HwInfo::default();
        ResultCode::check(unsafe { sys::Ctr700DrvGetHardwareInfo(&mut raw) })?;
        Ok(HardwareInfo {
            pcb_revision: raw.pcb_revision,
            digital_inputs: raw.di_channels,
            digital_outputs: raw.do_channels,
            relays: raw.relay_channels,
            analog_inputs: raw.ai_channels,
            analog_outputs: raw.ao_channels,
            counters: raw.cnt_channels,
            encoders: raw.enc_channels,
            pwm_outputs: raw.pwm_channels,
            temperature_sensors: raw.tmp_channels,
        })
    }

    fn set_run_led(&self, on: bool) -> Result<(), ResultCode> {
        ResultCode::check(unsafe { sys::Ctr700DrvSetRunLed(native_bool(on)) })
    }

    fn set_error_led(&self, on: bool) -> Result<(), ResultCode> {
        ResultCode::check(unsafe { sys::Ctr700DrvSetErrLed(native_bool(on)) })
    }

    fn run_switch(&self) -> Result<bool, ResultCode> {
        let mut state = 0u8;
        ResultCode::check(unsafe { sys::Ctr700DrvGetRunSwitch(&mut state) })?;
        Ok(from_native_bool(state))
    }

    fn config_enabled(&self) -> Result<bool, ResultCode> {
        let mut state = 0u8;
        ResultCode::check(unsafe { sys::Ctr700DrvGetConfigEnabled(&mut state) })?;
        Ok(from_native_bool(state))
    }

    fn power_fail(&self) -> Result<bool, ResultCode> {
        let mut state = 0u8;
        ResultCode::check(unsafe { sys::Ctr700DrvGetPowerFail(&mut state) })?;
        Ok(from_native_bool(state))
    }

    fn diag_info(&self) -> Result<RawDiagnostics, ResultCode> {
        let mut raw = sys::Ctr700DiagInfo::default();
        ResultCode::check(unsafe { sys::Ctr700DrvGetDiagInfo(&mut raw) })?;
        Ok(RawDiagnostics {
            digital_out_power: from_native_bool(raw.digi_out_power_fail),
            digital_out_fault: from_native_bool(raw.digi_out_diag),
            digital_in_fault: from_native_bool(raw.digi_in_error),
            usb_over_current: from_native_bool(raw.usb_over_current),
        })
    }

    fn ext_fail(&self) -> Result<bool, ResultCode> {
        let mut state = 0u8;
        ResultCode::check(unsafe { sys::Ctr700DrvGetExtFail(&mut state) })?;
        Ok(from_native_bool(state))
    }

    fn set_ext_reset(&self, enable: bool) -> Result<(), ResultCode> {
        ResultCode::check(unsafe { sys::Ctr700DrvSetExtReset(native_bool(enable)) })
    }

    fn digital_input(&self, channel: u8) -> Result<bool, ResultCode> {
        let mut state = 0u8;
        ResultCode::check(unsafe { sys::Ctr700DrvGetDigiIn(channel, &mut state) })?;
        Ok(from_native_bool(state))
    }

    fn set_digital_output(&self, channel: u8, state: bool) -> Result<(), ResultCode> {
        ResultCode::check(unsafe { sys::Ctr700DrvSetDigiOut(channel, native_bool(state)) })
    }

    fn set_relay(&self, channel: u8, state: bool) -> Result<(), ResultCode> {
        ResultCode::check(unsafe { sys::Ctr700DrvSetRelay(channel, native_bool(state)) })
    }

    fn counter_enable(&self, channel: u8, enable: bool) -> Result<(), ResultCode> {
        ResultCode::check(unsafe { sys::Ctr700DrvCntEnable(channel, native_bool(enable)) })
    }

    fn counter_set_mode(
        &self,
        channel: u8,
        mode: CounterMode,
        trigger: CounterTrigger,
        direction: CounterDirection,
    ) -> Result<(), ResultCode> {
        ResultCode::check(unsafe {
            sys::Ctr700DrvCntSetMode(channel, mode.as_raw(), trigger.as_raw(), direction.as_raw())
        })
    }

    fn counter_set_preload(&self, channel: u8, preload: i32) -> Result<(), ResultCode> {
        ResultCode::check(unsafe { sys::Ctr700DrvCntSetPreload(channel, preload) })
    }

    fn counter_value(&self, channel: u8) -> Result<i32, ResultCode> {
        let mut value = 0i32;
        ResultCode::check(unsafe { sys::Ctr700DrvCntGetValue(channel, &mut value) })?;
        Ok(value)
    }

    fn pwm_set_time_base(&self, channel: u8, time_base: PwmTimeBase) -> Result<(), ResultCode> {
        ResultCode::check(unsafe { sys::Ctr700DrvPwmSetTimeBase(channel, time_base.as_raw()) })
    }

    fn pwm_set_param(&self, channel: u8, period: u16, pulse_len: u16) -> Result<(), ResultCode> {
        ResultCode::check(unsafe { sys::Ctr700DrvPwmSetParam(channel, period, pulse_len) })
    }

    fn pwm_enable(&self, channel: u8, run: bool) -> Result<(), ResultCode> {
        ResultCode::check(unsafe { sys::Ctr700DrvPwmEnable(channel, native_bool(run)) })
    }

    fn analog_value(&self, channel: u8) -> Result<u16, ResultCode> {
        let mut value = 0u16;
        ResultCode::check(unsafe { sys::Ctr700DrvAdcGetValue(channel, &mut value) })?;
        Ok(value)
    }

    fn analog_set_mode(&self, channel: u8, mode: AnalogMode) -> Result<(), ResultCode> {
        ResultCode::check(unsafe { sys::Ctr700DrvAdcSetMode(channel, mode.as_raw()) })
    }

    fn temperature_value(&self, sensor: TemperatureSensor) -> Result<i32, ResultCode> {
        let mut value = 0i32;
        ResultCode::check(unsafe { sys::Ctr700DrvTmpGetValue(sensor.as_raw(), &mut value) })?;
        Ok(value)
    }

    fn register_input_callback(
        &self,
        channel: u8,
        callback: RawInputCallback,
        trigger: InterruptTrigger,
    ) -> Result<(), ResultCode> {
        ResultCode::check(unsafe {
            sys::Ctr700DrvRegisterInterruptCallback(channel, Some(callback), trigger.as_raw())
        })
    }

    fn unregister_input_callback(&self, channel: u8) -> Result<(), ResultCode> {
        ResultCode::check(unsafe { sys::Ctr700DrvUnregisterInterruptCallback(channel) })
    }
}
