//! Unit conversions for raw hardware readings.
//!
//! The scale factors come from the CTR-700 input circuitry and are fixed per
//! device family; raw readings are converted at most once, here.

use crate::types::PwmTimeBase;

/// Full-scale ADC reading in voltage mode, corresponding to 10 V.
const ADC_VOLTAGE_FULL_SCALE: f32 = 28151.0;

/// Full-scale ADC reading in current mode, corresponding to 20 mA.
const ADC_CURRENT_FULL_SCALE: f32 = 24394.0;

/// Temperature readings are fixed-point with four decimal places.
const TEMPERATURE_DIVISOR: f32 = 10000.0;

/// Converts a raw analog reading (voltage mode) to volts.
pub fn adc_to_volts(raw: u16) -> f32 {
    f32::from(raw) / ADC_VOLTAGE_FULL_SCALE * 10.0
}

/// Converts a raw analog reading (current mode) to amperes.
pub fn adc_to_amperes(raw: u16) -> f32 {
    f32::from(raw) / ADC_CURRENT_FULL_SCALE * 0.02
}

/// Converts a raw temperature reading to degrees Celsius.
///
/// The sensors resolve 0.5 °C; the fixed-point encoding is finer than the
/// measurement.
pub fn temperature_celsius(raw: i32) -> f32 {
    raw as f32 / TEMPERATURE_DIVISOR
}

/// The largest period accepted by the PWM unit for the given time base.
pub fn max_pwm_period(time_base: PwmTimeBase) -> u16 {
    match time_base {
        PwmTimeBase::Ns800 => u16::MAX,
        PwmTimeBase::Ms1 => 2147,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn temperature_divides_by_ten_thousand() {
        assert_eq!(temperature_celsius(215), 0.0215);
        assert_eq!(temperature_celsius(265000), 26.5);
        assert_eq!(temperature_celsius(-50000), -5.0);
        assert_eq!(temperature_celsius(0), 0.0);
    }

    #[test]
    fn adc_full_scale_voltage_is_ten_volts() {
        assert_eq!(adc_to_volts(0), 0.0);
        assert!((adc_to_volts(28151) - 10.0).abs() < 1e-5);
        assert!((adc_to_volts(14075) - 4.99982).abs() < 1e-3);
    }

    #[test]
    fn adc_full_scale_current_is_twenty_milliamps() {
        assert_eq!(adc_to_amperes(0), 0.0);
        assert!((adc_to_amperes(24394) - 0.02).abs() < 1e-7);
    }

    #[test]
    fn pwm_period_ceiling_per_time_base() {
        assert_eq!(max_pwm_period(PwmTimeBase::Ns800), 65535);
        assert_eq!(max_pwm_period(PwmTimeBase::Ms1), 2147);
    }
}
