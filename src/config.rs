use crate::definitions::*;
use crate::{bit_field_code, Error};

/// Proximity LED drive settings
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LedConfig {
    /// LED current in mA: 5, 10, 20, 50 or 100
    pub current_ma: u16,
    /// Pulse duty cycle in percent: 25, 50, 75 or 100
    pub duty_cycle: u16,
    /// Pulse frequency in kHz: 30, 40, 50, 60, 70, 80, 90 or 100
    pub pulse_freq_khz: u16,
    /// Pulses per measurement, 0-31
    pub pulse_count: u8,
}

impl Default for LedConfig {
    fn default() -> Self {
        Self {
            current_ma: 50,
            duty_cycle: 100,
            pulse_freq_khz: 30,
            pulse_count: 1,
        }
    }
}

/// How the soft reset waits for the device to clear its reset bit
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ResetPolicy {
    pub poll_interval_ms: u32,
    /// Give up with `Error::ResetTimeout` after this many polls.
    /// `None` polls until the device responds.
    pub max_attempts: Option<u32>,
}

impl Default for ResetPolicy {
    fn default() -> Self {
        Self {
            poll_interval_ms: 50,
            max_attempts: None,
        }
    }
}

/// Settings applied by the init sequence, in the order they are written
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
    pub led: LedConfig,
    pub light_active: bool,
    pub light_gain: u16,
    pub proximity_active: bool,
    pub proximity_saturation: bool,
    pub integration_time_ms: u16,
    pub proximity_rate_ms: u16,
    pub light_rate_ms: u16,
    /// (lower, upper)
    pub proximity_threshold: (i16, i16),
    /// (lower, upper)
    pub light_threshold: (i16, i16),
    /// (als, ps) consecutive readings before an interrupt asserts
    pub interrupt_persist: (u8, u8),
    pub reset: ResetPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            led: LedConfig::default(),
            light_active: true,
            light_gain: 4,
            proximity_active: true,
            proximity_saturation: true,
            integration_time_ms: 100,
            proximity_rate_ms: 100,
            light_rate_ms: 100,
            proximity_threshold: (0, 2047),
            // 65535 reinterpreted as a signed 16-bit word
            light_threshold: (0, -1),
            interrupt_persist: (0, 0),
            reset: ResetPolicy::default(),
        }
    }
}

impl Config {
    /// Check every enumerated value without touching the bus
    pub fn validate<CommE>(&self) -> Result<(), Error<CommE>> {
        self.led.validate()?;
        bit_field_code("gain", &ALS_GAINS, self.light_gain)?;
        bit_field_code("time_ms", &ALS_INTEGRATION_TIMES_MS, self.integration_time_ms)?;
        bit_field_code("rate", &PS_RATES_MS, self.proximity_rate_ms)?;
        bit_field_code("rate", &ALS_RATES_MS, self.light_rate_ms)?;
        check_persist(self.interrupt_persist.0, self.interrupt_persist.1)
    }
}

impl LedConfig {
    /// Bit-field codes for (current, duty cycle, pulse frequency)
    pub(crate) fn codes<CommE>(&self) -> Result<(u8, u8, u8), Error<CommE>> {
        let freq = bit_field_code("pulse_freq", &LED_PULSE_FREQS_KHZ, self.pulse_freq_khz)?;
        let duty = bit_field_code("duty_cycle", &LED_DUTY_CYCLES, self.duty_cycle)?;
        let current = bit_field_code("current", &LED_CURRENTS_MA, self.current_ma)?;
        if self.pulse_count > MAX_PULSE_COUNT {
            return Err(Error::InvalidArgument {
                parameter: "num_pulses",
                value: self.pulse_count as i32,
            });
        }
        Ok((current, duty, freq))
    }

    pub fn validate<CommE>(&self) -> Result<(), Error<CommE>> {
        self.codes().map(|_| ())
    }
}

pub(crate) fn check_persist<CommE>(als: u8, ps: u8) -> Result<(), Error<CommE>> {
    if als > MAX_PERSIST {
        return Err(Error::InvalidArgument {
            parameter: "als_persist",
            value: als as i32,
        });
    }
    if ps > MAX_PERSIST {
        return Err(Error::InvalidArgument {
            parameter: "ps_persist",
            value: ps as i32,
        });
    }
    Ok(())
}
