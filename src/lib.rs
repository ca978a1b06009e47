//! Driver for the LiteOn LTR-559 ambient light and proximity sensor,
//! built on the blocking [`embedded-hal`] I2C traits.
//!
//! Construction verifies the part and manufacturer IDs, soft-resets the
//! device and applies a default configuration. Every call to
//! [`Ltr559::lux`] or [`Ltr559::proximity`] polls the status register and
//! reads whichever channels the device reports as ready.
//!
//! ```rust,no_run
//! # use embedded_hal_mock::{delay::MockNoop, i2c::Mock};
//! # let i2c = Mock::new(&[]);
//! # let mut delay = MockNoop::new();
//! use ltr559::Ltr559;
//!
//! let mut sensor = Ltr559::new(i2c, &mut delay).unwrap();
//! sensor.set_light_options(true, 8).unwrap();
//! let lux = sensor.lux().unwrap();
//! let proximity = sensor.proximity().unwrap();
//! # let _ = (lux, proximity);
//! ```
//!
//! [`embedded-hal`]: https://crates.io/crates/embedded-hal

#![cfg_attr(not(test), no_std)]

#[macro_use]
mod fmt;

mod config;
pub mod definitions;

use core::fmt::Debug;

use embedded_hal as hal;
use hal::blocking::delay::DelayMs;

pub use config::{Config, LedConfig, ResetPolicy};
use definitions::*;

pub const CHIP_VENDOR: &str = "LiteOn";
pub const CHIP_NAME: &str = "LTR559";
/// Part number 0x9 in the high nibble, revision 0x2 in the low nibble
pub const PART_ID: u8 = 0x92;
pub const MANUFACTURER_ID: u8 = 0x05;

/// Errors in this crate
#[derive(Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<CommE> {
    /// The bus transfer failed
    Comm(CommE),
    /// A value outside the parameter's legal set; nothing was written
    InvalidArgument { parameter: &'static str, value: i32 },
    /// The bus has already been handed back by [`Ltr559::close`]
    NotConnected,
    /// The identity registers did not match an LTR-559
    DeviceNotFound { manufacturer_id: u8, part_id: u8 },
    /// The reset bit was still set after [`ResetPolicy::max_attempts`] polls
    ResetTimeout,
}

impl<CommE> Error<CommE> {
    /// True for failures of the hardware or bus, which may succeed on retry.
    /// False for invalid arguments and use of a closed handle.
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Comm(_) | Error::ResetTimeout)
    }
}

impl<CommE: Debug> core::fmt::Display for Error<CommE> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::Comm(e) => write!(f, "bus transfer failed: {:?}", e),
            Error::InvalidArgument { parameter, value } => {
                write!(f, "Invalid value supplied for {}: {}.", parameter, value)
            }
            Error::NotConnected => f.write_str("device is not connected"),
            Error::DeviceNotFound {
                manufacturer_id,
                part_id,
            } => write!(
                f,
                "{} {} is not found 0x{:02X} 0x{:02X}.",
                CHIP_VENDOR, CHIP_NAME, part_id, manufacturer_id
            ),
            Error::ResetTimeout => f.write_str("soft reset did not complete"),
        }
    }
}

/// A failed construction. Holds the bus so the caller can retry.
pub struct InitError<I2C, CommE> {
    error: Error<CommE>,
    i2c_port: I2C,
}

impl<I2C, CommE> InitError<I2C, CommE> {
    pub fn error(&self) -> &Error<CommE> {
        &self.error
    }

    /// Take back the bus passed to [`Ltr559::new`]
    pub fn release(self) -> I2C {
        self.i2c_port
    }

    /// Split into the error and the bus
    pub fn into_parts(self) -> (Error<CommE>, I2C) {
        (self.error, self.i2c_port)
    }
}

impl<I2C, CommE: Debug> Debug for InitError<I2C, CommE> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("InitError").field("error", &self.error).finish()
    }
}

impl<I2C, CommE: Debug> core::fmt::Display for InitError<I2C, CommE> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.error, f)
    }
}

/// The most recent values read from the device
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Reading {
    /// Raw proximity count, 0-2047
    pub proximity: u16,
    /// Raw light channel 0
    pub als0: u16,
    /// Raw light channel 1
    pub als1: u16,
    /// Illuminance derived from the two light channels. May be negative
    /// at extreme channel ratios.
    pub lux: f64,
}

#[derive(Debug)]
pub struct Ltr559<I2C> {
    i2c_port: Option<I2C>,
    address: u8,
    part_id: u8,
    manufacturer_id: u8,
    reset_policy: ResetPolicy,
    reading: Reading,
}

/// Longest buffer written in one transfer, excluding the register address
const MAX_WRITE_LEN: usize = 4;

impl<I2C, CommE> Ltr559<I2C>
where
    I2C: hal::blocking::i2c::Write<Error = CommE>
        + hal::blocking::i2c::WriteRead<Error = CommE>,
    CommE: core::fmt::Debug,
{
    pub const DEFAULT_DEVICE_ADDRESS: u8 = 0x23;

    fn from_parts(i2c_port: I2C, reset_policy: ResetPolicy) -> Self {
        Self {
            i2c_port: Some(i2c_port),
            address: Self::DEFAULT_DEVICE_ADDRESS,
            part_id: 0,
            manufacturer_id: 0,
            reset_policy,
            reading: Reading::default(),
        }
    }

    /// Verify the device identity, reset it and apply [`Config::default`].
    /// On any failure the bus is handed back inside the [`InitError`].
    pub fn new<D: DelayMs<u32>>(
        i2c_port: I2C,
        delay: &mut D,
    ) -> Result<Self, InitError<I2C, CommE>> {
        Self::with_config(i2c_port, delay, Config::default())
    }

    /// As [`Ltr559::new`], applying `config` after the reset
    pub fn with_config<D: DelayMs<u32>>(
        i2c_port: I2C,
        delay: &mut D,
        config: Config,
    ) -> Result<Self, InitError<I2C, CommE>> {
        if let Err(error) = config.validate() {
            return Err(InitError { error, i2c_port });
        }
        let mut sensor = Self::from_parts(i2c_port, config.reset);
        match sensor.connect(delay, &config) {
            Ok(()) => Ok(sensor),
            Err(error) => match sensor.close() {
                Some(i2c_port) => Err(InitError { error, i2c_port }),
                None => unreachable!("connect never closes the bus"),
            },
        }
    }

    fn connect<D: DelayMs<u32>>(
        &mut self,
        delay: &mut D,
        config: &Config,
    ) -> Result<(), Error<CommE>> {
        self.manufacturer_id = self.read_register(Register::MANUFACTURER_ID as u8)?;
        self.part_id = self.read_register(Register::PART_ID as u8)?;
        debug!("ltr559 part id {} manufacturer id {}", self.part_id, self.manufacturer_id);

        if self.part_id != PART_ID || self.manufacturer_id != MANUFACTURER_ID {
            warn!(
                "ltr559 not found: part id {} manufacturer id {}",
                self.part_id,
                self.manufacturer_id
            );
            return Err(Error::DeviceNotFound {
                manufacturer_id: self.manufacturer_id,
                part_id: self.part_id,
            });
        }

        self.reset(delay)?;
        self.configure(config)
    }

    /// Write every setting in `config`, in init-sequence order.
    /// The config is validated before the first write. Interrupt
    /// persistence is only written when it differs from the reset value.
    pub fn configure(&mut self, config: &Config) -> Result<(), Error<CommE>> {
        config.validate()?;
        let led = &config.led;
        self.set_proximity_led(
            led.current_ma,
            led.duty_cycle,
            led.pulse_freq_khz,
            led.pulse_count,
        )?;
        self.set_light_options(config.light_active, config.light_gain)?;
        self.set_proximity_control(config.proximity_active, config.proximity_saturation)?;
        self.set_light_integration_time(config.integration_time_ms)?;
        self.set_proximity_rate(config.proximity_rate_ms)?;
        self.set_light_rate(config.light_rate_ms)?;
        let (lower, upper) = config.proximity_threshold;
        self.set_proximity_threshold(lower, upper)?;
        let (lower, upper) = config.light_threshold;
        self.set_light_threshold(lower, upper)?;
        self.set_proximity_offset(0)?;
        self.set_interrupts(true, true)?;
        match config.interrupt_persist {
            (0, 0) => Ok(()),
            (als, ps) => self.set_interrupt_persist(als, ps),
        }
    }

    /// Part ID read during construction
    pub fn part_id(&self) -> u8 {
        self.part_id
    }

    /// Manufacturer ID read during construction
    pub fn manufacturer_id(&self) -> u8 {
        self.manufacturer_id
    }

    /// Hand the bus back to the caller. Only the first call returns it;
    /// every operation afterwards fails with [`Error::NotConnected`].
    pub fn close(&mut self) -> Option<I2C> {
        let port = self.i2c_port.take();
        if port.is_some() {
            debug!("ltr559 closed");
        }
        port
    }

    /// Soft reset, then poll the reset bit until the device clears it
    pub fn reset<D: DelayMs<u32>>(&mut self, delay: &mut D) -> Result<(), Error<CommE>> {
        let mask = AlsControlField::SW_RESET as u8;
        let shift = shift_of(mask);
        self.set_bits(Register::ALS_CONTROL, mask, shift, 1)?;

        let mut attempts: u32 = 0;
        while self.get_bits(Register::ALS_CONTROL, mask, shift)? != 0 {
            attempts = attempts.saturating_add(1);
            if let Some(max_attempts) = self.reset_policy.max_attempts {
                if attempts >= max_attempts {
                    warn!("ltr559 reset still pending after {} polls", attempts);
                    return Err(Error::ResetTimeout);
                }
            }
            trace!("ltr559 reset pending, poll {}", attempts);
            delay.delay_ms(self.reset_policy.poll_interval_ms);
        }
        Ok(())
    }

    /// Proximity measurement period in ms: 10, 50, 70, 100, 200, 500, 1000 or 2000
    pub fn set_proximity_rate(&mut self, rate_ms: u16) -> Result<(), Error<CommE>> {
        let code = bit_field_code("rate", &PS_RATES_MS, rate_ms)?;
        self.set_field(Register::PS_MEAS_RATE, PsMeasRateField::PS_RATE as u8, code)
    }

    /// Light sensor mode and gain: 1, 2, 4, 8, 48 or 96
    pub fn set_light_options(&mut self, active: bool, gain: u16) -> Result<(), Error<CommE>> {
        let code = bit_field_code("gain", &ALS_GAINS, gain)?;
        self.set_field(Register::ALS_CONTROL, AlsControlField::ALS_MODE as u8, active as u8)?;
        self.set_field(Register::ALS_CONTROL, AlsControlField::ALS_GAIN as u8, code)
    }

    /// Light measurement period in ms: 50, 100, 200, 500, 1000 or 2000
    pub fn set_light_rate(&mut self, rate_ms: u16) -> Result<(), Error<CommE>> {
        let code = bit_field_code("rate", &ALS_RATES_MS, rate_ms)?;
        self.set_field(Register::ALS_MEAS_RATE, AlsMeasRateField::ALS_RATE as u8, code)
    }

    /// Light integration time in ms: 50, 100, 150, 200, 250, 300, 350 or 400
    pub fn set_light_integration_time(&mut self, time_ms: u16) -> Result<(), Error<CommE>> {
        let code = bit_field_code("time_ms", &ALS_INTEGRATION_TIMES_MS, time_ms)?;
        self.set_field(Register::ALS_MEAS_RATE, AlsMeasRateField::ALS_INT_TIME as u8, code)
    }

    pub fn set_proximity_control(
        &mut self,
        active: bool,
        saturation_indicator: bool,
    ) -> Result<(), Error<CommE>> {
        self.set_field(
            Register::PS_CONTROL,
            PsControlField::PS_SATURATION as u8,
            saturation_indicator as u8,
        )?;
        self.set_field(
            Register::PS_CONTROL,
            PsControlField::PS_MODE as u8,
            if active { 0b11 } else { 0 },
        )
    }

    /// Proximity LED drive. All three enumerated values are checked before
    /// anything is written.
    pub fn set_proximity_led(
        &mut self,
        current_ma: u16,
        duty_cycle: u16,
        pulse_freq_khz: u16,
        num_pulses: u8,
    ) -> Result<(), Error<CommE>> {
        let led = LedConfig {
            current_ma,
            duty_cycle,
            pulse_freq_khz,
            pulse_count: num_pulses,
        };
        let (current, duty, freq) = led.codes()?;
        self.set_field(Register::PS_LED, PsLedField::LED_PULSE_FREQ as u8, freq)?;
        self.set_field(Register::PS_LED, PsLedField::LED_DUTY as u8, duty)?;
        self.set_field(Register::PS_LED, PsLedField::LED_CURRENT as u8, current)?;
        self.set_field(Register::PS_N_PULSES, PsNPulsesField::PULSE_COUNT as u8, num_pulses)
    }

    pub fn set_proximity_threshold(&mut self, lower: i16, upper: i16) -> Result<(), Error<CommE>> {
        self.write_word(Register::PS_THRESHOLD.offset(0), lower as u16)?;
        self.write_word(Register::PS_THRESHOLD.offset(2), upper as u16)
    }

    pub fn set_light_threshold(&mut self, lower: i16, upper: i16) -> Result<(), Error<CommE>> {
        self.write_word(Register::ALS_THRESHOLD.offset(0), lower as u16)?;
        self.write_word(Register::ALS_THRESHOLD.offset(2), upper as u16)
    }

    /// Proximity offset compensation, 0-1023
    pub fn set_proximity_offset(&mut self, offset: u16) -> Result<(), Error<CommE>> {
        if offset > MAX_PS_OFFSET {
            return Err(Error::InvalidArgument {
                parameter: "offset",
                value: offset as i32,
            });
        }
        self.write_buffer(Register::PS_OFFSET as u8, &offset.to_le_bytes())
    }

    /// Enable the light and proximity interrupt sources
    pub fn set_interrupts(&mut self, als: bool, ps: bool) -> Result<(), Error<CommE>> {
        let mask = InterruptField::PS_INT as u8 | InterruptField::ALS_INT as u8;
        let value = ((als as u8) << shift_of(InterruptField::ALS_INT as u8)) | ps as u8;
        self.set_bits(Register::INTERRUPT, mask, 0, value)
    }

    /// Consecutive out-of-threshold readings, 0-15, before each interrupt asserts
    pub fn set_interrupt_persist(&mut self, als: u8, ps: u8) -> Result<(), Error<CommE>> {
        config::check_persist(als, ps)?;
        let ps_shift = shift_of(InterruptPersistField::PS_PERSIST as u8);
        self.write_register(Register::INTERRUPT_PERSIST as u8, (ps << ps_shift) | als)
    }

    /// Poll the status register and read the channels it reports as ready.
    /// Channels that are not ready keep their previous values.
    pub fn update_sensor(&mut self) -> Result<Reading, Error<CommE>> {
        let status = self.read_register(Register::ALS_PS_STATUS as u8)?;

        if status & StatusField::PS_READY as u8 != 0 {
            self.reading.proximity = self.read_word(Register::PS_DATA as u8)? & PS_DATA_MASK;
        }

        if status & StatusField::ALS_READY as u8 != 0 {
            let als0 = self.read_word(Register::ALS_DATA.offset(0))?;
            let als1 = self.read_word(Register::ALS_DATA.offset(2))?;
            self.reading.als0 = als0;
            self.reading.als1 = als1;
            self.reading.lux = compute_lux(als0, als1);
        }

        trace!(
            "ltr559 status {} reading {} {} {}",
            status,
            self.reading.proximity,
            self.reading.als0,
            self.reading.als1
        );
        Ok(self.reading)
    }

    /// Poll the device and return the illuminance in lux
    pub fn lux(&mut self) -> Result<f64, Error<CommE>> {
        Ok(self.update_sensor()?.lux)
    }

    /// Poll the device and return the raw proximity count
    pub fn proximity(&mut self) -> Result<u16, Error<CommE>> {
        Ok(self.update_sensor()?.proximity)
    }

    /// Read-modify-write of the bits selected by `mask`
    pub fn set_bits(
        &mut self,
        register: Register,
        mask: u8,
        shift: u8,
        value: u8,
    ) -> Result<(), Error<CommE>> {
        check_shift(shift)?;
        let current = self.read_register(register as u8)?;
        let new_val = (current & !mask) | (value << shift);
        trace!("ltr559 reg {} {} -> {}", register as u8, current, new_val);
        self.write_register(register as u8, new_val)
    }

    /// Read the bits selected by `mask`, shifted down to bit 0
    pub fn get_bits(
        &mut self,
        register: Register,
        mask: u8,
        shift: u8,
    ) -> Result<u8, Error<CommE>> {
        check_shift(shift)?;
        let current = self.read_register(register as u8)?;
        Ok((current & mask) >> shift)
    }

    fn set_field(&mut self, register: Register, mask: u8, value: u8) -> Result<(), Error<CommE>> {
        self.set_bits(register, mask, shift_of(mask), value)
    }

    fn port(&mut self) -> Result<&mut I2C, Error<CommE>> {
        self.i2c_port.as_mut().ok_or(Error::NotConnected)
    }

    fn read_register(&mut self, register: u8) -> Result<u8, Error<CommE>> {
        let mut data = [0];
        self.read_registers(register, data.as_mut())?;
        Ok(data[0])
    }

    fn write_register(&mut self, register: u8, value: u8) -> Result<(), Error<CommE>> {
        self.write_buffer(register, &[value])
    }

    /// Little-endian word from `register` and `register + 1`
    fn read_word(&mut self, register: u8) -> Result<u16, Error<CommE>> {
        let mut data = [0u8; 2];
        self.read_registers(register, data.as_mut())?;
        Ok(u16::from_le_bytes(data))
    }

    fn write_word(&mut self, register: u8, value: u16) -> Result<(), Error<CommE>> {
        self.write_buffer(register, &value.to_le_bytes())
    }

    /// Write consecutive registers beginning at `start`
    fn write_buffer(&mut self, start: u8, data: &[u8]) -> Result<(), Error<CommE>> {
        if data.len() > MAX_WRITE_LEN {
            return Err(Error::InvalidArgument {
                parameter: "length",
                value: data.len() as i32,
            });
        }
        let mut buf = [0u8; MAX_WRITE_LEN + 1];
        buf[0] = start;
        buf[1..=data.len()].copy_from_slice(data);
        let address = self.address;
        self.port()?
            .write(address, &buf[..=data.len()])
            .map_err(Error::Comm)
    }

    /// Read one or more registers at once, beginning at the start register
    fn read_registers(&mut self, start: u8, buf: &mut [u8]) -> Result<(), Error<CommE>> {
        let address = self.address;
        self.port()?
            .write_read(address, &[start], buf)
            .map_err(Error::Comm)?;
        Ok(())
    }
}

fn check_shift<CommE>(shift: u8) -> Result<(), Error<CommE>> {
    if shift > 7 {
        return Err(Error::InvalidArgument {
            parameter: "shift",
            value: shift as i32,
        });
    }
    Ok(())
}

/// Map a physical value to its bit-field code: its index in `legal`
pub(crate) fn bit_field_code<CommE>(
    parameter: &'static str,
    legal: &[u16],
    value: u16,
) -> Result<u8, Error<CommE>> {
    legal
        .iter()
        .position(|&v| v == value)
        .map(|code| code as u8)
        .ok_or(Error::InvalidArgument {
            parameter,
            value: value as i32,
        })
}

/// `ch0 * 1000 / (ch0 + ch1)`, or 1000 when both channels read zero
pub fn channel_ratio(ch0: u16, ch1: u16) -> u32 {
    let total = ch0 as u32 + ch1 as u32;
    if total == 0 {
        return DEFAULT_RATIO;
    }
    ch0 as u32 * 1000 / total
}

/// Calibration bracket for a channel ratio
pub fn calibration_index(ratio: u32) -> usize {
    RATIO_BRACKETS
        .iter()
        .position(|&bound| ratio < bound)
        .unwrap_or(RATIO_BRACKETS.len())
}

/// Illuminance in lux from the two raw light channels
pub fn compute_lux(ch0: u16, ch1: u16) -> f64 {
    let idx = calibration_index(channel_ratio(ch0, ch1));
    let scaled = ch0 as i64 * CH0_COEFFICIENTS[idx] as i64
        - ch1 as i64 * CH1_COEFFICIENTS[idx] as i64;
    scaled as f64 / LUX_SCALE
}
