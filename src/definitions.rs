/// Registers described in the data sheet for this device
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq)]
#[repr(u8)]
pub enum Register {
    ALS_CONTROL = 0x80,     // ALS active, SW reset, gain
    PS_CONTROL = 0x81,      // PS active, saturation indicator
    PS_LED = 0x82,          // LED pulse freq, duty cycle, current
    PS_N_PULSES = 0x83,     // LED pulses per measurement
    PS_MEAS_RATE = 0x84,    // PS measurement rate
    ALS_MEAS_RATE = 0x85,   // ALS integration time and measurement rate
    PART_ID = 0x86,         // s/b 0x92
    MANUFACTURER_ID = 0x87, // s/b 0x05
    ALS_DATA = 0x88,        // two 16-bit channels, 0x88..0x8B
    ALS_PS_STATUS = 0x8C,
    PS_DATA = 0x8D, // 11 bits over 0x8D..0x8E
    INTERRUPT = 0x8F,
    PS_THRESHOLD = 0x90, // two 16-bit thresholds, 0x90..0x93
    PS_OFFSET = 0x94,    // 10 bits over 0x94..0x95
    ALS_THRESHOLD = 0x97, // two 16-bit thresholds, 0x97..0x9A
    INTERRUPT_PERSIST = 0x9E,
}

impl Register {
    /// Address of the register `offset` bytes past this one
    pub(crate) fn offset(self, offset: u8) -> u8 {
        (self as u8).wrapping_add(offset)
    }
}

/// Fields from ALS_CONTROL Register (0x80)
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq)]
#[repr(u8)]
pub enum AlsControlField {
    /// ALS mode: 0 standby, 1 active
    ALS_MODE = 1 << 0,
    /// Software reset, cleared by the device once the reset completes
    SW_RESET = 1 << 1,
    /// ALS gain code
    ALS_GAIN = 0b111 << 2,
}

/// Fields from PS_CONTROL Register (0x81)
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq)]
#[repr(u8)]
pub enum PsControlField {
    /// PS mode: 0b00 standby, 0b11 active
    PS_MODE = 0b11,
    /// Saturation indicator enable
    PS_SATURATION = 1 << 5,
}

/// Fields from PS_LED Register (0x82)
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq)]
#[repr(u8)]
pub enum PsLedField {
    /// LED current
    LED_CURRENT = 0b111,
    /// LED pulse duty cycle
    LED_DUTY = 0b11 << 3,
    /// LED pulse modulation frequency
    LED_PULSE_FREQ = 0b111 << 5,
}

/// Fields from PS_N_PULSES Register (0x83)
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq)]
#[repr(u8)]
pub enum PsNPulsesField {
    PULSE_COUNT = 0b1111,
}

/// Fields from PS_MEAS_RATE Register (0x84)
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq)]
#[repr(u8)]
pub enum PsMeasRateField {
    PS_RATE = 0b1111,
}

/// Fields from ALS_MEAS_RATE Register (0x85)
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq)]
#[repr(u8)]
pub enum AlsMeasRateField {
    /// ALS measurement repeat rate
    ALS_RATE = 0b111,
    /// ALS integration time
    ALS_INT_TIME = 0b111 << 3,
}

/// Fields from ALS_PS_STATUS Register (0x8C)
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq)]
#[repr(u8)]
pub enum StatusField {
    /// PS data and PS interrupt bits
    PS_READY = 0b0000_0011,
    /// ALS data and ALS interrupt bits
    ALS_READY = 0b0000_1100,
}

/// Fields from INTERRUPT Register (0x8F)
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq)]
#[repr(u8)]
pub enum InterruptField {
    PS_INT = 1 << 0,
    ALS_INT = 1 << 1,
}

/// Fields from INTERRUPT_PERSIST Register (0x9E)
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq)]
#[repr(u8)]
pub enum InterruptPersistField {
    ALS_PERSIST = 0b1111,
    PS_PERSIST = 0b1111 << 4,
}

/// Shift of the lowest set bit of a field mask
pub(crate) const fn shift_of(mask: u8) -> u8 {
    mask.trailing_zeros() as u8
}

pub const PS_DATA_MASK: u16 = 0x07FF;

/// Legal proximity measurement rates in ms, indexed by bit-field code
pub const PS_RATES_MS: [u16; 8] = [10, 50, 70, 100, 200, 500, 1000, 2000];
/// Legal light gains, indexed by bit-field code
pub const ALS_GAINS: [u16; 6] = [1, 2, 4, 8, 48, 96];
/// Legal light measurement rates in ms, indexed by bit-field code
pub const ALS_RATES_MS: [u16; 6] = [50, 100, 200, 500, 1000, 2000];
/// Legal light integration times in ms, in hardware code order (not sorted)
pub const ALS_INTEGRATION_TIMES_MS: [u16; 8] = [100, 50, 200, 400, 150, 250, 300, 350];
/// Legal LED currents in mA
pub const LED_CURRENTS_MA: [u16; 5] = [5, 10, 20, 50, 100];
/// Legal LED duty cycles in percent
pub const LED_DUTY_CYCLES: [u16; 4] = [25, 50, 75, 100];
/// Legal LED pulse frequencies in kHz
pub const LED_PULSE_FREQS_KHZ: [u16; 8] = [30, 40, 50, 60, 70, 80, 90, 100];

pub const MAX_PULSE_COUNT: u8 = 31;
pub const MAX_PERSIST: u8 = 15;
pub const MAX_PS_OFFSET: u16 = 0x03FF;

/// Channel 0 coefficients, one per calibration bracket
pub const CH0_COEFFICIENTS: [i32; 4] = [17743, 42785, 5926, 0];
/// Channel 1 coefficients, one per calibration bracket
pub const CH1_COEFFICIENTS: [i32; 4] = [-11059, 19548, -1185, 0];
/// Upper (exclusive) channel ratio bound of the first three brackets
pub const RATIO_BRACKETS: [u32; 3] = [450, 640, 850];
/// Ratio used when both channels read zero
pub const DEFAULT_RATIO: u32 = 1000;
pub const LUX_SCALE: f64 = 10000.0;
