//! Board pin map and sensor constants.

/// Igniter 1 arming relay.
pub const IGNITER_1_ARM_PIN: u8 = 4;
/// Igniter 1 firing MOSFET.
pub const IGNITER_1_FIRE_PIN: u8 = 5;
/// Igniter 2 arming relay.
pub const IGNITER_2_ARM_PIN: u8 = 6;
/// Igniter 2 firing MOSFET.
pub const IGNITER_2_FIRE_PIN: u8 = 7;

/// Fill solenoid valve (I/O expander bank A).
pub const SOLENOID_FILL_PIN: u8 = 20;
/// Depressurization solenoid valve (I/O expander bank A).
pub const SOLENOID_DEPR_PIN: u8 = 21;

/// Status LED red channel.
pub const LED_RED_PIN: u8 = 25;
/// Status LED green channel.
pub const LED_GREEN_PIN: u8 = 26;
/// Status LED blue channel.
pub const LED_BLUE_PIN: u8 = 27;
/// Buzzer driver.
pub const BUZZER_PIN: u8 = 32;

/// I2C address of the first TMP1075 temperature sensor.
pub const TMP1075_ADDR_1: u8 = 0x48;
/// I2C address of the second TMP1075 temperature sensor.
pub const TMP1075_ADDR_2: u8 = 0x49;
/// TMP1075 temperature result register.
pub const TMP1075_TEMP_REG: u8 = 0x00;
/// TMP1075 resolution in degrees Celsius per LSB (12-bit, left aligned).
pub const TMP1075_LSB_C: f32 = 0.0625;

/// ADC reference voltage.
pub const ADC_REF_MV: u32 = 3300;
/// Full-scale raw ADC reading (12-bit).
pub const ADC_MAX_RAW: u16 = 4095;
