//! DPT 9.xxx - 2-byte Float (16-bit floating point)
//!
//! ## Format
//!
//! ```text
//! Byte 0: MEEE EMMM
//! Byte 1: MMMM MMMM
//!
//! E = Exponent (bits 14-11, unsigned, 0-15)
//! M = Mantissa (bit 15 and bits 10-0, 12-bit two's complement, -2048..=2047)
//!
//! Value = 0.01 * M * 2^E
//! ```
//!
//! Encoding picks the smallest exponent that fits the rounded mantissa.
//! `0x7FFF` is reserved for "invalid data".
//!
//! ## Range
//!
//! - Min: -671088.64
//! - Max: +670760.96 (encodes to the reserved pattern, so the largest
//!   accepted value is one step below)

use crate::dpt::{DptDecode, DptEncode};
use crate::error::{KnxError, Result};

/// Reserved raw value meaning "invalid data"
pub const INVALID_DATA: u16 = 0x7FFF;

const MANTISSA_MIN: i32 = -2048;
const MANTISSA_MAX: i32 = 2047;

/// DPT 9.xxx 2-byte float types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Dpt9 {
    /// DPT 9.001 - Temperature (°C)
    Temperature,
    /// DPT 9.002 - Temperature difference (K)
    TemperatureDifference,
    /// DPT 9.004 - Illuminance (lux)
    Illuminance,
    /// DPT 9.005 - Wind speed (m/s)
    WindSpeed,
    /// DPT 9.006 - Pressure (Pa)
    Pressure,
    /// DPT 9.007 - Humidity (%)
    Humidity,
    /// DPT 9.008 - Air quality (ppm)
    AirQuality,
    /// DPT 9.020 - Voltage (mV)
    Voltage,
    /// DPT 9.021 - Current (mA)
    Current,
    /// DPT 9.024 - Power (kW)
    Power,
}

impl Dpt9 {
    /// Get the DPT identifier string
    pub const fn identifier(&self) -> &'static str {
        match self {
            Dpt9::Temperature => "9.001",
            Dpt9::TemperatureDifference => "9.002",
            Dpt9::Illuminance => "9.004",
            Dpt9::WindSpeed => "9.005",
            Dpt9::Pressure => "9.006",
            Dpt9::Humidity => "9.007",
            Dpt9::AirQuality => "9.008",
            Dpt9::Voltage => "9.020",
            Dpt9::Current => "9.021",
            Dpt9::Power => "9.024",
        }
    }

    /// Get the unit string
    pub const fn unit(&self) -> &'static str {
        match self {
            Dpt9::Temperature => "°C",
            Dpt9::TemperatureDifference => "K",
            Dpt9::Illuminance => "lux",
            Dpt9::WindSpeed => "m/s",
            Dpt9::Pressure => "Pa",
            Dpt9::Humidity => "%",
            Dpt9::AirQuality => "ppm",
            Dpt9::Voltage => "mV",
            Dpt9::Current => "mA",
            Dpt9::Power => "kW",
        }
    }
}

/// Round half away from zero (no `f32::round` in `core`).
#[inline]
fn round_to_i32(x: f32) -> i32 {
    if x >= 0.0 {
        (x + 0.5) as i32
    } else {
        (x - 0.5) as i32
    }
}

/// Encode a float into its 2-byte KNX representation.
///
/// # Errors
///
/// Returns a DPT error for NaN, infinities and values outside the
/// representable range.
pub fn encode_float(value: f32) -> Result<[u8; 2]> {
    if !value.is_finite() {
        return Err(KnxError::dpt_value_out_of_range());
    }

    let scaled = value * 100.0;
    for exponent in 0u8..=15 {
        let mantissa = round_to_i32(scaled / (1u32 << exponent) as f32);
        if (MANTISSA_MIN..=MANTISSA_MAX).contains(&mantissa) {
            let sign: u16 = if mantissa < 0 { 0x8000 } else { 0 };
            let raw = sign | (u16::from(exponent) << 11) | ((mantissa as u16) & 0x07FF);
            if raw == INVALID_DATA {
                break;
            }
            return Ok(raw.to_be_bytes());
        }
    }

    Err(KnxError::dpt_value_out_of_range())
}

/// Decode a 2-byte KNX float.
///
/// # Errors
///
/// Returns a DPT error for the reserved `0x7FFF` pattern.
pub fn decode_float(bytes: [u8; 2]) -> Result<f32> {
    let raw = u16::from_be_bytes(bytes);
    if raw == INVALID_DATA {
        return Err(KnxError::invalid_dpt_data());
    }

    let exponent = (raw >> 11) & 0x0F;
    let mut mantissa = i32::from(raw & 0x07FF);
    if raw & 0x8000 != 0 {
        mantissa -= 2048;
    }

    Ok((mantissa << exponent) as f32 / 100.0)
}

impl DptEncode<f32> for Dpt9 {
    fn encode(&self, value: f32, buf: &mut [u8]) -> Result<usize> {
        let out = buf.get_mut(..2).ok_or_else(KnxError::buffer_too_small)?;
        out.copy_from_slice(&encode_float(value)?);
        Ok(2)
    }
}

impl DptDecode<f32> for Dpt9 {
    fn decode(&self, data: &[u8]) -> Result<f32> {
        match *data {
            [hi, lo, ..] => decode_float([hi, lo]),
            _ => Err(KnxError::invalid_dpt_data()),
        }
    }
}
