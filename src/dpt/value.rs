//! Typed group values and their payload layout.
//!
//! Values of up to six bits travel in the first payload byte, which they
//! share with the low command bits. Everything else is prefixed by one byte
//! that only carries the command bits:
//!
//! | Variant | Payload |
//! |---|---|
//! | `Bit`, `TwoBit`, `FourBit` | `[v]` |
//! | `I8`, `U8` | `[0, v]` |
//! | `I16`, `U16` | `[0, hi, lo]` |
//! | `Float2` | `[0, dpt9 hi, dpt9 lo]` |
//! | `Time` | `[0, weekday << 5 \| hours, minutes, seconds]` |
//! | `Date` | `[0, day, month, year]` |
//! | `Color` | `[0, r, g, b]` |
//! | `I32`, `U32`, `Float4` | `[0, b3, b2, b1, b0]` |
//! | `Text` | `[0, 14 bytes NUL padded]` |

use crate::dpt::dpt9;
use crate::error::{KnxError, Result};

/// Largest payload any [`KnxValue`] encodes to.
pub const MAX_VALUE_LEN: usize = 15;

const TEXT_LEN: usize = 14;

/// Time of day (DPT 10.001). `weekday` 0 means "no day", 1 is Monday.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TimeOfDay {
    pub weekday: u8,
    pub hours: u8,
    pub minutes: u8,
    pub seconds: u8,
}

impl TimeOfDay {
    /// Validated constructor.
    pub fn new(weekday: u8, hours: u8, minutes: u8, seconds: u8) -> Result<Self> {
        if weekday > 7 || hours > 23 || minutes > 59 || seconds > 59 {
            return Err(KnxError::dpt_value_out_of_range());
        }
        Ok(Self {
            weekday,
            hours,
            minutes,
            seconds,
        })
    }

    /// Wire bytes; fields are masked to their widths.
    pub const fn to_bytes(self) -> [u8; 3] {
        [
            ((self.weekday & 0x07) << 5) | (self.hours & 0x1F),
            self.minutes & 0x3F,
            self.seconds & 0x3F,
        ]
    }

    pub const fn from_bytes(bytes: [u8; 3]) -> Self {
        Self {
            weekday: (bytes[0] & 0xE0) >> 5,
            hours: bytes[0] & 0x1F,
            minutes: bytes[1] & 0x3F,
            seconds: bytes[2] & 0x3F,
        }
    }
}

/// Calendar date (DPT 11.001). `year` is 0-99.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Date {
    pub day: u8,
    pub month: u8,
    pub year: u8,
}

impl Date {
    /// Validated constructor.
    pub fn new(day: u8, month: u8, year: u8) -> Result<Self> {
        if !(1..=31).contains(&day) || !(1..=12).contains(&month) || year > 99 {
            return Err(KnxError::dpt_value_out_of_range());
        }
        Ok(Self { day, month, year })
    }

    pub const fn to_bytes(self) -> [u8; 3] {
        [self.day & 0x1F, self.month & 0x0F, self.year & 0x7F]
    }

    pub const fn from_bytes(bytes: [u8; 3]) -> Self {
        Self {
            day: bytes[0] & 0x1F,
            month: bytes[1] & 0x0F,
            year: bytes[2] & 0x7F,
        }
    }
}

/// RGB color (DPT 232.600).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Color {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

impl Color {
    pub const fn to_bytes(self) -> [u8; 3] {
        [self.red, self.green, self.blue]
    }

    pub const fn from_bytes(bytes: [u8; 3]) -> Self {
        Self {
            red: bytes[0],
            green: bytes[1],
            blue: bytes[2],
        }
    }
}

/// A typed value for an outgoing group write or answer.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum KnxValue<'a> {
    /// DPT 1 (low bit)
    Bit(bool),
    /// DPT 2 (low two bits)
    TwoBit(u8),
    /// DPT 3 (low four bits)
    FourBit(u8),
    /// DPT 6
    I8(i8),
    /// DPT 5
    U8(u8),
    /// DPT 8
    I16(i16),
    /// DPT 7
    U16(u16),
    /// DPT 9
    Float2(f32),
    /// DPT 10
    Time(TimeOfDay),
    /// DPT 11
    Date(Date),
    /// DPT 232
    Color(Color),
    /// DPT 13
    I32(i32),
    /// DPT 12
    U32(u32),
    /// DPT 14
    Float4(f32),
    /// DPT 16, at most 14 bytes
    Text(&'a str),
}

impl KnxValue<'_> {
    /// Number of payload bytes [`encode`](Self::encode) writes.
    pub fn encoded_len(&self) -> usize {
        match self {
            Self::Bit(_) | Self::TwoBit(_) | Self::FourBit(_) => 1,
            Self::I8(_) | Self::U8(_) => 2,
            Self::I16(_) | Self::U16(_) | Self::Float2(_) => 3,
            Self::Time(_) | Self::Date(_) | Self::Color(_) => 4,
            Self::I32(_) | Self::U32(_) | Self::Float4(_) => 5,
            Self::Text(_) => 1 + TEXT_LEN,
        }
    }

    /// Write the payload into the start of `buf`, returning its length.
    ///
    /// The top two bits of byte 0 are left clear for the command type.
    ///
    /// # Errors
    ///
    /// - transport error when `buf` is shorter than [`encoded_len`](Self::encoded_len)
    /// - DPT error for out-of-range floats, times, dates or over-long text
    pub fn encode(&self, buf: &mut [u8]) -> Result<usize> {
        let len = self.encoded_len();
        let out = buf.get_mut(..len).ok_or_else(KnxError::buffer_too_small)?;
        out.fill(0);

        match *self {
            Self::Bit(v) => out[0] = u8::from(v),
            Self::TwoBit(v) => out[0] = v & 0x03,
            Self::FourBit(v) => out[0] = v & 0x0F,
            Self::I8(v) => out[1] = v as u8,
            Self::U8(v) => out[1] = v,
            Self::I16(v) => out[1..].copy_from_slice(&v.to_be_bytes()),
            Self::U16(v) => out[1..].copy_from_slice(&v.to_be_bytes()),
            Self::Float2(v) => out[1..].copy_from_slice(&dpt9::encode_float(v)?),
            Self::Time(t) => {
                TimeOfDay::new(t.weekday, t.hours, t.minutes, t.seconds)?;
                out[1..].copy_from_slice(&t.to_bytes());
            }
            Self::Date(d) => {
                Date::new(d.day, d.month, d.year)?;
                out[1..].copy_from_slice(&d.to_bytes());
            }
            Self::Color(c) => out[1..].copy_from_slice(&c.to_bytes()),
            Self::I32(v) => out[1..].copy_from_slice(&v.to_be_bytes()),
            Self::U32(v) => out[1..].copy_from_slice(&v.to_be_bytes()),
            Self::Float4(v) => out[1..].copy_from_slice(&v.to_be_bytes()),
            Self::Text(s) => {
                let bytes = s.as_bytes();
                if bytes.len() > TEXT_LEN {
                    return Err(KnxError::dpt_value_out_of_range());
                }
                out[1..=bytes.len()].copy_from_slice(bytes);
            }
        }

        Ok(len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(value: KnxValue<'_>) -> std::vec::Vec<u8> {
        let mut buf = [0xAAu8; MAX_VALUE_LEN];
        let len = value.encode(&mut buf).unwrap();
        buf[..len].to_vec()
    }

    #[test]
    fn test_short_values() {
        assert_eq!(encode(KnxValue::Bit(true)), [0x01]);
        assert_eq!(encode(KnxValue::Bit(false)), [0x00]);
        assert_eq!(encode(KnxValue::TwoBit(0xFF)), [0x03]);
        assert_eq!(encode(KnxValue::FourBit(0x1B)), [0x0B]);
    }

    #[test]
    fn test_prefixed_values() {
        assert_eq!(encode(KnxValue::I8(-1)), [0x00, 0xFF]);
        assert_eq!(encode(KnxValue::U8(200)), [0x00, 200]);
        assert_eq!(encode(KnxValue::I16(-2)), [0x00, 0xFF, 0xFE]);
        assert_eq!(encode(KnxValue::U16(0x1234)), [0x00, 0x12, 0x34]);
        assert_eq!(encode(KnxValue::U32(0xDEAD_BEEF)), [0x00, 0xDE, 0xAD, 0xBE, 0xEF]);
        assert_eq!(encode(KnxValue::I32(-1)), [0x00, 0xFF, 0xFF, 0xFF, 0xFF]);
        assert_eq!(encode(KnxValue::Float4(1.0)), [0x00, 0x3F, 0x80, 0x00, 0x00]);
        assert_eq!(encode(KnxValue::Float2(21.6)), [0x00, 0x0C, 0x38]);
    }

    #[test]
    fn test_time_layout() {
        let time = TimeOfDay::new(3, 14, 30, 59).unwrap();
        assert_eq!(encode(KnxValue::Time(time)), [0x00, (3 << 5) | 14, 30, 59]);
        assert_eq!(TimeOfDay::from_bytes(time.to_bytes()), time);
        assert!(TimeOfDay::new(0, 24, 0, 0).is_err());
        assert!(TimeOfDay::new(8, 0, 0, 0).is_err());
        assert!(TimeOfDay::new(0, 0, 60, 0).is_err());
    }

    #[test]
    fn test_date_layout() {
        let date = Date::new(24, 12, 25).unwrap();
        assert_eq!(encode(KnxValue::Date(date)), [0x00, 24, 12, 25]);
        assert!(Date::new(0, 1, 0).is_err());
        assert!(Date::new(1, 13, 0).is_err());
        assert!(Date::new(1, 1, 100).is_err());

        let unchecked = Date { day: 32, month: 1, year: 0 };
        let mut buf = [0u8; MAX_VALUE_LEN];
        assert!(KnxValue::Date(unchecked).encode(&mut buf).is_err());
    }

    #[test]
    fn test_color_layout() {
        let color = Color { red: 1, green: 2, blue: 3 };
        assert_eq!(encode(KnxValue::Color(color)), [0x00, 1, 2, 3]);
    }

    #[test]
    fn test_text_padding() {
        let bytes = encode(KnxValue::Text("hello"));
        assert_eq!(bytes.len(), 15);
        assert_eq!(&bytes[1..6], b"hello");
        assert!(bytes[6..].iter().all(|&b| b == 0));

        let mut buf = [0u8; MAX_VALUE_LEN];
        assert!(KnxValue::Text("fifteen chars!!").encode(&mut buf).is_err());
        assert_eq!(KnxValue::Text("fourteen chars").encode(&mut buf).unwrap(), 15);
    }

    #[test]
    fn test_buffer_too_small() {
        let mut buf = [0u8; 2];
        let err = KnxValue::U16(1).encode(&mut buf).unwrap_err();
        assert!(matches!(err, KnxError::Transport(e) if e.is_buffer_too_small()));
    }
}
