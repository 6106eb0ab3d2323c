//! KNX Datapoint Types (DPT)
//!
//! Encoding and decoding of the values carried in group telegrams.
//!
//! - [`dpt9`] - the KNX 2-byte float (temperature, lux, pressure, ...)
//! - [`value`] - [`KnxValue`], the typed payload accepted by the send family,
//!   and the composite time/date/color types
//!
//! ## Usage
//!
//! ```rust
//! use knx_ip_node::dpt::{Dpt9, DptDecode, DptEncode};
//!
//! let mut buf = [0u8; 2];
//! let len = Dpt9::Temperature.encode(21.5, &mut buf).unwrap();
//! let temp = Dpt9::Temperature.decode(&buf[..len]).unwrap();
//! assert!((temp - 21.5).abs() < 0.05);
//! ```

use crate::error::Result;

pub mod dpt9;
pub mod value;

#[doc(inline)]
pub use dpt9::Dpt9;
#[doc(inline)]
pub use value::{Color, Date, KnxValue, TimeOfDay};

/// Trait for encoding values to KNX data format
pub trait DptEncode<T> {
    /// Encode `value` into the start of `buf`, returning the bytes written.
    fn encode(&self, value: T, buf: &mut [u8]) -> Result<usize>;
}

/// Trait for decoding KNX data to values
pub trait DptDecode<T> {
    /// Decode KNX byte representation to a value
    fn decode(&self, data: &[u8]) -> Result<T>;
}
