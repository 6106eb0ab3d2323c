#![cfg_attr(all(not(test), not(feature = "std")), no_std)]

//! # knx-ip-node
//!
//! Core of a KNX/IP routing device for embedded systems.
//!
//! The crate listens for KNXnet/IP routing indications, decodes the group
//! telegrams they carry and hands each one to the callbacks bound to its
//! destination group address. Alongside the dispatch table it keeps a typed
//! configuration arena, a fixed 512-byte block of named settings that is
//! persisted together with the bindings and the physical address.
//!
//! ## Features
//!
//! - Routing indication parser and encoder (cEMI `L_Data.ind`)
//! - All 16 application-layer command types
//! - DPT 9 two-byte float and typed payload helpers
//! - Callback registry with single or multiple delivery
//! - Configuration arena with per-entry enable conditions
//! - Persistence through a small key/value [`Storage`](persistence::Storage) trait
//! - `no_std` + `alloc`; optional `std`, `log`, `defmt`, `serde`
//!
//! ## Example
//!
//! ```rust
//! use knx_ip_node::net::MockTransport;
//! use knx_ip_node::{ga, KnxDevice, KnxValue};
//!
//! let mut device = KnxDevice::new(MockTransport::new());
//!
//! let threshold = device.register_int("threshold", 25, None)?;
//! let heater = device.register_callback("heater", |telegram| {
//!     if let Ok(celsius) = telegram.as_float2() {
//!         let _too_cold = celsius < 18.0;
//!     }
//! }, None)?;
//! device.bind(heater, ga!(10/6/5))?;
//!
//! device.config_mut().set_int(threshold, 21)?;
//! device.write(ga!(10/6/6), &KnxValue::Bit(true))?;
//!
//! while device.poll()? != knx_ip_node::PollOutcome::Idle {}
//! # Ok::<(), knx_ip_node::KnxError>(())
//! ```

extern crate alloc;

// Macro modules (must be declared before use)
#[macro_use]
pub mod macros;
#[macro_use]
pub mod logging;

pub mod addressing;
pub mod callbacks;
pub mod config;
pub mod device;
pub mod dpt;
pub mod error;
pub mod net;
pub mod persistence;
pub mod protocol;
pub mod settings;

// Re-export commonly used types
#[doc(inline)]
pub use addressing::{GroupAddress, IndividualAddress};
#[doc(inline)]
pub use callbacks::{BindingId, CallbackId, CallbackRegistry, DeliveryMode};
#[doc(inline)]
pub use config::{ConfigArena, ConfigId, OptionEntry};
#[doc(inline)]
pub use device::{Diagnostics, KnxDevice, PollOutcome};
#[doc(inline)]
pub use dpt::{Dpt9, DptDecode, DptEncode, KnxValue};
#[doc(inline)]
pub use error::{KnxError, Result};
#[doc(inline)]
pub use protocol::{CommandType, Telegram, TelegramBuilder};
