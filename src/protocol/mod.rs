//! KNXnet/IP routing protocol: frame header, cEMI fields and group telegrams.

pub mod cemi;
pub mod constants;
pub mod frame;
pub mod telegram;

pub use cemi::{CommandType, ControlField1, ControlField2};
pub use telegram::{Telegram, TelegramBuilder};
