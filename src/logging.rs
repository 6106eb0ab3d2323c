//! Unified logging macro for the KNX/IP node.
//!
//! `knx_log!` selects the logging backend from the active feature flags:
//!
//! - `log` - forwards to the `log` facade (std hosts, USB serial loggers)
//! - `defmt` - forwards to `defmt` (default choice on embedded targets)
//! - neither - expands to nothing; arguments are still type-checked
//!
//! Only plain `{}` placeholders are used so the same call site formats under
//! both backends.
//!
//! ```rust
//! use knx_ip_node::knx_log;
//!
//! let len = 17;
//! knx_log!(debug, "Received {} bytes", len);
//! knx_log!(warn, "Restore aborted");
//! ```

/// Unified logging macro - selects `log::` or `defmt::` based on features
#[macro_export]
#[cfg(feature = "log")]
macro_rules! knx_log {
    (info, $($arg:tt)*) => { log::info!($($arg)*) };
    (debug, $($arg:tt)*) => { log::debug!($($arg)*) };
    (warn, $($arg:tt)*) => { log::warn!($($arg)*) };
    (error, $($arg:tt)*) => { log::error!($($arg)*) };
    (trace, $($arg:tt)*) => { log::trace!($($arg)*) };
}

#[macro_export]
#[cfg(all(feature = "defmt", not(feature = "log")))]
macro_rules! knx_log {
    (info, $($arg:tt)*) => { defmt::info!($($arg)*) };
    (debug, $($arg:tt)*) => { defmt::debug!($($arg)*) };
    (warn, $($arg:tt)*) => { defmt::warn!($($arg)*) };
    (error, $($arg:tt)*) => { defmt::error!($($arg)*) };
    (trace, $($arg:tt)*) => { defmt::trace!($($arg)*) };
}

#[macro_export]
#[cfg(not(any(feature = "log", feature = "defmt")))]
macro_rules! knx_log {
    ($level:ident, $($arg:tt)*) => {{
        if false {
            let _ = core::format_args!($($arg)*);
        }
    }};
}
