//! Device settings in `KEY=VALUE` form.
//!
//! Edit [`DEFAULT_SETTINGS`] (or pass your own text to
//! [`DeviceSettings::parse`]) to fit the installation:
//!
//! ```rust
//! use knx_ip_node::settings::DeviceSettings;
//! use knx_ip_node::DeliveryMode;
//!
//! let settings = DeviceSettings::parse("KNX_PHYSICAL_ADDRESS=1.1.42\nKNX_DELIVERY=multiple\n")?;
//! assert_eq!(settings.physical_address.member(), 42);
//! assert_eq!(settings.delivery, DeliveryMode::Multiple);
//! # Ok::<(), knx_ip_node::KnxError>(())
//! ```

use core::net::{Ipv4Addr, SocketAddrV4};

use crate::addressing::IndividualAddress;
use crate::callbacks::DeliveryMode;
use crate::error::{KnxError, Result};
use crate::protocol::constants::{KNXNETIP_DEFAULT_PORT, KNXNETIP_MULTICAST_ADDR};

pub const DEFAULT_SETTINGS: &str = r#"
KNX_PHYSICAL_ADDRESS=1.1.0
KNX_MULTICAST_ADDR=224.0.23.12
KNX_PORT=3671
KNX_DELIVERY=single
"#;

/// Physical address a node uses until one is configured.
pub const DEFAULT_PHYSICAL_ADDRESS: IndividualAddress = IndividualAddress::pack(1, 1, 0);

const KEY_PHYSICAL_ADDRESS: &str = "KNX_PHYSICAL_ADDRESS";
const KEY_MULTICAST_ADDR: &str = "KNX_MULTICAST_ADDR";
const KEY_PORT: &str = "KNX_PORT";
const KEY_DELIVERY: &str = "KNX_DELIVERY";

/// Parsed node settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceSettings {
    pub physical_address: IndividualAddress,
    pub multicast_addr: Ipv4Addr,
    pub port: u16,
    pub delivery: DeliveryMode,
}

impl Default for DeviceSettings {
    fn default() -> Self {
        Self {
            physical_address: DEFAULT_PHYSICAL_ADDRESS,
            multicast_addr: KNXNETIP_MULTICAST_ADDR,
            port: KNXNETIP_DEFAULT_PORT,
            delivery: DeliveryMode::Single,
        }
    }
}

impl DeviceSettings {
    /// Multicast group and port the node sends to and listens on.
    pub const fn routing_endpoint(&self) -> SocketAddrV4 {
        SocketAddrV4::new(self.multicast_addr, self.port)
    }

    /// Parse a settings block.
    ///
    /// Blank lines and `#` comments are skipped, unknown keys are ignored and
    /// missing keys keep their defaults.
    ///
    /// # Errors
    ///
    /// - addressing error for a malformed `KNX_PHYSICAL_ADDRESS`
    /// - config error for a non-multicast address, port 0, an unknown
    ///   delivery mode or a line without `=`
    pub fn parse(text: &str) -> Result<Self> {
        let mut settings = Self::default();

        for line in text.lines().map(str::trim) {
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let (key, value) = line.split_once('=').ok_or_else(KnxError::invalid_value)?;
            let value = value.trim();

            match key.trim() {
                KEY_PHYSICAL_ADDRESS => settings.physical_address = value.parse()?,
                KEY_MULTICAST_ADDR => settings.multicast_addr = parse_multicast(value)?,
                KEY_PORT => settings.port = parse_port(value)?,
                KEY_DELIVERY => settings.delivery = parse_delivery(value)?,
                other => knx_log!(debug, "ignoring setting {}", other),
            }
        }

        Ok(settings)
    }
}

fn parse_multicast(value: &str) -> Result<Ipv4Addr> {
    value
        .parse::<Ipv4Addr>()
        .ok()
        .filter(Ipv4Addr::is_multicast)
        .ok_or_else(KnxError::invalid_value)
}

fn parse_port(value: &str) -> Result<u16> {
    value
        .parse::<u16>()
        .ok()
        .filter(|&port| port != 0)
        .ok_or_else(KnxError::invalid_value)
}

fn parse_delivery(value: &str) -> Result<DeliveryMode> {
    if value.eq_ignore_ascii_case("single") {
        Ok(DeliveryMode::Single)
    } else if value.eq_ignore_ascii_case("multiple") {
        Ok(DeliveryMode::Multiple)
    } else {
        Err(KnxError::invalid_value())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_text_matches_default() {
        assert_eq!(DeviceSettings::parse(DEFAULT_SETTINGS).unwrap(), DeviceSettings::default());
    }

    #[test]
    fn test_missing_keys_keep_defaults() {
        let settings = DeviceSettings::parse("# only the port\nKNX_PORT=3700\nWIFI_NETWORK=home\n").unwrap();
        assert_eq!(settings.port, 3700);
        assert_eq!(settings.physical_address, DEFAULT_PHYSICAL_ADDRESS);
        assert_eq!(settings.multicast_addr, Ipv4Addr::new(224, 0, 23, 12));
        assert_eq!(settings.delivery, DeliveryMode::Single);
    }

    #[test]
    fn test_all_keys() {
        let text = "KNX_PHYSICAL_ADDRESS = 2.3.4\nKNX_MULTICAST_ADDR=239.1.2.3\nKNX_PORT=4000\nKNX_DELIVERY=Multiple";
        let settings = DeviceSettings::parse(text).unwrap();
        assert_eq!(settings.physical_address, IndividualAddress::pack(2, 3, 4));
        assert_eq!(settings.multicast_addr, Ipv4Addr::new(239, 1, 2, 3));
        assert_eq!(settings.port, 4000);
        assert_eq!(settings.delivery, DeliveryMode::Multiple);
    }

    #[test]
    fn test_routing_endpoint() {
        assert_eq!(
            DeviceSettings::default().routing_endpoint(),
            SocketAddrV4::new(Ipv4Addr::new(224, 0, 23, 12), 3671)
        );

        let settings = DeviceSettings::parse("KNX_MULTICAST_ADDR=239.1.2.3
KNX_PORT=4000").unwrap();
        let endpoint = settings.routing_endpoint();
        assert_eq!(*endpoint.ip(), Ipv4Addr::new(239, 1, 2, 3));
        assert_eq!(endpoint.port(), 4000);
    }

    #[test]
    fn test_malformed_values() {
        let err = DeviceSettings::parse("KNX_PHYSICAL_ADDRESS=1.1").unwrap_err();
        assert!(matches!(err, KnxError::Addressing(_)));

        for text in [
            "KNX_MULTICAST_ADDR=192.168.1.10",
            "KNX_MULTICAST_ADDR=nope",
            "KNX_PORT=0",
            "KNX_PORT=70000",
            "KNX_DELIVERY=broadcast",
            "KNX_PORT",
        ] {
            let err = DeviceSettings::parse(text).unwrap_err();
            assert!(matches!(err, KnxError::Config(e) if e.is_invalid_value()), "{text}");
        }
    }
}
