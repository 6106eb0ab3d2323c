//! Typed binary configuration arena.
//!
//! ```rust
//! use knx_ip_node::config::ConfigArena;
//!
//! let mut arena = ConfigArena::new();
//! let hostname = arena.register_string("hostname", 20, "knx-node", None).unwrap();
//! arena.set_string(hostname, "hallway").unwrap();
//! assert_eq!(arena.get_string(hostname), "hallway");
//! assert!(arena.is_set(hostname));
//! ```

pub mod arena;
pub mod entry;

pub use arena::{ConfigArena, CONFIG_SPACE, MAX_CONFIG_ENTRIES};
pub use entry::{ConfigEntry, ConfigFlags, ConfigId, ConfigKind, OptionEntry};
