//! The routing node: one owned value holding transport, dispatch table,
//! configuration arena and physical address.
//!
//! ## Example
//!
//! ```rust
//! use knx_ip_node::net::MockTransport;
//! use knx_ip_node::{ga, KnxDevice, KnxValue, PollOutcome};
//!
//! let mut device = KnxDevice::new(MockTransport::new());
//! let light = device.register_callback("light", |telegram| {
//!     let _on = telegram.as_bool();
//! }, None)?;
//! device.bind(light, ga!(1/2/3))?;
//!
//! device.write(ga!(1/2/4), &KnxValue::Bit(true))?;
//! assert_eq!(device.transport().sent_frames().len(), 1);
//!
//! assert_eq!(device.poll()?, PollOutcome::Idle);
//! # Ok::<(), knx_ip_node::KnxError>(())
//! ```

use crate::addressing::{GroupAddress, IndividualAddress};
use crate::callbacks::{BindingId, CallbackId, CallbackRegistry, EnableCondition};
use crate::config::{ConfigArena, ConfigId, OptionEntry};
use crate::dpt::value::{KnxValue, MAX_VALUE_LEN};
use crate::error::Result;
use crate::net::Transport;
use crate::persistence::{self, Storage};
use crate::protocol::cemi::CommandType;
use crate::protocol::constants::{MAX_FRAME_SIZE, MAX_PAYLOAD_SIZE};
use crate::protocol::telegram::{Telegram, TelegramBuilder, FRAME_OVERHEAD};
use crate::settings::DeviceSettings;

/// Result of one [`KnxDevice::poll`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PollOutcome {
    /// Nothing was waiting
    Idle,
    /// A telegram was accepted; the value is how many handlers ran (may be 0)
    Dispatched(usize),
    /// A datagram arrived but was not a group telegram this node accepts
    Rejected,
}

/// Traffic counters since construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Diagnostics {
    /// Datagrams taken from the transport
    pub received: u32,
    /// Accepted telegrams that reached at least one handler
    pub dispatched: u32,
    /// Datagrams the parser refused
    pub rejected: u32,
    /// Accepted telegrams no enabled binding matched
    pub unmatched: u32,
    /// Frames handed to the transport
    pub sent: u32,
}

/// KNX/IP routing node over a [`Transport`].
#[derive(Debug)]
pub struct KnxDevice<T: Transport> {
    transport: T,
    registry: CallbackRegistry,
    config: ConfigArena,
    physical_address: IndividualAddress,
    diagnostics: Diagnostics,
    rx_buffer: [u8; MAX_FRAME_SIZE],
}

impl<T: Transport> KnxDevice<T> {
    /// Node with physical address 1.1.0 and single delivery.
    pub fn new(transport: T) -> Self {
        Self::with_settings(transport, &DeviceSettings::default())
    }

    /// Node using the physical address and delivery mode from `settings`.
    ///
    /// The multicast group and port are the transport's business; see
    /// `UdpTransport::from_settings`.
    pub fn with_settings(transport: T, settings: &DeviceSettings) -> Self {
        Self {
            transport,
            registry: CallbackRegistry::new(settings.delivery),
            config: ConfigArena::new(),
            physical_address: settings.physical_address,
            diagnostics: Diagnostics::default(),
            rx_buffer: [0; MAX_FRAME_SIZE],
        }
    }

    // =========================================================================
    // Receive path
    // =========================================================================

    /// Take at most one datagram from the transport and dispatch it.
    ///
    /// Malformed or irrelevant datagrams are counted and reported as
    /// [`PollOutcome::Rejected`]; they never surface as errors.
    ///
    /// # Errors
    ///
    /// Only transport failures propagate.
    pub fn poll(&mut self) -> Result<PollOutcome> {
        let Some(len) = self.transport.try_recv(&mut self.rx_buffer)? else {
            return Ok(PollOutcome::Idle);
        };
        self.diagnostics.received = self.diagnostics.received.wrapping_add(1);

        let datagram = self.rx_buffer.get(..len).unwrap_or(&self.rx_buffer);
        let Ok(telegram) = Telegram::parse(datagram) else {
            self.diagnostics.rejected = self.diagnostics.rejected.wrapping_add(1);
            return Ok(PollOutcome::Rejected);
        };

        let invoked = self.registry.dispatch(&telegram);
        if invoked == 0 {
            knx_log!(trace, "no handler for {}", telegram.destination.raw());
            self.diagnostics.unmatched = self.diagnostics.unmatched.wrapping_add(1);
        } else {
            self.diagnostics.dispatched = self.diagnostics.dispatched.wrapping_add(1);
        }
        Ok(PollOutcome::Dispatched(invoked))
    }

    /// Poll until the transport is drained, returning how many datagrams
    /// were processed.
    pub fn poll_all(&mut self) -> Result<usize> {
        let mut processed = 0;
        while self.poll()? != PollOutcome::Idle {
            processed += 1;
        }
        Ok(processed)
    }

    // =========================================================================
    // Send path
    // =========================================================================

    /// Send a group telegram with a raw payload.
    ///
    /// The top two bits of `payload[0]` are replaced by the command type.
    ///
    /// # Errors
    ///
    /// Encoder errors (group address 0, empty or oversized payload) and
    /// transport failures.
    pub fn send(&mut self, destination: GroupAddress, command: CommandType, payload: &[u8]) -> Result<()> {
        let mut frame = [0u8; FRAME_OVERHEAD + MAX_PAYLOAD_SIZE];
        let len = TelegramBuilder::new(self.physical_address, destination)
            .command(command)
            .payload(payload)
            .build_into(&mut frame)?;

        self.transport.send(&frame[..len])?;
        self.diagnostics.sent = self.diagnostics.sent.wrapping_add(1);
        knx_log!(debug, "sent {} bytes to {}", len, destination.raw());
        Ok(())
    }

    /// Encode `value` and send it with `command`.
    pub fn send_value(&mut self, destination: GroupAddress, command: CommandType, value: &KnxValue<'_>) -> Result<()> {
        let mut payload = [0u8; MAX_VALUE_LEN];
        let len = value.encode(&mut payload)?;
        self.send(destination, command, &payload[..len])
    }

    /// Group value write.
    pub fn write(&mut self, destination: GroupAddress, value: &KnxValue<'_>) -> Result<()> {
        self.send_value(destination, CommandType::Write, value)
    }

    /// Group value answer, the reply to a read request.
    pub fn answer(&mut self, destination: GroupAddress, value: &KnxValue<'_>) -> Result<()> {
        self.send_value(destination, CommandType::Answer, value)
    }

    /// Group value read request.
    pub fn read_request(&mut self, destination: GroupAddress) -> Result<()> {
        self.send(destination, CommandType::Read, &[0])
    }

    // =========================================================================
    // Callbacks and bindings
    // =========================================================================

    /// See [`CallbackRegistry::register_callback`].
    pub fn register_callback<H>(
        &mut self,
        name: &str,
        handler: H,
        condition: Option<EnableCondition>,
    ) -> Result<CallbackId>
    where
        H: FnMut(&Telegram) + 'static,
    {
        self.registry.register_callback(name, handler, condition)
    }

    pub fn bind(&mut self, callback: CallbackId, address: GroupAddress) -> Result<BindingId> {
        self.registry.bind(callback, address)
    }

    pub fn unbind(&mut self, binding: BindingId) -> Result<()> {
        self.registry.unbind(binding)
    }

    pub fn registry(&self) -> &CallbackRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut CallbackRegistry {
        &mut self.registry
    }

    // =========================================================================
    // Configuration
    // =========================================================================

    pub fn register_string(
        &mut self,
        name: &str,
        max_len: usize,
        default: &str,
        condition: Option<EnableCondition>,
    ) -> Result<ConfigId> {
        self.config.register_string(name, max_len, default, condition)
    }

    pub fn register_int(&mut self, name: &str, default: i32, condition: Option<EnableCondition>) -> Result<ConfigId> {
        self.config.register_int(name, default, condition)
    }

    pub fn register_bool(&mut self, name: &str, default: bool, condition: Option<EnableCondition>) -> Result<ConfigId> {
        self.config.register_bool(name, default, condition)
    }

    pub fn register_options(
        &mut self,
        name: &str,
        options: &'static [OptionEntry],
        default: u8,
        condition: Option<EnableCondition>,
    ) -> Result<ConfigId> {
        self.config.register_options(name, options, default, condition)
    }

    pub fn register_group_address(&mut self, name: &str, condition: Option<EnableCondition>) -> Result<ConfigId> {
        self.config.register_group_address(name, condition)
    }

    /// Typed getters and introspection.
    pub fn config(&self) -> &ConfigArena {
        &self.config
    }

    /// Typed setters.
    pub fn config_mut(&mut self) -> &mut ConfigArena {
        &mut self.config
    }

    // =========================================================================
    // Identity, persistence, diagnostics
    // =========================================================================

    pub const fn physical_address(&self) -> IndividualAddress {
        self.physical_address
    }

    pub fn set_physical_address(&mut self, address: IndividualAddress) {
        self.physical_address = address;
    }

    /// Write bindings, physical address and the live arena to `storage`.
    pub fn save<S: Storage>(&self, storage: &mut S) -> Result<()> {
        persistence::save(storage, &self.registry, &self.config, self.physical_address)
    }

    /// Replace bindings, physical address and arena from `storage`.
    ///
    /// Returns `Ok(false)`, with nothing changed, when the record is missing,
    /// was written by a different layout, or fails validation.
    pub fn restore<S: Storage>(&mut self, storage: &mut S) -> Result<bool> {
        let Some(snapshot) = persistence::load(storage, self.registry.callback_count())? else {
            return Ok(false);
        };
        snapshot.apply(&mut self.registry, &mut self.config, &mut self.physical_address);
        knx_log!(info, "restored {} bindings", self.registry.bindings().len());
        Ok(true)
    }

    /// Startup sequence: remember the registered defaults, then restore.
    ///
    /// Call after every callback and config entry is registered.
    pub fn load<S: Storage>(&mut self, storage: &mut S) -> Result<bool> {
        self.config.snapshot_defaults();
        self.restore(storage)
    }

    pub const fn diagnostics(&self) -> Diagnostics {
        self.diagnostics
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Give the transport back.
    pub fn into_transport(self) -> T {
        self.transport
    }
}

impl KnxDevice<crate::net::MockTransport> {
    /// Node over a fresh [`MockTransport`](crate::net::MockTransport).
    pub fn mock() -> Self {
        Self::new(crate::net::MockTransport::new())
    }
}

impl Default for KnxDevice<crate::net::MockTransport> {
    fn default() -> Self {
        Self::mock()
    }
}
