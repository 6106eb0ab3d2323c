//! Callback registry and group-address dispatch table.
//!
//! Callbacks are registered once at startup and never removed. Bindings map
//! a group address to a callback; they are kept dense and in insertion
//! order, and removing one shifts the later bindings down.
//!
//! ```rust
//! use knx_ip_node::callbacks::{CallbackRegistry, DeliveryMode};
//! use knx_ip_node::ga;
//!
//! let mut registry = CallbackRegistry::new(DeliveryMode::Single);
//! let light = registry
//!     .register_callback("light", |telegram| {
//!         let _ = telegram.as_bool();
//!     }, None)
//!     .unwrap();
//! registry.bind(light, ga!(1/0/1)).unwrap();
//! assert_eq!(registry.bindings().len(), 1);
//! ```

use alloc::boxed::Box;
use alloc::string::String;
use core::fmt;
use heapless::Vec;

use crate::addressing::GroupAddress;
use crate::error::{KnxError, Result};
use crate::protocol::telegram::Telegram;

/// Maximum number of registered callbacks
pub const MAX_CALLBACKS: usize = 10;

/// Maximum number of address bindings
pub const MAX_BINDINGS: usize = 10;

/// Telegram handler. Owns whatever context it needs.
pub type Handler = Box<dyn FnMut(&Telegram)>;

/// Predicate deciding whether a callback or config entry is currently active.
pub type EnableCondition = Box<dyn Fn() -> bool>;

/// Index of a registered callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CallbackId(u8);

impl CallbackId {
    /// Position in registration order
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl From<u8> for CallbackId {
    fn from(raw: u8) -> Self {
        Self(raw)
    }
}

impl From<CallbackId> for u8 {
    fn from(id: CallbackId) -> u8 {
        id.0
    }
}

/// Index of a binding in the dispatch table. Shifts when earlier bindings are removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BindingId(u8);

impl BindingId {
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl From<u8> for BindingId {
    fn from(raw: u8) -> Self {
        Self(raw)
    }
}

/// One dispatch table row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CallbackBinding {
    pub address: GroupAddress,
    pub callback: CallbackId,
}

/// How many bound callbacks a telegram reaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DeliveryMode {
    /// First matching binding only. A disabled match ends the scan.
    #[default]
    Single,
    /// Every enabled matching binding, in table order.
    Multiple,
}

struct Callback {
    name: String,
    handler: Handler,
    condition: Option<EnableCondition>,
}

impl Callback {
    fn is_enabled(&self) -> bool {
        self.condition.as_ref().is_none_or(|condition| condition())
    }
}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callback")
            .field("name", &self.name)
            .field("conditional", &self.condition.is_some())
            .finish_non_exhaustive()
    }
}

/// Fixed-capacity callback table plus the address bindings that select them.
pub struct CallbackRegistry {
    callbacks: Vec<Callback, MAX_CALLBACKS>,
    bindings: Vec<CallbackBinding, MAX_BINDINGS>,
    mode: DeliveryMode,
}

impl fmt::Debug for CallbackRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackRegistry")
            .field("callbacks", &self.callbacks)
            .field("bindings", &self.bindings)
            .field("mode", &self.mode)
            .finish()
    }
}

impl Default for CallbackRegistry {
    fn default() -> Self {
        Self::new(DeliveryMode::default())
    }
}

impl CallbackRegistry {
    /// Empty registry
    pub const fn new(mode: DeliveryMode) -> Self {
        Self {
            callbacks: Vec::new(),
            bindings: Vec::new(),
            mode,
        }
    }

    pub const fn mode(&self) -> DeliveryMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: DeliveryMode) {
        self.mode = mode;
    }

    /// Register a handler under `name`.
    ///
    /// # Errors
    ///
    /// Returns a registry error once [`MAX_CALLBACKS`] callbacks exist.
    pub fn register_callback<H>(
        &mut self,
        name: &str,
        handler: H,
        condition: Option<EnableCondition>,
    ) -> Result<CallbackId>
    where
        H: FnMut(&Telegram) + 'static,
    {
        let id = CallbackId(self.callbacks.len() as u8);
        self.callbacks
            .push(Callback {
                name: String::from(name),
                handler: Box::new(handler),
                condition,
            })
            .map_err(|_full| {
                knx_log!(warn, "callback table full, dropping {}", name);
                KnxError::too_many_callbacks()
            })?;

        knx_log!(debug, "registered callback {} as {}", name, id.0);
        Ok(id)
    }

    /// Bind `callback` to `address`. Duplicate pairs are allowed.
    ///
    /// # Errors
    ///
    /// Returns a registry error for an unregistered callback or once
    /// [`MAX_BINDINGS`] bindings exist.
    pub fn bind(&mut self, callback: CallbackId, address: GroupAddress) -> Result<BindingId> {
        if callback.index() >= self.callbacks.len() {
            return Err(KnxError::unknown_callback());
        }

        let id = BindingId(self.bindings.len() as u8);
        self.bindings
            .push(CallbackBinding { address, callback })
            .map_err(|_full| KnxError::too_many_bindings())?;
        Ok(id)
    }

    /// Remove a binding; later bindings move down one slot.
    ///
    /// # Errors
    ///
    /// Returns a registry error if `binding` is out of range.
    pub fn unbind(&mut self, binding: BindingId) -> Result<()> {
        if binding.index() >= self.bindings.len() {
            return Err(KnxError::unknown_binding());
        }
        self.bindings.remove(binding.index());
        Ok(())
    }

    /// Dispatch table in scan order
    pub fn bindings(&self) -> &[CallbackBinding] {
        &self.bindings
    }

    /// Replace the whole dispatch table (persistence restore).
    pub(crate) fn replace_bindings(&mut self, bindings: Vec<CallbackBinding, MAX_BINDINGS>) {
        self.bindings = bindings;
    }

    /// Number of registered callbacks
    pub fn callback_count(&self) -> usize {
        self.callbacks.len()
    }

    pub fn callback_name(&self, id: CallbackId) -> Option<&str> {
        self.callbacks.get(id.index()).map(|cb| cb.name.as_str())
    }

    /// Registered callbacks with their names, in registration order.
    pub fn callbacks(&self) -> impl Iterator<Item = (CallbackId, &str)> + '_ {
        self.callbacks
            .iter()
            .enumerate()
            .map(|(i, cb)| (CallbackId(i as u8), cb.name.as_str()))
    }

    /// Evaluate the callback's condition; unknown ids are never enabled.
    pub fn is_callback_enabled(&self, id: CallbackId) -> bool {
        self.callbacks.get(id.index()).is_some_and(Callback::is_enabled)
    }

    /// Invoke the callbacks bound to the telegram's destination.
    ///
    /// Returns how many handlers ran.
    pub fn dispatch(&mut self, telegram: &Telegram) -> usize {
        let mut invoked = 0;

        for binding in self.bindings.iter().filter(|b| b.address == telegram.destination) {
            let Some(callback) = self.callbacks.get_mut(binding.callback.index()) else {
                continue;
            };

            if !callback.is_enabled() {
                match self.mode {
                    DeliveryMode::Single => break,
                    DeliveryMode::Multiple => continue,
                }
            }

            (callback.handler)(telegram);
            invoked += 1;

            if self.mode == DeliveryMode::Single {
                break;
            }
        }

        invoked
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::addressing::IndividualAddress;
    use crate::ga;
    use crate::protocol::cemi::{CommandType, ControlField1};
    use core::cell::{Cell, RefCell};
    use std::rc::Rc;

    fn telegram(destination: GroupAddress) -> Telegram {
        Telegram {
            source: IndividualAddress::pack(1, 1, 1),
            destination,
            command: CommandType::Write,
            payload: Vec::from_slice(&[0x01]).unwrap(),
            ctrl1: ControlField1::default(),
            hop_count: 6,
            extended_format: 0,
            additional_info_len: 0,
        }
    }

    fn recording(log: &Rc<RefCell<std::vec::Vec<&'static str>>>, tag: &'static str) -> impl FnMut(&Telegram) {
        let log = Rc::clone(log);
        move |_| log.borrow_mut().push(tag)
    }

    fn registry_with_ab(mode: DeliveryMode) -> (CallbackRegistry, Rc<RefCell<std::vec::Vec<&'static str>>>) {
        let log = Rc::new(RefCell::new(std::vec::Vec::new()));
        let mut registry = CallbackRegistry::new(mode);
        let a = registry.register_callback("A", recording(&log, "A"), None).unwrap();
        let b = registry.register_callback("B", recording(&log, "B"), None).unwrap();
        registry.bind(a, ga!(10 / 6 / 5)).unwrap();
        registry.bind(b, ga!(10 / 6 / 5)).unwrap();
        (registry, log)
    }

    #[test]
    fn test_single_delivery_first_match() {
        let (mut registry, log) = registry_with_ab(DeliveryMode::Single);
        assert_eq!(registry.dispatch(&telegram(ga!(10 / 6 / 5))), 1);
        assert_eq!(*log.borrow(), ["A"]);
    }

    #[test]
    fn test_multiple_delivery_in_order() {
        let (mut registry, log) = registry_with_ab(DeliveryMode::Multiple);
        assert_eq!(registry.dispatch(&telegram(ga!(10 / 6 / 5))), 2);
        assert_eq!(*log.borrow(), ["A", "B"]);
    }

    #[test]
    fn test_unmatched_address() {
        let (mut registry, log) = registry_with_ab(DeliveryMode::Multiple);
        assert_eq!(registry.dispatch(&telegram(ga!(10 / 6 / 6))), 0);
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_disabled_callback() {
        let enabled = Rc::new(Cell::new(false));
        let log = Rc::new(RefCell::new(std::vec::Vec::new()));

        for (mode, expected) in [(DeliveryMode::Single, 0), (DeliveryMode::Multiple, 1)] {
            log.borrow_mut().clear();
            let mut registry = CallbackRegistry::new(mode);
            let flag = Rc::clone(&enabled);
            let a = registry
                .register_callback("A", recording(&log, "A"), Some(Box::new(move || flag.get())))
                .unwrap();
            let b = registry.register_callback("B", recording(&log, "B"), None).unwrap();
            registry.bind(a, ga!(1 / 1 / 1)).unwrap();
            registry.bind(b, ga!(1 / 1 / 1)).unwrap();

            assert!(!registry.is_callback_enabled(a));
            assert_eq!(registry.dispatch(&telegram(ga!(1 / 1 / 1))), expected);
            assert_eq!(log.borrow().len(), expected);
        }
    }

    #[test]
    fn test_callback_capacity() {
        let mut registry = CallbackRegistry::default();
        for _ in 0..MAX_CALLBACKS {
            registry.register_callback("cb", |_| {}, None).unwrap();
        }
        let err = registry.register_callback("overflow", |_| {}, None).unwrap_err();
        assert!(matches!(err, KnxError::Registry(e) if e.is_too_many_callbacks()));
        assert_eq!(registry.callback_count(), MAX_CALLBACKS);
    }

    #[test]
    fn test_binding_capacity_leaves_table_unchanged() {
        let mut registry = CallbackRegistry::default();
        let cb = registry.register_callback("cb", |_| {}, None).unwrap();
        for member in 0..MAX_BINDINGS as u8 {
            registry.bind(cb, GroupAddress::pack(1, 0, member)).unwrap();
        }
        let before: std::vec::Vec<_> = registry.bindings().to_vec();

        let err = registry.bind(cb, ga!(2 / 0 / 0)).unwrap_err();
        assert!(matches!(err, KnxError::Registry(e) if e.is_too_many_bindings()));
        assert_eq!(registry.bindings(), before.as_slice());
    }

    #[test]
    fn test_bind_unknown_callback() {
        let mut registry = CallbackRegistry::default();
        let err = registry.bind(CallbackId::from(0), ga!(1 / 0 / 0)).unwrap_err();
        assert!(matches!(err, KnxError::Registry(e) if e.is_unknown_callback()));
        assert!(registry.bindings().is_empty());
    }

    #[test]
    fn test_unbind_compacts() {
        let mut registry = CallbackRegistry::default();
        let cb = registry.register_callback("cb", |_| {}, None).unwrap();
        for member in 1..=3 {
            registry.bind(cb, GroupAddress::pack(0, 0, member)).unwrap();
        }

        registry.unbind(BindingId::from(0)).unwrap();
        let members: std::vec::Vec<u8> = registry.bindings().iter().map(|b| b.address.member()).collect();
        assert_eq!(members, [2, 3]);

        let err = registry.unbind(BindingId::from(2)).unwrap_err();
        assert!(matches!(err, KnxError::Registry(e) if e.is_unknown_binding()));
        assert_eq!(registry.bindings().len(), 2);
    }

    #[test]
    fn test_introspection() {
        let mut registry = CallbackRegistry::default();
        registry.register_callback("light", |_| {}, None).unwrap();
        registry.register_callback("blind", |_| {}, Some(Box::new(|| false))).unwrap();

        let names: std::vec::Vec<&str> = registry.callbacks().map(|(_, name)| name).collect();
        assert_eq!(names, ["light", "blind"]);
        assert_eq!(registry.callback_name(CallbackId::from(1)), Some("blind"));
        assert_eq!(registry.callback_name(CallbackId::from(5)), None);
        assert!(registry.is_callback_enabled(CallbackId::from(0)));
        assert!(!registry.is_callback_enabled(CallbackId::from(1)));
    }
}
