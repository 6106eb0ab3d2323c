//! Persistent storage of bindings, physical address and configuration.
//!
//! The record lives in one namespace as five blobs:
//!
//! | Key | Size | Content |
//! |---|---|---|
//! | `magic` | 8 | [`LAYOUT_MAGIC`], big-endian |
//! | `reg_cb_assign` | 1 | number of bindings |
//! | `cb_assign` | 30 | 10 x (address high, address low, callback id) |
//! | `physaddr` | 2 | physical address, high byte first |
//! | `config` | 512 | live configuration arena |
//!
//! Restoring reads and checks every blob before anything is applied.

use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec::Vec as AllocVec;
use heapless::Vec;

use crate::addressing::{GroupAddress, IndividualAddress};
use crate::callbacks::{CallbackBinding, CallbackId, CallbackRegistry, MAX_BINDINGS};
use crate::config::{ConfigArena, CONFIG_SPACE, MAX_CONFIG_ENTRIES};
use crate::error::{KnxError, Result};

/// Storage namespace of the record
pub const NAMESPACE: &str = "KNX";

pub const KEY_MAGIC: &str = "magic";
pub const KEY_BINDING_COUNT: &str = "reg_cb_assign";
pub const KEY_BINDINGS: &str = "cb_assign";
pub const KEY_PHYSICAL_ADDRESS: &str = "physaddr";
pub const KEY_CONFIG: &str = "config";

/// Record magic. The low half encodes the table sizes, so a firmware with a
/// different layout ignores old records.
pub const LAYOUT_MAGIC: u64 = (0xDEAD_BEEF_u64 << 32)
    | ((MAX_CONFIG_ENTRIES as u64) << 24)
    | ((MAX_BINDINGS as u64) << 16)
    | CONFIG_SPACE as u64;

const BINDING_RECORD_LEN: usize = 3;
const BINDINGS_LEN: usize = MAX_BINDINGS * BINDING_RECORD_LEN;

/// Byte-blob key/value backend (flash preferences, NVS, a file, ...).
pub trait Storage {
    /// Copy the blob stored under `key` into `buf`.
    ///
    /// Copies at most `buf.len()` bytes and returns the stored length, which
    /// exceeds `buf.len()` when the blob was cut short. Returns 0 when the
    /// key does not exist.
    ///
    /// # Errors
    ///
    /// Returns a storage error when the backend itself fails.
    fn read(&mut self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize>;

    /// Replace the blob stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns a storage error when the backend itself fails.
    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<()>;
}

impl<S: Storage + ?Sized> Storage for &mut S {
    fn read(&mut self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize> {
        (**self).read(namespace, key, buf)
    }

    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<()> {
        (**self).write(namespace, key, data)
    }
}

/// In-memory [`Storage`] for tests and hosts without flash.
#[derive(Debug, Default, Clone)]
pub struct MemoryStorage {
    blobs: BTreeMap<(String, String), AllocVec<u8>>,
    fail_reads: bool,
    fail_writes: bool,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stored blob, if any.
    pub fn get(&self, namespace: &str, key: &str) -> Option<&[u8]> {
        self.blobs
            .get(&(String::from(namespace), String::from(key)))
            .map(AllocVec::as_slice)
    }

    /// Overwrite a blob directly.
    pub fn insert(&mut self, namespace: &str, key: &str, data: &[u8]) {
        self.blobs
            .insert((String::from(namespace), String::from(key)), data.to_vec());
    }

    pub fn remove(&mut self, namespace: &str, key: &str) -> Option<AllocVec<u8>> {
        self.blobs.remove(&(String::from(namespace), String::from(key)))
    }

    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }

    /// Make every subsequent read fail with a storage error.
    pub fn set_fail_reads(&mut self, fail: bool) {
        self.fail_reads = fail;
    }

    /// Make every subsequent write fail with a storage error.
    pub fn set_fail_writes(&mut self, fail: bool) {
        self.fail_writes = fail;
    }
}

impl Storage for MemoryStorage {
    fn read(&mut self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize> {
        if self.fail_reads {
            return Err(KnxError::storage_read_failed());
        }
        let Some(blob) = self.get(namespace, key) else {
            return Ok(0);
        };
        let n = blob.len().min(buf.len());
        buf[..n].copy_from_slice(&blob[..n]);
        Ok(blob.len())
    }

    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<()> {
        if self.fail_writes {
            return Err(KnxError::storage_write_failed());
        }
        self.insert(namespace, key, data);
        Ok(())
    }
}

/// [`Storage`] backed by a directory tree: `root/namespace/key`.
#[cfg(feature = "std")]
#[derive(Debug, Clone)]
pub struct FileStorage {
    root: std::path::PathBuf,
}

#[cfg(feature = "std")]
impl FileStorage {
    pub fn new(root: impl Into<std::path::PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path(&self, namespace: &str, key: &str) -> std::path::PathBuf {
        self.root.join(namespace).join(key)
    }
}

#[cfg(feature = "std")]
impl Storage for FileStorage {
    fn read(&mut self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize> {
        let blob = match std::fs::read(self.path(namespace, key)) {
            Ok(blob) => blob,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(_io_error) => {
                knx_log!(error, "storage read {} failed", key);
                return Err(crate::error::KnxError::storage_read_failed());
            }
        };
        let n = blob.len().min(buf.len());
        buf[..n].copy_from_slice(&blob[..n]);
        Ok(blob.len())
    }

    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<()> {
        let log_write_error = |_io_error: std::io::Error| {
            knx_log!(error, "storage write {} failed", key);
            crate::error::KnxError::storage_write_failed()
        };
        std::fs::create_dir_all(self.root.join(namespace)).map_err(log_write_error)?;
        std::fs::write(self.path(namespace, key), data).map_err(log_write_error)
    }
}

/// Everything a record restores, validated and ready to apply.
#[derive(Debug)]
pub(crate) struct Snapshot {
    pub bindings: Vec<CallbackBinding, MAX_BINDINGS>,
    pub physical_address: IndividualAddress,
    pub config: [u8; CONFIG_SPACE],
}

impl Snapshot {
    pub fn apply(self, registry: &mut CallbackRegistry, arena: &mut ConfigArena, physical: &mut IndividualAddress) {
        registry.replace_bindings(self.bindings);
        arena.load_bytes(&self.config);
        *physical = self.physical_address;
    }
}

/// Write the full record.
pub(crate) fn save<S: Storage>(
    storage: &mut S,
    registry: &CallbackRegistry,
    arena: &ConfigArena,
    physical: IndividualAddress,
) -> Result<()> {
    let bindings = registry.bindings();
    let mut table = [0u8; BINDINGS_LEN];
    for (record, binding) in table.chunks_exact_mut(BINDING_RECORD_LEN).zip(bindings) {
        let [hi, lo] = binding.address.to_bytes();
        record.copy_from_slice(&[hi, lo, u8::from(binding.callback)]);
    }

    storage.write(NAMESPACE, KEY_MAGIC, &LAYOUT_MAGIC.to_be_bytes())?;
    storage.write(NAMESPACE, KEY_BINDING_COUNT, &[bindings.len() as u8])?;
    storage.write(NAMESPACE, KEY_BINDINGS, &table)?;
    storage.write(NAMESPACE, KEY_PHYSICAL_ADDRESS, &physical.to_bytes())?;
    storage.write(NAMESPACE, KEY_CONFIG, arena.as_bytes())?;

    knx_log!(info, "saved {} bindings and {} config bytes", bindings.len(), arena.used_bytes());
    Ok(())
}

/// Read `key` and require exactly `buf.len()` bytes.
fn read_exact<S: Storage>(storage: &mut S, key: &str, buf: &mut [u8]) -> Result<bool> {
    let n = storage.read(NAMESPACE, key, buf)?;
    if n != buf.len() {
        knx_log!(warn, "restore aborted: {} holds {} of {} bytes", key, n, buf.len());
        return Ok(false);
    }
    Ok(true)
}

/// Read and validate the record. `None` means nothing may be applied.
///
/// `callback_count` is the number of callbacks currently registered; a
/// binding that names a callback beyond it invalidates the record.
pub(crate) fn load<S: Storage>(storage: &mut S, callback_count: usize) -> Result<Option<Snapshot>> {
    let mut magic = [0u8; 8];
    if !read_exact(storage, KEY_MAGIC, &mut magic)? || u64::from_be_bytes(magic) != LAYOUT_MAGIC {
        knx_log!(warn, "restore aborted: no valid magic");
        return Ok(None);
    }

    let mut count = [0u8; 1];
    if !read_exact(storage, KEY_BINDING_COUNT, &mut count)? {
        return Ok(None);
    }
    let count = usize::from(count[0]);
    if count > MAX_BINDINGS {
        knx_log!(warn, "restore aborted: {} bindings exceed capacity", count);
        return Ok(None);
    }

    let mut table = [0u8; BINDINGS_LEN];
    if !read_exact(storage, KEY_BINDINGS, &mut table)? {
        return Ok(None);
    }

    let mut bindings = Vec::new();
    for record in table.chunks_exact(BINDING_RECORD_LEN).take(count) {
        let callback = CallbackId::from(record[2]);
        if callback.index() >= callback_count {
            knx_log!(warn, "restore aborted: binding names unknown callback {}", record[2]);
            return Ok(None);
        }
        let binding = CallbackBinding {
            address: GroupAddress::from_bytes([record[0], record[1]]),
            callback,
        };
        if bindings.push(binding).is_err() {
            return Ok(None);
        }
    }

    let mut physical = [0u8; 2];
    if !read_exact(storage, KEY_PHYSICAL_ADDRESS, &mut physical)? {
        return Ok(None);
    }

    let mut config = [0u8; CONFIG_SPACE];
    if !read_exact(storage, KEY_CONFIG, &mut config)? {
        return Ok(None);
    }

    Ok(Some(Snapshot {
        bindings,
        physical_address: IndividualAddress::from_bytes(physical),
        config,
    }))
}
