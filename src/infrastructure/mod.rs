//! Adapters implementing the domain ports.

pub mod automation;
pub mod in_memory;
pub mod notifier;
pub mod paystack;
#[cfg(feature = "storage-rocksdb")]
pub mod rocksdb;
pub mod unconfigured;
