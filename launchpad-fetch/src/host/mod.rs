//! Host APIs for Launchpad.
//!
//! - [`keychain`] - Secure credential storage (system keychain)

pub mod keychain;

pub use keychain::{KeychainApi, MemoryKeychain, SystemKeychain};
