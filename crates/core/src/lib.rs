//! Core file gateway logic for Docvault.
//!
//! This crate contains the namespacing protocol with ZERO web dependencies.
//!
//! # Modules
//!
//! - `keys` - Storage key derivation and input validation
//! - `storage` - Object store interface and the OpenDAL implementation
//! - `files` - Upload, search, download and delete operations

pub mod files;
pub mod keys;
pub mod storage;
