//! Repository implementations module.
//!
//! This module contains the implementations of the `DelayRepository` trait:
//! - `local`: In-memory implementation for unit testing and local development
//! - `file`: Read-only implementation over CSV/JSON exports
#[cfg(feature = "file-repo")]
pub mod file;
#[cfg(feature = "local-repo")]
pub mod local;

#[cfg(feature = "file-repo")]
pub use file::FileRepository;
#[cfg(feature = "local-repo")]
pub use local::LocalRepository;
