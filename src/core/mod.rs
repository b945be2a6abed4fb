//! The core module holds the error type, settings and the driver interface everything else is built on.

pub mod device;
pub mod error;
pub mod settings;
