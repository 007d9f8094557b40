//! Instance identity
//!
//! An instance is one MySQL endpoint addressed by hostname and port.

mod key;

pub use key::InstanceKey;
