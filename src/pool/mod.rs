//! Client handle pooling
//!
//! Each tracked endpoint gets one reusable client handle, built lazily by a
//! [`ClientFactory`] and kept for the life of the provider.

pub mod cache;

pub use cache::{ClientCache, ClientFactory};
