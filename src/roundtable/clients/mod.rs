//! Provider specific [`ClientWrapper`](crate::client_wrapper::ClientWrapper) implementations.
//!
//! Only OpenAI-compatible endpoints ship with the crate; any other service can
//! be plugged in by implementing the trait.

pub mod common;

pub mod openai;
