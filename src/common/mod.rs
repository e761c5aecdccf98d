//! # Common Components
//!
//! Shared vocabulary, configuration and transport used by the client.
//!
//! ## Modules
//!
//! - [`messages`]: Remote operation names, request payloads and state tokens
//! - [`connection`]: SOAP transport trait, HTTP implementation and envelope codec
//! - [`config`]: Credentials, endpoint settings and TOML loading

pub mod messages;
pub mod connection;
pub mod config;
