//! # Client Components
//!
//! ## Service Client ([`client`])
//! Owns the credentials and the connection, and maps each remote operation of
//! the ordering service to one async method.

pub mod client;

// Re-export for convenience
pub use client::{Message, OrderMessage, ProductLine, ProductScoped, ServiceClient};
