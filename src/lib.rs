pub mod client;
pub mod common;
pub mod error;
pub mod processing;

pub use client::ServiceClient;
pub use common::config::{Credentials, ServiceConfig};
pub use common::messages::{OrderState, RestaurantState};
pub use error::{Result, ServiceError};
