//! # Service Vocabulary
//!
//! Defines the remote operations exposed by the ordering service, the request
//! payloads sent with them, and the state tokens the service understands:
//! - Remote operation names and their result fields
//! - Message-version naming (`V1` legacy calls vs `V2` calls)
//! - Restaurant and order state tokens
//!
//! Requests are rendered into SOAP envelopes by
//! [`connection`](super::connection).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ServiceError;

// ============================================================================
// REMOTE OPERATIONS
// ============================================================================

/// Every remote operation this client consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operation {
    GetMenu,
    GetAllMessages,
    GetAllMessagesV2,
    UpdateOrder,
    UpdateRestaurantState,
    GetMessage,
    GetMessageV2,
    GetPaymentTypes,
    GetRestaurantDeliveryAreas,
    GetRestaurantList,
    GetRestaurantStatus,
    IsRestaurantOpen,
    MessageSuccessful,
}

impl Operation {
    /// Operation name as it appears in the SOAP body and action.
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::GetMenu => "GetMenu",
            Operation::GetAllMessages => "GetAllMessages",
            Operation::GetAllMessagesV2 => "GetAllMessagesV2",
            Operation::UpdateOrder => "UpdateOrder",
            Operation::UpdateRestaurantState => "UpdateRestaurantState",
            Operation::GetMessage => "GetMessage",
            Operation::GetMessageV2 => "GetMessageV2",
            Operation::GetPaymentTypes => "GetPaymentTypes",
            Operation::GetRestaurantDeliveryAreas => "GetRestaurantDeliveryAreas",
            Operation::GetRestaurantList => "GetRestaurantList",
            Operation::GetRestaurantStatus => "GetRestaurantStatus",
            Operation::IsRestaurantOpen => "IsRestaurantOpen",
            Operation::MessageSuccessful => "MessageSuccessful",
        }
    }

    /// Default result field name, `<Operation>Result`.
    pub fn result_field(&self) -> String {
        format!("{}Result", self.as_str())
    }

    /// Name of the response element wrapping the result fields.
    pub fn response_element(&self) -> String {
        format!("{}Response", self.as_str())
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One outgoing remote call: operation plus ordered request parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteCall {
    pub operation: Operation,
    pub params: Vec<(String, String)>,
}

impl RemoteCall {
    /// A call without parameters.
    pub fn new(operation: Operation) -> Self {
        Self {
            operation,
            params: Vec::new(),
        }
    }

    /// Appends a request parameter.
    pub fn param(mut self, name: &str, value: impl Into<String>) -> Self {
        self.params.push((name.to_string(), value.into()));
        self
    }

    /// Value of a request parameter, if set.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

// ============================================================================
// MESSAGE VERSIONING
// ============================================================================

/// Operation and result field selected by a message version tag.
///
/// `"V1"` (any case) selects the legacy operation and its fixed result field.
/// Any other tag selects the `V2` operation and reads the result field
/// `<Base><TAG>Result`, so `"v3"` asks `GetAllMessagesV2` for
/// `GetAllMessagesV3Result`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionedCall {
    pub operation: Operation,
    pub result_field: String,
}

impl VersionedCall {
    /// Resolves the `GetAllMessages` family.
    pub fn all_messages(version: &str) -> Self {
        Self::resolve(
            "GetAllMessages",
            Operation::GetAllMessages,
            Operation::GetAllMessagesV2,
            version,
        )
    }

    /// Resolves the `GetMessage` family.
    pub fn message(version: &str) -> Self {
        Self::resolve(
            "GetMessage",
            Operation::GetMessage,
            Operation::GetMessageV2,
            version,
        )
    }

    fn resolve(base: &str, legacy: Operation, current: Operation, version: &str) -> Self {
        let tag = version.to_uppercase();
        if tag == "V1" {
            Self {
                operation: legacy,
                result_field: legacy.result_field(),
            }
        } else {
            Self {
                operation: current,
                result_field: format!("{}{}Result", base, tag),
            }
        }
    }
}

// ============================================================================
// STATE TOKENS
// ============================================================================

/// Restaurant availability states accepted by `UpdateRestaurantState`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RestaurantState {
    Open,
    Closed,
    HugeDemand,
}

impl RestaurantState {
    pub const ALL: [RestaurantState; 3] = [
        RestaurantState::Open,
        RestaurantState::Closed,
        RestaurantState::HugeDemand,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RestaurantState::Open => "Open",
            RestaurantState::Closed => "Closed",
            RestaurantState::HugeDemand => "HugeDemand",
        }
    }
}

/// Order lifecycle states accepted by `UpdateOrder`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderState {
    Accepted,
    Rejected,
    Cancelled,
    OnDelivery,
    Delivered,
    TechnicalRejected,
}

impl OrderState {
    pub const ALL: [OrderState; 6] = [
        OrderState::Accepted,
        OrderState::Rejected,
        OrderState::Cancelled,
        OrderState::OnDelivery,
        OrderState::Delivered,
        OrderState::TechnicalRejected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderState::Accepted => "Accepted",
            OrderState::Rejected => "Rejected",
            OrderState::Cancelled => "Cancelled",
            OrderState::OnDelivery => "OnDelivery",
            OrderState::Delivered => "Delivered",
            OrderState::TechnicalRejected => "TechnicalRejected",
        }
    }
}

impl fmt::Display for RestaurantState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for OrderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RestaurantState {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|state| state.as_str() == s)
            .ok_or_else(|| ServiceError::InvalidToken(format!("unknown restaurant state '{}'", s)))
    }
}

impl FromStr for OrderState {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|state| state.as_str() == s)
            .ok_or_else(|| ServiceError::InvalidToken(format!("unknown order state '{}'", s)))
    }
}
