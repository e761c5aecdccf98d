//! # Service Client
//!
//! [`ServiceClient`] is the single entry point to the ordering service. It owns
//! the credentials and one long-lived [`SoapTransport`], exposes one method per
//! remote operation, and normalizes XML results into [`Node`] trees or typed
//! records.
//!
//! ## Connection lifecycle
//!
//! [`ServiceClient::connect`] never fails. If the service cannot be reached the
//! failure is logged and the client is returned without a connection; every
//! remote operation then returns [`ServiceError::NotConnected`].
//!
//! ## Usage
//!
//! ```rust,ignore
//! use yemeksepeti::client::ServiceClient;
//! use yemeksepeti::common::config::ServiceConfig;
//! use yemeksepeti::common::messages::OrderState;
//!
//! let config = ServiceConfig::from_file("restaurant.toml")?;
//! let client = ServiceClient::connect(config).await;
//!
//! for message in client.get_all_messages("V2").await? {
//!     let id = &message.order["Id"];
//!     client.update_order(id, OrderState::Accepted, None).await?;
//!     client.set_message_successful(id).await?;
//! }
//! ```

use log::{debug, error, info, warn};
use serde::Serialize;

use crate::common::config::{Credentials, ServiceConfig};
use crate::common::connection::{HttpSoapTransport, SoapResponse, SoapTransport};
use crate::common::messages::{
    Operation, OrderState, RemoteCall, RestaurantState, VersionedCall,
};
use crate::error::{Result, ServiceError};
use crate::processing::{normalize, AttributeBag, Node};

/// Result string the service returns for a successful update.
const SUCCESS: &str = "OK";

/// One order from `GetAllMessages`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderMessage {
    pub order: AttributeBag,
    pub products: Vec<ProductLine>,
}

/// One product of an order, with its promotion if any.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductLine {
    #[serde(flatten)]
    pub attributes: AttributeBag,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub promotion: Option<AttributeBag>,
}

/// The message returned by `GetMessage`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    pub message: AttributeBag,
    pub product: Vec<AttributeBag>,
}

/// Anything that belongs to a product, such as a menu option.
pub trait ProductScoped {
    fn product_id(&self) -> Option<&str>;
}

impl ProductScoped for Node {
    /// `ProductId` child element, or `ProductId` attribute.
    fn product_id(&self) -> Option<&str> {
        self.get("ProductId").and_then(Node::text).or_else(|| {
            self.get(crate::processing::ATTRIBUTES_KEY)
                .and_then(|attrs| attrs.get("ProductId"))
                .and_then(Node::text)
        })
    }
}

impl ProductScoped for AttributeBag {
    fn product_id(&self) -> Option<&str> {
        self.get("ProductId").map(String::as_str)
    }
}

/// Client for the restaurant-ordering service.
pub struct ServiceClient {
    credentials: Credentials,
    connection: Option<Box<dyn SoapTransport>>,
}

impl ServiceClient {
    /// Connects to the service described by `config`.
    ///
    /// Connection failures are logged, not returned: the client comes back
    /// without a connection and its remote operations fail with
    /// [`ServiceError::NotConnected`].
    pub async fn connect(config: ServiceConfig) -> Self {
        let connection: Option<Box<dyn SoapTransport>> =
            match HttpSoapTransport::connect(&config).await {
                Ok(transport) => {
                    info!(
                        "✅ Connected to ordering service as {}",
                        config.credentials.username
                    );
                    Some(Box::new(transport))
                }
                Err(e) => {
                    error!("❌ Could not connect to ordering service: {}", e);
                    None
                }
            };

        Self {
            credentials: config.credentials,
            connection,
        }
    }

    /// Uses an already established transport.
    pub fn with_transport(credentials: Credentials, transport: impl SoapTransport + 'static) -> Self {
        Self {
            credentials,
            connection: Some(Box::new(transport)),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    /// Performs one round trip.
    async fn invoke(&self, call: RemoteCall) -> Result<SoapResponse> {
        let connection = self.connection.as_ref().ok_or(ServiceError::NotConnected)?;

        debug!("📤 {} {:?}", call.operation, call.params);
        let result = connection.call(&call).await;
        if let Err(e) = &result {
            debug!("📥 {} failed: {}", call.operation, e);
        }
        result
    }

    /// Restaurant-scoped call carrying `catalogName` and `categoryName`.
    fn scoped(&self, operation: Operation) -> RemoteCall {
        RemoteCall::new(operation)
            .param("catalogName", self.credentials.catalog_name.as_str())
            .param("categoryName", self.credentials.category_id.as_str())
    }

    /// Normalizes the XML held in `field`.
    fn normalized(response: &SoapResponse, field: &str) -> Result<Node> {
        normalize(response.field(field)?)
    }

    /// The restaurant's menu (`Menu` subtree).
    pub async fn get_menu(&self) -> Result<Node> {
        let response = self.invoke(RemoteCall::new(Operation::GetMenu)).await?;
        let doc = Self::normalized(&response, &Operation::GetMenu.result_field())?;
        Ok(doc.find("Menu")?.clone())
    }

    /// Options whose `ProductId` equals `product_id`, in their original order.
    ///
    /// Purely local; no remote call is made.
    pub fn get_product_options<'a, T: ProductScoped>(
        &self,
        product_id: &str,
        options: &'a [T],
    ) -> Vec<&'a T> {
        options
            .iter()
            .filter(|option| option.product_id() == Some(product_id))
            .collect()
    }

    /// All pending orders with their products.
    ///
    /// `version` selects the remote operation, see [`VersionedCall`]. The
    /// result must carry at least one `order`, and every order at least one
    /// `product`; otherwise [`ServiceError::MissingField`] names the absent
    /// element.
    pub async fn get_all_messages(&self, version: &str) -> Result<Vec<OrderMessage>> {
        let versioned = VersionedCall::all_messages(version);
        let response = self.invoke(RemoteCall::new(versioned.operation)).await?;
        let doc = Self::normalized(&response, &versioned.result_field)?;
        let root = doc.root()?;

        root.field("order")?
            .items()
            .into_iter()
            .map(|order| {
                let products = order
                    .field("product")?
                    .items()
                    .into_iter()
                    .map(|product| {
                        Ok(ProductLine {
                            attributes: product.attributes()?,
                            promotion: product
                                .get("promotion")
                                .map(Node::attributes)
                                .transpose()?,
                        })
                    })
                    .collect::<Result<Vec<_>>>()?;

                Ok(OrderMessage {
                    order: order.attributes()?,
                    products,
                })
            })
            .collect()
    }

    /// Moves an order to `state`. Returns `true` iff the service answered `OK`.
    pub async fn update_order(
        &self,
        order_id: &str,
        state: OrderState,
        reason: Option<&str>,
    ) -> Result<bool> {
        let call = RemoteCall::new(Operation::UpdateOrder)
            .param("orderId", order_id)
            .param("orderState", state.as_str())
            .param("reason", reason.unwrap_or_default());

        let response = self.invoke(call).await?;
        let accepted = response.field(&Operation::UpdateOrder.result_field())? == SUCCESS;

        if accepted {
            info!("✅ Order {} -> {}", order_id, state);
        } else {
            warn!("⚠️  Order {} -> {} not accepted by service", order_id, state);
        }
        Ok(accepted)
    }

    /// Sets the restaurant's availability. Returns `true` iff the service answered `OK`.
    pub async fn update_restaurant_state(&self, state: RestaurantState) -> Result<bool> {
        let call = self
            .scoped(Operation::UpdateRestaurantState)
            .param("restaurantState", state.as_str());

        let response = self.invoke(call).await?;
        let accepted =
            response.field(&Operation::UpdateRestaurantState.result_field())? == SUCCESS;

        if accepted {
            info!("✅ Restaurant state -> {}", state);
        } else {
            warn!("⚠️  Restaurant state -> {} not accepted by service", state);
        }
        Ok(accepted)
    }

    /// The next message with its products.
    ///
    /// `version` selects the remote operation, see [`VersionedCall`].
    pub async fn get_message(&self, version: &str) -> Result<Message> {
        let versioned = VersionedCall::message(version);
        let response = self.invoke(RemoteCall::new(versioned.operation)).await?;
        let doc = Self::normalized(&response, &versioned.result_field)?;
        let root = doc.root()?;

        Ok(Message {
            message: root.attributes()?,
            product: root
                .field("product")?
                .items()
                .into_iter()
                .map(Node::attributes)
                .collect::<Result<Vec<_>>>()?,
        })
    }

    /// Accepted payment methods (`NewDataSet/PaymentMethods` subtree).
    pub async fn get_payment_types(&self) -> Result<Node> {
        let response = self.invoke(RemoteCall::new(Operation::GetPaymentTypes)).await?;
        let doc = Self::normalized(&response, &Operation::GetPaymentTypes.result_field())?;
        Ok(doc.find("NewDataSet")?.field("PaymentMethods")?.clone())
    }

    /// Delivery areas of the configured restaurant (`NewDataSet` subtree).
    pub async fn get_restaurant_delivery_areas(&self) -> Result<Node> {
        let response = self
            .invoke(self.scoped(Operation::GetRestaurantDeliveryAreas))
            .await?;
        let doc = Self::normalized(
            &response,
            &Operation::GetRestaurantDeliveryAreas.result_field(),
        )?;
        Ok(doc.find("NewDataSet")?.clone())
    }

    /// Restaurants available to this account (`RestaurantList` subtree).
    pub async fn get_restaurant_list(&self) -> Result<Node> {
        let response = self.invoke(RemoteCall::new(Operation::GetRestaurantList)).await?;
        let doc = Self::normalized(&response, &Operation::GetRestaurantList.result_field())?;
        Ok(doc.find("RestaurantList")?.clone())
    }

    /// Raw `GetRestaurantStatusResult`.
    pub async fn get_restaurant_status(&self) -> Result<String> {
        let response = self.invoke(self.scoped(Operation::GetRestaurantStatus)).await?;
        Ok(response
            .field(&Operation::GetRestaurantStatus.result_field())?
            .to_string())
    }

    /// `IsRestaurantOpenResult` read as an `xsd:boolean`.
    ///
    /// The service declares this field as a boolean, so the result is typed:
    /// `true`/`false`/`1`/`0` in any case map to `bool`, anything else is
    /// [`ServiceError::UnexpectedValue`] carrying the raw value.
    pub async fn is_restaurant_open(&self) -> Result<bool> {
        let field = Operation::IsRestaurantOpen.result_field();
        let response = self.invoke(self.scoped(Operation::IsRestaurantOpen)).await?;
        let raw = response.field(&field)?;

        match raw.trim().to_ascii_lowercase().as_str() {
            "true" | "1" => Ok(true),
            "false" | "0" => Ok(false),
            _ => Err(ServiceError::UnexpectedValue {
                field,
                value: raw.to_string(),
            }),
        }
    }

    /// Acknowledges a processed message. Returns the service's response untouched.
    pub async fn set_message_successful(&self, message_id: &str) -> Result<SoapResponse> {
        let call = RemoteCall::new(Operation::MessageSuccessful).param("messageId", message_id);
        self.invoke(call).await
    }
}
