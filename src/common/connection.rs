//! # SOAP Connection
//!
//! Provides the transport seam between [`ServiceClient`](crate::client::ServiceClient)
//! and the remote ordering service, plus the HTTP implementation used in
//! production.
//!
//! ## Wire Protocol
//!
//! Each call is one SOAP 1.2 envelope POSTed to the service endpoint:
//! ```text
//! Content-Type: application/soap+xml; charset=utf-8; action="http://tempuri.org/<Operation>"
//! Authorization: Basic <username:password>
//!
//! <Envelope>
//!   <Header><AuthHeader><UserName/><Password/></AuthHeader></Header>
//!   <Body><Operation><param>value</param>...</Operation></Body>
//! </Envelope>
//! ```
//!
//! The reply carries an `<Operation>Response` element whose children are the
//! result fields. A field holding markup (`xs:any`) is kept as raw inner XML;
//! a text field is unescaped, so XML shipped as an escaped string comes back
//! as markup either way.

use std::collections::BTreeMap;

use async_trait::async_trait;
use log::{debug, error, info};
use quick_xml::escape::{escape, unescape};
use quick_xml::events::Event;
use quick_xml::Reader;
use reqwest::header::CONTENT_TYPE;
use serde::Serialize;

use super::config::ServiceConfig;
use super::messages::{Operation, RemoteCall};
use crate::error::{Result, ServiceError};
use crate::processing::{normalize, Node};

/// Namespace of the service's operations and its `AuthHeader`.
pub const SERVICE_NAMESPACE: &str = "http://tempuri.org/";

/// SOAP 1.2 envelope namespace.
pub const SOAP12_NAMESPACE: &str = "http://www.w3.org/2003/05/soap-envelope";

/// Result fields of one remote call, keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SoapResponse {
    pub operation: String,
    pub fields: BTreeMap<String, String>,
}

impl SoapResponse {
    pub fn new(operation: Operation) -> Self {
        Self {
            operation: operation.as_str().to_string(),
            fields: BTreeMap::new(),
        }
    }

    /// Adds a result field.
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Content of a result field, or [`ServiceError::MissingField`].
    pub fn field(&self, name: &str) -> Result<&str> {
        self.fields
            .get(name)
            .map(String::as_str)
            .ok_or_else(|| ServiceError::MissingField(name.to_string()))
    }
}

/// Authenticated channel to the ordering service.
///
/// Implementations perform exactly one round trip per [`call`](SoapTransport::call)
/// and never retry.
#[async_trait]
pub trait SoapTransport: Send + Sync {
    /// Invokes a remote operation and returns its result fields.
    async fn call(&self, call: &RemoteCall) -> Result<SoapResponse>;
}

/// SOAP 1.2 over HTTP, authenticated with both an `AuthHeader` and basic auth.
pub struct HttpSoapTransport {
    http: reqwest::Client,
    endpoint: String,
    username: String,
    password: String,
}

impl HttpSoapTransport {
    /// Builds the HTTP client and checks the service is reachable by fetching
    /// its WSDL document.
    ///
    /// # Errors
    ///
    /// * [`ServiceError::Transport`] if the client cannot be built or the request fails
    /// * [`ServiceError::Http`] if the WSDL request returns a non-success status
    pub async fn connect(config: &ServiceConfig) -> Result<Self> {
        let credentials = &config.credentials;
        let http = reqwest::Client::builder()
            .user_agent(concat!("yemeksepeti/", env!("CARGO_PKG_VERSION")))
            .build()?;

        info!("🔌 Fetching service description from {}", config.service.wsdl_url);

        let response = http
            .get(&config.service.wsdl_url)
            .basic_auth(&credentials.username, Some(&credentials.password))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ServiceError::Http {
                status: status.as_u16(),
                body,
            });
        }

        Ok(Self {
            http,
            endpoint: config.service.endpoint().to_string(),
            username: credentials.username.clone(),
            password: credentials.password.clone(),
        })
    }
}

#[async_trait]
impl SoapTransport for HttpSoapTransport {
    async fn call(&self, call: &RemoteCall) -> Result<SoapResponse> {
        let envelope = encode_envelope(call, &self.username, &self.password);
        let content_type = format!(
            "application/soap+xml; charset=utf-8; action=\"{}{}\"",
            SERVICE_NAMESPACE, call.operation
        );

        debug!("📤 {} -> {}", call.operation, self.endpoint);

        let response = self
            .http
            .post(&self.endpoint)
            .basic_auth(&self.username, Some(&self.password))
            .header(CONTENT_TYPE, content_type)
            .body(envelope)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            // SOAP 1.2 faults arrive with a 500 status
            return match decode_envelope(call.operation, &body) {
                Err(fault @ ServiceError::Fault { .. }) => {
                    error!("❌ {} failed: {}", call.operation, fault);
                    Err(fault)
                }
                _ => Err(ServiceError::Http {
                    status: status.as_u16(),
                    body,
                }),
            };
        }

        decode_envelope(call.operation, &body)
    }
}

/// Renders a remote call as a SOAP 1.2 envelope.
pub fn encode_envelope(call: &RemoteCall, username: &str, password: &str) -> String {
    let params: String = call
        .params
        .iter()
        .map(|(name, value)| format!("<{name}>{}</{name}>", escape(value.as_str())))
        .collect();

    format!(
        concat!(
            r#"<?xml version="1.0" encoding="utf-8"?>"#,
            r#"<soap12:Envelope xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" "#,
            r#"xmlns:xsd="http://www.w3.org/2001/XMLSchema" xmlns:soap12="{soap}">"#,
            r#"<soap12:Header><AuthHeader xmlns="{ns}">"#,
            r#"<UserName>{user}</UserName><Password>{pass}</Password>"#,
            r#"</AuthHeader></soap12:Header>"#,
            r#"<soap12:Body><{op} xmlns="{ns}">{params}</{op}></soap12:Body>"#,
            r#"</soap12:Envelope>"#
        ),
        soap = SOAP12_NAMESPACE,
        ns = SERVICE_NAMESPACE,
        user = escape(username),
        pass = escape(password),
        op = call.operation,
        params = params,
    )
}

/// Extracts the result fields of `operation` from a SOAP response body.
///
/// # Errors
///
/// * [`ServiceError::Fault`] if the body carries a SOAP fault
/// * [`ServiceError::MissingField`] if there is no `<Operation>Response` element
/// * [`ServiceError::Xml`] if the body is not well-formed
pub fn decode_envelope(operation: Operation, body: &str) -> Result<SoapResponse> {
    let response_element = operation.response_element();
    let mut reader = Reader::from_str(body);
    reader.config_mut().trim_text(true);

    let mut response = SoapResponse::new(operation);
    let mut in_response = false;

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                if in_response {
                    let raw = reader.read_text(e.name())?;
                    response.fields.insert(name, field_content(&raw)?);
                } else if name == "Fault" {
                    let raw = reader.read_text(e.name())?;
                    return Err(fault_from(&raw));
                } else if name == response_element {
                    in_response = true;
                }
            }
            Event::Empty(e) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                if in_response {
                    response.fields.insert(name, String::new());
                } else if name == response_element {
                    return Ok(response);
                }
            }
            Event::End(e) => {
                if in_response && e.local_name().as_ref() == response_element.as_bytes() {
                    return Ok(response);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Err(ServiceError::MissingField(response_element))
}

/// Raw content of a result field: CDATA unwrapped, markup kept, text unescaped.
fn field_content(raw: &str) -> Result<String> {
    let trimmed = raw.trim();

    if let Some(inner) = trimmed
        .strip_prefix("<![CDATA[")
        .and_then(|rest| rest.strip_suffix("]]>"))
    {
        return Ok(inner.to_string());
    }
    if trimmed.contains('<') {
        return Ok(trimmed.to_string());
    }

    unescape(trimmed)
        .map(|text| text.into_owned())
        .map_err(|e| ServiceError::Xml(e.to_string()))
}

/// Reads a SOAP 1.2 (`Code/Value`, `Reason/Text`) or 1.1 (`faultcode`,
/// `faultstring`) fault body.
fn fault_from(raw: &str) -> ServiceError {
    let doc = match normalize(raw) {
        Ok(doc) => doc,
        Err(_) => {
            return ServiceError::Fault {
                code: "Unknown".to_string(),
                reason: raw.trim().to_string(),
            }
        }
    };

    let text_of = |names: &[&str]| {
        names
            .iter()
            .find_map(|name| doc.descendant(name).and_then(Node::text))
            .unwrap_or_default()
            .to_string()
    };

    ServiceError::Fault {
        code: text_of(&["Value", "faultcode"]),
        reason: text_of(&["Text", "faultstring"]),
    }
}
