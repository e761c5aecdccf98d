use std::sync::{Arc, Mutex};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use yemeksepeti::common::config::{EndpointConfig, ServiceConfig};
use yemeksepeti::{Credentials, OrderState, ServiceClient, ServiceError};

type Responder = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// Reads one HTTP/1.1 request: headers plus `Content-Length` bytes of body.
async fn read_request(stream: &mut TcpStream) -> std::io::Result<String> {
    let mut data = Vec::new();
    let mut chunk = [0u8; 4096];

    loop {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        data.extend_from_slice(&chunk[..n]);

        let text = String::from_utf8_lossy(&data);
        if let Some(header_end) = text.find("\r\n\r\n") {
            let headers = text[..header_end].to_ascii_lowercase();
            let length = headers
                .lines()
                .find_map(|line| line.strip_prefix("content-length:"))
                .and_then(|v| v.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if data.len() >= header_end + 4 + length {
                break;
            }
        }
    }

    Ok(String::from_utf8_lossy(&data).into_owned())
}

fn http_response(status: &str, content_type: &str, body: &str) -> String {
    format!(
        "HTTP/1.1 {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        content_type,
        body.len(),
        body
    )
}

fn soap(body: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="utf-8"?><soap:Envelope xmlns:soap="http://www.w3.org/2003/05/soap-envelope"><soap:Body>{}</soap:Body></soap:Envelope>"#,
        body
    )
}

/// Serves every connection with `respond`, remembering the raw requests.
async fn spawn_service(respond: Responder) -> (String, Arc<Mutex<Vec<String>>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let requests = Arc::new(Mutex::new(Vec::new()));
    let seen = requests.clone();

    tokio::spawn(async move {
        loop {
            let (mut stream, _) = match listener.accept().await {
                Ok(conn) => conn,
                Err(_) => break,
            };
            let request = match read_request(&mut stream).await {
                Ok(request) => request,
                Err(_) => continue,
            };
            let reply = respond(&request);
            seen.lock().unwrap().push(request);
            let _ = stream.write_all(reply.as_bytes()).await;
            let _ = stream.shutdown().await;
        }
    });

    (
        format!("http://{}/messagingwebservice/integration.asmx?WSDL", addr),
        requests,
    )
}

fn config(wsdl_url: String) -> ServiceConfig {
    ServiceConfig {
        credentials: Credentials::new("user", "pass", "TR_ISTANBUL", "cat-42"),
        service: EndpointConfig { wsdl_url },
    }
}

fn ordering_service(request: &str) -> String {
    if request.starts_with("GET") {
        return http_response("200 OK", "text/xml", "<wsdl:definitions/>");
    }

    if request.contains("action=\"http://tempuri.org/UpdateOrder\"") {
        return http_response(
            "200 OK",
            "application/soap+xml; charset=utf-8",
            &soap(r#"<UpdateOrderResponse xmlns="http://tempuri.org/"><UpdateOrderResult>OK</UpdateOrderResult></UpdateOrderResponse>"#),
        );
    }

    if request.contains("action=\"http://tempuri.org/GetMenu\"") {
        return http_response(
            "200 OK",
            "application/soap+xml; charset=utf-8",
            &soap(r#"<GetMenuResponse xmlns="http://tempuri.org/"><GetMenuResult><Menu xmlns=""><Item id="1">Pizza</Item></Menu></GetMenuResult></GetMenuResponse>"#),
        );
    }

    http_response(
        "500 Internal Server Error",
        "application/soap+xml; charset=utf-8",
        &soap(r#"<soap:Fault><soap:Code><soap:Value>soap:Receiver</soap:Value></soap:Code><soap:Reason><soap:Text xml:lang="en">Server was unable to process request.</soap:Text></soap:Reason></soap:Fault>"#),
    )
}

#[tokio::test]
async fn unreachable_endpoint_leaves_client_unconnected() {
    // grab a free port, then close it
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = ServiceClient::connect(config(format!(
        "http://{}/integration.asmx?WSDL",
        addr
    )))
    .await;

    assert!(!client.is_connected());
    assert!(matches!(
        client.get_menu().await,
        Err(ServiceError::NotConnected)
    ));
}

#[tokio::test]
async fn wsdl_error_status_leaves_client_unconnected() {
    let (wsdl_url, _) = spawn_service(Arc::new(|_: &str| {
        http_response("404 Not Found", "text/plain", "not here")
    }))
    .await;

    let client = ServiceClient::connect(config(wsdl_url)).await;

    assert!(!client.is_connected());
}

#[tokio::test]
async fn round_trip_over_http() {
    let (wsdl_url, requests) = spawn_service(Arc::new(ordering_service)).await;

    let client = ServiceClient::connect(config(wsdl_url)).await;
    assert!(client.is_connected());

    assert!(client
        .update_order("1001", OrderState::OnDelivery, Some("Courier left"))
        .await
        .unwrap());

    let menu = client.get_menu().await.unwrap();
    assert_eq!(
        menu.field("Item").unwrap().attributes().unwrap()["id"],
        "1"
    );

    let requests = requests.lock().unwrap();
    assert_eq!(requests.len(), 3);
    assert!(requests[0].starts_with("GET /messagingwebservice/integration.asmx?WSDL"));

    let update = &requests[1];
    let lowered = update.to_ascii_lowercase();
    assert!(update.starts_with("POST /messagingwebservice/integration.asmx "));
    assert!(lowered.contains("authorization: basic dxnlcjpwyxnz"));
    assert!(lowered.contains("content-type: application/soap+xml"));
    assert!(update.contains("<UserName>user</UserName><Password>pass</Password>"));
    assert!(update.contains("<orderId>1001</orderId><orderState>OnDelivery</orderState><reason>Courier left</reason>"));
}

#[tokio::test]
async fn soap_fault_surfaces_as_fault() {
    let (wsdl_url, _) = spawn_service(Arc::new(ordering_service)).await;
    let client = ServiceClient::connect(config(wsdl_url)).await;

    match client.get_restaurant_status().await {
        Err(ServiceError::Fault { code, reason }) => {
            assert_eq!(code, "soap:Receiver");
            assert_eq!(reason, "Server was unable to process request.");
        }
        other => panic!("expected fault, got {:?}", other),
    }
}
