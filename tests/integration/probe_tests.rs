//! Integration tests for the relay probes
//!
//! Information documents are served by wiremock; relay lists by a scripted
//! websocket relay listening on 127.0.0.1.

use futures_util::{SinkExt, StreamExt};
use relay_miner::config::ProbeConfig;
use relay_miner::crawler::{
    build_http_client, fetch_info_document, fetch_peer_list, PeerListConfig, Termination,
    MAX_INFO_DOCUMENT_BYTES,
};
use relay_miner::protocol::{find_neighbours, InfoDocument};
use relay_miner::FetchError;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio_tungstenite::{accept_async, tungstenite::Message};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const RELAY_LIST: &str = r#"["EVENT","relay-miner",{"id":"e1","pubkey":"alice","created_at":1,"kind":10002,"tags":[["r","wss://b.example/"],["r","wss://a.example/"]],"content":"","sig":"s"}]"#;
const TEXT_NOTE: &str = r#"["EVENT","relay-miner",{"id":"e2","pubkey":"bob","created_at":2,"kind":1,"tags":[],"content":"hi","sig":"s"}]"#;
const EOSE: &str = r#"["EOSE","relay-miner"]"#;

/// Starts a relay that answers the first subscription with `frames`
///
/// With `hold_open` the relay then stays silent until the client closes;
/// otherwise it closes the connection itself. The first frame received from the
/// client is reported through the returned channel.
async fn spawn_relay(frames: Vec<&'static str>, hold_open: bool) -> (String, oneshot::Receiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (request_tx, request_rx) = oneshot::channel();

    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = accept_async(stream).await.unwrap();

        if let Some(Ok(Message::Text(request))) = ws.next().await {
            let _ = request_tx.send(request);
        }

        for frame in frames {
            if ws.send(Message::Text(frame.to_string())).await.is_err() {
                return;
            }
        }

        if hold_open {
            while let Some(Ok(message)) = ws.next().await {
                if message.is_close() {
                    break;
                }
            }
        } else {
            let _ = ws.close(None).await;
        }
    });

    (format!("ws://{}/", addr), request_rx)
}

/// Starts a relay that sends one relay list and then never reads or writes again
async fn spawn_unresponsive_relay() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = accept_async(stream).await.unwrap();
        let _ = ws.next().await;
        let _ = ws.send(Message::Text(RELAY_LIST.to_string())).await;
        // Hold the socket open without ever answering the close handshake
        std::future::pending::<()>().await;
    });

    format!("ws://{}/", addr)
}

fn peer_list_config(timeout: Duration) -> PeerListConfig {
    PeerListConfig {
        connect_timeout: Duration::from_secs(1),
        timeout,
        close_grace: Duration::from_millis(200),
        limit: 100,
    }
}

#[tokio::test]
async fn test_info_document_fetch() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .and(header("accept", "application/nostr+json"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"{"name":"Relay One","pubkey":"owner","software":"git+https://github.com/hoytech/strfry.git","version":"1.0.0","supported_nips":[1,2,11]}"#,
        ))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = build_http_client(&ProbeConfig::default()).unwrap();
    let body = fetch_info_document(&client, &format!("{}/", mock_server.uri()))
        .await
        .unwrap();
    let info = InfoDocument::parse(&body);

    assert_eq!(info.name.as_deref(), Some("Relay One"));
    assert_eq!(info.pubkey.as_deref(), Some("owner"));
    assert_eq!(info.supported_nips.len(), 3);
}

#[tokio::test]
async fn test_info_document_error_status() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let client = build_http_client(&ProbeConfig::default()).unwrap();
    let result = fetch_info_document(&client, &format!("{}/", mock_server.uri())).await;

    assert!(matches!(result, Err(FetchError::Status { status: 404, .. })));
}

#[tokio::test]
async fn test_info_document_timeout() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("{}")
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&mock_server)
        .await;

    let config = ProbeConfig {
        info_timeout_ms: 200,
        ..ProbeConfig::default()
    };
    let client = build_http_client(&config).unwrap();
    let result = fetch_info_document(&client, &format!("{}/", mock_server.uri())).await;

    assert!(matches!(result, Err(FetchError::Timeout { .. })));
}

#[tokio::test]
async fn test_info_document_redirect_not_followed() {
    let internal = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("internal"))
        .expect(0)
        .mount(&internal)
        .await;

    let relay = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(302).insert_header("Location", format!("{}/admin", internal.uri()).as_str()),
        )
        .expect(1)
        .mount(&relay)
        .await;

    let client = build_http_client(&ProbeConfig::default()).unwrap();
    let result = fetch_info_document(&client, &format!("{}/", relay.uri())).await;

    assert!(matches!(result, Err(FetchError::Status { status: 302, .. })));
    internal.verify().await;
}

#[tokio::test]
async fn test_info_document_size_cap() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("x".repeat(MAX_INFO_DOCUMENT_BYTES + 1)),
        )
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/small"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("x".repeat(MAX_INFO_DOCUMENT_BYTES)),
        )
        .mount(&mock_server)
        .await;

    let client = build_http_client(&ProbeConfig::default()).unwrap();

    let result = fetch_info_document(&client, &format!("{}/", mock_server.uri())).await;
    assert!(matches!(result, Err(FetchError::BodyTooLarge { .. })));

    let body = fetch_info_document(&client, &format!("{}/small", mock_server.uri()))
        .await
        .unwrap();
    assert_eq!(body.len(), MAX_INFO_DOCUMENT_BYTES);
}

#[tokio::test]
async fn test_peer_list_until_eose() {
    let (url, request) = spawn_relay(vec![RELAY_LIST, TEXT_NOTE, EOSE], false).await;

    let peer_list = fetch_peer_list(&url, &peer_list_config(Duration::from_secs(5)))
        .await
        .unwrap();

    assert_eq!(peer_list.termination, Termination::EndOfStoredEvents);
    assert_eq!(peer_list.events.len(), 2);

    let scan = find_neighbours(&peer_list.events);
    assert_eq!(scan.relays, vec!["wss://a.example/", "wss://b.example/"]);
    assert_eq!(scan.wrong_kind, 1);

    let request: serde_json::Value = serde_json::from_str(&request.await.unwrap()).unwrap();
    assert_eq!(request[0], "REQ");
    assert_eq!(request[1], "relay-miner");
    assert_eq!(request[2]["kinds"][0], 10002);
    assert_eq!(request[2]["limit"], 100);
}

#[tokio::test]
async fn test_peer_list_ends_on_notice() {
    let (url, _) = spawn_relay(vec![RELAY_LIST, r#"["NOTICE","slow down"]"#, RELAY_LIST], true).await;

    let peer_list = fetch_peer_list(&url, &peer_list_config(Duration::from_secs(5)))
        .await
        .unwrap();

    assert_eq!(peer_list.termination, Termination::Notice);
    assert_eq!(peer_list.events.len(), 1);
}

#[tokio::test]
async fn test_peer_list_ends_on_closed() {
    let (url, _) = spawn_relay(vec![r#"["CLOSED","relay-miner","auth-required: sign in"]"#], true).await;

    let peer_list = fetch_peer_list(&url, &peer_list_config(Duration::from_secs(5)))
        .await
        .unwrap();

    assert_eq!(peer_list.termination, Termination::Closed);
    assert!(peer_list.events.is_empty());
}

#[tokio::test]
async fn test_peer_list_skips_bad_frames() {
    let (url, _) = spawn_relay(
        vec![
            r#"["AUTH","challenge"]"#,
            "{not json",
            r#"["EVENT","relay-miner"]"#,
            r#"["OK","e1",true,""]"#,
            RELAY_LIST,
            EOSE,
        ],
        false,
    )
    .await;

    let peer_list = fetch_peer_list(&url, &peer_list_config(Duration::from_secs(5)))
        .await
        .unwrap();

    assert_eq!(peer_list.termination, Termination::EndOfStoredEvents);
    assert_eq!(peer_list.events.len(), 1);
}

#[tokio::test]
async fn test_peer_list_relay_disconnects() {
    let (url, _) = spawn_relay(vec![RELAY_LIST], false).await;

    let peer_list = fetch_peer_list(&url, &peer_list_config(Duration::from_secs(5)))
        .await
        .unwrap();

    assert_eq!(peer_list.termination, Termination::Disconnected);
    assert_eq!(peer_list.events.len(), 1);
}

#[tokio::test]
async fn test_silent_relay_times_out_with_partial_results() {
    let (url, _) = spawn_relay(vec![RELAY_LIST], true).await;

    let started = Instant::now();
    let peer_list = fetch_peer_list(&url, &peer_list_config(Duration::from_millis(300)))
        .await
        .unwrap();

    assert_eq!(peer_list.termination, Termination::TimedOut);
    assert_eq!(peer_list.events.len(), 1);
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn test_close_handshake_bounded_by_grace() {
    let url = spawn_unresponsive_relay().await;

    let started = Instant::now();
    let peer_list = fetch_peer_list(&url, &peer_list_config(Duration::from_millis(300)))
        .await
        .unwrap();

    assert_eq!(peer_list.termination, Termination::TimedOut);
    assert_eq!(peer_list.events.len(), 1);
    // 300ms limit plus 200ms close grace, with slack for scheduling
    assert!(started.elapsed() < Duration::from_millis(1500));
}

#[tokio::test]
async fn test_peer_list_connect_failure() {
    // Bind and drop to get a port nothing listens on
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let result = fetch_peer_list(
        &format!("ws://{}/", addr),
        &peer_list_config(Duration::from_secs(5)),
    )
    .await;

    assert!(result.is_err());
}
