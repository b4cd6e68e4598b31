//! Integration tests for `MyFundHttp` against a local canned server.
//!
//! The server mimics MyFund: JSON bodies served as `text/html`.

use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_test::{assert_err, assert_ok};

use myfund_portfolio::config::{Credentials, UpdateInterval};
use myfund_portfolio::coordinator::Coordinator;
use myfund_portfolio::domain::portfolio::Period;
use myfund_portfolio::error::{ApiError, FailureKind};
use myfund_portfolio::http::MyFundHttp;

const OK_BODY: &str = r#"{"status":{"code":"0","text":""},"portfel":{"wartosc":"15234.56","waluta":"PLN","zmianaDzienna":"-0.42","zysk":"1234.50","zmianaW":"+3.4","zmianaR":"+12.01"}}"#;

enum Reply {
    Body(&'static str),
    Hang,
}

/// Serve every connection with `reply`; request lines go to the returned receiver.
async fn serve(reply: Reply) -> (String, mpsc::UnboundedReceiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        loop {
            let (mut socket, _) = match listener.accept().await {
                Ok(conn) => conn,
                Err(_) => return,
            };
            let tx = tx.clone();
            let body = match &reply {
                Reply::Body(b) => Some(*b),
                Reply::Hang => None,
            };
            tokio::spawn(async move {
                let mut buf = vec![0u8; 4096];
                let mut read = 0;
                while !buf[..read].windows(4).any(|w| w == b"\r\n\r\n") {
                    match socket.read(&mut buf[read..]).await {
                        Ok(0) | Err(_) => return,
                        Ok(n) => read += n,
                    }
                }
                let request = String::from_utf8_lossy(&buf[..read]);
                let _ = tx.send(request.lines().next().unwrap_or_default().to_string());

                match body {
                    Some(body) => {
                        let response = format!(
                            "HTTP/1.1 200 OK\r\nContent-Type: text/html; charset=UTF-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    }
                    None => tokio::time::sleep(Duration::from_secs(60)).await,
                }
            });
        }
    });

    (format!("http://{}/API/v1/getPortfel.php", addr), rx)
}

fn client(base_url: &str) -> MyFundHttp {
    MyFundHttp::builder().base_url(base_url).build().unwrap()
}

fn credentials() -> Credentials {
    Credentials::new("Mój portfel", "secret&key")
}

#[tokio::test]
async fn test_json_served_as_html_is_parsed() {
    let (url, mut requests) = serve(Reply::Body(OK_BODY)).await;

    let body = assert_ok!(client(&url).get_portfolio(&credentials()).await);
    assert_eq!(body["portfel"]["zmianaW"], "+3.4");

    let request_line = requests.recv().await.unwrap();
    assert!(request_line.starts_with("GET /API/v1/getPortfel.php?"));
    assert!(request_line.contains("portfel=M%C3%B3j%20portfel"));
    assert!(request_line.contains("apiKey=secret%26key"));
    assert!(request_line.contains("format=json"));
}

#[tokio::test]
async fn test_rejected_status() {
    let (url, _requests) =
        serve(Reply::Body(r#"{"status":{"code":"1","text":"Niepoprawny klucz API"}}"#)).await;

    let err = assert_err!(client(&url).get_portfolio(&credentials()).await);
    match err {
        ApiError::Rejected { text } => assert_eq!(text, "Niepoprawny klucz API"),
        other => panic!("expected Rejected, got {other:?}"),
    }
}

#[tokio::test]
async fn test_rejected_numeric_code() {
    let (url, _requests) = serve(Reply::Body(r#"{"status":{"code":1,"text":"Brak portfela"}}"#)).await;

    let err = assert_err!(client(&url).get_portfolio(&credentials()).await);
    assert_eq!(err.kind(), FailureKind::Rejected);
}

#[tokio::test]
async fn test_malformed_body() {
    let (url, _requests) = serve(Reply::Body("<html><body>502 Bad Gateway</body></html>")).await;

    let err = assert_err!(client(&url).get_portfolio(&credentials()).await);
    assert!(matches!(err, ApiError::MalformedResponse(_)));
}

#[tokio::test]
async fn test_timeout() {
    let (url, _requests) = serve(Reply::Hang).await;
    let http = MyFundHttp::builder()
        .base_url(&url)
        .timeout(Duration::from_millis(200))
        .build()
        .unwrap();

    let err = assert_err!(http.get_portfolio(&credentials()).await);
    assert!(matches!(err, ApiError::Timeout), "got {err:?}");
    assert_eq!(err.kind(), FailureKind::Transport);
}

#[tokio::test]
async fn test_connection_refused_is_transport() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = assert_err!(
        client(&format!("http://{}/", addr))
            .get_portfolio(&credentials())
            .await
    );
    assert_eq!(err.kind(), FailureKind::Transport);
}

#[tokio::test]
async fn test_coordinator_over_http() {
    let (url, _requests) = serve(Reply::Body(OK_BODY)).await;
    let coordinator = Coordinator::new(client(&url), credentials(), UpdateInterval::default());

    assert_ok!(coordinator.first_refresh().await);

    let snapshot = coordinator.snapshot().unwrap();
    assert_eq!(snapshot.change(Period::Weekly).unwrap(), Some(3.4));
    assert_eq!(snapshot.change(Period::Yearly).unwrap(), Some(12.01));
    assert_eq!(snapshot.daily_change().unwrap(), Some(-0.42));
    assert_eq!(snapshot.currency().as_deref(), Some("PLN"));
    assert!(coordinator.last_update_success());
}
