use std::sync::{Arc, Mutex};

use quiz_core::model::{QuizId, QuizResult, Session};
use quiz_core::time::fixed_now;
use services::{HttpProgressStore, RemoteConfig, RemoteError, RemoteProgressStore};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// Serves `responses` in order, one per connection, recording each raw request.
async fn serve(responses: Vec<(u16, &'static str)>) -> (String, Arc<Mutex<Vec<String>>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let log = Arc::clone(&seen);

    tokio::spawn(async move {
        for (status, body) in responses {
            let (mut socket, _) = listener.accept().await.unwrap();
            let request = read_request(&mut socket).await;
            log.lock().unwrap().push(request);
            let response = format!(
                "HTTP/1.1 {status} X\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
        }
    });

    (format!("http://{addr}"), seen)
}

async fn read_request(socket: &mut tokio::net::TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0_u8; 4096];
    loop {
        let n = socket.read(&mut chunk).await.unwrap();
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
        let text = String::from_utf8_lossy(&buf);
        if let Some(header_end) = text.find("\r\n\r\n") {
            let content_length = text[..header_end]
                .lines()
                .find_map(|line| {
                    let (name, value) = line.split_once(':')?;
                    name.eq_ignore_ascii_case("content-length")
                        .then(|| value.trim().parse::<usize>().ok())
                        .flatten()
                })
                .unwrap_or(0);
            if buf.len() >= header_end + 4 + content_length {
                break;
            }
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}

fn store(base_url: &str) -> HttpProgressStore {
    HttpProgressStore::new(RemoteConfig::new(base_url, "secret-token")).unwrap()
}

fn quiz() -> QuizId {
    QuizId::parse("tester-mindset").unwrap()
}

#[tokio::test]
async fn fetch_sends_bearer_token_and_decodes_snapshot() {
    let (base, seen) = serve(vec![(
        200,
        r#"{"data":{"experience":30,"tools":["Risk Matrix"],"questionHistory":[],"currentScenario":0,"status":"in-progress"}}"#,
    )])
    .await;

    let snapshot = store(&base).fetch(&quiz()).await.unwrap().unwrap();
    assert_eq!(snapshot.experience, 30);
    assert_eq!(snapshot.tools, vec!["Risk Matrix".to_owned()]);

    let request = seen.lock().unwrap()[0].clone();
    assert!(request.starts_with("GET /progress/tester-mindset "));
    assert!(request.to_lowercase().contains("authorization: bearer secret-token"));
}

#[tokio::test]
async fn missing_progress_is_none() {
    let (base, _) = serve(vec![(404, r#"{"message":"not found"}"#)]).await;
    assert_eq!(store(&base).fetch(&quiz()).await.unwrap(), None);
}

#[tokio::test]
async fn unauthorized_maps_to_auth_error() {
    let (base, _) = serve(vec![(401, "{}"), (403, "{}")]).await;
    let store = store(&base);
    assert!(store.fetch(&quiz()).await.unwrap_err().is_auth());
    let snapshot = Session::new().snapshot(fixed_now());
    assert!(store.store(&quiz(), &snapshot).await.unwrap_err().is_auth());
}

#[tokio::test]
async fn store_posts_snapshot_body() {
    let (base, seen) = serve(vec![(200, "{}")]).await;
    let snapshot = Session::new().snapshot(fixed_now());
    store(&base).store(&quiz(), &snapshot).await.unwrap();

    let request = seen.lock().unwrap()[0].clone();
    assert!(request.starts_with("POST /progress/tester-mindset "));
    let body = request.split("\r\n\r\n").nth(1).unwrap();
    let json: serde_json::Value = serde_json::from_str(body).unwrap();
    assert_eq!(json["status"], "in-progress");
    assert_eq!(json["currentScenario"], 0);
    assert!(json.get("lastUpdated").is_none());
}

#[tokio::test]
async fn server_errors_surface_status() {
    let (base, seen) = serve(vec![(500, "{}")]).await;
    let result = QuizResult::from_session(&quiz(), &Session::new(), fixed_now());
    let err = store(&base).submit_result(&result).await.unwrap_err();
    assert!(matches!(err, RemoteError::HttpStatus(status) if status.as_u16() == 500));
    assert!(seen.lock().unwrap()[0].starts_with("POST /quiz-results "));
}
