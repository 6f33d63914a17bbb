//! Side-channel integration tests.
//!
//! A real listener on an ephemeral port, a notifier pointed at it, and the
//! web flow that triggers it.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use puzzle_gate::notify::{Listener, Notifier, Received};
use puzzle_gate::session::ManualClock;
use puzzle_gate::web::{create_router, AppState, GateSettings};
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpSocket, TcpStream};
use tokio::sync::mpsc;
use tower::ServiceExt;

async fn start_listener() -> (SocketAddr, mpsc::UnboundedReceiver<Received>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let listener = Listener::bind("127.0.0.1:0").await.unwrap().with_tap(tx);
    let addr = listener.local_addr().unwrap();
    tokio::spawn(listener.run());
    (addr, rx)
}

async fn next(rx: &mut mpsc::UnboundedReceiver<Received>) -> String {
    tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("timed out waiting for the listener")
        .expect("listener tap closed")
        .text
}

async fn unused_port() -> u16 {
    let socket = TcpListener::bind("127.0.0.1:0").await.unwrap();
    socket.local_addr().unwrap().port()
}

/// A loopback listener that never accepts, held open with its accept queue
/// full. Further connects to it hang instead of failing.
struct StalledTarget {
    addr: SocketAddr,
    _listener: TcpListener,
    _held: Vec<TcpStream>,
}

async fn stalled_target() -> StalledTarget {
    let socket = TcpSocket::new_v4().unwrap();
    socket.bind("127.0.0.1:0".parse().unwrap()).unwrap();
    let listener = socket.listen(0).unwrap();
    let addr = listener.local_addr().unwrap();

    let mut held = Vec::new();
    for _ in 0..64 {
        match tokio::time::timeout(Duration::from_millis(200), TcpStream::connect(addr)).await {
            Ok(Ok(stream)) => held.push(stream),
            Ok(Err(e)) => panic!("connect to backlog listener failed: {e}"),
            Err(_) => {
                return StalledTarget {
                    addr,
                    _listener: listener,
                    _held: held,
                }
            }
        }
    }
    panic!("accept queue never filled");
}

fn app(notifier: Notifier) -> Router {
    let settings = GateSettings::new("alice", "pw", "0700").with_notify_message("a hint");
    let state = AppState::new(settings, notifier).with_clock(Arc::new(ManualClock::new(1_000)));
    create_router(state)
}

/// Log in and request `/problem`; returns the response status.
async fn reach_problem(app: &Router) -> StatusCode {
    let login = Request::builder()
        .method(Method::POST)
        .uri("/login")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from("id=alice&pw=pw"))
        .unwrap();
    let response = app.clone().oneshot(login).await.unwrap();
    let cookie = response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|c| c.starts_with("gate.sid="))
        .and_then(|c| c.split(';').next())
        .unwrap()
        .to_string();

    let problem = Request::builder()
        .uri("/problem")
        .header(header::COOKIE, cookie)
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(problem).await.unwrap();
    assert_eq!(
        response.headers().get(header::LOCATION).unwrap(),
        "/problem-page"
    );
    response.status()
}

#[tokio::test]
async fn test_notifier_reaches_listener() {
    let (addr, mut rx) = start_listener().await;
    let notifier = Notifier::new("127.0.0.1", addr.port());

    let _ = notifier.notify("0700으로 시작하는 조합");
    assert_eq!(next(&mut rx).await, "0700으로 시작하는 조합");
}

#[tokio::test]
async fn test_listener_two_chunks_then_new_connection() {
    let (addr, mut rx) = start_listener().await;

    let mut client = TcpStream::connect(addr).await.unwrap();
    client.write_all(b"A").await.unwrap();
    assert_eq!(next(&mut rx).await, "A");
    client.write_all(b"B").await.unwrap();
    assert_eq!(next(&mut rx).await, "B");
    client.shutdown().await.unwrap();
    drop(client);

    let mut again = TcpStream::connect(addr).await.unwrap();
    again.write_all(b"C").await.unwrap();
    assert_eq!(next(&mut rx).await, "C");
}

#[tokio::test]
async fn test_problem_route_sends_notification() {
    let (addr, mut rx) = start_listener().await;
    let app = app(Notifier::new("127.0.0.1", addr.port()));

    assert_eq!(reach_problem(&app).await, StatusCode::SEE_OTHER);
    assert_eq!(next(&mut rx).await, "a hint");
}

#[tokio::test]
async fn test_unreachable_notifier_does_not_affect_response() {
    let app = app(Notifier::new("127.0.0.1", unused_port().await));

    let status = tokio::time::timeout(Duration::from_secs(2), reach_problem(&app))
        .await
        .expect("response must not wait on the notifier");
    assert_eq!(status, StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn test_notify_returns_while_delivery_is_pending() {
    let target = stalled_target().await;
    let notifier = Notifier::new("127.0.0.1", target.addr.port());

    let handle = notifier.notify("0700");
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert!(!handle.is_finished());
    handle.abort();
}

#[tokio::test]
async fn test_stalled_notifier_does_not_delay_response() {
    let target = stalled_target().await;
    let app = app(Notifier::new("127.0.0.1", target.addr.port()));

    let status = tokio::time::timeout(Duration::from_millis(500), reach_problem(&app))
        .await
        .expect("response must not wait on notification delivery");
    assert_eq!(status, StatusCode::SEE_OTHER);
}
