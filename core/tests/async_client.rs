//! The non-blocking client against the live mock server.

use std::net::SocketAddr;

use stripe_core::{AsyncClient, ClientConfig, Error, HttpMethod, Params, Resources};
use tokio::sync::oneshot;

async fn start_server() -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(mock_server::run(listener));
    addr
}

fn client_with_key(addr: SocketAddr, key: &str) -> AsyncClient {
    AsyncClient::new(
        ClientConfig::new(key)
            .with_scheme("http")
            .with_host(addr.to_string()),
    )
    .unwrap()
}

fn client(addr: SocketAddr) -> AsyncClient {
    client_with_key(addr, mock_server::TEST_API_KEY)
}

#[tokio::test]
async fn futures_roundtrip() {
    let stripe = client(start_server().await);

    let plan = stripe
        .plans()
        .post(Params::new().insert("id", "silver").insert("amount", 1000))
        .await
        .unwrap();
    assert_eq!(plan["id"], "silver");

    let fetched = stripe.plans().id("silver").get(Params::new()).await.unwrap();
    assert_eq!(fetched["amount"], 1000);

    stripe.plans().id("silver").delete(Params::new()).await.unwrap();
    let err = stripe.plans().id("silver").get(Params::new()).await.unwrap_err();
    assert_eq!(err.status(), Some(404));
}

#[tokio::test]
async fn spawn_invokes_continuation_with_decoded_value() {
    let stripe = client(start_server().await);
    let (tx, rx) = oneshot::channel();

    let handle = stripe.customers().spawn_with(
        HttpMethod::Post,
        Params::new().insert("email", "async@example.com"),
        move |customer| {
            let _ = tx.send(customer["email"].as_str().map(str::to_string));
        },
    );

    let seen = rx.await.unwrap();
    assert_eq!(seen.as_deref(), Some("async@example.com"));
    let customer = handle.await.unwrap().unwrap();
    assert!(customer["id"].as_str().unwrap().starts_with("cus_"));
}

#[tokio::test]
async fn spawned_errors_flow_through_the_handle() {
    let stripe = client_with_key(start_server().await, "api_key");
    let called = std::sync::Arc::new(std::sync::atomic::AtomicBool::new(false));
    let flag = called.clone();

    let handle = stripe.balance().spawn_with(HttpMethod::Get, Params::new(), move |_| {
        flag.store(true, std::sync::atomic::Ordering::SeqCst);
    });

    let err = handle.await.unwrap().unwrap_err();
    assert_eq!(err.status(), Some(401));
    assert!(!called.load(std::sync::atomic::Ordering::SeqCst));
}

#[tokio::test]
async fn concurrent_builds_do_not_share_paths() {
    let stripe = client(start_server().await);
    stripe.plans().post(Params::new().insert("id", "a")).await.unwrap();
    stripe.plans().post(Params::new().insert("id", "b")).await.unwrap();

    let first = stripe.plans().id("a");
    let second = stripe.plans().id("b");
    let (a, b) = tokio::join!(first.get(Params::new()), second.get(Params::new()));
    assert_eq!(a.unwrap()["id"], "a");
    assert_eq!(b.unwrap()["id"], "b");

    let handles: Vec<_> = ["a", "b"]
        .into_iter()
        .map(|id| stripe.plans().id(id).spawn(HttpMethod::Get, Params::new()))
        .collect();
    for (handle, id) in handles.into_iter().zip(["a", "b"]) {
        let value = handle.await.unwrap().unwrap();
        assert_eq!(value["id"], id);
    }
}

#[tokio::test]
async fn join_error_converts_into_client_error() {
    let stripe = client(start_server().await);
    let handle = stripe.account().spawn(HttpMethod::Get, Params::new());
    let result: Result<serde_json::Value, Error> = async { handle.await? }.await;
    assert_eq!(result.unwrap()["object"], "account");
}

#[tokio::test]
async fn connection_failure_surfaces_through_the_handle() {
    // Bind then drop to get a port nothing listens on.
    let addr = std::net::TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap();
    let stripe = client(addr);
    let called = std::sync::Arc::new(std::sync::atomic::AtomicBool::new(false));
    let flag = called.clone();

    let handle = stripe.balance().spawn_with(HttpMethod::Get, Params::new(), move |_| {
        flag.store(true, std::sync::atomic::Ordering::SeqCst);
    });

    let err = handle.await.unwrap().unwrap_err();
    assert!(matches!(err, Error::Transport(_)));
    assert!(!called.load(std::sync::atomic::Ordering::SeqCst));
}
