use std::sync::mpsc;
use std::time::Duration;

use wiremock::matchers::{body_string, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use consul_http::{asynchronous, callback};
use consul_http::{AsyncHttpExecutor, ClientConfig, Error, HttpRequest, Params, RequestState};

fn config_for(server: &MockServer) -> ClientConfig {
    let addr = server.address();
    ClientConfig::new(addr.ip().to_string(), addr.port())
}

#[tokio::test]
async fn test_async_get() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/status/peers"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!(["10.0.0.1:8300"])),
        )
        .mount(&server)
        .await;

    let client = asynchronous::HttpClient::new(config_for(&server)).unwrap();
    let response = client.get("/v1/status/peers", Params::new()).await.unwrap();

    assert_eq!(response.code, 200);
    let peers: Vec<String> = response.json().unwrap();
    assert_eq!(peers, vec!["10.0.0.1:8300".to_string()]);
}

#[tokio::test]
async fn test_async_put_and_delete() {
    let server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path("/v1/kv/foo"))
        .and(body_string("bar"))
        .respond_with(ResponseTemplate::new(200).set_body_string("true"))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/v1/kv/foo"))
        .and(query_param("recurse", ""))
        .respond_with(ResponseTemplate::new(200).set_body_string("true"))
        .expect(1)
        .mount(&server)
        .await;

    let client = asynchronous::HttpClient::new(config_for(&server)).unwrap();

    let put = client
        .put("/v1/kv/foo", Params::new(), b"bar".to_vec())
        .await
        .unwrap();
    assert_eq!(put.body, "true");

    let deleted = client
        .execute(HttpRequest::delete("/v1/kv/foo").with_flag("recurse"))
        .await
        .unwrap();
    assert_eq!(deleted.body, "true");
}

#[tokio::test]
async fn test_async_timeout() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/kv/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("[]")
                .set_delay(Duration::from_millis(300)),
        )
        .mount(&server)
        .await;

    let client =
        asynchronous::HttpClient::new(config_for(&server).with_timeout(Duration::from_millis(30)))
            .unwrap();
    let result = client.get("/v1/kv/slow", Params::new()).await;

    assert!(matches!(result, Err(Error::Timeout)));
}

#[tokio::test]
async fn test_async_closed_client() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = asynchronous::HttpClient::new(config_for(&server)).unwrap();
    client.close();

    let result = client.get("/v1/agent/self", Params::new()).await;
    assert!(matches!(result, Err(Error::Closed)));
}

#[tokio::test]
async fn test_callback_delivers_response() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/catalog/datacenters"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!(["dc1", "dc2"]))
                .set_delay(Duration::from_millis(50)),
        )
        .mount(&server)
        .await;

    let config = config_for(&server);

    let (initial, finished, body) = tokio::task::spawn_blocking(move || {
        let client = callback::HttpClient::new(config).unwrap();
        let (tx, rx) = mpsc::channel();

        let handle = client.get("/v1/catalog/datacenters", Params::new(), move |result| {
            let _ = tx.send(result.map(|r| r.body));
        });

        let initial = handle.status();
        let finished = handle.wait();
        let body = rx.recv().unwrap().unwrap();
        (initial, finished, body)
    })
    .await
    .unwrap();

    assert_eq!(initial.state, RequestState::Pending);
    assert_eq!(finished.state, RequestState::Complete);
    assert_eq!(finished.id, initial.id);
    assert_eq!(body, r#"["dc1","dc2"]"#);
}

#[tokio::test]
async fn test_callback_wait_timeout() {
    let server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path("/v1/session/create"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(r#"{"ID": "adf4238a"}"#)
                .set_delay(Duration::from_millis(300)),
        )
        .mount(&server)
        .await;

    let config = config_for(&server);

    let (early, late) = tokio::task::spawn_blocking(move || {
        let client = callback::HttpClient::new(config).unwrap();
        let handle = client.put("/v1/session/create", Params::new(), Vec::new(), |_| {});
        let early = handle.wait_timeout(Duration::from_millis(10));
        let late = handle.wait_timeout(Duration::from_secs(5));
        (early, late)
    })
    .await
    .unwrap();

    assert!(early.is_none());
    assert!(late.unwrap().is_complete());
}

#[tokio::test]
async fn test_callback_failure() {
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };

    let (status, callback_saw_error) = tokio::task::spawn_blocking(move || {
        let client = callback::HttpClient::new(ClientConfig::new("127.0.0.1", port)).unwrap();
        let (tx, rx) = mpsc::channel();
        let handle = client.delete("/v1/kv/foo", Params::new(), move |result| {
            let _ = tx.send(result.is_err());
        });
        (handle.wait(), rx.recv().unwrap())
    })
    .await
    .unwrap();

    assert_eq!(status.state, RequestState::Failed);
    assert!(status.error.is_some());
    assert!(callback_saw_error);
}

async fn mount_synthesized_timeout(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/v1/health/service/web"))
        .respond_with(ResponseTemplate::new(599))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_async_status_599_is_timeout() {
    let server = MockServer::start().await;
    mount_synthesized_timeout(&server).await;

    let client = asynchronous::HttpClient::new(config_for(&server)).unwrap();
    let result = client.get("/v1/health/service/web", Params::new()).await;

    assert!(matches!(result, Err(Error::Timeout)));
}

#[tokio::test]
async fn test_callback_status_599_is_timeout() {
    let server = MockServer::start().await;
    mount_synthesized_timeout(&server).await;

    let config = config_for(&server);

    let (status, timed_out) = tokio::task::spawn_blocking(move || {
        let client = callback::HttpClient::new(config).unwrap();
        let (tx, rx) = mpsc::channel();
        let handle = client.get("/v1/health/service/web", Params::new(), move |result| {
            let _ = tx.send(matches!(result, Err(Error::Timeout)));
        });
        (handle.wait(), rx.recv().unwrap())
    })
    .await
    .unwrap();

    assert_eq!(status.state, RequestState::Failed);
    assert_eq!(status.error.as_deref(), Some("request timed out"));
    assert!(timed_out);
}
