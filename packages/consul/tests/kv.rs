use consul::dispatch::Blocking;
use consul::{
    Consul, ConsulConfig, Error, KvDeleteOptions, KvPutOptions, QueryOptions, WriteOptions,
};
use consul_http::mock::MockExecutor;
use consul_http::{HttpResponse, Method};
use serde_json::json;

fn client(mock: &MockExecutor, config: ConsulConfig) -> Consul<Blocking<MockExecutor>> {
    Consul::with_dispatcher(Blocking::new(mock.clone()), config)
}

fn indexed(code: u16, index: u64, body: serde_json::Value) -> HttpResponse {
    HttpResponse::new(code, body.to_string()).with_header("X-Consul-Index", index.to_string())
}

#[test]
fn test_get_existing_key() {
    let mock = MockExecutor::new().with_response(
        "/v1/kv/app/mode",
        indexed(
            200,
            17,
            json!([{
                "Key": "app/mode",
                "Value": "Z3JlZW4=",
                "Flags": 0,
                "LockIndex": 0,
                "CreateIndex": 12,
                "ModifyIndex": 17
            }]),
        ),
    );
    let consul = client(&mock, ConsulConfig::default().with_token("secret"));

    let entry = consul.kv().get("app/mode", &QueryOptions::new()).unwrap();

    assert_eq!(entry.index, 17);
    let pair = entry.value.unwrap();
    assert_eq!(pair.value_str(), Some("green"));
    assert_eq!(pair.modify_index, 17);

    let request = mock.last_request().unwrap();
    assert_eq!(request.method, Method::GET);
    assert_eq!(request.path, "/v1/kv/app/mode");
    assert_eq!(
        request.headers.get("X-Consul-Token").map(String::as_str),
        Some("secret")
    );
}

#[test]
fn test_get_missing_key_is_none() {
    let mock = MockExecutor::new().with_response(
        "/v1/kv/missing",
        HttpResponse::new(404, "").with_header("X-Consul-Index", "5"),
    );
    let consul = client(&mock, ConsulConfig::default());

    let entry = consul.kv().get("missing", &QueryOptions::new()).unwrap();
    assert_eq!(entry.index, 5);
    assert!(entry.value.is_none());
}

#[test]
fn test_get_blocking_query_params() {
    let mock = MockExecutor::new().with_response("/v1/kv/app", indexed(200, 30, json!([])));
    let consul = client(&mock, ConsulConfig::default());

    let options = QueryOptions::blocking(29, std::time::Duration::from_secs(60)).with_dc("dc2");
    consul.kv().get("app", &options).unwrap();

    let request = mock.last_request().unwrap();
    assert_eq!(request.params.get("dc"), Some("dc2"));
    assert_eq!(request.params.get("index"), Some("29"));
    assert_eq!(request.params.get("wait"), Some("60s"));
}

#[test]
fn test_list_prefix() {
    let mock = MockExecutor::new().with_response(
        "/v1/kv/app/",
        indexed(
            200,
            40,
            json!([
                {"Key": "app/a", "Value": "MQ==", "ModifyIndex": 39},
                {"Key": "app/b", "Value": null, "ModifyIndex": 40}
            ]),
        ),
    );
    let consul = client(&mock, ConsulConfig::default());

    let entries = consul.kv().list("app/", &QueryOptions::new()).unwrap();

    assert_eq!(entries.index, 40);
    assert_eq!(entries.value.len(), 2);
    assert_eq!(entries.value[0].value_str(), Some("1"));
    assert!(entries.value[1].value.is_none());
    assert!(mock.last_request().unwrap().params.contains("recurse"));
}

#[test]
fn test_list_missing_prefix_is_empty() {
    let mock = MockExecutor::new().with_response(
        "/v1/kv/nothing/",
        HttpResponse::new(404, "").with_header("X-Consul-Index", "3"),
    );
    let consul = client(&mock, ConsulConfig::default());

    let entries = consul.kv().list("nothing/", &QueryOptions::new()).unwrap();
    assert_eq!(entries.index, 3);
    assert!(entries.value.is_empty());
}

#[test]
fn test_keys_with_separator() {
    let mock = MockExecutor::new().with_response(
        "/v1/kv/app/",
        indexed(200, 8, json!(["app/a", "app/config/"])),
    );
    let consul = client(&mock, ConsulConfig::default());

    let keys = consul
        .kv()
        .keys("app/", Some("/"), &QueryOptions::new())
        .unwrap();

    assert_eq!(keys.value, vec!["app/a", "app/config/"]);
    let request = mock.last_request().unwrap();
    assert!(request.params.contains("keys"));
    assert_eq!(request.params.get("separator"), Some("/"));
}

#[test]
fn test_put_sends_raw_value() {
    let mock = MockExecutor::new().with_response("/v1/kv/app/mode", HttpResponse::new(200, "true"));
    let consul = client(&mock, ConsulConfig::default().with_dc("dc1"));

    let written = consul
        .kv()
        .put("app/mode", "blue", &KvPutOptions::default())
        .unwrap();

    assert!(written);
    let request = mock.last_request().unwrap();
    assert_eq!(request.method, Method::PUT);
    assert_eq!(request.body.as_deref(), Some(&b"blue"[..]));
    assert_eq!(request.params.get("dc"), Some("dc1"));
}

#[test]
fn test_put_check_and_set_lost() {
    let mock = MockExecutor::new().with_response("/v1/kv/lock", HttpResponse::new(200, "false"));
    let consul = client(&mock, ConsulConfig::default());

    let options = KvPutOptions {
        cas: Some(0),
        flags: Some(7),
        acquire: Some("adf4238a".to_string()),
        write: WriteOptions::new().with_token("writer"),
        ..Default::default()
    };
    let written = consul.kv().put("lock", Vec::<u8>::new(), &options).unwrap();

    assert!(!written);
    let request = mock.last_request().unwrap();
    assert_eq!(request.params.get("cas"), Some("0"));
    assert_eq!(request.params.get("flags"), Some("7"));
    assert_eq!(request.params.get("acquire"), Some("adf4238a"));
    assert_eq!(
        request.headers.get("X-Consul-Token").map(String::as_str),
        Some("writer")
    );
}

#[test]
fn test_delete_recurse() {
    let mock = MockExecutor::new().with_response("/v1/kv/app/", HttpResponse::new(200, "true"));
    let consul = client(&mock, ConsulConfig::default());

    let options = KvDeleteOptions {
        recurse: true,
        ..Default::default()
    };
    assert!(consul.kv().delete("app/", &options).unwrap());

    let request = mock.last_request().unwrap();
    assert_eq!(request.method, Method::DELETE);
    assert!(request.params.contains("recurse"));
}

#[test]
fn test_leading_slash_fails_without_request() {
    let mock = MockExecutor::new();
    let consul = client(&mock, ConsulConfig::default());

    let result = consul.kv().put("/app", "x", &KvPutOptions::default());

    assert!(matches!(result, Err(Error::InvalidArgument { .. })));
    assert!(mock.recorded_requests().is_empty());
}

#[test]
fn test_dot_segments_fail_without_request() {
    let mock = MockExecutor::new();
    let consul = client(&mock, ConsulConfig::default());

    let result = consul.kv().get("a/../b", &QueryOptions::new());
    assert!(matches!(result, Err(Error::InvalidArgument { .. })));

    let result = consul.kv().delete("./app", &KvDeleteOptions::default());
    assert!(matches!(result, Err(Error::InvalidArgument { .. })));

    assert!(mock.recorded_requests().is_empty());

    // dots inside a segment are ordinary key characters
    let result = consul.kv().get("app/v1.2/..hidden", &QueryOptions::new());
    assert!(!matches!(result, Err(Error::InvalidArgument { .. })));
    assert_eq!(
        mock.last_request().unwrap().path,
        "/v1/kv/app/v1.2/..hidden"
    );
}

#[test]
fn test_permission_denied() {
    let mock = MockExecutor::new().with_response(
        "/v1/kv/secret",
        HttpResponse::new(403, "Permission denied"),
    );
    let consul = client(&mock, ConsulConfig::default());

    let result = consul.kv().get("secret", &QueryOptions::new());
    match result {
        Err(Error::PermissionDenied(body)) => assert_eq!(body, "Permission denied"),
        other => panic!("expected PermissionDenied, got {:?}", other),
    }
}

#[test]
fn test_server_error() {
    let mock = MockExecutor::new().with_response(
        "/v1/kv/app",
        HttpResponse::new(500, "rpc error: No cluster leader"),
    );
    let consul = client(&mock, ConsulConfig::default());

    let error = consul.kv().get("app", &QueryOptions::new()).unwrap_err();
    assert!(matches!(error, Error::Server { code: 500, .. }));
    assert_eq!(error.to_string(), "500 rpc error: No cluster leader");
}
