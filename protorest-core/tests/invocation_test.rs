use http::Method;
use mock_transport::{MockTransport, response, response_with_server};
use prost::Message;
use prost_reflect::{DescriptorPool, DynamicMessage, Value};
use protorest_core::binding::{Arg, ConfigurationError, MethodBinding, ResponseShape, ValueShape};
use protorest_core::client::{InvokeError, RestClient};
use protorest_core::codec::MediaType;
use protorest_core::config::{ServiceConfigurator, StaticServiceConfig};
use protorest_core::transport::HttpResponse;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};


const BASE: &str = "http://tester.local/api";

fn client(transport: &MockTransport, pool: &DescriptorPool) -> RestClient<MockTransport> {
    let config = StaticServiceConfig::new().with_service("tester", BASE);
    RestClient::new(transport.clone(), config, pool.clone())
}

fn get_tester() -> MethodBinding {
    MethodBinding::new("tester", "getTester", ResponseShape::message("tester.Tester"))
        .with_pattern("/testers/${id}")
        .required_param("id")
}

#[tokio::test]
async fn get_decodes_a_protobuf_message() {
    let pool = tester_service::descriptor_pool();
    let msg = tester_service::tester(&pool, 5, "alice");

    let transport = MockTransport::new();
    transport.enqueue(response(200, msg.encode_to_vec()));
    let mut client = client(&transport, &pool);
    client.register(get_tester());

    let outcome = client
        .invoke("getTester", vec![Arg::scalar(5)])
        .await
        .unwrap();
    assert_eq!(outcome.into_message().unwrap(), msg);

    let requests = transport.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method(), &Method::GET);
    assert_eq!(requests[0].url(), "http://tester.local/api/testers/5?");
    assert_eq!(requests[0].accept(), MediaType::Protobuf);
    assert!(requests[0].body().is_none());
}

#[tokio::test]
async fn missing_required_parameter_fails_before_any_transport_call() {
    let pool = tester_service::descriptor_pool();
    let transport = MockTransport::new();
    let mut client = client(&transport, &pool);
    client.register(get_tester());

    let result = client.invoke("getTester", vec![Arg::absent()]).await;

    assert!(matches!(
        result,
        Err(InvokeError::Configuration(
            ConfigurationError::MissingRequiredParam(name)
        )) if name == "id"
    ));
    assert_eq!(transport.request_count(), 0);
}

#[tokio::test]
async fn missing_base_url_fails_before_any_transport_call() {
    let pool = tester_service::descriptor_pool();
    let transport = MockTransport::new();
    let mut client = RestClient::new(transport.clone(), StaticServiceConfig::new(), pool);
    client.register(get_tester());

    let result = client.invoke("getTester", vec![Arg::scalar(1)]).await;

    assert!(matches!(
        result,
        Err(InvokeError::Configuration(
            ConfigurationError::MissingBaseUrl(service)
        )) if service == "tester"
    ));
    assert_eq!(transport.request_count(), 0);
}

#[tokio::test]
async fn payload_disables_query_string_generation() {
    let pool = tester_service::descriptor_pool();
    let msg = tester_service::tester(&pool, 9, "bob");

    let transport = MockTransport::new();
    let mut client = client(&transport, &pool);
    client.register(
        MethodBinding::new("tester", "createTester", ResponseShape::unit())
            .with_pattern("/groups/${group}/testers")
            .param("group")
            .body_param(),
    );

    let outcome = client
        .invoke(
            "createTester",
            vec![Arg::scalar("blue"), Arg::message(msg.clone())],
        )
        .await
        .unwrap();
    assert!(outcome.into_value().unwrap().is_empty());

    let requests = transport.requests();
    assert_eq!(
        requests[0].url(),
        "http://tester.local/api/groups/blue/testers"
    );
    assert_eq!(requests[0].method(), &Method::POST);
    assert_eq!(
        requests[0].body().map(|b| b.to_vec()),
        Some(msg.encode_to_vec())
    );
}

#[tokio::test]
async fn a_sole_message_argument_is_the_implicit_payload() {
    let pool = tester_service::descriptor_pool();
    let msg = tester_service::tester(&pool, 1, "solo");

    let transport = MockTransport::new();
    let mut client = client(&transport, &pool);
    client.register(
        MethodBinding::new("tester", "createSolo", ResponseShape::unit()).unbound_param(),
    );

    client
        .invoke("createSolo", vec![Arg::message(msg.clone())])
        .await
        .unwrap();

    let requests = transport.requests();
    assert_eq!(requests[0].url(), BASE);
    assert_eq!(
        requests[0].body().map(|b| b.to_vec()),
        Some(msg.encode_to_vec())
    );
}

#[tokio::test]
async fn empty_body_yields_the_canonical_default_instance() {
    let pool = tester_service::descriptor_pool();

    let transport = MockTransport::new();
    transport.enqueue(response(200, ""));
    let mut client = client(&transport, &pool);
    client.register(get_tester());

    let outcome = client
        .invoke("getTester", vec![Arg::scalar(1)])
        .await
        .unwrap();
    let decoded = outcome.into_message().unwrap();

    assert_eq!(
        decoded,
        DynamicMessage::new(tester_service::tester_descriptor(&pool))
    );
}

#[tokio::test]
async fn error_status_raises_invocation_failed_after_callbacks_ran() {
    let pool = tester_service::descriptor_pool();

    let transport = MockTransport::new();
    transport.enqueue(response_with_server(404, "nginx"));
    let mut client = client(&transport, &pool);
    client.register(get_tester());

    let seen = Arc::new(AtomicBool::new(false));
    let flag = seen.clone();
    let callback = Arc::new(move |_: &HttpResponse| flag.store(true, Ordering::SeqCst));

    let result = client
        .invoke("getTester", vec![Arg::scalar(1), Arg::callback(callback)])
        .await;

    match result {
        Err(InvokeError::Failed(failed)) => {
            assert_eq!(failed.status, 404);
            assert_eq!(failed.status_text, "Not Found");
            assert_eq!(failed.server.as_deref(), Some("nginx"));
        }
        other => panic!("expected InvocationFailed, got {other:?}"),
    }
    assert!(seen.load(Ordering::SeqCst), "callback must observe the raw response");
}

#[tokio::test]
async fn raw_shape_skips_status_validation() {
    let pool = tester_service::descriptor_pool();

    let transport = MockTransport::new();
    transport.enqueue(response(404, "missing"));
    let mut client = client(&transport, &pool);
    client.register(
        MethodBinding::new("tester", "getTesterResponse", ResponseShape::Raw)
            .with_pattern("/testers/${id}")
            .param("id"),
    );

    let outcome = client
        .invoke("getTesterResponse", vec![Arg::scalar(1)])
        .await
        .unwrap();
    let raw = outcome.into_raw().unwrap();

    assert_eq!(raw.status().as_u16(), 404);
    assert_eq!(raw.body(), b"missing");
}

#[tokio::test]
async fn extension_fields_survive_a_decode_through_the_pool() {
    let pool = tester_service::descriptor_pool();
    let nickname = tester_service::nickname_extension(&pool);
    let mut msg = tester_service::tester(&pool, 7, "dave");
    msg.set_extension(&nickname, Value::String("dv".to_string()));

    let transport = MockTransport::new();
    transport.enqueue(response(200, msg.encode_to_vec()));
    let mut client = client(&transport, &pool);
    client.register(get_tester());

    let decoded = client
        .invoke("getTester", vec![Arg::scalar(7)])
        .await
        .unwrap()
        .into_message()
        .unwrap();

    assert_eq!(
        decoded.get_extension(&nickname).as_ref(),
        &Value::String("dv".to_string())
    );
    assert_eq!(decoded, msg);
}

#[tokio::test]
async fn json_media_decodes_into_the_declared_message() {
    let pool = tester_service::descriptor_pool();

    let transport = MockTransport::new();
    transport.enqueue(response(200, r#"{"id":3,"name":"carol"}"#));
    let mut client = client(&transport, &pool);
    client.register(
        MethodBinding::new("tester", "getJsonTester", ResponseShape::message("tester.Tester"))
            .with_pattern("/testers/${id}")
            .param("id")
            .with_accept(MediaType::Json),
    );

    let decoded = client
        .invoke("getJsonTester", vec![Arg::scalar(3)])
        .await
        .unwrap()
        .into_message()
        .unwrap();

    assert_eq!(decoded.get_field_by_name("id").unwrap().as_ref(), &Value::I32(3));
    assert_eq!(
        decoded.get_field_by_name("name").unwrap().as_ref(),
        &Value::String("carol".to_string())
    );
    assert_eq!(transport.requests()[0].accept(), MediaType::Json);
}

#[tokio::test]
async fn text_shape_returns_the_body_as_a_string() {
    let pool = tester_service::descriptor_pool();

    let transport = MockTransport::new();
    transport.enqueue(response(200, "pong"));
    let mut client = client(&transport, &pool);
    client.register(
        MethodBinding::new("tester", "getPing", ResponseShape::text())
            .with_pattern("/ping")
            .with_accept(MediaType::Text),
    );

    let outcome = client.invoke("getPing", vec![]).await.unwrap();
    assert_eq!(outcome.into_text().unwrap(), "pong");
}

#[tokio::test]
async fn text_shape_with_binary_media_is_a_configuration_error() {
    let pool = tester_service::descriptor_pool();
    let transport = MockTransport::new();
    let mut client = client(&transport, &pool);
    client.register(MethodBinding::new("tester", "getLabel", ResponseShape::text()));

    let result = client.invoke("getLabel", vec![]).await;

    assert!(matches!(
        result,
        Err(InvokeError::Configuration(
            ConfigurationError::TextWithBinaryMedia(MediaType::Protobuf)
        ))
    ));
    assert_eq!(transport.request_count(), 0);
}

#[tokio::test]
async fn unknown_message_type_is_a_configuration_error() {
    let pool = tester_service::descriptor_pool();
    let transport = MockTransport::new();
    let mut client = client(&transport, &pool);
    client.register(MethodBinding::new(
        "tester",
        "getMissing",
        ResponseShape::message("tester.Missing"),
    ));

    let result = client.invoke("getMissing", vec![]).await;

    assert!(matches!(
        result,
        Err(InvokeError::Configuration(
            ConfigurationError::UnknownMessageType(name)
        )) if name == "tester.Missing"
    ));
    assert_eq!(transport.request_count(), 0);
}

#[tokio::test]
async fn unregistered_methods_are_rejected() {
    let pool = tester_service::descriptor_pool();
    let client = client(&MockTransport::new(), &pool);

    let result = client.invoke("getNobody", vec![]).await;
    assert!(matches!(result, Err(InvokeError::UnknownMethod(name)) if name == "getNobody"));
}

#[tokio::test]
async fn callbacks_run_most_recently_added_first() {
    let pool = tester_service::descriptor_pool();
    let transport = MockTransport::new();
    let mut client = client(&transport, &pool);
    client.register(MethodBinding::new("tester", "getNothing", ResponseShape::unit()));

    let order = Arc::new(std::sync::Mutex::new(Vec::new()));
    let first = order.clone();
    let second = order.clone();

    client
        .invoke(
            "getNothing",
            vec![
                Arg::callback(Arc::new(move |_: &HttpResponse| {
                    first.lock().unwrap().push("A")
                })),
                Arg::callback(Arc::new(move |_: &HttpResponse| {
                    second.lock().unwrap().push("B")
                })),
            ],
        )
        .await
        .unwrap();

    assert_eq!(*order.lock().unwrap(), vec!["B", "A"]);
}

#[tokio::test]
async fn service_configuration_is_resolved_once_per_service() {
    struct CountingConfig {
        calls: Arc<AtomicUsize>,
    }

    impl ServiceConfigurator for CountingConfig {
        fn base_url(&self, _service: &str) -> Option<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Some(BASE.to_string())
        }

        fn timeout_seconds(&self, _service: &str) -> Option<u64> {
            None
        }
    }

    let pool = tester_service::descriptor_pool();
    let calls = Arc::new(AtomicUsize::new(0));
    let transport = MockTransport::new();
    let mut client = RestClient::new(
        transport.clone(),
        CountingConfig { calls: calls.clone() },
        pool,
    );
    client.register(MethodBinding::new("tester", "getNothing", ResponseShape::unit()));

    client.invoke("getNothing", vec![]).await.unwrap();
    client.invoke("getNothing", vec![]).await.unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(transport.request_count(), 2);
}

#[tokio::test]
async fn deferred_unit_shape_is_accepted() {
    let pool = tester_service::descriptor_pool();
    let transport = MockTransport::new();
    let mut client = client(&transport, &pool);
    client.register(MethodBinding::new(
        "tester",
        "updateNothing",
        ResponseShape::Deferred(ValueShape::Unit),
    ));

    let outcome = client.invoke("updateNothing", vec![]).await.unwrap();
    let handle = outcome.into_deferred().unwrap();
    assert!(handle.value().await.unwrap().is_empty());
}
