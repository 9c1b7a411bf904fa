use serde_json::json;
use smsgate::prelude::*;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tracing_test::traced_test;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config_for(smsc_endpoint: String, smstraffic_endpoint: String) -> AppConfig {
    let mut config = AppConfig::default();
    config.http.timeout_seconds = 5;
    config.providers.smsc.login = "acme".to_string();
    config.providers.smsc.password = "secret".to_string();
    config.providers.smsc.endpoint = smsc_endpoint;
    config.providers.smstraffic.endpoint = smstraffic_endpoint;
    config
}

fn refused_endpoint() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    format!("http://{}", listener.local_addr().unwrap())
}

#[tokio::test]
async fn test_non_record_request_is_user_data_error() {
    let registry = HandlerRegistry::from_config(&AppConfig::default());

    for input in [json!(null), json!("79990000000"), json!([])] {
        let result = registry.send_message("post.smsc.ru", &input).await.unwrap();
        assert_eq!(result, SendResult::error(None, ErrorCode::UserDataType));
    }
}

#[tokio::test]
async fn test_empty_record_reports_missing_phone() {
    let registry = HandlerRegistry::from_config(&AppConfig::default());

    let result = registry
        .send_message("post.smsc.ru", &json!({}))
        .await
        .unwrap();
    assert_eq!(result.error_code(), Some(ErrorCode::PhoneMissing));
    assert_eq!(result.phone(), None);
}

#[tokio::test]
async fn test_missing_text_keeps_phone() {
    let registry = HandlerRegistry::from_config(&AppConfig::default());

    let result = registry
        .send_message("post.smsc.ru", &json!({ "phone": "79990000000" }))
        .await
        .unwrap();
    assert_eq!(
        result,
        SendResult::Error {
            phone: Some("79990000000".to_string()),
            error_code: ErrorCode::TextMissing,
            error_msg: "Message text: missed".to_string(),
        }
    );
}

#[tokio::test]
async fn test_smstraffic_timeout_is_reported_once_without_retry() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = config_for(refused_endpoint(), server.uri());
    config.http.timeout_seconds = 1;
    let registry = HandlerRegistry::from_config(&config);

    let result = registry
        .send_message(
            "post.smstraffic.ru",
            &json!({ "phone": "79990000000", "text": "hi" }),
        )
        .await
        .unwrap();

    match result {
        SendResult::Error {
            phone,
            error_code,
            error_msg,
        } => {
            assert_eq!(phone.as_deref(), Some("79990000000"));
            assert_eq!(error_code, ErrorCode::ExternalApi);
            assert!(error_msg.starts_with("request timed out"), "{error_msg}");
        }
        ok => panic!("expected a transport failure, got {ok:?}"),
    }
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_smstraffic_connection_failure_is_external_error() {
    let config = config_for(refused_endpoint(), refused_endpoint());
    let registry = HandlerRegistry::from_config(&config);

    let result = registry
        .send_message(
            "post.smstraffic.ru",
            &json!({ "phone": "79990000000", "text": "hi" }),
        )
        .await
        .unwrap();
    assert_eq!(result.error_code(), Some(ErrorCode::ExternalApi));
    assert_eq!(result.phone(), Some("79990000000"));
}

#[tokio::test]
async fn test_smstraffic_posts_to_configured_gateway() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/multi.php"))
        .respond_with(ResponseTemplate::new(200).set_body_string("OK"))
        .expect(1)
        .mount(&server)
        .await;

    let config = config_for(refused_endpoint(), format!("{}/multi.php", server.uri()));
    let registry = HandlerRegistry::from_config(&config);

    let result = registry
        .send_message(
            "post.smstraffic.ru",
            &json!({ "phone": "79990000000", "text": "hi" }),
        )
        .await
        .unwrap();
    assert_eq!(result, SendResult::ok("79990000000"));
}

#[tokio::test]
async fn test_smsc_reply_length_decides_outcome() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/sys/send.php"))
        .respond_with(ResponseTemplate::new(200).set_body_string("17,1,1.80,98.20"))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/sys/send.php"))
        .respond_with(ResponseTemplate::new(200).set_body_string("0,-3"))
        .mount(&server)
        .await;

    let config = config_for(
        format!("{}/sys/send.php", server.uri()),
        refused_endpoint(),
    );
    let registry = HandlerRegistry::from_config(&config);
    let request = json!({ "phone": "79990000000", "text": "hi" });

    let accepted = registry.send_message("post.smsc.ru", &request).await.unwrap();
    assert!(accepted.is_ok());

    let refused = registry.send_message("post.smsc.ru", &request).await.unwrap();
    assert_eq!(
        refused,
        SendResult::external("79990000000", r#"["0", "-3"]"#)
    );
}

/// INFO-or-above lines tagged with `provider`, excluding the registry's init line.
fn send_lines<'a>(lines: &[&'a str], provider: &str) -> Vec<&'a str> {
    let tag = format!("provider=\"{provider}\"");
    lines
        .iter()
        .copied()
        .filter(|l| ["INFO", "WARN", "ERROR"].iter().any(|lvl| l.contains(lvl)))
        .filter(|l| l.contains(&tag) && !l.contains("handler initialized"))
        .collect()
}

#[tokio::test]
#[traced_test]
async fn test_successful_send_logs_one_line() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let registry = HandlerRegistry::from_config(&config_for(refused_endpoint(), server.uri()));
    registry
        .send_message(
            "post.smstraffic.ru",
            &json!({ "phone": "79990000000", "text": "привет" }),
        )
        .await
        .unwrap();

    logs_assert(|lines: &[&str]| {
        let sent = send_lines(lines, "post.smstraffic.ru");
        match sent.as_slice() {
            [line] if line.contains("12 bytes -> 79990000000") => Ok(()),
            other => Err(format!("expected one tagged success line, got {other:?}")),
        }
    });
}

#[tokio::test]
#[traced_test]
async fn test_failed_sends_log_one_line_each() {
    let registry =
        HandlerRegistry::from_config(&config_for(refused_endpoint(), refused_endpoint()));

    let rejected = registry
        .send_message("post.smstraffic.ru", &json!({ "phone": "79990000000" }))
        .await
        .unwrap();
    assert_eq!(rejected.error_code(), Some(ErrorCode::TextMissing));

    let failed = registry
        .send_message(
            "post.smstraffic.ru",
            &json!({ "phone": "79990000000", "text": "hi" }),
        )
        .await
        .unwrap();
    assert_eq!(failed.error_code(), Some(ErrorCode::ExternalApi));

    logs_assert(|lines: &[&str]| {
        let sent = send_lines(lines, "post.smstraffic.ru");
        match sent.as_slice() {
            [first, second]
                if first.contains("TextMissing")
                    && second.contains("ExternalApi")
                    && !sent.iter().any(|l| l.contains("bytes ->")) =>
            {
                Ok(())
            }
            other => Err(format!("expected two tagged error lines, got {other:?}")),
        }
    });
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_first_lookups_share_one_instance() {
    let constructed = Arc::new(AtomicUsize::new(0));
    let registry = Arc::new(HandlerRegistry::from_config(&AppConfig::default()).with(
        "post.smstraffic.ru",
        {
            let constructed = Arc::clone(&constructed);
            move || {
                constructed.fetch_add(1, Ordering::SeqCst);
                std::thread::sleep(std::time::Duration::from_millis(5));
                Ok(Arc::new(SmsTrafficHandler::new()) as Arc<dyn SmsHandler>)
            }
        },
    ));

    let tasks: Vec<_> = (0..16)
        .map(|_| {
            let registry = Arc::clone(&registry);
            tokio::spawn(async move { registry.get_handler("post.smstraffic.ru").unwrap() })
        })
        .collect();

    let handlers: Vec<Arc<dyn SmsHandler>> = futures::future::join_all(tasks)
        .await
        .into_iter()
        .map(|joined| joined.unwrap())
        .collect();

    assert_eq!(constructed.load(Ordering::SeqCst), 1);
    for handler in &handlers {
        assert!(Arc::ptr_eq(handler, &handlers[0]));
    }
}

#[tokio::test]
async fn test_global_facade_uses_installed_registry() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let config = config_for(refused_endpoint(), server.uri());
    assert!(install_global(HandlerRegistry::from_config(&config)).is_ok());

    let result = send_message(
        "post.smstraffic.ru",
        &json!({ "phone": "79990000000", "text": "hi" }),
    )
    .await
    .unwrap();
    assert!(result.is_ok());

    let err = send_message("post.unknown.ru", &json!({})).await.unwrap_err();
    assert!(matches!(err, HandlerError::NotFound(_)));
}
