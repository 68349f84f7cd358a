use massive_screener::{AppConfig, FetchError, MassiveClient};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config(server: &MockServer) -> AppConfig {
        AppConfig {
            api_key: Some("test-key".to_string()),
            screener_url: Some(format!("{}/v3/snapshot/options", server.uri())),
            timeout: Duration::from_millis(300),
            ..AppConfig::default()
        }
    }

    fn client(config: AppConfig) -> MassiveClient {
        MassiveClient::new(Arc::new(config)).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_sends_symbol_and_query() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v3/snapshot/options/QQQ"))
            .and(query_param("apiKey", "test-key"))
            .and(query_param("order", "asc"))
            .and(query_param("limit", "200"))
            .and(query_param("sort", "ticker"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": [], "status": "OK"})))
            .expect(1)
            .mount(&server)
            .await;

        let data = client(test_config(&server)).fetch_snapshot("QQQ").await.unwrap();
        assert_eq!(data["status"], "OK");
    }

    #[tokio::test]
    async fn test_blank_symbol_defaults_to_spy() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v3/snapshot/options/SPY"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(1)
            .mount(&server)
            .await;

        let data = client(test_config(&server)).fetch_snapshot("  ").await.unwrap();
        assert_eq!(data, json!([]));
    }

    #[tokio::test]
    async fn test_missing_api_key_skips_network() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(0)
            .mount(&server)
            .await;

        let config = AppConfig {
            api_key: None,
            ..test_config(&server)
        };
        let err = client(config).fetch_snapshot("SPY").await.unwrap_err();
        assert!(matches!(err, FetchError::ConfigMissing("MASSIVE_API_KEY")));
    }

    #[tokio::test]
    async fn test_missing_base_url() {
        let config = AppConfig {
            api_key: Some("k".to_string()),
            screener_url: None,
            ..AppConfig::default()
        };
        let err = client(config).fetch_snapshot("SPY").await.unwrap_err();
        assert_eq!(err.to_string(), "MASSIVE_SCREENER_URL is not set.");
    }

    #[tokio::test]
    async fn test_blank_base_url_from_env_is_missing() {
        let config = AppConfig::from_lookup(|name| match name {
            "MASSIVE_API_KEY" => Some("k".to_string()),
            "MASSIVE_SCREENER_URL" => Some("  ".to_string()),
            _ => None,
        });
        let err = client(config).fetch_snapshot("SPY").await.unwrap_err();
        assert!(matches!(err, FetchError::ConfigMissing("MASSIVE_SCREENER_URL")));
    }

    #[tokio::test]
    async fn test_timeout_is_distinguished() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([]))
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&server)
            .await;

        let err = client(test_config(&server)).fetch_snapshot("SPY").await.unwrap_err();
        assert!(matches!(err, FetchError::Timeout { .. }));
        assert!(err.to_string().contains("Timed out"));
        assert!(err.is_soft());
    }

    #[tokio::test]
    async fn test_http_error_is_request_failed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
            .mount(&server)
            .await;

        let err = client(test_config(&server)).fetch_snapshot("SPY").await.unwrap_err();
        match err {
            FetchError::RequestFailed(msg) => {
                assert!(msg.contains("403"));
                assert!(!msg.contains("test-key"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_scalar_json_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("42"))
            .mount(&server)
            .await;

        let err = client(test_config(&server)).fetch_snapshot("SPY").await.unwrap_err();
        assert!(matches!(err, FetchError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn test_non_json_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
            .mount(&server)
            .await;

        let err = client(test_config(&server)).fetch_snapshot("SPY").await.unwrap_err();
        assert!(matches!(err, FetchError::MalformedResponse(_)));
    }
}
