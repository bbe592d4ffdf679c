//! Integration tests for the LuaDNS provider
//!
//! Uses wiremock to stand in for the LuaDNS REST API.

use std::sync::Arc;

use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use dns01_core::error::ProviderError;
use dns01_core::traits::{DnsProvider, DnsProviderFactory, NewRecord, RecordType, Zone};
use dns01_core::{
    ChallengeAction, ChallengeRequest, Error, MemorySecretStore, RecordReconciler, Solver,
    SolverConfig,
};
use dns01_provider_luadns::LuaDnsFactory;

const EMAIL: &str = "ops@example.com";
const API_KEY: &str = "luadns-api-key";
/// base64("ops@example.com:luadns-api-key")
const BASIC_AUTH: &str = "Basic b3BzQGV4YW1wbGUuY29tOmx1YWRucy1hcGkta2V5";

fn session(server: &MockServer) -> Box<dyn DnsProvider> {
    LuaDnsFactory::new(server.uri(), EMAIL)
        .unwrap()
        .connect(API_KEY)
        .unwrap()
}

fn zone() -> Zone {
    Zone {
        id: "42".to_string(),
        name: "example.com".to_string(),
    }
}

mod zones {
    use super::*;

    #[tokio::test]
    async fn test_list_zones_sends_query_and_credentials() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/zones"))
            .and(query_param("query", "example.com"))
            .and(header("authorization", BASIC_AUTH))
            .and(header("accept", "application/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"id": 7, "name": "sub.example.com"},
                {"id": 42, "name": "example.com", "template_id": null}
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let zones = session(&server).list_zones("example.com").await.unwrap();

        assert_eq!(zones.len(), 2);
        assert_eq!(zones[0].id, "7");
        assert_eq!(zones[1], zone());
    }

    #[tokio::test]
    async fn test_list_zones_unauthorized() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/zones"))
            .respond_with(ResponseTemplate::new(401).set_body_string("Unauthorized"))
            .mount(&server)
            .await;

        let err = session(&server).list_zones("example.com").await.unwrap_err();
        assert!(matches!(err, ProviderError::Authentication(_)));
    }

    #[tokio::test]
    async fn test_list_zones_invalid_body() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/zones"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "zones": []
            })))
            .mount(&server)
            .await;

        let err = session(&server).list_zones("example.com").await.unwrap_err();
        assert!(matches!(err, ProviderError::InvalidResponse(_)));
    }
}

mod records {
    use super::*;

    #[tokio::test]
    async fn test_list_records() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/zones/42/records"))
            .and(query_param("query", "_acme-challenge.example.com."))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"id": 100, "name": "_acme-challenge.example.com.", "type": "TXT",
                 "content": "abc123", "ttl": 60, "zone_id": 42},
                {"id": 101, "name": "_acme-challenge.example.com.", "type": "CNAME",
                 "content": "elsewhere.example.net.", "ttl": 3600, "zone_id": 42}
            ])))
            .mount(&server)
            .await;

        let records = session(&server)
            .list_records(&zone(), "_acme-challenge.example.com.")
            .await
            .unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, "100");
        assert_eq!(records[0].record_type, RecordType::Txt);
        assert_eq!(records[1].record_type, RecordType::Other("CNAME".to_string()));
    }

    #[tokio::test]
    async fn test_create_record_posts_txt_payload() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/zones/42/records"))
            .and(header("authorization", BASIC_AUTH))
            .and(body_json(serde_json::json!({
                "name": "_acme-challenge.example.com.",
                "type": "TXT",
                "content": "abc123",
                "ttl": 60
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": 555, "name": "_acme-challenge.example.com.", "type": "TXT",
                "content": "abc123", "ttl": 60, "zone_id": 42
            })))
            .expect(1)
            .mount(&server)
            .await;

        let record = session(&server)
            .create_record(
                &zone(),
                NewRecord::txt("_acme-challenge.example.com.", "abc123", 60),
            )
            .await
            .unwrap();

        assert_eq!(record.id, "555");
        assert_eq!(record.content, "abc123");
    }

    #[tokio::test]
    async fn test_create_record_rate_limited() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/zones/42/records"))
            .respond_with(ResponseTemplate::new(429))
            .expect(1)
            .mount(&server)
            .await;

        let err = session(&server)
            .create_record(&zone(), NewRecord::txt("x.example.com.", "v", 60))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::RateLimited(_)));
    }

    #[tokio::test]
    async fn test_delete_record_by_id() {
        let server = MockServer::start().await;

        Mock::given(method("DELETE"))
            .and(path("/zones/42/records/555"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": 555, "name": "_acme-challenge.example.com.", "type": "TXT",
                "content": "abc123", "ttl": 60, "zone_id": 42
            })))
            .expect(1)
            .mount(&server)
            .await;

        session(&server).delete_record(&zone(), "555").await.unwrap();
    }

    #[tokio::test]
    async fn test_delete_record_not_found_is_an_error() {
        let server = MockServer::start().await;

        Mock::given(method("DELETE"))
            .and(path("/zones/42/records/555"))
            .respond_with(ResponseTemplate::new(404).set_body_string("record not found"))
            .mount(&server)
            .await;

        let err = session(&server).delete_record(&zone(), "555").await.unwrap_err();
        assert_eq!(err, ProviderError::NotFound("record not found".to_string()));
    }

    #[tokio::test]
    async fn test_server_error_is_transient() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/zones/42/records"))
            .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
            .mount(&server)
            .await;

        let err = session(&server).list_records(&zone(), "x").await.unwrap_err();
        assert_eq!(err, ProviderError::Server("503 - maintenance".to_string()));
    }

    #[tokio::test]
    async fn test_other_status_is_api_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/zones/42/records"))
            .respond_with(ResponseTemplate::new(400).set_body_string("invalid ttl"))
            .mount(&server)
            .await;

        let err = session(&server)
            .create_record(&zone(), NewRecord::txt("x.example.com.", "v", 1))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            ProviderError::Api {
                status: 400,
                message: "invalid ttl".to_string()
            }
        );
    }
}

mod solver {
    use super::*;

    async fn reconciler(server: &MockServer) -> RecordReconciler {
        let secrets = MemorySecretStore::new();
        secrets
            .insert("cert-manager", "luadns-credentials", "api-key", API_KEY)
            .await;
        let factory = LuaDnsFactory::new(server.uri(), EMAIL).unwrap();
        RecordReconciler::with_secrets(Arc::new(factory), Arc::new(secrets))
    }

    fn request(action: ChallengeAction) -> ChallengeRequest {
        ChallengeRequest::new(action, "example.com.", "_acme-challenge.example.com.", "abc123")
            .with_namespace("cert-manager")
            .with_config(SolverConfig::new("luadns-credentials", "api-key").to_json())
    }

    async fn mount_zones(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/zones"))
            .and(query_param("query", "example.com"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"id": 7, "name": "sub.example.com"},
                {"id": 42, "name": "example.com"}
            ])))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_present_creates_record_in_exact_zone() {
        let server = MockServer::start().await;
        mount_zones(&server).await;

        Mock::given(method("GET"))
            .and(path("/zones/42/records"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/zones/42/records"))
            .and(body_json(serde_json::json!({
                "name": "_acme-challenge.example.com.",
                "type": "TXT",
                "content": "abc123",
                "ttl": 60
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": 555, "name": "_acme-challenge.example.com.", "type": "TXT",
                "content": "abc123", "ttl": 60
            })))
            .expect(1)
            .mount(&server)
            .await;

        reconciler(&server)
            .await
            .present(&request(ChallengeAction::Present))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_clean_up_deletes_only_matching_record() {
        let server = MockServer::start().await;
        mount_zones(&server).await;

        Mock::given(method("GET"))
            .and(path("/zones/42/records"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"id": 554, "name": "_acme-challenge.example.com.", "type": "TXT",
                 "content": "other-token", "ttl": 60},
                {"id": 555, "name": "_acme-challenge.example.com.", "type": "TXT",
                 "content": "abc123", "ttl": 60}
            ])))
            .mount(&server)
            .await;

        Mock::given(method("DELETE"))
            .and(path("/zones/42/records/555"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": 555, "name": "_acme-challenge.example.com.", "type": "TXT",
                "content": "abc123", "ttl": 60
            })))
            .expect(1)
            .mount(&server)
            .await;

        reconciler(&server)
            .await
            .clean_up(&request(ChallengeAction::CleanUp))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_missing_zone_makes_no_record_calls() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/zones"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"id": 7, "name": "sub.example.com"}
            ])))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/zones/7/records"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .expect(0)
            .mount(&server)
            .await;

        let err = reconciler(&server)
            .await
            .present(&request(ChallengeAction::Present))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ZoneNotFound { .. }));
    }
}
