use std::collections::HashMap;
use std::fs;
use std::sync::Arc;

use jido_keyring::{ContextId, Keyring, KeyringOptions, Value};
use jido_provider::providers::{AnthropicAdapter, OpenAIAdapter};
use jido_provider::{
    BuildOptions, Error, ModelQuery, ProviderAdapter, ProviderRegistry, RequestOptions,
};

fn keyring(entries: &[(&str, &str)]) -> Arc<Keyring> {
    let base: HashMap<String, Value> = entries
        .iter()
        .map(|(k, v)| (k.to_string(), Value::from(*v)))
        .collect();
    Arc::new(Keyring::from_base("provider-it", base))
}

fn query(url: &str) -> ModelQuery {
    ModelQuery::refresh().with_request(RequestOptions::new().base_url(url))
}

#[tokio::test]
async fn refresh_fetches_and_caches_the_listing() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/models")
        .match_header("x-api-key", "sk-ant")
        .match_header("anthropic-version", "2023-06-01")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"data":[
                {"id":"claude-new-model","display_name":"Claude New","type":"model"},
                {"id":"claude-3-5-haiku-latest","display_name":"Claude Haiku 3.5","type":"model"}
            ]}"#,
        )
        .create_async()
        .await;

    let adapter = AnthropicAdapter::new(keyring(&[("ANTHROPIC_API_KEY", "sk-ant")]));

    let builtin = adapter.list_models(&ModelQuery::new()).await.unwrap();
    assert!(builtin.iter().all(|m| m.id != "claude-new-model"));

    let fetched = adapter.list_models(&query(&server.url())).await.unwrap();
    assert_eq!(fetched.len(), 2);
    mock.assert_async().await;

    // Later reads come from the cache without another request.
    let cached = adapter.list_models(&ModelQuery::new()).await.unwrap();
    assert_eq!(cached, fetched);
    let model = adapter
        .model("anthropic/claude-new-model", &ModelQuery::new())
        .await
        .unwrap();
    assert_eq!(model.display_name(), "Claude New");
}

#[tokio::test]
async fn error_statuses_become_api_errors() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/models")
        .match_header("authorization", "Bearer sk-bad")
        .with_status(401)
        .with_body(r#"{"error":{"message":"Incorrect API key provided"}}"#)
        .create_async()
        .await;

    let adapter = OpenAIAdapter::new(keyring(&[("openai_api_key", "sk-bad")]));
    match adapter.list_models(&query(&server.url())).await {
        Err(Error::Api { status, body }) => {
            assert_eq!(status, 401);
            assert!(body.contains("Incorrect API key"));
        }
        other => panic!("unexpected result: {other:?}"),
    }
    mock.assert_async().await;

    // A failed refresh leaves the built-in catalog in place.
    let models = adapter.list_models(&ModelQuery::new()).await.unwrap();
    assert!(models.iter().any(|m| m.id == "gpt-4o"));
}

#[tokio::test]
async fn malformed_listings_are_parse_errors() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/models")
        .with_status(200)
        .with_body("not json")
        .create_async()
        .await;

    let adapter = OpenAIAdapter::new(keyring(&[("openai_api_key", "sk")]));
    assert!(matches!(
        adapter.list_models(&query(&server.url())).await,
        Err(Error::Parse(_))
    ));
}

#[tokio::test]
async fn refresh_without_a_key_fails_before_any_request() {
    let adapter = OpenAIAdapter::new(keyring(&[]));
    assert!(matches!(
        adapter.list_models(&query("http://127.0.0.1:9")).await,
        Err(Error::MissingApiKey { .. })
    ));
}

#[tokio::test]
async fn unknown_models_are_not_found() {
    let adapter = OpenAIAdapter::new(keyring(&[]));
    assert!(matches!(
        adapter.model("gpt-9-ultra", &ModelQuery::new()).await,
        Err(Error::ModelNotFound { provider, model }) if provider == "openai" && model == "gpt-9-ultra"
    ));
    assert!(matches!(
        adapter.model("llama-3", &ModelQuery::new()).await,
        Err(Error::InvalidModelId { .. })
    ));
}

#[tokio::test]
async fn registry_fetches_through_the_named_provider() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/models/search")
        .match_header("authorization", "Bearer cf-key")
        .with_status(200)
        .with_body(
            r#"{"success":true,"result":[
                {"name":"@cf/qwen/qwen1.5-14b-chat-awq","task":{"name":"Text Generation"}}
            ]}"#,
        )
        .create_async()
        .await;

    let registry = ProviderRegistry::builtin(keyring(&[("cloudflare_api_key", "cf-key")]));
    let model = registry
        .model("cloudflare:qwen/qwen1.5-14b-chat-awq", &query(&server.url()))
        .await
        .unwrap();
    assert_eq!(model.id, "@cf/qwen/qwen1.5-14b-chat-awq");
    mock.assert_async().await;

    let cloudflare = registry.get("cloudflare").unwrap();
    assert!(cloudflare.normalize("qwen/qwen1.5-14b-chat-awq", &Default::default()).is_ok());
}

#[test]
fn credentials_resolve_from_env_files_and_session_overrides() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join(".env"), "ANTHROPIC_API_KEY=sk-file\n").unwrap();

    let keyring = Arc::new(
        Keyring::load(
            KeyringOptions::new("provider-env-it")
                .env_dir(dir.path())
                .environment("test")
                .include_process_env(false),
        )
        .unwrap(),
    );
    let registry = ProviderRegistry::builtin(keyring.clone());

    let base = registry
        .build_from_string("anthropic:claude-3-5-haiku-latest", BuildOptions::default())
        .unwrap();
    assert_eq!(base.api_key.as_deref(), Some("sk-file"));

    let session = keyring.scoped_session();
    session.set_override("anthropic_api_key", "sk-session").unwrap();
    let scoped = registry
        .build_from_string(
            "anthropic:claude-3-5-haiku-latest",
            BuildOptions::default().context(session.context()),
        )
        .unwrap();
    assert_eq!(scoped.api_key.as_deref(), Some("sk-session"));

    let other = registry
        .build_from_string(
            "anthropic:claude-3-5-haiku-latest",
            BuildOptions::default().context(ContextId::new()),
        )
        .unwrap();
    assert_eq!(other.api_key.as_deref(), Some("sk-file"));
}
