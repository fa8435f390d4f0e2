use anyhow::Context;
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use super::{ActorRun, JobBackend};
use crate::config::ApifyConfig;
use crate::{Result, TranscriptError};

/// Apify wraps single objects in `{"data": ...}`
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(rename = "type")]
    kind: Option<String>,
    message: String,
}

/// Job backend talking to the Apify REST API
pub struct ApifyClient {
    client: Client,
    api_url: String,
    token: String,
    wait_for_finish_secs: u64,
}

impl ApifyClient {
    pub fn new(api_url: impl Into<String>, token: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("social-transcript/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
            wait_for_finish_secs: 60,
        })
    }

    /// Build the client from configuration. Fails when no token is configured.
    pub fn from_config(config: &ApifyConfig) -> Result<Self> {
        Ok(Self::new(&config.api_url, config.token()?)?.with_wait_for_finish(config.wait_for_finish_secs))
    }

    pub fn with_wait_for_finish(mut self, secs: u64) -> Self {
        self.wait_for_finish_secs = secs;
        self
    }

    /// `owner/name` actor ids are addressed as `owner~name` in URLs
    fn actor_path(actor_id: &str) -> String {
        urlencoding::encode(&actor_id.replace('/', "~")).into_owned()
    }

    async fn start_run(&self, actor_id: &str, input: &Value) -> Result<ActorRun> {
        let url = format!("{}/v2/acts/{}/runs", self.api_url, Self::actor_path(actor_id));
        tracing::debug!("Starting actor {}", actor_id);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .query(&[("waitForFinish", self.wait_for_finish_secs)])
            .json(input)
            .send()
            .await
            .map_err(|e| TranscriptError::Backend(format!("Failed to start actor {actor_id}: {e}")))?;

        Self::read_data(response).await
    }

    async fn get_run(&self, run_id: &str) -> Result<ActorRun> {
        let url = format!("{}/v2/actor-runs/{}", self.api_url, urlencoding::encode(run_id));

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .query(&[("waitForFinish", self.wait_for_finish_secs)])
            .send()
            .await
            .map_err(|e| TranscriptError::Backend(format!("Failed to check run {run_id}: {e}")))?;

        Self::read_data(response).await
    }

    async fn read_data<T: DeserializeOwned>(response: Response) -> Result<T> {
        let response = Self::check_status(response).await?;
        let envelope: Envelope<T> = response
            .json()
            .await
            .context("Failed to decode backend response")?;
        Ok(envelope.data)
    }

    async fn check_status(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let detail = match serde_json::from_str::<ApiErrorBody>(&body) {
            Ok(parsed) => match parsed.error.kind {
                Some(kind) => format!("{} ({})", parsed.error.message, kind),
                None => parsed.error.message,
            },
            Err(_) => body.trim().to_string(),
        };

        Err(TranscriptError::Backend(format!("HTTP {status}: {detail}")).into())
    }
}

#[async_trait]
impl JobBackend for ApifyClient {
    async fn call_actor(&self, actor_id: &str, input: Value) -> Result<ActorRun> {
        let mut run = self.start_run(actor_id, &input).await?;
        let mut check_count = 0;

        while !run.is_terminal() {
            check_count += 1;
            tracing::debug!("Run {} is {} (check #{})", run.id, run.status, check_count);
            run = self.get_run(&run.id).await?;
        }

        if !run.succeeded() {
            return Err(TranscriptError::Backend(format!(
                "Actor {} run {} finished with status {}",
                actor_id, run.id, run.status
            ))
            .into());
        }

        tracing::info!("Actor {} run {} succeeded", actor_id, run.id);
        Ok(run)
    }

    async fn dataset_items(&self, dataset_id: &str) -> Result<Vec<Value>> {
        let url = format!(
            "{}/v2/datasets/{}/items",
            self.api_url,
            urlencoding::encode(dataset_id)
        );

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .query(&[("clean", "true"), ("format", "json")])
            .send()
            .await
            .map_err(|e| TranscriptError::Backend(format!("Failed to read dataset {dataset_id}: {e}")))?;

        let items: Vec<Value> = Self::check_status(response)
            .await?
            .json()
            .await
            .context("Failed to decode dataset items")?;

        tracing::debug!("Dataset {} returned {} item(s)", dataset_id, items.len());
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn run_body(id: &str, status: &str) -> Value {
        json!({ "data": { "id": id, "status": status, "defaultDatasetId": "ds1" } })
    }

    #[test]
    fn test_actor_path() {
        assert_eq!(ApifyClient::actor_path("clockworks/tiktok-scraper"), "clockworks~tiktok-scraper");
        assert_eq!(ApifyClient::actor_path("GdWCkxBtKWOsKjdch"), "GdWCkxBtKWOsKjdch");
    }

    #[test]
    fn test_from_config_requires_token() {
        let config = ApifyConfig::default();
        let err = ApifyClient::from_config(&config).err().unwrap();
        assert!(err.to_string().contains("APIFY_TOKEN is missing"));

        let config = ApifyConfig {
            token: Some("t".to_string()),
            ..ApifyConfig::default()
        };
        assert!(ApifyClient::from_config(&config).is_ok());
    }

    #[tokio::test]
    async fn test_call_actor_polls_until_finished() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v2/acts/owner~actor/runs"))
            .and(header("authorization", "Bearer test-token"))
            .and(body_json(json!({ "postURLs": ["https://vt.tiktok.com/XYZ/"] })))
            .respond_with(ResponseTemplate::new(201).set_body_json(run_body("run1", "RUNNING")))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/v2/actor-runs/run1"))
            .and(query_param("waitForFinish", "5"))
            .respond_with(ResponseTemplate::new(200).set_body_json(run_body("run1", "SUCCEEDED")))
            .expect(1)
            .mount(&server)
            .await;

        let client = ApifyClient::new(server.uri(), "test-token")
            .unwrap()
            .with_wait_for_finish(5);
        let run = client
            .call_actor("owner/actor", json!({ "postURLs": ["https://vt.tiktok.com/XYZ/"] }))
            .await
            .unwrap();

        assert!(run.succeeded());
        assert_eq!(run.default_dataset_id, "ds1");
    }

    #[tokio::test]
    async fn test_failed_run_is_backend_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v2/acts/owner~actor/runs"))
            .respond_with(ResponseTemplate::new(201).set_body_json(run_body("run2", "FAILED")))
            .mount(&server)
            .await;

        let client = ApifyClient::new(server.uri(), "test-token").unwrap();
        let err = client.call_actor("owner/actor", json!({})).await.unwrap_err();

        assert!(matches!(
            err.downcast_ref::<TranscriptError>(),
            Some(TranscriptError::Backend(_))
        ));
        assert!(err.to_string().contains("FAILED"));
    }

    #[tokio::test]
    async fn test_http_error_message_is_surfaced() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v2/acts/owner~actor/runs"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "error": { "type": "token-not-valid", "message": "Authentication token is not valid." }
            })))
            .mount(&server)
            .await;

        let client = ApifyClient::new(server.uri(), "bad").unwrap();
        let err = client.call_actor("owner/actor", json!({})).await.unwrap_err();
        let message = err.to_string();

        assert!(message.contains("401"));
        assert!(message.contains("Authentication token is not valid."));
    }

    #[tokio::test]
    async fn test_dataset_items() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v2/datasets/ds1/items"))
            .and(query_param("clean", "true"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "id": "1" }, { "id": "2" }])))
            .mount(&server)
            .await;

        let client = ApifyClient::new(format!("{}/", server.uri()), "test-token").unwrap();
        let items = client.dataset_items("ds1").await.unwrap();

        assert_eq!(items.len(), 2);
        assert_eq!(items[0]["id"], "1");
    }
}
