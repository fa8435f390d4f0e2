use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub mod apify;

pub use apify::ApifyClient;

use crate::Result;

/// A finished (or finishing) job run on the backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActorRun {
    pub id: String,
    pub status: String,
    pub default_dataset_id: String,
}

impl ActorRun {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self.status.as_str(),
            "SUCCEEDED" | "FAILED" | "ABORTED" | "TIMED-OUT"
        )
    }

    pub fn succeeded(&self) -> bool {
        self.status == "SUCCEEDED"
    }
}

/// Job submission and result retrieval on an external scraping service
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait JobBackend: Send + Sync {
    /// Start `actor_id` with `input` and wait until the run has finished
    async fn call_actor(&self, actor_id: &str, input: Value) -> Result<ActorRun>;

    /// All items in a run's dataset
    async fn dataset_items(&self, dataset_id: &str) -> Result<Vec<Value>>;
}

/// Run the actor and return the first dataset item, if any
pub async fn first_item(
    backend: &dyn JobBackend,
    actor_id: &str,
    input: Value,
) -> Result<Option<Value>> {
    let run = backend.call_actor(actor_id, input).await?;
    tracing::debug!("Run {} finished, reading dataset {}", run.id, run.default_dataset_id);
    let items = backend.dataset_items(&run.default_dataset_id).await?;
    Ok(items.into_iter().next())
}
