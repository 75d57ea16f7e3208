use anyhow::Result;
use async_trait::async_trait;

/// Durable home of one serialized model per agent.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    async fn load_snapshot(&self, agent_id: &str) -> Result<Option<String>>;
    async fn save_snapshot(&self, agent_id: &str, snapshot: &str) -> Result<()>;
}

