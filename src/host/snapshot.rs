// ABOUTME: Repository metadata snapshot fetched fresh on every watch tick

use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Point-in-time repository metadata. Never persisted; the observer only
/// cares about `pushed_at`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RepositorySnapshot {
    pub id: i64,
    pub name: String,
    pub full_name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub private: bool,
    pub pushed_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
