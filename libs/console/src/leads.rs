//! Leads collected by the contact form

use async_trait::async_trait;
use chrono::Utc;
use common::{Filter, Row, RowStore, StoreError, StoreResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::form::{ContactSubmission, LeadSink, SubmitError};

pub const LEADS_TABLE: &str = "leads";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeadStatus {
    New,
    Contacted,
    Spam,
    Archived,
}

impl LeadStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            LeadStatus::New => "new",
            LeadStatus::Contacted => "contacted",
            LeadStatus::Spam => "spam",
            LeadStatus::Archived => "archived",
        }
    }
}

/// Filter tabs of the leads screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LeadFilter {
    #[default]
    All,
    New,
    Contacted,
}

impl LeadFilter {
    fn to_filter(self) -> Filter {
        match self {
            LeadFilter::All => Filter::all(),
            LeadFilter::New => Filter::all().eq("status", LeadStatus::New.as_str()),
            LeadFilter::Contacted => Filter::all().eq("status", LeadStatus::Contacted.as_str()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lead {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub business_type: Option<String>,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    pub message: String,
    pub status: LeadStatus,
    pub created_at: String,
}

impl Lead {
    fn into_row(self) -> StoreResult<Row> {
        match serde_json::to_value(self)? {
            Value::Object(row) => Ok(row),
            _ => Err(StoreError::InvalidRow("lead is not an object".to_string())),
        }
    }

    fn from_row(row: Row) -> StoreResult<Lead> {
        Ok(serde_json::from_value(Value::Object(row))?)
    }
}

/// Lead persistence over the row store
#[derive(Clone)]
pub struct LeadStore {
    store: Arc<dyn RowStore>,
}

impl LeadStore {
    pub fn new(store: Arc<dyn RowStore>) -> Self {
        Self { store }
    }

    /// Store a contact submission as a new lead
    pub async fn create(&self, submission: &ContactSubmission) -> StoreResult<Lead> {
        let lead = Lead {
            id: Uuid::new_v4().to_string(),
            name: submission.full_name.trim().to_string(),
            business_type: Some(submission.business_type.clone()),
            email: submission.email.clone(),
            phone: Some(submission.phone.clone()),
            message: submission.message.trim().to_string(),
            status: LeadStatus::New,
            created_at: Utc::now().to_rfc3339(),
        };

        let row = self.store.insert(LEADS_TABLE, lead.into_row()?).await?;
        let lead = Lead::from_row(row)?;
        info!("Stored lead {}", lead.id);
        Ok(lead)
    }

    /// Leads matching `filter`, newest first
    ///
    /// Rows that no longer decode are skipped.
    pub async fn list(&self, filter: LeadFilter) -> StoreResult<Vec<Lead>> {
        let rows = self.store.select(LEADS_TABLE, &filter.to_filter()).await?;
        Ok(rows
            .into_iter()
            .filter_map(|row| match Lead::from_row(row) {
                Ok(lead) => Some(lead),
                Err(e) => {
                    warn!("Skipping malformed lead row: {}", e);
                    None
                }
            })
            .collect())
    }

    pub async fn set_status(&self, id: &str, status: LeadStatus) -> StoreResult<Lead> {
        let mut patch = Row::new();
        patch.insert("status".to_string(), Value::from(status.as_str()));
        let row = self.store.update(LEADS_TABLE, id, patch).await?;
        Lead::from_row(row)
    }

    pub async fn delete(&self, id: &str) -> StoreResult<()> {
        self.store.delete(LEADS_TABLE, id).await
    }
}

#[async_trait]
impl LeadSink for LeadStore {
    async fn submit(&self, submission: &ContactSubmission) -> Result<(), SubmitError> {
        self.create(submission).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::MemoryRowStore;

    fn submission(name: &str) -> ContactSubmission {
        ContactSubmission {
            full_name: name.to_string(),
            business_type: "supermarket".to_string(),
            email: "owner@shop.io".to_string(),
            phone: "0123456789".to_string(),
            message: "  Please call me back.  ".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_and_filter() {
        let leads = LeadStore::new(Arc::new(MemoryRowStore::new()));
        let first = leads.create(&submission("Ada Lovelace")).await.unwrap();
        let second = leads.create(&submission("Alan Turing")).await.unwrap();
        assert_eq!(first.status, LeadStatus::New);
        assert_eq!(first.message, "Please call me back.");

        leads
            .set_status(&first.id, LeadStatus::Contacted)
            .await
            .unwrap();

        let all = leads.list(LeadFilter::All).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, second.id);

        let contacted = leads.list(LeadFilter::Contacted).await.unwrap();
        assert_eq!(contacted.len(), 1);
        assert_eq!(contacted[0].id, first.id);

        let new = leads.list(LeadFilter::New).await.unwrap();
        assert_eq!(new.len(), 1);
        assert_eq!(new[0].id, second.id);

        leads.delete(&second.id).await.unwrap();
        assert_eq!(leads.list(LeadFilter::All).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_sink_surfaces_store_failure() {
        let store = Arc::new(MemoryRowStore::new());
        store.set_unavailable(true);
        let leads = LeadStore::new(store);

        let err = leads.submit(&submission("Ada")).await.unwrap_err();
        assert!(matches!(err, SubmitError::Store(_)));
    }
}
