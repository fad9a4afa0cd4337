use serde::{Deserialize, Serialize};
use uphone_storage::Entity;
use uphone_types::prelude::*;

use super::{require_text, ListingSummary, PublicProfile};
use crate::errors::MarketResult;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub id: Id,
    pub product_id: Id,
    pub reporter_id: Id,
    pub reason: String,
    pub created_at: Timestamp,
}

impl Entity for Report {
    const TABLE: &'static str = "reports";

    fn id(&self) -> &str {
        self.id.as_str()
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReport {
    pub product_id: Id,
    #[serde(default)]
    pub reporter_id: Option<Id>,
    #[serde(default)]
    pub reason: String,
}

impl CreateReport {
    pub fn validate(&self) -> MarketResult<()> {
        require_text("reason", &self.reason)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportView {
    #[serde(flatten)]
    pub report: Report,
    pub product: Option<ListingSummary>,
    pub reporter: Option<PublicProfile>,
}
