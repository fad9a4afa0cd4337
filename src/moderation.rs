//! Listing reports and their admin-only review.

use std::sync::Arc;

use serde_json::json;
use tracing::{info, instrument};
use uphone_auth::prelude::*;
use uphone_storage::prelude::*;
use uphone_types::prelude::*;

use crate::access::admit;
use crate::directory::RoleDirectory;
use crate::errors::{MarketError, MarketResult};
use crate::model::{CreateReport, Listing, ListingSummary, Report, ReportView};

pub struct Moderation {
    reports: Arc<dyn Repository<Report>>,
    listings: Arc<dyn Repository<Listing>>,
    directory: Arc<RoleDirectory>,
}

impl Moderation {
    pub fn new(
        reports: Arc<dyn Repository<Report>>,
        listings: Arc<dyn Repository<Listing>>,
        directory: Arc<RoleDirectory>,
    ) -> Self {
        Self {
            reports,
            listings,
            directory,
        }
    }

    #[instrument(name = "moderation.create", skip(self, actor, request), fields(product = %request.product_id))]
    pub async fn create(&self, actor: Option<&Actor>, request: CreateReport) -> MarketResult<Report> {
        let resource = Resource::new("report").claiming(request.reporter_id.clone());
        let actor = admit(actor, Action::CreateReport, &resource)?;
        request.validate()?;

        if self.listings.get(request.product_id.as_str()).await?.is_none() {
            return Err(MarketError::not_found("listing"));
        }
        let report = Report {
            id: Id::new_random(),
            product_id: request.product_id,
            reporter_id: actor.id.clone(),
            reason: request.reason.trim().to_string(),
            created_at: Timestamp::now(),
        };
        self.reports.create(&report).await?;
        info!(report = %report.id, "listing reported");
        Ok(report)
    }

    #[instrument(name = "moderation.list", skip(self, actor))]
    pub async fn list(&self, actor: Option<&Actor>) -> MarketResult<Vec<ReportView>> {
        admit(actor, Action::ListReports, &Resource::new("report"))?;
        let params = QueryParams::filter(json!({})).order_by("createdAt", SortOrder::Desc);
        let reports = self.reports.select(params).await?;

        let mut views = Vec::with_capacity(reports.len());
        for report in reports {
            let product = self
                .listings
                .get(report.product_id.as_str())
                .await?
                .map(|listing| ListingSummary::from(&listing));
            let reporter = self.directory.find_profile(&report.reporter_id).await?;
            views.push(ReportView {
                report,
                product,
                reporter,
            });
        }
        Ok(views)
    }

    #[instrument(name = "moderation.delete", skip(self, actor), fields(report = %id))]
    pub async fn delete(&self, actor: Option<&Actor>, id: &Id) -> MarketResult<()> {
        let actor = admit(actor, Action::DeleteReport, &Resource::new("report"))?;
        if self.reports.get(id.as_str()).await?.is_none() {
            return Err(MarketError::not_found("report"));
        }
        self.reports.delete(id.as_str()).await?;
        info!(admin = %actor.id, "report dismissed");
        Ok(())
    }
}
