use serde::{Deserialize, Serialize};
use serde_json::Value;
use uphone_storage::Entity;
use uphone_types::prelude::*;

use super::{require_price, require_text};
use crate::errors::{MarketError, MarketResult};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingStatus {
    Available,
    Booked,
    Sold,
    Removed,
}

/// Outcome of a status change requested through a listing patch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatusChange {
    Unchanged,
    Changed,
    /// `booked -> available` by an admin; the live booking has to go.
    Release,
}

impl ListingStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ListingStatus::Available => "available",
            ListingStatus::Booked => "booked",
            ListingStatus::Sold => "sold",
            ListingStatus::Removed => "removed",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, ListingStatus::Sold | ListingStatus::Removed)
    }

    /// Transition table for status changes made through a patch. Booking is
    /// not reachable from here; the booking workflow owns `available -> booked`.
    pub fn patch_transition(self, next: ListingStatus, is_admin: bool) -> MarketResult<StatusChange> {
        use ListingStatus::*;

        if self == next {
            return Ok(StatusChange::Unchanged);
        }
        match (self, next) {
            (_, Booked) => Err(MarketError::conflict(
                "listings are booked through the booking endpoint",
            )),
            (Sold | Removed, _) => Err(MarketError::conflict(&format!(
                "listing is {} and can no longer change",
                self.as_str()
            ))),
            (Available, Sold | Removed) | (Booked, Sold | Removed) => Ok(StatusChange::Changed),
            (Booked, Available) if is_admin => Ok(StatusChange::Release),
            (Booked, Available) => Err(MarketError::conflict(
                "a booked listing can only be released by an admin",
            )),
            (Available, Available) => Ok(StatusChange::Unchanged),
        }
    }
}

impl std::fmt::Display for ListingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    pub id: Id,
    pub seller_id: Id,
    pub seller_email: String,
    pub name: String,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub more_details: Option<String>,
    pub selling_price: f64,
    pub original_price: f64,
    pub meet_up_location: String,
    pub brand: String,
    pub brand_id: String,
    pub status: ListingStatus,
    #[serde(default)]
    pub advertise: bool,
    pub created_at: Timestamp,
}

impl Entity for Listing {
    const TABLE: &'static str = "listings";

    fn id(&self) -> &str {
        self.id.as_str()
    }
}

/// Body of `POST /products`. The seller is always the caller; `uid` is only
/// cross-checked against it.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewListing {
    #[serde(default)]
    pub uid: Option<Id>,
    #[serde(alias = "productName")]
    pub name: String,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub more_details: Option<String>,
    pub selling_price: f64,
    pub original_price: f64,
    #[serde(default)]
    pub meet_up_location: String,
    #[serde(default)]
    pub brand: String,
    #[serde(default)]
    pub brand_id: String,
}

impl NewListing {
    pub fn validate(&self) -> MarketResult<()> {
        require_text("name", &self.name)?;
        require_price("sellingPrice", self.selling_price)?;
        require_price("originalPrice", self.original_price)
    }

    pub fn into_listing(self, seller_id: Id, seller_email: String) -> Listing {
        Listing {
            id: Id::new_random(),
            seller_id,
            seller_email,
            name: self.name.trim().to_string(),
            images: self.images,
            more_details: self.more_details,
            selling_price: self.selling_price,
            original_price: self.original_price,
            meet_up_location: self.meet_up_location,
            brand: self.brand,
            brand_id: self.brand_id,
            status: ListingStatus::Available,
            advertise: false,
            created_at: Timestamp::now(),
        }
    }
}

/// Editable listing fields. `sellerId`, `id` and anything unknown are refused.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ListingPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub more_details: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selling_price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meet_up_location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ListingStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub advertise: Option<bool>,
}

impl ListingPatch {
    pub fn validate(&self) -> MarketResult<()> {
        if let Some(name) = self.name.as_deref() {
            require_text("name", name)?;
        }
        if let Some(price) = self.selling_price {
            require_price("sellingPrice", price)?;
        }
        if let Some(price) = self.original_price {
            require_price("originalPrice", price)?;
        }
        Ok(())
    }

    /// Merge patch document containing only the fields that were set.
    pub fn to_document(&self) -> MarketResult<Value> {
        Ok(serde_json::to_value(self)?)
    }
}

/// Query string of `GET /products`.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingQuery {
    pub brand_id: Option<String>,
    pub status: Option<ListingStatus>,
    pub advertised: Option<bool>,
    pub seller_id: Option<Id>,
}

impl ListingQuery {
    pub fn to_filter(&self) -> Value {
        let mut filter = serde_json::Map::new();
        if let Some(brand_id) = &self.brand_id {
            filter.insert("brandId".into(), Value::String(brand_id.clone()));
        }
        if let Some(status) = self.status {
            filter.insert("status".into(), Value::String(status.as_str().into()));
        }
        if let Some(advertised) = self.advertised {
            filter.insert("advertise".into(), Value::Bool(advertised));
        }
        if let Some(seller_id) = &self.seller_id {
            filter.insert("sellerId".into(), Value::String(seller_id.0.clone()));
        }
        Value::Object(filter)
    }
}

/// Listing fields embedded in joined booking and report views.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingSummary {
    pub id: Id,
    pub name: String,
    pub images: Vec<String>,
    pub selling_price: f64,
    pub status: ListingStatus,
}

impl From<&Listing> for ListingSummary {
    fn from(listing: &Listing) -> Self {
        Self {
            id: listing.id.clone(),
            name: listing.name.clone(),
            images: listing.images.clone(),
            selling_price: listing.selling_price,
            status: listing.status,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertResult {
    pub acknowledged: bool,
    pub inserted_id: Id,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use super::ListingStatus::*;

    #[test]
    fn same_status_is_a_noop() {
        for status in [Available, Booked, Sold, Removed] {
            assert_eq!(
                status.patch_transition(status, false).unwrap(),
                StatusChange::Unchanged
            );
        }
    }

    #[test]
    fn forward_transitions_are_allowed() {
        assert_eq!(Available.patch_transition(Sold, false).unwrap(), StatusChange::Changed);
        assert_eq!(Available.patch_transition(Removed, false).unwrap(), StatusChange::Changed);
        assert_eq!(Booked.patch_transition(Sold, false).unwrap(), StatusChange::Changed);
        assert_eq!(Booked.patch_transition(Removed, false).unwrap(), StatusChange::Changed);
    }

    #[test]
    fn nobody_books_through_a_patch() {
        assert_eq!(Available.patch_transition(Booked, true).unwrap_err().http_status(), 409);
        assert_eq!(Sold.patch_transition(Booked, true).unwrap_err().http_status(), 409);
    }

    #[test]
    fn terminal_states_stay_put() {
        assert!(Sold.patch_transition(Available, true).is_err());
        assert!(Removed.patch_transition(Sold, true).is_err());
    }

    #[test]
    fn only_admins_release_bookings() {
        assert_eq!(Booked.patch_transition(Available, true).unwrap(), StatusChange::Release);
        assert_eq!(Booked.patch_transition(Available, false).unwrap_err().http_status(), 409);
    }

    #[test]
    fn patch_refuses_seller_id() {
        let parsed: Result<ListingPatch, _> =
            serde_json::from_value(json!({ "sellerId": "someone-else" }));
        assert!(parsed.is_err());
    }

    #[test]
    fn patch_document_has_only_set_fields() {
        let patch: ListingPatch =
            serde_json::from_value(json!({ "sellingPrice": 120.0, "advertise": true })).unwrap();
        assert_eq!(
            patch.to_document().unwrap(),
            json!({ "sellingPrice": 120.0, "advertise": true })
        );
    }

    #[test]
    fn new_listing_accepts_product_name() {
        let body: NewListing = serde_json::from_value(json!({
            "productName": "Pixel 7",
            "sellingPrice": 300,
            "originalPrice": 600
        }))
        .unwrap();
        assert_eq!(body.name, "Pixel 7");
        assert!(body.validate().is_ok());
    }

    #[test]
    fn negative_prices_are_rejected() {
        let body: NewListing = serde_json::from_value(json!({
            "name": "Pixel 7",
            "sellingPrice": -1,
            "originalPrice": 600
        }))
        .unwrap();
        assert_eq!(body.validate().unwrap_err().http_status(), 400);
    }

    #[test]
    fn query_builds_equality_filter() {
        let query = ListingQuery {
            brand_id: Some("apple".into()),
            advertised: Some(true),
            ..Default::default()
        };
        assert_eq!(query.to_filter(), json!({ "brandId": "apple", "advertise": true }));
    }
}
