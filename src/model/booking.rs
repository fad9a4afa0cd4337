use serde::{Deserialize, Serialize};
use uphone_storage::Entity;
use uphone_types::prelude::*;

use super::{require_text, ListingSummary, PublicProfile};
use crate::errors::MarketResult;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: Id,
    pub product_id: Id,
    pub seller_id: Id,
    pub buyer_id: Id,
    pub buyer_phone_number: String,
    pub meet_up_location: String,
    #[serde(default)]
    pub payment_status: bool,
    pub created_at: Timestamp,
}

impl Entity for Booking {
    const TABLE: &'static str = "bookings";

    fn id(&self) -> &str {
        self.id.as_str()
    }
}

/// Body of `POST /bookings`.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBooking {
    pub product_id: Id,
    pub buyer_id: Id,
    #[serde(default)]
    pub buyer_phone_number: String,
    #[serde(default)]
    pub meet_up_location: String,
}

impl CreateBooking {
    pub fn validate(&self) -> MarketResult<()> {
        require_text("buyerPhoneNumber", &self.buyer_phone_number)?;
        require_text("meetUpLocation", &self.meet_up_location)
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct BookingPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_status: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buyer_phone_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meet_up_location: Option<String>,
}

impl BookingPatch {
    pub fn validate(&self) -> MarketResult<()> {
        if let Some(phone) = self.buyer_phone_number.as_deref() {
            require_text("buyerPhoneNumber", phone)?;
        }
        if let Some(location) = self.meet_up_location.as_deref() {
            require_text("meetUpLocation", location)?;
        }
        Ok(())
    }
}

/// A booking joined with the current state of its listing and the seller's
/// public profile. Either side is `None` when the document is gone.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingView {
    #[serde(flatten)]
    pub booking: Booking,
    pub product: Option<ListingSummary>,
    pub seller: Option<PublicProfile>,
}
