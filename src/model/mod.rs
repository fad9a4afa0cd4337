//! Documents persisted by the marketplace and the request/response shapes
//! built from them. Everything serializes with camelCase field names.

pub mod booking;
pub mod listing;
pub mod principal;
pub mod report;

pub use booking::{Booking, BookingPatch, BookingView, CreateBooking};
pub use listing::{
    InsertResult, Listing, ListingPatch, ListingQuery, ListingStatus, ListingSummary, NewListing,
    StatusChange,
};
pub use principal::{ArchivedPrincipal, Principal, ProfilePatch, PublicProfile, Registration};
pub use report::{CreateReport, Report, ReportView};

use crate::errors::{MarketError, MarketResult};

pub(crate) fn require_text(field: &str, value: &str) -> MarketResult<()> {
    if value.trim().is_empty() {
        return Err(MarketError::invalid_input(&format!(
            "{} must not be empty",
            field
        )));
    }
    Ok(())
}

pub(crate) fn require_price(field: &str, value: f64) -> MarketResult<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(MarketError::invalid_input(&format!(
            "{} must be a non-negative number",
            field
        )));
    }
    Ok(())
}
