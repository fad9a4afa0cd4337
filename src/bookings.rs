//! Booking workflow.
//!
//! Booking a listing is two writes: the listing swaps `available -> booked`
//! and the booking document is inserted. They run as a saga; if the insert
//! fails the listing is swapped back to `available`.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing::{info, instrument};
use uphone_auth::prelude::*;
use uphone_errors::prelude::{codes, ErrorBuilder, ErrorKind};
use uphone_storage::prelude::*;
use uphone_tx::{errors::TxError, saga::Saga, saga::SagaStep};
use uphone_types::prelude::*;

use crate::access::admit;
use crate::directory::RoleDirectory;
use crate::errors::{MarketError, MarketResult};
use crate::metrics;
use crate::model::{
    Booking, BookingPatch, BookingView, CreateBooking, Listing, ListingStatus, ListingSummary,
};

pub struct BookingWorkflow {
    listings: Arc<dyn Repository<Listing>>,
    bookings: Arc<dyn Repository<Booking>>,
    directory: Arc<RoleDirectory>,
    saga: Saga<BookingContext>,
}

struct BookingContext {
    request: CreateBooking,
    listing: Option<Listing>,
    booking: Option<Booking>,
}

impl BookingWorkflow {
    pub fn new(
        listings: Arc<dyn Repository<Listing>>,
        bookings: Arc<dyn Repository<Booking>>,
        directory: Arc<RoleDirectory>,
    ) -> Self {
        let saga = Saga::new("create_booking")
            .step(ReserveListing {
                listings: listings.clone(),
            })
            .step(RecordBooking {
                bookings: bookings.clone(),
            });
        Self {
            listings,
            bookings,
            directory,
            saga,
        }
    }

    #[instrument(name = "bookings.create", skip(self, actor, request), fields(product = %request.product_id))]
    pub async fn create(&self, actor: Option<&Actor>, request: CreateBooking) -> MarketResult<Booking> {
        let resource = Resource::new("booking").claiming(Some(request.buyer_id.clone()));
        admit(actor, Action::CreateBooking, &resource)?;
        request.validate()?;

        let mut ctx = BookingContext {
            request,
            listing: None,
            booking: None,
        };
        if let Err(abort) = self.saga.run(&mut ctx).await {
            if abort.error.kind() == ErrorKind::Conflict {
                metrics::BOOKING_CONFLICTS.inc();
            }
            if abort.failed_step != RESERVE_STEP {
                metrics::record_saga_abort(abort.saga, abort.state);
            }
            return Err(abort.into_error().into());
        }

        let booking = ctx
            .booking
            .ok_or_else(|| MarketError::internal("booking saga finished without a booking"))?;
        metrics::BOOKINGS_CREATED.inc();
        info!(booking = %booking.id, buyer = %booking.buyer_id, "listing booked");
        Ok(booking)
    }

    /// Bookings of the caller joined with their listings and sellers.
    #[instrument(name = "bookings.list_for_buyer", skip(self, actor))]
    pub async fn list_for_buyer(
        &self,
        actor: Option<&Actor>,
        claimed: Option<Id>,
    ) -> MarketResult<Vec<BookingView>> {
        let resource = Resource::new("booking").claiming(claimed);
        let actor = admit(actor, Action::ListOwnBookings, &resource)?;

        let params = QueryParams::filter(json!({ "buyerId": actor.id }))
            .order_by("createdAt", SortOrder::Desc);
        let bookings = self.bookings.select(params).await?;

        let mut views = Vec::with_capacity(bookings.len());
        for booking in bookings {
            let product = self
                .listings
                .get(booking.product_id.as_str())
                .await?
                .map(|listing| ListingSummary::from(&listing));
            let seller = self.directory.find_profile(&booking.seller_id).await?;
            views.push(BookingView {
                booking,
                product,
                seller,
            });
        }
        Ok(views)
    }

    #[instrument(name = "bookings.patch", skip(self, actor, patch), fields(booking = %id))]
    pub async fn patch(&self, actor: Option<&Actor>, id: &Id, patch: BookingPatch) -> MarketResult<Booking> {
        let booking = self
            .bookings
            .get(id.as_str())
            .await?
            .ok_or_else(|| MarketError::not_found("booking"))?;
        let resource = Resource::new("booking")
            .owned_by(booking.buyer_id.clone())
            .owned_by(booking.seller_id.clone());
        admit(actor, Action::PatchBooking, &resource)?;
        patch.validate()?;

        if booking.payment_status && patch.payment_status == Some(false) {
            return Err(MarketError::conflict("a paid booking cannot be marked unpaid"));
        }
        let document = serde_json::to_value(&patch)?;
        if document.as_object().map_or(true, |fields| fields.is_empty()) {
            return Ok(booking);
        }
        self.bookings
            .compare_and_swap(
                id.as_str(),
                json!({ "paymentStatus": booking.payment_status }),
                document,
            )
            .await?
            .ok_or_else(|| MarketError::conflict("booking changed while it was being updated"))
    }
}

const RESERVE_STEP: &str = "reserve_listing";

fn storage(err: StorageError) -> TxError {
    TxError(err.into_inner())
}

struct ReserveListing {
    listings: Arc<dyn Repository<Listing>>,
}

#[async_trait]
impl SagaStep<BookingContext> for ReserveListing {
    fn name(&self) -> &'static str {
        RESERVE_STEP
    }

    async fn execute(&self, ctx: &mut BookingContext) -> Result<(), TxError> {
        let product_id = ctx.request.product_id.as_str();
        let reserved = self
            .listings
            .compare_and_swap(
                product_id,
                json!({ "status": ListingStatus::Available }),
                json!({ "status": ListingStatus::Booked }),
            )
            .await
            .map_err(storage)?;
        match reserved {
            Some(listing) => {
                ctx.listing = Some(listing);
                Ok(())
            }
            None => match self.listings.get(product_id).await.map_err(storage)? {
                None => Err(TxError::not_found("listing does not exist")),
                Some(listing) => Err(TxError::conflict(&format!(
                    "listing is {} and cannot be booked",
                    listing.status
                ))),
            },
        }
    }

    async fn compensate(&self, ctx: &mut BookingContext) -> Result<(), TxError> {
        let restored = self
            .listings
            .compare_and_swap(
                ctx.request.product_id.as_str(),
                json!({ "status": ListingStatus::Booked }),
                json!({ "status": ListingStatus::Available }),
            )
            .await
            .map_err(storage)?;
        match restored {
            Some(_) => Ok(()),
            None => Err(TxError::conflict("listing left the booked state before release")),
        }
    }
}

struct RecordBooking {
    bookings: Arc<dyn Repository<Booking>>,
}

#[async_trait]
impl SagaStep<BookingContext> for RecordBooking {
    fn name(&self) -> &'static str {
        "record_booking"
    }

    async fn execute(&self, ctx: &mut BookingContext) -> Result<(), TxError> {
        let listing = ctx
            .listing
            .as_ref()
            .ok_or_else(|| TxError::internal("no reserved listing in context"))?;
        let booking = Booking {
            id: Id::new_random(),
            product_id: listing.id.clone(),
            seller_id: listing.seller_id.clone(),
            buyer_id: ctx.request.buyer_id.clone(),
            buyer_phone_number: ctx.request.buyer_phone_number.trim().to_string(),
            meet_up_location: ctx.request.meet_up_location.trim().to_string(),
            payment_status: false,
            created_at: Timestamp::now(),
        };
        self.bookings.create(&booking).await.map_err(|err| {
            let obj = err.into_inner();
            if obj.kind == ErrorKind::Transient {
                return TxError(obj);
            }
            TxError(
                ErrorBuilder::new(codes::STORAGE_UNAVAILABLE)
                    .dev_msg(format!("booking insert failed: {}", obj.code.0))
                    .build(),
            )
        })?;
        ctx.booking = Some(booking);
        Ok(())
    }
}
