//! Listing store: catalog reads and the listing status state machine.
//!
//! Status writes are conditional on the status the request observed, so a
//! listing that moved on in the meantime answers `Conflict` instead of being
//! overwritten. `available -> booked` never happens here; see `bookings`.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{info, instrument, warn};
use uphone_auth::prelude::*;
use uphone_storage::prelude::*;
use uphone_tx::{errors::TxError, saga::Saga, saga::SagaStep};
use uphone_errors::prelude::ErrorKind;
use uphone_types::prelude::*;

use crate::access::admit;
use crate::directory::RoleDirectory;
use crate::errors::{MarketError, MarketResult};
use crate::metrics;
use crate::model::{
    Booking, InsertResult, Listing, ListingPatch, ListingQuery, ListingStatus, NewListing,
    StatusChange,
};

pub struct ListingStore {
    listings: Arc<dyn Repository<Listing>>,
    directory: Arc<RoleDirectory>,
    release_saga: Saga<ReleaseContext>,
}

impl ListingStore {
    pub fn new(
        listings: Arc<dyn Repository<Listing>>,
        bookings: Arc<dyn Repository<Booking>>,
        directory: Arc<RoleDirectory>,
    ) -> Self {
        let release_saga = Saga::new("release_listing")
            .step(DropBookings { bookings })
            .step(ReopenListing {
                listings: listings.clone(),
            });
        Self {
            listings,
            directory,
            release_saga,
        }
    }

    #[instrument(name = "listings.create", skip(self, actor, new))]
    pub async fn create(&self, actor: Option<&Actor>, new: NewListing) -> MarketResult<InsertResult> {
        let resource = Resource::new("listing").claiming(new.uid.clone());
        let actor = admit(actor, Action::CreateListing, &resource)?;
        new.validate()?;

        let seller = self.directory.get(&actor.id).await?;
        let listing = new.into_listing(actor.id.clone(), seller.email);
        self.listings.create(&listing).await?;
        metrics::LISTINGS_CREATED.inc();
        info!(listing = %listing.id, seller = %listing.seller_id, "listing created");
        Ok(InsertResult {
            acknowledged: true,
            inserted_id: listing.id,
        })
    }

    pub async fn list(&self, query: &ListingQuery) -> MarketResult<Vec<Listing>> {
        self.select(query.to_filter()).await
    }

    pub async fn get(&self, id: &Id) -> MarketResult<Listing> {
        self.listings
            .get(id.as_str())
            .await?
            .ok_or_else(|| MarketError::not_found("listing"))
    }

    pub async fn find(&self, id: &Id) -> MarketResult<Option<Listing>> {
        Ok(self.listings.get(id.as_str()).await?)
    }

    /// Bookable listings of one brand.
    pub async fn by_brand(&self, brand_id: &str) -> MarketResult<Vec<Listing>> {
        self.select(json!({ "brandId": brand_id, "status": ListingStatus::Available }))
            .await
    }

    pub async fn advertised(&self) -> MarketResult<Vec<Listing>> {
        self.select(json!({ "advertise": true, "status": ListingStatus::Available }))
            .await
    }

    pub async fn mine(&self, actor: Option<&Actor>, claimed: Option<Id>) -> MarketResult<Vec<Listing>> {
        let resource = Resource::new("listing").claiming(claimed);
        let actor = admit(actor, Action::ListOwnListings, &resource)?;
        self.select(json!({ "sellerId": actor.id })).await
    }

    #[instrument(name = "listings.patch", skip(self, actor, patch), fields(listing = %id))]
    pub async fn patch(&self, actor: Option<&Actor>, id: &Id, patch: ListingPatch) -> MarketResult<Listing> {
        let listing = self.get(id).await?;
        let resource = Resource::new("listing").owned_by(listing.seller_id.clone());
        let actor = admit(actor, Action::PatchListing, &resource)?;
        patch.validate()?;

        let change = match patch.status {
            Some(next) => listing.status.patch_transition(next, actor.is_admin())?,
            None => StatusChange::Unchanged,
        };
        let document = patch.to_document()?;
        if document.as_object().map_or(true, |fields| fields.is_empty()) {
            return Ok(listing);
        }

        if change == StatusChange::Release {
            return self.release(actor, listing, document).await;
        }

        let expected = json!({ "status": listing.status });
        let updated = self
            .listings
            .compare_and_swap(id.as_str(), expected, document)
            .await?
            .ok_or_else(|| MarketError::conflict("listing changed while it was being updated"))?;
        if change == StatusChange::Changed {
            info!(from = %listing.status, to = %updated.status, "listing status changed");
        }
        Ok(updated)
    }

    async fn release(&self, actor: &Actor, listing: Listing, document: Value) -> MarketResult<Listing> {
        let mut ctx = ReleaseContext {
            listing_id: listing.id,
            document,
            dropped: Vec::new(),
            released: None,
        };
        if let Err(abort) = self.release_saga.run(&mut ctx).await {
            metrics::record_saga_abort(abort.saga, abort.state);
            return Err(abort.into_error().into());
        }
        info!(admin = %actor.id, listing = %ctx.listing_id, "booked listing released");
        ctx.released
            .ok_or_else(|| MarketError::internal("release saga finished without a listing"))
    }

    #[instrument(name = "listings.delete", skip(self, actor), fields(listing = %id))]
    pub async fn delete(&self, actor: Option<&Actor>, id: &Id) -> MarketResult<()> {
        let listing = self.get(id).await?;
        let resource = Resource::new("listing").owned_by(listing.seller_id.clone());
        admit(actor, Action::DeleteListing, &resource)?;

        if listing.status == ListingStatus::Booked {
            return Err(MarketError::conflict("a booked listing cannot be deleted"));
        }
        let removed = self
            .listings
            .delete_if(id.as_str(), json!({ "status": listing.status }))
            .await?;
        if !removed {
            return Err(MarketError::conflict("listing changed while it was being deleted"));
        }
        info!("listing deleted");
        Ok(())
    }

    async fn select(&self, filter: Value) -> MarketResult<Vec<Listing>> {
        let params = QueryParams::filter(filter).order_by("createdAt", SortOrder::Desc);
        self.listings.select(params).await.map_err(Into::into)
    }
}

/// State of the admin `booked -> available` release. Bookings are dropped
/// while the listing is still booked, so no new booking can arrive before the
/// listing is reopened.
struct ReleaseContext {
    listing_id: Id,
    document: Value,
    dropped: Vec<Booking>,
    released: Option<Listing>,
}

struct DropBookings {
    bookings: Arc<dyn Repository<Booking>>,
}

impl DropBookings {
    /// Puts back every booking removed so far.
    async fn restore(&self, dropped: &mut Vec<Booking>) -> Result<(), TxError> {
        while let Some(booking) = dropped.pop() {
            if let Err(err) = self.bookings.create(&booking).await {
                let obj = err.into_inner();
                if obj.kind != ErrorKind::Conflict {
                    dropped.push(booking);
                    return Err(TxError(obj));
                }
            }
        }
        Ok(())
    }
}

#[async_trait]
impl SagaStep<ReleaseContext> for DropBookings {
    fn name(&self) -> &'static str {
        "drop_bookings"
    }

    async fn execute(&self, ctx: &mut ReleaseContext) -> Result<(), TxError> {
        let live = self
            .bookings
            .select(QueryParams::filter(json!({ "productId": ctx.listing_id })))
            .await
            .map_err(|err| TxError(err.into_inner()))?;
        for booking in live {
            let removed = self
                .bookings
                .delete_if(booking.id.as_str(), json!({ "productId": ctx.listing_id }))
                .await;
            match removed {
                Ok(true) => ctx.dropped.push(booking),
                Ok(false) => {}
                Err(err) => {
                    if let Err(undo) = self.restore(&mut ctx.dropped).await {
                        warn!(
                            listing = %ctx.listing_id,
                            code = undo.0.code.0,
                            "dropped bookings could not be restored"
                        );
                    }
                    return Err(TxError(err.into_inner()));
                }
            }
        }
        Ok(())
    }

    async fn compensate(&self, ctx: &mut ReleaseContext) -> Result<(), TxError> {
        self.restore(&mut ctx.dropped).await
    }
}

struct ReopenListing {
    listings: Arc<dyn Repository<Listing>>,
}

#[async_trait]
impl SagaStep<ReleaseContext> for ReopenListing {
    fn name(&self) -> &'static str {
        "reopen_listing"
    }

    async fn execute(&self, ctx: &mut ReleaseContext) -> Result<(), TxError> {
        let swapped = self
            .listings
            .compare_and_swap(
                ctx.listing_id.as_str(),
                json!({ "status": ListingStatus::Booked }),
                ctx.document.clone(),
            )
            .await
            .map_err(|err| TxError(err.into_inner()))?;
        match swapped {
            Some(listing) => {
                ctx.released = Some(listing);
                Ok(())
            }
            None => Err(TxError::conflict("listing is no longer booked")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ArchivedPrincipal, Principal, Registration};

    struct Fixture {
        store: ListingStore,
        bookings: Arc<InMemoryRepository<Booking>>,
        listings: Arc<InMemoryRepository<Listing>>,
    }

    async fn fixture() -> Fixture {
        let ds = MemoryDatastore::new();
        let directory = Arc::new(RoleDirectory::new(
            Arc::new(InMemoryRepository::<Principal>::new(&ds)),
            Arc::new(InMemoryRepository::<ArchivedPrincipal>::new(&ds)),
        ));
        for (uid, role) in [("s1", Role::Seller), ("s2", Role::Seller), ("b1", Role::Buyer)] {
            directory
                .register(Registration {
                    uid: Id::from(uid),
                    email: format!("{uid}@example.com"),
                    full_name: uid.to_uppercase(),
                    role,
                    profile_photo: None,
                })
                .await
                .unwrap();
        }
        let listings = Arc::new(InMemoryRepository::<Listing>::new(&ds));
        let bookings = Arc::new(InMemoryRepository::<Booking>::new(&ds));
        Fixture {
            store: ListingStore::new(listings.clone(), bookings.clone(), directory),
            bookings,
            listings,
        }
    }

    fn phone(name: &str) -> NewListing {
        serde_json::from_value(json!({
            "name": name,
            "sellingPrice": 250,
            "originalPrice": 700,
            "brandId": "samsung",
            "brand": "Samsung",
            "meetUpLocation": "Dhaka"
        }))
        .unwrap()
    }

    fn seller() -> Actor {
        Actor::new("s1", Role::Seller)
    }

    fn status_patch(status: ListingStatus) -> ListingPatch {
        ListingPatch {
            status: Some(status),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn buyers_cannot_create_listings() {
        let fx = fixture().await;
        let buyer = Actor::new("b1", Role::Buyer);
        let err = fx.store.create(Some(&buyer), phone("S21")).await.unwrap_err();
        assert_eq!(err.http_status(), 403);
    }

    #[tokio::test]
    async fn created_listing_belongs_to_the_caller() {
        let fx = fixture().await;
        let inserted = fx.store.create(Some(&seller()), phone("S21")).await.unwrap();
        assert!(inserted.acknowledged);
        let listing = fx.store.get(&inserted.inserted_id).await.unwrap();
        assert_eq!(listing.seller_id, Id::from("s1"));
        assert_eq!(listing.seller_email, "s1@example.com");
        assert_eq!(listing.status, ListingStatus::Available);
        assert!(!listing.advertise);
    }

    #[tokio::test]
    async fn claimed_uid_must_match() {
        let fx = fixture().await;
        let mut body = phone("S21");
        body.uid = Some(Id::from("s2"));
        let err = fx.store.create(Some(&seller()), body).await.unwrap_err();
        assert_eq!(err.http_status(), 403);
    }

    #[tokio::test]
    async fn brand_and_advertised_views_only_show_available() {
        let fx = fixture().await;
        let a = fx.store.create(Some(&seller()), phone("A")).await.unwrap().inserted_id;
        let b = fx.store.create(Some(&seller()), phone("B")).await.unwrap().inserted_id;
        let advertise = ListingPatch {
            advertise: Some(true),
            ..Default::default()
        };
        fx.store.patch(Some(&seller()), &a, advertise.clone()).await.unwrap();
        fx.store.patch(Some(&seller()), &b, advertise).await.unwrap();
        fx.store
            .patch(Some(&seller()), &b, status_patch(ListingStatus::Sold))
            .await
            .unwrap();

        let brand = fx.store.by_brand("samsung").await.unwrap();
        assert_eq!(brand.len(), 1);
        assert_eq!(brand[0].id, a);
        let advertised = fx.store.advertised().await.unwrap();
        assert_eq!(advertised.len(), 1);
        assert_eq!(advertised[0].id, a);
    }

    #[tokio::test]
    async fn other_sellers_cannot_patch() {
        let fx = fixture().await;
        let id = fx.store.create(Some(&seller()), phone("A")).await.unwrap().inserted_id;
        let other = Actor::new("s2", Role::Seller);
        let err = fx
            .store
            .patch(Some(&other), &id, status_patch(ListingStatus::Removed))
            .await
            .unwrap_err();
        assert_eq!(err.http_status(), 403);
    }

    #[tokio::test]
    async fn admins_patch_but_do_not_delete_foreign_listings() {
        let fx = fixture().await;
        let id = fx.store.create(Some(&seller()), phone("A")).await.unwrap().inserted_id;
        let admin = Actor::new("boss", Role::Admin);
        let advertise = ListingPatch {
            advertise: Some(true),
            ..Default::default()
        };
        assert!(fx.store.patch(Some(&admin), &id, advertise).await.unwrap().advertise);
        let err = fx.store.delete(Some(&admin), &id).await.unwrap_err();
        assert_eq!(err.http_status(), 403);
    }

    #[tokio::test]
    async fn booked_listings_cannot_be_deleted() {
        let fx = fixture().await;
        let id = fx.store.create(Some(&seller()), phone("A")).await.unwrap().inserted_id;
        fx.listings
            .update(id.as_str(), json!({ "status": "booked" }))
            .await
            .unwrap();
        let err = fx.store.delete(Some(&seller()), &id).await.unwrap_err();
        assert_eq!(err.http_status(), 409);
    }

    #[tokio::test]
    async fn deleting_missing_listing_is_not_found() {
        let fx = fixture().await;
        let err = fx.store.delete(Some(&seller()), &Id::from("nope")).await.unwrap_err();
        assert_eq!(err.http_status(), 404);
    }

    #[tokio::test]
    async fn admin_release_drops_the_booking() {
        let fx = fixture().await;
        let id = fx.store.create(Some(&seller()), phone("A")).await.unwrap().inserted_id;
        fx.listings
            .update(id.as_str(), json!({ "status": "booked" }))
            .await
            .unwrap();
        fx.bookings
            .create(&Booking {
                id: Id::from("bk1"),
                product_id: id.clone(),
                seller_id: Id::from("s1"),
                buyer_id: Id::from("b1"),
                buyer_phone_number: "017".into(),
                meet_up_location: "Dhaka".into(),
                payment_status: false,
                created_at: Timestamp::now(),
            })
            .await
            .unwrap();

        let owner_err = fx
            .store
            .patch(Some(&seller()), &id, status_patch(ListingStatus::Available))
            .await
            .unwrap_err();
        assert_eq!(owner_err.http_status(), 409);

        let admin = Actor::new("boss", Role::Admin);
        let released = fx
            .store
            .patch(Some(&admin), &id, status_patch(ListingStatus::Available))
            .await
            .unwrap();
        assert_eq!(released.status, ListingStatus::Available);
        assert!(fx.bookings.get("bk1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn sold_is_terminal() {
        let fx = fixture().await;
        let id = fx.store.create(Some(&seller()), phone("A")).await.unwrap().inserted_id;
        fx.store
            .patch(Some(&seller()), &id, status_patch(ListingStatus::Sold))
            .await
            .unwrap();
        let err = fx
            .store
            .patch(Some(&seller()), &id, status_patch(ListingStatus::Available))
            .await
            .unwrap_err();
        assert_eq!(err.http_status(), 409);
    }

    #[tokio::test]
    async fn mine_requires_matching_uid() {
        let fx = fixture().await;
        fx.store.create(Some(&seller()), phone("A")).await.unwrap();
        let mine = fx.store.mine(Some(&seller()), Some(Id::from("s1"))).await.unwrap();
        assert_eq!(mine.len(), 1);
        let err = fx
            .store
            .mine(Some(&seller()), Some(Id::from("s2")))
            .await
            .unwrap_err();
        assert_eq!(err.http_status(), 403);
    }
}
