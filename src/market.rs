//! Wiring of the marketplace services over one set of collections.

use std::sync::Arc;

use uphone_auth::prelude::*;
use uphone_storage::prelude::*;

use crate::bookings::BookingWorkflow;
use crate::config::{PaymentsMode, ServerConfig};
use crate::directory::RoleDirectory;
use crate::listings::ListingStore;
use crate::model::{ArchivedPrincipal, Booking, Listing, Principal, Report};
use crate::moderation::Moderation;
use crate::payments::{DisabledGateway, PaymentGateway, PaymentService, SandboxGateway};

/// The five collections the marketplace persists to.
#[derive(Clone)]
pub struct Repositories {
    pub principals: Arc<dyn Repository<Principal>>,
    pub archived_principals: Arc<dyn Repository<ArchivedPrincipal>>,
    pub listings: Arc<dyn Repository<Listing>>,
    pub bookings: Arc<dyn Repository<Booking>>,
    pub reports: Arc<dyn Repository<Report>>,
}

impl Repositories {
    pub fn in_memory(store: &MemoryDatastore) -> Self {
        Self {
            principals: Arc::new(InMemoryRepository::<Principal>::new(store)),
            archived_principals: Arc::new(InMemoryRepository::<ArchivedPrincipal>::new(store)),
            listings: Arc::new(InMemoryRepository::<Listing>::new(store)),
            bookings: Arc::new(InMemoryRepository::<Booking>::new(store)),
            reports: Arc::new(InMemoryRepository::<Report>::new(store)),
        }
    }
}

pub struct Marketplace {
    directory: Arc<RoleDirectory>,
    listings: ListingStore,
    bookings: BookingWorkflow,
    moderation: Moderation,
    payments: PaymentService,
    authenticator: Arc<dyn Authenticator>,
    issuer: Arc<dyn TokenIssuer>,
    issues_tokens: bool,
}

impl Marketplace {
    pub fn new(
        repos: Repositories,
        jwt: Arc<JwtAuthenticator>,
        gateway: Arc<dyn PaymentGateway>,
        currency: &str,
    ) -> Self {
        let directory = Arc::new(RoleDirectory::new(
            repos.principals.clone(),
            repos.archived_principals.clone(),
        ));
        Self {
            listings: ListingStore::new(
                repos.listings.clone(),
                repos.bookings.clone(),
                directory.clone(),
            ),
            bookings: BookingWorkflow::new(
                repos.listings.clone(),
                repos.bookings.clone(),
                directory.clone(),
            ),
            moderation: Moderation::new(repos.reports, repos.listings, directory.clone()),
            payments: PaymentService::new(gateway, currency),
            authenticator: jwt.clone(),
            issuer: jwt,
            issues_tokens: false,
            directory,
        }
    }

    /// Token issuance starts disabled; see `AuthConfig::issue_tokens`.
    pub fn with_token_issuance(mut self, enabled: bool) -> Self {
        self.issues_tokens = enabled;
        self
    }

    /// In-memory marketplace configured from `config`.
    pub fn from_config(config: &ServerConfig) -> Self {
        let jwt = Arc::new(JwtAuthenticator::new(
            config.auth.token_secret.as_bytes(),
            config.auth.token_ttl_secs,
        ));
        let gateway: Arc<dyn PaymentGateway> = match config.payments.mode {
            PaymentsMode::Sandbox => Arc::new(SandboxGateway),
            PaymentsMode::Disabled => Arc::new(DisabledGateway),
        };
        Self::new(
            Repositories::in_memory(&MemoryDatastore::new()),
            jwt,
            gateway,
            &config.payments.currency,
        )
        .with_token_issuance(config.auth.issue_tokens)
    }

    pub fn directory(&self) -> &RoleDirectory {
        &self.directory
    }

    pub fn listings(&self) -> &ListingStore {
        &self.listings
    }

    pub fn bookings(&self) -> &BookingWorkflow {
        &self.bookings
    }

    pub fn moderation(&self) -> &Moderation {
        &self.moderation
    }

    pub fn payments(&self) -> &PaymentService {
        &self.payments
    }

    pub fn authenticator(&self) -> &dyn Authenticator {
        self.authenticator.as_ref()
    }

    pub fn issues_tokens(&self) -> bool {
        self.issues_tokens
    }

    /// `None` while token issuance is disabled.
    pub fn issuer(&self) -> Option<&dyn TokenIssuer> {
        self.issues_tokens.then(|| self.issuer.as_ref())
    }
}
