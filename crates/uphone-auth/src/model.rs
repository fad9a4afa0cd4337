use serde::{Deserialize, Serialize};
use uphone_types::prelude::*;

#[derive(Clone, Debug)]
pub enum AuthnInput {
    BearerJwt(String),
}

/// Output of the principal resolver: who the credential belongs to.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VerifiedPrincipal {
    pub principal_id: Id,
    #[serde(default)]
    pub claims: serde_json::Map<String, serde_json::Value>,
}

impl VerifiedPrincipal {
    pub fn email(&self) -> Option<&str> {
        self.claims.get("email").and_then(|v| v.as_str())
    }
}

/// A verified principal after the role directory lookup.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: Id,
    pub role: Role,
}

impl Actor {
    pub fn new(id: impl Into<Id>, role: Role) -> Self {
        Self {
            id: id.into(),
            role,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    /// Public catalog and profile reads.
    Browse,
    ListPrincipals,
    PatchProfile,
    ArchivePrincipal,
    CreateListing,
    ListOwnListings,
    PatchListing,
    DeleteListing,
    CreateBooking,
    ListOwnBookings,
    PatchBooking,
    CreateReport,
    ListReports,
    DeleteReport,
    CreatePaymentIntent,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Ownership {
    NotRequired,
    /// Only a listed owner; admins get no override.
    Owner,
    OwnerOrAdmin,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Requirement {
    pub authenticated: bool,
    pub ownership: Ownership,
    pub roles: Option<&'static [Role]>,
}

const SELLERS: &[Role] = &[Role::Seller, Role::Admin];
const ADMINS: &[Role] = &[Role::Admin];

impl Requirement {
    const PUBLIC: Requirement = Requirement {
        authenticated: false,
        ownership: Ownership::NotRequired,
        roles: None,
    };

    const SIGNED_IN: Requirement = Requirement {
        authenticated: true,
        ownership: Ownership::NotRequired,
        roles: None,
    };

    const fn owned(ownership: Ownership) -> Requirement {
        Requirement {
            authenticated: true,
            ownership,
            roles: None,
        }
    }

    const fn role(roles: &'static [Role]) -> Requirement {
        Requirement {
            authenticated: true,
            ownership: Ownership::NotRequired,
            roles: Some(roles),
        }
    }
}

impl Action {
    pub const ALL: [Action; 15] = [
        Action::Browse,
        Action::ListPrincipals,
        Action::PatchProfile,
        Action::ArchivePrincipal,
        Action::CreateListing,
        Action::ListOwnListings,
        Action::PatchListing,
        Action::DeleteListing,
        Action::CreateBooking,
        Action::ListOwnBookings,
        Action::PatchBooking,
        Action::CreateReport,
        Action::ListReports,
        Action::DeleteReport,
        Action::CreatePaymentIntent,
    ];

    /// The complete rule table. Handlers never decide access on their own.
    pub const fn requirement(self) -> Requirement {
        match self {
            Action::Browse => Requirement::PUBLIC,
            Action::ListPrincipals => Requirement::role(ADMINS),
            Action::PatchProfile => Requirement::owned(Ownership::Owner),
            Action::ArchivePrincipal => Requirement::owned(Ownership::OwnerOrAdmin),
            Action::CreateListing => Requirement::role(SELLERS),
            Action::ListOwnListings => Requirement::SIGNED_IN,
            Action::PatchListing => Requirement::owned(Ownership::OwnerOrAdmin),
            Action::DeleteListing => Requirement::owned(Ownership::Owner),
            Action::CreateBooking => Requirement::SIGNED_IN,
            Action::ListOwnBookings => Requirement::SIGNED_IN,
            Action::PatchBooking => Requirement::owned(Ownership::OwnerOrAdmin),
            Action::CreateReport => Requirement::SIGNED_IN,
            Action::ListReports => Requirement::role(ADMINS),
            Action::DeleteReport => Requirement::role(ADMINS),
            Action::CreatePaymentIntent => Requirement::SIGNED_IN,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Action::Browse => "browse",
            Action::ListPrincipals => "list_principals",
            Action::PatchProfile => "patch_profile",
            Action::ArchivePrincipal => "archive_principal",
            Action::CreateListing => "create_listing",
            Action::ListOwnListings => "list_own_listings",
            Action::PatchListing => "patch_listing",
            Action::DeleteListing => "delete_listing",
            Action::CreateBooking => "create_booking",
            Action::ListOwnBookings => "list_own_bookings",
            Action::PatchBooking => "patch_booking",
            Action::CreateReport => "create_report",
            Action::ListReports => "list_reports",
            Action::DeleteReport => "delete_report",
            Action::CreatePaymentIntent => "create_payment_intent",
        }
    }
}

/// What an action targets, as far as the guard cares.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Resource {
    pub kind: &'static str,
    pub owners: Vec<Id>,
    /// An identifier taken from the request that claims to be the caller's own.
    pub claimed: Option<Id>,
}

impl Resource {
    pub fn new(kind: &'static str) -> Self {
        Self {
            kind,
            ..Default::default()
        }
    }

    pub fn owned_by(mut self, owner: Id) -> Self {
        self.owners.push(owner);
        self
    }

    pub fn claiming(mut self, claimed: Option<Id>) -> Self {
        self.claimed = claimed;
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DenyReason {
    Unauthenticated,
    ClaimedIdMismatch,
    NotOwner,
    RoleNotPermitted,
}

impl DenyReason {
    pub const fn as_str(self) -> &'static str {
        match self {
            DenyReason::Unauthenticated => "unauthenticated",
            DenyReason::ClaimedIdMismatch => "claimed_id_mismatch",
            DenyReason::NotOwner => "not_owner",
            DenyReason::RoleNotPermitted => "role_not_permitted",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(DenyReason),
}

impl Decision {
    pub fn is_allow(&self) -> bool {
        matches!(self, Decision::Allow)
    }
}
