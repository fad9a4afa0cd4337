//! Bearer-token authentication and the access-control guard.
//!
//! `authn` turns a credential into a verified principal; `guard` decides
//! whether an actor may perform an action on a resource.

pub mod authn;
pub mod errors;
pub mod guard;
pub mod model;
pub mod observe;
pub mod prelude;
