//! uPhone marketplace backend
//!
//! Listings of second-hand phones, bookings that reserve them, reports for
//! moderation and the access rules tying them to principals.

mod access;
pub mod bookings;
pub mod config;
pub mod directory;
pub mod errors;
pub mod listings;
pub mod market;
pub mod metrics;
pub mod model;
pub mod moderation;
pub mod payments;
pub mod server;

pub use config::ServerConfig;
pub use errors::{MarketError, MarketResult};
pub use market::{Marketplace, Repositories};
