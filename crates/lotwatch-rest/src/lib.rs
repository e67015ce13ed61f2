//! REST pull client for the parking backend.
//!
//! Covers the occupancy pull endpoints used by the fallback poller plus the
//! authorized endpoints (profile, vehicles, permit-filtered lots) and the
//! bearer-token session they rely on.

pub mod client;
pub mod error;
pub mod models;
pub mod session;

pub use client::ParkingApiClient;
pub use error::{RestError, RestResult};
pub use models::{
    is_lot_restricted, ActiveEvent, DashboardLot, NewVehicle, PermitType, Profile, RestSpot,
    RestrictedLot, Vehicle,
};
pub use session::{Session, TokenPair};
