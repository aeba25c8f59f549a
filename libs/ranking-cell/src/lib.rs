pub mod distance;
pub mod scoring;

pub use distance::{DistanceService, MockDistanceService, RemoteDistanceService};
pub use scoring::{rank_offers, score_offer, Weights};
