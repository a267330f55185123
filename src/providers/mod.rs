//! Outbound clients for third-party mapping providers.

pub mod google_maps;

pub use google_maps::{DistanceMatrix, GoogleMapsClient, ProviderError};
