//! Viessmann cloud integration
//!
//! - `token`: bearer token model and expiry check
//! - `pkce`: proof key generation
//! - `identity`: OAuth2 client with cache-first lookup
//! - `features`: IoT feature payloads
//! - `telemetry`: feature fetch and normalization into [`crate::pv::PhotovoltaicSnapshot`]

pub mod features;
pub mod identity;
pub mod pkce;
pub mod telemetry;
pub mod token;

pub use identity::{AuthFlow, IdentityClient};
pub use pkce::PkcePair;
pub use telemetry::TelemetryClient;
pub use token::{BearerToken, is_valid};
