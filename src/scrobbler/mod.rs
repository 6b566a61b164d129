// Scrobbler module
// Reporting clients for the scrobbling service

pub mod error;
pub mod lastfm;
pub mod lastfm_auth;
pub mod signature;
pub mod traits;
pub mod transport;
