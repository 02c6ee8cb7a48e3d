//! Centralized branding constants
//!
//! All product naming and fixed defaults come from this module.

/// Human-readable product name
pub const DISPLAY_NAME: &str = "CF Broker Proxy";

/// Short identifier used for the binary, the basic-auth realm and log prefixes
pub const IDENTIFIER: &str = "cf-broker-proxy";

/// Port used when `PORT` is not set
pub const DEFAULT_PORT: u16 = 8080;

/// Major OSB API version this broker implements
pub const OSB_API_MAJOR_VERSION: u32 = 2;

/// Maximum length of a catalog description accepted by the platform
pub const MAX_DESCRIPTION_CHARS: usize = 254;

/// User agent sent to the Cloud Controller and UAA
pub fn user_agent() -> String {
    format!("{}/{}", IDENTIFIER, env!("CARGO_PKG_VERSION"))
}
