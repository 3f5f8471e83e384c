//! Cache-Control values shared by handlers.

use actix_web::http::header::{self, HeaderName};

/// Per-user responses: browsers may keep them but must revalidate.
pub const PRIVATE_NO_CACHE: &str = "private, no-cache, must-revalidate";

/// Health and payment responses that must never be stored.
pub const NO_STORE: &str = "no-store";

/// Header pair for per-user listings such as notifications and deposits.
pub const fn private_no_cache_header() -> (HeaderName, &'static str) {
    (header::CACHE_CONTROL, PRIVATE_NO_CACHE)
}

/// Header pair for responses that must bypass every cache.
pub const fn no_store_header() -> (HeaderName, &'static str) {
    (header::CACHE_CONTROL, NO_STORE)
}
