//! # payload-guard-api
//!
//! Error reporter and wire formats.
//! This crate depends only on `engine` and `shared`.

/// API v1 envelope, reporter and builder.
pub mod v1;

/// Returns the api crate version.
#[must_use]
pub const fn api_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;
    use payload_guard_shared::shared_crate_version;

    #[test]
    fn api_crate_compiles() {
        let version = api_crate_version();
        assert!(!version.is_empty());
        assert_eq!(version, shared_crate_version());
    }
}
