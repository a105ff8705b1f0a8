//! # payload-guard-adapters
//!
//! Request-scope adapter. Binds the body, query, route parameters, or headers
//! of a request into a declared shape, validates it, and stores the validated
//! object in a per-request [`RequestScope`]. Failures become error envelopes
//! ready to be written back.
//!
//! This crate depends on `engine`, `api`, and `shared`; it never reads
//! configuration files.

pub mod guard;
pub mod request;
pub mod scope;

pub use guard::{DETAIL_METADATA_PREFIX, Rejection, RejectionKind, RequestGuard};
pub use request::{HeaderMap, RequestData, parse_query_string};
pub use scope::{RequestScope, RequestSource};

/// Crate version, for diagnostics.
#[must_use]
pub const fn adapters_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;
    use payload_guard_api::api_crate_version;
    use payload_guard_shared::shared_crate_version;

    fn workspace_deps() -> Vec<String> {
        let cargo_toml = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/Cargo.toml"));
        let mut deps = Vec::new();
        let mut in_deps = false;

        for raw_line in cargo_toml.lines() {
            let line = raw_line.split('#').next().unwrap_or("").trim();
            if line.is_empty() {
                continue;
            }
            if line.starts_with('[') {
                in_deps = line == "[dependencies]" || line == "[dev-dependencies]";
                continue;
            }
            if in_deps && line.starts_with("payload-guard-") {
                let key = line.split('=').next().unwrap_or("").trim();
                deps.push(key.split('.').next().unwrap_or("").trim().to_string());
            }
        }

        deps
    }

    #[test]
    fn adapters_do_not_depend_on_config_or_cli() {
        let forbidden = ["payload-guard-config", "payload-guard-cli"];
        for dep in workspace_deps() {
            assert!(
                !forbidden.contains(&dep.as_str()),
                "forbidden dependency found: {dep}"
            );
        }
    }

    #[test]
    fn adapters_can_use_api_and_shared() {
        assert!(!adapters_crate_version().is_empty());
        assert_eq!(api_crate_version(), shared_crate_version());
    }
}
