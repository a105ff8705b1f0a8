//! Per-request storage for validated objects.

use payload_guard_api::v1::ValidationTarget;
use payload_guard_engine::Validated;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;

/// Request part a validated object came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestSource {
    /// JSON body.
    Body,
    /// Query string.
    Query,
    /// Route parameters.
    Params,
    /// Headers.
    Headers,
}

impl RequestSource {
    /// Every source, in request order.
    pub const ALL: [Self; 4] = [Self::Body, Self::Query, Self::Params, Self::Headers];

    /// Scope key the object is stored under.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Body => "validated_body",
            Self::Query => "validated_query",
            Self::Params => "validated_params",
            Self::Headers => "validated_headers",
        }
    }

    /// Target named in envelopes for failures of this source.
    #[must_use]
    pub const fn target(self) -> ValidationTarget {
        match self {
            Self::Body => ValidationTarget::Body,
            Self::Query => ValidationTarget::Query,
            Self::Params => ValidationTarget::Params,
            Self::Headers => ValidationTarget::Headers,
        }
    }

    /// Parse a source name (`body`, `query`, `params`, `headers`).
    #[must_use]
    pub fn parse(input: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|source| source.target().as_str().eq_ignore_ascii_case(input.trim()))
    }
}

impl fmt::Display for RequestSource {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.key())
    }
}

/// Validated objects of one request, keyed by source.
///
/// Lookups are typed: asking for the wrong type, the wrong source, or a
/// source that was never validated all yield `None`.
#[derive(Default)]
pub struct RequestScope {
    entries: HashMap<RequestSource, Box<dyn Any + Send + Sync>>,
}

impl RequestScope {
    /// Empty scope.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `value` under `source`, replacing any earlier object.
    pub fn insert<T: Send + Sync + 'static>(&mut self, source: RequestSource, value: Validated<T>) {
        self.entries.insert(source, Box::new(value));
    }

    /// Validated object stored under `source`, when it has type `T`.
    #[must_use]
    pub fn get<T: 'static>(&self, source: RequestSource) -> Option<&Validated<T>> {
        self.entries
            .get(&source)
            .and_then(|value| value.downcast_ref::<Validated<T>>())
    }

    /// Remove and return the object under `source`, when it has type `T`.
    /// An object of another type is left in place.
    pub fn take<T: 'static>(&mut self, source: RequestSource) -> Option<Validated<T>> {
        if self.get::<T>(source).is_none() {
            return None;
        }
        self.entries
            .remove(&source)
            .and_then(|value| value.downcast::<Validated<T>>().ok())
            .map(|value| *value)
    }

    /// Whether anything was stored under `source`.
    #[must_use]
    pub fn contains(&self, source: RequestSource) -> bool {
        self.entries.contains_key(&source)
    }

    /// Validated body.
    #[must_use]
    pub fn validated_body<T: 'static>(&self) -> Option<&Validated<T>> {
        self.get(RequestSource::Body)
    }

    /// Validated query.
    #[must_use]
    pub fn validated_query<T: 'static>(&self) -> Option<&Validated<T>> {
        self.get(RequestSource::Query)
    }

    /// Validated route parameters.
    #[must_use]
    pub fn validated_params<T: 'static>(&self) -> Option<&Validated<T>> {
        self.get(RequestSource::Params)
    }

    /// Validated headers.
    #[must_use]
    pub fn validated_headers<T: 'static>(&self) -> Option<&Validated<T>> {
        self.get(RequestSource::Headers)
    }
}

impl fmt::Debug for RequestScope {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<&str> = self.entries.keys().map(|source| source.key()).collect();
        keys.sort_unstable();
        formatter
            .debug_struct("RequestScope")
            .field("entries", &keys)
            .finish()
    }
}
