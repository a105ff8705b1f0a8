//! Compile-time helpers for carrying validated invariants.

/// Proof wrapper indicating a value has passed validation.
///
/// The wrapped value is never modified by the validator; the wrapper only
/// records that the checks ran and succeeded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Validated<T>(T);

impl<T> Validated<T> {
    /// Wrap a validated value.
    pub const fn new(value: T) -> Self {
        Self(value)
    }

    /// Borrow the inner value.
    pub const fn as_ref(&self) -> &T {
        &self.0
    }

    /// Consume and return the inner value.
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> std::ops::Deref for Validated<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validated_exposes_inner_value_unchanged() {
        let validated = Validated::new(String::from("my-post-1"));

        assert_eq!(validated.len(), 9);
        assert_eq!(validated.as_ref(), "my-post-1");
        assert_eq!(validated.into_inner(), "my-post-1");
    }
}
