//! ID generation utilities.

use uuid::Uuid;

/// ID generator for entities.
#[derive(Debug, Clone, Default)]
pub struct IdGenerator {
    _private: (),
}

impl IdGenerator {
    /// Create a new ID generator.
    #[must_use]
    pub const fn new() -> Self {
        Self { _private: () }
    }

    /// Generate a new random UUID v4, hyphenated.
    ///
    /// Entity primary keys are generated application-side at insert time.
    #[must_use]
    pub fn generate(&self) -> String {
        Uuid::new_v4().to_string()
    }

    /// Generate an opaque random token (bearer, verification, reset).
    #[must_use]
    pub fn generate_token(&self) -> String {
        // Simple UUID without hyphens (no time component)
        Uuid::new_v4().simple().to_string()
    }
}
