use thiserror::Error;

/// Failures surfaced by constraint reduction and resolution.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum InferenceError {
    /// The bound set reached the terminal `false` state: two facts about the
    /// same inference variables cannot both hold. The message names the
    /// offending types in Java-like notation.
    #[error("contradiction: {0}")]
    Contradiction(String),

    /// A reduction rule met a type shape it has no case for.
    ///
    /// Well-formed inputs never take this path; it exists so malformed type
    /// expressions (a bare wildcard used as a type, say) fail loudly instead
    /// of deriving nonsense bounds.
    #[error("unsupported type shape in {context}: {rendered}")]
    UnsupportedShape {
        context: &'static str,
        rendered: String,
    },

    /// Misuse of the API: a bound referenced an inference variable that is
    /// not registered in the target bound set, or a capture was registered
    /// twice for the same variable.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),
}
