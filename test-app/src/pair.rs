//! The smallest useful builder.

/// One required and one optional value.
#[derive(Debug, Clone, PartialEq, Eq, buildergen::Builder)]
pub struct Pair {
    /// Must be set before `build()`.
    pub a: String,
    /// Left as `None` unless set.
    pub b: Option<String>,
}
