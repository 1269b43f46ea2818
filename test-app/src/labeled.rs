//! A builder for a generic type.

/// A value with a label.
#[derive(Debug, Clone, PartialEq, Eq, buildergen::Builder)]
pub struct Labeled<T>
where
    T: Clone,
{
    /// What the value is.
    pub label: String,
    /// The value.
    pub value: T,
}
