//! A builder for an associated constructor.

/// An account that can only be opened through [`Account::open`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    id:    u64,
    owner: String,
    label: Option<String>,
}

impl Account {
    /// Open an account for `owner`.
    #[buildergen::builder]
    pub fn open(owner: String, #[builder(default = "1")] id: u64) -> Self {
        Self { id, owner, label: None }
    }

    /// Account number.
    #[must_use]
    pub const fn id(&self) -> u64 { self.id }

    /// Account holder.
    #[must_use]
    pub fn owner(&self) -> String { self.owner.clone() }

    /// Display label, if one was given.
    #[must_use]
    pub fn label(&self) -> Option<&str> { self.label.as_deref() }

    /// Attach a display label.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

buildergen::include_builder!(AccountBuilder);
