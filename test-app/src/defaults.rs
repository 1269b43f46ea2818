//! Fields that start with a value.

/// Connection settings with defaults for everything but the user.
#[derive(Debug, Clone, PartialEq, Eq, buildergen::Builder)]
pub struct Settings {
    /// Host name.
    #[builder(default = "localhost")]
    pub host:    String,
    /// Port number.
    #[builder(default = "8080")]
    pub port:    u16,
    /// Reconnect attempts before giving up.
    #[builder(default = "Some(3)")]
    pub retries: Option<u8>,
    /// Labels attached to the connection.
    #[builder(default = "Vec::new()")]
    pub tags:    Vec<String>,
    /// Timeout in seconds, `None` to wait forever.
    #[builder(default = "30")]
    pub timeout: Option<u32>,
    /// User to connect as.
    pub user:    String,
}
