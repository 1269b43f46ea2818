//! A builder holding a mutable borrow.

/// Appends prefixed events to a borrowed log.
#[derive(Debug, buildergen::Builder)]
pub struct Recorder<'a> {
    /// Log the events go to.
    pub events: &'a mut Vec<String>,
    /// Prepended to every event.
    pub prefix: String,
}

impl Recorder<'_> {
    /// Append `event` to the log.
    pub fn record(&mut self, event: &str) { self.events.push(format!("{}{event}", self.prefix)); }
}
