//! Types whose builders are generated by this crate's build script.

pub mod account;
pub mod defaults;
pub mod inventory;
pub mod labeled;
pub mod markers;
pub mod pair;
pub mod recorder;
pub mod scores;
