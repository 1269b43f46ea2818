//! Builders for types declared in other modules.

/// Requests `PairMaker`.
#[buildergen::builder_of(target = crate::pair::Pair, suffix = "Maker")]
pub struct ForPair;

/// Requests `AccountFactory`, shaped after `Account::open`.
#[buildergen::builder_of(target = crate::account::Account, suffix = "Factory", use_constructors = true)]
pub struct ForAccount;
