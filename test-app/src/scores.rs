//! A builder whose field type comes from a constructor parameter.

use std::collections::BTreeMap;

/// Scores per player; players without a score are left out.
#[derive(Debug, Clone, PartialEq, Eq, buildergen::Builder)]
pub struct Scores {
    values: BTreeMap<String, u32>,
}

impl Scores {
    /// Keep only the players that have a score.
    #[buildergen::constructor]
    pub fn new(#[builder(nullable_element)] values: BTreeMap<String, Option<u32>>) -> Self {
        Self {
            values: values
                .into_iter()
                .filter_map(|(player, score)| score.map(|score| (player, score)))
                .collect(),
        }
    }

    /// Score of `player`.
    #[must_use]
    pub fn get(&self, player: &str) -> Option<u32> { self.values.get(player).copied() }

    /// Number of players with a score.
    #[must_use]
    pub fn len(&self) -> usize { self.values.len() }

    /// Whether no player has a score.
    #[must_use]
    pub fn is_empty(&self) -> bool { self.values.is_empty() }
}
