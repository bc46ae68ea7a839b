use std::collections::HashSet;

use rand::rngs::SmallRng;
use rand::Rng;

use super::state::{AssetRef, Card, Deck};
use crate::utils::make_rng;

/// 由主题素材生成洗好的成对牌组。
pub struct DeckBuilder {
    rng: SmallRng,
}

impl DeckBuilder {
    pub fn new() -> Self {
        Self {
            rng: make_rng(None),
        }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: make_rng(Some(seed)),
        }
    }

    pub fn build(&mut self, theme_assets: &[AssetRef]) -> Deck {
        build_deck(theme_assets, &mut self.rng)
    }
}

impl Default for DeckBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// 按素材顺序生成未洗的成对卡牌，重复素材只取第一次出现。
pub fn pair_cards(theme_assets: &[AssetRef]) -> Deck {
    let mut seen = HashSet::new();
    theme_assets
        .iter()
        .filter(|asset| seen.insert(asset.as_str()))
        .flat_map(|asset| [Card::new(asset, asset, 1), Card::new(asset, asset, 2)])
        .collect()
}

/// Fisher-Yates 洗牌：从末尾到 1，与 `0..=i` 中均匀选出的位置交换。
pub fn shuffle<T, R: Rng + ?Sized>(items: &mut [T], rng: &mut R) {
    for i in (1..items.len()).rev() {
        let j = rng.gen_range(0..=i);
        items.swap(i, j);
    }
}

pub fn build_deck<R: Rng + ?Sized>(theme_assets: &[AssetRef], rng: &mut R) -> Deck {
    let mut deck = pair_cards(theme_assets);
    shuffle(&mut deck, rng);
    deck
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::state::GameState;
    use rand::SeedableRng;
    use std::collections::HashMap;

    fn assets(names: &[&str]) -> Vec<AssetRef> {
        names.iter().map(|name| format!("/assets/ocean/{name}")).collect()
    }

    fn sorted_ids(deck: &[Card]) -> Vec<String> {
        let mut ids: Vec<String> = deck.iter().map(|card| card.id.clone()).collect();
        ids.sort();
        ids
    }

    #[test]
    fn empty_assets_build_empty_deck() {
        let mut builder = DeckBuilder::with_seed(1);
        assert!(builder.build(&[]).is_empty());
    }

    #[test]
    fn each_asset_yields_two_cards() {
        let mut builder = DeckBuilder::with_seed(3);
        let deck = builder.build(&assets(&["turtle.png", "whale.png", "crab.png"]));
        assert_eq!(deck.len(), 6);
        assert!(GameState::validate_deck(&deck).is_ok());
        assert!(deck.iter().any(|card| card.id == "/assets/ocean/turtle.png-1"));
        assert!(deck.iter().any(|card| card.id == "/assets/ocean/turtle.png-2"));
    }

    #[test]
    fn duplicate_assets_are_collapsed() {
        let deck = pair_cards(&assets(&["turtle.png", "turtle.png"]));
        assert_eq!(deck.len(), 2);
    }

    #[test]
    fn same_seed_builds_same_deck() {
        let input = assets(&["a.png", "b.png", "c.png", "d.png"]);
        let first = DeckBuilder::with_seed(42).build(&input);
        let second = DeckBuilder::with_seed(42).build(&input);
        assert_eq!(first, second);
    }

    #[test]
    fn shuffle_reaches_every_ordering_of_three() {
        let mut rng = SmallRng::seed_from_u64(9);
        let mut seen = HashMap::new();
        for _ in 0..600 {
            let mut items = [0u8, 1, 2];
            shuffle(&mut items, &mut rng);
            *seen.entry(items).or_insert(0usize) += 1;
        }
        assert_eq!(seen.len(), 6);
        assert!(seen.values().all(|count| *count > 50));
    }

    #[cfg(not(target_arch = "wasm32"))]
    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn deck_is_permutation_of_pairs(
                names in proptest::collection::hash_set("[a-z]{1,8}\\.png", 1..12),
                seed in any::<u64>(),
            ) {
                let input: Vec<AssetRef> = names.into_iter().collect();
                let mut rng = SmallRng::seed_from_u64(seed);
                let deck = build_deck(&input, &mut rng);

                prop_assert_eq!(deck.len(), input.len() * 2);
                prop_assert!(GameState::validate_deck(&deck).is_ok());
                prop_assert_eq!(sorted_ids(&deck), sorted_ids(&pair_cards(&input)));
            }
        }
    }
}
