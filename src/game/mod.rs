//! 游戏核心逻辑模块（牌组生成、状态机、配置）。

pub mod config;
pub mod deck;
pub mod rules;
pub mod state;

pub use config::GameConfig;
pub use deck::{build_deck, pair_cards, shuffle, DeckBuilder};
pub use rules::{IgnoreReason, MatchEngine, RuleError, RuleResolution};
pub use state::{
    AssetRef,
    Card,
    CardId,
    Deck,
    GameEvent,
    GamePhase,
    GameState,
    IntegrityError,
    PairKey,
    Score,
    SettleTicket,
};
