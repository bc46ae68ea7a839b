use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};

/// 单张卡牌实例的唯一标识（同一对卡牌的两张也互不相同）。
pub type CardId = String;
/// 配对键：同一张素材对应的两张卡牌共享该键。
pub type PairKey = String;
/// 素材引用（图片路径或 URL），对核心逻辑不透明。
pub type AssetRef = String;
/// 一局游戏使用的牌组。
pub type Deck = Vec<Card>;

/// 翻开中的卡牌上限。
pub const MAX_REVEALED: usize = 2;
/// 事件日志保留的最近条目数。
pub const MAX_EVENT_LOG: usize = 64;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Card {
    pub id: CardId,
    pub pair_key: PairKey,
    pub asset: AssetRef,
}

impl Card {
    /// 以配对键加实例序号生成卡牌，例如 `ocean/turtle.png-1`。
    pub fn new(pair_key: impl Into<PairKey>, asset: impl Into<AssetRef>, instance: u8) -> Self {
        let pair_key = pair_key.into();
        Self {
            id: format!("{pair_key}-{instance}"),
            pair_key,
            asset: asset.into(),
        }
    }
}

/// 对局阶段。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum GamePhase {
    /// 尚未加载牌组。
    Idle,
    Playing,
    /// 全部配对完成，直到下一局前保持不变。
    Complete,
    /// 主题没有任何素材，牌组为空。
    NoContent,
}

impl Default for GamePhase {
    fn default() -> Self {
        Self::Idle
    }
}

/// 延迟翻回的凭据，由世代号与序号共同确定。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct SettleTicket {
    pub generation: u64,
    pub sequence: u64,
    pub delay_ms: u32,
}

/// 得分：已配对数 / 总对数，始终由状态推导。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Score {
    pub matched_pairs: usize,
    pub total_pairs: usize,
}

/// 游戏事件流。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum GameEvent {
    DeckLoaded {
        generation: u64,
        cards: usize,
    },
    NoContent {
        generation: u64,
    },
    SessionReset {
        generation: u64,
    },
    CardRevealed {
        card_id: CardId,
    },
    CardHidden {
        card_id: CardId,
    },
    PairMatched {
        pair_key: PairKey,
        first: CardId,
        second: CardId,
    },
    PairMismatched {
        first: CardId,
        second: CardId,
        settle: SettleTicket,
    },
    PairSettled {
        first: CardId,
        second: CardId,
    },
    GameCompleted {
        pairs: usize,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, thiserror::Error)]
#[serde(tag = "type")]
pub enum IntegrityError {
    #[error("deck has an odd number of cards ({size})")]
    OddDeckSize { size: usize },
    #[error("card id {card_id} appears more than once")]
    DuplicateCardId { card_id: CardId },
    #[error("pair key {pair_key} is carried by {count} cards")]
    UnpairedCard { pair_key: PairKey, count: usize },
    #[error("card id {card_id} is not part of the deck")]
    UnknownCard { card_id: CardId },
    #[error("only one card of pair {pair_key} is matched")]
    HalfMatchedPair { pair_key: PairKey },
    #[error("card id {card_id} is both revealed and matched")]
    RevealedAndMatched { card_id: CardId },
    #[error("{count} cards are revealed at once")]
    TooManyRevealed { count: usize },
    #[error("completion flag disagrees with the matched set")]
    CompletionMismatch,
}

/// 对局整体状态。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GameState {
    #[serde(default)]
    pub deck: Deck,
    #[serde(default)]
    pub revealed: Vec<CardId>,
    #[serde(default)]
    pub matched: BTreeSet<CardId>,
    #[serde(default)]
    pub is_complete: bool,
    pub phase: GamePhase,
    #[serde(default)]
    pub generation: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pending_settle: Option<SettleTicket>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub event_log: Vec<GameEvent>,
}

impl GameState {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加事件，超出上限时丢弃最早的条目。
    pub fn record_event(&mut self, event: GameEvent) {
        self.event_log.push(event);
        if self.event_log.len() > MAX_EVENT_LOG {
            let excess = self.event_log.len() - MAX_EVENT_LOG;
            self.event_log.drain(..excess);
        }
    }

    pub fn is_playing(&self) -> bool {
        self.phase == GamePhase::Playing
    }

    pub fn is_finished(&self) -> bool {
        self.phase == GamePhase::Complete
    }

    pub fn has_no_content(&self) -> bool {
        self.phase == GamePhase::NoContent
    }

    pub fn find_card(&self, card_id: &str) -> Option<&Card> {
        self.deck.iter().find(|card| card.id == card_id)
    }

    pub fn is_matched(&self, card_id: &str) -> bool {
        self.matched.contains(card_id)
    }

    pub fn all_matched(&self) -> bool {
        !self.deck.is_empty() && self.matched.len() == self.deck.len()
    }

    pub fn score(&self) -> Score {
        Score {
            matched_pairs: self.matched.len() / 2,
            total_pairs: self.deck.len() / 2,
        }
    }

    /// 校验牌组结构：偶数张、id 唯一、每个配对键恰好两张。
    pub fn validate_deck(deck: &[Card]) -> Result<(), IntegrityError> {
        if deck.len() % 2 != 0 {
            return Err(IntegrityError::OddDeckSize { size: deck.len() });
        }

        let mut seen = HashSet::new();
        let mut pair_counts: HashMap<&str, usize> = HashMap::new();
        for card in deck {
            if !seen.insert(card.id.as_str()) {
                return Err(IntegrityError::DuplicateCardId {
                    card_id: card.id.clone(),
                });
            }
            *pair_counts.entry(card.pair_key.as_str()).or_default() += 1;
        }

        // 按牌组顺序报告，保证错误信息稳定
        for card in deck {
            let count = pair_counts[card.pair_key.as_str()];
            if count != 2 {
                return Err(IntegrityError::UnpairedCard {
                    pair_key: card.pair_key.clone(),
                    count,
                });
            }
        }

        Ok(())
    }

    pub fn integrity_check(&self) -> Result<(), IntegrityError> {
        Self::validate_deck(&self.deck)?;

        if self.revealed.len() > MAX_REVEALED {
            return Err(IntegrityError::TooManyRevealed {
                count: self.revealed.len(),
            });
        }

        for card_id in self.revealed.iter().chain(self.matched.iter()) {
            if self.find_card(card_id).is_none() {
                return Err(IntegrityError::UnknownCard {
                    card_id: card_id.clone(),
                });
            }
        }

        for card_id in &self.revealed {
            if self.is_matched(card_id) {
                return Err(IntegrityError::RevealedAndMatched {
                    card_id: card_id.clone(),
                });
            }
        }

        for card in &self.deck {
            if !self.is_matched(&card.id) {
                continue;
            }
            let partner_matched = self
                .deck
                .iter()
                .filter(|other| other.pair_key == card.pair_key && other.id != card.id)
                .all(|other| self.is_matched(&other.id));
            if !partner_matched {
                return Err(IntegrityError::HalfMatchedPair {
                    pair_key: card.pair_key.clone(),
                });
            }
        }

        if self.is_complete != self.all_matched() {
            return Err(IntegrityError::CompletionMismatch);
        }

        Ok(())
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self {
            deck: Vec::new(),
            revealed: Vec::new(),
            matched: BTreeSet::new(),
            is_complete: false,
            phase: GamePhase::default(),
            generation: 0,
            pending_settle: None,
            theme: None,
            event_log: Vec::new(),
        }
    }
}
