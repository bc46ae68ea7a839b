use serde::{Deserialize, Serialize};

use super::{
    config::GameConfig,
    state::{
        Deck, GameEvent, GamePhase, GameState, IntegrityError, Score, SettleTicket, MAX_REVEALED,
    },
};
use crate::utils;

/// 翻牌请求或翻回事件被忽略的原因。被忽略时状态保持不变。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum IgnoreReason {
    NotPlaying,
    /// 卡牌不在当前牌组中，只记录警告。
    UnknownCard,
    AlreadyMatched,
    /// 两张不同的牌正等待翻回。
    AwaitingSettle,
    StaleSettle,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, thiserror::Error)]
#[serde(tag = "type")]
pub enum RuleError {
    #[error("a session is in progress; reset before loading a new deck")]
    SessionInProgress,
    #[error("invalid deck: {error}")]
    InvalidDeck { error: IntegrityError },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleResolution {
    pub state: GameState,
    pub events: Vec<GameEvent>,
    pub score: Score,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ignored: Option<IgnoreReason>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub settle: Option<SettleTicket>,
}

impl RuleResolution {
    pub fn new(state: GameState, events: Vec<GameEvent>) -> Self {
        let score = state.score();
        Self {
            state,
            events,
            score,
            ignored: None,
            settle: None,
        }
    }

    pub fn ignored(state: GameState, reason: IgnoreReason) -> Self {
        let mut resolution = Self::new(state, Vec::new());
        resolution.ignored = Some(reason);
        resolution
    }

    pub fn with_settle(mut self, settle: Option<SettleTicket>) -> Self {
        self.settle = settle;
        self
    }

    pub fn is_ignored(&self) -> bool {
        self.ignored.is_some()
    }
}

/// 对局状态机：持有当前对局并执行翻牌、配对、翻回与完成判定。
pub struct MatchEngine {
    state: GameState,
    settle_delay_ms: u32,
    settle_sequence: u64,
}

impl MatchEngine {
    pub fn new(config: &GameConfig) -> Self {
        Self {
            state: GameState::new(),
            settle_delay_ms: config.settle_delay_ms,
            settle_sequence: 0,
        }
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn phase(&self) -> GamePhase {
        self.state.phase
    }

    pub fn score(&self) -> Score {
        self.state.score()
    }

    fn ignore(&self, reason: IgnoreReason) -> RuleResolution {
        RuleResolution::ignored(self.state.clone(), reason)
    }

    fn emit(&mut self, events: &mut Vec<GameEvent>, event: GameEvent) {
        self.state.record_event(event.clone());
        events.push(event);
    }

    pub fn load_deck(&mut self, deck: Deck) -> Result<RuleResolution, RuleError> {
        self.start_session(None, deck)
    }

    pub fn load_themed_deck(
        &mut self,
        theme: impl Into<String>,
        deck: Deck,
    ) -> Result<RuleResolution, RuleError> {
        self.start_session(Some(theme.into()), deck)
    }

    fn start_session(
        &mut self,
        theme: Option<String>,
        deck: Deck,
    ) -> Result<RuleResolution, RuleError> {
        if self.state.is_playing() {
            return Err(RuleError::SessionInProgress);
        }
        GameState::validate_deck(&deck).map_err(|error| RuleError::InvalidDeck { error })?;

        let generation = self.state.generation + 1;
        let cards = deck.len();
        self.state = GameState {
            deck,
            generation,
            theme,
            ..GameState::default()
        };

        let mut events = Vec::new();
        if cards == 0 {
            self.state.phase = GamePhase::NoContent;
            self.emit(&mut events, GameEvent::NoContent { generation });
        } else {
            self.state.phase = GamePhase::Playing;
            self.emit(&mut events, GameEvent::DeckLoaded { generation, cards });
        }

        Ok(RuleResolution::new(self.state.clone(), events))
    }

    /// 丢弃当前对局回到 `Idle`，并使尚未触发的翻回失效。
    pub fn reset(&mut self) -> RuleResolution {
        let generation = self.state.generation + 1;
        self.state = GameState {
            generation,
            ..GameState::default()
        };
        let mut events = Vec::new();
        self.emit(&mut events, GameEvent::SessionReset { generation });
        RuleResolution::new(self.state.clone(), events)
    }

    fn ensure_revealable(&self, card_id: &str) -> Result<(), IgnoreReason> {
        if !self.state.is_playing() {
            return Err(IgnoreReason::NotPlaying);
        }
        if self.state.find_card(card_id).is_none() {
            utils::warn(&format!("ignoring reveal of unknown card {card_id}"));
            return Err(IgnoreReason::UnknownCard);
        }
        if self.state.is_matched(card_id) {
            return Err(IgnoreReason::AlreadyMatched);
        }
        if self.state.revealed.len() >= MAX_REVEALED {
            return Err(IgnoreReason::AwaitingSettle);
        }
        Ok(())
    }

    pub fn request_reveal(&mut self, card_id: &str) -> RuleResolution {
        if let Err(reason) = self.ensure_revealable(card_id) {
            return self.ignore(reason);
        }

        let mut events = Vec::new();

        // 唯一翻开的牌再次点击时翻回
        if self.state.revealed.len() == 1 && self.state.revealed[0] == card_id {
            self.state.revealed.clear();
            self.emit(
                &mut events,
                GameEvent::CardHidden {
                    card_id: card_id.to_string(),
                },
            );
            return RuleResolution::new(self.state.clone(), events);
        }

        self.state.revealed.push(card_id.to_string());
        self.emit(
            &mut events,
            GameEvent::CardRevealed {
                card_id: card_id.to_string(),
            },
        );

        let mut settle = None;
        if self.state.revealed.len() == MAX_REVEALED {
            settle = self.compare_revealed(&mut events);
        }

        RuleResolution::new(self.state.clone(), events).with_settle(settle)
    }

    fn compare_revealed(&mut self, events: &mut Vec<GameEvent>) -> Option<SettleTicket> {
        let first = self.state.revealed[0].clone();
        let second = self.state.revealed[1].clone();
        let first_key = self.state.find_card(&first).map(|card| card.pair_key.clone());
        let second_key = self.state.find_card(&second).map(|card| card.pair_key.clone());

        match (first_key, second_key) {
            (Some(pair_key), Some(other)) if pair_key == other => {
                self.state.revealed.clear();
                self.state.matched.insert(first.clone());
                self.state.matched.insert(second.clone());
                self.emit(
                    events,
                    GameEvent::PairMatched {
                        pair_key,
                        first,
                        second,
                    },
                );

                if self.state.all_matched() {
                    self.state.is_complete = true;
                    self.state.phase = GamePhase::Complete;
                    let pairs = self.state.score().total_pairs;
                    self.emit(events, GameEvent::GameCompleted { pairs });
                }
                None
            }
            _ => {
                self.settle_sequence += 1;
                let ticket = SettleTicket {
                    generation: self.state.generation,
                    sequence: self.settle_sequence,
                    delay_ms: self.settle_delay_ms,
                };
                self.state.pending_settle = Some(ticket);
                self.emit(
                    events,
                    GameEvent::PairMismatched {
                        first,
                        second,
                        settle: ticket,
                    },
                );
                Some(ticket)
            }
        }
    }

    /// 延迟到期后翻回两张不匹配的牌。凭据过期（已开新局或已翻回）时不做任何事。
    pub fn settle(&mut self, ticket: SettleTicket) -> RuleResolution {
        if self.state.pending_settle != Some(ticket) {
            utils::log(&format!(
                "dropping stale settle {}/{} (current generation {})",
                ticket.generation, ticket.sequence, self.state.generation
            ));
            return self.ignore(IgnoreReason::StaleSettle);
        }

        self.state.pending_settle = None;
        let mut revealed = std::mem::take(&mut self.state.revealed).into_iter();
        let mut events = Vec::new();
        if let (Some(first), Some(second)) = (revealed.next(), revealed.next()) {
            self.emit(&mut events, GameEvent::PairSettled { first, second });
        }
        RuleResolution::new(self.state.clone(), events)
    }
}

impl Default for MatchEngine {
    fn default() -> Self {
        Self::new(&GameConfig::default())
    }
}
