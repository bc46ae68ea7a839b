//! 浏览器环境下的绑定测试：`wasm-pack test --headless --firefox`。

#![cfg(target_arch = "wasm32")]

use gloo_timers::future::TimeoutFuture;
use memory_match::{
    build_deck, theme_from_query, validate_state, Card, GameState,
    MemoryGame, RuleResolution,
};
use serde_wasm_bindgen::from_value;
use wasm_bindgen::JsValue;
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

const MANIFEST: &str = r#"{"ocean": ["turtle.png", "whale.png"], "desert": []}"#;

fn game(delay_ms: u32) -> MemoryGame {
    let config = format!(r#"{{"settle_delay_ms": {delay_ms}}}"#);
    let game = MemoryGame::new(Some(config)).expect("game should construct");
    game.set_seed(5);
    game.load_manifest_json(MANIFEST)
        .expect("manifest should load");
    game
}

fn parse(json: &str) -> RuleResolution {
    serde_json::from_str(json).expect("resolution should parse")
}

fn mismatched_pair(state: &GameState) -> (String, String) {
    let first = &state.deck[0];
    let second = state
        .deck
        .iter()
        .find(|card| card.pair_key != first.pair_key)
        .expect("deck should have two pairs");
    (first.id.clone(), second.id.clone())
}

#[wasm_bindgen_test]
fn reads_theme_from_hash_route_query() {
    assert_eq!(theme_from_query("/#/game?type=Ocean"), Some("ocean".to_string()));
    assert_eq!(theme_from_query("?other=1"), None);
}

#[wasm_bindgen_test]
fn builds_seeded_deck_from_js_array() {
    let assets = serde_wasm_bindgen::to_value(&vec!["a.png", "b.png"]).expect("to js");
    let deck: Vec<Card> =
        from_value(build_deck(assets, Some(3)).expect("deck should build")).expect("from js");
    assert_eq!(deck.len(), 4);
}

#[wasm_bindgen_test]
fn dealt_state_validates() {
    let game = game(0);
    game.start_theme("ocean").expect("ocean should start");
    let state: GameState =
        serde_json::from_str(&game.state_json().expect("state should serialize")).expect("parse");
    let state = serde_wasm_bindgen::to_value(&state).expect("to js");
    assert!(validate_state(state).is_ok());
}

#[wasm_bindgen_test]
fn unknown_theme_and_empty_theme_are_distinct() {
    let game = game(0);
    let error: JsValue = game.start_theme("jungle").expect_err("unknown theme");
    let error: serde_json::Value = from_value(error).expect("error should be an object");
    assert_eq!(error["type"], "UnknownTheme");

    let resolution = parse(&game.start_theme("desert").expect("empty theme loads"));
    assert_eq!(resolution.state.phase, memory_match::GamePhase::NoContent);
    assert!(!resolution.state.is_complete);
}

#[wasm_bindgen_test]
fn start_without_manifest_reports_unavailable_source() {
    let game = MemoryGame::new(None).expect("game should construct");
    let error: serde_json::Value =
        from_value(game.start_theme("ocean").expect_err("no manifest")).expect("object");
    assert_eq!(error["type"], "AssetSourceUnavailable");
}

#[wasm_bindgen_test]
async fn mismatch_settles_after_delay() {
    let game = game(10);
    let started = parse(&game.start_theme("ocean").expect("theme should start"));
    let (first, second) = mismatched_pair(&started.state);

    game.reveal(&first).expect("reveal first");
    let pending = parse(&game.reveal(&second).expect("reveal second"));
    assert!(pending.settle.is_some());
    assert_eq!(pending.state.revealed.len(), 2);

    TimeoutFuture::new(50).await;
    let state: GameState =
        serde_json::from_str(&game.state_json().expect("state json")).expect("state parses");
    assert!(state.revealed.is_empty());
}

#[wasm_bindgen_test]
async fn new_game_discards_pending_settle() {
    let game = game(20);
    let started = parse(&game.start_theme("ocean").expect("theme should start"));
    let (first, second) = mismatched_pair(&started.state);
    game.reveal(&first).expect("reveal first");
    game.reveal(&second).expect("reveal second");

    let restarted = parse(&game.new_game().expect("new game"));
    let first_card = restarted.state.deck[0].id.clone();
    game.reveal(&first_card).expect("reveal in new session");

    TimeoutFuture::new(60).await;
    let state: GameState =
        serde_json::from_str(&game.state_json().expect("state json")).expect("state parses");
    assert_eq!(state.revealed, vec![first_card]);
}
