pub mod assets;
pub mod game;
pub mod utils;

use std::cell::RefCell;
use std::fmt::Display;
use std::rc::Rc;

use gloo_timers::future::TimeoutFuture;
use serde::Serialize;
use serde_wasm_bindgen::{from_value, to_value};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::{future_to_promise, spawn_local};
use web_sys::js_sys::{Function, Promise};
use web_sys::UrlSearchParams;

pub use assets::{AssetManifest, ThemeEntry, ThemeError};
pub use game::{
    AssetRef, Card, CardId, Deck, DeckBuilder, GameConfig, GameEvent, GamePhase, GameState,
    IgnoreReason, IntegrityError, MatchEngine, RuleError, RuleResolution, Score, SettleTicket,
};

#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

#[wasm_bindgen(start)]
pub fn start() {
    set_panic_hook();
}

fn to_js_error<E: Serialize + Display>(error: E) -> JsValue {
    to_value(&error).unwrap_or_else(|_| JsValue::from_str(&error.to_string()))
}

fn serde_to_js_error<E: Display>(error: E) -> JsValue {
    JsValue::from_str(&error.to_string())
}

fn make_resolution_json(resolution: &RuleResolution) -> Result<String, JsValue> {
    serde_json::to_string(resolution).map_err(serde_to_js_error)
}

fn missing_manifest() -> ThemeError {
    ThemeError::unavailable("asset manifest has not been loaded")
}

struct Session {
    config: GameConfig,
    engine: MatchEngine,
    builder: DeckBuilder,
    manifest: Option<AssetManifest>,
    subscriber: Option<Function>,
}

impl Session {
    fn new(config: GameConfig) -> Self {
        Self {
            engine: MatchEngine::new(&config),
            config,
            builder: DeckBuilder::new(),
            manifest: None,
            subscriber: None,
        }
    }

    /// 开始新主题。无论成败，旧对局都先被结束，失败时引擎停在 `Idle`。
    fn start_theme(&mut self, theme: &str) -> Result<RuleResolution, ThemeError> {
        let theme = assets::normalize_theme(theme);
        self.engine.reset();
        let manifest = self.manifest.as_ref().ok_or_else(missing_manifest)?;
        let theme_assets = manifest.resolve(&theme, &self.config.asset_base)?;
        let deck = self.builder.build(&theme_assets);

        let resolution = self
            .engine
            .load_themed_deck(theme.as_str(), deck)
            .map_err(ThemeError::unavailable)?;
        if resolution.state.has_no_content() {
            utils::warn(&format!("theme {theme} has no assets"));
        } else {
            utils::log(&format!(
                "started theme {theme} with {} pairs",
                resolution.score.total_pairs
            ));
        }
        Ok(resolution)
    }

    /// 素材来源不可用：丢弃旧清单并结束当前对局。
    fn drop_asset_source(&mut self, error: &ThemeError) -> RuleResolution {
        utils::warn(&error.to_string());
        self.manifest = None;
        self.engine.reset()
    }
}

fn notify(subscriber: Option<Function>, resolution: &RuleResolution) {
    let Some(callback) = subscriber else {
        return;
    };
    match make_resolution_json(resolution) {
        Ok(json) => {
            if let Err(error) = callback.call1(&JsValue::NULL, &JsValue::from_str(&json)) {
                utils::warn(&format!("subscriber threw: {error:?}"));
            }
        }
        Err(error) => utils::warn(&format!("failed to serialize resolution: {error:?}")),
    }
}

/// 在延迟后执行翻回。回调时对局可能已被替换，由凭据的世代号判断是否生效。
fn schedule_settle(session: Rc<RefCell<Session>>, ticket: SettleTicket) {
    spawn_local(async move {
        TimeoutFuture::new(ticket.delay_ms).await;
        let (resolution, subscriber) = {
            let mut session = session.borrow_mut();
            let resolution = session.engine.settle(ticket);
            (resolution, session.subscriber.clone())
        };
        if !resolution.is_ignored() {
            notify(subscriber, &resolution);
        }
    });
}

/// 浏览器端的记忆翻牌游戏对象。
#[wasm_bindgen]
pub struct MemoryGame {
    session: Rc<RefCell<Session>>,
}

impl MemoryGame {
    fn publish(&self, resolution: &RuleResolution) -> Result<String, JsValue> {
        let subscriber = self.session.borrow().subscriber.clone();
        if !resolution.is_ignored() {
            notify(subscriber, resolution);
        }
        make_resolution_json(resolution)
    }
}

#[wasm_bindgen]
impl MemoryGame {
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: Option<String>) -> Result<MemoryGame, JsValue> {
        let config = match config_json {
            Some(json) => GameConfig::from_json(&json).map_err(serde_to_js_error)?,
            None => GameConfig::default(),
        };
        Ok(MemoryGame {
            session: Rc::new(RefCell::new(Session::new(config))),
        })
    }

    /// 固定洗牌种子，便于复现同一牌组。
    #[wasm_bindgen(js_name = "setSeed")]
    pub fn set_seed(&self, seed: u64) {
        self.session.borrow_mut().builder = DeckBuilder::with_seed(seed);
    }

    #[wasm_bindgen(js_name = "loadManifestJson")]
    pub fn load_manifest_json(&self, json: &str) -> Result<(), JsValue> {
        let manifest = AssetManifest::from_json(json).map_err(to_js_error)?;
        self.session.borrow_mut().manifest = Some(manifest);
        Ok(())
    }

    /// 从配置的地址拉取素材清单，完成后返回主题目录 JSON。
    #[wasm_bindgen(js_name = "fetchManifest")]
    pub fn fetch_manifest(&self) -> Promise {
        let session = Rc::clone(&self.session);
        let url = session.borrow().config.manifest_url.clone();
        future_to_promise(async move {
            let manifest = match assets::fetch_manifest(&url).await {
                Ok(manifest) => manifest,
                Err(error) => {
                    let (resolution, subscriber) = {
                        let mut session = session.borrow_mut();
                        let resolution = session.drop_asset_source(&error);
                        (resolution, session.subscriber.clone())
                    };
                    notify(subscriber, &resolution);
                    return Err(to_js_error(error));
                }
            };
            let catalog = manifest.catalog(&session.borrow().config.asset_base);
            session.borrow_mut().manifest = Some(manifest);
            let json = serde_json::to_string(&catalog).map_err(serde_to_js_error)?;
            Ok(JsValue::from_str(&json))
        })
    }

    #[wasm_bindgen(js_name = "themesJson")]
    pub fn themes_json(&self) -> Result<String, JsValue> {
        let session = self.session.borrow();
        let manifest = session
            .manifest
            .as_ref()
            .ok_or_else(|| to_js_error(missing_manifest()))?;
        serde_json::to_string(&manifest.catalog(&session.config.asset_base))
            .map_err(serde_to_js_error)
    }

    #[wasm_bindgen(js_name = "startTheme")]
    pub fn start_theme(&self, theme: &str) -> Result<String, JsValue> {
        let resolution = self
            .session
            .borrow_mut()
            .start_theme(theme)
            .map_err(to_js_error)?;
        self.publish(&resolution)
    }

    /// 以当前主题重新洗牌开局；尚未选择主题时只重置。
    #[wasm_bindgen(js_name = "newGame")]
    pub fn new_game(&self) -> Result<String, JsValue> {
        let theme = self.session.borrow().engine.state().theme.clone();
        match theme {
            Some(theme) => self.start_theme(&theme),
            None => self.reset(),
        }
    }

    pub fn reset(&self) -> Result<String, JsValue> {
        let resolution = self.session.borrow_mut().engine.reset();
        self.publish(&resolution)
    }

    pub fn reveal(&self, card_id: &str) -> Result<String, JsValue> {
        let resolution = self.session.borrow_mut().engine.request_reveal(card_id);
        if let Some(ticket) = resolution.settle {
            schedule_settle(Rc::clone(&self.session), ticket);
        }
        self.publish(&resolution)
    }

    #[wasm_bindgen(js_name = "stateJson")]
    pub fn state_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(self.session.borrow().engine.state()).map_err(serde_to_js_error)
    }

    #[wasm_bindgen(js_name = "scoreJson")]
    pub fn score_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(&self.session.borrow().engine.score()).map_err(serde_to_js_error)
    }

    /// 注册状态变化回调，参数为 `RuleResolution` 的 JSON 字符串。
    pub fn subscribe(&self, callback: Function) {
        self.session.borrow_mut().subscriber = Some(callback);
    }

    pub fn unsubscribe(&self) {
        self.session.borrow_mut().subscriber = None;
    }
}

/// 从查询串（如 `?type=ocean` 或 `/#/game?type=Ocean`）读取主题键。
#[wasm_bindgen(js_name = "themeFromQuery")]
pub fn theme_from_query(search: &str) -> Option<String> {
    let query = search.rsplit_once('?').map_or(search, |(_, query)| query);
    let params = UrlSearchParams::new_with_str(query).ok()?;
    params
        .get("type")
        .filter(|theme| !theme.trim().is_empty())
        .map(|theme| assets::normalize_theme(&theme))
}

/// 由素材引用数组生成洗好的牌组。
#[wasm_bindgen(js_name = "buildDeck")]
pub fn build_deck(theme_assets: JsValue, seed: Option<u64>) -> Result<JsValue, JsValue> {
    let theme_assets: Vec<AssetRef> = from_value(theme_assets).map_err(JsValue::from)?;
    let mut builder = match seed {
        Some(seed) => DeckBuilder::with_seed(seed),
        None => DeckBuilder::new(),
    };
    to_value(&builder.build(&theme_assets)).map_err(JsValue::from)
}

#[wasm_bindgen(js_name = "validateState")]
pub fn validate_state(state: JsValue) -> Result<(), JsValue> {
    let state: GameState = from_value(state).map_err(JsValue::from)?;
    state.integrity_check().map_err(to_js_error)
}

#[cfg(feature = "console_error_panic_hook")]
fn set_panic_hook() {
    console_error_panic_hook::set_once();
}

#[cfg(not(feature = "console_error_panic_hook"))]
fn set_panic_hook() {}
