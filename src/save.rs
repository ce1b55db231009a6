//! セーブ/ロードとマイグレーション。
//!
//! ## バージョニング方針
//!
//! - `SAVE_VERSION`: 現在のセーブ形式バージョン。フィールド追加時にインクリメントする。
//! - `MIN_COMPATIBLE_VERSION`: 互換性を維持できる最小バージョン。
//!   新フィールドの追加のみの場合はこの値を変えない（旧データを維持できる）。
//!   既存フィールドの意味変更や削除など破壊的変更を行った場合のみインクリメントする。
//! - ストレージキーは形式ファミリーごとに分ける。v2/v3 は `the_particle_save_v2`
//!   を共有し（追加のみの差分）、フラットな v1 形式は旧キーに残っているものを
//!   一度だけ移行する。
//!
//! 旧バージョンのセーブデータは、`MIN_COMPATIBLE_VERSION` 以上であれば
//! 不足フィールドにデフォルト値を補完して読み込む。ここは純粋な
//! 文字列⇔状態の変換のみで、ストレージ自体は `storage` に任せる。

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::state::{GameState, Notation};
use crate::storage::StorageError;
use crate::tuning::Tuning;

/// セーブデータのフォーマットバージョン。
pub const SAVE_VERSION: u32 = 3;

/// 互換性を維持できる最小バージョン。
/// この値以上のセーブデータは、不足フィールドをデフォルト値で補完して読み込む。
pub const MIN_COMPATIBLE_VERSION: u32 = 2;

/// key-value ストアのキー。
pub const STORAGE_KEY: &str = "the_particle_save_v2";

/// 初代（フラット JSON）のキー。起動時に一度だけ移行を試みる。
pub const LEGACY_STORAGE_KEY: &str = "theParticleComplete_v1";

#[derive(Debug, Error)]
pub enum SaveError {
    #[error("serialize failed: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("storage rejected the save: {0}")]
    Store(#[from] StorageError),
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("save data parse failed: {0}")]
    Corrupt(#[from] serde_json::Error),
    #[error("save version too old (saved={saved}, min={min})")]
    TooOld { saved: u32, min: u32 },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ImportError {
    #[error("token is not valid save data")]
    Invalid,
    #[error("token lacks the primary currency field")]
    MissingCurrency,
    #[error("save version too old (saved={saved}, min={min})")]
    TooOld { saved: u32, min: u32 },
}

/// シリアライズ用のセーブデータ構造体。
/// `GameState` の一時的な状態（フェーズ、ログ）は含まない。
#[derive(Serialize, Deserialize)]
pub struct SaveData {
    pub version: u32,
    game: GameSave,
}

#[derive(Serialize, Deserialize)]
#[serde(default)]
struct GameSave {
    particles: f64,
    total_particles: f64,
    start_time: f64,
    last_tick: f64,
    /// 各ティアのセーブ。Tuning のティア順。
    generators: Vec<GeneratorSave>,
    linac_count: u32,
    shift_count: u32,
    stats: StatsSave,
    /// v3 で追加。
    infinity: InfinitySave,
    /// v3 で追加。
    settings: SettingsSave,
}

impl Default for GameSave {
    fn default() -> Self {
        Self {
            particles: 10.0,
            total_particles: 10.0,
            start_time: 0.0,
            last_tick: 0.0,
            generators: Vec::new(),
            linac_count: 0,
            shift_count: 0,
            stats: StatsSave::default(),
            infinity: InfinitySave::default(),
            settings: SettingsSave::default(),
        }
    }
}

/// コスト曲線（base_cost / cost_growth）はセーブに含めない。
/// 曲線はバランス定数であり、ロード時に常に Tuning 側の値を使う。
#[derive(Serialize, Deserialize)]
#[serde(default)]
struct GeneratorSave {
    purchased: u32,
    owned: f64,
    production_multiplier: f64,
    /// v3 で追加。
    auto_unlocked: bool,
    auto_enabled: bool,
}

impl Default for GeneratorSave {
    fn default() -> Self {
        Self {
            purchased: 0,
            owned: 0.0,
            production_multiplier: 1.0,
            auto_unlocked: false,
            auto_enabled: false,
        }
    }
}

#[derive(Serialize, Deserialize, Default)]
#[serde(default)]
struct StatsSave {
    total_linacs: u32,
    total_shifts: u32,
    lifetime_particles: f64,
    crunch_started_at: f64,
}

#[derive(Serialize, Deserialize, Default)]
#[serde(default)]
struct InfinitySave {
    points: f64,
    crunches: u32,
    best_crunch_ms: Option<f64>,
    upgrades: Vec<u32>,
    limit_broken: bool,
}

#[derive(Serialize, Deserialize)]
#[serde(default)]
struct SettingsSave {
    /// 0=Scientific, 1=Grouped, 2=Kanji
    notation: u8,
    bulk_buy: u32,
    skip_confirm: bool,
}

impl Default for SettingsSave {
    fn default() -> Self {
        Self {
            notation: 0,
            bulk_buy: 10,
            skip_confirm: false,
        }
    }
}

/// GameState からセーブ用データを抽出する。
fn extract_save(state: &GameState) -> SaveData {
    SaveData {
        version: SAVE_VERSION,
        game: GameSave {
            particles: state.particles,
            total_particles: state.total_particles,
            start_time: state.start_time,
            last_tick: state.last_tick,
            generators: state
                .generators
                .iter()
                .map(|g| GeneratorSave {
                    purchased: g.purchased,
                    owned: g.owned,
                    production_multiplier: g.production_multiplier,
                    auto_unlocked: g.auto_unlocked,
                    auto_enabled: g.auto_enabled,
                })
                .collect(),
            linac_count: state.linac_count,
            shift_count: state.shift_count,
            stats: StatsSave {
                total_linacs: state.stats.total_linacs,
                total_shifts: state.stats.total_shifts,
                lifetime_particles: state.stats.lifetime_particles,
                crunch_started_at: state.stats.crunch_started_at,
            },
            infinity: InfinitySave {
                points: state.infinity.points,
                crunches: state.infinity.crunches,
                best_crunch_ms: state.infinity.best_crunch_ms,
                upgrades: state.infinity.upgrades.iter().copied().collect(),
                limit_broken: state.infinity.limit_broken,
            },
            settings: SettingsSave {
                notation: match state.settings.notation {
                    Notation::Scientific => 0,
                    Notation::Grouped => 1,
                    Notation::Kanji => 2,
                },
                bulk_buy: state.settings.bulk_buy,
                skip_confirm: state.settings.skip_confirm,
            },
        },
    }
}

/// セーブデータを GameState に復元する。
/// ティア定義の個数が合わない場合、余った側は無視して新規データの方を使う。
fn apply_save(state: &mut GameState, save: &GameSave) {
    state.particles = save.particles;
    state.total_particles = save.total_particles;
    state.start_time = save.start_time;
    state.last_tick = save.last_tick;

    // ジェネレーター復元（コスト曲線は Tuning 側の値のまま）
    for (i, gen_save) in save.generators.iter().enumerate() {
        if let Some(g) = state.generators.get_mut(i) {
            g.purchased = gen_save.purchased;
            g.owned = gen_save.owned;
            g.production_multiplier = gen_save.production_multiplier;
            g.auto_unlocked = gen_save.auto_unlocked;
            g.auto_enabled = gen_save.auto_enabled;
        }
    }

    state.linac_count = save.linac_count;
    state.shift_count = save.shift_count;

    state.stats.total_linacs = save.stats.total_linacs;
    state.stats.total_shifts = save.stats.total_shifts;
    state.stats.lifetime_particles = save.stats.lifetime_particles;
    state.stats.crunch_started_at = save.stats.crunch_started_at;

    state.infinity.points = save.infinity.points;
    state.infinity.crunches = save.infinity.crunches;
    state.infinity.best_crunch_ms = save.infinity.best_crunch_ms;
    state.infinity.upgrades = save.infinity.upgrades.iter().copied().collect();
    state.infinity.limit_broken = save.infinity.limit_broken;

    state.settings.notation = match save.settings.notation {
        1 => Notation::Grouped,
        2 => Notation::Kanji,
        _ => Notation::Scientific,
    };
    state.settings.bulk_buy = save.settings.bulk_buy;
    state.settings.skip_confirm = save.settings.skip_confirm;
}

/// 状態を JSON 文字列にシリアライズする。セーブブロブと
/// エクスポートトークンは同一表現（JSON はそのまま転送可能なテキスト）。
pub fn encode(state: &GameState) -> Result<String, SaveError> {
    Ok(serde_json::to_string(&extract_save(state))?)
}

/// JSON をパースしてバージョンを検証する。中身の復元は `hydrate`。
pub fn decode(json: &str) -> Result<SaveData, LoadError> {
    let save: SaveData = serde_json::from_str(json)?;
    if save.version < MIN_COMPATIBLE_VERSION {
        return Err(LoadError::TooOld {
            saved: save.version,
            min: MIN_COMPATIBLE_VERSION,
        });
    }
    Ok(save)
}

/// デコード済みセーブから状態を再構築する。
pub fn hydrate(save: &SaveData, tuning: &Tuning) -> GameState {
    let mut state = GameState::new(tuning, 0.0);
    apply_save(&mut state, &save.game);
    state
}

/// JSON 文字列から状態をロードする。壊れたデータ・古すぎるバージョンは
/// `Err` で返し、新規ゲームへのフォールバックは呼び出し側が決める。
pub fn load(json: &str, tuning: &Tuning) -> Result<GameState, LoadError> {
    let save = decode(json)?;
    Ok(hydrate(&save, tuning))
}

/// 初代のフラットな JSON 形式（camelCase、バージョンフィールド無し）。
/// `particles` だけは必須。コスト曲線フィールドは読み捨てる。
#[derive(Deserialize)]
struct LegacySaveV1 {
    particles: f64,
    #[serde(rename = "totalParticles", default)]
    total_particles: f64,
    #[serde(rename = "prestigeCount", default)]
    prestige_count: u32,
    #[serde(rename = "startTime", default)]
    start_time: f64,
    #[serde(rename = "lastTick", default)]
    last_tick: f64,
    #[serde(default)]
    generators: Vec<LegacyGeneratorV1>,
}

#[derive(Deserialize)]
struct LegacyGeneratorV1 {
    #[serde(default)]
    amount: f64,
    #[serde(default)]
    bought: u32,
    #[serde(default = "legacy_production_default")]
    production: f64,
}

fn legacy_production_default() -> f64 {
    1.0
}

/// v1 形式のロード。旧 `prestigeCount` はリニアック回数と
/// 生涯リニアック統計の両方に引き継ぐ。
pub fn load_legacy(json: &str, tuning: &Tuning) -> Result<GameState, LoadError> {
    let legacy: LegacySaveV1 = serde_json::from_str(json)?;

    let mut state = GameState::new(tuning, 0.0);
    state.particles = legacy.particles;
    state.total_particles = legacy.total_particles;
    state.start_time = legacy.start_time;
    state.last_tick = legacy.last_tick;
    state.linac_count = legacy.prestige_count;
    state.stats.total_linacs = legacy.prestige_count;
    state.stats.crunch_started_at = legacy.start_time;

    for (i, gen) in legacy.generators.iter().enumerate() {
        if let Some(g) = state.generators.get_mut(i) {
            g.owned = gen.amount;
            g.purchased = gen.bought;
            g.production_multiplier = gen.production;
        }
    }
    Ok(state)
}

/// インポートトークンの検証とロード。現行形式と v1 形式の両方を受け、
/// 主要通貨フィールドを持たないものは明示的に拒否する。
pub fn import_token(token: &str, tuning: &Tuning) -> Result<GameState, ImportError> {
    let value: serde_json::Value =
        serde_json::from_str(token.trim()).map_err(|_| ImportError::Invalid)?;
    let object = value.as_object().ok_or(ImportError::Invalid)?;

    if object.contains_key("version") {
        let game = object
            .get("game")
            .and_then(|g| g.as_object())
            .ok_or(ImportError::Invalid)?;
        if !game.contains_key("particles") {
            return Err(ImportError::MissingCurrency);
        }
        load(token, tuning).map_err(|e| match e {
            LoadError::TooOld { saved, min } => ImportError::TooOld { saved, min },
            LoadError::Corrupt(_) => ImportError::Invalid,
        })
    } else {
        if !object.contains_key("particles") {
            return Err(ImportError::MissingCurrency);
        }
        load_legacy(token, tuning).map_err(|_| ImportError::Invalid)
    }
}
