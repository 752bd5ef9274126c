use clap::Parser;
use pacman_arcade::constants::{POWERUP_DURATION_TICKS, TICK_RATE};
use pacman_arcade::engine::{GameOptions, GameSession, OptionsError};
use pacman_arcade::rng::{RandomSource, SeededRng};
use pacman_arcade::types::{
    Direction, GameOverReason, PlayerInput, PowerUpTally, ResetMode, ResetOutcome, RuntimeEvent,
    Snapshot, Vec2,
};
use pacman_arcade::world::{default_level, parse_layout, tile_coords, Level, MapError, TileGrid};
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

const AUTOPILOT_TURN_TICKS: u64 = 40;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    #[arg(long)]
    seed: Option<u32>,
    #[arg(long, default_value_t = 3_600)]
    ticks: u64,
    #[arg(long, default_value_t = 1)]
    runs: u32,
    #[arg(long)]
    map: Option<PathBuf>,
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    run_id: Option<String>,
    #[arg(long)]
    summary_out: Option<PathBuf>,
    #[arg(long)]
    quit_at: Option<u64>,
}

#[derive(Debug, Error)]
enum SetupError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid options in {path}: {source}")]
    Options {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("rejected options in {path}: {source}")]
    InvalidOptions {
        path: PathBuf,
        #[source]
        source: OptionsError,
    },
    #[error("invalid map layout in {path}: {source}")]
    Map {
        path: PathBuf,
        #[source]
        source: MapError,
    },
    #[error("built-in map layout is invalid: {0}")]
    DefaultMap(#[from] MapError),
}

#[derive(Clone, Debug, Serialize)]
struct RunResultLine {
    run: u32,
    seed: u32,
    reason: String,
    ticks: u64,
    score: i32,
    lives: i32,
    #[serde(rename = "pelletsEaten")]
    pellets_eaten: u32,
    #[serde(rename = "livesLost")]
    lives_lost: u32,
    #[serde(rename = "powerUpsSpawned")]
    power_ups_spawned: u32,
    #[serde(rename = "powerUpsCollected")]
    power_ups_collected: PowerUpTally,
    anomalies: Vec<String>,
}

#[derive(Clone, Debug, Serialize)]
struct AnomalyRecord {
    tick: u64,
    message: String,
}

#[derive(Clone, Debug)]
struct RunOutcome {
    result: RunResultLine,
    anomaly_records: Vec<AnomalyRecord>,
    quit: bool,
}

#[derive(Clone, Debug, Serialize)]
struct RunSummary {
    #[serde(rename = "runId")]
    run_id: String,
    #[serde(rename = "startedAt")]
    started_at: String,
    #[serde(rename = "finishedAt")]
    finished_at: String,
    #[serde(rename = "runCount")]
    run_count: usize,
    #[serde(rename = "anomalyCount")]
    anomaly_count: usize,
    #[serde(rename = "averageScore")]
    average_score: i32,
    #[serde(rename = "reasonCounts")]
    reason_counts: BTreeMap<String, usize>,
    runs: Vec<RunResultLine>,
}

#[derive(Clone, Debug, Serialize)]
struct StructuredLogLine {
    #[serde(rename = "timestampMs")]
    timestamp_ms: i64,
    level: String,
    event: String,
    #[serde(rename = "runId")]
    run_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    run: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tick: Option<u64>,
    details: Value,
}

/// Headless driver: plays sessions with a seeded autopilot and checks invariants every tick.
fn main() {
    let cli = Cli::parse();
    let started_at = chrono::Utc::now();
    let base_seed = cli.seed.unwrap_or_else(rand::random::<u32>);
    let run_id = cli
        .run_id
        .clone()
        .unwrap_or_else(|| default_run_id(base_seed, started_at.timestamp_millis()));

    let (level, options) = match load_setup(cli.map.as_deref(), cli.config.as_deref()) {
        Ok(setup) => setup,
        Err(error) => {
            emit_log(
                "error",
                "setup_failed",
                &run_id,
                None,
                None,
                None,
                json!({ "error": error.to_string() }),
            );
            std::process::exit(2);
        }
    };

    let mut has_anomaly = false;
    let mut total_anomalies = 0usize;
    let mut results = Vec::new();

    for run in 0..cli.runs.max(1) {
        let seed = base_seed.wrapping_add(run);
        emit_log(
            "info",
            "run_started",
            &run_id,
            Some(run),
            Some(seed),
            None,
            json!({
                "ticks": cli.ticks,
                "rows": level.grid.rows(),
                "cols": level.grid.cols(),
                "options": {
                    "startingLives": options.starting_lives,
                    "playerBaseSpeed": options.player_base_speed,
                    "adversaryBaseSpeed": options.adversary_base_speed,
                    "maxAdversaries": options.max_adversaries,
                },
            }),
        );
        let outcome = run_session(
            level.clone(),
            options.clone(),
            run,
            seed,
            cli.ticks,
            cli.quit_at,
        );

        for anomaly in &outcome.anomaly_records {
            emit_log(
                "warn",
                "anomaly_detected",
                &run_id,
                Some(run),
                Some(seed),
                Some(anomaly.tick),
                json!({ "message": anomaly.message }),
            );
        }
        has_anomaly |= !outcome.result.anomalies.is_empty();
        total_anomalies += outcome.anomaly_records.len();

        emit_log(
            "info",
            "run_finished",
            &run_id,
            Some(run),
            Some(seed),
            Some(outcome.result.ticks),
            json!({
                "reason": outcome.result.reason,
                "score": outcome.result.score,
                "lives": outcome.result.lives,
                "seconds": outcome.result.ticks as f64 / TICK_RATE as f64,
                "anomalyCount": outcome.anomaly_records.len(),
            }),
        );
        if let Ok(line) = serde_json::to_string(&outcome.result) {
            println!("{line}");
        }

        if outcome.quit {
            emit_log(
                "info",
                "quit_requested",
                &run_id,
                Some(run),
                Some(seed),
                Some(outcome.result.ticks),
                json!({}),
            );
            std::process::exit(if has_anomaly { 1 } else { 0 });
        }
        results.push(outcome.result);
    }

    let summary = build_run_summary(
        run_id.clone(),
        started_at.to_rfc3339(),
        chrono::Utc::now().to_rfc3339(),
        results,
        total_anomalies,
    );

    let mut summary_out_written: Option<String> = None;
    if let Some(path) = cli.summary_out.as_ref() {
        if let Err(error) = write_summary(path, &summary) {
            emit_log(
                "error",
                "summary_write_failed",
                &run_id,
                None,
                None,
                None,
                json!({
                    "path": path.to_string_lossy(),
                    "error": error.to_string(),
                }),
            );
            std::process::exit(2);
        }
        summary_out_written = Some(path.to_string_lossy().to_string());
    }

    emit_log(
        "info",
        "simulation_finished",
        &run_id,
        None,
        None,
        None,
        json!({
            "runCount": summary.run_count,
            "anomalyCount": summary.anomaly_count,
            "averageScore": summary.average_score,
            "reasonCounts": summary.reason_counts,
            "summaryOut": summary_out_written,
        }),
    );

    if has_anomaly {
        std::process::exit(1);
    }
}

fn load_setup(
    map: Option<&Path>,
    config: Option<&Path>,
) -> Result<(Level, GameOptions), SetupError> {
    let level = match map {
        Some(path) => {
            let text = read_file(path)?;
            let lines: Vec<&str> = text.lines().collect();
            parse_layout(&lines).map_err(|source| SetupError::Map {
                path: path.to_path_buf(),
                source,
            })?
        }
        None => default_level()?,
    };
    let options = match config {
        Some(path) => {
            let text = read_file(path)?;
            let options: GameOptions =
                serde_json::from_str(&text).map_err(|source| SetupError::Options {
                    path: path.to_path_buf(),
                    source,
                })?;
            options
                .validate()
                .map_err(|source| SetupError::InvalidOptions {
                    path: path.to_path_buf(),
                    source,
                })?;
            options
        }
        None => GameOptions::default(),
    };
    Ok((level, options))
}

fn read_file(path: &Path) -> Result<String, SetupError> {
    std::fs::read_to_string(path).map_err(|source| SetupError::Read {
        path: path.to_path_buf(),
        source,
    })
}

fn run_session(
    level: Level,
    options: GameOptions,
    run: u32,
    seed: u32,
    max_ticks: u64,
    quit_at: Option<u64>,
) -> RunOutcome {
    let mut session = GameSession::new(level, options, SeededRng::new(seed));
    let mut autopilot = Autopilot::new(seed);
    let mut anomalies = Vec::new();
    let mut anomaly_records = Vec::new();
    let mut anomaly_seen = HashSet::new();
    let mut power_ups_spawned = 0u32;
    let mut quit = false;

    while !session.is_game_over() && session.tick() < max_ticks {
        if quit_at.is_some_and(|tick| session.tick() >= tick)
            && session.reset(ResetMode::Quit) == ResetOutcome::Quit
        {
            quit = true;
            break;
        }
        let input = autopilot.next_input(session.tick(), session.player_position());
        session.step(input);
        let snapshot = session.build_snapshot(true);
        for message in collect_snapshot_anomalies(&snapshot, session.grid()) {
            push_anomaly(
                &mut anomalies,
                &mut anomaly_records,
                &mut anomaly_seen,
                snapshot.tick,
                message,
            );
        }
        power_ups_spawned += snapshot
            .events
            .iter()
            .filter(|event| matches!(event, RuntimeEvent::PowerUpSpawned { .. }))
            .count() as u32;
    }

    let summary = session.build_summary();
    RunOutcome {
        result: RunResultLine {
            run,
            seed,
            reason: reason_key(summary.reason).to_string(),
            ticks: summary.ticks,
            score: summary.score,
            lives: summary.lives,
            pellets_eaten: summary.pellets_eaten,
            lives_lost: summary.lives_lost,
            power_ups_spawned,
            power_ups_collected: summary.power_ups_collected,
            anomalies,
        },
        anomaly_records,
        quit,
    }
}

/// Holds a cardinal heading and picks a new one when stuck or on a fixed cadence.
struct Autopilot {
    rng: SeededRng,
    dir: Direction,
    last_position: Option<Vec2>,
}

impl Autopilot {
    fn new(seed: u32) -> Self {
        Self {
            rng: SeededRng::new(seed ^ 0x9e37_79b9),
            dir: Direction::RIGHT,
            last_position: None,
        }
    }

    fn next_input(&mut self, tick: u64, position: Vec2) -> PlayerInput {
        let stuck = self.last_position == Some(position);
        if stuck || tick % AUTOPILOT_TURN_TICKS == 0 {
            self.dir = Direction::CARDINALS[self.rng.int(0, 3) as usize];
        }
        self.last_position = Some(position);
        PlayerInput::toward(self.dir)
    }
}

fn collect_snapshot_anomalies(snapshot: &Snapshot, grid: &TileGrid) -> Vec<String> {
    let mut anomalies = Vec::new();
    if snapshot.lives < 0 {
        anomalies.push(format!("negative lives: {}", snapshot.lives));
    }

    let mut kinds = HashSet::new();
    for effect in &snapshot.active_effects {
        if !kinds.insert(effect.kind) {
            anomalies.push(format!("duplicate active effect: {}", effect.kind.key()));
        }
        if effect.ticks_remaining == 0 || effect.ticks_remaining > POWERUP_DURATION_TICKS {
            anomalies.push(format!(
                "effect timer out of range: {} {}",
                effect.kind.key(),
                effect.ticks_remaining
            ));
        }
    }

    for adversary in &snapshot.adversaries {
        if grid.is_blocked_at(Vec2::new(adversary.x, adversary.y)) {
            let (row, col) = tile_coords(Vec2::new(adversary.x, adversary.y));
            anomalies.push(format!(
                "adversary {} inside wall at {row},{col}",
                adversary.index
            ));
        }
    }

    for pickup in &snapshot.pickups {
        if grid.is_blocked(pickup.row as i32, pickup.col as i32) {
            anomalies.push(format!("pickup in slot {} sits on a wall", pickup.slot));
        }
        let on_border = pickup.row == 0
            || pickup.col == 0
            || pickup.row + 1 >= grid.rows()
            || pickup.col + 1 >= grid.cols();
        if on_border {
            anomalies.push(format!("pickup in slot {} sits on the border", pickup.slot));
        }
    }
    anomalies
}

fn push_anomaly(
    anomalies: &mut Vec<String>,
    anomaly_records: &mut Vec<AnomalyRecord>,
    anomaly_seen: &mut HashSet<String>,
    tick: u64,
    message: String,
) {
    anomaly_records.push(AnomalyRecord {
        tick,
        message: message.clone(),
    });
    if anomaly_seen.insert(message.clone()) {
        anomalies.push(message);
    }
}

fn default_run_id(seed: u32, timestamp_ms: i64) -> String {
    format!("sim-{seed}-{timestamp_ms}")
}

fn reason_key(reason: Option<GameOverReason>) -> &'static str {
    match reason {
        Some(GameOverReason::Victory) => "victory",
        Some(GameOverReason::LivesExhausted) => "lives_exhausted",
        None => "tick_limit",
    }
}

fn build_run_summary(
    run_id: String,
    started_at: String,
    finished_at: String,
    runs: Vec<RunResultLine>,
    anomaly_count: usize,
) -> RunSummary {
    let run_count = runs.len();
    let mut reason_counts: BTreeMap<String, usize> = BTreeMap::new();
    for run in &runs {
        *reason_counts.entry(run.reason.clone()).or_insert(0) += 1;
    }
    let average_score = if run_count == 0 {
        0
    } else {
        runs.iter().map(|run| run.score).sum::<i32>() / run_count as i32
    };
    RunSummary {
        run_id,
        started_at,
        finished_at,
        run_count,
        anomaly_count,
        average_score,
        reason_counts,
        runs,
    }
}

fn emit_log(
    level: &str,
    event: &str,
    run_id: &str,
    run: Option<u32>,
    seed: Option<u32>,
    tick: Option<u64>,
    details: Value,
) {
    let log_line = StructuredLogLine {
        timestamp_ms: chrono::Utc::now().timestamp_millis(),
        level: level.to_string(),
        event: event.to_string(),
        run_id: run_id.to_string(),
        run,
        seed,
        tick,
        details,
    };
    if let Ok(line) = serde_json::to_string(&log_line) {
        eprintln!("{line}");
    }
}

fn write_summary(path: &Path, summary: &RunSummary) -> io::Result<()> {
    let summary_text = serde_json::to_string_pretty(summary).map_err(io::Error::other)?;
    std::fs::write(path, summary_text)
}
