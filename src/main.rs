//! CARDBOARD: collectible card economy simulator
//!
//! Entry point. Loads configuration, initialises structured logging,
//! restores state from disk (or creates a fresh game), and runs the
//! autoplay loop one simulated day per tick with graceful shutdown.

use anyhow::{Context, Result};
use std::time::Duration;
use tracing::{error, info};

use cardboard::config;
use cardboard::engine::day::DayReport;
use cardboard::engine::Session;
use cardboard::storage;

const BANNER: &str = r#"
  ____    _    ____  ____  ____   ___    _    ____  ____
 / ___|  / \  |  _ \|  _ \| __ ) / _ \  / \  |  _ \|  _ \
| |     / _ \ | |_) | | | |  _ \| | | |/ _ \ | |_) | | | |
| |___ / ___ \|  _ <| |_| | |_) | |_| / ___ \|  _ <| |_| |
 \____/_/   \_\_| \_\____/|____/ \___/_/   \_\_| \_\____/

  Collectible card economy simulator
  v0.1.0
"#;

#[tokio::main]
async fn main() -> Result<()> {
    let config_path = std::env::args().nth(1).unwrap_or_else(|| "config.toml".to_string());
    let cfg = config::AppConfig::load_or_default(&config_path)?;

    init_logging(&cfg);

    println!("{BANNER}");
    info!(
        config = %config_path,
        starting_cash = %cfg.session.starting_cash,
        seed = ?cfg.session.seed,
        tick_secs = cfg.autoplay.tick_interval_secs,
        max_days = cfg.autoplay.max_days,
        "CARDBOARD starting up"
    );

    // -- Restore or create state -----------------------------------------

    let save_path = cfg.autoplay.save_path.clone();
    let mut session = match storage::load_state(Some(&save_path))? {
        Some(state) => {
            info!(
                date = %state.today(),
                cash = format!("${:.2}", state.player.cash),
                cards = state.player.collection.count_all(),
                "Resumed from saved state"
            );
            Session::resume(&cfg, state)
        }
        None => {
            let session = Session::new(&cfg).context("Failed to create a new game")?;
            info!(cash = format!("${:.2}", session.state.player.cash), "Fresh start");
            session
        }
    };

    // -- Main loop -------------------------------------------------------

    let mut interval = tokio::time::interval(Duration::from_secs(cfg.autoplay.tick_interval_secs.max(1)));
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    info!(
        interval_secs = cfg.autoplay.tick_interval_secs,
        "Entering autoplay loop. Press Ctrl+C to stop."
    );

    let mut days_run = 0u32;
    loop {
        tokio::select! {
            _ = interval.tick() => {
                if cfg.autoplay.max_days > 0 && days_run >= cfg.autoplay.max_days {
                    info!(days = days_run, "Day limit reached.");
                    break;
                }

                let report = match session.autoplay_day(cfg.autoplay.buy_packs, cfg.autoplay.accept_fair_offers) {
                    Ok(report) => report,
                    Err(e) => {
                        error!(error = %e, "Day could not be played");
                        break;
                    }
                };
                days_run += 1;
                log_day_report(&report, &session);

                if let Err(e) = storage::save_state(&session.state, Some(&save_path)) {
                    error!(error = %e, "Failed to save state");
                }
            }
            _ = &mut shutdown => {
                info!("Shutdown signal received.");
                break;
            }
        }
    }

    storage::save_state(&session.state, Some(&save_path))?;
    info!(
        date = %session.state.today(),
        cash = format!("${:.2}", session.state.player.cash),
        net_worth = format!("${:.2}", session.net_worth()),
        packs = session.state.stats.packs_opened,
        trades = session.state.stats.trades_completed,
        graded = session.state.stats.cards_graded,
        "CARDBOARD shut down cleanly."
    );

    Ok(())
}

/// Log a human-readable day summary.
fn log_day_report(report: &DayReport, session: &Session) {
    if let Some(event) = &report.fired_event {
        info!(
            event = %event.name,
            target = %event.key,
            factor = %event.factor,
            days = event.duration,
            "Market event"
        );
    }
    for change in &report.rotation {
        info!(
            set = %change.set_id,
            phase = ?change.phase,
            factor = %change.factor,
            "Set rotation"
        );
    }
    info!(
        date = %report.date,
        cash = format!("${:.2}", session.state.player.cash),
        collection = format!("${:.2}", session.collection_value()),
        cards = session.state.player.collection.count_all(),
        pending_grading = session.state.grading.pending_count(),
        "Day complete"
    );
}

/// Initialise the `tracing` subscriber.
fn init_logging(cfg: &config::AppConfig) {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("cardboard=info"));

    let json_logging = cfg.logging.json || std::env::var("CARDBOARD_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        fmt().with_env_filter(env_filter).with_target(true).init();
    }
}
