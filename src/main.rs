/*
 *  main.rs
 *
 *  InkyDash - chores at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *  Public License.
 *
 */

use anyhow::{bail, Context, Result};
use chrono::{Duration as ChronoDuration, Local};
use clap::Parser;
use env_logger::Env;
use log::{error, info};
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use tokio::signal::unix::{signal, SignalKind};

use inkydash::calendar::{CachedCalendar, CalendarSource, FileCalendar, NoCalendar};
use inkydash::config::{self, Cli, Config, InputKind};
use inkydash::constants::RESET_AGE_DAYS;
use inkydash::cue::{CommandCue, SceneCue, SilentCue};
use inkydash::dispatcher::InputDispatcher;
use inkydash::display::{Collaborators, Compositor, RenderSelector, SnapshotCompositor};
use inkydash::input::{InputSource, StdinInput};
use inkydash::media::{MediaPlayer, NoMedia};
use inkydash::state_store::StateStore;
use inkydash::weather::{FileWeather, NoWeather, WeatherSource};

include!(concat!(env!("OUT_DIR"), "/build_info.rs"));

/// Waits for SIGINT, SIGTERM or SIGHUP and logs which one arrived.
async fn signal_handler() -> Result<()> {
    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sighup = signal(SignalKind::hangup())?;

    tokio::select! {
        _ = sigint.recv() => {
            info!("SIGINT received. Initiating graceful shutdown.");
        }
        _ = sigterm.recv() => {
            info!("SIGTERM received. Initiating graceful shutdown.");
        }
        _ = sighup.recv() => {
            info!("SIGHUP received. Initiating graceful shutdown.");
        }
    }
    Ok(())
}

fn collaborators(cfg: &Config) -> Collaborators {
    let media: Arc<dyn MediaPlayer> = Arc::new(NoMedia);

    let calendar: Arc<dyn CalendarSource> = match cfg.calendar_file.as_ref() {
        Some(path) => {
            info!("Calendar from {}", path.display());
            Arc::new(CachedCalendar::new(Arc::new(FileCalendar::new(path)), cfg.calendar_cache()))
        }
        None => Arc::new(NoCalendar),
    };

    let weather: Arc<dyn WeatherSource> = match cfg.weather_file.as_ref() {
        Some(path) => {
            info!("Weather from {}", path.display());
            Arc::new(FileWeather::new(path))
        }
        None => Arc::new(NoWeather),
    };

    let cue: Arc<dyn SceneCue> = match cfg
        .cue_command
        .as_deref()
        .and_then(|c| CommandCue::new(c, cfg.cue_dir()))
    {
        Some(cue) => Arc::new(cue),
        None => Arc::new(SilentCue),
    };

    Collaborators { media, calendar, weather, cue }
}

fn input_source(cfg: &Config) -> Result<Box<dyn InputSource>> {
    match cfg.input() {
        InputKind::Stdin => {
            info!("Reading button labels (A-D) from stdin");
            Ok(Box::new(StdinInput::new(io::BufReader::new(io::stdin()))))
        }
        #[cfg(feature = "gpio")]
        InputKind::Gpio => {
            let gpio = inkydash::input::GpioInput::open(cfg.gpio_lines())
                .context("opening button GPIO lines")?;
            Ok(Box::new(gpio))
        }
        #[cfg(not(feature = "gpio"))]
        InputKind::Gpio => bail!("built without the 'gpio' feature, use --input stdin"),
    }
}

/// The listener blocks on its source, so it gets an OS thread of its own
fn spawn_listener(
    cfg: &Config,
    store: StateStore,
    media: Arc<dyn MediaPlayer>,
    shutdown: Arc<AtomicBool>,
) -> Result<thread::JoinHandle<()>> {
    let mut source = input_source(cfg)?;
    let mut dispatcher = InputDispatcher::new(store, media, cfg.volume_step(), cfg.debounce());
    let handle = thread::Builder::new()
        .name("buttons".into())
        .spawn(move || dispatcher.run(source.as_mut(), &shutdown))
        .context("spawning button listener")?;
    Ok(handle)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let cfg = config::load(&cli)?;

    if cli.dump_config {
        println!("{}", config::dump_config(&cfg)?);
        return Ok(());
    }

    // Initialize the logger, --debug already folded into the level
    env_logger::Builder::from_env(Env::default().default_filter_or(cfg.log_level()))
        .format_timestamp_secs()
        .init();

    info!("{} - chores at a glance", env!("CARGO_PKG_NAME"));
    info!("v.{} built {}", env!("CARGO_PKG_VERSION"), BUILD_DATE);

    let store = StateStore::new(cfg.state_file());
    let now = Local::now().naive_local();

    if let Some(name) = cli.mark.as_deref() {
        if store.mark_started_by_name(name, now).is_none() {
            bail!("unknown appliance '{}'", name);
        }
        return Ok(());
    }

    if cli.reset_state {
        store.reset_to_baseline(now, ChronoDuration::days(RESET_AGE_DAYS));
    }
    if store.initialize_if_absent(now) {
        info!("Seeded {}", store.path().display());
    }

    let services = collaborators(&cfg);
    let mut selector = RenderSelector::new(
        store.clone(),
        services.clone(),
        cfg.event_keyword(),
        cfg.calendar_lookahead_days(),
    );
    let mut panel = SnapshotCompositor::new(cfg.snapshot_file());

    if cli.once {
        let decision = selector.select();
        panel.present(&decision);
        return Ok(());
    }

    let shutdown = Arc::new(AtomicBool::new(false));
    let _listener = spawn_listener(&cfg, store, services.media.clone(), shutdown.clone())?;

    let poll = cfg.poll_interval();
    info!("Entering main display loop, every {}s", poll.as_secs());

    let signals = signal_handler();
    tokio::pin!(signals);

    loop {
        let decision = selector.select();
        panel.present(&decision);

        tokio::select! {
            _ = tokio::time::sleep(poll) => {}
            res = &mut signals => {
                if let Err(e) = res {
                    error!("Signal handling failed: {}", e);
                }
                break;
            }
        }
    }

    // the listener may be parked in a blocking read, it goes down with the process
    shutdown.store(true, Ordering::Relaxed);
    info!("Main application exiting.");
    Ok(())
}
