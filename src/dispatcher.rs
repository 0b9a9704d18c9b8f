/*
 *  dispatcher.rs
 *
 *  InkyDash - chores at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  Button presses to actions. While music is playing the buttons drive
 *  the player, otherwise each one marks an appliance as started.
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

use chrono::{Local, NaiveDateTime};
use log::{debug, error, info, warn};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crate::appliance::Appliance;
use crate::error::CollaboratorError;
use crate::input::{ButtonLabel, ButtonPress, InputSource};
use crate::media::MediaPlayer;
use crate::state_store::StateStore;

/// Back-off after a failing input read before trying again
const INPUT_RETRY: Duration = Duration::from_secs(1);

/// Not persisted, probed on every press
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Default,
    Media,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    VolumeUp,
    VolumeDown,
    NextTrack,
    PreviousTrack,
}

/// What a press turned into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    Debounced,
    MarkedStarted(Appliance),
    Transport(Transport),
    Failed,
}

pub fn appliance_for(label: ButtonLabel) -> Appliance {
    match label {
        ButtonLabel::A => Appliance::WashingMachine,
        ButtonLabel::B => Appliance::Dryer,
        ButtonLabel::C => Appliance::Dishwasher,
        ButtonLabel::D => Appliance::Vacuum,
    }
}

pub fn transport_for(label: ButtonLabel) -> Transport {
    match label {
        ButtonLabel::A => Transport::VolumeUp,
        ButtonLabel::B => Transport::VolumeDown,
        ButtonLabel::C => Transport::NextTrack,
        ButtonLabel::D => Transport::PreviousTrack,
    }
}

pub struct InputDispatcher {
    store: StateStore,
    media: Arc<dyn MediaPlayer>,
    volume_step: u8,
    debounce: Duration,
    last_press: HashMap<ButtonLabel, Instant>,
}

impl InputDispatcher {
    pub fn new(store: StateStore, media: Arc<dyn MediaPlayer>, volume_step: u8, debounce: Duration) -> Self {
        Self {
            store,
            media,
            volume_step,
            debounce,
            last_press: HashMap::new(),
        }
    }

    /// A failed probe counts as "not playing"
    pub fn mode(&self) -> InputMode {
        match self.media.is_playing() {
            Ok(true) => InputMode::Media,
            Ok(false) => InputMode::Default,
            Err(e) => {
                debug!("Media probe failed, using default buttons: {}", e);
                InputMode::Default
            }
        }
    }

    pub fn handle(&mut self, press: ButtonPress) -> Dispatch {
        self.handle_at(press, Local::now().naive_local())
    }

    pub fn handle_at(&mut self, press: ButtonPress, now: NaiveDateTime) -> Dispatch {
        if self.bounced(press) {
            debug!("Button {} debounced", press.label);
            return Dispatch::Debounced;
        }

        match self.mode() {
            InputMode::Default => {
                let appliance = appliance_for(press.label);
                self.store.mark_started_at(appliance, now);
                Dispatch::MarkedStarted(appliance)
            }
            InputMode::Media => {
                let transport = transport_for(press.label);
                match self.send(transport) {
                    Ok(()) => Dispatch::Transport(transport),
                    Err(e) => {
                        error!("Media action {:?} failed: {}", transport, e);
                        Dispatch::Failed
                    }
                }
            }
        }
    }

    /// Blocking listener loop, returns when the source closes or `shutdown` is raised
    pub fn run(&mut self, source: &mut dyn InputSource, shutdown: &AtomicBool) {
        info!("Listening for button presses...");
        while !shutdown.load(Ordering::Relaxed) {
            match source.next_press() {
                Ok(Some(press)) => {
                    info!("Button {} pressed", press.label);
                    self.handle(press);
                }
                Ok(None) => {
                    info!("Button input closed");
                    break;
                }
                Err(e) => {
                    error!("Button listener error: {}", e);
                    thread::sleep(INPUT_RETRY);
                }
            }
        }
        info!("Button listener stopped");
    }

    /// Presses of the same button closer than the debounce spacing are one actuation.
    /// `press.at` is stamped when the source hands the press over, not at the edge,
    /// so a bounce queued behind a slow press (state write, media probe) can slip through.
    fn bounced(&mut self, press: ButtonPress) -> bool {
        if let Some(last) = self.last_press.get(&press.label) {
            if press.at.saturating_duration_since(*last) < self.debounce {
                return true;
            }
        }
        self.last_press.insert(press.label, press.at);
        false
    }

    fn send(&self, transport: Transport) -> Result<(), CollaboratorError> {
        let step = i16::from(self.volume_step);
        match transport {
            Transport::VolumeUp => self.change_volume(step),
            Transport::VolumeDown => self.change_volume(-step),
            Transport::NextTrack => {
                self.media.next_track()?;
                info!("Next track");
                Ok(())
            }
            Transport::PreviousTrack => {
                self.media.previous_track()?;
                info!("Previous track");
                Ok(())
            }
        }
    }

    fn change_volume(&self, delta: i16) -> Result<(), CollaboratorError> {
        let Some(current) = self.media.volume()? else {
            warn!("Player reports no volume, leaving it alone");
            return Ok(());
        };
        let target = (i16::from(current) + delta).clamp(0, 100) as u8;
        self.media.set_volume(target)?;
        info!("Volume: {}% -> {}%", current, target);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::io::Cursor;
    use std::sync::Mutex;
    use tempfile::tempdir;

    use crate::input::StdinInput;

    #[derive(Default)]
    struct FakePlayer {
        playing: bool,
        probe_fails: bool,
        volume: Mutex<Option<u8>>,
        skipped: Mutex<Vec<&'static str>>,
    }

    impl MediaPlayer for FakePlayer {
        fn session_active(&self) -> Result<bool, CollaboratorError> {
            Ok(self.playing)
        }
        fn is_playing(&self) -> Result<bool, CollaboratorError> {
            if self.probe_fails {
                return Err(CollaboratorError::Unavailable("fake player"));
            }
            Ok(self.playing)
        }
        fn play_pause(&self) -> Result<(), CollaboratorError> {
            Ok(())
        }
        fn next_track(&self) -> Result<(), CollaboratorError> {
            self.skipped.lock().unwrap().push("next");
            Ok(())
        }
        fn previous_track(&self) -> Result<(), CollaboratorError> {
            self.skipped.lock().unwrap().push("previous");
            Ok(())
        }
        fn volume(&self) -> Result<Option<u8>, CollaboratorError> {
            Ok(*self.volume.lock().unwrap())
        }
        fn set_volume(&self, percent: u8) -> Result<(), CollaboratorError> {
            *self.volume.lock().unwrap() = Some(percent);
            Ok(())
        }
    }

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, 14).unwrap().and_hms_opt(18, 0, 0).unwrap()
    }

    fn dispatcher(dir: &std::path::Path, player: Arc<FakePlayer>) -> InputDispatcher {
        InputDispatcher::new(
            StateStore::new(dir.join("state.json")),
            player,
            10,
            Duration::from_millis(100),
        )
    }

    #[test]
    fn test_default_mode_marks_appliances() {
        let temp = tempdir().unwrap();
        let mut d = dispatcher(temp.path(), Arc::new(FakePlayer::default()));

        assert_eq!(d.mode(), InputMode::Default);
        assert_eq!(
            d.handle_at(ButtonPress::now(ButtonLabel::B), now()),
            Dispatch::MarkedStarted(Appliance::Dryer)
        );
        let state = StateStore::new(temp.path().join("state.json")).load();
        assert!(state[&Appliance::Dryer].is_running);
        assert_eq!(state[&Appliance::Dryer].last_run, now());
    }

    #[test]
    fn test_failed_probe_falls_back_to_default() {
        let temp = tempdir().unwrap();
        let player = FakePlayer { playing: true, probe_fails: true, ..Default::default() };
        let mut d = dispatcher(temp.path(), Arc::new(player));

        assert_eq!(
            d.handle_at(ButtonPress::now(ButtonLabel::D), now()),
            Dispatch::MarkedStarted(Appliance::Vacuum)
        );
    }

    #[test]
    fn test_media_mode_volume_clamps() {
        let temp = tempdir().unwrap();
        let player = Arc::new(FakePlayer {
            playing: true,
            volume: Mutex::new(Some(95)),
            ..Default::default()
        });
        let mut d = dispatcher(temp.path(), player.clone());
        let start = Instant::now();

        let up = ButtonPress { label: ButtonLabel::A, at: start };
        assert_eq!(d.handle_at(up, now()), Dispatch::Transport(Transport::VolumeUp));
        assert_eq!(*player.volume.lock().unwrap(), Some(100));

        *player.volume.lock().unwrap() = Some(4);
        let down = ButtonPress { label: ButtonLabel::B, at: start };
        assert_eq!(d.handle_at(down, now()), Dispatch::Transport(Transport::VolumeDown));
        assert_eq!(*player.volume.lock().unwrap(), Some(0));

        // nothing persisted in media mode
        assert!(!temp.path().join("state.json").exists());
    }

    #[test]
    fn test_media_mode_skips_tracks() {
        let temp = tempdir().unwrap();
        let player = Arc::new(FakePlayer { playing: true, ..Default::default() });
        let mut d = dispatcher(temp.path(), player.clone());

        d.handle_at(ButtonPress::now(ButtonLabel::C), now());
        d.handle_at(ButtonPress::now(ButtonLabel::D), now());
        assert_eq!(*player.skipped.lock().unwrap(), vec!["next", "previous"]);
    }

    #[test]
    fn test_unknown_volume_is_left_alone() {
        let temp = tempdir().unwrap();
        let player = Arc::new(FakePlayer { playing: true, ..Default::default() });
        let mut d = dispatcher(temp.path(), player.clone());

        assert_eq!(
            d.handle_at(ButtonPress::now(ButtonLabel::A), now()),
            Dispatch::Transport(Transport::VolumeUp)
        );
        assert_eq!(*player.volume.lock().unwrap(), None);
    }

    #[test]
    fn test_repeat_press_is_debounced_per_button() {
        let temp = tempdir().unwrap();
        let mut d = dispatcher(temp.path(), Arc::new(FakePlayer::default()));
        let start = Instant::now();
        let press = |label, ms| ButtonPress { label, at: start + Duration::from_millis(ms) };

        assert_eq!(d.handle_at(press(ButtonLabel::A, 0), now()), Dispatch::MarkedStarted(Appliance::WashingMachine));
        assert_eq!(d.handle_at(press(ButtonLabel::A, 40), now()), Dispatch::Debounced);
        assert_eq!(d.handle_at(press(ButtonLabel::C, 50), now()), Dispatch::MarkedStarted(Appliance::Dishwasher));
        assert_eq!(d.handle_at(press(ButtonLabel::A, 150), now()), Dispatch::MarkedStarted(Appliance::WashingMachine));
    }

    #[test]
    fn test_debounce_uses_press_time_not_handling_time() {
        let temp = tempdir().unwrap();
        let mut d = dispatcher(temp.path(), Arc::new(FakePlayer::default()));
        let start = Instant::now();

        d.handle_at(ButtonPress { label: ButtonLabel::B, at: start }, now());
        // handled late, stamped early: still a bounce
        thread::sleep(Duration::from_millis(150));
        let queued = ButtonPress { label: ButtonLabel::B, at: start + Duration::from_millis(30) };
        assert_eq!(d.handle_at(queued, now()), Dispatch::Debounced);
    }

    #[test]
    fn test_run_stops_when_input_closes() {
        let temp = tempdir().unwrap();
        let mut d = dispatcher(temp.path(), Arc::new(FakePlayer::default()));
        let mut source = StdinInput::new(Cursor::new("a\nd\n"));

        d.run(&mut source, &AtomicBool::new(false));

        let state = StateStore::new(temp.path().join("state.json")).load();
        assert!(state[&Appliance::WashingMachine].is_running);
        assert!(state[&Appliance::Vacuum].is_running);
    }

    #[test]
    fn test_run_honours_shutdown_flag() {
        let temp = tempdir().unwrap();
        let mut d = dispatcher(temp.path(), Arc::new(FakePlayer::default()));
        let mut source = StdinInput::new(Cursor::new("a\n"));

        d.run(&mut source, &AtomicBool::new(true));
        assert!(!temp.path().join("state.json").exists());
    }
}
