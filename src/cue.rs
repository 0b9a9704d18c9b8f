/*
 *  cue.rs
 *
 *  InkyDash - chores at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  Audio cue played when a cooldown scene comes on screen
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

use log::{info, warn};
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::thread;

use crate::cooldown::CooldownScene;

pub trait SceneCue: Send + Sync {
    /// Fire and forget
    fn play(&self, scene: CooldownScene);
}

#[derive(Debug, Default)]
pub struct SilentCue;

impl SceneCue for SilentCue {
    fn play(&self, _scene: CooldownScene) {}
}

/// Spawns an external player on `<dir>/<scene>.mp3`, e.g. `mpg123 -q`
#[derive(Debug)]
pub struct CommandCue {
    program: String,
    args: Vec<String>,
    dir: PathBuf,
}

impl CommandCue {
    /// `command` is split on whitespace, the first word is the program.
    /// Returns `None` for an empty command.
    pub fn new(command: &str, dir: impl Into<PathBuf>) -> Option<Self> {
        let mut words = command.split_whitespace().map(str::to_string);
        let program = words.next()?;
        Some(Self { program, args: words.collect(), dir: dir.into() })
    }

    pub fn file_for(&self, scene: CooldownScene) -> PathBuf {
        self.dir.join(format!("{}.mp3", scene.name()))
    }
}

impl SceneCue for CommandCue {
    fn play(&self, scene: CooldownScene) {
        let file = self.file_for(scene);
        if !file.exists() {
            warn!("Audio file not found: {}", file.display());
            return;
        }
        match Command::new(&self.program)
            .args(&self.args)
            .arg(&file)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
        {
            Ok(mut child) => {
                info!("Playing {} cue via {}", scene, self.program);
                // reap it off the render thread
                thread::spawn(move || child.wait());
            }
            Err(e) => warn!("Failed to start {} for {} cue: {}", self.program, scene, e),
        }
    }
}
