/*
 *  media.rs
 *
 *  InkyDash - chores at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  Media player collaborator - session probe and transport commands
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

use crate::error::CollaboratorError;

/// A remote player. Token handling belongs to the implementor.
pub trait MediaPlayer: Send + Sync {
    /// A track is loaded, the overlay has something to show
    fn session_active(&self) -> Result<bool, CollaboratorError>;
    /// A track is loaded and playing, buttons drive the player
    fn is_playing(&self) -> Result<bool, CollaboratorError>;
    fn play_pause(&self) -> Result<(), CollaboratorError>;
    fn next_track(&self) -> Result<(), CollaboratorError>;
    fn previous_track(&self) -> Result<(), CollaboratorError>;
    /// Current volume in percent, `None` when the device doesn't report one
    fn volume(&self) -> Result<Option<u8>, CollaboratorError>;
    fn set_volume(&self, percent: u8) -> Result<(), CollaboratorError>;
}

/// Used when no player is configured, never active.
#[derive(Debug, Default)]
pub struct NoMedia;

impl MediaPlayer for NoMedia {
    fn session_active(&self) -> Result<bool, CollaboratorError> {
        Ok(false)
    }

    fn is_playing(&self) -> Result<bool, CollaboratorError> {
        Ok(false)
    }

    fn play_pause(&self) -> Result<(), CollaboratorError> {
        Err(CollaboratorError::Unavailable("media player"))
    }

    fn next_track(&self) -> Result<(), CollaboratorError> {
        Err(CollaboratorError::Unavailable("media player"))
    }

    fn previous_track(&self) -> Result<(), CollaboratorError> {
        Err(CollaboratorError::Unavailable("media player"))
    }

    fn volume(&self) -> Result<Option<u8>, CollaboratorError> {
        Ok(None)
    }

    fn set_volume(&self, _percent: u8) -> Result<(), CollaboratorError> {
        Err(CollaboratorError::Unavailable("media player"))
    }
}
