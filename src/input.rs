/*
 *  input.rs
 *
 *  InkyDash - chores at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  The four front panel buttons, as a blocking stream of presses
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

use log::debug;
use std::fmt;
use std::io::BufRead;
use std::str::FromStr;
use std::time::Instant;

use crate::error::InputError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ButtonLabel {
    A,
    B,
    C,
    D,
}

impl ButtonLabel {
    pub const ALL: [ButtonLabel; 4] = [ButtonLabel::A, ButtonLabel::B, ButtonLabel::C, ButtonLabel::D];
}

impl FromStr for ButtonLabel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "A" => Ok(ButtonLabel::A),
            "B" => Ok(ButtonLabel::B),
            "C" => Ok(ButtonLabel::C),
            "D" => Ok(ButtonLabel::D),
            other => Err(format!("unknown button '{}'", other)),
        }
    }
}

impl fmt::Display for ButtonLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ButtonPress {
    pub label: ButtonLabel,
    /// When the press was read; rppal 0.14 interrupts carry no edge time
    pub at: Instant,
}

impl ButtonPress {
    pub fn now(label: ButtonLabel) -> Self {
        Self { label, at: Instant::now() }
    }
}

pub trait InputSource: Send {
    /// Blocks until the next press. `Ok(None)` once the source is closed.
    fn next_press(&mut self) -> Result<Option<ButtonPress>, InputError>;
}

/// One label per line, handy on a desk without buttons
pub struct StdinInput<R> {
    reader: R,
}

impl<R: BufRead + Send> StdinInput<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }
}

impl<R: BufRead + Send> InputSource for StdinInput<R> {
    fn next_press(&mut self) -> Result<Option<ButtonPress>, InputError> {
        let mut line = String::new();
        loop {
            line.clear();
            if self.reader.read_line(&mut line)? == 0 {
                return Ok(None);
            }
            match line.parse::<ButtonLabel>() {
                Ok(label) => return Ok(Some(ButtonPress::now(label))),
                Err(e) => debug!("Ignoring input line: {}", e),
            }
        }
    }
}

#[cfg(feature = "gpio")]
pub use gpio::GpioInput;

#[cfg(feature = "gpio")]
mod gpio {
    use super::*;
    use log::info;
    use rppal::gpio::{Gpio, InputPin, Trigger};

    /// Pull-up inputs, a press pulls the line low
    pub struct GpioInput {
        gpio: Gpio,
        pins: Vec<(InputPin, ButtonLabel)>,
    }

    fn device(e: rppal::gpio::Error) -> InputError {
        InputError::Device(e.to_string())
    }

    impl GpioInput {
        /// `lines` are BCM numbers in label order A, B, C, D
        pub fn open(lines: [u8; 4]) -> Result<Self, InputError> {
            let gpio = Gpio::new().map_err(device)?;
            let mut pins = Vec::with_capacity(lines.len());
            for (bcm, label) in lines.into_iter().zip(ButtonLabel::ALL) {
                let mut pin = gpio.get(bcm).map_err(device)?.into_input_pullup();
                pin.set_interrupt(Trigger::FallingEdge).map_err(device)?;
                pins.push((pin, label));
            }
            info!("Button handler ready on BCM {:?}", lines);
            Ok(Self { gpio, pins })
        }
    }

    impl InputSource for GpioInput {
        fn next_press(&mut self) -> Result<Option<ButtonPress>, InputError> {
            let watched: Vec<&InputPin> = self.pins.iter().map(|(p, _)| p).collect();
            loop {
                let fired = self.gpio.poll_interrupts(&watched, false, None).map_err(device)?;
                let Some((pin, _level)) = fired else { continue };
                let line = pin.pin();
                if let Some((_, label)) = self.pins.iter().find(|(p, _)| p.pin() == line) {
                    return Ok(Some(ButtonPress::now(*label)));
                }
            }
        }
    }
}
