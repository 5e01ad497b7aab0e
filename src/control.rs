//! Line-based control surface read from stdin
//!
//! A reader thread parses commands and forwards them over a channel; the
//! pipeline loop drains the channel between ticks, so pipeline state is only
//! ever touched from the loop itself.

use crate::cloak::{CloakParams, Preset};
use crate::error::CloakError;
use clap::ValueEnum;
use crossbeam_channel::{unbounded, Receiver};
use std::io::BufRead;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlCommand {
    CaptureBackground,
    ClearBackground,
    Hue { low: u8, high: u8 },
    Saturation(u8),
    Value(u8),
    EdgeGrowth(u32),
    Feather(u32),
    Preset(Preset),
    ToggleMatte,
    Show,
    Quit,
}

impl ControlCommand {
    /// Apply a parameter command to the snapshot; returns false for other commands
    pub fn apply(&self, params: &mut CloakParams) -> bool {
        match *self {
            ControlCommand::Hue { low, high } => {
                params.range.hue_low = low;
                params.range.hue_high = high;
            }
            ControlCommand::Saturation(s) => params.range.sat_low = s,
            ControlCommand::Value(v) => params.range.val_low = v,
            ControlCommand::EdgeGrowth(g) => params.edge_growth = g,
            ControlCommand::Feather(f) => params.feather = f,
            ControlCommand::Preset(preset) => params.range = preset.range(),
            _ => return false,
        }
        *params = params.clamped();
        true
    }
}

fn parse_value<T: FromStr>(field: &'static str, value: Option<&str>) -> Result<T, CloakError> {
    let value = value.unwrap_or_default();
    value.parse().map_err(|_| CloakError::InvalidValue {
        field,
        value: value.to_string(),
    })
}

impl FromStr for ControlCommand {
    type Err = CloakError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let Some(verb) = words.next() else {
            return Err(CloakError::InvalidCommand(line.to_string()));
        };

        let command = match verb.to_ascii_lowercase().as_str() {
            "c" | "capture" => ControlCommand::CaptureBackground,
            "clear" => ControlCommand::ClearBackground,
            "hue" => ControlCommand::Hue {
                low: parse_value("hue", words.next())?,
                high: parse_value("hue", words.next())?,
            },
            "sat" => ControlCommand::Saturation(parse_value("sat", words.next())?),
            "val" => ControlCommand::Value(parse_value("val", words.next())?),
            "grow" => ControlCommand::EdgeGrowth(parse_value("grow", words.next())?),
            "feather" => ControlCommand::Feather(parse_value("feather", words.next())?),
            "preset" => {
                let name = words.next().unwrap_or_default();
                let preset = <Preset as ValueEnum>::from_str(name, true).map_err(|_| {
                    CloakError::InvalidValue {
                        field: "preset",
                        value: name.to_string(),
                    }
                })?;
                ControlCommand::Preset(preset)
            }
            "matte" => ControlCommand::ToggleMatte,
            "show" => ControlCommand::Show,
            "q" | "quit" => ControlCommand::Quit,
            _ => return Err(CloakError::InvalidCommand(line.to_string())),
        };

        if words.next().is_some() {
            return Err(CloakError::InvalidCommand(line.to_string()));
        }
        Ok(command)
    }
}

/// Spawn the stdin reader; the channel disconnects when stdin closes
pub fn spawn_stdin_control() -> std::io::Result<Receiver<ControlCommand>> {
    let (tx, rx) = unbounded();

    std::thread::Builder::new()
        .name("stdin-control".to_string())
        .spawn(move || {
            let stdin = std::io::stdin();
            for line in stdin.lock().lines() {
                let line = match line {
                    Ok(line) => line,
                    Err(e) => {
                        tracing::warn!("Control input closed: {}", e);
                        break;
                    }
                };
                if line.trim().is_empty() {
                    continue;
                }
                match line.parse::<ControlCommand>() {
                    Ok(command) => {
                        if tx.send(command).is_err() {
                            break;
                        }
                    }
                    Err(e) => tracing::warn!("{}", e),
                }
            }
            tracing::debug!("Control reader finished");
        })?;

    Ok(rx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cloak::HsvRange;

    #[test]
    fn parses_every_command() {
        let cases = [
            ("capture", ControlCommand::CaptureBackground),
            ("c", ControlCommand::CaptureBackground),
            ("clear", ControlCommand::ClearBackground),
            ("hue 10 40", ControlCommand::Hue { low: 10, high: 40 }),
            ("sat 90", ControlCommand::Saturation(90)),
            ("val 12", ControlCommand::Value(12)),
            ("grow 4", ControlCommand::EdgeGrowth(4)),
            ("feather 30", ControlCommand::Feather(30)),
            ("preset Blue", ControlCommand::Preset(Preset::Blue)),
            ("matte", ControlCommand::ToggleMatte),
            ("show", ControlCommand::Show),
            ("  QUIT ", ControlCommand::Quit),
        ];
        for (line, expected) in cases {
            assert_eq!(line.parse::<ControlCommand>(), Ok(expected), "{line}");
        }
    }

    #[test]
    fn rejects_malformed_lines() {
        assert_eq!(
            "jump".parse::<ControlCommand>(),
            Err(CloakError::InvalidCommand("jump".to_string()))
        );
        assert_eq!(
            "sat lots".parse::<ControlCommand>(),
            Err(CloakError::InvalidValue {
                field: "sat",
                value: "lots".to_string()
            })
        );
        assert!("hue 10".parse::<ControlCommand>().is_err());
        assert!("sat 300".parse::<ControlCommand>().is_err());
        assert!("preset purple".parse::<ControlCommand>().is_err());
        assert!("grow 1 2".parse::<ControlCommand>().is_err());
        assert!("".parse::<ControlCommand>().is_err());
    }

    #[test]
    fn apply_updates_and_clamps_snapshot() {
        let mut params = CloakParams::default();

        assert!(ControlCommand::Hue { low: 5, high: 250 }.apply(&mut params));
        assert_eq!(params.range.hue_high, 180);

        assert!(ControlCommand::Feather(100).apply(&mut params));
        assert_eq!(params.feather, 61);

        assert!(ControlCommand::Preset(Preset::Red).apply(&mut params));
        assert_eq!(params.range, HsvRange::new(0, 10, 120, 70));

        assert!(!ControlCommand::CaptureBackground.apply(&mut params));
    }
}
