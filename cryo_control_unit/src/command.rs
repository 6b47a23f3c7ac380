//! Remote/debug command interface.
//!
//! One text line per command, mapped 1:1 onto [`ControlCore`] operations.
//! Unknown commands and bad arguments are reported back as
//! [`CommandError`], never dropped.
//!
//! ```text
//! set_setpoint 9.5        set_mode adaptive       set_manual 40
//! auto | enable | disable set_deadband 0.3        set_compensation off
//! acknowledge_alarm all   clear_alarm phase_failure
//! reset_fault | reset_pid trip 30                 status | alarms
//! save_config
//! ```

use std::fmt;
use std::str::FromStr;

use cryo_common::control_unit::alarm::AlarmId;
use cryo_common::control_unit::sensor::TimestampMs;
use cryo_common::control_unit::state::AlgorithmKind;
use thiserror::Error;

use crate::cycle::ControlCore;
use crate::error::CoreError;
use crate::io::{ConfigStore, EventLog};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CommandError {
    #[error("unknown command: {0}")]
    UnknownCommand(String),

    #[error("missing argument: {0}")]
    MissingArgument(&'static str),

    #[error("invalid {name}: {value}")]
    InvalidArgument { name: &'static str, value: String },

    #[error("unknown alarm: {0}")]
    UnknownAlarm(String),

    #[error("alarm not active: {0}")]
    AlarmNotActive(&'static str),

    #[error(transparent)]
    Rejected(#[from] CoreError),

    #[error("status encoding failed: {0}")]
    Encode(String),

    #[error("configuration save failed")]
    SaveFailed,
}

/// Target of `acknowledge_alarm`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlarmTarget {
    All,
    One(AlarmId),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    SetSetpoint(f64),
    SetMode(AlgorithmKind),
    SetManual(f64),
    Auto,
    Enable,
    Disable,
    SetDeadband(f64),
    SetCompensation(bool),
    AcknowledgeAlarm(AlarmTarget),
    ClearAlarm(AlarmId),
    ResetFault,
    ResetPid,
    /// Explicit lockout trip [s].
    Trip(u64),
    Status,
    Alarms,
    SaveConfig,
}

fn arg<'a>(parts: &mut impl Iterator<Item = &'a str>, name: &'static str) -> Result<&'a str, CommandError> {
    parts.next().ok_or(CommandError::MissingArgument(name))
}

fn number<T: FromStr>(value: &str, name: &'static str) -> Result<T, CommandError> {
    value.parse::<T>().map_err(|_| CommandError::InvalidArgument {
        name,
        value: value.to_owned(),
    })
}

fn alarm(name: &str) -> Result<AlarmId, CommandError> {
    AlarmId::from_name(name).ok_or_else(|| CommandError::UnknownAlarm(name.to_owned()))
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut parts = line.split_whitespace();
        let name = parts.next().ok_or(CommandError::MissingArgument("command"))?;
        let cmd = match name {
            "set_setpoint" => Self::SetSetpoint(number(arg(&mut parts, "setpoint")?, "setpoint")?),
            "set_mode" => {
                let v = arg(&mut parts, "algorithm")?;
                Self::SetMode(AlgorithmKind::from_name(v).ok_or_else(|| {
                    CommandError::InvalidArgument {
                        name: "algorithm",
                        value: v.to_owned(),
                    }
                })?)
            }
            "set_manual" => Self::SetManual(number(arg(&mut parts, "output")?, "output")?),
            "auto" => Self::Auto,
            "enable" => Self::Enable,
            "disable" => Self::Disable,
            "set_deadband" => Self::SetDeadband(number(arg(&mut parts, "deadband")?, "deadband")?),
            "set_compensation" => match arg(&mut parts, "on|off")? {
                "on" => Self::SetCompensation(true),
                "off" => Self::SetCompensation(false),
                other => {
                    return Err(CommandError::InvalidArgument {
                        name: "compensation",
                        value: other.to_owned(),
                    });
                }
            },
            "acknowledge_alarm" => match arg(&mut parts, "alarm")? {
                "all" => Self::AcknowledgeAlarm(AlarmTarget::All),
                id => Self::AcknowledgeAlarm(AlarmTarget::One(alarm(id)?)),
            },
            "clear_alarm" => Self::ClearAlarm(alarm(arg(&mut parts, "alarm")?)?),
            "reset_fault" => Self::ResetFault,
            "reset_pid" => Self::ResetPid,
            "trip" => Self::Trip(number(arg(&mut parts, "seconds")?, "seconds")?),
            "status" => Self::Status,
            "alarms" => Self::Alarms,
            "save_config" => Self::SaveConfig,
            other => return Err(CommandError::UnknownCommand(other.to_owned())),
        };
        Ok(cmd)
    }
}

/// Text reply to a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResponse(pub String);

impl fmt::Display for CommandResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for CommandResponse {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for CommandResponse {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// Collaborators a command may touch.
pub struct CommandContext<'a> {
    pub events: &'a mut dyn EventLog,
    pub store: &'a mut dyn ConfigStore,
}

/// Apply `cmd` to `core`.
pub fn execute(
    core: &mut ControlCore,
    cmd: Command,
    ctx: &mut CommandContext<'_>,
    now: TimestampMs,
) -> Result<CommandResponse, CommandError> {
    let reply: CommandResponse = match cmd {
        Command::SetSetpoint(v) => {
            core.set_setpoint(v)?;
            format!("setpoint {v:.1}").into()
        }
        Command::SetMode(kind) => {
            core.set_algorithm(kind, now, ctx.events);
            format!("algorithm {}", kind.name()).into()
        }
        Command::SetManual(v) => {
            core.set_manual(v)?;
            format!("manual {v:.1}").into()
        }
        Command::Auto => {
            core.set_auto();
            "auto".into()
        }
        Command::Enable => {
            core.enable();
            "enabled".into()
        }
        Command::Disable => {
            core.disable();
            "disabled".into()
        }
        Command::SetDeadband(v) => {
            core.set_deadband(v)?;
            format!("deadband {v:.2}").into()
        }
        Command::SetCompensation(on) => {
            core.set_compensation(on);
            format!("compensation {}", if on { "on" } else { "off" }).into()
        }
        Command::AcknowledgeAlarm(AlarmTarget::All) => {
            format!("acknowledged {}", core.acknowledge_all()).into()
        }
        Command::AcknowledgeAlarm(AlarmTarget::One(id)) => {
            if !core.acknowledge_alarm(id) {
                return Err(CommandError::AlarmNotActive(id.name()));
            }
            format!("acknowledged {}", id.name()).into()
        }
        Command::ClearAlarm(id) => {
            if !core.clear_alarm(id, now, ctx.events) {
                return Err(CommandError::AlarmNotActive(id.name()));
            }
            format!("cleared {}", id.name()).into()
        }
        Command::ResetFault => match core.reset_fault(ctx.events) {
            Some(f) => format!("fault reset: {}", f.kind.name()).into(),
            None => "no active fault".into(),
        },
        Command::ResetPid => {
            core.reset_pid(now);
            "pid reset".into()
        }
        Command::Trip(seconds) => {
            core.trip_lockout(seconds.saturating_mul(1_000), now, ctx.events);
            format!("lockout {seconds} s").into()
        }
        Command::Status => serde_json::to_string(&core.snapshot(now))
            .map_err(|e| CommandError::Encode(e.to_string()))?
            .into(),
        Command::Alarms => {
            let alarms = core.alarms().active();
            if alarms.is_empty() {
                "no active alarms".into()
            } else {
                alarms
                    .iter()
                    .map(|a| {
                        format!(
                            "{:#06x} {} {}{}",
                            a.id.code(),
                            a.id.name(),
                            a.severity.name(),
                            if a.acknowledged { " ack" } else { "" }
                        )
                    })
                    .collect::<Vec<_>>()
                    .join("\n")
                    .into()
            }
        }
        Command::SaveConfig => {
            if !core.save_config(ctx.store) {
                return Err(CommandError::SaveFailed);
            }
            "configuration saved".into()
        }
    };
    Ok(reply)
}

/// Parse and execute one line.
pub fn handle_line(
    core: &mut ControlCore,
    line: &str,
    ctx: &mut CommandContext<'_>,
    now: TimestampMs,
) -> Result<CommandResponse, CommandError> {
    let cmd: Command = line.parse()?;
    execute(core, cmd, ctx, now)
}

// ─── Tests ──────────────────────────────────────────────────────────
