// 50 Hz drive loop with watchdog
// The loop is the only thing that decides when a tick happens; the outputs
// just ramp one step per call. If commands stop arriving the watchdog ramps
// the drive back to zero instead of holding the last command forever.

use std::io::{self, Write};
use std::path::Path;
use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use tokio::time::{Interval, MissedTickBehavior, interval};
use tracing::{info, warn};

use crate::config::{CMD_TIMEOUT, DriveConfig, LOOP_HZ};
use crate::drive::{SideVelocities, TankDrive};
use crate::messages::{DriveCommand, RuntimeHealth, ScriptStep};
use crate::output::{OutputDevice, OutputError};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

// Teleop command magnitudes
const TELEOP_FORWARD: f64 = 0.6;
const TELEOP_TURN: f64 = 0.4;

pub struct Runtime<D: OutputDevice> {
    drive: TankDrive<D>,
    latest_cmd: Option<DriveCommand>,
    cmd_received_at: Instant,
    health: RuntimeHealth,
    ticks: u64,
    // Raw toggle output is held until the next command or stop
    toggled_on: bool,
}

impl<D: OutputDevice> Runtime<D> {
    pub fn new(drive: TankDrive<D>) -> Self {
        Self {
            drive,
            latest_cmd: None,
            cmd_received_at: Instant::now(),
            health: RuntimeHealth::CmdStale, // Start stale until first cmd
            ticks: 0,
            toggled_on: false,
        }
    }

    /// Process incoming command; releases a held toggle
    pub fn on_command_at(&mut self, cmd: DriveCommand, now: Instant) {
        self.toggled_on = false;
        self.latest_cmd = Some(cmd);
        self.cmd_received_at = now;
    }

    /// Jump to `cmd` without ramping and keep it as the current command
    pub fn apply_immediate(&mut self, cmd: DriveCommand, now: Instant) -> Result<(), OutputError> {
        self.drive.set(cmd)?;
        self.on_command_at(cmd, now);
        Ok(())
    }

    /// Stop now and forget the last command
    pub fn emergency_stop(&mut self) -> Result<(), OutputError> {
        warn!("Emergency stop");
        self.latest_cmd = None;
        self.toggled_on = false;
        self.drive.stop()
    }

    /// Toggle both sides between raw 0.0 and 1.0.
    ///
    /// While on, ticks leave the outputs alone instead of ramping them back
    /// toward the command target. Any new command or a stop releases it.
    pub fn toggle(&mut self) -> Result<(), OutputError> {
        self.drive.toggle()?;
        self.toggled_on = self.drive.left().leader().device().read() != 0.0;
        info!("Toggle {}", if self.toggled_on { "on" } else { "off" });
        Ok(())
    }

    pub fn is_toggled_on(&self) -> bool {
        self.toggled_on
    }

    /// Pick the ramp target based on watchdog state
    fn target_at(&mut self, now: Instant) -> DriveCommand {
        let cmd_age = now.saturating_duration_since(self.cmd_received_at);

        match self.latest_cmd {
            Some(cmd) if cmd_age <= CMD_TIMEOUT => {
                self.health = RuntimeHealth::Ok;
                cmd
            }
            Some(_) => {
                // Watchdog triggered - ramp down to a stop
                if self.health != RuntimeHealth::CmdStale {
                    warn!("Command stale ({:?} old), stopping drive", cmd_age);
                }
                self.health = RuntimeHealth::CmdStale;
                DriveCommand::default()
            }
            None => {
                self.health = RuntimeHealth::CmdStale;
                DriveCommand::default()
            }
        }
    }

    /// Advance the drive by one tick
    pub fn tick_at(&mut self, now: Instant) -> Result<SideVelocities, OutputError> {
        let target = self.target_at(now);
        self.ticks += 1;
        if self.toggled_on {
            return Ok(self.drive.velocities());
        }
        self.drive.arcade(target)
    }

    pub fn health(&self) -> RuntimeHealth {
        self.health
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn drive(&self) -> &TankDrive<D> {
        &self.drive
    }
}

fn loop_period() -> Duration {
    Duration::from_millis(1000 / LOOP_HZ)
}

// A stalled loop resumes at the normal cadence; bursting would apply several
// ramp steps back to back
fn loop_interval() -> Interval {
    let mut tick = interval(loop_period());
    tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
    tick
}

/// Run a scripted profile, printing one JSON sample per tick
pub async fn run_profile(config: &DriveConfig, script: &Path) -> Result<(), BoxError> {
    let steps: Vec<ScriptStep> = serde_json::from_str(&std::fs::read_to_string(script)?)?;
    let mut runtime = Runtime::new(TankDrive::simulated(config)?);
    let mut tick = loop_interval();

    info!(
        "Profile started: {} steps, {}Hz loop",
        steps.len(),
        LOOP_HZ
    );

    let mut stdout = io::stdout();
    for step in &steps {
        for i in 0..step.ticks {
            tick.tick().await;
            let now = Instant::now();

            if i == 0 && step.immediate {
                runtime.apply_immediate(step.command, now)?;
            } else {
                runtime.on_command_at(step.command, now);
            }
            runtime.tick_at(now)?;

            let sample = runtime.drive().sample(runtime.ticks(), runtime.health());
            writeln!(stdout, "{}", serde_json::to_string(&sample)?)?;
        }
    }

    info!("Profile complete after {} ticks", runtime.ticks());
    Ok(())
}

/// Keyboard teleop: W/S forward, A/D turn, space stop, T toggle, Q quit
pub async fn run_teleop(config: &DriveConfig) -> Result<(), BoxError> {
    let mut runtime = Runtime::new(TankDrive::simulated(config)?);

    info!(
        "Teleop started: {}Hz loop, {}ms watchdog timeout",
        LOOP_HZ,
        CMD_TIMEOUT.as_millis()
    );
    info!("Controls: W/S=forward, A/D=turn, space=stop, T=toggle, Q=quit");

    enable_raw_mode()?;
    let result = teleop_loop(&mut runtime).await;
    disable_raw_mode()?;
    println!();

    result
}

async fn teleop_loop<D: OutputDevice>(runtime: &mut Runtime<D>) -> Result<(), BoxError> {
    let mut tick = loop_interval();
    let mut stdout = io::stdout();

    loop {
        tick.tick().await;
        let now = Instant::now();

        // 1. Drain all pending key events (non-blocking)
        while event::poll(Duration::ZERO)? {
            let Event::Key(KeyEvent {
                code,
                kind,
                modifiers,
                ..
            }) = event::read()?
            else {
                continue;
            };
            if kind == KeyEventKind::Release {
                continue;
            }

            match code {
                KeyCode::Char('w') => runtime.on_command_at(DriveCommand::new(TELEOP_FORWARD, 0.0), now),
                KeyCode::Char('s') => runtime.on_command_at(DriveCommand::new(-TELEOP_FORWARD, 0.0), now),
                KeyCode::Char('a') => runtime.on_command_at(DriveCommand::new(0.0, -TELEOP_TURN), now),
                KeyCode::Char('d') => runtime.on_command_at(DriveCommand::new(0.0, TELEOP_TURN), now),
                KeyCode::Char(' ') => runtime.emergency_stop()?,
                KeyCode::Char('t') => runtime.toggle()?,
                KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => return Ok(()),
                KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                _ => {}
            }
        }

        // 2. Ramp one tick (includes watchdog logic)
        let v = runtime.tick_at(now)?;

        // 3. Status line
        write!(
            stdout,
            "\rleft {:+.3}  right {:+.3}  [{:?}]    ",
            v.left,
            v.right,
            runtime.health()
        )?;
        stdout.flush()?;
    }
}
