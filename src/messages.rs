// Message types for the runtime

use serde::{Deserialize, Serialize};

// Command from teleop/scripts -> runtime, normalized to [-1, 1]
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DriveCommand {
    #[serde(default)]
    pub forward: f64,
    #[serde(default)]
    pub turn: f64,
}

impl DriveCommand {
    pub fn new(forward: f64, turn: f64) -> Self {
        Self { forward, turn }
    }
}

/// One step of a scripted profile: hold `command` for `ticks` loop iterations
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScriptStep {
    #[serde(flatten)]
    pub command: DriveCommand,
    pub ticks: u32,
    /// Skip the ramp and jump straight to the command
    #[serde(default)]
    pub immediate: bool,
}

/// Snapshot of the drive after one tick
#[derive(Debug, Clone, Serialize)]
pub struct DriveSample {
    pub tick: u64,
    pub health: RuntimeHealth,
    pub left: f64,
    pub right: f64,
    /// Physical output of every motor on the side, leader first
    pub left_applied: Vec<f64>,
    pub right_applied: Vec<f64>,
}

/// Health status reported by the runtime
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum RuntimeHealth {
    Ok,
    CmdStale,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_script() {
        let json = r#"[
            { "forward": 0.5, "ticks": 20 },
            { "turn": -0.25, "ticks": 5, "immediate": true }
        ]"#;
        let steps: Vec<ScriptStep> = serde_json::from_str(json).unwrap();

        assert_eq!(steps.len(), 2);
        assert_eq!(steps[0].command, DriveCommand::new(0.5, 0.0));
        assert!(!steps[0].immediate);
        assert_eq!(steps[1].command, DriveCommand::new(0.0, -0.25));
        assert!(steps[1].immediate);
    }

    #[test]
    fn test_health_serializes_snake_case() {
        let json = serde_json::to_string(&RuntimeHealth::CmdStale).unwrap();
        assert_eq!(json, "\"cmd_stale\"");
    }
}
