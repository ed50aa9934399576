use std::str::FromStr;

use render::FitOptions;
use thiserror::Error;

/// Which pointer event opens a point feature's popup.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub enum Trigger {
    #[default]
    Click,
    Hover,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown popup trigger `{0}`")]
pub struct UnknownTrigger(pub String);

impl FromStr for Trigger {
    type Err = UnknownTrigger;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "click" => Ok(Trigger::Click),
            "hover" | "mouseenter" => Ok(Trigger::Hover),
            _ => Err(UnknownTrigger(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Reserved prefix for every source and layer the engine installs.
    pub prefix: String,
    pub point_trigger: Trigger,
    pub fit: FitOptions,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            prefix: "custom".to_string(),
            point_trigger: Trigger::Click,
            fit: FitOptions::default(),
        }
    }
}
