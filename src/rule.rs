use core::fmt;

use embassy_time::{Duration, Instant};
use heapless::Vec;

use crate::coordinate::{Coordinate, CoordinateKind};

/// Maximum number of stages in a rule
pub const MAX_STAGES: usize = 4;

/// Minimum number of stages in a rule
pub const MIN_STAGES: usize = 2;

/// One step of a dimming rule
///
/// The engine spends `duration` moving from this stage's target towards the
/// next stage's target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stage {
    pub duration: Duration,
    pub target: Coordinate,
}

impl Stage {
    pub const fn new(duration: Duration, target: Coordinate) -> Self {
        Self { duration, target }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleError {
    TooFewStages,
    TooManyStages,
    /// Stages mix color and raw coordinates
    MixedCoordinates,
}

impl RuleError {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::TooFewStages => "TOO_FEW_STAGES",
            Self::TooManyStages => "TOO_MANY_STAGES",
            Self::MixedCoordinates => "MIXED_COORDINATES",
        }
    }
}

impl fmt::Display for RuleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A closed loop of 2-4 stages
///
/// The successor of the last stage is stage 0. A rule without `auto_repeat`
/// retires when it wraps back to stage 0.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DimmingRule {
    stages: Vec<Stage, MAX_STAGES>,
    stage_idx: usize,
    stage_start: Instant,
    auto_repeat: bool,
    started: bool,
}

impl DimmingRule {
    pub fn new(stages: &[Stage], auto_repeat: bool) -> Result<Self, RuleError> {
        if stages.len() < MIN_STAGES {
            return Err(RuleError::TooFewStages);
        }
        let stages: Vec<Stage, MAX_STAGES> = Vec::from_slice(stages).map_err(|_| RuleError::TooManyStages)?;
        let kind = stages[0].target.kind();
        if stages.iter().any(|stage| stage.target.kind() != kind) {
            return Err(RuleError::MixedCoordinates);
        }

        Ok(Self {
            stages,
            stage_idx: 0,
            stage_start: Instant::from_ticks(0),
            auto_repeat,
            started: false,
        })
    }

    /// One-shot fade from `from` to `to` over `duration`.
    ///
    /// The second stage has zero length, so the rule settles on `to` and
    /// retires.
    pub fn fade(from: Coordinate, to: Coordinate, duration: Duration) -> Result<Self, RuleError> {
        Self::new(
            &[
                Stage::new(duration, from),
                Stage::new(Duration::from_ticks(0), to),
            ],
            false,
        )
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn kind(&self) -> CoordinateKind {
        self.stages[0].target.kind()
    }

    /// Target of the last stage, where a one-shot rule comes to rest
    pub fn final_target(&self) -> Coordinate {
        self.stages[self.stages.len() - 1].target
    }

    pub const fn stage_index(&self) -> usize {
        self.stage_idx
    }

    pub const fn stage_start(&self) -> Instant {
        self.stage_start
    }

    pub const fn auto_repeat(&self) -> bool {
        self.auto_repeat
    }

    pub fn set_auto_repeat(&mut self, auto_repeat: bool) {
        self.auto_repeat = auto_repeat;
    }

    pub const fn is_started(&self) -> bool {
        self.started
    }

    /// Begin at stage 0
    pub fn start(&mut self, now: Instant) {
        self.stage_idx = 0;
        self.stage_start = now;
        self.started = true;
    }

    pub fn current_stage(&self) -> &Stage {
        &self.stages[self.stage_idx]
    }

    pub fn next_stage(&self) -> &Stage {
        &self.stages[(self.stage_idx + 1) % self.stages.len()]
    }

    /// Move to the next stage. Returns `true` when the loop wrapped to stage 0.
    pub fn advance(&mut self, now: Instant) -> bool {
        self.stage_idx = (self.stage_idx + 1) % self.stages.len();
        self.stage_start = now;
        self.stage_idx == 0
    }
}
