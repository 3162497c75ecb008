//! Sequencer configuration: duration, steps, phases and live metrics

use crate::error::{FlowError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepSpec {
    pub id: String,
    pub label: String,
    pub sublabel: String,
}

impl StepSpec {
    pub fn new(id: &str, label: &str, sublabel: &str) -> Self {
        Self {
            id: id.to_string(),
            label: label.to_string(),
            sublabel: sublabel.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricSpec {
    pub label: String,
    pub ceiling: u64,
    /// Each tick adds a random amount in `0..=max_increment`.
    pub max_increment: u64,
    pub tick_ms: u64,
}

impl MetricSpec {
    pub fn new(label: &str, ceiling: u64, max_increment: u64, tick_ms: u64) -> Self {
        Self {
            label: label.to_string(),
            ceiling,
            max_increment,
            tick_ms,
        }
    }
}

/// What happens when the redirect deadline comes up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NavigationPolicy {
    /// Navigate at `total + grace` whatever the steps show.
    #[default]
    TimeBoxed,
    /// Hold navigation until every step is complete, re-checking every
    /// progress tick.
    AwaitSteps,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SequencerConfig {
    pub total_ms: u64,
    pub grace_ms: u64,
    /// Percent added to the overall counter per tick.
    pub progress_step: u32,
    pub steps: Vec<StepSpec>,
    pub phases: Vec<String>,
    pub metrics: Vec<MetricSpec>,
    pub policy: NavigationPolicy,
}

impl Default for SequencerConfig {
    fn default() -> Self {
        Self {
            total_ms: 5000,
            grace_ms: 500,
            progress_step: 1,
            steps: vec![
                StepSpec::new("extract", "Extracting content", "Reading pages, text runs and embedded media"),
                StepSpec::new("text", "Analyzing text patterns", "Scoring each paragraph against language models"),
                StepSpec::new("images", "Scanning images", "Checking images for generator fingerprints"),
            ],
            phases: [
                "Initializing",
                "Reading document structure",
                "Running language models",
                "Inspecting image metadata",
                "Compiling report",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            metrics: vec![
                MetricSpec::new("Paragraphs scanned", 240, 12, 250),
                MetricSpec::new("Tokens evaluated", 48_000, 2_400, 250),
                MetricSpec::new("Images inspected", 12, 1, 250),
            ],
            policy: NavigationPolicy::TimeBoxed,
        }
    }
}

impl SequencerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.total_ms == 0 {
            return Err(FlowError::InvalidConfig("total duration must be positive".into()));
        }
        if self.steps.is_empty() {
            return Err(FlowError::InvalidConfig("at least one step is required".into()));
        }
        if self.phases.is_empty() {
            return Err(FlowError::InvalidConfig("at least one phase is required".into()));
        }
        if self.progress_step == 0 || self.progress_step > 100 {
            return Err(FlowError::InvalidConfig(format!(
                "progress step must be within 1..=100, got {}",
                self.progress_step
            )));
        }
        // Every interval must be at least a millisecond long
        if self.total_ms < u64::from(self.progress_ticks()) {
            return Err(FlowError::InvalidConfig(format!(
                "total duration {}ms is shorter than its {} progress ticks",
                self.total_ms,
                self.progress_ticks()
            )));
        }
        if self.total_ms < self.phases.len() as u64 {
            return Err(FlowError::InvalidConfig(format!(
                "total duration {}ms is shorter than its {} phases",
                self.total_ms,
                self.phases.len()
            )));
        }
        if let Some(m) = self.metrics.iter().find(|m| m.tick_ms == 0) {
            return Err(FlowError::InvalidConfig(format!(
                "metric '{}' needs a positive tick",
                m.label
            )));
        }
        Ok(())
    }

    pub fn total(&self) -> Duration {
        Duration::from_millis(self.total_ms)
    }

    pub fn redirect_at(&self) -> Duration {
        Duration::from_millis(self.total_ms.saturating_add(self.grace_ms))
    }

    /// Time each step owns: `T / N`.
    pub fn step_duration(&self) -> Duration {
        self.total() / self.steps.len().max(1) as u32
    }

    /// Phase label period: `T / M`.
    pub fn phase_period(&self) -> Duration {
        self.total() / self.phases.len().max(1) as u32
    }

    /// Ticks needed for the counter to reach 100.
    pub fn progress_ticks(&self) -> u32 {
        let step = self.progress_step.max(1);
        (100 + step - 1) / step
    }

    pub fn progress_period(&self) -> Duration {
        self.total() / self.progress_ticks()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_schedule() {
        let c = SequencerConfig::default();
        assert!(c.validate().is_ok());
        assert_eq!(c.step_duration(), Duration::from_millis(5000) / 3);
        assert_eq!(c.phase_period(), Duration::from_millis(1000));
        assert_eq!(c.progress_ticks(), 100);
        assert_eq!(c.progress_period(), Duration::from_millis(50));
        assert_eq!(c.redirect_at(), Duration::from_millis(5500));
    }

    #[test]
    fn test_uneven_progress_step_rounds_up() {
        let c = SequencerConfig {
            progress_step: 3,
            ..SequencerConfig::default()
        };
        assert_eq!(c.progress_ticks(), 34);
    }

    #[test]
    fn test_rejects_empty_steps() {
        let c = SequencerConfig {
            steps: vec![],
            ..SequencerConfig::default()
        };
        assert!(matches!(c.validate(), Err(FlowError::InvalidConfig(_))));
    }

    #[test]
    fn test_rejects_duration_shorter_than_progress_ticks() {
        let c = SequencerConfig {
            total_ms: 50,
            ..SequencerConfig::default()
        };
        assert!(matches!(c.validate(), Err(FlowError::InvalidConfig(_))));

        let c = SequencerConfig {
            total_ms: 100,
            ..SequencerConfig::default()
        };
        assert!(c.validate().is_ok());
        assert_eq!(c.progress_period(), Duration::from_millis(1));
    }

    #[test]
    fn test_rejects_duration_shorter_than_phases() {
        let c = SequencerConfig {
            total_ms: 4,
            progress_step: 50,
            ..SequencerConfig::default()
        };
        assert!(matches!(c.validate(), Err(FlowError::InvalidConfig(_))));
    }

    #[test]
    fn test_redirect_at_saturates() {
        let c = SequencerConfig {
            total_ms: u64::MAX,
            ..SequencerConfig::default()
        };
        assert_eq!(c.redirect_at(), Duration::from_millis(u64::MAX));
    }

    #[test]
    fn test_rejects_zero_duration() {
        let c = SequencerConfig {
            total_ms: 0,
            ..SequencerConfig::default()
        };
        assert!(c.validate().is_err());
    }

    #[test]
    fn test_policy_from_toml() {
        let c: SequencerConfig = toml::from_str("policy = \"await_steps\"\ntotal_ms = 900").unwrap();
        assert_eq!(c.policy, NavigationPolicy::AwaitSteps);
        assert_eq!(c.total_ms, 900);
        assert_eq!(c.steps.len(), 3);
    }
}
