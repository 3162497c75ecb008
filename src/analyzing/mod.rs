//! Phase sequencer for the "analyzing" screen
//!
//! Nothing is analyzed here. On start the sequencer schedules, on its own
//! [`Timeline`]:
//!
//! - an overall counter going 0 → 100 over the total duration `T`,
//! - a cosmetic phase label advancing every `T / M` (wrapping),
//! - for step `i` of `N`: pending → processing at `i·T/N`, processing →
//!   complete at `(i+1)·T/N`,
//! - one interval per live metric, adding a bounded random amount up to
//!   its ceiling,
//! - the redirect to the fixed report at `T + grace`.
//!
//! Timers never touch state directly: each firing is dispatched to one of
//! the transition functions below, which enforce the step invariants (at most
//! one step processing, completed steps always a prefix).

pub mod config;

pub use config::{MetricSpec, NavigationPolicy, SequencerConfig, StepSpec};

use crate::error::Result;
use crate::flow::Route;
use crate::report::REPORT_ID;
use crate::timeline::{Timeline, TimerId};
use log::{debug, info, warn};
use rand::Rng;
use serde::Serialize;
use std::fmt;
use std::time::Duration;

/// Shown when the upload screen forwarded nothing.
pub const FALLBACK_FILE: &str = "document.pdf";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Pending,
    Processing,
    Complete,
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepStatus::Pending => write!(f, "pending"),
            StepStatus::Processing => write!(f, "processing"),
            StepStatus::Complete => write!(f, "complete"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisStep {
    pub id: String,
    pub label: String,
    pub sublabel: String,
    pub status: StepStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct Metric {
    pub label: String,
    pub value: u64,
    pub ceiling: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SequencerSnapshot {
    pub headline: String,
    pub files: Vec<String>,
    pub elapsed_ms: u64,
    pub progress: u32,
    pub phase: String,
    pub steps: Vec<AnalysisStep>,
    pub metrics: Vec<Metric>,
    pub finished: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SequencerEvent {
    Progress,
    Phase,
    StepStart(usize),
    StepComplete(usize),
    Metric(usize),
    Redirect,
}

pub struct PhaseSequencer<R> {
    config: SequencerConfig,
    files: Vec<String>,
    progress: u32,
    phase: usize,
    steps: Vec<AnalysisStep>,
    metrics: Vec<Metric>,
    timeline: Timeline<SequencerEvent>,
    progress_timer: Option<TimerId>,
    metric_timers: Vec<Option<TimerId>>,
    destination: Option<Route>,
    rng: R,
}

impl<R: Rng> PhaseSequencer<R> {
    /// Build the step list and register every timer. All steps start
    /// pending; the first one turns processing on the first `advance`.
    pub fn start(files: Vec<String>, config: SequencerConfig, rng: R) -> Result<Self> {
        config.validate()?;

        let files = if files.is_empty() {
            vec![FALLBACK_FILE.to_string()]
        } else {
            files
        };

        let steps = config
            .steps
            .iter()
            .map(|s| AnalysisStep {
                id: s.id.clone(),
                label: s.label.clone(),
                sublabel: s.sublabel.clone(),
                status: StepStatus::Pending,
            })
            .collect();

        let metrics = config
            .metrics
            .iter()
            .map(|m| Metric {
                label: m.label.clone(),
                value: 0,
                ceiling: m.ceiling,
            })
            .collect();

        let mut timeline = Timeline::new();

        let progress_timer =
            Some(timeline.set_interval(config.progress_period(), SequencerEvent::Progress));

        if config.phases.len() > 1 {
            timeline.set_interval(config.phase_period(), SequencerEvent::Phase);
        }

        let step = config.step_duration();
        for i in 0..config.steps.len() {
            timeline.set_timeout(step * i as u32, SequencerEvent::StepStart(i));
            timeline.set_timeout(step * (i as u32 + 1), SequencerEvent::StepComplete(i));
        }

        let metric_timers = config
            .metrics
            .iter()
            .enumerate()
            .map(|(i, m)| {
                Some(timeline.set_interval(
                    Duration::from_millis(m.tick_ms),
                    SequencerEvent::Metric(i),
                ))
            })
            .collect();

        timeline.set_timeout(config.redirect_at(), SequencerEvent::Redirect);

        info!(
            "Analyzing {} file(s) over {}ms ({} steps)",
            files.len(),
            config.total_ms,
            config.steps.len()
        );

        Ok(Self {
            config,
            files,
            progress: 0,
            phase: 0,
            steps,
            metrics,
            timeline,
            progress_timer,
            metric_timers,
            destination: None,
            rng,
        })
    }

    /// Let `dt` of simulated time pass. Returns the destination once the
    /// redirect fires; after that every timer is gone and further calls do
    /// nothing.
    pub fn advance(&mut self, dt: Duration) -> Option<Route> {
        if self.destination.is_some() {
            return None;
        }

        let target = self.timeline.now() + dt;
        while let Some(fired) = self.timeline.pop_due(target) {
            match fired.event {
                SequencerEvent::Progress => self.tick_progress(),
                SequencerEvent::Phase => self.next_phase(),
                SequencerEvent::StepStart(i) => {
                    self.begin_step(i);
                }
                SequencerEvent::StepComplete(i) => {
                    self.complete_step(i);
                }
                SequencerEvent::Metric(i) => self.tick_metric(i),
                SequencerEvent::Redirect => {
                    if let Some(route) = self.try_redirect() {
                        return Some(route);
                    }
                }
            }
        }
        self.timeline.settle(target);
        None
    }

    fn tick_progress(&mut self) {
        self.progress = (self.progress + self.config.progress_step).min(100);
        if self.progress >= 100 {
            if let Some(id) = self.progress_timer.take() {
                self.timeline.cancel(id);
            }
        }
    }

    fn next_phase(&mut self) {
        self.phase = (self.phase + 1) % self.config.phases.len();
        debug!("Phase: {}", self.config.phases[self.phase]);
    }

    /// pending → processing. Refused unless every earlier step is complete
    /// and no other step is processing.
    pub(crate) fn begin_step(&mut self, index: usize) -> bool {
        let Some(step) = self.steps.get(index) else {
            return false;
        };
        if step.status != StepStatus::Pending
            || self.steps[..index].iter().any(|s| s.status != StepStatus::Complete)
            || self.steps.iter().any(|s| s.status == StepStatus::Processing)
        {
            warn!("Refusing to start step {} out of order", index);
            return false;
        }
        self.steps[index].status = StepStatus::Processing;
        debug!("Step {} processing", self.steps[index].id);
        true
    }

    /// processing → complete. Steps never move backwards.
    pub(crate) fn complete_step(&mut self, index: usize) -> bool {
        match self.steps.get_mut(index) {
            Some(step) if step.status == StepStatus::Processing => {
                step.status = StepStatus::Complete;
                debug!("Step {} complete", step.id);
                true
            }
            _ => false,
        }
    }

    fn tick_metric(&mut self, index: usize) {
        let max_increment = self.config.metrics[index].max_increment;
        let increment = self.rng.gen_range(0..=max_increment);
        let metric = &mut self.metrics[index];
        metric.value = metric.value.saturating_add(increment).min(metric.ceiling);
        if metric.value >= metric.ceiling {
            if let Some(id) = self.metric_timers[index].take() {
                self.timeline.cancel(id);
            }
        }
    }

    fn try_redirect(&mut self) -> Option<Route> {
        if self.config.policy == NavigationPolicy::AwaitSteps && !self.all_steps_complete() {
            debug!("Redirect held: steps still running");
            self.timeline
                .set_timeout(self.config.progress_period(), SequencerEvent::Redirect);
            return None;
        }

        let route = Route::Analysis {
            id: REPORT_ID.to_string(),
        };
        if !self.all_steps_complete() {
            warn!("Redirecting before every step reported complete");
        }
        info!("Analysis finished, redirecting to {}", route);
        self.timeline.cancel_all();
        self.progress_timer = None;
        self.metric_timers.iter_mut().for_each(|t| *t = None);
        self.destination = Some(route.clone());
        Some(route)
    }

    pub fn all_steps_complete(&self) -> bool {
        self.steps.iter().all(|s| s.status == StepStatus::Complete)
    }

    pub fn steps(&self) -> &[AnalysisStep] {
        &self.steps
    }

    pub fn metrics(&self) -> &[Metric] {
        &self.metrics
    }

    pub fn progress(&self) -> u32 {
        self.progress
    }

    pub fn phase(&self) -> &str {
        &self.config.phases[self.phase]
    }

    pub fn files(&self) -> &[String] {
        &self.files
    }

    pub fn elapsed(&self) -> Duration {
        self.timeline.now()
    }

    pub fn is_finished(&self) -> bool {
        self.destination.is_some()
    }

    pub fn destination(&self) -> Option<&Route> {
        self.destination.as_ref()
    }

    pub fn config(&self) -> &SequencerConfig {
        &self.config
    }

    /// Live timers; zero after the redirect or `shutdown`.
    pub fn active_timers(&self) -> usize {
        self.timeline.pending()
    }

    pub fn headline(&self) -> String {
        if self.files.len() > 1 {
            format!("Processing {} files...", self.files.len())
        } else {
            format!("Processing {}...", self.files[0])
        }
    }

    pub fn snapshot(&self) -> SequencerSnapshot {
        SequencerSnapshot {
            headline: self.headline(),
            files: self.files.clone(),
            elapsed_ms: self.elapsed().as_millis() as u64,
            progress: self.progress,
            phase: self.phase().to_string(),
            steps: self.steps.clone(),
            metrics: self.metrics.clone(),
            finished: self.is_finished(),
            destination: self.destination.as_ref().map(|r| r.to_string()),
        }
    }

    /// Cancel every pending timer, e.g. when the user leaves the screen.
    /// The redirect can no longer happen.
    pub fn shutdown(&mut self) {
        if !self.timeline.is_idle() {
            debug!("Sequencer torn down with {} timers pending", self.timeline.pending());
        }
        self.timeline.cancel_all();
        self.progress_timer = None;
        self.metric_timers.iter_mut().for_each(|t| *t = None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn sequencer(config: SequencerConfig) -> PhaseSequencer<StdRng> {
        PhaseSequencer::start(vec!["paper.pdf".into()], config, StdRng::seed_from_u64(11)).unwrap()
    }

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    fn statuses<R: Rng>(s: &PhaseSequencer<R>) -> Vec<StepStatus> {
        s.steps().iter().map(|s| s.status).collect()
    }

    fn assert_invariants<R: Rng>(s: &PhaseSequencer<R>) {
        let processing = s
            .steps()
            .iter()
            .filter(|s| s.status == StepStatus::Processing)
            .count();
        assert!(processing <= 1, "more than one step processing");

        let complete = s
            .steps()
            .iter()
            .take_while(|s| s.status == StepStatus::Complete)
            .count();
        assert!(
            s.steps()[complete..]
                .iter()
                .all(|s| s.status != StepStatus::Complete),
            "completed steps are not a prefix"
        );
    }

    // ==========================================================================
    // STEP SCHEDULE
    // ==========================================================================
    //
    // Three steps over 3000ms: each owns 1000ms. Step i goes processing at
    // i*1000 and complete at (i+1)*1000.
    // ==========================================================================

    fn three_second_config() -> SequencerConfig {
        SequencerConfig {
            total_ms: 3000,
            ..SequencerConfig::default()
        }
    }

    #[test]
    fn test_all_pending_on_start() {
        let s = sequencer(three_second_config());
        assert!(s.steps().iter().all(|s| s.status == StepStatus::Pending));
        assert_eq!(s.progress(), 0);
        assert_eq!(s.phase(), "Initializing");
    }

    #[test]
    fn test_steps_follow_schedule() {
        use StepStatus::*;
        let mut s = sequencer(three_second_config());

        s.advance(ms(0));
        assert_eq!(statuses(&s), vec![Processing, Pending, Pending]);

        s.advance(ms(999));
        assert_eq!(statuses(&s), vec![Processing, Pending, Pending]);

        s.advance(ms(1));
        assert_eq!(statuses(&s), vec![Complete, Processing, Pending]);

        s.advance(ms(1000));
        assert_eq!(statuses(&s), vec![Complete, Complete, Processing]);

        s.advance(ms(1000));
        assert_eq!(statuses(&s), vec![Complete, Complete, Complete]);
    }

    #[test]
    fn test_invariants_hold_at_every_sample() {
        let mut s = sequencer(SequencerConfig {
            total_ms: 4000,
            steps: (0..7)
                .map(|i| StepSpec::new(&format!("s{}", i), "step", ""))
                .collect(),
            ..SequencerConfig::default()
        });
        for _ in 0..500 {
            s.advance(ms(9));
            assert_invariants(&s);
        }
    }

    #[test]
    fn test_out_of_order_transitions_refused() {
        let mut s = sequencer(three_second_config());
        assert!(!s.begin_step(1));
        assert!(!s.complete_step(0));
        assert!(s.begin_step(0));
        assert!(!s.begin_step(1), "step 0 still processing");
        assert!(s.complete_step(0));
        assert!(!s.complete_step(0), "complete is terminal");
        assert!(!s.begin_step(0), "no revisiting");
        assert!(!s.begin_step(99));
    }

    // ==========================================================================
    // PROGRESS, PHASES, METRICS
    // ==========================================================================

    #[test]
    fn test_progress_is_time_based() {
        let mut s = sequencer(SequencerConfig::default());
        s.advance(ms(2500));
        assert_eq!(s.progress(), 50);
        s.advance(ms(2500));
        assert_eq!(s.progress(), 100);
        s.advance(ms(400));
        assert_eq!(s.progress(), 100);
    }

    #[test]
    fn test_phase_cycles_and_wraps() {
        let mut s = sequencer(SequencerConfig {
            total_ms: 1000,
            phases: vec!["a".into(), "b".into()],
            ..SequencerConfig::default()
        });
        assert_eq!(s.phase(), "a");
        s.advance(ms(500));
        assert_eq!(s.phase(), "b");
        s.advance(ms(500));
        assert_eq!(s.phase(), "a");
    }

    #[test]
    fn test_metrics_never_decrease_or_exceed_ceiling() {
        let mut s = sequencer(SequencerConfig {
            total_ms: 60_000,
            ..SequencerConfig::default()
        });
        let mut last: Vec<u64> = s.metrics().iter().map(|m| m.value).collect();
        for _ in 0..200 {
            s.advance(ms(250));
            for (m, prev) in s.metrics().iter().zip(last.iter()) {
                assert!(m.value >= *prev);
                assert!(m.value <= m.ceiling);
            }
            last = s.metrics().iter().map(|m| m.value).collect();
        }
        // 200 ticks of up to one image each: the image counter saturates
        assert_eq!(s.metrics()[2].value, 12);
    }

    #[test]
    fn test_shortest_valid_duration_still_reaches_100() {
        let mut s = sequencer(SequencerConfig {
            total_ms: 100,
            ..SequencerConfig::default()
        });
        s.advance(ms(100));
        assert_eq!(s.progress(), 100);

        let too_short = SequencerConfig {
            total_ms: 50,
            ..SequencerConfig::default()
        };
        assert!(PhaseSequencer::start(vec![], too_short, StdRng::seed_from_u64(1)).is_err());
    }

    #[test]
    fn test_huge_metric_saturates_at_ceiling() {
        use rand::rngs::mock::StepRng;

        let config = SequencerConfig {
            metrics: vec![MetricSpec::new("Huge", u64::MAX, u64::MAX, 250)],
            ..SequencerConfig::default()
        };
        // Every draw is u64::MAX - 1, so the second tick would wrap
        let rng = StepRng::new(u64::MAX - 1, 0);
        let mut s = PhaseSequencer::start(vec![], config, rng).unwrap();
        s.advance(ms(250));
        assert_eq!(s.metrics()[0].value, u64::MAX - 1);
        s.advance(ms(250));
        assert_eq!(s.metrics()[0].value, u64::MAX);
    }

    // ==========================================================================
    // REDIRECT AND TEARDOWN
    // ==========================================================================

    #[test]
    fn test_redirects_after_grace() {
        let mut s = sequencer(SequencerConfig::default());
        assert_eq!(s.advance(ms(5499)), None);
        let route = s.advance(ms(1)).expect("redirect");
        assert_eq!(route.to_string(), "/analysis/1");
        assert!(s.is_finished());
        assert_eq!(s.active_timers(), 0);
        assert_eq!(s.advance(ms(10_000)), None);
    }

    #[test]
    fn test_time_boxed_redirect_ignores_step_state() {
        // Steps gated by a refused transition still redirect on time
        let mut s = sequencer(three_second_config());
        s.advance(ms(0));
        s.steps[0].status = StepStatus::Pending;
        let route = s.advance(ms(3500));
        assert!(route.is_some());
        assert!(!s.all_steps_complete());
    }

    #[test]
    fn test_await_steps_holds_redirect() {
        let mut s = sequencer(SequencerConfig {
            total_ms: 3000,
            policy: NavigationPolicy::AwaitSteps,
            ..SequencerConfig::default()
        });
        s.advance(ms(0));
        // Knock step 0 back so the schedule can never complete it
        s.steps[0].status = StepStatus::Pending;
        assert_eq!(s.advance(ms(10_000)), None);
        assert!(!s.is_finished());

        for step in s.steps.iter_mut() {
            step.status = StepStatus::Complete;
        }
        assert!(s.advance(ms(100)).is_some());
    }

    #[test]
    fn test_shutdown_cancels_everything() {
        let mut s = sequencer(SequencerConfig::default());
        s.advance(ms(1200));
        let progress = s.progress();
        s.shutdown();
        assert_eq!(s.active_timers(), 0);
        assert_eq!(s.advance(ms(60_000)), None);
        assert_eq!(s.progress(), progress);
        assert!(!s.is_finished());
    }

    #[test]
    fn test_headline() {
        let one = sequencer(SequencerConfig::default());
        assert_eq!(one.headline(), "Processing paper.pdf...");

        let many = PhaseSequencer::start(
            vec!["a.pdf".into(), "b.docx".into()],
            SequencerConfig::default(),
            StdRng::seed_from_u64(0),
        )
        .unwrap();
        assert_eq!(many.headline(), "Processing 2 files...");

        let none =
            PhaseSequencer::start(vec![], SequencerConfig::default(), StdRng::seed_from_u64(0)).unwrap();
        assert_eq!(none.headline(), "Processing document.pdf...");
    }

    #[test]
    fn test_invalid_config_rejected() {
        let r = PhaseSequencer::start(
            vec![],
            SequencerConfig {
                phases: vec![],
                ..SequencerConfig::default()
            },
            StdRng::seed_from_u64(0),
        );
        assert!(r.is_err());
    }
}
