//! Reachability sweep over every registered instance.

use std::time::{Duration, Instant};

use futures_util::future::join_all;

use crate::health::probe::{ProbeOutcome, Prober};
use crate::observability::metrics;
use crate::registry::{ApplicationView, InstanceView};

/// Outcome of one sweep pass.
#[derive(Debug, Clone, Default)]
pub struct SweepReport {
    /// One entry per probed instance, in registry order.
    pub outcomes: Vec<ProbeOutcome>,
    pub duration: Duration,
}

impl SweepReport {
    pub fn probed(&self) -> usize {
        self.outcomes.len()
    }

    pub fn reachable(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_reachable()).count()
    }

    pub fn inaccessible(&self) -> impl Iterator<Item = &ProbeOutcome> {
        self.outcomes.iter().filter(|o| !o.is_reachable())
    }

    pub fn find(&self, app: &str, host: &str) -> Option<&ProbeOutcome> {
        self.outcomes
            .iter()
            .find(|o| o.app == app && o.host == host)
    }
}

/// Probe every instance of every application exactly once.
///
/// Outcomes are logged once every probe has finished; a failed probe never
/// stops the remaining ones.
pub async fn run_sweep(prober: &Prober, applications: &[ApplicationView]) -> SweepReport {
    let started = Instant::now();

    let total: usize = applications.iter().map(ApplicationView::instance_count).sum();
    let mut targets: Vec<(&str, &InstanceView)> = Vec::with_capacity(total);
    for app in applications {
        for instance in &app.instances {
            targets.push((app.name.as_str(), instance));
        }
    }

    let outcomes = if prober.is_concurrent() {
        join_all(
            targets
                .into_iter()
                .map(|(app, instance)| prober.probe(app, instance)),
        )
        .await
    } else {
        let mut outcomes = Vec::with_capacity(targets.len());
        for (app, instance) in targets {
            outcomes.push(prober.probe(app, instance).await);
        }
        outcomes
    };

    for outcome in &outcomes {
        outcome.log();
        metrics::record_probe(&outcome.app, &outcome.host, outcome.is_reachable());
    }

    let duration = started.elapsed();
    metrics::record_sweep_duration(duration);

    SweepReport { outcomes, duration }
}
