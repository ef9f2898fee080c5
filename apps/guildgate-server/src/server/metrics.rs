use std::{collections::HashMap, fmt::Write as _};

use super::{
    core::{MetricsState, METRICS_STATE},
    services::ServiceError,
};

pub(crate) const GUARD_OUTCOME_AUTHORIZED: &str = "authorized";
pub(crate) const AUTH_FAILURE_MISSING_TOKEN: &str = "missing_token";
pub(crate) const AUTH_FAILURE_INVALID_TOKEN: &str = "invalid_token";
pub(crate) const AUTH_FAILURE_MISSING_IDENTITY: &str = "missing_identity";

pub(crate) fn metrics_state() -> &'static MetricsState {
    METRICS_STATE.get_or_init(MetricsState::default)
}

pub(crate) fn render_metrics() -> String {
    let guard_outcomes = metrics_state()
        .guard_outcomes
        .lock()
        .map_or_else(|_| HashMap::new(), |guard| guard.clone());
    let upstream_failures = metrics_state()
        .upstream_failures
        .lock()
        .map_or_else(|_| HashMap::new(), |guard| guard.clone());
    let auth_failures = metrics_state()
        .auth_failures
        .lock()
        .map_or_else(|_| HashMap::new(), |guard| guard.clone());

    let mut output = String::new();
    output.push_str(
        "# HELP guildgate_guard_outcomes_total Count of guild guard decisions by outcome\n",
    );
    output.push_str("# TYPE guildgate_guard_outcomes_total counter\n");
    let mut outcome_entries: Vec<_> = guard_outcomes.into_iter().collect();
    outcome_entries.sort_by_key(|(outcome, _)| *outcome);
    for (outcome, value) in outcome_entries {
        let _ = writeln!(
            output,
            "guildgate_guard_outcomes_total{{outcome=\"{outcome}\"}} {value}"
        );
    }

    output.push_str(
        "# HELP guildgate_upstream_failures_total Count of collaborator failures by kind\n",
    );
    output.push_str("# TYPE guildgate_upstream_failures_total counter\n");
    let mut failure_entries: Vec<_> = upstream_failures.into_iter().collect();
    failure_entries.sort_by_key(|(kind, _)| *kind);
    for (kind, value) in failure_entries {
        let _ = writeln!(
            output,
            "guildgate_upstream_failures_total{{kind=\"{kind}\"}} {value}"
        );
    }

    output.push_str(
        "# HELP guildgate_auth_failures_total Count of authentication failures by reason\n",
    );
    output.push_str("# TYPE guildgate_auth_failures_total counter\n");
    let mut auth_entries: Vec<_> = auth_failures.into_iter().collect();
    auth_entries.sort_by_key(|(reason, _)| *reason);
    for (reason, value) in auth_entries {
        let _ = writeln!(
            output,
            "guildgate_auth_failures_total{{reason=\"{reason}\"}} {value}"
        );
    }

    output
}

pub(crate) fn record_guard_outcome(outcome: &'static str) {
    if let Ok(mut counters) = metrics_state().guard_outcomes.lock() {
        let entry = counters.entry(outcome).or_insert(0);
        *entry += 1;
    }
}

pub(crate) fn record_upstream_failure(error: &ServiceError) {
    let kind = match error {
        ServiceError::Unavailable(_) => "unavailable",
    };
    if let Ok(mut counters) = metrics_state().upstream_failures.lock() {
        let entry = counters.entry(kind).or_insert(0);
        *entry += 1;
    }
}

pub(crate) fn record_auth_failure(reason: &'static str) {
    if let Ok(mut counters) = metrics_state().auth_failures.lock() {
        let entry = counters.entry(reason).or_insert(0);
        *entry += 1;
    }
}
