//! Phase metrics emitted as tracing events.
//!
//! Nothing is aggregated here; a subscriber in the binary decides whether
//! the events go anywhere.

pub fn emit_phase(phase: &str, key_values: &[(&str, String)]) {
    let span = tracing::debug_span!("tabjoin", phase);
    let _enter = span.enter();
    for (k, v) in key_values {
        tracing::debug!(%phase, %k, %v, "metric");
    }
}
