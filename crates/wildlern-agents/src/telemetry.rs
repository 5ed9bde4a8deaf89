//! Logging shim: `tracing` with the `telemetry` feature, stderr otherwise.

use wildlern_core::Why;

#[cfg(feature = "telemetry")]
pub(crate) fn warn(msg: &str) {
    tracing::warn!("{msg}");
}

#[cfg(not(feature = "telemetry"))]
pub(crate) fn warn(msg: &str) {
    eprintln!("warning: {msg}");
}

#[cfg(feature = "telemetry")]
pub(crate) fn decision(agent: &'static str, state: usize, action: usize, why: Why, epsilon: f32) {
    tracing::debug!(agent, state, action, ?why, epsilon, "decision");
}

#[cfg(not(feature = "telemetry"))]
pub(crate) fn decision(
    _agent: &'static str,
    _state: usize,
    _action: usize,
    _why: Why,
    _epsilon: f32,
) {
}

#[cfg(feature = "telemetry")]
pub(crate) fn update(agent: &'static str, state: usize, action: usize, reward: f32, value: f32) {
    tracing::debug!(agent, state, action, reward, value, "q update");
}

#[cfg(not(feature = "telemetry"))]
pub(crate) fn update(
    _agent: &'static str,
    _state: usize,
    _action: usize,
    _reward: f32,
    _value: f32,
) {
}
