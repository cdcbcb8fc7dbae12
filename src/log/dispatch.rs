use tracing::{debug, warn};

use crate::log::{
    log_event::LogEvent,
    log_sink::{RegistryRequest, SinkContext},
};
use crate::registry::SinkRegistry;

/// Outcome of delivering one event.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Sinks that wrote the event.
    pub delivered: usize,
    /// Sinks skipped by their level threshold.
    pub filtered: usize,
    /// Sinks that returned an error.
    pub failed: usize,
}

/// Delivers `event` to every live sink in registration order.
///
/// Must be called with the logger's lock held. A failing sink is reported and
/// skipped; registry changes requested by sinks are applied after the last
/// sink has run.
pub(crate) fn dispatch(registry: &mut SinkRegistry, event: &LogEvent<'_>) -> DispatchReport {
    let mut report = DispatchReport::default();
    let mut requests = Vec::new();

    registry.for_each_live_mut(|entry| {
        if !entry.accepts(event.level()) {
            report.filtered += 1;
            return;
        }

        let id = entry.id();
        let (name, sink) = entry.parts_mut();
        let mut ctx = SinkContext::new(id, name, &mut requests);
        match sink.write_event(event, &mut ctx) {
            Ok(()) => report.delivered += 1,
            Err(err) => {
                report.failed += 1;
                warn!(sink = name, %id, %err, "sink failed to write log event");
            }
        }
    });

    apply_requests(registry, requests);
    report
}

fn apply_requests(registry: &mut SinkRegistry, requests: Vec<RegistryRequest>) {
    for request in requests {
        match request {
            RegistryRequest::Remove(id) => match registry.remove(id) {
                Ok(entry) => debug!(sink = entry.name(), %id, "sink removed during dispatch"),
                Err(err) => debug!(%id, %err, "deferred sink removal skipped"),
            },
            RegistryRequest::Register {
                name,
                min_level,
                sink,
            } => match registry.register(&name, min_level, sink) {
                Ok(id) => debug!(sink = name.as_str(), %id, "sink registered during dispatch"),
                Err(err) => warn!(sink = name.as_str(), %err, "deferred sink registration failed"),
            },
        }
    }
}
