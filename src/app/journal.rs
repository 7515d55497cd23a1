//! Mirrors status events into the log.

use super::events::{EventBus, StatusEvent, SubscriberId};

/// Subscribes a handler that writes every status event to `tracing`.
///
/// Countdown ticks are logged at trace level only.
pub fn attach(bus: &EventBus) -> SubscriberId {
    bus.subscribe(log_event)
}

fn log_event(event: &StatusEvent) {
    match event {
        StatusEvent::StatusChanged(status) => tracing::info!(target: "autoprint::status", %status),
        StatusEvent::JobCompleted { subject, outcome } => {
            tracing::info!(target: "autoprint::status", %subject, outcome = outcome.label(), "job completed")
        }
        StatusEvent::ErrorOccurred(message) => {
            tracing::error!(target: "autoprint::status", %message)
        }
        StatusEvent::CycleTiming { last, next } => tracing::debug!(
            target: "autoprint::status",
            last = %last.format("%H:%M:%S"),
            next = %next.format("%H:%M:%S"),
            "check finished"
        ),
        StatusEvent::CleanupTiming { last, next } => tracing::info!(
            target: "autoprint::status",
            last = %last.format("%Y-%m-%d %H:%M:%S"),
            next = %next.format("%Y-%m-%d %H:%M:%S"),
            "temp cleanup scheduled"
        ),
        StatusEvent::CountdownTick { remaining, total } => {
            tracing::trace!(target: "autoprint::status", remaining, total)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::JobOutcome;

    #[test]
    fn attach_registers_one_subscriber() {
        let bus = EventBus::new();
        let id = attach(&bus);
        assert_eq!(bus.subscriber_count(), 1);

        bus.publish(StatusEvent::JobCompleted {
            subject: "[PRINT] Order 1".to_string(),
            outcome: JobOutcome::AutoPrinted,
        });
        bus.publish(StatusEvent::ErrorOccurred("boom".to_string()));

        bus.unsubscribe(id);
        assert_eq!(bus.subscriber_count(), 0);
    }
}
