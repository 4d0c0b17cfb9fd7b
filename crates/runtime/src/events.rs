//! Resolution events broadcast to subscribers.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use rules_core::{OperationId, Resolution};

/// Summary of a finished resolution pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionSummary {
    pub character: String,
    pub pending_selections: usize,
    pub issues: usize,
    pub needs_attention: bool,
}

impl ResolutionSummary {
    pub fn new(character: impl Into<String>, resolution: &Resolution) -> Self {
        let report = resolution.report();
        Self {
            character: character.into(),
            pending_selections: resolution.pending_selections().count(),
            issues: report.len(),
            needs_attention: report.needs_attention(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RuntimeEvent {
    Resolved(ResolutionSummary),
    SelectionRecorded {
        character: String,
        operation: OperationId,
        option: OperationId,
        summary: ResolutionSummary,
    },
    SelectionCleared {
        character: String,
        operation: OperationId,
        summary: ResolutionSummary,
    },
}

impl RuntimeEvent {
    pub fn character(&self) -> &str {
        match self {
            Self::Resolved(summary) => &summary.character,
            Self::SelectionRecorded { character, .. } | Self::SelectionCleared { character, .. } => {
                character
            }
        }
    }
}

/// Broadcast channel for [`RuntimeEvent`]s.
///
/// Publishing never blocks and never fails; events sent while nobody is
/// subscribed are dropped.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<RuntimeEvent>,
}

impl EventBus {
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _receiver) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn publish(&self, event: RuntimeEvent) {
        if self.sender.send(event).is_err() {
            tracing::trace!("runtime event dropped: no subscribers");
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RuntimeEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(character: &str) -> ResolutionSummary {
        ResolutionSummary {
            character: character.into(),
            pending_selections: 1,
            issues: 1,
            needs_attention: false,
        }
    }

    #[tokio::test]
    async fn subscribers_receive_published_events() {
        let bus = EventBus::with_capacity(4);
        let mut receiver = bus.subscribe();

        bus.publish(RuntimeEvent::Resolved(summary("a")));

        let event = receiver.recv().await.unwrap();
        assert_eq!(event.character(), "a");
    }

    #[test]
    fn publishing_without_subscribers_is_silent() {
        let bus = EventBus::with_capacity(0);
        assert_eq!(bus.subscriber_count(), 0);
        bus.publish(RuntimeEvent::Resolved(summary("a")));
    }

    #[test]
    fn events_serialize_with_tag() {
        let json = serde_json::to_value(RuntimeEvent::Resolved(summary("a"))).unwrap();
        assert_eq!(json["event"], "resolved");
        assert_eq!(json["character"], "a");
    }
}
