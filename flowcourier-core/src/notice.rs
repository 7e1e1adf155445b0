//! User-facing notices.
//!
//! Managers and the delivery orchestrator never render UI themselves; they
//! emit a [`Notice`] through the [`NoticeSink`] the embedding host supplies.
//! Every terminal delivery failure produces exactly one notice, and
//! automatic state changes (a corrupted credential being cleared) get their
//! own distinct variant so the user understands state changed without their
//! action.

/// A human-readable notification for the embedding host to render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// No credential is configured; the host should open the acquisition UI.
    CredentialRequired,

    /// The target application rejected the configured credential.
    CredentialRejected,

    /// The credential lacks permission for the attempted operation.
    AccessDenied,

    /// A corrupted credential slot was detected and cleared automatically.
    CorruptedCredentialCleared,

    /// Delivery failed on every strategy.
    DeliveryFailed { reason: String },
}

impl Notice {
    /// The message shown to the user.
    pub fn user_message(&self) -> String {
        match self {
            Self::CredentialRequired => {
                "An API key for the workflow app is needed to continue. \
                 Add one in the connection settings."
                    .to_string()
            }
            Self::CredentialRejected => {
                "The workflow app rejected the saved API key. \
                 It may have expired; save a new one."
                    .to_string()
            }
            Self::AccessDenied => {
                "The saved API key does not have permission to create workflows.".to_string()
            }
            Self::CorruptedCredentialCleared => {
                "The saved API key was unreadable and has been cleared automatically. \
                 Save it again to reconnect."
                    .to_string()
            }
            Self::DeliveryFailed { reason } => {
                format!("The workflow could not be delivered: {reason}")
            }
        }
    }
}

/// Sink for user notices, implemented by the embedding host.
pub trait NoticeSink: Send + Sync {
    /// Surface a notice to the user.
    fn notify(&self, notice: Notice);
}

/// Default sink that routes notices into the tracing log.
///
/// Useful for tests and headless embeddings.
pub struct TracingNoticeSink;

impl NoticeSink for TracingNoticeSink {
    fn notify(&self, notice: Notice) {
        tracing::info!(message = %notice.user_message(), "user notice");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_are_nonempty() {
        let notices = [
            Notice::CredentialRequired,
            Notice::CredentialRejected,
            Notice::AccessDenied,
            Notice::CorruptedCredentialCleared,
            Notice::DeliveryFailed {
                reason: "clipboard unavailable".to_string(),
            },
        ];

        for notice in notices {
            assert!(!notice.user_message().is_empty());
        }
    }

    #[test]
    fn test_cleared_notice_mentions_automatic_action() {
        let message = Notice::CorruptedCredentialCleared.user_message();
        assert!(message.contains("cleared automatically"));
    }
}
