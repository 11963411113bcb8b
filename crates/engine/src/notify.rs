// Outbound notifications. Delivery is a collaborator concern; the engine
// only decides who to notify and never lets delivery failures reach the
// edit path.

use tracing::{info, warn};

use crate::error::Result;

pub trait Notifier {
    fn notify(&self, recipients: &[String], subject: &str, body: &str) -> Result<()>;
}

/// Default notifier: logs instead of delivering.
#[derive(Debug, Default)]
pub struct LoggingNotifier;

impl Notifier for LoggingNotifier {
    fn notify(&self, recipients: &[String], subject: &str, _body: &str) -> Result<()> {
        info!(recipients = recipients.len(), subject, "notification");
        Ok(())
    }
}

/// Fire and forget: a failing notifier is logged, never propagated.
pub fn notify_best_effort(
    notifier: &dyn Notifier,
    recipients: &[String],
    subject: &str,
    body: &str,
) {
    if recipients.is_empty() {
        return;
    }
    if let Err(error) = notifier.notify(recipients, subject, body) {
        warn!(%error, subject, "notification delivery failed");
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::{notify_best_effort, Notifier};
    use crate::error::{EngineError, Result};

    struct FailingNotifier;

    impl Notifier for FailingNotifier {
        fn notify(&self, _recipients: &[String], _subject: &str, _body: &str) -> Result<()> {
            Err(EngineError::PageNotFound("simulated failure".to_string()))
        }
    }

    #[derive(Default)]
    struct RecordingNotifier {
        sent: Mutex<Vec<(Vec<String>, String)>>,
    }

    impl Notifier for RecordingNotifier {
        fn notify(&self, recipients: &[String], subject: &str, _body: &str) -> Result<()> {
            self.sent
                .lock()
                .expect("lock should not be poisoned")
                .push((recipients.to_vec(), subject.to_string()));
            Ok(())
        }
    }

    #[test]
    fn failures_do_not_propagate() {
        notify_best_effort(&FailingNotifier, &["a@example.com".to_string()], "subject", "body");
    }

    #[test]
    fn empty_recipient_lists_send_nothing() {
        let notifier = RecordingNotifier::default();
        notify_best_effort(&notifier, &[], "subject", "body");
        assert!(notifier.sent.lock().expect("lock should not be poisoned").is_empty());
    }
}
