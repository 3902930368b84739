//! Routes one validated hook event to the ledger and the dispatcher.
//!
//! Task state lives in the ledger, not here; every invocation starts fresh.

use ccn_core::hook::{Notification, PromptSubmit, Stop};
use ccn_core::{Category, HookPayload, TaskRecord, classify, title_for_cwd};
use ccn_db::{Database, DbError};

use crate::notify::{Delivery, Dispatcher};

/// What handling an event did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// A prompt opened a new task.
    TaskStarted(TaskRecord),
    /// The assistant is waiting; recorded on the session's latest task, if any.
    WaitRecorded { matched: bool },
    /// An attention-needed message was delivered.
    Notified { category: Category, delivery: Delivery },
    /// A task closed and the user was told.
    TaskCompleted {
        task: TaskRecord,
        duration: String,
        delivery: Delivery,
    },
    /// A stop arrived with no open task for the session.
    NothingOpen,
}

pub struct EventRouter<'a> {
    ledger: &'a mut Database,
    dispatcher: &'a Dispatcher,
    fallback_title: &'a str,
}

impl<'a> EventRouter<'a> {
    pub fn new(ledger: &'a mut Database, dispatcher: &'a Dispatcher, fallback_title: &'a str) -> Self {
        Self {
            ledger,
            dispatcher,
            fallback_title,
        }
    }

    pub fn handle(&mut self, payload: &HookPayload) -> Result<Outcome, DbError> {
        tracing::debug!(session_id = payload.session_id(), "handling hook event");
        match payload {
            HookPayload::UserPromptSubmit(event) => self.prompt_submitted(event),
            HookPayload::Notification(event) => self.assistant_notified(event),
            HookPayload::Stop(event) => self.stopped(event),
        }
    }

    fn prompt_submitted(&mut self, event: &PromptSubmit) -> Result<Outcome, DbError> {
        // The user is back at this session; earlier alerts are stale.
        self.dispatcher.dismiss();

        let task = self
            .ledger
            .create_task(&event.session_id, &event.prompt, &event.cwd)?;
        tracing::info!(session_id = %task.session_id, seq = task.seq, "recorded prompt");
        Ok(Outcome::TaskStarted(task))
    }

    fn assistant_notified(&mut self, event: &Notification) -> Result<Outcome, DbError> {
        tracing::info!(session_id = %event.session_id, message = %event.message, "assistant notification");

        let category = classify(&event.message);
        tracing::debug!(%category, "classified notification");
        let Some(subtitle) = category.subtitle() else {
            // Waiting for input only updates the ledger; the stop hook will alert.
            let matched = self.ledger.mark_waiting_for_user(&event.session_id)?;
            tracing::info!(session_id = %event.session_id, matched, "recorded wait for user");
            return Ok(Outcome::WaitRecorded { matched });
        };

        let title = title_for_cwd(event.cwd.as_deref(), self.fallback_title);
        let delivery = self
            .dispatcher
            .notify(title, subtitle, event.cwd.as_deref());
        Ok(Outcome::Notified { category, delivery })
    }

    fn stopped(&mut self, event: &Stop) -> Result<Outcome, DbError> {
        let Some(task) = self.ledger.close_most_recent_open_task(&event.session_id)? else {
            tracing::debug!(session_id = %event.session_id, "stop without an open task");
            return Ok(Outcome::NothingOpen);
        };

        let duration = self.ledger.duration_of(task.id)?;
        let title = title_for_cwd(Some(task.cwd.as_str()), self.fallback_title);
        let subtitle = format!("job#{} done, duration: {duration}", task.seq);
        let delivery = self.dispatcher.notify(title, &subtitle, Some(task.cwd.as_str()));
        tracing::info!(
            session_id = %task.session_id,
            seq = task.seq,
            status = ?task.status(),
            duration = %duration,
            "task completed"
        );
        Ok(Outcome::TaskCompleted {
            task,
            duration,
            delivery,
        })
    }
}
