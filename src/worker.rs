//! Scheduled summary worker.
//!
//! Periodically runs the summary skill over recent household context
//! and hands the result to a [`MessageSender`]. The worker is the
//! pipeline's only recurring caller; everything else is request-driven.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, info};

use crate::builtin::SMS_SUMMARY_SKILL;
use crate::config::SummaryConfig;
use crate::service::{LlmService, TaskRequest};

/// An outbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessagePayload {
    pub recipient: String,
    pub body: String,
}

/// The one contract the communications layer exposes to the core.
#[async_trait]
pub trait MessageSender: Send + Sync {
    async fn send(&self, payload: &MessagePayload) -> Result<()>;
}

/// Sender that only logs. Stand-in for a real SMS gateway in local
/// development.
pub struct LogSender;

#[async_trait]
impl MessageSender for LogSender {
    async fn send(&self, payload: &MessagePayload) -> Result<()> {
        info!("Outbound message to {}: {}", payload.recipient, payload.body);
        Ok(())
    }
}

/// Periodic summary loop.
pub struct SummaryWorker {
    service: Arc<LlmService>,
    sender: Arc<dyn MessageSender>,
    config: SummaryConfig,
}

impl SummaryWorker {
    pub fn new(
        service: Arc<LlmService>,
        sender: Arc<dyn MessageSender>,
        config: SummaryConfig,
    ) -> Self {
        Self {
            service,
            sender,
            config,
        }
    }

    /// Runs one summary cycle: task, then delivery.
    ///
    /// A blank summary is skipped without an error; everything else is
    /// sent verbatim.
    pub async fn run_once(&self) -> Result<()> {
        let mut request = TaskRequest::with_user_message(SMS_SUMMARY_SKILL, "");
        request
            .input
            .insert("recipient".to_string(), self.config.recipient.clone());
        request.context_query = Some(self.config.context_query.clone());
        request.context_scope = Some(self.config.scope.clone());

        let outcome = self.service.run_task(&request).await?;
        let body = outcome.response.text().trim();
        if body.is_empty() {
            info!("Summary cycle produced no text; nothing sent");
            return Ok(());
        }

        self.sender
            .send(&MessagePayload {
                recipient: self.config.recipient.clone(),
                body: body.to_string(),
            })
            .await
    }

    /// Runs summary cycles forever. The first cycle starts immediately;
    /// later ones follow `interval_mins`. A failed cycle is logged and
    /// never stops the loop.
    pub async fn run(&self) {
        let period = Duration::from_secs(self.config.interval_mins.max(1) * 60);
        info!(
            "Summary worker started (every {} min, scope '{}', recipient '{}')",
            self.config.interval_mins, self.config.scope, self.config.recipient
        );

        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            if let Err(e) = self.run_once().await {
                error!("Summary cycle failed: {e:#}");
            }
        }
    }
}
