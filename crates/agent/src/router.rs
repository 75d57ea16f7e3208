use chrono::{DateTime, Utc};
use classifier::{snapshot, tokenize, ClassifierError, Model};
use tracing::{debug, error, info, warn};

use crate::{
    command::{Command, TrainingTarget},
    error::AgentError,
    event::Event,
    options::{AgentOptions, ResolvedOptions},
    store::SnapshotStore,
};

/// The model an agent works on for the duration of one batch. Loaded from
/// the store at entry and written back after every mutation.
#[derive(Debug, Clone)]
pub struct AgentContext {
    agent_id: String,
    model: Model,
}

impl AgentContext {
    pub fn new(agent_id: impl Into<String>, model: Model) -> Self {
        Self {
            agent_id: agent_id.into(),
            model,
        }
    }

    pub fn agent_id(&self) -> &str {
        &self.agent_id
    }

    pub fn model(&self) -> &Model {
        &self.model
    }
}

#[derive(Debug, Clone, Default)]
pub struct AgentStatus {
    pub events_received: u64,
    pub last_event_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

impl AgentStatus {
    /// Working once at least one event arrived and the latest one succeeded.
    pub fn working(&self) -> bool {
        self.events_received > 0 && self.last_error.is_none()
    }
}

#[derive(Debug, Default)]
pub struct EventOutcome {
    pub emitted: Option<Event>,
    pub rejected: Vec<ClassifierError>,
    pub persisted: bool,
}

#[derive(Debug)]
pub struct EventFailure {
    pub index: usize,
    pub error: AgentError,
}

#[derive(Debug, Default)]
pub struct BatchReport {
    pub emitted: Vec<Event>,
    pub rejected: Vec<(usize, ClassifierError)>,
    pub failures: Vec<EventFailure>,
}

impl BatchReport {
    pub fn is_clean(&self) -> bool {
        self.rejected.is_empty() && self.failures.is_empty()
    }
}

pub struct Agent<S> {
    agent_id: String,
    options: ResolvedOptions,
    store: S,
    status: AgentStatus,
}

impl<S: SnapshotStore> Agent<S> {
    pub fn new(agent_id: impl Into<String>, options: &AgentOptions, store: S) -> Result<Self, AgentError> {
        Ok(Self {
            agent_id: agent_id.into(),
            options: options.resolve()?,
            store,
            status: AgentStatus::default(),
        })
    }

    pub fn agent_id(&self) -> &str {
        &self.agent_id
    }

    pub fn options(&self) -> &ResolvedOptions {
        &self.options
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn status(&self) -> &AgentStatus {
        &self.status
    }

    pub fn working(&self) -> bool {
        self.status.working()
    }

    /// True when an update period is configured and no event arrived within it.
    pub fn is_stale(&self, now: DateTime<Utc>) -> bool {
        let Some(period) = self.options.expected_update_period else {
            return false;
        };
        self.status
            .last_event_at
            .map_or(true, |last| now - last > period)
    }

    pub async fn load_context(&self) -> Result<AgentContext, AgentError> {
        let stored = self
            .store
            .load_snapshot(&self.agent_id)
            .await
            .map_err(AgentError::Persistence)?;
        let model = snapshot::load(stored.as_deref().unwrap_or_default())?;
        Ok(AgentContext::new(self.agent_id.clone(), model))
    }

    pub async fn persist(&self, ctx: &AgentContext) -> Result<(), AgentError> {
        let text = snapshot::dump(&ctx.model)?;
        self.store
            .save_snapshot(&ctx.agent_id, &text)
            .await
            .map_err(AgentError::Persistence)
    }

    /// Processes a batch in order. A failing event is recorded and the rest of
    /// the batch still runs against the in-memory model.
    pub async fn receive(&mut self, events: Vec<Event>) -> Result<BatchReport, AgentError> {
        let mut ctx = match self.load_context().await {
            Ok(ctx) => ctx,
            Err(err) => {
                error!(agent = %self.agent_id, events = events.len(), error = %err, "failed to load model");
                self.record(events.len() as u64, Some(err.to_string()));
                return Err(err);
            }
        };
        let mut report = BatchReport::default();

        for (index, event) in events.into_iter().enumerate() {
            match self.handle(&mut ctx, event).await {
                Ok(outcome) => {
                    report
                        .rejected
                        .extend(outcome.rejected.into_iter().map(|err| (index, err)));
                    report.emitted.extend(outcome.emitted);
                }
                Err(err) => {
                    error!(agent = %self.agent_id, index, error = %err, "event processing failed");
                    report.failures.push(EventFailure { index, error: err });
                }
            }
        }

        Ok(report)
    }

    pub async fn handle(
        &mut self,
        ctx: &mut AgentContext,
        event: Event,
    ) -> Result<EventOutcome, AgentError> {
        let result = self.route(ctx, event).await;
        self.record(1, result.as_ref().err().map(ToString::to_string));
        result
    }

    fn record(&mut self, events: u64, error: Option<String>) {
        self.status.events_received = self.status.events_received.saturating_add(events);
        self.status.last_event_at = Some(Utc::now());
        self.status.last_error = error;
    }

    async fn route(&self, ctx: &mut AgentContext, event: Event) -> Result<EventOutcome, AgentError> {
        let command = Command::decode(&event.categories());
        debug!(agent = %ctx.agent_id, command = command.name(), "routing event");

        match command {
            Command::LoadSnapshot => {
                ctx.model = snapshot::load(&event.content())?;
                info!(agent = %ctx.agent_id, stats = ?ctx.model.stats(), "loaded model snapshot");
                self.persist(ctx).await?;
                Ok(EventOutcome {
                    persisted: true,
                    ..EventOutcome::default()
                })
            }
            Command::DeleteCategories => {
                for category in tokenize(&event.content()) {
                    let existed = ctx.model.delete_category(category);
                    info!(agent = %ctx.agent_id, category, existed, "deleted category");
                }
                self.persist(ctx).await?;
                Ok(EventOutcome {
                    persisted: true,
                    ..EventOutcome::default()
                })
            }
            Command::PurgeTokens => {
                let threshold = parse_threshold(&event.content())?;
                let purged = ctx.model.purge_less_than(threshold);
                info!(agent = %ctx.agent_id, threshold, purged, "purged tokens");
                self.persist(ctx).await?;
                Ok(EventOutcome {
                    persisted: true,
                    ..EventOutcome::default()
                })
            }
            Command::Train(targets) => {
                let rejected = train(&mut ctx.model, &event.content(), &targets);
                self.persist(ctx).await?;
                let emitted = self.options.propagate_training_events.then_some(event);
                Ok(EventOutcome {
                    emitted,
                    rejected,
                    persisted: true,
                })
            }
            Command::Classify => Ok(EventOutcome {
                emitted: Some(self.classify(&ctx.model, event)),
                ..EventOutcome::default()
            }),
        }
    }

    fn classify(&self, model: &Model, mut event: Event) -> Event {
        let result = {
            let content = event.content();
            model.classify(&tokenize(&content))
        };

        if self.options.wants_max_class() {
            if let Some(category) = result.max_class() {
                event.append_category(category);
            }
        } else {
            for category in result.above(self.options.min_value) {
                event.append_category(category);
            }
        }
        debug!(categories = %event.categories(), "classified event");
        event
    }
}

fn train(model: &mut Model, content: &str, targets: &[TrainingTarget]) -> Vec<ClassifierError> {
    let tokens = tokenize(content);
    let mut rejected = Vec::new();
    for target in targets {
        let applied = match target {
            TrainingTarget::Train(category) => model.train(&tokens, category),
            TrainingTarget::Untrain(category) => model.untrain(&tokens, category),
        };
        if let Err(err) = applied {
            warn!(category = target.category(), error = %err, "skipping category");
            rejected.push(err);
        }
    }
    rejected
}

pub fn parse_threshold(raw: &str) -> Result<u64, ClassifierError> {
    let raw = raw.trim();
    raw.parse::<u64>()
        .map_err(|_| ClassifierError::InvalidThreshold(raw.to_string()))
}

#[cfg(test)]
#[path = "tests/router_tests.rs"]
mod tests;
