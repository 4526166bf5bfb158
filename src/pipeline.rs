// src/pipeline.rs
//! Pipeline capability traits and the ingest flow that drives them:
//! normalize -> fetch -> compose -> persist.
//!
//! The flow never fails a batch because one entity failed. Webhook
//! deliveries are at-least-once, so every event gets an [`EventOutcome`]
//! and the delivery is still acknowledged; only an unreadable payload is
//! reported as an error.

use crate::error::AppError;
use crate::model::{EntityDocument, EntityKind, EntitySummary};
use crate::snapshot::SnapshotComposer;
use crate::types::EntityId;
use crate::webhook::{CanonicalEvent, EventNormalizer, Notification, SubjectKind};
use futures::future::join_all;
use rayon::prelude::*;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;

/// Retrieves an entity and its blocks. `Ok(None)` means the source has no
/// data for it, which is not an error.
#[async_trait::async_trait]
pub trait EntitySource: Send + Sync {
    async fn fetch_entity(
        &self,
        id: &EntityId,
        kind: EntityKind,
    ) -> Result<Option<EntityDocument>, AppError>;
}

/// Persists snapshots, replacing any earlier snapshot of the same entity.
#[async_trait::async_trait]
pub trait SnapshotStore: Send + Sync {
    async fn upsert(&self, summary: &EntitySummary) -> Result<(), AppError>;
}

/// What happened to one event of a delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum EventOutcome {
    Stored { url: String },
    Skipped { reason: String },
    Failed { reason: String },
}

/// One event and its outcome.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventReport {
    pub event_kind: String,
    pub subject_id: EntityId,
    pub subject_kind: SubjectKind,
    pub outcome: EventOutcome,
}

impl EventReport {
    /// Acknowledgement text for this event.
    pub fn message(&self) -> String {
        match &self.outcome {
            EventOutcome::Stored { url } => {
                format!("Event {} received and stored ({})", self.event_kind, url)
            }
            EventOutcome::Skipped { reason } => {
                format!("Event {} received (skipped: {})", self.event_kind, reason)
            }
            EventOutcome::Failed { reason } => {
                format!("Event {} received (failed: {})", self.event_kind, reason)
            }
        }
    }
}

/// Result of ingesting one delivery.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IngestReport {
    pub verification_token: Option<String>,
    pub events: Vec<EventReport>,
    /// Snapshots that were stored, in event order.
    pub snapshots: Vec<EntitySummary>,
}

impl IngestReport {
    /// Acknowledgement text for the whole delivery.
    pub fn summary(&self) -> String {
        if let Some(token) = &self.verification_token {
            return format!("Verification token received: {}", token);
        }
        self.events
            .iter()
            .map(EventReport::message)
            .collect::<Vec<_>>()
            .join("; ")
    }

    pub fn stored_count(&self) -> usize {
        self.count(|o| matches!(o, EventOutcome::Stored { .. }))
    }

    pub fn failed_count(&self) -> usize {
        self.count(|o| matches!(o, EventOutcome::Failed { .. }))
    }

    fn count(&self, predicate: impl Fn(&EventOutcome) -> bool) -> usize {
        self.events.iter().filter(|e| predicate(&e.outcome)).count()
    }
}

/// Where each event of a batch ended up before fetching.
enum Plan {
    Subject(usize),
    Skip(String),
}

/// Drives one delivery through normalize, fetch, compose and store.
pub struct SnapshotPipeline {
    normalizer: EventNormalizer,
    composer: SnapshotComposer,
    source: Arc<dyn EntitySource>,
    store: Arc<dyn SnapshotStore>,
}

impl SnapshotPipeline {
    pub fn new(
        composer: SnapshotComposer,
        source: Arc<dyn EntitySource>,
        store: Arc<dyn SnapshotStore>,
    ) -> Self {
        Self {
            normalizer: EventNormalizer::default(),
            composer,
            source,
            store,
        }
    }

    pub fn with_normalizer(mut self, normalizer: EventNormalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    /// Ingests one delivery payload.
    pub async fn ingest(&self, payload: &Value) -> Result<IngestReport, AppError> {
        let events = match self.normalizer.normalize(payload)? {
            Notification::Verification(token) => {
                log::info!("Received verification token");
                return Ok(IngestReport {
                    verification_token: Some(token),
                    ..Default::default()
                });
            }
            Notification::Events(events) => events,
        };
        log::info!("Normalized {} event(s)", events.len());

        let (plans, subjects) = plan_subjects(&events);
        let mut outcomes = self.process_subjects(&subjects).await;

        let mut report = IngestReport::default();
        for (event, plan) in events.iter().zip(plans) {
            let outcome = match plan {
                Plan::Skip(reason) => EventOutcome::Skipped { reason },
                Plan::Subject(index) => {
                    let (outcome, stored) = &mut outcomes[index];
                    if let Some(summary) = stored.take() {
                        report.snapshots.push(summary);
                    }
                    outcome.clone()
                }
            };
            report.events.push(EventReport {
                event_kind: event.event_kind.clone(),
                subject_id: event.subject_id.clone(),
                subject_kind: event.subject_kind.clone(),
                outcome,
            });
        }

        log::info!(
            "Ingested {} event(s): {} stored, {} failed",
            report.events.len(),
            report.stored_count(),
            report.failed_count()
        );
        Ok(report)
    }

    /// Fetches every subject concurrently, composes the fetched ones in
    /// parallel, then stores them. Returns one outcome per subject.
    async fn process_subjects(
        &self,
        subjects: &[(EntityId, EntityKind)],
    ) -> Vec<(EventOutcome, Option<EntitySummary>)> {
        let fetched = join_all(
            subjects
                .iter()
                .map(|(id, kind)| self.source.fetch_entity(id, *kind)),
        )
        .await;

        let mut outcomes: Vec<Option<EventOutcome>> = Vec::with_capacity(subjects.len());
        let mut documents: Vec<(usize, EntityDocument)> = Vec::new();
        for (index, (result, (id, kind))) in fetched.into_iter().zip(subjects).enumerate() {
            match result {
                Ok(Some(document)) => {
                    documents.push((index, document));
                    outcomes.push(None);
                }
                Ok(None) => {
                    log::info!("No data available for {} {}", kind, id);
                    outcomes.push(Some(EventOutcome::Skipped {
                        reason: format!("no data available for {} {}", kind, id),
                    }));
                }
                Err(e) => {
                    log::error!("Unable to fetch {} {}: {}", kind, id, e);
                    outcomes.push(Some(EventOutcome::Failed {
                        reason: e.to_string(),
                    }));
                }
            }
        }

        let summaries: Vec<(usize, EntitySummary)> = documents
            .par_iter()
            .map(|(index, document)| (*index, self.composer.compose(document)))
            .collect();

        let stores = join_all(
            summaries
                .iter()
                .map(|(_, summary)| self.store.upsert(summary)),
        )
        .await;

        let mut results: Vec<(EventOutcome, Option<EntitySummary>)> = outcomes
            .into_iter()
            .map(|outcome| {
                (
                    outcome.unwrap_or(EventOutcome::Skipped {
                        reason: "not processed".to_string(),
                    }),
                    None,
                )
            })
            .collect();

        for ((index, summary), stored) in summaries.into_iter().zip(stores) {
            results[index] = match stored {
                Ok(()) => {
                    log::info!("Stored snapshot for {} {}", summary.kind, summary.id);
                    (
                        EventOutcome::Stored {
                            url: summary.url.clone(),
                        },
                        Some(summary),
                    )
                }
                Err(e) => {
                    log::error!(
                        "Failed to persist {} {}: {}",
                        summary.kind,
                        summary.id,
                        e
                    );
                    (
                        EventOutcome::Failed {
                            reason: e.to_string(),
                        },
                        None,
                    )
                }
            };
        }

        results
    }
}

/// Assigns each event to a unique snapshottable subject, or to a skip
/// reason. The first event for a subject wins; later ones are duplicates.
fn plan_subjects(events: &[CanonicalEvent]) -> (Vec<Plan>, Vec<(EntityId, EntityKind)>) {
    let mut seen: HashSet<(EntityId, EntityKind)> = HashSet::new();
    let mut subjects = Vec::new();

    let plans = events
        .iter()
        .map(|event| {
            let Some(kind) = event.subject_kind.entity_kind() else {
                log::info!(
                    "Skipping {} for unsupported subject kind '{}'",
                    event.event_kind,
                    event.subject_kind
                );
                return Plan::Skip(format!(
                    "unsupported subject kind '{}'",
                    event.subject_kind
                ));
            };

            let key = (event.subject_id.clone(), kind);
            if !seen.insert(key.clone()) {
                log::debug!("Duplicate event for {} {} in batch", kind, event.subject_id);
                return Plan::Skip(format!(
                    "duplicate of an earlier event for {} {}",
                    kind, event.subject_id
                ));
            }

            subjects.push(key);
            Plan::Subject(subjects.len() - 1)
        })
        .collect();

    (plans, subjects)
}
