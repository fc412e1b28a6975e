//! Batch runs over many documents.
//!
//! Each document is parsed and normalized on its own; a failing document
//! never stops the rest of the batch, and outcomes come back in input order.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::bill::{BillParser, ProviderParser};
use crate::error::NormalizationError;
use crate::models::bill::{BillId, MissingField, ParsedBill};
use crate::normalize::{BillNormalizer, BillStore};
use crate::source::Document;

/// Result of processing one document.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BatchOutcome {
    /// Bill stored.
    Success {
        source_document_id: String,
        bill_id: BillId,
    },
    /// Parsed, but required fields were missing so nothing was stored.
    PartialFailure {
        parsed: Box<ParsedBill>,
        reasons: Vec<MissingField>,
    },
    /// The document could not be processed.
    Fatal {
        source_document_id: String,
        reason: String,
    },
    /// Not attempted because the run's time budget ran out.
    Skipped { source_document_id: String },
}

impl BatchOutcome {
    pub fn source_document_id(&self) -> &str {
        match self {
            BatchOutcome::Success { source_document_id, .. }
            | BatchOutcome::Fatal { source_document_id, .. }
            | BatchOutcome::Skipped { source_document_id } => source_document_id,
            BatchOutcome::PartialFailure { parsed, .. } => &parsed.source_document_id,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            BatchOutcome::Success { .. } => "success",
            BatchOutcome::PartialFailure { .. } => "partial_failure",
            BatchOutcome::Fatal { .. } => "fatal",
            BatchOutcome::Skipped { .. } => "skipped",
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, BatchOutcome::Success { .. })
    }
}

/// Outcome counts of a batch run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub success: usize,
    pub partial_failure: usize,
    pub fatal: usize,
    pub skipped: usize,
}

impl BatchSummary {
    pub fn from_outcomes(outcomes: &[BatchOutcome]) -> Self {
        let mut summary = Self::default();
        for outcome in outcomes {
            match outcome {
                BatchOutcome::Success { .. } => summary.success += 1,
                BatchOutcome::PartialFailure { .. } => summary.partial_failure += 1,
                BatchOutcome::Fatal { .. } => summary.fatal += 1,
                BatchOutcome::Skipped { .. } => summary.skipped += 1,
            }
        }
        summary
    }

    pub fn total(&self) -> usize {
        self.success + self.partial_failure + self.fatal + self.skipped
    }
}

impl std::fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} success, {} partial, {} fatal, {} skipped",
            self.success, self.partial_failure, self.fatal, self.skipped
        )
    }
}

/// Drives a provider parser and a normalizer over many documents.
pub struct BatchRunner<'a, S> {
    parser: ProviderParser,
    normalizer: &'a BillNormalizer<S>,
    jobs: usize,
    time_budget: Option<Duration>,
    conflict_retries: usize,
}

impl<'a, S: BillStore> BatchRunner<'a, S> {
    pub fn new(parser: ProviderParser, normalizer: &'a BillNormalizer<S>) -> Self {
        Self {
            parser,
            normalizer,
            jobs: 1,
            time_budget: None,
            conflict_retries: 1,
        }
    }

    /// Number of worker threads (1 = sequential).
    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs.max(1);
        self
    }

    /// Wall-clock budget for the whole run.
    pub fn with_time_budget(mut self, budget: Option<Duration>) -> Self {
        self.time_budget = budget;
        self
    }

    /// How many times a conflicting write is retried.
    pub fn with_conflict_retries(mut self, retries: usize) -> Self {
        self.conflict_retries = retries;
        self
    }

    /// Process `documents`, returning one outcome per document in input order.
    pub fn run(&self, documents: &[Document]) -> Vec<BatchOutcome> {
        let start = Instant::now();
        let deadline = self.time_budget.map(|budget| start + budget);
        let jobs = self.jobs.min(documents.len()).max(1);

        info!(
            "Running batch of {} {} documents with {} worker(s)",
            documents.len(),
            self.parser.meter_type(),
            jobs
        );

        let outcomes = if jobs == 1 {
            documents
                .iter()
                .map(|doc| self.process(doc, deadline))
                .collect()
        } else {
            self.run_parallel(documents, deadline, jobs)
        };

        let summary = BatchSummary::from_outcomes(&outcomes);
        info!("Batch finished in {:?}: {}", start.elapsed(), summary);
        outcomes
    }

    fn run_parallel(
        &self,
        documents: &[Document],
        deadline: Option<Instant>,
        jobs: usize,
    ) -> Vec<BatchOutcome> {
        let cursor = AtomicUsize::new(0);
        let slots: Vec<Mutex<Option<BatchOutcome>>> =
            documents.iter().map(|_| Mutex::new(None)).collect();

        thread::scope(|scope| {
            for _ in 0..jobs {
                scope.spawn(|| {
                    loop {
                        let i = cursor.fetch_add(1, Ordering::SeqCst);
                        let Some(doc) = documents.get(i) else {
                            break;
                        };
                        let outcome = self.process(doc, deadline);
                        *slots[i].lock().unwrap_or_else(PoisonError::into_inner) = Some(outcome);
                    }
                });
            }
        });

        slots
            .into_iter()
            .zip(documents)
            .map(|(slot, doc)| {
                slot.into_inner()
                    .unwrap_or_else(PoisonError::into_inner)
                    .unwrap_or_else(|| BatchOutcome::Skipped {
                        source_document_id: doc.id.clone(),
                    })
            })
            .collect()
    }

    /// Process a single document.
    pub fn process(&self, doc: &Document, deadline: Option<Instant>) -> BatchOutcome {
        if deadline.is_some_and(|d| Instant::now() >= d) {
            debug!("{}: skipped, time budget exhausted", doc.id);
            return BatchOutcome::Skipped {
                source_document_id: doc.id.clone(),
            };
        }

        let parsed = match self.parser.parse(&doc.text, &doc.id) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!("{}: {}", doc.id, e);
                return BatchOutcome::Fatal {
                    source_document_id: doc.id.clone(),
                    reason: e.to_string(),
                };
            }
        };

        let mut attempts = 0;
        loop {
            match self.normalizer.apply(&parsed, self.parser.meter_type()) {
                Ok(bill_id) => {
                    return BatchOutcome::Success {
                        source_document_id: doc.id.clone(),
                        bill_id,
                    };
                }
                Err(
                    NormalizationError::MissingAccountNumber
                    | NormalizationError::MissingBillingPeriod
                    | NormalizationError::MissingTotal,
                ) => {
                    let reasons = parsed.missing_fields();
                    warn!("{}: partial extraction, missing {:?}", doc.id, reasons);
                    return BatchOutcome::PartialFailure {
                        parsed: Box::new(parsed),
                        reasons,
                    };
                }
                Err(e @ NormalizationError::Conflict { .. }) if attempts < self.conflict_retries => {
                    attempts += 1;
                    debug!("{}: {}, retrying ({})", doc.id, e, attempts);
                }
                Err(e) => {
                    warn!("{}: {}", doc.id, e);
                    return BatchOutcome::Fatal {
                        source_document_id: doc.id.clone(),
                        reason: e.to_string(),
                    };
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::MemoryStore;
    use pretty_assertions::assert_eq;

    fn water_doc(id: &str, account: &str, date: &str, total: &str) -> Document {
        Document::new(
            id,
            format!(
                "Nro de cuenta {account}\nFECHA EMISIÓN:{date}\n\
                 DETALLE DE SU CUENTA\nCargo fijo $ 1.050\nConsumo agua potable $ 2.000\n\
                 TOTAL A PAGAR $ {total}\n"
            ),
        )
    }

    fn documents() -> Vec<Document> {
        vec![
            water_doc("01.pdf", "123456-7", "11-ENE-2025", "3.050"),
            water_doc("02.pdf", "123456-7", "11-FEB-2025", "3.050"),
            Document::new("03.pdf", ""),
            Document::new("04.pdf", "Nro de cuenta 123456-7\nFECHA EMISIÓN:11-MAR-2025\n"),
            water_doc("05.pdf", "765432-1", "11-FEB-2025", "3.050"),
        ]
    }

    #[test]
    fn test_batch_isolation_and_order() {
        let normalizer = BillNormalizer::new(MemoryStore::new());
        let runner = BatchRunner::new(ProviderParser::water(), &normalizer);

        let docs = documents();
        let outcomes = runner.run(&docs);

        assert_eq!(outcomes.len(), docs.len());
        let ids: Vec<&str> = outcomes.iter().map(|o| o.source_document_id()).collect();
        assert_eq!(ids, vec!["01.pdf", "02.pdf", "03.pdf", "04.pdf", "05.pdf"]);

        let kinds: Vec<&str> = outcomes.iter().map(|o| o.kind()).collect();
        assert_eq!(
            kinds,
            vec!["success", "success", "fatal", "partial_failure", "success"]
        );

        match &outcomes[3] {
            BatchOutcome::PartialFailure { reasons, parsed } => {
                assert_eq!(reasons, &vec![MissingField::Total]);
                assert_eq!(parsed.total_amount, None);
            }
            other => panic!("unexpected outcome {other:?}"),
        }

        let summary = BatchSummary::from_outcomes(&outcomes);
        assert_eq!(
            summary,
            BatchSummary {
                success: 3,
                partial_failure: 1,
                fatal: 1,
                skipped: 0
            }
        );
        assert_eq!(normalizer.store().meters().len(), 2);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let docs = documents();

        let sequential = BillNormalizer::new(MemoryStore::new());
        let expected: Vec<&'static str> = BatchRunner::new(ProviderParser::water(), &sequential)
            .run(&docs)
            .iter()
            .map(|o| o.kind())
            .collect();

        let parallel = BillNormalizer::new(MemoryStore::new());
        let outcomes = BatchRunner::new(ProviderParser::water(), &parallel)
            .with_jobs(3)
            .run(&docs);
        let kinds: Vec<&str> = outcomes.iter().map(|o| o.kind()).collect();

        assert_eq!(kinds, expected);
        assert_eq!(outcomes[4].source_document_id(), "05.pdf");
        assert_eq!(parallel.store().charge_count(), sequential.store().charge_count());
    }

    #[test]
    fn test_rerun_is_idempotent() {
        let normalizer = BillNormalizer::new(MemoryStore::new());
        let runner = BatchRunner::new(ProviderParser::water(), &normalizer);
        let docs = documents();

        let first = runner.run(&docs);
        let charges = normalizer.store().charge_count();
        let second = runner.run(&docs);

        assert_eq!(first, second);
        assert_eq!(normalizer.store().charge_count(), charges);
    }

    #[test]
    fn test_exhausted_budget_skips() {
        let normalizer = BillNormalizer::new(MemoryStore::new());
        let outcomes = BatchRunner::new(ProviderParser::water(), &normalizer)
            .with_time_budget(Some(Duration::ZERO))
            .run(&documents());

        assert!(
            outcomes
                .iter()
                .all(|o| matches!(o, BatchOutcome::Skipped { .. }))
        );
        assert_eq!(BatchSummary::from_outcomes(&outcomes).skipped, 5);
    }

    #[test]
    fn test_empty_batch() {
        let normalizer = BillNormalizer::new(MemoryStore::new());
        let outcomes = BatchRunner::new(ProviderParser::electricity(), &normalizer)
            .with_jobs(4)
            .run(&[]);
        assert!(outcomes.is_empty());
    }

    #[test]
    fn test_outcome_serializes_with_status_tag() {
        let outcome = BatchOutcome::Fatal {
            source_document_id: "x.pdf".to_string(),
            reason: "unreadable document 'x.pdf'".to_string(),
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "fatal");
        assert_eq!(json["source_document_id"], "x.pdf");
    }
}
