//! Bounded in-memory store for generated reports.
//!
//! Reports are kept in insertion order and the oldest is evicted once the
//! configured cap is exceeded. The full document is retained alongside the
//! encoded payload so stored reports can be re-exported in other formats
//! without regenerating them.

use std::collections::{HashMap, VecDeque};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use uuid::Uuid;

use crate::error::ReportError;
use crate::render::{encode, RenderedReport};
use crate::types::{ExportFormat, GeneratedReport, ReportDocument, ReportExport, ReportFormat};

struct StoredReport {
    report: GeneratedReport,
    document: ReportDocument,
    payload: Vec<u8>,
}

#[derive(Default)]
struct StoreInner {
    reports: HashMap<Uuid, StoredReport>,
    insertion_order: VecDeque<Uuid>,
}

pub struct ReportStore {
    max_stored: usize,
    inner: RwLock<StoreInner>,
}

impl ReportStore {
    /// A zero cap would reject every insert, so it is raised to one.
    #[must_use]
    pub fn new(max_stored: usize) -> Self {
        Self {
            max_stored: max_stored.max(1),
            inner: RwLock::new(StoreInner::default()),
        }
    }

    fn read_inner(&self) -> RwLockReadGuard<'_, StoreInner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_inner(&self) -> RwLockWriteGuard<'_, StoreInner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Stores a rendered report, evicting the oldest entries past the cap.
    pub fn insert(&self, rendered: RenderedReport) -> Result<GeneratedReport, ReportError> {
        let mut inner = self.write_inner();
        let id = rendered.report.id;
        if inner.reports.contains_key(&id) {
            return Err(ReportError::DuplicateReport(id));
        }

        let envelope = rendered.report.clone();
        inner.reports.insert(
            id,
            StoredReport {
                report: rendered.report,
                document: rendered.document,
                payload: rendered.payload,
            },
        );
        inner.insertion_order.push_back(id);

        while inner.reports.len() > self.max_stored {
            let Some(oldest) = inner.insertion_order.pop_front() else {
                break;
            };
            inner.reports.remove(&oldest);
            tracing::debug!(report_id = %oldest, "evicted oldest stored report");
        }

        Ok(envelope)
    }

    #[must_use]
    pub fn get(&self, id: Uuid) -> Option<GeneratedReport> {
        self.read_inner().reports.get(&id).map(|s| s.report.clone())
    }

    /// Stored report envelopes, newest first.
    #[must_use]
    pub fn list(&self) -> Vec<GeneratedReport> {
        let inner = self.read_inner();
        let mut reports: Vec<GeneratedReport> =
            inner.reports.values().map(|s| s.report.clone()).collect();
        reports.sort_by(|a, b| {
            b.generated_at
                .cmp(&a.generated_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        reports
    }

    /// Returns the envelope and the encoded payload for serving a download.
    pub fn download(&self, id: Uuid) -> Result<(GeneratedReport, Vec<u8>), ReportError> {
        let inner = self.read_inner();
        let stored = inner
            .reports
            .get(&id)
            .ok_or(ReportError::ReportNotFound(id))?;
        Ok((stored.report.clone(), stored.payload.clone()))
    }

    /// Re-encodes a stored report's document in an export format.
    pub fn export(&self, id: Uuid, format: ExportFormat) -> Result<ReportExport, ReportError> {
        let inner = self.read_inner();
        let stored = inner
            .reports
            .get(&id)
            .ok_or(ReportError::ReportNotFound(id))?;
        let target = ReportFormat::from(format);
        let bytes = encode(&stored.document, target)?;
        Ok(ReportExport {
            data: String::from_utf8_lossy(&bytes).into_owned(),
            filename: format!("report-{id}.{}", target.file_extension()),
            mime_type: target.mime_type().to_owned(),
        })
    }
}
