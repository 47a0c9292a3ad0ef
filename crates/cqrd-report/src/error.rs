use thiserror::Error;
use uuid::Uuid;

/// Errors produced by the reporting pipeline.
///
/// These all propagate: a report the caller asked for either exists in full
/// or the call fails. Per-section data problems are not errors at this level;
/// the collector degrades them to error markers inside the report instead.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("template not found: {0}")]
    TemplateNotFound(String),

    #[error("invalid template: {0}")]
    InvalidTemplate(String),

    #[error("report not found: {0}")]
    ReportNotFound(Uuid),

    #[error("report {0} already stored")]
    DuplicateReport(Uuid),

    #[error("invalid schedule: {0}")]
    InvalidSchedule(String),

    #[error("failed to encode report payload")]
    Encode(#[from] serde_json::Error),

    #[error("failed to read template file {path}")]
    TemplateIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse template file {path}")]
    TemplateParse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error(transparent)]
    Quality(#[from] cqrd_quality::QualityError),

    #[error(transparent)]
    Source(#[from] cqrd_source::SourceError),
}
