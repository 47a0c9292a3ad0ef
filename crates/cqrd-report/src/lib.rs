//! Report generation: templates, data collection, rendering, storage, and
//! recurring schedules.
//!
//! A report starts from a [`ReportTemplate`] held in the
//! [`TemplateRegistry`]. The [`ReportCollector`] gathers data for each
//! template section, [`generate`] renders the collected data into an
//! encoded payload, and the [`ReportStore`] keeps a bounded history of the
//! results for download and re-export. The [`ScheduleBoard`] drives
//! recurring generation on hourly to monthly cadences.

pub mod collect;
pub mod error;
pub mod registry;
pub mod render;
pub mod schedule;
pub mod store;
pub mod types;

pub use collect::ReportCollector;
pub use error::ReportError;
pub use registry::TemplateRegistry;
pub use render::{generate, render, RenderedReport};
pub use schedule::{
    Frequency, NewSchedule, ReportSchedule, RunOutcome, ScheduleBoard,
};
pub use store::ReportStore;
pub use types::{
    ExportFormat, GenerateOptions, GeneratedReport, ReportDocument, ReportExport, ReportFormat,
    ReportPeriod, ReportTemplate, TemplateDefinition,
};
