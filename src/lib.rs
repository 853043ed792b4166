//! DDS examination report builder.
//!
//! A UI layer owns a [`record::Record`], optionally drafts section narratives
//! with [`drafting::SectionDrafter`], and turns the finished record into a
//! downloadable PDF with [`report::assemble`].

pub mod config;
pub mod drafting;
pub mod record;
pub mod report;
pub mod review;

pub use drafting::{DraftError, DraftErrorKind, DraftOutcome, SectionDrafter};
pub use record::{PhysicalExam, PhysicalField, Record, SectionEntry, SectionId};
pub use report::{assemble, assemble_with_layout, report_filename, Report, ReportLayout};

use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber.
///
/// Honors `RUST_LOG`, falling back to [`config::default_log_filter`]. Safe to
/// call more than once; later calls are no-ops.
pub fn init_tracing() {
    let initialized = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .try_init()
        .is_ok();

    if initialized {
        tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);
    }
}
