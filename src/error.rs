use crate::policy::Policy;
use crate::table::Page;

/// Type Alias: A rebranding of the `Result` enum from the standard library which focuses on errors
/// raised while building or running a paging simulation.
pub type Result<T> = std::result::Result<T, Error>;

/// Every failure the simulation can report. `InvariantViolation`, `MissingMapping` and `RunAborted`
/// occur mid-run; the rest are raised while the inputs are being ingested, before the first
/// reference is processed.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("reference {reference} is outside the page space [0, {page_count})")]
    InvalidReference { reference: usize, page_count: usize },

    #[error("invariant violation: {policy} eviction found no resident victim (last candidate: {candidate:?})")]
    InvariantViolation {
        policy: Policy,
        candidate: Option<Page>,
    },

    #[error("invariant violation: resident {0} has no address mapping")]
    MissingMapping(Page),

    #[error("run aborted: reference {0} failed and the simulation cannot continue")]
    RunAborted(usize),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("could not parse reference '{0}' as a page index")]
    ParseReference(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Template(#[from] indicatif::style::TemplateError),
}
