use crate::search::{HypId, ManagerState};
use crate::settings::SettingsError;
use crate::span::Span;

pub type Result<T, E = DecodeError> = std::result::Result<T, E>;

/// Errors from decoding one sentence.
///
/// Empty input and sentences the grammar cannot cover are not errors; those
/// produce empty results. Everything except `Config` and the state variants
/// signals a broken invariant in the rule source or the driver, and aborts
/// the sentence.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("invalid configuration: {0}")]
    Config(#[from] SettingsError),

    #[error("chart is not filled (manager is {0:?})")]
    NotFilled(ManagerState),

    #[error("sentence was already processed (manager is {0:?})")]
    AlreadyStarted(ManagerState),

    #[error("span {span} is outside a sentence of length {len}")]
    SpanOutOfRange { span: Span, len: usize },

    #[error("span {0} was requested before it was filled")]
    UnfilledSpan(Span),

    #[error("unknown hypothesis {0}")]
    UnknownHypothesis(HypId),

    #[error("rule on {span} has invalid slot {slot}: {reason}")]
    InvalidSlot {
        span: Span,
        slot: Span,
        reason: &'static str,
    },

    #[error("rule on {span} has an invalid target side: {reason}")]
    InvalidTarget { span: Span, reason: String },

    #[error("alignment point ({source_pos}, {target_index}) of rule on {span} cannot be located")]
    MissingAlignment {
        span: Span,
        source_pos: usize,
        target_index: usize,
    },

    /// The rule source or scorer panicked while cells of this width were
    /// built.
    #[error("cell construction panicked while filling width {0}")]
    WorkerPanicked(usize),

    /// A batch sentence panicked outside cell construction, e.g. in its
    /// query.
    #[error("decoding sentence {0} panicked")]
    SentencePanicked(usize),
}
