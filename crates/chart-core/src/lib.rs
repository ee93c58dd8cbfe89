//! Search core of a syntax-based (synchronous grammar) translation decoder.
//!
//! [`search`] fills a CYK+ chart of recombined, pruned hypotheses for one
//! sentence; [`nbest`] pulls the best derivations out of it lazily.
//! Grammar lookup and feature scoring are supplied by the caller through
//! [`RuleApplicationSource`] and [`ScoreFunction`].

pub mod batch;
pub mod derivation;
pub mod error;
pub mod nbest;
pub mod rules;
pub mod scoring;
pub mod search;
pub mod settings;
pub mod span;

pub use batch::{decode_batch, BatchInput};
pub use derivation::Derivation;
pub use error::{DecodeError, Result};
pub use rules::{RuleApplication, RuleApplicationSource, RuleTable, Slot, TargetSymbol};
pub use scoring::{AdditiveScore, ScoreFunction};
pub use search::{decode, Manager, SentenceContext};
pub use settings::DecoderSettings;
pub use span::Span;
