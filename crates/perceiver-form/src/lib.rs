//! Form perceiver - understanding which profile attribute a control asks for
//!
//! - the host document port and an in-memory arena implementation
//! - text normalization and per-control signal extraction
//! - the scored rule matcher
//! - the context inference fallback for weak-signal controls

pub mod context;
pub mod dom;
pub mod errors;
pub mod matcher;
pub mod normalize;
pub mod page;
pub mod rules;
pub mod signals;

pub use context::{infer_from_context, infer_from_text, ContextWindow};
pub use dom::{ControlKind, DomEvent, HostDocument, NodeId};
pub use errors::PerceiverError;
pub use matcher::{
    MatchResult, MatchThresholds, NoMatch, RuleMatcher, MIN_AMBIGUITY_GAP, MIN_CONFIDENT_SCORE,
};
pub use normalize::{contains_phrase, normalize};
pub use page::{DispatchedEvent, PageDom};
pub use rules::{default_rules, FieldRule, FORBIDDEN_KEYWORDS};
pub use signals::{
    extract_signals, ignore_reason, question_container, should_ignore, Channel, IgnoreReason,
    SignalBundle,
};
