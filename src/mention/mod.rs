//! Mention-aware text entry
//!
//! - `token`: is the caret inside an open "@query" token?
//! - `selection`: highlight / confirm / cancel over the candidate list
//! - `resolver`: literal text -> entity id, keyed by what is in the buffer
//! - `composer`: final buffer + resolver -> outbound command
//! - `highlight`: split stored text into plain and mention runs

pub mod composer;
pub mod highlight;
pub mod resolver;
pub mod selection;
pub mod token;

pub use composer::{compose, ComposedCommand};
pub use highlight::{segments, Segment};
pub use resolver::{MentionResolver, ResolvedMention};
pub use selection::{SelectionPhase, SelectionState};
pub use token::{detect, MentionToken};
