//! Matching a path against many patterns at once.
//!
//! Every pattern added to a [`Builder`] is compiled into one automaton over
//! path components, so matching costs one walk over the path no matter how
//! many patterns there are. Pattern ids are assigned in insertion order.

mod builder;
mod matcher;
mod nfa;
mod tree_matcher;

pub use self::builder::Builder;
pub use self::matcher::Matcher;
