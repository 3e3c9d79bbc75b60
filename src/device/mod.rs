//! Concrete panels and button sources.

#[cfg(feature = "terminal")]
pub mod terminal;
