//! Application runtime composition modules.

pub(crate) mod config;
pub(crate) mod output;
pub(crate) mod runtime;
