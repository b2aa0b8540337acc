//! CLI command implementations

pub(crate) mod apply;
pub(crate) mod common;
pub(crate) mod create;
pub(crate) mod drivers;
pub(crate) mod version;
