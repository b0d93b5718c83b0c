//! Helpers shared by the unit tests, and the end-to-end scenarios.

pub(crate) mod support;
