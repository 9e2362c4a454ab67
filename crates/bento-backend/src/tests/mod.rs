//! Test suites for the sentence backend.

mod lib_api;
mod support;
