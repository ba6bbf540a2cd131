//! End-to-end tests for the yar compiler live in this crate's `tests/`
//! directory; the library itself is empty.
