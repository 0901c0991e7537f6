//! Property-based tests for snapshot translation
//!
//! Random entity maps, production tables and pollution flows exercise
//! the zero-fill, magnitude and determinism rules over many shapes.
