//! Integration tests for the module graph
//!
//! These tests build small trees through the public API and check naming,
//! traversal order and the pack/unpack calling convention end to end.

// Attachment, naming and traversal
mod graph_tests;

// The pack/unpack convention
mod pack_tests;
