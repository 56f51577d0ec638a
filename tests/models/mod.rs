//! Integration tests for configuration documents and the kind registry

// Building simulators from JSON
mod config_tests;
