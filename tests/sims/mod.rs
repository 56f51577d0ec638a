//! Integration tests for snapshots and simulators

// StateDict construction, persistence and loading
mod state_dict_tests;

// The three-module Sim scenario
mod scenario_tests;

// The lens plus source simulator
mod lens_source_tests;
