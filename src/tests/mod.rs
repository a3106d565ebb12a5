//! Test modules for the Kaula MCP engine.
//!
//! Component tests live next to their modules; this tree holds the shared
//! fixtures and the tests that cross module boundaries:
//! - Configuration loading from files and the environment
//! - Error conversions between layers
//! - Proptest strategies and session fixtures reused by the engine tests


pub use test_utils::{
    id_strategy, json_value_strategy, message_strategy, method_strategy, params_strategy,
    ready_pair, session_pair, TestFixture,
};
