// Test Helpers Module - shared fixtures for unit and integration tests
//
// Provides a programmable upstream and record fixtures so the fetch path can
// be exercised without network access or a database.

pub mod scripted_upstream;

pub use scripted_upstream::{sample_record, FetchHook, ScriptedUpstream};
