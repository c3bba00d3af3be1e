//! inwx-dns-sim: scripted authoritative DNS responder.
//!
//! Answers TXT queries from a per-name script of answer sets so a caller's
//! propagation polling can be exercised against "not visible yet, then
//! visible" sequences without touching real nameservers.
//!
//! # Script semantics
//!
//! Each name owns a cursor starting at zero. A query returns the answer set at
//! the cursor and advances it; once the script is exhausted every further
//! query gets an empty answer. Cursors never reset for the lifetime of a
//! [`ScriptedAnswers`] instance.

pub mod config;
pub mod error;
pub mod handler;
pub mod probe;
pub mod script;
pub mod server;

pub use config::SimulatorConfig;
pub use error::SimError;
pub use handler::ScriptedHandler;
pub use probe::{query_txt, wait_for_txt, PropagationPolicy, TxtProbe};
pub use script::ScriptedAnswers;
pub use server::SimulatorServer;

/// Result type for simulator operations.
pub type Result<T> = std::result::Result<T, SimError>;
