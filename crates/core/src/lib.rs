//! ScrapPY Web core: the job lifecycle and execution subsystem.
//!
//! An uploaded document becomes a [`job::Job`] tracked in the in-memory
//! [`registry::JobRegistry`]. The [`orchestrator::JobOrchestrator`] drives
//! each job from submission to a terminal state, running the analysis
//! engine as an isolated, time-bounded child process behind the
//! [`runner::EngineRunner`] seam.

pub mod error;
pub mod extractor;
pub mod job;
pub mod orchestrator;
pub mod registry;
pub mod runner;
