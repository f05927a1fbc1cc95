//! `latecast-scheduler` — the publish cycle engine.
//!
//! # Overview
//!
//! A cycle ([`SchedulerEngine::run_cycle`]) selects every pending video whose
//! scheduled time has arrived, claims each one through the store's
//! conditional update, uploads the claimed ones concurrently, and persists a
//! terminal status per record. Cycles are safe to run concurrently — when a
//! manual trigger races the periodic loop, the claim step guarantees each
//! record is uploaded at most once.
//!
//! # Record lifecycle per cycle
//!
//! | Step    | Outcome                                                  |
//! |---------|----------------------------------------------------------|
//! | Select  | pending rows with `scheduled_at <= now`                  |
//! | Claim   | conditional `pending → publishing`; loser skips the row  |
//! | Publish | token fetch + upload, bounded by a timeout               |
//! | Record  | `completed` with the platform ID, or `failed` with cause |
//!
//! There is no automatic retry: a failed record stays failed until an
//! operator resubmits it. A store failure during claim leaves the record
//! pending for the next cycle.

pub mod engine;
pub mod error;
pub mod publish;

pub use engine::{CycleSummary, SchedulerEngine};
pub use error::PublishError;
pub use publish::{CredentialProvider, PublishRequest, Publisher};
