//! Cross-chain integration flows.

mod e2e;
mod failure_modes;
mod idempotency;
mod provenance;
