//! Plan upgrade payment orchestration for the Hisab mobile bookkeeping
//! client.
//!
//! The flow: create a pending order, open the hosted checkout, normalize the
//! loosely-typed result it returns, submit the capture to the backend ledger,
//! then reconcile local subscription state against backend eventual
//! consistency. [`orchestrator::UpgradeWorkflow`] sequences the steps; the
//! external collaborators (checkout SDK, subscription state holder,
//! transaction-limit monitor) come in through the `interfaces` traits.

pub mod api_client;
pub mod capture;
pub mod checkout;
pub mod config;
pub mod logger;
pub mod normalizer;
pub mod order;
pub mod orchestrator;
pub mod reconcile;
pub mod subscription;

pub use orchestrator::{Components, UpgradeStage, UpgradeWorkflow};
