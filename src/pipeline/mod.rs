//! The paper pipeline: details, outline, introduction, one chapter per
//! bullet point, conclusion. Strictly sequential.

mod ledger;
mod orchestrator;
mod retry;
mod stages;

pub use orchestrator::{dated_dir, Pipeline};
pub use retry::retry_with_backoff;
