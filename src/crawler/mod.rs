pub mod fetcher;
pub mod scheduler;
pub mod update_cycle;

pub use fetcher::{HttpListingFetcher, ListingFetcher};
pub use scheduler::{AcquireDecision, RefreshScheduler};
pub use update_cycle::{CycleReport, CycleStatus, UpdateCycle};
