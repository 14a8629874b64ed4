pub mod filter;
pub mod store;
pub mod time;
pub mod types;

pub use filter::FilterSet;
pub use store::ListingStore;
pub use types::{ListingRecord, RawListing};
