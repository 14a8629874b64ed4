pub mod routes;
pub mod ws;

pub use routes::{routes, AppContext};
