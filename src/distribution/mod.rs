pub mod distributor;
pub mod registry;

pub use distributor::Distributor;
pub use registry::{PushFrame, SubscriberRegistry};
