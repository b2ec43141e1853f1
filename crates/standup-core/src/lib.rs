pub mod channel;
pub mod directory;
pub mod ingest;
pub mod lifecycle;
pub mod scheduler;
pub mod service;
pub mod store;

pub use channel::ChannelHandle;
pub use directory::ContactDirectory;
pub use service::{Service, ServiceConfig};
pub use store::StatusStore;
