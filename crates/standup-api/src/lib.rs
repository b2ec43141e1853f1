pub mod read;

pub use read::{AppState, router};
