pub mod db;
pub mod store;

pub use db::LibraryStats;
pub use store::{CardStore, SessionRecorder, Store};
