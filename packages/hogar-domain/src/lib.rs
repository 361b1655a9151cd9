pub mod filter;
pub mod listing;
pub mod query;
pub mod ranking;
pub mod tags;
