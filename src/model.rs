pub mod outcome;
pub mod store;
