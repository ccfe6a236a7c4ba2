pub mod connectivity;
pub mod ids;
pub mod merge;
pub mod observers;
pub mod remote;
pub mod repository;
pub mod tracking;
