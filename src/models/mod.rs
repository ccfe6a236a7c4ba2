pub mod connectivity;
pub mod location;
pub mod order;
pub mod snapshot;
