pub mod edit;
pub mod self_check;
pub mod session;
pub mod toggle;
pub mod views;
