pub mod availability;
pub mod event;
pub mod ledger;
pub mod model;
pub mod repository;
pub mod schedule;
pub mod transport;
