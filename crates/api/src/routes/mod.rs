pub mod customer;
pub mod health;
pub mod metrics;
pub mod staff;
