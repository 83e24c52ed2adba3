pub mod checkout_repo;
pub mod gateway;
pub mod models;
