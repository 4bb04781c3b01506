pub mod factory;
pub mod health;
