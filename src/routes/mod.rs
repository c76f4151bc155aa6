pub mod emergencies;
pub mod health;
