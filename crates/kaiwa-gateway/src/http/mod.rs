pub mod callback;
pub mod health;
