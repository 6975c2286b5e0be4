pub mod health;
pub mod og;
