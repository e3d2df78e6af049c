pub mod health;
pub mod recipe;
pub mod shared;
pub mod user;
pub mod vocabulary;
