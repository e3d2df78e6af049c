mod health;
mod ingredient;
mod tag;
mod user;
