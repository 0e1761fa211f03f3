pub mod history;
pub mod recipe;
