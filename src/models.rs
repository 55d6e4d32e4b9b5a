pub mod auth;
pub mod product;
pub mod sector;
pub mod user;
