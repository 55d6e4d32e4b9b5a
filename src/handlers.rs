pub mod auth;
pub mod products;
pub mod sectors;
pub mod users;
