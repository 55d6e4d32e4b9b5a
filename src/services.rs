pub mod access;
pub mod auth;
pub use auth::AuthService;
pub mod pictures;
pub mod product_service;
pub use product_service::ProductService;
pub mod sector_service;
pub use sector_service::SectorService;
pub mod user_service;
pub use user_service::UserService;
