pub mod membership_repo;
pub use membership_repo::MembershipRegistry;
pub mod product_repo;
pub use product_repo::ProductRepository;
pub mod sector_repo;
pub use sector_repo::SectorRepository;
pub mod user_repo;
pub use user_repo::UserRepository;
