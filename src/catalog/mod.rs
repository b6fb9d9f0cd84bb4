//! Product catalog: supplier listings and bulk pricing tiers

pub mod models;
pub mod pricing;
pub mod repository;

pub use models::{BulkPricingTier, Product};
pub use pricing::price_for_quantity;
pub use repository::ProductRepository;
