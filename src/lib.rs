#![doc = include_str!("../README.md")]
mod amount;
mod catalog;
mod dashboard;
mod error;
mod files;
mod slug;

pub use amount::Amount;
pub use catalog::{Availability, Catalog, CatalogItem, CatalogRow, PRICE_LIST_TITLE};
pub use dashboard::{
    CategorySales, DailySales, Dashboard, DashboardData, ProductSales, Sale, SaleRow,
    TOP_PRODUCTS,
};
pub use error::{Error, Result};
pub use slug::slugify;
