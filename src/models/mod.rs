pub mod category;
pub mod page;
pub mod product;
pub mod user;
