//! Shopper-side catalog browsing, cart and wishlist.
//!
//! State lives in a per-shopper key/value store as JSON (`cart`, `wishlist`),
//! the way a browser keeps it in local storage. There is no synchronisation
//! between stores; the last write wins.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::models::product::ProductView;

const CART_KEY: &str = "cart";
const WISHLIST_KEY: &str = "wishlist";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortBy {
    #[default]
    Featured,
    PriceLow,
    PriceHigh,
    Newest,
}

/// Catalog view settings: category (by slug, `None` for all), inclusive
/// price range, free-text query and sort order.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogFilter {
    pub category: Option<String>,
    pub price_range: (f64, f64),
    pub query: String,
    pub sort_by: SortBy,
}

impl Default for CatalogFilter {
    fn default() -> Self {
        Self {
            category: None,
            price_range: (0.0, 2000.0),
            query: String::new(),
            sort_by: SortBy::Featured,
        }
    }
}

impl CatalogFilter {
    pub fn matches(&self, product: &ProductView) -> bool {
        let category_ok = match &self.category {
            None => true,
            Some(slug) => product.category.as_ref().is_some_and(|c| &c.slug == slug),
        };
        let (min, max) = self.price_range;
        let price_ok = product.price >= min && product.price <= max;
        category_ok && price_ok && self.matches_query(product)
    }

    /// Case-insensitive match on name, description or category name.
    fn matches_query(&self, product: &ProductView) -> bool {
        let query = self.query.trim().to_lowercase();
        if query.is_empty() {
            return true;
        }
        product.name.to_lowercase().contains(&query)
            || product.description.to_lowercase().contains(&query)
            || product
                .category
                .as_ref()
                .is_some_and(|c| c.name.to_lowercase().contains(&query))
    }

    /// Filters and orders `products`. `Featured` keeps the incoming order.
    pub fn apply<'a>(&self, products: &'a [ProductView]) -> Vec<&'a ProductView> {
        let mut selected: Vec<&ProductView> = products.iter().filter(|p| self.matches(p)).collect();
        match self.sort_by {
            SortBy::Featured => {}
            SortBy::PriceLow => selected.sort_by(|a, b| a.price.total_cmp(&b.price)),
            SortBy::PriceHigh => selected.sort_by(|a, b| b.price.total_cmp(&a.price)),
            SortBy::Newest => selected.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        }
        selected
    }
}

/// Per-shopper persistence, the analogue of browser local storage.
pub trait LocalStorage {
    fn get_item(&self, key: &str) -> Option<String>;
    fn set_item(&mut self, key: &str, value: String);
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    items: HashMap<String, String>,
}

impl LocalStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        self.items.get(key).cloned()
    }

    fn set_item(&mut self, key: &str, value: String) {
        self.items.insert(key.to_string(), value);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    pub id: i64,
    pub name: String,
    pub price: f64,
    pub image: Option<String>,
    pub quantity: u32,
}

/// Cart and wishlist for one shopper, written through to storage on every change.
pub struct ShopperState<S: LocalStorage> {
    storage: S,
    cart: Vec<CartItem>,
    wishlist: Vec<i64>,
}

impl<S: LocalStorage> ShopperState<S> {
    /// Restores saved state; unreadable entries start empty.
    pub fn load(storage: S) -> Self {
        let cart = read_json(&storage, CART_KEY);
        let wishlist = read_json(&storage, WISHLIST_KEY);
        Self { storage, cart, wishlist }
    }

    pub fn cart(&self) -> &[CartItem] {
        &self.cart
    }

    pub fn wishlist(&self) -> &[i64] {
        &self.wishlist
    }

    pub fn into_storage(self) -> S {
        self.storage
    }

    /// Adds one unit, creating the line if needed.
    pub fn add_to_cart(&mut self, product: &ProductView) -> Result<()> {
        match self.cart.iter_mut().find(|item| item.id == product.id) {
            Some(item) => item.quantity += 1,
            None => self.cart.push(CartItem {
                id: product.id,
                name: product.name.clone(),
                price: product.price,
                image: product.images.first().map(|img| img.url.clone()),
                quantity: 1,
            }),
        }
        self.save_cart()
    }

    pub fn remove_from_cart(&mut self, product_id: i64) -> Result<()> {
        self.cart.retain(|item| item.id != product_id);
        self.save_cart()
    }

    /// A quantity of zero removes the line.
    pub fn update_quantity(&mut self, product_id: i64, quantity: u32) -> Result<()> {
        if quantity == 0 {
            return self.remove_from_cart(product_id);
        }
        if let Some(item) = self.cart.iter_mut().find(|item| item.id == product_id) {
            item.quantity = quantity;
        }
        self.save_cart()
    }

    pub fn cart_total(&self) -> f64 {
        self.cart.iter().map(|item| item.price * f64::from(item.quantity)).sum()
    }

    /// Returns whether the product is wished after the toggle.
    pub fn toggle_wishlist(&mut self, product_id: i64) -> Result<bool> {
        let wished = if let Some(pos) = self.wishlist.iter().position(|id| *id == product_id) {
            self.wishlist.remove(pos);
            false
        } else {
            self.wishlist.push(product_id);
            true
        };
        self.storage.set_item(WISHLIST_KEY, serde_json::to_string(&self.wishlist)?);
        Ok(wished)
    }

    fn save_cart(&mut self) -> Result<()> {
        self.storage.set_item(CART_KEY, serde_json::to_string(&self.cart)?);
        Ok(())
    }
}

fn read_json<T: for<'de> Deserialize<'de> + Default>(storage: &impl LocalStorage, key: &str) -> T {
    let Some(raw) = storage.get_item(key) else {
        return T::default();
    };
    serde_json::from_str(&raw).unwrap_or_else(|e| {
        tracing::warn!(%key, error = %e, "discarding unreadable shopper state");
        T::default()
    })
}
