//! Categories and products, with the bookkeeping that ties them together.
//!
//! Each category's `product_count` is adjusted in step with product inserts,
//! moves and removals; it is never recomputed. Authorization is checked here
//! against the acting identity before anything is touched.

use crate::{
    error::{AppError, AppResult},
    models::{Actor, Category, Product, ProductView},
    store::credentials::CredentialStore,
};

#[derive(Debug, Clone)]
pub struct NewProduct {
    pub category_id: i64,
    pub name: String,
    pub price: i64,
    pub colors: Vec<String>,
    pub tags: Vec<String>,
    pub owner_user_id: i64,
}

#[derive(Debug, Clone, Default)]
pub struct ProductChanges {
    pub category_id: Option<i64>,
    pub name: Option<String>,
    pub price: Option<i64>,
    pub colors: Option<Vec<String>>,
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ProductOrder {
    #[default]
    Inserted,
    Name,
    Price,
}

#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    /// Case-insensitive substring of the name or any tag.
    pub q: Option<String>,
    pub category_id: Option<i64>,
    pub owner_user_id: Option<i64>,
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
    pub order: ProductOrder,
    pub descending: bool,
}

impl ProductFilter {
    fn matches(&self, product: &Product) -> bool {
        if let Some(q) = self.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
            let needle = q.to_lowercase();
            let hit = product.name.to_lowercase().contains(&needle)
                || product
                    .tags
                    .iter()
                    .any(|tag| tag.to_lowercase().contains(&needle));
            if !hit {
                return false;
            }
        }
        self.category_id.is_none_or(|id| product.category_id == id)
            && self.owner_user_id.is_none_or(|id| product.owner_user_id == id)
            && self.min_price.is_none_or(|min| product.price >= min)
            && self.max_price.is_none_or(|max| product.price <= max)
    }
}

#[derive(Debug, Clone, Default)]
pub struct EntityCache {
    categories: Vec<Category>,
    products: Vec<Product>,
    next_category_id: i64,
    next_product_id: i64,
}

impl EntityCache {
    pub fn new() -> Self {
        Self::from_records(Vec::new(), Vec::new())
    }

    pub fn from_records(categories: Vec<Category>, products: Vec<Product>) -> Self {
        let next_category_id = categories.iter().map(|c| c.id).max().unwrap_or(0) + 1;
        let next_product_id = products.iter().map(|p| p.id).max().unwrap_or(0) + 1;
        Self {
            categories,
            products,
            next_category_id,
            next_product_id,
        }
    }

    pub fn list_categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn category(&self, id: i64) -> Option<&Category> {
        self.categories.iter().find(|c| c.id == id)
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn product(&self, id: i64) -> Option<&Product> {
        self.products.iter().find(|p| p.id == id)
    }

    pub fn add_category(&mut self, actor: &Actor, name: &str) -> AppResult<Category> {
        ensure_admin(actor)?;
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::Validation("Category name is required".into()));
        }
        let lowered = name.to_lowercase();
        if self
            .categories
            .iter()
            .any(|c| c.name.to_lowercase() == lowered)
        {
            return Err(AppError::DuplicateName);
        }

        let category = Category {
            id: self.next_category_id,
            name: name.to_string(),
            product_count: 0,
        };
        self.next_category_id += 1;
        self.categories.push(category.clone());
        Ok(category)
    }

    /// Remove a category and every product filed under it. Returns how many
    /// products went with it; an unknown id removes nothing.
    pub fn remove_category(&mut self, actor: &Actor, id: i64) -> AppResult<usize> {
        ensure_admin(actor)?;
        let Some(index) = self.categories.iter().position(|c| c.id == id) else {
            return Ok(0);
        };

        self.categories.remove(index);
        let before = self.products.len();
        self.products.retain(|p| p.category_id != id);
        Ok(before - self.products.len())
    }

    pub fn list_products(&self, filter: &ProductFilter) -> Vec<&Product> {
        let mut items: Vec<&Product> = self.products.iter().filter(|p| filter.matches(p)).collect();
        match filter.order {
            ProductOrder::Inserted => {}
            ProductOrder::Name => items.sort_by_key(|p| p.name.to_lowercase()),
            ProductOrder::Price => items.sort_by_key(|p| p.price),
        }
        if filter.descending {
            items.reverse();
        }
        items
    }

    pub fn add_product(&mut self, actor: &Actor, new_product: NewProduct) -> AppResult<Product> {
        if !actor.is_admin() && actor.user_id != new_product.owner_user_id {
            return Err(AppError::Forbidden);
        }

        let draft = Product {
            id: self.next_product_id,
            category_id: new_product.category_id,
            name: new_product.name.trim().to_string(),
            price: new_product.price,
            colors: dedup(new_product.colors),
            tags: dedup(new_product.tags),
            owner_user_id: new_product.owner_user_id,
        };
        self.check_product(&draft, None)?;

        self.adjust_count(draft.category_id, 1);
        self.next_product_id += 1;
        self.products.push(draft.clone());
        Ok(draft)
    }

    pub fn update_product(
        &mut self,
        actor: &Actor,
        id: i64,
        changes: ProductChanges,
    ) -> AppResult<Product> {
        let index = self
            .products
            .iter()
            .position(|p| p.id == id)
            .ok_or(AppError::NotFound)?;
        let existing = &self.products[index];
        ensure_owner_or_admin(actor, existing)?;

        let mut draft = existing.clone();
        if let Some(category_id) = changes.category_id {
            draft.category_id = category_id;
        }
        if let Some(name) = changes.name {
            draft.name = name.trim().to_string();
        }
        if let Some(price) = changes.price {
            draft.price = price;
        }
        if let Some(colors) = changes.colors {
            draft.colors = dedup(colors);
        }
        if let Some(tags) = changes.tags {
            draft.tags = dedup(tags);
        }
        self.check_product(&draft, Some(id))?;

        let previous_category = self.products[index].category_id;
        if previous_category != draft.category_id {
            self.adjust_count(previous_category, -1);
            self.adjust_count(draft.category_id, 1);
        }
        self.products[index] = draft.clone();
        Ok(draft)
    }

    /// Remove a product. An unknown id is not an error and returns `None`.
    pub fn remove_product(&mut self, actor: &Actor, id: i64) -> AppResult<Option<Product>> {
        let Some(index) = self.products.iter().position(|p| p.id == id) else {
            return Ok(None);
        };
        ensure_owner_or_admin(actor, &self.products[index])?;

        let removed = self.products.remove(index);
        self.adjust_count(removed.category_id, -1);
        Ok(Some(removed))
    }

    pub fn view(&self, product: &Product, credentials: &CredentialStore) -> ProductView {
        ProductView {
            id: product.id,
            name: product.name.clone(),
            price: product.price,
            colors: product.colors.clone(),
            tags: product.tags.clone(),
            category_id: product.category_id,
            category_name: self.category(product.category_id).map(|c| c.name.clone()),
            user_id: product.owner_user_id,
            owner_email: credentials
                .find_by_id(product.owner_user_id)
                .map(|u| u.email.clone()),
        }
    }

    fn check_product(&self, draft: &Product, exclude: Option<i64>) -> AppResult<()> {
        if draft.name.is_empty() {
            return Err(AppError::Validation("Product name is required".into()));
        }
        if draft.price <= 0 {
            return Err(AppError::Validation(
                "Enter a valid price greater than 0".into(),
            ));
        }
        if draft.colors.is_empty() {
            return Err(AppError::Validation("Select at least one color".into()));
        }
        if self.category(draft.category_id).is_none() {
            return Err(AppError::Validation("Category not found".into()));
        }

        let lowered = draft.name.to_lowercase();
        let clash = self.products.iter().any(|p| {
            Some(p.id) != exclude
                && p.category_id == draft.category_id
                && p.name.to_lowercase() == lowered
        });
        if clash {
            return Err(AppError::DuplicateProduct);
        }
        Ok(())
    }

    fn adjust_count(&mut self, category_id: i64, delta: i64) {
        if let Some(category) = self.categories.iter_mut().find(|c| c.id == category_id) {
            category.product_count = (category.product_count + delta).max(0);
        }
    }
}

fn ensure_admin(actor: &Actor) -> AppResult<()> {
    if !actor.is_admin() {
        return Err(AppError::Forbidden);
    }
    Ok(())
}

fn ensure_owner_or_admin(actor: &Actor, product: &Product) -> AppResult<()> {
    if actor.user_id != product.owner_user_id && !actor.is_admin() {
        return Err(AppError::Forbidden);
    }
    Ok(())
}

/// Trim, drop blanks and repeats, keep first-seen order.
fn dedup(values: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(values.len());
    for value in values {
        let value = value.trim();
        if !value.is_empty() && !out.iter().any(|v| v == value) {
            out.push(value.to_string());
        }
    }
    out
}
