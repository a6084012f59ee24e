use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

use crate::store::{ProductFilter, ProductOrder};

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Asc,
    Desc,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ProductSortBy {
    Id,
    Price,
    Name,
}

impl From<&ProductSortBy> for ProductOrder {
    fn from(sort_by: &ProductSortBy) -> Self {
        match sort_by {
            ProductSortBy::Id => ProductOrder::Inserted,
            ProductSortBy::Price => ProductOrder::Price,
            ProductSortBy::Name => ProductOrder::Name,
        }
    }
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ProductQuery {
    /// Page number, starting at 1. Omit both paging fields to get everything.
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    /// Case-insensitive search over name and tags.
    pub q: Option<String>,
    pub category_id: Option<i64>,
    pub owner_id: Option<i64>,
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
    #[param(value_type = Option<String>)]
    pub sort_by: Option<ProductSortBy>,
    #[param(value_type = Option<String>)]
    pub sort_order: Option<SortOrder>,
}

impl ProductQuery {
    /// `(page, per_page, offset)`, or `None` when the caller asked for no paging.
    pub fn pagination(&self) -> Option<(i64, i64, i64)> {
        if self.page.is_none() && self.per_page.is_none() {
            return None;
        }
        let page = self.page.unwrap_or(1).max(1);
        let per_page = self.per_page.unwrap_or(20).clamp(1, 100);
        let offset = (page - 1).saturating_mul(per_page);
        Some((page, per_page, offset))
    }

    pub fn filter(&self) -> ProductFilter {
        ProductFilter {
            q: self.q.clone(),
            category_id: self.category_id,
            owner_user_id: self.owner_id,
            min_price: self.min_price,
            max_price: self.max_price,
            order: self.sort_by.as_ref().map(ProductOrder::from).unwrap_or_default(),
            descending: matches!(self.sort_order, Some(SortOrder::Desc)),
        }
    }
}
