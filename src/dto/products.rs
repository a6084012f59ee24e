use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::ProductView;

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductRequest {
    pub name: String,
    pub price: i64,
    #[serde(default)]
    pub colors: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub category_id: i64,
    /// Admins may file a product on behalf of another user.
    pub owner_id: Option<i64>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub price: Option<i64>,
    pub colors: Option<Vec<String>>,
    pub tags: Option<Vec<String>>,
    pub category_id: Option<i64>,
}

#[derive(Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct ProductList {
    #[schema(value_type = Vec<ProductView>)]
    pub items: Vec<ProductView>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DeletedProduct {
    pub id: i64,
    /// False when the product was already gone.
    pub removed: bool,
}
