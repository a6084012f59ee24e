use crate::{
    audit::log_audit,
    dto::products::{CreateProductRequest, DeletedProduct, ProductList, UpdateProductRequest},
    error::{AppError, AppResult},
    export::export_products,
    middleware::auth::{AuthUser, ensure_admin},
    models::ProductView,
    response::{ApiResponse, Meta},
    routes::params::ProductQuery,
    state::AppState,
    store::{NewProduct, ProductChanges},
};

pub async fn list_products(
    state: &AppState,
    query: ProductQuery,
) -> AppResult<ApiResponse<ProductList>> {
    let catalog = state.catalog.read().await;
    let matched = catalog.entities.list_products(&query.filter());
    let total = matched.len();

    let (items, meta) = match query.pagination() {
        Some((page, limit, offset)) => {
            let items: Vec<ProductView> = matched
                .into_iter()
                .skip(usize::try_from(offset).unwrap_or(usize::MAX))
                .take(usize::try_from(limit).unwrap_or(usize::MAX))
                .map(|p| catalog.product_view(p))
                .collect();
            (items, Meta::for_page(page, limit, total))
        }
        None => {
            let items: Vec<ProductView> = matched
                .into_iter()
                .map(|p| catalog.product_view(p))
                .collect();
            (items, Meta::for_page(1, total as i64, total))
        }
    };

    Ok(ApiResponse::success("Products", ProductList { items }, Some(meta)))
}

pub async fn get_product(state: &AppState, id: i64) -> AppResult<ApiResponse<ProductView>> {
    let catalog = state.catalog.read().await;
    let product = catalog.entities.product(id).ok_or(AppError::NotFound)?;
    Ok(ApiResponse::success(
        "Product",
        catalog.product_view(product),
        None,
    ))
}

pub async fn create_product(
    state: &AppState,
    user: &AuthUser,
    payload: CreateProductRequest,
) -> AppResult<ApiResponse<ProductView>> {
    let actor = user.actor();
    let new_product = NewProduct {
        category_id: payload.category_id,
        name: payload.name,
        price: payload.price,
        colors: payload.colors,
        tags: payload.tags,
        owner_user_id: payload.owner_id.unwrap_or(user.user_id),
    };

    let product = state
        .mutate_entities(|entities, credentials| {
            let product = entities.add_product(&actor, new_product)?;
            Ok(entities.view(&product, credentials))
        })
        .await?;

    log_audit(
        Some(user.user_id),
        "product_create",
        Some("products"),
        Some(serde_json::json!({ "product_id": product.id })),
    );

    Ok(ApiResponse::success(
        "Product created",
        product,
        Some(Meta::empty()),
    ))
}

pub async fn update_product(
    state: &AppState,
    user: &AuthUser,
    id: i64,
    payload: UpdateProductRequest,
) -> AppResult<ApiResponse<ProductView>> {
    let actor = user.actor();
    let changes = ProductChanges {
        category_id: payload.category_id,
        name: payload.name,
        price: payload.price,
        colors: payload.colors,
        tags: payload.tags,
    };

    let product = state
        .mutate_entities(|entities, credentials| {
            let product = entities.update_product(&actor, id, changes)?;
            Ok(entities.view(&product, credentials))
        })
        .await?;

    log_audit(
        Some(user.user_id),
        "product_update",
        Some("products"),
        Some(serde_json::json!({ "product_id": product.id })),
    );

    Ok(ApiResponse::success("Updated", product, Some(Meta::empty())))
}

pub async fn delete_product(
    state: &AppState,
    user: &AuthUser,
    id: i64,
) -> AppResult<ApiResponse<DeletedProduct>> {
    let actor = user.actor();
    let removed = state
        .mutate_entities(|entities, _| entities.remove_product(&actor, id))
        .await?;

    if removed.is_some() {
        log_audit(
            Some(user.user_id),
            "product_delete",
            Some("products"),
            Some(serde_json::json!({ "product_id": id })),
        );
    }

    Ok(ApiResponse::success(
        "Deleted",
        DeletedProduct {
            id,
            removed: removed.is_some(),
        },
        Some(Meta::empty()),
    ))
}

/// CSV of every product, in list order. Admin only.
pub async fn export_csv(state: &AppState, user: &AuthUser) -> AppResult<String> {
    ensure_admin(user)?;
    let catalog = state.catalog.read().await;
    let views: Vec<ProductView> = catalog
        .entities
        .products()
        .iter()
        .map(|p| catalog.product_view(p))
        .collect();

    log_audit(
        Some(user.user_id),
        "product_export",
        Some("products"),
        Some(serde_json::json!({ "rows": views.len() })),
    );

    Ok(export_products(&views))
}
