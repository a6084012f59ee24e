use crate::{
    audit::log_audit,
    dto::categories::{CategoryList, CreateCategoryRequest, DeletedCategory},
    error::AppResult,
    middleware::auth::AuthUser,
    models::Category,
    response::{ApiResponse, Meta},
    state::AppState,
};

pub async fn list_categories(state: &AppState) -> AppResult<ApiResponse<CategoryList>> {
    let items = state.catalog.read().await.entities.list_categories().to_vec();
    let total = items.len();
    Ok(ApiResponse::success(
        "Categories",
        CategoryList { items },
        Some(Meta::for_page(1, total as i64, total)),
    ))
}

pub async fn create_category(
    state: &AppState,
    user: &AuthUser,
    payload: CreateCategoryRequest,
) -> AppResult<ApiResponse<Category>> {
    let actor = user.actor();
    let category = state
        .mutate_entities(|entities, _| entities.add_category(&actor, &payload.name))
        .await?;

    log_audit(
        Some(user.user_id),
        "category_create",
        Some("categories"),
        Some(serde_json::json!({ "category_id": category.id })),
    );

    Ok(ApiResponse::success(
        "Category created",
        category,
        Some(Meta::empty()),
    ))
}

pub async fn delete_category(
    state: &AppState,
    user: &AuthUser,
    id: i64,
) -> AppResult<ApiResponse<DeletedCategory>> {
    let actor = user.actor();
    let removed_products = state
        .mutate_entities(|entities, _| entities.remove_category(&actor, id))
        .await?;

    log_audit(
        Some(user.user_id),
        "category_delete",
        Some("categories"),
        Some(serde_json::json!({ "category_id": id, "removed_products": removed_products })),
    );

    Ok(ApiResponse::success(
        "Category deleted",
        DeletedCategory {
            id,
            removed_products,
        },
        Some(Meta::empty()),
    ))
}
