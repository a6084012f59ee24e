use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{auth, categories, products},
    models::{Category, ProductView, PublicUser, Role},
    response::{ApiResponse, Meta},
    routes::{
        auth as auth_routes, categories as category_routes, health, params,
        products as product_routes,
    },
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth_routes::register,
        auth_routes::login,
        auth_routes::request_otp,
        auth_routes::verify_otp,
        auth_routes::reset_password,
        auth_routes::change_password,
        category_routes::list_categories,
        category_routes::create_category,
        category_routes::delete_category,
        product_routes::list_products,
        product_routes::get_product,
        product_routes::create_product,
        product_routes::update_product,
        product_routes::delete_product,
        product_routes::export_products
    ),
    components(
        schemas(
            Role,
            PublicUser,
            Category,
            ProductView,
            auth::RegisterRequest,
            auth::RegisterResponse,
            auth::LoginRequest,
            auth::LoginResponse,
            auth::RequestOtpRequest,
            auth::VerifyOtpRequest,
            auth::VerifyOtpResponse,
            auth::ResetPasswordRequest,
            auth::ChangePasswordRequest,
            auth::ChangePasswordResponse,
            categories::CreateCategoryRequest,
            categories::CategoryList,
            categories::DeletedCategory,
            products::CreateProductRequest,
            products::UpdateProductRequest,
            products::ProductList,
            products::DeletedProduct,
            params::ProductSortBy,
            params::SortOrder,
            Meta,
            ApiResponse<ProductView>,
            ApiResponse<products::ProductList>,
            ApiResponse<Category>,
            ApiResponse<categories::CategoryList>
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Registration, login and password recovery"),
        (name = "Categories", description = "Category endpoints"),
        (name = "Products", description = "Product endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
