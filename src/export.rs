use crate::models::ProductView;

const HEADER: &str = "Name,Price,Colors,Tags,Category";
const LIST_SEPARATOR: &str = "|";

/// Render products as CSV. An empty slice renders as an empty string.
pub fn export_products(products: &[ProductView]) -> String {
    if products.is_empty() {
        return String::new();
    }

    let mut lines = Vec::with_capacity(products.len() + 1);
    lines.push(HEADER.to_string());
    for product in products {
        let fields = [
            escape(&product.name),
            product.price.to_string(),
            escape(&product.colors.join(LIST_SEPARATOR)),
            escape(&product.tags.join(LIST_SEPARATOR)),
            escape(product.category_name.as_deref().unwrap_or_default()),
        ];
        lines.push(fields.join(","));
    }
    lines.join("\n")
}

fn escape(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
