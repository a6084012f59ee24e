use serde_json::Value;

/// Record who did what. Emitted on the `audit` target so it can be routed
/// separately from request logs.
pub fn log_audit(user_id: Option<i64>, action: &str, resource: Option<&str>, metadata: Option<Value>) {
    // Bound outside the macro: `info!` brings its own `Value` into scope.
    let metadata = metadata.unwrap_or(Value::Null);
    tracing::info!(
        target: "audit",
        user_id = ?user_id,
        action = %action,
        resource = %resource.unwrap_or("-"),
        metadata = %metadata,
        "audit"
    );
}
