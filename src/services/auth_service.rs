use crate::{
    audit::log_audit,
    dto::auth::{
        ChangePasswordRequest, ChangePasswordResponse, LoginRequest, LoginResponse,
        RegisterRequest, RegisterResponse, RequestOtpRequest, ResetPasswordRequest,
        VerifyOtpRequest, VerifyOtpResponse,
    },
    error::AppResult,
    middleware::auth::{AuthUser, issue_token},
    models::{PublicUser, ResetCode},
    response::{ApiResponse, Meta},
    state::AppState,
    store::{NewUser, credentials::authenticate},
};
use tokio::task;

pub async fn register_user(
    state: &AppState,
    payload: RegisterRequest,
) -> AppResult<ApiResponse<RegisterResponse>> {
    let RegisterRequest {
        name,
        mobile,
        email,
        password,
        confirm_password,
    } = payload;

    let user = state
        .mutate_credentials(move |credentials| {
            credentials.register(NewUser {
                name,
                mobile,
                email,
                password,
                confirm_password,
            })
        })
        .await?;

    let access_token = if state.config.auto_login_on_register {
        Some(issue_token(&state.config, &user)?)
    } else {
        None
    };

    log_audit(
        Some(user.id),
        "user_register",
        Some("users"),
        Some(serde_json::json!({ "user_id": user.id })),
    );

    let resp = RegisterResponse {
        user: PublicUser::from(&user),
        access_token,
    };
    Ok(ApiResponse::success("User created", resp, None))
}

pub async fn login_user(
    state: &AppState,
    payload: LoginRequest,
) -> AppResult<ApiResponse<LoginResponse>> {
    let LoginRequest { email, password } = payload;
    let candidate = state
        .catalog
        .read()
        .await
        .credentials
        .find_by_email(&email)
        .cloned();
    let user = task::spawn_blocking(move || authenticate(candidate, &password))
        .await
        .map_err(anyhow::Error::from)?;
    let user = match user {
        Ok(u) => u,
        Err(err) => {
            tracing::debug!(email = %email, "login rejected");
            return Err(err);
        }
    };

    let token = issue_token(&state.config, &user)?;
    let resp = LoginResponse {
        access_token: token,
        token_type: "bearer".to_string(),
        user: PublicUser::from(&user),
    };

    log_audit(
        Some(user.id),
        "user_login",
        Some("users"),
        Some(serde_json::json!({ "user_id": user.id })),
    );

    Ok(ApiResponse::success("Logged in", resp, Some(Meta::empty())))
}

pub async fn request_otp(
    state: &AppState,
    payload: RequestOtpRequest,
) -> AppResult<ApiResponse<()>> {
    let now = state.clock.now();
    let email = payload.email.trim().to_string();
    let notifier = state.notifier.clone();
    // The code is only kept once it has been handed off.
    let reset = state
        .mutate_credentials_confirmed(
            move |credentials| credentials.request_reset(&email, now),
            move |reset: &ResetCode| {
                let (to, code) = (reset.email.clone(), reset.code.clone());
                async move { notifier.send_reset_code(&to, &code).await }
            },
        )
        .await?;

    log_audit(
        None,
        "otp_request",
        Some("users"),
        Some(serde_json::json!({ "email": reset.email, "expires_at": reset.expires_at })),
    );

    Ok(ApiResponse::notice("OTP sent to email"))
}

pub async fn verify_otp(
    state: &AppState,
    payload: VerifyOtpRequest,
) -> AppResult<ApiResponse<VerifyOtpResponse>> {
    let now = state.clock.now();
    let valid = {
        let catalog = state.catalog.read().await;
        catalog
            .credentials
            .verify_reset(payload.email.trim(), payload.otp.trim(), now)
    };
    Ok(ApiResponse::success(
        "OTP checked",
        VerifyOtpResponse { valid },
        Some(Meta::empty()),
    ))
}

pub async fn reset_password(
    state: &AppState,
    payload: ResetPasswordRequest,
) -> AppResult<ApiResponse<()>> {
    let now = state.clock.now();
    let ResetPasswordRequest {
        email,
        otp,
        new_password,
    } = payload;
    let email = email.trim().to_string();

    let target = email.clone();
    state
        .mutate_credentials(move |credentials| {
            credentials.reset_password(&target, otp.trim(), &new_password, now)
        })
        .await?;

    notify_password_changed(state, &email).await;
    log_audit(
        None,
        "password_reset",
        Some("users"),
        Some(serde_json::json!({ "email": email })),
    );

    Ok(ApiResponse::notice("Password reset successful"))
}

pub async fn change_password(
    state: &AppState,
    user: &AuthUser,
    payload: ChangePasswordRequest,
) -> AppResult<ApiResponse<ChangePasswordResponse>> {
    let ChangePasswordRequest {
        old_password,
        new_password,
    } = payload;

    let email = user.email.clone();
    state
        .mutate_credentials(move |credentials| {
            credentials.change_password(&email, &old_password, &new_password)
        })
        .await?;

    notify_password_changed(state, &user.email).await;
    log_audit(
        Some(user.user_id),
        "password_change",
        Some("users"),
        Some(serde_json::json!({ "user_id": user.user_id })),
    );

    Ok(ApiResponse::success(
        "Password changed successfully",
        ChangePasswordResponse {
            reauthenticate: true,
        },
        Some(Meta::empty()),
    ))
}

// Delivery failures do not undo the change.
async fn notify_password_changed(state: &AppState, email: &str) {
    if let Err(err) = state.notifier.password_changed(email).await {
        tracing::warn!(error = %err, "password change notification failed");
    }
}
