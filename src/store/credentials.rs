//! Users and one-time reset codes.
//!
//! Every operation validates before it mutates, so a failed call leaves the
//! store exactly as it was.

use std::collections::HashMap;

use argon2::{
    Algorithm, Argon2, Params, PasswordHasher, Version,
    password_hash::{PasswordHash, PasswordVerifier, SaltString},
};
use chrono::{DateTime, Duration, Utc};
use password_hash::rand_core::{OsRng, RngCore};

use crate::{
    error::{AppError, AppResult},
    models::{ResetCode, Role, User},
};

const CODE_SPACE: u32 = 1_000_000;

#[derive(Debug, Clone)]
pub struct CredentialPolicy {
    /// Lifetime of a reset code from the moment it is issued.
    pub otp_ttl: Duration,
    /// Refuse a new password that equals the current one.
    pub reject_reused_password: bool,
    pub hash_params: Params,
}

impl Default for CredentialPolicy {
    fn default() -> Self {
        Self {
            otp_ttl: Duration::minutes(10),
            reject_reused_password: false,
            hash_params: Params::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub mobile: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

#[derive(Debug, Clone)]
pub struct CredentialStore {
    users: Vec<User>,
    reset_codes: HashMap<String, ResetCode>,
    next_id: i64,
    policy: CredentialPolicy,
}

impl CredentialStore {
    pub fn new(policy: CredentialPolicy) -> Self {
        Self::from_records(policy, Vec::new(), HashMap::new())
    }

    pub fn from_records(
        policy: CredentialPolicy,
        users: Vec<User>,
        reset_codes: HashMap<String, ResetCode>,
    ) -> Self {
        let next_id = users.iter().map(|u| u.id).max().unwrap_or(0) + 1;
        Self {
            users,
            reset_codes,
            next_id,
            policy,
        }
    }

    pub fn policy(&self) -> &CredentialPolicy {
        &self.policy
    }

    pub fn users(&self) -> &[User] {
        &self.users
    }

    pub fn reset_codes(&self) -> &HashMap<String, ResetCode> {
        &self.reset_codes
    }

    /// Surrounding whitespace is ignored, as it is on register.
    pub fn find_by_email(&self, email: &str) -> Option<&User> {
        let email = email.trim();
        self.users.iter().find(|u| u.email == email)
    }

    pub fn find_by_id(&self, id: i64) -> Option<&User> {
        self.users.iter().find(|u| u.id == id)
    }

    pub fn register(&mut self, new_user: NewUser) -> AppResult<User> {
        let NewUser {
            name,
            mobile,
            email,
            password,
            confirm_password,
        } = new_user;
        let (name, mobile, email) = (name.trim(), mobile.trim(), email.trim());

        if name.is_empty() || mobile.is_empty() || email.is_empty() || password.is_empty() {
            return Err(AppError::Validation("All fields are required".into()));
        }
        if password != confirm_password {
            return Err(AppError::Validation("Passwords do not match".into()));
        }
        if self.find_by_email(email).is_some() {
            return Err(AppError::DuplicateEmail);
        }

        self.insert_user(name, mobile, email, &password, Role::User)
    }

    /// Create an admin account unless the email is already taken.
    pub fn seed_admin(
        &mut self,
        name: &str,
        mobile: &str,
        email: &str,
        password: &str,
    ) -> AppResult<Option<User>> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(AppError::Validation("Admin email and password are required".into()));
        }
        if self.find_by_email(email.trim()).is_some() {
            return Ok(None);
        }
        self.insert_user(name, mobile, email.trim(), password, Role::Admin)
            .map(Some)
    }

    fn insert_user(
        &mut self,
        name: &str,
        mobile: &str,
        email: &str,
        password: &str,
        role: Role,
    ) -> AppResult<User> {
        let user = User {
            id: self.next_id,
            name: name.to_string(),
            mobile: mobile.to_string(),
            email: email.to_string(),
            password_hash: self.hash_password(password)?,
            role,
        };
        self.next_id += 1;
        self.users.push(user.clone());
        Ok(user)
    }

    pub fn login(&self, email: &str, password: &str) -> AppResult<User> {
        authenticate(self.find_by_email(email).cloned(), password)
    }

    /// Issue a fresh code for `email`, replacing any code still outstanding.
    pub fn request_reset(&mut self, email: &str, now: DateTime<Utc>) -> AppResult<ResetCode> {
        let email = email.trim();
        if email.is_empty() {
            return Err(AppError::Validation("Email is required".into()));
        }
        if self.find_by_email(email).is_none() {
            return Err(AppError::UnknownEmail);
        }

        let reset = ResetCode {
            email: email.to_string(),
            code: generate_code(&mut OsRng),
            expires_at: now + self.policy.otp_ttl,
        };
        self.reset_codes.insert(email.to_string(), reset.clone());
        Ok(reset)
    }

    pub fn verify_reset(&self, email: &str, code: &str, now: DateTime<Utc>) -> bool {
        self.reset_codes
            .get(email.trim())
            .is_some_and(|reset| reset.is_valid(code, now))
    }

    pub fn reset_password(
        &mut self,
        email: &str,
        code: &str,
        new_password: &str,
        now: DateTime<Utc>,
    ) -> AppResult<()> {
        let email = email.trim();
        if email.is_empty() || code.is_empty() || new_password.is_empty() {
            return Err(AppError::Validation(
                "email, otp and new_password required".into(),
            ));
        }
        if !self.verify_reset(email, code, now) {
            return Err(AppError::InvalidOtp);
        }

        let index = self.user_index(email).ok_or(AppError::UnknownEmail)?;
        let hash = self.replacement_hash(index, new_password)?;
        self.users[index].password_hash = hash;
        self.reset_codes.remove(email);
        Ok(())
    }

    pub fn change_password(
        &mut self,
        email: &str,
        old_password: &str,
        new_password: &str,
    ) -> AppResult<()> {
        if old_password.is_empty() || new_password.is_empty() {
            return Err(AppError::Validation(
                "old_password and new_password required".into(),
            ));
        }
        let index = self.user_index(email).ok_or(AppError::NotFound)?;
        if !verify_password(old_password, &self.users[index].password_hash)? {
            return Err(AppError::InvalidOldPassword);
        }

        let hash = self.replacement_hash(index, new_password)?;
        self.users[index].password_hash = hash;
        Ok(())
    }

    fn user_index(&self, email: &str) -> Option<usize> {
        let email = email.trim();
        self.users.iter().position(|u| u.email == email)
    }

    fn replacement_hash(&self, index: usize, new_password: &str) -> AppResult<String> {
        if self.policy.reject_reused_password
            && verify_password(new_password, &self.users[index].password_hash)?
        {
            return Err(AppError::SamePassword);
        }
        self.hash_password(new_password)
    }

    fn hash_password(&self, password: &str) -> AppResult<String> {
        let argon2 = Argon2::new(
            Algorithm::Argon2id,
            Version::V0x13,
            self.policy.hash_params.clone(),
        );
        let salt = SaltString::generate(&mut OsRng);
        let hash = argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?
            .to_string();
        Ok(hash)
    }
}

/// Check `password` against an already looked-up account. Runs argon2, so
/// async callers should keep it off the runtime threads.
pub fn authenticate(user: Option<User>, password: &str) -> AppResult<User> {
    let user = user.ok_or(AppError::InvalidCredentials)?;
    if !verify_password(password, &user.password_hash)? {
        return Err(AppError::InvalidCredentials);
    }
    Ok(user)
}

fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
    let parsed = PasswordHash::new(hash)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("Invalid password hash")))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

/// Uniform six-digit code, zero padded.
pub fn generate_code<R: RngCore>(rng: &mut R) -> String {
    // Largest multiple of CODE_SPACE that fits in a u32; draws above it are
    // rejected so every code is equally likely.
    let zone = u32::MAX - (u32::MAX % CODE_SPACE);
    loop {
        let draw = rng.next_u32();
        if draw < zone {
            return format!("{:06}", draw % CODE_SPACE);
        }
    }
}
