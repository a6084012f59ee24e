mod common;

use catalog_admin_api::{
    error::AppError,
    models::Role,
    store::{CredentialPolicy, CredentialStore, NewUser, credentials::generate_code},
};
use chrono::{Duration, TimeZone, Utc};
use password_hash::rand_core::{CryptoRng, RngCore};

use common::{fast_policy, with_fast_hashing};

fn new_user(email: &str, password: &str) -> NewUser {
    NewUser {
        name: "Alice".into(),
        mobile: "5550100".into(),
        email: email.into(),
        password: password.into(),
        confirm_password: password.into(),
    }
}

fn store_with_alice() -> CredentialStore {
    let mut store = CredentialStore::new(fast_policy());
    store
        .register(new_user("alice@x.com", "pw1"))
        .expect("register alice");
    store
}

#[test]
fn register_then_login_returns_user_role() {
    let store = store_with_alice();

    let user = store.login("alice@x.com", "pw1").expect("login");
    assert_eq!(user.email, "alice@x.com");
    assert_eq!(user.role, Role::User);
    assert_ne!(user.password_hash, "pw1", "secret must not be stored verbatim");
}

#[test]
fn register_rejects_mismatch_empty_and_duplicate() {
    let mut store = store_with_alice();

    let mut mismatched = new_user("bob@x.com", "pw1");
    mismatched.confirm_password = "pw2".into();
    assert!(matches!(store.register(mismatched), Err(AppError::Validation(_))));

    let mut blank = new_user("bob@x.com", "pw1");
    blank.mobile = "   ".into();
    assert!(matches!(store.register(blank), Err(AppError::Validation(_))));

    assert!(matches!(
        store.register(new_user("alice@x.com", "other")),
        Err(AppError::DuplicateEmail)
    ));
    assert_eq!(store.users().len(), 1);
}

#[test]
fn email_match_is_case_sensitive() {
    let mut store = store_with_alice();

    let other = store
        .register(new_user("Alice@x.com", "pw9"))
        .expect("differently cased email is a different account");
    assert_ne!(other.id, store.find_by_email("alice@x.com").unwrap().id);
    assert!(matches!(
        store.login("ALICE@x.com", "pw1"),
        Err(AppError::InvalidCredentials)
    ));
}

#[test]
fn surrounding_whitespace_in_email_is_ignored() {
    let mut store = CredentialStore::new(fast_policy());
    store.register(new_user("  bob@x.com ", "pw1")).unwrap();

    assert_eq!(store.find_by_email("bob@x.com").unwrap().email, "bob@x.com");
    assert!(store.login(" bob@x.com", "pw1").is_ok());
    assert!(store.login("bob@x.com", "pw1").is_ok());

    let now = Utc::now();
    let reset = store.request_reset(" bob@x.com ", now).unwrap();
    assert_eq!(reset.email, "bob@x.com");
    assert!(store.verify_reset("bob@x.com", &reset.code, now));
    store
        .reset_password(" bob@x.com", &reset.code, "pw2", now)
        .expect("reset");
    store
        .change_password("bob@x.com ", "pw2", "pw3")
        .expect("change");
    assert!(store.login("bob@x.com", "pw3").is_ok());
}

#[test]
fn ids_are_unique_and_increasing() {
    let mut store = CredentialStore::new(fast_policy());
    let a = store.register(new_user("a@x.com", "p")).unwrap();
    let b = store.register(new_user("b@x.com", "p")).unwrap();
    assert!(b.id > a.id);
}

#[test]
fn login_with_wrong_password_or_unknown_email_fails() {
    let store = store_with_alice();
    assert!(matches!(
        store.login("alice@x.com", "nope"),
        Err(AppError::InvalidCredentials)
    ));
    assert!(matches!(
        store.login("nobody@x.com", "pw1"),
        Err(AppError::InvalidCredentials)
    ));
}

#[test]
fn reset_code_verifies_until_expiry() {
    let mut store = store_with_alice();
    let now = Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap();

    let reset = store.request_reset("alice@x.com", now).expect("request");
    assert_eq!(reset.code.len(), 6);
    assert!(reset.code.chars().all(|c| c.is_ascii_digit()));
    assert_eq!(reset.expires_at, now + Duration::minutes(10));

    assert!(store.verify_reset("alice@x.com", &reset.code, now));
    assert!(store.verify_reset(
        "alice@x.com",
        &reset.code,
        now + Duration::minutes(9)
    ));
    assert!(!store.verify_reset("alice@x.com", &reset.code, reset.expires_at));
    assert!(!store.verify_reset(
        "alice@x.com",
        &reset.code,
        now + Duration::minutes(11)
    ));
}

#[test]
fn verify_does_not_consume_and_wrong_code_fails() {
    let mut store = store_with_alice();
    let now = Utc::now();
    let reset = store.request_reset("alice@x.com", now).unwrap();

    let wrong = if reset.code == "000000" { "000001" } else { "000000" };
    assert!(!store.verify_reset("alice@x.com", wrong, now));
    assert!(store.verify_reset("alice@x.com", &reset.code, now));
    assert!(store.verify_reset("alice@x.com", &reset.code, now));
    assert!(!store.verify_reset("bob@x.com", &reset.code, now));
}

#[test]
fn request_reset_for_unknown_email_fails() {
    let mut store = store_with_alice();
    assert!(matches!(
        store.request_reset("ghost@x.com", Utc::now()),
        Err(AppError::UnknownEmail)
    ));
    assert!(store.reset_codes().is_empty());
}

#[test]
fn new_request_replaces_previous_code() {
    let mut store = store_with_alice();
    let now = Utc::now();
    let first = store.request_reset("alice@x.com", now).unwrap();
    let later = now + Duration::minutes(5);
    let second = store.request_reset("alice@x.com", later).unwrap();

    assert_eq!(store.reset_codes().len(), 1);
    assert_eq!(store.reset_codes()["alice@x.com"], second);
    if first.code != second.code {
        assert!(!store.verify_reset("alice@x.com", &first.code, later));
    }
}

#[test]
fn reset_password_swaps_secret_and_consumes_code() {
    let mut store = store_with_alice();
    let now = Utc::now();
    let reset = store.request_reset("alice@x.com", now).unwrap();

    store
        .reset_password("alice@x.com", &reset.code, "pw2", now)
        .expect("reset");

    assert!(store.login("alice@x.com", "pw2").is_ok());
    assert!(matches!(
        store.login("alice@x.com", "pw1"),
        Err(AppError::InvalidCredentials)
    ));
    assert!(!store.verify_reset("alice@x.com", &reset.code, now));
    assert!(matches!(
        store.reset_password("alice@x.com", &reset.code, "pw3", now),
        Err(AppError::InvalidOtp)
    ));
}

#[test]
fn expired_code_cannot_reset() {
    let mut store = store_with_alice();
    let now = Utc::now();
    let reset = store.request_reset("alice@x.com", now).unwrap();

    let result = store.reset_password(
        "alice@x.com",
        &reset.code,
        "pw2",
        now + Duration::minutes(10),
    );
    assert!(matches!(result, Err(AppError::InvalidOtp)));
    assert!(store.login("alice@x.com", "pw1").is_ok());
}

#[test]
fn same_password_is_allowed_unless_policy_rejects_it() {
    let now = Utc::now();

    let mut lenient = store_with_alice();
    let reset = lenient.request_reset("alice@x.com", now).unwrap();
    lenient
        .reset_password("alice@x.com", &reset.code, "pw1", now)
        .expect("reuse allowed by default");
    lenient
        .change_password("alice@x.com", "pw1", "pw1")
        .expect("reuse allowed by default");

    let mut strict = CredentialStore::new(with_fast_hashing(CredentialPolicy {
        reject_reused_password: true,
        ..CredentialPolicy::default()
    }));
    strict.register(new_user("alice@x.com", "pw1")).unwrap();
    let reset = strict.request_reset("alice@x.com", now).unwrap();
    assert!(matches!(
        strict.reset_password("alice@x.com", &reset.code, "pw1", now),
        Err(AppError::SamePassword)
    ));
    assert!(
        strict.verify_reset("alice@x.com", &reset.code, now),
        "rejected reset must not consume the code"
    );
    assert!(matches!(
        strict.change_password("alice@x.com", "pw1", "pw1"),
        Err(AppError::SamePassword)
    ));
}

#[test]
fn change_password_requires_old_secret() {
    let mut store = store_with_alice();

    assert!(matches!(
        store.change_password("alice@x.com", "wrong", "pw2"),
        Err(AppError::InvalidOldPassword)
    ));
    assert!(store.login("alice@x.com", "pw1").is_ok());

    store
        .change_password("alice@x.com", "pw1", "pw2")
        .expect("change");
    assert!(store.login("alice@x.com", "pw2").is_ok());
    assert!(store.login("alice@x.com", "pw1").is_err());
}

#[test]
fn seed_admin_is_idempotent() {
    let mut store = CredentialStore::new(fast_policy());
    let admin = store
        .seed_admin("Admin", "0000000000", "admin@x.com", "secret")
        .unwrap()
        .expect("created");
    assert_eq!(admin.role, Role::Admin);

    let again = store
        .seed_admin("Admin", "0000000000", "admin@x.com", "other")
        .unwrap();
    assert!(again.is_none());
    assert!(store.login("admin@x.com", "secret").is_ok());
}

/// Replays a fixed sequence of draws.
struct ScriptedRng(Vec<u32>);

impl RngCore for ScriptedRng {
    fn next_u32(&mut self) -> u32 {
        self.0.remove(0)
    }

    fn next_u64(&mut self) -> u64 {
        u64::from(self.next_u32())
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        dest.fill(0);
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), password_hash::rand_core::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

impl CryptoRng for ScriptedRng {}

#[test]
fn generated_codes_keep_leading_zeros_and_skip_biased_draws() {
    assert_eq!(generate_code(&mut ScriptedRng(vec![42])), "000042");
    assert_eq!(generate_code(&mut ScriptedRng(vec![1_999_999])), "999999");
    // Draws at or above the last full block of a million are thrown away.
    assert_eq!(
        generate_code(&mut ScriptedRng(vec![u32::MAX, 4_294_000_000, 7])),
        "000007"
    );
}
