use levelup_core::db::open_db_in_memory;
use levelup_core::{
    AccountService, AccountServiceError, RegisterRequest, SqliteUserRepository, UserRepository,
};

fn request(username: &str, email: &str, password: &str, confirm: &str) -> RegisterRequest {
    RegisterRequest {
        username: username.to_string(),
        email: email.to_string(),
        password: password.to_string(),
        confirm_password: confirm.to_string(),
    }
}

#[test]
fn register_creates_a_level_one_account() {
    let conn = open_db_in_memory().unwrap();
    let service = AccountService::new(SqliteUserRepository::new(&conn));

    let user = service
        .register(&request("nova", "Nova@Example.com", "hunter2!", "hunter2!"))
        .unwrap();

    assert_eq!(user.username, "nova");
    assert_eq!(user.email, "nova@example.com");
    assert_eq!(user.level, 1);
    assert_eq!(user.xp, 0);
}

#[test]
fn register_rejects_empty_fields() {
    let conn = open_db_in_memory().unwrap();
    let service = AccountService::new(SqliteUserRepository::new(&conn));

    let err = service
        .register(&request("", "nova@example.com", "pw", "pw"))
        .unwrap_err();
    assert!(matches!(err, AccountServiceError::MissingField("username")));

    let err = service
        .register(&request("nova", "nova@example.com", "", ""))
        .unwrap_err();
    assert!(matches!(err, AccountServiceError::MissingField("password")));
}

#[test]
fn register_rejects_password_mismatch() {
    let conn = open_db_in_memory().unwrap();
    let service = AccountService::new(SqliteUserRepository::new(&conn));

    let err = service
        .register(&request("nova", "nova@example.com", "first", "second"))
        .unwrap_err();
    assert!(matches!(err, AccountServiceError::PasswordMismatch));
}

#[test]
fn register_rejects_malformed_email() {
    let conn = open_db_in_memory().unwrap();
    let service = AccountService::new(SqliteUserRepository::new(&conn));

    let err = service
        .register(&request("nova", "not-an-email", "pw", "pw"))
        .unwrap_err();
    assert!(matches!(err, AccountServiceError::InvalidEmail(_)));
}

#[test]
fn register_rejects_duplicate_email_case_insensitively() {
    let conn = open_db_in_memory().unwrap();
    let service = AccountService::new(SqliteUserRepository::new(&conn));

    service
        .register(&request("nova", "nova@example.com", "pw", "pw"))
        .unwrap();

    let err = service
        .register(&request("other", "NOVA@example.com", "pw2", "pw2"))
        .unwrap_err();
    assert!(matches!(err, AccountServiceError::EmailTaken(email) if email == "nova@example.com"));
}

#[test]
fn stored_credential_is_a_salted_hash_not_plaintext() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteUserRepository::new(&conn);
    let service = AccountService::new(SqliteUserRepository::new(&conn));

    service
        .register(&request("nova", "nova@example.com", "hunter2!", "hunter2!"))
        .unwrap();

    let credential = repo.get_credential("nova@example.com").unwrap().unwrap();
    assert!(!credential.password_hash.contains("hunter2!"));
    assert!(credential.password_hash.contains('$'));
}

#[test]
fn login_succeeds_with_correct_credentials() {
    let conn = open_db_in_memory().unwrap();
    let service = AccountService::new(SqliteUserRepository::new(&conn));

    let registered = service
        .register(&request("nova", "nova@example.com", "hunter2!", "hunter2!"))
        .unwrap();

    let logged_in = service.login(" Nova@Example.com ", "hunter2!").unwrap();
    assert_eq!(logged_in.id, registered.id);
    assert_eq!(logged_in.level, 1);
}

#[test]
fn login_fails_generically_for_unknown_email_and_wrong_password() {
    let conn = open_db_in_memory().unwrap();
    let service = AccountService::new(SqliteUserRepository::new(&conn));

    service
        .register(&request("nova", "nova@example.com", "hunter2!", "hunter2!"))
        .unwrap();

    let unknown = service.login("ghost@example.com", "hunter2!").unwrap_err();
    assert!(matches!(unknown, AccountServiceError::InvalidCredentials));

    let wrong = service.login("nova@example.com", "wrong").unwrap_err();
    assert!(matches!(wrong, AccountServiceError::InvalidCredentials));
}
