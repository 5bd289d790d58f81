use std::sync::Arc;

use chrono::Duration;

use hackers_api::domain::repository::OneTimeCodeRepository;
use hackers_api::domain::types::VERIFICATION_CODE_DIGITS;
use hackers_api::error::ApiError;
use hackers_api::usecase::session::{LoginInput, LoginUseCase};
use hackers_api::usecase::verification::{
    CheckVerificationInput, CheckVerificationUseCase, ForgotPasswordUseCase, ResetPasswordInput,
    ResetPasswordUseCase, SendVerificationUseCase,
};
use hackers_auth_types::token::{TokenConfig, TokenIssuer};
use hackers_testing::auth::{TEST_ACCESS_SECRET, TEST_REFRESH_SECRET};

use crate::helpers::{
    MockCodeRepo, MockUserRepo, RecordingMailer, TEST_RESET_LINK_BASE, test_hasher, test_tokens,
};

fn send_usecase(
    users: &MockUserRepo,
    codes: &MockCodeRepo,
    mailer: &RecordingMailer,
) -> SendVerificationUseCase<MockUserRepo, MockCodeRepo> {
    SendVerificationUseCase {
        users: users.clone(),
        codes: codes.clone(),
        mailer: Arc::new(mailer.clone()),
    }
}

async fn check(codes: &MockCodeRepo, email: &str, code: &str) -> Result<(), ApiError> {
    CheckVerificationUseCase {
        codes: codes.clone(),
    }
    .execute(CheckVerificationInput {
        email: email.to_owned(),
        code: code.to_owned(),
    })
    .await
}

fn forgot_usecase(
    users: &MockUserRepo,
    codes: &MockCodeRepo,
    mailer: &RecordingMailer,
) -> ForgotPasswordUseCase<MockUserRepo, MockCodeRepo> {
    ForgotPasswordUseCase {
        users: users.clone(),
        codes: codes.clone(),
        tokens: test_tokens(),
        mailer: Arc::new(mailer.clone()),
        reset_link_base: TEST_RESET_LINK_BASE.to_owned(),
    }
}

async fn reset(
    users: &MockUserRepo,
    codes: &MockCodeRepo,
    token: &str,
    new_password: &str,
) -> Result<(), ApiError> {
    ResetPasswordUseCase {
        users: users.clone(),
        codes: codes.clone(),
        tokens: test_tokens(),
        hasher: test_hasher(),
    }
    .execute(ResetPasswordInput {
        token: token.to_owned(),
        new_password: new_password.to_owned(),
    })
    .await
}

async fn can_log_in(users: &MockUserRepo, email: &str, password: &str) -> bool {
    LoginUseCase {
        users: users.clone(),
        hasher: test_hasher(),
        tokens: test_tokens(),
    }
    .execute(LoginInput {
        email: email.to_owned(),
        password: password.to_owned(),
    })
    .await
    .is_ok()
}

// ── Send / check verification code ───────────────────────────────────────────

#[tokio::test]
async fn should_store_and_mail_seven_digit_code() {
    let (users, codes, mailer) = (MockUserRepo::empty(), MockCodeRepo::empty(), RecordingMailer::default());

    send_usecase(&users, &codes, &mailer)
        .execute("new@x.com".to_owned())
        .await
        .unwrap();

    let stored = codes.latest_for("new@x.com").unwrap();
    assert_eq!(stored.code.len(), VERIFICATION_CODE_DIGITS);
    assert!(stored.code.chars().all(|c| c.is_ascii_digit()));

    let sent = mailer.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, "new@x.com");
    assert_eq!(sent[0].1.subject, "Verify your email");
    assert!(sent[0].1.html.contains(&stored.code));
}

#[tokio::test]
async fn should_refuse_code_for_registered_email() {
    let (users, codes, mailer) = (MockUserRepo::empty(), MockCodeRepo::empty(), RecordingMailer::default());
    users.seed("alice", "a@x.com", "p1").await;

    let err = send_usecase(&users, &codes, &mailer)
        .execute("a@x.com".to_owned())
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::AlreadyRegistered(ref e) if e == "a@x.com"));
    assert!(codes.codes_handle().lock().unwrap().is_empty());
    assert!(mailer.sent().is_empty());
}

#[tokio::test]
async fn should_accept_matching_code() {
    let (users, codes, mailer) = (MockUserRepo::empty(), MockCodeRepo::empty(), RecordingMailer::default());
    send_usecase(&users, &codes, &mailer)
        .execute("new@x.com".to_owned())
        .await
        .unwrap();
    let code = codes.latest_for("new@x.com").unwrap().code;

    check(&codes, "new@x.com", &code).await.unwrap();
    // Checking does not consume the code.
    check(&codes, "new@x.com", &code).await.unwrap();
}

#[tokio::test]
async fn should_match_on_email_and_code_pair() {
    let (users, codes, mailer) = (MockUserRepo::empty(), MockCodeRepo::empty(), RecordingMailer::default());
    send_usecase(&users, &codes, &mailer)
        .execute("new@x.com".to_owned())
        .await
        .unwrap();
    let code = codes.latest_for("new@x.com").unwrap().code;

    let err = check(&codes, "other@x.com", &code).await.unwrap_err();
    assert!(matches!(err, ApiError::InvalidVerificationCode));
    let err = check(&codes, "new@x.com", "not-a-code").await.unwrap_err();
    assert!(matches!(err, ApiError::InvalidVerificationCode));
}

#[tokio::test]
async fn should_keep_every_outstanding_code_valid() {
    let (users, codes, mailer) = (MockUserRepo::empty(), MockCodeRepo::empty(), RecordingMailer::default());
    let usecase = send_usecase(&users, &codes, &mailer);
    usecase.execute("new@x.com".to_owned()).await.unwrap();
    usecase.execute("new@x.com".to_owned()).await.unwrap();

    let all: Vec<String> = codes
        .codes_handle()
        .lock()
        .unwrap()
        .iter()
        .map(|c| c.code.clone())
        .collect();
    assert_eq!(all.len(), 2);
    for code in all {
        check(&codes, "new@x.com", &code).await.unwrap();
    }
}

#[tokio::test]
async fn should_forget_code_after_ttl() {
    let (users, codes, mailer) = (MockUserRepo::empty(), MockCodeRepo::empty(), RecordingMailer::default());
    send_usecase(&users, &codes, &mailer)
        .execute("new@x.com".to_owned())
        .await
        .unwrap();
    let code = codes.latest_for("new@x.com").unwrap().code;

    codes.age(Duration::minutes(29));
    check(&codes, "new@x.com", &code).await.unwrap();

    codes.age(Duration::minutes(2));
    let err = check(&codes, "new@x.com", &code).await.unwrap_err();
    assert!(matches!(err, ApiError::InvalidVerificationCode));
}

#[tokio::test]
async fn should_purge_only_expired_codes() {
    let (users, codes, mailer) = (MockUserRepo::empty(), MockCodeRepo::empty(), RecordingMailer::default());
    let usecase = send_usecase(&users, &codes, &mailer);
    usecase.execute("old@x.com".to_owned()).await.unwrap();
    codes.expire_all();
    usecase.execute("new@x.com".to_owned()).await.unwrap();

    assert_eq!(codes.delete_expired().await.unwrap(), 1);
    assert!(codes.latest_for("old@x.com").is_none());
    assert!(codes.latest_for("new@x.com").is_some());
}

// ── Forgot password ──────────────────────────────────────────────────────────

#[tokio::test]
async fn should_refuse_reset_for_unknown_email() {
    let (users, codes, mailer) = (MockUserRepo::empty(), MockCodeRepo::empty(), RecordingMailer::default());

    let err = forgot_usecase(&users, &codes, &mailer)
        .execute("nobody@x.com".to_owned())
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::NotRegistered(ref e) if e == "nobody@x.com"));
    assert!(mailer.sent().is_empty());
}

#[tokio::test]
async fn should_store_reset_token_and_mail_link() {
    let (users, codes, mailer) = (MockUserRepo::empty(), MockCodeRepo::empty(), RecordingMailer::default());
    users.seed("alice", "a@x.com", "p1").await;

    forgot_usecase(&users, &codes, &mailer)
        .execute("a@x.com".to_owned())
        .await
        .unwrap();

    let token = codes.latest_for("a@x.com").unwrap().code;
    assert_eq!(test_tokens().verify_reset(&token).unwrap().email, "a@x.com");

    let sent = mailer.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].1.subject, "Reset your password");
    assert!(
        sent[0]
            .1
            .html
            .contains(&format!("{TEST_RESET_LINK_BASE}?token={token}"))
    );
}

// ── Reset password ───────────────────────────────────────────────────────────

#[tokio::test]
async fn should_replace_password_and_consume_token() {
    let (users, codes, mailer) = (MockUserRepo::empty(), MockCodeRepo::empty(), RecordingMailer::default());
    users.seed("alice", "a@x.com", "old-pass").await;
    forgot_usecase(&users, &codes, &mailer)
        .execute("a@x.com".to_owned())
        .await
        .unwrap();
    let token = codes.latest_for("a@x.com").unwrap().code;

    reset(&users, &codes, &token, "new-pass").await.unwrap();

    assert!(!can_log_in(&users, "a@x.com", "old-pass").await);
    assert!(can_log_in(&users, "a@x.com", "new-pass").await);
    assert!(codes.latest_for("a@x.com").is_none());

    let err = reset(&users, &codes, &token, "third-pass").await.unwrap_err();
    assert!(matches!(err, ApiError::InvalidResetToken));
    assert!(can_log_in(&users, "a@x.com", "new-pass").await);
}

#[tokio::test]
async fn should_reject_garbage_reset_token_with_bad_request() {
    let (users, codes) = (MockUserRepo::empty(), MockCodeRepo::empty());

    let err = reset(&users, &codes, "not.a.jwt", "new-pass").await.unwrap_err();
    assert!(matches!(err, ApiError::InvalidResetToken));
}

#[tokio::test]
async fn should_reject_reset_token_signed_with_access_secret() {
    let (users, codes) = (MockUserRepo::empty(), MockCodeRepo::empty());
    users.seed("alice", "a@x.com", "p1").await;
    // Reset tokens minted with the access secret are no longer honoured.
    let reused_secret = TokenIssuer::new(&TokenConfig::new(
        TEST_ACCESS_SECRET,
        TEST_REFRESH_SECRET,
        TEST_ACCESS_SECRET,
    ));
    let token = reused_secret.issue_reset("a@x.com").unwrap().token;
    codes
        .create(&hackers_api::domain::types::OneTimeCode::new(
            "a@x.com".to_owned(),
            token.clone(),
        ))
        .await
        .unwrap();

    let err = reset(&users, &codes, &token, "new-pass").await.unwrap_err();
    assert!(matches!(err, ApiError::InvalidResetToken));
    assert!(can_log_in(&users, "a@x.com", "p1").await);
}

#[tokio::test]
async fn should_reject_valid_token_without_stored_code() {
    let (users, codes) = (MockUserRepo::empty(), MockCodeRepo::empty());
    users.seed("alice", "a@x.com", "p1").await;
    let token = test_tokens().issue_reset("a@x.com").unwrap().token;

    let err = reset(&users, &codes, &token, "new-pass").await.unwrap_err();
    assert!(matches!(err, ApiError::InvalidResetToken));
}

#[tokio::test]
async fn should_reject_reset_once_code_expired() {
    let (users, codes, mailer) = (MockUserRepo::empty(), MockCodeRepo::empty(), RecordingMailer::default());
    users.seed("alice", "a@x.com", "p1").await;
    forgot_usecase(&users, &codes, &mailer)
        .execute("a@x.com".to_owned())
        .await
        .unwrap();
    let token = codes.latest_for("a@x.com").unwrap().code;
    codes.expire_all();

    let err = reset(&users, &codes, &token, "new-pass").await.unwrap_err();
    assert!(matches!(err, ApiError::InvalidResetToken));
}
