use actix_web::{
    body::MessageBody,
    http::StatusCode,
    test,
    test::TestRequest,
    web,
    web::ServiceConfig,
    App,
};
use backoffice_engine::{
    db_types::{Principal, Role, StaffStatus},
    helpers::hash_password,
    AuthApi,
};
use serde_json::{json, Value};

use super::mocks::*;
use crate::{
    auth::TokenIssuer,
    config::PublicUrls,
    middleware::AuthnMiddlewareFactory,
    routes::{
        CountUsersRoute,
        ForgotPasswordRoute,
        ListUsersRoute,
        LoginRoute,
        RegisterRoute,
        ResetPasswordRoute,
    },
};

const PASSWORD: &str = "Str0ng!pass";

fn configure_app(
    api_mock: MockBackend,
    resolver_mock: MockBackend,
    mailer: MockMailSender,
) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        let auth_api = AuthApi::new(api_mock);
        let signer = TokenIssuer::new(&test_auth_config());
        let verifier = test_verifier();
        let authn = AuthnMiddlewareFactory::new(AuthApi::new(resolver_mock), verifier.clone());
        cfg.app_data(web::Data::new(auth_api))
            .app_data(web::Data::new(signer))
            .app_data(web::Data::new(verifier))
            .app_data(web::Data::new(mailer))
            .app_data(web::Data::new(PublicUrls { client_url: "http://localhost:8080".to_string() }))
            .service(
                web::scope("/auth")
                    .service(RegisterRoute::<MockBackend, MockMailSender>::new())
                    .service(LoginRoute::<MockBackend>::new())
                    .service(ForgotPasswordRoute::<MockBackend, MockMailSender>::new())
                    .service(ResetPasswordRoute::<MockBackend>::new())
                    .service(
                        web::scope("/users")
                            .wrap(authn)
                            .service(CountUsersRoute::<MockBackend>::new())
                            .service(ListUsersRoute::<MockBackend>::new()),
                    ),
            );
    }
}

async fn send_json(
    api_mock: MockBackend,
    resolver_mock: MockBackend,
    mailer: MockMailSender,
    req: TestRequest,
) -> (StatusCode, String) {
    backoffice_engine::test_utils::prepare_env();
    let app = App::new().configure(configure_app(api_mock, resolver_mock, mailer));
    let app = test::init_service(app).await;
    // Middleware that rejects a request returns `Err(actix_web::Error)`; in production the HTTP
    // dispatcher renders it via `ResponseError`, but `test::call_service` would panic on it, so
    // render the error response here the same way the dispatcher does.
    let res = match test::try_call_service(&app, req.to_request()).await {
        Ok(res) => res.into_parts().1,
        Err(err) => err.error_response(),
    };
    let status = res.status();
    let body = String::from_utf8_lossy(&res.into_body().try_into_bytes().unwrap()).into_owned();
    (status, body)
}

#[actix_web::test]
async fn register_creates_an_account() {
    let mut api = MockBackend::new();
    api.expect_insert_user().returning(|new| {
        let mut user = make_user("u1", Role::User);
        user.email = new.email;
        user.password_hash = new.password_hash;
        Ok(user)
    });
    let mut mailer = MockMailSender::new();
    mailer.expect_send().returning(|_, _, _| Ok(()));
    let req = TestRequest::post()
        .uri("/auth/register")
        .set_json(json!({ "email": "New.User@Example.com", "password": PASSWORD }));
    let (status, body) = send_json(api, MockBackend::new(), mailer, req).await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(body.contains("User registered successfully"), "was: {body}");
}

#[actix_web::test]
async fn register_rejects_duplicates() {
    let mut api = MockBackend::new();
    api.expect_insert_user().returning(|_| Err(backoffice_engine::AuthApiError::DuplicateAccount));
    let req = TestRequest::post()
        .uri("/auth/register")
        .set_json(json!({ "email": "dup@example.com", "password": PASSWORD }));
    let (status, body) = send_json(api, MockBackend::new(), MockMailSender::new(), req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("already exists"), "was: {body}");
}

#[actix_web::test]
async fn register_rejects_malformed_emails() {
    let req = TestRequest::post()
        .uri("/auth/register")
        .set_json(json!({ "email": "not-an-email", "password": PASSWORD }));
    let (status, body) = send_json(MockBackend::new(), MockBackend::new(), MockMailSender::new(), req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("Invalid email format"), "was: {body}");
}

#[actix_web::test]
async fn login_returns_a_verifiable_token() {
    let mut api = MockBackend::new();
    let mut user = make_user("u1", Role::User);
    user.password_hash = Some(hash_password(PASSWORD).unwrap());
    let stored = user.clone();
    api.expect_fetch_user_by_email().returning(move |_| Ok(Some(stored.clone())));
    let req = TestRequest::post()
        .uri("/auth/login")
        .set_json(json!({ "email": "u1@example.com", "password": PASSWORD }));
    let (status, body) = send_json(api, MockBackend::new(), MockMailSender::new(), req).await;
    assert!(status.is_success());
    let value: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(value["redirect"], "/user");
    assert_eq!(value["user"]["email"], "u1@example.com");
    let token = value["token"].as_str().unwrap();
    let claims = test_verifier().verify_access_token(token).unwrap();
    assert_eq!(claims.sub, user.id);
    assert_eq!(claims.role, Role::User);
}

#[actix_web::test]
async fn login_with_a_wrong_password_is_rejected() {
    let mut api = MockBackend::new();
    let mut user = make_user("u1", Role::User);
    user.password_hash = Some(hash_password(PASSWORD).unwrap());
    api.expect_fetch_user_by_email().returning(move |_| Ok(Some(user.clone())));
    let req = TestRequest::post()
        .uri("/auth/login")
        .set_json(json!({ "email": "u1@example.com", "password": "Wr0ng!pass" }));
    let (status, body) = send_json(api, MockBackend::new(), MockMailSender::new(), req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("Invalid email or password"), "was: {body}");
}

#[actix_web::test]
async fn inactive_workers_cannot_login() {
    let mut api = MockBackend::new();
    api.expect_fetch_user_by_email().returning(|_| Ok(None));
    let mut staff = make_staff("w1", StaffStatus::Pending);
    staff.password_hash = Some(hash_password(PASSWORD).unwrap());
    api.expect_fetch_staff_by_email().returning(move |_| Ok(Some(staff.clone())));
    let req = TestRequest::post()
        .uri("/auth/login")
        .set_json(json!({ "email": "w1@example.com", "password": PASSWORD }));
    let (status, body) = send_json(api, MockBackend::new(), MockMailSender::new(), req).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body.contains("not active"), "was: {body}");
}

#[actix_web::test]
async fn forgot_password_answers_identically_for_unknown_emails() {
    let mut api = MockBackend::new();
    api.expect_upsert_reset_ticket().returning(|_, _, _| Ok(false));
    let mut mailer = MockMailSender::new();
    mailer.expect_send().times(0);
    let req =
        TestRequest::post().uri("/auth/forgot-password").set_json(json!({ "email": "ghost@example.com" }));
    let (status, body) = send_json(api, MockBackend::new(), mailer, req).await;
    assert!(status.is_success());
    assert!(body.contains("If that email is registered, a reset link has been sent."), "was: {body}");
}

#[actix_web::test]
async fn forgot_password_emails_a_reset_link_for_known_emails() {
    let mut api = MockBackend::new();
    api.expect_upsert_reset_ticket().returning(|_, _, _| Ok(true));
    let mut mailer = MockMailSender::new();
    mailer
        .expect_send()
        .withf(|to, subject, html| {
            to == "known@example.com" && subject.contains("Password Reset") && html.contains("reset-password?")
        })
        .times(1)
        .returning(|_, _, _| Ok(()));
    let req =
        TestRequest::post().uri("/auth/forgot-password").set_json(json!({ "email": "known@example.com" }));
    let (status, body) = send_json(api, MockBackend::new(), mailer, req).await;
    assert!(status.is_success());
    assert!(body.contains("If that email is registered, a reset link has been sent."), "was: {body}");
}

#[actix_web::test]
async fn reset_password_rejects_stale_tickets() {
    let mut api = MockBackend::new();
    api.expect_redeem_reset_ticket().returning(|_, _, _, _| Ok(false));
    let req = TestRequest::post().uri("/auth/reset-password").set_json(json!({
        "token": "deadbeef",
        "email": "u1@example.com",
        "password": "N3w!passw",
    }));
    let (status, body) = send_json(api, MockBackend::new(), MockMailSender::new(), req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("Invalid or expired token"), "was: {body}");
}

#[actix_web::test]
async fn listing_users_without_a_token_is_unauthorized() {
    let req = TestRequest::get().uri("/auth/users");
    let (status, _) = send_json(MockBackend::new(), MockBackend::new(), MockMailSender::new(), req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn listing_users_requires_the_admin_role() {
    let mut resolver = MockBackend::new();
    resolver.expect_fetch_staff_by_id().returning(|_| Ok(None));
    let user = make_user("u1", Role::User);
    let token = token_for(&Principal::User(user.clone()));
    resolver.expect_fetch_user_by_id().returning(move |_| Ok(Some(user.clone())));
    let req = TestRequest::get().uri("/auth/users").insert_header(("Authorization", format!("Bearer {token}")));
    let (status, _) = send_json(MockBackend::new(), resolver, MockMailSender::new(), req).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn admins_can_list_users() {
    let mut resolver = MockBackend::new();
    resolver.expect_fetch_staff_by_id().returning(|_| Ok(None));
    let admin = make_user("a1", Role::Admin);
    let token = token_for(&Principal::User(admin.clone()));
    resolver.expect_fetch_user_by_id().returning(move |_| Ok(Some(admin.clone())));
    let mut api = MockBackend::new();
    api.expect_fetch_all_users().returning(|| Ok(vec![make_user("u1", Role::User)]));
    let req = TestRequest::get().uri("/auth/users").insert_header(("Authorization", format!("Bearer {token}")));
    let (status, body) = send_json(api, resolver, MockMailSender::new(), req).await;
    assert!(status.is_success());
    assert!(body.contains("u1@example.com"), "was: {body}");
}

#[actix_web::test]
async fn tampered_tokens_are_rejected() {
    let admin = make_user("a1", Role::Admin);
    let token = token_for(&Principal::User(admin));
    let mut tampered = token.clone();
    tampered.replace_range(tampered.len() - 4.., "AAAA");
    let req =
        TestRequest::get().uri("/auth/users").insert_header(("Authorization", format!("Bearer {tampered}")));
    let (status, _) = send_json(MockBackend::new(), MockBackend::new(), MockMailSender::new(), req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
