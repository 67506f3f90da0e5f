//! Action layer behaviour against a scripted transport.

mod common;

use serde_json::json;

use common::{actions, actions_with_sign_in, authorization, json_body, session, MockTransport, UPLOAD_URL};
use qaree_gateway::actions::{Actions, BookDetails, RegisterData, UploadBundle};
use qaree_gateway::dispatch::{RequestBody, UploadPart};
use qaree_gateway::error::{TransportCause, GENERIC_FAILURE, INVALID_JSON_FAILURE};

fn register_data(email: &str) -> RegisterData {
    RegisterData {
        name: "Layla".into(),
        email: email.into(),
        password: "correct-horse".into(),
    }
}

fn book_details() -> BookDetails {
    BookDetails {
        name: "The Long Road".into(),
        description: "A novel".into(),
        publishing_rights: true,
        categories: vec!["fiction".into()],
        language: "en".into(),
    }
}

fn bundle() -> UploadBundle {
    UploadBundle {
        cover: UploadPart::new("cover.png", "image/png", vec![1, 2, 3]),
        manuscript: UploadPart::new("book.epub", "application/epub+zip", vec![4, 5, 6]),
    }
}

/// Run every GraphQL-backed action once, returning `(name, success, message)`.
/// Each action consumes exactly one scripted reply.
async fn run_graphql_actions(actions: &Actions) -> Vec<(&'static str, bool, String)> {
    let mut outcomes = Vec::new();

    macro_rules! record {
        ($name:expr, $reply:expr) => {{
            let result = $reply.into_result().expect("action should not redirect");
            outcomes.push(($name, result.success, result.message));
        }};
    }

    record!("register", actions.register(&register_data("layla@qaree.test")).await);
    record!("resend_verification_code", actions.resend_verification_code("layla@qaree.test").await);
    record!("forgot_password", actions.forgot_password("layla@qaree.test").await);
    record!("verify_account", actions.verify_account("layla@qaree.test", "123456").await);
    record!("validate_reset_code", actions.validate_reset_code("layla@qaree.test", "123456").await);
    record!("resend_reset_code", actions.resend_reset_code("layla@qaree.test").await);
    record!("reset_password", actions.reset_password("new-secret", "T").await);
    record!("add_book_details", actions.add_book_details(&book_details()).await);
    record!("publish_book", actions.publish_book("book-1").await);

    outcomes
}

#[tokio::test]
async fn test_transport_failure_never_escapes() {
    let transport = MockTransport::new();
    for _ in 0..9 {
        transport.fail(TransportCause::Connect).await;
    }
    let actions = actions(&transport, Some(session("tok")));

    let outcomes = run_graphql_actions(&actions).await;
    assert_eq!(outcomes.len(), 9);
    for (name, success, message) in outcomes {
        assert!(!success, "{} should fail", name);
        assert!(!message.trim().is_empty(), "{} needs a message", name);
    }
    assert_eq!(transport.call_count().await, 9);
}

#[tokio::test]
async fn test_upload_transport_failure_never_escapes() {
    let transport = MockTransport::new();
    transport.fail(TransportCause::Timeout).await;
    let actions = actions(&transport, Some(session("tok")));

    let result = actions.upload_files("book-1", bundle()).await.into_result().unwrap();
    assert!(!result.success);
    assert!(!result.message.is_empty());
}

#[tokio::test]
async fn test_graphql_errors_surface_first_message() {
    let transport = MockTransport::new();
    for _ in 0..9 {
        transport
            .reply_json(json!({
                "data": null,
                "errors": [{ "message": "Email already registered" }, { "message": "ignored" }]
            }))
            .await;
    }
    let actions = actions(&transport, Some(session("tok")));

    for (name, success, message) in run_graphql_actions(&actions).await {
        assert!(!success, "{} should fail", name);
        assert_eq!(message, "Email already registered", "{}", name);
    }
}

#[tokio::test]
async fn test_register_rejects_bad_email_without_network() {
    let transport = MockTransport::new();
    let actions = actions(&transport, None);

    let result = actions.register(&register_data("not-an-email")).await.into_result().unwrap();
    assert!(!result.success);
    assert!(result.message.contains("valid email"));
    assert_eq!(transport.call_count().await, 0);
}

#[tokio::test]
async fn test_register_success() {
    let transport = MockTransport::new();
    transport
        .reply_json(json!({ "data": { "signup": { "message": "Check your inbox" } } }))
        .await;
    let actions = actions(&transport, None);

    let result = actions.register(&register_data("layla@qaree.test")).await.into_result().unwrap();
    assert!(result.success);
    assert_eq!(result.message, "Check your inbox");

    let request = &transport.requests().await[0];
    assert_eq!(json_body(request)["variables"]["email"], "layla@qaree.test");
    assert!(authorization(request).is_none());
}

#[tokio::test]
async fn test_register_null_payload_fails() {
    let transport = MockTransport::new();
    transport.reply_json(json!({ "data": { "signup": null } })).await;
    let actions = actions(&transport, None);

    let result = actions.register(&register_data("layla@qaree.test")).await.into_result().unwrap();
    assert!(!result.success);
    assert_eq!(result.message, "Failed to sign up");
}

#[tokio::test]
async fn test_payload_success_flag_is_checked() {
    let transport = MockTransport::new();
    transport
        .reply_json(json!({ "data": { "resendValidatingOTP": { "success": false, "message": "OTP resend failed" } } }))
        .await;
    transport
        .reply_json(json!({ "data": { "resendValidatingOTP": { "success": false, "message": null } } }))
        .await;
    let actions = actions(&transport, None);

    let first = actions.resend_verification_code("a@qaree.test").await.into_result().unwrap();
    assert!(!first.success);
    assert_eq!(first.message, "OTP resend failed");

    let second = actions.resend_verification_code("a@qaree.test").await.into_result().unwrap();
    assert!(!second.success);
    assert_eq!(second.message, "Failed to resend the OTP code please try again.");
}

#[tokio::test]
async fn test_null_success_flag_keeps_server_message() {
    let transport = MockTransport::new();
    for field in ["verifyAccount", "resendValidatingOTP", "forgetPassword", "resendResetPasswordOTP"] {
        transport
            .reply_json(json!({ "data": { (field): { "success": null, "message": "Invalid OTP" } } }))
            .await;
    }
    let actions = actions(&transport, None);

    let replies = vec![
        actions.verify_account("a@b.com", "000000").await,
        actions.resend_verification_code("a@b.com").await,
        actions.forgot_password("a@b.com").await,
        actions.resend_reset_code("a@b.com").await,
    ];
    for reply in replies {
        let result = reply.into_result().unwrap();
        assert!(!result.success);
        assert_eq!(result.message, "Invalid OTP");
    }
}

#[tokio::test]
async fn test_forgot_password_requires_email() {
    let transport = MockTransport::new();
    let actions = actions(&transport, None);

    let result = actions.forgot_password("  ").await.into_result().unwrap();
    assert!(!result.success);
    assert_eq!(result.message, "Invalid email");
    assert_eq!(transport.call_count().await, 0);
}

#[tokio::test]
async fn test_forgot_password_defaults_message() {
    let transport = MockTransport::new();
    transport
        .reply_json(json!({ "data": { "forgetPassword": { "success": true } } }))
        .await;
    let actions = actions(&transport, None);

    let result = actions.forgot_password("a@qaree.test").await.into_result().unwrap();
    assert!(result.success);
    assert_eq!(result.message, "success");
}

#[tokio::test]
async fn test_verify_account() {
    let transport = MockTransport::new();
    transport
        .reply_json(json!({ "data": { "verifyAccount": { "success": true, "message": "Account verified" } } }))
        .await;
    let actions = actions(&transport, None);

    let reply = actions.verify_account("a@qaree.test", "654321").await;
    assert!(reply.is_success());

    let body = json_body(&transport.requests().await[0]);
    assert_eq!(body["variables"], json!({ "email": "a@qaree.test", "otp": "654321" }));
}

#[tokio::test]
async fn test_validate_reset_code_redirects_with_token() {
    let transport = MockTransport::new();
    transport
        .reply_json(json!({
            "data": { "validateResetPasswordOTP": { "success": true, "message": "ok", "reset_token": "eyJ.tok-EN_1" } }
        }))
        .await;
    let actions = actions(&transport, None);

    let reply = actions.validate_reset_code("reader@qaree.test", "111111").await;
    assert!(reply.result().is_none(), "a validated code never returns a result");
    assert_eq!(
        reply.redirect().unwrap().location,
        "/signin/reset-password/eyJ.tok-EN_1?email=reader@qaree.test"
    );
}

#[tokio::test]
async fn test_validate_reset_code_null_success_keeps_server_message() {
    let transport = MockTransport::new();
    transport
        .reply_json(json!({
            "data": { "validateResetPasswordOTP": { "success": null, "message": "Invalid OTP", "reset_token": null } }
        }))
        .await;
    let actions = actions(&transport, None);

    let result = actions.validate_reset_code("a@b.com", "000000").await.into_result().unwrap();
    assert!(!result.success);
    assert_eq!(result.message, "Invalid OTP");
}

#[tokio::test]
async fn test_validate_reset_code_failure_returns_result() {
    let transport = MockTransport::new();
    transport
        .reply_json(json!({ "data": { "validateResetPasswordOTP": { "success": false, "message": "Invalid code" } } }))
        .await;
    transport
        .reply_json(json!({ "data": { "validateResetPasswordOTP": { "success": true } } }))
        .await;
    let actions = actions(&transport, None);

    let wrong_code = actions.validate_reset_code("a@qaree.test", "000000").await.into_result().unwrap();
    assert_eq!(wrong_code.message, "Invalid code");

    let missing_token = actions.validate_reset_code("a@qaree.test", "000000").await.into_result().unwrap();
    assert!(!missing_token.success);
    assert_eq!(missing_token.message, "Invalid Server Response");
}

#[tokio::test]
async fn test_resend_reset_code_default_message() {
    let transport = MockTransport::new();
    transport
        .reply_json(json!({ "data": { "resendResetPasswordOTP": { "success": true, "message": "" } } }))
        .await;
    let actions = actions(&transport, None);

    let result = actions.resend_reset_code("a@qaree.test").await.into_result().unwrap();
    assert!(result.success);
    assert_eq!(result.message, "Code sent successfully");
}

#[tokio::test]
async fn test_reset_password_uses_reset_token() {
    let transport = MockTransport::new();
    transport
        .reply_json(json!({ "data": { "resetPassword": { "message": "Password updated" } } }))
        .await;
    let actions = actions(&transport, Some(session("ambient-session-token")));

    let result = actions.reset_password("x", "T").await.into_result().unwrap();
    assert!(result.success);
    assert_eq!(result.message, "Password updated");

    let request = &transport.requests().await[0];
    assert_eq!(authorization(request), Some("Bearer T"));
    assert_eq!(json_body(request)["variables"], json!({ "newPassword": "x" }));
}

#[tokio::test]
async fn test_reset_password_without_message_fails() {
    let transport = MockTransport::new();
    transport.reply_json(json!({ "data": { "resetPassword": {} } })).await;
    let actions = actions(&transport, None);

    let result = actions.reset_password("x", "T").await.into_result().unwrap();
    assert!(!result.success);
    assert_eq!(result.message, "Failed to Reset Password");
}

#[tokio::test]
async fn test_protected_actions_redirect_without_session() {
    let transport = MockTransport::new();
    let actions = actions_with_sign_in(&transport, None, "/login");

    let add = actions.add_book_details(&book_details()).await;
    let publish = actions.publish_book("book-1").await;
    let upload = actions.upload_files("book-1", bundle()).await;

    assert_eq!(add.redirect().unwrap().location, "/login");
    assert_eq!(publish.redirect().unwrap().location, "/login");
    assert_eq!(upload.redirect().unwrap().location, "/login");
    assert_eq!(transport.call_count().await, 0);
}

#[tokio::test]
async fn test_add_book_details_returns_record() {
    let transport = MockTransport::new();
    transport
        .reply_json(json!({
            "data": { "addBookDetails": {
                "_id": "b-42",
                "name": "The Long Road",
                "description": "A novel",
                "edition": 1,
                "isbn": null,
                "author": { "_id": "user-1", "name": "Author" },
                "price": 0,
                "createdAt": "2024-05-01T00:00:00Z",
                "updatedAt": "2024-05-01T00:00:00Z",
                "status": "draft"
            } }
        }))
        .await;
    let actions = actions(&transport, Some(session("tok")));

    let result = actions.add_book_details(&book_details()).await.into_result().unwrap();
    assert!(result.success);
    assert_eq!(result.message, "Success");
    let book = result.data.unwrap();
    assert_eq!(book.id, "b-42");
    assert_eq!(book.status.as_deref(), Some("draft"));

    let request = &transport.requests().await[0];
    assert_eq!(authorization(request), Some("Bearer tok"));
    assert_eq!(json_body(request)["variables"]["publishingRights"], true);
}

#[tokio::test]
async fn test_publish_book() {
    let transport = MockTransport::new();
    transport
        .reply_json(json!({ "data": { "publishBook": { "message": "Book published", "book": { "_id": "b-1" } } } }))
        .await;
    let actions = actions(&transport, Some(session("tok")));

    let result = actions.publish_book("b-1").await.into_result().unwrap();
    assert!(result.success);
    assert_eq!(result.message, "Book published");
    assert!(result.data.is_none());
}

#[tokio::test]
async fn test_upload_files_is_sequential() {
    let transport = MockTransport::new();
    transport.reply(200, "{}").await;
    transport.reply(201, "{}").await;
    let actions = actions(&transport, Some(session("tok")));

    let result = actions.upload_files("b-1", bundle()).await.into_result().unwrap();
    assert!(result.success);

    let cover = format!("{}/cover/b-1", UPLOAD_URL);
    let file = format!("{}/file/b-1", UPLOAD_URL);
    assert_eq!(
        transport.events().await,
        vec![
            format!("start:{}", cover),
            format!("end:{}", cover),
            format!("start:{}", file),
            format!("end:{}", file),
        ]
    );

    for request in transport.requests().await {
        assert_eq!(authorization(&request), Some("Bearer tok"));
        assert!(matches!(request.body, RequestBody::Multipart(ref parts) if parts.len() == 1));
    }
}

#[tokio::test]
async fn test_upload_second_failure_keeps_first() {
    let transport = MockTransport::new();
    transport.reply(200, "{}").await;
    transport.reply(413, r#"{"message":"File too large"}"#).await;
    let actions = actions(&transport, Some(session("tok")));

    let result = actions.upload_files("b-1", bundle()).await.into_result().unwrap();
    assert!(!result.success);
    assert_eq!(result.message, "File too large");
    // no rollback call for the cover
    assert_eq!(transport.call_count().await, 2);
}

#[tokio::test]
async fn test_upload_first_failure() {
    let transport = MockTransport::new();
    transport.reply(500, "<html>oops</html>").await;
    let actions = actions(&transport, Some(session("tok")));

    let result = actions.upload_files("b-1", bundle()).await.into_result().unwrap();
    assert!(!result.success);
    assert_eq!(result.message, "Failed to upload the cover image");
}

#[tokio::test]
async fn test_malformed_response_uses_generic_message() {
    let transport = MockTransport::new();
    transport.reply(200, "definitely not json").await;
    let actions = actions(&transport, Some(session("tok")));

    let result = actions.publish_book("b-1").await.into_result().unwrap();
    assert!(!result.success);
    assert_eq!(result.message, GENERIC_FAILURE);
}

#[tokio::test]
async fn test_gateway_error_page_has_distinct_message() {
    let transport = MockTransport::new();
    transport.reply(502, "<!doctype html><title>502 Bad Gateway</title>").await;
    let actions = actions(&transport, None);

    let result = actions.verify_account("a@qaree.test", "1").await.into_result().unwrap();
    assert!(!result.success);
    assert_eq!(result.message, INVALID_JSON_FAILURE);
}

#[tokio::test]
async fn test_repeated_action_is_not_cached() {
    let transport = MockTransport::new();
    for _ in 0..2 {
        transport
            .reply_json(json!({ "data": { "verifyAccount": { "success": true, "message": "Verified" } } }))
            .await;
    }
    let actions = actions(&transport, None);

    assert!(actions.verify_account("a@qaree.test", "1").await.is_success());
    assert!(actions.verify_account("a@qaree.test", "1").await.is_success());

    let requests = transport.requests().await;
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0], requests[1]);
}
