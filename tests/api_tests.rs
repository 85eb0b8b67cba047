mod common;

use axum::{
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use common::*;
use lingo_portal::config::AppConfig;
use std::sync::Arc;

const PROTECTED: [(Method, &str); 3] = [
    (Method::POST, "/api/auth/refresh-session"),
    (Method::GET, "/api/feedback/my-feedbacks"),
    (Method::GET, "/api/words/by-level/2"),
];

fn request(method: Method, uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_health_check() {
    let repo = Arc::new(seeded_repo());
    let response = send(app(repo, AppConfig::default()), request(Method::GET, "/health", None)).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "ok");
}

#[tokio::test]
async fn test_protected_routes_reject_anonymous_without_storage_access() {
    for (method, uri) in PROTECTED {
        let repo = Arc::new(seeded_repo());
        let response = send(app(repo.clone(), production_config()), request(method, uri, None)).await;

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{uri}");
        assert_eq!(body_json(response).await, serde_json::json!({ "error": "Unauthorized" }));
        assert_eq!(repo.call_count(), 0, "{uri} touched storage without a session");
    }
}

#[tokio::test]
async fn test_protected_routes_reject_forged_token_without_storage_access() {
    let forged = token_for(&AppConfig::default(), USER_A);

    for (method, uri) in PROTECTED {
        let repo = Arc::new(seeded_repo());
        let response = send(app(repo.clone(), production_config()), request(method, uri, Some(&forged))).await;

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{uri}");
        assert_eq!(repo.call_count(), 0);
    }
}

#[tokio::test]
async fn test_refresh_session_never_returns_password() {
    let config = production_config();
    let token = token_for(&config, USER_A);
    let repo = Arc::new(seeded_repo());

    let response = send(
        app(repo, config),
        request(Method::POST, "/api/auth/refresh-session", Some(&token)),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["user"]["email"], "a@example.com");
    assert_eq!(body["user"]["preferredLanguage"], "es");
    assert_eq!(body["user"]["dailyGoal"], 20);
    assert_eq!(body["user"]["subscription"]["plan"], "pro");
    assert!(body["user"].get("password").is_none());
    assert!(!body.to_string().contains("$2b$"));
}

#[tokio::test]
async fn test_refresh_session_unknown_user_is_404() {
    let config = production_config();
    let token = token_for(&config, uuid::Uuid::from_u128(0xDEAD));

    let response = send(
        app(Arc::new(seeded_repo()), config),
        request(Method::POST, "/api/auth/refresh-session", Some(&token)),
    )
    .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await, serde_json::json!({ "error": "User not found" }));
}

#[tokio::test]
async fn test_feedback_listed_newest_first() {
    let config = production_config();
    let token = token_for(&config, USER_A);

    let response = send(
        app(Arc::new(seeded_repo()), config),
        request(Method::GET, "/api/feedback/my-feedbacks", Some(&token)),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let messages: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["message"].as_str().unwrap())
        .collect();
    assert_eq!(messages, vec!["third", "second", "first"]);
}

#[tokio::test]
async fn test_words_by_level_rejects_invalid_levels() {
    let config = production_config();
    let token = token_for(&config, USER_A);

    for level in ["0", "6", "-1", "abc", "2.5", "2abc", "%202", "99999999999"] {
        let repo = Arc::new(seeded_repo());
        let uri = format!("/api/words/by-level/{level}");
        let response = send(app(repo.clone(), config.clone()), request(Method::GET, &uri, Some(&token))).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "level {level:?}");
        assert_eq!(
            body_json(response).await,
            serde_json::json!({ "error": "Invalid level. Must be between 1 and 5" })
        );
        assert_eq!(repo.call_count(), 0);
    }
}

#[tokio::test]
async fn test_words_by_level_is_scoped_to_caller() {
    let config = production_config();
    // Seeded vocabulary: USER_A owns adios/hola (2) and gracias (4); USER_B owns perro (2) and gato (5).
    let expected: [(uuid::Uuid, [&[&str]; 5]); 2] = [
        (USER_A, [&[], &["adios", "hola"], &[], &["gracias"], &[]]),
        (USER_B, [&[], &["perro"], &[], &[], &["gato"]]),
    ];

    for (owner, by_level) in expected {
        let token = token_for(&config, owner);
        for (index, terms) in by_level.iter().enumerate() {
            let level = index + 1;
            let uri = format!("/api/words/by-level/{level}");
            let response = send(
                app(Arc::new(seeded_repo()), config.clone()),
                request(Method::GET, &uri, Some(&token)),
            )
            .await;

            assert_eq!(response.status(), StatusCode::OK);
            let body = body_json(response).await;
            let words = body.as_array().unwrap();
            let got: Vec<&str> = words.iter().map(|w| w["term"].as_str().unwrap()).collect();
            assert_eq!(got, terms.to_vec(), "owner {owner} level {level}");
            for word in words {
                assert_eq!(word["userId"], owner.to_string());
                assert_eq!(word["level"], level);
            }
        }
    }
}

#[tokio::test]
async fn test_words_by_level_orders_by_last_reviewed_with_tags() {
    let config = production_config();
    let token = token_for(&config, USER_A);

    let response = send(
        app(Arc::new(seeded_repo()), config),
        request(Method::GET, "/api/words/by-level/2", Some(&token)),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CACHE_CONTROL).unwrap(),
        "private, max-age=60"
    );
    let body = body_json(response).await;
    let terms: Vec<&str> = body.as_array().unwrap().iter().map(|w| w["term"].as_str().unwrap()).collect();
    assert_eq!(terms, vec!["adios", "hola"]);
    assert_eq!(body[0]["tags"][0]["name"], "travel");
}

#[tokio::test]
async fn test_storage_failure_is_generic_500() {
    let config = production_config();
    let token = token_for(&config, USER_A);
    let repo = Arc::new(InMemoryRepo {
        fail: true,
        ..seeded_repo()
    });

    let response = send(app(repo, config), request(Method::GET, "/api/feedback/my-feedbacks", Some(&token))).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(response.headers().get(header::CACHE_CONTROL).is_none());
    assert_eq!(body_json(response).await, serde_json::json!({ "error": "Internal server error" }));
}

#[tokio::test]
async fn test_session_cookie_is_accepted() {
    let config = production_config();
    let token = token_for(&config, USER_B);

    let request = Request::builder()
        .uri("/api/feedback/my-feedbacks")
        .header(header::COOKIE, format!("theme=dark; session={token}"))
        .body(Body::empty())
        .unwrap();
    let response = send(app(Arc::new(seeded_repo()), config), request).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["message"], "other user");
}

#[tokio::test]
async fn test_responses_carry_request_id() {
    let response = send(
        app(Arc::new(seeded_repo()), AppConfig::default()),
        request(Method::GET, "/health", None),
    )
    .await;

    assert!(response.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn test_local_bypass_storage_failure_is_generic_500() {
    let repo = Arc::new(InMemoryRepo {
        fail: true,
        ..seeded_repo()
    });
    let request = Request::builder()
        .method(Method::GET)
        .uri("/api/feedback/my-feedbacks")
        .header("x-user-id", USER_A.to_string())
        .body(Body::empty())
        .unwrap();

    let response = send(app(repo, AppConfig::default()), request).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_json(response).await, serde_json::json!({ "error": "Internal server error" }));
}
