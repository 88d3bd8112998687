use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

mod auth;
mod bookings;
mod companions;
mod health;

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Auth routes
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        // Catalog
        .route("/companions", get(companions::list_available))
        .route("/companions/:id", get(companions::get))
        // Booking lifecycle
        .route("/bookings", post(bookings::create).get(bookings::list_mine))
        .route("/bookings/active", get(bookings::list_active))
        .route("/bookings/:id/status", post(bookings::transition))
        .route("/bookings/:id/refund-quote", get(bookings::refund_quote))
        // Admin panel
        .route(
            "/admin/companions",
            get(companions::list_all).post(companions::create),
        )
        .route(
            "/admin/companions/:id",
            put(companions::update).delete(companions::delete),
        )
        .route("/admin/bookings", get(bookings::list_all))
        .route("/admin/bookings/:id", axum::routing::delete(bookings::delete))
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        clock::FixedClock,
        config::Config,
        db::Database,
        notify::{BookingNotification, Notifier},
    };
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
    };
    use chrono::{TimeZone, Utc};
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tokio::sync::mpsc;
    use tower::ServiceExt;

    async fn app() -> (Router, mpsc::Receiver<BookingNotification>) {
        let db = Database::in_memory().await.unwrap();
        let mut config = Config::default();
        config.auth.jwt_secret = "router-test-secret".to_string();
        config.auth.admin_emails = vec!["ops@sathi.in".to_string()];

        // 12:00 IST on 2026-10-17
        let clock = FixedClock(Utc.with_ymd_and_hms(2026, 10, 17, 6, 30, 0).unwrap());
        let (notifier, rx) = Notifier::channel(8);
        let state = AppState::new(db, config, notifier, Arc::new(clock)).unwrap();
        (create_router(state), rx)
    }

    async fn send(
        app: &Router,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .unwrap();

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    async fn register(app: &Router, email: &str) -> (String, Value) {
        let (status, body) = send(
            app,
            "POST",
            "/auth/register",
            None,
            Some(json!({ "email": email, "password": "hunter22" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        (body["token"].as_str().unwrap().to_string(), body)
    }

    fn companion_body() -> Value {
        json!({
            "name": "Meera",
            "city": "Hyderabad",
            "energy_type": "calm_listener",
            "hourly_rate": 500,
            "is_verified": true,
            "rating": 4.9,
            "languages": ["Telugu", "Hindi"]
        })
    }

    fn booking_body(companion_id: &str) -> Value {
        json!({
            "companion_id": companion_id,
            "booking_date": "2026-10-20",
            "start_time": "18:00:00",
            "duration_hours": 3,
            "venue_name": "Roastery Coffee House",
            "venue_address": "Banjara Hills",
            "presence_nature": "cafe_companion",
            "phone": "+91 98765 43210"
        })
    }

    #[tokio::test]
    async fn health_is_public() {
        let (app, _rx) = app().await;
        let (status, body) = send(&app, "GET", "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn booking_flow_end_to_end() {
        let (app, mut rx) = app().await;
        let (admin, admin_body) = register(&app, "ops@sathi.in").await;
        assert_eq!(admin_body["role"], "admin");
        let (client, client_body) = register(&app, "Ravi@Example.com").await;
        assert_eq!(client_body["role"], "user");

        // Catalog management is admin-only
        let (status, _) = send(&app, "POST", "/admin/companions", None, Some(companion_body())).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        let (status, _) =
            send(&app, "POST", "/admin/companions", Some(&client), Some(companion_body())).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        let (status, companion) =
            send(&app, "POST", "/admin/companions", Some(&admin), Some(companion_body())).await;
        assert_eq!(status, StatusCode::CREATED);
        let companion_id = companion["id"].as_str().unwrap().to_string();

        // Public catalog filtering
        let (_, found) = send(&app, "GET", "/companions?search=HYDER", None, None).await;
        assert_eq!(found.as_array().unwrap().len(), 1);
        let (_, found) =
            send(&app, "GET", "/companions?energy_type=silent_observant", None, None).await;
        assert!(found.as_array().unwrap().is_empty());

        // Create
        let (status, booking) =
            send(&app, "POST", "/bookings", Some(&client), Some(booking_body(&companion_id))).await;
        assert_eq!(status, StatusCode::CREATED, "{booking}");
        assert_eq!(booking["total_amount"], 1500);
        assert_eq!(booking["status"], "pending");
        let booking_id = booking["id"].as_str().unwrap().to_string();

        let notice = rx.try_recv().unwrap();
        assert_eq!(notice.booking_id, booking_id);
        assert_eq!(notice.client_name, "ravi@example.com");
        assert_eq!(notice.companion_name, "Meera");

        // Clients cannot confirm
        let status_uri = format!("/bookings/{booking_id}/status");
        let (status, _) = send(
            &app,
            "POST",
            &status_uri,
            Some(&client),
            Some(json!({ "status": "confirmed" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        // Quote then cancel, three days ahead
        let (status, quote) = send(
            &app,
            "GET",
            &format!("/bookings/{booking_id}/refund-quote"),
            Some(&client),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(quote["refund_percent"], 100);

        let (status, cancelled) = send(
            &app,
            "POST",
            &status_uri,
            Some(&client),
            Some(json!({ "status": "cancelled" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(cancelled["booking"]["status"], "cancelled");
        assert_eq!(cancelled["refund"]["refund_amount"], 1500);

        let (status, _) = send(
            &app,
            "POST",
            &status_uri,
            Some(&client),
            Some(json!({ "status": "cancelled" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        // Dashboards
        let (_, mine) = send(&app, "GET", "/bookings", Some(&client), None).await;
        assert_eq!(mine.as_array().unwrap().len(), 1);
        assert_eq!(mine[0]["companion_name"], "Meera");

        let (status, _) = send(&app, "GET", "/admin/bookings", Some(&client), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        let (status, all) = send(&app, "GET", "/admin/bookings", Some(&admin), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(all[0]["id"], booking_id.as_str());
        assert_eq!(all[0]["companion_name"], "Meera");
        assert_eq!(all[0]["client_email"], "ravi@example.com");

        // Admin override out of a terminal state
        let (status, revived) = send(
            &app,
            "POST",
            &status_uri,
            Some(&admin),
            Some(json!({ "status": "confirmed" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(revived["booking"]["status"], "confirmed");
        assert!(revived.get("refund").is_none());

        // Admin delete bypasses the lifecycle
        let delete_uri = format!("/admin/bookings/{booking_id}");
        let (status, _) = send(&app, "DELETE", &delete_uri, Some(&admin), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = send(&app, "DELETE", &delete_uri, Some(&admin), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn active_bookings_list_only_confirmed_upcoming_sessions() {
        let (app, _rx) = app().await;
        let (admin, _) = register(&app, "ops@sathi.in").await;
        let (client, _) = register(&app, "ravi@example.com").await;
        let (_, companion) =
            send(&app, "POST", "/admin/companions", Some(&admin), Some(companion_body())).await;
        let companion_id = companion["id"].as_str().unwrap();

        let (_, booking) =
            send(&app, "POST", "/bookings", Some(&client), Some(booking_body(companion_id))).await;
        let booking_id = booking["id"].as_str().unwrap();

        let (status, active) = send(&app, "GET", "/bookings/active", Some(&client), None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(active.as_array().unwrap().is_empty());

        send(
            &app,
            "POST",
            &format!("/bookings/{booking_id}/status"),
            Some(&admin),
            Some(json!({ "status": "confirmed" })),
        )
        .await;

        let (_, active) = send(&app, "GET", "/bookings/active", Some(&client), None).await;
        assert_eq!(active.as_array().unwrap().len(), 1);
        assert_eq!(active[0]["id"], booking_id);
        assert_eq!(active[0]["companion_name"], "Meera");

        let (status, _) = send(&app, "GET", "/bookings/active", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn booking_errors_surface_with_their_status() {
        let (app, _rx) = app().await;
        let (admin, _) = register(&app, "ops@sathi.in").await;

        let mut unavailable = companion_body();
        unavailable["is_available"] = json!(false);
        let (_, companion) =
            send(&app, "POST", "/admin/companions", Some(&admin), Some(unavailable)).await;
        let companion_id = companion["id"].as_str().unwrap();

        let (status, body) =
            send(&app, "POST", "/bookings", Some(&admin), Some(booking_body(companion_id))).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert!(body["error"].as_str().unwrap().contains("not available"));

        let mut past = booking_body(companion_id);
        past["booking_date"] = json!("2026-10-01");
        let (status, _) = send(&app, "POST", "/bookings", Some(&admin), Some(past)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let mut bad_nature = booking_body(companion_id);
        bad_nature["presence_nature"] = json!("nightclub");
        let (status, _) = send(&app, "POST", "/bookings", Some(&admin), Some(bad_nature)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let (status, _) = send(&app, "POST", "/bookings", None, Some(booking_body(companion_id))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn companion_admin_validation_and_updates() {
        let (app, _rx) = app().await;
        let (admin, _) = register(&app, "ops@sathi.in").await;

        let mut bad = companion_body();
        bad["hourly_rate"] = json!(0);
        let (status, _) = send(&app, "POST", "/admin/companions", Some(&admin), Some(bad)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (_, created) =
            send(&app, "POST", "/admin/companions", Some(&admin), Some(companion_body())).await;
        let id = created["id"].as_str().unwrap();

        let mut edit = companion_body();
        edit["hourly_rate"] = json!(700);
        edit["is_available"] = json!(false);
        let (status, updated) = send(
            &app,
            "PUT",
            &format!("/admin/companions/{id}"),
            Some(&admin),
            Some(edit),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["hourly_rate"], 700);
        assert_eq!(updated["created_at"], created["created_at"]);

        // No longer listed publicly, still visible to admins
        let (_, public) = send(&app, "GET", "/companions", None, None).await;
        assert!(public.as_array().unwrap().is_empty());
        let (_, all) = send(&app, "GET", "/admin/companions", Some(&admin), None).await;
        assert_eq!(all.as_array().unwrap().len(), 1);

        let (status, _) =
            send(&app, "DELETE", &format!("/admin/companions/{id}"), Some(&admin), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = send(&app, "GET", &format!("/companions/{id}"), None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn login_checks_password_and_reports_role() {
        let (app, _rx) = app().await;
        register(&app, "ops@sathi.in").await;

        let (status, _) = send(
            &app,
            "POST",
            "/auth/login",
            None,
            Some(json!({ "email": "ops@sathi.in", "password": "wrong-password" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, body) = send(
            &app,
            "POST",
            "/auth/login",
            None,
            Some(json!({ "email": "OPS@sathi.in", "password": "hunter22" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["role"], "admin");

        let (status, _) = send(
            &app,
            "POST",
            "/auth/register",
            None,
            Some(json!({ "email": "ops@sathi.in", "password": "hunter22" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
