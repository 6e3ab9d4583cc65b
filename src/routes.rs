// src/routes.rs

use axum::{
    Router, http::Method, middleware,
    routing::{get, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{auth, catalog, exam, results},
    state::AppState,
    utils::jwt::{auth_middleware, student_middleware, teacher_middleware},
};

/// Assembles the main application router.
///
/// * Merges all sub-routers (auth, catalog, exam, results).
/// * Role-guards the teacher and student route groups.
/// * Applies global middleware (Trace, CORS).
/// * Injects global state (pool, config, session table).
pub fn create_router(state: AppState) -> Router {
    let origins = [
        "http://localhost:3000".parse().unwrap(),
        "http://127.0.0.1:3000".parse().unwrap(),
    ];

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
        ]);

    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login));

    // Teacher-only surface: authoring, rosters, results, export.
    // Double middleware protection: Auth first, then role check.
    let teacher_routes = Router::new()
        .route("/students", post(auth::add_student))
        .route("/tests", post(catalog::create_test))
        .route(
            "/tests/{id}/questions",
            post(catalog::add_questions).get(catalog::list_questions),
        )
        .route("/results/teacher", get(results::teacher_results))
        .route("/results/export", get(results::export_results))
        .layer(middleware::from_fn(teacher_middleware))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    // Student-only surface: taking tests and viewing own results.
    let student_routes = Router::new()
        .route("/tests/available", get(catalog::available_tests))
        .route("/exam/start", post(exam::start_exam))
        .route("/exam/answer", post(exam::submit_answer))
        .route("/results/student", get(results::student_results))
        .layer(middleware::from_fn(student_middleware))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .nest("/api/auth", auth_routes)
        .nest("/api", teacher_routes.merge(student_routes))
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
