// src/routes.rs

use std::time::Duration;

use axum::{
    Router,
    http::{HeaderName, Method, StatusCode, header},
    middleware,
    routing::{delete, get, post, put},
};
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::{
    handlers::{question, quiz, subject},
    state::AppState,
    utils::acting_user::{USER_ID_HEADER, USER_ROLE_HEADER, acting_user_middleware},
};

/// Assembles the main application router.
///
/// * Nests the subject, question and quiz routers.
/// * Every route runs behind the acting-user middleware.
/// * Applies global middleware (Timeout, Trace, CORS).
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([
            header::CONTENT_TYPE,
            HeaderName::from_static(USER_ID_HEADER),
            HeaderName::from_static(USER_ROLE_HEADER),
        ]);

    let subject_routes = Router::new()
        .route("/subjects", get(subject::list_subjects))
        .route(
            "/subject",
            post(subject::create_subject).put(subject::update_subject),
        )
        .route("/subject/{id}", delete(subject::delete_subject))
        .route("/statistic", get(subject::get_statistic));

    let question_routes = Router::new()
        .route("/questions", get(question::list_questions))
        .route("/types", get(question::list_types))
        .route("/statuses", get(question::list_statuses))
        .route("/question", post(question::create_question))
        .route(
            "/question/{id}",
            get(question::get_question)
                .put(question::update_question)
                .delete(question::delete_question),
        )
        .route("/question/{id}/moderate", put(question::moderate_question));

    let quiz_routes = Router::new()
        .route("/quizzes", get(quiz::list_quizzes))
        .route("/quiz", post(quiz::create_quiz))
        .route("/{id}", get(quiz::get_quiz).delete(quiz::delete_quiz))
        .route("/{id}/questions", get(quiz::get_quiz_questions));

    let timeout = Duration::from_secs(state.config.request_timeout_secs);

    Router::new()
        .nest("/subjects", subject_routes)
        .nest("/questions", question_routes)
        .nest("/quizzes", quiz_routes)
        .layer(middleware::from_fn(acting_user_middleware))
        // Global Middleware (applied from outside in)
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            timeout,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
