use actix_web::{http::header, web, HttpRequest, HttpResponse};
use serde::Deserialize;

use crate::models::{ErrorResponse, QueryListResponse};
use crate::routes::AppState;
use crate::services::queries_to_csv;

/// Configure admin routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/admin")
            .route("/queries", web::get().to(list_queries))
            .route("/queries/export", web::get().to(export_queries)),
    );
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub limit: Option<usize>,
}

/// Reject the request unless it carries the configured admin token
fn authorize(state: &AppState, req: &HttpRequest) -> Result<(), HttpResponse> {
    let Some(expected) = state.admin_token.as_deref() else {
        return Ok(());
    };

    let provided = req
        .headers()
        .get("X-Admin-Token")
        .and_then(|v| v.to_str().ok());

    if provided == Some(expected) {
        Ok(())
    } else {
        tracing::warn!("Rejected admin request to {}", req.path());
        Err(HttpResponse::Unauthorized().json(ErrorResponse {
            error: "Unauthorized".to_string(),
            message: "A valid X-Admin-Token header is required".to_string(),
            status_code: 401,
        }))
    }
}

fn storage_error(e: impl std::fmt::Display) -> HttpResponse {
    tracing::error!("Failed to read query log: {}", e);
    HttpResponse::InternalServerError().json(ErrorResponse {
        error: "Failed to read query log".to_string(),
        message: "Sorry, something went wrong on our end. Please try again later.".to_string(),
        status_code: 500,
    })
}

/// List logged queries
///
/// GET /api/v1/admin/queries?limit={n}
///
/// Most recent first. `limit` is optional.
async fn list_queries(
    state: web::Data<AppState>,
    params: web::Query<ListParams>,
    req: HttpRequest,
) -> HttpResponse {
    if let Err(response) = authorize(&state, &req) {
        return response;
    }

    match state.query_log.list_all().await {
        Ok(mut queries) => {
            if let Some(limit) = params.limit {
                queries.truncate(limit);
            }
            HttpResponse::Ok().json(QueryListResponse {
                count: queries.len(),
                queries,
            })
        }
        Err(e) => storage_error(e),
    }
}

/// Export the whole query log as CSV
///
/// GET /api/v1/admin/queries/export
async fn export_queries(state: web::Data<AppState>, req: HttpRequest) -> HttpResponse {
    if let Err(response) = authorize(&state, &req) {
        return response;
    }

    match state.query_log.list_all().await {
        Ok(queries) => {
            tracing::info!("Exporting {} queries as CSV", queries.len());
            HttpResponse::Ok()
                .content_type("text/csv; charset=utf-8")
                .insert_header((
                    header::CONTENT_DISPOSITION,
                    "attachment; filename=\"queries.csv\"",
                ))
                .body(queries_to_csv(&queries))
        }
        Err(e) => storage_error(e),
    }
}
