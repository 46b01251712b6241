use actix_web::{web, HttpResponse, Responder};
use serde_json::json;
use crate::api::handlers::{
    commit::{
        apply_filters,
        restore_defaults,
        get_commit_status,
    },
    filters::{
        list_filters,
        add_filter,
        remove_last_filter,
        import_defaults,
    },
};

/// Root endpoint to provide information about the API
async fn index() -> impl Responder {
    HttpResponse::Ok().json(json!({
        "name": "pfoffload API",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Packet filter offload configuration with staged commits",
        "endpoints": [
            {
                "path": "/api/filters",
                "method": "GET",
                "description": "Get the active and pending filter lists"
            },
            {
                "path": "/api/filters",
                "method": "POST",
                "description": "Add a filter to the pending list (form encoded)"
            },
            {
                "path": "/api/filters/last",
                "method": "DELETE",
                "description": "Remove the last pending filter"
            },
            {
                "path": "/api/filters/import-defaults",
                "method": "POST",
                "description": "Replace the pending list with the factory defaults"
            },
            {
                "path": "/api/filters/apply",
                "method": "POST",
                "description": "Commit the pending list"
            },
            {
                "path": "/api/filters/restore-defaults",
                "method": "POST",
                "description": "Commit and activate the factory defaults"
            },
            {
                "path": "/api/commit/status",
                "method": "GET",
                "description": "Get progress of the latest commit"
            }
        ]
    }))
}

/// Configure API routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        // Root endpoint
        .route("/", web::get().to(index))
        .service(
            web::scope("/api")
                // Pending list editing
                .service(
                    web::scope("/filters")
                        .route("", web::get().to(list_filters))
                        .route("", web::post().to(add_filter))
                        .route("/last", web::delete().to(remove_last_filter))
                        .route("/import-defaults", web::post().to(import_defaults))
                        .route("/apply", web::post().to(apply_filters))
                        .route("/restore-defaults", web::post().to(restore_defaults))
                )
                // Commit progress
                .service(
                    web::scope("/commit")
                        .route("/status", web::get().to(get_commit_status))
                )
        );
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{test, App};
    use serde_json::Value;

    #[actix_web::test]
    async fn index_lists_endpoints() {
        let app = test::init_service(App::new().configure(configure)).await;
        let req = test::TestRequest::get().uri("/").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["endpoints"].as_array().map(Vec::len), Some(7));
    }
}
