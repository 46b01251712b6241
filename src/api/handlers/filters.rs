use actix_web::{web, HttpResponse, Responder};
use log::{info, warn};
use serde_json::json;
use std::collections::HashMap;

use crate::api::handlers::SharedManager;
use crate::filters::buffer::BufferError;
use crate::filters::editor::EditError;

/// Both filter lists with their text rendering
pub async fn list_filters(manager: web::Data<SharedManager>) -> impl Responder {
    let manager = manager.lock().await;
    HttpResponse::Ok().json(manager.snapshot())
}

/// Add a filter to the pending list from the posted form fields
pub async fn add_filter(
    manager: web::Data<SharedManager>,
    form: web::Form<HashMap<String, String>>,
) -> impl Responder {
    let mut manager = manager.lock().await;

    match manager.add(&form) {
        Ok(id) => HttpResponse::Created().json(json!({
            "status": "success",
            "message": format!("Filter {} added to pending list", id),
            "id": id,
        })),
        Err(EditError::Rejected(reason)) => HttpResponse::Conflict().json(json!({
            "status": "error",
            "message": reason.to_string(),
            "reason": reason,
        })),
        Err(e @ EditError::Buffer(_)) => HttpResponse::Conflict().json(json!({
            "status": "error",
            "message": e.to_string(),
        })),
        Err(e @ EditError::Field(_)) => HttpResponse::UnprocessableEntity().json(json!({
            "status": "error",
            "message": e.to_string(),
        })),
    }
}

/// Drop the most recently added pending filter
pub async fn remove_last_filter(manager: web::Data<SharedManager>) -> impl Responder {
    let mut manager = manager.lock().await;

    match manager.remove_last() {
        Ok(removed) => HttpResponse::Ok().json(json!({
            "status": "success",
            "message": format!("Filter {} removed from pending list", removed.id),
            "removed": removed,
        })),
        Err(e) => {
            if e == EditError::Buffer(BufferError::Empty) {
                warn!("Nothing to remove, pending list is empty");
            }
            HttpResponse::Conflict().json(json!({
                "status": "error",
                "message": e.to_string(),
            }))
        }
    }
}

/// Replace the pending list with the factory defaults
pub async fn import_defaults(manager: web::Data<SharedManager>) -> impl Responder {
    let mut manager = manager.lock().await;
    let count = manager.import_factory_defaults();
    info!("Pending list reset to {} factory default filters", count);

    HttpResponse::Ok().json(json!({
        "status": "success",
        "message": format!("Imported {} factory default filters", count),
        "count": count,
    }))
}
