use actix_web::{web, HttpResponse, Responder};
use log::error;
use serde_json::json;

use crate::api::handlers::SharedManager;
use crate::filters::commit::{CommitError, CommitMonitor};

/// Commit the pending list
pub async fn apply_filters(manager: web::Data<SharedManager>) -> impl Responder {
    run_commit(manager, false).await
}

/// Commit and switch the active list back to the factory defaults
pub async fn restore_defaults(manager: web::Data<SharedManager>) -> impl Responder {
    run_commit(manager, true).await
}

/// Progress of the current or latest commit; does not wait for the manager
pub async fn get_commit_status(monitor: web::Data<CommitMonitor>) -> impl Responder {
    HttpResponse::Ok().json(monitor.snapshot())
}

async fn run_commit(manager: web::Data<SharedManager>, restore: bool) -> HttpResponse {
    let mut manager = manager.get_ref().clone().lock_owned().await;

    // link calls block until the association settles
    match web::block(move || manager.commit(restore)).await {
        Ok(Ok(report)) => HttpResponse::Ok().json(json!({
            "status": "success",
            "message": format!("{} filters active", report.active_filters),
            "report": report,
        })),
        Ok(Err(e)) => {
            let mut response = match e {
                CommitError::ListFull => HttpResponse::Conflict(),
                CommitError::LinkTeardownFailed(_) => HttpResponse::ServiceUnavailable(),
                CommitError::AssociationFailed(_) => HttpResponse::BadGateway(),
            };
            response.json(json!({
                "status": "error",
                "message": e.to_string(),
                "committed": matches!(e, CommitError::AssociationFailed(_)),
            }))
        }
        Err(e) => {
            error!("Commit task failed: {}", e);
            HttpResponse::InternalServerError().json(json!({
                "status": "error",
                "message": "Commit task failed",
            }))
        }
    }
}
