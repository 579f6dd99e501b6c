use actix_web::{web, HttpRequest, HttpResponse, Responder};
use serde::Deserialize;

use crate::db::ProvisionWriteError;
use crate::provisioning::{ProvisionError, ProvisionPayload};
use crate::AppState;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/createAgent").route(web::post().to(create_agent)));
    cfg.service(web::resource("/api/create-agent").route(web::post().to(create_agent_from_idea)));
}

fn error_response(err: ProvisionError) -> HttpResponse {
    match err {
        ProvisionError::Unauthorized => HttpResponse::Forbidden().json(serde_json::json!({
            "error": "Forbidden"
        })),
        ProvisionError::Validation(details) => HttpResponse::BadRequest().json(serde_json::json!({
            "error": "Invalid payload",
            "details": details
        })),
        ProvisionError::MissingTelegramGroup => {
            HttpResponse::BadRequest().json(serde_json::json!({
                "error": "Invalid payload",
                "details": err.to_string()
            }))
        }
        ProvisionError::Write(ProvisionWriteError::Invalid(details)) => {
            HttpResponse::BadRequest().json(serde_json::json!({
                "error": "Invalid payload",
                "details": details
            }))
        }
        err => {
            log::error!("Provisioning failed: {}", err);
            HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "Provisioning failed"
            }))
        }
    }
}

/// Privileged provisioning, guarded by the service bearer secret.
async fn create_agent(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Json<ProvisionPayload>,
) -> impl Responder {
    let authorization = req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok());
    if let Err(err) = state.provisioning.authorize(authorization) {
        return error_response(err);
    }

    match state.provisioning.provision(body.into_inner()).await {
        Ok(agent) => HttpResponse::Ok().json(agent),
        Err(err) => error_response(err),
    }
}

#[derive(Deserialize)]
struct CreateAgentRequest {
    idea: String,
}

/// Public creation flow: generate agent fields from an idea, then provision
/// a bare agent under a derived subdomain.
async fn create_agent_from_idea(
    state: web::Data<AppState>,
    body: web::Json<CreateAgentRequest>,
) -> impl Responder {
    let fields = match state.workflow.agent_fields(&body.idea).await {
        Ok(fields) => fields,
        Err(e) => {
            log::error!("Agent field generation failed: {}", e);
            return HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "Error creating agent"
            }));
        }
    };

    match state.provisioning.create_from_fields(fields) {
        Ok(agent) => HttpResponse::Ok().json(agent),
        Err(err) => error_response(err),
    }
}
