use actix_web::{web, HttpRequest, HttpResponse, Responder};

use crate::models::Agent;
use crate::pages::{html_shell, CREATE_AGENT_BUNDLE};
use crate::resolver::Resolution;
use crate::AppState;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/").route(web::get().to(index)));
    cfg.service(web::resource("/chat/{id}").route(web::get().to(chat)));
}

fn host_of(req: &HttpRequest) -> String {
    req.headers()
        .get("host")
        .and_then(|h| h.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

fn not_found() -> HttpResponse {
    HttpResponse::NotFound().json(serde_json::json!({
        "error": "Not found"
    }))
}

/// Resolve the request host to a tenant, mapping misses to HTTP responses.
fn resolve_tenant(
    state: &web::Data<AppState>,
    req: &HttpRequest,
) -> Result<(Agent, String), HttpResponse> {
    match state.resolver.resolve(&host_of(req)) {
        Ok(Resolution::Tenant { agent, bundle }) => Ok((agent, bundle)),
        Ok(Resolution::Root) | Ok(Resolution::NotFound) => Err(not_found()),
        Err(e) => {
            log::error!("Tenant resolution failed: {}", e);
            Err(HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "Internal server error"
            })))
        }
    }
}

async fn index(state: web::Data<AppState>, req: HttpRequest) -> impl Responder {
    match state.resolver.resolve(&host_of(&req)) {
        Ok(Resolution::Root) => HttpResponse::Ok()
            .content_type("text/html")
            .body(html_shell(CREATE_AGENT_BUNDLE, &serde_json::json!({}))),
        Ok(Resolution::Tenant { agent, bundle }) => {
            match state.pages.tenant_server_data(&agent).await {
                Ok(data) => HttpResponse::Ok()
                    .content_type("text/html")
                    .body(html_shell(&bundle, &data)),
                Err(e) => {
                    log::error!("Failed to build page data for '{}': {}", agent.subdomain, e);
                    HttpResponse::InternalServerError().json(serde_json::json!({
                        "error": "Internal server error"
                    }))
                }
            }
        }
        Ok(Resolution::NotFound) => not_found(),
        Err(e) => {
            log::error!("Tenant resolution failed: {}", e);
            HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "Internal server error"
            }))
        }
    }
}

async fn chat(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
) -> impl Responder {
    let (agent, bundle) = match resolve_tenant(&state, &req) {
        Ok(tenant) => tenant,
        Err(resp) => return resp,
    };

    let chat_id = path.into_inner();
    let chat = match state.db.get_chat(&chat_id) {
        Ok(Some(chat)) if chat.subdomain == agent.subdomain => chat,
        Ok(_) => return not_found(),
        Err(e) => {
            log::error!("Chat lookup failed for '{}': {}", chat_id, e);
            return HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "Internal server error"
            }));
        }
    };

    match state.pages.chat_server_data(&agent, &chat).await {
        Ok(data) => HttpResponse::Ok()
            .content_type("text/html")
            .body(html_shell(&bundle, &data)),
        Err(e) => {
            log::error!("Failed to build chat page for '{}': {}", chat_id, e);
            HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "Internal server error"
            }))
        }
    }
}
