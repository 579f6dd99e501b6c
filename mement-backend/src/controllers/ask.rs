use actix_web::{web, HttpRequest, HttpResponse, Responder};
use serde::{Deserialize, Serialize};

use crate::models::Chat;
use crate::pipeline::AskError;
use crate::resolver::Resolution;
use crate::AppState;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/api/ask-agent").route(web::post().to(ask_agent)));
}

#[derive(Deserialize)]
struct AskRequest {
    content: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AskResponse {
    chat_id: String,
    question: String,
    content: String,
    timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    twitter_post_link: Option<String>,
}

impl From<Chat> for AskResponse {
    fn from(chat: Chat) -> Self {
        Self {
            chat_id: chat.id,
            question: chat.question,
            content: chat.response,
            timestamp: chat.timestamp.to_rfc3339(),
            twitter_post_link: chat.twitter_post_link,
        }
    }
}

async fn ask_agent(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Json<AskRequest>,
) -> impl Responder {
    let host = req
        .headers()
        .get("host")
        .and_then(|h| h.to_str().ok())
        .unwrap_or_default();

    let agent = match state.resolver.resolve(host) {
        Ok(Resolution::Tenant { agent, .. }) => agent,
        Ok(_) => {
            return HttpResponse::NotFound().json(serde_json::json!({
                "error": "Unknown agent"
            }));
        }
        Err(e) => {
            log::error!("Tenant resolution failed: {}", e);
            return HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "Internal server error"
            }));
        }
    };

    match state.pipeline.ask(&agent.subdomain, &body.content).await {
        Ok(chat) => HttpResponse::Ok().json(AskResponse::from(chat)),
        Err(AskError::AgentNotFound) => HttpResponse::NotFound().json(serde_json::json!({
            "error": "Unknown agent"
        })),
        Err(AskError::Rejected { details }) => {
            HttpResponse::UnprocessableEntity().json(serde_json::json!({
                "error": "not appropriate question",
                "details": details
            }))
        }
        Err(e) => {
            log::error!("Ask pipeline failed for '{}': {}", agent.subdomain, e);
            HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "Error generating response"
            }))
        }
    }
}
