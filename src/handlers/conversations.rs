use std::collections::HashMap;

use actix_web::{web, HttpResponse};
use mongodb::bson::oid::ObjectId;
use serde::Deserialize;
use utoipa::ToSchema;

use crate::db::{conversation_repo, user_repo};
use crate::error::{AppError, AppResult};
use crate::middleware::{JwtAuthMiddleware, UserId};
use crate::models::conversation::participant_set;
use crate::models::{Conversation, ConversationResponse, MessageResponse, User};
use crate::state::AppState;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateConversationRequest {
    pub participant_ids: Vec<String>,
}

async fn participants_map(
    state: &AppState,
    conversations: &[Conversation],
) -> AppResult<HashMap<ObjectId, User>> {
    let mut ids: Vec<ObjectId> = Vec::new();
    for conversation in conversations {
        for id in &conversation.participants {
            if !ids.contains(id) {
                ids.push(*id);
            }
        }
    }
    user_repo::find_map_by_ids(&state.db, &ids).await
}

/// List the caller's conversations with participants populated.
#[utoipa::path(
    get,
    path = "/api/conversations",
    responses((status = 200, description = "Conversations", body = [ConversationResponse])),
    tag = "Conversations"
)]
pub async fn list_conversations(state: web::Data<AppState>, user: UserId) -> AppResult<HttpResponse> {
    let conversations = conversation_repo::list_for_user(&state.db, user.0).await?;
    let users = participants_map(&state, &conversations).await?;

    let responses: Vec<ConversationResponse> = conversations
        .iter()
        .map(|c| ConversationResponse::from_conversation(c, &users))
        .collect();
    Ok(HttpResponse::Ok().json(responses))
}

/// Create a conversation, or return the existing one with the same
/// participant set.
#[utoipa::path(
    post,
    path = "/api/conversations",
    request_body = CreateConversationRequest,
    responses(
        (status = 201, description = "Conversation created", body = ConversationResponse),
        (status = 200, description = "Conversation already exists", body = ConversationResponse),
        (status = 400, description = "Participants required"),
    ),
    tag = "Conversations"
)]
pub async fn create_conversation(
    state: web::Data<AppState>,
    user: UserId,
    body: web::Json<CreateConversationRequest>,
) -> AppResult<HttpResponse> {
    let request = body.into_inner();
    if request.participant_ids.is_empty() {
        return Err(AppError::BadRequest("Participants required".to_string()));
    }

    let mut requested = Vec::with_capacity(request.participant_ids.len());
    for id in &request.participant_ids {
        requested.push(ObjectId::parse_str(id)?);
    }
    let participants = participant_set(user.0, &requested);

    if let Some(existing) =
        conversation_repo::find_by_exact_participants(&state.db, &participants).await?
    {
        let users = participants_map(&state, std::slice::from_ref(&existing)).await?;
        return Ok(
            HttpResponse::Ok().json(ConversationResponse::from_conversation(&existing, &users))
        );
    }

    let conversation = Conversation::new(participants);
    conversation_repo::insert(&state.db, &conversation).await?;

    tracing::info!(
        conversation_id = %conversation.id,
        participants = conversation.participants.len(),
        "conversation created"
    );

    let users = participants_map(&state, std::slice::from_ref(&conversation)).await?;
    Ok(HttpResponse::Created()
        .json(ConversationResponse::from_conversation(&conversation, &users)))
}

/// Embedded message history with sender usernames populated.
#[utoipa::path(
    get,
    path = "/api/conversations/{id}/messages",
    params(("id" = String, Path, description = "Conversation id")),
    responses(
        (status = 200, description = "Messages", body = [MessageResponse]),
        (status = 404, description = "Conversation not found"),
    ),
    tag = "Conversations"
)]
pub async fn get_messages(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let id = ObjectId::parse_str(path.into_inner().as_str())?;

    let conversation = conversation_repo::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Conversation not found".to_string()))?;

    let mut sender_ids: Vec<ObjectId> = Vec::new();
    for message in &conversation.messages {
        if !sender_ids.contains(&message.sender) {
            sender_ids.push(message.sender);
        }
    }
    let users = user_repo::find_map_by_ids(&state.db, &sender_ids).await?;

    let responses: Vec<MessageResponse> = conversation
        .messages
        .iter()
        .map(|message| MessageResponse::from_message(conversation.id, message, &users))
        .collect();
    Ok(HttpResponse::Ok().json(responses))
}

pub fn register_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/conversations")
            .wrap(JwtAuthMiddleware)
            .route("", web::get().to(list_conversations))
            .route("", web::post().to(create_conversation))
            .route("/{id}/messages", web::get().to(get_messages)),
    );
}
