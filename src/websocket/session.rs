use std::time::{Duration, Instant};

use actix::{Actor, ActorContext, AsyncContext, Handler, Message as ActixMessage, StreamHandler};
use actix_web::{get, web, Error, HttpRequest, HttpResponse};
use actix_web_actors::ws;
use mongodb::bson::oid::ObjectId;
use serde::Deserialize;
use tokio::sync::mpsc::{unbounded_channel, UnboundedSender};
use tracing::error;

use crate::security::jwt;
use crate::services::{notifier, ChatService};
use crate::state::AppState;
use crate::websocket::{Room, SubscriberId, WsInboundEvent};

const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(5);
const CLIENT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
pub struct WsParams {
    pub token: Option<String>,
}

/// Text payload delivered to the WebSocket client.
#[derive(ActixMessage)]
#[rtype(result = "()")]
pub struct OutboundText(pub String);

/// One WebSocket connection, authenticated as `user_id`.
///
/// Rooms are joined on explicit `join` / `joinNotifications` events,
/// matching the client protocol; the subscriber id ties every joined
/// room back to this connection for cleanup.
pub struct WsSession {
    user_id: ObjectId,
    subscriber_id: SubscriberId,
    sender: UnboundedSender<String>,
    state: AppState,
    hb: Instant,
}

impl WsSession {
    fn new(user_id: ObjectId, sender: UnboundedSender<String>, state: AppState) -> Self {
        Self {
            user_id,
            subscriber_id: SubscriberId::new(),
            sender,
            state,
            hb: Instant::now(),
        }
    }

    fn hb(&self, ctx: &mut ws::WebsocketContext<Self>) {
        ctx.run_interval(HEARTBEAT_INTERVAL, |act, ctx| {
            if Instant::now().duration_since(act.hb) > CLIENT_TIMEOUT {
                tracing::warn!(user_id = %act.user_id, "WebSocket heartbeat failed, disconnecting");
                ctx.stop();
                return;
            }
            ctx.ping(b"");
        });
    }

    fn handle_event(&self, evt: WsInboundEvent) {
        let state = self.state.clone();
        let session_user = self.user_id;
        let subscriber_id = self.subscriber_id;
        let sender = self.sender.clone();

        match evt {
            WsInboundEvent::Join { user_id } => {
                if !self.event_user_matches(&user_id) {
                    return;
                }
                actix::spawn(async move {
                    state
                        .registry
                        .join(Room::User(session_user), subscriber_id, sender.clone())
                        .await;
                    state
                        .registry
                        .join(Room::Notifications(session_user), subscriber_id, sender)
                        .await;
                });
            }

            WsInboundEvent::JoinNotifications { user_id } => {
                if !self.event_user_matches(&user_id) {
                    return;
                }
                actix::spawn(async move {
                    state
                        .registry
                        .join(Room::Notifications(session_user), subscriber_id, sender)
                        .await;
                });
            }

            WsInboundEvent::SendMessage {
                conversation_id,
                text,
                sender_id,
            } => {
                if !self.event_user_matches(&sender_id) {
                    return;
                }
                let conversation_id = match ObjectId::parse_str(&conversation_id) {
                    Ok(id) => id,
                    Err(_) => {
                        tracing::warn!(%conversation_id, "ignoring send_message with invalid id");
                        return;
                    }
                };
                actix::spawn(async move {
                    if let Err(e) = ChatService::send_message(
                        &state.db,
                        &state.registry,
                        conversation_id,
                        session_user,
                        text,
                    )
                    .await
                    {
                        error!(error = %e, conversation_id = %conversation_id, "send_message failed");
                    }
                });
            }

            WsInboundEvent::SendNotification {
                user_id,
                kind,
                message,
            } => {
                let target = match ObjectId::parse_str(&user_id) {
                    Ok(id) => id,
                    Err(_) => {
                        tracing::warn!(%user_id, "ignoring sendNotification with invalid id");
                        return;
                    }
                };
                actix::spawn(async move {
                    if let Err(e) =
                        notifier::dispatch(&state.db, &state.registry, target, kind, message).await
                    {
                        error!(error = %e, target = %target, "sendNotification failed");
                    }
                });
            }
        }
    }

    /// Clients identify themselves in event payloads; they may only
    /// act as the user their token authenticated.
    fn event_user_matches(&self, claimed: &str) -> bool {
        match ObjectId::parse_str(claimed) {
            Ok(id) if id == self.user_id => true,
            _ => {
                tracing::warn!(
                    claimed,
                    authenticated = %self.user_id,
                    "ignoring event for mismatched user id"
                );
                false
            }
        }
    }
}

impl Actor for WsSession {
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        tracing::info!(user_id = %self.user_id, "WebSocket session started");
        self.hb(ctx);
    }

    fn stopped(&mut self, _ctx: &mut Self::Context) {
        tracing::info!(user_id = %self.user_id, "WebSocket session stopped");

        let registry = self.state.registry.clone();
        let subscriber_id = self.subscriber_id;
        actix::spawn(async move {
            registry.leave_all(subscriber_id).await;
        });
    }
}

impl Handler<OutboundText> for WsSession {
    type Result = ();

    fn handle(&mut self, msg: OutboundText, ctx: &mut Self::Context) {
        ctx.text(msg.0);
    }
}

impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for WsSession {
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        match msg {
            Ok(ws::Message::Ping(msg)) => {
                self.hb = Instant::now();
                ctx.pong(&msg);
            }
            Ok(ws::Message::Pong(_)) => {
                self.hb = Instant::now();
            }
            Ok(ws::Message::Text(text)) => match serde_json::from_str::<WsInboundEvent>(&text) {
                Ok(evt) => self.handle_event(evt),
                Err(e) => {
                    tracing::warn!(error = %e, "failed to parse WebSocket message");
                }
            },
            Ok(ws::Message::Binary(_)) => {
                tracing::warn!("binary WebSocket messages not supported");
            }
            Ok(ws::Message::Close(reason)) => {
                tracing::info!(?reason, "WebSocket close message received");
                ctx.stop();
            }
            _ => {}
        }
    }
}

/// Resolve the JWT from the `token` query parameter or the
/// Authorization header; the connection is rejected without one.
fn authenticated_user(params: &WsParams, req: &HttpRequest) -> Option<ObjectId> {
    let token = params.token.clone().or_else(|| {
        req.headers()
            .get(actix_web::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.strip_prefix("Bearer "))
            .map(|s| s.to_string())
    })?;

    match jwt::validate_token(&token) {
        Ok(data) => jwt::subject_id(&data.claims).ok(),
        Err(e) => {
            error!(error = %e, "WebSocket connection rejected: invalid token");
            None
        }
    }
}

#[get("/ws")]
pub async fn ws_handler(
    req: HttpRequest,
    stream: web::Payload,
    state: web::Data<AppState>,
    query: web::Query<WsParams>,
) -> Result<HttpResponse, Error> {
    let params = query.into_inner();

    let Some(user_id) = authenticated_user(&params, &req) else {
        return Ok(HttpResponse::Unauthorized().finish());
    };

    let (tx, mut rx) = unbounded_channel::<String>();
    let session = WsSession::new(user_id, tx, state.get_ref().clone());

    let (addr, resp) = ws::WsResponseBuilder::new(session, &req, stream).start_with_addr()?;

    // Bridge registry broadcasts into the WebSocket actor.
    tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            addr.do_send(OutboundText(msg));
        }
    });

    Ok(resp)
}
