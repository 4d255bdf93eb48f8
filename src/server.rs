//! 라우터 구성 및 WebSocket 수신 루프

use crate::handlers;
use crate::protocol::{ClientMessage, ServerMessage};
use crate::state::AppState;
use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::{Html, IntoResponse, Json},
    routing::get,
    Router,
};
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::mpsc;
use tower_http::cors::{Any, CorsLayer};

/// HTTP/WebSocket 라우터 구성
pub fn router(state: Arc<AppState>) -> Router {
    // CORS 설정
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(index_handler))
        .route("/health", get(health_handler))
        .route("/ws", get(ws_handler))
        .layer(cors)
        .with_state(state)
}

async fn index_handler() -> Html<&'static str> {
    Html("<h1>Huddle Match Server (Rust)</h1><p>WebSocket endpoint: /ws</p>")
}

async fn health_handler(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "server": "huddle-match-rs",
        "timestamp": std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_secs(),
        "connections": state.registry.count(),
        "active_rooms": state.rooms.active_count(),
    }))
}

async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// 연결당 수신 루프
///
/// 소켓을 분리해 송신 태스크를 별도로 띄우고, 수신 메시지는
/// 이 루프에서 순차 처리한다. 같은 연결의 액션 순서가 곧
/// 처리 순서가 된다.
pub async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (mut ws_sender, mut ws_receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerMessage>();

    // 연결 처리
    let conn_id = handlers::handle_connection(state.clone(), tx).await;

    // 송신 태스크
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if let Ok(json) = serde_json::to_string(&msg) {
                if ws_sender.send(Message::Text(json)).await.is_err() {
                    break;
                }
            }
        }
    });

    // 수신 처리
    while let Some(result) = ws_receiver.next().await {
        match result {
            Ok(Message::Text(text)) => match serde_json::from_str::<ClientMessage>(&text) {
                Ok(msg) => handle_client_message(&state, &conn_id, msg).await,
                Err(_) => {
                    // 형식 오류는 연결을 유지한 채 폐기
                    tracing::debug!(conn_id = %conn_id, "Dropped malformed message");
                }
            },
            Ok(Message::Close(_)) => break,
            Err(_) => break,
            _ => {}
        }
    }

    // 연결 해제
    handlers::handle_disconnect(state, &conn_id).await;
    send_task.abort();
}

async fn handle_client_message(state: &Arc<AppState>, conn_id: &str, msg: ClientMessage) {
    match msg {
        ClientMessage::Register(profile) => {
            handlers::handle_register(state.clone(), conn_id, profile).await;
        }
        ClientMessage::Broadcast {
            request_text,
            max_km,
            threshold,
            max_group,
        } => {
            handlers::handle_broadcast(
                state.clone(),
                conn_id,
                &request_text,
                max_km,
                threshold,
                max_group,
            )
            .await;
        }
        ClientMessage::Accept {
            request_id,
            from,
            acceptor,
        } => {
            handlers::handle_accept(state.clone(), conn_id, &request_id, &from, &acceptor).await;
        }
        ClientMessage::Chat {
            room,
            sender,
            message,
        } => {
            handlers::handle_chat(state.clone(), conn_id, &room, &sender, &message).await;
        }
        ClientMessage::Leave { room, user_id } => {
            handlers::handle_leave(state.clone(), conn_id, &room, &user_id).await;
        }
    }
}
