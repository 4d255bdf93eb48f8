//! 연결 및 등록 핸들러

use crate::collab::ProfilePatch;
use crate::protocol::{ProfilePayload, ServerMessage};
use crate::state::AppState;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;

/// 새 연결 처리, 생성된 연결 ID 반환
pub async fn handle_connection(
    state: Arc<AppState>,
    sender: UnboundedSender<ServerMessage>,
) -> String {
    let conn_id = state.registry.insert(sender);
    tracing::info!(conn_id = %conn_id, "New connection established");
    conn_id
}

/// register 액션 처리
///
/// 프로필을 upsert하고 연결에 식별자를 바인딩한 뒤,
/// 활성 멤버십이 있는 모든 방 그룹에 이 연결을 재구독한다.
pub async fn handle_register(state: Arc<AppState>, conn_id: &str, payload: ProfilePayload) {
    let patch = ProfilePatch {
        name: payload.name,
        interests: payload.interests,
        hometown: payload.hometown,
        major: payload.major,
        lat: payload.lat,
        lon: payload.lon,
    };
    let profile = state.profiles.get_or_create(&payload.user_id, patch).await;

    let previous = state.registry.identity_of(conn_id).await;
    if !state.registry.bind(conn_id, &profile.user_id).await {
        tracing::debug!(conn_id = %conn_id, "Register for a connection that is already gone");
        return;
    }

    // 다른 식별자로 재바인딩하면 이전 식별자의 구독은 무효
    if previous
        .as_deref()
        .is_some_and(|prev| prev != profile.user_id)
    {
        state.groups.cleanup_connection(conn_id);
    }

    // 재접속 보장: 활성 멤버십이 있는 방마다 그룹 재구독
    for room_id in state.rooms.rooms_for(&profile.user_id) {
        if state.groups.subscribe(&state.registry, conn_id, &room_id) {
            tracing::info!(conn_id = %conn_id, room_id = %room_id, "Rejoined room group");
        }
    }

    if let Some(sender) = state.registry.sender_for(conn_id) {
        let _ = sender.send(ServerMessage::Registered);
    }

    tracing::info!(conn_id = %conn_id, user_id = %profile.user_id, "User registered");
}

/// 연결 해제 처리
///
/// 구독과 세션만 정리한다. 방 멤버십은 유지되어
/// 재접속한 연결이 register로 다시 이어받는다.
pub async fn handle_disconnect(state: Arc<AppState>, conn_id: &str) {
    // 등록부 제거가 먼저라야 경합 중인 subscribe가 생존 확인에 걸린다
    let identity = state.registry.remove(conn_id);
    state.groups.cleanup_connection(conn_id);
    match identity {
        Some(identity) => {
            tracing::info!(conn_id = %conn_id, user_id = %identity, "Connection closed")
        }
        None => tracing::info!(conn_id = %conn_id, "Connection closed"),
    }
}
