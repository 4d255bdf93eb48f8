//! 방 합류, 채팅, 나가기 핸들러

use crate::error::MatchError;
use crate::protocol::ServerMessage;
use crate::state::AppState;
use std::sync::Arc;

/// accept 액션 처리
///
/// 수락자를 방 멤버로 올리고, 수락 연결과 원 송신자의 라이브 연결을
/// 그룹에 구독시킨 뒤 활성 멤버 목록을 그룹 전체에 알린다.
pub async fn handle_accept(
    state: Arc<AppState>,
    conn_id: &str,
    request_id: &str,
    from: &str,
    acceptor: &str,
) {
    if state.registry.identity_of(conn_id).await.is_none() {
        tracing::debug!(
            conn_id = %conn_id,
            error = %MatchError::NotRegistered,
            "Dropped accept from unregistered connection"
        );
        return;
    }

    let change = match state.rooms.add_member(request_id, acceptor).await {
        Ok(change) => change,
        Err(error) => {
            // 만료되었거나 잘못된 초대, 이벤트 없이 무시
            tracing::debug!(room_id = %request_id, %error, "Accept ignored");
            return;
        }
    };

    state.groups.subscribe(&state.registry, conn_id, request_id);
    // 원 송신자가 접속 중이면 그 연결들도 그룹에 태운다 (최선 노력)
    for sender_conn in state.registry.connections_for(from) {
        state.groups.subscribe(&state.registry, &sender_conn, request_id);
    }

    let members = state.rooms.active_members(request_id).await;
    let notified = state.groups.publish(
        &state.registry,
        request_id,
        ServerMessage::GroupUpdate {
            room: request_id.to_string(),
            members: members.clone(),
        },
    );

    tracing::info!(
        room_id = %request_id,
        acceptor = %acceptor,
        change = ?change,
        members = members.len(),
        notified = notified,
        "Accept processed"
    );
}

/// chat 액션 처리
///
/// 저장소를 거치지 않고 방 그룹 구독자에게 그대로 전달한다.
pub async fn handle_chat(
    state: Arc<AppState>,
    conn_id: &str,
    room: &str,
    sender: &str,
    message: &str,
) {
    if state.registry.identity_of(conn_id).await.is_none() {
        tracing::debug!(
            conn_id = %conn_id,
            error = %MatchError::NotRegistered,
            "Dropped chat from unregistered connection"
        );
        return;
    }

    let delivered = state.groups.publish(
        &state.registry,
        room,
        ServerMessage::Chat {
            room: room.to_string(),
            sender: sender.to_string(),
            message: message.to_string(),
        },
    );
    tracing::debug!(room_id = %room, sender = %sender, delivered = delivered, "Chat relayed");
}

/// leave 액션 처리
///
/// 멤버십을 비활성화하고 이 연결의 구독을 해제한 뒤, 남은
/// 구독자에게 갱신된 목록을, 떠나는 연결에는 확인을 보낸다.
/// 활성 멤버가 아니었다면 아무 이벤트도 내지 않는다.
pub async fn handle_leave(state: Arc<AppState>, conn_id: &str, room: &str, user_id: &str) {
    if state.registry.identity_of(conn_id).await.is_none() {
        tracing::debug!(
            conn_id = %conn_id,
            error = %MatchError::NotRegistered,
            "Dropped leave from unregistered connection"
        );
        return;
    }

    match state.rooms.remove_member(room, user_id).await {
        Ok(true) => {}
        Ok(false) => {
            tracing::debug!(room_id = %room, user_id = %user_id, "Leave without active membership");
            return;
        }
        Err(error) => {
            tracing::debug!(room_id = %room, %error, "Leave ignored");
            return;
        }
    }

    state.groups.unsubscribe(conn_id, room);

    let members = state.rooms.active_members(room).await;
    state.groups.publish(
        &state.registry,
        room,
        ServerMessage::GroupUpdate {
            room: room.to_string(),
            members: members.clone(),
        },
    );

    if let Some(sender) = state.registry.sender_for(conn_id) {
        let _ = sender.send(ServerMessage::LeftRoom {
            room: room.to_string(),
        });
    }

    tracing::info!(
        room_id = %room,
        user_id = %user_id,
        remaining = members.len(),
        "User left room"
    );
}
