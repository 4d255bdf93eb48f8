//! 활동 요청 브로드캐스트 핸들러

use crate::collab::Profile;
use crate::error::MatchError;
use crate::matching::{self, Candidate};
use crate::protocol::ServerMessage;
use crate::state::AppState;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// broadcast 액션 처리
///
/// 키워드 추출과 반경 조회 결과로 후보를 선발하고, 방을 만든 뒤
/// 선발자 전원의 라이브 연결에 초대를 보낸다. 요청자는 초대 수와
/// 무관하게 broadcast_closed 요약을 정확히 한 번 받는다.
pub async fn handle_broadcast(
    state: Arc<AppState>,
    conn_id: &str,
    request_text: &str,
    max_km: Option<f64>,
    threshold: Option<f64>,
    max_group: Option<i64>,
) {
    let Some(identity) = state.registry.identity_of(conn_id).await else {
        tracing::debug!(
            conn_id = %conn_id,
            error = %MatchError::NotRegistered,
            "Dropped broadcast from unregistered connection"
        );
        return;
    };
    let Some(profile) = state.profiles.get(&identity).await else {
        // 부작용 없이 중단 (방 생성도, 이벤트도 없음)
        tracing::warn!(
            conn_id = %conn_id,
            error = %MatchError::ProfileNotFound(identity.clone()),
            "Broadcast aborted"
        );
        return;
    };

    let defaults = &state.config.matching;
    let text = request_text.trim();
    let max_km = max_km.unwrap_or(defaults.default_max_km);
    let threshold = threshold.unwrap_or(defaults.default_threshold);
    let max_group = matching::effective_max_group(max_group, defaults.default_max_group);

    let keywords = extract_keywords(&state, text).await;
    let candidates = fetch_candidates(&state, &profile, max_km).await;
    let selection = matching::rank(&candidates, &keywords, threshold, max_group);

    // ID 충돌 시 새로 생성해 재시도
    let room_id = loop {
        let fresh = Uuid::new_v4().to_string();
        match state.rooms.create(&fresh, &identity, text) {
            Ok(()) => break fresh,
            Err(_) => continue,
        }
    };

    for selected in &selection {
        for target_conn in state.registry.connections_for(&selected.identity) {
            if let Some(sender) = state.registry.sender_for(&target_conn) {
                let _ = sender.send(ServerMessage::Invite {
                    from: identity.clone(),
                    request_id: room_id.clone(),
                    text: text.to_string(),
                    score: round2(selected.score),
                    distance: round2(selected.distance_km),
                    interests: profile.interests.clone(),
                });
            }
        }
    }

    if let Some(sender) = state.registry.sender_for(conn_id) {
        let _ = sender.send(ServerMessage::BroadcastClosed {
            request_id: room_id.clone(),
            invited_count: selection.len(),
            max_group,
            keywords: keywords.clone(),
        });
    }

    tracing::info!(
        user_id = %identity,
        room_id = %room_id,
        invited = selection.len(),
        keywords = ?keywords,
        "Broadcast closed"
    );
}

/// 키워드 추출, 실패나 빈 결과는 폴백 휴리스틱으로 강등
async fn extract_keywords(state: &AppState, text: &str) -> Vec<String> {
    let defaults = &state.config.matching;
    let limit = Duration::from_millis(defaults.collab_timeout_ms);

    let extracted = match tokio::time::timeout(limit, state.keywords.extract(text)).await {
        Ok(keywords) => keywords,
        Err(_) => {
            tracing::warn!(
                error = %MatchError::CollaboratorUnavailable("keyword extractor"),
                "Keyword extraction timed out"
            );
            Vec::new()
        }
    };
    if !extracted.is_empty() {
        return extracted;
    }
    fallback_keywords(text, &defaults.fallback_keyword)
}

/// 폴백 용어의 부분 문자열 일치
fn fallback_keywords(text: &str, fallback: &str) -> Vec<String> {
    if !fallback.is_empty() && text.to_lowercase().contains(fallback) {
        vec![fallback.to_string()]
    } else {
        Vec::new()
    }
}

/// 반경 내 후보 조회, 실패나 시간 초과는 빈 목록으로 강등
async fn fetch_candidates(state: &AppState, profile: &Profile, max_km: f64) -> Vec<Candidate> {
    let limit = Duration::from_millis(state.config.matching.collab_timeout_ms);
    match tokio::time::timeout(
        limit,
        state.geo.nearby(profile.lat, profile.lon, max_km, &profile.user_id),
    )
    .await
    {
        Ok(candidates) => candidates,
        Err(_) => {
            tracing::warn!(
                error = %MatchError::CollaboratorUnavailable("geo source"),
                "Nearby lookup timed out"
            );
            Vec::new()
        }
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
