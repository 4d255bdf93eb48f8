//! 클라이언트-서버 메시지 프로토콜 정의

use serde::{Deserialize, Serialize};

/// 클라이언트 → 서버 메시지
///
/// `{"action": "...", "data": {...}}` 봉투 형식.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", content = "data", rename_all = "snake_case")]
pub enum ClientMessage {
    /// 프로필 등록/갱신 및 연결-식별자 바인딩
    Register(ProfilePayload),

    /// 주변 사용자에게 활동 요청 브로드캐스트
    Broadcast {
        request_text: String,
        max_km: Option<f64>,
        threshold: Option<f64>,
        max_group: Option<i64>,
    },

    /// 초대 수락 및 방 합류
    Accept {
        request_id: String,
        from: String,
        acceptor: String,
    },

    /// 방 채팅 메시지
    Chat {
        room: String,
        sender: String,
        message: String,
    },

    /// 방 나가기
    Leave { room: String, user_id: String },
}

/// register 액션의 프로필 필드
///
/// `user_id` 외의 필드는 모두 선택 사항이며, 누락 시 기존 값이 유지된다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfilePayload {
    pub user_id: String,
    pub name: Option<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub interests: Option<Vec<String>>,
    pub hometown: Option<String>,
    pub major: Option<String>,
}

/// 서버 → 클라이언트 메시지
///
/// 수신 봉투와 달리 `action` 태그 옆에 필드를 평탄하게 싣는다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ServerMessage {
    /// register 완료 확인
    Registered,

    /// 브로드캐스트 처리 완료 요약 (요청자에게 1회)
    BroadcastClosed {
        request_id: String,
        invited_count: usize,
        max_group: usize,
        keywords: Vec<String>,
    },

    /// 선발된 후보에게 보내는 초대
    Invite {
        from: String,
        request_id: String,
        text: String,
        score: f64,
        distance: f64,
        interests: Vec<String>,
    },

    /// 방 활성 멤버 목록 변경 알림
    GroupUpdate { room: String, members: Vec<String> },

    /// 방 채팅 메시지 전달
    Chat {
        room: String,
        sender: String,
        message: String,
    },

    /// 나가기 완료 확인 (떠나는 연결에게만)
    LeftRoom { room: String },
}
