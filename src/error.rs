//! 매칭 도메인 오류 타입

use thiserror::Error;

/// 매칭 프로토콜 처리 중 발생하는 오류
///
/// 어떤 변종도 연결이나 프로세스를 중단시키지 않는다.
/// 핸들러가 로그를 남기고 무시하거나 폴백으로 강등한다.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MatchError {
    /// register 이전 연결의 액션
    #[error("connection has no registered identity")]
    NotRegistered,

    /// 프로필 저장소에 식별자가 없음
    #[error("profile not found: {0}")]
    ProfileNotFound(String),

    /// 알 수 없는 방에 대한 멤버십 변경
    #[error("room not found: {0}")]
    RoomNotFound(String),

    /// 방 ID 충돌
    #[error("room already exists: {0}")]
    RoomExists(String),

    /// 외부 협력자 호출 실패 또는 시간 초과
    #[error("collaborator unavailable: {0}")]
    CollaboratorUnavailable(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    // 로그 필드로 그대로 나가는 문구
    #[test]
    fn display_renders_variant_messages() {
        assert_eq!(
            MatchError::NotRegistered.to_string(),
            "connection has no registered identity"
        );
        assert_eq!(
            MatchError::ProfileNotFound("u9".to_string()).to_string(),
            "profile not found: u9"
        );
        assert_eq!(
            MatchError::RoomNotFound("r9".to_string()).to_string(),
            "room not found: r9"
        );
        assert_eq!(
            MatchError::RoomExists("r1".to_string()).to_string(),
            "room already exists: r1"
        );
        assert_eq!(
            MatchError::CollaboratorUnavailable("geo source").to_string(),
            "collaborator unavailable: geo source"
        );
    }
}
