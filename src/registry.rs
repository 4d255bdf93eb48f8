//! 연결 레지스트리

use crate::protocol::ServerMessage;
use dashmap::DashMap;
use std::collections::HashSet;
use std::time::Instant;
use tokio::sync::{mpsc::UnboundedSender, RwLock};
use uuid::Uuid;

/// 라이브 소켓 세션
pub struct ConnectionSession {
    #[allow(dead_code)]
    pub id: String,
    /// register 액션으로 바인딩되는 논리적 사용자 식별자
    pub identity: RwLock<Option<String>>,
    pub sender: UnboundedSender<ServerMessage>,
    #[allow(dead_code)]
    pub connected_at: Instant,
}

/// 연결-식별자 양방향 매핑
///
/// 한 식별자가 여러 연결(다중 기기)을 가질 수 있고,
/// 연결당 식별자는 최대 하나다.
pub struct ConnectionRegistry {
    /// 연결 세션 (connection_id -> ConnectionSession)
    sessions: DashMap<String, ConnectionSession>,
    /// 역방향 인덱스 (identity -> 연결 ID 집합)
    by_identity: DashMap<String, HashSet<String>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
            by_identity: DashMap::new(),
        }
    }

    /// 새 연결 세션 등록, 생성된 연결 ID 반환
    pub fn insert(&self, sender: UnboundedSender<ServerMessage>) -> String {
        let conn_id = Uuid::new_v4().to_string();
        let session = ConnectionSession {
            id: conn_id.clone(),
            identity: RwLock::new(None),
            sender,
            connected_at: Instant::now(),
        };
        self.sessions.insert(conn_id.clone(), session);
        conn_id
    }

    /// 연결에 식별자 바인딩
    ///
    /// 다른 식별자로 재바인딩하면 이전 식별자의 역방향 인덱스에서
    /// 이 연결이 빠진다. 연결이 이미 사라졌으면 false.
    pub async fn bind(&self, conn_id: &str, identity: &str) -> bool {
        let Some(session) = self.sessions.get(conn_id) else {
            return false;
        };
        let mut bound = session.identity.write().await;

        if let Some(prev) = bound.as_deref() {
            if prev == identity {
                return true;
            }
            let now_empty = self
                .by_identity
                .get_mut(prev)
                .map(|mut conns| {
                    conns.remove(conn_id);
                    conns.is_empty()
                })
                .unwrap_or(false);
            if now_empty {
                self.by_identity.remove_if(prev, |_, conns| conns.is_empty());
            }
        }

        *bound = Some(identity.to_string());
        self.by_identity
            .entry(identity.to_string())
            .or_default()
            .insert(conn_id.to_string());
        true
    }

    /// 연결에 바인딩된 식별자 조회
    pub async fn identity_of(&self, conn_id: &str) -> Option<String> {
        let session = self.sessions.get(conn_id)?;
        let bound = session.identity.read().await;
        bound.clone()
    }

    /// 식별자의 라이브 연결 ID 목록 (없으면 빈 목록)
    pub fn connections_for(&self, identity: &str) -> Vec<String> {
        self.by_identity
            .get(identity)
            .map(|conns| conns.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// 연결의 송신 핸들 복제
    pub fn sender_for(&self, conn_id: &str) -> Option<UnboundedSender<ServerMessage>> {
        self.sessions.get(conn_id).map(|s| s.sender.clone())
    }

    /// 연결 세션 제거, 바인딩되어 있던 식별자 반환
    pub fn remove(&self, conn_id: &str) -> Option<String> {
        let (_, session) = self.sessions.remove(conn_id)?;
        let identity = session.identity.into_inner();
        if let Some(ref ident) = identity {
            let now_empty = self
                .by_identity
                .get_mut(ident)
                .map(|mut conns| {
                    conns.remove(conn_id);
                    conns.is_empty()
                })
                .unwrap_or(false);
            if now_empty {
                self.by_identity
                    .remove_if(ident, |_, conns| conns.is_empty());
            }
        }
        identity
    }

    /// 현재 연결 수
    pub fn count(&self) -> usize {
        self.sessions.len()
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
