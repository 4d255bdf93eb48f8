//! 그룹 브로드캐스트 프리미티브

use crate::protocol::ServerMessage;
use crate::registry::ConnectionRegistry;
use dashmap::DashMap;
use std::collections::HashSet;

/// 방 그룹과 연결의 양방향 구독 매핑
///
/// 멤버십(사용자 단위)과 별개로, 실제 이벤트 전달 대상은
/// 연결 단위로 추적한다.
pub struct GroupHub {
    /// 구독자 집합 (room_id -> 연결 ID 집합)
    subscribers: DashMap<String, HashSet<String>>,
    /// 역방향 인덱스 (connection_id -> 방 ID 집합)
    by_connection: DashMap<String, HashSet<String>>,
}

impl GroupHub {
    pub fn new() -> Self {
        Self {
            subscribers: DashMap::new(),
            by_connection: DashMap::new(),
        }
    }

    /// 연결을 방 그룹에 구독 (멱등)
    ///
    /// 등록부에서 사라진 연결은 구독을 남기지 못하고 false를 받는다.
    pub fn subscribe(&self, registry: &ConnectionRegistry, conn_id: &str, room_id: &str) -> bool {
        self.subscribers
            .entry(room_id.to_string())
            .or_default()
            .insert(conn_id.to_string());
        self.by_connection
            .entry(conn_id.to_string())
            .or_default()
            .insert(room_id.to_string());

        // 삽입 후 재확인: 이미 제거된 연결이면 구독을 되돌린다
        if registry.sender_for(conn_id).is_none() {
            self.unsubscribe(conn_id, room_id);
            return false;
        }
        true
    }

    /// 연결의 방 그룹 구독 해제
    pub fn unsubscribe(&self, conn_id: &str, room_id: &str) {
        let no_subscribers = self
            .subscribers
            .get_mut(room_id)
            .map(|mut conns| {
                conns.remove(conn_id);
                conns.is_empty()
            })
            .unwrap_or(false);
        if no_subscribers {
            self.subscribers.remove_if(room_id, |_, conns| conns.is_empty());
        }

        let no_rooms = self
            .by_connection
            .get_mut(conn_id)
            .map(|mut rooms| {
                rooms.remove(room_id);
                rooms.is_empty()
            })
            .unwrap_or(false);
        if no_rooms {
            self.by_connection.remove_if(conn_id, |_, rooms| rooms.is_empty());
        }
    }

    /// 구독 여부 조회
    pub fn is_subscribed(&self, conn_id: &str, room_id: &str) -> bool {
        self.by_connection
            .get(conn_id)
            .map(|rooms| rooms.contains(room_id))
            .unwrap_or(false)
    }

    /// 방 그룹의 구독 연결 스냅샷
    pub fn subscribers(&self, room_id: &str) -> Vec<String> {
        self.subscribers
            .get(room_id)
            .map(|conns| conns.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// 연결의 모든 구독 제거, 구독 중이던 방 목록 반환
    pub fn cleanup_connection(&self, conn_id: &str) -> Vec<String> {
        let Some((_, rooms)) = self.by_connection.remove(conn_id) else {
            return Vec::new();
        };
        let rooms: Vec<String> = rooms.into_iter().collect();
        for room_id in &rooms {
            let no_subscribers = self
                .subscribers
                .get_mut(room_id)
                .map(|mut conns| {
                    conns.remove(conn_id);
                    conns.is_empty()
                })
                .unwrap_or(false);
            if no_subscribers {
                self.subscribers.remove_if(room_id, |_, conns| conns.is_empty());
            }
        }
        rooms
    }

    /// 방 그룹의 모든 구독 연결에 메시지 발행
    ///
    /// 한 수신자의 실패가 다른 수신자 전달을 막지 않는다.
    /// 전달된 연결 수를 반환하며, 구독자가 없으면 0.
    pub fn publish(
        &self,
        registry: &ConnectionRegistry,
        room_id: &str,
        message: ServerMessage,
    ) -> usize {
        let targets = self.subscribers(room_id);
        let mut delivered = 0;
        for conn_id in &targets {
            if let Some(sender) = registry.sender_for(conn_id) {
                if sender.send(message.clone()).is_ok() {
                    delivered += 1;
                }
            }
        }
        delivered
    }
}

impl Default for GroupHub {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc::{self, UnboundedReceiver};

    fn open(registry: &ConnectionRegistry) -> (String, UnboundedReceiver<ServerMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (registry.insert(tx), rx)
    }

    fn chat(room: &str, text: &str) -> ServerMessage {
        ServerMessage::Chat {
            room: room.to_string(),
            sender: "u1".to_string(),
            message: text.to_string(),
        }
    }

    #[tokio::test]
    async fn publish_fans_out_to_subscribers_only() {
        let registry = ConnectionRegistry::new();
        let hub = GroupHub::new();
        let (first, mut first_rx) = open(&registry);
        let (second, mut second_rx) = open(&registry);
        let (_outsider, mut outsider_rx) = open(&registry);

        assert!(hub.subscribe(&registry, &first, "r1"));
        assert!(hub.subscribe(&registry, &second, "r1"));

        let delivered = hub.publish(&registry, "r1", chat("r1", "hello"));

        assert_eq!(delivered, 2);
        assert!(first_rx.try_recv().is_ok());
        assert!(second_rx.try_recv().is_ok());
        assert!(outsider_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn publish_without_subscribers_delivers_nothing() {
        let registry = ConnectionRegistry::new();
        let hub = GroupHub::new();

        assert_eq!(hub.publish(&registry, "empty", chat("empty", "hello")), 0);
    }

    #[tokio::test]
    async fn unsubscribe_stops_delivery() {
        let registry = ConnectionRegistry::new();
        let hub = GroupHub::new();
        let (conn, mut rx) = open(&registry);

        hub.subscribe(&registry, &conn, "r1");
        hub.unsubscribe(&conn, "r1");

        assert_eq!(hub.publish(&registry, "r1", chat("r1", "hello")), 0);
        assert!(rx.try_recv().is_err());
        assert!(!hub.is_subscribed(&conn, "r1"));
    }

    #[tokio::test]
    async fn dead_connection_does_not_block_others() {
        let registry = ConnectionRegistry::new();
        let hub = GroupHub::new();
        let (alive, mut alive_rx) = open(&registry);
        let (dead, dead_rx) = open(&registry);

        hub.subscribe(&registry, &alive, "r1");
        hub.subscribe(&registry, &dead, "r1");
        drop(dead_rx);

        let delivered = hub.publish(&registry, "r1", chat("r1", "hello"));

        assert_eq!(delivered, 1);
        assert!(alive_rx.try_recv().is_ok());
    }

    #[tokio::test]
    async fn cleanup_connection_returns_subscribed_rooms() {
        let registry = ConnectionRegistry::new();
        let hub = GroupHub::new();
        let (conn, _rx) = open(&registry);

        hub.subscribe(&registry, &conn, "r1");
        hub.subscribe(&registry, &conn, "r2");

        let mut rooms = hub.cleanup_connection(&conn);
        rooms.sort();
        assert_eq!(rooms, vec!["r1", "r2"]);
        assert!(hub.subscribers("r1").is_empty());
        assert!(hub.subscribers("r2").is_empty());
    }

    #[tokio::test]
    async fn subscribe_after_removal_leaves_no_trace() {
        let registry = ConnectionRegistry::new();
        let hub = GroupHub::new();
        let (conn, _rx) = open(&registry);
        registry.remove(&conn);

        assert!(!hub.subscribe(&registry, &conn, "r1"));
        assert!(!hub.is_subscribed(&conn, "r1"));
        assert!(hub.subscribers("r1").is_empty());
    }
}
