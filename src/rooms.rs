//! 방 멤버십 저장소

use crate::error::MatchError;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::RwLock;

/// 방 멤버십 (소프트 삭제)
///
/// 떠난 멤버는 비활성으로 남아 재합류 시 중복 없이 재활성화된다.
#[derive(Debug, Clone)]
pub struct Membership {
    pub identity: String,
    pub active: bool,
}

/// 방 정보
pub struct Room {
    pub id: String,
    pub creator: String,
    pub request_text: String,
    inner: RwLock<RoomInner>,
}

struct RoomInner {
    active: bool,
    /// 합류 순서 유지
    members: Vec<Membership>,
}

impl Room {
    fn new(id: &str, creator: &str, request_text: &str) -> Self {
        Self {
            id: id.to_string(),
            creator: creator.to_string(),
            request_text: request_text.to_string(),
            inner: RwLock::new(RoomInner {
                active: true,
                members: vec![Membership {
                    identity: creator.to_string(),
                    active: true,
                }],
            }),
        }
    }
}

/// add_member 호출의 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberChange {
    Added,
    Reactivated,
    Unchanged,
}

/// 방과 멤버십을 관리하는 저장소
pub struct RoomStore {
    /// 방 정보 (room_id -> Room)
    rooms: DashMap<String, Room>,
    /// 역방향 인덱스 (identity -> 활성 멤버십이 있는 방 집합)
    by_member: DashMap<String, HashSet<String>>,
    active_rooms: AtomicUsize,
}

impl RoomStore {
    pub fn new() -> Self {
        Self {
            rooms: DashMap::new(),
            by_member: DashMap::new(),
            active_rooms: AtomicUsize::new(0),
        }
    }

    /// 방 생성, 생성자가 첫 활성 멤버가 된다
    pub fn create(&self, room_id: &str, creator: &str, request_text: &str) -> Result<(), MatchError> {
        match self.rooms.entry(room_id.to_string()) {
            Entry::Occupied(_) => return Err(MatchError::RoomExists(room_id.to_string())),
            Entry::Vacant(slot) => {
                // 역방향 인덱스는 방이 조회 가능해지기 전에 들어간다
                self.by_member
                    .entry(creator.to_string())
                    .or_default()
                    .insert(room_id.to_string());
                slot.insert(Room::new(room_id, creator, request_text));
            }
        }
        self.active_rooms.fetch_add(1, Ordering::Relaxed);
        tracing::info!(room_id = %room_id, creator = %creator, "Room created");
        Ok(())
    }

    /// 멤버 추가 (이미 있으면 재활성화 또는 무변경)
    pub async fn add_member(
        &self,
        room_id: &str,
        identity: &str,
    ) -> Result<MemberChange, MatchError> {
        let Some(room) = self.rooms.get(room_id) else {
            return Err(MatchError::RoomNotFound(room_id.to_string()));
        };
        let mut inner = room.inner.write().await;

        let change = match inner.members.iter().position(|m| m.identity == identity) {
            Some(idx) if inner.members[idx].active => MemberChange::Unchanged,
            Some(idx) => {
                inner.members[idx].active = true;
                MemberChange::Reactivated
            }
            None => {
                inner.members.push(Membership {
                    identity: identity.to_string(),
                    active: true,
                });
                MemberChange::Added
            }
        };

        if change != MemberChange::Unchanged {
            // 비어 있던 방에 멤버가 돌아오면 방도 다시 활성
            if !inner.active {
                inner.active = true;
                self.active_rooms.fetch_add(1, Ordering::Relaxed);
            }
            // 역방향 인덱스는 방 잠금을 쥔 채 갱신한다
            self.by_member
                .entry(identity.to_string())
                .or_default()
                .insert(room_id.to_string());
        }
        Ok(change)
    }

    /// 멤버십 비활성화
    ///
    /// 활성 멤버가 아니면 Ok(false)로 조용히 끝난다.
    /// 마지막 활성 멤버가 떠나면 방이 비활성으로 전환된다.
    pub async fn remove_member(&self, room_id: &str, identity: &str) -> Result<bool, MatchError> {
        let Some(room) = self.rooms.get(room_id) else {
            return Err(MatchError::RoomNotFound(room_id.to_string()));
        };
        let mut inner = room.inner.write().await;

        let Some(idx) = inner
            .members
            .iter()
            .position(|m| m.identity == identity && m.active)
        else {
            return Ok(false);
        };
        inner.members[idx].active = false;

        let remaining = inner.members.iter().filter(|m| m.active).count();
        if remaining == 0 && inner.active {
            inner.active = false;
            self.active_rooms.fetch_sub(1, Ordering::Relaxed);
            tracing::info!(room_id = %room.id, "Room deactivated, no active members");
        }

        // 역방향 인덱스는 방 잠금을 쥔 채 갱신한다
        let now_empty = self
            .by_member
            .get_mut(identity)
            .map(|mut rooms| {
                rooms.remove(room_id);
                rooms.is_empty()
            })
            .unwrap_or(false);
        if now_empty {
            self.by_member.remove_if(identity, |_, rooms| rooms.is_empty());
        }
        Ok(true)
    }

    /// 활성 멤버 목록 (합류 순서)
    ///
    /// 알 수 없는 방이나 비활성 방은 빈 목록.
    pub async fn active_members(&self, room_id: &str) -> Vec<String> {
        let Some(room) = self.rooms.get(room_id) else {
            return Vec::new();
        };
        let inner = room.inner.read().await;
        inner
            .members
            .iter()
            .filter(|m| m.active)
            .map(|m| m.identity.clone())
            .collect()
    }

    /// 식별자가 활성 멤버십을 가진 방 목록
    pub fn rooms_for(&self, identity: &str) -> Vec<String> {
        self.by_member
            .get(identity)
            .map(|rooms| rooms.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// 활성 방 수
    pub fn active_count(&self) -> usize {
        self.active_rooms.load(Ordering::Relaxed)
    }
}

impl Default for RoomStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn create_seeds_creator_membership() {
        let store = RoomStore::new();
        store.create("r1", "u1", "tennis anyone?").unwrap();

        assert_eq!(store.active_members("r1").await, vec!["u1"]);
        assert_eq!(store.rooms_for("u1"), vec!["r1"]);
        assert_eq!(store.active_count(), 1);

        let room = store.rooms.get("r1").unwrap();
        assert_eq!(room.creator, "u1");
        assert_eq!(room.request_text, "tennis anyone?");
    }

    #[tokio::test]
    async fn duplicate_room_id_is_rejected() {
        let store = RoomStore::new();
        store.create("r1", "u1", "tennis").unwrap();

        assert_eq!(
            store.create("r1", "u2", "padel"),
            Err(MatchError::RoomExists("r1".to_string()))
        );
    }

    #[tokio::test]
    async fn add_member_is_idempotent() {
        let store = RoomStore::new();
        store.create("r1", "u1", "tennis").unwrap();

        assert_eq!(store.add_member("r1", "u2").await.unwrap(), MemberChange::Added);
        assert_eq!(
            store.add_member("r1", "u2").await.unwrap(),
            MemberChange::Unchanged
        );
        assert_eq!(store.active_members("r1").await, vec!["u1", "u2"]);
    }

    #[tokio::test]
    async fn leave_then_rejoin_reactivates_membership() {
        let store = RoomStore::new();
        store.create("r1", "u1", "tennis").unwrap();
        store.add_member("r1", "u2").await.unwrap();

        assert!(store.remove_member("r1", "u2").await.unwrap());
        assert_eq!(store.active_members("r1").await, vec!["u1"]);
        assert!(store.rooms_for("u2").is_empty());

        assert_eq!(
            store.add_member("r1", "u2").await.unwrap(),
            MemberChange::Reactivated
        );
        // 재활성화는 중복 멤버십을 만들지 않는다
        assert_eq!(store.active_members("r1").await, vec!["u1", "u2"]);
    }

    #[tokio::test]
    async fn last_member_leaving_deactivates_room() {
        let store = RoomStore::new();
        store.create("r1", "u1", "tennis").unwrap();

        assert!(store.remove_member("r1", "u1").await.unwrap());
        assert!(store.active_members("r1").await.is_empty());
        assert_eq!(store.active_count(), 0);

        // 빈 방에 돌아오면 방이 다시 활성된다
        store.add_member("r1", "u1").await.unwrap();
        assert_eq!(store.active_members("r1").await, vec!["u1"]);
        assert_eq!(store.active_count(), 1);
    }

    #[tokio::test]
    async fn remove_nonmember_is_a_noop() {
        let store = RoomStore::new();
        store.create("r1", "u1", "tennis").unwrap();

        assert!(!store.remove_member("r1", "u2").await.unwrap());
        assert!(store.remove_member("r1", "u1").await.unwrap());
        // 이미 떠난 멤버의 재이탈도 무변경
        assert!(!store.remove_member("r1", "u1").await.unwrap());
    }

    #[tokio::test]
    async fn unknown_room_mutations_error() {
        let store = RoomStore::new();
        assert_eq!(
            store.add_member("ghost", "u1").await,
            Err(MatchError::RoomNotFound("ghost".to_string()))
        );
        assert_eq!(
            store.remove_member("ghost", "u1").await,
            Err(MatchError::RoomNotFound("ghost".to_string()))
        );
        assert!(store.active_members("ghost").await.is_empty());
    }

    #[tokio::test]
    async fn rooms_for_tracks_only_active_memberships() {
        let store = RoomStore::new();
        store.create("r1", "u1", "tennis").unwrap();
        store.create("r2", "u2", "coffee").unwrap();
        store.add_member("r2", "u1").await.unwrap();

        let mut rooms = store.rooms_for("u1");
        rooms.sort();
        assert_eq!(rooms, vec!["r1", "r2"]);

        store.remove_member("r1", "u1").await.unwrap();
        assert_eq!(store.rooms_for("u1"), vec!["r2"]);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn concurrent_join_and_leave_keep_rooms_for_consistent() {
        for _ in 0..200 {
            let store = Arc::new(RoomStore::new());
            store.create("r1", "u1", "tennis").unwrap();

            let join = {
                let store = store.clone();
                tokio::spawn(async move { store.add_member("r1", "u2").await })
            };
            let leave = {
                let store = store.clone();
                tokio::spawn(async move { store.remove_member("r1", "u2").await })
            };
            join.await.unwrap().unwrap();
            leave.await.unwrap().unwrap();

            // 어느 순서로 끝났든 멤버십 테이블과 역방향 인덱스는 일치한다
            let active = store.active_members("r1").await.contains(&"u2".to_string());
            let indexed = store.rooms_for("u2").contains(&"r1".to_string());
            assert_eq!(active, indexed);
        }
    }
}
