//! 프로필 저장소 협력자

use async_trait::async_trait;
use dashmap::DashMap;

/// 사용자 프로필
#[derive(Debug, Clone)]
pub struct Profile {
    pub user_id: String,
    pub name: String,
    pub interests: Vec<String>,
    pub hometown: Option<String>,
    pub major: Option<String>,
    pub lat: f64,
    pub lon: f64,
}

/// 프로필 upsert 패치
///
/// None 필드는 기존 값을 유지한다. 신규 생성 시 None은 기본값.
#[derive(Debug, Clone, Default)]
pub struct ProfilePatch {
    pub name: Option<String>,
    pub interests: Option<Vec<String>>,
    pub hometown: Option<String>,
    pub major: Option<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

/// 프로필 저장소 인터페이스
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// 프로필 생성 또는 부분 갱신 후 최신 상태 반환
    async fn get_or_create(&self, user_id: &str, patch: ProfilePatch) -> Profile;

    /// 프로필 조회
    async fn get(&self, user_id: &str) -> Option<Profile>;
}

/// 인메모리 프로필 저장소
pub struct InMemoryProfileStore {
    users: DashMap<String, Profile>,
}

impl InMemoryProfileStore {
    pub fn new() -> Self {
        Self {
            users: DashMap::new(),
        }
    }

    /// 경계 상자 안의 프로필 스냅샷
    pub fn in_bounding_box(
        &self,
        lat_min: f64,
        lat_max: f64,
        lon_min: f64,
        lon_max: f64,
    ) -> Vec<Profile> {
        self.users
            .iter()
            .filter(|p| {
                p.lat >= lat_min && p.lat <= lat_max && p.lon >= lon_min && p.lon <= lon_max
            })
            .map(|p| p.value().clone())
            .collect()
    }
}

impl Default for InMemoryProfileStore {
    fn default() -> Self {
        Self::new()
    }
}

fn apply_patch(profile: &mut Profile, patch: &ProfilePatch) {
    if let Some(name) = &patch.name {
        profile.name = name.clone();
    }
    if let Some(interests) = &patch.interests {
        profile.interests = interests.clone();
    }
    if let Some(hometown) = &patch.hometown {
        profile.hometown = Some(hometown.clone());
    }
    if let Some(major) = &patch.major {
        profile.major = Some(major.clone());
    }
    if let Some(lat) = patch.lat {
        profile.lat = lat;
    }
    if let Some(lon) = patch.lon {
        profile.lon = lon;
    }
}

#[async_trait]
impl ProfileStore for InMemoryProfileStore {
    async fn get_or_create(&self, user_id: &str, patch: ProfilePatch) -> Profile {
        let entry = self
            .users
            .entry(user_id.to_string())
            .and_modify(|profile| apply_patch(profile, &patch))
            .or_insert_with(|| Profile {
                user_id: user_id.to_string(),
                name: patch.name.clone().unwrap_or_default(),
                interests: patch.interests.clone().unwrap_or_default(),
                hometown: patch.hometown.clone(),
                major: patch.major.clone(),
                lat: patch.lat.unwrap_or(0.0),
                lon: patch.lon.unwrap_or(0.0),
            });
        entry.value().clone()
    }

    async fn get(&self, user_id: &str) -> Option<Profile> {
        self.users.get(user_id).map(|p| p.value().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn create_fills_defaults_for_missing_fields() {
        let store = InMemoryProfileStore::new();
        let profile = store
            .get_or_create(
                "u1",
                ProfilePatch {
                    name: Some("Mina".to_string()),
                    ..Default::default()
                },
            )
            .await;

        assert_eq!(profile.user_id, "u1");
        assert_eq!(profile.name, "Mina");
        assert!(profile.interests.is_empty());
        assert!(profile.hometown.is_none());
        assert_eq!(profile.lat, 0.0);
        assert_eq!(profile.lon, 0.0);
    }

    #[tokio::test]
    async fn update_preserves_omitted_fields() {
        let store = InMemoryProfileStore::new();
        store
            .get_or_create(
                "u1",
                ProfilePatch {
                    name: Some("Mina".to_string()),
                    interests: Some(vec!["tennis".to_string()]),
                    lat: Some(37.5),
                    lon: Some(127.0),
                    ..Default::default()
                },
            )
            .await;

        // 위치만 갱신
        let updated = store
            .get_or_create(
                "u1",
                ProfilePatch {
                    lat: Some(37.6),
                    ..Default::default()
                },
            )
            .await;

        assert_eq!(updated.name, "Mina");
        assert_eq!(updated.interests, vec!["tennis"]);
        assert_eq!(updated.lat, 37.6);
        assert_eq!(updated.lon, 127.0);
    }

    #[tokio::test]
    async fn get_returns_none_for_unknown_user() {
        let store = InMemoryProfileStore::new();
        assert!(store.get("ghost").await.is_none());
    }

    #[tokio::test]
    async fn bounding_box_filters_positions() {
        let store = InMemoryProfileStore::new();
        store
            .get_or_create(
                "inside",
                ProfilePatch {
                    lat: Some(37.50),
                    lon: Some(127.00),
                    ..Default::default()
                },
            )
            .await;
        store
            .get_or_create(
                "outside",
                ProfilePatch {
                    lat: Some(38.50),
                    lon: Some(127.00),
                    ..Default::default()
                },
            )
            .await;

        let hits = store.in_bounding_box(37.4, 37.6, 126.9, 127.1);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].user_id, "inside");
    }
}
