//! 지오 후보 소스 협력자

use crate::collab::profiles::InMemoryProfileStore;
use crate::matching::Candidate;
use async_trait::async_trait;
use std::sync::Arc;

/// 지구 반경 (km)
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// 두 좌표 사이의 하버사인 거리 (km)
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let d_phi = (lat2 - lat1).to_radians();
    let d_lambda = (lon2 - lon1).to_radians();

    let h = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * h.sqrt().atan2((1.0 - h).sqrt())
}

/// 반경 내 후보 조회 인터페이스
#[async_trait]
pub trait GeoCandidateSource: Send + Sync {
    /// 요청자를 제외한 반경 내 사용자, 거리 오름차순
    async fn nearby(&self, lat: f64, lon: f64, max_km: f64, exclude: &str) -> Vec<Candidate>;
}

/// 프로필 저장소 위에서 동작하는 인메모리 지오 소스
pub struct InMemoryGeoSource {
    profiles: Arc<InMemoryProfileStore>,
}

impl InMemoryGeoSource {
    pub fn new(profiles: Arc<InMemoryProfileStore>) -> Self {
        Self { profiles }
    }
}

#[async_trait]
impl GeoCandidateSource for InMemoryGeoSource {
    async fn nearby(&self, lat: f64, lon: f64, max_km: f64, exclude: &str) -> Vec<Candidate> {
        // 경계 상자로 후보를 거른 뒤 하버사인으로 정밀 필터
        let lat_delta = (max_km / EARTH_RADIUS_KM).to_degrees();
        let lon_delta = (max_km / (EARTH_RADIUS_KM * lat.to_radians().cos())).to_degrees();

        let mut candidates: Vec<Candidate> = self
            .profiles
            .in_bounding_box(lat - lat_delta, lat + lat_delta, lon - lon_delta, lon + lon_delta)
            .into_iter()
            .filter(|p| p.user_id != exclude)
            .filter_map(|p| {
                let distance_km = haversine_km(lat, lon, p.lat, p.lon);
                (distance_km <= max_km).then(|| Candidate {
                    identity: p.user_id,
                    interests: p.interests,
                    distance_km,
                })
            })
            .collect();
        candidates.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));
        candidates
    }
}
