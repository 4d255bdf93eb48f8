//! 애플리케이션 상태 관리

use crate::collab::{
    GeoCandidateSource, InMemoryGeoSource, InMemoryProfileStore, KeywordExtractor, ProfileStore,
    StopwordKeywordExtractor,
};
use crate::config::Config;
use crate::groups::GroupHub;
use crate::registry::ConnectionRegistry;
use crate::rooms::RoomStore;
use std::sync::Arc;

/// 전역 애플리케이션 상태
pub struct AppState {
    /// 연결 레지스트리 (connection_id <-> identity)
    pub registry: ConnectionRegistry,
    /// 방 멤버십 저장소
    pub rooms: RoomStore,
    /// 그룹 브로드캐스트 구독 매핑
    pub groups: GroupHub,
    /// 프로필 저장소 협력자
    pub profiles: Arc<dyn ProfileStore>,
    /// 지오 후보 소스 협력자
    pub geo: Arc<dyn GeoCandidateSource>,
    /// 키워드 추출 협력자
    pub keywords: Arc<dyn KeywordExtractor>,
    /// 설정
    pub config: Arc<Config>,
}

impl AppState {
    /// 인메모리 협력자로 상태 구성
    pub fn new(config: Config) -> Self {
        let profiles = Arc::new(InMemoryProfileStore::new());
        let geo = Arc::new(InMemoryGeoSource::new(profiles.clone()));
        Self::with_collaborators(config, profiles, geo, Arc::new(StopwordKeywordExtractor))
    }

    /// 외부 협력자 구현을 주입해 상태 구성
    pub fn with_collaborators(
        config: Config,
        profiles: Arc<dyn ProfileStore>,
        geo: Arc<dyn GeoCandidateSource>,
        keywords: Arc<dyn KeywordExtractor>,
    ) -> Self {
        Self {
            registry: ConnectionRegistry::new(),
            rooms: RoomStore::new(),
            groups: GroupHub::new(),
            profiles,
            geo,
            keywords,
            config: Arc::new(config),
        }
    }
}
