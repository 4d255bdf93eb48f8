//! 환경 변수 기반 설정 관리

use std::env;

/// 서버 설정
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub host: String,
    #[allow(dead_code)]
    pub cors_origins: Vec<String>,
    pub matching: MatchConfig,
    pub log_level: String,
}

/// 매칭 기본값 설정
#[derive(Debug, Clone)]
pub struct MatchConfig {
    /// 브로드캐스트 탐색 반경 기본값 (km)
    pub default_max_km: f64,
    /// 점수 임계값 기본값 (0.0이면 반경 내 전원 허용)
    pub default_threshold: f64,
    /// 그룹 최대 인원 기본값
    pub default_max_group: usize,
    /// 키워드 추출 실패 시 부분 문자열 일치로 쓰는 폴백 용어
    pub fallback_keyword: String,
    /// 협력자 호출 제한 시간 (ms)
    pub collab_timeout_ms: u64,
}

impl Config {
    /// 환경 변수에서 설정 로드
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            port: env::var("PORT")
                .unwrap_or_else(|_| "5702".to_string())
                .parse()
                .unwrap_or(5702),
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            cors_origins: env::var("CORS_ORIGINS")
                .unwrap_or_else(|_| "http://localhost:3000".to_string())
                .split(',')
                .map(|s| s.trim().to_string())
                .collect(),
            matching: MatchConfig {
                default_max_km: env::var("MATCH_DEFAULT_MAX_KM")
                    .unwrap_or_else(|_| "5.0".to_string())
                    .parse()
                    .unwrap_or(5.0),
                default_threshold: env::var("MATCH_DEFAULT_THRESHOLD")
                    .unwrap_or_else(|_| "0.0".to_string())
                    .parse()
                    .unwrap_or(0.0),
                default_max_group: env::var("MATCH_DEFAULT_MAX_GROUP")
                    .unwrap_or_else(|_| "10".to_string())
                    .parse()
                    .unwrap_or(10),
                fallback_keyword: env::var("MATCH_FALLBACK_KEYWORD")
                    .unwrap_or_else(|_| "tennis".to_string())
                    .to_lowercase(),
                collab_timeout_ms: env::var("MATCH_COLLAB_TIMEOUT_MS")
                    .unwrap_or_else(|_| "3000".to_string())
                    .parse()
                    .unwrap_or(3000),
            },
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        }
    }
}
