//! 키워드 점수 계산 및 후보 선발 엔진

use std::collections::HashSet;

/// 그룹 최대 인원 기본값
pub const DEFAULT_MAX_GROUP: usize = 10;

/// 지오 소스가 전달하는 반경 내 후보
#[derive(Debug, Clone)]
pub struct Candidate {
    pub identity: String,
    pub interests: Vec<String>,
    pub distance_km: f64,
}

/// 선발 결과 항목
#[derive(Debug, Clone, PartialEq)]
pub struct Selected {
    pub identity: String,
    pub distance_km: f64,
    pub score: f64,
}

/// 키워드 일치율로 후보를 선발한다
///
/// 점수는 후보의 소문자 관심사 집합에 존재하는 키워드 비율.
/// 높은 점수 우선, 동점은 가까운 거리 우선으로 정렬 후
/// `max_group` 인원으로 자른다. 후보나 키워드가 비어도 오류 없이
/// 빈 선발을 반환한다.
pub fn rank(
    candidates: &[Candidate],
    keywords: &[String],
    threshold: f64,
    max_group: usize,
) -> Vec<Selected> {
    let mut kept: Vec<Selected> = Vec::new();

    for candidate in candidates {
        let interests: HashSet<String> = candidate
            .interests
            .iter()
            .map(|s| s.to_lowercase())
            .collect();
        let hits = keywords
            .iter()
            .filter(|kw| interests.contains(kw.as_str()))
            .count();
        let score = if keywords.is_empty() {
            0.0
        } else {
            hits as f64 / keywords.len() as f64
        };

        // 임계값 0.0은 반경 내 전원 허용 모드
        if score > 0.0 || threshold == 0.0 {
            kept.push(Selected {
                identity: candidate.identity.clone(),
                distance_km: candidate.distance_km,
                score,
            });
        }
    }

    // 안정 정렬이라 동률은 입력(거리 오름차순) 순서를 보존한다
    kept.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then(a.distance_km.total_cmp(&b.distance_km))
    });
    kept.truncate(max_group);
    kept
}

/// 미지정 또는 0 이하의 max_group을 기본값으로 보정
pub fn effective_max_group(requested: Option<i64>, default: usize) -> usize {
    match requested {
        Some(v) if v > 0 => v as usize,
        _ => default,
    }
}
