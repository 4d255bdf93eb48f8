//! 키워드 추출 협력자

use async_trait::async_trait;
use std::collections::HashSet;

/// 추출 대상 토큰의 최소 길이
const MIN_TOKEN_LEN: usize = 3;

/// 요청 문장에서 걸러낼 영어 기능어
const STOPWORDS: &[&str] = &[
    "about", "after", "all", "and", "any", "anybody", "anyone", "are", "around", "been",
    "before", "but", "can", "come", "could", "does", "doing", "down", "for", "from", "get",
    "going", "gonna", "got", "has", "have", "her", "here", "him", "his", "how", "its", "just",
    "let", "lets", "like", "looking", "near", "nearby", "need", "not", "now", "our", "out",
    "she", "some", "somebody", "someone", "that", "the", "their", "them", "then", "there",
    "they", "this", "wanna", "want", "wants", "was", "were", "what", "when", "where", "who",
    "will", "with", "would", "you", "your",
];

/// 요청 텍스트 키워드 추출 인터페이스
#[async_trait]
pub trait KeywordExtractor: Send + Sync {
    /// 소문자 키워드 목록 (빈 결과 허용)
    async fn extract(&self, text: &str) -> Vec<String>;
}

/// 불용어 제거 기반 로컬 추출기
pub struct StopwordKeywordExtractor;

#[async_trait]
impl KeywordExtractor for StopwordKeywordExtractor {
    async fn extract(&self, text: &str) -> Vec<String> {
        let mut seen = HashSet::new();
        text.to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|token| token.len() >= MIN_TOKEN_LEN)
            .filter(|token| !STOPWORDS.contains(token))
            .filter(|token| seen.insert(token.to_string()))
            .map(|token| token.to_string())
            .collect()
    }
}
