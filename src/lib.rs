//! Huddle 주변 활동 매칭 서버
//!
//! 등록된 사용자의 활동 요청을 주변 사용자에게 브로드캐스트하고,
//! 수락자들로 임시 그룹 채팅방을 구성하는 실시간 WebSocket 서버.

pub mod collab;
pub mod config;
pub mod error;
pub mod groups;
pub mod handlers;
pub mod matching;
pub mod protocol;
pub mod registry;
pub mod rooms;
pub mod server;
pub mod state;
