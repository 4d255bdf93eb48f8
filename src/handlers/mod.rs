//! 핸들러 모듈

pub mod broadcast;
pub mod connection;
pub mod room;

pub use broadcast::*;
pub use connection::*;
pub use room::*;
