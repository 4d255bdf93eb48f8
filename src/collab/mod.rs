//! 외부 협력자 인터페이스 모듈

pub mod geo;
pub mod keywords;
pub mod profiles;

pub use geo::*;
pub use keywords::*;
pub use profiles::*;
