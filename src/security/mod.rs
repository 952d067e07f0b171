//! 安全模块
//!
//! 响应安全头、请求 ID，以及备忘编辑令牌的比较。

pub mod middleware;

pub use middleware::{REQUEST_ID_HEADER, request_id_middleware, security_headers_middleware};

/// 常量时间比较，避免通过耗时推断令牌内容
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
