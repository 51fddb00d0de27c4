//! 전송 계층 추상화: 서버 컨텍스트가 보유하는 HTTP 세션 인터페이스
//!
//! 코어는 [`Transport`] 트레이트를 통해서만 네트워크에 접근합니다.
//! 기본 구현은 feature `"client"`의 [`ReqwestTransport`](crate::client::ReqwestTransport)이며,
//! 테스트에서는 메모리 내 가짜 구현을 주입할 수 있습니다.

use std::time::Duration;

/// 전송 계층 에러의 원인을 담는 boxed 에러
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// 응답을 받기 전에 전송 계층에서 발생한 실패
///
/// [`Tls`](Self::Tls)만 서버 컨텍스트 에러로 감싸지고,
/// 나머지는 [`LkError::Transport`](crate::error::LkError::Transport)로 그대로 전달됩니다.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// 보안 연결(TLS) 협상 실패
    #[error("secure connection failed: {0}")]
    Tls(#[source] BoxError),

    /// 요청별 타임아웃 만료
    #[error("request timed out after {}s", .timeout.as_secs())]
    Timeout { timeout: Duration },

    /// 연결 수립 실패 (DNS, 연결 거부 등)
    #[error("connection failed: {0}")]
    Connect(#[source] BoxError),

    /// 기타 전송 실패
    #[error("transport failure: {0}")]
    Other(#[source] BoxError),
}

/// 전송 계층이 반환한 원시 HTTP 응답
///
/// 상태 코드와 본문 바이트만 보존합니다. 한 번 소비되면 버려집니다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireResponse {
    /// HTTP 상태 코드
    pub status: u16,
    /// 응답 본문 원시 바이트
    pub body: Vec<u8>,
    /// 요청한 URL (진단용)
    pub url: String,
}

impl WireResponse {
    /// 새 응답을 생성합니다.
    pub fn new(status: u16, body: impl Into<Vec<u8>>, url: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
            url: url.into(),
        }
    }

    /// 본문을 JSON으로 디코딩합니다.
    pub fn json(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::from_slice(&self.body)
    }

    /// 본문을 손실 허용 UTF-8 문자열로 반환합니다 (실패 로그의 본문 미리보기에 사용).
    pub fn text_lossy(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// 서버 컨텍스트에 주입되는 HTTP 세션
///
/// 구현체는 요청 하나당 정확히 한 번 블로킹 POST를 수행하고,
/// `timeout`을 하드 상한으로 강제해야 합니다. 재시도는 하지 않습니다.
pub trait Transport {
    /// `form`을 form-urlencoded 본문으로 `url`에 POST합니다.
    fn post(
        &self,
        url: &str,
        form: &[(String, String)],
        headers: &[(String, String)],
        timeout: Duration,
    ) -> Result<WireResponse, TransportError>;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn post(
        &self,
        url: &str,
        form: &[(String, String)],
        headers: &[(String, String)],
        timeout: Duration,
    ) -> Result<WireResponse, TransportError> {
        (**self).post(url, form, headers, timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_response_json_object() {
        let resp = WireResponse::new(404, r#"{"exception":"bad schema"}"#, "http://x");
        let value = resp.json().unwrap();
        assert_eq!(value["exception"], "bad schema");
    }

    #[test]
    fn test_wire_response_json_invalid() {
        let resp = WireResponse::new(404, "<html>not found</html>", "http://x");
        assert!(resp.json().is_err());
    }

    #[test]
    fn test_text_lossy_replaces_invalid_bytes() {
        let resp = WireResponse::new(500, vec![b'o', b'k', 0xFF], "http://x");
        assert!(resp.text_lossy().starts_with("ok"));
    }

    #[test]
    fn test_timeout_display() {
        let err = TransportError::Timeout {
            timeout: Duration::from_secs(300),
        };
        assert_eq!(err.to_string(), "request timed out after 300s");
    }

    #[test]
    fn test_tls_display_includes_source() {
        let err = TransportError::Tls("certificate unknown".into());
        assert_eq!(
            err.to_string(),
            "secure connection failed: certificate unknown"
        );
    }
}
