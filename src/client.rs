//! HTTP 클라이언트 모듈: reqwest 블로킹 클라이언트 기반 [`Transport`] 구현
//!
//! [`ReqwestTransport`]는 cookie_store를 활성화한 `reqwest::blocking::Client`로
//! 세션 쿠키를 자동 관리하며, 요청당 한 번의 블로킹 POST를 수행합니다.
//!
//! ## 에러 분류
//!
//! | reqwest 에러 | [`TransportError`] |
//! |---|---|
//! | `is_timeout()` | [`Timeout`](TransportError::Timeout) |
//! | 원인 체인에 TLS/인증서 실패 | [`Tls`](TransportError::Tls) |
//! | `is_connect()` | [`Connect`](TransportError::Connect) |
//! | 그 외 | [`Other`](TransportError::Other) |

use std::error::Error as StdError;
use std::time::Duration;

use reqwest::blocking::Client;

use crate::constants::USER_AGENT;
use crate::context::ServerConfig;
use crate::error::{Result, ServerContextError};
use crate::transport::{Transport, TransportError, WireResponse};

/// 원인 체인 메시지에서 TLS 협상 실패를 식별하는 소문자 표지
const TLS_MARKERS: &[&str] = &["tls", "ssl", "certificate", "handshake"];

/// reqwest 블로킹 클라이언트 기반 전송 계층
///
/// # 예시
///
/// ```no_run
/// use lkquery::client::ReqwestTransport;
/// use lkquery::context::{ServerConfig, ServerContext};
///
/// # fn example() -> lkquery::Result<()> {
/// let config = ServerConfig::new("www.example.org", "home").with_context_path("labkey");
/// let transport = ReqwestTransport::new(&config)?;
/// let context = ServerContext::new(config, transport)?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    http: Client,
}

impl ReqwestTransport {
    /// 설정으로부터 새 전송 계층을 생성합니다.
    ///
    /// `verify_ssl`이 `false`이면 서버 인증서 검증을 건너뜁니다.
    ///
    /// # 에러
    ///
    /// - [`LkError::Context`](crate::error::LkError::Context): 클라이언트 초기화 실패
    pub fn new(config: &ServerConfig) -> Result<Self> {
        let http = Client::builder()
            .cookie_store(true)
            .user_agent(USER_AGENT)
            .danger_accept_invalid_certs(!config.verify_ssl)
            .build()
            .map_err(|e| ServerContextError::new(Some(classify_error(e, None))))?;
        Ok(Self::with_client(http))
    }

    /// 이미 구성된 reqwest 클라이언트를 감쌉니다.
    ///
    /// 프록시나 루트 인증서 등 [`ServerConfig`]로 표현할 수 없는 설정이 필요할 때 사용합니다.
    pub fn with_client(http: Client) -> Self {
        Self { http }
    }
}

impl Transport for ReqwestTransport {
    fn post(
        &self,
        url: &str,
        form: &[(String, String)],
        headers: &[(String, String)],
        timeout: Duration,
    ) -> std::result::Result<WireResponse, TransportError> {
        let mut request = self.http.post(url).form(form).timeout(timeout);
        for (name, value) in headers {
            request = request.header(name, value);
        }

        let resp = request
            .send()
            .map_err(|e| classify_error(e, Some(timeout)))?;
        let status = resp.status().as_u16();
        let body = resp
            .bytes()
            .map_err(|e| classify_error(e, Some(timeout)))?
            .to_vec();

        Ok(WireResponse::new(status, body, url))
    }
}

/// reqwest 에러를 [`TransportError`]로 분류합니다.
fn classify_error(err: reqwest::Error, timeout: Option<Duration>) -> TransportError {
    if err.is_timeout() {
        if let Some(timeout) = timeout {
            return TransportError::Timeout { timeout };
        }
    }
    if is_tls_failure(&err) {
        TransportError::Tls(Box::new(err))
    } else if err.is_connect() {
        TransportError::Connect(Box::new(err))
    } else {
        TransportError::Other(Box::new(err))
    }
}

/// 에러 원인 체인에 TLS 협상 실패가 있는지 확인합니다.
///
/// reqwest는 TLS 실패를 별도 종류로 노출하지 않으므로 원인 메시지로 판별합니다.
/// 최상위 메시지는 요청 URL을 포함하므로 검사하지 않습니다.
fn is_tls_failure(err: &(dyn StdError + 'static)) -> bool {
    let mut current = err.source();
    while let Some(e) = current {
        let msg = e.to_string().to_ascii_lowercase();
        if TLS_MARKERS.iter().any(|marker| msg.contains(marker)) {
            return true;
        }
        current = e.source();
    }
    false
}
