//! 서버 컨텍스트: 전송 세션과 주소 설정을 담는 capability 묶음
//!
//! [`ServerContext`]는 호출자가 생성하여 API에 전달하며, 코어는 요청을 보내는 것 외에
//! 컨텍스트를 변경하지 않습니다. 같은 컨텍스트를 순차 호출에 재사용할 수 있습니다.
//!
//! ## URL 형식
//!
//! ```text
//! {http|https}://{domain}[/{context_path}]/{controller}/{container_path}/{action}
//! ```
//!
//! 경로 세그먼트는 각각 퍼센트 인코딩됩니다.

use std::collections::BTreeMap;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::error::{Result, ServerContextError};
use crate::query::{QueryRequest, execute_sql};
use crate::transport::Transport;
use crate::types::ParsedTable;

/// 서버 주소 설정
///
/// serde로 직렬화/역직렬화할 수 있으며, 지정하지 않은 필드는 [`Default`] 값을 사용합니다.
///
/// ```
/// use lkquery::context::ServerConfig;
///
/// let config: ServerConfig = serde_json::from_str(
///     r#"{"domain": "www.example.org", "context_path": "labkey", "container_path": "home"}"#,
/// ).unwrap();
/// assert!(config.use_ssl);
/// assert!(config.verify_ssl);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// 서버 호스트 (포트 포함 가능, 예: `"localhost:8080"`)
    pub domain: String,
    /// 웹 애플리케이션 컨텍스트 경로 (예: `"labkey"`)
    pub context_path: Option<String>,
    /// 기본 컨테이너 경로 (요청별로 덮어쓸 수 있음)
    pub container_path: Option<String>,
    /// `https` 사용 여부
    pub use_ssl: bool,
    /// 서버 인증서 검증 여부
    pub verify_ssl: bool,
    /// 모든 요청에 추가할 HTTP 헤더
    pub headers: BTreeMap<String, String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            domain: String::new(),
            context_path: None,
            container_path: None,
            use_ssl: true,
            verify_ssl: true,
            headers: BTreeMap::new(),
        }
    }
}

impl ServerConfig {
    /// 도메인과 기본 컨테이너 경로로 설정을 생성합니다.
    pub fn new(domain: impl Into<String>, container_path: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            container_path: Some(container_path.into()),
            ..Self::default()
        }
    }

    pub fn with_context_path(mut self, context_path: impl Into<String>) -> Self {
        self.context_path = Some(context_path.into());
        self
    }

    pub fn with_ssl(mut self, use_ssl: bool) -> Self {
        self.use_ssl = use_ssl;
        self
    }

    pub fn with_verify_ssl(mut self, verify_ssl: bool) -> Self {
        self.verify_ssl = verify_ssl;
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }
}

/// 경로 문자열을 `/`로 나누어 비어 있지 않은 세그먼트만 인코딩하여 붙입니다.
fn push_segments(url: &mut String, path: &str) {
    for segment in path.split('/').filter(|s| !s.is_empty()) {
        url.push('/');
        url.push_str(&urlencoding::encode(segment));
    }
}

/// 전송 세션과 주소 설정을 보유하는 서버 컨텍스트
pub struct ServerContext {
    config: ServerConfig,
    transport: Box<dyn Transport>,
}

impl ServerContext {
    /// 설정과 전송 계층으로 컨텍스트를 생성합니다.
    ///
    /// # 에러
    ///
    /// - [`LkError::Context`](crate::error::LkError::Context): 도메인이 비어 있음
    pub fn new(config: ServerConfig, transport: impl Transport + 'static) -> Result<Self> {
        if config.domain.trim().is_empty() {
            warn!("[LK_CTX] Server context has an empty domain");
            return Err(ServerContextError::new(None).into());
        }
        Ok(Self {
            config,
            transport: Box::new(transport),
        })
    }

    /// 설정으로부터 reqwest 기반 전송 계층을 만들어 컨텍스트를 생성합니다.
    #[cfg(feature = "client")]
    pub fn connect(config: ServerConfig) -> Result<Self> {
        let transport = crate::client::ReqwestTransport::new(&config)?;
        Self::new(config, transport)
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn transport(&self) -> &dyn Transport {
        self.transport.as_ref()
    }

    /// 모든 요청에 추가할 헤더 목록
    pub fn headers(&self) -> Vec<(String, String)> {
        self.config
            .headers
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// 컨트롤러/액션에 대한 요청 URL을 생성합니다.
    ///
    /// `container_path`가 `None`이면 설정의 기본 컨테이너 경로를 사용합니다.
    ///
    /// # 에러
    ///
    /// - [`LkError::Context`](crate::error::LkError::Context): 컨테이너 경로가 어디에도 없음
    pub fn build_url(
        &self,
        controller: &str,
        action: &str,
        container_path: Option<&str>,
    ) -> Result<String> {
        let Some(container) = container_path.or(self.config.container_path.as_deref()) else {
            warn!("[LK_CTX] No container path in request or server context");
            return Err(ServerContextError::new(None).into());
        };

        let scheme = if self.config.use_ssl { "https" } else { "http" };
        let mut url = format!(
            "{}://{}",
            scheme,
            self.config.domain.trim().trim_end_matches('/')
        );
        if let Some(context_path) = &self.config.context_path {
            push_segments(&mut url, context_path);
        }
        push_segments(&mut url, controller);
        push_segments(&mut url, container);
        push_segments(&mut url, action);
        Ok(url)
    }

    /// [`execute_sql`]의 편의 메서드
    pub fn execute_sql(&self, request: &QueryRequest) -> Result<ParsedTable> {
        execute_sql(self, request)
    }
}

impl std::fmt::Debug for ServerContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerContext")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LkError;
    use crate::transport::{TransportError, WireResponse};
    use std::time::Duration;

    struct NoopTransport;

    impl Transport for NoopTransport {
        fn post(
            &self,
            url: &str,
            _form: &[(String, String)],
            _headers: &[(String, String)],
            _timeout: Duration,
        ) -> std::result::Result<WireResponse, TransportError> {
            Ok(WireResponse::new(500, "", url))
        }
    }

    fn context(config: ServerConfig) -> ServerContext {
        ServerContext::new(config, NoopTransport).unwrap()
    }

    #[test]
    fn test_build_url_with_context_path() {
        let ctx = context(ServerConfig::new("www.example.org", "home").with_context_path("labkey"));
        let url = ctx.build_url("sql", "execute.api", None).unwrap();
        assert_eq!(url, "https://www.example.org/labkey/sql/home/execute.api");
    }

    #[test]
    fn test_build_url_without_context_path_plain_http() {
        let ctx = context(ServerConfig::new("localhost:8080", "/home/").with_ssl(false));
        let url = ctx.build_url("sql", "execute.api", None).unwrap();
        assert_eq!(url, "http://localhost:8080/sql/home/execute.api");
    }

    #[test]
    fn test_build_url_override_container() {
        let ctx = context(ServerConfig::new("example.org", "home"));
        let url = ctx
            .build_url("sql", "execute.api", Some("/Studies/My Study"))
            .unwrap();
        assert_eq!(url, "https://example.org/sql/Studies/My%20Study/execute.api");
    }

    #[test]
    fn test_build_url_without_container_is_context_error() {
        let config = ServerConfig {
            domain: "example.org".to_string(),
            ..ServerConfig::default()
        };
        let err = context(config)
            .build_url("sql", "execute.api", None)
            .unwrap_err();
        assert!(matches!(err, LkError::Context(ref c) if !c.is_ssl()));
        assert_eq!(
            err.to_string(),
            "Please verify server_context is configured correctly"
        );
    }

    #[test]
    fn test_empty_domain_rejected() {
        let err = ServerContext::new(ServerConfig::new("  ", "home"), NoopTransport).unwrap_err();
        assert!(matches!(err, LkError::Context(_)));
    }

    #[test]
    fn test_headers_from_config() {
        let ctx = context(
            ServerConfig::new("example.org", "home")
                .with_header("X-Custom", "1")
                .with_header("Accept", "text/plain"),
        );
        assert_eq!(
            ctx.headers(),
            vec![
                ("Accept".to_string(), "text/plain".to_string()),
                ("X-Custom".to_string(), "1".to_string()),
            ]
        );
    }

    #[test]
    fn test_config_defaults_from_partial_json() {
        let config: ServerConfig =
            serde_json::from_str(r#"{"domain": "example.org", "use_ssl": false}"#).unwrap();
        assert_eq!(config.domain, "example.org");
        assert!(!config.use_ssl);
        assert!(config.verify_ssl);
        assert!(config.container_path.is_none());
        assert!(config.headers.is_empty());
    }

    #[test]
    fn test_debug_omits_transport() {
        let ctx = context(ServerConfig::new("example.org", "home"));
        let dbg = format!("{ctx:?}");
        assert!(dbg.contains("example.org"));
        assert!(dbg.contains(".."));
    }
}
