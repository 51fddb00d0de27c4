//! SQL 클라이언트의 에러 타입 계층 구조를 정의합니다.
//!
//! 모든 에러는 [`LkError`] enum으로 표현되며, [`thiserror`]를 통해
//! `Display` 및 `Error` 트레이트가 자동 구현됩니다.
//!
//! ## 분류
//!
//! | 변형 | 발생 시점 |
//! |---|---|
//! | [`LkError::Unauthorized`] | HTTP 401 |
//! | [`LkError::QueryNotFound`] | HTTP 404 + JSON 본문 |
//! | [`LkError::ServerNotFound`] | HTTP 404 + 비-JSON 본문 |
//! | [`LkError::Server`] | 그 외 비정상 상태 코드 |
//! | [`LkError::Context`] | 응답 수신 전 TLS 실패, 컨텍스트 설정 오류 |
//! | [`LkError::Decode`] | 표 형식 본문 디코딩 실패 |
//! | [`LkError::Transport`] | 타임아웃 등 그 외 전송 계층 실패 (변경 없이 전달) |

use serde_json::Value;

use crate::constants::{EXCEPTION_KEY, NO_RESPONSE_MESSAGE, context_messages, default_messages};
use crate::transport::{TransportError, WireResponse};

/// 응답 기반 에러의 공통 페이로드
///
/// 원본 응답과, 서버 에러 페이로드에서 추출한 메시지를 보존합니다.
/// 메시지 형식은 `"{status}: {message}"`이며, 응답이 없으면 `"No response received"`입니다.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct RequestError {
    /// 에러를 유발한 응답 (없을 수 있음)
    pub response: Option<WireResponse>,
    /// 서버가 반환한 JSON 에러 페이로드 전체 (`exception` 키가 있을 때만)
    pub server_exception: Option<Value>,
    /// 표시용 메시지
    pub message: String,
}

impl RequestError {
    /// 응답으로부터 에러를 생성합니다.
    ///
    /// 본문이 `exception` 키를 가진 JSON 객체이면 그 값을 메시지로 사용하고,
    /// 그렇지 않으면 `default_message`를 사용합니다.
    pub fn new(default_message: &str, response: Option<WireResponse>) -> Self {
        let Some(resp) = response else {
            return Self {
                response: None,
                server_exception: None,
                message: NO_RESPONSE_MESSAGE.to_string(),
            };
        };

        let mut msg = default_message.to_string();
        let mut server_exception = None;
        if let Ok(decoded) = resp.json() {
            if let Some(exception) = decoded.get(EXCEPTION_KEY) {
                msg = match exception {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                server_exception = Some(decoded);
            }
        }

        Self {
            message: format!("{}: {}", resp.status, msg),
            response: Some(resp),
            server_exception,
        }
    }

    /// 응답의 HTTP 상태 코드
    pub fn status(&self) -> Option<u16> {
        self.response.as_ref().map(|r| r.status)
    }
}

/// 응답을 받기 전에 발생한 서버 컨텍스트 수준의 실패
///
/// 메시지는 내부 실패의 **종류**로 결정됩니다: TLS 실패는 SSL 설정 안내 메시지,
/// 그 외(또는 내부 실패 없음)는 일반 안내 메시지입니다.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct ServerContextError {
    /// 표시용 메시지
    pub message: String,
    /// 원인이 된 전송 계층 실패
    #[source]
    pub inner: Option<TransportError>,
}

impl ServerContextError {
    /// 내부 실패로부터 컨텍스트 에러를 생성합니다.
    pub fn new(inner: Option<TransportError>) -> Self {
        Self {
            message: Self::message_for(inner.as_ref()).to_string(),
            inner,
        }
    }

    fn message_for(inner: Option<&TransportError>) -> &'static str {
        match inner {
            Some(TransportError::Tls(_)) => context_messages::SSL_MISMATCH,
            Some(TransportError::Timeout { .. })
            | Some(TransportError::Connect(_))
            | Some(TransportError::Other(_))
            | None => context_messages::GENERIC,
        }
    }

    /// TLS 협상 실패로 인한 에러인지 확인합니다.
    pub fn is_ssl(&self) -> bool {
        matches!(self.inner, Some(TransportError::Tls(_)))
    }
}

/// 표 형식 응답 본문 디코딩 에러
///
/// 선언된 와이어 타입은 서버와의 계약이므로, 비어 있지 않은 값의 파싱 실패는
/// null로 대체하지 않고 항상 이 에러로 전파됩니다.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DecodeError {
    /// 본문이 UTF-8이 아님
    #[error("response body is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),

    /// 컬럼명 헤더 레코드 없음
    #[error("missing column header record")]
    MissingHeader,

    /// 타입 헤더 레코드 없음
    #[error("missing type header record")]
    MissingTypeHeader,

    /// 타입 헤더 폭이 컬럼 수와 다름
    #[error("type header has {types} entries but there are {columns} columns")]
    TypeHeaderWidth { columns: usize, types: usize },

    /// 데이터 행 폭이 컬럼 수와 다름
    #[error("row {row} has {actual} fields, expected {expected}")]
    RowWidth {
        row: usize,
        expected: usize,
        actual: usize,
    },

    /// 선언된 타입으로 셀 값을 파싱할 수 없음
    #[error("column {column:?} row {row} ({wire_type}): cannot parse {value:?}: {detail}")]
    InvalidCell {
        column: String,
        row: usize,
        wire_type: String,
        value: String,
        detail: String,
    },
}

/// SQL 클라이언트의 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum LkError {
    /// 인증 실패 (HTTP 401)
    #[error(transparent)]
    Unauthorized(RequestError),

    /// 쿼리 수준의 리소스 없음 (HTTP 404, 본문이 JSON)
    #[error(transparent)]
    QueryNotFound(RequestError),

    /// 서버 리소스 경로 없음 (HTTP 404, 본문이 JSON이 아님)
    #[error(transparent)]
    ServerNotFound(RequestError),

    /// 그 외 서버 에러
    #[error(transparent)]
    Server(RequestError),

    /// 서버 컨텍스트 에러 (TLS 실패, 잘못된 설정)
    #[error(transparent)]
    Context(#[from] ServerContextError),

    /// 응답 본문 디코딩 에러
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    /// 타임아웃 등 전송 계층 에러 (변경 없이 전달)
    #[error(transparent)]
    Transport(TransportError),
}

impl LkError {
    /// 401 응답으로부터 인증 에러를 생성합니다.
    pub fn unauthorized(response: WireResponse) -> Self {
        LkError::Unauthorized(RequestError::new(
            default_messages::AUTHORIZATION_FAILED,
            Some(response),
        ))
    }

    /// 404 응답으로부터 쿼리 리소스 없음 에러를 생성합니다.
    pub fn query_not_found(response: WireResponse) -> Self {
        LkError::QueryNotFound(RequestError::new(
            default_messages::QUERY_NOT_FOUND,
            Some(response),
        ))
    }

    /// 404 응답으로부터 서버 리소스 없음 에러를 생성합니다.
    pub fn server_not_found(response: WireResponse) -> Self {
        LkError::ServerNotFound(RequestError::new(
            default_messages::SERVER_NOT_FOUND,
            Some(response),
        ))
    }

    /// 응답(또는 응답 없음)으로부터 일반 서버 에러를 생성합니다.
    pub fn server_error(response: Option<WireResponse>) -> Self {
        LkError::Server(RequestError::new(default_messages::SERVER_ERROR, response))
    }

    /// 응답 기반 에러이면 해당 [`RequestError`]를 반환합니다.
    pub fn request_error(&self) -> Option<&RequestError> {
        match self {
            LkError::Unauthorized(e)
            | LkError::QueryNotFound(e)
            | LkError::ServerNotFound(e)
            | LkError::Server(e) => Some(e),
            _ => None,
        }
    }

    /// 에러를 유발한 응답의 HTTP 상태 코드
    pub fn status(&self) -> Option<u16> {
        self.request_error().and_then(RequestError::status)
    }

    /// 전송 계층 타임아웃인지 확인합니다.
    pub fn is_timeout(&self) -> bool {
        matches!(self, LkError::Transport(TransportError::Timeout { .. }))
    }
}

/// TLS 실패는 컨텍스트 에러로 감싸고, 나머지 전송 실패는 그대로 전달합니다.
impl From<TransportError> for LkError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Tls(_) => LkError::Context(ServerContextError::new(Some(err))),
            other => LkError::Transport(other),
        }
    }
}

/// [`LkError`]를 사용하는 편의 Result 타입 별칭
pub type Result<T> = std::result::Result<T, LkError>;
