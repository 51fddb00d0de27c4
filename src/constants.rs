//! SQL 실행 프로토콜에서 사용하는 구분자, 리소스 경로, 기본 메시지 상수를 정의합니다.

use std::time::Duration;

/// 필드 구분자: Unit Separator(0x1F) + TAB
pub const FIELD_SEPARATOR: &str = "\x1F\t";

/// 레코드 구분자: Record Separator(0x1E) + LF
pub const RECORD_SEPARATOR: &str = "\x1E\n";

/// SQL 실행 컨트롤러 이름
pub const SQL_CONTROLLER: &str = "sql";

/// SQL 실행 액션 이름
pub const EXECUTE_ACTION: &str = "execute.api";

/// 요청당 기본 타임아웃 (5분)
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60 * 5);

/// HTTP 클라이언트 User-Agent 문자열
pub const USER_AGENT: &str = concat!("lkquery/", env!("CARGO_PKG_VERSION"));

/// 서버 에러 페이로드에서 메시지를 담는 JSON 키
pub const EXCEPTION_KEY: &str = "exception";

/// 응답 객체 자체가 없을 때의 에러 메시지
pub const NO_RESPONSE_MESSAGE: &str = "No response received";

/// 응답 기반 에러의 종류별 기본 메시지
pub mod default_messages {
    /// 일반 서버 에러
    pub const SERVER_ERROR: &str = "Server Error";
    /// 쿼리 리소스를 찾을 수 없음 (404 + JSON 본문)
    pub const QUERY_NOT_FOUND: &str = "Query Resource Not Found";
    /// 인증 실패 (401)
    pub const AUTHORIZATION_FAILED: &str = "Authorization Failed";
    /// 서버 리소스를 찾을 수 없음 (404 + 비-JSON 본문)
    pub const SERVER_NOT_FOUND: &str =
        "Server resource not found. Please verify context path and project path are valid";
}

/// 서버 컨텍스트 에러 메시지
pub mod context_messages {
    /// 보안 연결(TLS) 협상 실패
    pub const SSL_MISMATCH: &str =
        "Failed to match server SSL configuration. Ensure the server_context is configured correctly.";
    /// 그 외 모든 컨텍스트 실패
    pub const GENERIC: &str = "Please verify server_context is configured correctly";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_separator_bytes() {
        assert_eq!(FIELD_SEPARATOR.as_bytes(), &[0x1F, b'\t']);
    }

    #[test]
    fn test_record_separator_bytes() {
        assert_eq!(RECORD_SEPARATOR.as_bytes(), &[0x1E, b'\n']);
    }

    #[test]
    fn test_default_timeout_is_five_minutes() {
        assert_eq!(DEFAULT_TIMEOUT.as_secs(), 300);
    }

    #[test]
    fn test_execute_resource_path() {
        assert_eq!(SQL_CONTROLLER, "sql");
        assert_eq!(EXECUTE_ACTION, "execute.api");
    }

    #[test]
    fn test_user_agent_has_crate_name() {
        assert!(USER_AGENT.starts_with("lkquery/"));
    }
}
