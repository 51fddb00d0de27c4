//! SQL 실행 API: 요청 조립 + 전송 + 응답 라우팅
//!
//! [`execute_sql`]는 서버 컨텍스트를 통해 `sql/execute.api`로 요청을 보내고
//! 응답을 [`ParsedTable`]로 디코딩합니다.
//!
//! ## 흐름
//!
//! 1. [`ServerContext::build_url`]: 대상 URL 생성
//! 2. [`build_execute_sql_form`]: form 페이로드 조립 (지정된 선택 필드만 포함)
//! 3. [`make_request`]: 전송 계층 POST, TLS 실패는 컨텍스트 에러로 변환
//! 4. [`handle_response`]: 상태 코드 라우팅 및 본문 디코딩
//!
//! 요청은 호출당 정확히 한 번 전송되며, 내부 재시도는 없습니다.

use std::time::{Duration, Instant};

use log::{debug, warn};

use crate::codec::{build_execute_sql_form, handle_response};
use crate::constants::{DEFAULT_TIMEOUT, EXECUTE_ACTION, SQL_CONTROLLER};
use crate::context::ServerContext;
use crate::error::Result;
use crate::types::ParsedTable;

/// 쿼리가 대상으로 삼을 컨테이너 범위
///
/// 서버가 정의한 이름 외의 값은 [`Other`](Self::Other)로 그대로 전달합니다.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ContainerFilter {
    /// 현재 컨테이너만
    Current,
    /// 현재 컨테이너와 하위 폴더
    CurrentAndSubfolders,
    /// 현재 컨테이너와 프로젝트
    CurrentPlusProject,
    /// 현재 컨테이너와 상위 폴더
    CurrentAndParents,
    /// 현재 컨테이너, 프로젝트, Shared 프로젝트
    CurrentPlusProjectAndShared,
    /// 모든 폴더
    AllFolders,
    /// 그 외 서버 정의 필터명
    Other(String),
}

impl ContainerFilter {
    /// 서버에 전송되는 필터명
    pub fn as_str(&self) -> &str {
        match self {
            ContainerFilter::Current => "Current",
            ContainerFilter::CurrentAndSubfolders => "CurrentAndSubfolders",
            ContainerFilter::CurrentPlusProject => "CurrentPlusProject",
            ContainerFilter::CurrentAndParents => "CurrentAndParents",
            ContainerFilter::CurrentPlusProjectAndShared => "CurrentPlusProjectAndShared",
            ContainerFilter::AllFolders => "AllFolders",
            ContainerFilter::Other(name) => name,
        }
    }
}

impl From<&str> for ContainerFilter {
    fn from(name: &str) -> Self {
        match name {
            "Current" => ContainerFilter::Current,
            "CurrentAndSubfolders" => ContainerFilter::CurrentAndSubfolders,
            "CurrentPlusProject" => ContainerFilter::CurrentPlusProject,
            "CurrentAndParents" => ContainerFilter::CurrentAndParents,
            "CurrentPlusProjectAndShared" => ContainerFilter::CurrentPlusProjectAndShared,
            "AllFolders" => ContainerFilter::AllFolders,
            other => ContainerFilter::Other(other.to_string()),
        }
    }
}

impl std::fmt::Display for ContainerFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// SQL 실행 요청
///
/// 스키마명과 SQL은 필수이며, 나머지는 모두 선택입니다.
/// 선택 필드는 [`QueryRequest::builder`]로 지정하며, 생성된 요청은 변경되지 않습니다.
///
/// # 예시
///
/// ```
/// use lkquery::query::QueryRequest;
/// use std::time::Duration;
///
/// let request = QueryRequest::builder("lists", "SELECT Name FROM People")
///     .max_rows(50)
///     .sort("Name")
///     .timeout(Duration::from_secs(30))
///     .build();
/// assert_eq!(request.max_rows(), Some(50));
/// assert_eq!(request.offset(), None);
/// assert_eq!(request.timeout(), Duration::from_secs(30));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct QueryRequest {
    schema_name: String,
    sql: String,
    container_path: Option<String>,
    max_rows: Option<i64>,
    sort: Option<String>,
    offset: Option<u64>,
    container_filter: Option<ContainerFilter>,
    save_in_session: Option<bool>,
    parameters: Option<String>,
    api_version: Option<f64>,
    timeout: Duration,
}

impl QueryRequest {
    /// 필수 필드만으로 새 요청을 생성합니다. 타임아웃은 [`DEFAULT_TIMEOUT`] (5분)입니다.
    pub fn new(schema_name: impl Into<String>, sql: impl Into<String>) -> Self {
        Self {
            schema_name: schema_name.into(),
            sql: sql.into(),
            container_path: None,
            max_rows: None,
            sort: None,
            offset: None,
            container_filter: None,
            save_in_session: None,
            parameters: None,
            api_version: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// 선택 필드를 지정하기 위한 빌더를 생성합니다.
    pub fn builder(schema_name: impl Into<String>, sql: impl Into<String>) -> QueryRequestBuilder {
        QueryRequestBuilder {
            request: Self::new(schema_name, sql),
        }
    }

    pub fn schema_name(&self) -> &str {
        &self.schema_name
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// 서버 컨텍스트의 기본 경로 대신 사용할 컨테이너 경로
    pub fn container_path(&self) -> Option<&str> {
        self.container_path.as_deref()
    }

    pub fn max_rows(&self) -> Option<i64> {
        self.max_rows
    }

    pub fn sort(&self) -> Option<&str> {
        self.sort.as_deref()
    }

    pub fn offset(&self) -> Option<u64> {
        self.offset
    }

    pub fn container_filter(&self) -> Option<&ContainerFilter> {
        self.container_filter.as_ref()
    }

    pub fn save_in_session(&self) -> Option<bool> {
        self.save_in_session
    }

    pub fn parameters(&self) -> Option<&str> {
        self.parameters.as_deref()
    }

    pub fn api_version(&self) -> Option<f64> {
        self.api_version
    }

    /// 요청 타임아웃 (기본 5분)
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

/// [`QueryRequest`] 빌더
#[derive(Debug, Clone)]
pub struct QueryRequestBuilder {
    request: QueryRequest,
}

impl QueryRequestBuilder {
    /// 서버 컨텍스트의 기본 컨테이너 경로 대신 사용할 경로
    pub fn container_path(mut self, path: impl Into<String>) -> Self {
        self.request.container_path = Some(path.into());
        self
    }

    /// 반환할 최대 행 수
    pub fn max_rows(mut self, max_rows: i64) -> Self {
        self.request.max_rows = Some(max_rows);
        self
    }

    /// 정렬 기준 (쉼표로 구분된 컬럼명, `-` 접두사는 내림차순)
    pub fn sort(mut self, sort: impl Into<String>) -> Self {
        self.request.sort = Some(sort.into());
        self
    }

    /// 결과 행 오프셋
    pub fn offset(mut self, offset: u64) -> Self {
        self.request.offset = Some(offset);
        self
    }

    pub fn container_filter(mut self, filter: impl Into<ContainerFilter>) -> Self {
        self.request.container_filter = Some(filter.into());
        self
    }

    /// 결과를 세션에 이름 있는 뷰로 저장할지 여부
    pub fn save_in_session(mut self, save: bool) -> Self {
        self.request.save_in_session = Some(save);
        self
    }

    /// 파라미터화된 쿼리에 전달할 파라미터 값
    pub fn parameters(mut self, parameters: impl Into<String>) -> Self {
        self.request.parameters = Some(parameters.into());
        self
    }

    /// 응답 API 버전
    pub fn api_version(mut self, version: f64) -> Self {
        self.request.api_version = Some(version);
        self
    }

    /// 요청 타임아웃 (전송 계층이 하드 상한으로 강제)
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.request.timeout = timeout;
        self
    }

    pub fn build(self) -> QueryRequest {
        self.request
    }
}

/// 서버에서 SQL을 실행하고 결과를 타입이 지정된 테이블로 반환합니다.
///
/// URL은 `context.build_url("sql", "execute.api", container_path)`로 생성되며,
/// 요청 헤더는 서버 설정의 [`headers`](crate::context::ServerConfig::headers)를 사용합니다.
///
/// # 에러
///
/// - [`LkError::Context`](crate::error::LkError::Context): 컨테이너 경로 없음, TLS 실패
/// - [`LkError::Transport`](crate::error::LkError::Transport): 타임아웃 등 전송 실패
/// - [`LkError::Unauthorized`](crate::error::LkError::Unauthorized) 등: 비정상 상태 코드
/// - [`LkError::Decode`](crate::error::LkError::Decode): 본문 디코딩 실패
pub fn execute_sql(context: &ServerContext, request: &QueryRequest) -> Result<ParsedTable> {
    let url = context.build_url(SQL_CONTROLLER, EXECUTE_ACTION, request.container_path())?;
    let form = build_execute_sql_form(request);
    let headers = context.headers();

    let sql_preview: String = request.sql().chars().take(80).collect();
    debug!(
        "[LK_SQL] Executing in schema {:?}: \"{}\" (len={})",
        request.schema_name(),
        sql_preview.replace('\n', " "),
        request.sql().len()
    );

    make_request(context, &url, &form, &headers, request.timeout())
}

/// 전송 계층으로 form 요청을 한 번 보내고 응답을 라우팅합니다.
///
/// 응답을 받기 전의 TLS 실패는 [`ServerContextError`](crate::error::ServerContextError)로
/// 감싸지며 디코딩은 시도하지 않습니다. 그 외 전송 실패는 그대로 전달됩니다.
pub fn make_request(
    context: &ServerContext,
    url: &str,
    form: &[(String, String)],
    headers: &[(String, String)],
    timeout: Duration,
) -> Result<ParsedTable> {
    debug!(
        "[LK_HTTP] Sending POST to {} (timeout={}s)",
        url,
        timeout.as_secs()
    );
    let start = Instant::now();

    let response = match context.transport().post(url, form, headers, timeout) {
        Ok(response) => response,
        Err(e) => {
            warn!(
                "[LK_HTTP] Transport error: {} duration_ms={}",
                e,
                start.elapsed().as_millis()
            );
            return Err(e.into());
        }
    };

    debug!(
        "[LK_HTTP] Response received: status={} bytes={} duration_ms={}",
        response.status,
        response.body.len(),
        start.elapsed().as_millis()
    );

    handle_response(response)
}
