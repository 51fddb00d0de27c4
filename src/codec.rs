//! 프로토콜 코덱 모듈: SQL 실행 요청 페이로드 빌더 + 응답 디코더
//!
//! ## 요청 빌더
//!
//! - [`build_execute_sql_form`]: `sql/execute.api` form 페이로드
//!
//! ## 응답 디코더
//!
//! - [`handle_response`]: 상태 코드 라우팅 (성공 → 디코딩, 실패 → 에러 분류)
//! - [`decode_table`]: 구분자 기반 본문을 [`ParsedTable`]로 디코딩
//!
//! ## 본문 형식
//!
//! ```text
//! c1 US TAB c2 RS LF          ← 컬럼명 헤더
//! INTEGER US TAB DOUBLE RS LF ← 와이어 타입 헤더
//! 1 US TAB 2.5 RS LF          ← 데이터 행
//! US TAB RS LF                ← 모든 값이 빈 데이터 행 (null)
//! ```

use log::{debug, warn};

use crate::constants::{FIELD_SEPARATOR, RECORD_SEPARATOR};
use crate::error::{DecodeError, LkError, Result};
use crate::field::coerce_column;
use crate::query::QueryRequest;
use crate::transport::WireResponse;
use crate::types::{CellValue, ParsedTable, Row, WireType};
use crate::wire::{Records, split_fields};

/// form 페이로드 키 상수
pub mod form_keys {
    pub const SCHEMA_NAME: &str = "schemaName";
    pub const SQL: &str = "sql";
    /// 필드 구분자 제어 시퀀스
    pub const SEP: &str = "sep";
    /// 레코드 구분자 제어 시퀀스
    pub const EOL: &str = "eol";
    pub const CONTAINER_FILTER: &str = "containerFilter";
    pub const MAX_ROWS: &str = "maxRows";
    pub const OFFSET: &str = "offset";
    pub const SORT: &str = "query.sort";
    pub const SAVE_IN_SESSION: &str = "saveInSession";
    pub const PARAMETERS: &str = "query.parameters";
    pub const API_VERSION: &str = "apiVersion";
}

/// 실패 로그에 포함할 응답 본문 최대 길이 (문자 수)
const BODY_PREVIEW_CHARS: usize = 200;

/// 값이 있을 때만 form 필드를 추가합니다.
fn push_optional(form: &mut Vec<(String, String)>, key: &str, value: Option<String>) {
    if let Some(value) = value {
        form.push((key.to_string(), value));
    }
}

/// SQL 실행 요청의 form 페이로드를 빌드합니다.
///
/// 필수 필드 `schemaName`, `sql`, `sep`, `eol`은 항상 포함되며,
/// 선택 필드는 호출자가 명시적으로 지정한 경우에만 포함됩니다.
/// 지정하지 않은 필드는 빈 값이 아니라 **아예 생략**됩니다 (서버 기본값 사용).
///
/// # 예시
///
/// ```
/// use lkquery::codec::build_execute_sql_form;
/// use lkquery::query::QueryRequest;
///
/// let form = build_execute_sql_form(&QueryRequest::new("core", "SELECT 1"));
/// assert_eq!(form.len(), 4);
/// assert_eq!(form[0], ("schemaName".to_string(), "core".to_string()));
/// ```
pub fn build_execute_sql_form(request: &QueryRequest) -> Vec<(String, String)> {
    let mut form = vec![
        (form_keys::SCHEMA_NAME.to_string(), request.schema_name().to_string()),
        (form_keys::SQL.to_string(), request.sql().to_string()),
        (form_keys::SEP.to_string(), FIELD_SEPARATOR.to_string()),
        (form_keys::EOL.to_string(), RECORD_SEPARATOR.to_string()),
    ];

    push_optional(
        &mut form,
        form_keys::CONTAINER_FILTER,
        request.container_filter().map(|f| f.as_str().to_string()),
    );
    push_optional(
        &mut form,
        form_keys::MAX_ROWS,
        request.max_rows().map(|v| v.to_string()),
    );
    push_optional(&mut form, form_keys::OFFSET, request.offset().map(|v| v.to_string()));
    push_optional(&mut form, form_keys::SORT, request.sort().map(str::to_string));
    push_optional(
        &mut form,
        form_keys::SAVE_IN_SESSION,
        request.save_in_session().map(|v| v.to_string()),
    );
    push_optional(
        &mut form,
        form_keys::PARAMETERS,
        request.parameters().map(str::to_string),
    );
    push_optional(
        &mut form,
        form_keys::API_VERSION,
        request.api_version().map(|v| v.to_string()),
    );

    form
}

/// 응답 상태 코드에 따라 디코딩하거나 에러를 분류합니다.
///
/// | 상태 코드 | 결과 |
/// |---|---|
/// | `200..300`, `304` | [`decode_table`] |
/// | `401` | [`LkError::Unauthorized`] |
/// | `404` + JSON 본문 | [`LkError::QueryNotFound`] |
/// | `404` + 비-JSON 본문 | [`LkError::ServerNotFound`] |
/// | 그 외 | [`LkError::Server`] |
///
/// 404에서 본문을 JSON으로 읽을 수 있으면 서버까지는 도달한 것이므로 쿼리 수준의 실패로,
/// 읽을 수 없으면 리소스 경로 자체가 잘못된 것으로 판단합니다.
pub fn handle_response(response: WireResponse) -> Result<ParsedTable> {
    let sc = response.status;

    if (200..300).contains(&sc) || sc == 304 {
        let table = decode_table(&response.body)?;
        debug!(
            "[LK_SQL] Decoded table: columns={} rows={}",
            table.columns().len(),
            table.len()
        );
        return Ok(table);
    }

    let preview: String = response.text_lossy().chars().take(BODY_PREVIEW_CHARS).collect();
    let err = match sc {
        401 => LkError::unauthorized(response),
        404 => {
            if response.json().is_ok() {
                LkError::query_not_found(response)
            } else {
                LkError::server_not_found(response)
            }
        }
        _ => LkError::server_error(Some(response)),
    };
    warn!("[LK_SQL] Request failed: {} body={:?}", err, preview);
    Err(err)
}

/// 구분자 기반 응답 본문을 [`ParsedTable`]로 디코딩합니다.
///
/// 1. UTF-8 디코딩 후 레코드 구분자로 지연 분할 (본문 끝 종결 구분자 하나만 제거)
/// 2. 각 레코드를 필드 구분자로 분할
/// 3. 첫 레코드 = 컬럼명, 둘째 레코드 = 와이어 타입, 나머지 = 데이터 행
/// 4. 모든 셀을 텍스트로 적재 (빈 필드는 null)
/// 5. 컬럼별로 선언 타입에 따라 변환
///
/// 같은 바이트 시퀀스에 대해 항상 같은 결과를 반환합니다.
///
/// # 에러
///
/// - [`DecodeError::InvalidUtf8`]: 본문이 UTF-8이 아님
/// - [`DecodeError::MissingHeader`] / [`DecodeError::MissingTypeHeader`]: 헤더 레코드 부족
/// - [`DecodeError::TypeHeaderWidth`] / [`DecodeError::RowWidth`]: 폭 불일치
/// - [`DecodeError::InvalidCell`]: 비어 있지 않은 값의 타입 변환 실패
///
/// # 예시
///
/// ```
/// use lkquery::codec::decode_table;
/// use lkquery::CellValue;
///
/// let body = "c1\x1F\tc2\x1E\nINTEGER\x1F\tDOUBLE\x1E\n1\x1F\t2.5\x1E\n";
/// let table = decode_table(body.as_bytes()).unwrap();
/// assert_eq!(table.rows()[0], vec![CellValue::Integer(1), CellValue::Float(2.5)]);
/// ```
pub fn decode_table(body: &[u8]) -> std::result::Result<ParsedTable, DecodeError> {
    let text = std::str::from_utf8(body)?;
    let mut records = Records::new(text);

    let columns: Vec<String> = split_fields(records.next().ok_or(DecodeError::MissingHeader)?)
        .into_iter()
        .map(str::to_string)
        .collect();
    let types: Vec<WireType> =
        split_fields(records.next().ok_or(DecodeError::MissingTypeHeader)?)
            .into_iter()
            .map(WireType::from)
            .collect();
    if types.len() != columns.len() {
        return Err(DecodeError::TypeHeaderWidth {
            columns: columns.len(),
            types: types.len(),
        });
    }

    let mut rows: Vec<Row> = Vec::new();
    for (row_idx, record) in records.enumerate() {
        let fields = split_fields(record);
        if fields.len() != columns.len() {
            return Err(DecodeError::RowWidth {
                row: row_idx,
                expected: columns.len(),
                actual: fields.len(),
            });
        }
        rows.push(
            fields
                .into_iter()
                .map(|f| {
                    if f.is_empty() {
                        CellValue::Null
                    } else {
                        CellValue::Text(f.to_string())
                    }
                })
                .collect(),
        );
    }

    for (idx, (name, wire_type)) in columns.iter().zip(&types).enumerate() {
        coerce_column(&mut rows, idx, wire_type, name)?;
    }

    Ok(ParsedTable::from_parts(columns, types, rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::ContainerFilter;

    const URL: &str = "https://example.com/labkey/sql/home/execute.api";

    fn ok(body: &str) -> WireResponse {
        WireResponse::new(200, body, URL)
    }

    fn form_value<'a>(form: &'a [(String, String)], key: &str) -> Option<&'a str> {
        form.iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    // -- build_execute_sql_form --

    #[test]
    fn test_form_mandatory_fields_only() {
        let form = build_execute_sql_form(&QueryRequest::new("lists", "SELECT * FROM People"));
        let keys: Vec<&str> = form.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["schemaName", "sql", "sep", "eol"]);
        assert_eq!(form_value(&form, "sep"), Some("\x1F\t"));
        assert_eq!(form_value(&form, "eol"), Some("\x1E\n"));
    }

    #[test]
    fn test_form_all_optional_fields() {
        let request = QueryRequest::builder("lists", "SELECT 1")
            .container_filter(ContainerFilter::CurrentAndSubfolders)
            .max_rows(100)
            .offset(20)
            .sort("-Name,Age")
            .save_in_session(true)
            .parameters("MinAge=5")
            .api_version(9.1)
            .build();
        let form = build_execute_sql_form(&request);
        assert_eq!(form.len(), 11);
        assert_eq!(form_value(&form, "containerFilter"), Some("CurrentAndSubfolders"));
        assert_eq!(form_value(&form, "maxRows"), Some("100"));
        assert_eq!(form_value(&form, "offset"), Some("20"));
        assert_eq!(form_value(&form, "query.sort"), Some("-Name,Age"));
        assert_eq!(form_value(&form, "saveInSession"), Some("true"));
        assert_eq!(form_value(&form, "query.parameters"), Some("MinAge=5"));
        assert_eq!(form_value(&form, "apiVersion"), Some("9.1"));
    }

    #[test]
    fn test_form_explicit_empty_sort_is_sent() {
        let form = build_execute_sql_form(&QueryRequest::builder("s", "q").sort("").build());
        assert_eq!(form_value(&form, "query.sort"), Some(""));
    }

    #[test]
    fn test_form_zero_offset_is_sent() {
        let form = build_execute_sql_form(&QueryRequest::builder("s", "q").offset(0).build());
        assert_eq!(form_value(&form, "offset"), Some("0"));
        assert_eq!(form_value(&form, "maxRows"), None);
    }

    // -- decode_table --

    #[test]
    fn test_decode_example_body() {
        let body = "c1\x1F\tc2\x1E\nINTEGER\x1F\tDOUBLE\x1E\n1\x1F\t2.5\x1E\n\x1F\t\x1E\n";
        let table = decode_table(body.as_bytes()).unwrap();
        assert_eq!(table.columns(), &["c1".to_string(), "c2".to_string()]);
        assert_eq!(table.types(), &[WireType::Integer, WireType::Double]);
        assert_eq!(table.len(), 2);
        assert_eq!(
            table.rows()[0],
            vec![CellValue::Integer(1), CellValue::Float(2.5)]
        );
        assert_eq!(table.rows()[1], vec![CellValue::Null, CellValue::Null]);
    }

    #[test]
    fn test_decode_header_only() {
        let table = decode_table(b"a\x1F\tb\x1E\nVARCHAR\x1F\tINTEGER\x1E\n").unwrap();
        assert!(table.is_empty());
        assert_eq!(table.columns().len(), 2);
    }

    fn single_column_cells(body: &str) -> Vec<CellValue> {
        let table = decode_table(body.as_bytes()).unwrap();
        table.rows().iter().map(|row| row[0].clone()).collect()
    }

    #[test]
    fn test_decode_single_column_null_first_row() {
        assert_eq!(
            single_column_cells("c\x1E\nVARCHAR\x1E\n\x1E\nx\x1E\ny\x1E\n"),
            vec![
                CellValue::Null,
                CellValue::Text("x".to_string()),
                CellValue::Text("y".to_string()),
            ]
        );
    }

    #[test]
    fn test_decode_single_column_null_middle_row() {
        assert_eq!(
            single_column_cells("c\x1E\nVARCHAR\x1E\nx\x1E\n\x1E\ny\x1E\n"),
            vec![
                CellValue::Text("x".to_string()),
                CellValue::Null,
                CellValue::Text("y".to_string()),
            ]
        );
    }

    #[test]
    fn test_decode_single_column_null_last_row() {
        assert_eq!(
            single_column_cells("c\x1E\nVARCHAR\x1E\nx\x1E\ny\x1E\n\x1E\n"),
            vec![
                CellValue::Text("x".to_string()),
                CellValue::Text("y".to_string()),
                CellValue::Null,
            ]
        );
    }

    #[test]
    fn test_decode_single_column_only_null_row() {
        assert_eq!(
            single_column_cells("c\x1E\nINTEGER\x1E\n\x1E\n"),
            vec![CellValue::Null]
        );
    }

    #[test]
    fn test_decode_text_and_unknown_types() {
        let body = "name\x1F\tkind\x1E\nVARCHAR\x1F\tSOMETHING_NEW\x1E\nBob\x1F\t\x1E\n";
        let table = decode_table(body.as_bytes()).unwrap();
        assert_eq!(table.get(0, "name"), Some(&CellValue::Text("Bob".to_string())));
        assert_eq!(table.get(0, "kind"), Some(&CellValue::Null));
        assert_eq!(table.types()[1].name(), "SOMETHING_NEW");
    }

    #[test]
    fn test_decode_all_empty_typed_column_is_null() {
        let body = "n\x1F\tt\x1E\nINTEGER\x1F\tTIMESTAMP\x1E\n\x1F\t\x1E\n\x1F\t\x1E\n";
        let table = decode_table(body.as_bytes()).unwrap();
        assert!(table.rows().iter().flatten().all(CellValue::is_null));
    }

    #[test]
    fn test_decode_timestamp_column() {
        let body = "when\x1E\nTIMESTAMP\x1E\n2016/05/03 00:00:00\x1E\n";
        let table = decode_table(body.as_bytes()).unwrap();
        let ts = table.get(0, "when").unwrap().as_timestamp().unwrap();
        assert_eq!(ts.to_string(), "2016-05-03 00:00:00");
    }

    #[test]
    fn test_decode_invalid_double_is_fatal() {
        let body = "c\x1E\nDOUBLE\x1E\n1.0\x1E\nabc\x1E\n";
        let err = decode_table(body.as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::InvalidCell { ref column, row: 1, ref value, .. }
                if column == "c" && value == "abc"
        ));
    }

    #[test]
    fn test_decode_empty_body() {
        assert_eq!(decode_table(b"").unwrap_err(), DecodeError::MissingHeader);
    }

    #[test]
    fn test_decode_missing_type_header() {
        assert_eq!(
            decode_table(b"c1\x1F\tc2\x1E\n").unwrap_err(),
            DecodeError::MissingTypeHeader
        );
    }

    #[test]
    fn test_decode_type_header_width_mismatch() {
        let err = decode_table(b"c1\x1F\tc2\x1E\nINTEGER\x1E\n").unwrap_err();
        assert_eq!(err, DecodeError::TypeHeaderWidth { columns: 2, types: 1 });
    }

    #[test]
    fn test_decode_row_width_mismatch() {
        let body = "c1\x1F\tc2\x1E\nINTEGER\x1F\tINTEGER\x1E\n1\x1F\t2\x1E\n3\x1E\n";
        let err = decode_table(body.as_bytes()).unwrap_err();
        assert_eq!(
            err,
            DecodeError::RowWidth {
                row: 1,
                expected: 2,
                actual: 1
            }
        );
    }

    #[test]
    fn test_decode_invalid_utf8() {
        let err = decode_table(&[b'c', 0xFF, 0x1E, b'\n']).unwrap_err();
        assert!(matches!(err, DecodeError::InvalidUtf8(_)));
    }

    #[test]
    fn test_decode_is_idempotent() {
        let body = b"a\x1F\tb\x1E\nREAL\x1F\tVARCHAR\x1E\n0.5\x1F\tx\x1E\n\x1F\ty\x1E\n";
        assert_eq!(decode_table(body).unwrap(), decode_table(body).unwrap());
    }

    #[test]
    fn test_decode_unicode_values() {
        let body = "이름\x1E\nVARCHAR\x1E\n홍길동\x1E\n";
        let table = decode_table(body.as_bytes()).unwrap();
        assert_eq!(table.get(0, "이름").and_then(CellValue::as_str), Some("홍길동"));
    }

    // -- handle_response --

    #[test]
    fn test_handle_success_statuses() {
        let body = "c\x1E\nINTEGER\x1E\n7\x1E\n";
        for status in [200, 201, 299, 304] {
            let table = handle_response(WireResponse::new(status, body, URL)).unwrap();
            assert_eq!(table.get(0, "c"), Some(&CellValue::Integer(7)), "{status}");
        }
    }

    #[test]
    fn test_handle_success_decode_error_propagates() {
        let err = handle_response(ok("c\x1E\nINTEGER\x1E\nx\x1E\n")).unwrap_err();
        assert!(matches!(err, LkError::Decode(DecodeError::InvalidCell { .. })));
    }

    #[test]
    fn test_handle_401() {
        let err = handle_response(WireResponse::new(401, "anything", URL)).unwrap_err();
        assert!(matches!(err, LkError::Unauthorized(_)));
        assert!(err.to_string().starts_with("401: "));
    }

    #[test]
    fn test_handle_404_json_without_exception() {
        let err = handle_response(WireResponse::new(404, "{}", URL)).unwrap_err();
        assert!(matches!(err, LkError::QueryNotFound(_)));
        assert_eq!(err.to_string(), "404: Query Resource Not Found");
    }

    #[test]
    fn test_handle_404_json_with_exception() {
        let body = r#"{"exception": "bad schema"}"#;
        let err = handle_response(WireResponse::new(404, body, URL)).unwrap_err();
        assert!(matches!(err, LkError::QueryNotFound(_)));
        assert_eq!(err.to_string(), "404: bad schema");
    }

    #[test]
    fn test_handle_404_unparsable_body() {
        let err = handle_response(WireResponse::new(404, "<html>", URL)).unwrap_err();
        assert!(matches!(err, LkError::ServerNotFound(_)));
    }

    #[test]
    fn test_handle_other_status_is_server_error() {
        for status in [100, 302, 400, 403, 500, 503] {
            let err = handle_response(WireResponse::new(status, "", URL)).unwrap_err();
            assert!(matches!(err, LkError::Server(_)), "{status}");
            assert_eq!(err.status(), Some(status));
        }
    }

    #[test]
    fn test_handle_500_with_exception_payload() {
        let body = r#"{"exception": "Syntax error near 'FORM'"}"#;
        let err = handle_response(WireResponse::new(500, body, URL)).unwrap_err();
        assert_eq!(err.to_string(), "500: Syntax error near 'FORM'");
        let payload = err.request_error().unwrap().server_exception.as_ref().unwrap();
        assert_eq!(payload["exception"], "Syntax error near 'FORM'");
    }
}
