//! 와이어 타입별 셀 값 변환 모듈
//!
//! 초기 테이블의 텍스트 셀을 컬럼의 선언 타입에 따라 [`CellValue`]로 변환합니다.
//!
//! ## 핵심 함수
//!
//! - [`coerce_cell`]: 단일 셀 변환
//! - [`coerce_column`]: 한 컬럼 전체를 제자리에서 변환
//! - [`parse_timestamp`]: 서버의 날짜/시간 텍스트 파싱
//!
//! ## 타입별 변환 규칙
//!
//! | 계열 | 와이어 타입 | 변환 결과 | 빈 값 |
//! |---|---|---|---|
//! | 정수 | BOOLEAN, TINYINT, SMALLINT, INTEGER | `i64` | null |
//! | 부동소수점 | DOUBLE, REAL, NUMERIC | `f64` | null |
//! | 날짜/시간 | TIMESTAMP | [`NaiveDateTime`] | null |
//! | 텍스트 | 그 외 | 원본 문자열 | null |
//!
//! 비어 있지 않은 값의 파싱 실패는 [`DecodeError::InvalidCell`]로 즉시 실패합니다.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::error::DecodeError;
use crate::types::{CellValue, Coercion, Row, WireType};

/// 날짜와 시간을 모두 포함하는 허용 형식
const DATETIME_FORMATS: &[&str] = &[
    "%Y/%m/%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y/%m/%d %H:%M",
    "%Y-%m-%d %H:%M",
];

/// 날짜만 포함하는 허용 형식 (자정으로 해석)
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];

/// 서버의 날짜/시간 텍스트를 파싱합니다.
///
/// 허용 형식:
/// - `YYYY/MM/DD HH:MM:SS[.f]`, `YYYY-MM-DD HH:MM:SS[.f]`, `YYYY-MM-DDTHH:MM:SS[.f]`
/// - 초가 없는 `YYYY/MM/DD HH:MM`, `YYYY-MM-DD HH:MM`
/// - 오프셋이 있는 RFC 3339 (UTC로 변환)
/// - 날짜만 있는 `YYYY-MM-DD`, `YYYY/MM/DD` (자정)
///
/// ```
/// use lkquery::field::parse_timestamp;
///
/// let ts = parse_timestamp("2016/05/03 13:04:05").unwrap();
/// assert_eq!(ts.to_string(), "2016-05-03 13:04:05");
/// ```
pub fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .or_else(|| {
            DateTime::parse_from_rfc3339(text)
                .ok()
                .map(|dt| dt.naive_utc())
        })
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// 선언 타입에 따라 단일 셀을 변환합니다.
///
/// # 인자
///
/// - `cell`: 초기 테이블의 셀 ([`CellValue::Null`] 또는 [`CellValue::Text`])
/// - `wire_type`: 컬럼의 선언 타입
/// - `column` / `row`: 에러 진단용 위치 정보
///
/// # 에러
///
/// 비어 있지 않은 값이 선언 타입으로 파싱되지 않으면 [`DecodeError::InvalidCell`]을 반환합니다.
pub fn coerce_cell(
    cell: CellValue,
    wire_type: &WireType,
    column: &str,
    row: usize,
) -> Result<CellValue, DecodeError> {
    let text = match cell {
        CellValue::Text(text) if !text.is_empty() => text,
        CellValue::Text(_) | CellValue::Null => return Ok(CellValue::Null),
        // NOTE: Already-typed cells pass through, so coercion is idempotent
        typed => return Ok(typed),
    };

    let invalid = |text: String, detail: String| DecodeError::InvalidCell {
        column: column.to_string(),
        row,
        wire_type: wire_type.name().to_string(),
        value: text,
        detail,
    };

    match wire_type.coercion() {
        Coercion::Integer => match text.trim().parse::<i64>() {
            Ok(v) => Ok(CellValue::Integer(v)),
            Err(e) => Err(invalid(text, e.to_string())),
        },
        Coercion::Float => match text.trim().parse::<f64>() {
            Ok(v) => Ok(CellValue::Float(v)),
            Err(e) => Err(invalid(text, e.to_string())),
        },
        Coercion::Timestamp => match parse_timestamp(&text) {
            Some(ts) => Ok(CellValue::Timestamp(ts)),
            None => Err(invalid(text, "unrecognized date-time format".to_string())),
        },
        Coercion::Text => Ok(CellValue::Text(text)),
    }
}

/// `rows`의 `index` 번째 컬럼 전체를 제자리에서 변환합니다.
///
/// 첫 번째 실패에서 즉시 중단하며, 부분 변환된 행은 호출자가 폐기해야 합니다.
pub fn coerce_column(
    rows: &mut [Row],
    index: usize,
    wire_type: &WireType,
    column: &str,
) -> Result<(), DecodeError> {
    // NOTE: Text columns keep their cells as-is
    if wire_type.coercion() == Coercion::Text {
        return Ok(());
    }
    for (row_idx, row) in rows.iter_mut().enumerate() {
        let cell = std::mem::replace(&mut row[index], CellValue::Null);
        row[index] = coerce_cell(cell, wire_type, column, row_idx)?;
    }
    Ok(())
}
