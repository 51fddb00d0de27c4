//! SQL 실행 응답에서 사용하는 공유 타입 정의입니다.
//!
//! [`WireType`], [`Coercion`], [`CellValue`], [`ParsedTable`] 등 코덱과 필드 모듈 전반에서
//! 공유되는 타입을 정의합니다.

use chrono::NaiveDateTime;
use serde_json::{Map, Value};

/// 응답 타입 헤더에 선언된 컬럼의 와이어 타입
///
/// 서버가 선언한 타입명 문자열을 한 번만 매핑합니다. 알 수 없는 타입명은
/// 실패하지 않고 [`Other`](Self::Other)로 보존되며 텍스트로 처리됩니다.
///
/// 변환 규칙:
/// - **정수 계열**: [`Boolean`](Self::Boolean), [`TinyInt`](Self::TinyInt), [`SmallInt`](Self::SmallInt), [`Integer`](Self::Integer)
/// - **부동소수점 계열**: [`Double`](Self::Double), [`Real`](Self::Real), [`Numeric`](Self::Numeric)
/// - **날짜/시간**: [`Timestamp`](Self::Timestamp)
/// - **텍스트**: 그 외 모든 타입명
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum WireType {
    /// BOOLEAN: 정수로 전송됨
    Boolean,
    /// TINYINT
    TinyInt,
    /// SMALLINT
    SmallInt,
    /// INTEGER
    Integer,
    /// DOUBLE
    Double,
    /// REAL
    Real,
    /// NUMERIC
    Numeric,
    /// TIMESTAMP
    Timestamp,
    /// 그 외 타입명 (VARCHAR 등): 원본 이름 보존
    Other(String),
}

impl From<&str> for WireType {
    fn from(name: &str) -> Self {
        match name {
            "BOOLEAN" => WireType::Boolean,
            "TINYINT" => WireType::TinyInt,
            "SMALLINT" => WireType::SmallInt,
            "INTEGER" => WireType::Integer,
            "DOUBLE" => WireType::Double,
            "REAL" => WireType::Real,
            "NUMERIC" => WireType::Numeric,
            "TIMESTAMP" => WireType::Timestamp,
            other => WireType::Other(other.to_string()),
        }
    }
}

impl WireType {
    /// 서버가 선언한 타입명
    pub fn name(&self) -> &str {
        match self {
            WireType::Boolean => "BOOLEAN",
            WireType::TinyInt => "TINYINT",
            WireType::SmallInt => "SMALLINT",
            WireType::Integer => "INTEGER",
            WireType::Double => "DOUBLE",
            WireType::Real => "REAL",
            WireType::Numeric => "NUMERIC",
            WireType::Timestamp => "TIMESTAMP",
            WireType::Other(name) => name,
        }
    }

    /// 이 타입의 셀 변환 방식
    pub fn coercion(&self) -> Coercion {
        match self {
            WireType::Boolean | WireType::TinyInt | WireType::SmallInt | WireType::Integer => {
                Coercion::Integer
            }
            WireType::Double | WireType::Real | WireType::Numeric => Coercion::Float,
            WireType::Timestamp => Coercion::Timestamp,
            WireType::Other(_) => Coercion::Text,
        }
    }

    /// 외부 데이터프레임 스키마에서 사용하는 컬럼 종류
    ///
    /// 날짜는 문자열로 매핑됩니다.
    pub fn column_kind(&self) -> ColumnKind {
        match self {
            WireType::Boolean => ColumnKind::Boolean,
            WireType::TinyInt | WireType::SmallInt | WireType::Integer => ColumnKind::Integer,
            WireType::Double | WireType::Real | WireType::Numeric => ColumnKind::Double,
            WireType::Timestamp | WireType::Other(_) => ColumnKind::String,
        }
    }
}

impl std::fmt::Display for WireType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// 컬럼 단위 셀 변환 방식
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Coercion {
    /// 부호 있는 64비트 정수
    Integer,
    /// 64비트 부동소수점
    Float,
    /// 날짜/시간
    Timestamp,
    /// 원본 텍스트 유지
    Text,
}

/// 디코딩된 단일 셀 값
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    /// 빈 필드
    Null,
    /// 텍스트 (변환 전 원본 또는 텍스트 컬럼)
    Text(String),
    /// 정수 (BOOLEAN, TINYINT, SMALLINT, INTEGER)
    Integer(i64),
    /// 부동소수점 (DOUBLE, REAL, NUMERIC)
    Float(f64),
    /// 날짜/시간 (TIMESTAMP)
    Timestamp(NaiveDateTime),
}

impl CellValue {
    /// null 여부 확인
    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    /// 텍스트 값이면 문자열 슬라이스를 반환합니다.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// 정수 값이면 반환합니다.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            CellValue::Integer(v) => Some(*v),
            _ => None,
        }
    }

    /// 부동소수점 값이면 반환합니다.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// 날짜/시간 값이면 반환합니다.
    pub fn as_timestamp(&self) -> Option<NaiveDateTime> {
        match self {
            CellValue::Timestamp(ts) => Some(*ts),
            _ => None,
        }
    }

    /// JSON 값으로 변환합니다.
    ///
    /// 날짜/시간은 `YYYY-MM-DD HH:MM:SS[.f]` 문자열이 됩니다.
    /// 유한하지 않은 부동소수점은 JSON에서 표현할 수 없으므로 `null`이 됩니다.
    pub fn to_json(&self) -> Value {
        match self {
            CellValue::Null => Value::Null,
            CellValue::Text(s) => Value::String(s.clone()),
            CellValue::Integer(v) => Value::from(*v),
            CellValue::Float(v) => serde_json::Number::from_f64(*v)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            CellValue::Timestamp(ts) => {
                Value::String(ts.format("%Y-%m-%d %H:%M:%S%.f").to_string())
            }
        }
    }
}

/// 외부 데이터프레임 스키마의 컬럼 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnKind {
    Boolean,
    Integer,
    Double,
    String,
}

/// 외부 데이터프레임 스키마의 컬럼 정의
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaField {
    /// 컬럼명
    pub name: String,
    /// 컬럼 종류
    pub kind: ColumnKind,
    /// null 허용 여부: 응답 형식에는 nullability 정보가 없으므로 항상 `true`
    pub nullable: bool,
}

/// 단일 행: 컬럼 순서대로 나열된 셀 값
pub type Row = Vec<CellValue>;

/// SQL 실행 응답의 **전체 디코딩 결과**
///
/// [`decode_table`](crate::codec::decode_table)의 반환 타입입니다.
///
/// ## 불변식
///
/// `columns.len() == types.len() == row.len()` (모든 행에 대해)
///
/// ## 데이터 접근
///
/// ```rust,ignore
/// for row in table.rows() {
///     for (name, value) in table.columns().iter().zip(row) {
///         println!("{}: {:?}", name, value);
///     }
/// }
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedTable {
    columns: Vec<String>,
    types: Vec<WireType>,
    rows: Vec<Row>,
}

impl ParsedTable {
    /// 불변식이 이미 검증된 구성 요소로 테이블을 조립합니다.
    pub(crate) fn from_parts(columns: Vec<String>, types: Vec<WireType>, rows: Vec<Row>) -> Self {
        debug_assert_eq!(columns.len(), types.len());
        debug_assert!(rows.iter().all(|r| r.len() == columns.len()));
        Self {
            columns,
            types,
            rows,
        }
    }

    /// 컬럼명 목록
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// 컬럼별 선언 와이어 타입 목록
    pub fn types(&self) -> &[WireType] {
        &self.types
    }

    /// 데이터 행 목록
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// 행 수
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// 데이터 행이 없는지 확인
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// 컬럼명으로 컬럼 인덱스를 검색합니다.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// 컬럼명으로 해당 컬럼의 모든 셀을 순서대로 반환합니다.
    pub fn column(&self, name: &str) -> Option<Vec<&CellValue>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(|row| &row[idx]).collect())
    }

    /// `row` 번째 행에서 `column` 컬럼의 셀을 반환합니다.
    pub fn get(&self, row: usize, column: &str) -> Option<&CellValue> {
        let idx = self.column_index(column)?;
        self.rows.get(row).map(|r| &r[idx])
    }

    /// 외부 데이터프레임용 스키마를 추론합니다.
    pub fn schema(&self) -> Vec<SchemaField> {
        self.columns
            .iter()
            .zip(&self.types)
            .map(|(name, wire_type)| SchemaField {
                name: name.clone(),
                kind: wire_type.column_kind(),
                nullable: true,
            })
            .collect()
    }

    /// 각 행을 `컬럼명 → 값` JSON 객체로 변환합니다.
    ///
    /// 값의 JSON 타입은 [`schema`](Self::schema)의 컬럼 종류와 일치합니다.
    /// BOOLEAN 컬럼은 `0`이 `false`, 그 외 정수가 `true`인 JSON 불리언이 됩니다.
    pub fn to_json_rows(&self) -> Vec<Value> {
        self.rows
            .iter()
            .map(|row| {
                let object: Map<String, Value> = self
                    .columns
                    .iter()
                    .zip(&self.types)
                    .zip(row)
                    .map(|((name, wire_type), cell)| (name.clone(), column_json(wire_type, cell)))
                    .collect();
                Value::Object(object)
            })
            .collect()
    }
}

/// 컬럼 종류에 맞춘 셀의 JSON 값
fn column_json(wire_type: &WireType, cell: &CellValue) -> Value {
    match (wire_type.column_kind(), cell) {
        (ColumnKind::Boolean, CellValue::Integer(v)) => Value::Bool(*v != 0),
        _ => cell.to_json(),
    }
}
