//! # lkquery
//!
//! LabKey 스타일 서버의 SQL 실행 API 클라이언트 라이브러리.
//!
//! 로컬에서 작성한 SQL을 원격 서버로 보내고, 구분자 기반 표 형식 응답을
//! 타입이 지정된 [`ParsedTable`]로 디코딩합니다.
//!
//! ## 모듈 구조
//!
//! - [`constants`]: 구분자, 컨트롤러/액션 이름, 기본 에러 메시지
//! - [`error`]: 에러 타입 계층 구조 ([`LkError`])
//! - [`types`]: 공유 타입 정의 ([`WireType`], [`CellValue`], [`ParsedTable`] 등)
//! - [`wire`]: 레코드/필드 분리 ([`Records`](wire::Records), [`split_fields`](wire::split_fields))
//! - [`field`]: 와이어 타입별 셀 변환 ([`coerce_cell`](field::coerce_cell), [`coerce_column`](field::coerce_column))
//! - [`codec`]: 요청 폼 빌더 + 응답 상태 분류 + 표 디코딩
//! - [`transport`]: 전송 계층 추상화 ([`Transport`], [`WireResponse`])
//! - [`context`]: 서버 설정과 URL 생성 ([`ServerConfig`], [`ServerContext`])
//! - [`query`]: SQL 실행 API ([`execute_sql`], [`QueryRequest`])
//! - [`client`]: reqwest 블로킹 전송 계층 *(feature `"client"` 활성화 시)*
//!
//! ## 사용 예시
//!
//! ```rust
//! use lkquery::codec::decode_table;
//! use lkquery::{CellValue, WireType};
//!
//! let body = b"id\x1F\tname\x1E\nINTEGER\x1F\tVARCHAR\x1E\n1\x1F\tAlice\x1E\n";
//! let table = decode_table(body).unwrap();
//!
//! assert_eq!(table.columns(), ["id", "name"]);
//! assert_eq!(table.types()[0], WireType::Integer);
//! assert_eq!(table.get(0, "id"), Some(&CellValue::Integer(1)));
//! ```

#[cfg(feature = "client")]
pub mod client;
pub mod codec;
pub mod constants;
pub mod context;
pub mod error;
pub mod field;
pub mod query;
pub mod transport;
pub mod types;
pub mod wire;

// NOTE: Selective re-export: only expose commonly used types
pub use context::{ServerConfig, ServerContext};
pub use error::{DecodeError, LkError, RequestError, Result, ServerContextError};
pub use query::{ContainerFilter, QueryRequest, execute_sql};
pub use transport::{Transport, TransportError, WireResponse};
pub use types::{CellValue, Coercion, ColumnKind, ParsedTable, Row, SchemaField, WireType};
