//! 저수준 텍스트 분할 모듈: 레코드/필드 구분자 기반 응답 본문 분할
//!
//! 응답 본문은 두 가지 제어 문자 시퀀스로 구분된 텍스트입니다:
//!
//! - **레코드 구분자** ([`RECORD_SEPARATOR`]): `0x1E` (RS) + `\n`
//! - **필드 구분자** ([`FIELD_SEPARATOR`]): `0x1F` (US) + `\t`
//!
//! [`Records`]는 본문을 레코드 단위로 지연 분할하는 단방향 이터레이터이며,
//! [`split_fields`]는 한 레코드를 필드 목록으로 분할합니다.

use crate::constants::{FIELD_SEPARATOR, RECORD_SEPARATOR};

/// 본문 텍스트를 레코드 단위로 지연 분할하는 이터레이터
///
/// 각 레코드 구분자가 정확히 하나의 레코드를 끝냅니다. 본문 끝의 종결 구분자 하나만
/// 제거하므로, 그 앞의 빈 레코드(단일 컬럼 테이블의 null 행)는 보존됩니다.
/// 한 번 소비하면 다시 시작할 수 없습니다.
///
/// # 예시
///
/// ```
/// use lkquery::wire::Records;
///
/// let mut records = Records::new("a\x1E\nb\x1E\n");
/// assert_eq!(records.next(), Some("a"));
/// assert_eq!(records.next(), Some("b"));
/// assert_eq!(records.next(), None);
/// ```
pub struct Records<'a> {
    inner: Option<std::str::Split<'a, &'static str>>,
}

impl<'a> Records<'a> {
    /// 본문 텍스트로부터 새 레코드 이터레이터를 생성합니다.
    pub fn new(text: &'a str) -> Self {
        if text.is_empty() {
            return Self { inner: None };
        }
        let body = text.strip_suffix(RECORD_SEPARATOR).unwrap_or(text);
        Self {
            inner: Some(body.split(RECORD_SEPARATOR)),
        }
    }
}

impl<'a> Iterator for Records<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.as_mut()?.next()
    }
}

impl std::iter::FusedIterator for Records<'_> {}

/// 한 레코드를 필드 구분자로 분할합니다.
///
/// 빈 레코드는 빈 필드 하나로 분할됩니다.
///
/// ```
/// use lkquery::wire::split_fields;
///
/// assert_eq!(split_fields("1\x1F\t\x1F\tx"), vec!["1", "", "x"]);
/// ```
pub fn split_fields(record: &str) -> Vec<&str> {
    record.split(FIELD_SEPARATOR).collect()
}
