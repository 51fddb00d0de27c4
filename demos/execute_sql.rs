//! 원격 서버에서 SQL을 실행하고 결과를 JSON으로 출력하는 CLI 예제
//!
//! 사용법:
//! ```bash
//! cargo run --example execute_sql -- <domain> <container> <schema> <sql> [context_path]
//! ```
//!
//! 예시:
//! ```bash
//! RUST_LOG=debug cargo run --example execute_sql -- \
//!     www.example.org home lists "SELECT * FROM People" labkey
//! ```
//!
//! 인증이 필요하면 `LK_API_KEY` 환경변수에 API 키를 지정합니다.

use lkquery::{LkError, QueryRequest, SchemaField, ServerConfig, ServerContext};
use serde::Serialize;
use std::env;

/// JSON 출력용 데이터 구조
#[derive(Debug, Serialize)]
struct OutputData {
    /// 성공 여부
    success: bool,
    /// 메시지 (에러 시 에러 메시지)
    message: String,
    /// 컬럼 스키마
    schema: Vec<OutputField>,
    /// 행 목록 (컬럼명 -> 값)
    rows: Vec<serde_json::Value>,
}

#[derive(Debug, Serialize)]
struct OutputField {
    name: String,
    kind: String,
}

impl From<SchemaField> for OutputField {
    fn from(field: SchemaField) -> Self {
        Self {
            name: field.name,
            kind: format!("{:?}", field.kind),
        }
    }
}

impl OutputData {
    fn failure(message: String) -> Self {
        Self {
            success: false,
            message,
            schema: Vec::new(),
            rows: Vec::new(),
        }
    }
}

fn print_usage() {
    eprintln!("SQL 실행 CLI");
    eprintln!();
    eprintln!("사용법:");
    eprintln!("  cargo run --example execute_sql -- <domain> <container> <schema> <sql> [context_path]");
    eprintln!();
    eprintln!("인자:");
    eprintln!("  domain       - 서버 호스트 (예: www.example.org)");
    eprintln!("  container    - 컨테이너 경로 (예: home)");
    eprintln!("  schema       - 스키마 이름 (예: lists)");
    eprintln!("  sql          - 실행할 SQL");
    eprintln!("  context_path - 웹 애플리케이션 컨텍스트 경로 (선택, 예: labkey)");
    eprintln!();
    eprintln!("환경변수:");
    eprintln!("  LK_API_KEY   - API 키 (선택)");
    eprintln!("  LK_NO_SSL    - 설정 시 http 사용");
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = env::args().collect();
    if !(5..=6).contains(&args.len()) {
        print_usage();
        std::process::exit(1);
    }

    let mut config =
        ServerConfig::new(&args[1], &args[2]).with_ssl(env::var_os("LK_NO_SSL").is_none());
    if let Some(context_path) = args.get(5) {
        config = config.with_context_path(context_path);
    }
    if let Ok(api_key) = env::var("LK_API_KEY") {
        config = config.with_header("apikey", api_key);
    }

    let result = run_query(config, &args[3], &args[4]);

    // JSON 출력
    match serde_json::to_string_pretty(&result) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("JSON 직렬화 실패: {}", e);
            std::process::exit(1);
        }
    }

    if !result.success {
        std::process::exit(1);
    }
}

fn run_query(config: ServerConfig, schema: &str, sql: &str) -> OutputData {
    let context = match ServerContext::connect(config) {
        Ok(c) => c,
        Err(e) => return OutputData::failure(format!("컨텍스트 생성 실패: {}", e)),
    };

    let table = match context.execute_sql(&QueryRequest::new(schema, sql)) {
        Ok(t) => t,
        Err(e @ LkError::Unauthorized(_)) => {
            return OutputData::failure(format!("인증 실패 (LK_API_KEY 확인): {}", e));
        }
        Err(e) => return OutputData::failure(format!("쿼리 실행 실패: {}", e)),
    };

    OutputData {
        success: true,
        message: format!(
            "조회 성공: {} 컬럼, 총 {} 행",
            table.columns().len(),
            table.len()
        ),
        schema: table.schema().into_iter().map(OutputField::from).collect(),
        rows: table.to_json_rows(),
    }
}
