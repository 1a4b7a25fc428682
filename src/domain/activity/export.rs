//! 신청 명단 CSV 생성
//!
//! 엑셀에서 바로 열리도록 UTF-8 BOM을 붙입니다.

use chrono::{DateTime, Duration, Utc};

use super::registration_store::RegistrationWithUser;
use crate::utils::error::AppError;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

const HEADERS: [&str; 8] = [
    "姓名",
    "学号",
    "邮箱",
    "联系电话",
    "备注",
    "状态",
    "报名时间",
    "取消时间",
];

/// 명단 시각 표기 기준 (UTC+8)
const DISPLAY_OFFSET_HOURS: i64 = 8;

/// 다운로드 응답으로 내려줄 파일
#[derive(Debug)]
pub struct RegistrationSheet {
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl RegistrationSheet {
    /// RFC 5987 `filename*` 포함 Content-Disposition 값
    pub fn content_disposition(&self) -> String {
        let ascii_name: String = self
            .filename
            .chars()
            .filter(|c| c.is_ascii_graphic() && !matches!(c, '"' | ';' | '\\'))
            .collect();
        let ascii_name = if !ascii_name.chars().any(|c| c.is_ascii_alphanumeric()) {
            "registrations.csv".to_string()
        } else {
            ascii_name
        };

        let encoded: String = self
            .filename
            .bytes()
            .map(|b| match b {
                b'A'..=b'Z'
                | b'a'..=b'z'
                | b'0'..=b'9'
                | b'!'
                | b'#'
                | b'$'
                | b'&'
                | b'+'
                | b'-'
                | b'.'
                | b'^'
                | b'_'
                | b'`'
                | b'|'
                | b'~' => String::from(b as char),
                _ => format!("%{b:02X}"),
            })
            .collect();

        format!("attachment; filename=\"{ascii_name}\"; filename*=UTF-8''{encoded}")
    }
}

pub struct RegistrationExport;

impl RegistrationExport {
    pub fn build(
        activity_title: &str,
        rows: &[RegistrationWithUser],
        generated_at: DateTime<Utc>,
    ) -> Result<RegistrationSheet, AppError> {
        let mut writer = csv::Writer::from_writer(UTF8_BOM.to_vec());

        writer
            .write_record(HEADERS)
            .map_err(|e| AppError::InternalError(format!("CSV 작성 실패: {}", e)))?;

        for (registration, user) in rows {
            let email = user.as_ref().map(|u| u.email.as_str()).unwrap_or("");
            let cancelled_at = registration
                .cancelled_at
                .map(format_display_time)
                .unwrap_or_default();

            writer
                .write_record([
                    registration.name.as_str(),
                    registration.student_id.as_str(),
                    email,
                    registration.phone.as_deref().unwrap_or(""),
                    registration.remark.as_deref().unwrap_or(""),
                    registration.status.label(),
                    format_display_time(registration.created_at).as_str(),
                    cancelled_at.as_str(),
                ])
                .map_err(|e| AppError::InternalError(format!("CSV 작성 실패: {}", e)))?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| AppError::InternalError(format!("CSV 작성 실패: {}", e)))?;

        Ok(RegistrationSheet {
            filename: format!(
                "报名名单_{}_{}.csv",
                sanitize_title(activity_title),
                to_display_time(generated_at).format("%Y%m%d%H%M%S")
            ),
            bytes,
        })
    }
}

fn to_display_time(at: DateTime<Utc>) -> chrono::NaiveDateTime {
    (at + Duration::hours(DISPLAY_OFFSET_HOURS)).naive_utc()
}

fn format_display_time(at: DateTime<Utc>) -> String {
    to_display_time(at).format("%Y-%m-%d %H:%M:%S").to_string()
}

/// 파일 이름에 쓸 수 없는 문자 치환
fn sanitize_title(title: &str) -> String {
    title
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect()
}
