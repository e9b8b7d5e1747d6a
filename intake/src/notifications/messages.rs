//! Operator-facing message bodies (Telegram HTML parse mode).

use serde_json::Value;

use crate::storage::Submission;

pub const TEST_MESSAGE: &str = "🔔 <b>테스트 알림</b>\n\nONE PARTNER 관리자 알림이 정상적으로 연결되었습니다!";

const MISSING: &str = "-";
const NONE_KO: &str = "없음";
const HAS_LOAN: &str = "있음";

/// Summary of a new first-stage lead.
pub fn lead_message(lead: &Submission) -> String {
    let field = |key: &str| field_text(lead, key);
    format!(
        "🔔 <b>새로운 정책자금 진단 신청</b>\n\n\
         📌 업종: {}\n\
         📍 지역: {}\n\
         🏢 업체명: {}\n\
         💰 희망자금: {}\n\
         👤 성함: {}\n\
         📞 연락처: {}\n\
         ⏰ 통화시간: {}\n\
         📅 접수시간: {}",
        field("industry"),
        field("region"),
        field("companyName"),
        field("fundingAmount"),
        field("contactName"),
        field("contactPhone"),
        field("preferredTime"),
        escape_html(&lead.submitted_at),
    )
}

/// Summary of a new diagnosis, including the government loan list when one is declared.
pub fn diagnosis_message(diagnosis: &Submission) -> String {
    let field = |key: &str| field_text(diagnosis, key);

    let mut message = format!(
        "🔔 <b>새로운 정밀 진단 서류 접수</b>\n\n\
         👥 직원 수: {}명\n\
         💵 매출(23/24/25): {} / {} / {} 만원\n\
         📊 신용점수: {}점\n\
         ⚠️ 연체: {}\n\
         🏦 정부대출: {}\n",
        field("employeeCount"),
        field("revenue2023"),
        field("revenue2024"),
        field("revenue2025"),
        field("creditScore"),
        field("overdue"),
        field("govLoan"),
    );

    if diagnosis.field("govLoan").and_then(Value::as_str) == Some(HAS_LOAN) {
        message.push_str("📋 대출내역:\n");
        message.push_str(&gov_loans_text(diagnosis.field("govLoans")));
        message.push('\n');
    }

    let other_loans = match text_of(diagnosis.field("otherLoans")) {
        Some(text) => escape_html(&text),
        None => NONE_KO.to_string(),
    };
    message.push_str(&format!(
        "💳 기타대출: {other_loans}\n📅 접수시간: {}",
        escape_html(&diagnosis.submitted_at)
    ));
    message
}

fn gov_loans_text(loans: Option<&Value>) -> String {
    let loans = match loans.and_then(Value::as_array) {
        Some(loans) if !loans.is_empty() => loans,
        _ => return NONE_KO.to_string(),
    };

    loans
        .iter()
        .enumerate()
        .map(|(i, loan)| {
            let part = |key: &str| {
                text_of(loan.get(key))
                    .map(|text| escape_html(&text))
                    .unwrap_or_else(|| MISSING.to_string())
            };
            format!("  {}. {} / {} / {}만원", i + 1, part("institution"), part("date"), part("amount"))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn field_text(submission: &Submission, key: &str) -> String {
    text_of(submission.field(key))
        .map(|text| escape_html(&text))
        .unwrap_or_else(|| MISSING.to_string())
}

/// Plain-text rendering of a JSON value. Absent, null and empty strings count as missing.
fn text_of(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Escape the characters Telegram's HTML parse mode treats as markup.
fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
