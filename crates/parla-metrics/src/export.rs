//! Lossless CSV export of the interaction log.
//!
//! The header row is fixed and stable across versions; fields follow
//! conventional CSV quoting (wrap in double quotes when needed, double any
//! embedded quotes), so a standard parser recovers every value exactly.

use parla_core::{ChatMetricEvent, Role};

/// Fixed header row. Column names match the event-store wire format.
pub const CSV_HEADER: &str = "id,userId,userName,userRole,timestamp,sessionId,messageType,\
                              message,flow,selectedOption,wasHelpful,aiGenerated,tokensUsed,\
                              responseTimeMs";

/// Serialize `events` to CSV, sorted by timestamp (then id) so that the same
/// set always exports byte-identically.
pub fn export_csv(events: &[ChatMetricEvent]) -> String {
    let mut sorted: Vec<&ChatMetricEvent> = events.iter().collect();
    sorted.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then_with(|| a.id.cmp(&b.id)));

    let mut out = String::with_capacity(sorted.len() * 128 + CSV_HEADER.len() + 1);
    out.push_str(CSV_HEADER);
    out.push('\n');

    for e in sorted {
        let fields = [
            e.id.to_string(),
            e.user_id.clone(),
            e.user_name.clone(),
            e.user_role.clone(),
            e.timestamp.to_rfc3339(),
            e.session_id.to_string(),
            role_str(e.message_type).to_string(),
            e.message.clone(),
            e.flow.clone(),
            e.selected_option.clone().unwrap_or_default(),
            e.was_helpful.map(|v| v.to_string()).unwrap_or_default(),
            e.ai_generated.to_string(),
            e.tokens_used.to_string(),
            e.response_time_ms.to_string(),
        ];
        let row: Vec<String> = fields.iter().map(|f| escape_field(f)).collect();
        out.push_str(&row.join(","));
        out.push('\n');
    }

    out
}

fn role_str(role: Role) -> &'static str {
    match role {
        Role::User => "user",
        Role::Bot => "bot",
    }
}

/// Quote a field when it contains a delimiter, quote, or line break;
/// embedded quotes are doubled.
fn escape_field(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') || field.contains('\r') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    fn event(message: &str) -> ChatMetricEvent {
        ChatMetricEvent {
            id: Uuid::new_v4(),
            user_id: "u-1".into(),
            user_name: "Maria".into(),
            user_role: "partner".into(),
            timestamp: Utc.with_ymd_and_hms(2024, 3, 10, 9, 30, 0).unwrap(),
            session_id: Uuid::new_v4(),
            message_type: Role::User,
            message: message.into(),
            flow: "duvidas".into(),
            selected_option: None,
            was_helpful: None,
            ai_generated: false,
            tokens_used: 0,
            response_time_ms: 0,
        }
    }

    /// Minimal RFC-4180 parser, enough to verify the export round-trips.
    fn parse_csv(input: &str) -> Vec<Vec<String>> {
        let mut rows = Vec::new();
        let mut row = Vec::new();
        let mut field = String::new();
        let mut in_quotes = false;
        let mut chars = input.chars().peekable();

        while let Some(c) = chars.next() {
            if in_quotes {
                match c {
                    '"' if chars.peek() == Some(&'"') => {
                        chars.next();
                        field.push('"');
                    }
                    '"' => in_quotes = false,
                    _ => field.push(c),
                }
            } else {
                match c {
                    '"' => in_quotes = true,
                    ',' => row.push(std::mem::take(&mut field)),
                    '\n' => {
                        row.push(std::mem::take(&mut field));
                        rows.push(std::mem::take(&mut row));
                    }
                    _ => field.push(c),
                }
            }
        }
        if !field.is_empty() || !row.is_empty() {
            row.push(field);
            rows.push(row);
        }
        rows
    }

    #[test]
    fn test_header_is_first_line() {
        let csv = export_csv(&[]);
        assert_eq!(csv.lines().next().unwrap(), CSV_HEADER);
        assert_eq!(csv.lines().count(), 1);
    }

    #[test]
    fn test_header_has_14_columns() {
        assert_eq!(CSV_HEADER.split(',').count(), 14);
    }

    #[test]
    fn test_plain_row() {
        let e = event("tudo certo");
        let csv = export_csv(&[e.clone()]);
        let rows = parse_csv(&csv);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1][0], e.id.to_string());
        assert_eq!(rows[1][7], "tudo certo");
        assert_eq!(rows[1][6], "user");
        assert_eq!(rows[1][11], "false");
    }

    #[test]
    fn test_embedded_quote_round_trips() {
        let e = event(r#"He said "hi""#);
        let csv = export_csv(&[e]);

        // Quotes doubled and the field wrapped on the wire.
        assert!(csv.contains(r#""He said ""hi""""#));

        // A CSV parser recovers the original string exactly.
        let rows = parse_csv(&csv);
        assert_eq!(rows[1][7], r#"He said "hi""#);
    }

    #[test]
    fn test_comma_and_newline_round_trip() {
        let e = event("linha um\nlinha dois, com vírgula");
        let csv = export_csv(&[e]);
        let rows = parse_csv(&csv);
        assert_eq!(rows[1][7], "linha um\nlinha dois, com vírgula");
    }

    #[test]
    fn test_optional_fields_serialize_empty_or_value() {
        let mut voted = event("ok");
        voted.selected_option = Some("Voltar".into());
        voted.was_helpful = Some(true);

        let unvoted = event("sem voto");

        let csv = export_csv(&[voted, unvoted]);
        let rows = parse_csv(&csv);
        // Rows are timestamp-then-id ordered; find by message instead.
        let voted_row = rows.iter().find(|r| r[7] == "ok").unwrap();
        let unvoted_row = rows.iter().find(|r| r[7] == "sem voto").unwrap();
        assert_eq!(voted_row[9], "Voltar");
        assert_eq!(voted_row[10], "true");
        assert_eq!(unvoted_row[9], "");
        assert_eq!(unvoted_row[10], "");
    }

    #[test]
    fn test_export_sorted_by_timestamp() {
        let mut older = event("antiga");
        older.timestamp = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let newer = event("nova");

        let csv = export_csv(&[newer, older]);
        let rows = parse_csv(&csv);
        assert_eq!(rows[1][7], "antiga");
        assert_eq!(rows[2][7], "nova");
    }

    #[test]
    fn test_export_is_deterministic() {
        let events = vec![event("a"), event("b")];
        assert_eq!(export_csv(&events), export_csv(&events));
    }
}
