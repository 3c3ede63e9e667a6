//! Minimal iCalendar (RFC 5545) writer for session invites.

use chrono::{DateTime, Duration, Utc};

#[derive(Debug, Clone)]
pub struct CalendarEvent {
    pub uid: String,
    pub start: DateTime<Utc>,
    pub duration: Duration,
    pub title: String,
    pub description: String,
    pub location: String,
    pub organizer_name: String,
    pub organizer_email: String,
}

impl CalendarEvent {
    /// Serialize as a single-event VCALENDAR with CRLF line endings
    pub fn to_ics(&self) -> String {
        let lines = [
            "BEGIN:VCALENDAR".to_string(),
            "VERSION:2.0".to_string(),
            "PRODID:-//therapy-crm//sessions//EN".to_string(),
            "CALSCALE:GREGORIAN".to_string(),
            "METHOD:PUBLISH".to_string(),
            "BEGIN:VEVENT".to_string(),
            format!("UID:{}", self.uid),
            format!("DTSTAMP:{}", format_utc(Utc::now())),
            format!("DTSTART:{}", format_utc(self.start)),
            format!("DURATION:{}", format_duration(self.duration)),
            format!("SUMMARY:{}", escape_text(&self.title)),
            format!("DESCRIPTION:{}", escape_text(&self.description)),
            format!("LOCATION:{}", escape_text(&self.location)),
            format!(
                "ORGANIZER;CN={}:mailto:{}",
                escape_param(&self.organizer_name),
                self.organizer_email
            ),
            "STATUS:CONFIRMED".to_string(),
            "TRANSP:OPAQUE".to_string(),
            "END:VEVENT".to_string(),
            "END:VCALENDAR".to_string(),
        ];

        lines.iter().map(|line| fold_line(line)).collect()
    }
}

fn format_utc(at: DateTime<Utc>) -> String {
    at.format("%Y%m%dT%H%M%SZ").to_string()
}

fn format_duration(duration: Duration) -> String {
    let total_minutes = duration.num_minutes().max(0);
    let hours = total_minutes / 60;
    let minutes = total_minutes % 60;
    match (hours, minutes) {
        (h, 0) => format!("PT{h}H"),
        (0, m) => format!("PT{m}M"),
        (h, m) => format!("PT{h}H{m}M"),
    }
}

fn escape_text(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace(';', "\\;")
        .replace(',', "\\,")
        .replace("\r\n", "\\n")
        .replace('\n', "\\n")
}

fn escape_param(value: &str) -> String {
    if value.contains([':', ';', ',']) {
        format!("\"{}\"", value.replace('"', ""))
    } else {
        value.to_string()
    }
}

/// Content lines longer than 75 octets continue on the next line after CRLF + space
fn fold_line(line: &str) -> String {
    const LIMIT: usize = 75;
    let mut out = String::with_capacity(line.len() + 8);
    let mut width = 0;

    for ch in line.chars() {
        let len = ch.len_utf8();
        if width + len > LIMIT {
            out.push_str("\r\n ");
            width = 1;
        }
        out.push(ch);
        width += len;
    }
    out.push_str("\r\n");
    out
}
