use chrono::{DateTime, Utc};

use crate::database::models::{Patient, ResponseData};

/// Subject and both bodies of a message
#[derive(Debug, Clone)]
pub struct EmailContent {
    pub subject: String,
    pub text: String,
    pub html: String,
}

/// Check-in request sent by the reminder batch
pub fn reminder(patient_name: &str, form_url: &str) -> EmailContent {
    let name = escape_html(patient_name);

    EmailContent {
        subject: format!("Hi {patient_name}, How Are You Feeling?"),
        text: format!(
            "Dear {patient_name},\n\n\
             We haven't heard from you in a while. Please take a moment to share how you're feeling:\n\
             {form_url}\n\n\
             If you have any questions, reply to this email.\n\n\
             Best regards,\nCRM Therapy Team\n"
        ),
        html: format!(
            r#"<p>Dear {name},</p>
<p>We haven't heard from you in a while. Please take a moment to share how you're feeling.</p>
<p><a href="{form_url}">Complete the Form</a></p>
<p>If you have any questions, reply to this email.</p>
<p>Best regards,<br>CRM Therapy Team</p>"#
        ),
    }
}

/// Notice to the therapist that a patient submitted a check-in
pub fn therapist_notice(
    patient: &Patient,
    response: &ResponseData,
    offline_session_requested: bool,
    patient_url: &str,
) -> EmailContent {
    let message = response.message.as_deref().filter(|m| !m.trim().is_empty()).unwrap_or("None");
    let mood = score_or_missing(response.mood);
    let stress = score_or_missing(response.stress);
    let offline = if offline_session_requested { "Yes" } else { "No" };

    EmailContent {
        subject: format!("New Form Submission from {}", patient.name),
        text: format!(
            "Patient: {} ({})\nMessage: {message}\nMood: {mood}\nStress: {stress}\n\
             Offline Session Requested: {offline}\nView details at: {patient_url}\n",
            patient.name, patient.email
        ),
        html: format!(
            r#"<p>Patient: {} ({})</p>
<p>Message: {}</p>
<p>Mood: {mood}</p>
<p>Stress: {stress}</p>
<p>Offline Session Requested: {offline}</p>
<p>View details at: <a href="{patient_url}">Patient Dashboard</a></p>"#,
            escape_html(&patient.name),
            escape_html(&patient.email),
            escape_html(message),
        ),
    }
}

/// Appointment confirmation; the calendar invite is attached separately
pub fn session_invite(patient_name: &str, session_date: DateTime<Utc>) -> EmailContent {
    let when = session_date.format("%A, %B %-d, %Y, %-I:%M %p UTC").to_string();
    let name = escape_html(patient_name);

    EmailContent {
        subject: "Your Therapy Session Appointment".to_string(),
        text: format!(
            "Dear {patient_name},\n\n\
             Your therapy session has been scheduled.\n\
             Date: {when}\n\
             Please add the attached calendar event to your calendar.\n\n\
             Best regards,\nTherapy CRM Team\n"
        ),
        html: format!(
            r#"<h2>Therapy Session Appointment</h2>
<p>Dear {name},</p>
<p>Your therapy session has been scheduled:</p>
<ul>
  <li><strong>Date:</strong> {when}</li>
</ul>
<p>Please add the attached calendar event to your calendar.</p>
<p>Best regards,<br/>Therapy CRM Team</p>"#
        ),
    }
}

fn score_or_missing(score: Option<i32>) -> String {
    score.map_or_else(|| "Not provided".to_string(), |s| s.to_string())
}

fn escape_html(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}
