use ammonia::clean_text;
use chrono::{DateTime, Utc};

use crate::entities::{
    client::{ClientContext, UserAgentInfo},
    contact::ContactForm,
    notification::{EmailBody, OutgoingEmail, PushMessage},
    verification::VerificationRecord,
};

pub const BOOKING_CONFIRMATION_SUBJECT: &str = "Appointment Confirmation";
pub const BOOKING_NOTICE_SUBJECT: &str = "New Appointment Booking";
pub const CONTACT_SUBJECT: &str = "📬 New Contact Form Submission";

/// Slot the submitter asked for, already validated.
#[derive(Debug, Clone, Copy)]
pub struct Slot<'a> {
    pub date: &'a str,
    pub time: &'a str,
}

pub fn booking_confirmation(record: &VerificationRecord, slot: Slot<'_>) -> OutgoingEmail {
    let html = format!(
        "<h2>Appointment Confirmed</h2>\
         <p>Dear {name},</p>\
         <p>Your appointment has been scheduled for {date} at {time}.</p>\
         <p>We'll send you a reminder 15 minutes before the appointment.</p>",
        name = clean_text(&record.name),
        date = clean_text(slot.date),
        time = clean_text(slot.time),
    );

    OutgoingEmail {
        to: vec![record.email.clone()],
        subject: BOOKING_CONFIRMATION_SUBJECT.to_string(),
        body: EmailBody::Html(html),
        reply_to: None,
    }
}

pub fn booking_notice(
    operator: &str,
    record: &VerificationRecord,
    contact_id: &str,
    slot: Slot<'_>,
    agent: &UserAgentInfo,
) -> OutgoingEmail {
    let html = format!(
        "<h2>New Appointment</h2>\
         <p>Name: {name}</p>\
         <p>Email: {email}</p>\
         <p>Contact: {method} - {contact_id}</p>\
         <p>Date: {date}</p>\
         <p>Time: {time}</p>\
         <p>Browser: {browser}</p>\
         <p>OS: {os}</p>",
        name = clean_text(&record.name),
        email = clean_text(&record.email),
        method = record.contact_method,
        contact_id = clean_text(contact_id),
        date = clean_text(slot.date),
        time = clean_text(slot.time),
        browser = clean_text(&agent.browser_label()),
        os = clean_text(&agent.os_label()),
    );

    OutgoingEmail {
        to: vec![operator.to_string()],
        subject: BOOKING_NOTICE_SUBJECT.to_string(),
        body: EmailBody::Html(html),
        reply_to: Some(record.email.clone()),
    }
}

pub fn booking_push(record: &VerificationRecord, slot: Slot<'_>) -> PushMessage {
    PushMessage {
        title: "New appointment".to_string(),
        body: format!("{} booked {} at {}", record.name, slot.date, slot.time),
    }
}

pub fn contact_submission(
    operator: &str,
    form: &ContactForm,
    client: &ClientContext,
    agent: &UserAgentInfo,
    submitted_at: DateTime<Utc>,
) -> OutgoingEmail {
    let field = |label: &str, value: &str| {
        format!(
            "<p><strong style=\"color: #333;\">{label}:</strong> <span style=\"color: #555;\">{}</span></p>",
            clean_text(value)
        )
    };
    let missing = "Unknown";

    let mut html = String::from(
        "<div style=\"font-family: Arial, sans-serif; color: #333; line-height: 1.6; padding: 20px; border: 1px solid #eee; background-color: #f9f9f9;\">\
         <h2 style=\"color: #2b79c2; border-bottom: 2px solid #2b79c2; padding-bottom: 10px;\">📧 New Contact Form Submission</h2>\
         <div style=\"padding: 10px 0;\">",
    );
    html.push_str(&field("Name", &form.name));
    html.push_str(&field("Email", &form.email));
    html.push_str("<p><strong style=\"color: #333;\">Message:</strong></p>");
    html.push_str(&format!(
        "<p style=\"color: #555; background-color: #fff; padding: 15px; border-radius: 8px;\">{}</p>",
        clean_text(&form.message)
    ));
    html.push_str(
        "</div><hr style=\"border: none; border-top: 1px solid #eee; margin: 20px 0;\">\
         <h3 style=\"color: #2b79c2; border-bottom: 2px solid #2b79c2; padding-bottom: 10px;\">📋 Additional Information</h3>\
         <div style=\"padding: 10px 0;\">",
    );
    html.push_str(&field("IP Address", &client.ip));
    html.push_str(&field("Browser", &agent.browser_label()));
    html.push_str(&field("Operating System", &agent.os_label()));
    html.push_str(&field("Device", &agent.device));
    html.push_str(&field("User Agent", client.user_agent.as_deref().unwrap_or(missing)));
    html.push_str(&field("Referer", client.referer.as_deref().unwrap_or(missing)));
    html.push_str(&field("Origin", client.origin.as_deref().unwrap_or(missing)));
    html.push_str(&field("Time of Submission", &submitted_at.to_rfc3339()));
    html.push_str("</div></div>");

    OutgoingEmail {
        to: vec![operator.to_string()],
        subject: CONTACT_SUBJECT.to_string(),
        body: EmailBody::Html(html),
        reply_to: Some(form.email.clone()),
    }
}

pub fn contact_push(form: &ContactForm) -> PushMessage {
    let preview: String = form.message.chars().take(120).collect();
    PushMessage {
        title: format!("New message from {}", form.name),
        body: preview,
    }
}
