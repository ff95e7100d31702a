use serde::Serialize;

use crate::domain::{ContactEmail, ContactMessage, ContactName, ContactSubject};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ContactField {
    Name,
    Email,
    Subject,
    Message,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: ContactField,
    pub message: String,
}

/// A contact submission whose every field passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactSubmission {
    pub name: ContactName,
    pub email: ContactEmail,
    pub subject: ContactSubject,
    pub message: ContactMessage,
}

impl ContactSubmission {
    /// Checks every field independently and reports all violations at once,
    /// in name, email, subject, message order.
    pub fn validate(
        name: String,
        email: String,
        subject: String,
        message: String,
    ) -> Result<Self, Vec<FieldError>> {
        let mut errors = Vec::new();
        let name = collect(ContactName::parse(name), ContactField::Name, &mut errors);
        let email = collect(ContactEmail::parse(email), ContactField::Email, &mut errors);
        let subject = collect(ContactSubject::parse(subject), ContactField::Subject, &mut errors);
        let message = collect(ContactMessage::parse(message), ContactField::Message, &mut errors);

        match (name, email, subject, message) {
            (Some(name), Some(email), Some(subject), Some(message)) => Ok(Self {
                name,
                email,
                subject,
                message,
            }),
            _ => Err(errors),
        }
    }
}

fn collect<T>(
    parsed: Result<T, String>,
    field: ContactField,
    errors: &mut Vec<FieldError>,
) -> Option<T> {
    match parsed {
        Ok(value) => Some(value),
        Err(message) => {
            errors.push(FieldError { field, message });
            None
        }
    }
}
