mod contact_email;
mod contact_message;
mod contact_name;
mod contact_subject;
mod contact_submission;

pub use contact_email::ContactEmail;
pub use contact_message::ContactMessage;
pub use contact_name::ContactName;
pub use contact_subject::ContactSubject;
pub use contact_submission::{ContactField, ContactSubmission, FieldError};
