//! Email templates for applicant and staff notifications.

use admissions_core::types::DbId;
use serde::{Deserialize, Serialize};

/// An email that is ready to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedEmail {
    pub subject: String,
    pub body: String,
}

/// Template plus the data it needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "template", rename_all = "snake_case")]
pub enum EmailTemplate {
    SubmissionReceived {
        applicant_name: String,
        application_id: DbId,
        degree_program: String,
    },
    StatusChanged {
        applicant_name: String,
        application_id: DbId,
        status_label: String,
        remarks: Option<String>,
    },
    AdminMessage {
        applicant_name: String,
        subject: String,
        message: String,
    },
    AccountCreated {
        display_name: String,
        username: String,
        role: String,
    },
}

/// A template addressed to one recipient. Carried as an event payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub recipient_email: String,
    #[serde(flatten)]
    pub template: EmailTemplate,
}

impl EmailTemplate {
    pub fn name(&self) -> &'static str {
        match self {
            Self::SubmissionReceived { .. } => "submission_received",
            Self::StatusChanged { .. } => "status_changed",
            Self::AdminMessage { .. } => "admin_message",
            Self::AccountCreated { .. } => "account_created",
        }
    }

    pub fn render(&self, portal_name: &str) -> RenderedEmail {
        let (subject, body) = match self {
            Self::SubmissionReceived {
                applicant_name,
                application_id,
                degree_program,
            } => (
                format!("[{portal_name}] Application received"),
                format!(
                    "Dear {applicant_name},\n\n\
                     We have received your application for {degree_program} \
                     (reference #{application_id}). You will be notified when \
                     its status changes.\n"
                ),
            ),
            Self::StatusChanged {
                applicant_name,
                application_id,
                status_label,
                remarks,
            } => {
                let mut body = format!(
                    "Dear {applicant_name},\n\n\
                     The status of your application #{application_id} is now: {status_label}.\n"
                );
                if let Some(remarks) = remarks.as_deref().map(str::trim).filter(|r| !r.is_empty()) {
                    body.push_str(&format!("\nRemarks:\n{remarks}\n"));
                }
                (
                    format!("[{portal_name}] Application {status_label}"),
                    body,
                )
            }
            Self::AdminMessage {
                applicant_name,
                subject,
                message,
            } => (
                format!("[{portal_name}] {}", subject.trim()),
                format!("Dear {applicant_name},\n\n{}\n", message.trim()),
            ),
            Self::AccountCreated {
                display_name,
                username,
                role,
            } => (
                format!("[{portal_name}] Your account has been created"),
                format!(
                    "Hello {display_name},\n\n\
                     An {role} account has been created for you with username \
                     \"{username}\". Sign in with the password given to you by \
                     your administrator and change it afterwards.\n"
                ),
            ),
        };
        RenderedEmail {
            subject,
            body: format!("{body}\n-- \n{portal_name}\n"),
        }
    }
}
