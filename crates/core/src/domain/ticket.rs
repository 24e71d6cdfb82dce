use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

/// Prefix shared by generated ticket ids and the ticket recognition pattern.
pub const TICKET_ID_PREFIX: &str = "TICKET";

/// First ticket number handed out; ids are `TICKET{offset + row id}`.
pub const TICKET_NUMBER_OFFSET: i64 = 1000;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TicketId(pub String);

impl TicketId {
    pub fn from_sequence(sequence: i64) -> Self {
        Self(format!("{TICKET_ID_PREFIX}{}", TICKET_NUMBER_OFFSET + sequence))
    }
}

impl fmt::Display for TicketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    Open,
    InProgress,
    Resolved,
    Closed,
}

impl TicketStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::InProgress => "in_progress",
            Self::Resolved => "resolved",
            Self::Closed => "closed",
        }
    }
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Open => "Open",
            Self::InProgress => "In progress",
            Self::Resolved => "Resolved",
            Self::Closed => "Closed",
        };
        f.write_str(label)
    }
}

impl std::str::FromStr for TicketStatus {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "open" => Ok(Self::Open),
            "in_progress" => Ok(Self::InProgress),
            "resolved" => Ok(Self::Resolved),
            "closed" => Ok(Self::Closed),
            other => {
                Err(DomainError::InvariantViolation(format!("unknown ticket status `{other}`")))
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: TicketId,
    pub email: String,
    pub issue: String,
    pub status: TicketStatus,
    pub created_at: DateTime<Utc>,
}

/// Validated input of the support-ticket submission path.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTicket {
    pub email: String,
    pub issue: String,
}

impl NewTicket {
    pub fn new(email: &str, issue: &str) -> Result<Self, DomainError> {
        let email = email.trim();
        let issue = issue.trim();
        if email.is_empty() {
            return Err(DomainError::InvalidTicket("email is required".to_string()));
        }
        let well_formed = email
            .split_once('@')
            .map(|(local, domain)| !local.is_empty() && domain.contains('.'))
            .unwrap_or(false);
        if !well_formed {
            return Err(DomainError::InvalidTicket(format!("`{email}` is not an email address")));
        }
        if issue.is_empty() {
            return Err(DomainError::InvalidTicket("issue description is required".to_string()));
        }
        Ok(Self { email: email.to_string(), issue: issue.to_string() })
    }
}

impl Ticket {
    pub fn summary(&self) -> String {
        format!("Ticket {} is {}: {}", self.id, self.status, self.issue)
    }

    /// Status and issue without the ticket id.
    pub fn progress(&self) -> String {
        format!("{} ({})", self.status, self.issue)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::{NewTicket, Ticket, TicketId, TicketStatus};

    #[test]
    fn ticket_ids_are_offset_from_sequence() {
        assert_eq!(TicketId::from_sequence(1).0, "TICKET1001");
    }

    #[test]
    fn new_ticket_requires_email_and_issue() {
        assert!(NewTicket::new("", "broken widget").is_err());
        assert!(NewTicket::new("not-an-email", "broken widget").is_err());
        assert!(NewTicket::new("alice@example.com", "   ").is_err());

        let ticket =
            NewTicket::new(" alice@example.com ", " broken widget ").expect("valid ticket");
        assert_eq!(ticket.email, "alice@example.com");
        assert_eq!(ticket.issue, "broken widget");
    }

    #[test]
    fn progress_leaves_out_the_ticket_id() {
        let ticket = Ticket {
            id: TicketId::from_sequence(3),
            email: "alice@example.com".to_string(),
            issue: "Widget arrived broken".to_string(),
            status: TicketStatus::InProgress,
            created_at: Utc::now(),
        };

        assert_eq!(ticket.progress(), "In progress (Widget arrived broken)");
        assert_eq!(ticket.summary(), "Ticket TICKET1003 is In progress: Widget arrived broken");
    }

    #[test]
    fn status_parses_stored_labels() {
        assert_eq!("in_progress".parse::<TicketStatus>(), Ok(TicketStatus::InProgress));
        assert!("archived".parse::<TicketStatus>().is_err());
    }
}
