use time::{OffsetDateTime, format_description::well_known::Rfc3339};

pub mod health;
/// Custom question input.
pub mod question;
/// Room state acknowledgements.
pub mod room;
pub mod validation;

fn format_timestamp(time: OffsetDateTime) -> String {
    time.format(&Rfc3339)
        .unwrap_or_else(|_| "invalid-timestamp".into())
}
