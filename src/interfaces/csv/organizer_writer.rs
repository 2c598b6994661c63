use crate::application::admin::OrganizerSummary;
use crate::error::Result;
use serde::Serialize;
use std::io::Write;

#[derive(Serialize)]
struct Row<'a> {
    user_id: &'a str,
    name: &'a str,
    email: &'a str,
    bank_name: &'a str,
    account_number: &'a str,
    account_name: &'a str,
    subaccount_id: &'a str,
    state: String,
    activation_method: String,
    activated_at: String,
}

impl<'a> From<&'a OrganizerSummary> for Row<'a> {
    fn from(summary: &'a OrganizerSummary) -> Self {
        Self {
            user_id: &summary.user_id,
            name: &summary.name,
            email: summary.email.as_deref().unwrap_or_default(),
            bank_name: summary.bank_name.as_deref().unwrap_or_default(),
            account_number: summary.account_number.as_deref().unwrap_or_default(),
            account_name: summary.account_name.as_deref().unwrap_or_default(),
            subaccount_id: summary.subaccount_id.as_deref().unwrap_or_default(),
            state: summary.state.to_string(),
            activation_method: summary
                .activation_method
                .map(|m| m.to_string())
                .unwrap_or_default(),
            activated_at: summary
                .activated_at
                .map(|t| t.to_rfc3339())
                .unwrap_or_default(),
        }
    }
}

/// Writes organizer summaries as CSV, one row per organizer, with a header row.
pub struct OrganizerWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> OrganizerWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    pub fn write_organizers<'a, I>(&mut self, organizers: I) -> Result<()>
    where
        I: IntoIterator<Item = &'a OrganizerSummary>,
    {
        for summary in organizers {
            self.writer.serialize(Row::from(summary))?;
        }
        self.writer.flush()?;
        Ok(())
    }
}
