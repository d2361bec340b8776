//! Toll transaction domain entity

use chrono::NaiveDate;

use crate::domain::money::Money;

/// One toll event as read from an uploaded CSV.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TollTransaction {
    /// Natural key (`ENROLMENT_NO_DATE`), unique across the store
    pub enrolment_key: String,
    /// Amount charged (`TOTAL_AMOUNT_CHARGED`)
    pub amount_charged: Money,
    /// GST component (`GST_AMOUNT`)
    pub gst_amount: Money,
    pub operator_id: String,
    pub resident_name: String,
    /// Processing date of the upload, not a CSV field
    pub upload_batch_date: NaiveDate,
}

impl TollTransaction {
    pub fn new(
        enrolment_key: impl Into<String>,
        amount_charged: Money,
        gst_amount: Money,
        upload_batch_date: NaiveDate,
    ) -> Self {
        Self {
            enrolment_key: enrolment_key.into(),
            amount_charged,
            gst_amount,
            operator_id: String::new(),
            resident_name: String::new(),
            upload_batch_date,
        }
    }

    pub fn with_operator(mut self, operator_id: impl Into<String>) -> Self {
        self.operator_id = operator_id.into();
        self
    }

    pub fn with_resident(mut self, resident_name: impl Into<String>) -> Self {
        self.resident_name = resident_name.into();
        self
    }
}

/// Rows removed by clearing the most recent upload batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClearedBatch {
    pub batch_date: NaiveDate,
    pub rows: u64,
}
