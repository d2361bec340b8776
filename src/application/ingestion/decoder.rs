//! CSV record decoder
//!
//! Turns one CSV document into a stream of [`TollTransaction`]s. Headers are
//! resolved to column indices once, so column order in the file does not
//! matter. Fields are read as raw bytes; text that is not UTF-8 (Excel's
//! cp1252 exports) is kept with replacement characters instead of failing
//! the document.

use std::collections::HashMap;
use std::io::Read;

use chrono::NaiveDate;
use csv::{ByteRecord, ByteRecordsIntoIter, ReaderBuilder};
use thiserror::Error;

use crate::domain::{Money, TollTransaction};

pub const COL_ENROLMENT: &str = "ENROLMENT_NO_DATE";
pub const COL_AMOUNT: &str = "TOTAL_AMOUNT_CHARGED";
pub const COL_GST: &str = "GST_AMOUNT";
pub const COL_OPERATOR: &str = "OPERATOR_ID";
pub const COL_RESIDENT: &str = "RESIDENT_NAME";

/// Headers every document must carry, in the order they are checked.
pub const REQUIRED_COLUMNS: [&str; 5] =
    [COL_ENROLMENT, COL_AMOUNT, COL_GST, COL_OPERATOR, COL_RESIDENT];

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("missing column: {0}")]
    MissingColumn(&'static str),

    #[error("{0}")]
    StreamRead(String),
}

impl From<csv::Error> for DecodeError {
    fn from(e: csv::Error) -> Self {
        DecodeError::StreamRead(e.to_string())
    }
}

/// Positions of the required columns within a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ColumnMap {
    enrolment: usize,
    amount: usize,
    gst: usize,
    operator: usize,
    resident: usize,
}

impl ColumnMap {
    fn resolve(header: &ByteRecord) -> Result<Self, DecodeError> {
        let index: HashMap<String, usize> = header
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let name = String::from_utf8_lossy(name);
                (name.trim_start_matches('\u{feff}').trim().to_string(), i)
            })
            .collect();

        let mut positions = [0usize; REQUIRED_COLUMNS.len()];
        for (slot, name) in positions.iter_mut().zip(REQUIRED_COLUMNS) {
            *slot = *index.get(name).ok_or(DecodeError::MissingColumn(name))?;
        }
        let [enrolment, amount, gst, operator, resident] = positions;

        Ok(Self {
            enrolment,
            amount,
            gst,
            operator,
            resident,
        })
    }

    fn transaction(&self, record: &ByteRecord, batch_date: NaiveDate) -> TollTransaction {
        let field = move |i: usize| String::from_utf8_lossy(record.get(i).unwrap_or_default());

        TollTransaction::new(
            field(self.enrolment),
            Money::parse_lenient(&field(self.amount)),
            Money::parse_lenient(&field(self.gst)),
            batch_date,
        )
        .with_operator(field(self.operator))
        .with_resident(field(self.resident))
    }
}

/// Lazily decoded rows of one document.
pub struct Records<R: Read> {
    rows: ByteRecordsIntoIter<R>,
    columns: ColumnMap,
    batch_date: NaiveDate,
}

impl<R: Read> Iterator for Records<R> {
    type Item = Result<TollTransaction, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        let record = match self.rows.next()? {
            Ok(record) => record,
            Err(e) => return Some(Err(e.into())),
        };
        Some(Ok(self.columns.transaction(&record, self.batch_date)))
    }
}

/// Read the header line and validate it.
///
/// Fails with [`DecodeError::MissingColumn`] naming the first absent
/// required header before any row is produced. Every row yielded carries
/// `batch_date`.
pub fn decode<R: Read>(reader: R, batch_date: NaiveDate) -> Result<Records<R>, DecodeError> {
    let mut csv_reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(false)
        .from_reader(reader);

    let mut header = ByteRecord::new();
    if !csv_reader.read_byte_record(&mut header)? {
        return Err(DecodeError::StreamRead("empty CSV document".to_string()));
    }
    let columns = ColumnMap::resolve(&header)?;

    Ok(Records {
        rows: csv_reader.into_byte_records(),
        columns,
        batch_date,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 10).unwrap()
    }

    fn decode_all(doc: &str) -> Result<Vec<TollTransaction>, DecodeError> {
        decode(doc.as_bytes(), day())?.collect()
    }

    #[test]
    fn decodes_rows_in_any_column_order() {
        let doc = "RESIDENT_NAME,GST_AMOUNT,ENROLMENT_NO_DATE,OPERATOR_ID,TOTAL_AMOUNT_CHARGED\n\
                   Alice,10,A,OP1,125\n\
                   \"Bob, Jr\",5.5,B,OP2,75.00\n";

        let rows = decode_all(doc).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].enrolment_key, "A");
        assert_eq!(rows[0].amount_charged, Money::from_major(125));
        assert_eq!(rows[0].gst_amount, Money::from_major(10));
        assert_eq!(rows[0].operator_id, "OP1");
        assert_eq!(rows[1].resident_name, "Bob, Jr");
        assert_eq!(rows[1].gst_amount, Money::from_minor(550));
        assert!(rows.iter().all(|r| r.upload_batch_date == day()));
    }

    #[test]
    fn header_whitespace_and_bom_are_ignored() {
        let doc = "\u{feff} ENROLMENT_NO_DATE , TOTAL_AMOUNT_CHARGED,GST_AMOUNT,OPERATOR_ID,RESIDENT_NAME\n\
                   A,125,10,OP1,Alice\n";
        let rows = decode_all(doc).unwrap();
        assert_eq!(rows[0].enrolment_key, "A");
    }

    #[test]
    fn first_missing_column_is_reported() {
        let doc = "ENROLMENT_NO_DATE,OPERATOR_ID,RESIDENT_NAME\nA,OP1,Alice\n";
        let err = decode(doc.as_bytes(), day()).err().unwrap();
        assert!(matches!(err, DecodeError::MissingColumn(COL_AMOUNT)));
        assert_eq!(err.to_string(), "missing column: TOTAL_AMOUNT_CHARGED");
    }

    #[test]
    fn header_names_are_case_sensitive() {
        let doc = "enrolment_no_date,TOTAL_AMOUNT_CHARGED,GST_AMOUNT,OPERATOR_ID,RESIDENT_NAME\n";
        let err = decode(doc.as_bytes(), day()).err().unwrap();
        assert!(matches!(err, DecodeError::MissingColumn(COL_ENROLMENT)));
    }

    #[test]
    fn unparsable_amounts_become_zero() {
        let doc = "ENROLMENT_NO_DATE,TOTAL_AMOUNT_CHARGED,GST_AMOUNT,OPERATOR_ID,RESIDENT_NAME\n\
                   A,abc,,OP1,Alice\n\
                   B, 75 ,\t5\t,OP2,Bob\n";
        let rows = decode_all(doc).unwrap();
        assert_eq!(rows[0].amount_charged, Money::ZERO);
        assert_eq!(rows[0].gst_amount, Money::ZERO);
        assert_eq!(rows[1].amount_charged, Money::from_major(75));
        assert_eq!(rows[1].gst_amount, Money::from_major(5));
    }

    #[test]
    fn short_row_fails_after_earlier_rows() {
        let doc = "ENROLMENT_NO_DATE,TOTAL_AMOUNT_CHARGED,GST_AMOUNT,OPERATOR_ID,RESIDENT_NAME\n\
                   A,125,10,OP1,Alice\n\
                   B,75\n\
                   C,0,0,OP3,Carol\n";
        let mut records = decode(doc.as_bytes(), day()).unwrap();

        assert_eq!(records.next().unwrap().unwrap().enrolment_key, "A");
        assert!(matches!(
            records.next().unwrap(),
            Err(DecodeError::StreamRead(_))
        ));
    }

    #[test]
    fn non_utf8_text_is_kept_lossily() {
        let mut doc = b"ENROLMENT_NO_DATE,TOTAL_AMOUNT_CHARGED,GST_AMOUNT,OPERATOR_ID,RESIDENT_NAME\n\
                        A,125,10,OP1,Alice\n\
                        B,75,5,OP2,Jos"
            .to_vec();
        doc.push(0xE9);
        doc.extend_from_slice(b"\nC,0,0,OP3,Carol\n");

        let rows: Vec<_> = decode(doc.as_slice(), day())
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1].resident_name, "Jos\u{FFFD}");
        assert_eq!(rows[1].amount_charged, Money::from_major(75));
        assert_eq!(rows[2].enrolment_key, "C");
    }

    #[test]
    fn empty_document_is_a_read_error() {
        let err = decode("".as_bytes(), day()).err().unwrap();
        assert!(matches!(err, DecodeError::StreamRead(_)));
    }

    #[test]
    fn header_only_document_has_no_rows() {
        let doc = "ENROLMENT_NO_DATE,TOTAL_AMOUNT_CHARGED,GST_AMOUNT,OPERATOR_ID,RESIDENT_NAME\n";
        assert!(decode_all(doc).unwrap().is_empty());
    }
}
