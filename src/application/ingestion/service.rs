//! Ingestion pipeline: decode → insert-if-absent → summarize
//!
//! Rows are persisted one at a time; there is no cross-row transaction, so a
//! document that fails half-way leaves its earlier rows stored.

use std::io::Read;
use std::sync::Arc;

use chrono::NaiveDate;
use thiserror::Error;
use tracing::{debug, info};

use super::decoder::{decode, DecodeError};
use crate::domain::{ClearedBatch, DomainError, DomainResult, LedgerRepository, UploadSummary};
use crate::notifications::{
    BatchClearedEvent, Event, SharedEventBus, UploadProcessedEvent, UploadSource,
};

#[derive(Debug, Error)]
pub enum IngestError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("failed to store transaction: {0}")]
    Store(#[from] DomainError),
}

/// Writes CSV uploads into the ledger and announces the result.
pub struct IngestService {
    ledger: Arc<dyn LedgerRepository>,
    event_bus: SharedEventBus,
}

impl IngestService {
    pub fn new(ledger: Arc<dyn LedgerRepository>, event_bus: SharedEventBus) -> Self {
        Self { ledger, event_bus }
    }

    /// Ingest one CSV document as the batch of `batch_date`.
    ///
    /// Every decoded row counts toward the summary, including rows whose
    /// enrolment key was already stored.
    pub async fn ingest<R: Read + Send>(
        &self,
        reader: R,
        batch_date: NaiveDate,
        filename: Option<String>,
        source: UploadSource,
    ) -> Result<UploadSummary, IngestError> {
        let mut summary = UploadSummary::new(batch_date, filename);

        for record in decode(reader, batch_date)? {
            let tx = record?;
            let inserted = self.ledger.insert_if_absent(&tx).await?;
            summary.record(tx.amount_charged, tx.gst_amount, inserted);
        }

        metrics::counter!("csv_uploads_total").increment(1);
        metrics::counter!("csv_rows_ingested_total").increment(summary.inserted);

        info!(
            "Ingested {:?} for {}: {} rows, {} new, {} duplicates",
            summary.filename.as_deref().unwrap_or("<unnamed>"),
            batch_date,
            summary.rows,
            summary.inserted,
            summary.duplicates()
        );

        self.event_bus
            .publish(Event::UploadProcessed(UploadProcessedEvent {
                summary: summary.clone(),
                source,
            }));

        Ok(summary)
    }

    /// Delete every row of the most recent upload date.
    pub async fn clear_latest_batch(&self) -> DomainResult<Option<ClearedBatch>> {
        let cleared = self.ledger.delete_latest_batch().await?;

        match cleared {
            Some(batch) => {
                self.event_bus.publish(Event::BatchCleared(BatchClearedEvent {
                    batch_date: batch.batch_date,
                    rows: batch.rows,
                }));
            }
            None => debug!("Clear requested on an empty ledger"),
        }
        Ok(cleared)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DateRange, Money, SlabCounts};
    use crate::infrastructure::database::{open_ledger_store, DatabaseConfig, SeaOrmLedgerRepository};
    use crate::notifications::create_event_bus;
    use std::time::Duration;

    const HEADER: &str = "ENROLMENT_NO_DATE,TOTAL_AMOUNT_CHARGED,GST_AMOUNT,OPERATOR_ID,RESIDENT_NAME\n";

    struct Fixture {
        _dir: tempfile::TempDir,
        ledger: Arc<SeaOrmLedgerRepository>,
        bus: SharedEventBus,
        service: IngestService,
    }

    async fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.db").to_string_lossy().into_owned();
        let db = open_ledger_store(&DatabaseConfig::sqlite(&path)).await.unwrap();
        let ledger = Arc::new(SeaOrmLedgerRepository::new(db));
        let bus = create_event_bus();
        let service = IngestService::new(ledger.clone(), bus.clone());
        Fixture {
            _dir: dir,
            ledger,
            bus,
            service,
        }
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 10).unwrap()
    }

    async fn ingest(f: &Fixture, doc: &str) -> Result<UploadSummary, IngestError> {
        f.service
            .ingest(doc.as_bytes(), day(), Some("toll.csv".into()), UploadSource::Web)
            .await
    }

    #[tokio::test]
    async fn duplicate_rows_count_in_summary_but_store_once() {
        let f = fixture().await;
        let doc = format!(
            "{HEADER}A,125,10,OP1,Alice\nB,75,5,OP2,Bob\nA,125,10,OP1,Alice\n"
        );

        let summary = ingest(&f, &doc).await.unwrap();

        assert_eq!(summary.rows, 3);
        assert_eq!(summary.inserted, 2);
        assert_eq!(summary.revenue, Money::from_major(325));
        assert_eq!(summary.gst, Money::from_major(25));
        assert_eq!(
            summary.slabs,
            SlabCounts {
                count_125: 2,
                count_75: 1,
                count_0: 0
            }
        );
        assert_eq!(f.ledger.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn reingesting_a_file_is_idempotent() {
        let f = fixture().await;
        let doc = format!("{HEADER}A,125,10,OP1,Alice\nB,75,5,OP2,Bob\n");

        let first = ingest(&f, &doc).await.unwrap();
        let second = ingest(&f, &doc).await.unwrap();

        assert_eq!(first.rows, second.rows);
        assert_eq!(first.revenue, second.revenue);
        assert_eq!(second.inserted, 0);
        assert_eq!(f.ledger.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn missing_column_persists_nothing() {
        let f = fixture().await;
        let doc = "ENROLMENT_NO_DATE,GST_AMOUNT,OPERATOR_ID,RESIDENT_NAME\nA,10,OP1,Alice\n";

        let err = ingest(&f, doc).await.unwrap_err();

        assert!(matches!(
            err,
            IngestError::Decode(DecodeError::MissingColumn("TOTAL_AMOUNT_CHARGED"))
        ));
        assert_eq!(err.to_string(), "missing column: TOTAL_AMOUNT_CHARGED");
        assert_eq!(f.ledger.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn unparsable_amount_is_stored_as_zero() {
        let f = fixture().await;
        let doc = format!("{HEADER}A,abc,0,OP1,Alice\n");

        let summary = ingest(&f, &doc).await.unwrap();

        assert_eq!(summary.slabs.count_0, 1);
        assert_eq!(
            f.ledger.scan(DateRange::on(day())).await.unwrap(),
            vec![(Money::ZERO, Money::ZERO)]
        );
    }

    #[tokio::test]
    async fn malformed_row_keeps_earlier_rows() {
        let f = fixture().await;
        let doc = format!("{HEADER}A,125,10,OP1,Alice\nB,75\nC,0,0,OP3,Carol\n");

        let err = ingest(&f, &doc).await.unwrap_err();

        assert!(matches!(err, IngestError::Decode(DecodeError::StreamRead(_))));
        assert_eq!(f.ledger.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn cp1252_resident_name_does_not_abort_the_upload() {
        let f = fixture().await;
        let mut doc = format!("{HEADER}A,125,10,OP1,Alice\nB,75,5,OP2,Jos").into_bytes();
        doc.push(0xE9);
        doc.extend_from_slice(b"\nC,0,0,OP3,Carol\n");

        let summary = f
            .service
            .ingest(doc.as_slice(), day(), None, UploadSource::Telegram)
            .await
            .unwrap();

        assert_eq!(summary.rows, 3);
        assert_eq!(summary.inserted, 3);
        assert_eq!(f.ledger.count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn oversized_amounts_are_zero_and_never_overflow() {
        let f = fixture().await;
        let doc = format!(
            "{HEADER}A,90000000000000000,90000000000000000,OP1,Alice\n\
             B,90000000000000000,1,OP2,Bob\n\
             C,999999999999999,0,OP3,Carol\n\
             D,999999999999999,0,OP4,Dan\n"
        );

        let summary = ingest(&f, &doc).await.unwrap();

        assert_eq!(summary.rows, 4);
        assert_eq!(summary.slabs.count_0, 2);
        assert_eq!(summary.revenue, Money::from_major(1_999_999_999_999_998));
        assert_eq!(summary.gst, Money::from_major(1));

        let totals: Money = f.ledger.scan_all().await.unwrap().into_iter().map(|(a, _)| a).sum();
        assert_eq!(totals, summary.revenue);
    }

    #[tokio::test]
    async fn concurrent_uploads_of_one_file_insert_each_key_once() {
        let f = fixture().await;
        let doc = format!(
            "{HEADER}A,125,10,OP1,Alice\nB,75,5,OP2,Bob\nC,0,0,OP3,Carol\nA,125,10,OP1,Alice\n"
        );

        let (first, second) = tokio::join!(ingest(&f, &doc), ingest(&f, &doc));
        let (first, second) = (first.unwrap(), second.unwrap());

        assert_eq!(first.rows, 4);
        assert_eq!(second.rows, 4);
        assert_eq!(first.revenue, second.revenue);
        assert_eq!(first.slabs, second.slabs);
        assert_eq!(first.inserted + second.inserted, 3);
        assert_eq!(f.ledger.count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn successful_upload_is_announced() {
        let f = fixture().await;
        let mut subscriber = f.bus.subscribe();

        ingest(&f, &format!("{HEADER}A,125,10,OP1,Alice\n")).await.unwrap();

        let message = tokio::time::timeout(Duration::from_millis(100), subscriber.recv())
            .await
            .expect("Timeout")
            .expect("No message");
        match message.event {
            Event::UploadProcessed(e) => {
                assert_eq!(e.summary.rows, 1);
                assert_eq!(e.summary.filename.as_deref(), Some("toll.csv"));
                assert_eq!(e.source, UploadSource::Web);
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[tokio::test]
    async fn clearing_announces_the_removed_batch() {
        let f = fixture().await;
        assert_eq!(f.service.clear_latest_batch().await.unwrap(), None);

        ingest(&f, &format!("{HEADER}A,125,10,OP1,Alice\n")).await.unwrap();
        let mut subscriber = f.bus.subscribe();

        let cleared = f.service.clear_latest_batch().await.unwrap().unwrap();
        assert_eq!(cleared.rows, 1);

        let message = tokio::time::timeout(Duration::from_millis(100), subscriber.recv())
            .await
            .expect("Timeout")
            .expect("No message");
        assert_eq!(message.event.event_type(), "batch_cleared");
        assert_eq!(message.event.batch_date(), day());
    }
}
