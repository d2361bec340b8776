//! Telegram message handlers

use std::path::PathBuf;
use std::sync::Arc;

use chrono::Local;
use tracing::{info, warn};

use crate::application::{IngestService, ReportService};
use crate::domain::UploadSummary;
use crate::infrastructure::storage::{sanitize_filename, UploadArchive};
use crate::infrastructure::telegram::{Document, Message};
use crate::notifications::{messages, ActiveBot, TelegramLink, UploadSource};

/// Services reachable from chat.
pub struct BotContext {
    pub link: TelegramLink,
    pub ingest: Arc<IngestService>,
    pub reports: ReportService,
    pub archive: UploadArchive,
    /// Database file the running store was opened from. Settings saved
    /// later only take effect after a restart, so this never follows them.
    pub database_path: PathBuf,
}

/// What to send back for a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Markdown(String),
    Plain(String),
    Document(PathBuf),
}

impl BotContext {
    pub async fn reply_to_command(&self, command: &str) -> Reply {
        match command {
            "start" => Reply::Markdown(messages::WELCOME.to_string()),
            "status" => match self.reports.all_time().await {
                Ok(totals) => Reply::Markdown(messages::all_time_report(&totals)),
                Err(e) => Reply::Plain(format!("❌ Report error: {}", e)),
            },
            "today" => {
                let today = Local::now().date_naive();
                match self.reports.for_day(today).await {
                    Ok(totals) => Reply::Markdown(messages::day_report(today, &totals)),
                    Err(e) => Reply::Plain(format!("❌ Report error: {}", e)),
                }
            }
            "backup" => Reply::Document(self.database_path.clone()),
            _ => Reply::Plain(messages::USAGE.to_string()),
        }
    }

    /// Archive and ingest a received CSV as today's batch.
    ///
    /// The error is the chat-ready text.
    pub async fn ingest_document(&self, filename: &str, content: &[u8]) -> Result<UploadSummary, String> {
        let today = Local::now().date_naive();
        let filename = sanitize_filename(filename);

        self.archive
            .store(today, &filename, content)
            .await
            .map_err(|e| format!("❌ Save error: {}", e))?;

        self.ingest
            .ingest(content, today, Some(filename), UploadSource::Telegram)
            .await
            .map_err(|e| messages::csv_error(&e.to_string()))
    }
}

async fn send(bot: &ActiveBot, chat_id: i64, reply: Reply) {
    let result = match reply {
        Reply::Markdown(text) => bot.client.send_markdown(chat_id, &text).await,
        Reply::Plain(text) => bot.client.send_message(chat_id, &text).await,
        Reply::Document(path) => bot.client.send_document(chat_id, &path).await,
    };
    if let Err(e) = result {
        warn!("Failed to reply to chat {}: {}", chat_id, e);
    }
}

async fn fetch_document(bot: &ActiveBot, document: &Document) -> Result<Vec<u8>, String> {
    let file = bot
        .client
        .get_file(&document.file_id)
        .await
        .map_err(|e| {
            warn!("getFile failed: {}", e);
            "❌ Error getting file.".to_string()
        })?;
    let path = file.file_path.ok_or_else(|| "❌ Error getting file.".to_string())?;

    bot.client.download(&path).await.map_err(|e| {
        warn!("File download failed: {}", e);
        "❌ Download error.".to_string()
    })
}

async fn handle_document(ctx: Arc<BotContext>, bot: ActiveBot, chat_id: i64, document: Document) {
    let filename = document.file_name.clone().unwrap_or_default();

    let outcome = match fetch_document(&bot, &document).await {
        Ok(content) => ctx.ingest_document(&filename, &content).await,
        Err(text) => Err(text),
    };

    match outcome {
        Ok(summary) => {
            info!("Telegram upload {:?}: {} rows", summary.filename, summary.rows);
            // With an admin chat the notifier posts the report there.
            if bot.report_chat().is_none() {
                let text = messages::upload_report(&summary, &Local::now());
                send(&bot, chat_id, Reply::Markdown(text)).await;
            }
        }
        Err(text) => send(&bot, chat_id, Reply::Plain(text)).await,
    }
}

/// Route one incoming message.
pub async fn dispatch(ctx: &Arc<BotContext>, bot: &ActiveBot, message: Message) {
    let chat_id = message.chat.id;

    if !bot.authorizes(chat_id) {
        send(bot, chat_id, Reply::Plain(messages::UNAUTHORIZED.to_string())).await;
        return;
    }

    if let Some(document) = message.document.clone() {
        tokio::spawn(handle_document(Arc::clone(ctx), bot.clone(), chat_id, document));
        return;
    }

    if let Some(command) = message.command() {
        let reply = ctx.reply_to_command(command).await;
        send(bot, chat_id, reply).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{LedgerRepository, Money};
    use crate::infrastructure::database::{open_ledger_store, DatabaseConfig, SeaOrmLedgerRepository};
    use crate::notifications::create_event_bus;

    async fn context() -> (tempfile::TempDir, BotContext) {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("ledger.db").to_string_lossy().into_owned();
        let db = open_ledger_store(&DatabaseConfig::sqlite(&db_path)).await.unwrap();
        let ledger: Arc<dyn LedgerRepository> = Arc::new(SeaOrmLedgerRepository::new(db));

        let ctx = BotContext {
            link: TelegramLink::new(),
            ingest: Arc::new(IngestService::new(ledger.clone(), create_event_bus())),
            reports: ReportService::new(ledger),
            archive: UploadArchive::new(dir.path().join("uploads")),
            database_path: PathBuf::from(db_path),
        };
        (dir, ctx)
    }

    #[tokio::test]
    async fn commands_map_to_replies() {
        let (dir, ctx) = context().await;

        assert_eq!(
            ctx.reply_to_command("start").await,
            Reply::Markdown(messages::WELCOME.to_string())
        );
        assert_eq!(
            ctx.reply_to_command("weather").await,
            Reply::Plain(messages::USAGE.to_string())
        );
        assert_eq!(
            ctx.reply_to_command("backup").await,
            Reply::Document(dir.path().join("ledger.db"))
        );
        match ctx.reply_to_command("status").await {
            Reply::Markdown(text) => assert!(text.contains("All‑Time Report")),
            other => panic!("unexpected reply {:?}", other),
        }
    }

    #[tokio::test]
    async fn today_counts_documents_ingested_today() {
        let (_dir, ctx) = context().await;
        let csv = b"ENROLMENT_NO_DATE,TOTAL_AMOUNT_CHARGED,GST_AMOUNT,OPERATOR_ID,RESIDENT_NAME\n\
                    A,75,5,OP1,Alice\n";

        let summary = ctx.ingest_document("day.csv", csv).await.unwrap();
        assert_eq!(summary.revenue, Money::from_major(75));
        assert_eq!(summary.filename.as_deref(), Some("day.csv"));

        match ctx.reply_to_command("today").await {
            Reply::Markdown(text) => {
                assert!(text.contains("Transactions: *1*"));
                assert!(text.contains("₹75:  *1*"));
            }
            other => panic!("unexpected reply {:?}", other),
        }
    }

    #[tokio::test]
    async fn bad_document_yields_csv_error_text() {
        let (_dir, ctx) = context().await;

        let err = ctx
            .ingest_document("bad.csv", b"ENROLMENT_NO_DATE\nA\n")
            .await
            .unwrap_err();
        assert_eq!(err, "❌ CSV error: missing column: TOTAL_AMOUNT_CHARGED");
    }
}
