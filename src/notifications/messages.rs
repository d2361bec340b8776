//! Chat message rendering
//!
//! All bot texts use Telegram's legacy Markdown (`*bold*`, `` `code` ``).

use chrono::{DateTime, NaiveDate, TimeZone};

use crate::domain::{Aggregate, SlabCounts, UploadSummary};

const RULE: &str = "━━━━━━━━━━━━━━━━━━━━";

pub const WELCOME: &str = "👋 Welcome to *TollVault*!\n\n\
Send a CSV file or use:\n\
/status — All-time report\n\
/today — Today's report\n\
/backup — Download database";

pub const USAGE: &str = "Unknown command. Use /status /today /backup.";

pub const UNAUTHORIZED: &str = "Unauthorized.";

fn slab_lines(slabs: &SlabCounts) -> String {
    format!(
        "   ₹125: *{}*\n   ₹75:  *{}*\n   ₹0:   *{}*",
        slabs.count_125, slabs.count_75, slabs.count_0
    )
}

/// Report posted after each processed upload.
pub fn upload_report<Tz>(summary: &UploadSummary, at: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let mut text = format!(
        "📥 *CSV Upload Report*\n{RULE}\n\
         📄 File: `{}`\n\
         📅 Date: {}\n{RULE}\n\
         📊 *Summary*\n\
         \x20  Rows: *{}*\n\
         \x20  💰 Revenue: *₹{}*\n\
         \x20  🧾 GST: *₹{}*\n{RULE}\n\
         📈 *Slab Breakdown*\n{}\n{RULE}\n",
        summary.filename.as_deref().unwrap_or("upload.csv"),
        at.format("%d %b %Y, %-I:%M %p"),
        summary.rows,
        summary.revenue,
        summary.gst,
        slab_lines(&summary.slabs),
    );
    if summary.duplicates() > 0 {
        text.push_str(&format!("♻️ Already stored: *{}*\n", summary.duplicates()));
    }
    text.push_str("✅ Processed successfully");
    text
}

/// Reply to `/status`.
pub fn all_time_report(totals: &Aggregate) -> String {
    format!(
        "📊 *All‑Time Report*\n{RULE}\n\
         💰 Revenue: *₹{}*\n\
         🧾 GST: *₹{}*\n{RULE}\n\
         📈 *Slabs*\n{}",
        totals.revenue,
        totals.gst,
        slab_lines(&totals.slabs),
    )
}

/// Reply to `/today`.
pub fn day_report(date: NaiveDate, totals: &Aggregate) -> String {
    format!(
        "📅 *Today ({})*\n{RULE}\n\
         💰 Revenue: *₹{}*\n\
         🧾 GST: *₹{}*\n\
         📋 Transactions: *{}*\n{RULE}\n\
         📈 *Slabs*\n{}",
        date.format("%Y-%m-%d"),
        totals.revenue,
        totals.gst,
        totals.rows,
        slab_lines(&totals.slabs),
    )
}

pub fn csv_error(message: &str) -> String {
    format!("❌ CSV error: {}", message)
}
