//! Server-rendered HTML pages

use std::fmt::Write as _;

use chrono::NaiveDate;

use crate::config::AppConfig;
use crate::domain::{Aggregate, Period, PeriodRow};

const STYLE: &str = "body{font-family:system-ui,sans-serif;margin:2rem auto;max-width:960px;color:#222}\
nav a{margin-right:1rem}\
.cards{display:flex;gap:1rem;flex-wrap:wrap}\
.card{border:1px solid #ddd;border-radius:8px;padding:1rem 1.5rem;min-width:140px}\
.card b{display:block;font-size:1.6rem}\
table{border-collapse:collapse;width:100%}\
th,td{border-bottom:1px solid #eee;padding:.4rem .6rem;text-align:right}\
th:first-child,td:first-child{text-align:left}\
form{margin:1rem 0}";

/// Escape text for HTML element and attribute content.
pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

fn layout(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\"><head><meta charset=\"utf-8\">\
         <title>{title} · TollVault</title><style>{STYLE}</style></head>\
         <body><nav><a href=\"/\">Dashboard</a><a href=\"/history\">History</a>\
         <a href=\"/settings\">Settings</a><a href=\"/docs\">API</a></nav>\
         <h1>{title}</h1>{body}</body></html>",
        title = escape(title),
    )
}

fn card(label: &str, value: impl std::fmt::Display) -> String {
    format!("<div class=\"card\">{}<b>{}</b></div>", label, value)
}

pub fn dashboard_page(totals: &Aggregate) -> String {
    let cards = [
        card("Revenue", format!("₹{}", totals.revenue)),
        card("GST", format!("₹{}", totals.gst)),
        card("₹125 slab", totals.slabs.count_125),
        card("₹75 slab", totals.slabs.count_75),
        card("₹0 slab", totals.slabs.count_0),
        card("Transactions", totals.rows),
    ]
    .concat();

    let body = format!(
        "<div class=\"cards\">{cards}</div>\
         <h2>Upload CSV</h2>\
         <form method=\"post\" action=\"/upload\" enctype=\"multipart/form-data\">\
         <input type=\"file\" name=\"csvfile\" accept=\".csv,text/csv\" required> \
         <button type=\"submit\">Upload</button></form>\
         <form method=\"post\" action=\"/reset\" \
         onsubmit=\"return confirm('Delete every row of the most recent upload date?')\">\
         <button type=\"submit\">Clear last upload</button></form>"
    );
    layout("Dashboard", &body)
}

/// Filter state echoed back into the history form.
pub struct HistoryFilter<'a> {
    pub period: Period,
    pub from: &'a str,
    pub to: &'a str,
    pub min_date: Option<NaiveDate>,
    pub max_date: Option<NaiveDate>,
}

pub fn history_page(filter: &HistoryFilter<'_>, rows: &[PeriodRow]) -> String {
    let bound = |d: Option<NaiveDate>| d.map(|d| d.format("%Y-%m-%d").to_string()).unwrap_or_default();
    let (min, max) = (bound(filter.min_date), bound(filter.max_date));

    let mut options = String::new();
    for period in [Period::Day, Period::Week, Period::Month, Period::Year] {
        let selected = if period == filter.period { " selected" } else { "" };
        let _ = write!(options, "<option value=\"{0}\"{1}>{0}</option>", period, selected);
    }

    let mut table = String::from(
        "<table><thead><tr><th>Period</th><th>Revenue</th><th>GST</th>\
         <th>₹125</th><th>₹75</th><th>₹0</th><th>Total</th></tr></thead><tbody>",
    );
    for row in rows {
        let _ = write!(
            table,
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
            escape(&row.period),
            row.revenue,
            row.gst,
            row.count_125,
            row.count_75,
            row.count_0,
            row.total
        );
    }
    if rows.is_empty() {
        table.push_str("<tr><td colspan=\"7\">No transactions in this range.</td></tr>");
    }
    table.push_str("</tbody></table>");

    let body = format!(
        "<form method=\"get\" action=\"/history\">\
         <select name=\"period\">{options}</select> \
         From <input type=\"date\" name=\"from\" value=\"{from}\" min=\"{min}\" max=\"{max}\"> \
         To <input type=\"date\" name=\"to\" value=\"{to}\" min=\"{min}\" max=\"{max}\"> \
         <button type=\"submit\">Apply</button></form>{table}",
        from = escape(filter.from),
        to = escape(filter.to),
    );
    layout("History", &body)
}

pub fn settings_page(config: &AppConfig) -> String {
    let body = format!(
        "<form id=\"settings\">\
         <p><label>Telegram bot token<br><input name=\"telegram_token\" size=\"60\" value=\"{token}\"></label></p>\
         <p><label>Admin chat ID (0 = any chat)<br><input name=\"admin_chat_id\" type=\"number\" value=\"{chat}\"></label></p>\
         <p><label>Port<br><input name=\"port\" type=\"number\" min=\"1\" max=\"65535\" value=\"{port}\"></label></p>\
         <p><label>Database file<br><input name=\"db_path\" size=\"60\" value=\"{db}\"></label></p>\
         <p><label>Uploads directory<br><input name=\"uploads_dir\" size=\"60\" value=\"{uploads}\"></label></p>\
         <button type=\"submit\">Save</button> <span id=\"status\"></span></form>\
         <script>\
         document.getElementById('settings').addEventListener('submit', async (ev) => {{\
           ev.preventDefault();\
           const f = new FormData(ev.target);\
           const body = Object.fromEntries(f.entries());\
           body.admin_chat_id = Number(body.admin_chat_id);\
           body.port = Number(body.port);\
           const res = await fetch('/api/settings', {{method: 'POST', headers: {{'content-type': 'application/json'}}, body: JSON.stringify(body)}});\
           const json = await res.json();\
           document.getElementById('status').textContent = json.success\
             ? (json.data.restart_required ? 'Saved. Restart to apply port/database changes.' : 'Saved.')\
             : json.error;\
         }});\
         </script>",
        token = escape(&config.telegram.token),
        chat = config.telegram.admin_chat_id,
        port = config.server.port,
        db = escape(&config.database.path),
        uploads = escape(&config.storage.uploads_dir.to_string_lossy()),
    );
    layout("Settings", &body)
}
