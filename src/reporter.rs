use crate::error::ReportError;
use crate::models::{DebtItem, ItemType, OutputFormat, Priority};
use chrono::Local;
use comfy_table::{presets::UTF8_FULL, Cell, Color, ContentArrangement, Table};
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::Path;

const REPORT_TITLE: &str = "Tech Debt Report";

/// Counters shown in the report header
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReportSummary {
    /// TECH_DEBT items only
    pub total: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    pub none: usize,
    pub comments: usize,
    pub suppressed: usize,
}

impl ReportSummary {
    pub fn from_items(items: &[DebtItem]) -> Self {
        let mut summary = Self::default();
        for item in items {
            match item.item_type {
                ItemType::TechDebt => {
                    summary.total += 1;
                    match item.priority {
                        Priority::High => summary.high += 1,
                        Priority::Medium => summary.medium += 1,
                        Priority::Low => summary.low += 1,
                        Priority::None => summary.none += 1,
                        Priority::Unspecified => {}
                    }
                }
                ItemType::Comment => summary.comments += 1,
                ItemType::Suppress => summary.suppressed += 1,
            }
        }
        summary
    }
}

/// Render the report in the requested format
pub fn render(
    items: &[DebtItem],
    format: OutputFormat,
    base_ticket_url: Option<&str>,
) -> Result<String, serde_json::Error> {
    match format {
        OutputFormat::Html => Ok(render_html(items, base_ticket_url)),
        OutputFormat::Json => render_json(items),
    }
}

/// Self-contained HTML document with summary tiles and one card per item
pub fn render_html(items: &[DebtItem], base_ticket_url: Option<&str>) -> String {
    let summary = ReportSummary::from_items(items);
    let mut output = String::new();

    output.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    output.push_str("<meta charset=\"UTF-8\" />\n");
    output.push_str(&format!("<title>{}</title>\n", REPORT_TITLE));
    output.push_str(&format!("<style>\n{}</style>\n", REPORT_STYLE));
    output.push_str(&format!("<script>\n{}</script>\n", REPORT_SCRIPT));
    output.push_str("</head>\n<body>\n");
    output.push_str(&format!("<h1>{}</h1>\n", REPORT_TITLE));

    push_summary(&mut output, &summary);
    output.push_str(concat!(
        "<div class=\"action-container\">",
        "<button class=\"action-button\" type=\"button\" onclick=\"expandAll()\">Expand All</button>",
        "<button class=\"action-button\" type=\"button\" onclick=\"collapseAll()\">Collapse All</button>",
        "</div>\n"
    ));

    let sections = [
        ("Annotated Tech Debt", ItemType::TechDebt),
        ("Comments", ItemType::Comment),
        ("Suppressed Rules", ItemType::Suppress),
    ];
    for (title, item_type) in sections {
        let section: Vec<&DebtItem> = items.iter().filter(|i| i.item_type == item_type).collect();
        if section.is_empty() {
            continue;
        }

        output.push_str(&format!("<h2>{}</h2>\n", title));
        for item in section {
            push_card(&mut output, item, base_ticket_url);
        }
    }

    output.push_str("</body>\n</html>\n");
    output
}

/// Aggregated items as pretty JSON
pub fn render_json(items: &[DebtItem]) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(items)
}

fn push_summary(output: &mut String, summary: &ReportSummary) {
    let tiles = [
        ("total", summary.total, "Total Items"),
        ("high", summary.high, "High Priority"),
        ("medium", summary.medium, "Medium Priority"),
        ("low", summary.low, "Low Priority"),
        ("none", summary.none, "No Priority"),
        ("comments", summary.comments, "Comments"),
        ("suppressed", summary.suppressed, "Suppressed"),
    ];

    output.push_str("<div class=\"summary-container\">\n");
    for (class, count, label) in tiles {
        output.push_str(&format!(
            "<div class=\"summary-box {}\"><h2>{}</h2><span>{}</span></div>\n",
            class, count, label
        ));
    }
    output.push_str("</div>\n");
}

fn push_card(output: &mut String, item: &DebtItem, base_ticket_url: Option<&str>) {
    output.push_str("<div class=\"card\"><details><summary>");
    output.push_str("<div class=\"card-header\"><div class=\"card-header-main\">");
    output.push_str(&format!(
        "<div class=\"header-column column-small\"><span class=\"module-badge\">{}</span></div>",
        escape_html(&item.module_name)
    ));
    if item.item_type != ItemType::Comment {
        output.push_str(&format!(
            "<div class=\"header-column column-medium\"><span class=\"symbol-name\">{}</span></div>",
            escape_html(&item.name)
        ));
    }
    output.push_str(&format!(
        "<div class=\"header-column\"><span>{}</span></div>",
        escape_html(&description_label(item))
    ));
    output.push_str("</div></div><span class=\"expand-icon\"></span></summary>\n");

    output.push_str("<div class=\"card-content\">");
    if !item.ticket.is_empty() {
        push_info(output, "Ticket", &ticket_html(&item.ticket, base_ticket_url));
    }
    if item.item_type == ItemType::TechDebt {
        push_info(output, "Priority", &escape_html(item.priority.label()));
    }
    let occurrence = if item.item_type == ItemType::Comment {
        "Location"
    } else {
        "Source Set"
    };
    push_info(output, occurrence, &escape_html(&item.source_set));
    if item.item_type == ItemType::Suppress {
        push_info(output, "Symbol", &escape_html(&item.name));
    }
    if let Some(last_modified) = item.last_modified {
        let local = last_modified.with_timezone(&Local);
        push_info(
            output,
            "Last Modified",
            &local.format("%Y-%m-%d %H:%M:%S").to_string(),
        );
    }
    if let Some(ref author) = item.author {
        push_info(output, "Author", &escape_html(author));
    }
    output.push_str("</div></details></div>\n");
}

/// `value_html` must already be escaped
fn push_info(output: &mut String, label: &str, value_html: &str) {
    output.push_str(&format!(
        "<div class=\"info-group\"><span class=\"info-label\">{}</span><div class=\"info-value\">{}</div></div>",
        label, value_html
    ));
}

fn description_label(item: &DebtItem) -> String {
    match item.item_type {
        ItemType::Comment => format!("Comment: {}", item.description),
        ItemType::Suppress => format!("Rule: {}", item.description),
        ItemType::TechDebt => item.description.clone(),
    }
}

fn ticket_html(ticket: &str, base_ticket_url: Option<&str>) -> String {
    match base_ticket_url.filter(|url| !url.is_empty()) {
        Some(base) => {
            let url = if base.ends_with('/') {
                format!("{}{}", base, ticket)
            } else {
                format!("{}/{}", base, ticket)
            };
            format!(
                "<a href=\"{}\" target=\"_blank\" rel=\"noopener noreferrer\">{}</a>",
                escape_html(&url),
                escape_html(ticket)
            )
        }
        None => format!("<span class=\"ticket\">{}</span>", escape_html(ticket)),
    }
}

fn escape_html(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Write the report to `path`, creating parent directories.
/// Contents land in a sibling temp file first and are renamed into place.
pub fn write_report(path: &Path, contents: &str) -> Result<(), ReportError> {
    let write_error = |source| ReportError::Write {
        path: path.to_path_buf(),
        source,
    };

    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent).map_err(write_error)?;

    let mut file = tempfile::NamedTempFile::new_in(parent).map_err(write_error)?;
    file.write_all(contents.as_bytes()).map_err(write_error)?;
    file.flush().map_err(write_error)?;
    file.persist(path).map_err(|e| write_error(e.error))?;

    Ok(())
}

/// Per-module counts as a terminal table
pub fn format_terminal_summary(items: &[DebtItem]) -> String {
    let mut by_module: BTreeMap<&str, ReportSummary> = BTreeMap::new();
    for item in items {
        let summary = ReportSummary::from_items(std::slice::from_ref(item));
        let entry = by_module.entry(item.module_name.as_str()).or_default();
        entry.total += summary.total;
        entry.high += summary.high;
        entry.comments += summary.comments;
        entry.suppressed += summary.suppressed;
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Module").fg(Color::Cyan),
            Cell::new("Tech Debt").fg(Color::Cyan),
            Cell::new("High").fg(Color::Cyan),
            Cell::new("Comments").fg(Color::Cyan),
            Cell::new("Suppressed").fg(Color::Cyan),
        ]);

    for (module, summary) in by_module {
        table.add_row(vec![
            Cell::new(module),
            Cell::new(summary.total),
            Cell::new(summary.high),
            Cell::new(summary.comments),
            Cell::new(summary.suppressed),
        ]);
    }

    format!("{}\n", table)
}

const REPORT_SCRIPT: &str = r#"function expandAll() {
    document.querySelectorAll('details').forEach(d => d.open = true);
}
function collapseAll() {
    document.querySelectorAll('details').forEach(d => d.open = false);
}
"#;

const REPORT_STYLE: &str = r#"body { font-family: sans-serif; background-color: #f3f3f3; margin: 0; padding: 20px; }
h1 { color: #333; }
.summary-container { display: flex; gap: 20px; margin-bottom: 30px; flex-wrap: wrap; }
.summary-box { flex: 1; min-width: 120px; padding: 20px; border-radius: 8px; color: white; text-align: center; box-shadow: 0 2px 5px rgba(0,0,0,0.1); }
.summary-box h2 { margin: 0; font-size: 32px; }
.summary-box span { font-size: 14px; text-transform: uppercase; letter-spacing: 1px; }
.total { background-color: #4A90E2; }
.high { background-color: #E35D5D; }
.medium { background-color: #F5A623; }
.low { background-color: #4CAF50; }
.none { background-color: #9E9E9E; }
.comments { background-color: #7E57C2; }
.suppressed { background-color: #607D8B; }
.action-container { margin-bottom: 20px; display: flex; justify-content: flex-end; }
.action-button { padding: 8px 16px; margin-left: 10px; border: none; border-radius: 4px; background-color: #4CAF50; color: white; cursor: pointer; font-size: 14px; }
.action-button:hover { background-color: #45a049; }
.card { background-color: #fff; box-shadow: 0 2px 5px rgba(0,0,0,0.1); border-radius: 8px; margin-bottom: 12px; overflow: hidden; border-left: 5px solid #4CAF50; }
details summary { padding: 15px; cursor: pointer; list-style: none; display: flex; justify-content: space-between; align-items: center; }
details summary::-webkit-details-marker { display: none; }
.card-header { display: flex; flex-direction: column; gap: 4px; flex: 1; }
.card-header-main { display: flex; align-items: center; gap: 10px; flex: 1; }
.header-column { flex: 1; overflow: hidden; text-overflow: ellipsis; white-space: nowrap; }
.column-small { flex: 0 0 150px; }
.column-medium { flex: 0 0 455px; }
.module-badge { background-color: #eee; padding: 2px 8px; border-radius: 12px; font-size: 12px; font-weight: bold; color: #666; }
.symbol-name { font-weight: bold; color: #333; }
.expand-icon { width: 10px; height: 10px; margin-left: 10px; border-right: 2px solid #999; border-bottom: 2px solid #999; transform: rotate(45deg); transition: transform 0.2s; }
details[open] .expand-icon { transform: rotate(225deg); }
.card-content { padding: 0 15px 15px 15px; border-top: 1px solid #eee; display: grid; grid-template-columns: repeat(auto-fill, minmax(200px, 1fr)); gap: 15px; background-color: #fafafa; }
.info-group { display: flex; flex-direction: column; gap: 4px; margin-top: 10px; }
.info-label { font-size: 11px; text-transform: uppercase; color: #999; font-weight: bold; }
.info-value { font-size: 14px; color: #333; }
.ticket { font-family: monospace; background-color: #eee; padding: 2px 4px; border-radius: 4px; }
@media (max-width: 600px) {
    body { padding: 10px; }
    .summary-box { padding: 10px; }
    .summary-box h2 { font-size: 24px; }
    .card-header-main { flex-direction: column; align-items: flex-start; gap: 4px; }
    .header-column, .column-small, .column-medium { flex: none; width: 100%; }
}
"#;
