//! Report rendering: HTML summary injected into a template, JSON dump.
//!
//! The HTML fragment has two parts:
//! - A two-column summary, one column per book: source, total feeds,
//!   bid/ask/total price levels and the top best spreads with their
//!   inside market (asks above, bids below)
//! - "Price-Quantity offers": per-depth differences, bids then asks.
//!   Price differences show the price in bold, quantity differences the
//!   quantity.
//!
//! The fragment replaces whatever sits between the begin and end marker
//! lines of the template; the marker lines themselves are kept.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{ReconError, Result};
use crate::feed::FeedStats;
use crate::reconcile::{DiffEntry, LevelCoverage, LevelDiff, Reconciliation};
use crate::statistics::{BookSummary, SpreadSummary};
use crate::types::Side;
use crate::warnings::WarningSummary;

/// Serializable result of a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconReport {
    pub summaries: Vec<BookSummary>,
    pub feed_stats: Vec<FeedStats>,
    pub warnings: WarningSummary,
    pub reconciliation: Reconciliation,
}

/// Write `report` as pretty JSON.
pub fn write_json(path: impl AsRef<Path>, report: &ReconReport) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path).map_err(|e| ReconError::io(path, e))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, report)?;
    writer.flush().map_err(|e| ReconError::io(path, e))?;
    Ok(())
}

/// Tab-indented line buffer.
#[derive(Default)]
struct Html {
    buf: String,
}

impl Html {
    fn line(&mut self, indent: usize, text: impl AsRef<str>) {
        for _ in 0..indent {
            self.buf.push('\t');
        }
        self.buf.push_str(text.as_ref());
        self.buf.push('\n');
    }

    fn row(&mut self, label: &str, value: impl std::fmt::Display) {
        self.line(4, "<div class='row'>");
        self.line(5, format!("<div class='col-3'>{label}</div>"));
        self.line(5, format!("<div class='col-2'>{value}</div>"));
        self.line(4, "</div>");
    }
}

/// Minimal HTML escaping for text content.
fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\'' => out.push_str("&#39;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

/// HTML renderer of summaries and level differences.
#[derive(Debug, Clone)]
pub struct HtmlReport {
    title: String,
}

impl HtmlReport {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
        }
    }

    /// Render the summary fragment.
    pub fn render(&self, summaries: &[BookSummary], reconciliation: &Reconciliation) -> String {
        let mut html = Html::default();

        html.line(1, "<div class='container-fluid'>");
        html.line(1, format!("<h3 class='linebot'>{}</h3>", escape(&self.title)));
        html.line(2, "<div class='row'>");
        for summary in summaries {
            self.book_column(&mut html, summary);
        }
        html.line(2, "</div>");
        html.line(1, "</div>");

        html.line(1, "<h3 class='gapsep'>Price-Quantity offers:</h3>");
        for side in [Side::Bid, Side::Ask] {
            html.line(
                4,
                format!("<h5 class='gapsep'>{} price offers:</h5>", side.label()),
            );
            for diff in reconciliation.side(side) {
                self.level_diff(&mut html, side, diff);
            }
        }

        html.buf
    }

    fn book_column(&self, html: &mut Html, summary: &BookSummary) {
        html.line(3, "<div class='col-sm-5'>");
        html.row("Source feeds:", escape(&summary.source));
        html.row("Total feeds:", summary.record_count);
        html.row("Bid price levels:", summary.bid_levels);
        html.row("Ask price levels:", summary.ask_levels);
        html.row("Total price levels:", summary.total_levels());

        html.line(4, "<h3 class ='linesep'>Top best spreads:</h3>");
        for spread in &summary.best_spreads {
            self.best_spread(html, spread);
        }
        html.line(3, "</div>");
    }

    fn best_spread(&self, html: &mut Html, spread: &SpreadSummary) {
        html.line(4, format!("<h5>Best {}:</h5>", spread.rank));
        html.line(4, "<div class='row bg-light'>");
        html.line(5, "<div class='col-3'>Spread:</div>");
        html.line(5, format!("<div class='col-2'>{}</div>", spread.spread));
        html.line(4, "</div>");
        html.line(4, "<div class='row bg-light'>");
        html.line(5, "<div class='col-3'>Mid point:</div>");
        html.line(5, format!("<div class='col-2'>{}</div>", spread.mid_point));
        html.line(4, "</div>");

        html.line(4, "<div class='row bg-light gapsep'>");
        html.line(5, "<div class='col'>Inside market:</div>");
        html.line(4, "</div>");
        ladder_row(
            html,
            [
                ("", ""),
                ("linebot", ""),
                ("linebot", "Price"),
                ("linebot", "Ask Size"),
                ("", ""),
            ],
        );

        // Asks from the outermost level down to the inside market
        for ask in spread.asks.iter().rev() {
            html.line(4, "<div class='row bg-light'>");
            html.line(5, "<div class='col'></div>");
            html.line(5, "<div class='col'></div>");
            html.line(5, format!("<div class='col'>{}</div>", ask.price));
            html.line(5, format!("<div class='col'>{}</div>", ask.quantity));
            html.line(5, "<div class='col'></div>");
            html.line(4, "</div>");
        }
        ladder_row(
            html,
            [
                ("", ""),
                ("linebot", ""),
                ("linebot", ""),
                ("linebot", ""),
                ("", ""),
            ],
        );
        for bid in &spread.bids {
            html.line(4, "<div class='row bg-light'>");
            html.line(5, "<div class='col'></div>");
            html.line(5, format!("<div class='col'>{}</div>", bid.quantity));
            html.line(5, format!("<div class='col'>{}</div>", bid.price));
            html.line(5, "<div class='col'></div>");
            html.line(5, "<div class='col'></div>");
            html.line(4, "</div>");
        }
        ladder_row(
            html,
            [
                ("", ""),
                ("linetop", "Bid Size"),
                ("linetop", "Price"),
                ("linetop", ""),
                ("", ""),
            ],
        );
    }

    fn level_diff(&self, html: &mut Html, side: Side, diff: &LevelDiff) {
        let level = diff.depth + 1;
        match diff.coverage {
            LevelCoverage::Both => {
                html.line(1, "<div class='container-fluid'>");
                html.line(2, format!("<h5 class='linebot'>Level {level}</h5>"));
                html.line(2, "<div class='row'>");
                diff_column(html, side, &diff.only_in_a, true);
                diff_column(html, side, &diff.only_in_b, true);
                html.line(2, "</div>");
                html.line(1, "</div>");
            }
            LevelCoverage::OnlyA | LevelCoverage::OnlyB => {
                html.line(2, format!("<h5 class='linebot'>Level {level}</h5>"));
                let entries = if diff.coverage == LevelCoverage::OnlyA {
                    &diff.only_in_a
                } else {
                    &diff.only_in_b
                };
                diff_column(html, side, entries, false);
            }
        }
    }
}

/// Header or separator row of the inside-market ladder: (extra class, text) per cell.
fn ladder_row(html: &mut Html, cells: [(&str, &str); 5]) {
    html.line(4, "<div class='row bg-light'>");
    for (class, text) in cells {
        if class.is_empty() {
            html.line(5, format!("<div class='col'>{text}</div>"));
        } else {
            html.line(5, format!("<div class='col {class}'>{text}</div>"));
        }
    }
    html.line(4, "</div>");
}

fn diff_column(html: &mut Html, side: Side, entries: &[DiffEntry], fluid: bool) {
    if fluid {
        html.line(3, "<div class='col-sm-5'>");
    }
    html.row(&format!("{} differences:", side.label()), entries.len());
    for entry in entries {
        let pair = entry.pair();
        let cell = match entry {
            DiffEntry::PriceOnly(_) => format!(
                "{{<span class='boldfield'>{}</span>,{}}}",
                pair.price, pair.quantity
            ),
            DiffEntry::QuantityAtSharedPrice(_) | DiffEntry::UnmatchedLevel(_) => format!(
                "{{{},<span class='boldfield'>{}</span>}}",
                pair.price, pair.quantity
            ),
        };
        html.line(3, "<div class='row'>");
        html.line(4, "<div class='col-3'></div>");
        html.line(4, format!("<div class='col-2'>{cell}</div>"));
        html.line(3, "</div>");
    }
    if fluid {
        html.line(3, "</div>");
    }
}

/// Page written when the report template does not exist yet.
fn default_template(begin: &str, end: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset='utf-8'>\n<title>Order Books</title>\n</head>\n<body>\n<!-- {begin} -->\n<!-- {end} -->\n</body>\n</html>\n"
    )
}

/// Replace the lines between the begin and end markers with `fragment`.
///
/// Markers are regular expressions searched in each line. Lines after a
/// begin marker are dropped up to (not including) the next end marker.
/// Returns `None` if no line matches `begin`.
pub fn inject_between_markers(
    template: &str,
    fragment: &str,
    begin: &Regex,
    end: &Regex,
) -> Option<String> {
    let mut out = String::with_capacity(template.len() + fragment.len());
    let mut skipping = false;
    let mut injected = false;

    for line in template.lines() {
        if end.is_match(line) {
            skipping = false;
        }
        if skipping {
            continue;
        }
        out.push_str(line);
        out.push('\n');
        if begin.is_match(line) {
            out.push_str(fragment);
            skipping = true;
            injected = true;
        }
    }

    injected.then_some(out)
}

/// Inject `fragment` into the template at `path`, rewriting it in place.
///
/// A missing template is created from a minimal page holding both markers.
pub fn inject_into_file(
    path: impl AsRef<Path>,
    fragment: &str,
    marker_begin: &str,
    marker_end: &str,
) -> Result<()> {
    let path = path.as_ref();
    let begin = Regex::new(marker_begin)?;
    let end = Regex::new(marker_end)?;

    let template = if path.exists() {
        fs::read_to_string(path).map_err(|e| ReconError::io(path, e))?
    } else {
        log::info!("Creating report template {}", path.display());
        default_template(marker_begin, marker_end)
    };

    let page = inject_between_markers(&template, fragment, &begin, &end).ok_or_else(|| {
        ReconError::MarkerNotFound {
            path: path.to_path_buf(),
            marker: marker_begin.to_string(),
        }
    })?;
    fs::write(path, page).map_err(|e| ReconError::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::book::OrderBook;
    use crate::types::PriceQty;

    fn markers() -> (Regex, Regex) {
        (
            Regex::new("begin summary").unwrap(),
            Regex::new("end summary").unwrap(),
        )
    }

    #[test]
    fn test_inject_replaces_previous_content() {
        let (begin, end) = markers();
        let template = "<body>\n<!-- begin summary -->\nold\nstale\n<!-- end summary -->\n</body>\n";
        let page = inject_between_markers(template, "new\n", &begin, &end).unwrap();
        assert_eq!(
            page,
            "<body>\n<!-- begin summary -->\nnew\n<!-- end summary -->\n</body>\n"
        );
    }

    #[test]
    fn test_inject_is_idempotent() {
        let (begin, end) = markers();
        let template = "<!-- begin summary -->\n<!-- end summary -->\n";
        let once = inject_between_markers(template, "x\n", &begin, &end).unwrap();
        let twice = inject_between_markers(&once, "x\n", &begin, &end).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_inject_without_marker() {
        let (begin, end) = markers();
        assert!(inject_between_markers("<body></body>", "x", &begin, &end).is_none());
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape("a<b>&'\""), "a&lt;b&gt;&amp;&#39;&quot;");
    }

    fn sample() -> (Vec<BookSummary>, Reconciliation) {
        let mut a = OrderBook::new("a.csv");
        a.ingest(
            vec![PriceQty::new(10, 100), PriceQty::new(9, 50)],
            vec![PriceQty::new(11, 80)],
        );
        let mut b = OrderBook::new("b.log");
        b.ingest(vec![PriceQty::new(10, 7)], vec![PriceQty::new(12, 80)]);

        let summaries = vec![BookSummary::from_book(&a, 5), BookSummary::from_book(&b, 5)];
        (summaries, Reconciliation::between(&a, &b))
    }

    #[test]
    fn test_render_contains_summary_and_differences() {
        let (summaries, recon) = sample();
        let html = HtmlReport::new("Order Books Summary").render(&summaries, &recon);

        assert!(html.contains("<h3 class='linebot'>Order Books Summary</h3>"));
        assert!(html.contains("<div class='col-2'>a.csv</div>"));
        assert!(html.contains("<h5>Best 1:</h5>"));
        assert!(html.contains("<div class='col-2'>10.5</div>"));
        assert!(html.contains("Bid price offers:"));
        assert!(html.contains("Ask price offers:"));
        // Quantity difference at shared bid price 10
        assert!(html.contains("{10,<span class='boldfield'>100</span>}"));
        // Price-only ask difference
        assert!(html.contains("{<span class='boldfield'>12</span>,80}"));
        // Level 2 exists only in book A
        assert!(html.contains("<h5 class='linebot'>Level 2</h5>"));
    }

    #[test]
    fn test_inject_into_missing_file_creates_template() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("orderbook.htm");

        inject_into_file(&path, "\t<p>content</p>\n", "begin summary", "end summary").unwrap();
        let page = fs::read_to_string(&path).unwrap();
        assert!(page.contains("<!-- begin summary -->\n\t<p>content</p>\n<!-- end summary -->"));
    }

    #[test]
    fn test_inject_into_file_without_marker_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page.htm");
        fs::write(&path, "<html></html>\n").unwrap();

        let err = inject_into_file(&path, "x", "begin summary", "end summary").unwrap_err();
        assert!(matches!(err, ReconError::MarkerNotFound { .. }));
    }

    #[test]
    fn test_write_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("recon.json");
        let (summaries, reconciliation) = sample();
        let report = ReconReport {
            summaries,
            feed_stats: Vec::new(),
            warnings: WarningSummary::default(),
            reconciliation,
        };
        write_json(&path, &report).unwrap();

        let back: ReconReport =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(back.reconciliation, report.reconciliation);
        assert_eq!(back.summaries[0].record_count, 1);
    }
}
