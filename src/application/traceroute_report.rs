// Traceroute report - text rendering and SNR colouring
use crate::domain::route_discovery::{FullRoute, HopId};
use crate::domain::traceroute::{snr_db, SnrQuality, SnrSpan};

pub const FORWARD_HEADER: &str = "Route traced toward destination:";
pub const BACKWARD_HEADER: &str = "Route traced back to us:";
pub const NODE_MARKER: &str = "■";
pub const SNR_MARKER: &str = "⇊";

const UNKNOWN_SNR_TEXT: &str = "?";

/// Render a path as alternating node and SNR lines:
///
/// ```text
/// ■ Alice (ALC)
/// ⇊ -10.0 dB
/// ■ Bob (BOB)
/// ```
///
/// `snr` must hold exactly one sample per edge; otherwise every edge shows `?`.
pub fn format_path(names: &[String], snr: &[i8]) -> String {
    let aligned = snr.len() + 1 == names.len();

    let mut lines = Vec::with_capacity(names.len() * 2);
    for (i, name) in names.iter().enumerate() {
        if i > 0 {
            let value = if aligned { snr_db(snr[i - 1]) } else { None };
            lines.push(format!("{} {} dB", SNR_MARKER, format_snr(value)));
        }
        lines.push(format!("{} {}", NODE_MARKER, name));
    }
    lines.join("\n")
}

/// Always keeps a fractional digit (`-10.0`, `-2.25`) so the text re-parses as a float.
fn format_snr(value: Option<f32>) -> String {
    match value {
        Some(db) => format!("{:?}", db),
        None => UNKNOWN_SNR_TEXT.to_string(),
    }
}

/// Build the human-readable report for a reconstructed route.
///
/// Empty directions are left out entirely.
pub fn format_report<F>(route: &FullRoute, display_name: F) -> String
where
    F: Fn(HopId) -> String,
{
    let mut report = String::new();

    if !route.forward.is_empty() {
        let names: Vec<String> = route.forward.iter().map(|&n| display_name(n)).collect();
        report.push_str(FORWARD_HEADER);
        report.push_str("\n\n");
        report.push_str(&format_path(&names, &route.forward_snr));
    }

    if !route.back.is_empty() {
        let names: Vec<String> = route.back.iter().map(|&n| display_name(n)).collect();
        report.push_str("\n\n");
        report.push_str(BACKWARD_HEADER);
        report.push_str("\n\n");
        report.push_str(&format_path(&names, &route.back_snr));
    }

    report
}

/// Find every `⇊ <snr> dB` token in a report and classify it.
///
/// Works on the text alone, so stored reports can be recoloured later.
pub fn colorize(report: &str) -> Vec<SnrSpan> {
    let prefix = format!("{} ", SNR_MARKER);
    let mut spans = Vec::new();
    let mut cursor = 0;

    while let Some(found) = report[cursor..].find(&prefix) {
        let start = cursor + found;
        let value_start = start + prefix.len();

        let value_len = report[value_start..]
            .find(|c: char| !(c.is_ascii_digit() || c == '.' || c == '?' || c == '-'))
            .unwrap_or(report.len() - value_start);
        let value_end = value_start + value_len;

        if value_len > 0 && report[value_end..].starts_with(" dB") {
            let end = value_end + " dB".len();
            let snr_db = report[value_start..value_end].parse::<f32>().ok();
            let quality = SnrQuality::classify(snr_db);
            spans.push(SnrSpan {
                start,
                end,
                snr_db,
                quality,
                color: quality.color(),
            });
            cursor = end;
        } else {
            cursor = value_start;
        }
    }

    spans
}
