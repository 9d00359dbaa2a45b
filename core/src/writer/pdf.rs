//! Minimal PDF 1.4 writer: monospaced text pages, no compression.
//!
//! Enough structure for viewers and file-type sniffers to accept the
//! document; layout fidelity is not attempted.

use crate::artifact::Report;
use std::fmt::Write as _;

const LINES_PER_PAGE: usize = 58;
const FONT_SIZE: u32 = 9;
const LEADING: u32 = 12;
const TOP: u32 = 760;
const LEFT: u32 = 50;

/// Render a report to PDF bytes. The title is repeated at the top of
/// every page.
pub fn render(report: &Report) -> Vec<u8> {
    let pages: Vec<&[String]> = if report.lines.is_empty() {
        vec![&report.lines[..]]
    } else {
        report.lines.chunks(LINES_PER_PAGE).collect()
    };

    // Object numbering: 1 catalog, 2 pages, 3 font, 4 info,
    // then (page, content) pairs.
    let mut objects: Vec<String> = Vec::new();
    let page_ids: Vec<usize> = (0..pages.len()).map(|i| 5 + i * 2).collect();
    let kids = page_ids
        .iter()
        .map(|id| format!("{id} 0 R"))
        .collect::<Vec<_>>()
        .join(" ");

    objects.push("<< /Type /Catalog /Pages 2 0 R >>".to_string());
    objects.push(format!("<< /Type /Pages /Kids [{kids}] /Count {} >>", pages.len()));
    objects.push("<< /Type /Font /Subtype /Type1 /BaseFont /Courier >>".to_string());
    objects.push(format!("<< /Title ({}) /Producer (Document Service) >>", escape(&report.title)));

    for (n, lines) in pages.iter().enumerate() {
        let content_id = page_ids[n] + 1;
        objects.push(format!(
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] \
             /Resources << /Font << /F1 3 0 R >> >> /Contents {content_id} 0 R >>"
        ));

        let mut stream = String::new();
        let _ = write!(stream, "BT /F1 {} Tf {LEFT} {TOP} Td {LEADING} TL ", FONT_SIZE + 3);
        let _ = write!(stream, "({}) Tj T* /F1 {FONT_SIZE} Tf T* ", escape(&report.title));
        for line in lines.iter() {
            let _ = write!(stream, "({}) Tj T* ", escape(line));
        }
        if pages.len() > 1 {
            let _ = write!(stream, "T* (Page {} of {}) Tj ", n + 1, pages.len());
        }
        stream.push_str("ET");
        objects.push(format!("<< /Length {} >>\nstream\n{stream}\nendstream", stream.len()));
    }

    let mut out = String::from("%PDF-1.4\n");
    let mut offsets = Vec::with_capacity(objects.len());
    for (i, body) in objects.iter().enumerate() {
        offsets.push(out.len());
        let _ = write!(out, "{} 0 obj\n{body}\nendobj\n", i + 1);
    }
    let xref_at = out.len();
    let _ = write!(out, "xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1);
    for off in &offsets {
        let _ = write!(out, "{off:010} 00000 n \n");
    }
    let _ = write!(
        out,
        "trailer\n<< /Size {} /Root 1 0 R /Info 4 0 R >>\nstartxref\n{xref_at}\n%%EOF\n",
        objects.len() + 1
    );
    out.into_bytes()
}

/// Escape a string for a PDF literal. Non-ASCII characters are
/// replaced, since the standard Courier font has no encoding for them.
fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '(' | ')' | '\\' => {
                out.push('\\');
                out.push(c);
            }
            '\t' => out.push_str("    "),
            c if c.is_ascii() && !c.is_ascii_control() => out.push(c),
            _ => out.push('?'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_is_a_pdf_with_matching_xref() {
        let mut report = Report::new("Form W-2 (2024)");
        report.line("Wages (box 1): $98,765.43");
        let bytes = render(&report);
        let text = String::from_utf8(bytes).unwrap();

        assert!(text.starts_with("%PDF-1.4"));
        assert!(text.trim_end().ends_with("%%EOF"));
        assert!(text.contains("(Wages \\(box 1\\): $98,765.43) Tj"));

        let startxref: usize = text
            .rsplit("startxref\n")
            .next()
            .and_then(|t| t.lines().next())
            .unwrap()
            .parse()
            .unwrap();
        assert!(text[startxref..].starts_with("xref"));
    }

    #[test]
    fn long_reports_span_pages() {
        let mut report = Report::new("Long");
        for i in 0..(LINES_PER_PAGE * 2 + 1) {
            report.line(format!("line {i}"));
        }
        let text = String::from_utf8(render(&report)).unwrap();
        assert!(text.contains("/Count 3"));
        assert!(text.contains("(Page 3 of 3)"));
    }

    #[test]
    fn escape_handles_delimiters_and_unicode() {
        assert_eq!(escape("a(b)\\c"), "a\\(b\\)\\\\c");
        assert_eq!(escape("café"), "caf?");
    }
}
