//! Status command.

use std::fmt::Write as _;

use console::style;

use crate::config::Settings;
use crate::models::FileFormat;
use crate::repository::CongressSummary;
use crate::services::Reconciler;

/// Show how much of each Congress has been downloaded and parsed.
pub async fn cmd_status(settings: &Settings, json: bool, reconcile: bool) -> anyhow::Result<()> {
    if !settings.database_exists() {
        if json {
            println!("[]");
        } else {
            println!("No documents downloaded or parsed");
        }
        return Ok(());
    }

    let ctx = settings.create_db_context();
    ctx.init_schema().await?;

    if reconcile {
        let report = Reconciler::new(ctx.clone()).reconcile().await?;
        if !json && !report.cleared.is_empty() {
            println!(
                "{} Cleared {} stale paths",
                style("!").yellow(),
                report.cleared.len()
            );
        }
    }

    let summaries = ctx.congresses().summaries().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summaries)?);
    } else {
        print!("{}", render_status(&summaries));
    }

    Ok(())
}

/// Plain-text status report.
fn render_status(summaries: &[CongressSummary]) -> String {
    if summaries.is_empty() {
        return "No documents downloaded or parsed\n".to_string();
    }

    let mut out = String::new();
    section(
        &mut out,
        "Parsed:",
        "No documents parsed",
        summaries,
        |s| s.parsed,
    );
    for format in FileFormat::ALL {
        let empty = match format {
            FileFormat::Txt => "No text files downloaded",
            FileFormat::Pdf => "No PDF files downloaded",
            FileFormat::Xml => "No metadata downloaded",
        };
        section(
            &mut out,
            &format!("{}:", format.label()),
            empty,
            summaries,
            |s| s.downloaded(format),
        );
    }
    out
}

fn section(
    out: &mut String,
    heading: &str,
    empty: &str,
    summaries: &[CongressSummary],
    count: impl Fn(&CongressSummary) -> u64,
) {
    let _ = writeln!(out, "{}", heading);
    let mut printed = false;
    for summary in summaries {
        let n = count(summary);
        if n > 0 {
            let _ = writeln!(
                out,
                "{}: {}/{} documents",
                summary.congress, n, summary.total
            );
            printed = true;
        }
    }
    if !printed {
        let _ = writeln!(out, "{}", empty);
    }
    let _ = writeln!(out);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Congress;

    fn summary(number: u32, total: u64, parsed: u64, txts: u64) -> CongressSummary {
        CongressSummary {
            congress: Congress::new(number).unwrap(),
            total,
            parsed,
            txts,
            pdfs: 0,
            xmls: 0,
        }
    }

    #[test]
    fn test_render_empty_catalog() {
        assert_eq!(render_status(&[]), "No documents downloaded or parsed\n");
    }

    #[test]
    fn test_render_sections() {
        let out = render_status(&[summary(105, 10, 0, 4), summary(106, 3, 0, 0)]);
        let expected = "Parsed:\nNo documents parsed\n\n\
                        Text files:\n105th Congress: 4/10 documents\n\n\
                        PDF files:\nNo PDF files downloaded\n\n\
                        Metadata:\nNo metadata downloaded\n\n";
        assert_eq!(out, expected);
    }

    #[test]
    fn test_render_parsed_counts() {
        let out = render_status(&[summary(111, 20, 2, 20)]);
        assert!(out.contains("Parsed:\n111th Congress: 2/20 documents\n"));
        assert!(out.contains("Text files:\n111th Congress: 20/20 documents\n"));
    }
}
