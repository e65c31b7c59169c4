use std::io::Write;
use std::path::Path;

use owo_colors::OwoColorize;
use scribe_core::{ExtractError, Outcome};
use scribe_ingest::StrategyStatus;

/// Whether to use colored output.
#[derive(Debug, Clone, Copy)]
pub struct ColorMode(pub bool);

impl ColorMode {
    pub fn enabled(&self) -> bool {
        self.0
    }
}

/// Print the strategy table for `scribe strategies`.
pub fn print_strategies(
    w: &mut dyn Write,
    statuses: &[StrategyStatus],
    color: ColorMode,
) -> std::io::Result<()> {
    writeln!(w, "PDF strategies (in the order they are tried):")?;
    writeln!(w)?;
    for status in statuses {
        let id = format!("{:<12}", status.kind.id());
        match (status.available, color.enabled()) {
            (true, true) => writeln!(w, "  {} {} {}", "✓".green(), id.bold(), status.detail)?,
            (true, false) => writeln!(w, "  [ok] {} {}", id, status.detail)?,
            (false, true) => writeln!(
                w,
                "  {} {} {}",
                "✗".red(),
                id.dimmed(),
                status.detail.dimmed()
            )?,
            (false, false) => writeln!(w, "  [--] {} {}", id, status.detail)?,
        }
    }
    Ok(())
}

pub fn print_saved(
    w: &mut dyn Write,
    path: &Path,
    chars: usize,
    color: ColorMode,
) -> std::io::Result<()> {
    if color.enabled() {
        writeln!(w, "{} {} characters to {}", "Wrote".green(), chars, path.display())
    } else {
        writeln!(w, "Wrote {} characters to {}", chars, path.display())
    }
}

/// Print an extraction error. With `verbose`, every strategy attempt of a
/// failed PDF extraction is listed as well.
pub fn print_failure(
    w: &mut dyn Write,
    err: &ExtractError,
    verbose: bool,
    color: ColorMode,
) -> std::io::Result<()> {
    if color.enabled() {
        writeln!(w, "{} {}", "error:".red().bold(), err)?;
    } else {
        writeln!(w, "error: {}", err)?;
    }

    let ExtractError::ExtractionFailed(report) = err else {
        return Ok(());
    };
    if !verbose {
        return Ok(());
    }

    writeln!(w)?;
    writeln!(w, "Attempts:")?;
    if report.attempts.is_empty() {
        writeln!(w, "  (none)")?;
    }
    for attempt in &report.attempts {
        let detail = match &attempt.outcome {
            Outcome::Empty => "no text".to_string(),
            Outcome::Failed(msg) => msg.clone(),
        };
        if color.enabled() {
            writeln!(w, "  {} {}", attempt.kind.yellow(), detail)?;
        } else {
            writeln!(w, "  {} {}", attempt.kind, detail)?;
        }
    }
    if !report.unavailable.is_empty() {
        writeln!(w, "Unavailable:")?;
        for missing in &report.unavailable {
            writeln!(w, "  {} {}", missing.name, missing.reason)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use scribe_core::{Attempt, FailureReport, StrategyKind, Unavailable};

    fn render(f: impl FnOnce(&mut Vec<u8>) -> std::io::Result<()>) -> String {
        let mut buf = Vec::new();
        f(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    fn report() -> ExtractError {
        ExtractError::ExtractionFailed(FailureReport {
            attempts: vec![
                Attempt {
                    kind: StrategyKind::TextLayer,
                    outcome: Outcome::Empty,
                },
                Attempt {
                    kind: StrategyKind::RasterOcr,
                    outcome: Outcome::Failed("tesseract exited 1".into()),
                },
            ],
            unavailable: vec![Unavailable::strategy(
                StrategyKind::HostedOcr,
                "no Mistral API key configured",
                "set MISTRAL_API_KEY",
            )],
        })
    }

    #[test]
    fn attempts_only_with_verbose() {
        let quiet = render(|w| print_failure(w, &report(), false, ColorMode(false)));
        assert!(quiet.starts_with("error: Unable to extract text from PDF."));
        assert!(!quiet.contains("Attempts:"));

        let loud = render(|w| print_failure(w, &report(), true, ColorMode(false)));
        assert!(loud.contains("  text-layer no text"));
        assert!(loud.contains("  raster-ocr tesseract exited 1"));
        assert!(loud.contains("  hosted-ocr no Mistral API key configured"));
    }

    #[test]
    fn strategy_table_plain() {
        let statuses = vec![
            StrategyStatus {
                kind: StrategyKind::TextLayer,
                available: true,
                detail: "embedded text layer only".into(),
            },
            StrategyStatus {
                kind: StrategyKind::HostedOcr,
                available: false,
                detail: "no key; set MISTRAL_API_KEY".into(),
            },
        ];
        let out = render(|w| print_strategies(w, &statuses, ColorMode(false)));
        assert!(out.contains("[ok] text-layer   embedded text layer only"));
        assert!(out.contains("[--] hosted-ocr   no key; set MISTRAL_API_KEY"));
    }
}
