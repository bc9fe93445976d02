//! Printable clinical risk report.
//!
//! Pure rendering of one assessment result plus the form snapshot it was
//! requested with. Text for the terminal, A4 PDF via `printpdf` for print.

use std::io::BufWriter;
use std::path::Path;

use chrono::{DateTime, Utc};
use printpdf::*;

use crate::config::APP_NAME;
use crate::models::AssessmentResult;

pub const DISCLAIMER: &str = "This report is generated by an automated Clinical Decision \
Support System (CDSS) specifically for use by qualified healthcare professionals. It does \
not replace professional clinical judgment.";

const SHAP_NOTE: &str = "Positive contributions increase risk, negative contributions decrease it.";

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("PDF error: {0}")]
    Pdf(String),
    #[error("Could not write report: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, PartialEq)]
pub struct RiskReport {
    pub generated_at: DateTime<Utc>,
    pub age: u32,
    pub gender: String,
    pub drug_id: String,
    pub current_medications: Vec<String>,
    pub result: AssessmentResult,
}

impl RiskReport {
    pub fn title(&self) -> String {
        format!("{APP_NAME} Clinical Risk Report: {}", self.drug_id)
    }

    fn medications_line(&self) -> String {
        if self.current_medications.is_empty() {
            "None".to_string()
        } else {
            self.current_medications.join(", ")
        }
    }

    fn shap_line(feature: &str, value: f64) -> String {
        let direction = if value > 0.0 {
            "increases risk"
        } else {
            "decreases risk"
        };
        format!("{feature:<24} {value:>+8.3}  {direction}")
    }

    pub fn render_text(&self) -> String {
        let r = &self.result;
        let mut out = String::new();
        let rule = "=".repeat(64);

        out.push_str(&format!("{rule}\n{}\n", self.title()));
        out.push_str(&format!(
            "Generated: {}\n{rule}\n\n",
            self.generated_at.format("%Y-%m-%d %H:%M UTC")
        ));

        out.push_str("PATIENT\n");
        out.push_str(&format!("  Age:          {} years\n", self.age));
        out.push_str(&format!("  Gender:       {}\n", self.gender));
        out.push_str(&format!("  Current Meds: {}\n\n", self.medications_line()));

        out.push_str("PRESCRIPTION\n");
        out.push_str(&format!("  Drug:         {}\n\n", self.drug_id));

        out.push_str("RISK\n");
        out.push_str(&format!(
            "  Level:        {}\n",
            r.risk_level.as_str().to_uppercase()
        ));
        out.push_str(&format!("  Score:        {}%\n", r.score_percent()));
        if let Some(rec) = &r.recommendation {
            out.push_str(&format!("  Clinical Recommendation: {rec}\n"));
        }
        out.push('\n');

        if !r.interactions.is_empty() {
            out.push_str("INTERACTIONS\n");
            for i in &r.interactions {
                out.push_str(&format!("  - {i}\n"));
            }
            out.push('\n');
        }

        if !r.shap_values.is_empty() {
            out.push_str("FEATURE CONTRIBUTIONS (SHAP)\n");
            for s in &r.shap_values {
                out.push_str(&format!("  {}\n", Self::shap_line(&s.feature, s.value)));
            }
            out.push_str(&format!("  * {SHAP_NOTE}\n\n"));
        }

        for line in wrap_text(&format!("Disclaimer: {DISCLAIMER}"), 64) {
            out.push_str(&line);
            out.push('\n');
        }
        out
    }

    /// Render the report as A4 pages. Returns PDF bytes.
    pub fn to_pdf(&self) -> Result<Vec<u8>, ReportError> {
        self.render_pdf().map(|(bytes, _)| bytes)
    }

    /// PDF bytes plus the number of pages used.
    fn render_pdf(&self) -> Result<(Vec<u8>, usize), ReportError> {
        let title = self.title();
        let (doc, page1, layer1) = PdfDocument::new(&title, PAGE_WIDTH, PAGE_HEIGHT, "Layer 1");
        let font = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| ReportError::Pdf(format!("font error: {e}")))?;
        let bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(|e| ReportError::Pdf(format!("font error: {e}")))?;
        let courier = doc
            .add_builtin_font(BuiltinFont::Courier)
            .map_err(|e| ReportError::Pdf(format!("font error: {e}")))?;

        let r = &self.result;
        let mut pdf = PdfPages {
            layer: doc.get_page(page1).get_layer(layer1),
            doc: &doc,
            y: PAGE_TOP,
            pages: 1,
        };

        pdf.line(&title, 14.0, Mm(20.0), &bold, 6.0);
        pdf.line(
            format!("Generated: {}", self.generated_at.format("%Y-%m-%d %H:%M UTC")),
            9.0,
            Mm(20.0),
            &font,
            10.0,
        );

        pdf.line("PATIENT:", 11.0, Mm(20.0), &bold, 6.0);
        pdf.line(format!("Age: {} years", self.age), 9.0, Mm(25.0), &font, 4.5);
        pdf.line(format!("Gender: {}", self.gender), 9.0, Mm(25.0), &font, 4.5);
        for line in wrap_text(&format!("Current Meds: {}", self.medications_line()), 80) {
            pdf.line(line, 9.0, Mm(25.0), &font, 4.5);
        }
        pdf.line(format!("Drug: {}", self.drug_id), 9.0, Mm(25.0), &font, 10.0);

        pdf.line("RISK:", 11.0, Mm(20.0), &bold, 6.0);
        pdf.ensure_room();
        pdf.fill(hex_color(r.risk_level.color()));
        pdf.line(
            format!(
                "{} ({}%)",
                r.risk_level.as_str().to_uppercase(),
                r.score_percent()
            ),
            12.0,
            Mm(25.0),
            &bold,
            6.0,
        );
        pdf.fill(hex_color("#000000"));
        if let Some(rec) = &r.recommendation {
            for line in wrap_text(&format!("Clinical Recommendation: {rec}"), 80) {
                pdf.line(line, 9.0, Mm(25.0), &font, 4.5);
            }
        }
        pdf.gap(4.0);

        if !r.interactions.is_empty() {
            pdf.line("INTERACTIONS:", 11.0, Mm(20.0), &bold, 6.0);
            for i in &r.interactions {
                for line in wrap_text(&format!("· {i}"), 80) {
                    pdf.line(line, 9.0, Mm(25.0), &font, 4.5);
                }
            }
            pdf.gap(4.0);
        }

        if !r.shap_values.is_empty() {
            pdf.line("FEATURE CONTRIBUTIONS (SHAP):", 11.0, Mm(20.0), &bold, 6.0);
            for s in &r.shap_values {
                pdf.line(Self::shap_line(&s.feature, s.value), 8.0, Mm(25.0), &courier, 4.0);
            }
            pdf.line(format!("* {SHAP_NOTE}"), 8.0, Mm(25.0), &font, 8.0);
        }

        for line in wrap_text(&format!("Disclaimer: {DISCLAIMER}"), 100) {
            pdf.line(line, 8.0, Mm(20.0), &font, 4.0);
        }
        let pages = pdf.pages;

        let mut buf = BufWriter::new(Vec::new());
        doc.save(&mut buf)
            .map_err(|e| ReportError::Pdf(format!("save error: {e}")))?;
        let bytes = buf
            .into_inner()
            .map_err(|e| ReportError::Pdf(format!("buffer error: {e}")))?;
        Ok((bytes, pages))
    }

    /// Write the PDF to `path`, creating parent directories.
    pub fn write_pdf(&self, path: &Path) -> Result<(), ReportError> {
        let bytes = self.to_pdf()?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, bytes)?;
        tracing::info!(path = %path.display(), "Report written");
        Ok(())
    }
}

const PAGE_WIDTH: Mm = Mm(210.0);
const PAGE_HEIGHT: Mm = Mm(297.0);
const PAGE_TOP: Mm = Mm(280.0);
/// Lowest baseline before text moves to a fresh page.
const PAGE_BOTTOM: f32 = 20.0;

/// Top-down text cursor that starts a new page at the bottom margin.
struct PdfPages<'a> {
    doc: &'a PdfDocumentReference,
    layer: PdfLayerReference,
    y: Mm,
    pages: usize,
}

impl PdfPages<'_> {
    fn ensure_room(&mut self) {
        if self.y.0 < PAGE_BOTTOM {
            self.pages += 1;
            let (page, layer) =
                self.doc
                    .add_page(PAGE_WIDTH, PAGE_HEIGHT, format!("Layer {}", self.pages));
            self.layer = self.doc.get_page(page).get_layer(layer);
            self.y = PAGE_TOP;
        }
    }

    fn line(
        &mut self,
        text: impl Into<String>,
        size: f32,
        x: Mm,
        font: &IndirectFontRef,
        advance: f32,
    ) {
        self.ensure_room();
        self.layer.use_text(text, size, x, self.y, font);
        self.y -= Mm(advance);
    }

    fn gap(&mut self, mm: f32) {
        self.y -= Mm(mm);
    }

    fn fill(&self, color: Color) {
        self.layer.set_fill_color(color);
    }
}

/// `#rrggbb` as 0..1 channels; malformed digits read as 0.
fn hex_rgb(token: &str) -> (f32, f32, f32) {
    let channel = |i: usize| {
        token
            .get(i..i + 2)
            .and_then(|h| u8::from_str_radix(h, 16).ok())
            .map_or(0.0, |v| f32::from(v) / 255.0)
    };
    (channel(1), channel(3), channel(5))
}

fn hex_color(token: &str) -> Color {
    let (r, g, b) = hex_rgb(token);
    Color::Rgb(Rgb::new(r, g, b, None))
}

/// Greedy word wrap on whitespace.
fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if current.chars().count() + word.chars().count() + 1 > max_chars && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}
