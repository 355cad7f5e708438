//! Output rendering and formatting

use cmbuild_ops::{DownloadReport, RunReport};
use comfy_table::{presets::UTF8_FULL, Attribute, Cell, Color, ContentArrangement, Table};
use console::Style;
use std::io;

/// Output renderer for the final run report
#[derive(Clone)]
pub struct OutputRenderer {
    /// Use JSON output format
    json_output: bool,
    colors: bool,
}

impl OutputRenderer {
    /// Create new output renderer
    pub fn new(json_output: bool, colors: bool) -> Self {
        Self {
            json_output,
            colors,
        }
    }

    /// Render the outcome of a run
    pub fn render_report(&self, report: &RunReport) -> io::Result<()> {
        if self.json_output {
            let json = serde_json::to_string_pretty(report).map_err(io::Error::other)?;
            println!("{json}");
            return Ok(());
        }

        println!();
        if report.succeeded() {
            println!(
                "{}",
                self.styled(Style::new().green().bold(), "Build completed successfully")
            );
            if let Some(downloads) = &report.downloads {
                self.render_downloads(downloads);
            }
            println!("Artifacts directory: {}", report.output_dir.display());
        } else {
            println!(
                "{}",
                self.styled(
                    Style::new().red().bold(),
                    &format!("Build ended with status: {}", report.build.status_str())
                )
            );
            println!("Check the build logs at {}", report.dashboard_url);
        }

        Ok(())
    }

    /// Render a fatal error in JSON mode
    pub fn render_error_json(code: Option<&str>, message: &str) -> io::Result<()> {
        let value = serde_json::json!({
            "error": {
                "code": code,
                "message": message,
            }
        });
        let json = serde_json::to_string_pretty(&value).map_err(io::Error::other)?;
        println!("{json}");
        Ok(())
    }

    fn render_downloads(&self, downloads: &DownloadReport) {
        if downloads.is_empty() {
            println!("No artifacts were downloaded.");
            return;
        }

        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic);

        table.set_header(vec![
            Cell::new("Artifact").add_attribute(Attribute::Bold),
            Cell::new("Size").add_attribute(Attribute::Bold),
            Cell::new("Result").add_attribute(Attribute::Bold),
        ]);

        for saved in &downloads.saved {
            table.add_row(vec![
                Cell::new(&saved.name),
                Cell::new(format_size(saved.bytes)),
                self.result_cell(Cell::new(saved.path.display()), Color::Green),
            ]);
        }

        for failed in &downloads.failed {
            table.add_row(vec![
                Cell::new(&failed.name),
                Cell::new("-"),
                self.result_cell(Cell::new(&failed.reason), Color::Yellow),
            ]);
        }

        println!("{table}");
    }

    fn result_cell(&self, cell: Cell, color: Color) -> Cell {
        if self.colors {
            cell.fg(color)
        } else {
            cell
        }
    }

    fn styled(&self, style: Style, text: &str) -> String {
        if self.colors {
            style.apply_to(text).to_string()
        } else {
            text.to_string()
        }
    }
}

/// Human-readable byte count
#[allow(clippy::cast_precision_loss)]
pub(crate) fn format_size(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{size:.0} {}", UNITS[unit_index])
    } else {
        format!("{size:.1} {}", UNITS[unit_index])
    }
}
