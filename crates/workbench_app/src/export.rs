use std::path::PathBuf;

use workbench_engine::{OutputDir, PersistError};
use workbench_logging::wb_info;

pub const MARKDOWN_REPORT: &str = "report.md";
pub const HTML_REPORT: &str = "report.html";

/// Writes both report flavours; returns the written paths.
pub fn write_report(
    output: &OutputDir,
    markdown: &str,
    html: &str,
) -> Result<[PathBuf; 2], PersistError> {
    let md_path = output.write_atomic(MARKDOWN_REPORT, markdown)?;
    let html_path = output.write_atomic(HTML_REPORT, html)?;
    wb_info!("Report exported to {:?}", output.path());
    Ok([md_path, html_path])
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn writes_markdown_and_html() {
        let temp = TempDir::new().unwrap();
        let output = OutputDir::new(temp.path().join("reports"));

        let [md, html] = write_report(&output, "# Credit Report", "<h1>Credit Report</h1>").unwrap();
        assert_eq!(std::fs::read_to_string(md).unwrap(), "# Credit Report");
        assert_eq!(
            std::fs::read_to_string(html).unwrap(),
            "<h1>Credit Report</h1>"
        );
    }
}
