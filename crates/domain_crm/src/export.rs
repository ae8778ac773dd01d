//! Export of records to text documents

use csv::{QuoteStyle, WriterBuilder};
use serde::Serialize;

use core_kernel::PortError;

use crate::error::CrmError;

/// One column of an export: header, cell renderer, and quoting
pub struct ExportColumn<R> {
    pub header: &'static str,
    pub render: fn(&R) -> String,
    /// Text cells are always quoted; bare cells only when they must be
    pub quoted: bool,
}

impl<R> ExportColumn<R> {
    /// A text column, quoted in every row
    pub const fn new(header: &'static str, render: fn(&R) -> String) -> Self {
        Self {
            header,
            render,
            quoted: true,
        }
    }

    /// A numeric column, written as-is
    pub const fn bare(header: &'static str, render: fn(&R) -> String) -> Self {
        Self {
            header,
            render,
            quoted: false,
        }
    }

    fn quote_style(&self) -> QuoteStyle {
        if self.quoted {
            QuoteStyle::Always
        } else {
            QuoteStyle::Necessary
        }
    }
}

/// A rendered export ready to be offered for download
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextExport {
    pub filename: String,
    pub content: String,
    /// Number of records exported
    pub count: usize,
}

impl TextExport {
    /// Renders `records` as CSV: a bare header line, then one row per record
    /// with text cells quoted and numeric cells bare
    pub fn csv<R>(
        filename: impl Into<String>,
        columns: &[ExportColumn<R>],
        records: &[R],
    ) -> Result<Self, CrmError> {
        let header = columns
            .iter()
            .map(|c| encode_cell(c.header, QuoteStyle::Necessary))
            .collect::<Result<Vec<_>, _>>()?;
        let mut content = header.join(",");
        content.push('\n');

        for record in records {
            let cells = columns
                .iter()
                .map(|c| encode_cell(&(c.render)(record), c.quote_style()))
                .collect::<Result<Vec<_>, _>>()?;
            content.push_str(&cells.join(","));
            content.push('\n');
        }

        Ok(Self {
            filename: filename.into(),
            content,
            count: records.len(),
        })
    }
}

/// Escapes one cell with the csv writer's quoting rules
fn encode_cell(value: &str, style: QuoteStyle) -> Result<String, CrmError> {
    let mut writer = WriterBuilder::new().quote_style(style).from_writer(Vec::new());
    writer.write_field(value).map_err(export_error)?;
    let bytes = writer.into_inner().map_err(|e| export_error(e.error()))?;
    String::from_utf8(bytes).map_err(export_error)
}

fn export_error(e: impl std::fmt::Display) -> CrmError {
    CrmError::Transport(PortError::internal(format!("export failed: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Row {
        name: &'static str,
        score: u32,
    }

    const COLUMNS: &[ExportColumn<Row>] = &[
        ExportColumn::new("Name", |r| r.name.to_string()),
        ExportColumn::bare("Score", |r| r.score.to_string()),
    ];

    #[test]
    fn test_csv_quotes_text_cells_only() {
        let rows = [Row { name: "Ada", score: 3 }, Row { name: "Grace \"Amazing\"", score: 5 }];
        let export = TextExport::csv("scores.csv", COLUMNS, &rows).unwrap();

        let lines: Vec<&str> = export.content.lines().collect();
        assert_eq!(lines[0], "Name,Score");
        assert_eq!(lines[1], "\"Ada\",3");
        assert_eq!(lines[2], "\"Grace \"\"Amazing\"\"\",5");
        assert_eq!(export.count, 2);
    }

    #[test]
    fn test_empty_export_has_header_only() {
        let export = TextExport::csv("scores.csv", COLUMNS, &[]).unwrap();
        assert_eq!(export.content.trim_end(), "Name,Score");
        assert_eq!(export.count, 0);
    }
}
