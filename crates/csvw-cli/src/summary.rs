use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use crate::commands::ImportOutcome;

/// Prints the run summary to stderr; stdout may carry the statements.
pub fn print_summary(outcome: &ImportOutcome) {
    eprintln!("{}", summary_table(outcome));
}

pub fn summary_table(outcome: &ImportOutcome) -> Table {
    let mut table = Table::new();
    table.set_header(vec![header_cell("Import"), header_cell("Value")]);
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);

    table.add_row(vec![Cell::new("Rows"), Cell::new(outcome.summary.rows)]);
    table.add_row(vec![
        Cell::new("Statements"),
        Cell::new(outcome.summary.statements),
    ]);
    table.add_row(vec![Cell::new("Skipped records"), skipped_cell(outcome.skipped)]);
    table.add_row(vec![
        Cell::new("Duration"),
        Cell::new(format!("{:.2?}", outcome.elapsed)),
    ]);
    let output = outcome
        .output
        .as_ref()
        .map_or_else(|| "stdout".to_string(), |path| path.display().to_string());
    table.add_row(vec![Cell::new("Output"), Cell::new(output)]);

    if let Some(column) = table.column_mut(1) {
        column.set_cell_alignment(CellAlignment::Right);
    }
    table
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn skipped_cell(count: u64) -> Cell {
    if count == 0 {
        Cell::new(count).add_attribute(Attribute::Dim)
    } else {
        Cell::new(count).fg(Color::Yellow)
    }
}
