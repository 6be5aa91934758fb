use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Color as TableColor, ContentArrangement, Table};

/// Table and cell creation helpers
pub fn create_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

pub fn create_cyan_header(labels: &[&str]) -> Vec<Cell> {
    labels
        .iter()
        .map(|label| Cell::new(*label).fg(TableColor::Cyan))
        .collect()
}

/// Colour for a node class string such as `"running warn"`.
pub fn status_color(class: &str) -> TableColor {
    match class.split_whitespace().next().unwrap_or_default() {
        "running" => TableColor::Yellow,
        "success" => TableColor::Green,
        "failure" => TableColor::Red,
        _ => TableColor::DarkGrey,
    }
}

pub fn color_coded_status_cell(class: &str) -> Cell {
    Cell::new(class).fg(status_color(class))
}
