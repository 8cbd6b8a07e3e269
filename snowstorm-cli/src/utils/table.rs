//! Table formatting utilities

use prettytable::{Cell, Row, Table};

/// Creates a borderless table with bold headers.
pub fn create_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table.set_format(*prettytable::format::consts::FORMAT_NO_LINESEP_WITH_TITLE);
    table.set_titles(Row::new(
        headers
            .iter()
            .map(|header| Cell::new(header).style_spec("b"))
            .collect(),
    ));
    table
}

pub fn add_table_row(table: &mut Table, cells: Vec<String>) {
    table.add_row(Row::new(cells.iter().map(|s| Cell::new(s)).collect()));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_rows() {
        let mut table = create_table(&["Effect", "Particles"]);
        add_table_row(&mut table, vec!["demo:snow".into(), "12".into()]);
        assert_eq!(table.len(), 1);

        let rendered = table.to_string();
        assert!(rendered.contains("Effect"));
        assert!(rendered.contains("demo:snow"));
    }
}
