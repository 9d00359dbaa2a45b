//! RFC 4180 CSV rendering for spreadsheet artifacts.

use crate::artifact::Table;

pub fn render(table: &Table) -> Vec<u8> {
    let mut out = String::new();
    push_row(&mut out, &table.headers);
    for row in &table.rows {
        push_row(&mut out, row);
    }
    out.into_bytes()
}

fn push_row(out: &mut String, cells: &[String]) {
    for (i, cell) in cells.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        if cell.contains([',', '"', '\n', '\r']) {
            out.push('"');
            out.push_str(&cell.replace('"', "\"\""));
            out.push('"');
        } else {
            out.push_str(cell);
        }
    }
    out.push_str("\r\n");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quotes_only_when_needed() {
        let mut table = Table::new(["Item", "Note"]);
        table.push(["Travel", "flights, hotels"]);
        table.push(["Misc", "say \"hi\""]);
        let text = String::from_utf8(render(&table)).unwrap();
        assert_eq!(
            text,
            "Item,Note\r\nTravel,\"flights, hotels\"\r\nMisc,\"say \"\"hi\"\"\"\r\n"
        );
    }
}
