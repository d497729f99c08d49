//! CSV rendering of the merged week table.
//!
//! This is the only place where structured column keys become flat header
//! names. The identifier/metadata columns are fixed; the odds columns are
//! whatever the week's batch produced, in key order. Absent cells render
//! as empty fields, and fields are quoted only when they need to be.

use crate::merge::MergedRow;
use crate::reshape::OddsColumn;

/// Fixed leading columns, one value per listing row.
pub const META_COLUMNS: &[&str] = &[
    "season",
    "week",
    "week_label",
    "eid",
    "rotation",
    "team",
    "partid",
    "date",
    "time",
    "score",
    "status",
];

/// Render a header line plus one line per merged row.
pub fn render(columns: &[OddsColumn], rows: &[MergedRow]) -> String {
    let mut out = String::new();

    let mut header: Vec<String> = META_COLUMNS.iter().map(|c| c.to_string()).collect();
    header.extend(columns.iter().map(|c| c.name()));
    write_row(&mut out, &header);

    for row in rows {
        let m = &row.meta;
        let mut fields: Vec<String> = vec![
            m.season.to_string(),
            m.week.to_string(),
            m.week_label.clone(),
            m.eid.map(|e| e.to_string()).unwrap_or_default(),
            m.rotation.map(|r| r.to_string()).unwrap_or_default(),
            m.team.clone(),
            m.partid.map(|p| p.to_string()).unwrap_or_default(),
            m.date.clone(),
            m.time.clone(),
            m.score.clone(),
            m.status.clone(),
        ];
        fields.extend(
            columns
                .iter()
                .map(|c| row.cells.get(c).map(format_number).unwrap_or_default()),
        );
        write_row(&mut out, &fields);
    }

    out
}

/// American prices are integers and spreads move in halves; keep both
/// forms clean ("-110", "-3.5") rather than printing float artifacts.
fn format_number(value: &f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value}")
    }
}

fn write_row(out: &mut String, fields: &[String]) {
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        if needs_quotes(field) {
            out.push('"');
            out.push_str(&field.replace('"', "\"\""));
            out.push('"');
        } else {
            out.push_str(field);
        }
    }
    out.push('\n');
}

fn needs_quotes(field: &str) -> bool {
    field.contains(',') || field.contains('"') || field.contains('\n') || field.contains('\r')
}
