//! HTML rendering of the day-over-day history view.

use wkstats_types::{DeltaRow, DeltaView, SrsStage};

/// Render the full history page.
///
/// Always produces a valid document: an empty view renders the
/// "no data yet" state rather than failing.
pub fn history_page(view: &DeltaView) -> String {
    let mut out = String::with_capacity(4096);

    out.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    out.push_str("<meta charset=\"utf-8\">\n");
    out.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    out.push_str("<title>WaniKani Stats</title>\n");
    out.push_str("<style>\n");
    out.push_str(
        "body { font-family: sans-serif; margin: 2rem auto; max-width: 56rem; color: #222; }\n\
         table { border-collapse: collapse; width: 100%; }\n\
         th, td { padding: 0.4rem 0.8rem; text-align: right; border-bottom: 1px solid #ddd; }\n\
         th:first-child, td:first-child { text-align: left; }\n\
         .delta-up { color: #2a7f2a; }\n\
         .delta-down { color: #b33; }\n\
         .empty { color: #777; font-style: italic; }\n",
    );
    out.push_str("</style>\n</head>\n<body>\n");
    out.push_str("<h1>WaniKani SRS Stats</h1>\n");
    out.push_str(
        "<form method=\"post\" action=\"/api/update\"><button type=\"submit\">Update now</button></form>\n",
    );

    if view.is_empty() {
        out.push_str("<p class=\"empty\">No data yet. Trigger an update to record today's totals.</p>\n");
    } else {
        render_table(&mut out, view);
    }

    out.push_str("</body>\n</html>\n");
    out
}

fn render_table(out: &mut String, view: &DeltaView) {
    out.push_str("<table>\n<thead>\n<tr><th>Date</th>");
    for stage in SrsStage::ALL {
        out.push_str(&format!("<th>{}</th>", stage.label()));
    }
    out.push_str("<th>Level</th></tr>\n</thead>\n<tbody>\n");

    // Most recent day first; deltas were computed in ascending order.
    for row in view.rows.iter().rev() {
        render_row(out, row);
    }

    out.push_str("</tbody>\n</table>\n");
}

fn render_row(out: &mut String, row: &DeltaRow) {
    out.push_str(&format!("<tr><td>{}</td>", row.date));
    for stage in SrsStage::ALL {
        let delta = row.delta.map(|d| d.get(stage));
        out.push_str(&format!(
            "<td>{}{}</td>",
            row.stages.get(stage),
            delta_badge(delta)
        ));
    }
    let level_delta = row.delta.map(|d| d.level);
    out.push_str(&format!(
        "<td>{}{}</td></tr>\n",
        row.level,
        delta_badge(level_delta)
    ));
}

/// A signed change marker, e.g. ` <span class="delta-up">(+2)</span>`.
/// Zero and missing deltas render nothing.
fn delta_badge(delta: Option<i64>) -> String {
    match delta {
        Some(d) if d > 0 => format!(" <span class=\"delta-up\">(+{})</span>", d),
        Some(d) if d < 0 => format!(" <span class=\"delta-down\">({})</span>", d),
        _ => String::new(),
    }
}
