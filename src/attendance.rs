use once_cell::sync::Lazy;
use regex::Regex;

use crate::dom::{Page, Query};
use crate::models::AttendanceSummary;

const TARDY_CELL_INDEX: usize = 8;

static LEADING_FLOAT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[+-]?(\d+\.?\d*|\.\d+)([eE][+-]?\d+)?").unwrap());

/// Reads absence hours and tardies from the attendance summary page.
///
/// Layouts differ between schools, so each figure falls back to zero on its
/// own when the element is missing or does not hold a number.
pub fn extract_attendance(html: &str) -> AttendanceSummary {
    let page = Page::parse(html);
    AttendanceSummary {
        absence_hours: absence_hours(&page).unwrap_or(0.0),
        tardy_count: tardy_count(&page).unwrap_or(0.0),
    }
}

fn absence_hours(page: &Page) -> Option<f64> {
    let cell = page.find_first(
        &Query::tag("td")
            .with_class("griglia_sep_gray")
            .with_attr("colspan", "17"),
    )?;
    let text = cell.find_first(&Query::class("double"))?.text();
    let (_, after_colon) = text.split_once(':')?;
    let hours = after_colon.split('(').next().unwrap_or_default();
    parse_leading_float(hours)
}

fn tardy_count(page: &Page) -> Option<f64> {
    let row = page.find_first(
        &Query::tag("tr")
            .with_class("rigtab")
            .with_attr("height", "57"),
    )?;
    let text = row
        .child(TARDY_CELL_INDEX)?
        .find_first(&Query::class("double"))?
        .text();
    parse_leading_float(&text)
}

/// Longest numeric prefix of the trimmed text, ignoring trailing units.
fn parse_leading_float(raw: &str) -> Option<f64> {
    let found = LEADING_FLOAT.find(raw.trim())?;
    found.as_str().parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    const ATTENDANCE_PAGE: &str = include_str!("../tests/fixtures/attendance.html");

    #[test]
    fn reads_both_figures() {
        let summary = extract_attendance(ATTENDANCE_PAGE);
        assert_eq!(
            summary,
            AttendanceSummary {
                absence_hours: 23.5,
                tardy_count: 4.0,
            }
        );
    }

    #[test]
    fn missing_tardy_row_defaults_to_zero() {
        let html = r#"
            <table><tr>
              <td class="griglia_sep_gray" colspan="17"><span class="double">Totale: 12 ore (3 giorni)</span></td>
            </tr></table>
        "#;
        let summary = extract_attendance(html);
        assert_eq!(summary.absence_hours, 12.0);
        assert_eq!(summary.tardy_count, 0.0);
    }

    #[test]
    fn unparsable_figures_default_to_zero() {
        let html = r#"
            <table>
              <tr><td class="griglia_sep_gray" colspan="17"><span class="double">Nessuna assenza</span></td></tr>
              <tr class="rigtab" height="57"><td>only</td><td>two</td></tr>
            </table>
        "#;
        assert_eq!(extract_attendance(html), AttendanceSummary::default());
        assert_eq!(extract_attendance(""), AttendanceSummary::default());
    }

    #[test]
    fn leading_float_ignores_suffixes() {
        assert_eq!(parse_leading_float(" 7.5h "), Some(7.5));
        assert_eq!(parse_leading_float("3,5"), Some(3.0));
        assert_eq!(parse_leading_float("-"), None);
        assert_eq!(parse_leading_float(""), None);
    }
}
