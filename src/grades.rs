use tracing::{debug, warn};

use crate::dom::{Node, Page, Query};
use crate::error::{PortalError, Result};
use crate::models::{GradeRecord, Period};
use crate::periods::periods_from_page;
use crate::symbols;

const SUBJECT_GROUP_ROW: &str = "riga_competenza_default";
const SUBJECT_DETAIL_ROW: &str = "riga_materia_componente";
const GRADE_CELL: &str = "cella_voto";
const SUB_COMPONENT_VALUE: &str = "f_reg_voto_dettaglio";
const PLACEHOLDER: &str = "-";

/// Parses every grade on the grades page.
///
/// When `periods` is `None` they are read from the same page. A period with no
/// matching table contributes nothing; a grade cell without its date and
/// value children fails the whole page.
pub fn extract_grades(html: &str, periods: Option<&[Period]>) -> Result<Vec<GradeRecord>> {
    let page = Page::parse(html);
    let derived;
    let periods = match periods {
        Some(periods) => periods,
        None => {
            derived = periods_from_page(&page);
            &derived[..]
        }
    };

    let mut grades = Vec::new();
    for period in periods {
        let before = grades.len();
        extract_period(&page, period, &mut grades)?;
        debug!(
            period = %period.label,
            code = %period.code,
            grades = grades.len() - before,
            "extracted period"
        );
    }
    Ok(grades)
}

fn extract_period(page: &Page, period: &Period, out: &mut Vec<GradeRecord>) -> Result<()> {
    // A period without a code never owns a table, even one with `sessione=""`.
    if period.code.is_empty() {
        return Ok(());
    }
    let Some(table) = page.find_first(&Query::tag("table").with_attr("sessione", &period.code))
    else {
        return Ok(());
    };
    let Some(body) = table.find_first(&Query::tag("tbody")) else {
        return Ok(());
    };
    let rows = body.children();

    let subject_ids: Vec<i64> = rows
        .iter()
        .filter(|row| is_row(row, SUBJECT_GROUP_ROW))
        .map(|row| parse_id(row.attr("materia_id")))
        .collect();

    // Detail rows pair with grouping rows by position, not by id.
    let detail_rows = rows.iter().filter(|row| is_row(row, SUBJECT_DETAIL_ROW));
    for (index, row) in detail_rows.enumerate() {
        let subject_id = subject_ids.get(index).copied().unwrap_or(0);
        let subject_name = row
            .child(0)
            .map(|cell| cell.text().trim().to_uppercase())
            .unwrap_or_default();

        for cell in row.children().iter().filter(|c| c.has_class(GRADE_CELL)) {
            out.push(grade_from_cell(cell, subject_id, &subject_name, period)?);
        }
    }
    Ok(())
}

fn is_row(row: &Node<'_>, marker: &str) -> bool {
    row.children().len() > 1 && row.has_class(marker)
}

fn grade_from_cell(
    cell: &Node<'_>,
    subject_id: i64,
    subject_name: &str,
    period: &Period,
) -> Result<GradeRecord> {
    let (Some(date), Some(value)) = (cell.child(0), cell.child(1)) else {
        return Err(PortalError::UpstreamFormat(format!(
            "grade cell for {subject_name} in period {} is missing its date or value",
            period.code
        )));
    };

    let display_value = match value.text().trim() {
        "" => PLACEHOLDER.to_string(),
        text => text.to_string(),
    };

    let resolution = symbols::resolve(&display_value);
    if !resolution.recognized && display_value != PLACEHOLDER {
        warn!(token = %display_value, subject = %subject_name, "unknown grade symbol");
    }

    Ok(GradeRecord {
        subject_id,
        subject_name: subject_name.to_string(),
        event_id: parse_id(cell.attr("evento_id")),
        event_date: date.text().trim().to_string(),
        numeric_value: resolution.value,
        counts_toward_average: resolution.counts_toward_average
            && !value.has_class(SUB_COMPONENT_VALUE),
        display_value,
        period_label: period.label.clone(),
        period_code: period.code.clone(),
        component_description: value.attr("title").unwrap_or_default().to_string(),
    })
}

fn parse_id(raw: Option<&str>) -> i64 {
    raw.and_then(|s| s.trim().parse().ok()).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::periods::extract_periods;
    use pretty_assertions::assert_eq;

    const GRADES_PAGE: &str = include_str!("../tests/fixtures/grades.html");

    fn subject_ids(grades: &[GradeRecord]) -> Vec<(String, i64)> {
        let mut pairs: Vec<(String, i64)> = grades
            .iter()
            .map(|g| (g.subject_name.clone(), g.subject_id))
            .collect();
        pairs.dedup();
        pairs
    }

    #[test]
    fn extracts_both_periods_in_order() {
        let grades = extract_grades(GRADES_PAGE, None).unwrap();
        assert_eq!(grades.len(), 7);
        assert!(grades[..4].iter().all(|g| g.period_label == "1° PERIODO"));
        assert!(grades[4..].iter().all(|g| g.period_label == "2° PERIODO"));
    }

    #[test]
    fn pairs_subject_ids_by_row_position() {
        let grades = extract_grades(GRADES_PAGE, None).unwrap();
        assert_eq!(
            subject_ids(&grades),
            vec![
                ("ITALIANO".to_string(), 512),
                ("MATEMATICA".to_string(), 37),
                ("RELIGIONE".to_string(), 205),
                ("ITALIANO".to_string(), 512),
                ("MATEMATICA".to_string(), 37),
                ("RELIGIONE".to_string(), 205),
            ]
        );
    }

    #[test]
    fn builds_full_records_from_cells() {
        let grades = extract_grades(GRADES_PAGE, None).unwrap();

        assert_eq!(
            grades[0],
            GradeRecord {
                subject_id: 512,
                subject_name: "ITALIANO".into(),
                event_id: 9001,
                event_date: "12/10".into(),
                numeric_value: 7.5,
                display_value: "7½".into(),
                counts_toward_average: true,
                period_label: "1° PERIODO".into(),
                period_code: "q1".into(),
                component_description: "Scritto".into(),
            }
        );

        // sub-component value
        assert_eq!(grades[1].numeric_value, 8.0);
        assert!(!grades[1].counts_toward_average);
        assert_eq!(grades[1].component_description, "Orale");

        // religion judgement
        assert_eq!(grades[3].display_value, "ds");
        assert_eq!(grades[3].numeric_value, 9.0);
        assert!(!grades[3].counts_toward_average);
    }

    #[test]
    fn empty_and_unknown_values_degrade_to_zero() {
        let grades = extract_grades(GRADES_PAGE, None).unwrap();
        let blank = grades.iter().find(|g| g.event_id == 9006).unwrap();
        assert_eq!(blank.display_value, "-");
        assert_eq!(blank.numeric_value, 0.0);
        assert!(!blank.counts_toward_average);

        let odd = grades.iter().find(|g| g.event_id == 0).unwrap();
        assert_eq!(odd.display_value, "nc");
        assert_eq!(odd.numeric_value, 0.0);
        assert!(!odd.counts_toward_average);
    }

    #[test]
    fn supplied_periods_drive_the_lookup() {
        let periods = extract_periods(GRADES_PAGE);
        let only_second = &periods[1..];
        let grades = extract_grades(GRADES_PAGE, Some(only_second)).unwrap();
        assert_eq!(grades.len(), 3);

        let unknown = [Period {
            code: "q9".into(),
            position: 1,
            label: "EXTRA".into(),
        }];
        assert!(extract_grades(GRADES_PAGE, Some(&unknown[..])).unwrap().is_empty());
    }

    #[test]
    fn pairing_shifts_when_a_group_row_is_malformed() {
        let html = r##"
            <ul><li><a href="#q1">1° PERIODO</a></li></ul>
            <table sessione="q1"><tbody>
              <tr class="riga_competenza_default" materia_id="10"><td>A</td></tr>
              <tr class="riga_materia_componente"><td>Storia</td>
                <td class="cella_voto" evento_id="1"><div>01/10</div><div>6</div></td></tr>
              <tr class="riga_competenza_default" materia_id="20"><td>B</td><td></td></tr>
              <tr class="riga_materia_componente"><td>Arte</td>
                <td class="cella_voto" evento_id="2"><div>02/10</div><div>7</div></td></tr>
            </tbody></table>
        "##;

        let grades = extract_grades(html, None).unwrap();
        assert_eq!(grades[0].subject_id, 20);
        assert_eq!(grades[1].subject_id, 0);
    }

    #[test]
    fn broken_grade_cell_fails_the_page() {
        let html = r##"
            <ul><li><a href="#q1">1° PERIODO</a></li></ul>
            <table sessione="q1"><tbody>
              <tr class="riga_competenza_default" materia_id="10"><td>A</td><td></td></tr>
              <tr class="riga_materia_componente"><td>Storia</td>
                <td class="cella_voto" evento_id="1"><div>01/10</div><div>6</div></td>
                <td class="cella_voto" evento_id="2">7</td></tr>
            </tbody></table>
        "##;

        let err = extract_grades(html, None).unwrap_err();
        assert!(matches!(err, PortalError::UpstreamFormat(_)));
    }

    #[test]
    fn period_without_code_matches_no_table() {
        let html = r##"
            <ul><li>SCRUTINIO</li></ul>
            <table sessione=""><tbody>
              <tr class="riga_competenza_default" materia_id="10"><td>A</td><td></td></tr>
              <tr class="riga_materia_componente"><td>Storia</td>
                <td class="cella_voto" evento_id="1"><div>01/10</div><div>6</div></td></tr>
            </tbody></table>
        "##;

        let periods = extract_periods(html);
        assert_eq!(periods.len(), 1);
        assert_eq!(periods[0].code, "");
        assert!(extract_grades(html, None).unwrap().is_empty());
    }

    #[test]
    fn page_without_periods_has_no_grades() {
        let grades = extract_grades("<html><body>session expired</body></html>", None).unwrap();
        assert!(grades.is_empty());
    }
}
