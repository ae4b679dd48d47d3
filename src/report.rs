use std::fmt::Write;
use std::path::Path;

use crate::aggregate::compute_average;
use crate::models::{AttendanceSummary, GradeRecord, Period, SubjectSummary};
use crate::symbols;

pub fn summarize_by_subject(grades: &[GradeRecord]) -> Vec<SubjectSummary> {
    let mut map: std::collections::BTreeMap<&str, Vec<GradeRecord>> =
        std::collections::BTreeMap::new();

    for grade in grades {
        map.entry(grade.subject_name.as_str())
            .or_default()
            .push(grade.clone());
    }

    map.into_iter()
        .map(|(subject_name, grades)| SubjectSummary {
            subject_name: subject_name.to_string(),
            count: grades.len(),
            average: compute_average(&grades),
        })
        .collect()
}

fn format_average(average: Option<f64>) -> String {
    match average {
        Some(value) => match symbols::nearest_token(value) {
            Some(token) => format!("{value:.2} (~{token})"),
            None => format!("{value:.2}"),
        },
        None => "n/a".to_string(),
    }
}

pub fn build_report(
    student: Option<&str>,
    periods: &[Period],
    grades: &[GradeRecord],
    attendance: Option<AttendanceSummary>,
) -> String {
    let mut output = String::new();
    let student_label = student.unwrap_or("student");

    let _ = writeln!(output, "# Grade Report");
    let _ = writeln!(
        output,
        "Generated for {} ({} grades across {} periods)",
        student_label,
        grades.len(),
        periods.len()
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "Overall average: {}", format_average(compute_average(grades)));

    for period in periods {
        let period_grades: Vec<GradeRecord> = grades
            .iter()
            .filter(|grade| grade.period_code == period.code)
            .cloned()
            .collect();

        let _ = writeln!(output);
        let _ = writeln!(output, "## {}", period.label);

        let summaries = summarize_by_subject(&period_grades);
        if summaries.is_empty() {
            let _ = writeln!(output, "No grades recorded for this period.");
            continue;
        }
        for summary in summaries.iter() {
            let _ = writeln!(
                output,
                "- {}: {} ({} grades)",
                summary.subject_name,
                format_average(summary.average),
                summary.count
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Attendance");
    match attendance {
        Some(summary) => {
            let _ = writeln!(output, "- Absence hours: {}", summary.absence_hours);
            let _ = writeln!(output, "- Tardies: {}", summary.tardy_count);
        }
        None => {
            let _ = writeln!(output, "No attendance data.");
        }
    }

    let mut recent: Vec<&GradeRecord> = grades.iter().filter(|g| g.event_id != 0).collect();
    recent.sort_by(|a, b| b.event_id.cmp(&a.event_id));
    let _ = writeln!(output);
    let _ = writeln!(output, "## Recent Grades");

    if recent.is_empty() {
        let _ = writeln!(output, "No grades recorded.");
    } else {
        for grade in recent.iter().take(5) {
            let marker = if grade.counts_toward_average { "" } else { " (not averaged)" };
            let _ = writeln!(
                output,
                "- {} on {}: {}{}",
                grade.subject_name, grade.event_date, grade.display_value, marker
            );
        }
    }

    output
}

pub fn write_grades_csv(path: &Path, grades: &[GradeRecord]) -> anyhow::Result<usize> {
    let mut writer = csv::Writer::from_path(path)?;
    for grade in grades {
        writer.serialize(grade)?;
    }
    writer.flush()?;
    Ok(grades.len())
}
