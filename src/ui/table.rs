use crate::report::{FileMove, MigrationReport, SubstitutionRecord};
use tabled::{settings::Style, Table, Tabled};

#[derive(Tabled)]
struct SummaryRow {
    #[tabled(rename = "Metric")]
    metric: String,
    #[tabled(rename = "Value")]
    value: String,
}

/// Rounded one-table summary of a run
pub fn summary_table(report: &MigrationReport) -> String {
    let rows = vec![
        SummaryRow {
            metric: "Status".to_string(),
            value: report.status.to_string(),
        },
        SummaryRow {
            metric: "Features".to_string(),
            value: report.features.len().to_string(),
        },
        SummaryRow {
            metric: "Files planned".to_string(),
            value: report.planned_count().to_string(),
        },
        SummaryRow {
            metric: "Shared files".to_string(),
            value: report.shared.len().to_string(),
        },
        SummaryRow {
            metric: "Cycles kept".to_string(),
            value: report.cycles.len().to_string(),
        },
        SummaryRow {
            metric: "Substitutions".to_string(),
            value: report.substitutions.len().to_string(),
        },
        SummaryRow {
            metric: "Violations".to_string(),
            value: report.violations.len().to_string(),
        },
        SummaryRow {
            metric: "Warnings".to_string(),
            value: report.warnings.len().to_string(),
        },
    ];
    Table::new(rows).with(Style::rounded()).to_string()
}

#[derive(Tabled)]
struct MoveRow {
    #[tabled(rename = "From")]
    from: String,
    #[tabled(rename = "To")]
    to: String,
}

pub fn moves_table(moves: &[FileMove]) -> String {
    if moves.is_empty() {
        return String::new();
    }
    let rows: Vec<MoveRow> = moves
        .iter()
        .map(|m| MoveRow {
            from: m.from.clone(),
            to: m.to.clone(),
        })
        .collect();
    Table::new(rows).with(Style::rounded()).to_string()
}

#[derive(Tabled)]
struct SubstitutionRow {
    #[tabled(rename = "File")]
    file: String,
    #[tabled(rename = "Call")]
    call: String,
    #[tabled(rename = "Endpoint")]
    endpoint: String,
}

pub fn substitutions_table(records: &[SubstitutionRecord]) -> String {
    if records.is_empty() {
        return String::new();
    }
    let rows: Vec<SubstitutionRow> = records
        .iter()
        .map(|r| SubstitutionRow {
            file: r.file.clone(),
            call: format!("{} '{}'", r.op, r.resource),
            endpoint: r.endpoint.clone(),
        })
        .collect();
    Table::new(rows).with(Style::rounded()).to_string()
}
