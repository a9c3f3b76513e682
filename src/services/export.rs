// src/services/export.rs

use serde::Serialize;

use crate::{
    common::error::AppError,
    models::{
        capa::{Capa, MachineCapacity},
        deviations::Deviation,
        inventory::InventoryExportRow,
        scans::Scan,
    },
};

fn csv_error(e: impl std::fmt::Display) -> AppError {
    AppError::InternalServerError(anyhow::anyhow!("csv export failed: {}", e))
}

/// Serializes `rows` into a CSV document with a header line.
fn write_csv<T: Serialize>(rows: impl IntoIterator<Item = T>) -> Result<Vec<u8>, AppError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for row in rows {
        writer.serialize(row).map_err(csv_error)?;
    }
    writer.into_inner().map_err(csv_error)
}

pub fn scans_csv(scans: &[Scan]) -> Result<Vec<u8>, AppError> {
    write_csv(scans)
}

pub fn inventory_csv(rows: &[InventoryExportRow]) -> Result<Vec<u8>, AppError> {
    write_csv(rows)
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DeviationRow<'a> {
    internal_id: &'a str,
    status: String,
    article_number: &'a str,
    article_name: &'a str,
    workplace: Option<&'a str>,
    quantity: Option<i32>,
    area: String,
    period_from: String,
    period_to: String,
    owner: &'a str,
    reason: &'a str,
    open_actions: usize,
}

pub fn deviations_csv(deviations: &[Deviation]) -> Result<Vec<u8>, AppError> {
    write_csv(deviations.iter().map(|d| DeviationRow {
        internal_id: &d.internal_id,
        status: format!("{:?}", d.status).to_lowercase(),
        article_number: &d.article_number,
        article_name: &d.article_name,
        workplace: d.workplace.as_deref(),
        quantity: d.quantity,
        area: format!("{:?}", d.area).to_lowercase(),
        period_from: d.period_from.to_string(),
        period_to: d.period_to.to_string(),
        owner: &d.owner,
        reason: &d.reason,
        open_actions: d
            .corrective_actions
            .0
            .iter()
            .filter(|a| a.closed_at.is_none())
            .count(),
    }))
}

// One line per machine type; an article without machines still gets a line.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CapaRow<'a> {
    article_number: &'a str,
    client: &'a str,
    line: &'a str,
    client_part: Option<&'a str>,
    piff: Option<&'a str>,
    machine_type: Option<&'a str>,
    cycle_time_seconds: Option<f64>,
    cavities: Option<i32>,
    pieces_per_hour: Option<i32>,
    edited_by: &'a str,
    edited_at: String,
}

pub fn capa_csv(capas: &[Capa]) -> Result<Vec<u8>, AppError> {
    let mut rows = Vec::new();
    for c in capas {
        let base = |m: Option<&MachineCapacity>| CapaRow {
            article_number: &c.article_number,
            client: &c.client,
            line: &c.line,
            client_part: c.client_part.as_deref(),
            piff: c.piff.as_deref(),
            machine_type: None,
            cycle_time_seconds: m.map(|m| m.cycle_time_seconds),
            cavities: m.map(|m| m.cavities),
            pieces_per_hour: m.map(|m| m.pieces_per_hour()),
            edited_by: &c.edited.0.email,
            edited_at: c.edited.0.at.to_rfc3339(),
        };
        if c.machines.0.is_empty() {
            rows.push(base(None));
        }
        for machine in c.machines.0.iter() {
            rows.push(CapaRow {
                machine_type: Some(machine.machine_type.as_str()),
                ..base(Some(machine))
            });
        }
    }
    write_csv(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::capa::EditStamp;
    use chrono::Utc;
    use sqlx::types::Json;
    use uuid::Uuid;

    fn capa(machines: Vec<MachineCapacity>) -> Capa {
        Capa {
            id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            article_number: "28042".into(),
            client: "ACME".into(),
            line: "L1".into(),
            client_part: None,
            piff: None,
            machines: Json(machines),
            edited: Json(EditStamp { email: "anna@bruss.com".into(), at: Utc::now() }),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn capa_export_has_one_line_per_machine() {
        let machines = vec![
            MachineCapacity { machine_type: "press".into(), cycle_time_seconds: 30.0, cavities: 2, max_pieces_per_hour: None },
            MachineCapacity { machine_type: "weld".into(), cycle_time_seconds: 60.0, cavities: 1, max_pieces_per_hour: Some(50) },
        ];
        let out = String::from_utf8(capa_csv(&[capa(machines)]).unwrap()).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("articleNumber,client,line"));
        assert!(lines[1].contains("press") && lines[1].contains(",240,"));
        assert!(lines[2].contains("weld") && lines[2].contains(",50,"));
    }

    #[test]
    fn capa_without_machines_still_exported() {
        let out = String::from_utf8(capa_csv(&[capa(vec![])]).unwrap()).unwrap();
        assert_eq!(out.lines().count(), 2);
    }

    #[test]
    fn empty_export_is_empty() {
        assert!(scans_csv(&[]).unwrap().is_empty());
    }
}
