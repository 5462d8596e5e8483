//! CSV export of flagged match results for the project team.
//!
//! Only results carrying `exportar_para_projetista` are written.
//! Header names stay in Portuguese to match the spreadsheet the
//! project team already consumes.

use std::io::Write;

use crate::ReconcileError;
use rodovia_match_reconcile_models::{InventoryRecord, MatchResult, NecessityRecord};

/// Column order of the project-team export.
pub const EXPORT_HEADERS: [&str; 15] = [
    "id_necessidade",
    "id_inventario",
    "tipo_elemento",
    "km_inicial",
    "km_final",
    "latitude_inicial",
    "longitude_inicial",
    "lado",
    "codigo_snv",
    "codigo_snv_inventario",
    "servico",
    "distancia_m",
    "comentario_revisor",
    "revisado_em",
    "revisor",
];

/// Writes the flagged results as CSV. Returns how many rows were
/// written (excluding the header).
///
/// # Errors
///
/// Returns [`ReconcileError::UnknownNecessity`] when a flagged result
/// references a necessity not present in `necessities`, or
/// [`ReconcileError::Csv`] on serialization failure.
pub fn write_export<W: Write>(
    results: &[MatchResult],
    necessities: &[NecessityRecord],
    inventories: &[InventoryRecord],
    writer: W,
) -> Result<usize, ReconcileError> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(EXPORT_HEADERS)?;

    let mut written = 0;
    for result in results {
        if !result.exportar_para_projetista {
            continue;
        }

        let necessity = necessities
            .iter()
            .find(|n| n.id == result.necessity_id)
            .ok_or_else(|| ReconcileError::UnknownNecessity {
                necessity_id: result.necessity_id.clone(),
                result_id: result.id.clone(),
            })?;
        let inventory = result
            .inventory_id
            .as_deref()
            .and_then(|id| inventories.iter().find(|i| i.id == id));

        let record: [String; 15] = [
            necessity.id.clone(),
            result.inventory_id.clone().unwrap_or_default(),
            necessity.element_type.clone(),
            necessity.km_initial.to_string(),
            necessity
                .km_final
                .map(|km| km.to_string())
                .unwrap_or_default(),
            necessity
                .initial_position
                .map(|p| p.latitude.to_string())
                .unwrap_or_default(),
            necessity
                .initial_position
                .map(|p| p.longitude.to_string())
                .unwrap_or_default(),
            necessity.side_of_road.clone().unwrap_or_default(),
            necessity.route_code.clone().unwrap_or_default(),
            inventory
                .and_then(|i| i.route_code.clone())
                .unwrap_or_default(),
            necessity.service_action.to_string(),
            result
                .distance_meters
                .map(|d| format!("{d:.1}"))
                .unwrap_or_default(),
            result.reviewer_comment.clone().unwrap_or_default(),
            result
                .reviewed_at
                .map(|at| at.to_rfc3339())
                .unwrap_or_default(),
            result.reviewer_id.clone().unwrap_or_default(),
        ];
        csv_writer.write_record(&record)?;
        written += 1;
    }

    csv_writer.flush().map_err(csv::Error::from)?;
    log::info!("Exported {written} match result(s) for the project team");
    Ok(written)
}
