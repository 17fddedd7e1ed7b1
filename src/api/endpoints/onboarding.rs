//! Onboarding: CSV import (spreadsheet or Stripe), Google Sheets import,
//! and the completion flag.

use axum::extract::{Multipart, Query, State};
use axum::{Extension, Json};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{blocking, current_month};
use crate::api::error::ApiError;
use crate::api::types::{ApiContext, UserContext};
use crate::db;
use crate::finance::import::{self, FinancialSummary, ImportError, StripeImport, StripeSummary};
use crate::models::{FinancialRecord, FinancialRecordInput};

#[derive(Serialize, Default)]
pub struct ExtractionResponse {
    pub success: bool,
    pub message: String,
    pub financial_data: Option<FinancialSummary>,
    pub stripe_data: Option<StripeSummary>,
    pub records_created: usize,
    pub errors: Vec<String>,
}

impl ExtractionResponse {
    fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileKind {
    Spreadsheet,
    Stripe,
}

impl FileKind {
    fn from_hint(hint: Option<&str>) -> Self {
        match hint.map(|h| h.trim().to_lowercase()).as_deref() {
            Some("stripe") | Some("stripe_csv") => Self::Stripe,
            _ => Self::Spreadsheet,
        }
    }
}

#[derive(Deserialize)]
pub struct ExtractParams {
    pub file_type_hint: Option<String>,
}

fn input_from_record(record: &FinancialRecord) -> FinancialRecordInput {
    FinancialRecordInput {
        month: record.month.clone(),
        revenue_recurring: record.revenue_recurring,
        revenue_one_time: record.revenue_one_time,
        expenses_salaries: record.expenses_salaries,
        expenses_marketing: record.expenses_marketing,
        expenses_infrastructure: record.expenses_infrastructure,
        expenses_other: record.expenses_other,
        cash_balance: record.cash_balance,
    }
}

/// Existing months only get their recurring revenue replaced; new months
/// take revenue and Stripe fees.
fn store_stripe_months(
    conn: &mut Connection,
    user_id: &Uuid,
    import: &StripeImport,
) -> Result<usize, ApiError> {
    let existing = db::list_financial_records(conn, user_id)?;
    let mut inputs = Vec::with_capacity(import.months.len());
    for (month, totals) in &import.months {
        inputs.push(match existing.iter().find(|r| &r.month == month) {
            Some(record) => FinancialRecordInput {
                revenue_recurring: totals.revenue,
                ..input_from_record(record)
            },
            None => FinancialRecordInput {
                month: month.clone(),
                revenue_recurring: totals.revenue,
                expenses_other: totals.fees,
                ..FinancialRecordInput::default()
            },
        });
    }
    Ok(db::upsert_financial_records(conn, user_id, &inputs)?)
}

fn spreadsheet_response(
    conn: &mut Connection,
    user_id: &Uuid,
    content: &str,
    source: &str,
) -> Result<ExtractionResponse, ApiError> {
    let parsed = import::import_spreadsheet(content)?;
    let created = db::upsert_financial_records(conn, user_id, &parsed.records)?;
    tracing::info!(user_id = %user_id, source, records = created, "Financial data imported");
    Ok(ExtractionResponse {
        success: created > 0,
        message: format!("Imported {created} monthly records from {source}"),
        financial_data: Some(parsed.summary),
        stripe_data: None,
        records_created: created,
        errors: parsed.errors,
    })
}

/// `POST /onboarding/extract-from-file?file_type_hint=` — multipart `file`.
pub async fn extract_from_file(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<UserContext>,
    Query(params): Query<ExtractParams>,
    mut multipart: Multipart,
) -> Result<Json<ExtractionResponse>, ApiError> {
    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Invalid multipart body: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(format!("Could not read upload: {e}")))?;
        upload = Some((filename, bytes));
        break;
    }
    let (filename, bytes) =
        upload.ok_or_else(|| ApiError::BadRequest("Missing 'file' field".into()))?;

    let extension = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "csv" => {}
        "xlsx" | "xls" | "pdf" => {
            return Err(ApiError::BadRequest(format!(
                ".{extension} files are not supported. Export the sheet as CSV and upload that."
            )))
        }
        _ => return Err(ApiError::BadRequest(format!("Unsupported file type: {filename}"))),
    }

    let content = std::str::from_utf8(&bytes).map_err(|_| ImportError::Encoding)?;
    let mut conn = ctx.core.open_db()?;
    let response = match FileKind::from_hint(params.file_type_hint.as_deref()) {
        FileKind::Spreadsheet => {
            spreadsheet_response(&mut conn, &caller.user_id, content, &filename)?
        }
        FileKind::Stripe => {
            let parsed = import::import_stripe(content)?;
            let created = store_stripe_months(&mut conn, &caller.user_id, &parsed)?;
            tracing::info!(
                user_id = %caller.user_id,
                months = created,
                transactions = parsed.summary.transaction_count,
                "Stripe export imported"
            );
            ExtractionResponse {
                success: created > 0,
                message: format!(
                    "Imported {} Stripe transactions across {created} months",
                    parsed.summary.transaction_count
                ),
                financial_data: None,
                stripe_data: Some(parsed.summary),
                records_created: created,
                errors: parsed.errors,
            }
        }
    };
    Ok(Json(response))
}

#[derive(Deserialize)]
pub struct SheetsBody {
    pub sheet_url: String,
}

/// `POST /onboarding/connect-google-sheets` — import a publicly shared sheet.
pub async fn connect_google_sheets(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<UserContext>,
    Json(body): Json<SheetsBody>,
) -> Result<Json<ExtractionResponse>, ApiError> {
    let url = body.sheet_url.trim().to_string();
    let fetched = blocking(move || Ok(import::fetch_google_sheet_csv(&url))).await?;
    let content = match fetched {
        Ok(content) => content,
        Err(ImportError::InvalidSheetUrl) => {
            return Ok(Json(ExtractionResponse::failed(
                "Invalid Google Sheets URL. Share the sheet and paste its link.",
            )))
        }
        Err(e) => return Err(e.into()),
    };
    let mut conn = ctx.core.open_db()?;
    Ok(Json(spreadsheet_response(&mut conn, &caller.user_id, &content, "Google Sheets")?))
}

#[derive(Serialize)]
pub struct CompleteResponse {
    pub success: bool,
    pub message: &'static str,
}

/// `POST /onboarding/complete` — set the flag; users who imported nothing
/// get an all-zero record for the current month.
pub async fn complete(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<UserContext>,
) -> Result<Json<CompleteResponse>, ApiError> {
    let conn = ctx.core.open_db()?;
    if db::count_financial_records(&conn, &caller.user_id)? == 0 {
        let input = FinancialRecordInput {
            month: current_month(),
            ..FinancialRecordInput::default()
        };
        db::upsert_financial_record(&conn, &caller.user_id, &input)?;
    }
    db::set_onboarding_completed(&conn, &caller.user_id)?;
    tracing::info!(user_id = %caller.user_id, "Onboarding completed");
    Ok(Json(CompleteResponse {
        success: true,
        message: "Onboarding completed successfully",
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_kind_from_hint() {
        assert_eq!(FileKind::from_hint(None), FileKind::Spreadsheet);
        assert_eq!(FileKind::from_hint(Some("spreadsheet")), FileKind::Spreadsheet);
        assert_eq!(FileKind::from_hint(Some("Stripe")), FileKind::Stripe);
        assert_eq!(FileKind::from_hint(Some("stripe_csv")), FileKind::Stripe);
    }
}
