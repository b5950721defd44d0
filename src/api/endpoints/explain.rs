use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use tracing::Instrument;
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, ExplainRequest};
use crate::pipeline::{AnalysisResult, RawReport};

/// `POST /explain-report`: run the full pipeline on one report.
pub async fn explain_report(
    State(ctx): State<ApiContext>,
    payload: Result<Json<ExplainRequest>, JsonRejection>,
) -> Result<Json<AnalysisResult>, ApiError> {
    let Json(request) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let request_id = Uuid::new_v4();

    async move {
        tracing::info!(chars = request.report_text.len(), "Received report for analysis");

        let report = RawReport::new(request.report_text).map_err(|e| {
            tracing::warn!("Empty report text received");
            ApiError::from(e)
        })?;

        let result = ctx.pipeline.run(&report).await.map_err(|e| {
            tracing::error!(error = %e, "Analysis failed");
            ApiError::from(e)
        })?;

        tracing::info!("Report analysis completed successfully");
        Ok::<_, ApiError>(Json(result))
    }
    .instrument(tracing::info_span!("explain_report", %request_id))
    .await
}
