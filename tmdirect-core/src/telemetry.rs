//! Per-call telemetry metadata.
//!
//! The runtime builds one [`TelemetryContext`] per `generate_object` call and
//! hands it to a [`TelemetrySink`], which decides whether telemetry is
//! recorded and, if so, returns the span the provider call runs inside.

use crate::types::GenerationRequest;
use serde::Serialize;
use std::fmt::Debug;

/// Placeholder for a missing command name or model id
pub const UNKNOWN: &str = "unknown";

/// Metadata attached to a generation call.
///
/// Fields are copied verbatim from the request; `None` means the caller did
/// not supply the value and is distinct from an empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TelemetryMetadata {
    pub command: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brief_id: Option<String>,
}

/// Telemetry for a single call
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TelemetryContext {
    pub request_id: String,
    /// `<provider>.<model>.<command>.generateObject.<objectName>`
    pub function_id: String,
    pub metadata: TelemetryMetadata,
}

/// Build the telemetry context for an object generation call.
///
/// A missing model id or command name renders as `unknown` in the function
/// id. The request id is the only value not derived from the inputs.
pub fn build_context(
    provider_name: &str,
    model_id: Option<&str>,
    request: &GenerationRequest,
) -> TelemetryContext {
    let command = request
        .command_name
        .clone()
        .unwrap_or_else(|| UNKNOWN.to_string());
    let object_name = request.object_name.as_deref().unwrap_or_default();

    let function_id = format!(
        "{}.{}.{}.generateObject.{}",
        provider_name,
        model_id.unwrap_or(UNKNOWN),
        command,
        object_name
    );

    TelemetryContext {
        request_id: uuid::Uuid::new_v4().to_string(),
        function_id,
        metadata: TelemetryMetadata {
            command,
            output_type: request.output_type.clone(),
            tag: request.tag.clone(),
            project_hash: request.project_hash.clone(),
            user_id: request.user_id.clone(),
            brief_id: request.brief_id.clone(),
        },
    }
}

/// Decides whether a call is traced and produces the span it runs in.
pub trait TelemetrySink: Send + Sync + Debug + 'static {
    /// Return the span to attach, or `None` when telemetry is disabled
    fn configure(&self, ctx: &TelemetryContext) -> Option<tracing::Span>;
}

/// Records every call as a `tm.generate_object` span.
#[derive(Debug, Clone, Default)]
pub struct TracingTelemetry;

impl TelemetrySink for TracingTelemetry {
    fn configure(&self, ctx: &TelemetryContext) -> Option<tracing::Span> {
        let meta = &ctx.metadata;
        Some(tracing::info_span!(
            "tm.generate_object",
            request_id = %ctx.request_id,
            function_id = %ctx.function_id,
            command = %meta.command,
            output_type = meta.output_type.as_deref(),
            tag = meta.tag.as_deref(),
            project_hash = meta.project_hash.as_deref(),
            user_id = meta.user_id.as_deref(),
            brief_id = meta.brief_id.as_deref(),
        ))
    }
}

/// Telemetry switched off.
#[derive(Debug, Clone, Default)]
pub struct NoTelemetry;

impl TelemetrySink for NoTelemetry {
    fn configure(&self, _ctx: &TelemetryContext) -> Option<tracing::Span> {
        None
    }
}
