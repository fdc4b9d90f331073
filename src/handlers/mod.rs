/// HTTP request handlers
use crate::domain::{
    AnalysisRequest, FetchMode, Health, Identifier, LightCurveReport, Quantity, Scoring,
    StellarParams,
};
use crate::errors::{ApiResult, PipelineError};
use crate::services::LightCurveService;
use crate::utils::escape_html;
use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    response::Html,
    Form, Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, warn};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub lightcurve_service: Arc<LightCurveService>,
    pub default_fetch_mode: FetchMode,
}

/// Successful response wrapper
#[derive(Debug, Serialize)]
pub struct SuccessResponse<T: Serialize> {
    pub ok: bool,
    #[serde(flatten)]
    pub data: T,
}

impl<T: Serialize> SuccessResponse<T> {
    pub fn new(data: T) -> Self {
        Self { ok: true, data }
    }
}

/// Per-request pipeline options shared by the JSON routes
#[derive(Debug, Default, Deserialize)]
pub struct AnalyzeOptions {
    pub mode: Option<FetchMode>,
    pub scoring: Option<Scoring>,
    pub include_image: Option<bool>,
    pub stellar_radius: Option<Quantity>,
    pub stellar_mass: Option<Quantity>,
}

/// Query-string form of [`AnalyzeOptions`]; quantities are bare numbers here
#[derive(Debug, Default, Deserialize)]
pub struct AnalyzeQuery {
    pub mode: Option<FetchMode>,
    pub scoring: Option<Scoring>,
    pub include_image: Option<bool>,
    pub stellar_radius: Option<f64>,
    pub stellar_mass: Option<f64>,
}

impl From<AnalyzeQuery> for AnalyzeOptions {
    fn from(q: AnalyzeQuery) -> Self {
        Self {
            mode: q.mode,
            scoring: q.scoring,
            include_image: q.include_image,
            stellar_radius: q.stellar_radius.map(Quantity::Bare),
            stellar_mass: q.stellar_mass.map(Quantity::Bare),
        }
    }
}

/// Fields of the browser search form
#[derive(Debug, Deserialize)]
pub struct LightCurveForm {
    pub tic_id: String,
    #[serde(default)]
    pub stellar_radius: Option<String>,
    #[serde(default)]
    pub stellar_mass: Option<String>,
}

fn stellar_params(
    radius: Option<Quantity>,
    mass: Option<Quantity>,
) -> ApiResult<Option<StellarParams>> {
    match (radius, mass) {
        (Some(radius), Some(mass)) => Ok(Some(StellarParams { radius, mass })),
        (None, None) => Ok(None),
        _ => Err(PipelineError::InvalidInput(
            "stellar_radius and stellar_mass must be supplied together".to_string(),
        )),
    }
}

fn build_request(
    raw_id: &str,
    options: AnalyzeOptions,
    default_mode: FetchMode,
    default_image: bool,
) -> ApiResult<AnalysisRequest> {
    Ok(AnalysisRequest {
        identifier: Identifier::parse(raw_id)?,
        mode: options.mode.unwrap_or(default_mode),
        scoring: options.scoring.unwrap_or_default(),
        include_image: options.include_image.unwrap_or(default_image),
        stellar: stellar_params(options.stellar_radius, options.stellar_mass)?,
    })
}

fn log_failure(target: &str, err: &PipelineError) {
    if err.is_client_error() {
        warn!("Request for {} rejected: {}", target, err);
    } else {
        error!("Request for {} failed: {}", target, err);
    }
}

async fn run(
    state: &AppState,
    raw_id: &str,
    request: ApiResult<AnalysisRequest>,
) -> ApiResult<LightCurveReport> {
    let result = match request {
        Ok(request) => state.lightcurve_service.analyze(request).await,
        Err(e) => Err(e),
    };
    if let Err(e) = &result {
        log_failure(raw_id, e);
    }
    result
}

/// Health check handler
pub async fn health() -> Json<Health> {
    Json(Health {
        status: "ok",
        now: Utc::now(),
    })
}

/// Chart and metrics for a target; optional JSON body with [`AnalyzeOptions`]
pub async fn analyze_post(
    Path(tic_id): Path<String>,
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<SuccessResponse<LightCurveReport>>, PipelineError> {
    let options = if body.iter().all(|b| b.is_ascii_whitespace()) {
        Ok(AnalyzeOptions::default())
    } else {
        serde_json::from_slice::<AnalyzeOptions>(&body)
            .map_err(|e| PipelineError::InvalidInput(format!("request body: {}", e)))
    };
    let request = options.and_then(|o| build_request(&tic_id, o, state.default_fetch_mode, true));

    let report = run(&state, &tic_id, request).await?;
    Ok(Json(SuccessResponse::new(report)))
}

/// Metrics for a target; options as query parameters, no image unless asked
pub async fn analyze_get(
    Path(tic_id): Path<String>,
    Query(query): Query<AnalyzeQuery>,
    State(state): State<AppState>,
) -> Result<Json<SuccessResponse<LightCurveReport>>, PipelineError> {
    let request = build_request(&tic_id, query.into(), state.default_fetch_mode, false);

    let report = run(&state, &tic_id, request).await?;
    Ok(Json(SuccessResponse::new(report)))
}

/// Browser search form
pub async fn index() -> Html<String> {
    Html(page("Light curve explorer", &search_form("")))
}

/// Browser form submission: chart plus metrics as HTML
pub async fn lightcurve_form(
    State(state): State<AppState>,
    Form(form): Form<LightCurveForm>,
) -> (StatusCode, Html<String>) {
    let request = form_request(&form, state.default_fetch_mode);

    match run(&state, &form.tic_id, request).await {
        Ok(report) => (
            StatusCode::OK,
            Html(page(&report.identifier, &report_body(&report, &form.tic_id))),
        ),
        Err(e) => (
            e.status_code(),
            Html(page("Light curve explorer", &error_body(&e, &form.tic_id))),
        ),
    }
}

fn form_request(form: &LightCurveForm, default_mode: FetchMode) -> ApiResult<AnalysisRequest> {
    let field = |name: &str, raw: &Option<String>| -> ApiResult<Option<Quantity>> {
        match raw.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            None => Ok(None),
            Some(s) => s.parse::<f64>().map(|v| Some(Quantity::Bare(v))).map_err(|_| {
                PipelineError::InvalidInput(format!("{} must be a number, got '{}'", name, s))
            }),
        }
    };

    let options = AnalyzeOptions {
        stellar_radius: field("stellar_radius", &form.stellar_radius)?,
        stellar_mass: field("stellar_mass", &form.stellar_mass)?,
        ..AnalyzeOptions::default()
    };
    build_request(&form.tic_id, options, default_mode, true)
}

fn page(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n</head>\n<body>\n{}\n</body>\n</html>\n",
        escape_html(title),
        body
    )
}

fn search_form(tic_id: &str) -> String {
    format!(
        concat!(
            "<form method=\"post\" action=\"/lightcurve\">\n",
            "<label>TIC ID <input name=\"tic_id\" value=\"{}\" required></label>\n",
            "<label>Stellar radius <input name=\"stellar_radius\"></label>\n",
            "<label>Stellar mass <input name=\"stellar_mass\"></label>\n",
            "<button type=\"submit\">Analyze</button>\n",
            "</form>"
        ),
        escape_html(tic_id)
    )
}

fn report_body(report: &LightCurveReport, tic_id: &str) -> String {
    let mut rows = vec![
        ("Amplitude", format!("{:.6}", report.amplitude)),
        ("Segments", report.segments.to_string()),
        ("Trees", report.tree_count.to_string()),
        ("Trees (normalized)", format!("{:.4}", report.tree_count_normalized)),
        ("Habitability score", format!("{:.3}", report.habitability_score)),
        ("Life", format!("{:?}", report.life_type)),
        ("Resources", format!("{:?}", report.resource_type)),
    ];
    if let Some(planet_type) = report.planet_type {
        rows.push(("Planet type", format!("{:?}", planet_type)));
    }
    if let (Some(period), Some(epoch)) = (report.period, report.epoch) {
        rows.push(("Period (days)", format!("{:.5}", period)));
        rows.push(("Epoch (BJD)", format!("{:.5}", epoch)));
    }

    let table: String = rows
        .iter()
        .map(|(k, v)| format!("<tr><th>{}</th><td>{}</td></tr>\n", k, escape_html(v)))
        .collect();

    let image = match (&report.image_data, report.image_format) {
        (Some(data), Some(format)) => format!(
            "<img alt=\"light curve\" src=\"data:{};base64,{}\">\n",
            format.mime_type(),
            data
        ),
        _ => String::new(),
    };

    format!(
        "<h1>{}</h1>\n{}<table>\n{}</table>\n{}",
        escape_html(&report.identifier),
        image,
        table,
        search_form(tic_id)
    )
}

fn error_body(err: &PipelineError, tic_id: &str) -> String {
    format!(
        "<h1>Error</h1>\n<p class=\"error\">{}</p>\n{}",
        escape_html(&err.to_string()),
        search_form(tic_id)
    )
}
