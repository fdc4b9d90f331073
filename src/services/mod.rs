/// Business logic services layer
use crate::classify;
use crate::clients::{EphemerisLookup, LightCurveProvider};
use crate::domain::{
    AnalysisRequest, Ephemeris, FetchMode, Identifier, LightCurveReport, Quantity, Series,
};
use crate::errors::{ApiResult, PipelineError};
use crate::render;
use crate::scoring;
use crate::stats;
use std::sync::Arc;
use tracing::{debug, info};

/// Retrieves and merges light curve segments from a provider
pub struct SeriesFetcher {
    provider: Arc<dyn LightCurveProvider>,
}

impl SeriesFetcher {
    pub fn new(provider: Arc<dyn LightCurveProvider>) -> Self {
        Self { provider }
    }

    /// Fetch a series for a catalog name.
    ///
    /// `FetchMode::All` concatenates segments in provider order without
    /// sorting by time; see [`Series`].
    pub async fn fetch(&self, catalog_name: &str, mode: FetchMode) -> ApiResult<Series> {
        let mut products = self.provider.search(catalog_name).await?;
        if products.is_empty() {
            return Err(PipelineError::NotFound(catalog_name.to_string()));
        }
        if mode == FetchMode::Single {
            products.truncate(1);
        }

        let mut segments = Vec::with_capacity(products.len());
        for product in &products {
            let segment = self.provider.download(product).await?;
            debug!(
                "Downloaded {} ({} samples, mission {:?}, sector {:?})",
                product.id,
                segment.len(),
                product.mission,
                product.sector
            );
            segments.push(segment);
        }

        Ok(Series::concat(segments))
    }
}

/// Tunables shared by every pipeline run
#[derive(Clone, Debug)]
pub struct PipelineSettings {
    pub catalog_prefix: String,
    pub baseline_habitability: Quantity,
}

/// Identifier-to-report pipeline
pub struct LightCurveService {
    fetcher: SeriesFetcher,
    ephemeris: Arc<dyn EphemerisLookup>,
    settings: PipelineSettings,
}

impl LightCurveService {
    pub fn new(
        fetcher: SeriesFetcher,
        ephemeris: Arc<dyn EphemerisLookup>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            fetcher,
            ephemeris,
            settings,
        }
    }

    /// Run the full pipeline for one request
    pub async fn analyze(&self, request: AnalysisRequest) -> ApiResult<LightCurveReport> {
        let catalog_name = request
            .identifier
            .catalog_name(&self.settings.catalog_prefix);
        info!("Analyzing {} (mode {:?})", catalog_name, request.mode);

        let series = Arc::new(self.fetcher.fetch(&catalog_name, request.mode).await?);

        let statistics = stats::summarize(&series, &catalog_name)?;

        let render_task = request.include_image.then(|| {
            let series = Arc::clone(&series);
            tokio::task::spawn_blocking(move || render::render(&series))
        });

        let amplitude = statistics.median_flux;
        let metrics = scoring::derive(
            &self.settings.baseline_habitability,
            amplitude,
            request.scoring,
        );

        let ephemeris = match &request.stellar {
            Some(_) => self.lookup_ephemeris(&request.identifier).await,
            None => Ephemeris::Unavailable,
        };
        let planet_type = match (&request.stellar, ephemeris.data()) {
            (Some(stellar), Some(eph)) => Some(classify::planet_type(
                stellar.radius.clone(),
                stellar.mass.clone(),
                eph.period,
                amplitude,
            )),
            _ => None,
        };

        let image = match render_task {
            Some(task) => Some(
                task.await
                    .map_err(|e| PipelineError::Render(format!("render task failed: {}", e)))??,
            ),
            None => None,
        };

        info!(
            "Analyzed {}: {} segments, {} usable / {} missing samples, median flux {:.5}, score {:.3}",
            catalog_name,
            series.segment_count(),
            statistics.usable_samples,
            statistics.missing_samples,
            amplitude,
            metrics.habitability_score
        );

        Ok(LightCurveReport {
            identifier: catalog_name,
            amplitude,
            tree_count: metrics.tree_count,
            tree_count_normalized: metrics.tree_count_normalized,
            habitability_score: metrics.habitability_score,
            life_type: classify::life_type(metrics.habitability_score),
            resource_type: classify::resource_type(metrics.habitability_score),
            segments: series.segment_count(),
            image_format: image.as_ref().map(|img| img.format),
            image_data: image.as_ref().map(render::to_base64),
            planet_type,
            period: ephemeris.data().map(|e| e.period),
            epoch: ephemeris.data().map(|e| e.epoch),
        })
    }

    async fn lookup_ephemeris(&self, identifier: &Identifier) -> Ephemeris {
        let ephemeris = self.ephemeris.lookup(identifier).await;
        if ephemeris == Ephemeris::Unavailable {
            info!(
                "Ephemeris unavailable for {}, skipping planet type",
                identifier.as_str()
            );
        }
        ephemeris
    }
}
