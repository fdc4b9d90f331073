/// External API clients module
use crate::domain::{Ephemeris, EphemerisData, Identifier, ProductRef, Sample, Segment};
use crate::errors::{ApiResult, PipelineError};
use crate::utils::{items, n_pick, num, s_pick};
use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

/// Source of light curve segments
#[async_trait]
pub trait LightCurveProvider: Send + Sync {
    /// Products available for a catalog name, in provider order
    async fn search(&self, catalog_name: &str) -> ApiResult<Vec<ProductRef>>;

    /// Download one product as a segment
    async fn download(&self, product: &ProductRef) -> ApiResult<Segment>;
}

/// Source of transit ephemerides; never fails, only reports unavailability
#[async_trait]
pub trait EphemerisLookup: Send + Sync {
    async fn lookup(&self, identifier: &Identifier) -> Ephemeris;
}

/// HTTP client wrapper with common configuration
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    pub fn new(timeout: Duration) -> ApiResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent("lightcurve-api/0.1")
            .build()?;
        Ok(Self { client })
    }

    pub fn get_client(&self) -> &Client {
        &self.client
    }
}

/// Light curve gateway client (JSON search + per-product download)
pub struct LightCurveClient {
    http_client: HttpClient,
    base_url: String,
}

impl LightCurveClient {
    pub fn new(base_url: String, timeout: Duration) -> ApiResult<Self> {
        Ok(Self {
            http_client: HttpClient::new(timeout)?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Get base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn resolve(&self, url: &str) -> ApiResult<Url> {
        let joined = match Url::parse(url) {
            Ok(absolute) => Ok(absolute),
            Err(_) => Url::parse(&format!("{}/", self.base_url)).and_then(|base| base.join(url)),
        };
        joined.map_err(|e| PipelineError::malformed(format!("bad product url '{}': {}", url, e)))
    }
}

#[async_trait]
impl LightCurveProvider for LightCurveClient {
    async fn search(&self, catalog_name: &str) -> ApiResult<Vec<ProductRef>> {
        let resp = self
            .http_client
            .get_client()
            .get(format!("{}/search", self.base_url))
            .query(&[("target", catalog_name)])
            .send()
            .await?;

        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(Vec::new());
        }
        let resp = resp.error_for_status()?;

        let json: Value = resp
            .json()
            .await
            .map_err(|e| PipelineError::malformed(format!("search response: {}", e)))?;

        items(json, &["results", "data", "products"])
            .iter()
            .map(parse_product)
            .collect()
    }

    async fn download(&self, product: &ProductRef) -> ApiResult<Segment> {
        let url = self.resolve(&product.url)?;
        debug!("Downloading product {} from {}", product.id, url);

        let json: Value = self
            .http_client
            .get_client()
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
            .map_err(|e| PipelineError::malformed(format!("product {}: {}", product.id, e)))?;

        parse_segment(&product.id, &json)
    }
}

fn parse_product(item: &Value) -> ApiResult<ProductRef> {
    let id = s_pick(item, &["id", "obsid", "product_id"])
        .ok_or_else(|| PipelineError::malformed("search result without an id"))?;
    let url = s_pick(item, &["url", "dataURL", "data_url"])
        .ok_or_else(|| PipelineError::malformed(format!("product {} has no url", id)))?;

    Ok(ProductRef {
        mission: s_pick(item, &["mission", "obs_collection"]),
        sector: item
            .get("sector")
            .and_then(num)
            .filter(|s| s.is_finite())
            .map(|s| s as i64),
        id,
        url,
    })
}

fn parse_segment(product_id: &str, json: &Value) -> ApiResult<Segment> {
    let column = |name: &str| {
        json.get(name)
            .and_then(Value::as_array)
            .ok_or_else(|| {
                PipelineError::malformed(format!("product {} has no '{}' column", product_id, name))
            })
    };
    let times = column("time")?;
    let fluxes = column("flux")?;

    if times.len() != fluxes.len() {
        return Err(PipelineError::malformed(format!(
            "product {} has {} timestamps but {} flux values",
            product_id,
            times.len(),
            fluxes.len()
        )));
    }

    let samples = times
        .iter()
        .zip(fluxes)
        .enumerate()
        .map(|(i, (t, f))| -> ApiResult<Sample> {
            let time = num(t).filter(|t| t.is_finite()).ok_or_else(|| {
                PipelineError::malformed(format!("product {} sample {} has no time", product_id, i))
            })?;
            let flux = match f {
                Value::Null => None,
                other => Some(num(other).ok_or_else(|| {
                    PipelineError::malformed(format!(
                        "product {} sample {} has non-numeric flux",
                        product_id, i
                    ))
                })?),
            };
            Ok(Sample::new(time, flux))
        })
        .collect::<ApiResult<Vec<Sample>>>()?;

    Segment::new(product_id, samples)
}

/// NASA Exoplanet Archive TAP client for TOI transit ephemerides
pub struct ExoplanetArchiveClient {
    http_client: HttpClient,
    tap_url: String,
}

impl ExoplanetArchiveClient {
    pub fn new(tap_url: String, timeout: Duration) -> ApiResult<Self> {
        Ok(Self {
            http_client: HttpClient::new(timeout)?,
            tap_url,
        })
    }

    async fn fetch_rows(&self, tic_digits: &str) -> ApiResult<Vec<Value>> {
        let query = format!(
            "select pl_orbper,pl_tranmid from toi where tid={}",
            tic_digits
        );
        let json: Value = self
            .http_client
            .get_client()
            .get(&self.tap_url)
            .query(&[("query", query.as_str()), ("format", "json")])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(items(json, &["data", "results"]))
    }
}

#[async_trait]
impl EphemerisLookup for ExoplanetArchiveClient {
    async fn lookup(&self, identifier: &Identifier) -> Ephemeris {
        let digits = identifier.digits();
        if digits.is_empty() {
            debug!("No numeric catalog id in '{}', skipping ephemeris", identifier.as_str());
            return Ephemeris::Unavailable;
        }

        let rows = match self.fetch_rows(&digits).await {
            Ok(rows) => rows,
            Err(e) => {
                warn!("Ephemeris lookup for TIC {} failed: {}", digits, e);
                return Ephemeris::Unavailable;
            }
        };

        let found = rows.iter().find_map(|row| {
            let period = n_pick(row, &["pl_orbper"]).filter(|p| p.is_finite())?;
            let epoch = n_pick(row, &["pl_tranmid"]).filter(|e| e.is_finite())?;
            Some(EphemerisData { period, epoch })
        });

        match found {
            Some(data) => Ephemeris::Available(data),
            None => {
                debug!("No ephemeris rows for TIC {}", digits);
                Ephemeris::Unavailable
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const TIMEOUT: Duration = Duration::from_secs(5);

    fn product(id: &str, url: &str) -> ProductRef {
        ProductRef {
            id: id.to_string(),
            mission: None,
            sector: None,
            url: url.to_string(),
        }
    }

    #[tokio::test]
    async fn test_search_parses_wrapped_results() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("target", "TIC 123456789"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "results": [
                    {"obsid": 9001, "mission": "TESS", "sector": 14, "dataURL": "/products/9001"},
                    {"id": "9002", "mission": "TESS", "sector": "15", "url": "/products/9002"}
                ]
            })))
            .mount(&server)
            .await;

        let client = LightCurveClient::new(server.uri(), TIMEOUT).unwrap();
        let products = client.search("TIC 123456789").await.unwrap();

        assert_eq!(products.len(), 2);
        assert_eq!(products[0].id, "9001");
        assert_eq!(products[0].sector, Some(14));
        assert_eq!(products[0].mission.as_deref(), Some("TESS"));
        assert_eq!(products[1].sector, Some(15));
        assert_eq!(products[1].url, "/products/9002");
    }

    #[tokio::test]
    async fn test_search_not_found_is_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = LightCurveClient::new(server.uri(), TIMEOUT).unwrap();
        assert!(client.search("TIC 1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_search_server_error_is_retrieval() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = LightCurveClient::new(server.uri(), TIMEOUT).unwrap();
        let err = client.search("TIC 1").await.unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Retrieval {
                status: Some(503),
                ..
            }
        ));
        assert_eq!(err.code(), "UPSTREAM_5XX");
    }

    #[tokio::test]
    async fn test_search_unreachable_is_retrieval() {
        let client = LightCurveClient::new("http://127.0.0.1:1".to_string(), TIMEOUT).unwrap();
        assert!(matches!(
            client.search("TIC 1").await,
            Err(PipelineError::Retrieval { .. })
        ));
    }

    #[tokio::test]
    async fn test_download_relative_url() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/products/9001"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "time": [1325.3, 1325.32, 1325.34, 1325.36],
                "flux": [1.0, null, "NaN", "0.98"]
            })))
            .mount(&server)
            .await;

        let client = LightCurveClient::new(server.uri(), TIMEOUT).unwrap();
        let segment = client
            .download(&product("9001", "products/9001"))
            .await
            .unwrap();

        let fluxes: Vec<Option<f64>> = segment.samples().iter().map(|s| s.flux).collect();
        assert_eq!(fluxes, vec![Some(1.0), None, None, Some(0.98)]);
        assert_eq!(segment.product_id, "9001");
    }

    #[tokio::test]
    async fn test_download_absolute_url() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/elsewhere/abc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "time": [1.0], "flux": [2.0]
            })))
            .mount(&server)
            .await;

        let client = LightCurveClient::new("http://127.0.0.1:1".to_string(), TIMEOUT).unwrap();
        let url = format!("{}/elsewhere/abc", server.uri());
        let segment = client.download(&product("abc", &url)).await.unwrap();
        assert_eq!(segment.len(), 1);
    }

    #[tokio::test]
    async fn test_download_malformed_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/products/bad"))
            .respond_with(ResponseTemplate::new(200).set_body_string("SIMPLE  =  T"))
            .mount(&server)
            .await;

        let client = LightCurveClient::new(server.uri(), TIMEOUT).unwrap();
        let err = client
            .download(&product("bad", "/products/bad"))
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Retrieval { status: None, .. }));
    }

    #[test]
    fn test_parse_segment_length_mismatch() {
        let json = json!({"time": [1.0, 2.0], "flux": [1.0]});
        assert!(matches!(
            parse_segment("p", &json),
            Err(PipelineError::Retrieval { .. })
        ));
    }

    #[test]
    fn test_parse_segment_rejects_text_flux() {
        let json = json!({"time": [1.0], "flux": ["bright"]});
        assert!(parse_segment("p", &json).is_err());
    }

    #[test]
    fn test_parse_product_requires_url() {
        assert!(parse_product(&json!({"id": "x"})).is_err());
    }

    #[tokio::test]
    async fn test_ephemeris_available() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/TAP/sync"))
            .and(query_param(
                "query",
                "select pl_orbper,pl_tranmid from toi where tid=123456789",
            ))
            .and(query_param("format", "json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"pl_orbper": null, "pl_tranmid": 2458000.1},
                {"pl_orbper": 3.52, "pl_tranmid": 2458325.5}
            ])))
            .mount(&server)
            .await;

        let client =
            ExoplanetArchiveClient::new(format!("{}/TAP/sync", server.uri()), TIMEOUT).unwrap();
        let id = Identifier::parse("TIC 123456789").unwrap();

        assert_eq!(
            client.lookup(&id).await,
            Ephemeris::Available(EphemerisData {
                period: 3.52,
                epoch: 2458325.5
            })
        );
    }

    #[tokio::test]
    async fn test_ephemeris_empty_rows_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/TAP/sync"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let client =
            ExoplanetArchiveClient::new(format!("{}/TAP/sync", server.uri()), TIMEOUT).unwrap();
        let id = Identifier::parse("42").unwrap();
        assert_eq!(client.lookup(&id).await, Ephemeris::Unavailable);
    }

    #[tokio::test]
    async fn test_ephemeris_failure_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client =
            ExoplanetArchiveClient::new(format!("{}/TAP/sync", server.uri()), TIMEOUT).unwrap();
        let id = Identifier::parse("42").unwrap();
        assert_eq!(client.lookup(&id).await, Ephemeris::Unavailable);
    }

    #[tokio::test]
    async fn test_ephemeris_without_digits_skips_request() {
        let client =
            ExoplanetArchiveClient::new("http://127.0.0.1:1/TAP/sync".to_string(), TIMEOUT)
                .unwrap();
        let id = Identifier::parse("Kepler-b").unwrap();
        assert_eq!(client.lookup(&id).await, Ephemeris::Unavailable);
    }
}
