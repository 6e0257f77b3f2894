//! Typed client for the remote restaurant search API.
//!
//! Every operation issues exactly one request. The `*_request` methods build
//! the request without sending it.

use derive_builder::Builder;
use reqwest::{Request, Response, Url};
use serde::de::DeserializeOwned;

use crate::config::{ClientConfig, DEFAULT_RADIUS_KM};
use crate::data::{Restaurant, RestaurantPage, RestaurantRecord};
use crate::error::{ClientError, ClientResult};
use crate::image::ImageUpload;

const LIST_PATH: &str = "api/restaurants";
const LOCATION_PATH: &str = "api/location";
const IMAGE_SEARCH_PATH: &str = "restaurants/imgsearch";

/// Paginated listing, optionally narrowed by a keyword.
#[derive(Debug, Clone, PartialEq, Builder)]
#[builder(setter(into))]
pub struct ListQuery {
    #[builder(default = "1")]
    pub page: u32,
    /// falls back to the configured page size
    #[builder(default, setter(into, strip_option))]
    pub limit: Option<u32>,
    #[builder(default)]
    pub search: String,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            page: 1,
            limit: None,
            search: String::new(),
        }
    }
}

/// A point and a distance in kilometres.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RadiusQuery {
    lat: f64,
    lng: f64,
    radius: f64,
}

impl RadiusQuery {
    pub fn new(lat: f64, lng: f64, radius: f64) -> ClientResult<Self> {
        if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return Err(ClientError::InvalidLocation(format!(
                "latitude {lat} out of range"
            )));
        }
        if !lng.is_finite() || !(-180.0..=180.0).contains(&lng) {
            return Err(ClientError::InvalidLocation(format!(
                "longitude {lng} out of range"
            )));
        }
        if !radius.is_finite() || radius <= 0.0 {
            return Err(ClientError::InvalidLocation(format!(
                "radius {radius} must be positive"
            )));
        }
        Ok(Self { lat, lng, radius })
    }

    pub fn around(lat: f64, lng: f64) -> ClientResult<Self> {
        Self::new(lat, lng, DEFAULT_RADIUS_KM)
    }

    pub fn lat(&self) -> f64 {
        self.lat
    }

    pub fn lng(&self) -> f64 {
        self.lng
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    api_url: Url,
    image_api_url: Url,
    page_limit: u32,
}

impl ApiClient {
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        let http = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            http,
            api_url: base_url(&config.api_url)?,
            image_api_url: base_url(config.image_api_url())?,
            page_limit: config.page_limit.max(1),
        })
    }

    pub fn page_limit(&self) -> u32 {
        self.page_limit
    }

    pub fn list_request(&self, query: &ListQuery) -> ClientResult<Request> {
        let url = endpoint(&self.api_url, LIST_PATH)?;
        let limit = query.limit.unwrap_or(self.page_limit);
        let mut builder = self
            .http
            .get(url)
            .query(&[("page", query.page.max(1)), ("limit", limit)]);

        let search = query.search.trim();
        if !search.is_empty() {
            builder = builder.query(&[("search", search)]);
        }
        Ok(builder.build()?)
    }

    pub async fn list(&self, query: &ListQuery) -> ClientResult<RestaurantPage> {
        let request = self.list_request(query)?;
        self.send(request).await
    }

    pub fn nearby_request(&self, query: &RadiusQuery) -> ClientResult<Request> {
        let url = endpoint(&self.api_url, LOCATION_PATH)?;
        let request = self
            .http
            .get(url)
            .query(&[
                ("lat", query.lat),
                ("lng", query.lng),
                ("radius", query.radius),
            ])
            .build()?;
        Ok(request)
    }

    pub async fn nearby(&self, query: &RadiusQuery) -> ClientResult<Vec<Restaurant>> {
        let request = self.nearby_request(query)?;
        let records: Vec<RestaurantRecord> = self.send(request).await?;
        Ok(records.into_iter().map(Restaurant::from).collect())
    }

    pub fn restaurant_request(&self, id: &str) -> ClientResult<Request> {
        let mut url = endpoint(&self.api_url, LIST_PATH)?;
        url.path_segments_mut()
            .map_err(|_| ClientError::InvalidUrl {
                url: self.api_url.to_string(),
                reason: "cannot be a base".to_string(),
            })?
            .push(id.trim());
        Ok(self.http.get(url).build()?)
    }

    pub async fn restaurant(&self, id: &str) -> ClientResult<Restaurant> {
        let request = self.restaurant_request(id)?;
        let record: RestaurantRecord = self.send(request).await?;
        Ok(record.into())
    }

    pub fn image_search_request(&self, upload: ImageUpload) -> ClientResult<Request> {
        let url = endpoint(&self.image_api_url, IMAGE_SEARCH_PATH)?;
        let form = reqwest::multipart::Form::new().part("image", upload.into_part()?);
        Ok(self.http.post(url).multipart(form).build()?)
    }

    pub async fn image_search(&self, upload: ImageUpload) -> ClientResult<Vec<Restaurant>> {
        let request = self.image_search_request(upload)?;
        let matches: RestaurantPage = self.send(request).await?;
        Ok(matches.restaurants)
    }

    /// Validates the file type before anything touches the network.
    pub async fn image_search_file(
        &self,
        path: impl AsRef<std::path::Path>,
    ) -> ClientResult<Vec<Restaurant>> {
        let upload = ImageUpload::from_path(path).await?;
        self.image_search(upload).await
    }

    async fn send<T: DeserializeOwned>(&self, request: Request) -> ClientResult<T> {
        tracing::debug!("{} {}", request.method(), request.url());
        let response = self.http.execute(request).await?;
        handle_response(response).await
    }
}

async fn handle_response<T: DeserializeOwned>(response: Response) -> ClientResult<T> {
    let status = response.status();
    if !status.is_success() {
        tracing::warn!("{} answered {status}", response.url());
        return Err(ClientError::Status { status });
    }
    Ok(response.json().await?)
}

fn base_url(raw: &str) -> ClientResult<Url> {
    let mut raw = raw.trim().to_string();
    // keep any path prefix when joining endpoint paths
    if !raw.ends_with('/') {
        raw.push('/');
    }
    let url = Url::parse(&raw).map_err(|e| ClientError::InvalidUrl {
        url: raw.clone(),
        reason: e.to_string(),
    })?;
    if url.cannot_be_a_base() {
        return Err(ClientError::InvalidUrl {
            url: raw,
            reason: "cannot be a base".to_string(),
        });
    }
    Ok(url)
}

fn endpoint(base: &Url, path: &str) -> ClientResult<Url> {
    base.join(path).map_err(|e| ClientError::InvalidUrl {
        url: format!("{base}{path}"),
        reason: e.to_string(),
    })
}
