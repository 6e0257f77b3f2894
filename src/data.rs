use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Restaurant {
    #[serde(default, deserialize_with = "text_or_number")]
    pub id: String,
    #[serde(default, deserialize_with = "text_or_number")]
    pub name: String,
    /// comma separated, e.g. "North Indian, Chinese"
    #[serde(default, deserialize_with = "text_or_number")]
    pub cuisines: String,
    #[serde(default)]
    pub location: Location,
    #[serde(default, deserialize_with = "optional_number")]
    pub average_cost_for_two: Option<f64>,
    #[serde(default)]
    pub user_rating: UserRating,
    #[serde(default, deserialize_with = "optional_text")]
    pub featured_image: Option<String>,
    #[serde(default, deserialize_with = "optional_text")]
    pub thumb: Option<String>,
    #[serde(default, deserialize_with = "optional_text")]
    pub phone_numbers: Option<String>,
    #[serde(default, deserialize_with = "optional_text")]
    pub timings: Option<String>,
    #[serde(default, deserialize_with = "optional_text")]
    pub menu_url: Option<String>,
    /// website of the restaurant
    #[serde(default, deserialize_with = "optional_text")]
    pub url: Option<String>,
    #[serde(default, deserialize_with = "optional_text")]
    pub speciality: Option<String>,
}

impl Restaurant {
    pub fn rating(&self) -> Option<f64> {
        self.user_rating.aggregate_rating
    }

    /// The featured image, falling back to the thumbnail.
    pub fn image(&self) -> Option<&str> {
        self.featured_image.as_deref().or(self.thumb.as_deref())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Location {
    #[serde(default, deserialize_with = "optional_text")]
    pub address: Option<String>,
    #[serde(default, deserialize_with = "optional_text")]
    pub city: Option<String>,
    #[serde(default, deserialize_with = "optional_text")]
    pub locality: Option<String>,
    #[serde(default, deserialize_with = "optional_text")]
    pub locality_verbose: Option<String>,
    #[serde(default, deserialize_with = "optional_text")]
    pub zipcode: Option<String>,
    #[serde(default, deserialize_with = "optional_number")]
    pub latitude: Option<f64>,
    #[serde(default, deserialize_with = "optional_number")]
    pub longitude: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserRating {
    #[serde(default, deserialize_with = "optional_number")]
    pub aggregate_rating: Option<f64>,
    #[serde(default, deserialize_with = "optional_text")]
    pub rating_text: Option<String>,
    #[serde(default, deserialize_with = "optional_count")]
    pub votes: Option<u64>,
}

/// A restaurant as it appears on the wire: either the bare object or wrapped
/// as `{ "restaurant": { ... } }`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RestaurantRecord {
    Wrapped { restaurant: Restaurant },
    Flat(Restaurant),
}

impl From<RestaurantRecord> for Restaurant {
    fn from(record: RestaurantRecord) -> Self {
        match record {
            RestaurantRecord::Wrapped { restaurant } | RestaurantRecord::Flat(restaurant) => {
                restaurant
            }
        }
    }
}

/// One page of the listing endpoint, also used for image search matches.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RestaurantPage {
    #[serde(default, deserialize_with = "records")]
    pub restaurants: Vec<Restaurant>,
    #[serde(default, rename = "totalPages", deserialize_with = "optional_count")]
    total_pages: Option<u64>,
}

impl RestaurantPage {
    /// Total number of pages; an absent or zero count means a single page.
    pub fn total_pages(&self) -> u32 {
        self.total_pages
            .map(|n| u32::try_from(n).unwrap_or(u32::MAX))
            .filter(|n| *n > 0)
            .unwrap_or(1)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Text(String),
    Number(serde_json::Number),
    Bool(bool),
}

fn text_or_number<'de, D: Deserializer<'de>>(de: D) -> Result<String, D::Error> {
    Ok(optional_text(de)?.unwrap_or_default())
}

// Blank strings are treated the same as a missing value.
fn optional_text<'de, D: Deserializer<'de>>(de: D) -> Result<Option<String>, D::Error> {
    let text = match Option::<Scalar>::deserialize(de)? {
        Some(Scalar::Text(text)) => Some(text),
        Some(Scalar::Number(n)) => Some(n.to_string()),
        Some(Scalar::Bool(b)) => Some(b.to_string()),
        None => None,
    };
    Ok(text.filter(|t| !t.trim().is_empty()))
}

fn optional_number<'de, D: Deserializer<'de>>(de: D) -> Result<Option<f64>, D::Error> {
    let number = match Option::<Scalar>::deserialize(de)? {
        Some(Scalar::Number(n)) => n.as_f64(),
        Some(Scalar::Text(text)) => text.trim().parse().ok(),
        _ => None,
    };
    Ok(number.filter(|n: &f64| n.is_finite()))
}

fn optional_count<'de, D: Deserializer<'de>>(de: D) -> Result<Option<u64>, D::Error> {
    Ok(optional_number(de)?
        .filter(|n| *n >= 0.0)
        .map(|n| n as u64))
}

fn records<'de, D: Deserializer<'de>>(de: D) -> Result<Vec<Restaurant>, D::Error> {
    let records = Option::<Vec<RestaurantRecord>>::deserialize(de)?;
    Ok(records
        .unwrap_or_default()
        .into_iter()
        .map(Restaurant::from)
        .collect())
}
