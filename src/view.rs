//! Plain text rendering of restaurants for the chat front end.

use std::fmt::Write;

use crate::browse::{Pager, RatingBand};
use crate::data::Restaurant;

pub const HOME: &str = "Discover Delicious Dining Spots 🍽️

/search <name or cuisine> - search restaurants
/list - view all restaurants
/near <lat> <lng> [radius km] - restaurants around a point
/show <id> - details of one restaurant

You can also share your location to find restaurants around you, or send a photo of a dish to search by image.";

pub const NOTHING_FOUND: &str = "No restaurants found.";
pub const NO_IMAGE_MATCH: &str = "No restaurants found. Try uploading another image.";
pub const FETCH_FAILED: &str = "Failed to fetch data from the server. Please try again.";
pub const INVALID_IMAGE: &str = "Please upload a valid image.";
pub const MISSING_IMAGE: &str = "No image selected. Please upload an image.";
pub const LOADING: &str = "Loading... Please Wait...";

fn or_na<T: std::fmt::Display>(value: Option<T>) -> String {
    value.map_or_else(|| "N/A".to_string(), |v| v.to_string())
}

// zero counts as missing, like an unset value
fn non_zero(value: Option<f64>) -> Option<f64> {
    value.filter(|v| *v != 0.0)
}

fn rating(restaurant: &Restaurant) -> String {
    let value = non_zero(restaurant.rating());
    format!("{} ⭐ {}", RatingBand::of(value).badge(), or_na(value))
}

fn image_line(restaurant: &Restaurant) -> String {
    restaurant
        .image()
        .map(|url| format!("\nImage: {url}"))
        .unwrap_or_default()
}

pub fn list_card(restaurant: &Restaurant) -> String {
    let name = if restaurant.name.is_empty() {
        "Unnamed Restaurant"
    } else {
        restaurant.name.as_str()
    };
    let city = restaurant
        .location
        .city
        .as_deref()
        .unwrap_or("Unknown City");

    format!(
        "{name}\n{city}\nAvg Cost: Rs. {}\n{} ({} votes){}\n/show {}",
        or_na(non_zero(restaurant.average_cost_for_two)),
        rating(restaurant),
        restaurant.user_rating.votes.unwrap_or(0),
        image_line(restaurant),
        restaurant.id,
    )
}

pub fn location_card(restaurant: &Restaurant) -> String {
    format!(
        "{}\n{}\n★ {}\n/show {}",
        restaurant.name,
        restaurant.location.address.as_deref().unwrap_or_default(),
        or_na(non_zero(restaurant.rating())),
        restaurant.id,
    )
}

pub fn image_match_card(restaurant: &Restaurant) -> String {
    let location = &restaurant.location;
    format!(
        "{}\nCity: {}\nLocality: {}\nAddress: {}\nZipcode: {}{}",
        restaurant.name,
        or_na(location.city.as_deref()),
        or_na(location.locality_verbose.as_deref()),
        or_na(location.address.as_deref()),
        or_na(location.zipcode.as_deref()),
        image_line(restaurant),
    )
}

/// One page of the listing with its position, e.g. "Page 2 of 7".
pub fn listing(restaurants: &[&Restaurant], pager: Pager) -> String {
    let mut text = String::from("Restaurant List\n\n");
    if restaurants.is_empty() {
        text.push_str(NOTHING_FOUND);
    } else {
        let cards: Vec<_> = restaurants.iter().map(|r| list_card(r)).collect();
        text.push_str(&cards.join("\n\n"));
    }
    let _ = write!(text, "\n\n{}", page_label(pager));
    text
}

pub fn page_label(pager: Pager) -> String {
    format!("Page {} of {}", pager.page(), pager.total())
}

pub fn nearby(restaurants: &[Restaurant], radius: f64) -> String {
    if restaurants.is_empty() {
        return format!("No restaurants found within {radius} km.");
    }
    let cards: Vec<_> = restaurants.iter().map(location_card).collect();
    format!("Restaurants Around You 🌎\n\n{}", cards.join("\n\n"))
}

pub fn image_matches(restaurants: &[Restaurant]) -> String {
    if restaurants.is_empty() {
        return NO_IMAGE_MATCH.to_string();
    }
    let cards: Vec<_> = restaurants.iter().map(image_match_card).collect();
    cards.join("\n\n")
}

pub fn details(restaurant: &Restaurant, show_more: bool) -> String {
    let location = &restaurant.location;
    let mut text = format!(
        "{}\n⭐ {}\n{}{}\n\nCuisine: {}\nAddress: {}\nCost for Two: ₹{}\nPhone: {}",
        restaurant.name,
        or_na(non_zero(restaurant.rating())),
        location
            .locality
            .as_deref()
            .unwrap_or("Location not available"),
        image_line(restaurant),
        if restaurant.cuisines.is_empty() {
            "N/A"
        } else {
            restaurant.cuisines.as_str()
        },
        or_na(location.address.as_deref()),
        or_na(non_zero(restaurant.average_cost_for_two)),
        restaurant
            .phone_numbers
            .as_deref()
            .unwrap_or("Not available"),
    );

    if show_more {
        let rating = &restaurant.user_rating;
        let _ = write!(
            text,
            "\n\nRating Text: {}\nReviews: {}\nTimings: {}\nSpeciality: {}",
            or_na(rating.rating_text.as_deref()),
            or_na(rating.votes.filter(|v| *v != 0)),
            or_na(restaurant.timings.as_deref()),
            or_na(restaurant.speciality.as_deref()),
        );
    }
    if let Some(url) = &restaurant.url {
        let _ = write!(text, "\n\nVisit Website: {url}");
    }
    if let Some(menu) = &restaurant.menu_url {
        let _ = write!(text, "\n🍽 Menu: {menu}");
    }
    text
}
