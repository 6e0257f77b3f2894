use crate::data::Restaurant;

/// Position in a paginated listing. The page is always within `1..=total`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pager {
    page: u32,
    total: u32,
}

impl Default for Pager {
    fn default() -> Self {
        Self { page: 1, total: 1 }
    }
}

impl Pager {
    pub fn new(page: u32, total: u32) -> Self {
        let total = total.max(1);
        Self {
            page: page.clamp(1, total),
            total,
        }
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn total(&self) -> u32 {
        self.total
    }

    pub fn has_previous(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total
    }

    pub fn next(self) -> Self {
        Self::new(self.page.saturating_add(1), self.total)
    }

    pub fn previous(self) -> Self {
        Self::new(self.page.saturating_sub(1), self.total)
    }

    pub fn controls(&self) -> PageControls {
        PageControls {
            previous: self.has_previous().then(|| self.page - 1),
            next: self.has_next().then(|| self.page + 1),
        }
    }
}

/// Target page of each navigation control; `None` means disabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PageControls {
    pub previous: Option<u32>,
    pub next: Option<u32>,
}

/// Narrow an already fetched page by a case-insensitive substring of the
/// name or the cuisines. Only the given page is searched.
pub fn filter_page<'a>(restaurants: &'a [Restaurant], term: &str) -> Vec<&'a Restaurant> {
    if term.is_empty() {
        return restaurants.iter().collect();
    }
    let term = term.to_lowercase();

    restaurants
        .iter()
        .filter(|r| {
            r.name.to_lowercase().contains(&term) || r.cuisines.to_lowercase().contains(&term)
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RatingBand {
    Excellent,
    Good,
    Average,
    Poor,
}

impl RatingBand {
    pub fn of(rating: Option<f64>) -> Self {
        match rating {
            Some(r) if r >= 4.0 => Self::Excellent,
            Some(r) if r >= 3.0 => Self::Good,
            Some(r) if r >= 2.0 => Self::Average,
            _ => Self::Poor,
        }
    }

    pub fn badge(&self) -> &'static str {
        match self {
            Self::Excellent => "🟢",
            Self::Good => "🟡",
            Self::Average => "🟠",
            Self::Poor => "🔴",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn restaurant(name: &str, cuisines: &str) -> Restaurant {
        Restaurant {
            name: name.to_string(),
            cuisines: cuisines.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn controls_follow_page_bounds() {
        for total in 1..=6 {
            for page in 1..=total {
                let pager = Pager::new(page, total);
                let controls = pager.controls();
                assert_eq!(controls.previous.is_none(), page == 1, "{page}/{total}");
                assert_eq!(controls.next.is_none(), page == total, "{page}/{total}");
            }
        }
    }

    #[test]
    fn navigation_clamps() {
        let pager = Pager::new(1, 3);
        assert_eq!(pager.previous().page(), 1);
        assert_eq!(pager.next().next().next().page(), 3);
        assert_eq!(Pager::new(9, 3).page(), 3);
        assert_eq!(Pager::new(0, 0), Pager::default());
        assert_eq!(
            Pager::new(2, 3).controls(),
            PageControls {
                previous: Some(1),
                next: Some(3)
            }
        );
    }

    #[test]
    fn filter_matches_name_or_cuisine_ignoring_case() {
        let page = vec![
            restaurant("Pizza Hut", "Italian, Fast Food"),
            restaurant("Bukhara", "North Indian"),
            restaurant("Wok Express", "Chinese, Thai"),
        ];

        let names = |term| -> Vec<String> {
            filter_page(&page, term)
                .into_iter()
                .map(|r| r.name.clone())
                .collect()
        };

        assert_eq!(names("PIZZA"), ["Pizza Hut"]);
        assert_eq!(names("indian"), ["Bukhara"]);
        assert_eq!(names("a"), ["Pizza Hut", "Bukhara", "Wok Express"]);
        assert_eq!(names("e, t"), ["Wok Express"]);
        assert!(names("sushi").is_empty());
        assert_eq!(names("").len(), 3);
    }

    #[test]
    fn rating_bands() {
        assert_eq!(RatingBand::of(Some(4.9)), RatingBand::Excellent);
        assert_eq!(RatingBand::of(Some(4.0)), RatingBand::Excellent);
        assert_eq!(RatingBand::of(Some(3.5)), RatingBand::Good);
        assert_eq!(RatingBand::of(Some(2.0)), RatingBand::Average);
        assert_eq!(RatingBand::of(Some(1.9)), RatingBand::Poor);
        assert_eq!(RatingBand::of(None), RatingBand::Poor);
    }
}
