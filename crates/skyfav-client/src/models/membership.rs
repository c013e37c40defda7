//! "Is the displayed city a favorite" flag and the star toggle.

use skyfav_core::same_city;
use skyfav_services::FavoriteCity;
use skyfav_weather::WeatherSnapshot;

use crate::models::favorites_model::{AddOrigin, FavoritesModel};

/// What a toggle did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleAction {
    Adding,
    Removing,
    /// A toggle for this city is still outstanding
    Busy,
    /// Nothing is displayed
    NoCity,
}

/// Derived flag; call `sync` whenever the list or the snapshot may have
/// changed.
#[derive(Debug, Clone, Copy, Default)]
pub struct FavoriteMembership {
    is_member: bool,
}

impl FavoriteMembership {
    pub fn compute(favorites: &[FavoriteCity], city: &str) -> bool {
        favorites.iter().any(|f| same_city(&f.city, city))
    }

    /// Recompute. Returns true if the flag changed.
    pub fn sync(&mut self, favorites: &[FavoriteCity], snapshot: Option<&WeatherSnapshot>) -> bool {
        let now = snapshot.is_some_and(|s| Self::compute(favorites, &s.city_name));
        let changed = now != self.is_member;
        if changed {
            tracing::debug!(is_member = now, "Favorite membership changed");
        }
        self.is_member = now;
        changed
    }

    pub fn is_member(&self) -> bool {
        self.is_member
    }

    /// Star toggle for the displayed city. Serialized per city: a second
    /// activation while the first is outstanding does nothing.
    pub fn toggle(
        &self,
        favorites: &mut FavoritesModel,
        snapshot: Option<&WeatherSnapshot>,
    ) -> ToggleAction {
        let Some(snapshot) = snapshot else {
            return ToggleAction::NoCity;
        };
        let city = &snapshot.city_name;
        if favorites.is_city_busy(city) {
            tracing::debug!(%city, "Star toggle already in flight");
            return ToggleAction::Busy;
        }

        if self.is_member {
            favorites.remove_city(city);
            ToggleAction::Removing
        } else {
            // Name is non-empty here, so validation cannot fail.
            match favorites.add(city, AddOrigin::Star) {
                Ok(()) => ToggleAction::Adding,
                Err(e) => {
                    tracing::warn!("Star add rejected: {}", e);
                    ToggleAction::NoCity
                }
            }
        }
    }
}
