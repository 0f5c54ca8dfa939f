use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::info;
use travelwise_core::{AttractionCard, RestaurantCard, SavedItemKind};
use travelwise_providers::{GenerativeModel, PlacesProvider};
use travelwise_storage::{NotificationRepository, SavedItemRepository};

use crate::TravelPlanner;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwipeAction {
    Love,
    Skip,
}

#[derive(Debug, Clone, Serialize)]
pub struct RestaurantDeckStep {
    pub card: RestaurantCard,
    pub viewed: Vec<usize>,
    pub remaining: usize,
    pub total: usize,
    pub reset: bool,
    pub saved: bool,
}

/// Next card to show from a deck of `total`: the first unviewed index after
/// the most recently viewed one, wrapping. Once every card has been seen the
/// deck starts over at 0, signalled by the `bool`.
pub fn next_unviewed_index(total: usize, viewed: &[usize]) -> Option<(usize, bool)> {
    if total == 0 {
        return None;
    }

    let seen: Vec<usize> = viewed.iter().copied().filter(|index| *index < total).collect();
    if (0..total).all(|index| seen.contains(&index)) {
        return Some((0, true));
    }

    let start = seen.last().map(|last| last + 1).unwrap_or(0);
    (0..total)
        .map(|offset| (start + offset) % total)
        .find(|index| !seen.contains(index))
        .map(|index| (index, false))
}

impl<P, G, S> TravelPlanner<P, G, S>
where
    P: PlacesProvider,
    G: GenerativeModel,
    S: NotificationRepository + SavedItemRepository,
{
    /// Attraction cards for a dataset city, `None` when the city is unknown.
    pub fn attraction_cards(&self, city: &str) -> Option<Vec<AttractionCard>> {
        let record = self.dataset.find_city(city)?;
        let location = format!("{}, {}", record.city, record.state);

        Some(
            record
                .popular_places
                .iter()
                .enumerate()
                .map(|(index, place)| {
                    let info = self.dataset.place_info(place, &record.city);
                    AttractionCard {
                        index,
                        name: info.name,
                        category: info.category,
                        rating: info.rating,
                        description: info.description,
                        duration: info.duration,
                        price: info.cost,
                        location: location.clone(),
                        image: info.image,
                        tips: info.tips,
                    }
                })
                .collect(),
        )
    }

    pub fn restaurant_cards(&self, city: &str) -> Option<Vec<RestaurantCard>> {
        let record = self.dataset.find_city(city)?;
        Some(
            self.dataset
                .restaurants_for(&record.city)
                .into_iter()
                .enumerate()
                .map(|(index, restaurant)| RestaurantCard {
                    index,
                    name: restaurant.name.clone(),
                    cuisine: restaurant.cuisine.clone(),
                    rating: restaurant.rating,
                    description: restaurant.description.clone(),
                    location: restaurant.location.clone(),
                    image: self
                        .dataset
                        .images()
                        .primary_image(&restaurant.name, &record.city)
                        .unwrap_or_default(),
                    tags: restaurant.tags.clone(),
                    must_try: restaurant.must_try.clone(),
                })
                .collect(),
        )
    }

    pub fn next_restaurant(&self, city: &str, viewed: &[usize]) -> Option<RestaurantDeckStep> {
        let cards = self.restaurant_cards(city)?;
        deck_step(cards, viewed.to_vec(), false)
    }

    /// Records a swipe on `current` (loving it saves the restaurant) and
    /// deals the next card. `None` when the city has no restaurants.
    pub async fn swipe_restaurant(
        &self,
        user_id: &str,
        city: &str,
        current: Option<usize>,
        action: Option<SwipeAction>,
        viewed: Vec<usize>,
    ) -> Result<Option<RestaurantDeckStep>> {
        let Some(cards) = self.restaurant_cards(city) else {
            return Ok(None);
        };

        let mut viewed = viewed;
        let mut saved = false;
        if let Some(card) = current.and_then(|index| cards.get(index)) {
            viewed.retain(|index| *index != card.index);
            viewed.push(card.index);
            if action == Some(SwipeAction::Love) {
                saved = self
                    .save_item(user_id, SavedItemKind::Restaurant, &card.name, city)
                    .await?;
            }
            info!(user_id, restaurant = %card.name, action = ?action, "restaurant swiped");
        }

        Ok(deck_step(cards, viewed, saved))
    }
}

fn deck_step(cards: Vec<RestaurantCard>, mut viewed: Vec<usize>, saved: bool) -> Option<RestaurantDeckStep> {
    let total = cards.len();
    let (index, reset) = next_unviewed_index(total, &viewed)?;
    if reset {
        viewed.clear();
    }
    viewed.retain(|seen| *seen < total);
    let card = cards.into_iter().nth(index)?;

    Some(RestaurantDeckStep {
        card,
        remaining: total - viewed.len().min(total),
        viewed,
        total,
        reset,
        saved,
    })
}

#[cfg(test)]
mod tests {
    use travelwise_providers::OfflinePlaces;

    use super::*;
    use crate::testing::{planner, ScriptedModel};

    #[test]
    fn rotation_skips_viewed_cards_and_wraps() {
        assert_eq!(next_unviewed_index(0, &[]), None);
        assert_eq!(next_unviewed_index(4, &[]), Some((0, false)));
        assert_eq!(next_unviewed_index(4, &[0]), Some((1, false)));
        assert_eq!(next_unviewed_index(4, &[2, 0]), Some((1, false)));
        assert_eq!(next_unviewed_index(4, &[1, 3]), Some((0, false)));
        assert_eq!(next_unviewed_index(3, &[9, 2]), Some((0, false)));
        assert_eq!(next_unviewed_index(3, &[2, 0, 1]), Some((0, true)));
    }

    #[test]
    fn cards_follow_dataset_order() {
        let (_dir, planner) = planner(OfflinePlaces, ScriptedModel::default());

        let attractions = planner.attraction_cards("mumbai").expect("known city");
        assert_eq!(attractions.len(), 5);
        assert_eq!(attractions[0].name, "Gateway of India");
        assert_eq!(attractions[0].location, "Mumbai, Maharashtra");

        let restaurants = planner.restaurant_cards("Mumbai").expect("known city");
        let names: Vec<&str> = restaurants.iter().map(|card| card.name.as_str()).collect();
        assert_eq!(names, vec!["Trishna", "Leopold Cafe", "Britannia & Co."]);
        assert_eq!(restaurants[2].index, 2);

        assert!(planner.attraction_cards("Atlantis").is_none());
        assert_eq!(planner.restaurant_cards("Pune").map(|cards| cards.len()), Some(0));
        assert!(planner.next_restaurant("Pune", &[]).is_none());
    }

    #[tokio::test]
    async fn swiping_through_the_deck_resets_and_saves_loved_cards() {
        let (_dir, planner) = planner(OfflinePlaces, ScriptedModel::default());

        let step = planner
            .swipe_restaurant("asha", "Mumbai", None, None, Vec::new())
            .await
            .expect("swipe")
            .expect("deck");
        assert_eq!(step.card.name, "Trishna");
        assert_eq!(step.remaining, 3);

        let step = planner
            .swipe_restaurant("asha", "Mumbai", Some(0), Some(SwipeAction::Love), step.viewed)
            .await
            .expect("swipe")
            .expect("deck");
        assert!(step.saved);
        assert_eq!(step.card.name, "Leopold Cafe");
        assert_eq!(step.viewed, vec![0]);

        let step = planner
            .swipe_restaurant("asha", "Mumbai", Some(1), Some(SwipeAction::Skip), step.viewed)
            .await
            .expect("swipe")
            .expect("deck");
        assert!(!step.saved);
        assert_eq!(step.card.index, 2);

        let step = planner
            .swipe_restaurant("asha", "Mumbai", Some(2), None, step.viewed)
            .await
            .expect("swipe")
            .expect("deck");
        assert!(step.reset);
        assert_eq!(step.card.index, 0);
        assert!(step.viewed.is_empty());

        let again = planner
            .swipe_restaurant("asha", "Mumbai", Some(0), Some(SwipeAction::Love), Vec::new())
            .await
            .expect("swipe")
            .expect("deck");
        assert!(!again.saved);

        let saved = planner.saved_items("asha").await.expect("saved");
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].name, "Trishna");
        assert_eq!(planner.unread_count("asha").await.expect("count"), 1);
    }
}
