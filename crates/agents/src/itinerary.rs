use std::time::Instant;

use anyhow::Result;
use chrono::NaiveDate;
use tracing::{info, instrument};
use travelwise_core::{
    budget_cost, date_label, day_cost, default_day_tips, generic_activities, plan_confidence,
    select_places_for_day, theme_for_day, trip_date, Activity, ActivityKind, Budget, Confidence, DayPlan,
    DayTheme, NotificationKind, TravelPlan, TripRequest, DAY_SLOTS,
};
use travelwise_dataset::{CityRecord, ExperienceRecord, RestaurantRecord};
use travelwise_providers::{fetch_place_details, GenerativeModel, PlacesProvider};
use travelwise_storage::{NotificationRepository, SavedItemRepository};

use crate::TravelPlanner;

impl<P, G, S> TravelPlanner<P, G, S>
where
    P: PlacesProvider,
    G: GenerativeModel,
    S: NotificationRepository + SavedItemRepository,
{
    /// Builds a day-by-day itinerary and leaves a "plan ready" notification
    /// for the user.
    #[instrument(skip(self, request), fields(destination = %request.destination))]
    pub async fn plan(
        &self,
        user_id: &str,
        request: TripRequest,
        start: NaiveDate,
    ) -> Result<TravelPlan> {
        let started = Instant::now();
        self.metrics.inc_request();

        let request = request.normalized()?;
        trip_date(start, request.duration)?;
        let report = self.run_waterfall(&request).await;

        let mut days = Vec::with_capacity(usize::from(request.duration));
        for day in 1..=request.duration {
            days.push(self.build_day(&request, day, start).await?);
        }
        let confidence = plan_confidence(&report.suggestions, &days);

        let destination = self
            .dataset
            .find_city(&request.destination)
            .map(|record| record.city.clone())
            .unwrap_or_else(|| request.destination.clone());
        self.notify(
            user_id,
            NotificationKind::Plan,
            "Trip Plan Ready",
            format!(
                "Your {}-day itinerary for {destination} is ready",
                request.duration
            ),
        )
        .await?;

        self.metrics.inc_plan();
        self.metrics.observe_latency(started.elapsed());
        info!(
            user_id,
            days = days.len(),
            confidence,
            resolved_by = report.resolved_by.as_str(),
            "plan generated"
        );

        Ok(TravelPlan {
            destination,
            budget: request.budget,
            travel_style: request.travel_style,
            interests: request.interests,
            duration: request.duration,
            days,
            suggestions: report.suggestions,
            confidence,
        })
    }

    async fn build_day(&self, request: &TripRequest, day: u8, start: NaiveDate) -> Result<DayPlan> {
        let theme = theme_for_day(day);
        let record = self.dataset.find_city(&request.destination);
        let city = record
            .map(|record| record.city.clone())
            .unwrap_or_else(|| request.destination.clone());

        let mut activities = match record {
            Some(record) => self.city_activities(record, theme, day, request.budget),
            None => generic_activities(&city, request.budget),
        };
        for activity in &mut activities {
            self.enrich_activity(activity, &city).await;
        }

        let tips = match self.dataset.city_tips(&city) {
            tips if tips.is_empty() => default_day_tips(&city),
            tips => tips,
        };

        Ok(DayPlan {
            day,
            date: date_label(start, day)?,
            theme: theme.label().to_string(),
            estimated_cost: day_cost(&activities, request.budget),
            images: self.dataset.images().images_for(theme.image_query(), &city, 3),
            activities,
            tips,
        })
    }

    fn city_activities(
        &self,
        record: &CityRecord,
        theme: DayTheme,
        day: u8,
        budget: Budget,
    ) -> Vec<Activity> {
        let places = select_places_for_day(&record.popular_places, theme, day);
        let restaurants = self.dataset.restaurants_for(&record.city);
        let experience = self.dataset.experience_for(&record.city);
        let generic = generic_activities(&record.city, budget);
        let day_offset = usize::from(day.max(1) - 1) * 2;

        DAY_SLOTS
            .iter()
            .zip(generic)
            .enumerate()
            .map(|(slot_index, (slot, generic))| {
                let mut activity = match slot.kind {
                    ActivityKind::Attraction if !places.is_empty() => {
                        let pick = if slot_index == 0 { 0 } else { 1 % places.len() };
                        self.attraction_activity(record, &places[pick])
                    }
                    ActivityKind::Restaurant if !restaurants.is_empty() => {
                        let sitting = usize::from(slot_index > 1);
                        let restaurant = restaurants[(day_offset + sitting) % restaurants.len()];
                        let images = self.dataset.images().images_for(&restaurant.name, &record.city, 1);
                        restaurant_activity(restaurant, budget, images)
                    }
                    ActivityKind::Experience => match experience {
                        Some(experience) => experience_activity(experience),
                        None => generic,
                    },
                    _ => generic,
                };
                activity.time = slot.time.to_string();
                activity
            })
            .collect()
    }

    fn attraction_activity(&self, record: &CityRecord, place: &str) -> Activity {
        let info = self.dataset.place_info(place, &record.city);
        Activity {
            time: String::new(),
            kind: ActivityKind::Attraction,
            images: self.dataset.images().images_for(place, &record.city, 2),
            name: info.name,
            description: info.description,
            location: format!("{}, {}", record.city, record.state),
            duration: info.duration,
            cost: info.cost,
            rating: Some(info.rating),
            tips: info.tips,
            coordinates: Some(self.dataset.city_coordinates(&record.city)),
            confidence: Confidence::High,
            place_id: None,
            map_link: None,
        }
    }

    /// Adds place id, map link and photo from the places provider, or the
    /// catalog equivalents when it has nothing.
    async fn enrich_activity(&self, activity: &mut Activity, city: &str) {
        if self.places.is_live() {
            self.metrics.inc_provider_call("places_api");
        }
        let details =
            fetch_place_details(&self.places, self.dataset.images(), &activity.name, city).await;

        if details.place_id.is_some() {
            activity.place_id = details.place_id;
            if activity.rating.is_none() {
                activity.rating = details.rating;
            }
        }
        activity.map_link = Some(details.map_link);
        if !details.photo.is_empty() && !activity.images.contains(&details.photo) {
            activity.images.insert(0, details.photo);
        }
    }
}

fn restaurant_activity(restaurant: &RestaurantRecord, budget: Budget, images: Vec<String>) -> Activity {
    let tips = if !restaurant.tips.is_empty() {
        restaurant.tips.clone()
    } else if !restaurant.must_try.is_empty() {
        vec![format!("Must try: {}", restaurant.must_try.join(", "))]
    } else {
        vec!["Reserve ahead on weekends".to_string()]
    };

    Activity {
        time: String::new(),
        kind: ActivityKind::Restaurant,
        name: restaurant.name.clone(),
        description: format!("{} ({} cuisine)", restaurant.description, restaurant.cuisine),
        location: restaurant.location.clone(),
        duration: "1-1.5 hours".to_string(),
        cost: budget_cost(budget, ActivityKind::Restaurant).to_string(),
        rating: Some(restaurant.rating),
        images,
        tips,
        coordinates: None,
        confidence: Confidence::Medium,
        place_id: None,
        map_link: None,
    }
}

fn experience_activity(experience: &ExperienceRecord) -> Activity {
    Activity {
        time: String::new(),
        kind: ActivityKind::Experience,
        name: experience.name.clone(),
        description: experience.description.clone(),
        location: experience.location.clone(),
        duration: "1-2 hours".to_string(),
        cost: "Free".to_string(),
        rating: None,
        images: Vec::new(),
        tips: experience.tips.clone(),
        coordinates: None,
        confidence: Confidence::Medium,
        place_id: None,
        map_link: None,
    }
}
