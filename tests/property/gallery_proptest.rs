//! Property-based tests for gallery ordering and filtering

use pixelcollab::shared::{create_grid, GalleryEntry, Project, SortMode, TimerSelector, FLAG_THRESHOLD};
use proptest::prelude::*;
use uuid::Uuid;

fn entry(id: i64, public: bool, rating: Option<u8>, flags: u64) -> GalleryEntry {
    GalleryEntry {
        project: Project {
            id,
            owner_id: Uuid::nil(),
            owner_name: "ada".to_string(),
            name: format!("p{}", id),
            xsize: 1,
            ysize: 1,
            grid: create_grid(1, 1),
            finished: true,
            started_at: None,
            finished_at: None,
            is_public: public,
            timer: TimerSelector::Unlimited,
        },
        average_rating: rating.map(f64::from),
        flag_count: flags,
    }
}

fn gallery_strategy() -> impl Strategy<Value = Vec<GalleryEntry>> {
    prop::collection::vec((any::<bool>(), prop::option::of(1u8..=10), 0u64..4), 0..24).prop_map(|specs| {
        specs
            .into_iter()
            .enumerate()
            .map(|(i, (public, rating, flags))| entry(i as i64, public, rating, flags))
            .collect()
    })
}

proptest! {
    #[test]
    fn test_sort_mode_parse_is_total(raw in ".*") {
        let mode = SortMode::parse(&raw);
        let known = ["rating", "new", "myGallery", "flagged"].contains(&raw.as_str());
        prop_assert_eq!(matches!(mode, SortMode::Unknown(_)), !known);
    }

    #[cfg(feature = "ssr")]
    #[test]
    fn test_rating_view_is_visible_and_descending(gallery in gallery_strategy()) {
        use pixelcollab::backend::gallery::sort_by_rating;

        let sorted = sort_by_rating(gallery.clone());
        let expected = gallery.iter().filter(|e| e.is_publicly_visible()).count();
        prop_assert_eq!(sorted.len(), expected);
        prop_assert!(sorted.iter().all(|e| e.project.is_public && e.flag_count < FLAG_THRESHOLD));

        let ratings: Vec<f64> = sorted.iter().map(|e| e.average_rating.unwrap_or(f64::NEG_INFINITY)).collect();
        prop_assert!(ratings.windows(2).all(|w| w[0] >= w[1]));
    }

    #[cfg(feature = "ssr")]
    #[test]
    fn test_flagged_view_is_exactly_the_flagged(gallery in gallery_strategy()) {
        use pixelcollab::backend::gallery::only_flagged;

        let flagged: Vec<i64> = only_flagged(gallery.clone()).iter().map(|e| e.project.id).collect();
        let expected: Vec<i64> = gallery
            .iter()
            .filter(|e| e.flag_count >= FLAG_THRESHOLD)
            .map(|e| e.project.id)
            .collect();
        prop_assert_eq!(flagged, expected);
    }

    #[cfg(feature = "ssr")]
    #[test]
    fn test_newest_view_without_dates_keeps_order(gallery in gallery_strategy()) {
        use pixelcollab::backend::gallery::sort_by_newest;

        let ids: Vec<i64> = sort_by_newest(gallery.clone()).iter().map(|e| e.project.id).collect();
        let expected: Vec<i64> = gallery
            .iter()
            .filter(|e| e.is_publicly_visible())
            .map(|e| e.project.id)
            .collect();
        prop_assert_eq!(ids, expected);
    }
}
