use artisan_market_api::domain::rating::{
    Rating, RatingOutOfRange, RatingSummary, ReviewTarget, ReviewTargetError,
};
use uuid::Uuid;

fn rating(value: i32) -> Rating {
    Rating::try_from(value).expect("valid rating")
}

#[test]
fn incremental_mean_tracks_each_review() {
    let mut summary = RatingSummary::default();
    let mut averages = Vec::new();
    for value in [5, 3, 4] {
        summary = summary.record(rating(value));
        averages.push(summary.average);
    }

    assert_eq!(averages, vec![5.0, 4.0, 4.0]);
    assert_eq!(summary.count, 3);
}

#[test]
fn incremental_mean_matches_full_recompute() {
    let ratings = [1, 5, 5, 2, 4, 3, 3, 5];
    let incremental = ratings
        .iter()
        .fold(RatingSummary::default(), |s, r| s.record(rating(*r)));
    let rebuilt = RatingSummary::from_ratings(ratings);

    assert_eq!(incremental.count, rebuilt.count);
    assert!((incremental.average - rebuilt.average).abs() < 1e-9);
}

#[test]
fn recompute_from_nothing_resets_the_summary() {
    assert_eq!(RatingSummary::from_ratings(Vec::new()), RatingSummary::default());
    assert_eq!(RatingSummary::from_ratings([4, 2]), RatingSummary::new(3.0, 2));
}

#[test]
fn ratings_outside_one_to_five_are_rejected() {
    assert_eq!(Rating::try_from(0), Err(RatingOutOfRange(0)));
    assert_eq!(Rating::try_from(6), Err(RatingOutOfRange(6)));
    assert_eq!(rating(1).value(), 1);
    assert_eq!(rating(5).value(), 5);
}

#[test]
fn review_targets_exactly_one_thing() {
    let product = Uuid::new_v4();
    let seller = Uuid::new_v4();

    assert_eq!(
        ReviewTarget::resolve(Some(product), None),
        Ok(ReviewTarget::Product(product))
    );
    assert_eq!(
        ReviewTarget::resolve(None, Some(seller)),
        Ok(ReviewTarget::Seller(seller))
    );
    assert_eq!(
        ReviewTarget::resolve(Some(product), Some(seller)),
        Err(ReviewTargetError::Ambiguous)
    );
    assert_eq!(ReviewTarget::resolve(None, None), Err(ReviewTargetError::Missing));
    assert_eq!(ReviewTarget::Seller(seller).resource(), "seller");
    assert_eq!(ReviewTarget::Product(product).id(), product);
}
