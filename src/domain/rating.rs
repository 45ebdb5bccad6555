use thiserror::Error;
use uuid::Uuid;

pub const MIN_RATING: i32 = 1;
pub const MAX_RATING: i32 = 5;

/// A star rating, guaranteed to be within `MIN_RATING..=MAX_RATING`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rating(i32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Rating must be between 1 and 5, got {0}")]
pub struct RatingOutOfRange(pub i32);

impl Rating {
    pub fn value(self) -> i32 {
        self.0
    }
}

impl TryFrom<i32> for Rating {
    type Error = RatingOutOfRange;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        if (MIN_RATING..=MAX_RATING).contains(&value) {
            Ok(Self(value))
        } else {
            Err(RatingOutOfRange(value))
        }
    }
}

/// Running mean rating and review count stored on a product or seller.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RatingSummary {
    pub average: f64,
    pub count: i32,
}

impl RatingSummary {
    pub fn new(average: f64, count: i32) -> Self {
        Self { average, count }
    }

    /// Fold one more rating into the mean:
    /// `new_avg = (old_avg * old_count + r) / (old_count + 1)`.
    pub fn record(self, rating: Rating) -> Self {
        let count = self.count + 1;
        let average =
            (self.average * f64::from(self.count) + f64::from(rating.value())) / f64::from(count);
        Self { average, count }
    }

    /// Rebuild the summary from every remaining rating.
    pub fn from_ratings<I>(ratings: I) -> Self
    where
        I: IntoIterator<Item = i32>,
    {
        let (sum, count) = ratings
            .into_iter()
            .fold((0_i64, 0_i32), |(sum, count), r| (sum + i64::from(r), count + 1));
        if count == 0 {
            return Self::default();
        }
        Self {
            average: sum as f64 / f64::from(count),
            count,
        }
    }
}

/// What a review is about: exactly one product or exactly one seller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewTarget {
    Product(Uuid),
    Seller(Uuid),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ReviewTargetError {
    #[error("Rating and productId or sellerId are required")]
    Missing,
    #[error("A review targets either a product or a seller, not both")]
    Ambiguous,
}

impl ReviewTarget {
    pub fn resolve(
        product_id: Option<Uuid>,
        seller_id: Option<Uuid>,
    ) -> Result<Self, ReviewTargetError> {
        match (product_id, seller_id) {
            (Some(product_id), None) => Ok(ReviewTarget::Product(product_id)),
            (None, Some(seller_id)) => Ok(ReviewTarget::Seller(seller_id)),
            (Some(_), Some(_)) => Err(ReviewTargetError::Ambiguous),
            (None, None) => Err(ReviewTargetError::Missing),
        }
    }

    pub fn resource(&self) -> &'static str {
        match self {
            ReviewTarget::Product(_) => "product",
            ReviewTarget::Seller(_) => "seller",
        }
    }

    pub fn id(&self) -> Uuid {
        match self {
            ReviewTarget::Product(id) | ReviewTarget::Seller(id) => *id,
        }
    }
}
