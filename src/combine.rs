/// Results that can be assembled from consecutive pages.
///
/// `combine` receives the earlier page as `self` and the page fetched after
/// it as `later`. Lists are appended in order and continuation fields take
/// the value from `later`. The pagination driver only ever folds left in
/// request order, so implementations must be associative but need not be
/// commutative.
pub trait Combine {
    fn combine(self, later: Self) -> Self;
}

impl<T> Combine for Vec<T> {
    fn combine(mut self, later: Self) -> Self {
        self.extend(later);
        self
    }
}
