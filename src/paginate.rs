//! Drives a paginated endpoint to completion.
//!
//! Each page's continuation marker depends on the previous page, so pages are
//! fetched strictly one after another and folded into a single [`Response`]
//! in server order.

use std::future::Future;
use tracing::debug;
use crate::{
    combine::Combine,
    response::Response,
    transport::{Request, Transport},
};

/// A request that can produce the request for the following page.
pub trait Paginated: Request {
    /// Returns the request for the next page, or `None` when `response`
    /// failed or reports that no pages remain.
    fn next_request(&self, response: &Response<Self::Output>) -> Option<Self>;
}

/// Issues `initial` and every follow-up request through `execute`, merging
/// the responses.
///
/// Stops after the first failed page; the result then carries that failure
/// and the metadata of every page fetched so far.
pub async fn paginate<R, F, Fut>(mut execute: F, initial: R) -> Response<R::Output>
    where
        R: Paginated,
        R::Output: Combine,
        F: FnMut(R) -> Fut,
        Fut: Future<Output=Response<R::Output>>,
{
    let mut page = 1usize;
    let mut merged = execute(initial.clone()).await;
    let mut next = initial.next_request(&merged);
    debug!(operation = R::OPERATION, page, ok = merged.is_ok(), more = next.is_some(), "fetched page");

    while let Some(request) = next {
        page += 1;
        let response = execute(request.clone()).await;
        next = request.next_request(&response);
        debug!(operation = R::OPERATION, page, ok = response.is_ok(), more = next.is_some(), "fetched page");

        merged = merged.combine(response);
    }

    merged
}

/// [`paginate`] with `transport` as the executor.
pub async fn run_all<R>(transport: &dyn Transport, initial: R) -> Response<R::Output>
    where R: Paginated, R::Output: Combine {
    paginate(|request: R| request.send(transport), initial).await
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};
    use rstest::rstest;
    use super::*;
    use crate::response::{ApiError, Metadata};

    /// A cursor over an in-memory list of pages.
    #[derive(Debug, Clone)]
    struct PageRequest {
        page: usize,
    }

    #[derive(Debug, Clone, PartialEq)]
    struct Page {
        items: Vec<u32>,
        next: Option<usize>,
    }

    impl Combine for Page {
        fn combine(self, later: Self) -> Self {
            Self {
                items: self.items.combine(later.items),
                next: later.next,
            }
        }
    }

    #[async_trait::async_trait]
    impl Request for PageRequest {
        type Output = Page;
        const OPERATION: &'static str = "ListPages";

        async fn send(self, _transport: &dyn Transport) -> Response<Self::Output> {
            unimplemented!("pages are served by the test executor")
        }
    }

    impl Paginated for PageRequest {
        fn next_request(&self, response: &Response<Page>) -> Option<Self> {
            let page = response.value()?.next?;
            Some(Self { page })
        }
    }

    /// Serves `count` pages of two items each, failing the page at `fail_at`.
    fn pages(count: usize, fail_at: Option<usize>) -> impl FnMut(PageRequest) -> std::future::Ready<Response<Page>> {
        move |request: PageRequest| {
            let n = request.page;
            let metadata = Metadata::single("ListPages", Some(format!("req-{n}")));
            let response = if fail_at == Some(n) {
                Response::fail(metadata, ApiError::new(format!("page {n} failed")))
            } else {
                let first = (n as u32 - 1) * 2;
                Response::ok(metadata, Page {
                    items: vec![first, first + 1],
                    next: (n < count).then_some(n + 1),
                })
            };
            std::future::ready(response)
        }
    }

    fn request_ids(response: &Response<Page>) -> Vec<String> {
        response.metadata.requests.iter()
            .filter_map(|r| r.request_id.clone())
            .collect()
    }

    #[tokio::test]
    async fn single_page() {
        let response = paginate(pages(1, None), PageRequest { page: 1 }).await;

        assert_eq!(response.outcome, Ok(Page { items: vec![0, 1], next: None }));
        assert_eq!(response.pages(), 1);
    }

    #[tokio::test]
    async fn concatenates_pages_in_order() {
        let response = paginate(pages(4, None), PageRequest { page: 1 }).await;

        assert_eq!(request_ids(&response), ["req-1", "req-2", "req-3", "req-4"]);
        assert_eq!(response.outcome.unwrap().items, (0..8).collect::<Vec<_>>());
    }

    #[rstest]
    #[case(1)]
    #[case(2)]
    #[case(3)]
    #[tokio::test]
    async fn failing_page_ends_the_run(#[case] fail_at: usize) {
        let issued = Arc::new(Mutex::new(Vec::new()));
        let mut serve = pages(3, Some(fail_at));
        let log = Arc::clone(&issued);
        let execute = move |request: PageRequest| {
            log.lock().unwrap().push(request.page);
            serve(request)
        };

        let response = paginate(execute, PageRequest { page: 1 }).await;

        assert_eq!(response.outcome, Err(ApiError::new(format!("page {fail_at} failed"))));
        let expected: Vec<_> = (1..=fail_at).map(|n| format!("req-{n}")).collect();
        assert_eq!(request_ids(&response), expected);
        assert_eq!(*issued.lock().unwrap(), (1..=fail_at).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn long_runs_do_not_recurse() {
        let response = paginate(pages(10_000, None), PageRequest { page: 1 }).await;

        assert_eq!(response.pages(), 10_000);
        assert_eq!(response.outcome.unwrap().items.len(), 20_000);
    }
}
