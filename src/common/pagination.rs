use std::future::Future;

/// One page of a paginated listing.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Page<T, K> {
    pub(crate) items: Vec<T>,
    /// Continuation marker; `None` on the last page.
    pub(crate) next: Option<K>,
}

impl<T, K> Page<T, K> {
    pub(crate) fn new(items: Vec<T>, next: Option<K>) -> Self {
        Self { items, next }
    }
}

/// Fetch every page into a single list, in server order.
///
/// The first failing page aborts the listing and nothing fetched so far is returned.
/// With a `limit`, paging stops once that many items are held and the result is cut to it.
pub(crate) async fn drain<T, K, E, F, Fut>(mut fetch: F, limit: Option<usize>) -> Result<Vec<T>, E>
where
    F: FnMut(Option<K>) -> Fut,
    Fut: Future<Output = Result<Page<T, K>, E>>,
{
    let mut items = Vec::new();
    let mut token = None;
    loop {
        let page = fetch(token.take()).await?;
        items.extend(page.items);
        if let Some(limit) = limit {
            if items.len() >= limit {
                items.truncate(limit);
                break;
            }
        }
        match page.next {
            Some(next) => token = Some(next),
            None => break,
        }
    }
    Ok(items)
}
