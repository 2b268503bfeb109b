use super::ConnectorKind;
use crate::error::ConnectorError;
use std::future::Future;

/// One page in the normalized shape every adapter converts into.
///
/// `next_cursor` is opaque: an Asana offset, a Linear end cursor, a GitHub
/// `Link` URL or a Notion start cursor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_cursor: Option<String>,
}

/// Follows cursors until exhausted or `max_pages` pages were fetched.
///
/// A cursor that repeats the previous one ends the loop, so a provider
/// echoing its cursor cannot spin forever.
pub async fn collect_pages<T, F, Fut>(
    connector: ConnectorKind,
    max_pages: u32,
    mut fetch: F,
) -> Result<Vec<T>, ConnectorError>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<Page<T>, ConnectorError>>,
{
    let mut items = Vec::new();
    let mut cursor: Option<String> = None;
    let mut pages = 0_u32;

    loop {
        let page = fetch(cursor.clone()).await?;
        pages += 1;
        items.extend(page.items);

        let Some(next) = page.next_cursor else {
            break;
        };
        if cursor.as_deref() == Some(next.as_str()) {
            tracing::warn!(connector = %connector, "pagination cursor repeated; stopping");
            break;
        }
        if pages >= max_pages.max(1) {
            tracing::warn!(
                connector = %connector,
                max_pages,
                fetched = items.len(),
                "pagination limit reached before the last page"
            );
            break;
        }
        cursor = Some(next);
    }

    Ok(items)
}
