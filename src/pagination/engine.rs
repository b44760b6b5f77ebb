use serde_json::Value;
use tracing::debug;

use super::{resolve_limit, Cursor, Page, PageRequest};
use crate::config::config;
use crate::database::{Record, RecordStore, StoreError, TableDescriptor, TableId};
use crate::filter::{Filter, SortDirection};

/// Filter shared by the page and count queries: non-null ordering keys and
/// the optional inclusive date range on `order_column`.
fn base_filter(table: &'static TableDescriptor, request: &PageRequest, keys: &[&str]) -> Result<Filter, StoreError> {
    let mut filter = Filter::new(table);
    for key in keys {
        filter.where_not_null(key)?;
    }
    match (&request.start, &request.end) {
        (Some(start), Some(end)) => {
            filter.where_between(table.order_column, start, end)?;
        }
        (None, None) => {}
        _ => return Err(StoreError::InvalidRange),
    }
    Ok(filter)
}

/// Run `page` with one lookahead row and split off whether more rows exist
async fn fetch_window(
    store: &dyn RecordStore,
    mut page: Filter,
    count: &Filter,
    limit: i64,
) -> Result<(Vec<Record>, bool, i64), StoreError> {
    page.limit(limit + 1)?;
    let (mut rows, total) = store.fetch_page(&page, Some(count)).await?;
    let has_more = rows.len() as i64 > limit;
    rows.truncate(limit as usize);
    Ok((rows, has_more, total.unwrap_or_default()))
}

/// `all` mode ignores any requested limit and reports the configured default
async fn fetch_all(store: &dyn RecordStore, page: &Filter) -> Result<Page, StoreError> {
    let (rows, _) = store.fetch_page(page, None).await?;
    Ok(Page {
        total: rows.len() as i64,
        rows,
        next_cursor: None,
        limit: config().pagination.default_limit,
    })
}

/// One page of `table` ordered by its `order_column`, newest first.
///
/// `cursor` is the `order_column` value of the previous page's last row.
/// Rows sharing that value with the cursor row are not revisited, so use
/// [`fetch_paginated_composite`] when the column repeats. Ties inside a page
/// are still ordered by `secondary_order_column` when the table has one.
pub async fn fetch_paginated_data(
    store: &dyn RecordStore,
    table: TableId,
    request: &PageRequest,
    cursor: Option<&Value>,
) -> Result<Page, StoreError> {
    let descriptor = table.descriptor();
    let order = descriptor.order_column;

    let count = base_filter(descriptor, request, &[order])?;
    let mut page = count.clone();
    if let Some(cursor) = cursor {
        page.where_before(order, cursor)?;
    }
    page.order(order, SortDirection::Desc)?;
    if let Some(secondary) = descriptor.secondary_order_column {
        page.order(secondary, SortDirection::Desc)?;
    }

    if request.all {
        return fetch_all(store, &page).await;
    }

    let limit = resolve_limit(request.limit, &config().pagination)?;
    let (rows, has_more, total) = fetch_window(store, page, &count, limit).await?;
    let next_cursor = if has_more {
        rows.last().and_then(|r| r.get(order)).cloned().map(Cursor::Scalar)
    } else {
        None
    };

    debug!(table = descriptor.name, rows = rows.len(), total, has_more, "Fetched page");
    Ok(Page { rows, next_cursor, total, limit })
}

/// One page of `table` ordered by `(order_column, secondary_order_column)`,
/// both descending. The pair gives a total order, so traversal neither
/// repeats nor skips rows that share a date.
///
/// `cursor_date` and `cursor_id` must be supplied together.
pub async fn fetch_paginated_composite(
    store: &dyn RecordStore,
    table: TableId,
    request: &PageRequest,
    cursor_date: Option<&Value>,
    cursor_id: Option<&Value>,
) -> Result<Page, StoreError> {
    let descriptor = table.descriptor();
    let order = descriptor.order_column;
    let secondary = descriptor
        .secondary_order_column
        .ok_or(StoreError::MissingSecondaryOrder(descriptor.name))?;

    let count = base_filter(descriptor, request, &[order, secondary])?;
    let mut page = count.clone();
    match (cursor_date, cursor_id) {
        (Some(date), Some(id)) => {
            page.where_before_composite(order, date, secondary, id)?;
        }
        (None, None) => {}
        _ => return Err(StoreError::InvalidCursor),
    }
    page.order(order, SortDirection::Desc)?
        .order(secondary, SortDirection::Desc)?;

    if request.all {
        return fetch_all(store, &page).await;
    }

    let limit = resolve_limit(request.limit, &config().pagination)?;
    let (rows, has_more, total) = fetch_window(store, page, &count, limit).await?;
    let next_cursor = if has_more {
        rows.last().and_then(|r| {
            Some(Cursor::Composite {
                date: r.get(order)?.clone(),
                id: r.get(secondary)?.clone(),
            })
        })
    } else {
        None
    };

    debug!(table = descriptor.name, rows = rows.len(), total, has_more, "Fetched composite page");
    Ok(Page { rows, next_cursor, total, limit })
}
