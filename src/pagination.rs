use sea_orm::{ConnectionTrait, EntityTrait, PaginatorTrait, Select};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::error::ApiError;

/// Every listing shows this many rows per page.
pub const PAGE_SIZE: u64 = 10;

/// Query parameters shared by plain listings
#[derive(Debug, Default, Deserialize, Serialize, ToSchema, IntoParams, Validate)]
pub struct PageQuery {
    /// Page number, 1-based (default: 1)
    #[validate(range(min = 1, max = 10000))]
    pub page: Option<u64>,
}

/// One page of a listing
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u64,
    pub page_size: u64,
    pub total_items: u64,
    pub total_pages: u64,
}

/// Fetches page `page` (1-based) of `select`.
///
/// An empty listing still has a first page. Asking past the last page of
/// a non-empty listing is a 404.
pub async fn paginate<C, E, T>(conn: &C, select: Select<E>, page: u64) -> Result<Page<T>, ApiError>
where
    C: ConnectionTrait,
    E: EntityTrait,
    E::Model: Sync,
    T: From<E::Model>,
{
    let page = page.max(1);
    let paginator = select.paginate(conn, PAGE_SIZE);
    let totals = paginator.num_items_and_pages().await?;

    if totals.number_of_pages > 0 && page > totals.number_of_pages {
        warn!(
            page,
            total_pages = totals.number_of_pages,
            "Requested page is past the end"
        );
        return Err(ApiError::not_found(format!("page {page}")));
    }

    let items = paginator.fetch_page(page - 1).await?;
    debug!(page, count = items.len(), "Page fetched");

    Ok(Page {
        items: items.into_iter().map(T::from).collect(),
        page,
        page_size: PAGE_SIZE,
        total_items: totals.number_of_items,
        total_pages: totals.number_of_pages,
    })
}
