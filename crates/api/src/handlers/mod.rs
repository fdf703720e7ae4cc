//! HTTP handlers, one module per resource.

pub mod auth;
pub mod room;
pub mod room_review;
pub mod session;
pub mod user;

use hotel_core::filter::ListFilter;

use crate::error::AppResult;

/// Turn raw list query parameters into a [`ListFilter`].
///
/// Unknown keys are kept as exact-match filters and rejected later against
/// the entity's allow-list.
pub(crate) fn list_filter(params: Vec<(String, String)>) -> AppResult<ListFilter> {
    Ok(ListFilter::from_params(params)?)
}
