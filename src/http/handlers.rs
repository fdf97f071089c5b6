// HTTP handlers - food catalog endpoints
//
// Path segments seed the name filter of their level; `limit`, `skip` and
// repeated `order_by` parameters build the request scope.

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::de::DeserializeOwned;

use super::error::{ApiMessage, AppError};
use super::state::AppState;
use crate::entities::{
    self, Category, CategoryFilter, NewCategory, NewSubcategory, NewUnit, Subcategory,
    SubcategoryFilter, Unit, UnitFilter,
};
use crate::filter::Filter;
use crate::scope::RequestScope;

/// Result type for handlers.
pub type HandlerResult<T> = Result<Json<T>, AppError>;

/// Query string as ordered pairs, so repeated keys survive.
type Params = Query<Vec<(String, String)>>;

/// An empty page is reported as not found.
fn non_empty<T>(rows: Vec<T>, what: &str) -> HandlerResult<Vec<T>> {
    if rows.is_empty() {
        return Err(AppError::NotFound(format!("{what} not found")));
    }
    Ok(Json(rows))
}

fn body<T: DeserializeOwned>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| AppError::BadRequest(rejection.body_text()))
}

fn deleted(entity: &str, rows: u64) -> Json<ApiMessage> {
    Json(ApiMessage::new(
        StatusCode::OK,
        format!("{entity} rows deleted {rows}"),
    ))
}

// =============================================================================
// Categories
// =============================================================================

/// GET /food/categories
pub async fn list_categories(
    State(state): State<AppState>,
    Query(params): Params,
) -> HandlerResult<Vec<Category>> {
    find_categories(state, params, CategoryFilter::default()).await
}

/// GET /food/categories/:category-name
pub async fn get_category(
    State(state): State<AppState>,
    Path(category): Path<String>,
    Query(params): Params,
) -> HandlerResult<Vec<Category>> {
    find_categories(state, params, CategoryFilter::by_name(category)).await
}

async fn find_categories(
    state: AppState,
    params: Vec<(String, String)>,
    filter: CategoryFilter,
) -> HandlerResult<Vec<Category>> {
    let scope = RequestScope::parse(params.as_slice(), filter);
    let rows = state
        .run(move |db| entities::find_categories(db, &scope))
        .await?;
    non_empty(rows, "categories")
}

/// POST /food/categories
pub async fn create_category(
    State(state): State<AppState>,
    payload: Result<Json<NewCategory>, JsonRejection>,
) -> HandlerResult<Category> {
    let new = body(payload)?;
    let created = state
        .run(move |db| entities::create_category(db, &new))
        .await?;
    Ok(Json(created))
}

/// DELETE /food/categories/:category-name
pub async fn delete_category(
    State(state): State<AppState>,
    Path(category): Path<String>,
) -> HandlerResult<ApiMessage> {
    let filter = CategoryFilter::by_name(category);
    let rows = state
        .run(move |db| entities::delete_categories(db, &filter))
        .await?;
    Ok(deleted("category", rows))
}

// =============================================================================
// Subcategories
// =============================================================================

/// GET /food/categories/:category-name/subcategories
pub async fn list_subcategories(
    State(state): State<AppState>,
    Path(category): Path<String>,
    Query(params): Params,
) -> HandlerResult<Vec<Subcategory>> {
    let filter = SubcategoryFilter::by_names(Some(&category), None);
    find_subcategories(state, params, filter).await
}

/// GET /food/categories/:category-name/subcategories/:subcategory-name
pub async fn get_subcategory(
    State(state): State<AppState>,
    Path((category, subcategory)): Path<(String, String)>,
    Query(params): Params,
) -> HandlerResult<Vec<Subcategory>> {
    let filter = SubcategoryFilter::by_names(Some(&category), Some(&subcategory));
    find_subcategories(state, params, filter).await
}

async fn find_subcategories(
    state: AppState,
    params: Vec<(String, String)>,
    filter: SubcategoryFilter,
) -> HandlerResult<Vec<Subcategory>> {
    let scope = RequestScope::parse(params.as_slice(), filter);
    let rows = state
        .run(move |db| entities::find_subcategories(db, &scope))
        .await?;
    non_empty(rows, "subcategories")
}

/// POST /food/categories/:category-name/subcategories
pub async fn create_subcategory(
    State(state): State<AppState>,
    Path(category): Path<String>,
    payload: Result<Json<NewSubcategory>, JsonRejection>,
) -> HandlerResult<Subcategory> {
    let new = body(payload)?;
    let parent = Filter::by_name(category);
    let created = state
        .run(move |db| entities::create_subcategory(db, &new, &parent))
        .await?;
    Ok(Json(created))
}

/// DELETE /food/categories/:category-name/subcategories/:subcategory-name
pub async fn delete_subcategory(
    State(state): State<AppState>,
    Path((category, subcategory)): Path<(String, String)>,
) -> HandlerResult<ApiMessage> {
    let filter = SubcategoryFilter::by_names(Some(&category), Some(&subcategory));
    let rows = state
        .run(move |db| entities::delete_subcategories(db, &filter))
        .await?;
    Ok(deleted("subcategory", rows))
}

// =============================================================================
// Units
// =============================================================================

/// GET /food/subcategories/:subcategory-name/units
pub async fn list_subcategory_units(
    State(state): State<AppState>,
    Path(subcategory): Path<String>,
    Query(params): Params,
) -> HandlerResult<Vec<Unit>> {
    let filter = UnitFilter::by_names(None, Some(&subcategory), None);
    find_units(state, params, filter).await
}

/// GET /food/subcategories/:subcategory-name/units/:unit-name
pub async fn get_subcategory_unit(
    State(state): State<AppState>,
    Path((subcategory, unit)): Path<(String, String)>,
    Query(params): Params,
) -> HandlerResult<Vec<Unit>> {
    let filter = UnitFilter::by_names(None, Some(&subcategory), Some(&unit));
    find_units(state, params, filter).await
}

/// GET /food/categories/:category-name/units
pub async fn list_category_units(
    State(state): State<AppState>,
    Path(category): Path<String>,
    Query(params): Params,
) -> HandlerResult<Vec<Unit>> {
    let filter = UnitFilter::by_names(Some(&category), None, None);
    find_units(state, params, filter).await
}

/// GET /food/categories/:category-name/units/:unit-name
pub async fn get_category_unit(
    State(state): State<AppState>,
    Path((category, unit)): Path<(String, String)>,
    Query(params): Params,
) -> HandlerResult<Vec<Unit>> {
    let filter = UnitFilter::by_names(Some(&category), None, Some(&unit));
    find_units(state, params, filter).await
}

async fn find_units(
    state: AppState,
    params: Vec<(String, String)>,
    filter: UnitFilter,
) -> HandlerResult<Vec<Unit>> {
    let scope = RequestScope::parse(params.as_slice(), filter);
    let rows = state
        .run(move |db| entities::find_units(db, &scope))
        .await?;
    non_empty(rows, "units")
}

/// POST /food/subcategories/:subcategory-name/units
pub async fn create_unit(
    State(state): State<AppState>,
    Path(subcategory): Path<String>,
    payload: Result<Json<NewUnit>, JsonRejection>,
) -> HandlerResult<Unit> {
    let new = body(payload)?;
    let parent = SubcategoryFilter::by_names(None, Some(&subcategory));
    let created = state
        .run(move |db| entities::create_unit(db, &new, &parent))
        .await?;
    Ok(Json(created))
}

/// DELETE /food/subcategories/:subcategory-name/units/:unit-name
pub async fn delete_unit(
    State(state): State<AppState>,
    Path((subcategory, unit)): Path<(String, String)>,
) -> HandlerResult<ApiMessage> {
    let filter = UnitFilter::by_names(None, Some(&subcategory), Some(&unit));
    let rows = state
        .run(move |db| entities::delete_units(db, &filter))
        .await?;
    Ok(deleted("unit", rows))
}
