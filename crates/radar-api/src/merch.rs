use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};

use radar_types::api::{Claims, CreateMerchRequest, Created, Deleted, Merch};

use crate::error::{ApiError, ApiResult};
use crate::extract::{ApiJson, ApiPath};
use crate::state::{AppState, blocking};
use crate::validate::Checks;

pub async fn list_merch(State(state): State<AppState>) -> ApiResult<Json<Vec<Merch>>> {
    let rows = blocking(&state, |db| db.list_merch()).await?;
    Ok(Json(rows.into_iter().map(Into::into).collect()))
}

pub async fn merch_for_user(
    State(state): State<AppState>,
    ApiPath(user_id): ApiPath<i64>,
) -> ApiResult<Json<Vec<Merch>>> {
    let rows = blocking(&state, move |db| db.merch_for_user(user_id)).await?;
    Ok(Json(rows.into_iter().map(Into::into).collect()))
}

pub async fn create_merch(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiJson(req): ApiJson<CreateMerchRequest>,
) -> ApiResult<impl IntoResponse> {
    let stock = req.stock.unwrap_or(0);

    let mut checks = Checks::new();
    checks.required("product_name", &req.product_name);
    match req.price {
        None => {
            checks.fail("price", "is required");
        }
        Some(price) => {
            checks.check(
                price.is_finite() && price >= 0.0,
                "price",
                "must be a non-negative number",
            );
        }
    }
    checks.check(stock >= 0, "stock", "must be a non-negative integer");
    checks.finish()?;

    let product_name = req.product_name.trim().to_owned();
    let price = req.price.unwrap_or_default();
    let user_id = claims.sub;
    let id = blocking(&state, move |db| {
        db.insert_merch(user_id, &product_name, price, stock)
    })
    .await?;

    Ok((StatusCode::CREATED, Json(Created { id })))
}

pub async fn delete_merch(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<Json<Deleted>> {
    let item = blocking(&state, move |db| db.get_merch(id))
        .await?
        .ok_or_else(|| ApiError::not_found("Merch not found"))?;
    if item.user_id != claims.sub {
        return Err(ApiError::forbidden("Not your merch"));
    }

    let deleted = blocking(&state, move |db| db.delete_merch(id)).await?;
    Ok(Json(Deleted { deleted }))
}
