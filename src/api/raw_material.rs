use crate::{
    calc::{
        ensure_amount,
        list_query::{ListQuery, SortDirection, apply, paginate},
    },
    error::ApiError,
    model::raw_material::RawMaterial,
    utils::db_utils::{
        SqlUpdate, UpdateBuilder, execute_update, non_null, nullable, parse_patch,
    },
};
use actix_web::{HttpResponse, web};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use sqlx::MySqlPool;
use tracing::{error, info};
use utoipa::{IntoParams, ToSchema};

const MATERIAL_COLUMNS: &str = "id, name, unit, quantity, reorder_level, unit_price, supplier";

#[derive(Deserialize, Serialize, ToSchema)]
pub struct CreateRawMaterial {
    #[schema(example = "Milk cans 40L")]
    pub name: String,
    #[schema(example = "pcs")]
    pub unit: String,
    #[schema(example = 35.0)]
    pub quantity: f64,
    #[schema(example = 50.0)]
    pub reorder_level: f64,
    #[schema(example = 8500.0)]
    pub unit_price: f64,
    pub supplier: Option<String>,
}

impl CreateRawMaterial {
    fn validate(&self) -> Result<(), ApiError> {
        if self.name.trim().is_empty() || self.unit.trim().is_empty() {
            return Err(ApiError::BadRequest("name and unit are required".into()));
        }
        ensure_amount("quantity", self.quantity)?;
        ensure_amount("reorder_level", self.reorder_level)?;
        ensure_amount("unit_price", self.unit_price)?;
        Ok(())
    }
}

/// Partial update; `supplier` may be cleared with an explicit `null`.
#[derive(Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct UpdateRawMaterial {
    #[serde(default, deserialize_with = "non_null")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "non_null")]
    pub unit: Option<String>,
    #[serde(default, deserialize_with = "non_null")]
    pub quantity: Option<f64>,
    #[serde(default, deserialize_with = "non_null")]
    pub reorder_level: Option<f64>,
    #[serde(default, deserialize_with = "non_null")]
    pub unit_price: Option<f64>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>, nullable = true)]
    pub supplier: Option<Option<String>>,
}

impl UpdateRawMaterial {
    fn validate(&self) -> Result<(), ApiError> {
        for (field, value) in [("name", &self.name), ("unit", &self.unit)] {
            if value.as_deref().is_some_and(|v| v.trim().is_empty()) {
                return Err(ApiError::BadRequest(format!("{field} must not be empty")));
            }
        }
        for (field, value) in [
            ("quantity", self.quantity),
            ("reorder_level", self.reorder_level),
            ("unit_price", self.unit_price),
        ] {
            if let Some(value) = value {
                ensure_amount(field, value)?;
            }
        }
        Ok(())
    }

    fn into_update(self, material_id: u64) -> Result<SqlUpdate, ApiError> {
        self.validate()?;

        let trimmed = |v: Option<String>| v.map(|v| v.trim().to_string());

        let mut set = UpdateBuilder::default();
        set.set_if("name", trimmed(self.name))
            .set_if("unit", trimmed(self.unit))
            .set_if("quantity", self.quantity)
            .set_if("reorder_level", self.reorder_level)
            .set_if("unit_price", self.unit_price)
            .set_nullable("supplier", self.supplier.map(trimmed));
        set.build("raw_materials", "id", material_id)
    }
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RawMaterialQuery {
    /// Only materials at or below their reorder level
    pub low_stock: Option<bool>,
    /// Matches name, unit or supplier
    pub search: Option<String>,
    #[param(example = "stock_value")]
    pub sort_by: Option<String>,
    #[param(value_type = Option<String>)]
    pub direction: Option<SortDirection>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

pub(crate) async fn fetch_raw_materials(pool: &MySqlPool) -> Result<Vec<RawMaterial>, sqlx::Error> {
    let sql = format!("SELECT {MATERIAL_COLUMNS} FROM raw_materials ORDER BY name ASC");
    sqlx::query_as::<_, RawMaterial>(&sql).fetch_all(pool).await
}

/// Applies the low-stock flag, then search and sort.
pub fn select_materials(materials: &[RawMaterial], query: &RawMaterialQuery) -> Vec<RawMaterial> {
    let candidates: Vec<RawMaterial> = if query.low_stock.unwrap_or(false) {
        materials
            .iter()
            .filter(|m| m.needs_reorder())
            .cloned()
            .collect()
    } else {
        materials.to_vec()
    };

    apply(
        &candidates,
        &ListQuery {
            search: query.search.clone(),
            sort_by: query.sort_by.clone(),
            direction: query.direction.unwrap_or_default(),
        },
    )
}

#[utoipa::path(
    post,
    path = "/api/raw-materials",
    request_body = CreateRawMaterial,
    responses(
        (status = 201, description = "Material created", body = Object, example = json!({
            "message": "Raw material created successfully",
            "id": 12
        })),
        (status = 400, description = "Missing name or negative quantity")
    ),
    tag = "Inventory"
)]
pub async fn create_raw_material(
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateRawMaterial>,
) -> Result<HttpResponse, ApiError> {
    payload.validate()?;

    let result = sqlx::query(
        r#"
        INSERT INTO raw_materials (name, unit, quantity, reorder_level, unit_price, supplier)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(payload.name.trim())
    .bind(payload.unit.trim())
    .bind(payload.quantity)
    .bind(payload.reorder_level)
    .bind(payload.unit_price)
    .bind(payload.supplier.as_deref().map(str::trim))
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, name = %payload.name, "Failed to create raw material");
        ApiError::from_write(e, "A raw material with that name already exists")
    })?;

    if payload.quantity <= payload.reorder_level {
        info!(name = %payload.name, quantity = payload.quantity, "New raw material starts below reorder level");
    }

    Ok(HttpResponse::Created().json(json!({
        "message": "Raw material created successfully",
        "id": result.last_insert_id()
    })))
}

#[utoipa::path(
    get,
    path = "/api/raw-materials",
    params(RawMaterialQuery),
    responses(
        (status = 200, description = "Paginated raw material list", body = RawMaterialPage)
    ),
    tag = "Inventory"
)]
pub async fn list_raw_materials(
    pool: web::Data<MySqlPool>,
    query: web::Query<RawMaterialQuery>,
) -> Result<HttpResponse, ApiError> {
    let materials = fetch_raw_materials(pool.get_ref()).await.map_err(|e| {
        error!(error = %e, "Failed to fetch raw materials");
        ApiError::from(e)
    })?;

    let selected = select_materials(&materials, &query);
    Ok(HttpResponse::Ok().json(paginate(selected, query.page, query.per_page)))
}

#[utoipa::path(
    get,
    path = "/api/raw-materials/{material_id}",
    params(
        ("material_id" = u64, Path, description = "Raw material ID")
    ),
    responses(
        (status = 200, body = RawMaterial),
        (status = 404, description = "Raw material not found")
    ),
    tag = "Inventory"
)]
pub async fn get_raw_material(
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<HttpResponse, ApiError> {
    let material_id = path.into_inner();

    let sql = format!("SELECT {MATERIAL_COLUMNS} FROM raw_materials WHERE id = ?");
    let material = sqlx::query_as::<_, RawMaterial>(&sql)
        .bind(material_id)
        .fetch_optional(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, material_id, "Failed to fetch raw material");
            ApiError::from(e)
        })?
        .ok_or_else(|| ApiError::NotFound("Raw material not found".into()))?;

    Ok(HttpResponse::Ok().json(material))
}

#[utoipa::path(
    put,
    path = "/api/raw-materials/{material_id}",
    request_body = UpdateRawMaterial,
    params(
        ("material_id" = u64, Path, description = "Raw material ID")
    ),
    responses(
        (status = 200, description = "Raw material updated"),
        (status = 400, description = "Invalid payload"),
        (status = 404, description = "Raw material not found")
    ),
    tag = "Inventory"
)]
pub async fn update_raw_material(
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    body: web::Json<Value>,
) -> Result<HttpResponse, ApiError> {
    let material_id = path.into_inner();

    let update =
        parse_patch::<UpdateRawMaterial>(body.into_inner())?.into_update(material_id)?;
    let affected = execute_update(pool.get_ref(), update).await.map_err(|e| {
        error!(error = %e, material_id, "Failed to update raw material");
        ApiError::from_write(e, "A raw material with that name already exists")
    })?;

    if affected == 0 {
        return Err(ApiError::NotFound("Raw material not found".into()));
    }

    Ok(HttpResponse::Ok().json(json!({
        "message": "Raw material updated successfully"
    })))
}

#[utoipa::path(
    delete,
    path = "/api/raw-materials/{material_id}",
    params(
        ("material_id" = u64, Path, description = "Raw material ID")
    ),
    responses(
        (status = 200, description = "Successfully deleted"),
        (status = 404, description = "Raw material not found")
    ),
    tag = "Inventory"
)]
pub async fn delete_raw_material(
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<HttpResponse, ApiError> {
    let material_id = path.into_inner();

    let result = sqlx::query("DELETE FROM raw_materials WHERE id = ?")
        .bind(material_id)
        .execute(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, material_id, "Failed to delete raw material");
            ApiError::from(e)
        })?;

    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound("Raw material not found".into()));
    }

    Ok(HttpResponse::Ok().json(json!({
        "message": "Successfully deleted"
    })))
}
