//! REST resource for managing tutors.
//!
//! Every operation runs inside one unit of work that is committed only when
//! the whole operation succeeds; an early `?` return drops it and rolls back.

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use tracing::{debug, instrument};

use crate::error::{ApiError, Rejection};
use crate::repository::Database;
use crate::server::AppState;
use crate::tutor::{Tutor, ENTITY_NAME};

/// Routes relative to the `/api` prefix.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/tutors",
            get(get_all_tutors).post(create_tutor).put(update_tutor),
        )
        .route("/tutors/:id", get(get_tutor).delete(delete_tutor))
}

/// Persist a tutor that has never been saved.
pub async fn create(db: &dyn Database, tutor: Tutor) -> Result<Tutor, ApiError> {
    if !tutor.is_new() {
        return Err(ApiError::IdExists);
    }

    let mut uow = db.begin().await?;
    let result = uow.save(tutor).await?;
    uow.commit().await?;
    Ok(result)
}

/// Fully replace an existing tutor.
pub async fn update(db: &dyn Database, tutor: Tutor) -> Result<Tutor, ApiError> {
    let id = tutor.id.ok_or(ApiError::IdNull)?;

    let mut uow = db.begin().await?;
    let result = uow.update(tutor).await?.ok_or(ApiError::NotFound(id))?;
    uow.commit().await?;
    Ok(result)
}

/// Every stored tutor, ascending by id.
pub async fn find_all(db: &dyn Database) -> Result<Vec<Tutor>, ApiError> {
    let mut uow = db.begin().await?;
    let tutors = uow.find_all().await?;
    uow.commit().await?;
    Ok(tutors)
}

/// One tutor, or `NotFound`.
pub async fn find_one(db: &dyn Database, id: i64) -> Result<Tutor, ApiError> {
    let mut uow = db.begin().await?;
    let tutor = uow.find_by_id(id).await?.ok_or(ApiError::NotFound(id))?;
    uow.commit().await?;
    Ok(tutor)
}

/// Delete without checking that the tutor exists.
pub async fn delete(db: &dyn Database, id: i64) -> Result<(), ApiError> {
    let mut uow = db.begin().await?;
    uow.delete_by_id(id).await?;
    uow.commit().await?;
    Ok(())
}

/// `POST /tutors`: 201 with the new tutor and its location.
#[instrument(skip(state))]
async fn create_tutor(
    State(state): State<AppState>,
    Json(tutor): Json<Tutor>,
) -> Result<Response, Rejection> {
    debug!("REST request to save Tutor : {:?}", tutor);
    let result = create(state.db.as_ref(), tutor)
        .await
        .map_err(|e| state.reject(e))?;

    let mut response = (StatusCode::CREATED, Json(&result)).into_response();
    if let Some(id) = result.id {
        let headers = response.headers_mut();
        headers.extend(state.headers.entity_created(ENTITY_NAME, id));
        if let Ok(location) = format!("/api/tutors/{}", id).parse() {
            headers.insert(header::LOCATION, location);
        }
    }
    Ok(response)
}

/// `PUT /tutors`: 200 with the replaced tutor.
#[instrument(skip(state))]
async fn update_tutor(
    State(state): State<AppState>,
    Json(tutor): Json<Tutor>,
) -> Result<Response, Rejection> {
    debug!("REST request to update Tutor : {:?}", tutor);
    let result = update(state.db.as_ref(), tutor)
        .await
        .map_err(|e| state.reject(e))?;

    let alerts = result
        .id
        .map(|id| state.headers.entity_updated(ENTITY_NAME, id))
        .unwrap_or_default();
    Ok((StatusCode::OK, alerts, Json(result)).into_response())
}

/// `GET /tutors`: every tutor, unpaginated.
#[instrument(skip(state))]
async fn get_all_tutors(State(state): State<AppState>) -> Result<Json<Vec<Tutor>>, Rejection> {
    debug!("REST request to get all Tutors");
    let tutors = find_all(state.db.as_ref())
        .await
        .map_err(|e| state.reject(e))?;
    Ok(Json(tutors))
}

/// `GET /tutors/:id`: the tutor, or 404.
#[instrument(skip(state))]
async fn get_tutor(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Tutor>, Rejection> {
    debug!("REST request to get Tutor : {}", id);
    let tutor = find_one(state.db.as_ref(), id)
        .await
        .map_err(|e| state.reject(e))?;
    Ok(Json(tutor))
}

/// `DELETE /tutors/:id`: 204 whether or not the tutor existed.
#[instrument(skip(state))]
async fn delete_tutor(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Response, Rejection> {
    debug!("REST request to delete Tutor : {}", id);
    delete(state.db.as_ref(), id)
        .await
        .map_err(|e| state.reject(e))?;

    Ok((
        StatusCode::NO_CONTENT,
        state.headers.entity_deleted(ENTITY_NAME, id),
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::InMemoryDatabase;

    #[tokio::test]
    async fn test_create_rejects_existing_id() {
        let db = InMemoryDatabase::new();
        let err = create(&db, Tutor::new("Alice").with_id(5)).await.unwrap_err();
        assert!(matches!(err, ApiError::IdExists));
        assert!(find_all(&db).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_requires_id() {
        let db = InMemoryDatabase::new();
        let err = update(&db, Tutor::new("Alice")).await.unwrap_err();
        assert!(matches!(err, ApiError::IdNull));
    }

    #[tokio::test]
    async fn test_update_of_unknown_id_creates_nothing() {
        let db = InMemoryDatabase::new();
        let err = update(&db, Tutor::new("Alice").with_id(3)).await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound(3)));
        assert!(find_all(&db).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_full_lifecycle() {
        let db = InMemoryDatabase::new();

        let created = create(&db, Tutor::new("Alice")).await.unwrap();
        assert_eq!(created.id, Some(1));
        assert_eq!(find_all(&db).await.unwrap(), vec![created.clone()]);

        let replaced = update(&db, Tutor::new("Alicia").with_id(1).with_email("a@b.c"))
            .await
            .unwrap();
        assert_eq!(find_one(&db, 1).await.unwrap(), replaced);

        delete(&db, 1).await.unwrap();
        assert!(matches!(find_one(&db, 1).await, Err(ApiError::NotFound(1))));
        // deleting again is still fine
        delete(&db, 1).await.unwrap();
    }
}
