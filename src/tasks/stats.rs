//! Task statistics for the owner overview.

use axum::{extract::State, http::StatusCode, Json};
use serde_json::{json, Value};

use crate::auth::middleware::OwnerClaims;
use crate::db::{self, store};
use crate::state::AppState;

/// GET /api/tasks/stats/overview
pub async fn overview(
    State(state): State<AppState>,
    OwnerClaims(_): OwnerClaims,
) -> Result<Json<Value>, StatusCode> {
    let (counts, by_priority, by_employee) = db::with_conn(&state.db, |conn| {
        let counts =
            store::task_counts(conn, None).map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

        let mut stmt = conn
            .prepare("SELECT priority, COUNT(*) FROM tasks GROUP BY priority")
            .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
        let by_priority: Vec<(String, i64)> = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))
            .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
            .collect::<Result<_, _>>()
            .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

        let mut stmt = conn
            .prepare(
                "SELECT e.id, e.name, COUNT(t.id)
                 FROM employees e LEFT JOIN tasks t ON t.assigned_to = e.id
                 WHERE e.is_active = 1
                 GROUP BY e.id, e.name
                 ORDER BY e.name",
            )
            .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
        let by_employee: Vec<(String, String, i64)> = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))
            .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
            .collect::<Result<_, _>>()
            .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

        Ok((counts, by_priority, by_employee))
    })
    .await?;

    let priorities: Value = by_priority
        .into_iter()
        .map(|(priority, count)| (priority, json!(count)))
        .collect::<serde_json::Map<_, _>>()
        .into();

    let per_employee: Vec<Value> = by_employee
        .into_iter()
        .map(|(id, name, count)| json!({ "id": id, "name": name, "tasks": count }))
        .collect();

    Ok(Json(json!({
        "success": true,
        "data": {
            "total": counts.total,
            "byStatus": {
                "pending": counts.pending,
                "inProgress": counts.in_progress,
                "completed": counts.completed,
            },
            "byPriority": priorities,
            "byEmployee": per_employee,
        },
    })))
}
