//! Integration tests for task CRUD, role rules, and the live notifications
//! REST mutations feed into connected clients.

mod common;

use std::time::Duration;

use serde_json::{json, Value};

use common::{connect_ws, next_event, start_test_server};
use taskdesk_server::auth::middleware::Role;

const EVENT_WAIT: Duration = Duration::from_secs(2);

/// Create an employee with a minted owner token, return its id.
async fn create_employee(server: &common::TestServer, email: &str) -> String {
    let client = reqwest::Client::new();
    let resp = client
        .post(format!("{}/api/owner/employees", server.base_url))
        .bearer_auth(server.token_for("owner-1", Role::Owner))
        .json(&json!({"name": "Ana", "email": email, "department": "Kitchen"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);
    let body: Value = resp.json().await.unwrap();
    body["data"]["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn task_lifecycle_with_live_notifications() {
    let server = start_test_server().await;
    let client = reqwest::Client::new();
    let owner_token = server.token_for("owner-1", Role::Owner);

    let employee_id = create_employee(&server, "ana@example.com").await;

    // Assignee online
    let (_emp_write, mut emp_read) = connect_ws(&server, &employee_id, Role::Employee).await;

    // Create
    let resp = client
        .post(format!("{}/api/tasks", server.base_url))
        .bearer_auth(&owner_token)
        .json(&json!({
            "title": "Restock bar",
            "description": "Before Friday",
            "assignedTo": employee_id,
            "priority": "high",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);
    let body: Value = resp.json().await.unwrap();
    let task_id = body["data"]["id"].as_str().unwrap().to_string();
    assert_eq!(body["data"]["status"], "pending");

    let event = next_event(&mut emp_read, EVENT_WAIT).await.expect("assignment event");
    assert_eq!(event["event"], "new-task-assigned");
    assert_eq!(event["data"]["task"]["id"], task_id.as_str());

    // Employee sees it in their list
    let emp_token = server.token_for(&employee_id, Role::Employee);
    let resp = client
        .get(format!("{}/api/employee/tasks", server.base_url))
        .bearer_auth(&emp_token)
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    // Employee updates status of their own task
    let resp = client
        .put(format!(
            "{}/api/employee/tasks/{}/status",
            server.base_url, task_id
        ))
        .bearer_auth(&emp_token)
        .json(&json!({"status": "in-progress"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["status"], "in-progress");

    let event = next_event(&mut emp_read, EVENT_WAIT).await.expect("status event");
    assert_eq!(event["event"], "task-status-updated");

    // Owner full update
    let resp = client
        .put(format!("{}/api/tasks/{}", server.base_url, task_id))
        .bearer_auth(&owner_token)
        .json(&json!({"title": "Restock bar and fridge", "priority": "medium"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let event = next_event(&mut emp_read, EVENT_WAIT).await.expect("update event");
    assert_eq!(event["event"], "task-updated");
    assert_eq!(event["data"]["task"]["title"], "Restock bar and fridge");
    // Fields not in the update survive
    assert_eq!(event["data"]["task"]["status"], "in-progress");

    // Delete
    let resp = client
        .delete(format!("{}/api/tasks/{}", server.base_url, task_id))
        .bearer_auth(&owner_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let event = next_event(&mut emp_read, EVENT_WAIT).await.expect("delete event");
    assert_eq!(event["event"], "task-deleted");
    assert_eq!(event["data"]["taskId"], task_id.as_str());

    let resp = client
        .get(format!("{}/api/tasks/{}", server.base_url, task_id))
        .bearer_auth(&owner_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn employee_cannot_touch_foreign_tasks() {
    let server = start_test_server().await;
    let client = reqwest::Client::new();
    let owner_token = server.token_for("owner-1", Role::Owner);

    let ana = create_employee(&server, "ana@example.com").await;
    let bob = create_employee(&server, "bob@example.com").await;

    let resp = client
        .post(format!("{}/api/tasks", server.base_url))
        .bearer_auth(&owner_token)
        .json(&json!({"title": "Clean station", "assignedTo": ana}))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    let task_id = body["data"]["id"].as_str().unwrap().to_string();

    // Bob cannot update Ana's task status
    let resp = client
        .put(format!(
            "{}/api/employee/tasks/{}/status",
            server.base_url, task_id
        ))
        .bearer_auth(server.token_for(&bob, Role::Employee))
        .json(&json!({"status": "completed"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);

    // Bob cannot read Ana's task
    let resp = client
        .get(format!("{}/api/tasks/{}", server.base_url, task_id))
        .bearer_auth(server.token_for(&bob, Role::Employee))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);

    // Employees cannot create tasks at all
    let resp = client
        .post(format!("{}/api/tasks", server.base_url))
        .bearer_auth(server.token_for(&ana, Role::Employee))
        .json(&json!({"title": "Nope", "assignedTo": bob}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);
}

#[tokio::test]
async fn task_requires_active_assignee() {
    let server = start_test_server().await;
    let client = reqwest::Client::new();
    let owner_token = server.token_for("owner-1", Role::Owner);

    let resp = client
        .post(format!("{}/api/tasks", server.base_url))
        .bearer_auth(&owner_token)
        .json(&json!({"title": "Ghost task", "assignedTo": "no-such-employee"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    // Deactivated employees cannot be assigned either
    let ana = create_employee(&server, "ana@example.com").await;
    let resp = client
        .delete(format!("{}/api/owner/employees/{}", server.base_url, ana))
        .bearer_auth(&owner_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let resp = client
        .post(format!("{}/api/tasks", server.base_url))
        .bearer_auth(&owner_token)
        .json(&json!({"title": "Too late", "assignedTo": ana}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn stats_overview_counts_by_status() {
    let server = start_test_server().await;
    let client = reqwest::Client::new();
    let owner_token = server.token_for("owner-1", Role::Owner);

    let ana = create_employee(&server, "ana@example.com").await;
    for title in ["One", "Two", "Three"] {
        let resp = client
            .post(format!("{}/api/tasks", server.base_url))
            .bearer_auth(&owner_token)
            .json(&json!({"title": title, "assignedTo": ana}))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 201);
    }

    let resp = client
        .get(format!("{}/api/tasks/stats/overview", server.base_url))
        .bearer_auth(&owner_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["total"], 3);
    assert_eq!(body["data"]["byStatus"]["pending"], 3);
    assert_eq!(body["data"]["byEmployee"][0]["tasks"], 3);
}
