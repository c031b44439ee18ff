mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

use common::{seed, token, TestServer, ThrottledStore, CYCLE};
use gradebook_api::types::Role;

fn grade_body(school: &common::School, student: uuid::Uuid, period: i64) -> Value {
    json!({
        "student_id": student,
        "subject_id": school.math_id,
        "course_id": school.course_id,
        "period": period,
        "cycle": CYCLE,
        "classwork": 45,
        "exam": 32.5,
        "remarks": "Buen trabajo"
    })
}

#[tokio::test]
async fn health_is_public() -> Result<()> {
    let school = seed().await;
    let server = TestServer::spawn(&school).await?;

    let response = server.client.get(server.url("/health")).send().await?;
    assert_eq!(response.status(), StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn health_reports_an_unreachable_store_as_unavailable() -> Result<()> {
    let school = seed().await;
    let store = ThrottledStore::unhealthy(school.store.clone());
    let server = TestServer::spawn_with(std::sync::Arc::new(store)).await?;

    let response = server.client.get(server.url("/health")).send().await?;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body: Value = response.json().await?;
    assert_eq!(body["code"], "SERVICE_UNAVAILABLE");
    assert_eq!(body["error"], true);
    Ok(())
}

#[tokio::test]
async fn grade_routes_require_a_token() -> Result<()> {
    let school = seed().await;
    let server = TestServer::spawn(&school).await?;

    let response = server.client.get(server.url("/api/grades")).send().await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = server
        .client
        .get(server.url("/api/grades"))
        .bearer_auth("not-a-jwt")
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body: Value = response.json().await?;
    assert_eq!(body["code"], "UNAUTHORIZED");
    Ok(())
}

#[tokio::test]
async fn teacher_registers_and_reads_back_a_grade() -> Result<()> {
    let school = seed().await;
    let server = TestServer::spawn(&school).await?;
    let jwt = token(school.teacher, Role::Teacher)?;

    let response = server
        .client
        .post(server.url("/api/grades"))
        .bearer_auth(&jwt)
        .json(&grade_body(&school, school.ana, 1))
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body: Value = response.json().await?;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["total"], 77.5);
    assert_eq!(body["data"]["recorded_by"], json!(school.teacher));

    let id = body["data"]["id"].as_str().unwrap_or_default().to_string();
    let response = server
        .client
        .get(server.url(&format!("/api/grades/{}", id)))
        .bearer_auth(&jwt)
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await?;
    assert_eq!(body["data"]["remarks"], "Buen trabajo");
    Ok(())
}

#[tokio::test]
async fn parents_cannot_register_grades() -> Result<()> {
    let school = seed().await;
    let server = TestServer::spawn(&school).await?;
    let jwt = token(uuid::Uuid::new_v4(), Role::Parent)?;

    let response = server
        .client
        .post(server.url("/api/grades"))
        .bearer_auth(&jwt)
        .json(&grade_body(&school, school.ana, 1))
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body: Value = response.json().await?;
    assert_eq!(body["code"], "FORBIDDEN");
    Ok(())
}

#[tokio::test]
async fn malformed_input_is_a_bad_request() -> Result<()> {
    let school = seed().await;
    let server = TestServer::spawn(&school).await?;
    let jwt = token(school.teacher, Role::Teacher)?;

    let response = server
        .client
        .post(server.url("/api/grades"))
        .bearer_auth(&jwt)
        .header("content-type", "application/json")
        .body("{\"student_id\": ")
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await?;
    assert_eq!(body["code"], "INVALID_JSON");

    let response = server
        .client
        .get(server.url("/api/grades/not-a-uuid"))
        .bearer_auth(&jwt)
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await?;
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert!(body["field_errors"]["id"].is_string());

    let mut out_of_range = grade_body(&school, school.ana, 1);
    out_of_range["exam"] = json!(41);
    let response = server
        .client
        .post(server.url("/api/grades"))
        .bearer_auth(&jwt)
        .json(&out_of_range)
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await?;
    assert!(body["field_errors"]["exam"].is_string());
    Ok(())
}

#[tokio::test]
async fn second_grade_for_the_same_period_conflicts() -> Result<()> {
    let school = seed().await;
    let server = TestServer::spawn(&school).await?;
    let jwt = token(school.teacher, Role::Teacher)?;

    for expected in [StatusCode::CREATED, StatusCode::CONFLICT] {
        let response = server
            .client
            .post(server.url("/api/grades"))
            .bearer_auth(&jwt)
            .json(&grade_body(&school, school.ana, 2))
            .send()
            .await?;
        assert_eq!(response.status(), expected);
        if expected == StatusCode::CONFLICT {
            let body: Value = response.json().await?;
            assert_eq!(body["code"], "DUPLICATE");
        }
    }
    Ok(())
}

#[tokio::test]
async fn unenrolled_student_cannot_be_graded() -> Result<()> {
    let school = seed().await;
    let server = TestServer::spawn(&school).await?;
    let jwt = token(school.teacher, Role::Teacher)?;

    let response = server
        .client
        .post(server.url("/api/grades"))
        .bearer_auth(&jwt)
        .json(&grade_body(&school, school.outsider, 1))
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    Ok(())
}

#[tokio::test]
async fn transcript_downloads_as_pdf() -> Result<()> {
    let school = seed().await;
    let server = TestServer::spawn(&school).await?;
    let jwt = token(school.ana, Role::Student)?;

    let response = server
        .client
        .get(server.url(&format!("/api/grades/transcript/{}/{}", school.ana, CYCLE)))
        .bearer_auth(&jwt)
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("content-type").and_then(|v| v.to_str().ok()),
        Some("application/pdf")
    );
    let disposition = response
        .headers()
        .get("content-disposition")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(disposition.contains("boleta_EST-001_2024.pdf"));
    let bytes = response.bytes().await?;
    assert!(bytes.starts_with(b"%PDF"));

    let response = server
        .client
        .get(server.url(&format!("/api/grades/transcript/{}/{}", school.outsider, CYCLE)))
        .bearer_auth(&jwt)
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn roster_requires_a_cycle() -> Result<()> {
    let school = seed().await;
    let server = TestServer::spawn(&school).await?;
    let jwt = token(school.teacher, Role::Teacher)?;
    let path = format!("/api/grades/roster/{}/{}/1", school.course_id, school.math_id);

    let response = server.client.get(server.url(&path)).bearer_auth(&jwt).send().await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = server
        .client
        .get(server.url(&format!("{}?cycle={}", path, CYCLE)))
        .bearer_auth(&jwt)
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await?;
    assert_eq!(body["data"]["total_students"], 2);
    assert_eq!(body["data"]["rows"][0]["student"]["surname"], "Álvarez");
    Ok(())
}

#[tokio::test]
async fn summary_reports_null_averages_for_ungraded_subjects() -> Result<()> {
    let school = seed().await;
    let server = TestServer::spawn(&school).await?;
    let jwt = token(school.teacher, Role::Teacher)?;

    let response = server
        .client
        .get(server.url(&format!("/api/grades/student/{}/{}", school.luis, CYCLE)))
        .bearer_auth(&jwt)
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await?;
    assert_eq!(body["data"]["total_subjects"], 2);
    assert!(body["data"]["overall_average"].is_null());
    assert!(body["data"]["subjects"][0]["average"].is_null());
    Ok(())
}
