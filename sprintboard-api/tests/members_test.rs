/// Project membership over HTTP: invitations, role changes, removals and
/// the owner guard.

mod common;

use axum::http::StatusCode;
use common::{RecordingMailer, TestApp, APP_URL};
use serde_json::json;

fn members_uri(project_id: &str) -> String {
    format!("/v1/projects/{}/members", project_id)
}

fn member_uri(project_id: &str, member_id: &str) -> String {
    format!("/v1/projects/{}/members/{}", project_id, member_id)
}

/// A owns P, invites B as ADMIN; B invites C as DEVELOPER; C can read but
/// not manage; B can re-role C; nobody can touch A's entry.
#[tokio::test]
async fn test_owner_admin_developer_scenario() {
    let app = TestApp::new();
    let a = app.seed_user("a@example.com", "Alice").await;
    let b = app.seed_user("b@example.com", "Bob").await;
    let c = app.seed_user("c@example.com", "Carol").await;

    let p = app.create_project(&a, "Apollo").await;
    app.invite(&p, &a, "b@example.com", "ADMIN").await;
    let c_member = app.invite(&p, &b, "c@example.com", "DEVELOPER").await;

    // C reads the member list
    let (status, body) = app.get(&members_uri(&p), &c.token).await;
    assert_eq!(status, StatusCode::OK);
    let members = body.as_array().unwrap();
    assert_eq!(members.len(), 3);
    assert_eq!(members[0]["id"], format!("owner-{}", a.user.id));
    assert_eq!(members[0]["role"], "OWNER");
    assert!(members[0]["created_at"].is_null());
    assert_eq!(members[1]["email"], "b@example.com");
    assert_eq!(members[1]["role"], "ADMIN");
    assert_eq!(members[2]["email"], "c@example.com");
    assert_eq!(members[2]["role"], "DEVELOPER");

    // C cannot invite
    let (status, body) = app
        .post(
            &members_uri(&p),
            &c.token,
            json!({ "email": "d@example.com", "role": "CLIENT" }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(
        body["message"],
        "You don't have permission to manage members of this project"
    );

    // B changes C to CLIENT
    let (status, body) = app
        .patch(&member_uri(&p, &c_member), &b.token, json!({ "role": "CLIENT" }))
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["role"], "CLIENT");
    assert_eq!(body["user_id"], c.user.id.to_string());

    // Nobody re-roles or removes A, not even A
    let owner_entry = format!("owner-{}", a.user.id);
    for actor in [&a, &b] {
        let (status, body) = app
            .patch(&member_uri(&p, &owner_entry), &actor.token, json!({ "role": "CLIENT" }))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Cannot change the owner's role");

        let (status, body) = app.delete(&member_uri(&p, &owner_entry), &actor.token).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Cannot remove the project owner");
    }

    let (status, body) = app.get(&format!("/v1/projects/{}", p), &c.token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "CLIENT");
}

#[tokio::test]
async fn test_invite_sends_invitation_email() {
    let app = TestApp::new();
    let owner = app.seed_user("owner@example.com", "Owner").await;
    let p = app.create_project(&owner, "Apollo").await;

    let (status, body) = app
        .post(
            &members_uri(&p),
            &owner.token,
            json!({ "email": "  Grace@Example.com ", "role": "DEVELOPER" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["email"], "grace@example.com");
    assert!(body["name"].is_null());

    let sent = app.mailer.wait_for(1).await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "grace@example.com");
    assert_eq!(sent[0].subject, "You've been invited to join \"Apollo\"");
    assert!(sent[0].text.contains("Owner"));
    assert!(sent[0].text.contains("Developer"));
    assert!(sent[0]
        .text
        .contains(&format!("{}/projects?project={}", APP_URL, p)));
}

#[tokio::test]
async fn test_invite_survives_mail_failure() {
    let app = TestApp::with_mailer(RecordingMailer::failing());
    let owner = app.seed_user("owner@example.com", "Owner").await;
    let p = app.create_project(&owner, "Apollo").await;

    let (status, body) = app
        .post(
            &members_uri(&p),
            &owner.token,
            json!({ "email": "x@example.com", "role": "CLIENT" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["role"], "CLIENT");
    assert_eq!(body["email"], "x@example.com");

    // The send was attempted and failed
    let attempts = app.mailer.wait_for(1).await;
    assert_eq!(attempts.len(), 1);
    assert_eq!(attempts[0].to, "x@example.com");

    let (status, body) = app.get(&members_uri(&p), &owner.token).await;
    assert_eq!(status, StatusCode::OK);
    let members = body.as_array().unwrap();
    assert_eq!(members.len(), 2);
    assert_eq!(members[1]["email"], "x@example.com");
    assert_eq!(members[1]["role"], "CLIENT");
}

#[tokio::test]
async fn test_invite_validation() {
    let app = TestApp::new();
    let owner = app.seed_user("owner@example.com", "Owner").await;
    let p = app.create_project(&owner, "Apollo").await;
    let uri = members_uri(&p);

    let cases = [
        (json!({ "role": "ADMIN" }), "Email is required"),
        (json!({ "email": "   ", "role": "ADMIN" }), "Email is required"),
        (json!({ "email": "not-an-email", "role": "ADMIN" }), "Invalid email format"),
        (
            json!({ "email": "x@example.com" }),
            "Role must be ADMIN, DEVELOPER, or CLIENT",
        ),
        (
            json!({ "email": "x@example.com", "role": "OWNER" }),
            "Role must be ADMIN, DEVELOPER, or CLIENT",
        ),
    ];

    for (body, message) in cases {
        let (status, response) = app.post(&uri, &owner.token, body.clone()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", body);
        assert_eq!(response["message"], message, "{}", body);
    }

    // Inviting the owner is refused
    let (status, body) = app
        .post(&uri, &owner.token, json!({ "email": "OWNER@example.com", "role": "ADMIN" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "The project owner cannot be invited as a member");

    assert!(app.mailer.sent().await.is_empty());
}

#[tokio::test]
async fn test_duplicate_invite_is_conflict() {
    let app = TestApp::new();
    let owner = app.seed_user("owner@example.com", "Owner").await;
    let p = app.create_project(&owner, "Apollo").await;
    app.invite(&p, &owner, "dev@example.com", "DEVELOPER").await;

    let (status, body) = app
        .post(
            &members_uri(&p),
            &owner.token,
            json!({ "email": "DEV@example.com", "role": "ADMIN" }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "User is already a member of this project");

    let (_, body) = app.get(&members_uri(&p), &owner.token).await;
    assert_eq!(body.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_developer_and_client_cannot_manage_others() {
    let app = TestApp::new();
    let owner = app.seed_user("owner@example.com", "Owner").await;
    let dev = app.seed_user("dev@example.com", "Dev").await;
    let client = app.seed_user("client@example.com", "Client").await;
    let p = app.create_project(&owner, "Apollo").await;
    let dev_member = app.invite(&p, &owner, "dev@example.com", "DEVELOPER").await;
    let client_member = app.invite(&p, &owner, "client@example.com", "CLIENT").await;

    let (status, _) = app
        .patch(&member_uri(&p, &client_member), &dev.token, json!({ "role": "ADMIN" }))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app.delete(&member_uri(&p, &dev_member), &client.token).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Promoting yourself still needs the permission
    let (status, _) = app
        .patch(&member_uri(&p, &dev_member), &dev.token, json!({ "role": "ADMIN" }))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_member_can_leave_project() {
    let app = TestApp::new();
    let owner = app.seed_user("owner@example.com", "Owner").await;
    let client = app.seed_user("client@example.com", "Client").await;
    let p = app.create_project(&owner, "Apollo").await;
    let member = app.invite(&p, &owner, "client@example.com", "CLIENT").await;

    let (status, body) = app.delete(&member_uri(&p, &member), &client.token).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(body.is_null());

    let (status, _) = app.get(&format!("/v1/projects/{}", p), &client.token).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_admin_removes_member() {
    let app = TestApp::new();
    let owner = app.seed_user("owner@example.com", "Owner").await;
    let admin = app.seed_user("admin@example.com", "Admin").await;
    let p = app.create_project(&owner, "Apollo").await;
    app.invite(&p, &owner, "admin@example.com", "ADMIN").await;
    let dev_member = app.invite(&p, &admin, "dev@example.com", "DEVELOPER").await;

    let (status, _) = app.delete(&member_uri(&p, &dev_member), &admin.token).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = app.delete(&member_uri(&p, &dev_member), &admin.token).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Member not found");
}

#[tokio::test]
async fn test_member_of_other_project_is_rejected() {
    let app = TestApp::new();
    let owner = app.seed_user("owner@example.com", "Owner").await;
    let p1 = app.create_project(&owner, "Apollo").await;
    let p2 = app.create_project(&owner, "Gemini").await;
    let p2_member = app.invite(&p2, &owner, "dev@example.com", "DEVELOPER").await;

    let (status, body) = app
        .patch(&member_uri(&p1, &p2_member), &owner.token, json!({ "role": "ADMIN" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Member does not belong to this project");

    let (status, _) = app.delete(&member_uri(&p1, &p2_member), &owner.token).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_member_refs() {
    let app = TestApp::new();
    let owner = app.seed_user("owner@example.com", "Owner").await;
    let p = app.create_project(&owner, "Apollo").await;

    for member_ref in [uuid::Uuid::new_v4().to_string(), "garbage".to_string()] {
        let (status, body) = app.delete(&member_uri(&p, &member_ref), &owner.token).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{}", member_ref);
        assert_eq!(body["message"], "Member not found");
    }

    // The member is resolved before the body is looked at
    let (status, body) = app
        .patch(
            &member_uri(&p, &uuid::Uuid::new_v4().to_string()),
            &owner.token,
            json!({ "role": "SUPERUSER" }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Member not found");

    let dev_member = app.invite(&p, &owner, "dev@example.com", "DEVELOPER").await;
    let (status, body) = app
        .patch(&member_uri(&p, &dev_member), &owner.token, json!({ "role": "SUPERUSER" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Role must be ADMIN, DEVELOPER, or CLIENT");
}

#[tokio::test]
async fn test_role_change_by_outsider_is_not_found_whatever_the_body() {
    let app = TestApp::new();
    let owner = app.seed_user("owner@example.com", "Owner").await;
    let stranger = app.seed_user("stranger@example.com", "Stranger").await;
    let p = app.create_project(&owner, "Apollo").await;
    let member = app.invite(&p, &owner, "dev@example.com", "DEVELOPER").await;
    let uri = member_uri(&p, &member);

    for body in [json!({ "role": "SUPERUSER" }), json!({}), json!({ "role": "ADMIN" })] {
        let (status, response) = app.patch(&uri, &stranger.token, body.clone()).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{}", body);
        assert_eq!(response["message"], "Project not found", "{}", body);
    }

    // Same answer for a project that does not exist
    let missing = member_uri(&uuid::Uuid::new_v4().to_string(), &member);
    let (status, body) = app
        .patch(&missing, &stranger.token, json!({ "role": "SUPERUSER" }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Project not found");

    let (_, body) = app.get(&members_uri(&p), &owner.token).await;
    assert_eq!(body[1]["role"], "DEVELOPER");
}

#[tokio::test]
async fn test_members_are_removed_with_project() {
    let app = TestApp::new();
    let owner = app.seed_user("owner@example.com", "Owner").await;
    let dev = app.seed_user("dev@example.com", "Dev").await;
    let p = app.create_project(&owner, "Apollo").await;
    app.invite(&p, &owner, "dev@example.com", "DEVELOPER").await;

    let (status, _) = app.delete(&format!("/v1/projects/{}", p), &owner.token).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = app.get("/v1/projects", &dev.token).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.as_array().unwrap().is_empty());
}
