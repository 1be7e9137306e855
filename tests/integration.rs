use std::env;

// This integration test is ignored by default. To run it, start the service
// with a configured store, set SERVER_URL, and run: cargo test -- --ignored

#[tokio::test]
#[ignore]
async fn smoke_register_and_admin_auth() {
    let server = env::var("SERVER_URL").expect("SERVER_URL must be set for integration test");
    let client = reqwest::Client::new();

    // Register a tester; a rerun against the same store hits the duplicate
    // email conflict instead, which is also fine for a smoke check.
    let resp = client
        .post(format!("{}/api/v1/register", server))
        .json(&serde_json::json!({
            "name": "Integration Tester",
            "email": "integration@example.com",
            "platform": "android"
        }))
        .send()
        .await
        .expect("request failed");
    assert!(resp.status().is_success() || resp.status().as_u16() == 409);

    // Missing fields are rejected
    let resp = client
        .post(format!("{}/api/v1/register", server))
        .json(&serde_json::json!({ "name": "No Email" }))
        .send()
        .await
        .expect("request failed");
    assert_eq!(resp.status().as_u16(), 400);

    // Admin endpoints reject requests without a session cookie
    let resp = client
        .get(format!("{}/api/v1/admin/testers", server))
        .send()
        .await
        .expect("request failed");
    assert_eq!(resp.status().as_u16(), 401);

    // A wrong password does not create a session
    let resp = client
        .post(format!("{}/api/v1/admin/auth", server))
        .json(&serde_json::json!({ "password": "definitely-wrong" }))
        .send()
        .await
        .expect("request failed");
    assert_eq!(resp.status().as_u16(), 401);
}

#[tokio::test]
#[ignore]
async fn smoke_register_rate_limit() {
    let server = env::var("SERVER_URL").expect("SERVER_URL must be set for integration test");
    let client = reqwest::Client::new();

    // All requests share one spoofed client key; the fourth and later ones
    // within the window must be throttled regardless of payload validity.
    let mut last_status = 0;
    for _ in 0..5 {
        let resp = client
            .post(format!("{}/api/v1/register", server))
            .header("x-forwarded-for", "203.0.113.77")
            .json(&serde_json::json!({ "name": "", "email": "", "platform": "ios" }))
            .send()
            .await
            .expect("request failed");
        last_status = resp.status().as_u16();
    }
    assert_eq!(last_status, 429);
}
