#![allow(unused_must_use)]
//! sync-collection flows (RFC 6578).

use salvo::http::StatusCode;

use super::helpers::*;

fn sync_report(token: &str) -> String {
    format!(
        r#"<D:sync-collection xmlns:D="DAV:">
  <D:sync-token>{token}</D:sync-token>
  <D:sync-level>1</D:sync-level>
  <D:prop><D:getetag/></D:prop>
</D:sync-collection>"#
    )
}

fn extract_token(body: &str) -> String {
    body.split("<D:sync-token>")
        .nth(1)
        .and_then(|rest| rest.split("</D:sync-token>").next())
        .map(str::to_string)
        .unwrap_or_default()
}

#[test_log::test(tokio::test)]
async fn initial_then_incremental_sync_with_tombstone() {
    let app = test_app().await;
    let collection = create_calendar(&app, "work").await;
    put_ev1(&app, &collection).await;

    // Initial sync: empty token element.
    let initial = TestRequest::report(&collection)
        .xml_body(&sync_report(""))
        .send(&app.service)
        .await;
    initial.assert_status(StatusCode::MULTI_STATUS);
    let initial_body = initial.body_string();
    assert!(initial_body.contains("ev1.ics"));

    let token = extract_token(&initial_body);
    assert!(token.starts_with("urn:calcard-sync:cal:"), "token: {token}");

    // Nothing changed: incremental reply carries no event entries.
    let unchanged = TestRequest::report(&collection)
        .xml_body(&sync_report(&token))
        .send(&app.service)
        .await;
    unchanged.assert_status(StatusCode::MULTI_STATUS);
    assert!(!unchanged.body_string().contains("ev1.ics"));

    // Delete and sync again: exactly one 404 entry for the old href.
    TestRequest::delete(&format!("{collection}ev1.ics"))
        .send(&app.service)
        .await
        .assert_status(StatusCode::NO_CONTENT);

    let incremental = TestRequest::report(&collection)
        .xml_body(&sync_report(&token))
        .send(&app.service)
        .await;
    incremental.assert_status(StatusCode::MULTI_STATUS);

    let body = incremental.body_string();
    let tombstones = body
        .split("<D:response>")
        .skip(1)
        .filter(|r| r.contains("ev1.ics") && r.contains("HTTP/1.1 404 Not Found"))
        .count();
    assert_eq!(tombstones, 1, "body: {body}");

    let fresh = extract_token(&body);
    assert_ne!(fresh, token);
}

#[test_log::test(tokio::test)]
async fn recreation_clears_the_tombstone() {
    let app = test_app().await;
    let collection = create_calendar(&app, "work").await;
    put_ev1(&app, &collection).await;

    let initial = TestRequest::report(&collection)
        .xml_body(&sync_report(""))
        .send(&app.service)
        .await;
    let token = extract_token(&initial.body_string());

    // Delete, then immediately re-create the same UID.
    TestRequest::delete(&format!("{collection}ev1.ics"))
        .send(&app.service)
        .await;
    put_ev1(&app, &collection).await;

    // A client syncing across both operations sees one live entry, not
    // a 404 followed by a live entry.
    let body = TestRequest::report(&collection)
        .xml_body(&sync_report(&token))
        .send(&app.service)
        .await
        .body_string();

    assert!(!body.contains("HTTP/1.1 404 Not Found"), "body: {body}");
    let live = body
        .split("<D:response>")
        .skip(1)
        .filter(|r| r.contains("ev1.ics"))
        .count();
    assert_eq!(live, 1);
}

#[test_log::test(tokio::test)]
async fn malformed_or_foreign_token_is_403() {
    let app = test_app().await;
    let collection = create_calendar(&app, "work").await;

    let malformed = TestRequest::report(&collection)
        .xml_body(&sync_report("urn:calcard-sync:not-a-token"))
        .send(&app.service)
        .await;
    malformed.assert_status(StatusCode::FORBIDDEN);
    assert!(malformed.body_string().contains("<D:valid-sync-token/>"));

    // A token for a different collection is invalid too.
    let foreign = TestRequest::report(&collection)
        .xml_body(&sync_report("urn:calcard-sync:cal:999999:0"))
        .send(&app.service)
        .await;
    foreign.assert_status(StatusCode::FORBIDDEN);

    // A card token never fits a calendar collection.
    let wrong_kind = TestRequest::report(&collection)
        .xml_body(&sync_report("urn:calcard-sync:card:1:0"))
        .send(&app.service)
        .await;
    wrong_kind.assert_status(StatusCode::FORBIDDEN);
}

#[test_log::test(tokio::test)]
async fn ctag_moves_with_every_change() {
    let app = test_app().await;
    let collection = create_calendar(&app, "work").await;

    let ctag_of = |body: String| {
        body.split("<cs:getctag>")
            .nth(1)
            .and_then(|rest| rest.split("</cs:getctag>").next())
            .map(str::to_string)
            .unwrap_or_default()
    };

    let before = TestRequest::propfind(&collection)
        .depth("0")
        .xml_body(propfind_allprop())
        .send(&app.service)
        .await;
    let ctag_before = ctag_of(before.body_string());

    put_ev1(&app, &collection).await;

    let after = TestRequest::propfind(&collection)
        .depth("0")
        .xml_body(propfind_allprop())
        .send(&app.service)
        .await;
    let ctag_after = ctag_of(after.body_string());

    assert_ne!(ctag_before, ctag_after);
    assert!(ctag_after.parse::<i64>().unwrap() > ctag_before.parse::<i64>().unwrap());
}
