#![allow(unused_must_use)]
//! The virtual birthday calendar.

use salvo::http::StatusCode;

use super::helpers::*;

const ALICE: &str =
    "BEGIN:VCARD\r\nVERSION:4.0\r\nUID:alice-1\r\nFN:Alice Doe\r\nBDAY:19900315\r\nEND:VCARD\r\n";

async fn seed_contact(app: &TestApp) {
    TestRequest::mkcol("/dav/addressbooks/contacts")
        .send(&app.service)
        .await
        .assert_status(StatusCode::CREATED);
    let book = app
        .store
        .addressbooks
        .list_by_user(app.user.id)
        .await
        .expect("list books")
        .remove(0);
    TestRequest::put(&format!("/dav/addressbooks/{}/alice-1.vcf", book.id))
        .vcard_body(ALICE)
        .send(&app.service)
        .await
        .assert_status(StatusCode::CREATED);
}

#[test_log::test(tokio::test)]
async fn lists_synthesized_birthday_events() {
    let app = test_app().await;
    seed_contact(&app).await;

    let listing = TestRequest::propfind("/dav/calendars/-1/")
        .depth("1")
        .xml_body(propfind_allprop())
        .send(&app.service)
        .await;
    listing.assert_status(StatusCode::MULTI_STATUS);

    let body = listing.body_string();
    assert!(
        body.contains("/dav/calendars/-1/birthday-alice-1.ics"),
        "body: {body}"
    );
}

#[test_log::test(tokio::test)]
async fn birthday_event_body_is_yearly_and_transparent() {
    let app = test_app().await;
    seed_contact(&app).await;

    let response = TestRequest::get("/dav/calendars/-1/birthday-alice-1.ics")
        .send(&app.service)
        .await;
    response.assert_status(StatusCode::OK);

    let body = response.body_string();
    assert!(body.contains("UID:birthday-alice-1@calcard"));
    assert!(body.contains("RRULE:FREQ=YEARLY"));
    assert!(body.contains("TRANSP:TRANSPARENT"));
    assert!(body.contains("Alice Doe's birthday ("));
}

#[test_log::test(tokio::test)]
async fn birthday_calendar_is_read_only() {
    let app = test_app().await;
    seed_contact(&app).await;

    let put = TestRequest::put("/dav/calendars/-1/anything.ics")
        .icalendar_body(EV1)
        .send(&app.service)
        .await;
    put.assert_status(StatusCode::FORBIDDEN);

    let delete = TestRequest::delete("/dav/calendars/-1/birthday-alice-1.ics")
        .send(&app.service)
        .await;
    delete.assert_status(StatusCode::FORBIDDEN);
}

#[test_log::test(tokio::test)]
async fn birthday_sync_token_is_stable() {
    let app = test_app().await;
    seed_contact(&app).await;

    let report = r#"<D:sync-collection xmlns:D="DAV:">
  <D:sync-token/>
  <D:prop><D:getetag/></D:prop>
</D:sync-collection>"#;

    let response = TestRequest::report("/dav/calendars/-1/")
        .xml_body(report)
        .send(&app.service)
        .await;
    response.assert_status(StatusCode::MULTI_STATUS);

    // updated_at pinned to the epoch keeps the token stable.
    assert!(
        response
            .body_string()
            .contains("<D:sync-token>urn:calcard-sync:cal:-1:0</D:sync-token>")
    );
}

#[test_log::test(tokio::test)]
async fn birthday_query_matches_time_range() {
    let app = test_app().await;
    seed_contact(&app).await;

    // A window certain to include the next birthday occurrence.
    let now = chrono::Utc::now();
    let start = now.format("%Y%m%dT000000Z").to_string();
    let end = (now + chrono::Duration::days(400))
        .format("%Y%m%dT000000Z")
        .to_string();

    let report = format!(
        r#"<C:calendar-query xmlns:D="DAV:" xmlns:C="urn:ietf:params:xml:ns:caldav">
  <D:prop><D:getetag/><C:calendar-data/></D:prop>
  <C:filter>
    <C:comp-filter name="VCALENDAR">
      <C:comp-filter name="VEVENT">
        <C:time-range start="{start}" end="{end}"/>
      </C:comp-filter>
    </C:comp-filter>
  </C:filter>
</C:calendar-query>"#
    );

    let response = TestRequest::report("/dav/calendars/-1/")
        .xml_body(&report)
        .send(&app.service)
        .await;
    response.assert_status(StatusCode::MULTI_STATUS);
    assert!(response.body_string().contains("birthday-alice-1.ics"));
}
