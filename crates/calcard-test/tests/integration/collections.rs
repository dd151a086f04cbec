#![allow(unused_must_use)]
//! Collection lifecycle: MKCALENDAR, MKCOL, PROPPATCH, slug rules.

use salvo::http::StatusCode;

use super::helpers::*;

#[test_log::test(tokio::test)]
async fn mkcalendar_then_home_listing() {
    let app = test_app().await;

    let location = create_calendar(&app, "work").await;
    assert!(location.starts_with("/dav/calendars/"));
    assert!(location.ends_with('/'));

    let listing = TestRequest::propfind("/dav/calendars/")
        .depth("1")
        .xml_body(propfind_allprop())
        .send(&app.service)
        .await;
    listing.assert_status(StatusCode::MULTI_STATUS);

    let body = listing.body_string();
    assert!(body.contains(&location), "body: {body}");
    // The virtual birthday calendar is always listed.
    assert!(body.contains("/dav/calendars/-1/"));
    assert!(body.contains("<D:displayname>Birthdays</D:displayname>"));
}

#[test_log::test(tokio::test)]
async fn mkcalendar_with_body_sets_properties() {
    let app = test_app().await;

    let body = r#"<?xml version="1.0"?>
<C:mkcalendar xmlns:D="DAV:" xmlns:C="urn:ietf:params:xml:ns:caldav">
  <D:set><D:prop>
    <D:displayname>Work things</D:displayname>
    <C:calendar-description>projects and meetings</C:calendar-description>
  </D:prop></D:set>
</C:mkcalendar>"#;

    let response = TestRequest::mkcalendar("/dav/calendars/work")
        .xml_body(body)
        .send(&app.service)
        .await;
    response.assert_status(StatusCode::CREATED);
    let location = response.header("location").expect("location").to_string();

    let props = TestRequest::propfind(&location)
        .depth("0")
        .xml_body(propfind_allprop())
        .send(&app.service)
        .await;
    let body = props.body_string();
    assert!(body.contains("<D:displayname>Work things</D:displayname>"));
    assert!(body.contains("projects and meetings"));
}

#[test_log::test(tokio::test)]
async fn duplicate_mkcalendar_is_conflict() {
    let app = test_app().await;
    create_calendar(&app, "work").await;

    let response = TestRequest::mkcalendar("/dav/calendars/Work")
        .send(&app.service)
        .await;
    response.assert_status(StatusCode::CONFLICT);
}

#[test_log::test(tokio::test)]
async fn numeric_mkcalendar_segment_is_rejected() {
    let app = test_app().await;
    let response = TestRequest::mkcalendar("/dav/calendars/2024")
        .send(&app.service)
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[test_log::test(tokio::test)]
async fn nested_mkcalendar_is_rejected() {
    let app = test_app().await;
    let collection = create_calendar(&app, "work").await;

    let response = TestRequest::mkcalendar(&format!("{collection}inner"))
        .send(&app.service)
        .await;
    response.assert_status(StatusCode::METHOD_NOT_ALLOWED);
}

#[test_log::test(tokio::test)]
async fn ambiguous_slug_is_conflict() {
    let app = test_app().await;
    create_calendar(&app, "work").await;

    // A same-slug calendar shared in from another user.
    let other_user = app.memory.add_user("other@example.com");
    let other_calendar = app
        .store
        .calendars
        .create(calcard_store::NewCalendar {
            owner_id: other_user.id,
            name: "Their work".to_string(),
            slug: Some("work".to_string()),
            description: None,
            timezone: None,
        })
        .await
        .expect("create shared calendar");
    app.memory
        .share_calendar(other_calendar.id, app.user.id, false, false);

    let response = TestRequest::propfind("/dav/calendars/work/")
        .depth("0")
        .xml_body(propfind_allprop())
        .send(&app.service)
        .await;
    response.assert_status(StatusCode::CONFLICT);
}

#[test_log::test(tokio::test)]
async fn proppatch_updates_and_403s_read_only() {
    let app = test_app().await;
    let collection = create_calendar(&app, "work").await;

    let body = r#"<?xml version="1.0"?>
<D:propertyupdate xmlns:D="DAV:" xmlns:C="urn:ietf:params:xml:ns:caldav">
  <D:set><D:prop>
    <D:displayname>Renamed</D:displayname>
    <C:supported-calendar-component-set>VEVENT</C:supported-calendar-component-set>
  </D:prop></D:set>
</D:propertyupdate>"#;

    let response = TestRequest::proppatch(&collection)
        .xml_body(body)
        .send(&app.service)
        .await;
    response.assert_status(StatusCode::MULTI_STATUS);

    let reply = response.body_string();
    assert!(reply.contains("HTTP/1.1 200 OK"));
    assert!(reply.contains("HTTP/1.1 403 Forbidden"));

    let props = TestRequest::propfind(&collection)
        .depth("0")
        .xml_body(propfind_allprop())
        .send(&app.service)
        .await;
    assert!(props.body_string().contains("<D:displayname>Renamed</D:displayname>"));
}

#[test_log::test(tokio::test)]
async fn shared_reader_cannot_proppatch_or_put() {
    let app = test_app().await;

    // A calendar owned by someone else, shared read-only to our user.
    let owner = app.memory.add_user("owner@example.com");
    let calendar = app
        .store
        .calendars
        .create(calcard_store::NewCalendar {
            owner_id: owner.id,
            name: "Shared".to_string(),
            slug: Some("shared".to_string()),
            description: None,
            timezone: None,
        })
        .await
        .expect("create calendar");
    app.memory.share_calendar(calendar.id, app.user.id, false, false);

    let put = TestRequest::put(&format!("/dav/calendars/{}/ev1.ics", calendar.id))
        .icalendar_body(EV1)
        .send(&app.service)
        .await;
    put.assert_status(StatusCode::FORBIDDEN);

    let proppatch = TestRequest::proppatch(&format!("/dav/calendars/{}/", calendar.id))
        .xml_body(
            r#"<D:propertyupdate xmlns:D="DAV:"><D:set><D:prop>
<D:displayname>Hijacked</D:displayname></D:prop></D:set></D:propertyupdate>"#,
        )
        .send(&app.service)
        .await;
    proppatch.assert_status(StatusCode::FORBIDDEN);
}

#[test_log::test(tokio::test)]
async fn mkcol_creates_addressbook() {
    let app = test_app().await;

    TestRequest::mkcol("/dav/addressbooks/contacts")
        .send(&app.service)
        .await
        .assert_status(StatusCode::CREATED);

    let listing = TestRequest::propfind("/dav/addressbooks/")
        .depth("1")
        .xml_body(propfind_allprop())
        .send(&app.service)
        .await;
    listing.assert_status(StatusCode::MULTI_STATUS);
    let body = listing.body_string();
    assert!(body.contains("<D:displayname>contacts</D:displayname>"), "body: {body}");
    assert!(body.contains("addressbook"));
}
