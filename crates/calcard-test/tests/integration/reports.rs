#![allow(unused_must_use)]
//! REPORT flows: calendar-query, multiget, calendar-data projection,
//! free-busy, and addressbook reports.

use salvo::http::StatusCode;

use super::helpers::*;

fn time_range_query(start: &str, end: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<C:calendar-query xmlns:D="DAV:" xmlns:C="urn:ietf:params:xml:ns:caldav">
  <D:prop><D:getetag/><C:calendar-data/></D:prop>
  <C:filter>
    <C:comp-filter name="VCALENDAR">
      <C:comp-filter name="VEVENT">
        <C:time-range start="{start}" end="{end}"/>
      </C:comp-filter>
    </C:comp-filter>
  </C:filter>
</C:calendar-query>"#
    )
}

#[test_log::test(tokio::test)]
async fn calendar_query_time_range_filters() {
    let app = test_app().await;
    let collection = create_calendar(&app, "work").await;
    put_ev1(&app, &collection).await;

    let hit = TestRequest::report(&collection)
        .depth("1")
        .xml_body(&time_range_query("20240601T000000Z", "20240630T235959Z"))
        .send(&app.service)
        .await;
    hit.assert_status(StatusCode::MULTI_STATUS);
    assert!(hit.body_string().contains("ev1.ics"), "body: {}", hit.body_string());

    let miss = TestRequest::report(&collection)
        .depth("1")
        .xml_body(&time_range_query("20240701T000000Z", "20240731T000000Z"))
        .send(&app.service)
        .await;
    miss.assert_status(StatusCode::MULTI_STATUS);
    assert!(!miss.body_string().contains("ev1.ics"));
}

#[test_log::test(tokio::test)]
async fn calendar_data_is_cdata_with_crlf() {
    let app = test_app().await;
    let collection = create_calendar(&app, "work").await;
    put_ev1(&app, &collection).await;

    let response = TestRequest::report(&collection)
        .depth("1")
        .xml_body(&time_range_query("20240601T000000Z", "20240630T235959Z"))
        .send(&app.service)
        .await;

    let body = response.body_string();
    assert!(body.contains("<![CDATA[BEGIN:VCALENDAR\r\n"), "body: {body}");
    assert!(!body.contains("&#13;"));
}

#[test_log::test(tokio::test)]
async fn multiget_keeps_input_order_with_404s() {
    let app = test_app().await;
    let collection = create_calendar(&app, "work").await;
    put_ev1(&app, &collection).await;

    let missing = format!("{collection}ghost.ics");
    let present = format!("{collection}ev1.ics");
    let report = format!(
        r#"<C:calendar-multiget xmlns:D="DAV:" xmlns:C="urn:ietf:params:xml:ns:caldav">
  <D:prop><D:getetag/></D:prop>
  <D:href>{missing}</D:href>
  <D:href>{present}</D:href>
</C:calendar-multiget>"#
    );

    let response = TestRequest::report(&collection)
        .xml_body(&report)
        .send(&app.service)
        .await;
    response.assert_status(StatusCode::MULTI_STATUS);

    let body = response.body_string();
    let responses: Vec<&str> = body.split("<D:response>").skip(1).collect();
    assert_eq!(responses.len(), 2);
    assert!(responses[0].contains(&missing));
    assert!(responses[0].contains("HTTP/1.1 404 Not Found"));
    assert!(responses[1].contains(&present));
    assert!(responses[1].contains("HTTP/1.1 200 OK"));
}

#[test_log::test(tokio::test)]
async fn calendar_data_projection_keeps_uid_only() {
    let app = test_app().await;
    let collection = create_calendar(&app, "work").await;
    put_ev1(&app, &collection).await;

    let report = r#"<C:calendar-query xmlns:D="DAV:" xmlns:C="urn:ietf:params:xml:ns:caldav">
  <D:prop>
    <C:calendar-data>
      <C:comp name="VCALENDAR">
        <C:prop name="VERSION"/>
        <C:comp name="VEVENT"><C:prop name="UID"/></C:comp>
      </C:comp>
    </C:calendar-data>
  </D:prop>
  <C:filter><C:comp-filter name="VCALENDAR"/></C:filter>
</C:calendar-query>"#;

    let response = TestRequest::report(&collection)
        .xml_body(report)
        .send(&app.service)
        .await;
    response.assert_status(StatusCode::MULTI_STATUS);

    let body = response.body_string();
    assert!(body.contains("UID:ev1\r\n"), "body: {body}");
    assert!(!body.contains("SUMMARY"));
    assert!(!body.contains("DTSTART"));
    assert!(body.contains("BEGIN:VEVENT"));
    assert!(body.contains("END:VCALENDAR"));
}

#[test_log::test(tokio::test)]
async fn free_busy_query_returns_calendar_body() {
    let app = test_app().await;
    let collection = create_calendar(&app, "work").await;
    put_ev1(&app, &collection).await;

    let report = r#"<C:free-busy-query xmlns:C="urn:ietf:params:xml:ns:caldav">
  <C:time-range start="20240601T000000Z" end="20240630T235959Z"/>
</C:free-busy-query>"#;

    let response = TestRequest::report(&collection)
        .xml_body(report)
        .send(&app.service)
        .await;
    response.assert_status(StatusCode::OK);
    assert!(
        response
            .header("content-type")
            .unwrap_or_default()
            .starts_with("text/calendar")
    );
    let body = response.body_string();
    assert!(body.contains("BEGIN:VFREEBUSY"));
    assert!(body.contains("FREEBUSY:20240601T100000Z/20240601T110000Z"));
}

#[test_log::test(tokio::test)]
async fn report_on_object_url_is_rejected() {
    let app = test_app().await;
    let collection = create_calendar(&app, "work").await;
    put_ev1(&app, &collection).await;

    let response = TestRequest::report(&format!("{collection}ev1.ics"))
        .xml_body(&time_range_query("20240601T000000Z", "20240630T235959Z"))
        .send(&app.service)
        .await;
    response.assert_status(StatusCode::FORBIDDEN);
}

#[test_log::test(tokio::test)]
async fn expand_property_on_principal() {
    let app = test_app().await;

    let report = r#"<D:expand-property xmlns:D="DAV:">
  <D:property name="calendar-home-set" namespace="urn:ietf:params:xml:ns:caldav">
    <D:property name="displayname"/>
  </D:property>
</D:expand-property>"#;

    let response = TestRequest::report(&format!("/dav/principals/{}/", app.user.id))
        .xml_body(report)
        .send(&app.service)
        .await;
    response.assert_status(StatusCode::MULTI_STATUS);
    let body = response.body_string();
    assert!(body.contains("calendar-home-set"));
    assert!(body.contains("<D:displayname>Calendars</D:displayname>"), "body: {body}");
}

#[test_log::test(tokio::test)]
async fn addressbook_query_matches_fn() {
    let app = test_app().await;
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

    let card = "BEGIN:VCARD\r\nVERSION:4.0\r\nUID:alice-1\r\nFN:Alice Doe\r\nEND:VCARD\r\n";
    TestRequest::put(&format!("/dav/addressbooks/{}/alice-1.vcf", book.id))
        .vcard_body(card)
        .send(&app.service)
        .await
        .assert_status(StatusCode::CREATED);

    let report = r#"<C:addressbook-query xmlns:D="DAV:" xmlns:C="urn:ietf:params:xml:ns:carddav">
  <D:prop><D:getetag/><C:address-data/></D:prop>
  <C:filter>
    <C:prop-filter name="FN"><C:text-match>alice</C:text-match></C:prop-filter>
  </C:filter>
</C:addressbook-query>"#;

    let response = TestRequest::report(&format!("/dav/addressbooks/{}/", book.id))
        .xml_body(report)
        .send(&app.service)
        .await;
    response.assert_status(StatusCode::MULTI_STATUS);
    let body = response.body_string();
    assert!(body.contains("alice-1.vcf"));
    assert!(body.contains("FN:Alice Doe"));
}
