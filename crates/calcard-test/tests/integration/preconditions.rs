#![allow(unused_must_use)]
//! Conditional headers and the CalDAV precondition pipeline.

use salvo::http::StatusCode;

use super::helpers::*;

#[test_log::test(tokio::test)]
async fn if_none_match_star_guards_creation() {
    let app = test_app().await;
    let collection = create_calendar(&app, "work").await;
    let etag = put_ev1(&app, &collection).await;

    // Create-only PUT against an existing resource fails.
    let response = TestRequest::put(&format!("{collection}ev1.ics"))
        .if_none_match("*")
        .icalendar_body(EV1)
        .send(&app.service)
        .await;
    response.assert_status(StatusCode::PRECONDITION_FAILED);

    // If-Match with the current tag proceeds.
    let response = TestRequest::put(&format!("{collection}ev1.ics"))
        .if_match(&etag)
        .icalendar_body(&EV1.replace("SUMMARY:Hi", "SUMMARY:Again"))
        .send(&app.service)
        .await;
    response.assert_status(StatusCode::NO_CONTENT);

    // The original tag is now stale.
    let response = TestRequest::put(&format!("{collection}ev1.ics"))
        .if_match(&etag)
        .icalendar_body(EV1)
        .send(&app.service)
        .await;
    response.assert_status(StatusCode::PRECONDITION_FAILED);
}

#[test_log::test(tokio::test)]
async fn if_match_on_absent_resource_fails() {
    let app = test_app().await;
    let collection = create_calendar(&app, "work").await;

    let response = TestRequest::put(&format!("{collection}ev1.ics"))
        .if_match("\"anything\"")
        .icalendar_body(EV1)
        .send(&app.service)
        .await;
    response.assert_status(StatusCode::PRECONDITION_FAILED);
}

#[test_log::test(tokio::test)]
async fn conditional_delete() {
    let app = test_app().await;
    let collection = create_calendar(&app, "work").await;
    let etag = put_ev1(&app, &collection).await;

    let stale = TestRequest::delete(&format!("{collection}ev1.ics"))
        .if_match("\"not-the-tag\"")
        .send(&app.service)
        .await;
    stale.assert_status(StatusCode::PRECONDITION_FAILED);

    let ok = TestRequest::delete(&format!("{collection}ev1.ics"))
        .if_match(&etag)
        .send(&app.service)
        .await;
    ok.assert_status(StatusCode::NO_CONTENT);
}

#[test_log::test(tokio::test)]
async fn duplicate_uid_is_a_uid_conflict() {
    let app = test_app().await;
    let collection = create_calendar(&app, "work").await;
    put_ev1(&app, &collection).await;

    let response = TestRequest::put(&format!("{collection}ev2.ics"))
        .icalendar_body(EV1)
        .send(&app.service)
        .await;
    response.assert_status(StatusCode::CONFLICT);
    assert!(
        response.body_string().contains("<C:no-uid-conflict/>"),
        "body: {}",
        response.body_string()
    );
}

#[test_log::test(tokio::test)]
async fn wrong_content_type_is_unsupported_calendar_data() {
    let app = test_app().await;
    let collection = create_calendar(&app, "work").await;

    let response = TestRequest::put(&format!("{collection}ev1.ics"))
        .header("Content-Type", "application/json")
        .body(EV1.as_bytes().to_vec())
        .send(&app.service)
        .await;
    response.assert_status(StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert!(response.body_string().contains("<C:supported-calendar-data/>"));
}

#[test_log::test(tokio::test)]
async fn missing_content_type_is_rejected_after_validation() {
    let app = test_app().await;
    let collection = create_calendar(&app, "work").await;

    let response = TestRequest::put(&format!("{collection}ev1.ics"))
        .body(EV1.as_bytes().to_vec())
        .send(&app.service)
        .await;
    response.assert_status(StatusCode::UNSUPPORTED_MEDIA_TYPE);
}

#[test_log::test(tokio::test)]
async fn structural_garbage_is_invalid_calendar_data() {
    let app = test_app().await;
    let collection = create_calendar(&app, "work").await;

    let response = TestRequest::put(&format!("{collection}ev1.ics"))
        .icalendar_body("this is not icalendar")
        .send(&app.service)
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert!(response.body_string().contains("<C:valid-calendar-data/>"));
}

#[test_log::test(tokio::test)]
async fn method_property_is_rejected() {
    let app = test_app().await;
    let collection = create_calendar(&app, "work").await;

    let body = EV1.replace("VERSION:2.0", "VERSION:2.0\r\nMETHOD:REQUEST");
    let response = TestRequest::put(&format!("{collection}ev1.ics"))
        .icalendar_body(&body)
        .send(&app.service)
        .await;
    response.assert_status(StatusCode::CONFLICT);
    assert!(
        response
            .body_string()
            .contains("<C:valid-calendar-object-resource/>")
    );
}

#[test_log::test(tokio::test)]
async fn date_window_and_instance_caps() {
    let app = test_app().await;
    let collection = create_calendar(&app, "work").await;

    let ancient = EV1.replace("DTSTART:20240601T100000Z", "DTSTART:18891231T000000Z");
    let response = TestRequest::put(&format!("{collection}ev1.ics"))
        .icalendar_body(&ancient)
        .send(&app.service)
        .await;
    response.assert_status(StatusCode::FORBIDDEN);
    assert!(response.body_string().contains("<C:min-date-time/>"));

    let runaway = EV1.replace(
        "SUMMARY:Hi",
        "RRULE:FREQ=DAILY;COUNT=100000\r\nSUMMARY:Hi",
    );
    let response = TestRequest::put(&format!("{collection}ev1.ics"))
        .icalendar_body(&runaway)
        .send(&app.service)
        .await;
    response.assert_status(StatusCode::FORBIDDEN);
    assert!(response.body_string().contains("<C:max-instances/>"));
}

#[test_log::test(tokio::test)]
async fn unknown_component_is_unsupported() {
    let app = test_app().await;
    let collection = create_calendar(&app, "work").await;

    let body = EV1.replace(
        "END:VEVENT",
        "BEGIN:X-EXPERIMENT\r\nEND:X-EXPERIMENT\r\nEND:VEVENT",
    );
    let response = TestRequest::put(&format!("{collection}ev1.ics"))
        .icalendar_body(&body)
        .send(&app.service)
        .await;
    response.assert_status(StatusCode::FORBIDDEN);
    assert!(
        response
            .body_string()
            .contains("<C:supported-calendar-component/>")
    );
}
