#![allow(unused_must_use)]
//! PUT/GET/HEAD/DELETE round trips and ETag semantics.

use salvo::http::StatusCode;

use super::helpers::*;

#[test_log::test(tokio::test)]
async fn put_then_get_roundtrip() {
    let app = test_app().await;
    let collection = create_calendar(&app, "work").await;

    let etag = put_ev1(&app, &collection).await;
    assert!(etag.starts_with('"') && etag.ends_with('"'), "etag: {etag}");

    let response = TestRequest::get(&format!("{collection}ev1.ics"))
        .send(&app.service)
        .await;
    response.assert_status(StatusCode::OK);
    assert_eq!(response.header("etag"), Some(etag.as_str()));
    assert!(
        response
            .header("content-type")
            .unwrap_or_default()
            .starts_with("text/calendar")
    );
    assert_eq!(response.body_string(), EV1);
    assert!(response.header("last-modified").is_some());
}

#[test_log::test(tokio::test)]
async fn head_returns_headers_without_body() {
    let app = test_app().await;
    let collection = create_calendar(&app, "work").await;
    let etag = put_ev1(&app, &collection).await;

    let response = TestRequest::head(&format!("{collection}ev1.ics"))
        .send(&app.service)
        .await;
    response.assert_status(StatusCode::OK);
    assert_eq!(response.header("etag"), Some(etag.as_str()));
    assert!(response.body.is_empty());
}

#[test_log::test(tokio::test)]
async fn etag_is_content_addressed() {
    let app = test_app().await;
    let first = create_calendar(&app, "one").await;
    let second = create_calendar(&app, "two").await;

    // The same body in two calendars yields the same ETag.
    let etag_one = put_ev1(&app, &first).await;
    let etag_two = put_ev1(&app, &second).await;
    assert_eq!(etag_one, etag_two);

    // An update with identical bytes keeps the ETag.
    let update = TestRequest::put(&format!("{first}ev1.ics"))
        .icalendar_body(EV1)
        .send(&app.service)
        .await;
    update.assert_status(StatusCode::NO_CONTENT);
    assert_eq!(update.header("etag"), Some(etag_one.as_str()));

    // A different body changes it.
    let changed = EV1.replace("SUMMARY:Hi", "SUMMARY:Bye");
    let update = TestRequest::put(&format!("{first}ev1.ics"))
        .icalendar_body(&changed)
        .send(&app.service)
        .await;
    update.assert_status(StatusCode::NO_CONTENT);
    assert_ne!(update.header("etag"), Some(etag_one.as_str()));
}

#[test_log::test(tokio::test)]
async fn get_missing_resource_is_404() {
    let app = test_app().await;
    let collection = create_calendar(&app, "work").await;

    let response = TestRequest::get(&format!("{collection}nope.ics"))
        .send(&app.service)
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
}

#[test_log::test(tokio::test)]
async fn delete_then_get_is_404() {
    let app = test_app().await;
    let collection = create_calendar(&app, "work").await;
    put_ev1(&app, &collection).await;

    let delete = TestRequest::delete(&format!("{collection}ev1.ics"))
        .send(&app.service)
        .await;
    delete.assert_status(StatusCode::NO_CONTENT);

    let get = TestRequest::get(&format!("{collection}ev1.ics"))
        .send(&app.service)
        .await;
    get.assert_status(StatusCode::NOT_FOUND);

    let delete_again = TestRequest::delete(&format!("{collection}ev1.ics"))
        .send(&app.service)
        .await;
    delete_again.assert_status(StatusCode::NOT_FOUND);
}

#[test_log::test(tokio::test)]
async fn event_is_reachable_by_slug_and_id() {
    let app = test_app().await;
    let collection = create_calendar(&app, "work").await;
    put_ev1(&app, &collection).await;

    let by_slug = TestRequest::get("/dav/calendars/work/ev1.ics")
        .send(&app.service)
        .await;
    by_slug.assert_status(StatusCode::OK);

    // Slug resolution is case-insensitive.
    let by_upper = TestRequest::get("/dav/calendars/Work/ev1.ics")
        .send(&app.service)
        .await;
    by_upper.assert_status(StatusCode::OK);
}

#[test_log::test(tokio::test)]
async fn vcard_put_get_roundtrip() {
    let app = test_app().await;
    let mkcol = TestRequest::mkcol("/dav/addressbooks/contacts")
        .send(&app.service)
        .await;
    mkcol.assert_status(StatusCode::CREATED);

    let book = app
        .store
        .addressbooks
        .list_by_user(app.user.id)
        .await
        .expect("list books")
        .remove(0);

    let card = "BEGIN:VCARD\r\nVERSION:4.0\r\nUID:alice-1\r\nFN:Alice Doe\r\nEND:VCARD\r\n";
    let path = format!("/dav/addressbooks/{}/alice-1.vcf", book.id);
    let put = TestRequest::put(&path).vcard_body(card).send(&app.service).await;
    put.assert_status(StatusCode::CREATED);

    let get = TestRequest::get(&path).send(&app.service).await;
    get.assert_status(StatusCode::OK);
    assert!(
        get.header("content-type")
            .unwrap_or_default()
            .starts_with("text/vcard")
    );
    assert_eq!(get.body_string(), card);
}
