#![allow(unused_must_use)]
//! Discovery flows: OPTIONS, current-user-principal, principal
//! properties, path handling.

use salvo::http::StatusCode;

use super::helpers::*;

#[test_log::test(tokio::test)]
async fn options_advertises_dav_classes() {
    let app = test_app().await;

    let response = TestRequest::options("/dav/").send(&app.service).await;
    response.assert_status(StatusCode::NO_CONTENT);
    assert_eq!(response.header("dav"), Some("1, 2, calendar-access, addressbook"));
    let allow = response.header("allow").unwrap_or_default();
    assert!(allow.contains("PROPFIND"));
    assert!(allow.contains("MKCALENDAR"));
    assert!(allow.contains("REPORT"));
}

#[test_log::test(tokio::test)]
async fn propfind_root_returns_current_user_principal() {
    let app = test_app().await;

    let response = TestRequest::propfind("/dav/")
        .depth("0")
        .xml_body(propfind_current_user_principal())
        .send(&app.service)
        .await;

    response.assert_status(StatusCode::MULTI_STATUS);
    let body = response.body_string();
    let expected = format!(
        "<D:current-user-principal><D:href>/dav/principals/{}/</D:href></D:current-user-principal>",
        app.user.id
    );
    assert!(body.contains(&expected), "body: {body}");
}

#[test_log::test(tokio::test)]
async fn propfind_own_principal_succeeds_foreign_is_404() {
    let app = test_app().await;

    let own = TestRequest::propfind(&format!("/dav/principals/{}", app.user.id))
        .depth("0")
        .xml_body(propfind_allprop())
        .send(&app.service)
        .await;
    own.assert_status(StatusCode::MULTI_STATUS);
    assert!(own.body_string().contains("principal"));

    let foreign = TestRequest::propfind(&format!("/dav/principals/{}", app.user.id + 1))
        .depth("0")
        .xml_body(propfind_allprop())
        .send(&app.service)
        .await;
    foreign.assert_status(StatusCode::NOT_FOUND);
}

#[test_log::test(tokio::test)]
async fn principal_allprop_omits_home_sets_but_named_returns_them() {
    let app = test_app().await;
    let path = format!("/dav/principals/{}", app.user.id);

    let allprop = TestRequest::propfind(&path)
        .depth("0")
        .xml_body(propfind_allprop())
        .send(&app.service)
        .await;
    assert!(!allprop.body_string().contains("calendar-home-set"));

    let named = TestRequest::propfind(&path)
        .depth("0")
        .xml_body(
            r#"<d:propfind xmlns:d="DAV:" xmlns:c="urn:ietf:params:xml:ns:caldav">
<d:prop><c:calendar-home-set/></d:prop></d:propfind>"#,
        )
        .send(&app.service)
        .await;
    let body = named.body_string();
    assert!(body.contains("calendar-home-set"), "body: {body}");
    assert!(body.contains("<D:href>/dav/calendars/</D:href>"));
}

#[test_log::test(tokio::test)]
async fn paths_outside_dav_are_rejected() {
    let app = test_app().await;

    let response = TestRequest::propfind("/dav/unknown-tree/")
        .xml_body(propfind_allprop())
        .send(&app.service)
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[test_log::test(tokio::test)]
async fn healthz_is_public() {
    let app = test_app().await;
    let response = TestRequest::get("/healthz").send(&app.service).await;
    response.assert_status(StatusCode::OK);
    assert_eq!(response.body_string(), "ok");
}

#[test_log::test(tokio::test)]
async fn well_known_redirects_to_dav() {
    let app = test_app().await;
    let response = TestRequest::get("/.well-known/caldav").send(&app.service).await;
    assert_eq!(response.status, StatusCode::PERMANENT_REDIRECT);
    assert_eq!(response.header("location"), Some("/dav/"));
}

#[test_log::test(tokio::test)]
async fn collection_hrefs_end_with_slash() {
    let app = test_app().await;
    create_calendar(&app, "work").await;

    let response = TestRequest::propfind("/dav/calendars/")
        .depth("1")
        .xml_body(propfind_allprop())
        .send(&app.service)
        .await;

    let body = response.body_string();
    for href in body.split("<D:href>").skip(1) {
        let href = href.split("</D:href>").next().unwrap_or_default();
        assert!(href.ends_with('/'), "collection href without slash: {href}");
    }
}
