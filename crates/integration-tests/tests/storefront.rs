//! End-to-end tests of the storefront router against mocked upstreams.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use funnels_integration_tests::{
    CART_COOKIE, PUBLIC_TOKEN, SHOP_DOMAIN, TestContext, cart_cookie, cart_json, consent_cookie,
    landing_page_json, stored_consent_cookie,
};
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, ResponseTemplate};

const ICE_GID: &str = "gid://shopify/ProductVariant/47073609433379";
const CART_ID: &str = "gid://shopify/Cart/c1";

fn graphql(operation: &str) -> wiremock::MockBuilder {
    Mock::given(method("POST")).and(body_partial_json(json!({"operationName": operation})))
}

fn payload(field: &str, cart: &serde_json::Value) -> serde_json::Value {
    json!({"data": {field: {"cart": cart, "userErrors": []}}})
}

async fn mount_cart_query(ctx: &TestContext, lines: &[(&str, &str, i64)]) {
    graphql("cart")
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"data": {"cart": cart_json(lines)}})),
        )
        .mount(&ctx.shopify)
        .await;
}

// =============================================================================
// Page
// =============================================================================

#[tokio::test]
async fn health_check() {
    let ctx = TestContext::new().await;
    let res = ctx.get("/health", None).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body, "ok");
}

#[tokio::test]
async fn home_renders_sections_and_product() {
    let ctx = TestContext::new().await;
    Mock::given(method("GET"))
        .and(path("/page.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(landing_page_json()))
        .expect(1)
        .mount(&ctx.cms)
        .await;

    let res = ctx.get("/", None).await;

    assert_eq!(res.status, StatusCode::OK);
    assert!(res.body.contains("<title>The Complete Snowboard - Ride Everything</title>"));
    assert!(res.body.contains("Ride Everything"));
    assert!(res.body.contains("Does it float?"));
    assert!(res.body.contains("id=\"product\""));
    assert!(res.body.contains("699.95"));
    assert!(res.body.contains("Your cart is empty"));
    assert!(res.header("x-request-id").is_some());
}

#[tokio::test]
async fn cms_failure_keeps_product_on_page() {
    let ctx = TestContext::new().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&ctx.cms)
        .await;

    let res = ctx.get("/", None).await;

    assert_eq!(res.status, StatusCode::OK);
    assert!(res.body.contains("CMS API request failed: Internal Server Error"));
    assert!(res.body.contains("The Complete Snowboard"));
}

#[tokio::test]
async fn unconfigured_cms_is_reported() {
    let ctx = TestContext::without_cms().await;
    let res = ctx.get("/", None).await;

    assert_eq!(res.status, StatusCode::OK);
    assert!(res.body.contains("CMS_SPEC_URL is not configured"));
}

#[tokio::test]
async fn page_view_waits_for_consent() {
    let ctx = TestContext::without_cms().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&ctx.analytics)
        .await;

    let res = ctx.get("/", None).await;

    assert!(res.set_cookie("funnels_pv").is_some_and(|c| c.starts_with("funnels_pv=deferred")));
    assert!(res.set_cookie("_shopify_y").is_some());
}

#[tokio::test]
async fn page_view_sent_with_known_consent() {
    let ctx = TestContext::without_cms().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&ctx.analytics)
        .await;

    let res = ctx.get("/", Some(&consent_cookie())).await;

    assert_eq!(res.status, StatusCode::OK);
    assert!(res.set_cookie("funnels_pv").is_none());
}

#[tokio::test]
async fn consent_from_earlier_visit_waits_for_ready_signal() {
    let ctx = TestContext::without_cms().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&ctx.analytics)
        .await;

    let res = ctx.get("/", Some(&stored_consent_cookie())).await;

    assert_eq!(res.status, StatusCode::OK);
    assert!(res.set_cookie("funnels_pv").is_some_and(|c| c.starts_with("funnels_pv=deferred")));
}

#[tokio::test]
async fn ready_signal_flushes_deferred_view_once() {
    let ctx = TestContext::without_cms().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&ctx.analytics)
        .await;

    let signal = json!({"analytics": true, "marketing": false, "region": "USCA"});
    let first = ctx
        .post_json("/analytics/ready", &signal, Some("funnels_pv=deferred"))
        .await;

    assert_eq!(first.status, StatusCode::OK);
    assert_eq!(first.body, r#"{"pageViewSent":true}"#);
    assert!(first.set_cookie("funnels_consent").is_some());
    let trigger = first.hx_trigger().unwrap();
    assert!(trigger.get("shopify-analytics-ready").is_some());

    let second = ctx.post_json("/analytics/ready", &signal, None).await;
    assert_eq!(second.status, StatusCode::OK);
    assert_eq!(second.body, r#"{"pageViewSent":false}"#);
}

// =============================================================================
// Product
// =============================================================================

#[tokio::test]
async fn variant_selection_switches_price() {
    let ctx = TestContext::without_cms().await;
    let res = ctx.get("/product?variant=47073609466147", None).await;

    assert_eq!(res.status, StatusCode::OK);
    assert!(res.body.contains("749.95"));
    assert!(res.body.contains("gid://shopify/ProductVariant/47073609466147"));
}

#[tokio::test]
async fn button_reset_renders_idle_label() {
    let ctx = TestContext::without_cms().await;
    let res = ctx
        .get("/product/button?variant=47073609433379", None)
        .await;

    assert_eq!(res.status, StatusCode::OK);
    assert!(res.body.contains("Add to Cart"));
}

// =============================================================================
// Cart
// =============================================================================

#[tokio::test]
async fn first_add_creates_cart_and_sets_cookie() {
    let ctx = TestContext::without_cms().await;
    graphql("cartCreate")
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(payload("cartCreate", &cart_json(&[("1", "47073609433379", 1)]))),
        )
        .expect(1)
        .mount(&ctx.shopify)
        .await;
    graphql("cartLinesAdd")
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&ctx.shopify)
        .await;

    let res = ctx
        .post_form("/cart/add", &format!("variant_id={}", urlencoding_gid(ICE_GID)), None)
        .await;

    assert_eq!(res.status, StatusCode::OK);
    let cookie = res.set_cookie(CART_COOKIE).unwrap();
    assert!(cookie.contains("gid%3A%2F%2Fshopify%2FCart%2Fc1"));

    let trigger = res.hx_trigger().unwrap();
    assert!(trigger.get("cart-updated").is_some());
    assert!(trigger.get("open-cart").is_some());

    assert!(res.body.contains("Added!"));
    assert!(res.body.contains("cart-badge"));
    assert!(res.body.contains("cart-drawer"));
}

#[tokio::test]
async fn add_with_existing_cart_adds_lines() {
    let ctx = TestContext::without_cms().await;
    mount_cart_query(&ctx, &[("1", "47073609433379", 1)]).await;
    graphql("cartLinesAdd")
        .respond_with(ResponseTemplate::new(200).set_body_json(payload(
            "cartLinesAdd",
            &cart_json(&[("1", "47073609433379", 2)]),
        )))
        .expect(1)
        .mount(&ctx.shopify)
        .await;
    graphql("cartCreate")
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&ctx.shopify)
        .await;

    let res = ctx
        .post_form(
            "/cart/add",
            "variant_id=47073609433379&quantity=1",
            Some(&cart_cookie(CART_ID)),
        )
        .await;

    assert_eq!(res.status, StatusCode::OK);
    assert!(res.set_cookie(CART_COOKIE).is_none());
    assert!(res.body.contains("Added!"));
}

#[tokio::test]
async fn user_error_leaves_button_idle() {
    let ctx = TestContext::without_cms().await;
    graphql("cartCreate")
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"cartCreate": {"cart": null, "userErrors": [
                {"field": ["lines"], "message": "Variant is sold out"}
            ]}}
        })))
        .mount(&ctx.shopify)
        .await;

    let res = ctx
        .post_form("/cart/add", "variant_id=47073609433379", None)
        .await;

    assert_eq!(res.status, StatusCode::OK);
    assert!(res.body.contains("Add to Cart"));
    assert!(!res.body.contains("Added!"));
    assert!(res.header("HX-Trigger").is_none());
    assert!(res.set_cookie(CART_COOKIE).is_none());
}

#[tokio::test]
async fn unknown_variant_is_rejected() {
    let ctx = TestContext::without_cms().await;
    let res = ctx.post_form("/cart/add", "variant_id=bogus", None).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn quantity_increase_reports_addition() {
    let ctx = TestContext::without_cms().await;
    mount_cart_query(&ctx, &[("1", "47073609433379", 2)]).await;
    graphql("cartLinesUpdate")
        .respond_with(ResponseTemplate::new(200).set_body_json(payload(
            "cartLinesUpdate",
            &cart_json(&[("1", "47073609433379", 3)]),
        )))
        .expect(1)
        .mount(&ctx.shopify)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&ctx.analytics)
        .await;

    let cookies = format!("{}; {}", cart_cookie(CART_ID), consent_cookie());
    let res = ctx
        .post_form(
            "/cart/update",
            "line_id=gid%3A%2F%2Fshopify%2FCartLine%2F1&quantity=3",
            Some(&cookies),
        )
        .await;

    assert_eq!(res.status, StatusCode::OK);
    assert!(res.hx_trigger().unwrap().get("cart-updated").is_some());
    assert!(res.body.contains("cart-drawer"));
}

#[tokio::test]
async fn quantity_zero_removes_line() {
    let ctx = TestContext::without_cms().await;
    mount_cart_query(&ctx, &[("1", "47073609433379", 1)]).await;
    graphql("cartLinesRemove")
        .respond_with(
            ResponseTemplate::new(200).set_body_json(payload("cartLinesRemove", &cart_json(&[]))),
        )
        .expect(1)
        .mount(&ctx.shopify)
        .await;
    graphql("cartLinesUpdate")
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&ctx.shopify)
        .await;

    let res = ctx
        .post_form(
            "/cart/update",
            "line_id=gid%3A%2F%2Fshopify%2FCartLine%2F1&quantity=0",
            Some(&cart_cookie(CART_ID)),
        )
        .await;

    assert_eq!(res.status, StatusCode::OK);
    assert!(res.body.contains("Your cart is empty"));
}

#[tokio::test]
async fn update_sent_when_cart_fetch_fails() {
    let ctx = TestContext::without_cms().await;
    graphql("cart")
        .respond_with(ResponseTemplate::new(503))
        .mount(&ctx.shopify)
        .await;
    graphql("cartLinesUpdate")
        .respond_with(ResponseTemplate::new(200).set_body_json(payload(
            "cartLinesUpdate",
            &cart_json(&[("1", "47073609433379", 3)]),
        )))
        .expect(1)
        .mount(&ctx.shopify)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&ctx.analytics)
        .await;

    let cookies = format!("{}; {}", cart_cookie(CART_ID), consent_cookie());
    let res = ctx
        .post_form(
            "/cart/update",
            "line_id=gid%3A%2F%2Fshopify%2FCartLine%2F1&quantity=3",
            Some(&cookies),
        )
        .await;

    assert_eq!(res.status, StatusCode::OK);
    assert!(res.hx_trigger().unwrap().get("cart-updated").is_some());
    assert!(!res.body.contains("Your cart is empty"));
}

#[tokio::test]
async fn stale_cart_cookie_renders_empty_drawer() {
    let ctx = TestContext::without_cms().await;
    graphql("cart")
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {"cart": null}})))
        .mount(&ctx.shopify)
        .await;

    let res = ctx.get("/cart", Some(&cart_cookie(CART_ID))).await;

    assert_eq!(res.status, StatusCode::OK);
    assert!(res.body.contains("Your cart is empty"));
}

#[tokio::test]
async fn checkout_without_items_returns_home() {
    let ctx = TestContext::without_cms().await;
    let res = ctx.get("/checkout", None).await;

    assert!(res.status.is_redirection());
    assert_eq!(res.header("location"), Some("/"));
}

#[tokio::test]
async fn checkout_redirects_to_permalink() {
    let ctx = TestContext::without_cms().await;
    mount_cart_query(&ctx, &[("1", "42", 2)]).await;

    let res = ctx.get("/checkout", Some(&cart_cookie(CART_ID))).await;

    assert!(res.status.is_redirection());
    assert_eq!(
        res.header("location").unwrap(),
        format!("https://{SHOP_DOMAIN}/cart/42:2?access_token={PUBLIC_TOKEN}")
    );
}

fn urlencoding_gid(gid: &str) -> String {
    gid.replace(':', "%3A").replace('/', "%2F")
}
