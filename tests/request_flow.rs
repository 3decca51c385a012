//! End-to-end request flow through the public API: store snapshot on disk,
//! shortcodes rendered into one request, JSON-LD footer, sitemap and
//! single-FAQ pages.

use chrono::{Duration, TimeZone, Utc};
use kiss_faqs::admin::{self, Administrator, SettingsUpdate};
use kiss_faqs::config::SiteSection;
use kiss_faqs::render::{RenderContext, render_faq_page};
use kiss_faqs::shortcode::parse_shortcode;
use kiss_faqs::sitemap::{SitemapEligibility, build_entries, write_sitemap};
use kiss_faqs::store::{EntityStore, MemoryStore, NewFaq};
use kiss_faqs::types::{FaqId, FaqStatus, Term};
use tempfile::TempDir;

fn site() -> SiteSection {
    SiteSection {
        base_url: "https://shop.example".to_string(),
        ..SiteSection::default()
    }
}

fn seeded_store() -> MemoryStore {
    let store = MemoryStore::new();
    store.add_term(Term {
        slug: "billing".into(),
        name: "Billing".into(),
        parent: None,
    });
    store.add_term(Term {
        slug: "refunds".into(),
        name: "Refunds".into(),
        parent: Some("billing".into()),
    });

    let start = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
    let faqs = [
        ("How do I pay?", "<p>By card.</p>", vec!["billing"]),
        ("Can I get a refund?", "<p>Within <b>30</b> days.</p>", vec!["refunds"]),
        ("Do you ship abroad?", "<p>Yes, to the EU.</p>", vec![]),
    ];
    for (day, (question, answer, categories)) in faqs.into_iter().enumerate() {
        store.insert(NewFaq {
            question: question.into(),
            answer: answer.into(),
            status: FaqStatus::Published,
            created_at: start + Duration::days(day as i64),
            categories: categories.into_iter().map(String::from).collect(),
        })
        .unwrap();
    }
    store
}

fn id(raw: u64) -> FaqId {
    FaqId::new(raw).unwrap()
}

fn json_ld(script: &str) -> serde_json::Value {
    let start = script.find('{').unwrap();
    let end = script.rfind('}').unwrap();
    serde_json::from_str(&script[start..=end]).unwrap()
}

#[test]
fn one_request_aggregates_every_shortcode() {
    let store = seeded_store();
    let mut ctx = RenderContext::new();

    let mut page = String::new();
    for shortcode in [
        r#"[KISSFAQ post="3" hidden="false"]"#,
        r#"[KISSFAQ post="nope"]"#,
        r#"[KISSFAQ category="billing"]"#,
    ] {
        let atts = parse_shortcode(shortcode).unwrap();
        page.push_str(&ctx.render_shortcode(&store, &atts).into_string());
    }

    assert_eq!(page.matches("DOMContentLoaded").count(), 1);
    assert!(page.contains("FAQ ID not specified or invalid."));

    let footer = ctx.finish().unwrap().unwrap().into_string();
    let doc = json_ld(&footer);
    let names: Vec<&str> = doc["mainEntity"]
        .as_array()
        .unwrap()
        .iter()
        .map(|q| q["name"].as_str().unwrap())
        .collect();
    assert_eq!(
        names,
        vec!["Do you ship abroad?", "How do I pay?", "Can I get a refund?"]
    );
    assert_eq!(doc["mainEntity"][2]["acceptedAnswer"]["text"], "Within 30 days.");
}

#[test]
fn requests_do_not_share_structured_data() {
    let store = seeded_store();

    let mut first = RenderContext::new();
    let atts = parse_shortcode(r#"[KISSFAQ post="1"]"#).unwrap();
    first.render_shortcode(&store, &atts);

    let mut second = RenderContext::new();
    let atts = parse_shortcode(r#"[KISSFAQ post="2"]"#).unwrap();
    second.render_shortcode(&store, &atts);

    let first_doc = json_ld(&first.finish().unwrap().unwrap().into_string());
    let second_doc = json_ld(&second.finish().unwrap().unwrap().into_string());
    assert_eq!(first_doc["mainEntity"].as_array().unwrap().len(), 1);
    assert_eq!(first_doc["mainEntity"][0]["name"], "How do I pay?");
    assert_eq!(second_doc["mainEntity"].as_array().unwrap().len(), 1);
    assert_eq!(second_doc["mainEntity"][0]["name"], "Can I get a refund?");
}

#[test]
fn request_with_only_declined_renders_has_no_footer() {
    let store = seeded_store();
    let mut ctx = RenderContext::new();
    let atts = parse_shortcode(r#"[KISSFAQ post="404"]"#).unwrap();
    let html = ctx.render_shortcode(&store, &atts).into_string();
    assert!(html.contains("FAQ not found or invalid post type."));
    assert!(ctx.finish().unwrap().is_none());
}

#[test]
fn sitemap_and_noindex_follow_admin_changes() {
    let store = seeded_store();
    admin::set_sitemap_flag(&store, &Administrator, id(2), "no").unwrap();

    let locs: Vec<String> = build_entries(&store, &site())
        .into_iter()
        .map(|e| e.loc)
        .collect();
    assert_eq!(
        locs,
        vec![
            "https://shop.example/kiss-faq/1/",
            "https://shop.example/kiss-faq/3/"
        ]
    );
    let page = render_faq_page(&store, &site(), id(2)).unwrap().into_string();
    assert!(page.contains("noindex, nofollow"));

    let update = SettingsUpdate {
        global_sitemap: Some("no".into()),
        layout: None,
    };
    admin::update_settings(&store, &Administrator, &update).unwrap();

    assert!(build_entries(&store, &site()).is_empty());
    let eligibility = SitemapEligibility::new(&store);
    for raw in 1..=3 {
        assert!(eligibility.requires_no_index(id(raw)));
    }
    let page = render_faq_page(&store, &site(), id(1)).unwrap().into_string();
    assert!(page.contains("noindex, nofollow"));
}

#[test]
fn snapshot_round_trip_keeps_flags_and_options() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("faqs.json");

    let store = seeded_store();
    admin::set_sitemap_flag(&store, &Administrator, id(1), "no").unwrap();
    admin::record_legacy_data(&store, 2);
    store.save(&path).unwrap();

    let reloaded = MemoryStore::load(&path).unwrap();
    assert_eq!(reloaded.published().len(), 3);
    assert!(SitemapEligibility::new(&reloaded).should_exclude(id(1)));
    assert!(admin::legacy_notice(&reloaded).is_some());

    let sitemap = tmp.path().join("public/sitemap.xml");
    assert_eq!(write_sitemap(&reloaded, &site(), &sitemap).unwrap(), 2);
}

#[test]
fn trashed_test_posts_leave_listings_and_sitemap() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("faqs.json");

    let store = seeded_store();
    let sample = store
        .insert(NewFaq {
            question: "Sample FAQ for testing".into(),
            answer: "<p>Ignore me.</p>".into(),
            status: FaqStatus::Published,
            created_at: Utc.with_ymd_and_hms(2024, 3, 9, 9, 0, 0).unwrap(),
            categories: vec!["billing".into()],
        })
        .unwrap();
    let flagged: Vec<FaqId> = admin::find_test_posts(&store).iter().map(|f| f.id).collect();
    assert_eq!(flagged, vec![sample.id]);

    admin::trash_test_posts(&store, &Administrator, &flagged).unwrap();
    store.save(&path).unwrap();

    let reloaded = MemoryStore::load(&path).unwrap();
    assert!(admin::find_test_posts(&reloaded).is_empty());
    assert_eq!(build_entries(&reloaded, &site()).len(), 3);

    let mut ctx = RenderContext::new();
    let atts = parse_shortcode(r#"[KISSFAQ category="billing"]"#).unwrap();
    let html = ctx.render_shortcode(&reloaded, &atts).into_string();
    assert!(!html.contains("Sample FAQ for testing"));
}
