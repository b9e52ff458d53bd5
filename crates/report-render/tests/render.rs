use std::path::PathBuf;

use pretty_assertions::assert_eq;
use report_render::{
    segment, sectionize, ReportRenderer, ReportView, RenderOptions, SectionizeOptions,
};

fn load_fixture(name: &str) -> String {
    let path = PathBuf::from("tests/reports").join(name);
    std::fs::read_to_string(path).unwrap()
}

fn renderer_with_base(base: &str) -> ReportRenderer {
    ReportRenderer::new(RenderOptions {
        asset_base_url: base.to_string(),
        ..RenderOptions::default()
    })
    .unwrap()
}

#[test]
fn should_split_generated_report_into_ordered_sections() {
    // Given
    let report = load_fixture("research_report.md");

    // When
    let sections = sectionize(&report, SectionizeOptions::default());

    // Then
    let identifiers: Vec<_> = sections.iter().map(|s| s.identifier.as_str()).collect();
    assert_eq!(
        identifiers,
        vec![
            "acme-corp-comprehensive-research-report",
            "executive-summary",
            "key-insights",
            "sentiment-analysis",
            "recent-news-market-activity",
            "swot-analysis",
        ]
    );
    assert_eq!(sections[5].body, "- Strong brand\n- Rising debt");
}

#[test]
fn should_promote_executive_summary_into_overview() {
    // Given
    let report = load_fixture("research_report.md");
    let renderer = renderer_with_base("http://x");

    // When
    let view = renderer.render_report(&report);

    // Then
    let overview = view.overview().unwrap();
    assert_eq!(overview.title, "Executive Summary");
    assert_eq!(
        overview.html,
        "<p>ACME Corp delivered <strong>record revenue</strong> in FY2024 while keeping margins stable.</p>"
    );
    assert!(view
        .navigation()
        .iter()
        .all(|entry| entry.identifier != "executive-summary"));
    assert_eq!(view.navigation().len(), 5);
}

#[test]
fn should_render_charts_against_asset_base() {
    // Given
    let report = load_fixture("research_report.md");
    let renderer = renderer_with_base("http://x/");

    // When
    let view = renderer.render_report(&report);
    let sentiment = view.fragment("sentiment-analysis").unwrap();

    // Then
    assert!(sentiment.html.contains(
        "<figure><img src=\"http://x/reports/charts/ACME_sentiment_gauge.png\" alt=\"Sentiment Gauge\" loading=\"lazy\"><figcaption>Sentiment Gauge</figcaption></figure>"
    ));
    assert!(sentiment.html.contains("<p><strong>Overall Sentiment:</strong> 0.42 <em>Positive</em></p>"));
    assert_eq!(sentiment.html.matches("<ul>").count(), 1);
    assert_eq!(sentiment.html.matches("<li>").count(), 3);
}

#[test]
fn should_truncate_long_news_headlines() {
    // Given
    let report = load_fixture("research_report.md");
    let renderer = renderer_with_base("http://x");

    // When
    let view = renderer.render_report(&report);
    let news = view.fragment("recent-news-market-activity").unwrap();

    // Then
    let headline = "ACME announces a long-awaited strategic partnership with a major hyperscale cloud provider today";
    let truncated: String = headline.chars().take(77).collect();
    assert!(news.html.contains(&format!("{truncated}...</a>")));
    assert!(news.html.contains(">Q4 earnings call</a>"));
    assert!(news.html.contains("rel=\"noopener noreferrer\""));
}

#[test]
fn should_drop_near_empty_sections() {
    // Given
    let report = load_fixture("research_report.md");

    // When
    let view = renderer_with_base("http://x").render_report(&report);

    // Then
    assert!(view.fragment("risks").is_err());
}

#[test]
fn should_render_header_block_with_rule() {
    // Given
    let report = load_fixture("research_report.md");

    // When
    let view = renderer_with_base("http://x").render_report(&report);
    let header = view
        .fragment("acme-corp-comprehensive-research-report")
        .unwrap();

    // Then
    assert_eq!(
        header.html,
        "<p><strong>Ticker:</strong> ACME</p>\n<p><strong>Generated:</strong> March 04, 2025 at 10:15 AM</p>\n<hr>"
    );
}

#[test]
fn should_render_unsectioned_document_whole() {
    // Given
    let report = "ACME is a diversified industrial.\n- Stable cash flow\n- Low leverage";

    // When
    let view = renderer_with_base("http://x").render_report(report);

    // Then
    assert_eq!(
        view,
        ReportView::Whole {
            html: "<p>ACME is a diversified industrial.</p>\n<ul>\n<li>Stable cash flow</li>\n<li>Low leverage</li>\n</ul>"
                .into()
        }
    );
}

#[test]
fn should_be_deterministic() {
    let report = load_fixture("research_report.md");
    let renderer = renderer_with_base("http://x");

    assert_eq!(renderer.render_report(&report), renderer.render_report(&report));
}

#[test]
fn should_keep_list_tags_balanced_for_whole_fixture() {
    let report = load_fixture("research_report.md");
    let html = renderer_with_base("http://x").render_fragment(&report);

    assert_eq!(html.matches("<ul>").count(), html.matches("</ul>").count());
    assert_eq!(segment("- a\n- b\n- c").matches("<ul>").count(), 1);
}
