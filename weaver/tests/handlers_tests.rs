use clap::ArgMatches;
use tempfile::TempDir;
use weaver::commands::command_argument_builder;
use weaver::handlers::*;
use weaver::ReportFormat;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path},
};

fn crawl_matches(args: &[&str]) -> ArgMatches {
    let argv = ["weaver", "crawl"].iter().chain(args.iter()).copied();
    let matches = command_argument_builder()
        .try_get_matches_from(argv)
        .expect("arguments should parse");
    matches
        .subcommand_matches("crawl")
        .expect("crawl subcommand")
        .clone()
}

// ============================================================================
// Argument Parsing Tests
// ============================================================================

#[test]
fn test_build_config_defaults() {
    let matches = crawl_matches(&["-u", "https://example.com"]);
    let config = build_config(&matches).unwrap();

    assert_eq!(config.seed_url, "https://example.com/");
    assert_eq!(config.max_depth, 3);
    assert!(config.same_domain_only);
}

#[test]
fn test_build_config_with_flags() {
    let matches = crawl_matches(&[
        "--url",
        "http://blog.example.com/start",
        "--depth",
        "7",
        "--include-subdomains",
    ]);
    let config = build_config(&matches).unwrap();

    assert_eq!(config.seed_url, "http://blog.example.com/start");
    assert_eq!(config.max_depth, 7);
    assert!(!config.same_domain_only);
}

#[test]
fn test_build_config_rejects_non_http_scheme() {
    let matches = crawl_matches(&["-u", "ftp://example.com/files"]);
    let err = build_config(&matches).unwrap_err();
    assert!(format!("{:#}", err).contains("ftp"));
}

#[test]
fn test_depth_outside_range_rejected_by_parser() {
    for depth in ["0", "11"] {
        let result = command_argument_builder().try_get_matches_from([
            "weaver",
            "crawl",
            "-u",
            "https://example.com",
            "-d",
            depth,
        ]);
        assert!(result.is_err(), "depth {} should be rejected", depth);
    }
}

#[test]
fn test_url_is_required() {
    let result = command_argument_builder().try_get_matches_from(["weaver", "crawl"]);
    assert!(result.is_err());
}

#[test]
fn test_invalid_url_rejected_by_parser() {
    let result =
        command_argument_builder().try_get_matches_from(["weaver", "crawl", "-u", "not a url"]);
    assert!(result.is_err());
}

#[test]
fn test_parse_format() {
    assert_eq!(
        parse_format(&crawl_matches(&["-u", "https://example.com"])),
        ReportFormat::Text
    );
    assert_eq!(
        parse_format(&crawl_matches(&["-u", "https://example.com", "-f", "csv"])),
        ReportFormat::Csv
    );
    assert_eq!(
        parse_format(&crawl_matches(&["-u", "https://example.com", "--format", "json"])),
        ReportFormat::Json
    );
}

#[test]
fn test_unknown_format_rejected_by_parser() {
    let result = command_argument_builder().try_get_matches_from([
        "weaver",
        "crawl",
        "-u",
        "https://example.com",
        "-f",
        "html",
    ]);
    assert!(result.is_err());
}

#[test]
fn test_global_flags_after_subcommand() {
    let matches = command_argument_builder()
        .try_get_matches_from(["weaver", "crawl", "-u", "https://example.com", "-q", "-v"])
        .unwrap();
    assert!(matches.get_flag("quiet"));
    assert!(matches.get_flag("verbose"));
}

#[test]
fn test_expand_output_path_tilde() {
    let expanded = expand_output_path("~/weaver/results.csv");
    assert!(!expanded.to_string_lossy().starts_with('~'));
    assert!(expanded.ends_with("weaver/results.csv"));
}

#[test]
fn test_expand_output_path_plain() {
    let expanded = expand_output_path("/tmp/results.json");
    assert_eq!(expanded.to_str(), Some("/tmp/results.json"));
}

#[test]
fn test_resolve_output_path_adds_format_extension() {
    let resolved = resolve_output_path("/tmp/results", ReportFormat::Csv);
    assert_eq!(resolved.to_str(), Some("/tmp/results.csv"));

    let resolved = resolve_output_path("/tmp/results", ReportFormat::Text);
    assert_eq!(resolved.to_str(), Some("/tmp/results.txt"));
}

#[test]
fn test_resolve_output_path_keeps_existing_extension() {
    let resolved = resolve_output_path("/tmp/results.out", ReportFormat::Json);
    assert_eq!(resolved.to_str(), Some("/tmp/results.out"));
}

// ============================================================================
// Crawl Handler Tests
// ============================================================================

#[tokio::test]
async fn test_handle_crawl_writes_json_report() -> Result<(), Box<dyn std::error::Error>> {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/html")
                .set_body_string(r#"<a href="/docs">Docs</a>"#),
        )
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/docs"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let dir = TempDir::new()?;
    let output = dir.path().join("results.json");
    let uri = mock_server.uri();
    let output_arg = output.to_string_lossy().to_string();
    let matches = crawl_matches(&["-u", &uri, "-d", "2", "-f", "json", "-o", &output_arg]);

    handle_crawl(&matches, true).await?;

    let parsed: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&output)?)?;
    let rows = parsed.as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["depth"], 1);
    assert!(rows[0]["parentUrl"].is_null());
    assert_eq!(rows[1]["statusCode"], 500);
    assert_eq!(rows[1]["depth"], 2);
    Ok(())
}

#[tokio::test]
async fn test_handle_crawl_fails_on_unwritable_output() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let output = dir.path().join("missing").join("results.csv");
    let uri = mock_server.uri();
    let output_arg = output.to_string_lossy().to_string();
    let matches = crawl_matches(&["-u", &uri, "-f", "csv", "-o", &output_arg]);

    let err = handle_crawl(&matches, true).await.unwrap_err();
    assert!(err.to_string().contains("Failed to write report"));
}
