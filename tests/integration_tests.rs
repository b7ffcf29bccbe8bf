use anyhow::Result;
use httpmock::prelude::*;
use std::sync::Mutex;
use tempfile::TempDir;
use volby_scraper::core::Reporter;
use volby_scraper::{
    CsvWriter, ElectionPipeline, EtlEngine, HeaderMode, HttpFetcher, OutputFormat, ScrapeError,
    ScraperSettings, TracingReporter,
};

#[derive(Default)]
struct CollectingReporter {
    warnings: Mutex<Vec<String>>,
}

impl Reporter for CollectingReporter {
    fn listing_loaded(&self, _listing_url: &str, _towns: usize) {}

    fn town_started(&self, _url: &str) {}

    fn town_failed(&self, url: &str, error: &ScrapeError) {
        self.warnings
            .lock()
            .unwrap()
            .push(format!("{}: {}", url, error));
    }
}

fn listing_page(codes: &[&str]) -> String {
    let rows: String = codes
        .iter()
        .map(|code| {
            format!(
                r#"<tr><td class="cislo"><a href="ps311?xjazyk=CZ&amp;xkraj=12&amp;xobec={code}&amp;xvyber=7103">{code}</a></td>
                   <td class="overflow_name">Obec {code}</td>
                   <td class="center"><a href="ps311?xjazyk=CZ&amp;xobec={code}">X</a></td></tr>"#
            )
        })
        .collect();

    format!(
        r#"<html><body><div id="publikace">
            <h3>Kraj: Olomoucký kraj</h3>
            <table class="table">
                <tr><th>Obec</th><th>Název</th><th>Výběr okrsku</th></tr>
                {rows}
            </table>
        </div></body></html>"#
    )
}

fn town_page(name: &str, voters: &str, envelopes: &str, valid: &str, parties: &[(&str, &str)]) -> String {
    let party_rows: String = parties
        .iter()
        .enumerate()
        .map(|(i, (party, votes))| {
            format!(
                r#"<tr><td class="cislo">{}</td><td class="overflow_name">{}</td><td class="cislo">{}</td><td class="cislo">1,00</td><td class="center"><a href="ps4?xobec=1">X</a></td></tr>"#,
                i + 1,
                party,
                votes
            )
        })
        .collect();

    format!(
        r#"<html><body><div id="publikace">
            <h3>Kraj: Olomoucký kraj</h3>
            <h3>Okres: Prostějov</h3>
            <h2>Výsledky hlasování za územní celky</h2>
            <h3>Obec: {name}</h3>
            <table id="ps311_t1">
                <tr><th>Okrsky</th><th>Voliči v seznamu</th></tr>
                <tr><th>celkem</th><th>zpr.</th></tr>
                <tr>
                    <td class="cislo">1</td><td class="cislo">1</td><td class="cislo">100,00</td>
                    <td class="cislo">{voters}</td><td class="cislo">{envelopes}</td><td class="cislo">70,73</td>
                    <td class="cislo">{envelopes}</td><td class="cislo">{valid}</td><td class="cislo">99,31</td>
                </tr>
            </table>
            <div id="inner">
                <div class="t2_470"><table class="table">
                    <tr><th>Strana</th><th>Platné hlasy</th><th>Preferenční hlasy</th></tr>
                    <tr><th>číslo</th><th>název</th><th>celkem</th><th>v %</th><th>v %</th></tr>
                    {party_rows}
                    <tr><td class="hidden_td">-</td><td class="hidden_td">-</td><td class="hidden_td">-</td><td class="hidden_td">-</td><td class="hidden_td">-</td></tr>
                </table></div>
            </div>
        </div></body></html>"#
    )
}

fn settings_for(server: &MockServer) -> ScraperSettings {
    ScraperSettings {
        base_url: server.url("/pls/ps2017nss/"),
        timeout_seconds: 5,
        ..ScraperSettings::default()
    }
}

#[tokio::test]
async fn test_end_to_end_two_towns_to_csv() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let output_path = temp_dir.path().join("vysledky.csv");

    let server = MockServer::start_async().await;
    let listing_mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/pls/ps2017nss/ps32")
                .query_param("xnumnuts", "7103");
            then.status(200)
                .header("Content-Type", "text/html; charset=utf-8")
                .body(listing_page(&["589268", "589276"]));
        })
        .await;
    let alojzov_mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/pls/ps2017nss/ps311")
                .query_param("xobec", "589268");
            then.status(200).body(town_page(
                "Alojzov",
                "205",
                "145",
                "144",
                &[("Občanská demokratická strana", "29"), ("ANO 2011", "1 034")],
            ));
        })
        .await;
    let brodek_mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/pls/ps2017nss/ps311")
                .query_param("xobec", "589276");
            then.status(200).body(town_page(
                "Brodek u Prostějova",
                "1 881",
                "1 201",
                "1 195",
                &[("Občanská demokratická strana", "101"), ("ANO 2011", "380")],
            ));
        })
        .await;

    let settings = settings_for(&server);
    let pipeline = ElectionPipeline::new(
        HttpFetcher::new(&settings)?,
        TracingReporter,
        &settings.base_url,
    )?;
    let engine = EtlEngine::new(pipeline, CsvWriter::default());

    let listing_url = server.url("/pls/ps2017nss/ps32?xjazyk=CZ&xkraj=12&xnumnuts=7103");
    let summary = engine.run(&listing_url, &output_path).await?;

    listing_mock.assert_async().await;
    alojzov_mock.assert_async().await;
    brodek_mock.assert_async().await;

    assert_eq!(summary.records_written, 2);
    assert_eq!(summary.towns_failed, 0);
    assert_eq!(summary.columns, 7);

    let content = std::fs::read_to_string(&output_path)?;
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(
        lines,
        vec![
            "town_name,registered_voters,envelopes_count,valid_votes,Občanská demokratická strana,ANO 2011,town_code",
            "Alojzov,205,145,144,29,1034,589268",
            "Brodek u Prostějova,1881,1201,1195,101,380,589276",
        ]
    );
    Ok(())
}

#[tokio::test]
async fn test_unreachable_town_is_skipped_with_one_warning() -> Result<()> {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/pls/ps2017nss/ps32");
            then.status(200).body(listing_page(&["1", "2"]));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/pls/ps2017nss/ps311")
                .query_param("xobec", "1");
            then.status(200)
                .body(town_page("Alojzov", "205", "145", "144", &[("ODS", "29")]));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/pls/ps2017nss/ps311")
                .query_param("xobec", "2");
            then.status(503);
        })
        .await;

    let settings = settings_for(&server);
    let pipeline = ElectionPipeline::new(
        HttpFetcher::new(&settings)?,
        CollectingReporter::default(),
        &settings.base_url,
    )?;

    let report = pipeline.run(&server.url("/pls/ps2017nss/ps32")).await?;

    assert_eq!(report.records.len(), 1);
    assert_eq!(report.records[0].town_name, "Alojzov");
    assert_eq!(report.records[0].town_code, "1");

    let warnings = pipeline.reporter().warnings.lock().unwrap();
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].contains("xobec=2"));
    assert!(warnings[0].contains("503"));
    Ok(())
}

#[tokio::test]
async fn test_listing_failure_aborts_without_output() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let output_path = temp_dir.path().join("out.csv");

    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/pls/ps2017nss/ps32");
            then.status(500);
        })
        .await;

    let settings = settings_for(&server);
    let pipeline = ElectionPipeline::new(
        HttpFetcher::new(&settings)?,
        TracingReporter,
        &settings.base_url,
    )?;
    let engine = EtlEngine::new(pipeline, CsvWriter::default());

    let result = engine
        .run(&server.url("/pls/ps2017nss/ps32"), &output_path)
        .await;

    assert!(matches!(result, Err(ScrapeError::FetchError { .. })));
    assert!(!output_path.exists());
    Ok(())
}

#[tokio::test]
async fn test_listing_without_towns_reports_empty_dataset() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let output_path = temp_dir.path().join("out.csv");

    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/pls/ps2017nss/ps32");
            then.status(200).body("<html><body><p>Žádná data</p></body></html>");
        })
        .await;

    let settings = settings_for(&server);
    let pipeline = ElectionPipeline::new(
        HttpFetcher::new(&settings)?,
        TracingReporter,
        &settings.base_url,
    )?;
    let engine = EtlEngine::new(pipeline, CsvWriter::default());

    let result = engine
        .run(&server.url("/pls/ps2017nss/ps32"), &output_path)
        .await;

    assert!(matches!(result, Err(ScrapeError::EmptyDatasetError)));
    assert!(!output_path.exists());
    Ok(())
}

#[tokio::test]
async fn test_union_header_in_tsv_output() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let output_path = temp_dir.path().join("out.tsv");

    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/pls/ps2017nss/ps32");
            then.status(200).body(listing_page(&["1", "2"]));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/pls/ps2017nss/ps311")
                .query_param("xobec", "1");
            then.status(200)
                .body(town_page("Alojzov", "10", "9", "8", &[("ODS", "8")]));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/pls/ps2017nss/ps311")
                .query_param("xobec", "2");
            then.status(200)
                .body(town_page("Bedihošť", "20", "19", "18", &[("Piráti", "18")]));
        })
        .await;

    let settings = settings_for(&server);
    let pipeline = ElectionPipeline::new(
        HttpFetcher::new(&settings)?,
        TracingReporter,
        &settings.base_url,
    )?;
    let engine = EtlEngine::new(
        pipeline,
        CsvWriter::new(HeaderMode::Union, OutputFormat::Tsv),
    );

    let summary = engine
        .run(&server.url("/pls/ps2017nss/ps32"), &output_path)
        .await?;
    assert_eq!(summary.columns, 7);

    let content = std::fs::read_to_string(&output_path)?;
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(
        lines[0],
        "town_name\tregistered_voters\tenvelopes_count\tvalid_votes\tODS\ttown_code\tPiráti"
    );
    assert_eq!(lines[1], "Alojzov\t10\t9\t8\t8\t1\t");
    assert_eq!(lines[2], "Bedihošť\t20\t19\t18\t\t2\t18");
    Ok(())
}

#[tokio::test]
async fn test_list_towns_returns_absolute_urls() -> Result<()> {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/pls/ps2017nss/ps32");
            then.status(200).body(listing_page(&["506761", "589268"]));
        })
        .await;

    let settings = settings_for(&server);
    let pipeline = ElectionPipeline::new(
        HttpFetcher::new(&settings)?,
        TracingReporter,
        &settings.base_url,
    )?;

    let towns = pipeline.list_towns(&server.url("/pls/ps2017nss/ps32")).await?;

    assert_eq!(
        towns,
        vec![
            server.url("/pls/ps2017nss/ps311?xjazyk=CZ&xkraj=12&xobec=506761&xvyber=7103"),
            server.url("/pls/ps2017nss/ps311?xjazyk=CZ&xkraj=12&xobec=589268&xvyber=7103"),
        ]
    );
    Ok(())
}
