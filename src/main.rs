use clap::Parser;
use volby_scraper::core::ConfigProvider;
use volby_scraper::utils::error::ErrorSeverity;
use volby_scraper::utils::{logger, validation::Validate};
use volby_scraper::{
    CliConfig, Command, CsvWriter, ElectionPipeline, EtlEngine, HttpFetcher, ScrapeError,
    ScraperSettings, TracingReporter,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CliConfig::parse();

    // 初始化日誌
    if config.json_logs {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(config.verbose);
    }

    tracing::debug!("CLI config: {:?}", config);

    // 驗證配置
    let settings = match config.settings().and_then(|settings| {
        config.validate()?;
        settings.validate()?;
        Ok(settings)
    }) {
        Ok(settings) => settings,
        Err(e) => exit_with(&e),
    };

    if let Err(e) = run(&config, &settings).await {
        exit_with(&e);
    }

    Ok(())
}

async fn run(config: &CliConfig, settings: &ScraperSettings) -> volby_scraper::Result<()> {
    let fetcher = HttpFetcher::new(settings)?;
    let pipeline = ElectionPipeline::new(fetcher, TracingReporter, settings.base_url())?;

    match &config.command {
        Command::FetchData {
            url, output_path, ..
        } => {
            println!("Downloading data from: {}", url);
            let writer = CsvWriter::new(settings.header_mode(), settings.output_format());
            let engine = EtlEngine::new(pipeline, writer);

            let summary = engine.run(url, output_path).await?;
            tracing::info!(
                "✅ Saved {} municipalities ({} columns) to {}",
                summary.records_written,
                summary.columns,
                summary.output_path
            );
            if summary.towns_failed > 0 {
                tracing::warn!("⚠️ {} municipalities were skipped", summary.towns_failed);
            }
            println!("✅ Data saved to: {}", summary.output_path);
        }
        Command::ListTowns { url } => {
            println!("Downloading municipality list from: {}", url);
            let towns = pipeline.list_towns(url).await?;
            println!("Municipalities ({}):", towns.len());
            for town in towns {
                println!("{}", town);
            }
        }
    }

    Ok(())
}

fn exit_with(e: &ScrapeError) -> ! {
    if e.severity() == ErrorSeverity::Low {
        tracing::warn!("{}", e);
    } else {
        tracing::error!(
            "❌ Run failed: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
    }
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());

    // 根據錯誤嚴重程度決定退出碼
    let exit_code = match e.severity() {
        ErrorSeverity::Low => 0,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    };
    std::process::exit(exit_code);
}
