use anyhow::{anyhow, Result};
use colored::*;
use edgar_items::{
    edgar::{cache::ItemsCache, filing::Edgar},
    utils::dirs,
    ExtractedItems, FetchConfig, Item, ItemExtractor, ReportType,
};
use std::fs;
use std::path::PathBuf;
use structopt::StructOpt;

#[derive(Debug, StructOpt)]
#[structopt(name = "edgar-items", about = "Extract item sections from SEC 10-K/10-Q filings")]
enum Command {
    /// Extract items from a filing stored on disk
    Extract {
        /// Filing HTML file
        #[structopt(parse(from_os_str))]
        input: PathBuf,

        /// Items to output, comma separated (e.g. item1,item7)
        #[structopt(long, use_delimiter = true)]
        items: Vec<Item>,

        /// Output the HTML fragment of each item instead of plain text
        #[structopt(long)]
        raw: bool,
    },
    /// Fetch the newest filing of a company and extract its items
    Fetch {
        /// Ticker or CIK of the company
        ticker: String,

        /// Form type to look up
        #[structopt(long, default_value = "10-K")]
        form: ReportType,

        /// Ignore previously cached items
        #[structopt(long)]
        refresh: bool,
    },
}

fn print_items(items: &ExtractedItems) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(items)?);
    Ok(())
}

fn extract(input: PathBuf, items: Vec<Item>, raw: bool) -> Result<()> {
    if !input.exists() {
        return Err(anyhow!("Input file does not exist: {:?}", input));
    }
    let html = fs::read_to_string(&input)?;

    let mut extractor = ItemExtractor::default();
    if !items.is_empty() {
        extractor = extractor.with_items(&items);
    }

    let extracted = if raw {
        extractor.extract_raw(&html)?
    } else {
        extractor.extract(&html)?
    };
    if extracted.is_empty() {
        eprintln!("{}", "No items located in filing".yellow());
    }
    print_items(&extracted)
}

async fn fetch(ticker: String, form: ReportType, refresh: bool) -> Result<()> {
    let config = FetchConfig::from_env()?;
    dirs::ensure_edgar_dirs(&config.data_dir)?;
    let cache = ItemsCache::new(dirs::items_dir(&config.data_dir));

    if !refresh {
        if let Some(items) = cache.load(&ticker, &form)? {
            log::info!("Using cached items for {} {}", ticker, form);
            return print_items(&items);
        }
    }

    let edgar = Edgar::new(config);
    let items = edgar
        .fetch_filing_items(&ticker, &form, &ItemExtractor::default())
        .await?;

    if items.is_empty() {
        if let Some(cached) = cache.load(&ticker, &form)? {
            eprintln!(
                "{}",
                format!("No items extracted for {}, using cached copy", ticker).yellow()
            );
            return print_items(&cached);
        }
        return Err(anyhow!("No {} items could be extracted for {}", form, ticker));
    }

    let path = cache.store(&ticker, &form, &items)?;
    log::debug!("Cached items at {:?}", path);
    print_items(&items)
}

#[tokio::main]
async fn main() {
    env_logger::init();

    let result = match Command::from_args() {
        Command::Extract { input, items, raw } => extract(input, items, raw),
        Command::Fetch {
            ticker,
            form,
            refresh,
        } => fetch(ticker, form, refresh).await,
    };

    if let Err(e) = result {
        eprintln!("{} {}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}
