use std::env;
use std::fs;
use std::process;

use searchdeck_client::StoreClient;
use searchdeck_core::config::{ConnectionConfig, Settings};
use searchdeck_core::types::{
    FusionMode, MetadataFlag, ResultRecord, SearchRequest, SearchType, DEFAULT_ALPHA, DEFAULT_LIMIT,
};
use searchdeck_query::{execute, export, SessionContext};

struct Options {
    search_type: SearchType,
    properties: Vec<String>,
    metadata: Vec<MetadataFlag>,
    alpha: f64,
    fusion: FusionMode,
    limit: usize,
    csv_path: Option<String>,
    json_path: Option<String>,
    deployment_password: Option<String>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            search_type: SearchType::Keyword,
            properties: Vec::new(),
            metadata: vec![MetadataFlag::Id, MetadataFlag::Score],
            alpha: DEFAULT_ALPHA,
            fusion: FusionMode::Ranked,
            limit: DEFAULT_LIMIT,
            csv_path: None,
            json_path: None,
            deployment_password: None,
        }
    }
}

fn usage() -> ! {
    eprintln!("Usage: searchdeck <collections|describe|search> [args...]");
    eprintln!("  searchdeck collections");
    eprintln!("  searchdeck describe <collection>");
    eprintln!("  searchdeck search <collection> [query...] [--type keyword|semantic|hybrid]");
    eprintln!("                    [--props a,b] [--meta id,distance,certainty,score,explain_score]");
    eprintln!("                    [--alpha 0.6] [--fusion ranked|relative] [--limit 50]");
    eprintln!("                    [--csv out.csv] [--json out.json] [--deployment <password>]");
    process::exit(1);
}

fn take_value(iter: &mut impl Iterator<Item = String>, flag: &str) -> String {
    iter.next().unwrap_or_else(|| {
        eprintln!("Missing value for {flag}");
        process::exit(1)
    })
}

fn parse_value<T: std::str::FromStr>(text: &str, flag: &str) -> T {
    text.parse().unwrap_or_else(|_| {
        eprintln!("Invalid value for {flag}: {text}");
        process::exit(1)
    })
}

fn split_list(text: &str) -> Vec<String> {
    text.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_meta(text: &str) -> Vec<MetadataFlag> {
    split_list(text)
        .iter()
        .map(|label| {
            MetadataFlag::parse(label).unwrap_or_else(|| {
                eprintln!("Unknown metadata flag: {label}");
                process::exit(1)
            })
        })
        .collect()
}

fn parse_args() -> (String, Vec<String>, Options) {
    let mut args: Vec<String> = env::args().skip(1).collect();
    if args.is_empty() {
        usage();
    }
    let command = args.remove(0);
    let mut positionals = Vec::new();
    let mut options = Options::default();
    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--type" => options.search_type = SearchType::parse(&take_value(&mut iter, "--type")),
            "--props" => options.properties = split_list(&take_value(&mut iter, "--props")),
            "--meta" => options.metadata = parse_meta(&take_value(&mut iter, "--meta")),
            "--alpha" => options.alpha = parse_value(&take_value(&mut iter, "--alpha"), "--alpha"),
            "--fusion" => options.fusion = FusionMode::parse(&take_value(&mut iter, "--fusion")),
            "--limit" => options.limit = parse_value(&take_value(&mut iter, "--limit"), "--limit"),
            "--csv" => options.csv_path = Some(take_value(&mut iter, "--csv")),
            "--json" => options.json_path = Some(take_value(&mut iter, "--json")),
            "--deployment" => {
                options.deployment_password = Some(take_value(&mut iter, "--deployment"));
            }
            _ => positionals.push(arg),
        }
    }
    (command, positionals, options)
}

fn connection_config(settings: &Settings, options: &Options) -> anyhow::Result<ConnectionConfig> {
    if let Some(password) = &options.deployment_password {
        return settings.deployment_config(password).ok_or_else(|| {
            anyhow::anyhow!("deployment profile locked: no profile configured or master password rejected")
        });
    }
    Ok(settings.connection_config()?)
}

fn render_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn print_records(records: &[ResultRecord]) {
    for (i, record) in records.iter().enumerate() {
        let fields: Vec<String> = record
            .iter()
            .map(|(key, value)| format!("{key}={}", render_value(value)))
            .collect();
        println!("{:>3}. {}", i + 1, fields.join("  "));
    }
}

fn run_search(client: &StoreClient, positionals: &[String], options: &Options) -> anyhow::Result<()> {
    let Some(collection) = positionals.first() else {
        usage()
    };
    let query_text = positionals[1..].join(" ");

    let mut session = SessionContext::new();
    // Discover the collection's properties up front: validates the name and
    // backs the empty-selection fallback.
    let discovered = client.describe_collection(collection)?;
    session.remember_properties(collection, discovered);

    let mut request = SearchRequest::new(collection.clone());
    request.query_text = query_text;
    request.properties = options.properties.clone();
    request.metadata = options.metadata.clone();
    request.search_type = options.search_type;
    request.alpha = options.alpha;
    request.fusion = options.fusion;
    request.limit = options.limit;

    let records = execute(client, &mut session, &request)?;
    print_records(&records);
    if let Some(entry) = session.history().first() {
        println!("\n✅ Found {} results in {:.2}s", entry.result_count, entry.elapsed_seconds);
    }

    if let Some(path) = &options.csv_path {
        fs::write(path, export::to_csv(&records))?;
        println!("📥 Wrote CSV to {path}");
    }
    if let Some(path) = &options.json_path {
        fs::write(path, export::to_json(&records)?)?;
        println!("📄 Wrote JSON to {path}");
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let settings = Settings::load()?;
    let (command, positionals, options) = parse_args();
    let config = connection_config(&settings, &options)?;
    let client = StoreClient::connect(&config)?;
    println!("🔗 Connected to {}", client.endpoints().rest.authority());

    match command.as_str() {
        "collections" => {
            let names = client.list_collections()?;
            println!("{} collections", names.len());
            for name in names {
                println!("  {name}");
            }
        }
        "describe" => {
            let Some(collection) = positionals.first() else {
                usage()
            };
            let properties = client.describe_collection(collection)?;
            println!("{collection}: {} properties", properties.len());
            for property in properties {
                println!("  {property}");
            }
        }
        "search" => run_search(&client, &positionals, &options)?,
        other => {
            eprintln!("Unknown command: {other}");
            process::exit(1);
        }
    }
    Ok(())
}
