use clap::{Arg, ArgAction, ArgGroup, ArgMatches, Command, value_parser};
use html_mt::html::prepare_source;
use html_mt::{
    Config, EntryLocalizer, HtmlPipeline, LocalizationReport, LocalizationRequest,
    MachineTranslator, MockMode, MockTranslator,
};
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::io::AsyncReadExt;
use tracing_subscriber::EnvFilter;

fn cli() -> Command {
    Command::new("html-mt")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Attribute-safe HTML machine translation for headless CMS content")
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .help("TOML configuration file (environment variables take precedence)")
                .value_parser(value_parser!(PathBuf))
                .global(true),
        )
        .arg(
            Arg::new("mock")
                .long("mock")
                .short('m')
                .help("Use mock translator instead of DeepL")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .help("Log every chunk and request")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .subcommand(
            Command::new("html")
                .about("Translate an HTML document and print the result")
                .arg(
                    Arg::new("file")
                        .help("HTML file to translate, or - for stdin")
                        .required(true)
                        .index(1),
                )
                .arg(
                    Arg::new("target-locale")
                        .help("Target locale code (e.g., fr, de, zh-Hant)")
                        .required(true)
                        .index(2),
                )
                .arg(
                    Arg::new("max-len")
                        .long("max-len")
                        .help("Maximum characters per provider request")
                        .value_parser(value_parser!(usize)),
                ),
        )
        .subcommand(
            Command::new("prepare")
                .about("Clean a source article and apply the configured link rules")
                .arg(
                    Arg::new("file")
                        .help("HTML file to prepare, or - for stdin")
                        .required(true)
                        .index(1),
                ),
        )
        .subcommand(
            Command::new("entry")
                .about("Translate a CMS entry into other locales and save it")
                .arg(Arg::new("id").long("id").help("Document id of the source entry"))
                .arg(Arg::new("slug").long("slug").help("Slug of the source entry"))
                .group(
                    ArgGroup::new("source")
                        .args(["id", "slug"])
                        .required(true),
                )
                .arg(
                    Arg::new("uid")
                        .long("uid")
                        .short('u')
                        .help("Content type route name (default: from config, articles)"),
                )
                .arg(
                    Arg::new("locale")
                        .long("locale")
                        .short('l')
                        .help("Target locale; repeat for several (default: all store locales)")
                        .action(ArgAction::Append),
                )
                .arg(
                    Arg::new("publish")
                        .long("publish")
                        .help("Publish translations instead of saving drafts")
                        .action(ArgAction::SetTrue),
                ),
        )
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn Error>> {
    let matches = cli().get_matches();

    let default_level = if matches.get_flag("verbose") {
        "debug"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = Config::load(matches.get_one::<PathBuf>("config").map(PathBuf::as_path))?;

    // Needs no translator
    if let Some(("prepare", args)) = matches.subcommand() {
        let html = read_input(required(args, "file")?).await?;
        println!("{}", prepare_source(&html, &config.links));
        return Ok(ExitCode::SUCCESS);
    }

    let provider: Arc<dyn MachineTranslator> = if matches.get_flag("mock") {
        Arc::new(MockTranslator::new(MockMode::Suffix))
    } else {
        match config.deepl_provider() {
            Ok(provider) => Arc::new(provider),
            Err(e) => {
                eprintln!("❌ {}", e);
                eprintln!("   Set it with: export DEEPL_AUTH_KEY=your_api_key");
                eprintln!("   Or use --mock to use mock translator");
                return Err(e.into());
            }
        }
    };

    match matches.subcommand() {
        Some(("html", args)) => translate_document(&config, provider, args).await,
        Some(("entry", args)) => localize_entry(&config, provider, args).await,
        _ => Err("no subcommand given".into()),
    }
}

fn required<'a>(args: &'a ArgMatches, name: &str) -> Result<&'a str, Box<dyn Error>> {
    args.get_one::<String>(name)
        .map(String::as_str)
        .ok_or_else(|| format!("missing argument: {}", name).into())
}

async fn read_input(path: &str) -> std::io::Result<String> {
    if path == "-" {
        let mut buffer = String::new();
        tokio::io::stdin().read_to_string(&mut buffer).await?;
        Ok(buffer)
    } else {
        tokio::fs::read_to_string(path).await
    }
}

async fn translate_document(
    config: &Config,
    provider: Arc<dyn MachineTranslator>,
    args: &ArgMatches,
) -> Result<ExitCode, Box<dyn Error>> {
    let html = read_input(required(args, "file")?).await?;
    let target_locale = required(args, "target-locale")?;

    let mut translator = config.chunked(provider);
    if let Some(max_len) = args.get_one::<usize>("max-len") {
        translator = translator.with_max_chunk_len(*max_len);
    }

    let translated = HtmlPipeline::new(translator)
        .translate_html(&html, target_locale)
        .await?;
    println!("{}", translated);
    Ok(ExitCode::SUCCESS)
}

async fn localize_entry(
    config: &Config,
    provider: Arc<dyn MachineTranslator>,
    args: &ArgMatches,
) -> Result<ExitCode, Box<dyn Error>> {
    let uid = args
        .get_one::<String>("uid")
        .unwrap_or(&config.content_type);

    let request = match (args.get_one::<String>("id"), args.get_one::<String>("slug")) {
        (Some(id), _) => LocalizationRequest::by_id(uid, id),
        (None, Some(slug)) => LocalizationRequest::by_slug(uid, slug),
        (None, None) => return Err("either --id or --slug is required".into()),
    };
    let locales: Vec<String> = args
        .get_many::<String>("locale")
        .map(|values| values.cloned().collect())
        .unwrap_or_default();
    let request = request
        .with_locales(locales)
        .with_draft(config.draft && !args.get_flag("publish"));

    let store = Arc::new(config.strapi_client()?);
    let localizer = EntryLocalizer::new(store, HtmlPipeline::new(config.chunked(provider)))
        .with_source_locale(&config.source_locale)
        .with_link_rules(config.links.clone());

    let report = localizer.localize(&request).await?;
    print_report(&report);

    Ok(if report.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn print_report(report: &LocalizationReport) {
    println!(
        "📄 {} ({} → {} locales)",
        report.document_id,
        report.source_locale,
        report.outcomes.len()
    );

    for outcome in &report.outcomes {
        match &outcome.result {
            Ok(title) => println!("   ✅ {}: {}", outcome.locale, title),
            Err(e) => println!("   ❌ {}: {}", outcome.locale, e),
        }
    }

    if !report.taxonomy.is_empty() {
        println!("🏷️  Taxonomy");
        for outcome in &report.taxonomy {
            let locale = outcome.locale.as_deref().unwrap_or("-");
            match &outcome.result {
                Ok(()) => println!("   ✅ {} {} {}", outcome.uid, outcome.document_id, locale),
                Err(e) => println!("   ⚠️  {} {} {}: {}", outcome.uid, outcome.document_id, locale, e),
            }
        }
    }
}
