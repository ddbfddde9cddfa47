use std::io::BufRead;

use clap::Parser;
use partseek::{
    Document,
    SearchConfig,
    error,
    identifier::IdentifierKind,
    ingestion,
    navigation,
    search,
    session::{SessionContext, search_in_session},
};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

mod cli;

use cli::{Cli, Command};

fn init_tracing(verbose: u8, quiet: bool) {
    let filter = if let Ok(env) = std::env::var("PARTSEEK_LOG") {
        EnvFilter::new(env)
    } else if quiet {
        EnvFilter::new("warn")
    } else {
        match verbose {
            0 => EnvFilter::new("info"),
            1 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

fn main() -> error::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    match cli.command {
        Command::Search(args) => {
            let config = SearchConfig::resolve(cli.config.as_deref())?;
            cmd_search(config, &args)?;
        }
        Command::Chat(args) => {
            let config = SearchConfig::resolve(cli.config.as_deref())?;
            cmd_chat(&config, &args)?;
        }
        Command::Inspect(args) => {
            cmd_inspect(&args)?;
        }
        Command::Classify(args) => {
            cmd_classify(&args)?;
        }
        Command::Refs(args) => {
            cmd_refs(&args)?;
        }
        Command::Completions(args) => {
            args.generate();
        }
    }

    Ok(())
}

fn cmd_search(mut config: SearchConfig, args: &cli::SearchArgs) -> error::Result<()> {
    if args.no_follow {
        config.follow_index = false;
    }
    if args.all {
        config.max_results = usize::MAX;
    } else if let Some(count) = args.count {
        config.max_results = count;
    }

    let documents = ingestion::load_documents(&args.documents)?;
    let results = search::find_parts(&documents, &args.query, &config);

    if args.json {
        search::format_json(&results, &args.query)?;
    } else {
        search::format_human(&results);
    }
    Ok(())
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ChatTurn<'a> {
    turn: usize,
    query: &'a str,
    component: &'a str,
    results: &'a [search::SearchResult],
}

fn cmd_chat(config: &SearchConfig, args: &cli::ChatArgs) -> error::Result<()> {
    let documents = ingestion::load_documents(&args.documents)?;
    let mut session = SessionContext::new();

    if !args.json {
        eprintln!(
            "Loaded {} document(s). Ask for a part, or 'quit' to exit.",
            documents.len()
        );
    }

    for line in std::io::stdin().lock().lines() {
        let line = line?;
        let query = line.trim();
        if query.is_empty() {
            continue;
        }
        if matches!(query, "quit" | "exit") {
            break;
        }

        let (mut results, delta) = search_in_session(&session, &documents, query, config);
        results.truncate(args.count);

        if args.json {
            let turn = ChatTurn {
                turn: session.turn + 1,
                query,
                component: &delta.component,
                results: &results,
            };
            println!("{}", serde_json::to_string(&turn)?);
        } else {
            println!("> {}", delta.component);
            search::format_human(&results);
        }
        session.apply(delta);
    }
    Ok(())
}

fn cmd_inspect(args: &cli::InspectArgs) -> error::Result<()> {
    let document = ingestion::load_document(&args.document)?;
    let summaries = navigation::index_pages(&document);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summaries)?);
        return Ok(());
    }

    print_document_header(&document);
    if summaries.is_empty() {
        println!("No index pages detected.");
        return Ok(());
    }
    for summary in &summaries {
        println!(
            "Index page {} ({} reference(s))",
            summary.page_number,
            summary.references.len()
        );
        for reference in &summary.references {
            println!(
                "  -> {:>4}  {}",
                reference.target_page_number, reference.source_context_snippet
            );
        }
    }
    Ok(())
}

fn print_document_header(document: &Document) {
    println!(
        "{}: {} page(s), {} line(s)",
        document.name,
        document.page_count(),
        document.total_lines()
    );
}

#[derive(Serialize)]
struct Classification<'a> {
    value: &'a str,
    kind: IdentifierKind,
}

fn cmd_classify(args: &cli::ClassifyArgs) -> error::Result<()> {
    let classified: Vec<Classification<'_>> = args
        .values
        .iter()
        .map(|value| Classification {
            value,
            kind: IdentifierKind::classify(value),
        })
        .collect();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&classified)?);
    } else {
        for c in &classified {
            println!("{}\t{}", c.value, c.kind);
        }
    }
    Ok(())
}

fn cmd_refs(args: &cli::RefsArgs) -> error::Result<()> {
    let reference = navigation::extract_page_reference_from_context(&args.context, args.page);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&reference)?);
        return Ok(());
    }

    match reference {
        Some(r) => println!("page {} ({})", r.target_page_number, r.matched_reference_text),
        None => println!("No page reference found."),
    }
    Ok(())
}
