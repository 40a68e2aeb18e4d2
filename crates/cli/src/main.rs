use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use civic_agents::CivicAssistant;
use civic_catalog::{default_bundle, load_catalog_dir};
use civic_core::explorer::{categories, jurisdictions};
use civic_core::i18n::translate;
use civic_core::profile::title_case;
use civic_core::{
    classify_intent, parse_age_band, strip_emphasis, Category, ChatInput, ChatTurn, DemoPersona,
    EngineConfig, ExplorerFilter, Profile,
};
use civic_observability::{init_tracing, AppMetrics};
use civic_storage::Store;
use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "civic")]
#[command(about = "Government benefit matching assistant")]
struct Cli {
    /// Directory of catalog JSON files; the built-in catalog when unset.
    #[arg(long, env = "CIVIC_CATALOG_DIR")]
    catalog_dir: Option<PathBuf>,

    #[arg(long, env = "CIVIC_DATABASE_URL")]
    database_url: Option<String>,

    /// Discard extracted ages above this.
    #[arg(long, env = "CIVIC_MAX_AGE")]
    max_age: Option<u32>,

    /// Only whole-word "sc"/"st" mark an SC/ST applicant.
    #[arg(long, env = "CIVIC_WHOLE_WORD_CATEGORY_CODES")]
    whole_word_category_codes: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Interactive conversation. `:reset` starts over.
    Chat {
        /// Open with a demo persona: student, business or family.
        #[arg(long)]
        demo: Option<String>,
        #[arg(long)]
        language: Option<String>,
    },
    Eligibility {
        #[arg(long)]
        age: Option<u32>,
        #[arg(long)]
        income: Option<u64>,
        #[arg(long)]
        state: Option<String>,
        /// Free text to extract the profile from instead of the flags.
        #[arg(long)]
        text: Vec<String>,
    },
    Explore {
        #[arg(long)]
        query: Option<String>,
        #[arg(long)]
        state: Option<String>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        income: Option<u64>,
        /// Age band such as 18-25 or 60+.
        #[arg(long)]
        age: Option<String>,
        /// Rank by keyword overlap instead of filtering.
        #[arg(long)]
        search: Option<String>,
        #[arg(long, default_value_t = 5)]
        limit: usize,
        /// List the catalog's categories and jurisdictions instead.
        #[arg(long)]
        facets: bool,
    },
    /// Demo personas accepted by `chat --demo`.
    Demos {
        #[arg(long, default_value = "en")]
        language: String,
    },
    Status {
        id: String,
    },
    Intent {
        text: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing("civic_cli");
    let cli = Cli::parse();

    let assistant = build_assistant(&cli).await?;

    match cli.command {
        Command::Chat { demo, language } => {
            let opening = demo
                .as_deref()
                .map(|name| {
                    DemoPersona::parse(name).ok_or_else(|| anyhow!("unknown demo persona {name}"))
                })
                .transpose()?
                .map(DemoPersona::utterance);
            run_chat(&assistant, opening, language)?;
        }
        Command::Eligibility {
            age,
            income,
            state,
            text,
        } => {
            let profile = if text.is_empty() {
                Profile {
                    age,
                    income,
                    jurisdiction: state.as_deref().map(title_case),
                    ..Profile::default()
                }
            } else {
                civic_core::extract_profile_with(&text, assistant.config())
            };
            let report = assistant.eligibility(&profile);
            let rows = report
                .eligible
                .iter()
                .map(|program| {
                    serde_json::json!({
                        "id": program.id,
                        "name": program.name,
                        "category": program.category,
                        "reason": report.reason_for(&program.id),
                    })
                })
                .collect::<Vec<_>>();
            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::json!({
                    "profile": profile,
                    "count": rows.len(),
                    "eligible": rows,
                }))?
            );
        }
        Command::Explore {
            query,
            state,
            category,
            income,
            age,
            search,
            limit,
            facets,
        } => {
            if facets {
                let catalog = assistant.catalog();
                println!(
                    "{}",
                    serde_json::to_string_pretty(&serde_json::json!({
                        "categories": categories(catalog),
                        "jurisdictions": jurisdictions(catalog),
                    }))?
                );
                return Ok(());
            }
            if let Some(search) = search {
                let hits = assistant.search(&search, limit);
                println!("{}", serde_json::to_string_pretty(&hits)?);
                return Ok(());
            }

            let category = category
                .as_deref()
                .map(|raw| Category::parse(raw).ok_or_else(|| anyhow!("unknown category {raw}")))
                .transpose()?;
            let age_band = age
                .as_deref()
                .map(|raw| parse_age_band(raw).ok_or_else(|| anyhow!("invalid age band {raw}")))
                .transpose()?;
            let filter = ExplorerFilter {
                query,
                jurisdiction: state.as_deref().map(title_case),
                category,
                income,
                age_band,
            };
            let programs = assistant.explore(&filter);
            println!("{}", serde_json::to_string_pretty(&programs)?);
        }
        Command::Demos { language } => {
            for persona in DemoPersona::ALL {
                println!(
                    "{:<10} {}",
                    persona.as_str(),
                    translate(persona.label_key(), &language)
                );
            }
        }
        Command::Status { id } => {
            let report = assistant.lookup_status(&id).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Intent { text } => {
            println!("{}", classify_intent(&text));
        }
    }

    Ok(())
}

fn run_chat(
    assistant: &CivicAssistant<Store>,
    opening: Option<&str>,
    language: Option<String>,
) -> Result<()> {
    let mut history: Vec<ChatTurn> = Vec::new();
    let mut pending = opening.map(str::to_string);

    println!("Civic assistant chat mode. type 'exit' to quit.");

    loop {
        let message = match pending.take() {
            Some(message) => {
                println!("> {message}");
                message
            }
            None => {
                print!("> ");
                io::stdout().flush()?;

                let mut line = String::new();
                if io::stdin().read_line(&mut line)? == 0 {
                    break;
                }
                line.trim().to_string()
            }
        };

        if message.eq_ignore_ascii_case("exit") || message.eq_ignore_ascii_case("quit") {
            break;
        }
        if message == ":reset" {
            history.clear();
            println!("conversation cleared\n");
            continue;
        }
        if message.is_empty() {
            continue;
        }

        let input = ChatInput {
            history: history.clone(),
            text: message.clone(),
            language: language.clone(),
        };
        let reply = assistant.handle_turn(&input);

        if let Some(greeting) = reply.greeting.as_deref() {
            println!("\n{greeting}");
        }
        println!("\n{}\n", strip_emphasis(&reply.reply_text));

        history.push(ChatTurn::user(message));
        history.push(ChatTurn::assistant(reply.reply_text));
    }

    Ok(())
}

async fn build_assistant(cli: &Cli) -> Result<CivicAssistant<Store>> {
    let bundle = match cli.catalog_dir.as_ref() {
        Some(dir) => load_catalog_dir(dir)
            .with_context(|| format!("failed loading catalog from {}", dir.display()))?,
        None => default_bundle().context("built-in catalog is invalid")?,
    };

    let store = match cli.database_url.as_deref() {
        Some(database_url) => Store::sqlite(database_url).await?,
        None => Store::memory(),
    };
    store.seed(bundle.programs, bundle.applications).await?;

    CivicAssistant::from_store(
        Arc::new(store),
        EngineConfig::default()
            .with_max_age(cli.max_age)
            .with_whole_word_category_codes(cli.whole_word_category_codes),
        AppMetrics::shared(),
    )
    .await
}
