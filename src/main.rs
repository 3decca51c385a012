use clap::{Parser, Subcommand};
use kiss_faqs::admin::{self, Administrator, Settings, SettingsUpdate};
use kiss_faqs::render::{RenderContext, render_faq_page};
use kiss_faqs::shortcode::parse_shortcode;
use kiss_faqs::sitemap::{SitemapEligibility, write_sitemap};
use kiss_faqs::store::{EntityStore, MemoryStore, NewFaq};
use kiss_faqs::types::{FaqId, FaqStatus};
use kiss_faqs::{config, output};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "kiss-faqs")]
#[command(about = "Collapsible FAQs with FAQPage structured data and sitemap control")]
#[command(long_about = "\
Collapsible FAQs with FAQPage structured data and sitemap control

FAQs live in a JSON store. Embed them in content with a shortcode:

  [KISSFAQ post=\"12\" hidden=\"false\"]        one FAQ, answer expanded
  [KISSFAQ category=\"billing\"]                every FAQ in a category
  [KISSFAQ sub-category=\"refunds\" exclude=\"4,7\"]
  [KISSFAQ layout=\"sleuth-ai\"]                alternate card layout

Sitemap inclusion is controlled per FAQ (set-sitemap) and site-wide
(settings --global-sitemap). The site-wide switch overrides every FAQ.

Run 'kiss-faqs gen-config' to generate a documented config.toml.")]
#[command(version)]
struct Cli {
    /// Config file
    #[arg(long, default_value = "config.toml", global = true)]
    config: PathBuf,

    /// FAQ store snapshot (overrides [store] path from the config)
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    /// Enable debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render shortcodes as one page request, with the JSON-LD footer
    Render {
        /// One or more shortcodes, e.g. '[KISSFAQ post="1"]'
        #[arg(required = true)]
        shortcodes: Vec<String>,
    },
    /// Print the standalone HTML page of one FAQ
    Page { id: u64 },
    /// Write sitemap.xml with every indexable FAQ
    Sitemap {
        /// Output file (overrides [sitemap] output from the config)
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// List FAQs with their sitemap state
    Status,
    /// Show or change site-wide settings
    Settings {
        /// Include FAQs in the sitemap at all: yes or no
        #[arg(long)]
        global_sitemap: Option<String>,
        /// Default layout: default or sleuth-ai
        #[arg(long)]
        layout: Option<String>,
    },
    /// Set one FAQ's sitemap flag
    SetSitemap {
        id: u64,
        /// yes or no
        value: String,
    },
    /// Create a FAQ
    Add {
        question: String,
        /// Answer HTML
        answer: String,
        /// Category slug (repeatable)
        #[arg(long = "category")]
        categories: Vec<String>,
        /// Create as draft instead of published
        #[arg(long)]
        draft: bool,
    },
    /// Run the built-in self-tests and report store housekeeping
    Check {
        /// Rows still present in the legacy FAQ table
        #[arg(long)]
        legacy_count: Option<u64>,
        /// Move FAQs that look like test content to the trash
        #[arg(long)]
        delete_test_posts: bool,
        /// Confirm --delete-test-posts; without it the FAQs are only listed
        #[arg(long, requires = "delete_test_posts")]
        yes: bool,
    },
    /// Print a stock config.toml with all options documented
    GenConfig,
}

/// Config and store shared by every command that touches FAQ data.
struct Workspace {
    site: config::SiteConfig,
    store_path: PathBuf,
    store: MemoryStore,
}

impl Workspace {
    fn open(cli: &Cli) -> Result<Self, Box<dyn std::error::Error>> {
        let site = config::load_config(&cli.config)?;
        let store_path = cli
            .store
            .clone()
            .unwrap_or_else(|| PathBuf::from(&site.store.path));
        let store = MemoryStore::load(&store_path)?;
        tracing::debug!(store = %store_path.display(), "loaded FAQ store");
        Ok(Self {
            site,
            store_path,
            store,
        })
    }

    fn save(&self) -> Result<(), Box<dyn std::error::Error>> {
        self.store.save(&self.store_path)?;
        Ok(())
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match &cli.command {
        Command::Render { shortcodes } => {
            let ws = Workspace::open(&cli)?;
            let mut ctx = RenderContext::new();
            for shortcode in shortcodes {
                let atts = parse_shortcode(shortcode)?;
                println!("{}", ctx.render_shortcode(&ws.store, &atts).into_string());
            }
            if let Some(script) = ctx.finish()? {
                println!("{}", script.into_string());
            }
        }
        Command::Page { id } => {
            let ws = Workspace::open(&cli)?;
            let page = render_faq_page(&ws.store, &ws.site.site, parse_id(*id)?)?;
            println!("{}", page.into_string());
        }
        Command::Sitemap { output: target } => {
            let ws = Workspace::open(&cli)?;
            let path = target
                .clone()
                .unwrap_or_else(|| PathBuf::from(&ws.site.sitemap.output));
            let count = write_sitemap(&ws.store, &ws.site.site, &path)?;
            output::print_sitemap_result(&path, count);
        }
        Command::Status => {
            let ws = Workspace::open(&cli)?;
            let (global, rows) = output::status_rows(&ws.store);
            output::print_status(global, &rows);
        }
        Command::Settings {
            global_sitemap,
            layout,
        } => {
            let ws = Workspace::open(&cli)?;
            let settings = if global_sitemap.is_none() && layout.is_none() {
                Settings::load(&ws.store)
            } else {
                let update = SettingsUpdate {
                    global_sitemap: global_sitemap.clone(),
                    layout: layout.clone(),
                };
                let settings = admin::update_settings(&ws.store, &Administrator, &update)?;
                ws.save()?;
                settings
            };
            output::print_settings(&settings, &admin::action_links());
        }
        Command::SetSitemap { id, value } => {
            let ws = Workspace::open(&cli)?;
            let id = parse_id(*id)?;
            let flag = admin::set_sitemap_flag(&ws.store, &Administrator, id, value)?;
            ws.save()?;
            let faq = ws.store.get(id).ok_or("FAQ disappeared after update")?;
            let in_sitemap = !SitemapEligibility::new(&ws.store).should_exclude(id);
            output::print_flag_update(&faq, flag, in_sitemap);
        }
        Command::Add {
            question,
            answer,
            categories,
            draft,
        } => {
            if question.trim().is_empty() {
                return Err("question must not be empty".into());
            }
            let ws = Workspace::open(&cli)?;
            let faq = ws.store.insert(NewFaq {
                question: question.clone(),
                answer: answer.clone(),
                status: if *draft {
                    FaqStatus::Draft
                } else {
                    FaqStatus::Published
                },
                created_at: chrono::Utc::now(),
                categories: categories.clone(),
            })?;
            ws.save()?;
            tracing::info!(id = %faq.id, "added FAQ");
            output::print_added(&faq);
        }
        Command::Check {
            legacy_count,
            delete_test_posts,
            yes,
        } => {
            let ws = Workspace::open(&cli)?;
            if let Some(count) = *legacy_count {
                admin::record_legacy_data(&ws.store, count);
                ws.save()?;
            }
            let results = admin::run_self_tests();
            let notice = admin::legacy_notice(&ws.store);
            let test_posts = admin::find_test_posts(&ws.store);
            output::print_check(&results, notice.as_deref(), &test_posts);
            if *delete_test_posts {
                println!();
                if *yes {
                    let ids: Vec<FaqId> = test_posts.iter().map(|f| f.id).collect();
                    let trashed = admin::trash_test_posts(&ws.store, &Administrator, &ids)?;
                    ws.save()?;
                    output::print_cleanup(&trashed, true);
                } else {
                    output::print_cleanup(&test_posts, false);
                }
            }
            if results.iter().any(|r| !r.passed) {
                return Err("self-tests failed".into());
            }
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Install the stderr log subscriber. `RUST_LOG` wins over `--verbose`.
fn init_tracing(verbose: bool) {
    let default_level = if verbose { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("kiss_faqs={default_level}")));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .with_writer(std::io::stderr)
        .init();
}

fn parse_id(raw: u64) -> Result<FaqId, String> {
    FaqId::new(raw).ok_or_else(|| format!("invalid FAQ id: {raw}"))
}
