use anyhow::Context;
use clap::{Parser, Subcommand};
use fhir::{Bundle, DomainResource};
use ips_core::constants::CONFIG_PATH_ENV_VAR;
use ips_core::{
    bundle_to_markdown, compose_document, resolve_config_path, ComposeOptions, MarkupDialect,
    NarrativeConfig, NarrativeService, RecognizedSection,
};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "ips")]
#[command(about = "IPS narrative and composition generator")]
struct Cli {
    /// Narrative configuration file (YAML); overrides IPS_NARRATIVE_CONFIG
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List IPS sections with their LOINC codes and titles
    Sections,
    /// Print the section each resource is routed to
    Classify {
        /// Bundle, resource array or single resource (JSON or YAML)
        input: PathBuf,
    },
    /// Render section narratives
    Render {
        /// Bundle, resource array or single resource (JSON or YAML)
        input: PathBuf,
        /// Only render this section (e.g. VitalSignsSection)
        #[arg(long)]
        section: Option<RecognizedSection>,
        /// Markup dialect (html or markdown)
        #[arg(long)]
        dialect: Option<MarkupDialect>,
    },
    /// Compose an IPS document bundle and print it as JSON
    Compose {
        /// Bundle, resource array or single resource (JSON or YAML)
        input: PathBuf,
        /// Composition title
        #[arg(long)]
        title: Option<String>,
        /// Fail if a mandatory section has no resources
        #[arg(long)]
        strict: bool,
    },
    /// Print a Markdown summary of an IPS document bundle
    Markdown {
        /// Document bundle (JSON or YAML)
        input: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive("ips=info".parse()?))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config_path = resolve_config_path(cli.config, std::env::var(CONFIG_PATH_ENV_VAR).ok());

    match cli.command {
        Some(Commands::Sections) => {
            for section in RecognizedSection::ALL {
                let cardinality = if section.is_mandatory() {
                    "required"
                } else if section.is_recommended() {
                    "recommended"
                } else {
                    "optional"
                };
                println!(
                    "{:<32} {:<8} {:<12} {}",
                    section.tag(),
                    section.loinc_code(),
                    cardinality,
                    section.title()
                );
            }
        }
        Some(Commands::Classify { input }) => {
            let service = NarrativeService::new(load_config(config_path.as_deref())?);
            for resource in read_resources(&input)? {
                let target = service
                    .classify(&resource)
                    .map(|s| s.tag())
                    .unwrap_or("unclassified");
                println!("{} -> {target}", describe(&resource));
            }
        }
        Some(Commands::Render {
            input,
            section,
            dialect,
        }) => {
            let mut config = load_config(config_path.as_deref())?;
            if let Some(dialect) = dialect {
                config = config.with_dialect(dialect);
            }
            let service = NarrativeService::new(config);
            let resources = read_resources(&input)?;

            match section {
                Some(section) => {
                    let groups = service.group(&resources);
                    let bucket = groups.get(section).unwrap_or_default();
                    println!("{}", service.section_narrative(section, bucket).narrative.div);
                }
                None => {
                    let document = service.render(&resources);
                    for section in &document.sections {
                        println!("# {}\n\n{}\n", section.title, section.narrative.div);
                    }
                    if let Some(unclassified) = &document.unclassified {
                        println!("# Unclassified\n\n{unclassified}\n");
                    }
                }
            }
        }
        Some(Commands::Compose {
            input,
            title,
            strict,
        }) => {
            let service = NarrativeService::new(load_config(config_path.as_deref())?);
            let resources = read_resources(&input)?;
            let options = ComposeOptions {
                title,
                strict,
                ..ComposeOptions::default()
            };
            let bundle = compose_document(&service, &resources, &options)?;
            println!("{}", bundle.render_json()?);
        }
        Some(Commands::Markdown { input }) => {
            let text = read_input(&input)?;
            let bundle = if is_yaml(&input) {
                Bundle::parse_yaml(&text)?
            } else {
                Bundle::parse_json(&text)?
            };
            print!("{}", bundle_to_markdown(&bundle)?);
        }
        None => {
            println!("Use 'ips --help' for commands");
        }
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> anyhow::Result<NarrativeConfig> {
    match path {
        Some(path) => {
            tracing::info!(path = %path.display(), "loading narrative configuration");
            Ok(NarrativeConfig::from_yaml_file(path)?)
        }
        None => Ok(NarrativeConfig::default()),
    }
}

fn read_input(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

fn read_resources(path: &Path) -> anyhow::Result<Vec<DomainResource>> {
    let text = read_input(path)?;
    let resources = if is_yaml(path) {
        fhir::read_resources_yaml(&text)
    } else {
        fhir::read_resources_json(&text)
    }
    .with_context(|| format!("failed to parse resources from {}", path.display()))?;
    Ok(resources)
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml" | "yml")
    )
}

fn describe(resource: &DomainResource) -> String {
    format!(
        "{}/{}",
        resource.resource_type().unwrap_or("<missing>"),
        resource.id().unwrap_or("<missing>")
    )
}
