//! Sieve CLI - compile requests against a schema description to SQL
//!
//! Usage:
//!   sieve check [--schema <schema.toml>]
//!   sieve columns [--schema <schema.toml>]
//!   sieve rows <entity> [--match-all <filter>]... [--match-some <filter>]... [--dialect <dialect>]
//!   sieve summary <entity> [--match-all <filter>]...
//!   sieve unique-values <column> [--system <name>] [--count]
//!
//! Examples:
//!   sieve rows subject --match-all "sex = female" --add format --limit 10
//!   sieve summary file --match-some "format like bam%" --dialect duckdb
//!   sieve unique-values species --system GDC --count

use clap::{Args, Parser, Subcommand, ValueEnum};
use sieve::assemble::{
    assemble_rows, assemble_summary, assemble_unique_values, Page, RowsRequest, SummaryRequest,
    UniqueValuesRequest,
};
use sieve::config::Settings;
use sieve::filter::FilterSet;
use sieve::logging;
use sieve::response::{ColumnsResponse, ReleaseMetadata};
use sieve::schema::SchemaMap;
use sieve::sql::Dialect;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "sieve")]
#[command(about = "Sieve - compile filtered row, summary and distinct-value queries to SQL")]
#[command(version)]
struct Cli {
    /// Path to the schema description (defaults to the configured path)
    #[arg(short, long, global = true)]
    schema: Option<PathBuf>,

    /// SQL dialect to generate (defaults to the configured dialect)
    #[arg(short, long, global = true)]
    dialect: Option<DialectArg>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load and validate the schema description
    Check,

    /// List every column of every entity table as JSON
    Columns,

    /// Compile a row-fetch request
    Rows {
        /// Entity table to list
        entity: String,

        #[command(flatten)]
        filters: FilterArgs,

        /// Column to add to the default projection (repeatable)
        #[arg(long = "add")]
        add: Vec<String>,

        /// Column to remove from the projection (repeatable)
        #[arg(long = "exclude")]
        exclude: Vec<String>,

        #[command(flatten)]
        page: PageArgs,

        /// Output format
        #[arg(short, long, default_value = "sql")]
        output: OutputFormat,
    },

    /// Compile a summary request
    Summary {
        /// Entity table to summarize
        entity: String,

        #[command(flatten)]
        filters: FilterArgs,
    },

    /// Compile a distinct-value request
    UniqueValues {
        /// Column uniquename
        column: String,

        /// Only values present in this source system
        #[arg(long)]
        system: Option<String>,

        /// Include a count per value
        #[arg(long)]
        count: bool,

        #[command(flatten)]
        page: PageArgs,

        /// Output format
        #[arg(short, long, default_value = "sql")]
        output: OutputFormat,
    },
}

#[derive(Args)]
struct FilterArgs {
    /// Filter every row must satisfy (repeatable)
    #[arg(long = "match-all")]
    match_all: Vec<String>,

    /// Filter of which at least one must hold (repeatable)
    #[arg(long = "match-some")]
    match_some: Vec<String>,
}

#[derive(Args)]
struct PageArgs {
    #[arg(long)]
    limit: Option<u64>,

    #[arg(long)]
    offset: Option<u64>,
}

#[derive(Clone, ValueEnum)]
enum DialectArg {
    Postgres,
    Duckdb,
}

impl From<DialectArg> for Dialect {
    fn from(arg: DialectArg) -> Self {
        match arg {
            DialectArg::Postgres => Dialect::Postgres,
            DialectArg::Duckdb => Dialect::DuckDb,
        }
    }
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Output the paged query only
    Sql,
    /// Output the paged query followed by its count query
    Verbose,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let settings = match Settings::load() {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    logging::init(&settings.logging);

    let schema = match load_schema(cli.schema, &settings) {
        Ok(schema) => schema,
        Err(code) => return code,
    };
    let dialect = cli
        .dialect
        .map(Dialect::from)
        .unwrap_or(settings.query.dialect);

    match cli.command {
        Commands::Check => cmd_check(&schema),
        Commands::Columns => cmd_columns(&schema),
        Commands::Rows {
            entity,
            filters,
            add,
            exclude,
            page,
            output,
        } => {
            let filters = match parse_filters(&filters) {
                Ok(f) => f,
                Err(code) => return code,
            };
            let request = RowsRequest {
                entity,
                filters,
                add_columns: add,
                exclude_columns: exclude,
                page: Page::new(
                    Some(settings.query.effective_limit(page.limit)),
                    page.offset,
                ),
            };
            match assemble_rows(&schema, &request) {
                Ok(paged) => print_paged(paged.to_sql(dialect), output),
                Err(e) => report(e),
            }
        }
        Commands::Summary { entity, filters } => {
            let filters = match parse_filters(&filters) {
                Ok(f) => f,
                Err(code) => return code,
            };
            match assemble_summary(&schema, &SummaryRequest { entity, filters }) {
                Ok(query) => {
                    println!("{}", query.to_sql(dialect));
                    ExitCode::SUCCESS
                }
                Err(e) => report(e),
            }
        }
        Commands::UniqueValues {
            column,
            system,
            count,
            page,
            output,
        } => {
            let request = UniqueValuesRequest {
                column,
                system,
                count,
                total_count: true,
                page: Page::new(
                    Some(settings.query.effective_limit(page.limit)),
                    page.offset,
                ),
            };
            match assemble_unique_values(&schema, &request) {
                Ok(paged) => print_paged(paged.to_sql(dialect), output),
                Err(e) => report(e),
            }
        }
    }
}

fn load_schema(path: Option<PathBuf>, settings: &Settings) -> Result<SchemaMap, ExitCode> {
    let path = match path {
        Some(p) => p,
        None => match settings.schema_path() {
            Ok(p) => p,
            Err(e) => {
                eprintln!("Configuration error: {}", e);
                return Err(ExitCode::FAILURE);
            }
        },
    };

    SchemaMap::from_file(&path).map_err(|e| {
        eprintln!("Error loading schema '{}': {}", path.display(), e);
        ExitCode::FAILURE
    })
}

fn parse_filters(args: &FilterArgs) -> Result<FilterSet, ExitCode> {
    FilterSet::parse(&args.match_all, &args.match_some).map_err(report)
}

fn report(e: sieve::error::QueryError) -> ExitCode {
    eprintln!("{}", e);
    ExitCode::FAILURE
}

fn print_paged((sql, count_sql): (String, String), output: OutputFormat) -> ExitCode {
    match output {
        OutputFormat::Sql => println!("{}", sql),
        OutputFormat::Verbose => {
            println!("-- Paged query");
            println!("{};", sql);
            println!();
            println!("-- Count query");
            println!("{};", count_sql);
        }
    }
    ExitCode::SUCCESS
}

fn cmd_check(schema: &SchemaMap) -> ExitCode {
    let release = ReleaseMetadata::from_schema(schema);
    println!("Schema version: {}", release.version);
    println!("Fingerprint:    {}", release.fingerprint);
    println!();

    println!("Entity tables ({}):", release.tables.len());
    for table in &release.tables {
        let related = schema.relationships.related(table);
        if related.is_empty() {
            println!("  - {}", table);
        } else {
            println!("  - {} (related: {})", table, related.join(", "));
        }
    }
    println!();
    println!(
        "{} columns, {} relationships",
        schema.registry.len(),
        schema.relationships.len()
    );
    ExitCode::SUCCESS
}

fn cmd_columns(schema: &SchemaMap) -> ExitCode {
    match serde_json::to_string_pretty(&ColumnsResponse::from_schema(schema)) {
        Ok(json) => {
            println!("{}", json);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Serialization error: {}", e);
            ExitCode::FAILURE
        }
    }
}
