//! Slot Formatter CLI
//!
//! Usage:
//!   slot-formatter [OPTIONS] [FILE]
//!
//! Options:
//!   -r, --templates <DIR>        Template root for validation
//!   -t, --container-type <TYPE>  Select a formatter for this container type
//!   -w, --width <N>              Container width for the selection query
//!   -p, --preview                Select the preview formatter
//!   -l, --list                   List the accepted formatters
//!   -c, --check                  Build only, report diagnostics
//!   -g, --grammar                Show catalog grammar reference
//!   -h, --help                   Print help

use std::fs;
use std::io::{self, IsTerminal, Read};
use std::path::PathBuf;

use clap::Parser;

use slot_formatter::{compile, compile_manifest, Catalog, CatalogError, Formatter, FsTemplateValidator};

#[derive(Parser)]
#[command(name = "slot-formatter")]
#[command(about = "Formatter selection for container-page rendering")]
struct Cli {
    /// Catalog file (reads from stdin if not provided)
    input: Option<PathBuf>,

    /// Template root directory declared templates are validated against
    #[arg(short = 'r', long, default_value = ".")]
    templates: PathBuf,

    /// Container type to select a formatter for
    #[arg(short = 't', long)]
    container_type: Option<String>,

    /// Container width in pixels for the selection query
    #[arg(short, long, default_value_t = 0)]
    width: i32,

    /// Select the preview formatter
    #[arg(short, long)]
    preview: bool,

    /// List the accepted formatters
    #[arg(short, long)]
    list: bool,

    /// Only build the configuration and report diagnostics
    #[arg(short, long)]
    check: bool,

    /// Treat the input as a TOML manifest regardless of file extension
    #[arg(long)]
    toml: bool,

    /// Show catalog grammar reference
    #[arg(short, long)]
    grammar: bool,
}

fn main() {
    let cli = Cli::parse();

    // Handle documentation flags first
    if cli.grammar {
        print_grammar();
        return;
    }

    // If no input file and stdin is a terminal (interactive), show intro help
    if cli.input.is_none() && io::stdin().is_terminal() {
        print_intro();
        return;
    }

    // Read input
    let (source, origin) = match &cli.input {
        Some(path) => match fs::read_to_string(path) {
            Ok(content) => (content, path.display().to_string()),
            Err(e) => {
                eprintln!("Error reading file '{}': {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => {
            let mut buffer = String::new();
            match io::stdin().read_to_string(&mut buffer) {
                Ok(_) => (buffer, "<stdin>".to_string()),
                Err(e) => {
                    eprintln!("Error reading from stdin: {}", e);
                    std::process::exit(1);
                }
            }
        }
    };

    let is_manifest = cli.toml
        || cli
            .input
            .as_ref()
            .and_then(|p| p.extension())
            .map_or(false, |ext| ext == "toml");

    let validator = FsTemplateValidator::new(&cli.templates);
    let result = if is_manifest {
        compile_manifest(&source, &origin, &validator)
    } else {
        compile(&source, &origin, &validator)
    };

    let catalog = match result {
        Ok(catalog) => catalog,
        Err(CatalogError::Parse(errors)) => {
            for error in &errors {
                eprintln!("{}", error.format(&source, &origin));
            }
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    for diagnostic in &catalog.diagnostics {
        eprintln!("warning: {}", diagnostic);
    }

    if cli.check {
        println!(
            "{} formatter(s), {} diagnostic(s)",
            catalog.configuration.formatters().len(),
            catalog.diagnostics.len()
        );
        if !catalog.diagnostics.is_empty() {
            std::process::exit(1);
        }
        return;
    }

    if cli.list {
        list_catalog(&catalog);
        return;
    }

    if cli.preview {
        match catalog.configuration.preview_formatter() {
            Some(f) => print_formatter(f),
            None => {
                println!("no preview formatter");
                std::process::exit(1);
            }
        }
        return;
    }

    if let Some(container_type) = &cli.container_type {
        match catalog.configuration.formatter(container_type, cli.width) {
            Some(f) => print_formatter(f),
            None => {
                println!(
                    "no matching formatter for type '{}' at width {}",
                    container_type, cli.width
                );
                std::process::exit(1);
            }
        }
        return;
    }

    // No query requested: list the catalog
    list_catalog(&catalog);
}

fn print_formatter(f: &Formatter) {
    println!("{}: {} -> {}", f.display_name(), f.kind, f.template);
    println!("  template id: {}", f.template_id);
    if f.preview {
        println!("  preview formatter");
    }
    if !f.location.is_empty() {
        println!("  declared at {}", f.location);
    }
}

fn list_catalog(catalog: &Catalog) {
    print!("{}", catalog.describe());
}

fn print_intro() {
    println!(
        r#"Slot Formatter - formatter selection for container-page rendering

USAGE:
    slot-formatter [OPTIONS] [FILE]
    cat pages.cat | slot-formatter -t article -w 300

OPTIONS:
    -r, --templates <DIR>        Template root for validation
    -t, --container-type <TYPE>  Select a formatter for this container type
    -w, --width <N>              Container width for the selection query
    -p, --preview                Select the preview formatter
    -l, --list                   List the accepted formatters
    -c, --check                  Build only, report diagnostics
    --toml                       Treat input as a TOML manifest
    -g, --grammar                Show catalog grammar reference
    -h, --help                   Print help

QUICK START:
    echo 'formatter detail [type: article, template: "article/detail.ht"]' \
        | slot-formatter -r templates -t article

This selects the formatter registered for the "article" container type.
Run --grammar for the catalog syntax reference."#
    );
}

fn print_grammar() {
    println!(
        r#"FORMATTER CATALOG GRAMMAR
=========================

DECLARATIONS
------------
formatter <name> [attributes]    One candidate renderer

ATTRIBUTES
----------
Attributes go in brackets after the formatter name:
    formatter detail [type: article, template: "article/detail.ht"]

    type: <ident|"string"|*>   Bind to a container type (* = wildcard)
    min_width: <number>        Lower bound of a width binding (inclusive)
    max_width: <number>        Upper bound, defaults to open-ended
    template: "<path>"         Render template path (required)
    preview                    Mark as preview formatter

A formatter binds either to a container type or to a width range; when
both are given, the type wins. Width-bound formatters only match queries
with a positive width, and the greatest matching min_width wins.

COMMENTS
--------
// line comment
/* block comment */

EXAMPLE
-------
// formatters for the default site
formatter detail  [type: article, template: "article/detail.ht"]
formatter narrow  [min_width: 100, max_width: 300, template: "teaser/narrow.ht"]
formatter wide    [min_width: 301, template: "teaser/wide.ht"]
formatter gallery [type: *, preview, template: "gallery/preview.ht"]

TOML MANIFEST
-------------
The same declarations can be loaded from a TOML manifest (--toml or a
.toml file):

    [[formatter]]
    type = "article"
    template = "article/detail.ht"

    [[formatter]]
    min-width = 100
    max-width = 300
    template = "teaser/narrow.ht""#
    );
}
