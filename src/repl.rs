//! Definitions for the command line and for the commands that are used interactively,
//! e.g. `sections` and `find main`.
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(version, about = "Read-only ELF inspector", long_about = None)]
pub struct Cli {
    /// Path to an ELF file
    pub path: PathBuf,

    /// Print one report and exit, otherwise an interactive shell is started
    #[command(subcommand)]
    pub report: Option<Report>,
}

#[derive(Parser)]
#[command(infer_subcommands(true))] // allow abreviations
pub struct Repl {
    #[command(subcommand)]
    pub command: ReplCommand,
}

#[derive(Subcommand)]
pub enum ReplCommand {
    #[command(flatten)]
    Report(Report),

    /// Exit elfscope
    Quit,
}

#[derive(Debug, Subcommand)]
pub enum Report {
    /// Show the ELF header
    Header(ExplainArgs),

    /// Show program headers
    Segments(TableArgs),

    /// Show section headers
    Sections(TableArgs),

    /// Show .symtab, or .dynsym with --dynamic
    Symbols(SymbolArgs),

    /// Show the .dynamic section
    Dynamic(TableArgs),

    /// Show the entries in every REL and RELA section
    Relocations(TableArgs),

    /// Find sections and symbols by name
    Find(FindArgs),
}

#[derive(Args, Debug)]
pub struct ExplainArgs {
    /// Explain fields
    #[arg(short, long)]
    pub explain: bool,
}

#[derive(Args, Debug)]
pub struct TableArgs {
    /// Explain columns
    #[arg(short, long)]
    pub explain: bool,

    /// Add column headers
    #[arg(short, long)]
    pub titles: bool,
}

#[derive(Args, Debug)]
pub struct SymbolArgs {
    /// Show .dynsym instead of .symtab
    #[arg(short, long)]
    pub dynamic: bool,

    #[command(flatten)]
    pub table: TableArgs,
}

#[derive(Args, Debug)]
pub struct FindArgs {
    /// Exact section or symbol name, e.g. ".text" or "main"
    pub name: String,
}
