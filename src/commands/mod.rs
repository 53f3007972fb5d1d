//! Handlers for the reports users ask for, e.g. `sections`.
pub mod elf;
pub mod tables;

pub use elf::*;

use crate::elf::ElfFile;
use crate::repl::Report;
use std::error::Error;
use std::io::Write;

pub fn run_report(out: &mut impl Write, file: &ElfFile, report: &Report) -> Result<(), Box<dyn Error>> {
    log::trace!("running {report:?} on {}", file.path.display());
    match report {
        Report::Header(args) => elf_header(out, file, args),
        Report::Segments(args) => elf_segments(out, file, args),
        Report::Sections(args) => elf_sections(out, file, args),
        Report::Symbols(args) => elf_symbols(out, file, args),
        Report::Dynamic(args) => elf_dynamic(out, file, args),
        Report::Relocations(args) => elf_relocations(out, file, args),
        Report::Find(args) => elf_find(out, file, args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elf::fixtures::Fixture;
    use crate::repl::Cli;
    use clap::Parser;

    #[test]
    fn parses_and_runs() {
        let file = Fixture::dynamic64().open();
        let cli = Cli::try_parse_from(["elfscope", "libfoo.so", "symbols", "--dynamic", "-t"]).unwrap();
        let report = cli.report.unwrap();

        let mut v: Vec<u8> = Vec::new();
        run_report(&mut v, &file, &report).unwrap();
        let s = crate::utils::strip_escapes(&String::from_utf8(v).unwrap());
        assert!(s.lines().next().unwrap().contains("visibility"));
        assert!(s.contains("puts"));
    }

    #[test]
    fn no_report_means_shell() {
        let cli = Cli::try_parse_from(["elfscope", "/bin/true"]).unwrap();
        assert!(cli.report.is_none());
        assert_eq!(cli.path.to_str(), Some("/bin/true"));
    }
}
