//! Read-only ELF introspection: [`elf`] is the class independent access layer, the
//! rest is the `elfscope` command line front end.
pub mod commands;
pub mod elf;
pub mod repl;
pub mod utils;
