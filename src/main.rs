use clap::Parser;
use clap_repl::ClapEditor;
use clap_repl::reedline::{
    DefaultPrompt, FileBackedHistory, Highlighter, Prompt, PromptEditMode, PromptHistorySearch,
    Reedline, StyledText,
};
use elfscope::commands;
use elfscope::elf::ElfFile;
use elfscope::repl::{Cli, Repl, ReplCommand};
use elfscope::utils::warn;
use nu_ansi_term::{Color, Style};
use std::borrow::Cow;
use std::io;
use std::path::Path;
use std::process;

/// Colors what the user types.
pub struct CommandHighlighter {
    color: Color,
}

impl Highlighter for CommandHighlighter {
    fn highlight(&self, line: &str, _cursor: usize) -> StyledText {
        let mut styled_text = StyledText::new();
        styled_text.push((Style::new().fg(self.color), line.to_string()));
        styled_text
    }
}

impl CommandHighlighter {
    pub fn new() -> CommandHighlighter {
        CommandHighlighter { color: Color::Blue }
    }
}

impl Default for CommandHighlighter {
    fn default() -> Self {
        CommandHighlighter::new()
    }
}

pub struct FilePrompt {
    name: String,
    color: clap_repl::reedline::Color,
    default: DefaultPrompt,
}

impl Prompt for FilePrompt {
    fn render_prompt_left(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.name)
    }

    fn render_prompt_right(&self) -> Cow<'_, str> {
        Cow::Borrowed("")
    }

    fn render_prompt_indicator(&self, _prompt_mode: PromptEditMode) -> Cow<'_, str> {
        Cow::Borrowed("> ")
    }

    fn render_prompt_multiline_indicator(&self) -> Cow<'_, str> {
        self.default.render_prompt_multiline_indicator()
    }

    fn render_prompt_history_search_indicator(
        &self,
        history_search: PromptHistorySearch,
    ) -> Cow<'_, str> {
        self.default
            .render_prompt_history_search_indicator(history_search)
    }

    // the text that appears in the prompt
    fn get_prompt_color(&self) -> clap_repl::reedline::Color {
        self.color
    }
}

impl FilePrompt {
    /// The prompt is the file name, e.g. "libc.so.6> ".
    fn new(path: &Path) -> FilePrompt {
        let name = path
            .file_name()
            .map_or_else(|| "elfscope".to_string(), |n| n.to_string_lossy().into_owned());
        FilePrompt {
            name,
            color: clap_repl::reedline::Color::DarkBlue,
            default: DefaultPrompt::default(),
        }
    }
}

fn open_file(path: &Path) -> ElfFile {
    match ElfFile::open(path) {
        Ok(file) => file,
        Err(e) => {
            warn(&format!("Couldn't load {}: {e}", path.display()));
            process::exit(1);
        }
    }
}

fn with_history(reed: Reedline) -> Reedline {
    let path = std::env::temp_dir().join("elfscope-history");
    match FileBackedHistory::with_file(10000, path.clone()) {
        Ok(history) => reed.with_history(Box::new(history)),
        Err(e) => {
            log::warn!("no history, couldn't use {}: {e}", path.display());
            reed
        }
    }
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();
    let file = open_file(&cli.path);

    if let Some(report) = cli.report {
        let result = commands::run_report(&mut io::stdout(), &file, &report);
        file.close();
        if let Err(e) = result {
            warn(&format!("{e}"));
            process::exit(1);
        }
        return;
    }

    // left prompt                    before what the user types
    // highlighter                    this is for what the user types
    let prompt = FilePrompt::new(&cli.path);
    let rl = ClapEditor::<Repl>::builder()
        .with_prompt(Box::new(prompt))
        .with_editor_hook(|reed| {
            with_history(reed.with_highlighter(Box::new(CommandHighlighter::new())))
        })
        .build();

    rl.repl(|repl: Repl| match repl.command {
        ReplCommand::Report(report) => {
            if let Err(e) = commands::run_report(&mut io::stdout(), &file, &report) {
                warn(&format!("{e}"));
            }
        }
        ReplCommand::Quit => process::exit(0),
    });
}
