//! Used to color and otherwise style various bits of output using an optional
//! ~/.elfscope/styles.tcss file.
use std::path::PathBuf;
use std::sync::LazyLock;
use termio::prelude::*;
use termio::{StyledString, Termio};

pub trait Styling {
    fn explain_title(self) -> StyledString;
    fn explain_text(self) -> StyledString;
    fn table_header(self) -> StyledString;
    fn table_sep(self) -> StyledString;
    fn table_field(self) -> StyledString;
    fn warn(self) -> StyledString;
}

impl Styling for String {
    fn explain_title(self) -> StyledString {
        self.style("explain title", &TCSS)
    }

    fn explain_text(self) -> StyledString {
        self.style("explain text", &TCSS)
    }

    fn table_header(self) -> StyledString {
        self.style("table header", &TCSS)
    }

    fn table_sep(self) -> StyledString {
        self.style("table separator", &TCSS)
    }

    fn table_field(self) -> StyledString {
        self.style("table field", &TCSS)
    }

    fn warn(self) -> StyledString {
        self.style("warn", &TCSS)
    }
}

impl Styling for &str {
    fn explain_title(self) -> StyledString {
        self.style("explain title", &TCSS)
    }

    fn explain_text(self) -> StyledString {
        self.style("explain text", &TCSS)
    }

    fn table_header(self) -> StyledString {
        self.style("table header", &TCSS)
    }

    fn table_sep(self) -> StyledString {
        self.style("table separator", &TCSS)
    }

    fn table_field(self) -> StyledString {
        self.style("table field", &TCSS)
    }

    fn warn(self) -> StyledString {
        self.style("warn", &TCSS)
    }
}

pub fn style_path() -> Option<PathBuf> {
    dirs::home_dir().map(|mut path| {
        path.push(".elfscope");
        path.push("styles.tcss");
        path
    })
}

// Styling is optional so a missing file just means plain output.
static TCSS: LazyLock<Termio> = LazyLock::new(|| {
    let Some(path) = style_path().filter(|p| p.is_file()) else {
        return Termio::new();
    };
    let Some(path) = path.to_str() else {
        log::warn!("ignoring styles file with a non UTF-8 path: {}", path.display());
        return Termio::new();
    };
    match Termio::from_file(path) {
        Ok(tcss) => {
            log::debug!("loaded styles from {path}");
            tcss
        }
        Err(err) => {
            // don't use warn() here, it'd recurse into TCSS
            eprintln!("couldn't parse file at {path}: {err}");
            Termio::new()
        }
    }
});
