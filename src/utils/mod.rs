pub mod styles;

pub use styles::*;

/// Like writeln! but for report output where a failed write (e.g. a closed pipe) isn't
/// worth propagating.
macro_rules! uwriteln {
    ($out:expr) => {
        let _ = writeln!($out);
    };
    ($out:expr, $($arg:tt)*) => {
        let _ = writeln!($out, $($arg)*);
    };
}
pub(crate) use uwriteln;

pub fn warn(mesg: &str) {
    eprintln!("{}", mesg.warn());
}

/// Remove escape sequences from the string (e.g. for colors).
#[cfg(test)]
pub fn strip_escapes(s: &str) -> String {
    // Even with an empty style the tabled crate will add escape sequences to the end of
    // lines to reset all modes so the tests strip them out.
    let mut result = String::with_capacity(s.len());
    let mut escaping = false;

    // Note that escape sequences can be fairly gnarly, e.g. for RGB colors.
    // See https://gist.github.com/fnky/458719343aabd01cfb17a3a4f7296797
    for c in s.chars() {
        if c == '\x1b' {
            escaping = true;
        } else if escaping {
            if c == 'm' {
                escaping = false;
            }
        } else {
            result.push(c);
        }
    }
    result
}

/// Runs a report against a fixture and returns what it printed, minus styling.
#[cfg(test)]
macro_rules! report_output {
    ($f:ident, $fixture:expr, $args:expr) => {{
        let file = $fixture.open();
        let mut v: Vec<u8> = Vec::new();
        $f(&mut v, &file, $args).unwrap();
        let s = String::from_utf8(v).unwrap();
        crate::utils::strip_escapes(&s)
    }};
}
#[cfg(test)]
pub(crate) use report_output;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_colors() {
        assert_eq!(strip_escapes("\x1b[1;31mwarning\x1b[0m: bad"), "warning: bad");
        assert_eq!(strip_escapes("plain"), "plain");
    }
}
