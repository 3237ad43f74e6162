//! Device output parsing
//!
//! Helpers for turning raw shell output from a device into typed values,
//! and for quoting paths that are sent back to the device shell.
//!
//! All parsers accept `\r\n` line endings; older adb versions translate
//! newlines on the way out of a pty.

use crate::{DirEntry, PackageSet};

const PACKAGE_PREFIX: &str = "package:";

fn lines(raw: &[u8]) -> Vec<String> {
    String::from_utf8_lossy(raw)
        .lines()
        .map(|line| line.trim_end_matches('\r').to_string())
        .collect()
}

/// Parse `pm list packages` output (`package:<id>` per line)
pub fn parse_packages(raw: &[u8]) -> PackageSet {
    lines(raw)
        .into_iter()
        .filter_map(|line| {
            line.trim()
                .strip_prefix(PACKAGE_PREFIX)
                .map(str::to_string)
        })
        .filter(|pkg| !pkg.is_empty())
        .collect()
}

/// Parse the result of `pm uninstall`.
///
/// Returns `false` for every `Failure [...]` answer, including packages
/// that are not installed.
pub fn parse_uninstall(raw: &[u8]) -> bool {
    lines(raw).iter().any(|line| line.trim() == "Success")
}

/// Parse `ls -1ap` output. Directory names carry a trailing `/`.
pub fn parse_dir_listing(raw: &[u8]) -> Vec<DirEntry> {
    lines(raw)
        .into_iter()
        .filter(|line| !line.trim().is_empty())
        .map(|line| match line.strip_suffix('/') {
            Some(name) => DirEntry::dir(name),
            None => DirEntry::file(line.as_str()),
        })
        .collect()
}

/// Leading whitespace-delimited token of `du -h` output, e.g. `4.0K`
pub fn parse_du_size(raw: &[u8]) -> Option<String> {
    String::from_utf8_lossy(raw)
        .split_whitespace()
        .next()
        .map(str::to_string)
}

/// Parse a boolean setting or property (`1`/`0`, `true`/`false`).
/// `null` and anything else yield `None`.
pub fn parse_flag(raw: &[u8]) -> Option<bool> {
    match String::from_utf8_lossy(raw).trim() {
        "1" | "true" => Some(true),
        "0" | "false" => Some(false),
        _ => None,
    }
}

/// Result code from `am broadcast` output
/// (`Broadcast completed: result=-1, ...`). `None` if the broadcast never
/// completed.
pub fn parse_broadcast_result(raw: &[u8]) -> Option<i32> {
    lines(raw).iter().find_map(|line| {
        let rest = line.trim().strip_prefix("Broadcast completed:")?;
        let code = rest.trim().strip_prefix("result=")?;
        let end = code
            .char_indices()
            .find(|&(i, c)| !(c.is_ascii_digit() || (i == 0 && c == '-')))
            .map_or(code.len(), |(i, _)| i);
        code[..end].parse().ok()
    })
}

/// Double-quote `path` for the device shell, escaping the characters the
/// shell still interprets inside double quotes.
pub fn shell_quote(path: &str) -> String {
    let mut quoted = String::with_capacity(path.len() + 2);
    quoted.push('"');
    for ch in path.chars() {
        if matches!(ch, '"' | '\\' | '$' | '`') {
            quoted.push('\\');
        }
        quoted.push(ch);
    }
    quoted.push('"');
    quoted
}
