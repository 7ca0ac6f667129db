use crate::checks::{CheckResultType, PackageCheckResults};
use console::Style;

/// Markup tag currently in effect
enum OpenTag<'a> {
    Style(Vec<&'a str>),
    Link,
}

enum Tag<'a> {
    Open(OpenTag<'a>),
    OpenLink(&'a str),
    Close,
}

const STYLE_WORDS: &[&str] = &[
    "default", "red", "green", "yellow", "blue", "magenta", "cyan", "white", "bold", "dim",
    "italic", "underline",
];

fn parse_tag(content: &str) -> Option<Tag<'_>> {
    if content.starts_with('/') {
        return Some(Tag::Close);
    }
    if let Some(url) = content.strip_prefix("link=") {
        let unsafe_char = |c: char| c.is_control() || c.is_whitespace() || c == '[';
        let valid = !url.is_empty() && !url.chars().any(unsafe_char);
        return valid.then_some(Tag::OpenLink(url));
    }
    let words: Vec<&str> = content.split_whitespace().collect();
    if words.is_empty() || !words.iter().all(|w| STYLE_WORDS.contains(w)) {
        return None;
    }
    Some(Tag::Open(OpenTag::Style(words)))
}

fn apply_word(style: Style, word: &str) -> Style {
    match word {
        "red" => style.red(),
        "green" => style.green(),
        "yellow" => style.yellow(),
        "blue" => style.blue(),
        "magenta" => style.magenta(),
        "cyan" => style.cyan(),
        "white" => style.white(),
        "bold" => style.bold(),
        "dim" => style.dim(),
        "italic" => style.italic(),
        "underline" => style.underlined(),
        _ => style,
    }
}

/// Escape text so that `render_markup` shows it verbatim
pub fn escape_markup(text: &str) -> String {
    text.replace('\\', "\\\\").replace('[', "\\[")
}

fn push_text(out: &mut String, text: &str, stack: &[OpenTag<'_>], styled: bool) {
    // Terminal control sequences are only ever emitted by the renderer itself
    let sanitized: String;
    let text = if text.chars().any(char::is_control) {
        sanitized = text.chars().filter(|c| !c.is_control()).collect();
        sanitized.as_str()
    } else {
        text
    };
    if !styled {
        out.push_str(text);
        return;
    }
    let words: Vec<&str> = stack
        .iter()
        .filter_map(|tag| match tag {
            OpenTag::Style(words) => Some(words.iter().copied()),
            OpenTag::Link => None,
        })
        .flatten()
        .collect();
    if words.is_empty() {
        out.push_str(text);
        return;
    }
    let style = words
        .into_iter()
        .fold(Style::new().force_styling(true), apply_word);
    out.push_str(&style.apply_to(text).to_string());
}

/// Render `[red]…[/red]`, `[bold]`, `[link=url]…[/link]` markup.
///
/// With `styled` the tags become ANSI styles and OSC 8 hyperlinks; without, they are
/// stripped. Brackets that do not form a known tag are kept as text; `\[` is a literal
/// bracket and `\\` a literal backslash. Control characters in the text are dropped.
pub fn render_markup(markup: &str, styled: bool) -> String {
    let mut out = String::with_capacity(markup.len());
    let mut stack: Vec<OpenTag<'_>> = Vec::new();
    let mut rest = markup;

    while !rest.is_empty() {
        if let Some(after) = rest.strip_prefix("\\\\") {
            push_text(&mut out, "\\", &stack, styled);
            rest = after;
            continue;
        }
        if let Some(after) = rest.strip_prefix("\\[") {
            push_text(&mut out, "[", &stack, styled);
            rest = after;
            continue;
        }
        if rest.starts_with('[') {
            let tag = rest.find(']').and_then(|end| parse_tag(&rest[1..end]).map(|tag| (tag, end)));
            match tag {
                Some((Tag::Open(open), end)) => {
                    stack.push(open);
                    rest = &rest[end + 1..];
                }
                Some((Tag::OpenLink(url), end)) => {
                    if styled {
                        out.push_str(&format!("\x1b]8;;{}\x1b\\", url));
                    }
                    stack.push(OpenTag::Link);
                    rest = &rest[end + 1..];
                }
                Some((Tag::Close, end)) => {
                    if let Some(OpenTag::Link) = stack.pop() {
                        if styled {
                            out.push_str("\x1b]8;;\x1b\\");
                        }
                    }
                    rest = &rest[end + 1..];
                }
                None => {
                    push_text(&mut out, "[", &stack, styled);
                    rest = &rest[1..];
                }
            }
            continue;
        }

        let next = rest
            .char_indices()
            .skip(1)
            .find(|&(_, c)| c == '[' || c == '\\')
            .map(|(i, _)| i)
            .unwrap_or(rest.len());
        push_text(&mut out, &rest[..next], &stack, styled);
        rest = &rest[next..];
    }

    if styled && stack.iter().any(|tag| matches!(tag, OpenTag::Link)) {
        out.push_str("\x1b]8;;\x1b\\");
    }
    out
}

/// Markup for the check report: a header per package coloured by its worst result,
/// then its results in display order
pub fn report_markup(package_results: &[PackageCheckResults]) -> String {
    let mut lines = vec![String::new(), "Package check results:".to_string()];
    for package in package_results {
        let color = package.worst().map(|worst| worst.color()).unwrap_or("default");
        lines.push(format!(
            "  [bold]\\[[{color}]{}[/{color}]][/bold]",
            escape_markup(&package.pinned_requirement)
        ));
        if package.results.is_empty() {
            lines.push("    No checks performed".to_string());
        }
        for result in package.display_order() {
            let color = match result.result_type {
                CheckResultType::Success => "default",
                other => other.color(),
            };
            lines.push(format!(
                "    {} [{color}]{}[/{color}]",
                result.result_type.icon(),
                result.message
            ));
        }
    }
    lines.join("\n")
}

pub fn format_report(package_results: &[PackageCheckResults], styled: bool) -> String {
    report_markup(package_results)
        .lines()
        .map(|line| render_markup(line, styled))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Print the report to stdout, styled when the terminal supports it
pub fn print_report(package_results: &[PackageCheckResults]) {
    println!("{}", format_report(package_results, console::colors_enabled()));
}
