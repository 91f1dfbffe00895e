pub trait Converter: Send + Sync {
    fn to_markdown(&self, html: &str) -> String;
}

/// html2md keeps links, images and tables and never hard-wraps lines; the output
/// is then tidied with [`tidy_markdown`].
#[derive(Debug, Default, Clone, Copy)]
pub struct Html2MdConverter;

impl Converter for Html2MdConverter {
    fn to_markdown(&self, html: &str) -> String {
        tidy_markdown(&html2md::parse_html(html))
    }
}

/// Trims trailing whitespace on every line and drops blank lines entirely.
pub fn tidy_markdown(markdown: &str) -> String {
    markdown
        .lines()
        .map(str::trim_end)
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
