use std::path::Path;

use anyhow::{Context, Result};
use console::{Term, style};

/// URLs to process: the positional URL, else the lines of `file`, else
/// whatever the user types at the prompt.
pub fn collect_urls(url: Option<String>, file: Option<&Path>) -> Result<Vec<String>> {
    if let Some(url) = url {
        return Ok(vec![url.trim().to_string()]);
    }
    if let Some(path) = file {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read URL list {}", path.display()))?;
        return Ok(parse_url_list(&content));
    }
    prompt_urls()
}

/// One URL per line; blank lines and `#` comments are skipped.
pub fn parse_url_list(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

fn prompt_urls() -> Result<Vec<String>> {
    let term = Term::stdout();
    term.write_line(&format!(
        "{} Enter YouTube URLs, one per line {}",
        style("?").cyan().bold(),
        style("(empty line to start)").dim()
    ))?;

    let mut urls = Vec::new();
    loop {
        term.write_str(&format!("{} ", style("›").dim()))?;
        let line = term.read_line()?;
        let line = line.trim();
        if line.is_empty() {
            break;
        }
        urls.push(line.to_string());
    }
    Ok(urls)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_url_list_skips_comments_and_blanks() {
        let content = "# watch later\nhttps://youtu.be/dQw4w9WgXcQ\n\n   \n  https://www.youtube.com/watch?v=9bZkp7q19f0  \n";
        assert_eq!(
            parse_url_list(content),
            vec![
                "https://youtu.be/dQw4w9WgXcQ",
                "https://www.youtube.com/watch?v=9bZkp7q19f0",
            ]
        );
    }

    #[test]
    fn test_positional_url_wins_over_file() {
        let urls = collect_urls(
            Some(" https://youtu.be/dQw4w9WgXcQ ".to_string()),
            Some(Path::new("/does/not/exist")),
        )
        .unwrap();
        assert_eq!(urls, vec!["https://youtu.be/dQw4w9WgXcQ"]);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        assert!(collect_urls(None, Some(Path::new("/does/not/exist"))).is_err());
    }
}
