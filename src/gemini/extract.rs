//! Response extraction: text fragments and deduplicated code blocks

use chromiumoxide::Page;

use crate::browser::BrowserResult;
use crate::utils::constants::{CODE_BLOCK_RETRIES, CODE_BLOCK_RETRY_PAUSE};

/// Collect every paragraph/heading-level fragment in document order.
///
/// Fragments are trimmed and empty ones dropped; duplicates are kept
/// verbatim because document order carries meaning. An element that goes
/// stale between lookup and read is skipped, not fatal.
pub async fn extract_text(page: &Page) -> BrowserResult<Vec<String>> {
    let elements = page
        .find_xpaths("//p | //h1 | //h2 | //h3 | //h4")
        .await
        .unwrap_or_default();

    let mut raw = Vec::with_capacity(elements.len());
    for element in &elements {
        if let Ok(Some(text)) = element.inner_text().await {
            raw.push(text);
        }
    }

    Ok(collect_fragments(raw))
}

/// Collect every preformatted code container, deduplicated by exact text,
/// first occurrence kept.
///
/// Code blocks render asynchronously, so the wait for the first container
/// is retried a bounded number of times; an empty result after the last
/// attempt is returned as-is rather than treated as an error.
pub async fn extract_code_blocks(page: &Page) -> Vec<String> {
    for attempt in 0..CODE_BLOCK_RETRIES {
        match page.find_elements("pre").await {
            Ok(blocks) if !blocks.is_empty() => {
                let mut raw = Vec::with_capacity(blocks.len());
                for block in &blocks {
                    // stale element: skip it
                    if let Ok(Some(text)) = block.inner_text().await {
                        raw.push(text);
                    }
                }
                return dedup_code_blocks(raw);
            }
            _ => {
                if attempt + 1 < CODE_BLOCK_RETRIES {
                    tokio::time::sleep(CODE_BLOCK_RETRY_PAUSE).await;
                }
            }
        }
    }

    Vec::new()
}

/// Trim fragments and drop the empty ones, preserving order and duplicates
fn collect_fragments(raw: Vec<String>) -> Vec<String> {
    raw.into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect()
}

/// Trim blocks and keep each distinct text once, in first-appearance order
fn dedup_code_blocks(raw: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for block in raw {
        let code = block.trim().to_string();
        if !code.is_empty() && !out.contains(&code) {
            out.push(code);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn fragments_keep_duplicates_and_order() {
        let collected = collect_fragments(strings(&["Intro", "Body", "Intro", "End"]));
        assert_eq!(collected, strings(&["Intro", "Body", "Intro", "End"]));
    }

    #[test]
    fn fragments_drop_whitespace_only_entries() {
        let collected = collect_fragments(strings(&["  lead  ", "", "   ", "\n\t", "tail"]));
        assert_eq!(collected, strings(&["lead", "tail"]));
    }

    #[test]
    fn code_blocks_dedup_by_exact_text_keeping_first() {
        let blocks = strings(&[
            "fn a() {}",
            "fn b() {}",
            "fn a() {}",
            "fn c() {}",
            "fn b() {}",
        ]);
        let deduped = dedup_code_blocks(blocks);
        assert_eq!(deduped, strings(&["fn a() {}", "fn b() {}", "fn c() {}"]));
    }

    #[test]
    fn code_blocks_trim_before_dedup() {
        let blocks = strings(&["  print(1)\n", "print(1)", "  "]);
        assert_eq!(dedup_code_blocks(blocks), strings(&["print(1)"]));
    }
}
