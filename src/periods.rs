use once_cell::sync::Lazy;
use regex::Regex;

use crate::dom::{Node, Page, Query};
use crate::models::Period;

static ORDINAL: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+°").unwrap());

pub fn extract_periods(html: &str) -> Vec<Period> {
    periods_from_page(&Page::parse(html))
}

pub(crate) fn periods_from_page(page: &Page) -> Vec<Period> {
    let Some(list) = page.find_first(&Query::tag("ul")) else {
        return Vec::new();
    };

    list.children()
        .iter()
        .enumerate()
        .map(|(index, item)| Period {
            code: period_code(item),
            position: index + 1,
            label: clean_label(&item.text()),
        })
        .collect()
}

fn period_code(item: &Node<'_>) -> String {
    let anchor = if item.tag() == "a" {
        Some(*item)
    } else {
        item.find_first(&Query::tag("a"))
    };

    anchor
        .and_then(|a| a.attr("href"))
        .and_then(|href| href.split('#').nth(1))
        .unwrap_or_default()
        .to_string()
}

/// Trims the label and collapses an ordinal repeated back to back
/// ("1° 1° PERIODO" becomes "1° PERIODO").
pub fn clean_label(raw: &str) -> String {
    let text = raw.trim();
    let ordinals: Vec<_> = ORDINAL.find_iter(text).collect();

    let mut out = String::with_capacity(text.len());
    let mut copied = 0;
    let mut i = 0;
    while i + 1 < ordinals.len() {
        let (first, second) = (ordinals[i], ordinals[i + 1]);
        let gap = &text[first.end()..second.start()];
        let repeated = first.as_str() == second.as_str()
            && !gap.is_empty()
            && gap.chars().all(char::is_whitespace);
        if repeated {
            out.push_str(&text[copied..first.end()]);
            copied = second.end();
            i += 2;
        } else {
            i += 1;
        }
    }
    out.push_str(&text[copied..]);
    out
}
