//! Client-side filtering and sorting of an already fetched listing.

use std::cmp::Ordering;

use crate::models::resource::ResourceRecord;
use crate::models::view::{SortConfig, SortKey, SortOrder, ViewConfig};

pub fn derive_view(records: &[ResourceRecord], config: &ViewConfig) -> Vec<ResourceRecord> {
    let mut visible: Vec<(usize, &ResourceRecord)> = records
        .iter()
        .enumerate()
        .filter(|(_, record)| is_visible(record, config))
        .collect();

    visible.sort_by(|(ia, a), (ib, b)| compare(a, b, config).then(ia.cmp(ib)));

    visible.into_iter().map(|(_, record)| record.clone()).collect()
}

/// Records "select all" may pick: folders only when directories are selectable.
pub fn selectable<'a>(records: &'a [ResourceRecord], config: &ViewConfig) -> Vec<&'a ResourceRecord> {
    records
        .iter()
        .filter(|r| config.allow_directory_selection || !r.is_folder())
        .collect()
}

/// Column-header click: the active key flips direction, any other key starts ascending.
pub fn toggle_sorting(current: SortConfig, key: SortKey) -> SortConfig {
    let order = if current.sort_by == key {
        match current.order {
            SortOrder::Ascending => SortOrder::Descending,
            SortOrder::Descending | SortOrder::None => SortOrder::Ascending,
        }
    } else {
        SortOrder::Ascending
    };
    SortConfig { sort_by: key, order }
}

/// Matches `type/subtype` against patterns where either side may be `*`.
pub fn is_supported_mime_type(mime: &str, patterns: &[String]) -> bool {
    let (kind, sub) = split_mime(mime);
    patterns.iter().any(|pattern| {
        let (want_kind, want_sub) = split_mime(pattern);
        (want_kind == "*" || want_kind == kind) && (want_sub == Some("*") || want_sub == sub)
    })
}

fn split_mime(value: &str) -> (&str, Option<&str>) {
    match value.split_once('/') {
        Some((kind, sub)) => (kind, Some(sub)),
        None => (value, None),
    }
}

fn is_visible(record: &ResourceRecord, config: &ViewConfig) -> bool {
    if !config.show_hidden && record.is_hidden() {
        return false;
    }

    if !config.mime_filter.is_empty()
        && !record.is_folder()
        && !is_supported_mime_type(record.mime_type.as_deref().unwrap_or_default(), &config.mime_filter)
    {
        return false;
    }

    if !config.text_filter.is_empty() {
        let needle = config.text_filter.to_lowercase();
        if !record.display_name.to_lowercase().contains(&needle) {
            return false;
        }
    }

    true
}

fn compare(a: &ResourceRecord, b: &ResourceRecord, config: &ViewConfig) -> Ordering {
    let mut ordering = Ordering::Equal;
    if config.sort_folders_first {
        ordering = b.is_folder().cmp(&a.is_folder());
    }
    if ordering == Ordering::Equal && config.sort_favorites_first {
        ordering = b.favorite.cmp(&a.favorite);
    }
    ordering.then_with(|| {
        let by_key = match config.sort.sort_by {
            SortKey::Name => natural_cmp(&a.display_name, &b.display_name),
            SortKey::Size => a.size.cmp(&b.size),
            SortKey::Mtime => a.mtime.cmp(&b.mtime),
        };
        match config.sort.order {
            SortOrder::Ascending => by_key,
            SortOrder::Descending => by_key.reverse(),
            SortOrder::None => Ordering::Equal,
        }
    })
}

/// Case-insensitive comparison where digit runs compare by numeric value,
/// so `file2` sorts before `file10`.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let a = a.to_lowercase();
    let b = b.to_lowercase();
    let mut left = a.chars().peekable();
    let mut right = b.chars().peekable();

    loop {
        match (left.peek().copied(), right.peek().copied()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) if x.is_ascii_digit() && y.is_ascii_digit() => {
                let l = take_digits(&mut left);
                let r = take_digits(&mut right);
                let ordering = compare_digits(&l, &r);
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
            (Some(x), Some(y)) => {
                if x != y {
                    return x.cmp(&y);
                }
                left.next();
                right.next();
            }
        }
    }
}

fn take_digits(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> String {
    let mut digits = String::new();
    while let Some(c) = chars.next_if(char::is_ascii_digit) {
        digits.push(c);
    }
    digits
}

fn compare_digits(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}
